use crate::ast::{
    Cte, JoinCondition, JoinType, Limit, LockMode, LockWait, LockingClause, Select, SelectItem,
    SetOperation, SetOperator, TableReference, With,
};
use crate::error::{ParseResult, SyntaxError};
use crate::keyword::Keyword;
use crate::parser::Parser;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// `WITH? SELECT … (UNION|INTERSECT|EXCEPT) …` per the fixed clause
    /// order.
    pub(crate) fn parse_select(&mut self) -> ParseResult<Select> {
        let with = if self.check_keyword(Keyword::WITH) {
            Some(self.parse_with()?)
        } else {
            None
        };

        let mut select = self.parse_select_core()?;
        select.with = with;

        while let Some(op) = self.set_operator() {
            self.advance()?;
            let all = self.eat_keyword(Keyword::ALL)?;
            let query = Box::new(self.parse_select_core()?);
            select.set_ops.push(SetOperation { op, all, query });
        }

        Ok(select)
    }

    fn set_operator(&self) -> Option<SetOperator> {
        match self.current().keyword() {
            Some(Keyword::UNION) => Some(SetOperator::Union),
            Some(Keyword::INTERSECT) => Some(SetOperator::Intersect),
            Some(Keyword::EXCEPT) => Some(SetOperator::Except),
            _ => None,
        }
    }

    fn parse_with(&mut self) -> ParseResult<With> {
        self.expect_keyword(Keyword::WITH)?;
        let recursive = self.eat_keyword(Keyword::RECURSIVE)?;

        let mut ctes = vec![self.parse_cte()?];
        while self.eat_token(TokenKind::Comma)? {
            ctes.push(self.parse_cte()?);
        }
        Ok(With { recursive, ctes })
    }

    fn parse_cte(&mut self) -> ParseResult<Cte> {
        let name = self.parse_identifier()?;
        let columns = if self.check_token(TokenKind::LParen) {
            self.parse_identifier_list()?
        } else {
            vec![]
        };
        self.expect_keyword(Keyword::AS)?;
        self.expect_token(TokenKind::LParen)?;
        let query = Box::new(self.parse_select()?);
        self.expect_token(TokenKind::RParen)?;
        Ok(Cte {
            name,
            columns,
            query,
        })
    }

    fn parse_select_core(&mut self) -> ParseResult<Select> {
        let pos = self.current_pos();
        self.expect_keyword(Keyword::SELECT)?;

        let distinct = if self.eat_keyword(Keyword::DISTINCT)? {
            true
        } else {
            self.eat_keyword(Keyword::ALL)?;
            false
        };

        let mut items = vec![self.parse_select_item()?];
        while self.eat_token(TokenKind::Comma)? {
            items.push(self.parse_select_item()?);
        }

        let from = if self.eat_keyword(Keyword::FROM)? {
            Some(self.parse_table_references()?)
        } else {
            None
        };

        let where_clause = if self.eat_keyword(Keyword::WHERE)? {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let mut group_by = Vec::new();
        if self.eat_keyword(Keyword::GROUP)? {
            self.expect_keyword(Keyword::BY)?;
            group_by.push(self.parse_expression()?);
            while self.eat_token(TokenKind::Comma)? {
                group_by.push(self.parse_expression()?);
            }
        }

        let having = if self.eat_keyword(Keyword::HAVING)? {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let order_by = if self.eat_keyword(Keyword::ORDER)? {
            self.expect_keyword(Keyword::BY)?;
            self.parse_order_by_list()?
        } else {
            vec![]
        };

        let limit = self.parse_limit()?;
        let locking = self.parse_locking_clause()?;

        Ok(Select {
            with: None,
            distinct,
            items,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            locking,
            set_ops: vec![],
            pos,
        })
    }

    fn parse_select_item(&mut self) -> ParseResult<SelectItem> {
        let expr = self.parse_expression()?;

        let alias = if self.eat_keyword(Keyword::AS)? {
            Some(self.parse_identifier()?)
        } else if self.current().is_identifier_like() {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        Ok(SelectItem { expr, alias })
    }

    /// `LIMIT n`, `LIMIT n OFFSET m`, and the MySQL comma form
    /// `LIMIT offset, count`.
    fn parse_limit(&mut self) -> ParseResult<Option<Limit>> {
        if !self.eat_keyword(Keyword::LIMIT)? {
            return Ok(None);
        }
        let first = self.parse_integer()?;

        if self.eat_token(TokenKind::Comma)? {
            let count = self.parse_integer()?;
            return Ok(Some(Limit {
                limit: count,
                offset: Some(first),
            }));
        }
        if self.eat_keyword(Keyword::OFFSET)? {
            let offset = self.parse_integer()?;
            return Ok(Some(Limit {
                limit: first,
                offset: Some(offset),
            }));
        }
        Ok(Some(Limit {
            limit: first,
            offset: None,
        }))
    }

    fn parse_locking_clause(&mut self) -> ParseResult<Option<LockingClause>> {
        if self.check_keyword(Keyword::LOCK) {
            self.advance()?;
            self.expect_keyword(Keyword::IN)?;
            self.expect_keyword(Keyword::SHARE)?;
            self.expect_keyword(Keyword::MODE)?;
            return Ok(Some(LockingClause {
                mode: LockMode::ShareLegacy,
                of: vec![],
                wait: LockWait::Wait,
            }));
        }

        if !self.check_keyword(Keyword::FOR) {
            return Ok(None);
        }
        self.advance()?;

        let mode = if self.eat_keyword(Keyword::UPDATE)? {
            LockMode::Update
        } else {
            self.expect_keyword(Keyword::SHARE)?;
            LockMode::Share
        };

        let mut of = Vec::new();
        if self.eat_keyword(Keyword::OF)? {
            of.push(self.parse_object_name()?);
            while self.eat_token(TokenKind::Comma)? {
                of.push(self.parse_object_name()?);
            }
        }

        let wait = if self.eat_keyword(Keyword::NOWAIT)? {
            LockWait::Nowait
        } else if self.eat_keyword(Keyword::SKIP)? {
            self.expect_keyword(Keyword::LOCKED)?;
            LockWait::SkipLocked
        } else {
            LockWait::Wait
        };

        Ok(Some(LockingClause { mode, of, wait }))
    }

    // ---------------------------------------------------------------- FROM

    pub(crate) fn parse_table_references(&mut self) -> ParseResult<TableReference> {
        let mut reference = self.parse_table_reference()?;
        // comma-separated references are cross joins
        while self.eat_token(TokenKind::Comma)? {
            let right = self.parse_table_reference()?;
            reference = TableReference::Join {
                left: Box::new(reference),
                join_type: JoinType::Cross,
                natural: false,
                right: Box::new(right),
                condition: JoinCondition::None,
            };
        }
        Ok(reference)
    }

    /// Left-associative join chain.
    pub(crate) fn parse_table_reference(&mut self) -> ParseResult<TableReference> {
        let mut left = self.parse_table_factor()?;

        loop {
            let natural = self.eat_keyword(Keyword::NATURAL)?;

            let join_type = if self.eat_keyword(Keyword::JOIN)? {
                JoinType::Inner
            } else if self.eat_keyword(Keyword::INNER)? {
                self.expect_keyword(Keyword::JOIN)?;
                JoinType::Inner
            } else if self.eat_keyword(Keyword::LEFT)? {
                self.eat_keyword(Keyword::OUTER)?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinType::Left
            } else if self.eat_keyword(Keyword::RIGHT)? {
                self.eat_keyword(Keyword::OUTER)?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinType::Right
            } else if self.eat_keyword(Keyword::FULL)? {
                self.eat_keyword(Keyword::OUTER)?;
                self.expect_keyword(Keyword::JOIN)?;
                JoinType::Full
            } else if self.eat_keyword(Keyword::CROSS)? {
                self.expect_keyword(Keyword::JOIN)?;
                JoinType::Cross
            } else {
                if natural {
                    return Err(SyntaxError::expected("join after NATURAL", self.current()));
                }
                return Ok(left);
            };

            let right = self.parse_table_factor()?;
            let condition = self.parse_join_condition(natural)?;

            left = TableReference::Join {
                left: Box::new(left),
                join_type,
                natural,
                right: Box::new(right),
                condition,
            };
        }
    }

    /// `ON expr` or `USING (…)`; both are forbidden after NATURAL.
    fn parse_join_condition(&mut self, natural: bool) -> ParseResult<JoinCondition> {
        if self.check_keyword(Keyword::ON) {
            if natural {
                return Err(SyntaxError::expected(
                    "no join condition after NATURAL",
                    self.current(),
                ));
            }
            self.advance()?;
            return Ok(JoinCondition::On(self.parse_expression()?));
        }
        if self.check_keyword(Keyword::USING) {
            if natural {
                return Err(SyntaxError::expected(
                    "no join condition after NATURAL",
                    self.current(),
                ));
            }
            self.advance()?;
            return Ok(JoinCondition::Using(self.parse_identifier_list()?));
        }
        Ok(JoinCondition::None)
    }

    fn parse_table_factor(&mut self) -> ParseResult<TableReference> {
        if self.eat_token(TokenKind::LParen)? {
            if self.check_keyword(Keyword::SELECT) || self.check_keyword(Keyword::WITH) {
                let query = Box::new(self.parse_select()?);
                self.expect_token(TokenKind::RParen)?;
                let alias = self.parse_table_alias()?;
                return Ok(TableReference::Subquery { query, alias });
            }
            let reference = self.parse_table_references()?;
            self.expect_token(TokenKind::RParen)?;
            return Ok(reference);
        }

        let name = self.parse_object_name()?;
        let alias = self.parse_table_alias()?;
        Ok(TableReference::Table { name, alias })
    }

    fn parse_table_alias(&mut self) -> ParseResult<Option<String>> {
        if self.eat_keyword(Keyword::AS)? {
            return Ok(Some(self.parse_identifier()?));
        }
        if self.current().is_identifier_like() {
            return Ok(Some(self.parse_identifier()?));
        }
        Ok(None)
    }
}
