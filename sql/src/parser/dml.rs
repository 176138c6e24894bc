use crate::ast::{Assignment, Delete, Insert, InsertSource, Statement, Update};
use crate::error::ParseResult;
use crate::keyword::Keyword;
use crate::parser::Parser;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// `INSERT [IGNORE] [INTO] t [(cols)] VALUES (…),(…) | SELECT …
    /// [ON DUPLICATE KEY UPDATE a = v, …]`
    pub(crate) fn parse_insert(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::INSERT)?.pos();
        let ignore = self.eat_keyword(Keyword::IGNORE)?;
        self.eat_keyword(Keyword::INTO)?;

        let table = self.parse_object_name()?;

        let columns = if self.check_token(TokenKind::LParen) {
            self.parse_identifier_list()?
        } else {
            vec![]
        };

        let source = if self.eat_keyword(Keyword::VALUES)? || self.eat_keyword(Keyword::VALUE)? {
            let mut rows = vec![self.parse_value_tuple()?];
            while self.eat_token(TokenKind::Comma)? {
                rows.push(self.parse_value_tuple()?);
            }
            InsertSource::Values(rows)
        } else {
            InsertSource::Select(Box::new(self.parse_select()?))
        };

        let mut on_duplicate = Vec::new();
        if self.eat_keyword(Keyword::ON)? {
            self.expect_keyword(Keyword::DUPLICATE)?;
            self.expect_keyword(Keyword::KEY)?;
            self.expect_keyword(Keyword::UPDATE)?;
            on_duplicate.push(self.parse_assignment()?);
            while self.eat_token(TokenKind::Comma)? {
                on_duplicate.push(self.parse_assignment()?);
            }
        }

        Ok(Statement::Insert(Insert {
            table,
            columns,
            source,
            on_duplicate,
            ignore,
            pos,
        }))
    }

    fn parse_value_tuple(&mut self) -> ParseResult<Vec<crate::ast::Expression>> {
        self.expect_token(TokenKind::LParen)?;
        let mut values = vec![self.parse_expression()?];
        while self.eat_token(TokenKind::Comma)? {
            values.push(self.parse_expression()?);
        }
        self.expect_token(TokenKind::RParen)?;
        Ok(values)
    }

    pub(crate) fn parse_assignment(&mut self) -> ParseResult<Assignment> {
        let column = self.parse_object_name()?;
        self.expect_token(TokenKind::Eq)?;
        let value = self.parse_expression()?;
        Ok(Assignment { column, value })
    }

    pub(crate) fn parse_update(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::UPDATE)?.pos();
        let table = self.parse_table_reference()?;

        self.expect_keyword(Keyword::SET)?;
        let mut assignments = vec![self.parse_assignment()?];
        while self.eat_token(TokenKind::Comma)? {
            assignments.push(self.parse_assignment()?);
        }

        let where_clause = if self.eat_keyword(Keyword::WHERE)? {
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

        let limit = if self.eat_keyword(Keyword::LIMIT)? {
            Some(self.parse_integer()?)
        } else {
            None
        };

        Ok(Statement::Update(Update {
            table,
            assignments,
            where_clause,
            order_by,
            limit,
            pos,
        }))
    }

    pub(crate) fn parse_delete(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::DELETE)?.pos();
        self.expect_keyword(Keyword::FROM)?;
        let table = self.parse_object_name()?;

        let where_clause = if self.eat_keyword(Keyword::WHERE)? {
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

        let limit = if self.eat_keyword(Keyword::LIMIT)? {
            Some(self.parse_integer()?)
        } else {
            None
        };

        Ok(Statement::Delete(Delete {
            table,
            where_clause,
            order_by,
            limit,
            pos,
        }))
    }
}
