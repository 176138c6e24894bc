use crate::ast::{
    BinaryOperator, Expression, FrameBound, FrameUnits, Literal, MatchMode, OrderByItem,
    Quantifier, UnaryOperator, VariableScope, WindowFrame, WindowSpec,
};
use crate::error::{ParseResult, SyntaxError};
use crate::keyword::Keyword;
use crate::parser::Parser;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// Precedence, low to high: OR, AND, NOT, comparison, additive,
    /// multiplicative, unary, postfix json ops, primary.
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_and()?;
        while self.check_keyword(Keyword::OR) {
            let pos = self.advance()?.pos();
            let right = self.parse_and()?;
            left = Expression::BinaryOp {
                op: BinaryOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_not()?;
        while self.check_keyword(Keyword::AND) {
            let pos = self.advance()?.pos();
            let right = self.parse_not()?;
            left = Expression::BinaryOp {
                op: BinaryOperator::And,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expression> {
        if self.check_keyword(Keyword::NOT) {
            // NOT IN / NOT BETWEEN / NOT LIKE bind at comparison level
            let next = self.peek_kind()?;
            let comparison_follows = matches!(
                next,
                TokenKind::Keyword(Keyword::IN)
                    | TokenKind::Keyword(Keyword::BETWEEN)
                    | TokenKind::Keyword(Keyword::LIKE)
            );
            if !comparison_follows {
                let pos = self.advance()?.pos();
                let operand = self.parse_not()?;
                return Ok(Expression::UnaryOp {
                    op: UnaryOperator::Not,
                    operand: Box::new(operand),
                    pos,
                });
            }
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_additive()?;

        loop {
            if let Some(op) = self.comparison_operator() {
                let pos = self.advance()?.pos();
                // quantified comparison: op ALL|ANY|SOME (subquery)
                let quantifier = if self.check_keyword(Keyword::ALL) {
                    Some(Quantifier::All)
                } else if self.check_keyword(Keyword::ANY) {
                    Some(Quantifier::Any)
                } else if self.check_keyword(Keyword::SOME) {
                    Some(Quantifier::Some)
                } else {
                    None
                };
                if let Some(quantifier) = quantifier {
                    self.advance()?;
                    self.expect_token(TokenKind::LParen)?;
                    let subquery = Box::new(self.parse_select()?);
                    self.expect_token(TokenKind::RParen)?;
                    expr = Expression::Quantified {
                        op,
                        quantifier,
                        expr: Box::new(expr),
                        subquery,
                        pos,
                    };
                } else {
                    let right = self.parse_additive()?;
                    expr = Expression::BinaryOp {
                        op,
                        left: Box::new(expr),
                        right: Box::new(right),
                        pos,
                    };
                }
                continue;
            }

            if self.check_keyword(Keyword::IS) {
                let pos = self.advance()?.pos();
                let negated = self.eat_keyword(Keyword::NOT)?;
                self.expect_keyword(Keyword::NULL)?;
                expr = Expression::IsNull {
                    expr: Box::new(expr),
                    negated,
                    pos,
                };
                continue;
            }

            let negated = if self.check_keyword(Keyword::NOT) {
                // only reachable with IN/BETWEEN/LIKE next
                self.advance()?;
                true
            } else {
                false
            };

            if self.check_keyword(Keyword::IN) {
                let pos = self.advance()?.pos();
                self.expect_token(TokenKind::LParen)?;
                if self.check_keyword(Keyword::SELECT) || self.check_keyword(Keyword::WITH) {
                    let subquery = Box::new(self.parse_select()?);
                    self.expect_token(TokenKind::RParen)?;
                    expr = Expression::InSubquery {
                        expr: Box::new(expr),
                        subquery,
                        negated,
                        pos,
                    };
                } else {
                    let mut list = vec![self.parse_expression()?];
                    while self.eat_token(TokenKind::Comma)? {
                        list.push(self.parse_expression()?);
                    }
                    self.expect_token(TokenKind::RParen)?;
                    expr = Expression::InList {
                        expr: Box::new(expr),
                        list,
                        negated,
                        pos,
                    };
                }
                continue;
            }

            if self.check_keyword(Keyword::BETWEEN) {
                let pos = self.advance()?.pos();
                let low = self.parse_additive()?;
                self.expect_keyword(Keyword::AND)?;
                let high = self.parse_additive()?;
                expr = Expression::Between {
                    expr: Box::new(expr),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                    pos,
                };
                continue;
            }

            if self.check_keyword(Keyword::LIKE) {
                let pos = self.advance()?.pos();
                let pattern = self.parse_additive()?;
                expr = Expression::Like {
                    expr: Box::new(expr),
                    pattern: Box::new(pattern),
                    negated,
                    pos,
                };
                continue;
            }

            if negated {
                return Err(SyntaxError::expected(
                    "IN, BETWEEN or LIKE after NOT",
                    self.current(),
                ));
            }
            return Ok(expr);
        }
    }

    fn comparison_operator(&self) -> Option<BinaryOperator> {
        match self.current().kind {
            TokenKind::Eq => Some(BinaryOperator::Eq),
            TokenKind::NotEq => Some(BinaryOperator::NotEq),
            TokenKind::Lt => Some(BinaryOperator::Lt),
            TokenKind::LtEq => Some(BinaryOperator::LtEq),
            TokenKind::Gt => Some(BinaryOperator::Gt),
            TokenKind::GtEq => Some(BinaryOperator::GtEq),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinaryOperator::Plus,
                TokenKind::Minus => BinaryOperator::Minus,
                _ => return Ok(left),
            };
            let pos = self.advance()?.pos();
            let right = self.parse_multiplicative()?;
            left = Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => return Ok(left),
            };
            let pos = self.advance()?.pos();
            let right = self.parse_unary()?;
            left = Expression::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if self.check_token(TokenKind::Minus) {
            let pos = self.advance()?.pos();
            let operand = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Minus,
                operand: Box::new(operand),
                pos,
            });
        }
        if self.check_keyword(Keyword::BINARY) {
            let pos = self.advance()?.pos();
            let operand = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Binary,
                operand: Box::new(operand),
                pos,
            });
        }
        self.parse_postfix()
    }

    /// `->` and `->>` desugar into JSON_EXTRACT / JSON_UNQUOTE calls.
    fn parse_postfix(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary()?;
        loop {
            let unquote = match self.current().kind {
                TokenKind::JsonExtract => false,
                TokenKind::JsonUnquote => true,
                _ => return Ok(expr),
            };
            let pos = self.advance()?.pos();
            let path_pos = self.current_pos();
            let path = self.parse_string()?;
            let extract = Expression::FunctionCall {
                name: "JSON_EXTRACT".to_string(),
                distinct: false,
                args: vec![
                    expr,
                    Expression::Literal {
                        value: Literal::String(path),
                        pos: path_pos,
                    },
                ],
                wildcard: false,
                order_by: vec![],
                separator: None,
                pos,
            };
            expr = if unquote {
                Expression::FunctionCall {
                    name: "JSON_UNQUOTE".to_string(),
                    distinct: false,
                    args: vec![extract],
                    wildcard: false,
                    order_by: vec![],
                    separator: None,
                    pos,
                }
            } else {
                extract
            };
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        let pos = self.current_pos();

        // reserved words that are also builtin functions
        if let TokenKind::Keyword(k) = self.current().kind {
            if matches!(
                k,
                Keyword::IF | Keyword::REPLACE | Keyword::LEFT | Keyword::RIGHT
            ) && self.peek_kind()? == TokenKind::LParen
            {
                let name = self.advance()?.lexeme.to_ascii_uppercase();
                return self.parse_function_call(name, pos);
            }
        }

        match self.current().kind {
            TokenKind::Integer => {
                let token = self.advance()?;
                let value = token.lexeme.parse::<i64>().map_err(|_| {
                    SyntaxError::new("Integer out of range", token.offset, token.line, token.column)
                })?;
                Ok(Expression::Literal {
                    value: Literal::Integer(value),
                    pos,
                })
            }
            TokenKind::Float => {
                let token = self.advance()?;
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    SyntaxError::new("Malformed float", token.offset, token.line, token.column)
                })?;
                Ok(Expression::Literal {
                    value: Literal::Float(value),
                    pos,
                })
            }
            TokenKind::StringLit => {
                let token = self.advance()?;
                Ok(Expression::Literal {
                    value: Literal::String(token.lexeme),
                    pos,
                })
            }
            TokenKind::Star => {
                self.advance()?;
                Ok(Expression::Wildcard { table: None, pos })
            }
            TokenKind::AtAt => self.parse_system_variable(),
            TokenKind::LParen => {
                self.advance()?;
                if self.check_keyword(Keyword::SELECT) || self.check_keyword(Keyword::WITH) {
                    let query = Box::new(self.parse_select()?);
                    self.expect_token(TokenKind::RParen)?;
                    return Ok(Expression::Subquery { query, pos });
                }
                let expr = self.parse_expression()?;
                self.expect_token(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Keyword(Keyword::NULL) => {
                self.advance()?;
                Ok(Expression::Literal {
                    value: Literal::Null,
                    pos,
                })
            }
            TokenKind::Keyword(Keyword::TRUE) => {
                self.advance()?;
                Ok(Expression::Literal {
                    value: Literal::Boolean(true),
                    pos,
                })
            }
            TokenKind::Keyword(Keyword::FALSE) => {
                self.advance()?;
                Ok(Expression::Literal {
                    value: Literal::Boolean(false),
                    pos,
                })
            }
            TokenKind::Keyword(Keyword::CASE) => self.parse_case(),
            TokenKind::Keyword(Keyword::EXISTS) => {
                self.advance()?;
                self.expect_token(TokenKind::LParen)?;
                let subquery = Box::new(self.parse_select()?);
                self.expect_token(TokenKind::RParen)?;
                Ok(Expression::Exists {
                    subquery,
                    negated: false,
                    pos,
                })
            }
            TokenKind::Keyword(Keyword::MATCH) => self.parse_match_against(),
            _ if self.current().is_identifier_like() => {
                let name = self.advance()?.lexeme;
                if self.check_token(TokenKind::LParen) {
                    return self.parse_function_call(name, pos);
                }
                if self.check_token(TokenKind::Dot) {
                    self.advance()?;
                    if self.eat_token(TokenKind::Star)? {
                        return Ok(Expression::Wildcard {
                            table: Some(name),
                            pos,
                        });
                    }
                    let column = self.parse_identifier()?;
                    return Ok(Expression::ColumnRef {
                        table: Some(name),
                        column,
                        pos,
                    });
                }
                Ok(Expression::ColumnRef {
                    table: None,
                    column: name,
                    pos,
                })
            }
            _ => Err(SyntaxError::unexpected(self.current())),
        }
    }

    /// `@@x`, `@@session.x`, `@@global.x`.
    fn parse_system_variable(&mut self) -> ParseResult<Expression> {
        let pos = self.advance()?.pos(); // @@
        let first = self.parse_identifier()?;

        let (scope, name) = if self.check_token(TokenKind::Dot) {
            let scope = match first.to_ascii_uppercase().as_str() {
                "GLOBAL" => VariableScope::Global,
                "SESSION" => VariableScope::Session,
                _ => {
                    return Err(SyntaxError::new(
                        format!("Unknown variable scope: {}", first),
                        pos.offset,
                        pos.line,
                        pos.column,
                    ))
                }
            };
            self.advance()?;
            (scope, self.parse_identifier()?)
        } else {
            (VariableScope::Session, first)
        };

        Ok(Expression::SystemVariable { name, scope, pos })
    }

    fn parse_function_call(&mut self, name: String, pos: crate::token::Pos) -> ParseResult<Expression> {
        self.expect_token(TokenKind::LParen)?;

        let mut distinct = false;
        let mut wildcard = false;
        let mut args = Vec::new();
        let mut order_by = Vec::new();
        let mut separator = None;

        if !self.check_token(TokenKind::RParen) {
            if self.check_keyword(Keyword::DISTINCT) {
                self.advance()?;
                distinct = true;
            }
            if self.check_token(TokenKind::Star) && self.peek_kind()? == TokenKind::RParen {
                self.advance()?;
                wildcard = true;
            } else {
                args.push(self.parse_expression()?);
                while self.eat_token(TokenKind::Comma)? {
                    args.push(self.parse_expression()?);
                }
                if self.check_keyword(Keyword::ORDER) {
                    self.advance()?;
                    self.expect_keyword(Keyword::BY)?;
                    order_by = self.parse_order_by_list()?;
                }
                if self.check_keyword(Keyword::SEPARATOR) {
                    self.advance()?;
                    separator = Some(self.parse_string()?);
                }
            }
        }
        self.expect_token(TokenKind::RParen)?;

        let call = Expression::FunctionCall {
            name,
            distinct,
            args,
            wildcard,
            order_by,
            separator,
            pos,
        };

        if self.check_keyword(Keyword::OVER) {
            self.advance()?;
            let window = self.parse_window_spec()?;
            return Ok(Expression::WindowFunction {
                function: Box::new(call),
                window,
                pos,
            });
        }
        Ok(call)
    }

    pub(crate) fn parse_order_by_list(&mut self) -> ParseResult<Vec<OrderByItem>> {
        let mut items = vec![self.parse_order_by_item()?];
        while self.eat_token(TokenKind::Comma)? {
            items.push(self.parse_order_by_item()?);
        }
        Ok(items)
    }

    fn parse_order_by_item(&mut self) -> ParseResult<OrderByItem> {
        let expr = self.parse_expression()?;
        let asc = if self.eat_keyword(Keyword::DESC)? {
            false
        } else {
            self.eat_keyword(Keyword::ASC)?;
            true
        };
        Ok(OrderByItem { expr, asc })
    }

    fn parse_window_spec(&mut self) -> ParseResult<WindowSpec> {
        self.expect_token(TokenKind::LParen)?;

        let mut spec = WindowSpec {
            name_ref: None,
            partition_by: vec![],
            order_by: vec![],
            frame: None,
        };

        // optional base window name
        if self.current().is_identifier_like()
            && !self.check_keyword(Keyword::PARTITION)
            && !self.check_keyword(Keyword::ORDER)
            && !self.check_keyword(Keyword::ROWS)
            && !self.check_keyword(Keyword::RANGE)
        {
            spec.name_ref = Some(self.parse_identifier()?);
        }

        if self.eat_keyword(Keyword::PARTITION)? {
            self.expect_keyword(Keyword::BY)?;
            spec.partition_by.push(self.parse_expression()?);
            while self.eat_token(TokenKind::Comma)? {
                spec.partition_by.push(self.parse_expression()?);
            }
        }

        if self.eat_keyword(Keyword::ORDER)? {
            self.expect_keyword(Keyword::BY)?;
            spec.order_by = self.parse_order_by_list()?;
        }

        let units = if self.eat_keyword(Keyword::ROWS)? {
            Some(FrameUnits::Rows)
        } else if self.eat_keyword(Keyword::RANGE)? {
            Some(FrameUnits::Range)
        } else {
            None
        };
        if let Some(units) = units {
            let (start, end) = if self.eat_keyword(Keyword::BETWEEN)? {
                let start = self.parse_frame_bound()?;
                self.expect_keyword(Keyword::AND)?;
                let end = self.parse_frame_bound()?;
                (start, end)
            } else {
                (self.parse_frame_bound()?, FrameBound::CurrentRow)
            };
            spec.frame = Some(WindowFrame { units, start, end });
        }

        self.expect_token(TokenKind::RParen)?;
        Ok(spec)
    }

    fn parse_frame_bound(&mut self) -> ParseResult<FrameBound> {
        if self.eat_keyword(Keyword::UNBOUNDED)? {
            if self.eat_keyword(Keyword::PRECEDING)? {
                return Ok(FrameBound::UnboundedPreceding);
            }
            self.expect_keyword(Keyword::FOLLOWING)?;
            return Ok(FrameBound::UnboundedFollowing);
        }
        if self.eat_keyword(Keyword::CURRENT)? {
            self.expect_keyword(Keyword::ROW)?;
            return Ok(FrameBound::CurrentRow);
        }
        let n = self.parse_integer()?;
        if self.eat_keyword(Keyword::PRECEDING)? {
            return Ok(FrameBound::Preceding(n));
        }
        self.expect_keyword(Keyword::FOLLOWING)?;
        Ok(FrameBound::Following(n))
    }

    /// Simple vs. searched CASE hinges on the token right after CASE.
    fn parse_case(&mut self) -> ParseResult<Expression> {
        let pos = self.advance()?.pos(); // CASE

        let operand = if self.check_keyword(Keyword::WHEN) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        let mut branches = Vec::new();
        self.expect_keyword(Keyword::WHEN)?;
        loop {
            let condition = self.parse_expression()?;
            self.expect_keyword(Keyword::THEN)?;
            let result = self.parse_expression()?;
            branches.push((condition, result));
            if !self.eat_keyword(Keyword::WHEN)? {
                break;
            }
        }

        let else_branch = if self.eat_keyword(Keyword::ELSE)? {
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::END)?;

        Ok(Expression::Case {
            operand,
            branches,
            else_branch,
            pos,
        })
    }

    fn parse_match_against(&mut self) -> ParseResult<Expression> {
        let pos = self.advance()?.pos(); // MATCH
        self.expect_token(TokenKind::LParen)?;
        let mut columns = vec![self.parse_expression()?];
        while self.eat_token(TokenKind::Comma)? {
            columns.push(self.parse_expression()?);
        }
        self.expect_token(TokenKind::RParen)?;

        self.expect_keyword(Keyword::AGAINST)?;
        self.expect_token(TokenKind::LParen)?;
        let pattern = Box::new(self.parse_expression()?);

        let mode = if self.eat_keyword(Keyword::IN)? {
            if self.eat_keyword(Keyword::BOOLEAN)? {
                self.expect_keyword(Keyword::MODE)?;
                Some(MatchMode::Boolean)
            } else {
                self.expect_keyword(Keyword::NATURAL)?;
                self.expect_keyword(Keyword::LANGUAGE)?;
                self.expect_keyword(Keyword::MODE)?;
                Some(MatchMode::NaturalLanguage)
            }
        } else if self.eat_keyword(Keyword::WITH)? {
            self.expect_keyword(Keyword::QUERY)?;
            // EXPANSION is not worth a keyword slot
            let ident = self.parse_identifier()?;
            if !ident.eq_ignore_ascii_case("EXPANSION") {
                return Err(SyntaxError::expected("EXPANSION", self.current()));
            }
            Some(MatchMode::QueryExpansion)
        } else {
            None
        };
        self.expect_token(TokenKind::RParen)?;

        Ok(Expression::MatchAgainst {
            columns,
            pattern,
            mode,
            pos,
        })
    }
}
