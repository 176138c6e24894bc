//! Recursive-descent parser. One token of lookahead (`current`) plus one
//! more through the lexer's `peek`, no error recovery: the first unexpected
//! token aborts the statement with its position.

mod ddl;
mod dml;
mod expression;
mod misc;
mod select;

use std::ops::Range;

use crate::ast::{DataType, ObjectName, Statement};
use crate::error::{ParseResult, SyntaxError};
use crate::keyword::Keyword;
use crate::lexer::Lexer;
use crate::token::{Pos, Token, TokenKind};

pub struct Parser<'a> {
    input: &'a str,
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser {
            input,
            lexer,
            current,
        })
    }

    /// One statement with an optional terminating `;`.
    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let statement = self.parse_statement_inner()?;
        self.eat_token(TokenKind::Semicolon)?;
        Ok(statement)
    }

    /// All statements until end of input.
    pub fn parse_multiple(&mut self) -> ParseResult<Vec<Statement>> {
        Ok(self
            .parse_multiple_spanned()?
            .into_iter()
            .map(|(statement, _)| statement)
            .collect())
    }

    /// Statements plus the byte range of each in the original input, for
    /// callers that execute statements one at a time.
    pub fn parse_multiple_spanned(&mut self) -> ParseResult<Vec<(Statement, Range<usize>)>> {
        let mut statements = Vec::new();
        loop {
            while self.eat_token(TokenKind::Semicolon)? {}
            if self.current.kind == TokenKind::Eof {
                return Ok(statements);
            }
            let start = self.current.offset;
            let statement = self.parse_statement_inner()?;
            self.eat_token(TokenKind::Semicolon)?;
            let end = if self.current.kind == TokenKind::Eof {
                self.input.len()
            } else {
                self.current.offset
            };
            statements.push((statement, start..end));
        }
    }

    /// One expression covering the whole input, for CHECK-constraint
    /// evaluation.
    pub fn parse_expression_only(&mut self) -> ParseResult<crate::ast::Expression> {
        let expr = self.parse_expression()?;
        if self.current.kind != TokenKind::Eof {
            return Err(SyntaxError::unexpected(&self.current));
        }
        Ok(expr)
    }

    fn parse_statement_inner(&mut self) -> ParseResult<Statement> {
        // `label: WHILE …` and friends
        if self.current.is_identifier_like() && self.peek_kind()? == TokenKind::Colon {
            return self.parse_labeled();
        }

        let keyword = match self.current.keyword() {
            Some(k) => k,
            None => return Err(SyntaxError::unexpected(&self.current)),
        };

        match keyword {
            Keyword::SELECT | Keyword::WITH => {
                Ok(Statement::Select(Box::new(self.parse_select()?)))
            }
            Keyword::INSERT => self.parse_insert(),
            Keyword::UPDATE => self.parse_update(),
            Keyword::DELETE => self.parse_delete(),
            Keyword::CREATE => self.parse_create(),
            Keyword::DROP => self.parse_drop(),
            Keyword::ALTER => self.parse_alter(),
            Keyword::USE => self.parse_use(),
            Keyword::SHOW => self.parse_show(),
            Keyword::DESCRIBE | Keyword::DESC => self.parse_describe(),
            Keyword::BEGIN => self.parse_begin(),
            Keyword::START => self.parse_start_transaction(),
            Keyword::COMMIT => {
                let pos = self.advance()?.pos();
                self.eat_keyword(Keyword::WORK)?;
                Ok(Statement::Commit { pos })
            }
            Keyword::ROLLBACK => {
                let pos = self.advance()?.pos();
                self.eat_keyword(Keyword::WORK)?;
                Ok(Statement::Rollback { pos })
            }
            Keyword::SET => self.parse_set(),
            Keyword::KILL => self.parse_kill(),
            Keyword::GRANT => self.parse_grant(),
            Keyword::REVOKE => self.parse_revoke(),
            Keyword::CALL => self.parse_call(),
            Keyword::DECLARE => self.parse_declare(),
            Keyword::IF => self.parse_if_statement(),
            Keyword::WHILE => self.parse_while(None),
            Keyword::REPEAT => self.parse_repeat(None),
            Keyword::LOOP => self.parse_loop(None),
            Keyword::LEAVE => {
                let pos = self.advance()?.pos();
                let label = self.parse_identifier()?;
                Ok(Statement::Leave { label, pos })
            }
            Keyword::ITERATE => {
                let pos = self.advance()?.pos();
                let label = self.parse_identifier()?;
                Ok(Statement::Iterate { label, pos })
            }
            Keyword::RETURN => {
                let pos = self.advance()?.pos();
                let value = self.parse_expression()?;
                Ok(Statement::Return { value, pos })
            }
            Keyword::EXPLAIN => self.parse_explain(),
            Keyword::ANALYZE => self.parse_analyze(),
            Keyword::FLUSH => self.parse_flush(),
            Keyword::LOCK => self.parse_lock_tables(),
            Keyword::UNLOCK => {
                let pos = self.advance()?.pos();
                self.expect_keyword(Keyword::TABLES)?;
                Ok(Statement::UnlockTables { pos })
            }
            Keyword::OPTIMIZE => self.parse_optimize(),
            _ => Err(SyntaxError::unexpected(&self.current)),
        }
    }

    fn parse_labeled(&mut self) -> ParseResult<Statement> {
        let label = self.parse_identifier()?;
        self.expect_token(TokenKind::Colon)?;
        match self.current.keyword() {
            Some(Keyword::WHILE) => self.parse_while(Some(label)),
            Some(Keyword::REPEAT) => self.parse_repeat(Some(label)),
            Some(Keyword::LOOP) => self.parse_loop(Some(label)),
            _ => Err(SyntaxError::expected(
                "WHILE, REPEAT or LOOP after label",
                &self.current,
            )),
        }
    }

    // -------------------------------------------------------- token plumbing

    pub(crate) fn advance(&mut self) -> ParseResult<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub(crate) fn current(&self) -> &Token {
        &self.current
    }

    pub(crate) fn current_pos(&self) -> Pos {
        self.current.pos()
    }

    pub(crate) fn peek_kind(&mut self) -> ParseResult<TokenKind> {
        Ok(self.lexer.peek()?.kind)
    }

    pub(crate) fn check_token(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.is_keyword(keyword)
    }

    pub(crate) fn eat_token(&mut self, kind: TokenKind) -> ParseResult<bool> {
        if self.current.kind == kind {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> ParseResult<bool> {
        self.eat_token(TokenKind::Keyword(keyword))
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(SyntaxError::expected(&describe_kind(kind), &self.current))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<Token> {
        if self.current.is_keyword(keyword) {
            self.advance()
        } else {
            Err(SyntaxError::expected(keyword.name(), &self.current))
        }
    }

    /// A name: plain identifier, backtick identifier, or non-reserved
    /// keyword.
    pub(crate) fn parse_identifier(&mut self) -> ParseResult<String> {
        if self.current.is_identifier_like() {
            Ok(self.advance()?.lexeme)
        } else {
            Err(SyntaxError::expected("identifier", &self.current))
        }
    }

    pub(crate) fn parse_object_name(&mut self) -> ParseResult<ObjectName> {
        let pos = self.current_pos();
        let mut parts = vec![self.parse_identifier()?];
        while self.check_token(TokenKind::Dot) {
            self.advance()?;
            parts.push(self.parse_identifier()?);
        }
        Ok(ObjectName { parts, pos })
    }

    pub(crate) fn parse_integer(&mut self) -> ParseResult<u64> {
        let token = self.expect_token(TokenKind::Integer)?;
        token
            .lexeme
            .parse::<u64>()
            .map_err(|_| SyntaxError::new("Integer out of range", token.offset, token.line, token.column))
    }

    pub(crate) fn parse_string(&mut self) -> ParseResult<String> {
        let token = self.expect_token(TokenKind::StringLit)?;
        Ok(token.lexeme)
    }

    /// `( ident, ident, … )`, at least one entry.
    pub(crate) fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        self.expect_token(TokenKind::LParen)?;
        let mut names = vec![self.parse_identifier()?];
        while self.eat_token(TokenKind::Comma)? {
            names.push(self.parse_identifier()?);
        }
        self.expect_token(TokenKind::RParen)?;
        Ok(names)
    }

    pub(crate) fn parse_data_type(&mut self) -> ParseResult<DataType> {
        let keyword = match self.current.keyword() {
            Some(k) => k,
            None => return Err(SyntaxError::expected("data type", &self.current)),
        };
        self.advance()?;

        let data_type = match keyword {
            Keyword::TINYINT => self.skip_display_width(DataType::TinyInt)?,
            Keyword::SMALLINT => self.skip_display_width(DataType::SmallInt)?,
            Keyword::INT | Keyword::INTEGER => self.skip_display_width(DataType::Int)?,
            Keyword::BIGINT => self.skip_display_width(DataType::BigInt)?,
            Keyword::BOOL | Keyword::BOOLEAN => DataType::Boolean,
            Keyword::FLOAT => DataType::Float,
            Keyword::DOUBLE => DataType::Double,
            Keyword::DECIMAL | Keyword::NUMERIC | Keyword::DEC => {
                let mut precision = None;
                let mut scale = None;
                if self.eat_token(TokenKind::LParen)? {
                    precision = Some(self.parse_integer()? as u32);
                    if self.eat_token(TokenKind::Comma)? {
                        scale = Some(self.parse_integer()? as u32);
                    }
                    self.expect_token(TokenKind::RParen)?;
                }
                DataType::Decimal { precision, scale }
            }
            Keyword::CHAR => DataType::Char {
                length: self.parse_optional_length()?,
            },
            Keyword::VARCHAR => DataType::VarChar {
                length: self.parse_optional_length()?,
            },
            Keyword::TEXT => DataType::Text,
            Keyword::DATE => DataType::Date,
            Keyword::TIME => DataType::Time,
            Keyword::DATETIME => DataType::DateTime,
            Keyword::TIMESTAMP => DataType::Timestamp,
            Keyword::BLOB => DataType::Blob,
            _ => {
                return Err(SyntaxError::new(
                    format!("Unknown data type: {}", keyword.name()),
                    self.current.offset,
                    self.current.line,
                    self.current.column,
                ))
            }
        };
        Ok(data_type)
    }

    fn parse_optional_length(&mut self) -> ParseResult<Option<u32>> {
        if self.eat_token(TokenKind::LParen)? {
            let length = self.parse_integer()? as u32;
            self.expect_token(TokenKind::RParen)?;
            Ok(Some(length))
        } else {
            Ok(None)
        }
    }

    /// `INT(11)` display widths parse and drop.
    fn skip_display_width(&mut self, data_type: DataType) -> ParseResult<DataType> {
        self.parse_optional_length()?;
        Ok(data_type)
    }
}

fn describe_kind(kind: TokenKind) -> String {
    let s = match kind {
        TokenKind::Comma => ",",
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::Semicolon => ";",
        TokenKind::Colon => ":",
        TokenKind::Dot => ".",
        TokenKind::Eq => "=",
        TokenKind::Integer => "integer literal",
        TokenKind::StringLit => "string literal",
        TokenKind::Identifier => "identifier",
        _ => return format!("{:?}", kind),
    };
    s.to_string()
}

/// Convenience wrappers used by the server layer and tests.
pub fn parse_statement(input: &str) -> ParseResult<Statement> {
    let mut parser = Parser::new(input)?;
    let statement = parser.parse_statement()?;
    if parser.current().kind != TokenKind::Eof {
        return Err(SyntaxError::unexpected(parser.current()));
    }
    Ok(statement)
}

pub fn parse_multiple(input: &str) -> ParseResult<Vec<Statement>> {
    Parser::new(input)?.parse_multiple()
}

pub fn parse_multiple_spanned(input: &str) -> ParseResult<Vec<(Statement, Range<usize>)>> {
    Parser::new(input)?.parse_multiple_spanned()
}

pub fn parse_expression(input: &str) -> ParseResult<crate::ast::Expression> {
    Parser::new(input)?.parse_expression_only()
}
