use crate::ast::{
    Expression, FlushTarget, GrantRevoke, IfStatement, IsolationLevel, Literal, LockType,
    ObjectName, SetStatement, Show, Statement, VariableAssignment, VariableScope,
};
use crate::error::{ParseResult, SyntaxError};
use crate::keyword::Keyword;
use crate::parser::Parser;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_use(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::USE)?.pos();
        let database = self.parse_identifier()?;
        Ok(Statement::Use { database, pos })
    }

    /// `BEGIN [WORK]` opens a transaction at the top level.
    pub(crate) fn parse_begin(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::BEGIN)?.pos();
        self.eat_keyword(Keyword::WORK)?;
        Ok(Statement::StartTransaction { pos })
    }

    pub(crate) fn parse_start_transaction(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::START)?.pos();
        self.expect_keyword(Keyword::TRANSACTION)?;
        Ok(Statement::StartTransaction { pos })
    }

    // -------------------------------------------------------------- SHOW

    pub(crate) fn parse_show(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::SHOW)?;

        // SHOW FULL PROCESSLIST / SHOW FULL COLUMNS
        let _full = self.eat_keyword(Keyword::FULL)?;

        let scope = if self.eat_keyword(Keyword::GLOBAL)? {
            Some(VariableScope::Global)
        } else if self.eat_keyword(Keyword::SESSION)? {
            Some(VariableScope::Session)
        } else {
            None
        };

        let show = if self.eat_keyword(Keyword::DATABASES)? {
            Show::Databases {
                like: self.parse_optional_like()?,
            }
        } else if self.eat_keyword(Keyword::TABLES)? {
            let database = if self.eat_keyword(Keyword::FROM)? || self.eat_keyword(Keyword::IN)? {
                Some(self.parse_identifier()?)
            } else {
                None
            };
            Show::Tables {
                database,
                like: self.parse_optional_like()?,
            }
        } else if self.eat_keyword(Keyword::COLUMNS)? || self.eat_keyword(Keyword::FIELDS)? {
            self.expect_keyword(Keyword::FROM)?;
            let table = self.parse_object_name()?;
            Show::Columns {
                table,
                like: self.parse_optional_like()?,
            }
        } else if self.eat_keyword(Keyword::CREATE)? {
            self.expect_keyword(Keyword::TABLE)?;
            Show::CreateTable {
                table: self.parse_object_name()?,
            }
        } else if self.eat_keyword(Keyword::VARIABLES)? {
            Show::Variables {
                scope,
                like: self.parse_optional_like()?,
            }
        } else if self.eat_keyword(Keyword::STATUS)? {
            Show::Status {
                scope,
                like: self.parse_optional_like()?,
            }
        } else if self.eat_keyword(Keyword::PROCESSLIST)? {
            Show::Processlist
        } else if self.eat_keyword(Keyword::ENGINES)? {
            Show::Engines
        } else if self.eat_keyword(Keyword::COLLATION)? {
            Show::Collation
        } else if self.eat_keyword(Keyword::CHARSET)? {
            Show::Charset
        } else if self.eat_keyword(Keyword::WARNINGS)? {
            Show::Warnings
        } else if self.eat_keyword(Keyword::ERRORS)? {
            Show::Errors
        } else if self.eat_keyword(Keyword::GRANTS)? {
            let user = if self.eat_keyword(Keyword::FOR)? {
                Some(self.parse_user_ref()?)
            } else {
                None
            };
            Show::Grants { user }
        } else if self.eat_keyword(Keyword::INDEX)? || self.eat_keyword(Keyword::INDEXES)? {
            self.expect_keyword(Keyword::FROM)?;
            Show::Indexes {
                table: self.parse_object_name()?,
            }
        } else if self.eat_keyword(Keyword::TRIGGERS)? {
            let database = if self.eat_keyword(Keyword::FROM)? {
                Some(self.parse_identifier()?)
            } else {
                None
            };
            Show::Triggers { database }
        } else {
            return Err(SyntaxError::expected("SHOW subcommand", self.current()));
        };

        Ok(Statement::Show(show))
    }

    fn parse_optional_like(&mut self) -> ParseResult<Option<String>> {
        if self.eat_keyword(Keyword::LIKE)? {
            Ok(Some(self.parse_string()?))
        } else {
            Ok(None)
        }
    }

    pub(crate) fn parse_describe(&mut self) -> ParseResult<Statement> {
        let pos = self.advance()?.pos(); // DESCRIBE or DESC
        let table = self.parse_object_name()?;
        let column = if self.current().is_identifier_like() {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        Ok(Statement::Describe { table, column, pos })
    }

    // --------------------------------------------------------------- SET

    pub(crate) fn parse_set(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::SET)?.pos();

        // SET NAMES 'utf8mb4'
        if self.current().is_identifier_like()
            && self.current().lexeme.eq_ignore_ascii_case("NAMES")
        {
            self.advance()?;
            let charset = if self.check_token(TokenKind::StringLit) {
                self.parse_string()?
            } else {
                self.parse_identifier()?
            };
            return Ok(Statement::Set(SetStatement::Names { charset, pos }));
        }

        let scope = if self.eat_keyword(Keyword::GLOBAL)? {
            Some(VariableScope::Global)
        } else if self.eat_keyword(Keyword::SESSION)? {
            Some(VariableScope::Session)
        } else {
            None
        };

        if self.eat_keyword(Keyword::TRANSACTION)? {
            self.expect_keyword(Keyword::ISOLATION)?;
            self.expect_keyword(Keyword::LEVEL)?;
            let level = self.parse_isolation_level()?;
            return Ok(Statement::Set(SetStatement::TransactionIsolation {
                scope,
                level,
                pos,
            }));
        }

        let mut assignments = vec![self.parse_variable_assignment(scope)?];
        while self.eat_token(TokenKind::Comma)? {
            let scope = if self.eat_keyword(Keyword::GLOBAL)? {
                Some(VariableScope::Global)
            } else if self.eat_keyword(Keyword::SESSION)? {
                Some(VariableScope::Session)
            } else {
                None
            };
            assignments.push(self.parse_variable_assignment(scope)?);
        }

        Ok(Statement::Set(SetStatement::Variables { assignments, pos }))
    }

    fn parse_isolation_level(&mut self) -> ParseResult<IsolationLevel> {
        if self.eat_keyword(Keyword::READ)? {
            if self.eat_keyword(Keyword::COMMITTED)? {
                return Ok(IsolationLevel::ReadCommitted);
            }
            self.expect_keyword(Keyword::UNCOMMITTED)?;
            return Ok(IsolationLevel::ReadUncommitted);
        }
        if self.eat_keyword(Keyword::REPEATABLE)? {
            self.expect_keyword(Keyword::READ)?;
            return Ok(IsolationLevel::RepeatableRead);
        }
        self.expect_keyword(Keyword::SERIALIZABLE)?;
        Ok(IsolationLevel::Serializable)
    }

    fn parse_variable_assignment(
        &mut self,
        scope: Option<VariableScope>,
    ) -> ParseResult<VariableAssignment> {
        // @@session.x / @@global.x spell the scope inline
        let (scope, name) = if self.check_token(TokenKind::AtAt) {
            match self.parse_expression()? {
                Expression::SystemVariable { name, scope, .. } => (Some(scope), name),
                _ => unreachable!("@@ always parses to a system variable"),
            }
        } else {
            (scope, self.parse_identifier()?)
        };

        self.expect_token(TokenKind::Eq)?;

        // ON/OFF and other bare flags read as string literals
        let value = if let Some(k) = self.current().keyword() {
            if k == Keyword::ON {
                let token = self.advance()?;
                Expression::Literal {
                    value: Literal::String("ON".to_string()),
                    pos: token.pos(),
                }
            } else {
                self.parse_expression()?
            }
        } else {
            self.parse_expression()?
        };

        Ok(VariableAssignment { scope, name, value })
    }

    // ------------------------------------------------------ KILL and CALL

    pub(crate) fn parse_kill(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::KILL)?.pos();
        let query_only = if self.eat_keyword(Keyword::QUERY)? {
            true
        } else {
            // optional CONNECTION noise word
            if self.current().is_identifier_like()
                && self.current().lexeme.eq_ignore_ascii_case("CONNECTION")
            {
                self.advance()?;
            }
            false
        };
        let connection_id = self.parse_integer()?;
        Ok(Statement::Kill {
            connection_id,
            query_only,
            pos,
        })
    }

    pub(crate) fn parse_call(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::CALL)?.pos();
        let name = self.parse_object_name()?;

        let mut args = Vec::new();
        if self.eat_token(TokenKind::LParen)? {
            if !self.check_token(TokenKind::RParen) {
                args.push(self.parse_expression()?);
                while self.eat_token(TokenKind::Comma)? {
                    args.push(self.parse_expression()?);
                }
            }
            self.expect_token(TokenKind::RParen)?;
        }

        Ok(Statement::Call { name, args, pos })
    }

    // ----------------------------------------------------- GRANT / REVOKE

    pub(crate) fn parse_grant(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::GRANT)?.pos();
        let privileges = self.parse_privileges()?;
        self.expect_keyword(Keyword::ON)?;
        let object = self.parse_grant_object()?;
        self.expect_keyword(Keyword::TO)?;
        let user = self.parse_user_ref()?;

        let with_grant_option = if self.eat_keyword(Keyword::WITH)? {
            self.expect_keyword(Keyword::GRANT)?;
            self.expect_keyword(Keyword::OPTION)?;
            true
        } else {
            false
        };

        Ok(Statement::Grant(GrantRevoke {
            privileges,
            object,
            user,
            with_grant_option,
            pos,
        }))
    }

    pub(crate) fn parse_revoke(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::REVOKE)?.pos();
        let privileges = self.parse_privileges()?;
        self.expect_keyword(Keyword::ON)?;
        let object = self.parse_grant_object()?;
        self.expect_keyword(Keyword::FROM)?;
        let user = self.parse_user_ref()?;

        Ok(Statement::Revoke(GrantRevoke {
            privileges,
            object,
            user,
            with_grant_option: false,
            pos,
        }))
    }

    /// Comma-separated privilege names up to ON. `ALL [PRIVILEGES]`
    /// collapses to `ALL`.
    fn parse_privileges(&mut self) -> ParseResult<Vec<String>> {
        let mut privileges = Vec::new();
        loop {
            if self.eat_keyword(Keyword::ALL)? {
                self.eat_keyword(Keyword::PRIVILEGES)?;
                privileges.push("ALL".to_string());
            } else {
                let token = self.advance()?;
                match token.kind {
                    TokenKind::Keyword(_) | TokenKind::Identifier => {
                        privileges.push(token.lexeme.to_ascii_uppercase());
                    }
                    _ => return Err(SyntaxError::expected("privilege name", &token)),
                }
            }
            if !self.eat_token(TokenKind::Comma)? {
                return Ok(privileges);
            }
        }
    }

    /// `*.*`, `db.*`, `db.table`, `table`.
    fn parse_grant_object(&mut self) -> ParseResult<ObjectName> {
        let pos = self.current_pos();
        let mut parts = Vec::new();

        if self.eat_token(TokenKind::Star)? {
            parts.push("*".to_string());
        } else {
            parts.push(self.parse_identifier()?);
        }
        if self.eat_token(TokenKind::Dot)? {
            if self.eat_token(TokenKind::Star)? {
                parts.push("*".to_string());
            } else {
                parts.push(self.parse_identifier()?);
            }
        }
        Ok(ObjectName { parts, pos })
    }

    // -------------------------------------------- procedure control flow

    pub(crate) fn parse_declare(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::DECLARE)?.pos();
        let mut names = vec![self.parse_identifier()?];
        while self.eat_token(TokenKind::Comma)? {
            names.push(self.parse_identifier()?);
        }
        let data_type = self.parse_data_type()?;
        let default = if self.eat_keyword(Keyword::DEFAULT)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Statement::Declare {
            names,
            data_type,
            default,
            pos,
        })
    }

    /// `IF cond THEN … [ELSEIF cond THEN …]* [ELSE …] END IF`
    pub(crate) fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::IF)?.pos();

        let mut branches = Vec::new();
        let condition = self.parse_expression()?;
        self.expect_keyword(Keyword::THEN)?;
        let body = self.parse_block_body(&[Keyword::ELSEIF, Keyword::ELSE, Keyword::END])?;
        branches.push((condition, body));

        while self.eat_keyword(Keyword::ELSEIF)? {
            let condition = self.parse_expression()?;
            self.expect_keyword(Keyword::THEN)?;
            let body = self.parse_block_body(&[Keyword::ELSEIF, Keyword::ELSE, Keyword::END])?;
            branches.push((condition, body));
        }

        let else_branch = if self.eat_keyword(Keyword::ELSE)? {
            Some(self.parse_block_body(&[Keyword::END])?)
        } else {
            None
        };

        self.expect_keyword(Keyword::END)?;
        self.expect_keyword(Keyword::IF)?;

        Ok(Statement::If(IfStatement {
            branches,
            else_branch,
            pos,
        }))
    }

    pub(crate) fn parse_while(&mut self, label: Option<String>) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::WHILE)?.pos();
        let condition = self.parse_expression()?;
        self.expect_keyword(Keyword::DO)?;
        let body = self.parse_block_body(&[Keyword::END])?;
        self.expect_keyword(Keyword::END)?;
        self.expect_keyword(Keyword::WHILE)?;
        Ok(Statement::While {
            label,
            condition,
            body,
            pos,
        })
    }

    pub(crate) fn parse_repeat(&mut self, label: Option<String>) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::REPEAT)?.pos();
        let body = self.parse_block_body(&[Keyword::UNTIL])?;
        self.expect_keyword(Keyword::UNTIL)?;
        let until = self.parse_expression()?;
        self.expect_keyword(Keyword::END)?;
        self.expect_keyword(Keyword::REPEAT)?;
        Ok(Statement::Repeat {
            label,
            body,
            until,
            pos,
        })
    }

    pub(crate) fn parse_loop(&mut self, label: Option<String>) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::LOOP)?.pos();
        let body = self.parse_block_body(&[Keyword::END])?;
        self.expect_keyword(Keyword::END)?;
        self.expect_keyword(Keyword::LOOP)?;
        Ok(Statement::Loop { label, body, pos })
    }

    // ------------------------------------------------- EXPLAIN and friends

    pub(crate) fn parse_explain(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::EXPLAIN)?.pos();
        let analyze = self.eat_keyword(Keyword::ANALYZE)?;

        // EXPLAIN <table> is DESCRIBE shorthand
        if self.current().is_identifier_like() {
            let table = self.parse_object_name()?;
            return Ok(Statement::Describe {
                table,
                column: None,
                pos,
            });
        }

        let statement = Box::new(self.parse_statement_inner()?);
        Ok(Statement::Explain {
            analyze,
            statement,
            pos,
        })
    }

    pub(crate) fn parse_analyze(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::ANALYZE)?.pos();
        self.expect_keyword(Keyword::TABLE)?;
        let mut tables = vec![self.parse_object_name()?];
        while self.eat_token(TokenKind::Comma)? {
            tables.push(self.parse_object_name()?);
        }
        Ok(Statement::AnalyzeTable { tables, pos })
    }

    pub(crate) fn parse_flush(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::FLUSH)?.pos();
        let mut targets = vec![self.parse_flush_target()?];
        while self.eat_token(TokenKind::Comma)? {
            targets.push(self.parse_flush_target()?);
        }
        Ok(Statement::Flush { targets, pos })
    }

    fn parse_flush_target(&mut self) -> ParseResult<FlushTarget> {
        if self.eat_keyword(Keyword::PRIVILEGES)? {
            return Ok(FlushTarget::Privileges);
        }
        if self.eat_keyword(Keyword::TABLES)? {
            return Ok(FlushTarget::Tables);
        }
        if self.eat_keyword(Keyword::LOGS)? {
            return Ok(FlushTarget::Logs);
        }
        if self.eat_keyword(Keyword::STATUS)? {
            return Ok(FlushTarget::Status);
        }
        Err(SyntaxError::expected(
            "PRIVILEGES, TABLES, LOGS or STATUS",
            self.current(),
        ))
    }

    pub(crate) fn parse_lock_tables(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::LOCK)?.pos();
        self.expect_keyword(Keyword::TABLES)?;

        let mut tables = Vec::new();
        loop {
            let name = self.parse_object_name()?;
            let lock_type = if self.eat_keyword(Keyword::WRITE)? {
                LockType::Write
            } else {
                self.expect_keyword(Keyword::READ)?;
                LockType::Read
            };
            tables.push((name, lock_type));
            if !self.eat_token(TokenKind::Comma)? {
                break;
            }
        }
        Ok(Statement::LockTables { tables, pos })
    }

    pub(crate) fn parse_optimize(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::OPTIMIZE)?.pos();
        self.expect_keyword(Keyword::TABLE)?;
        let mut tables = vec![self.parse_object_name()?];
        while self.eat_token(TokenKind::Comma)? {
            tables.push(self.parse_object_name()?);
        }
        Ok(Statement::Optimize { tables, pos })
    }
}
