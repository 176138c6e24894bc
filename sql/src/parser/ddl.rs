use crate::ast::{
    AlterAction, AlterTable, ColumnDef, CreateEvent, CreateIndex, CreateRoutine, CreateTable,
    CreateTrigger, CreateView, EventSchedule, ObjectKind, ParamMode, ReferentialAction, Statement,
    TableConstraint, TriggerEvent, TriggerTiming, UserRef,
};
use crate::error::{ParseResult, SyntaxError};
use crate::keyword::Keyword;
use crate::parser::Parser;
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    pub(crate) fn parse_create(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::CREATE)?.pos();

        if self.eat_keyword(Keyword::TEMPORARY)? {
            self.expect_keyword(Keyword::TABLE)?;
            return self.parse_create_table(pos, true);
        }
        if self.eat_keyword(Keyword::TABLE)? {
            return self.parse_create_table(pos, false);
        }
        if self.eat_keyword(Keyword::UNIQUE)? {
            self.expect_keyword(Keyword::INDEX)?;
            return self.parse_create_index(pos, true);
        }
        if self.eat_keyword(Keyword::INDEX)? {
            return self.parse_create_index(pos, false);
        }
        if self.eat_keyword(Keyword::OR)? {
            self.expect_keyword(Keyword::REPLACE)?;
            self.expect_keyword(Keyword::VIEW)?;
            return self.parse_create_view(pos, true);
        }
        if self.eat_keyword(Keyword::VIEW)? {
            return self.parse_create_view(pos, false);
        }
        if self.eat_keyword(Keyword::DATABASE)? {
            let if_not_exists = self.parse_if_not_exists()?;
            let name = self.parse_identifier()?;
            return Ok(Statement::CreateDatabase {
                name,
                if_not_exists,
                pos,
            });
        }
        if self.eat_keyword(Keyword::USER)? {
            return self.parse_create_user(pos);
        }
        if self.eat_keyword(Keyword::PROCEDURE)? {
            return self.parse_create_routine(pos, false);
        }
        if self.eat_keyword(Keyword::FUNCTION)? {
            return self.parse_create_routine(pos, true);
        }
        if self.eat_keyword(Keyword::TRIGGER)? {
            return self.parse_create_trigger(pos);
        }
        if self.eat_keyword(Keyword::EVENT)? {
            return self.parse_create_event(pos);
        }

        Err(SyntaxError::expected(
            "TABLE, INDEX, VIEW, DATABASE, USER, PROCEDURE, FUNCTION, TRIGGER or EVENT",
            self.current(),
        ))
    }

    fn parse_if_not_exists(&mut self) -> ParseResult<bool> {
        if self.eat_keyword(Keyword::IF)? {
            self.expect_keyword(Keyword::NOT)?;
            self.expect_keyword(Keyword::EXISTS)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn parse_if_exists(&mut self) -> ParseResult<bool> {
        if self.eat_keyword(Keyword::IF)? {
            self.expect_keyword(Keyword::EXISTS)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // --------------------------------------------------------- CREATE TABLE

    fn parse_create_table(
        &mut self,
        pos: crate::token::Pos,
        temporary: bool,
    ) -> ParseResult<Statement> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_object_name()?;

        self.expect_token(TokenKind::LParen)?;
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        loop {
            if let Some(constraint) = self.parse_optional_table_constraint()? {
                constraints.push(constraint);
            } else {
                columns.push(self.parse_column_def()?);
            }
            if !self.eat_token(TokenKind::Comma)? {
                break;
            }
        }
        self.expect_token(TokenKind::RParen)?;

        let mut engine = None;
        let mut comment = None;
        loop {
            if self.eat_keyword(Keyword::ENGINE)? {
                self.eat_token(TokenKind::Eq)?;
                engine = Some(self.parse_identifier()?);
            } else if self.eat_keyword(Keyword::COMMENT)? {
                self.eat_token(TokenKind::Eq)?;
                comment = Some(self.parse_string()?);
            } else {
                break;
            }
        }

        Ok(Statement::CreateTable(CreateTable {
            name,
            if_not_exists,
            temporary,
            columns,
            constraints,
            engine,
            comment,
            pos,
        }))
    }

    fn parse_optional_table_constraint(&mut self) -> ParseResult<Option<TableConstraint>> {
        let mut name = None;
        if self.check_keyword(Keyword::CONSTRAINT) {
            self.advance()?;
            if !self.check_keyword(Keyword::PRIMARY)
                && !self.check_keyword(Keyword::UNIQUE)
                && !self.check_keyword(Keyword::FOREIGN)
                && !self.check_keyword(Keyword::CHECK)
            {
                name = Some(self.parse_identifier()?);
            }
        } else if !self.constraint_starts_here() {
            return Ok(None);
        }

        if self.eat_keyword(Keyword::PRIMARY)? {
            self.expect_keyword(Keyword::KEY)?;
            let columns = self.parse_identifier_list()?;
            return Ok(Some(TableConstraint::PrimaryKey { columns }));
        }
        if self.eat_keyword(Keyword::UNIQUE)? {
            // UNIQUE KEY / UNIQUE INDEX / UNIQUE
            if !self.eat_keyword(Keyword::KEY)? {
                self.eat_keyword(Keyword::INDEX)?;
            }
            if name.is_none() && !self.check_token(TokenKind::LParen) {
                name = Some(self.parse_identifier()?);
            }
            let columns = self.parse_identifier_list()?;
            return Ok(Some(TableConstraint::Unique { name, columns }));
        }
        if self.eat_keyword(Keyword::FOREIGN)? {
            self.expect_keyword(Keyword::KEY)?;
            if name.is_none() && !self.check_token(TokenKind::LParen) {
                name = Some(self.parse_identifier()?);
            }
            let columns = self.parse_identifier_list()?;
            self.expect_keyword(Keyword::REFERENCES)?;
            let ref_table = self.parse_object_name()?;
            let ref_columns = self.parse_identifier_list()?;
            let (on_delete, on_update) = self.parse_referential_actions()?;
            return Ok(Some(TableConstraint::ForeignKey {
                name,
                columns,
                ref_table,
                ref_columns,
                on_delete,
                on_update,
            }));
        }
        if self.eat_keyword(Keyword::CHECK)? {
            self.expect_token(TokenKind::LParen)?;
            let expr = self.parse_expression()?;
            self.expect_token(TokenKind::RParen)?;
            return Ok(Some(TableConstraint::Check { expr }));
        }

        Err(SyntaxError::expected(
            "PRIMARY KEY, UNIQUE, FOREIGN KEY or CHECK",
            self.current(),
        ))
    }

    fn constraint_starts_here(&self) -> bool {
        matches!(
            self.current().keyword(),
            Some(Keyword::PRIMARY) | Some(Keyword::FOREIGN) | Some(Keyword::CHECK)
        ) || (self.check_keyword(Keyword::UNIQUE))
    }

    /// `ON DELETE` / `ON UPDATE` in either order, at most once each,
    /// defaulting to RESTRICT.
    fn parse_referential_actions(
        &mut self,
    ) -> ParseResult<(ReferentialAction, ReferentialAction)> {
        let mut on_delete = None;
        let mut on_update = None;

        while self.check_keyword(Keyword::ON) {
            let on_token = self.advance()?;
            if self.eat_keyword(Keyword::DELETE)? {
                if on_delete.is_some() {
                    return Err(SyntaxError::new(
                        "Duplicate ON DELETE clause",
                        on_token.offset,
                        on_token.line,
                        on_token.column,
                    ));
                }
                on_delete = Some(self.parse_referential_action()?);
            } else if self.eat_keyword(Keyword::UPDATE)? {
                if on_update.is_some() {
                    return Err(SyntaxError::new(
                        "Duplicate ON UPDATE clause",
                        on_token.offset,
                        on_token.line,
                        on_token.column,
                    ));
                }
                on_update = Some(self.parse_referential_action()?);
            } else {
                return Err(SyntaxError::expected("DELETE or UPDATE", self.current()));
            }
        }

        Ok((
            on_delete.unwrap_or(ReferentialAction::Restrict),
            on_update.unwrap_or(ReferentialAction::Restrict),
        ))
    }

    fn parse_referential_action(&mut self) -> ParseResult<ReferentialAction> {
        if self.eat_keyword(Keyword::RESTRICT)? {
            return Ok(ReferentialAction::Restrict);
        }
        if self.eat_keyword(Keyword::CASCADE)? {
            return Ok(ReferentialAction::Cascade);
        }
        if self.eat_keyword(Keyword::SET)? {
            if self.eat_keyword(Keyword::NULL)? {
                return Ok(ReferentialAction::SetNull);
            }
            self.expect_keyword(Keyword::DEFAULT)?;
            return Ok(ReferentialAction::SetDefault);
        }
        if self.eat_keyword(Keyword::NO)? {
            self.expect_keyword(Keyword::ACTION)?;
            return Ok(ReferentialAction::NoAction);
        }
        Err(SyntaxError::expected(
            "RESTRICT, CASCADE, SET NULL, SET DEFAULT or NO ACTION",
            self.current(),
        ))
    }

    pub(crate) fn parse_column_def(&mut self) -> ParseResult<ColumnDef> {
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        let unsigned = self.eat_keyword(Keyword::UNSIGNED)?;

        let mut def = ColumnDef {
            name,
            data_type,
            unsigned,
            nullable: None,
            default: None,
            auto_increment: false,
            primary_key: false,
            unique: false,
            comment: None,
        };

        loop {
            if self.check_keyword(Keyword::NOT) {
                self.advance()?;
                self.expect_keyword(Keyword::NULL)?;
                def.nullable = Some(false);
            } else if self.eat_keyword(Keyword::NULL)? {
                def.nullable = Some(true);
            } else if self.eat_keyword(Keyword::DEFAULT)? {
                def.default = Some(self.parse_expression()?);
            } else if self.eat_keyword(Keyword::AUTO_INCREMENT)? {
                def.auto_increment = true;
            } else if self.eat_keyword(Keyword::PRIMARY)? {
                self.expect_keyword(Keyword::KEY)?;
                def.primary_key = true;
            } else if self.eat_keyword(Keyword::UNIQUE)? {
                self.eat_keyword(Keyword::KEY)?;
                def.unique = true;
            } else if self.eat_keyword(Keyword::COMMENT)? {
                def.comment = Some(self.parse_string()?);
            } else {
                return Ok(def);
            }
        }
    }

    // --------------------------------------------------- other CREATE forms

    fn parse_create_index(
        &mut self,
        pos: crate::token::Pos,
        unique: bool,
    ) -> ParseResult<Statement> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_identifier()?;
        self.expect_keyword(Keyword::ON)?;
        let table = self.parse_object_name()?;
        let columns = self.parse_identifier_list()?;

        Ok(Statement::CreateIndex(CreateIndex {
            name,
            table,
            columns,
            unique,
            if_not_exists,
            pos,
        }))
    }

    fn parse_create_view(
        &mut self,
        pos: crate::token::Pos,
        or_replace: bool,
    ) -> ParseResult<Statement> {
        let name = self.parse_object_name()?;
        let columns = if self.check_token(TokenKind::LParen) {
            self.parse_identifier_list()?
        } else {
            vec![]
        };
        self.expect_keyword(Keyword::AS)?;
        let query = Box::new(self.parse_select()?);

        Ok(Statement::CreateView(CreateView {
            name,
            columns,
            query,
            or_replace,
            pos,
        }))
    }

    fn parse_create_user(&mut self, pos: crate::token::Pos) -> ParseResult<Statement> {
        let if_not_exists = self.parse_if_not_exists()?;
        let user = self.parse_user_ref()?;
        let password = if self.eat_keyword(Keyword::IDENTIFIED)? {
            self.expect_keyword(Keyword::BY)?;
            Some(self.parse_string()?)
        } else {
            None
        };

        Ok(Statement::CreateUser {
            user,
            password,
            if_not_exists,
            pos,
        })
    }

    /// `'name'` or a bare identifier; the host part defaults to `%`.
    pub(crate) fn parse_user_ref(&mut self) -> ParseResult<UserRef> {
        let name = if self.check_token(TokenKind::StringLit) {
            self.parse_string()?
        } else {
            self.parse_identifier()?
        };
        Ok(UserRef {
            name,
            host: "%".to_string(),
        })
    }

    fn parse_create_routine(
        &mut self,
        pos: crate::token::Pos,
        is_function: bool,
    ) -> ParseResult<Statement> {
        let name = self.parse_object_name()?;

        self.expect_token(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check_token(TokenKind::RParen) {
            params.push(self.parse_routine_param(is_function)?);
            while self.eat_token(TokenKind::Comma)? {
                params.push(self.parse_routine_param(is_function)?);
            }
        }
        self.expect_token(TokenKind::RParen)?;

        let returns = if is_function {
            self.expect_keyword(Keyword::RETURNS)?;
            Some(self.parse_data_type()?)
        } else {
            None
        };

        let mut deterministic = None;
        let mut comment = None;
        loop {
            if self.check_keyword(Keyword::NOT)
                && self.peek_kind()? == TokenKind::Keyword(Keyword::DETERMINISTIC)
            {
                self.advance()?;
                self.advance()?;
                deterministic = Some(false);
            } else if self.eat_keyword(Keyword::DETERMINISTIC)? {
                deterministic = Some(true);
            } else if self.eat_keyword(Keyword::COMMENT)? {
                comment = Some(self.parse_string()?);
            } else {
                break;
            }
        }

        let body = Box::new(self.parse_routine_body()?);

        let routine = CreateRoutine {
            name,
            params,
            returns,
            deterministic,
            comment,
            body,
            pos,
        };
        if is_function {
            Ok(Statement::CreateFunction(routine))
        } else {
            Ok(Statement::CreateProcedure(routine))
        }
    }

    fn parse_routine_param(&mut self, is_function: bool) -> ParseResult<crate::ast::RoutineParam> {
        let mode = if is_function {
            ParamMode::In
        } else if self.eat_keyword(Keyword::IN)? {
            ParamMode::In
        } else if self.eat_keyword(Keyword::OUT)? {
            ParamMode::Out
        } else if self.eat_keyword(Keyword::INOUT)? {
            ParamMode::InOut
        } else {
            ParamMode::In
        };
        let name = self.parse_identifier()?;
        let data_type = self.parse_data_type()?;
        Ok(crate::ast::RoutineParam {
            mode,
            name,
            data_type,
        })
    }

    /// `BEGIN … END` block or a single statement.
    pub(crate) fn parse_routine_body(&mut self) -> ParseResult<Statement> {
        if self.check_keyword(Keyword::BEGIN) {
            let pos = self.advance()?.pos();
            let body = self.parse_block_body(&[Keyword::END])?;
            self.expect_keyword(Keyword::END)?;
            return Ok(Statement::Block { body, pos });
        }
        self.parse_statement_inner()
    }

    /// Semicolon-separated statements until one of the terminator keywords.
    pub(crate) fn parse_block_body(
        &mut self,
        terminators: &[Keyword],
    ) -> ParseResult<Vec<Statement>> {
        let mut body = Vec::new();
        loop {
            while self.eat_token(TokenKind::Semicolon)? {}
            if let Some(k) = self.current().keyword() {
                if terminators.contains(&k) {
                    return Ok(body);
                }
            }
            if self.check_token(TokenKind::Eof) {
                return Err(SyntaxError::expected(
                    terminators[0].name(),
                    self.current(),
                ));
            }
            body.push(self.parse_statement_inner()?);
        }
    }

    fn parse_create_trigger(&mut self, pos: crate::token::Pos) -> ParseResult<Statement> {
        let name = self.parse_identifier()?;

        let timing = if self.eat_keyword(Keyword::BEFORE)? {
            TriggerTiming::Before
        } else {
            self.expect_keyword(Keyword::AFTER)?;
            TriggerTiming::After
        };

        let event = if self.eat_keyword(Keyword::INSERT)? {
            TriggerEvent::Insert
        } else if self.eat_keyword(Keyword::UPDATE)? {
            TriggerEvent::Update
        } else {
            self.expect_keyword(Keyword::DELETE)?;
            TriggerEvent::Delete
        };

        self.expect_keyword(Keyword::ON)?;
        let table = self.parse_object_name()?;
        self.expect_keyword(Keyword::FOR)?;
        self.expect_keyword(Keyword::EACH)?;
        self.expect_keyword(Keyword::ROW)?;

        let body = Box::new(self.parse_routine_body()?);

        Ok(Statement::CreateTrigger(CreateTrigger {
            name,
            timing,
            event,
            table,
            body,
            pos,
        }))
    }

    fn parse_create_event(&mut self, pos: crate::token::Pos) -> ParseResult<Statement> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.parse_identifier()?;

        self.expect_keyword(Keyword::ON)?;
        self.expect_keyword(Keyword::SCHEDULE)?;

        let schedule = if self.eat_keyword(Keyword::AT)? {
            EventSchedule::At(self.parse_expression()?)
        } else {
            self.expect_keyword(Keyword::EVERY)?;
            let interval = self.parse_integer()?;
            let unit = self.parse_identifier()?;
            EventSchedule::Every { interval, unit }
        };

        self.expect_keyword(Keyword::DO)?;
        let body = Box::new(self.parse_routine_body()?);

        Ok(Statement::CreateEvent(CreateEvent {
            name,
            if_not_exists,
            schedule,
            body,
            pos,
        }))
    }

    // ------------------------------------------------------------- DROP

    pub(crate) fn parse_drop(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::DROP)?.pos();

        let kind = if self.eat_keyword(Keyword::TABLE)? {
            ObjectKind::Table
        } else if self.eat_keyword(Keyword::INDEX)? {
            ObjectKind::Index
        } else if self.eat_keyword(Keyword::VIEW)? {
            ObjectKind::View
        } else if self.eat_keyword(Keyword::DATABASE)? {
            ObjectKind::Database
        } else if self.eat_keyword(Keyword::USER)? {
            ObjectKind::User
        } else if self.eat_keyword(Keyword::PROCEDURE)? {
            ObjectKind::Procedure
        } else if self.eat_keyword(Keyword::FUNCTION)? {
            ObjectKind::Function
        } else if self.eat_keyword(Keyword::TRIGGER)? {
            ObjectKind::Trigger
        } else if self.eat_keyword(Keyword::EVENT)? {
            ObjectKind::Event
        } else {
            return Err(SyntaxError::expected(
                "TABLE, INDEX, VIEW, DATABASE, USER, PROCEDURE, FUNCTION, TRIGGER or EVENT",
                self.current(),
            ));
        };

        let if_exists = self.parse_if_exists()?;
        let name = self.parse_object_name()?;

        let on_table = if kind == ObjectKind::Index && self.eat_keyword(Keyword::ON)? {
            Some(self.parse_object_name()?)
        } else {
            None
        };

        Ok(Statement::Drop {
            kind,
            name,
            on_table,
            if_exists,
            pos,
        })
    }

    // ------------------------------------------------------------ ALTER

    pub(crate) fn parse_alter(&mut self) -> ParseResult<Statement> {
        let pos = self.expect_keyword(Keyword::ALTER)?.pos();
        self.expect_keyword(Keyword::TABLE)?;
        let table = self.parse_object_name()?;

        let mut actions = vec![self.parse_alter_action()?];
        while self.eat_token(TokenKind::Comma)? {
            actions.push(self.parse_alter_action()?);
        }

        Ok(Statement::AlterTable(AlterTable {
            table,
            actions,
            pos,
        }))
    }

    fn parse_alter_action(&mut self) -> ParseResult<AlterAction> {
        if self.eat_keyword(Keyword::ADD)? {
            if let Some(constraint) = self.parse_optional_table_constraint()? {
                return Ok(AlterAction::AddConstraint(constraint));
            }
            self.eat_keyword(Keyword::COLUMN)?;
            let def = self.parse_column_def()?;
            let mut first = false;
            let mut after = None;
            if self.eat_keyword(Keyword::FIRST)? {
                first = true;
            } else if self.eat_keyword(Keyword::AFTER)? {
                after = Some(self.parse_identifier()?);
            }
            return Ok(AlterAction::AddColumn { def, first, after });
        }

        if self.eat_keyword(Keyword::DROP)? {
            if self.eat_keyword(Keyword::PRIMARY)? {
                self.expect_keyword(Keyword::KEY)?;
                return Ok(AlterAction::DropPrimaryKey);
            }
            if self.eat_keyword(Keyword::INDEX)? {
                return Ok(AlterAction::DropIndex {
                    name: self.parse_identifier()?,
                });
            }
            if self.eat_keyword(Keyword::FOREIGN)? {
                self.expect_keyword(Keyword::KEY)?;
                return Ok(AlterAction::DropForeignKey {
                    name: self.parse_identifier()?,
                });
            }
            self.eat_keyword(Keyword::COLUMN)?;
            return Ok(AlterAction::DropColumn {
                name: self.parse_identifier()?,
            });
        }

        if self.eat_keyword(Keyword::MODIFY)? {
            self.eat_keyword(Keyword::COLUMN)?;
            return Ok(AlterAction::ModifyColumn {
                def: self.parse_column_def()?,
            });
        }

        if self.eat_keyword(Keyword::CHANGE)? {
            self.eat_keyword(Keyword::COLUMN)?;
            let old_name = self.parse_identifier()?;
            return Ok(AlterAction::ChangeColumn {
                old_name,
                def: self.parse_column_def()?,
            });
        }

        if self.eat_keyword(Keyword::RENAME)? {
            if self.eat_keyword(Keyword::COLUMN)? {
                let old_name = self.parse_identifier()?;
                self.expect_keyword(Keyword::TO)?;
                let new_name = self.parse_identifier()?;
                return Ok(AlterAction::RenameColumn { old_name, new_name });
            }
            self.eat_keyword(Keyword::TO)?;
            return Ok(AlterAction::RenameTo {
                name: self.parse_object_name()?,
            });
        }

        Err(SyntaxError::expected(
            "ADD, DROP, MODIFY, CHANGE or RENAME",
            self.current(),
        ))
    }
}
