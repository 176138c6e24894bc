//! Per-connection command loop: one packet in, zero or more packets out,
//! repeat until COM_QUIT or a fatal protocol/io error.

use std::io::Cursor;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::Notify;
use tracing::{debug, instrument, warn};

use common::resultset::ColumnMeta;

use sql::ast::{Expression, Literal, SetStatement, Statement};

use crate::context::{ExecuteResult, ServerContext};
use crate::conn::handshake::perform_handshake;
use crate::declar::command_type::CommandType;
use crate::declar::status_flags::SERVER_MORE_RESULTS_EXISTS;
use crate::error::{SResult, ServerError};
use crate::packet::err_packet::ErrPacket;
use crate::packet::column_packet::{
    serialize_column_count, serialize_column_definition, serialize_text_row,
};
use crate::packet::ok_packet::{EofPacket, OkPacket};
use crate::packet::{PacketReader, PacketWriter};
use crate::session::Session;

pub struct Connection<S> {
    reader: PacketReader<ReadHalf<S>>,
    writer: PacketWriter<WriteHalf<S>>,
    ctx: ServerContext,
    session: Session,
    connection_id: u32,
    remote: String,
    close_signal: Arc<Notify>,
    activity_clock: Option<Arc<AtomicI64>>,
}

impl<S: AsyncRead + AsyncWrite + Send> Connection<S> {
    pub fn new(
        stream: S,
        ctx: ServerContext,
        connection_id: u32,
        remote: &str,
        close_signal: Arc<Notify>,
    ) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Connection {
            reader: PacketReader::new(read_half),
            writer: PacketWriter::new(write_half),
            ctx,
            // placeholder until the handshake fills in the negotiated state
            session: Session::new(
                connection_id as u64,
                crate::declar::capability_flags::CapabilityFlags::empty(),
                "",
                remote,
            ),
            connection_id,
            remote: remote.to_string(),
            close_signal,
            activity_clock: None,
        }
    }

    /// Share the manager-owned clock so the idle sweeper sees activity.
    pub fn with_activity_clock(mut self, clock: Arc<AtomicI64>) -> Self {
        self.activity_clock = Some(clock);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Connection phase then command phase. Returns cleanly on COM_QUIT,
    /// client disconnect, or an external close; fatal errors propagate.
    #[instrument(skip(self), fields(id = self.connection_id))]
    pub async fn run(&mut self) -> SResult<()> {
        let host = self
            .remote
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| self.remote.clone());

        let outcome = perform_handshake(
            &mut self.reader,
            &mut self.writer,
            &self.ctx,
            self.connection_id,
            &host,
        )
        .await?;

        self.session = Session::new(
            self.connection_id as u64,
            outcome.capabilities,
            &outcome.username,
            &self.remote,
        );
        if let Some(database) = outcome.database {
            self.session.current_database = database;
        }
        if let Some(clock) = &self.activity_clock {
            self.session.set_activity_clock(Arc::clone(clock));
        }

        loop {
            // both sequence counters restart for every command cycle
            self.reader.reset_seq();
            self.writer.reset_seq();

            let payload = tokio::select! {
                packet = self.reader.read_packet() => match packet {
                    Ok(payload) => payload,
                    Err(ServerError::Io(e))
                        if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        debug!("client disconnected");
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                },
                _ = self.close_signal.notified() => {
                    debug!("connection closed by server");
                    return Ok(());
                }
            };

            if payload.is_empty() {
                return Err(ServerError::Protocol("empty command packet".to_string()));
            }
            self.session.touch();
            self.writer.set_seq(self.reader.expected_seq());

            let code = payload[0];
            let body = &payload[1..];

            match CommandType::try_from(code) {
                Ok(CommandType::Quit) => {
                    debug!("COM_QUIT");
                    return Ok(());
                }
                Ok(command) => {
                    if let Err(e) = self.dispatch(command, body).await {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        self.send_error(&e).await?;
                    }
                }
                Err(_) => {
                    self.send_error(&ServerError::UnsupportedCommand(code)).await?;
                }
            }
        }
    }

    async fn dispatch(&mut self, command: CommandType, body: &[u8]) -> SResult<()> {
        match command {
            CommandType::Quit => Ok(()),
            CommandType::InitDb => self.handle_init_db(body).await,
            CommandType::Query => self.handle_query(body).await,
            CommandType::FieldList => self.handle_field_list(body).await,
            CommandType::Statistics => self.handle_statistics().await,
            CommandType::Ping => self.send_ok(0, 0).await,
            CommandType::ChangeUser => self.send_ok(0, 0).await,
            CommandType::ResetConnection => {
                self.session.reset();
                self.send_ok(0, 0).await
            }
            CommandType::SetOption => self.handle_set_option(body).await,
        }
    }

    /// COM_INIT_DB payload is the raw database name, no terminator.
    async fn handle_init_db(&mut self, body: &[u8]) -> SResult<()> {
        let database = String::from_utf8_lossy(body).to_string();
        if !self.ctx.catalog.has_database(&database) {
            return Err(ServerError::UnknownDatabase(database));
        }
        self.session.current_database = database.clone();
        self.ctx.executor.set_current_database(&database);
        self.send_ok(0, 0).await
    }

    async fn handle_query(&mut self, body: &[u8]) -> SResult<()> {
        let sql = String::from_utf8_lossy(body).to_string();
        debug!("COM_QUERY: {}", sql);
        self.session.query_count += 1;

        if sql.trim().is_empty() {
            let result = self.ctx.executor.execute(&sql)?;
            return self.send_result(&result, self.session.status_flags()).await;
        }

        let statements = match sql::parse_multiple_spanned(&sql) {
            Ok(statements) => statements,
            Err(e) => return Err(ServerError::Syntax(e)),
        };
        if statements.len() > 1 && !self.session.multi_statements_allowed() {
            return Err(ServerError::Execution(
                "Multi-statement execution is disabled on this connection".to_string(),
            ));
        }

        let last = statements.len().saturating_sub(1);
        for (i, (statement, span)) in statements.iter().enumerate() {
            let result = self.ctx.executor.execute(&sql[span.clone()])?;
            self.apply_session_effects(statement);

            let mut status = self.session.status_flags();
            if i < last {
                status |= SERVER_MORE_RESULTS_EXISTS;
            }
            self.send_result(&result, status).await?;
        }

        if statements.is_empty() {
            // nothing but separators; acknowledge like an empty query
            let result = self.ctx.executor.execute("")?;
            self.send_result(&result, self.session.status_flags()).await?;
        }
        Ok(())
    }

    /// Transaction and option statements mutate per-session state even
    /// though the executor owns their data effects.
    fn apply_session_effects(&mut self, statement: &Statement) {
        match statement {
            Statement::StartTransaction { .. } => self.session.in_transaction = true,
            Statement::Commit { .. } | Statement::Rollback { .. } => {
                self.session.in_transaction = false
            }
            Statement::Use { database, .. } => {
                self.session.current_database = database.clone();
            }
            Statement::Set(SetStatement::Variables { assignments, .. }) => {
                for assignment in assignments {
                    if assignment.name.eq_ignore_ascii_case("autocommit") {
                        if let Some(on) = bool_value(&assignment.value) {
                            self.session.autocommit = on;
                            if on {
                                self.session.in_transaction = false;
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// COM_FIELD_LIST: table name NUL + column wildcard. One column
    /// definition per column, then EOF/OK.
    async fn handle_field_list(&mut self, body: &[u8]) -> SResult<()> {
        let nul = body.iter().position(|&b| b == 0).unwrap_or(body.len());
        let table = String::from_utf8_lossy(&body[..nul]).to_string();

        let schema = self
            .ctx
            .catalog
            .get_table_schema(&self.session.current_database, &table)
            .ok_or_else(|| ServerError::UnknownTable(table.clone()))?;

        for column in &schema.columns {
            let meta = ColumnMeta::with_table(
                &column.name,
                &schema.database,
                &schema.table,
                column.data_type,
            );
            self.writer
                .write_packet(&serialize_column_definition(&meta)?)
                .await?;
        }
        self.send_eof_or_ok(self.session.status_flags()).await
    }

    /// COM_STATISTICS answers with one plain-text packet, not a result
    /// set.
    async fn handle_statistics(&mut self) -> SResult<()> {
        let stats = format!(
            "Uptime: {}  Threads: 1  Questions: {}  Slow queries: 0  Opens: 0  \
             Flush tables: 0  Open tables: 0",
            self.ctx.uptime_secs(),
            self.session.query_count,
        );
        self.writer.write_packet(stats.as_bytes()).await
    }

    /// COM_SET_OPTION payload: u16 LE, 0 enables multi-statements, 1
    /// disables.
    async fn handle_set_option(&mut self, body: &[u8]) -> SResult<()> {
        let mut cursor = Cursor::new(body);
        let option = cursor.read_u16::<LittleEndian>().map_err(|_| {
            ServerError::Protocol("short COM_SET_OPTION payload".to_string())
        })?;
        match option {
            0 => self.session.multi_statements = true,
            1 => self.session.multi_statements = false,
            other => {
                return Err(ServerError::Execution(format!(
                    "Unknown COM_SET_OPTION value {}",
                    other
                )))
            }
        }
        self.send_eof_or_ok(self.session.status_flags()).await
    }

    // ------------------------------------------------- result streaming

    async fn send_result(&mut self, result: &ExecuteResult, status: u16) -> SResult<()> {
        match result {
            ExecuteResult::Query(rs) => {
                self.writer
                    .write_packet(&serialize_column_count(rs.columns.len())?)
                    .await?;
                for column in &rs.columns {
                    self.writer
                        .write_packet(&serialize_column_definition(column)?)
                        .await?;
                }
                if !self.session.use_deprecate_eof() {
                    self.writer
                        .write_packet(&EofPacket::new(status).serialize()?)
                        .await?;
                }
                for row in &rs.rows {
                    self.writer.write_packet(&serialize_text_row(row)?).await?;
                }
                self.send_eof_or_ok(status).await
            }
            ExecuteResult::Modification {
                affected_rows,
                last_insert_id,
            } => {
                self.writer
                    .write_packet(
                        &OkPacket {
                            affected_rows: *affected_rows,
                            last_insert_id: *last_insert_id,
                            status_flags: status,
                            warnings: 0,
                        }
                        .serialize()?,
                    )
                    .await
            }
            ExecuteResult::Ddl(message) => {
                debug!("ddl: {}", message);
                self.writer
                    .write_packet(&OkPacket::new(0, 0, status).serialize()?)
                    .await
            }
            ExecuteResult::Empty => {
                self.writer
                    .write_packet(&OkPacket::new(0, 0, status).serialize()?)
                    .await
            }
        }
    }

    /// Result-set terminator: OK dressed as 0xFE when DEPRECATE_EOF was
    /// negotiated, classical EOF otherwise.
    async fn send_eof_or_ok(&mut self, status: u16) -> SResult<()> {
        let payload = if self.session.use_deprecate_eof() {
            OkPacket::new(0, 0, status).serialize_as_eof()?
        } else {
            EofPacket::new(status).serialize()?
        };
        self.writer.write_packet(&payload).await
    }

    async fn send_ok(&mut self, affected_rows: u64, last_insert_id: u64) -> SResult<()> {
        self.writer
            .write_packet(
                &OkPacket::new(affected_rows, last_insert_id, self.session.status_flags())
                    .serialize()?,
            )
            .await
    }

    async fn send_error(&mut self, err: &ServerError) -> SResult<()> {
        warn!("command failed: {}", err);
        self.writer
            .write_packet(&ErrPacket::from_error(err).serialize()?)
            .await
    }
}

fn bool_value(expr: &Expression) -> Option<bool> {
    match expr {
        Expression::Literal { value, .. } => match value {
            Literal::Integer(i) => Some(*i != 0),
            Literal::Boolean(b) => Some(*b),
            Literal::String(s) => {
                if s.eq_ignore_ascii_case("ON") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("OFF") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        },
        _ => None,
    }
}
