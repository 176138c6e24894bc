//! Collaborator seams consumed by the protocol layer, plus in-memory
//! reference implementations that make the server runnable and testable
//! without the storage engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use sha1::{Digest, Sha1};
use tracing::warn;

use common::config::ServerConfig;
use common::resultset::{ColumnMeta, ResultSet};
use common::schema::{ColumnSchema, TableSchema};
use common::types::{DataValue, SqlType};

use sql::ast::{DataType, Expression, InsertSource, Literal, Select, Statement};

use crate::error::{SResult, ServerError};

/// What one statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteResult {
    Query(ResultSet),
    Modification {
        affected_rows: u64,
        last_insert_id: u64,
    },
    Ddl(String),
    Empty,
}

pub trait Catalog: Send + Sync {
    fn get_table_schema(&self, db: &str, table: &str) -> Option<TableSchema>;

    fn has_database(&self, db: &str) -> bool;
}

pub trait Executor: Send + Sync {
    fn current_database(&self) -> String;

    fn set_current_database(&self, db: &str);

    fn execute(&self, sql: &str) -> SResult<ExecuteResult>;
}

pub trait UserManager: Send + Sync {
    fn validate(&self, username: &str, auth_response: &[u8], salt: &[u8], client_host: &str)
        -> bool;
}

/// Everything a connection worker needs, bundled so tests can build fully
/// private instances instead of process globals.
#[derive(Clone)]
pub struct ServerContext {
    pub config: Arc<ServerConfig>,
    pub catalog: Arc<dyn Catalog>,
    pub executor: Arc<dyn Executor>,
    pub user_manager: Arc<dyn UserManager>,
    started_at: Instant,
}

impl ServerContext {
    pub fn new(
        config: ServerConfig,
        catalog: Arc<dyn Catalog>,
        executor: Arc<dyn Executor>,
        user_manager: Arc<dyn UserManager>,
    ) -> Self {
        ServerContext {
            config: Arc::new(config),
            catalog,
            executor,
            user_manager,
            started_at: Instant::now(),
        }
    }

    /// Memory-backed context with one open user account.
    pub fn in_memory(config: ServerConfig, username: &str, password: &str) -> Self {
        let catalog = Arc::new(MemoryCatalog::with_database("mysql"));
        let executor = Arc::new(EchoExecutor::new(Arc::clone(&catalog)));
        let mut users = MemoryUserManager::new();
        users.add_user(username, password);
        ServerContext::new(config, catalog, executor, Arc::new(users))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

// ------------------------------------------------------------ catalog

/// Databases and table schemas behind one lock.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    databases: Mutex<HashMap<String, HashMap<String, TableSchema>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog::default()
    }

    pub fn with_database(name: &str) -> Self {
        let catalog = MemoryCatalog::new();
        catalog.add_database(name);
        catalog
    }

    pub fn add_database(&self, name: &str) {
        self.databases
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default();
    }

    pub fn add_table(&self, db: &str, schema: TableSchema) {
        self.databases
            .lock()
            .unwrap()
            .entry(db.to_string())
            .or_default()
            .insert(schema.table.clone(), schema);
    }

    pub fn drop_table(&self, db: &str, table: &str) {
        if let Some(tables) = self.databases.lock().unwrap().get_mut(db) {
            tables.remove(table);
        }
    }
}

impl Catalog for MemoryCatalog {
    fn get_table_schema(&self, db: &str, table: &str) -> Option<TableSchema> {
        self.databases.lock().unwrap().get(db)?.get(table).cloned()
    }

    fn has_database(&self, db: &str) -> bool {
        self.databases.lock().unwrap().contains_key(db)
    }
}

// ------------------------------------------------------- user manager

/// `mysql_native_password` challenge token:
/// `SHA1(password) XOR SHA1(salt + SHA1(SHA1(password)))`.
pub fn native_password_token(password: &str, salt: &[u8]) -> Vec<u8> {
    let password_hash = sha1_bytes(password.as_bytes());
    let concat_hash = [salt.to_vec(), sha1_bytes(&password_hash)].concat();
    xor(&password_hash, &sha1_bytes(&concat_hash))
}

fn sha1_bytes(value: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    hasher.update(value);
    hasher.finalize().as_slice().to_vec()
}

fn xor(slice1: &[u8], slice2: &[u8]) -> Vec<u8> {
    let mut result = vec![0u8; slice1.len()];
    for i in 0..result.len() {
        result[i] = slice1[i] ^ slice2[i % slice2.len()];
    }
    result
}

/// Plaintext account store; validates the client's challenge response
/// against the per-connection salt.
#[derive(Debug, Default)]
pub struct MemoryUserManager {
    users: HashMap<String, String>,
}

impl MemoryUserManager {
    pub fn new() -> Self {
        MemoryUserManager::default()
    }

    pub fn add_user(&mut self, username: &str, password: &str) {
        self.users
            .insert(username.to_string(), password.to_string());
    }
}

impl UserManager for MemoryUserManager {
    fn validate(
        &self,
        username: &str,
        auth_response: &[u8],
        salt: &[u8],
        _client_host: &str,
    ) -> bool {
        let password = match self.users.get(username) {
            Some(password) => password,
            None => return false,
        };
        if password.is_empty() {
            return auth_response.is_empty();
        }
        native_password_token(password, salt) == auth_response
    }
}

// ----------------------------------------------------------- executor

/// Reference executor: evaluates constant SELECTs, keeps the catalog in
/// sync for DDL, and acknowledges everything else. Real plans live behind
/// the same trait in the storage engine.
pub struct EchoExecutor {
    catalog: Arc<MemoryCatalog>,
    current_database: Mutex<String>,
    next_insert_id: AtomicU64,
}

impl EchoExecutor {
    pub fn new(catalog: Arc<MemoryCatalog>) -> Self {
        EchoExecutor {
            catalog,
            current_database: Mutex::new(String::new()),
            next_insert_id: AtomicU64::new(1),
        }
    }

    fn execute_statement(&self, statement: &Statement) -> SResult<ExecuteResult> {
        match statement {
            Statement::Select(select) => Ok(ExecuteResult::Query(self.run_select(select))),
            Statement::Insert(insert) => {
                let affected_rows = match &insert.source {
                    InsertSource::Values(rows) => rows.len() as u64,
                    InsertSource::Select(_) => 0,
                };
                let last_insert_id = self
                    .next_insert_id
                    .fetch_add(affected_rows.max(1), Ordering::Relaxed);
                Ok(ExecuteResult::Modification {
                    affected_rows,
                    last_insert_id,
                })
            }
            Statement::Update(_) | Statement::Delete(_) => Ok(ExecuteResult::Modification {
                affected_rows: 0,
                last_insert_id: 0,
            }),
            Statement::CreateTable(create) => {
                let db = if create.name.parts.len() > 1 {
                    create.name.parts[0].clone()
                } else {
                    self.current_database()
                };
                let columns = create
                    .columns
                    .iter()
                    .map(|c| ColumnSchema::new(&c.name, ast_type_to_sql_type(&c.data_type)))
                    .collect();
                self.catalog
                    .add_table(&db, TableSchema::new(&db, create.name.last(), columns));
                Ok(ExecuteResult::Ddl("Table created".to_string()))
            }
            Statement::CreateDatabase { name, .. } => {
                self.catalog.add_database(name);
                Ok(ExecuteResult::Ddl("Database created".to_string()))
            }
            Statement::Drop { name, .. } => {
                self.catalog.drop_table(&self.current_database(), name.last());
                Ok(ExecuteResult::Ddl("Dropped".to_string()))
            }
            Statement::Use { database, .. } => {
                if !self.catalog.has_database(database) {
                    return Err(ServerError::UnknownDatabase(database.clone()));
                }
                self.set_current_database(database);
                Ok(ExecuteResult::Ddl("Database changed".to_string()))
            }
            Statement::Kill { connection_id, .. } => {
                warn!(
                    "KILL {} acknowledged; connection termination is not supported",
                    connection_id
                );
                Ok(ExecuteResult::Empty)
            }
            Statement::StartTransaction { .. }
            | Statement::Commit { .. }
            | Statement::Rollback { .. }
            | Statement::Set(_) => Ok(ExecuteResult::Empty),
            _ => Ok(ExecuteResult::Ddl("OK".to_string())),
        }
    }

    /// Constant SELECTs produce real rows; table reads produce the column
    /// layout with no rows.
    fn run_select(&self, select: &Select) -> ResultSet {
        let mut columns = Vec::new();
        let mut row = Vec::new();

        for item in &select.items {
            let name = item
                .alias
                .clone()
                .unwrap_or_else(|| item.expr.to_string());
            let value = evaluate_constant(&item.expr);
            let type_tag = match value {
                DataValue::Null => SqlType::Null,
                ref v => v.sql_type(),
            };
            columns.push(ColumnMeta::new(&name, type_tag));
            row.push(value);
        }

        if select.from.is_none() {
            return ResultSet::new(columns, vec![row]);
        }
        ResultSet::new(columns, vec![])
    }

    pub fn catalog(&self) -> Arc<MemoryCatalog> {
        Arc::clone(&self.catalog)
    }
}

impl Executor for EchoExecutor {
    fn current_database(&self) -> String {
        self.current_database.lock().unwrap().clone()
    }

    fn set_current_database(&self, db: &str) {
        *self.current_database.lock().unwrap() = db.to_string();
    }

    fn execute(&self, sql: &str) -> SResult<ExecuteResult> {
        if sql.trim().is_empty() {
            return Ok(ExecuteResult::Empty);
        }
        let statement = sql::parse_statement(sql).map_err(ServerError::Syntax)?;
        self.execute_statement(&statement)
    }
}

fn evaluate_constant(expr: &Expression) -> DataValue {
    match expr {
        Expression::Literal { value, .. } => match value {
            Literal::Null => DataValue::Null,
            Literal::Boolean(b) => DataValue::Boolean(*b),
            Literal::Integer(i) => {
                if *i >= i32::MIN as i64 && *i <= i32::MAX as i64 {
                    DataValue::Int(*i as i32)
                } else {
                    DataValue::BigInt(*i)
                }
            }
            Literal::Float(f) => DataValue::Double(*f),
            Literal::String(s) => DataValue::VarChar(s.clone()),
        },
        _ => DataValue::Null,
    }
}

fn ast_type_to_sql_type(data_type: &DataType) -> SqlType {
    match data_type {
        DataType::TinyInt => SqlType::TinyInt,
        DataType::SmallInt => SqlType::SmallInt,
        DataType::Int => SqlType::Int,
        DataType::BigInt => SqlType::BigInt,
        DataType::Boolean => SqlType::Boolean,
        DataType::Float => SqlType::Float,
        DataType::Double => SqlType::Double,
        DataType::Decimal { .. } => SqlType::Decimal,
        DataType::Char { .. } => SqlType::Char,
        DataType::VarChar { .. } => SqlType::VarChar,
        DataType::Text => SqlType::Text,
        DataType::Date => SqlType::Date,
        DataType::Time => SqlType::Time,
        DataType::DateTime => SqlType::DateTime,
        DataType::Timestamp => SqlType::Timestamp,
        DataType::Blob => SqlType::Blob,
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use common::types::{DataValue, SqlType};

    use super::{
        native_password_token, Catalog, EchoExecutor, Executor, ExecuteResult, MemoryCatalog,
        MemoryUserManager, UserManager,
    };

    fn executor() -> EchoExecutor {
        EchoExecutor::new(Arc::new(MemoryCatalog::with_database("mysql")))
    }

    #[test]
    fn test_select_one() {
        let result = executor().execute("SELECT 1").unwrap();
        match result {
            ExecuteResult::Query(rs) => {
                assert_eq!(1, rs.columns.len());
                assert_eq!("1", rs.columns[0].name);
                assert_eq!(SqlType::Int, rs.columns[0].type_tag);
                assert_eq!(vec![vec![DataValue::Int(1)]], rs.rows);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_sql_is_empty_result() {
        assert_eq!(ExecuteResult::Empty, executor().execute("   ").unwrap());
    }

    #[test]
    fn test_insert_counts_tuples() {
        let executor = executor();
        executor.set_current_database("mysql");
        executor
            .execute("CREATE TABLE t(id INT PRIMARY KEY, name VARCHAR(32))")
            .unwrap();
        assert!(executor
            .catalog()
            .get_table_schema("mysql", "t")
            .is_some());

        match executor
            .execute("INSERT INTO t VALUES (1,'a'),(2,'b')")
            .unwrap()
        {
            ExecuteResult::Modification { affected_rows, .. } => assert_eq!(2, affected_rows),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_use_unknown_database() {
        assert!(executor().execute("USE nope").is_err());
    }

    #[test]
    fn test_native_password_validation() {
        let mut users = MemoryUserManager::new();
        users.add_user("root", "secret");
        let salt = [3u8; 20];

        let token = native_password_token("secret", &salt);
        assert_eq!(20, token.len());
        assert!(users.validate("root", &token, &salt, "localhost"));
        assert!(!users.validate("root", &[0u8; 20], &salt, "localhost"));
        assert!(!users.validate("ghost", &token, &salt, "localhost"));

        // per-connection salts produce different tokens
        assert_ne!(token, native_password_token("secret", &[4u8; 20]));
    }
}
