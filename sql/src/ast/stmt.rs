use crate::ast::expr::{Expression, VariableScope};
use crate::ast::ObjectName;
use crate::token::Pos;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Box<Select>),
    Insert(Insert),
    Update(Update),
    Delete(Delete),

    CreateTable(CreateTable),
    CreateIndex(CreateIndex),
    CreateView(CreateView),
    CreateDatabase {
        name: String,
        if_not_exists: bool,
        pos: Pos,
    },
    CreateUser {
        user: UserRef,
        password: Option<String>,
        if_not_exists: bool,
        pos: Pos,
    },
    CreateProcedure(CreateRoutine),
    CreateFunction(CreateRoutine),
    CreateTrigger(CreateTrigger),
    CreateEvent(CreateEvent),

    Drop {
        kind: ObjectKind,
        name: ObjectName,
        /// `DROP INDEX idx ON t`
        on_table: Option<ObjectName>,
        if_exists: bool,
        pos: Pos,
    },
    AlterTable(AlterTable),

    Use {
        database: String,
        pos: Pos,
    },
    Show(Show),
    Describe {
        table: ObjectName,
        column: Option<String>,
        pos: Pos,
    },

    StartTransaction {
        pos: Pos,
    },
    Commit {
        pos: Pos,
    },
    Rollback {
        pos: Pos,
    },

    Set(SetStatement),
    Kill {
        connection_id: u64,
        /// `KILL QUERY n` cancels the statement only.
        query_only: bool,
        pos: Pos,
    },
    Grant(GrantRevoke),
    Revoke(GrantRevoke),
    Call {
        name: ObjectName,
        args: Vec<Expression>,
        pos: Pos,
    },

    // stored-procedure control flow
    Declare {
        names: Vec<String>,
        data_type: DataType,
        default: Option<Expression>,
        pos: Pos,
    },
    If(IfStatement),
    While {
        label: Option<String>,
        condition: Expression,
        body: Vec<Statement>,
        pos: Pos,
    },
    Repeat {
        label: Option<String>,
        body: Vec<Statement>,
        until: Expression,
        pos: Pos,
    },
    Loop {
        label: Option<String>,
        body: Vec<Statement>,
        pos: Pos,
    },
    Leave {
        label: String,
        pos: Pos,
    },
    Iterate {
        label: String,
        pos: Pos,
    },
    Return {
        value: Expression,
        pos: Pos,
    },
    Block {
        body: Vec<Statement>,
        pos: Pos,
    },

    Explain {
        analyze: bool,
        statement: Box<Statement>,
        pos: Pos,
    },
    AnalyzeTable {
        tables: Vec<ObjectName>,
        pos: Pos,
    },
    Flush {
        targets: Vec<FlushTarget>,
        pos: Pos,
    },
    LockTables {
        tables: Vec<(ObjectName, LockType)>,
        pos: Pos,
    },
    UnlockTables {
        pos: Pos,
    },
    Optimize {
        tables: Vec<ObjectName>,
        pos: Pos,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    Index,
    View,
    Database,
    User,
    Procedure,
    Function,
    Trigger,
    Event,
}

// ---------------------------------------------------------------- SELECT

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub with: Option<With>,
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Option<TableReference>,
    pub where_clause: Option<Expression>,
    pub group_by: Vec<Expression>,
    pub having: Option<Expression>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<Limit>,
    pub locking: Option<LockingClause>,
    pub set_ops: Vec<SetOperation>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct With {
    pub recursive: bool,
    pub ctes: Vec<Cte>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub columns: Vec<String>,
    pub query: Box<Select>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expression,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByItem {
    pub expr: Expression,
    pub asc: bool,
}

/// `LIMIT b OFFSET a` and `LIMIT a, b` both yield `{limit: b, offset: a}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub limit: u64,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub op: SetOperator,
    pub all: bool,
    pub query: Box<Select>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// `FOR UPDATE`
    Update,
    /// `FOR SHARE`
    Share,
    /// legacy `LOCK IN SHARE MODE`
    ShareLegacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockWait {
    Wait,
    Nowait,
    SkipLocked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LockingClause {
    pub mode: LockMode,
    pub of: Vec<ObjectName>,
    pub wait: LockWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JoinCondition {
    None,
    On(Expression),
    Using(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableReference {
    Table {
        name: ObjectName,
        alias: Option<String>,
    },
    Subquery {
        query: Box<Select>,
        alias: Option<String>,
    },
    Join {
        left: Box<TableReference>,
        join_type: JoinType,
        natural: bool,
        right: Box<TableReference>,
        condition: JoinCondition,
    },
}

// ------------------------------------------------------------------- DML

#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    Values(Vec<Vec<Expression>>),
    Select(Box<Select>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: ObjectName,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: ObjectName,
    pub columns: Vec<String>,
    pub source: InsertSource,
    pub on_duplicate: Vec<Assignment>,
    pub ignore: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableReference,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<Expression>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: ObjectName,
    pub where_clause: Option<Expression>,
    pub order_by: Vec<OrderByItem>,
    pub limit: Option<u64>,
    pub pos: Pos,
}

// ------------------------------------------------------------------- DDL

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Boolean,
    Float,
    Double,
    Decimal {
        precision: Option<u32>,
        scale: Option<u32>,
    },
    Char {
        length: Option<u32>,
    },
    VarChar {
        length: Option<u32>,
    },
    Text,
    Date,
    Time,
    DateTime,
    Timestamp,
    Blob,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub unsigned: bool,
    /// None when neither NULL nor NOT NULL was written.
    pub nullable: Option<bool>,
    pub default: Option<Expression>,
    pub auto_increment: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    NoAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey {
        columns: Vec<String>,
    },
    Unique {
        name: Option<String>,
        columns: Vec<String>,
    },
    ForeignKey {
        name: Option<String>,
        columns: Vec<String>,
        ref_table: ObjectName,
        ref_columns: Vec<String>,
        on_delete: ReferentialAction,
        on_update: ReferentialAction,
    },
    Check {
        expr: Expression,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: ObjectName,
    pub if_not_exists: bool,
    pub temporary: bool,
    pub columns: Vec<ColumnDef>,
    pub constraints: Vec<TableConstraint>,
    pub engine: Option<String>,
    pub comment: Option<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub name: String,
    pub table: ObjectName,
    pub columns: Vec<String>,
    pub unique: bool,
    pub if_not_exists: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateView {
    pub name: ObjectName,
    pub columns: Vec<String>,
    pub query: Box<Select>,
    pub or_replace: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRef {
    pub name: String,
    /// Defaults to `%`.
    pub host: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutineParam {
    pub mode: ParamMode,
    pub name: String,
    pub data_type: DataType,
}

/// CREATE PROCEDURE / CREATE FUNCTION. `returns` is set for functions only.
/// `deterministic` is a characteristic flag, not a semantic guard.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoutine {
    pub name: ObjectName,
    pub params: Vec<RoutineParam>,
    pub returns: Option<DataType>,
    pub deterministic: Option<bool>,
    pub comment: Option<String>,
    pub body: Box<Statement>,
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTrigger {
    pub name: String,
    pub timing: TriggerTiming,
    pub event: TriggerEvent,
    pub table: ObjectName,
    pub body: Box<Statement>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventSchedule {
    /// `ON SCHEDULE AT <ts-expr>`
    At(Expression),
    /// `ON SCHEDULE EVERY <n> <unit>`
    Every { interval: u64, unit: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateEvent {
    pub name: String,
    pub if_not_exists: bool,
    pub schedule: EventSchedule,
    pub body: Box<Statement>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn {
        def: ColumnDef,
        first: bool,
        after: Option<String>,
    },
    DropColumn {
        name: String,
    },
    ModifyColumn {
        def: ColumnDef,
    },
    ChangeColumn {
        old_name: String,
        def: ColumnDef,
    },
    RenameColumn {
        old_name: String,
        new_name: String,
    },
    RenameTo {
        name: ObjectName,
    },
    AddConstraint(TableConstraint),
    DropPrimaryKey,
    DropIndex {
        name: String,
    },
    DropForeignKey {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub table: ObjectName,
    pub actions: Vec<AlterAction>,
    pub pos: Pos,
}

// ------------------------------------------------------------------ misc

#[derive(Debug, Clone, PartialEq)]
pub enum Show {
    Databases {
        like: Option<String>,
    },
    Tables {
        database: Option<String>,
        like: Option<String>,
    },
    Columns {
        table: ObjectName,
        like: Option<String>,
    },
    CreateTable {
        table: ObjectName,
    },
    Variables {
        scope: Option<VariableScope>,
        like: Option<String>,
    },
    Status {
        scope: Option<VariableScope>,
        like: Option<String>,
    },
    Processlist,
    Engines,
    Collation,
    Charset,
    Warnings,
    Errors,
    Grants {
        user: Option<UserRef>,
    },
    Indexes {
        table: ObjectName,
    },
    Triggers {
        database: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetStatement {
    /// `SET [GLOBAL|SESSION] name = value, …`
    Variables {
        assignments: Vec<VariableAssignment>,
        pos: Pos,
    },
    /// `SET NAMES 'utf8mb4'`
    Names {
        charset: String,
        pos: Pos,
    },
    /// `SET [GLOBAL|SESSION] TRANSACTION ISOLATION LEVEL …`
    TransactionIsolation {
        scope: Option<VariableScope>,
        level: IsolationLevel,
        pos: Pos,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableAssignment {
    pub scope: Option<VariableScope>,
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrantRevoke {
    pub privileges: Vec<String>,
    /// `*.*`, `db.*`, `db.table`
    pub object: ObjectName,
    pub user: UserRef,
    pub with_grant_option: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    /// Condition/body pairs: IF plus any ELSEIFs in order.
    pub branches: Vec<(Expression, Vec<Statement>)>,
    pub else_branch: Option<Vec<Statement>>,
    pub pos: Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTarget {
    Privileges,
    Tables,
    Logs,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Read,
    Write,
}
