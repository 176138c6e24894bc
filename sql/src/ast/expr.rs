use crate::ast::stmt::{OrderByItem, Select};
use crate::token::Pos;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Not,
    /// MySQL `BINARY expr` collation cast.
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
    Some,
}

/// `@@x` resolves to session scope unless spelled `@@global.x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    Global,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    NaturalLanguage,
    Boolean,
    QueryExpansion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnits {
    Rows,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    UnboundedFollowing,
    CurrentRow,
    Preceding(u64),
    Following(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: FrameBound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub name_ref: Option<String>,
    pub partition_by: Vec<Expression>,
    pub order_by: Vec<OrderByItem>,
    pub frame: Option<WindowFrame>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal {
        value: Literal,
        pos: Pos,
    },
    ColumnRef {
        table: Option<String>,
        column: String,
        pos: Pos,
    },
    /// `*` or `t.*` in a select list.
    Wildcard {
        table: Option<String>,
        pos: Pos,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        pos: Pos,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
        pos: Pos,
    },
    FunctionCall {
        name: String,
        distinct: bool,
        args: Vec<Expression>,
        /// `COUNT(*)`
        wildcard: bool,
        /// `GROUP_CONCAT(x ORDER BY y)`
        order_by: Vec<OrderByItem>,
        /// `GROUP_CONCAT(x SEPARATOR ',')`
        separator: Option<String>,
        pos: Pos,
    },
    WindowFunction {
        function: Box<Expression>,
        window: WindowSpec,
        pos: Pos,
    },
    /// Simple CASE carries an operand, searched CASE does not.
    Case {
        operand: Option<Box<Expression>>,
        branches: Vec<(Expression, Expression)>,
        else_branch: Option<Box<Expression>>,
        pos: Pos,
    },
    InList {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
        pos: Pos,
    },
    InSubquery {
        expr: Box<Expression>,
        subquery: Box<Select>,
        negated: bool,
        pos: Pos,
    },
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
        pos: Pos,
    },
    Like {
        expr: Box<Expression>,
        pattern: Box<Expression>,
        negated: bool,
        pos: Pos,
    },
    IsNull {
        expr: Box<Expression>,
        negated: bool,
        pos: Pos,
    },
    Exists {
        subquery: Box<Select>,
        negated: bool,
        pos: Pos,
    },
    /// `x > ALL (SELECT …)` and friends.
    Quantified {
        op: BinaryOperator,
        quantifier: Quantifier,
        expr: Box<Expression>,
        subquery: Box<Select>,
        pos: Pos,
    },
    Subquery {
        query: Box<Select>,
        pos: Pos,
    },
    SystemVariable {
        name: String,
        scope: VariableScope,
        pos: Pos,
    },
    MatchAgainst {
        columns: Vec<Expression>,
        pattern: Box<Expression>,
        mode: Option<MatchMode>,
        pos: Pos,
    },
}

impl Expression {
    pub fn pos(&self) -> Pos {
        match self {
            Expression::Literal { pos, .. }
            | Expression::ColumnRef { pos, .. }
            | Expression::Wildcard { pos, .. }
            | Expression::BinaryOp { pos, .. }
            | Expression::UnaryOp { pos, .. }
            | Expression::FunctionCall { pos, .. }
            | Expression::WindowFunction { pos, .. }
            | Expression::Case { pos, .. }
            | Expression::InList { pos, .. }
            | Expression::InSubquery { pos, .. }
            | Expression::Between { pos, .. }
            | Expression::Like { pos, .. }
            | Expression::IsNull { pos, .. }
            | Expression::Exists { pos, .. }
            | Expression::Quantified { pos, .. }
            | Expression::Subquery { pos, .. }
            | Expression::SystemVariable { pos, .. }
            | Expression::MatchAgainst { pos, .. } => *pos,
        }
    }
}
