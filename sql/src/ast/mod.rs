//! Statement and expression trees. Nodes are plain data, immutable after
//! construction, and every node keeps the position of its first token for
//! error reporting.

pub mod expr;
pub mod stmt;

pub use expr::*;
pub use stmt::*;

use crate::token::Pos;

/// Possibly-qualified object name (`db.table`, `table`, `db.table.column`).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectName {
    pub parts: Vec<String>,
    pub pos: Pos,
}

impl ObjectName {
    pub fn simple(name: &str, pos: Pos) -> Self {
        ObjectName {
            parts: vec![name.to_string()],
            pos,
        }
    }

    pub fn last(&self) -> &str {
        self.parts.last().map(|s| s.as_str()).unwrap_or("")
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.parts.join("."))
    }
}
