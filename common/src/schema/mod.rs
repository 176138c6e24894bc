use serde::Serialize;

use crate::types::SqlType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: SqlType,
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: &str, data_type: SqlType) -> Self {
        ColumnSchema {
            name: name.to_string(),
            data_type,
            nullable: true,
        }
    }
}

/// Column layout of one table, the contract between catalog, executor and
/// the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub database: String,
    pub table: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(database: &str, table: &str, columns: Vec<ColumnSchema>) -> Self {
        TableSchema {
            database: database.to_string(),
            table: table.to_string(),
            columns,
        }
    }

    pub fn column_types(&self) -> Vec<SqlType> {
        self.columns.iter().map(|c| c.data_type).collect()
    }
}
