use std::io;

use thiserror::Error;

use sql::SyntaxError;

pub type SResult<T> = Result<T, ServerError>;

/// Protocol-facing error kinds. Everything except `Protocol` and `Io`
/// leaves the connection usable for the next command.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("Unknown database '{0}'")]
    UnknownDatabase(String),

    #[error("Table '{0}' doesn't exist")]
    UnknownTable(String),

    #[error("Access denied for user '{user}'@'{host}' (using password: {})",
            if *.using_password { "YES" } else { "NO" })]
    AccessDenied {
        user: String,
        host: String,
        using_password: bool,
    },

    #[error("Unknown command: {0:#04x}")]
    UnsupportedCommand(u8),

    #[error("{0}")]
    Execution(String),

    #[error("Too many connections")]
    TooManyConnections,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    pub fn error_code(&self) -> u16 {
        match self {
            ServerError::Syntax(_) => 1064,
            ServerError::UnknownDatabase(_) => 1049,
            ServerError::UnknownTable(_) => 1146,
            ServerError::AccessDenied { .. } => 1045,
            ServerError::UnsupportedCommand(_) => 1047,
            ServerError::Execution(_) => 1064,
            ServerError::TooManyConnections => 1040,
            // never serialized, the connection closes instead
            ServerError::Protocol(_) | ServerError::Io(_) => 2000,
        }
    }

    pub fn sql_state(&self) -> &'static str {
        match self {
            ServerError::Syntax(_) | ServerError::Execution(_) => "42000",
            ServerError::UnknownDatabase(_) => "42000",
            ServerError::UnknownTable(_) => "42S02",
            ServerError::AccessDenied { .. } => "28000",
            ServerError::UnsupportedCommand(_) => "08S01",
            ServerError::TooManyConnections => "08004",
            ServerError::Protocol(_) | ServerError::Io(_) => "HY000",
        }
    }

    /// Fatal errors tear down the socket instead of producing an error
    /// packet.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ServerError::Protocol(_) | ServerError::Io(_) | ServerError::AccessDenied { .. }
        )
    }
}
