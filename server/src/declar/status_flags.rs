//! Server status word sent in every OK/EOF packet.

/// Is raised when a multi-statement transaction has been started, either
/// explicitly, by means of BEGIN, or implicitly, by the first transactional
/// statement when autocommit=off.
pub const SERVER_STATUS_IN_TRANS: u16 = 0x0001;

/// Server in auto_commit mode.
pub const SERVER_STATUS_AUTOCOMMIT: u16 = 0x0002;

/// Multi query - next query exists.
pub const SERVER_MORE_RESULTS_EXISTS: u16 = 0x0008;

pub const SERVER_SESSION_STATE_CHANGED: u16 = 0x4000;
