use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::declar::capability_flags::{
    CapabilityFlags, CLIENT_DEPRECATE_EOF, CLIENT_MULTI_STATEMENTS,
};
use crate::declar::status_flags::{SERVER_STATUS_AUTOCOMMIT, SERVER_STATUS_IN_TRANS};

/// Per-connection state. Owned by the connection worker; the manager only
/// sees the shared activity clock and read-only snapshots.
#[derive(Debug)]
pub struct Session {
    pub id: u64,
    capabilities: CapabilityFlags,
    pub current_database: String,
    pub username: String,
    pub remote: String,
    pub connected_at: DateTime<Utc>,
    last_activity_at: Arc<AtomicI64>,
    pub query_count: u64,
    pub in_transaction: bool,
    pub autocommit: bool,
    pub multi_statements: bool,
}

impl Session {
    pub fn new(id: u64, capabilities: CapabilityFlags, username: &str, remote: &str) -> Self {
        Session {
            id,
            capabilities,
            current_database: String::new(),
            username: username.to_string(),
            remote: remote.to_string(),
            connected_at: Utc::now(),
            last_activity_at: Arc::new(AtomicI64::new(Utc::now().timestamp())),
            query_count: 0,
            in_transaction: false,
            autocommit: true,
            multi_statements: true,
        }
    }

    pub fn capabilities(&self) -> CapabilityFlags {
        self.capabilities
    }

    pub fn use_deprecate_eof(&self) -> bool {
        self.capabilities.contains(CLIENT_DEPRECATE_EOF)
    }

    pub fn multi_statements_allowed(&self) -> bool {
        self.multi_statements && self.capabilities.contains(CLIENT_MULTI_STATEMENTS)
    }

    /// Served by COM_RESET_CONNECTION.
    pub fn reset(&mut self) {
        self.in_transaction = false;
        self.autocommit = true;
        self.multi_statements = true;
    }

    pub fn touch(&self) {
        self.last_activity_at
            .store(Utc::now().timestamp(), Ordering::Relaxed);
    }

    /// Adopt a clock owned by the connection manager so the idle sweeper
    /// observes activity without touching the session itself.
    pub fn set_activity_clock(&mut self, clock: Arc<AtomicI64>) {
        clock.store(Utc::now().timestamp(), Ordering::Relaxed);
        self.last_activity_at = clock;
    }

    /// Shared with the connection manager for the idle sweep.
    pub fn activity_clock(&self) -> Arc<AtomicI64> {
        Arc::clone(&self.last_activity_at)
    }

    pub fn idle_time(&self) -> Duration {
        let last = self.last_activity_at.load(Ordering::Relaxed);
        let idle = (Utc::now().timestamp() - last).max(0);
        Duration::from_secs(idle as u64)
    }

    /// Status word carried on every OK/EOF.
    pub fn status_flags(&self) -> u16 {
        let mut flags = 0;
        if self.autocommit {
            flags |= SERVER_STATUS_AUTOCOMMIT;
        }
        if self.in_transaction {
            flags |= SERVER_STATUS_IN_TRANS;
        }
        flags
    }

    pub fn get_stats(&self) -> SessionStats {
        SessionStats {
            id: self.id,
            username: self.username.clone(),
            remote: self.remote.clone(),
            current_database: self.current_database.clone(),
            connected_at: self.connected_at,
            query_count: self.query_count,
            in_transaction: self.in_transaction,
        }
    }
}

/// Read-only snapshot for observers.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub id: u64,
    pub username: String,
    pub remote: String,
    pub current_database: String,
    pub connected_at: DateTime<Utc>,
    pub query_count: u64,
    pub in_transaction: bool,
}
