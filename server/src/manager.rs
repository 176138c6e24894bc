//! Connection fleet bookkeeping: the MaxClients cap, the idle sweep, and
//! read-only stats over live connections.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::info;

use common::config::ServerConfig;

/// Manager-side view of one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: u32,
    pub remote: String,
    pub connected_at: DateTime<Utc>,
    pub activity_clock: Arc<AtomicI64>,
    pub close_signal: Arc<Notify>,
}

impl ConnectionHandle {
    pub fn idle_time(&self) -> Duration {
        let last = self.activity_clock.load(Ordering::Relaxed);
        Duration::from_secs((Utc::now().timestamp() - last).max(0) as u64)
    }
}

#[derive(Debug)]
pub struct ConnectionManager {
    config: Arc<ServerConfig>,
    connections: Mutex<HashMap<u32, ConnectionHandle>>,
    next_id: AtomicU32,
}

impl ConnectionManager {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        ConnectionManager {
            config,
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// None when the MaxClients cap (0 = unlimited) is reached.
    pub fn try_register(&self, remote: &str) -> Option<ConnectionHandle> {
        let mut connections = self.connections.lock().unwrap();
        if self.config.max_clients != 0 && connections.len() >= self.config.max_clients {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = ConnectionHandle {
            id,
            remote: remote.to_string(),
            connected_at: Utc::now(),
            activity_clock: Arc::new(AtomicI64::new(Utc::now().timestamp())),
            close_signal: Arc::new(Notify::new()),
        };
        connections.insert(id, handle.clone());
        Some(handle)
    }

    pub fn deregister(&self, id: u32) {
        self.connections.lock().unwrap().remove(&id);
    }

    /// Close every connection idle past the configured threshold; returns
    /// how many were signalled.
    pub fn sweep_idle(&self) -> usize {
        let timeout = match self.config.client_idle_timeout() {
            Some(timeout) => timeout,
            None => return 0,
        };

        let connections = self.connections.lock().unwrap();
        let mut closed = 0;
        for handle in connections.values() {
            if handle.idle_time() > timeout {
                info!(
                    "closing idle connection {} from {} (idle {:?})",
                    handle.id,
                    handle.remote,
                    handle.idle_time()
                );
                handle.close_signal.notify_one();
                closed += 1;
            }
        }
        closed
    }

    /// Signal every connection to close, for shutdown.
    pub fn close_all(&self) {
        for handle in self.connections.lock().unwrap().values() {
            handle.close_signal.notify_one();
        }
    }

    pub fn handles(&self) -> Vec<ConnectionHandle> {
        self.connections.lock().unwrap().values().cloned().collect()
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use chrono::Utc;

    use common::config::ServerConfig;

    use super::ConnectionManager;

    fn manager(max_clients: usize, idle_secs: u64) -> ConnectionManager {
        let mut config = ServerConfig::default();
        config.max_clients = max_clients;
        config.client_idle_timeout_secs = idle_secs;
        ConnectionManager::new(Arc::new(config))
    }

    #[test]
    fn test_max_clients_cap() {
        let manager = manager(2, 0);
        let a = manager.try_register("c1").unwrap();
        let _b = manager.try_register("c2").unwrap();
        assert!(manager.try_register("c3").is_none());

        manager.deregister(a.id);
        assert!(manager.try_register("c4").is_some());
    }

    #[test]
    fn test_unlimited_when_zero() {
        let manager = manager(0, 0);
        for i in 0..100 {
            assert!(manager.try_register(&format!("c{}", i)).is_some());
        }
        assert_eq!(100, manager.connection_count());
    }

    #[test]
    fn test_sweep_closes_only_idle() {
        let manager = manager(0, 60);
        let idle = manager.try_register("idle").unwrap();
        let _active = manager.try_register("active").unwrap();

        idle.activity_clock
            .store(Utc::now().timestamp() - 120, Ordering::Relaxed);
        assert_eq!(1, manager.sweep_idle());
    }

    #[test]
    fn test_sweep_disabled() {
        let manager = manager(0, 0);
        let handle = manager.try_register("c").unwrap();
        handle
            .activity_clock
            .store(Utc::now().timestamp() - 10_000, Ordering::Relaxed);
        assert_eq!(0, manager.sweep_idle());
    }
}
