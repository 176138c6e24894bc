use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::err::{CResult, CoreError};

/// Listener and connection-fleet tuning. Every field has a serde default so
/// partial YAML files work; `ServerConfig::default()` is the documented
/// baseline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Connection cap, 0 = unlimited.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,

    /// Idle sweep threshold in seconds, 0 = disabled.
    #[serde(default = "default_client_idle_timeout")]
    pub client_idle_timeout_secs: u64,

    /// Sweeper period in seconds.
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval_secs: u64,

    #[serde(default = "default_backlog")]
    pub backlog: u32,

    #[serde(default = "default_true")]
    pub tcp_no_delay: bool,

    #[serde(default = "default_true")]
    pub tcp_keep_alive: bool,

    #[serde(default = "default_keep_alive_time")]
    pub tcp_keep_alive_time_secs: u64,

    #[serde(default = "default_keep_alive_interval")]
    pub tcp_keep_alive_interval_secs: u64,

    #[serde(default = "default_keep_alive_retry")]
    pub tcp_keep_alive_retry_count: u32,

    #[serde(default = "default_buffer_size")]
    pub receive_buffer_size: usize,

    #[serde(default = "default_buffer_size")]
    pub send_buffer_size: usize,

    #[serde(default = "default_true")]
    pub reuse_address: bool,

    /// Drain window in seconds for graceful shutdown.
    #[serde(default = "default_graceful_shutdown_timeout")]
    pub graceful_shutdown_timeout_secs: u64,

    /// Advertised in the initial handshake packet.
    #[serde(default = "default_server_version")]
    pub server_version: String,
}

fn default_port() -> u16 {
    3306
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_max_clients() -> usize {
    10000
}

fn default_client_idle_timeout() -> u64 {
    300
}

fn default_health_check_interval() -> u64 {
    30
}

fn default_backlog() -> u32 {
    128
}

fn default_true() -> bool {
    true
}

fn default_keep_alive_time() -> u64 {
    60
}

fn default_keep_alive_interval() -> u64 {
    10
}

fn default_keep_alive_retry() -> u32 {
    3
}

fn default_buffer_size() -> usize {
    64 * 1024
}

fn default_graceful_shutdown_timeout() -> u64 {
    30
}

fn default_server_version() -> String {
    "8.0.32-cyscaledb".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        serde_yaml::from_str("{}").expect("empty config must deserialize")
    }
}

impl ServerConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> CResult<Self> {
        let content = fs::read_to_string(path)?;
        ServerConfig::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> CResult<Self> {
        serde_yaml::from_str(content).map_err(|e| CoreError::ConfigError(e.to_string()))
    }

    pub fn client_idle_timeout(&self) -> Option<Duration> {
        if self.client_idle_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.client_idle_timeout_secs))
        }
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn graceful_shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod test {
    use super::ServerConfig;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(3306, config.port);
        assert_eq!("0.0.0.0", config.bind_address);
        assert_eq!(10000, config.max_clients);
        assert_eq!(300, config.client_idle_timeout_secs);
        assert_eq!(30, config.health_check_interval_secs);
        assert_eq!(128, config.backlog);
        assert!(config.tcp_no_delay);
        assert_eq!(64 * 1024, config.receive_buffer_size);
    }

    #[test]
    fn test_partial_yaml() {
        let config = ServerConfig::from_yaml("port: 3307\nmax_clients: 5\n").unwrap();
        assert_eq!(3307, config.port);
        assert_eq!(5, config.max_clients);
        // untouched keys keep their defaults
        assert_eq!(128, config.backlog);
        assert!(config.reuse_address);
    }

    #[test]
    fn test_idle_timeout_disabled() {
        let config = ServerConfig::from_yaml("client_idle_timeout_secs: 0\n").unwrap();
        assert!(config.client_idle_timeout().is_none());
    }
}
