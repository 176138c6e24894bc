pub mod config;
pub mod err;
pub mod log;
pub mod resultset;
pub mod schema;
pub mod server;
pub mod spill;
pub mod types;
