pub mod connection;
pub mod handshake;

pub use connection::Connection;
