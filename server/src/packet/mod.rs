pub mod framing;

pub mod column_packet;
pub mod err_packet;
pub mod handshake_packet;
pub mod handshake_response;
pub mod ok_packet;

pub use framing::{PacketReader, PacketWriter};
