pub mod capability_flags;
pub mod command_type;
pub mod response_type;
pub mod status_flags;

pub const PACKET_HEADER_SIZE: usize = 4;

/// Largest payload a single packet can carry; longer payloads span
/// multiple packets.
pub const MAX_PACKET_PAYLOAD: usize = 0xFF_FFFF;

pub const NULL_TERMINATOR: u8 = 0;

/// utf8mb4_general_ci, advertised in the handshake and column definitions.
pub const UTF8_MB4_GENERAL_CI: u8 = 255;

/// Marker byte for a NULL cell in a text protocol row.
pub const NULL_CELL: u8 = 0xFB;

pub const AUTH_PLUGIN_NAME: &str = "mysql_native_password";
