use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::codec::{read_null_term_string, write_null_term_string};
use crate::declar::{AUTH_PLUGIN_NAME, UTF8_MB4_GENERAL_CI};
use crate::error::{SResult, ServerError};

pub const PROTOCOL_VERSION: u8 = 10;
pub const SALT_LENGTH: usize = 20;

/// Initial HandshakeV10, sent by the server as packet 0 of every
/// connection.
#[derive(Debug, Clone)]
pub struct HandshakePacket {
    pub server_version: String,
    pub connection_id: u32,
    pub salt: [u8; SALT_LENGTH],
    pub capabilities: u32,
    pub status_flags: u16,
}

impl HandshakePacket {
    pub fn new(
        server_version: &str,
        connection_id: u32,
        salt: [u8; SALT_LENGTH],
        capabilities: u32,
        status_flags: u16,
    ) -> Self {
        HandshakePacket {
            server_version: server_version.to_string(),
            connection_id,
            salt,
            capabilities,
            status_flags,
        }
    }

    pub fn serialize(&self) -> SResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(128);

        buf.write_u8(PROTOCOL_VERSION)?;
        write_null_term_string(&mut buf, &self.server_version)?;
        buf.write_u32::<LittleEndian>(self.connection_id)?;

        // salt part 1 + filler
        buf.write_all(&self.salt[..8])?;
        buf.write_u8(0)?;

        buf.write_u16::<LittleEndian>((self.capabilities & 0xFFFF) as u16)?;
        buf.write_u8(UTF8_MB4_GENERAL_CI)?;
        buf.write_u16::<LittleEndian>(self.status_flags)?;
        buf.write_u16::<LittleEndian>((self.capabilities >> 16) as u16)?;

        // length of auth plugin data, then 10 reserved bytes
        buf.write_u8(21)?;
        buf.write_all(&[0u8; 10])?;

        // salt part 2, zero-padded to 13 bytes
        let mut part2 = [0u8; 13];
        part2[..SALT_LENGTH - 8].copy_from_slice(&self.salt[8..]);
        buf.write_all(&part2)?;

        write_null_term_string(&mut buf, AUTH_PLUGIN_NAME)?;
        Ok(buf)
    }

    /// Client-side layout check, used by the in-process test client.
    pub fn parse(packet: &[u8]) -> SResult<Self> {
        let mut cursor = Cursor::new(packet);

        let protocol_version = cursor.read_u8()?;
        if protocol_version != PROTOCOL_VERSION {
            return Err(ServerError::Protocol(format!(
                "unsupported protocol version {}",
                protocol_version
            )));
        }

        let server_version = read_null_term_string(&mut cursor)?;
        let connection_id = cursor.read_u32::<LittleEndian>()?;

        let mut salt = [0u8; SALT_LENGTH];
        cursor.read_exact(&mut salt[..8])?;
        let _filler = cursor.read_u8()?;

        let cap_low = cursor.read_u16::<LittleEndian>()? as u32;
        let _charset = cursor.read_u8()?;
        let status_flags = cursor.read_u16::<LittleEndian>()?;
        let cap_high = cursor.read_u16::<LittleEndian>()? as u32;

        let _auth_data_len = cursor.read_u8()?;
        let mut reserved = [0u8; 10];
        cursor.read_exact(&mut reserved)?;

        let mut part2 = [0u8; 13];
        cursor.read_exact(&mut part2)?;
        salt[8..].copy_from_slice(&part2[..SALT_LENGTH - 8]);

        let _plugin = read_null_term_string(&mut cursor)?;

        Ok(HandshakePacket {
            server_version,
            connection_id,
            salt,
            capabilities: cap_low | (cap_high << 16),
            status_flags,
        })
    }
}
