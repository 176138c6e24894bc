use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytes::Buf;

use crate::codec::{read_len_enc_str, read_null_term_string, write_len_enc_str,
    write_null_term_string};
use crate::declar::capability_flags::CLIENT_CONNECT_WITH_DB;
use crate::error::{SResult, ServerError};

/// HandshakeResponse41, the client's reply to the initial handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    pub capabilities: u32,
    pub max_packet_size: u32,
    pub charset: u8,
    pub username: String,
    pub auth_response: Vec<u8>,
    pub database: Option<String>,
}

impl HandshakeResponse {
    pub fn parse(packet: &[u8]) -> SResult<Self> {
        if packet.len() < 32 {
            return Err(ServerError::Protocol(
                "handshake response too short".to_string(),
            ));
        }
        let mut cursor = Cursor::new(packet);

        let capabilities = cursor.read_u32::<LittleEndian>()?;
        let max_packet_size = cursor.read_u32::<LittleEndian>()?;
        let charset = cursor.read_u8()?;

        let mut reserved = [0u8; 23];
        cursor.read_exact(&mut reserved)?;

        let username = read_null_term_string(&mut cursor)?;
        let auth_response = read_len_enc_str(&mut cursor)?;

        let database = if capabilities & CLIENT_CONNECT_WITH_DB != 0 && cursor.has_remaining() {
            let db = read_null_term_string(&mut cursor)?;
            if db.is_empty() {
                None
            } else {
                Some(db)
            }
        } else {
            None
        };

        Ok(HandshakeResponse {
            capabilities,
            max_packet_size,
            charset,
            username,
            auth_response,
            database,
        })
    }

    /// Client-side writer used by the in-process test client.
    pub fn serialize(&self) -> SResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(64);
        buf.write_u32::<LittleEndian>(self.capabilities)?;
        buf.write_u32::<LittleEndian>(self.max_packet_size)?;
        buf.write_u8(self.charset)?;
        buf.write_all(&[0u8; 23])?;
        write_null_term_string(&mut buf, &self.username)?;
        write_len_enc_str(&mut buf, &self.auth_response)?;
        if let Some(database) = &self.database {
            write_null_term_string(&mut buf, database)?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use crate::declar::capability_flags::{CLIENT_CONNECT_WITH_DB, CLIENT_PROTOCOL_41};

    use super::HandshakeResponse;

    #[test]
    fn test_round_trip_with_database() {
        let response = HandshakeResponse {
            capabilities: CLIENT_PROTOCOL_41 | CLIENT_CONNECT_WITH_DB,
            max_packet_size: 1 << 24,
            charset: 255,
            username: "root".to_string(),
            auth_response: vec![1, 2, 3],
            database: Some("mysql".to_string()),
        };
        let bytes = response.serialize().unwrap();
        assert_eq!(response, HandshakeResponse::parse(&bytes).unwrap());
    }

    #[test]
    fn test_no_database_without_capability() {
        let response = HandshakeResponse {
            capabilities: CLIENT_PROTOCOL_41,
            max_packet_size: 0,
            charset: 45,
            username: "app".to_string(),
            auth_response: vec![],
            database: None,
        };
        let bytes = response.serialize().unwrap();
        let parsed = HandshakeResponse::parse(&bytes).unwrap();
        assert_eq!(None, parsed.database);
        assert_eq!("app", parsed.username);
    }

    #[test]
    fn test_truncated_is_rejected() {
        assert!(HandshakeResponse::parse(&[0u8; 10]).is_err());
    }
}
