use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::declar::response_type::ResponseType;
use crate::error::{SResult, ServerError};

/// ERR_Packet: 0xFF + code(2 LE) + '#' + 5-byte SQLSTATE + message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrPacket {
    pub error_code: u16,
    pub sql_state: String,
    pub message: String,
}

impl ErrPacket {
    pub fn new(error_code: u16, sql_state: &str, message: &str) -> Self {
        ErrPacket {
            error_code,
            sql_state: sql_state.to_string(),
            message: message.to_string(),
        }
    }

    pub fn from_error(err: &ServerError) -> Self {
        ErrPacket::new(err.error_code(), err.sql_state(), &err.to_string())
    }

    pub fn serialize(&self) -> SResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(16 + self.message.len());
        buf.write_u8(ResponseType::ERROR)?;
        buf.write_u16::<LittleEndian>(self.error_code)?;
        buf.write_u8(b'#')?;
        buf.write_all(&self.sql_state.as_bytes()[..5])?;
        buf.write_all(self.message.as_bytes())?;
        Ok(buf)
    }

    pub fn parse(packet: &[u8]) -> SResult<Self> {
        let mut cursor = Cursor::new(packet);
        let header = cursor.read_u8()?;
        if header != ResponseType::ERROR {
            return Err(ServerError::Protocol("not an error packet".to_string()));
        }
        let error_code = cursor.read_u16::<LittleEndian>()?;

        let marker = cursor.read_u8()?;
        if marker != b'#' {
            return Err(ServerError::Protocol("missing sql state marker".to_string()));
        }
        let mut state = [0u8; 5];
        cursor.read_exact(&mut state)?;

        let mut message = String::new();
        cursor.read_to_string(&mut message)?;

        Ok(ErrPacket {
            error_code,
            sql_state: String::from_utf8_lossy(&state).to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::error::ServerError;

    use super::ErrPacket;

    #[test]
    fn test_round_trip() {
        let err = ErrPacket::new(1064, "42000", "Unexpected token: SELEC");
        let bytes = err.serialize().unwrap();
        assert_eq!(0xFF, bytes[0]);
        assert_eq!(err, ErrPacket::parse(&bytes).unwrap());
    }

    #[test]
    fn test_from_server_error() {
        let packet = ErrPacket::from_error(&ServerError::UnknownDatabase("shop".to_string()));
        assert_eq!(1049, packet.error_code);
        assert_eq!("42000", packet.sql_state);
        assert!(packet.message.contains("shop"));
    }
}
