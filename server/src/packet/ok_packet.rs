use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytes::Buf;

use crate::codec::{read_len_enc_int, write_len_enc_int};
use crate::declar::response_type::ResponseType;
use crate::error::SResult;

/// OK_Packet and its 0xFE-headed variant that replaces EOF when
/// DEPRECATE_EOF is negotiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: u16,
    pub warnings: u16,
}

impl OkPacket {
    pub fn new(affected_rows: u64, last_insert_id: u64, status_flags: u16) -> Self {
        OkPacket {
            affected_rows,
            last_insert_id,
            status_flags,
            warnings: 0,
        }
    }

    pub fn serialize(&self) -> SResult<Vec<u8>> {
        self.serialize_with_header(ResponseType::OK)
    }

    /// OK layout under an 0xFE header; payload stays >= 7 bytes so clients
    /// can tell it apart from a legacy EOF.
    pub fn serialize_as_eof(&self) -> SResult<Vec<u8>> {
        self.serialize_with_header(ResponseType::END_OF_FILE)
    }

    fn serialize_with_header(&self, header: u8) -> SResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(16);
        buf.write_u8(header)?;
        write_len_enc_int(&mut buf, self.affected_rows)?;
        write_len_enc_int(&mut buf, self.last_insert_id)?;
        buf.write_u16::<LittleEndian>(self.status_flags)?;
        buf.write_u16::<LittleEndian>(self.warnings)?;
        Ok(buf)
    }

    pub fn parse(packet: &[u8]) -> SResult<Self> {
        let mut cursor = Cursor::new(packet);
        let _header = cursor.read_u8()?;

        let mut affected_rows = 0;
        if cursor.has_remaining() {
            affected_rows = read_len_enc_int(&mut cursor)?;
        }
        let mut last_insert_id = 0;
        if cursor.has_remaining() {
            last_insert_id = read_len_enc_int(&mut cursor)?;
        }
        let mut status_flags = 0u16;
        if cursor.remaining() >= 2 {
            status_flags = cursor.read_u16::<LittleEndian>()?;
        }
        let mut warnings = 0u16;
        if cursor.remaining() >= 2 {
            warnings = cursor.read_u16::<LittleEndian>()?;
        }

        Ok(OkPacket {
            affected_rows,
            last_insert_id,
            status_flags,
            warnings,
        })
    }
}

/// Classical EOF: 0xFE + warnings(2 LE) + status(2 LE), 5 bytes total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EofPacket {
    pub warnings: u16,
    pub status_flags: u16,
}

impl EofPacket {
    pub fn new(status_flags: u16) -> Self {
        EofPacket {
            warnings: 0,
            status_flags,
        }
    }

    pub fn serialize(&self) -> SResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(5);
        buf.write_u8(ResponseType::END_OF_FILE)?;
        buf.write_u16::<LittleEndian>(self.warnings)?;
        buf.write_u16::<LittleEndian>(self.status_flags)?;
        Ok(buf)
    }

    pub fn parse(packet: &[u8]) -> SResult<Self> {
        let mut cursor = Cursor::new(packet);
        let _header = cursor.read_u8()?;
        let warnings = cursor.read_u16::<LittleEndian>()?;
        let status_flags = cursor.read_u16::<LittleEndian>()?;
        Ok(EofPacket {
            warnings,
            status_flags,
        })
    }

    /// 0xFE can also lead a length-encoded integer; only short packets are
    /// EOF.
    pub fn is_eof(packet: &[u8]) -> bool {
        !packet.is_empty() && packet.len() < 9 && packet[0] == ResponseType::END_OF_FILE
    }
}

#[cfg(test)]
mod test {
    use crate::declar::status_flags::SERVER_STATUS_AUTOCOMMIT;

    use super::{EofPacket, OkPacket};

    #[test]
    fn test_ok_round_trip() {
        let ok = OkPacket::new(2, 7, SERVER_STATUS_AUTOCOMMIT);
        let bytes = ok.serialize().unwrap();
        assert_eq!(0x00, bytes[0]);
        assert_eq!(ok, OkPacket::parse(&bytes).unwrap());
    }

    #[test]
    fn test_eof_flavored_ok_layout() {
        let bytes = OkPacket::new(0, 0, SERVER_STATUS_AUTOCOMMIT)
            .serialize_as_eof()
            .unwrap();
        assert_eq!(0xFE, bytes[0]);
        assert!(bytes.len() >= 7);
    }

    #[test]
    fn test_legacy_eof_is_five_bytes() {
        let bytes = EofPacket::new(SERVER_STATUS_AUTOCOMMIT).serialize().unwrap();
        assert_eq!(0xFE, bytes[0]);
        assert_eq!(5, bytes.len());
        assert!(EofPacket::is_eof(&bytes));

        let parsed = EofPacket::parse(&bytes).unwrap();
        assert_eq!(SERVER_STATUS_AUTOCOMMIT, parsed.status_flags);
    }
}
