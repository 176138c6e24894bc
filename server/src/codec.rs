//! Length-encoded integer/string codecs from the MySQL wire format.
//!
//! ref: https://dev.mysql.com/doc/internals/en/integer.html

use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::declar::NULL_TERMINATOR;
use crate::error::{SResult, ServerError};

/// `v<251` one byte; then 0xFC+2, 0xFD+3, 0xFE+8, little-endian.
pub fn write_len_enc_int<W: Write>(writer: &mut W, v: u64) -> SResult<()> {
    if v < 251 {
        writer.write_u8(v as u8)?;
    } else if v < (1 << 16) {
        writer.write_u8(0xFC)?;
        writer.write_u16::<LittleEndian>(v as u16)?;
    } else if v < (1 << 24) {
        writer.write_u8(0xFD)?;
        writer.write_u24::<LittleEndian>(v as u32)?;
    } else {
        writer.write_u8(0xFE)?;
        writer.write_u64::<LittleEndian>(v)?;
    }
    Ok(())
}

pub fn read_len_enc_int(cursor: &mut Cursor<&[u8]>) -> SResult<u64> {
    let lead = cursor.read_u8()?;
    let value = match lead {
        0..=0xFA => lead as u64,
        0xFC => cursor.read_u16::<LittleEndian>()? as u64,
        0xFD => cursor.read_u24::<LittleEndian>()? as u64,
        0xFE => cursor.read_u64::<LittleEndian>()?,
        _ => {
            return Err(ServerError::Protocol(format!(
                "invalid length-encoded integer lead byte {:#04x}",
                lead
            )))
        }
    };
    Ok(value)
}

pub fn write_len_enc_str<W: Write>(writer: &mut W, s: &[u8]) -> SResult<()> {
    write_len_enc_int(writer, s.len() as u64)?;
    writer.write_all(s)?;
    Ok(())
}

pub fn read_len_enc_str(cursor: &mut Cursor<&[u8]>) -> SResult<Vec<u8>> {
    let len = read_len_enc_int(cursor)? as usize;
    let mut buf = vec![0u8; len];
    cursor.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_null_term_string<W: Write>(writer: &mut W, s: &str) -> SResult<()> {
    writer.write_all(s.as_bytes())?;
    writer.write_u8(NULL_TERMINATOR)?;
    Ok(())
}

/// Bytes up to the NUL, consuming the terminator.
pub fn read_null_term_string(cursor: &mut Cursor<&[u8]>) -> SResult<String> {
    let mut bytes = Vec::new();
    loop {
        let b = cursor.read_u8()?;
        if b == NULL_TERMINATOR {
            break;
        }
        bytes.push(b);
    }
    String::from_utf8(bytes)
        .map_err(|_| ServerError::Protocol("invalid utf-8 in null-terminated string".to_string()))
}
