use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use common::resultset::ColumnMeta;
use common::types::DataValue;

use crate::codec::{write_len_enc_int, write_len_enc_str};
use crate::declar::{NULL_CELL, UTF8_MB4_GENERAL_CI};
use crate::error::SResult;

/// ColumnDefinition41 for one result column.
///
/// Field order: catalog "def", schema, table, org_table, name, org_name
/// (all length-encoded), fixed-length marker 0x0C, charset, column length,
/// type code, flags, decimals, two filler bytes.
pub fn serialize_column_definition(column: &ColumnMeta) -> SResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(64);

    write_len_enc_str(&mut buf, b"def")?;
    write_len_enc_str(&mut buf, column.db.as_bytes())?;
    write_len_enc_str(&mut buf, column.table.as_bytes())?;
    write_len_enc_str(&mut buf, column.table.as_bytes())?;
    write_len_enc_str(&mut buf, column.name.as_bytes())?;
    write_len_enc_str(&mut buf, column.name.as_bytes())?;

    buf.write_u8(0x0C)?;
    buf.write_u16::<LittleEndian>(UTF8_MB4_GENERAL_CI as u16)?;
    buf.write_u32::<LittleEndian>(column.type_tag.column_length())?;
    buf.write_u8(column.type_tag.mysql_type_code())?;
    buf.write_u16::<LittleEndian>(0)?; // flags
    buf.write_u8(0)?; // decimals
    buf.write_all(&[0u8; 2])?;

    Ok(buf)
}

/// Text protocol row: every cell a length-encoded string, NULL cells a
/// single 0xFB byte.
pub fn serialize_text_row(row: &[DataValue]) -> SResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(row.len() * 8);
    for value in row {
        match value.encode_text() {
            None => buf.write_u8(NULL_CELL)?,
            Some(bytes) => write_len_enc_str(&mut buf, &bytes)?,
        }
    }
    Ok(buf)
}

/// Column-count packet that opens a text result set.
pub fn serialize_column_count(count: usize) -> SResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(4);
    write_len_enc_int(&mut buf, count as u64)?;
    Ok(buf)
}
