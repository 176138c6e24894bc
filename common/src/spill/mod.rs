use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::warn;
use uuid::Uuid;

use crate::err::{CResult, CoreError};
use crate::schema::TableSchema;
use crate::types::{DataValue, SqlType};

/// Row spill for operators whose working set exceeds memory. Single writer,
/// readers only after `finish_writing`.
///
/// Record layout: `column_count:i32 LE`, one type tag byte per column, a
/// null bitmap (LSB-first, ceil(n/8) bytes), then `value_length:i32 LE` +
/// value bytes for each non-null column.
#[derive(Debug)]
pub struct SpillFile {
    path: PathBuf,
    schema: TableSchema,
    writer: Option<BufWriter<File>>,
    finished: bool,
    row_count: usize,
}

impl SpillFile {
    pub fn create<P: AsRef<Path>>(schema: TableSchema, temp_dir: P) -> CResult<Self> {
        let file_name = format!("spill-{}.bin", Uuid::new_v4());
        let path = temp_dir.as_ref().join(file_name);
        let file = File::create(&path)?;

        Ok(SpillFile {
            path,
            schema,
            writer: Some(BufWriter::new(file)),
            finished: false,
            row_count: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn write_row(&mut self, row: &[DataValue]) -> CResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CoreError::SpillError("write after finish_writing".to_string()))?;

        writer.write_i32::<LittleEndian>(row.len() as i32)?;
        for value in row {
            writer.write_u8(value.sql_type().into())?;
        }

        let mut bitmap = vec![0u8; (row.len() + 7) / 8];
        for (i, value) in row.iter().enumerate() {
            if value.is_null() {
                bitmap[i / 8] |= 1 << (i % 8);
            }
        }
        writer.write_all(&bitmap)?;

        for value in row {
            if value.is_null() {
                continue;
            }
            let bytes = encode_value(value);
            writer.write_i32::<LittleEndian>(bytes.len() as i32)?;
            writer.write_all(&bytes)?;
        }

        self.row_count += 1;
        Ok(())
    }

    pub fn finish_writing(&mut self) -> CResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        self.finished = true;
        Ok(())
    }

    pub fn open_for_read(&self) -> CResult<SpillFileReader> {
        if !self.finished {
            return Err(CoreError::SpillError(
                "open_for_read before finish_writing".to_string(),
            ));
        }
        let file = File::open(&self.path)?;
        Ok(SpillFileReader {
            reader: BufReader::new(file),
            schema: self.schema.clone(),
        })
    }
}

impl Drop for SpillFile {
    fn drop(&mut self) {
        self.writer.take();
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("failed to remove spill file {:?}: {}", self.path, e);
        }
    }
}

/// Deserializes rows in insertion order.
#[derive(Debug)]
pub struct SpillFileReader {
    reader: BufReader<File>,
    schema: TableSchema,
}

impl SpillFileReader {
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Next row, or None at end of file.
    pub fn read_row(&mut self) -> CResult<Option<Vec<DataValue>>> {
        let column_count = match self.reader.read_i32::<LittleEndian>() {
            Ok(n) => n as usize,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut tags = vec![0u8; column_count];
        self.reader.read_exact(&mut tags)?;

        let mut bitmap = vec![0u8; (column_count + 7) / 8];
        self.reader.read_exact(&mut bitmap)?;

        let mut row = Vec::with_capacity(column_count);
        for (i, tag) in tags.iter().enumerate() {
            if bitmap[i / 8] & (1 << (i % 8)) != 0 {
                row.push(DataValue::Null);
                continue;
            }
            let len = self.reader.read_i32::<LittleEndian>()? as usize;
            let mut bytes = vec![0u8; len];
            self.reader.read_exact(&mut bytes)?;

            let sql_type = SqlType::try_from(*tag)
                .map_err(|_| CoreError::SpillError(format!("unknown type tag {}", tag)))?;
            row.push(decode_value(sql_type, &bytes)?);
        }

        Ok(Some(row))
    }
}

/// Round-robin-by-hash fan-out over `n` spill files sharing one schema.
#[derive(Debug)]
pub struct PartitionedSpillFiles {
    partitions: Vec<SpillFile>,
}

impl PartitionedSpillFiles {
    pub fn new<P: AsRef<Path>>(n: usize, schema: TableSchema, temp_dir: P) -> CResult<Self> {
        let mut partitions = Vec::with_capacity(n);
        for _ in 0..n {
            partitions.push(SpillFile::create(schema.clone(), temp_dir.as_ref())?);
        }
        Ok(PartitionedSpillFiles { partitions })
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn write(&mut self, hash: i64, row: &[DataValue]) -> CResult<()> {
        let index = hash.unsigned_abs() as usize % self.partitions.len();
        self.partitions[index].write_row(row)
    }

    pub fn finish_all(&mut self) -> CResult<()> {
        for partition in &mut self.partitions {
            partition.finish_writing()?;
        }
        Ok(())
    }

    pub fn open_partition(&self, index: usize) -> CResult<SpillFileReader> {
        self.partitions[index].open_for_read()
    }
}

fn encode_value(value: &DataValue) -> Vec<u8> {
    match value {
        DataValue::Null => Vec::new(),
        DataValue::TinyInt(v) => vec![*v as u8],
        DataValue::SmallInt(v) => v.to_le_bytes().to_vec(),
        DataValue::Int(v) => v.to_le_bytes().to_vec(),
        DataValue::BigInt(v) => v.to_le_bytes().to_vec(),
        DataValue::Boolean(v) => vec![u8::from(*v)],
        DataValue::Float(v) => v.to_le_bytes().to_vec(),
        DataValue::Double(v) => v.to_le_bytes().to_vec(),
        DataValue::Decimal(v) => v.as_bytes().to_vec(),
        DataValue::VarChar(v) | DataValue::Char(v) | DataValue::Text(v) => v.as_bytes().to_vec(),
        DataValue::Date(v) => v.format("%Y-%m-%d").to_string().into_bytes(),
        DataValue::Time(v) => v.format("%H:%M:%S").to_string().into_bytes(),
        DataValue::DateTime(v) | DataValue::Timestamp(v) => {
            v.format("%Y-%m-%d %H:%M:%S").to_string().into_bytes()
        }
        DataValue::Blob(v) => v.clone(),
    }
}

fn decode_value(sql_type: SqlType, bytes: &[u8]) -> CResult<DataValue> {
    let bad = |what: &str| CoreError::SpillError(format!("corrupt {} value", what));

    let value = match sql_type {
        SqlType::Null => DataValue::Null,
        SqlType::TinyInt => DataValue::TinyInt(*bytes.first().ok_or_else(|| bad("tinyint"))? as i8),
        SqlType::SmallInt => DataValue::SmallInt(i16::from_le_bytes(
            bytes.try_into().map_err(|_| bad("smallint"))?,
        )),
        SqlType::Int => {
            DataValue::Int(i32::from_le_bytes(bytes.try_into().map_err(|_| bad("int"))?))
        }
        SqlType::BigInt => DataValue::BigInt(i64::from_le_bytes(
            bytes.try_into().map_err(|_| bad("bigint"))?,
        )),
        SqlType::Boolean => DataValue::Boolean(*bytes.first().ok_or_else(|| bad("boolean"))? != 0),
        SqlType::Float => DataValue::Float(f32::from_le_bytes(
            bytes.try_into().map_err(|_| bad("float"))?,
        )),
        SqlType::Double => DataValue::Double(f64::from_le_bytes(
            bytes.try_into().map_err(|_| bad("double"))?,
        )),
        SqlType::Decimal => DataValue::Decimal(utf8(bytes)?),
        SqlType::VarChar => DataValue::VarChar(utf8(bytes)?),
        SqlType::Char => DataValue::Char(utf8(bytes)?),
        SqlType::Text => DataValue::Text(utf8(bytes)?),
        SqlType::Date => DataValue::Date(
            NaiveDate::parse_from_str(&utf8(bytes)?, "%Y-%m-%d").map_err(|_| bad("date"))?,
        ),
        SqlType::Time => DataValue::Time(
            NaiveTime::parse_from_str(&utf8(bytes)?, "%H:%M:%S").map_err(|_| bad("time"))?,
        ),
        SqlType::DateTime => DataValue::DateTime(parse_datetime(bytes).ok_or_else(|| bad("datetime"))?),
        SqlType::Timestamp => {
            DataValue::Timestamp(parse_datetime(bytes).ok_or_else(|| bad("timestamp"))?)
        }
        SqlType::Blob => DataValue::Blob(bytes.to_vec()),
    };
    Ok(value)
}

fn parse_datetime(bytes: &[u8]) -> Option<NaiveDateTime> {
    let text = std::str::from_utf8(bytes).ok()?;
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").ok()
}

fn utf8(bytes: &[u8]) -> CResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CoreError::SpillError("invalid utf-8 value".to_string()))
}
