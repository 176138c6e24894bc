use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::sql_type::SqlType;

/// One cell of a result row. Text encoding follows the MySQL text protocol
/// canonical formats; NULL has no encoding (the row serializer emits 0xFB).
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,

    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Boolean(bool),

    Float(f32),
    Double(f64),
    Decimal(String),

    VarChar(String),
    Char(String),
    Text(String),

    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(NaiveDateTime),

    Blob(Vec<u8>),
}

impl DataValue {
    pub fn sql_type(&self) -> SqlType {
        match self {
            DataValue::Null => SqlType::Null,
            DataValue::TinyInt(_) => SqlType::TinyInt,
            DataValue::SmallInt(_) => SqlType::SmallInt,
            DataValue::Int(_) => SqlType::Int,
            DataValue::BigInt(_) => SqlType::BigInt,
            DataValue::Boolean(_) => SqlType::Boolean,
            DataValue::Float(_) => SqlType::Float,
            DataValue::Double(_) => SqlType::Double,
            DataValue::Decimal(_) => SqlType::Decimal,
            DataValue::VarChar(_) => SqlType::VarChar,
            DataValue::Char(_) => SqlType::Char,
            DataValue::Text(_) => SqlType::Text,
            DataValue::Date(_) => SqlType::Date,
            DataValue::Time(_) => SqlType::Time,
            DataValue::DateTime(_) => SqlType::DateTime,
            DataValue::Timestamp(_) => SqlType::Timestamp,
            DataValue::Blob(_) => SqlType::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// Bytes of the text-protocol representation, None for NULL.
    pub fn encode_text(&self) -> Option<Vec<u8>> {
        match self {
            DataValue::Null => None,
            DataValue::TinyInt(v) => Some(v.to_string().into_bytes()),
            DataValue::SmallInt(v) => Some(v.to_string().into_bytes()),
            DataValue::Int(v) => Some(v.to_string().into_bytes()),
            DataValue::BigInt(v) => Some(v.to_string().into_bytes()),
            DataValue::Boolean(v) => Some(if *v { b"1".to_vec() } else { b"0".to_vec() }),
            DataValue::Float(v) => Some(v.to_string().into_bytes()),
            DataValue::Double(v) => Some(v.to_string().into_bytes()),
            DataValue::Decimal(v) => Some(v.clone().into_bytes()),
            DataValue::VarChar(v) | DataValue::Char(v) | DataValue::Text(v) => {
                Some(v.clone().into_bytes())
            }
            DataValue::Date(v) => Some(v.format("%Y-%m-%d").to_string().into_bytes()),
            DataValue::Time(v) => Some(v.format("%H:%M:%S").to_string().into_bytes()),
            DataValue::DateTime(v) | DataValue::Timestamp(v) => {
                Some(v.format("%Y-%m-%d %H:%M:%S").to_string().into_bytes())
            }
            DataValue::Blob(v) => Some(v.clone()),
        }
    }
}

macro_rules! define_from {
    ($($ft: ty, $tt: expr); *) => {
        $(impl From<$ft> for DataValue {
            #[inline]
            fn from(v: $ft) -> Self {
                $tt(v)
            }
        })*
    };
}

define_from!(
    i64, DataValue::BigInt;
    i32, DataValue::Int;
    i16, DataValue::SmallInt;
    i8, DataValue::TinyInt;
    bool, DataValue::Boolean;
    f64, DataValue::Double;
    f32, DataValue::Float;
    String, DataValue::VarChar
);

impl From<&str> for DataValue {
    fn from(v: &str) -> Self {
        DataValue::VarChar(v.to_owned())
    }
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, NaiveTime};

    use super::DataValue;

    #[test]
    fn test_encode_text() {
        assert_eq!(None, DataValue::Null.encode_text());
        assert_eq!(Some(b"42".to_vec()), DataValue::Int(42).encode_text());
        assert_eq!(Some(b"1".to_vec()), DataValue::Boolean(true).encode_text());
        assert_eq!(Some(b"0".to_vec()), DataValue::Boolean(false).encode_text());

        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(Some(b"2024-03-07".to_vec()), DataValue::Date(d).encode_text());

        let t = NaiveTime::from_hms_opt(9, 5, 0).unwrap();
        assert_eq!(Some(b"09:05:00".to_vec()), DataValue::Time(t).encode_text());

        let dt = d.and_time(t);
        assert_eq!(
            Some(b"2024-03-07 09:05:00".to_vec()),
            DataValue::DateTime(dt).encode_text()
        );
    }

    #[test]
    fn test_from() {
        assert_eq!(DataValue::Int(7), DataValue::from(7i32));
        assert_eq!(DataValue::VarChar("a".to_string()), DataValue::from("a"));
    }
}
