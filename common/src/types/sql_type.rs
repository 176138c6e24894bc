use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// SQL column types understood by the engine. The discriminant doubles as
/// the one-byte tag in spill-file records.
#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum SqlType {
    Null = 0,
    TinyInt = 1,
    SmallInt = 2,
    Int = 3,
    BigInt = 4,
    Boolean = 5,
    Float = 6,
    Double = 7,
    Decimal = 8,
    VarChar = 9,
    Char = 10,
    Text = 11,
    Date = 12,
    Time = 13,
    DateTime = 14,
    Timestamp = 15,
    Blob = 16,
}

impl SqlType {
    /// Wire type code from the MySQL `enum_field_types` table.
    ///
    /// type def ref: https://dev.mysql.com/doc/internals/en/table-map-event.html
    pub fn mysql_type_code(&self) -> u8 {
        match *self {
            SqlType::Null => 6,
            SqlType::TinyInt => 1,
            SqlType::SmallInt => 2,
            SqlType::Int => 3,
            SqlType::BigInt => 8,
            SqlType::Boolean => 1,
            SqlType::Float => 4,
            SqlType::Double => 5,
            SqlType::Decimal => 246,
            SqlType::VarChar => 253,
            SqlType::Char => 254,
            SqlType::Text => 252,
            SqlType::Date => 10,
            SqlType::Time => 11,
            SqlType::DateTime => 12,
            SqlType::Timestamp => 7,
            SqlType::Blob => 252,
        }
    }

    /// Display width advertised in column definition packets.
    pub fn column_length(&self) -> u32 {
        match *self {
            SqlType::Null => 0,
            SqlType::TinyInt => 4,
            SqlType::SmallInt => 6,
            SqlType::Int => 11,
            SqlType::BigInt => 20,
            SqlType::Boolean => 1,
            SqlType::Float => 12,
            SqlType::Double => 22,
            SqlType::Decimal => 65,
            SqlType::VarChar => 65535,
            SqlType::Char => 255,
            SqlType::Text => 65535,
            SqlType::Date => 10,
            SqlType::Time => 8,
            SqlType::DateTime => 19,
            SqlType::Timestamp => 19,
            SqlType::Blob => 65535,
        }
    }
}

#[cfg(test)]
mod test {
    use super::SqlType;

    #[test]
    fn test_tag_round_trip() {
        let tag: u8 = SqlType::DateTime.into();
        assert_eq!(14, tag);
        assert_eq!(SqlType::DateTime, SqlType::try_from(14u8).unwrap());
    }

    #[test]
    fn test_wire_mapping() {
        assert_eq!(3, SqlType::Int.mysql_type_code());
        assert_eq!(11, SqlType::Int.column_length());
        assert_eq!(8, SqlType::BigInt.mysql_type_code());
        assert_eq!(20, SqlType::BigInt.column_length());
        assert_eq!(253, SqlType::VarChar.mysql_type_code());
        assert_eq!(12, SqlType::DateTime.mysql_type_code());
        assert_eq!(1, SqlType::Boolean.mysql_type_code());
    }
}
