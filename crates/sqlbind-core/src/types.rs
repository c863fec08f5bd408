//! MySQL wire types and result-set column metadata.
//!
//! Field type codes are the `MYSQL_TYPE_*` constants from the MySQL C API.
//! A [`ColumnDescriptor`] is produced once per result-set metadata exchange
//! and shared (read-only) by every row of that result set.

/// MySQL field type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// DECIMAL (MYSQL_TYPE_DECIMAL)
    Decimal,
    /// TINYINT (MYSQL_TYPE_TINY)
    Tiny,
    /// SMALLINT (MYSQL_TYPE_SHORT)
    Short,
    /// INT (MYSQL_TYPE_LONG)
    Long,
    /// FLOAT (MYSQL_TYPE_FLOAT)
    Float,
    /// DOUBLE (MYSQL_TYPE_DOUBLE)
    Double,
    /// NULL (MYSQL_TYPE_NULL)
    Null,
    /// TIMESTAMP (MYSQL_TYPE_TIMESTAMP)
    Timestamp,
    /// BIGINT (MYSQL_TYPE_LONGLONG)
    LongLong,
    /// MEDIUMINT (MYSQL_TYPE_INT24)
    Int24,
    /// DATE (MYSQL_TYPE_DATE)
    Date,
    /// TIME (MYSQL_TYPE_TIME)
    Time,
    /// DATETIME (MYSQL_TYPE_DATETIME)
    DateTime,
    /// YEAR (MYSQL_TYPE_YEAR)
    Year,
    /// NEWDATE (MYSQL_TYPE_NEWDATE) - internal use
    NewDate,
    /// VARCHAR (MYSQL_TYPE_VARCHAR)
    VarChar,
    /// BIT (MYSQL_TYPE_BIT)
    Bit,
    /// TIMESTAMP2 (MYSQL_TYPE_TIMESTAMP2)
    Timestamp2,
    /// DATETIME2 (MYSQL_TYPE_DATETIME2)
    DateTime2,
    /// TIME2 (MYSQL_TYPE_TIME2)
    Time2,
    /// JSON (MYSQL_TYPE_JSON)
    Json,
    /// NEWDECIMAL (MYSQL_TYPE_NEWDECIMAL)
    NewDecimal,
    /// ENUM (MYSQL_TYPE_ENUM)
    Enum,
    /// SET (MYSQL_TYPE_SET)
    Set,
    /// TINYBLOB (MYSQL_TYPE_TINY_BLOB)
    TinyBlob,
    /// MEDIUMBLOB (MYSQL_TYPE_MEDIUM_BLOB)
    MediumBlob,
    /// LONGBLOB (MYSQL_TYPE_LONG_BLOB)
    LongBlob,
    /// BLOB (MYSQL_TYPE_BLOB)
    Blob,
    /// VARCHAR (MYSQL_TYPE_VAR_STRING)
    VarString,
    /// CHAR (MYSQL_TYPE_STRING)
    String,
    /// GEOMETRY (MYSQL_TYPE_GEOMETRY)
    Geometry,
    /// A type code this codec does not know
    Unknown(u8),
}

impl FieldType {
    /// Parse a field type from its wire code.
    #[must_use]
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => FieldType::Decimal,
            0x01 => FieldType::Tiny,
            0x02 => FieldType::Short,
            0x03 => FieldType::Long,
            0x04 => FieldType::Float,
            0x05 => FieldType::Double,
            0x06 => FieldType::Null,
            0x07 => FieldType::Timestamp,
            0x08 => FieldType::LongLong,
            0x09 => FieldType::Int24,
            0x0A => FieldType::Date,
            0x0B => FieldType::Time,
            0x0C => FieldType::DateTime,
            0x0D => FieldType::Year,
            0x0E => FieldType::NewDate,
            0x0F => FieldType::VarChar,
            0x10 => FieldType::Bit,
            0x11 => FieldType::Timestamp2,
            0x12 => FieldType::DateTime2,
            0x13 => FieldType::Time2,
            0xF5 => FieldType::Json,
            0xF6 => FieldType::NewDecimal,
            0xF7 => FieldType::Enum,
            0xF8 => FieldType::Set,
            0xF9 => FieldType::TinyBlob,
            0xFA => FieldType::MediumBlob,
            0xFB => FieldType::LongBlob,
            0xFC => FieldType::Blob,
            0xFD => FieldType::VarString,
            0xFE => FieldType::String,
            0xFF => FieldType::Geometry,
            other => FieldType::Unknown(other),
        }
    }

    /// The wire code for this type.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            FieldType::Decimal => 0x00,
            FieldType::Tiny => 0x01,
            FieldType::Short => 0x02,
            FieldType::Long => 0x03,
            FieldType::Float => 0x04,
            FieldType::Double => 0x05,
            FieldType::Null => 0x06,
            FieldType::Timestamp => 0x07,
            FieldType::LongLong => 0x08,
            FieldType::Int24 => 0x09,
            FieldType::Date => 0x0A,
            FieldType::Time => 0x0B,
            FieldType::DateTime => 0x0C,
            FieldType::Year => 0x0D,
            FieldType::NewDate => 0x0E,
            FieldType::VarChar => 0x0F,
            FieldType::Bit => 0x10,
            FieldType::Timestamp2 => 0x11,
            FieldType::DateTime2 => 0x12,
            FieldType::Time2 => 0x13,
            FieldType::Json => 0xF5,
            FieldType::NewDecimal => 0xF6,
            FieldType::Enum => 0xF7,
            FieldType::Set => 0xF8,
            FieldType::TinyBlob => 0xF9,
            FieldType::MediumBlob => 0xFA,
            FieldType::LongBlob => 0xFB,
            FieldType::Blob => 0xFC,
            FieldType::VarString => 0xFD,
            FieldType::String => 0xFE,
            FieldType::Geometry => 0xFF,
            FieldType::Unknown(code) => code,
        }
    }

    /// Byte width of fixed-width binary encodings, `None` for
    /// length-prefixed and temporal types.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            FieldType::Tiny => Some(1),
            FieldType::Short | FieldType::Year => Some(2),
            FieldType::Long | FieldType::Int24 | FieldType::Float => Some(4),
            FieldType::LongLong | FieldType::Double => Some(8),
            FieldType::Null => Some(0),
            _ => None,
        }
    }

    /// Check if this is an integer type.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            FieldType::Tiny
                | FieldType::Short
                | FieldType::Long
                | FieldType::LongLong
                | FieldType::Int24
                | FieldType::Year
        )
    }

    /// Check if this is a floating-point type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, FieldType::Float | FieldType::Double)
    }

    /// Check if this is a textual type (including DECIMAL, which is sent as text).
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(
            self,
            FieldType::VarChar
                | FieldType::VarString
                | FieldType::String
                | FieldType::Enum
                | FieldType::Set
                | FieldType::Decimal
                | FieldType::NewDecimal
        )
    }

    /// Check if this is a binary/blob type.
    #[must_use]
    pub const fn is_blob(self) -> bool {
        matches!(
            self,
            FieldType::TinyBlob
                | FieldType::MediumBlob
                | FieldType::LongBlob
                | FieldType::Blob
                | FieldType::Geometry
        )
    }

    /// Check if this is a calendar date/time type.
    #[must_use]
    pub const fn is_datetime(self) -> bool {
        matches!(
            self,
            FieldType::Date
                | FieldType::NewDate
                | FieldType::DateTime
                | FieldType::Timestamp
                | FieldType::DateTime2
                | FieldType::Timestamp2
        )
    }

    /// Check if this is a time-of-day/duration type.
    #[must_use]
    pub const fn is_time(self) -> bool {
        matches!(self, FieldType::Time | FieldType::Time2)
    }

    /// Get the type name as a string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Decimal | FieldType::NewDecimal => "DECIMAL",
            FieldType::Tiny => "TINYINT",
            FieldType::Short => "SMALLINT",
            FieldType::Long => "INT",
            FieldType::Float => "FLOAT",
            FieldType::Double => "DOUBLE",
            FieldType::Null => "NULL",
            FieldType::Timestamp | FieldType::Timestamp2 => "TIMESTAMP",
            FieldType::LongLong => "BIGINT",
            FieldType::Int24 => "MEDIUMINT",
            FieldType::Date | FieldType::NewDate => "DATE",
            FieldType::Time | FieldType::Time2 => "TIME",
            FieldType::DateTime | FieldType::DateTime2 => "DATETIME",
            FieldType::Year => "YEAR",
            FieldType::VarChar | FieldType::VarString => "VARCHAR",
            FieldType::Bit => "BIT",
            FieldType::Json => "JSON",
            FieldType::Enum => "ENUM",
            FieldType::Set => "SET",
            FieldType::TinyBlob => "TINYBLOB",
            FieldType::MediumBlob => "MEDIUMBLOB",
            FieldType::LongBlob => "LONGBLOB",
            FieldType::Blob => "BLOB",
            FieldType::String => "CHAR",
            FieldType::Geometry => "GEOMETRY",
            FieldType::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Column flags in result set metadata.
pub mod column_flags {
    pub const NOT_NULL: u16 = 1;
    pub const PRIMARY_KEY: u16 = 2;
    pub const UNIQUE_KEY: u16 = 4;
    pub const BLOB: u16 = 16;
    pub const UNSIGNED: u16 = 32;
    pub const BINARY: u16 = 128;
}

/// Character set number of the `binary` pseudo-charset.
pub const BINARY_CHARSET: u16 = 63;

/// Metadata for one result-set column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name (or alias)
    pub name: String,
    /// Table name (or alias), when the column came from a table
    pub table: Option<String>,
    /// Declared wire type
    pub field_type: FieldType,
    /// Signed integer semantics (false for UNSIGNED columns)
    pub signed: bool,
    /// Whether the column may hold NULL
    pub nullable: bool,
    /// Character set number
    pub charset: u16,
    /// Declared maximum display length
    pub column_length: u32,
}

impl ColumnDescriptor {
    /// A signed, nullable, utf8mb4 column with no table.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            table: None,
            field_type,
            signed: true,
            nullable: true,
            charset: 255,
            column_length: 0,
        }
    }

    /// Set the owning table.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Mark the column UNSIGNED.
    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the character set number.
    pub fn charset(mut self, charset: u16) -> Self {
        self.charset = charset;
        self
    }

    /// Set the declared column length.
    pub fn column_length(mut self, length: u32) -> Self {
        self.column_length = length;
        self
    }

    /// Build a descriptor from raw protocol flags.
    pub fn from_flags(
        name: impl Into<String>,
        table: Option<String>,
        field_type: FieldType,
        flags: u16,
        charset: u16,
        column_length: u32,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.filter(|t| !t.is_empty()),
            field_type,
            signed: flags & column_flags::UNSIGNED == 0,
            nullable: flags & column_flags::NOT_NULL == 0,
            charset,
            column_length,
        }
    }

    /// Does this column carry raw bytes rather than text?
    pub fn is_binary(&self) -> bool {
        self.field_type.is_blob()
            || (self.charset == BINARY_CHARSET
                && matches!(
                    self.field_type,
                    FieldType::VarChar | FieldType::VarString | FieldType::String
                ))
    }

    /// Does this descriptor answer to the given `(table?, name)` key?
    pub fn matches(&self, table: Option<&str>, name: &str) -> bool {
        self.name == name
            && match table {
                Some(t) => self.table.as_deref() == Some(t),
                None => true,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_from_u8() {
        assert_eq!(FieldType::from_u8(0x01), FieldType::Tiny);
        assert_eq!(FieldType::from_u8(0x03), FieldType::Long);
        assert_eq!(FieldType::from_u8(0x08), FieldType::LongLong);
        assert_eq!(FieldType::from_u8(0xFC), FieldType::Blob);
        assert_eq!(FieldType::from_u8(0xF5), FieldType::Json);
        assert_eq!(FieldType::from_u8(0x42), FieldType::Unknown(0x42));
    }

    #[test]
    fn test_code_is_inverse_of_from_u8() {
        for code in [0x00, 0x01, 0x0D, 0x13, 0xF5, 0xFE, 0xFF, 0x77] {
            assert_eq!(FieldType::from_u8(code).code(), code);
        }
    }

    #[test]
    fn test_field_type_categories() {
        assert!(FieldType::Tiny.is_integer());
        assert!(FieldType::Year.is_integer());
        assert!(FieldType::Float.is_float());
        assert!(FieldType::NewDecimal.is_string());
        assert!(FieldType::TinyBlob.is_blob());
        assert!(FieldType::Timestamp.is_datetime());
        assert!(FieldType::Time2.is_time());
        assert!(!FieldType::Time.is_datetime());
        assert_eq!(FieldType::Int24.fixed_width(), Some(4));
        assert_eq!(FieldType::Blob.fixed_width(), None);
    }

    #[test]
    fn test_descriptor_from_flags() {
        let col = ColumnDescriptor::from_flags(
            "id",
            Some("users".to_string()),
            FieldType::Long,
            column_flags::NOT_NULL | column_flags::PRIMARY_KEY | column_flags::UNSIGNED,
            33,
            11,
        );
        assert!(!col.signed);
        assert!(!col.nullable);
        assert!(col.matches(Some("users"), "id"));
        assert!(col.matches(None, "id"));
        assert!(!col.matches(Some("orders"), "id"));
    }

    #[test]
    fn test_binary_charset_strings_are_binary() {
        let varbinary = ColumnDescriptor::new("hash", FieldType::VarString).charset(BINARY_CHARSET);
        assert!(varbinary.is_binary());
        let varchar = ColumnDescriptor::new("name", FieldType::VarString);
        assert!(!varchar.is_binary());
    }
}
