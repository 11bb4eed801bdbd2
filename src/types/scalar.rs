//! # Scalar Types
//!
//! Scalar types as recorded in the `sysscalartypes` catalog, keyed by the
//! one-byte `xtype` code shared with `syscolpars.xtype`.
//!
//! | Code | Type | Fixed size |
//! |------|------|-----------|
//! | 36 | uniqueidentifier | 16 |
//! | 40 | date | 3 |
//! | 48 | tinyint | 1 |
//! | 52 | smallint | 2 |
//! | 56 | int | 4 |
//! | 58 | smalldatetime | 4 |
//! | 59 | real | 4 |
//! | 60 | money | 8 |
//! | 61 | datetime | 8 |
//! | 62 | float | 8 |
//! | 104 | bit | 1 |
//! | 106/108 | decimal/numeric | declared |
//! | 122 | smallmoney | 4 |
//! | 127 | bigint | 8 |
//! | 173/175/239 | binary/char/nchar | declared |
//! | 34/35/99/165/167/231/240/241 | LOB and variable kinds | — |

/// Declared column length marking a variable-length column (`varchar(max)`
/// and friends): stored as -1 in the catalog.
pub const VAR_LENGTH_SENTINEL: i16 = -1;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Image = 34,
    Text = 35,
    UniqueIdentifier = 36,
    Date = 40,
    Time = 41,
    DateTime2 = 42,
    DateTimeOffset = 43,
    TinyInt = 48,
    SmallInt = 52,
    Int = 56,
    SmallDateTime = 58,
    Real = 59,
    Money = 60,
    DateTime = 61,
    Float = 62,
    Variant = 98,
    NText = 99,
    Bit = 104,
    Decimal = 106,
    Numeric = 108,
    SmallMoney = 122,
    BigInt = 127,
    VarBinary = 165,
    VarChar = 167,
    Binary = 173,
    Char = 175,
    Timestamp = 189,
    NVarChar = 231,
    NChar = 239,
    Geography = 240,
    Xml = 241,
    None = 0,
}

impl ScalarType {
    pub fn from_xtype(x: u8) -> Self {
        match x {
            34 => ScalarType::Image,
            35 => ScalarType::Text,
            36 => ScalarType::UniqueIdentifier,
            40 => ScalarType::Date,
            41 => ScalarType::Time,
            42 => ScalarType::DateTime2,
            43 => ScalarType::DateTimeOffset,
            48 => ScalarType::TinyInt,
            52 => ScalarType::SmallInt,
            56 => ScalarType::Int,
            58 => ScalarType::SmallDateTime,
            59 => ScalarType::Real,
            60 => ScalarType::Money,
            61 => ScalarType::DateTime,
            62 => ScalarType::Float,
            98 => ScalarType::Variant,
            99 => ScalarType::NText,
            104 => ScalarType::Bit,
            106 => ScalarType::Decimal,
            108 => ScalarType::Numeric,
            122 => ScalarType::SmallMoney,
            127 => ScalarType::BigInt,
            165 => ScalarType::VarBinary,
            167 => ScalarType::VarChar,
            173 => ScalarType::Binary,
            175 => ScalarType::Char,
            189 => ScalarType::Timestamp,
            231 => ScalarType::NVarChar,
            239 => ScalarType::NChar,
            240 => ScalarType::Geography,
            241 => ScalarType::Xml,
            _ => ScalarType::None,
        }
    }

    /// Intrinsic width for types whose size does not depend on the declared
    /// column length.
    pub fn intrinsic_size(self) -> Option<usize> {
        match self {
            ScalarType::Bit | ScalarType::TinyInt => Some(1),
            ScalarType::SmallInt => Some(2),
            ScalarType::Date => Some(3),
            ScalarType::Int
            | ScalarType::SmallDateTime
            | ScalarType::Real
            | ScalarType::SmallMoney => Some(4),
            ScalarType::Money
            | ScalarType::DateTime
            | ScalarType::Float
            | ScalarType::BigInt
            | ScalarType::Timestamp => Some(8),
            ScalarType::UniqueIdentifier => Some(16),
            _ => None,
        }
    }

    /// Whether the type belongs to the fixed-size set. Fixed-size membership
    /// is necessary but not sufficient for a *column* to be fixed: the
    /// declared length must also not be the variable sentinel.
    pub fn is_fixed(self) -> bool {
        self.intrinsic_size().is_some()
            || matches!(
                self,
                ScalarType::Char
                    | ScalarType::NChar
                    | ScalarType::Binary
                    | ScalarType::Decimal
                    | ScalarType::Numeric
            )
    }

    /// Whether values are UTF-16LE encoded.
    pub fn is_utf16(self) -> bool {
        matches!(
            self,
            ScalarType::NChar | ScalarType::NVarChar | ScalarType::NText
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Image => "image",
            ScalarType::Text => "text",
            ScalarType::UniqueIdentifier => "uniqueidentifier",
            ScalarType::Date => "date",
            ScalarType::Time => "time",
            ScalarType::DateTime2 => "datetime2",
            ScalarType::DateTimeOffset => "datetimeoffset",
            ScalarType::TinyInt => "tinyint",
            ScalarType::SmallInt => "smallint",
            ScalarType::Int => "int",
            ScalarType::SmallDateTime => "smalldatetime",
            ScalarType::Real => "real",
            ScalarType::Money => "money",
            ScalarType::DateTime => "datetime",
            ScalarType::Float => "float",
            ScalarType::Variant => "sql_variant",
            ScalarType::NText => "ntext",
            ScalarType::Bit => "bit",
            ScalarType::Decimal => "decimal",
            ScalarType::Numeric => "numeric",
            ScalarType::SmallMoney => "smallmoney",
            ScalarType::BigInt => "bigint",
            ScalarType::VarBinary => "varbinary",
            ScalarType::VarChar => "varchar",
            ScalarType::Binary => "binary",
            ScalarType::Char => "char",
            ScalarType::Timestamp => "timestamp",
            ScalarType::NVarChar => "nvarchar",
            ScalarType::NChar => "nchar",
            ScalarType::Geography => "geography",
            ScalarType::Xml => "xml",
            ScalarType::None => "none",
        }
    }
}
