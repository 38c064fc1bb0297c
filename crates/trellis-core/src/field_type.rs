//! Enum types for the trellis schema system.
//!
//! String-tagged enums serialize as their wire string. `FieldType` keeps a
//! `Custom(String)` fallback so schemas written by a newer server version
//! still deserialize; operator enums are closed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + a Custom(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                // Check known variants first to avoid allocation in common case.
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

// ===========================================================================
// FieldType
// ===========================================================================

define_string_enum! {
    /// The type of one schema field.
    FieldType, default = String, custom_variant = Custom,
    variants: [
        (Number, "Number"),
        (DateTime, "DateTime"),
        (Formula, "Formula"),
        (Set, "Set"),
        (Boolean, "Boolean"),
        (AutoId, "AutoId"),
        (Table, "Table"),
        (Image, "Image"),
        (File, "File"),
        (String, "String"),
        (LongText, "LongText"),
        (FilePath, "FilePath"),
        (Url, "Url"),
        (User, "User"),
        (Model, "Model"),
        (Section, "Section"),
    ]
}

impl FieldType {
    /// Returns `true` for the table container type.
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table)
    }
}

// ===========================================================================
// DateType
// ===========================================================================

/// Display/comparison granularity of a DateTime field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateType {
    DateOnly,
    TimeOnly,
    DateTimeLocal,
    #[default]
    DateTimeUtc,
}

impl DateType {
    /// The canonical chrono format string for this granularity.
    pub fn format_str(self) -> &'static str {
        match self {
            Self::DateOnly => "%Y-%m-%d",
            Self::TimeOnly => "%H:%M",
            Self::DateTimeLocal | Self::DateTimeUtc => "%Y-%m-%d %H:%M",
        }
    }

    /// Returns `true` if display should shift by the record timezone offset.
    pub fn is_local(self) -> bool {
        matches!(self, Self::DateTimeLocal)
    }
}

// ===========================================================================
// Operators
// ===========================================================================

/// Binary arithmetic operator in a formula expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
}

/// Aggregate operator applied across all rows of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Average,
    Count,
}

/// Comparison operator used by field-value conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    /// Applies the operator to a pair of ordered values.
    pub fn compare<T: PartialOrd>(self, a: &T, b: &T) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => a < b,
            Self::Le => a <= b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
        }
    }

    /// Returns `true` for the operators valid on unordered types.
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Eq | Self::Ne)
    }
}

// ===========================================================================
// TimeUnit
// ===========================================================================

/// Calendar/time unit attached to a constant factor for date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    /// Nominal hours per unit, used when a fractional quantity forces the
    /// arithmetic down to hour precision.
    pub fn hours_factor(self) -> f64 {
        match self {
            Self::Years => 365.0 * 24.0,
            Self::Months => 30.0 * 24.0,
            Self::Weeks => 7.0 * 24.0,
            Self::Days => 24.0,
            Self::Hours => 1.0,
            Self::Minutes => 1.0 / 60.0,
            Self::Seconds => 1.0 / 3600.0,
        }
    }

    /// Returns `true` for units that need calendar-aware arithmetic.
    pub fn is_calendar(self) -> bool {
        matches!(self, Self::Years | Self::Months)
    }
}
