use crate::prelude::*;
use derive_more::{Display, FromStr};

///
/// Primitive
/// Built-in scalar types a field may declare directly.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum Primitive {
    Boolean,
    DateTime,
    Double,
    Integer,
    Long,
    String,
}

impl Primitive {
    pub const ALL: [Self; 6] = [
        Self::Boolean,
        Self::DateTime,
        Self::Double,
        Self::Integer,
        Self::Long,
        Self::String,
    ];

    /// Parse a declared type name; `None` means the name refers to a declaration.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Double => "Double",
            Self::Integer => "Integer",
            Self::Long => "Long",
            Self::String => "String",
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Double | Self::Integer | Self::Long)
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer | Self::Long)
    }
}

///
/// TESTS
///
