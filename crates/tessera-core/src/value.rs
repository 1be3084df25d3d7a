use crate::relationship::Relationship;
use std::{collections::BTreeMap, fmt};
use tessera_schema::types::Primitive;
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

///
/// Value
///
/// Dynamically typed property value held in a resource's property bag.
/// There is no null: an absent optional property has no entry at all.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    DateTime(OffsetDateTime),
    Double(f64),
    Enum(String),
    Integer(i32),
    List(Vec<Self>),
    Long(i64),
    Relationship(Relationship),
    Resource(Box<Embedded>),
    String(String),
}

impl Value {
    /// Convert a field default literal into a value of the declared
    /// primitive type. `None` means the literal does not parse, and the
    /// field must be left unassigned.
    #[must_use]
    pub fn from_default(primitive: Primitive, literal: &str) -> Option<Self> {
        match primitive {
            Primitive::String => Some(Self::String(literal.to_string())),
            Primitive::Integer => literal.trim().parse().ok().map(Self::Integer),
            Primitive::Long => literal.trim().parse().ok().map(Self::Long),
            Primitive::Double => literal
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Double),
            Primitive::Boolean => match literal.trim() {
                "true" => Some(Self::Boolean(true)),
                "false" => Some(Self::Boolean(false)),
                _ => None,
            },
            Primitive::DateTime => parse_date_time(literal.trim()).map(Self::DateTime),
        }
    }

    /// Short description of the value's runtime type, for error messages.
    #[must_use]
    pub fn type_label(&self) -> String {
        match self {
            Self::Boolean(_) => "Boolean".to_string(),
            Self::DateTime(_) => "DateTime".to_string(),
            Self::Double(_) => "Double".to_string(),
            Self::Enum(v) => format!("enum value '{v}'"),
            Self::Integer(_) => "Integer".to_string(),
            Self::List(_) => "array".to_string(),
            Self::Long(_) => "Long".to_string(),
            Self::Relationship(rel) => format!("relationship to {}", rel.fully_qualified_type_name()),
            Self::Resource(embedded) => format!("instance of {}", embedded.class),
            Self::String(_) => "String".to_string(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&Vec<Self>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            Self::Relationship(rel) => Some(rel),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_embedded(&self) -> Option<&Embedded> {
        match self {
            Self::Resource(embedded) => Some(embedded),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", format_date_time(v)),
            Self::Double(v) => write!(f, "{v}"),
            Self::Enum(v) | Self::String(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Relationship(rel) => write!(f, "{rel}"),
            Self::Resource(embedded) => write!(f, "{}", embedded.class),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<Relationship> for Value {
    fn from(v: Relationship) -> Self {
        Self::Relationship(v)
    }
}

impl From<Embedded> for Value {
    fn from(v: Embedded) -> Self {
        Self::Resource(Box::new(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// `2024-05-01T10:00:00.000Z`: UTC, millisecond precision.
#[must_use]
pub fn format_date_time(dt: &OffsetDateTime) -> String {
    let dt = dt.to_offset(UtcOffset::UTC);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
        dt.millisecond()
    )
}

/// Parse an RFC 3339 date-time, normalised to UTC.
#[must_use]
pub fn parse_date_time(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s, &Rfc3339)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
}

///
/// Embedded
///
/// A class instance stored by value inside another resource. It keeps the
/// fully qualified class name so it can be re-bound to its declaration.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Embedded {
    pub class: String,
    pub id: Option<String>,
    pub values: BTreeMap<String, Value>,
}

///
/// TESTS
///
