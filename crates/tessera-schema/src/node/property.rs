use crate::{prelude::*, validate::naming::validate_ident};
use derive_more::Display;

///
/// PropertyKind
///
/// Closed set of property variants. Visitors match on it exhaustively.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    Field {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Relationship,
    EnumValue,
}

///
/// PropertyTag
/// Payload-free view of `PropertyKind`, for messages and counting.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum PropertyTag {
    #[display("field")]
    Field,
    #[display("relationship")]
    Relationship,
    #[display("enum value")]
    EnumValue,
}

///
/// Property
///
/// A named, typed member of a declaration. `parent` is the fully qualified
/// name of the declaring class (a back-reference, never ownership) and
/// `resolved_type` is filled in at load for declaration-typed properties.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Property {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub array: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    #[serde(flatten)]
    pub kind: PropertyKind,

    #[serde(skip)]
    pub(crate) parent: String,

    #[serde(skip)]
    pub(crate) resolved_type: Option<String>,
}

impl Property {
    fn new(name: impl Into<String>, type_name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            array: false,
            optional: false,
            kind,
            parent: String::new(),
            resolved_type: None,
        }
    }

    #[must_use]
    pub fn field(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, type_name, PropertyKind::Field { default: None })
    }

    #[must_use]
    pub fn relationship(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, type_name, PropertyKind::Relationship)
    }

    #[must_use]
    pub fn enum_value(name: impl Into<String>) -> Self {
        Self::new(name, String::new(), PropertyKind::EnumValue)
    }

    #[must_use]
    pub const fn array(mut self) -> Self {
        self.array = true;
        self
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attach a default literal; ignored on anything but a field.
    #[must_use]
    pub fn with_default(mut self, literal: impl Into<String>) -> Self {
        if let PropertyKind::Field { default } = &mut self.kind {
            *default = Some(literal.into());
        }
        self
    }

    #[must_use]
    pub const fn tag(&self) -> PropertyTag {
        match self.kind {
            PropertyKind::Field { .. } => PropertyTag::Field,
            PropertyKind::Relationship => PropertyTag::Relationship,
            PropertyKind::EnumValue => PropertyTag::EnumValue,
        }
    }

    #[must_use]
    pub const fn is_field(&self) -> bool {
        matches!(self.kind, PropertyKind::Field { .. })
    }

    #[must_use]
    pub const fn is_relationship(&self) -> bool {
        matches!(self.kind, PropertyKind::Relationship)
    }

    #[must_use]
    pub const fn is_enum_value(&self) -> bool {
        matches!(self.kind, PropertyKind::EnumValue)
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        match &self.kind {
            PropertyKind::Field { default } => default.as_deref(),
            _ => None,
        }
    }

    /// The primitive type of a field, if it declares one.
    #[must_use]
    pub fn primitive(&self) -> Option<Primitive> {
        if self.is_field() {
            Primitive::from_type_name(&self.type_name)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.primitive().is_some()
    }

    /// Fully qualified name of the declaring class.
    #[must_use]
    pub fn parent(&self) -> &str {
        &self.parent
    }

    /// Fully qualified target type; primitives answer with their own name.
    #[must_use]
    pub fn fully_qualified_type_name(&self) -> &str {
        self.resolved_type.as_deref().unwrap_or(&self.type_name)
    }
}

impl ValidateNode for Property {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = validate_ident(&self.name) {
            errs.add(msg);
        }

        match self.kind {
            PropertyKind::EnumValue => {
                if !self.type_name.is_empty() {
                    err!(errs, "enum value '{}' cannot declare a type", self.name);
                }
                if self.array || self.optional {
                    err!(errs, "enum value '{}' cannot be an array or optional", self.name);
                }
            }
            PropertyKind::Field { .. } | PropertyKind::Relationship => {
                if self.type_name.is_empty() {
                    err!(errs, "{} '{}' has no type", self.tag(), self.name);
                }
            }
        }

        if self.array
            && let Some(default) = self.default_value()
        {
            err!(
                errs,
                "array field '{}' cannot carry a default ('{default}')",
                self.name
            );
        }

        errs.result()
    }
}

///
/// TESTS
///
