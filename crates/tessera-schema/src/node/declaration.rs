use crate::{prelude::*, validate::naming::validate_ident};
use derive_more::Display;

///
/// DeclarationKind
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    #[display("asset")]
    Asset,
    #[display("participant")]
    Participant,
    #[display("transaction")]
    Transaction,
    #[display("enum")]
    Enum,
    #[display("concept")]
    Concept,
}

impl DeclarationKind {
    /// Kinds whose instances carry an identity and can be relationship targets.
    #[must_use]
    pub const fn is_identifiable(self) -> bool {
        matches!(self, Self::Asset | Self::Participant | Self::Transaction)
    }
}

///
/// ClassDeclaration
///
/// A named type definition. The declared shape (`properties`) is what the
/// upstream parser hands over; everything in `Resolved` is computed once at
/// load by the registry builder and never changes afterwards.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClassDeclaration {
    pub name: String,
    pub kind: DeclarationKind,

    #[serde(rename = "extends", default, skip_serializing_if = "Option::is_none")]
    pub super_type: Option<String>,

    #[serde(rename = "abstract", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_abstract: bool,

    #[serde(rename = "identified_by", default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default)]
    pub properties: Vec<Property>,

    #[serde(skip)]
    pub(crate) resolved: Resolved,
}

///
/// Resolved
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Resolved {
    pub namespace: String,
    pub super_type: Option<String>,
    pub identifier: Option<String>,
    pub all_properties: Vec<Property>,
}

impl ClassDeclaration {
    #[must_use]
    pub fn new(kind: DeclarationKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            super_type: None,
            is_abstract: false,
            identifier: None,
            properties: Vec::new(),
            resolved: Resolved::default(),
        }
    }

    #[must_use]
    pub fn asset(name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Asset, name)
    }

    #[must_use]
    pub fn participant(name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Participant, name)
    }

    #[must_use]
    pub fn transaction(name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Transaction, name)
    }

    #[must_use]
    pub fn concept(name: impl Into<String>) -> Self {
        Self::new(DeclarationKind::Concept, name)
    }

    /// Build an enum from its value names.
    #[must_use]
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut decl = Self::new(DeclarationKind::Enum, name);
        decl.properties = values.into_iter().map(Property::enum_value).collect();

        decl
    }

    #[must_use]
    pub fn extends(mut self, super_type: impl Into<String>) -> Self {
        self.super_type = Some(super_type.into());
        self
    }

    #[must_use]
    pub const fn set_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn identified_by(mut self, field: impl Into<String>) -> Self {
        self.identifier = Some(field.into());
        self
    }

    #[must_use]
    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    //
    // resolved accessors
    //

    /// Namespace of the owning model file.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.resolved.namespace
    }

    #[must_use]
    pub fn fully_qualified_name(&self) -> String {
        fully_qualified_name(&self.resolved.namespace, &self.name)
    }

    /// Fully qualified name of the direct superclass.
    #[must_use]
    pub fn super_type_name(&self) -> Option<&str> {
        self.resolved.super_type.as_deref()
    }

    /// Identifying field, declared here or inherited from the nearest ancestor.
    #[must_use]
    pub fn identifier_field_name(&self) -> Option<&str> {
        self.resolved.identifier.as_deref()
    }

    /// Ancestor properties root-first, then the properties declared here.
    #[must_use]
    pub fn all_properties(&self) -> &[Property] {
        &self.resolved.all_properties
    }

    /// Properties declared directly on this class.
    #[must_use]
    pub fn own_properties(&self) -> &[Property] {
        &self.properties
    }

    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.resolved.all_properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn get_own_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Value names of an enum declaration; empty for every other kind.
    pub fn enum_values(&self) -> impl Iterator<Item = &str> {
        self.resolved
            .all_properties
            .iter()
            .filter(|p| p.is_enum_value())
            .map(|p| p.name.as_str())
    }

    #[must_use]
    pub const fn is_enum(&self) -> bool {
        matches!(self.kind, DeclarationKind::Enum)
    }

    #[must_use]
    pub const fn is_transaction(&self) -> bool {
        matches!(self.kind, DeclarationKind::Transaction)
    }

    #[must_use]
    pub const fn is_concept(&self) -> bool {
        matches!(self.kind, DeclarationKind::Concept)
    }
}

impl ValidateNode for ClassDeclaration {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = validate_ident(&self.name) {
            errs.add(msg);
        }

        // properties
        let mut seen = std::collections::BTreeSet::new();
        for prop in &self.properties {
            if !seen.insert(prop.name.as_str()) {
                err!(errs, "duplicate property '{}'", prop.name);
            }
            if let Err(tree) = prop.validate() {
                errs.merge_for(prop.name.clone(), tree);
            }

            let allowed = if self.is_enum() {
                prop.is_enum_value()
            } else {
                !prop.is_enum_value()
            };
            if !allowed {
                err!(
                    errs,
                    "{} '{}' is not allowed on {} declaration '{}'",
                    prop.tag(),
                    prop.name,
                    self.kind,
                    self.name
                );
            }
        }

        // enums and concepts carry no identity
        if self.identifier.is_some() && !self.kind.is_identifiable() {
            err!(errs, "{} '{}' cannot be identified by a field", self.kind, self.name);
        }

        if self.is_enum() && self.super_type.is_some() {
            err!(errs, "enum '{}' cannot extend another type", self.name);
        }

        errs.result()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_with_field_is_rejected() {
        let decl = ClassDeclaration::enumeration("Colour", ["RED"])
            .property(Property::field("hex", "String"));

        let errs = decl.validate().unwrap_err();
        assert!(errs.contains("field 'hex' is not allowed on enum declaration"));
    }

    #[test]
    fn concepts_cannot_be_identified() {
        let decl = ClassDeclaration::concept("Address")
            .identified_by("street")
            .property(Property::field("street", "String"));

        let errs = decl.validate().unwrap_err();
        assert!(errs.contains("cannot be identified"));
    }

    #[test]
    fn duplicate_own_property_is_rejected() {
        let decl = ClassDeclaration::asset("Vehicle")
            .property(Property::field("vin", "String"))
            .property(Property::field("vin", "String"));

        let errs = decl.validate().unwrap_err();
        assert!(errs.contains("duplicate property 'vin'"));
    }

    #[test]
    fn deserializes_declaration() {
        let json = r#"{
            "name": "Car",
            "kind": "asset",
            "extends": "Vehicle",
            "abstract": true,
            "properties": [{"name": "seats", "type": "Integer", "kind": "field"}]
        }"#;

        let decl: ClassDeclaration = serde_json::from_str(json).unwrap();

        assert_eq!(decl.kind, DeclarationKind::Asset);
        assert_eq!(decl.super_type.as_deref(), Some("Vehicle"));
        assert!(decl.is_abstract);
        assert_eq!(decl.own_properties().len(), 1);
        // resolved views stay empty until the registry builds the declaration
        assert!(decl.all_properties().is_empty());
    }
}
