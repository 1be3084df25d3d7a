use crate::{
    ThisError,
    relationship::Relationship,
    value::{Embedded, Value},
};
use std::{collections::BTreeMap, fmt};
use tessera_schema::prelude::*;

///
/// Validation
///
/// Mutation discipline of a resource, fixed at construction.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Validation {
    /// Values are stored as given.
    Unchecked,

    /// Every write is checked against the declaration first and a failed
    /// check leaves the resource untouched.
    #[default]
    Checked,
}

///
/// ValidationError
///
/// `type_name` is the fully qualified name of the class being written to.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidationError {
    #[error("identifying property '{property}' of '{type_name}' cannot change")]
    ImmutableIdentifier { type_name: String, property: String },

    #[error("required property '{property}' of '{type_name}' is missing")]
    MissingProperty { type_name: String, property: String },

    #[error("property '{property}' of '{type_name}' expects {expected}, got {found}")]
    TypeMismatch {
        type_name: String,
        property: String,
        expected: String,
        found: String,
    },

    #[error("'{type_name}' has no property '{property}'")]
    UnknownProperty { type_name: String, property: String },
}

///
/// Resource
///
/// A runtime instance of a declaration: an immutable identity plus a
/// mutable property bag. It borrows the registry and its declaration, so
/// the registry outlives every resource built from it.
///

#[derive(Clone, Debug)]
pub struct Resource<'m> {
    manager: &'m ModelManager,
    declaration: &'m ClassDeclaration,
    id: Option<String>,
    validation: Validation,
    values: BTreeMap<String, Value>,
}

impl<'m> Resource<'m> {
    pub(crate) const fn new(
        manager: &'m ModelManager,
        declaration: &'m ClassDeclaration,
        id: Option<String>,
        validation: Validation,
    ) -> Self {
        Self {
            manager,
            declaration,
            id,
            validation,
            values: BTreeMap::new(),
        }
    }

    //
    // identity
    //

    #[must_use]
    pub const fn model_manager(&self) -> &'m ModelManager {
        self.manager
    }

    #[must_use]
    pub const fn class_declaration(&self) -> &'m ClassDeclaration {
        self.declaration
    }

    #[must_use]
    pub fn namespace(&self) -> &'m str {
        self.declaration.namespace()
    }

    #[must_use]
    pub fn type_name(&self) -> &'m str {
        &self.declaration.name
    }

    #[must_use]
    pub fn fully_qualified_type_name(&self) -> String {
        self.declaration.fully_qualified_name()
    }

    /// Identifier; `None` for concept instances.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// `org.acme.Vehicle#ABC`, or just the type name without an id.
    #[must_use]
    pub fn fully_qualified_identifier(&self) -> String {
        match &self.id {
            Some(id) => format!("{}#{id}", self.fully_qualified_type_name()),
            None => self.fully_qualified_type_name(),
        }
    }

    /// A pointer to this resource, if it has an identity.
    #[must_use]
    pub fn to_relationship(&self) -> Option<Relationship> {
        self.id
            .as_ref()
            .map(|id| Relationship::new(self.namespace(), self.type_name(), id.clone()))
    }

    #[must_use]
    pub const fn validation(&self) -> Validation {
        self.validation
    }

    #[must_use]
    pub const fn is_checked(&self) -> bool {
        matches!(self.validation, Validation::Checked)
    }

    //
    // property bag
    //

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ValidationError> {
        let name = name.into();
        let value = value.into();

        self.guard_identifier(&name, &value)?;
        if self.is_checked() {
            self.checker(false).assign(self.declaration, &name, &value)?;
        }
        self.values.insert(name, value);

        Ok(())
    }

    /// Set several properties at once. Checked resources verify every pair
    /// before writing any of them.
    pub fn set_all<I, S>(&mut self, values: I) -> Result<(), ValidationError>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let values: Vec<(String, Value)> = values.into_iter().map(|(k, v)| (k.into(), v)).collect();

        for (name, value) in &values {
            self.guard_identifier(name, value)?;
        }
        if self.is_checked() {
            let checker = self.checker(false);
            for (name, value) in &values {
                checker.assign(self.declaration, name, value)?;
            }
        }
        self.values.extend(values);

        Ok(())
    }

    /// Append to an array property, creating the array if needed.
    pub fn add_array_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), ValidationError> {
        let name = name.into();
        let value = value.into();

        if self.is_checked() {
            self.checker(false).append(self.declaration, &name, &value)?;
        }

        match self.values.get_mut(&name) {
            Some(Value::List(items)) => items.push(value),
            _ => {
                self.values.insert(name, Value::List(vec![value]));
            }
        }

        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// The identifying field only ever holds the identifier, whatever the
    /// validation policy.
    fn guard_identifier(&self, name: &str, value: &Value) -> Result<(), ValidationError> {
        let Some(id) = self.id.as_deref() else {
            return Ok(());
        };
        if self.declaration.identifier_field_name() != Some(name) || value.as_str() == Some(id) {
            return Ok(());
        }

        Err(ValidationError::ImmutableIdentifier {
            type_name: self.fully_qualified_type_name(),
            property: name.to_string(),
        })
    }

    /// Whole-instance check: every required property is present, nothing
    /// outside the declaration is set, and every value has the right shape.
    /// Applies to unchecked resources too.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.checker(true).instance(self.declaration, &self.values)
    }

    /// Detach the property bag for storage inside another resource.
    #[must_use]
    pub fn into_embedded(self) -> Embedded {
        Embedded {
            class: self.fully_qualified_type_name(),
            id: self.id,
            values: self.values,
        }
    }

    //
    // crate internals
    //

    /// Write without checks; for values the crate has already converted.
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Apply every convertible field default. Literals that do not convert
    /// to the declared type are skipped.
    pub(crate) fn assign_field_defaults(&mut self) {
        for prop in self.declaration.all_properties() {
            let Some(literal) = prop.default_value() else {
                continue;
            };
            if prop.array {
                continue;
            }

            let value = match prop.primitive() {
                Some(primitive) => Value::from_default(primitive, literal),
                None => self.enum_default(prop, literal),
            };

            match value {
                Some(value) => {
                    self.values.insert(prop.name.clone(), value);
                }
                None => tracing::trace!(
                    property = %prop.name,
                    literal,
                    "default does not convert to the declared type"
                ),
            }
        }
    }

    fn enum_default(&self, prop: &Property, literal: &str) -> Option<Value> {
        let decl = self.manager.get_type(prop.fully_qualified_type_name()).ok()?;
        let literal = literal.trim();

        (decl.is_enum() && decl.enum_values().any(|v| v == literal))
            .then(|| Value::Enum(literal.to_string()))
    }

    const fn checker(&self, complete: bool) -> Checker<'m> {
        Checker {
            manager: self.manager,
            complete,
        }
    }
}

impl fmt::Display for Resource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource {{id={}}}", self.fully_qualified_identifier())
    }
}

///
/// Checker
///
/// Type checks values against declarations. `complete` also demands every
/// required property, recursively through embedded instances.
///

struct Checker<'m> {
    manager: &'m ModelManager,
    complete: bool,
}

impl Checker<'_> {
    fn assign(&self, decl: &ClassDeclaration, name: &str, value: &Value) -> Result<(), ValidationError> {
        let prop = lookup(decl, name)?;

        self.property(&decl.fully_qualified_name(), prop, value)
    }

    fn append(&self, decl: &ClassDeclaration, name: &str, value: &Value) -> Result<(), ValidationError> {
        let prop = lookup(decl, name)?;
        let owner = decl.fully_qualified_name();

        if !prop.array {
            return Err(mismatch(&owner, prop, "array element".to_string()));
        }
        if !self.scalar(prop, value)? {
            return Err(mismatch(&owner, prop, value.type_label()));
        }

        Ok(())
    }

    fn instance(&self, decl: &ClassDeclaration, values: &BTreeMap<String, Value>) -> Result<(), ValidationError> {
        let owner = decl.fully_qualified_name();

        for (name, value) in values {
            let prop = lookup(decl, name)?;
            self.property(&owner, prop, value)?;
        }

        if self.complete {
            for prop in decl.all_properties() {
                if !prop.optional && !values.contains_key(&prop.name) {
                    return Err(ValidationError::MissingProperty {
                        type_name: owner,
                        property: prop.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn property(&self, owner: &str, prop: &Property, value: &Value) -> Result<(), ValidationError> {
        if prop.array {
            let Value::List(items) = value else {
                return Err(mismatch(owner, prop, value.type_label()));
            };
            for item in items {
                if !self.scalar(prop, item)? {
                    return Err(mismatch(owner, prop, format!("array containing {}", item.type_label())));
                }
            }

            return Ok(());
        }

        if self.scalar(prop, value)? {
            Ok(())
        } else {
            Err(mismatch(owner, prop, value.type_label()))
        }
    }

    // Does a single (non-list) value fit the property's declared type?
    fn scalar(&self, prop: &Property, value: &Value) -> Result<bool, ValidationError> {
        let target = prop.fully_qualified_type_name();

        let fits = match &prop.kind {
            PropertyKind::EnumValue => false,
            PropertyKind::Relationship => match value {
                Value::Relationship(rel) => self
                    .manager
                    .is_subtype_of(&rel.fully_qualified_type_name(), target),
                _ => false,
            },
            PropertyKind::Field { .. } => match prop.primitive() {
                Some(primitive) => primitive_fits(primitive, value),
                None => match self.manager.get_type(target) {
                    Ok(decl) if decl.is_enum() => {
                        matches!(value, Value::Enum(v) if decl.enum_values().any(|e| e == v))
                    }
                    Ok(_) => match value {
                        Value::Resource(embedded) if self.manager.is_subtype_of(&embedded.class, target) => {
                            self.embedded(embedded)?;
                            true
                        }
                        _ => false,
                    },
                    Err(_) => false,
                },
            },
        };

        Ok(fits)
    }

    fn embedded(&self, embedded: &Embedded) -> Result<(), ValidationError> {
        match self.manager.get_type(&embedded.class) {
            Ok(decl) => self.instance(decl, &embedded.values),
            Err(_) => Ok(()),
        }
    }
}

fn lookup<'d>(decl: &'d ClassDeclaration, name: &str) -> Result<&'d Property, ValidationError> {
    decl.get_property(name)
        .ok_or_else(|| ValidationError::UnknownProperty {
            type_name: decl.fully_qualified_name(),
            property: name.to_string(),
        })
}

const fn primitive_fits(primitive: Primitive, value: &Value) -> bool {
    matches!(
        (primitive, value),
        (Primitive::Boolean, Value::Boolean(_))
            | (Primitive::DateTime, Value::DateTime(_))
            | (Primitive::Double, Value::Double(_))
            | (Primitive::Integer, Value::Integer(_))
            | (Primitive::Long, Value::Long(_) | Value::Integer(_))
            | (Primitive::String, Value::String(_))
    )
}

fn mismatch(owner: &str, prop: &Property, found: String) -> ValidationError {
    let target = prop.fully_qualified_type_name();
    let base = if prop.is_relationship() {
        format!("relationship to {target}")
    } else {
        target.to_string()
    };

    ValidationError::TypeMismatch {
        type_name: owner.to_string(),
        property: prop.name.clone(),
        expected: if prop.array { format!("{base}[]") } else { base },
        found,
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_schema::fixtures;

    fn resource<'m>(mm: &'m ModelManager, fqn: &str, validation: Validation) -> Resource<'m> {
        let decl = mm.get_type(fqn).unwrap();
        let id = decl.identifier_field_name().map(|_| "ID-1".to_string());

        Resource::new(mm, decl, id, validation)
    }

    #[test]
    fn checked_set_rejects_wrong_type_and_keeps_state() {
        let mm = fixtures::fleet();
        let mut car = resource(&mm, "org.acme.fleet.Car", Validation::Checked);

        car.set("seats", 4).unwrap();
        let err = car.set("seats", "four").unwrap_err();

        assert_eq!(
            err,
            ValidationError::TypeMismatch {
                type_name: "org.acme.fleet.Car".into(),
                property: "seats".into(),
                expected: "Integer".into(),
                found: "String".into(),
            }
        );
        assert_eq!(car.get("seats"), Some(&Value::Integer(4)));
    }

    #[test]
    fn unchecked_set_accepts_anything() {
        let mm = fixtures::fleet();
        let mut car = resource(&mm, "org.acme.fleet.Car", Validation::Unchecked);

        car.set("seats", "four").unwrap();
        car.set("wheels", 4).unwrap();

        assert_eq!(car.get("seats"), Some(&Value::from("four")));
        assert!(car.validate().is_err());
    }

    #[test]
    fn unknown_property_is_named() {
        let mm = fixtures::fleet();
        let mut car = resource(&mm, "org.acme.fleet.Car", Validation::Checked);

        let err = car.set("wheels", 4).unwrap_err();
        assert_eq!(err.to_string(), "'org.acme.fleet.Car' has no property 'wheels'");
    }

    #[test]
    fn set_all_is_atomic() {
        let mm = fixtures::fleet();
        let mut car = resource(&mm, "org.acme.fleet.Car", Validation::Checked);

        let err = car
            .set_all([("seats", Value::Integer(2)), ("convertible", Value::from("no"))])
            .unwrap_err();

        assert!(matches!(err, ValidationError::TypeMismatch { ref property, .. } if property == "convertible"));
        assert!(!car.contains("seats"));
    }

    #[test]
    fn enums_must_name_a_declared_value() {
        let mm = fixtures::fleet();
        let mut car = resource(&mm, "org.acme.fleet.Car", Validation::Checked);

        car.set("colour", Value::Enum("RED".into())).unwrap();
        let err = car.set("colour", Value::Enum("PINK".into())).unwrap_err();

        assert!(err.to_string().contains("expects org.acme.base.Colour, got enum value 'PINK'"));
    }

    #[test]
    fn relationships_accept_subtypes_only() {
        let mm = fixtures::fleet();
        let mut transfer = resource(&mm, "org.acme.fleet.Transfer", Validation::Checked);

        transfer
            .set("vehicle", Relationship::new("org.acme.fleet", "Truck", "T1"))
            .unwrap();
        let err = transfer
            .set("vehicle", Relationship::new("org.acme.base", "Person", "P1"))
            .unwrap_err();

        assert!(err.to_string().contains("expects relationship to org.acme.base.Vehicle"));
    }

    #[test]
    fn arrays_need_lists_of_matching_values() {
        let mm = fixtures::fleet();
        let mut truck = resource(&mm, "org.acme.fleet.Truck", Validation::Checked);

        let driver = Relationship::new("org.acme.base", "Person", "alice");
        assert!(truck.set("drivers", driver.clone()).is_err());

        truck.set("drivers", vec![driver.clone()]).unwrap();
        truck
            .add_array_value("drivers", Relationship::new("org.acme.base", "Person", "bob"))
            .unwrap();
        assert_eq!(truck.get("drivers").and_then(Value::as_list).map(Vec::len), Some(2));

        let err = truck.add_array_value("payload", 1.5).unwrap_err();
        assert!(err.to_string().contains("got array element"));
    }

    #[test]
    fn embedded_instances_are_checked_by_class() {
        let mm = fixtures::fleet();
        let mut person = resource(&mm, "org.acme.base.Person", Validation::Checked);

        let mut address = resource(&mm, "org.acme.base.Address", Validation::Checked);
        address.set("street", "1 Main St").unwrap();
        person.set("address", address.clone().into_embedded()).unwrap();

        // wrong class
        let car = resource(&mm, "org.acme.fleet.Car", Validation::Unchecked);
        assert!(person.set("address", car.into_embedded()).is_err());

        // bad nested value
        let mut bad = resource(&mm, "org.acme.base.Address", Validation::Unchecked);
        bad.set("street", 12).unwrap();
        let err = person.set("address", bad.into_embedded()).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { ref property, .. } if property == "street"));

        // incomplete nested instances only fail the whole-instance check
        person.set("email", "ID-1").unwrap();
        person.set("name", "Alice").unwrap();
        let err = person.validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingProperty {
                type_name: "org.acme.base.Address".into(),
                property: "city".into(),
            }
        );
    }

    #[test]
    fn validate_requires_every_required_property() {
        let mm = fixtures::vehicles();
        let mut vehicle = resource(&mm, "org.acme.Vehicle", Validation::Checked);

        assert!(matches!(
            vehicle.validate(),
            Err(ValidationError::MissingProperty { ref property, .. }) if property == "vin"
        ));

        vehicle.set("vin", "ID-1").unwrap();
        vehicle.validate().unwrap();
    }

    #[test]
    fn identifying_field_cannot_change() {
        let mm = fixtures::vehicles();

        for validation in [Validation::Checked, Validation::Unchecked] {
            let mut vehicle = resource(&mm, "org.acme.Vehicle", validation);
            vehicle.set("vin", "ID-1").unwrap();

            let err = vehicle.set("vin", "OTHER").unwrap_err();
            assert_eq!(
                err,
                ValidationError::ImmutableIdentifier {
                    type_name: "org.acme.Vehicle".into(),
                    property: "vin".into(),
                }
            );
            assert!(vehicle.set_all([("owner", Value::from("x")), ("vin", Value::from("OTHER"))]).is_err());

            assert_eq!(vehicle.id(), Some("ID-1"));
            assert_eq!(vehicle.get("vin"), Some(&Value::from("ID-1")));
            assert!(!vehicle.contains("owner"));
        }
    }

    #[test]
    fn defaults_convert_or_are_skipped() {
        let mm = ModelManager::builder()
            .add_model_file(
                ModelFileDef::new("test")
                    .declare(ClassDeclaration::enumeration("Size", ["S", "M"]))
                    .declare(
                        ClassDeclaration::concept("Box")
                            .property(Property::field("count", "Integer").with_default("5"))
                            .property(Property::field("open", "Boolean").with_default("true"))
                            .property(Property::field("weight", "Double").with_default("heavy"))
                            .property(Property::field("size", "Size").with_default("M"))
                            .property(Property::field("shade", "Size").with_default("XL")),
                    ),
            )
            .build()
            .unwrap();

        let mut item = resource(&mm, "test.Box", Validation::Checked);
        item.assign_field_defaults();

        assert_eq!(item.get("count"), Some(&Value::Integer(5)));
        assert_eq!(item.get("open"), Some(&Value::Boolean(true)));
        assert_eq!(item.get("size"), Some(&Value::Enum("M".into())));
        assert!(!item.contains("weight"));
        assert!(!item.contains("shade"));
    }

    #[test]
    fn identity_is_formatted() {
        let mm = fixtures::vehicles();
        let vehicle = resource(&mm, "org.acme.Vehicle", Validation::Checked);

        assert_eq!(vehicle.to_string(), "Resource {id=org.acme.Vehicle#ID-1}");
        assert_eq!(
            vehicle.to_relationship().map(|r| r.to_uri()).as_deref(),
            Some("resource:org.acme.Vehicle#ID-1")
        );
    }
}
