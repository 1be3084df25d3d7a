use crate::{
    ThisError,
    generator::{GenerateError, Generator},
    relationship::Relationship,
    resource::{Resource, Validation, ValidationError},
    value::Value,
};
use tessera_config::GeneratorConfig;
use tessera_schema::{TRANSACTION_TIMESTAMP_FIELD, prelude::*, registry::ResolveError};
use time::OffsetDateTime;
use ulid::Ulid;

///
/// FactoryError
///

#[derive(Debug, ThisError)]
pub enum FactoryError {
    #[error("cannot create abstract type '{0}'")]
    AbstractType(String),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("{0} not specified")]
    MalformedInput(&'static str),

    #[error("cannot create an instance of {kind} '{fqn}'")]
    NotInstantiable { kind: DeclarationKind, fqn: String },

    #[error("'{0}' is not a transaction")]
    NotATransaction(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

///
/// InstanceOptions
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct InstanceOptions {
    /// Build an unchecked resource instead of a checked one.
    pub disable_validation: bool,

    /// Fill the new resource with sample data.
    pub generate: bool,
}

impl InstanceOptions {
    #[must_use]
    pub const fn unchecked() -> Self {
        Self {
            disable_validation: true,
            generate: false,
        }
    }

    #[must_use]
    pub const fn generated() -> Self {
        Self {
            disable_validation: false,
            generate: true,
        }
    }

    const fn validation(self) -> Validation {
        if self.disable_validation {
            Validation::Unchecked
        } else {
            Validation::Checked
        }
    }
}

///
/// Factory
///
/// The one way to create resources, relationships and transactions.
///

#[derive(Clone, Copy, Debug)]
pub struct Factory<'m> {
    manager: &'m ModelManager,
    generator: GeneratorConfig,
}

impl<'m> Factory<'m> {
    #[must_use]
    pub fn new(manager: &'m ModelManager) -> Self {
        Self {
            manager,
            generator: GeneratorConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator = config;
        self
    }

    #[must_use]
    pub const fn model_manager(&self) -> &'m ModelManager {
        self.manager
    }

    /// Create a resource of any concrete class. Concepts carry `id` as their
    /// identity only, having no identifying field to hold it.
    ///
    /// Defaults are applied first, then sample data when asked for, and the
    /// identifier is written last so it always equals `id`.
    pub fn new_instance(
        &self,
        namespace: &str,
        type_name: &str,
        id: &str,
        options: InstanceOptions,
    ) -> Result<Resource<'m>, FactoryError> {
        require(namespace, "namespace")?;
        require(type_name, "type")?;
        require(id, "id")?;

        let decl = self.resolve(namespace, type_name)?;
        if decl.is_enum() {
            return Err(FactoryError::NotInstantiable {
                kind: decl.kind,
                fqn: decl.fully_qualified_name(),
            });
        }

        let mut resource = self.construct(decl, Some(id.to_string()), options)?;
        if let Some(field) = decl.identifier_field_name() {
            resource.insert(field, Value::String(id.to_string()));
        }

        tracing::debug!(namespace, type_name, id, "resource created");

        Ok(resource)
    }

    /// Create an identity-less concept instance, for embedding in a resource.
    pub fn new_concept(
        &self,
        namespace: &str,
        type_name: &str,
        options: InstanceOptions,
    ) -> Result<Resource<'m>, FactoryError> {
        require(namespace, "namespace")?;
        require(type_name, "type")?;

        let decl = self.resolve(namespace, type_name)?;
        if !decl.is_concept() {
            return Err(FactoryError::NotInstantiable {
                kind: decl.kind,
                fqn: decl.fully_qualified_name(),
            });
        }

        let resource = self.construct(decl, None, options)?;
        tracing::debug!(namespace, type_name, "concept created");

        Ok(resource)
    }

    /// A pointer to `namespace.type_name#id`. The type must resolve, but the
    /// target instance is not looked up and may be abstract-typed.
    pub fn new_relationship(
        &self,
        namespace: &str,
        type_name: &str,
        id: &str,
    ) -> Result<Relationship, FactoryError> {
        require(namespace, "namespace")?;
        require(type_name, "type")?;
        require(id, "id")?;

        let decl = self.manager.resolve(namespace, type_name)?;

        Ok(Relationship::new(decl.namespace(), &decl.name, id))
    }

    /// Create a transaction, generating a ULID when no id is given, and
    /// stamp it with the current time.
    pub fn new_transaction(
        &self,
        namespace: &str,
        type_name: &str,
        id: Option<&str>,
        options: InstanceOptions,
    ) -> Result<Resource<'m>, FactoryError> {
        require(namespace, "namespace")?;
        require(type_name, "type")?;

        let id = match id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Ulid::new().to_string(),
        };

        let mut transaction = self.new_instance(namespace, type_name, &id, options)?;
        if !transaction.class_declaration().is_transaction() {
            return Err(FactoryError::NotATransaction(
                transaction.fully_qualified_type_name(),
            ));
        }

        transaction.set(TRANSACTION_TIMESTAMP_FIELD, OffsetDateTime::now_utc())?;

        Ok(transaction)
    }

    fn resolve(&self, namespace: &str, type_name: &str) -> Result<&'m ClassDeclaration, FactoryError> {
        let decl = self.manager.resolve(namespace, type_name)?;
        if decl.is_abstract {
            return Err(FactoryError::AbstractType(decl.fully_qualified_name()));
        }

        Ok(decl)
    }

    fn construct(
        &self,
        decl: &'m ClassDeclaration,
        id: Option<String>,
        options: InstanceOptions,
    ) -> Result<Resource<'m>, FactoryError> {
        let mut resource = Resource::new(self.manager, decl, id, options.validation());
        resource.assign_field_defaults();

        if options.generate {
            resource = Generator::new(self.manager, self.generator).populate(resource)?;
        }

        Ok(resource)
    }
}

const fn require(value: &str, what: &'static str) -> Result<(), FactoryError> {
    if value.is_empty() {
        Err(FactoryError::MalformedInput(what))
    } else {
        Ok(())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_schema::fixtures;

    #[test]
    fn identifier_equals_supplied_id() {
        let mm = fixtures::vehicles();
        let factory = Factory::new(&mm);

        let vehicle = factory
            .new_instance("org.acme", "Vehicle", "1HGCM82633A004352", InstanceOptions::default())
            .unwrap();

        assert_eq!(vehicle.id(), Some("1HGCM82633A004352"));
        assert_eq!(vehicle.get("vin"), Some(&Value::from("1HGCM82633A004352")));
        assert!(!vehicle.contains("owner"));
        assert!(vehicle.is_checked());
    }

    #[test]
    fn undefined_type_names_namespace_and_type() {
        let mm = fixtures::vehicles();
        let err = Factory::new(&mm)
            .new_instance("org.acme", "Trailer", "1", InstanceOptions::default())
            .unwrap_err();

        assert!(matches!(
            err,
            FactoryError::Resolve(ResolveError::TypeNotFound { ref namespace, ref type_name })
                if namespace == "org.acme" && type_name == "Trailer"
        ));
    }

    #[test]
    fn abstract_types_are_never_built() {
        let mm = fixtures::fleet();
        let err = Factory::new(&mm)
            .new_instance("org.acme.base", "Vehicle", "V1", InstanceOptions::default())
            .unwrap_err();

        assert_eq!(err.to_string(), "cannot create abstract type 'org.acme.base.Vehicle'");
    }

    #[test]
    fn missing_arguments_are_malformed_input() {
        let mm = fixtures::vehicles();
        let factory = Factory::new(&mm);

        for (ns, ty, id) in [("", "Vehicle", "1"), ("org.acme", "", "1"), ("org.acme", "Vehicle", "")] {
            let err = factory.new_instance(ns, ty, id, InstanceOptions::default()).unwrap_err();
            assert!(matches!(err, FactoryError::MalformedInput(_)));
        }
        assert_eq!(
            factory.new_transaction("", "Transfer", None, InstanceOptions::default()).unwrap_err().to_string(),
            "namespace not specified"
        );
    }

    #[test]
    fn defaults_are_typed() {
        let mm = fixtures::fleet();
        let car = Factory::new(&mm)
            .new_instance("org.acme.fleet", "Car", "C1", InstanceOptions::default())
            .unwrap();

        assert_eq!(car.get("seats"), Some(&Value::Integer(5)));
        assert_eq!(car.get("convertible"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn instances_resolve_through_imports() {
        let mm = fixtures::fleet();
        let person = Factory::new(&mm)
            .new_instance("org.acme.fleet", "Person", "alice@example.com", InstanceOptions::default())
            .unwrap();

        assert_eq!(person.namespace(), "org.acme.base");
        assert_eq!(person.get("email"), Some(&Value::from("alice@example.com")));
    }

    #[test]
    fn generated_instances_keep_the_supplied_id() {
        let mm = fixtures::fleet();
        let factory = Factory::new(&mm).with_generator_config(GeneratorConfig {
            seed: Some(1),
            ..GeneratorConfig::default()
        });

        let truck = factory
            .new_instance("org.acme.fleet", "Truck", "T-1", InstanceOptions::generated())
            .unwrap();

        assert_eq!(truck.get("vin"), Some(&Value::from("T-1")));
        assert!(truck.contains("payload"));
        truck.validate().unwrap();
    }

    #[test]
    fn unchecked_option_builds_unchecked_resources() {
        let mm = fixtures::vehicles();
        let mut vehicle = Factory::new(&mm)
            .new_instance("org.acme", "Vehicle", "V", InstanceOptions::unchecked())
            .unwrap();

        vehicle.set("owner", 12).unwrap();
        assert!(!vehicle.is_checked());
    }

    #[test]
    fn relationships_resolve_but_do_not_look_up() {
        let mm = fixtures::fleet();
        let factory = Factory::new(&mm);

        let rel = factory.new_relationship("org.acme.fleet", "Person", "nobody").unwrap();
        assert_eq!(rel.to_uri(), "resource:org.acme.base.Person#nobody");

        assert!(matches!(
            factory.new_relationship("org.acme.fleet", "Trailer", "x"),
            Err(FactoryError::Resolve(_))
        ));
    }

    #[test]
    fn transactions_get_an_id_and_a_timestamp() {
        let mm = fixtures::fleet();
        let factory = Factory::new(&mm);

        let tx = factory
            .new_transaction("org.acme.fleet", "Transfer", None, InstanceOptions::default())
            .unwrap();

        let id = tx.id().unwrap();
        assert_eq!(id.len(), 26);
        assert!(id.parse::<Ulid>().is_ok());
        assert!(matches!(tx.get(TRANSACTION_TIMESTAMP_FIELD), Some(Value::DateTime(_))));

        let tx = factory
            .new_transaction("org.acme.fleet", "Transfer", Some("TX-1"), InstanceOptions::default())
            .unwrap();
        assert_eq!(tx.id(), Some("TX-1"));
    }

    #[test]
    fn non_transactions_are_rejected() {
        let mm = fixtures::fleet();
        let err = Factory::new(&mm)
            .new_transaction("org.acme.fleet", "Car", None, InstanceOptions::default())
            .unwrap_err();

        assert_eq!(err.to_string(), "'org.acme.fleet.Car' is not a transaction");
    }

    #[test]
    fn enums_are_never_instantiated() {
        let mm = fixtures::fleet();
        let factory = Factory::new(&mm);

        assert!(matches!(
            factory.new_instance("org.acme.base", "Colour", "C", InstanceOptions::default()),
            Err(FactoryError::NotInstantiable { kind: DeclarationKind::Enum, .. })
        ));
        assert!(matches!(
            factory.new_concept("org.acme.base", "Colour", InstanceOptions::default()),
            Err(FactoryError::NotInstantiable { kind: DeclarationKind::Enum, .. })
        ));

        let address = factory
            .new_concept("org.acme.base", "Address", InstanceOptions::generated())
            .unwrap();
        assert_eq!(address.id(), None);
        assert!(address.contains("street"));
    }

    #[test]
    fn concepts_can_carry_an_identity() {
        let mm = fixtures::fleet();
        let address = Factory::new(&mm)
            .new_instance("org.acme.base", "Address", "HQ", InstanceOptions::generated())
            .unwrap();

        assert_eq!(address.id(), Some("HQ"));
        assert_eq!(address.fully_qualified_identifier(), "org.acme.base.Address#HQ");
        address.validate().unwrap();
    }
}
