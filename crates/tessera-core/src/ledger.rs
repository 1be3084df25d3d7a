//! Boundary to the resource registries kept on the ledger.
//!
//! Nothing here talks to a network. A [`Transport`] supplied by the host
//! carries each operation; this module only checks arguments, serializes
//! resources on the way out and deserializes them on the way back.

use crate::{
    ThisError,
    resource::Resource,
    serialize::{SerializeError, Serializer},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::marker::PhantomData;

///
/// Operation
///
/// Names of the ledger-side functions, as the transport sees them.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Operation {
    #[display("addAllResourcesToRegistry")]
    AddAll,
    #[display("addRegistry")]
    AddRegistry,
    #[display("addResourceToRegistry")]
    Add,
    #[display("existsRegistry")]
    ExistsRegistry,
    #[display("existsResourceInRegistry")]
    Exists,
    #[display("findResourcesInRegistry")]
    Find,
    #[display("getAllRegistries")]
    GetAllRegistries,
    #[display("getAllResourcesInRegistry")]
    GetAll,
    #[display("getRegistry")]
    GetRegistry,
    #[display("getResourceInRegistry")]
    Get,
    #[display("queryResourcesInRegistry")]
    Query,
    #[display("removeAllResourcesFromRegistry")]
    RemoveAll,
    #[display("removeResourceFromRegistry")]
    Remove,
    #[display("resolveAllResourcesInRegistry")]
    ResolveAll,
    #[display("resolveResourceInRegistry")]
    Resolve,
    #[display("updateAllResourcesInRegistry")]
    UpdateAll,
    #[display("updateResourceInRegistry")]
    Update,
}

///
/// TransportError
///

#[derive(Debug, ThisError)]
#[error("{operation} failed: {message}")]
pub struct TransportError {
    pub operation: Operation,
    pub message: String,
}

///
/// Transport
///
/// Carries one operation to the ledger. Calls block until the ledger
/// answers; retries and timeouts are the implementation's business.
///

pub trait Transport {
    fn invoke(&self, operation: Operation, args: &[String]) -> Result<(), TransportError>;

    fn query(&self, operation: Operation, args: &[String]) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn invoke(&self, operation: Operation, args: &[String]) -> Result<(), TransportError> {
        (**self).invoke(operation, args)
    }

    fn query(&self, operation: Operation, args: &[String]) -> Result<Vec<u8>, TransportError> {
        (**self).query(operation, args)
    }
}

//
// registries
//

/// Create a registry on the ledger.
pub fn add_registry<T: Transport + ?Sized>(
    transport: &T,
    registry_type: &str,
    id: &str,
    name: &str,
) -> Result<RegistryInfo, LedgerError> {
    require(registry_type, "registryType")?;
    require(id, "id")?;
    require(name, "name")?;

    transport.invoke(
        Operation::AddRegistry,
        &[registry_type.to_string(), id.to_string(), name.to_string()],
    )?;

    Ok(RegistryInfo {
        id: id.to_string(),
        name: name.to_string(),
    })
}

pub fn get_all_registries<T: Transport + ?Sized>(
    transport: &T,
    registry_type: &str,
) -> Result<Vec<RegistryInfo>, LedgerError> {
    require(registry_type, "registryType")?;

    let bytes = transport.query(Operation::GetAllRegistries, &[registry_type.to_string()])?;

    Ok(serde_json::from_slice(&bytes)?)
}

pub fn get_registry<T: Transport + ?Sized>(
    transport: &T,
    registry_type: &str,
    id: &str,
) -> Result<RegistryInfo, LedgerError> {
    require(registry_type, "registryType")?;
    require(id, "id")?;

    let bytes = transport.query(
        Operation::GetRegistry,
        &[registry_type.to_string(), id.to_string()],
    )?;

    Ok(serde_json::from_slice(&bytes)?)
}

pub fn exists_registry<T: Transport + ?Sized>(
    transport: &T,
    registry_type: &str,
    id: &str,
) -> Result<bool, LedgerError> {
    require(registry_type, "registryType")?;
    require(id, "id")?;

    let bytes = transport.query(
        Operation::ExistsRegistry,
        &[registry_type.to_string(), id.to_string()],
    )?;

    Ok(serde_json::from_slice(&bytes)?)
}

///
/// LedgerError
///

#[derive(Debug, ThisError)]
pub enum LedgerError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} not specified")]
    MalformedInput(&'static str),

    #[error("resource '{0}' has no identifier")]
    NoIdentifier(String),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

///
/// RegistryInfo
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RegistryInfo {
    pub id: String,
    pub name: String,
}

///
/// ResourceRegistry
///
/// One named registry of a given type (`Asset`, `Participant`,
/// `Transaction`). Every operation sends `[registry_type, id, ...]`.
///

pub struct ResourceRegistry<'m, T, S> {
    registry_type: String,
    info: RegistryInfo,
    transport: T,
    serializer: S,
    _model: PhantomData<&'m ()>,
}

impl<'m, T, S> ResourceRegistry<'m, T, S>
where
    T: Transport,
    S: Serializer<'m>,
{
    pub fn new(
        registry_type: &str,
        id: &str,
        name: &str,
        transport: T,
        serializer: S,
    ) -> Result<Self, LedgerError> {
        require(registry_type, "registryType")?;
        require(id, "id")?;
        require(name, "name")?;

        Ok(Self {
            registry_type: registry_type.to_string(),
            info: RegistryInfo {
                id: id.to_string(),
                name: name.to_string(),
            },
            transport,
            serializer,
            _model: PhantomData,
        })
    }

    #[must_use]
    pub fn registry_type(&self) -> &str {
        &self.registry_type
    }

    #[must_use]
    pub const fn info(&self) -> &RegistryInfo {
        &self.info
    }

    //
    // mutations
    //

    pub fn add(&self, resource: &Resource<'m>) -> Result<(), LedgerError> {
        self.invoke_one(Operation::Add, resource)
    }

    pub fn add_all(&self, resources: &[Resource<'m>]) -> Result<(), LedgerError> {
        self.invoke_many(Operation::AddAll, resources)
    }

    pub fn update(&self, resource: &Resource<'m>) -> Result<(), LedgerError> {
        self.invoke_one(Operation::Update, resource)
    }

    pub fn update_all(&self, resources: &[Resource<'m>]) -> Result<(), LedgerError> {
        self.invoke_many(Operation::UpdateAll, resources)
    }

    pub fn remove(&self, resource: &Resource<'m>) -> Result<(), LedgerError> {
        let id = identifier(resource)?;

        self.remove_id(id)
    }

    pub fn remove_id(&self, id: &str) -> Result<(), LedgerError> {
        require(id, "id")?;

        self.transport
            .invoke(Operation::Remove, &self.args([id.to_string()]))?;

        Ok(())
    }

    /// Remove by identifier; the ids travel as one JSON array.
    pub fn remove_all<I, D>(&self, ids: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        let ids: Vec<String> = ids.into_iter().map(|id| id.as_ref().to_string()).collect();
        if ids.is_empty() {
            return Err(LedgerError::MalformedInput("resources"));
        }
        if ids.iter().any(String::is_empty) {
            return Err(LedgerError::MalformedInput("id"));
        }

        let payload = serde_json::to_string(&ids)?;
        self.transport
            .invoke(Operation::RemoveAll, &self.args([payload]))?;

        Ok(())
    }

    //
    // reads
    //

    pub fn get(&self, id: &str) -> Result<Resource<'m>, LedgerError> {
        require(id, "id")?;

        let json = self.query(Operation::Get, &self.args([id.to_string()]))?;

        Ok(self.serializer.from_json(&json)?)
    }

    pub fn get_all(&self) -> Result<Vec<Resource<'m>>, LedgerError> {
        let json = self.query(Operation::GetAll, &self.args([]))?;

        self.deserialize_all(json)
    }

    pub fn exists(&self, id: &str) -> Result<bool, LedgerError> {
        require(id, "id")?;

        let json = self.query(Operation::Exists, &self.args([id.to_string()]))?;

        Ok(serde_json::from_value(json)?)
    }

    pub fn find(&self, expression: &str) -> Result<Vec<Resource<'m>>, LedgerError> {
        require(expression, "expression")?;

        let json = self.query(Operation::Find, &self.args([expression.to_string()]))?;

        self.deserialize_all(json)
    }

    /// Raw JSON rows matching `expression`.
    pub fn query_raw(&self, expression: &str) -> Result<JsonValue, LedgerError> {
        require(expression, "expression")?;

        self.query(Operation::Query, &self.args([expression.to_string()]))
    }

    /// The resource with its relationships resolved by the ledger, as raw
    /// JSON since resolved graphs no longer fit the declared shape.
    pub fn resolve(&self, id: &str) -> Result<JsonValue, LedgerError> {
        require(id, "id")?;

        self.query(Operation::Resolve, &self.args([id.to_string()]))
    }

    pub fn resolve_all(&self) -> Result<JsonValue, LedgerError> {
        self.query(Operation::ResolveAll, &self.args([]))
    }

    //
    // helpers
    //

    fn args<const N: usize>(&self, rest: [String; N]) -> Vec<String> {
        let mut args = vec![self.registry_type.clone(), self.info.id.clone()];
        args.extend(rest);

        args
    }

    fn invoke_one(&self, operation: Operation, resource: &Resource<'m>) -> Result<(), LedgerError> {
        let payload = serde_json::to_string(&self.serializer.to_json(resource)?)?;

        tracing::debug!(%operation, fqn = %resource.fully_qualified_identifier(), "invoking registry operation");
        self.transport.invoke(operation, &self.args([payload]))?;

        Ok(())
    }

    fn invoke_many(&self, operation: Operation, resources: &[Resource<'m>]) -> Result<(), LedgerError> {
        if resources.is_empty() {
            return Err(LedgerError::MalformedInput("resources"));
        }

        let serialized = resources
            .iter()
            .map(|r| self.serializer.to_json(r))
            .collect::<Result<Vec<_>, _>>()?;
        let payload = serde_json::to_string(&serialized)?;

        tracing::debug!(%operation, count = resources.len(), "invoking registry operation");
        self.transport.invoke(operation, &self.args([payload]))?;

        Ok(())
    }

    fn query(&self, operation: Operation, args: &[String]) -> Result<JsonValue, LedgerError> {
        tracing::debug!(%operation, registry = %self.info.id, "querying registry");
        let bytes = self.transport.query(operation, args)?;

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn deserialize_all(&self, json: JsonValue) -> Result<Vec<Resource<'m>>, LedgerError> {
        let rows: Vec<JsonValue> = serde_json::from_value(json)?;

        rows.iter()
            .map(|row| self.serializer.from_json(row).map_err(LedgerError::from))
            .collect()
    }
}

const fn require(value: &str, what: &'static str) -> Result<(), LedgerError> {
    if value.is_empty() {
        Err(LedgerError::MalformedInput(what))
    } else {
        Ok(())
    }
}

fn identifier<'r>(resource: &'r Resource<'_>) -> Result<&'r str, LedgerError> {
    resource
        .id()
        .ok_or_else(|| LedgerError::NoIdentifier(resource.fully_qualified_type_name()))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        factory::{Factory, InstanceOptions},
        serialize::JsonSerializer,
    };
    use serde_json::json;
    use std::cell::RefCell;
    use tessera_schema::{fixtures, prelude::ModelManager};

    ///
    /// Recorder
    /// Remembers every call and answers queries with a canned body.
    ///

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(Operation, Vec<String>)>>,
        response: Vec<u8>,
    }

    impl Recorder {
        fn answering(body: &JsonValue) -> Self {
            Self {
                calls: RefCell::default(),
                response: serde_json::to_vec(body).unwrap(),
            }
        }
    }

    impl Transport for Recorder {
        fn invoke(&self, operation: Operation, args: &[String]) -> Result<(), TransportError> {
            self.calls.borrow_mut().push((operation, args.to_vec()));
            Ok(())
        }

        fn query(&self, operation: Operation, args: &[String]) -> Result<Vec<u8>, TransportError> {
            self.calls.borrow_mut().push((operation, args.to_vec()));
            Ok(self.response.clone())
        }
    }

    fn registry<'m, 't>(
        mm: &'m ModelManager,
        transport: &'t Recorder,
    ) -> ResourceRegistry<'m, &'t Recorder, JsonSerializer<'m>> {
        ResourceRegistry::new("Asset", "org.acme.Vehicle", "Vehicles", transport, JsonSerializer::new(mm)).unwrap()
    }

    fn vehicle<'m>(mm: &'m ModelManager, vin: &str) -> Resource<'m> {
        Factory::new(mm)
            .new_instance("org.acme", "Vehicle", vin, InstanceOptions::default())
            .unwrap()
    }

    #[test]
    fn add_serializes_before_invoking() {
        let mm = fixtures::vehicles();
        let transport = Recorder::default();

        registry(&mm, &transport).add(&vehicle(&mm, "V1")).unwrap();

        let calls = transport.calls.borrow();
        let (operation, args) = &calls[0];
        assert_eq!(operation.to_string(), "addResourceToRegistry");
        assert_eq!(args[..2], ["Asset".to_string(), "org.acme.Vehicle".to_string()]);

        let sent: JsonValue = serde_json::from_str(&args[2]).unwrap();
        assert_eq!(sent, json!({ "$class": "org.acme.Vehicle", "vin": "V1" }));
    }

    #[test]
    fn batches_travel_as_one_array() {
        let mm = fixtures::vehicles();
        let transport = Recorder::default();
        let registry = registry(&mm, &transport);

        registry
            .update_all(&[vehicle(&mm, "V1"), vehicle(&mm, "V2")])
            .unwrap();
        registry.remove_all(["V1", "V2"]).unwrap();
        registry.remove(&vehicle(&mm, "V3")).unwrap();

        let calls = transport.calls.borrow();
        assert_eq!(calls[0].0, Operation::UpdateAll);
        assert_eq!(serde_json::from_str::<Vec<JsonValue>>(&calls[0].1[2]).unwrap().len(), 2);
        assert_eq!(calls[1].0, Operation::RemoveAll);
        assert_eq!(calls[1].1[2], r#"["V1","V2"]"#);
        assert_eq!(calls[2].1[2], "V3");
    }

    #[test]
    fn missing_arguments_never_reach_the_transport() {
        let mm = fixtures::vehicles();
        let transport = Recorder::default();
        let registry = registry(&mm, &transport);

        assert_eq!(registry.get("").unwrap_err().to_string(), "id not specified");
        assert_eq!(registry.add_all(&[]).unwrap_err().to_string(), "resources not specified");
        assert_eq!(registry.find("").unwrap_err().to_string(), "expression not specified");
        assert!(matches!(
            registry.remove_all(Vec::<String>::new()),
            Err(LedgerError::MalformedInput("resources"))
        ));
        assert!(matches!(
            ResourceRegistry::new("", "x", "y", &transport, JsonSerializer::new(&mm)),
            Err(LedgerError::MalformedInput("registryType"))
        ));

        assert!(transport.calls.borrow().is_empty());
    }

    #[test]
    fn invalid_resources_are_not_sent() {
        let mm = fixtures::fleet();
        let transport = Recorder::default();
        let registry =
            ResourceRegistry::new("Participant", "org.acme.base.Person", "People", &transport, JsonSerializer::new(&mm))
                .unwrap();

        let person = Factory::new(&mm)
            .new_instance("org.acme.base", "Person", "p@example.com", InstanceOptions::default())
            .unwrap();

        assert!(matches!(registry.add(&person), Err(LedgerError::Serialize(_))));
        assert!(transport.calls.borrow().is_empty());
    }

    #[test]
    fn reads_deserialize_the_answer() {
        let mm = fixtures::vehicles();
        let transport = Recorder::answering(&json!([
            { "$class": "org.acme.Vehicle", "vin": "V1" },
            { "$class": "org.acme.Vehicle", "vin": "V2", "owner": "alice" },
        ]));

        let all = registry(&mm, &transport).get_all().unwrap();

        let ids: Vec<_> = all.iter().filter_map(Resource::id).collect();
        assert_eq!(ids, ["V1", "V2"]);
        assert_eq!(transport.calls.borrow()[0].0.to_string(), "getAllResourcesInRegistry");
    }

    #[test]
    fn exists_returns_the_raw_flag() {
        let mm = fixtures::vehicles();
        let transport = Recorder::answering(&json!(true));

        assert!(registry(&mm, &transport).exists("V1").unwrap());
        assert_eq!(transport.calls.borrow()[0].1, ["Asset", "org.acme.Vehicle", "V1"]);
    }

    #[test]
    fn registries_are_created_and_listed() {
        let transport = Recorder::default();

        let info = add_registry(&transport, "Asset", "org.acme.Vehicle", "Vehicles").unwrap();
        assert_eq!(info.name, "Vehicles");
        assert_eq!(transport.calls.borrow()[0].0, Operation::AddRegistry);
        assert!(matches!(
            add_registry(&transport, "Asset", "org.acme.Vehicle", ""),
            Err(LedgerError::MalformedInput("name"))
        ));
    }

    #[test]
    fn registries_can_be_listed() {
        let transport = Recorder::answering(&json!([{ "id": "org.acme.Vehicle", "name": "Vehicles" }]));

        let all = get_all_registries(&transport, "Asset").unwrap();

        assert_eq!(
            all,
            [RegistryInfo {
                id: "org.acme.Vehicle".into(),
                name: "Vehicles".into(),
            }]
        );
    }
}
