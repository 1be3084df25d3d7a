//! ## Crate layout
//! - `schema`: declarations, properties, the model registry and the visitor protocol.
//! - `core`: resources, the factory, sample data, JSON mapping and the ledger boundary.
//! - `build`: code generation targets (LoopBack, PlantUML) and file sinks.
//! - `config`: `tessera.toml` loading.
//! - `error`: the public error type every layer converts into.
//!
//! The `prelude` module covers what most callers touch: the registry, the
//! factory and the resource types.

pub use tessera_build as build;
pub use tessera_config as config;
pub use tessera_core as core;
pub use tessera_schema as schema;

pub mod error;

pub use error::{Error, ErrorKind};

use tessera_schema::prelude::*;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error, ErrorKind,
        build::{Target, generate, writer::FileWriter},
        config::TesseraConfig,
        core::prelude::*,
        schema::{
            node::{ClassDeclaration, DeclarationKind, ModelFile, ModelFileDef, Property},
            registry::ModelManager,
            visit::{Visitable as _, Visitor},
        },
    };
    pub use serde::{Deserialize, Serialize};
}

/// Build a registry from a JSON array of model file definitions, the
/// interchange form a schema parser hands over.
pub fn load_models(json: &str) -> Result<ModelManager, Error> {
    let defs: Vec<ModelFileDef> = serde_json::from_str(json)?;
    let manager = ModelManager::builder().add_model_files(defs).build()?;

    Ok(manager)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_load_from_json() {
        let json = r#"[{
            "namespace": "org.acme",
            "declarations": [{
                "name": "Vehicle",
                "kind": "asset",
                "identified_by": "vin",
                "properties": [
                    { "name": "vin", "type": "String", "kind": "field" },
                    { "name": "owner", "type": "String", "kind": "field", "optional": true }
                ]
            }]
        }]"#;

        let mm = load_models(json).unwrap();
        let vehicle = mm.get_type("org.acme.Vehicle").unwrap();
        assert_eq!(vehicle.identifier_field_name(), Some("vin"));
        assert_eq!(vehicle.all_properties().len(), 2);
    }

    #[test]
    fn bad_json_is_a_serialization_error() {
        let err = load_models("{").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[test]
    fn invalid_schema_is_a_schema_error() {
        let json = r#"[{
            "namespace": "org.acme",
            "declarations": [{
                "name": "Car",
                "kind": "asset",
                "extends": "Vehicle",
                "identified_by": "vin",
                "properties": [{ "name": "vin", "type": "String", "kind": "field" }]
            }]
        }]"#;

        let err = load_models(json).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
    }
}
