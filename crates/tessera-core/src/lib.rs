//! Runtime side of Tessera: resources built against a schema registry, the
//! factory that creates them, sample-data generation, and the boundaries
//! to the ledger and its connectors.

pub mod connector;
pub mod factory;
pub mod generator;
pub mod ledger;
pub mod relationship;
pub mod resource;
pub mod serialize;
pub mod value;

use thiserror::Error as ThisError;

///
/// Prelude
///
/// Domain vocabulary only; errors and boundary traits stay in their
/// modules.
///

pub mod prelude {
    pub use crate::{
        factory::{Factory, InstanceOptions},
        relationship::Relationship,
        resource::{Resource, Validation},
        value::{Embedded, Value},
    };
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    ConnectorError(#[from] connector::ConnectorError),

    #[error(transparent)]
    FactoryError(#[from] factory::FactoryError),

    #[error(transparent)]
    GenerateError(#[from] generator::GenerateError),

    #[error(transparent)]
    LedgerError(#[from] ledger::LedgerError),

    #[error(transparent)]
    SerializeError(#[from] serialize::SerializeError),

    #[error(transparent)]
    ValidationError(#[from] resource::ValidationError),
}
