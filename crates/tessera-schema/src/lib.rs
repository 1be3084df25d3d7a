//! Schema side of Tessera: the declaration/property model, the model
//! registry that resolves names across namespaces, and the visitor protocol
//! every traversal (code generation, sample data) is written against.
//!
//! A registry is assembled once through [`registry::ModelManagerBuilder`],
//! validated as a whole, and is read-only afterwards.

pub mod error;
pub mod node;
pub mod registry;
pub mod types;
pub mod validate;
pub mod visit;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

/// Maximum length for declaration, property and namespace segment identifiers.
pub const MAX_IDENT_LEN: usize = 128;

/// Name of the implicit timestamp field carried by every transaction.
pub const TRANSACTION_TIMESTAMP_FIELD: &str = "timestamp";

use crate::registry::{BuildError, ResolveError};
use thiserror::Error as ThisError;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        err,
        error::ErrorTree,
        node::*,
        registry::{ModelManager, ModelManagerBuilder},
        types::Primitive,
        visit::{DispatchError, NodeKind, Visitable, Visitor},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    BuildError(#[from] BuildError),

    #[error(transparent)]
    ResolveError(#[from] ResolveError),
}
