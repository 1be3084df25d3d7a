mod builder;

pub use builder::*;

use crate::{ThisError, prelude::*};
use std::{collections::BTreeMap, sync::Arc};

///
/// ResolveError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum ResolveError {
    #[error("namespace '{namespace}' is not defined")]
    NamespaceNotFound { namespace: String },

    #[error("type '{type_name}' is not defined in namespace '{namespace}'")]
    TypeNotFound { namespace: String, type_name: String },
}

///
/// BuildError
///

#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error("validation failed: {0}")]
    Validation(ErrorTree),
}

///
/// ModelManager
///
/// The process-wide registry: one `ModelFile` per namespace. Built once by
/// `ModelManagerBuilder` and immutable afterwards, so a shared reference
/// (or an `Arc`) can be read from any number of threads without locking.
///

#[derive(Debug)]
pub struct ModelManager {
    files: BTreeMap<String, ModelFile>,
    types: BTreeMap<String, Arc<ClassDeclaration>>,
}

impl ModelManager {
    #[must_use]
    pub fn builder() -> ModelManagerBuilder {
        ModelManagerBuilder::new()
    }

    #[must_use]
    pub fn get_model_file(&self, namespace: &str) -> Option<&ModelFile> {
        self.files.get(namespace)
    }

    /// Model files in namespace order.
    pub fn model_files(&self) -> impl Iterator<Item = &ModelFile> {
        self.files.values()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Every declaration in the registry, namespace then source order.
    pub fn declarations(&self) -> impl Iterator<Item = &ClassDeclaration> {
        self.files.values().flat_map(ModelFile::declarations)
    }

    #[must_use]
    pub fn is_defined(&self, fqn: &str) -> bool {
        self.types.contains_key(fqn)
    }

    /// Look a declaration up by fully qualified name.
    pub fn get_type(&self, fqn: &str) -> Result<&ClassDeclaration, ResolveError> {
        if let Some(decl) = self.types.get(fqn) {
            return Ok(decl);
        }

        let (namespace, type_name) = split_fully_qualified_name(fqn).unwrap_or(("", fqn));
        if self.files.contains_key(namespace) {
            Err(ResolveError::TypeNotFound {
                namespace: namespace.to_string(),
                type_name: type_name.to_string(),
            })
        } else {
            Err(ResolveError::NamespaceNotFound {
                namespace: namespace.to_string(),
            })
        }
    }

    /// Resolve `type_name` as seen from inside `namespace`: local
    /// declarations first, then the file's imports.
    pub fn resolve(&self, namespace: &str, type_name: &str) -> Result<&ClassDeclaration, ResolveError> {
        self.get_model_file(namespace)
            .ok_or_else(|| ResolveError::NamespaceNotFound {
                namespace: namespace.to_string(),
            })?
            .get_type(type_name)
    }

    /// True if `sub` is `sup` or inherits from it, directly or transitively.
    #[must_use]
    pub fn is_subtype_of(&self, sub: &str, sup: &str) -> bool {
        let mut current = Some(sub);

        while let Some(fqn) = current {
            if fqn == sup {
                return true;
            }
            current = self.types.get(fqn).and_then(|d| d.super_type_name());
        }

        false
    }

    /// The declaration itself and everything extending it, namespace order.
    #[must_use]
    pub fn subtypes(&self, fqn: &str) -> Vec<&ClassDeclaration> {
        self.types
            .iter()
            .filter(|(name, _)| self.is_subtype_of(name, fqn))
            .map(|(_, decl)| decl.as_ref())
            .collect()
    }

    /// Instantiable members of `subtypes`.
    #[must_use]
    pub fn concrete_subtypes(&self, fqn: &str) -> Vec<&ClassDeclaration> {
        let mut subtypes = self.subtypes(fqn);
        subtypes.retain(|d| !d.is_abstract);

        subtypes
    }
}

///
/// TESTS
///
