use crate::{prelude::*, registry::ResolveError, validate::naming::validate_namespace};
use std::{collections::BTreeMap, sync::Arc};

///
/// ModelFileDef
///
/// Parsed declaration set for one namespace, as handed over by the schema
/// parser. Becomes a `ModelFile` once the registry has resolved it.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ModelFileDef {
    pub namespace: String,

    /// `org.acme.base.Vehicle` or `org.acme.base.*`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,

    #[serde(default)]
    pub declarations: Vec<ClassDeclaration>,
}

impl ModelFileDef {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn import(mut self, import: impl Into<String>) -> Self {
        self.imports.push(import.into());
        self
    }

    #[must_use]
    pub fn declare(mut self, decl: ClassDeclaration) -> Self {
        self.declarations.push(decl);
        self
    }
}

impl ValidateNode for ModelFileDef {
    fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        if let Err(msg) = validate_namespace(&self.namespace) {
            errs.add(msg);
        }

        let mut seen = std::collections::BTreeSet::new();
        for decl in &self.declarations {
            if !seen.insert(decl.name.as_str()) {
                err!(errs, "duplicate declaration '{}'", decl.name);
            }
        }

        errs.result()
    }
}

///
/// ModelFile
///
/// The resolved declaration set for one namespace. `scope` maps every name
/// usable inside this file (local names, imported names and fully
/// qualified names) to its declaration; local names shadow imports.
///

#[derive(Debug)]
pub struct ModelFile {
    namespace: String,
    imports: Vec<String>,
    declarations: Vec<Arc<ClassDeclaration>>,
    scope: BTreeMap<String, Arc<ClassDeclaration>>,
}

impl ModelFile {
    pub(crate) const fn new(
        namespace: String,
        imports: Vec<String>,
        declarations: Vec<Arc<ClassDeclaration>>,
        scope: BTreeMap<String, Arc<ClassDeclaration>>,
    ) -> Self {
        Self {
            namespace,
            imports,
            declarations,
            scope,
        }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    /// Declarations in source order.
    pub fn declarations(&self) -> impl Iterator<Item = &ClassDeclaration> {
        self.declarations.iter().map(AsRef::as_ref)
    }

    pub fn declarations_of(&self, kind: DeclarationKind) -> impl Iterator<Item = &ClassDeclaration> {
        self.declarations().filter(move |d| d.kind == kind)
    }

    /// True if `type_name` resolves from this file, locally or via an import.
    #[must_use]
    pub fn is_defined(&self, type_name: &str) -> bool {
        self.scope.contains_key(type_name)
    }

    /// True only for declarations that live in this namespace.
    #[must_use]
    pub fn is_local_type(&self, type_name: &str) -> bool {
        self.declarations.iter().any(|d| d.name == type_name)
    }

    pub fn get_type(&self, type_name: &str) -> Result<&ClassDeclaration, ResolveError> {
        self.scope
            .get(type_name)
            .map(AsRef::as_ref)
            .ok_or_else(|| ResolveError::TypeNotFound {
                namespace: self.namespace.clone(),
                type_name: type_name.to_string(),
            })
    }

    pub(crate) fn declaration_arcs(&self) -> &[Arc<ClassDeclaration>] {
        &self.declarations
    }
}
