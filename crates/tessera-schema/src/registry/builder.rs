use crate::{
    prelude::*,
    registry::BuildError,
    validate::{inheritance, resolve, validate_nodes},
};
use std::{collections::BTreeMap, sync::Arc};

///
/// ModelManagerBuilder
///
/// Collects parsed model files and turns them into a `ModelManager` in one
/// step. Nothing is visible until `build` has validated the whole set.
///

#[derive(Debug, Default)]
pub struct ModelManagerBuilder {
    defs: Vec<ModelFileDef>,
}

impl ModelManagerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_model_file(mut self, def: ModelFileDef) -> Self {
        self.defs.push(def);
        self
    }

    #[must_use]
    pub fn add_model_files(mut self, defs: impl IntoIterator<Item = ModelFileDef>) -> Self {
        self.defs.extend(defs);
        self
    }

    /// Validate every file, resolve every name and flatten every chain.
    /// All problems found are returned together.
    pub fn build(self) -> Result<ModelManager, BuildError> {
        let mut errs = ErrorTree::new();

        let files = validate_nodes(self.defs, &mut errs);
        let index = resolve::TypeIndex::new(&files);
        let scopes = resolve::resolve_scopes(&files, &index, &mut errs);
        let mut decls = resolve::resolve_types(&files, &scopes, &index, &mut errs);
        inheritance::flatten(&mut decls, &mut errs);

        if !errs.is_empty() {
            tracing::warn!(errors = errs.len(), "model registry rejected");
            return Err(BuildError::Validation(errs));
        }

        let types: BTreeMap<String, Arc<ClassDeclaration>> = decls
            .into_iter()
            .map(|(fqn, decl)| (fqn, Arc::new(decl)))
            .collect();

        let mut model_files = BTreeMap::new();
        for (namespace, def) in files {
            let declarations = def
                .declarations
                .iter()
                .filter_map(|d| types.get(&fully_qualified_name(&namespace, &d.name)))
                .cloned()
                .collect();

            let scope = scopes
                .get(&namespace)
                .map(|scope| {
                    scope
                        .names
                        .iter()
                        .filter_map(|(name, fqn)| Some((name.clone(), Arc::clone(types.get(fqn)?))))
                        .collect()
                })
                .unwrap_or_default();

            tracing::trace!(namespace = %namespace, "model file resolved");
            model_files.insert(
                namespace.clone(),
                ModelFile::new(namespace, def.imports, declarations, scope),
            );
        }

        tracing::debug!(
            namespaces = model_files.len(),
            declarations = types.len(),
            "model registry built"
        );

        Ok(ModelManager {
            files: model_files,
            types,
        })
    }
}

///
/// TESTS
///
