use crate::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

///
/// TypeIndex
/// Every declared fully qualified name and its kind.
///

pub(crate) struct TypeIndex {
    kinds: BTreeMap<String, DeclarationKind>,
    by_namespace: BTreeMap<String, Vec<String>>,
}

impl TypeIndex {
    pub(crate) fn new(files: &BTreeMap<String, ModelFileDef>) -> Self {
        let mut kinds = BTreeMap::new();
        let mut by_namespace = BTreeMap::new();

        for (ns, file) in files {
            let names: Vec<String> = file.declarations.iter().map(|d| d.name.clone()).collect();
            for decl in &file.declarations {
                kinds.insert(fully_qualified_name(ns, &decl.name), decl.kind);
            }
            by_namespace.insert(ns.clone(), names);
        }

        Self {
            kinds,
            by_namespace,
        }
    }

    pub(crate) fn kind(&self, fqn: &str) -> Option<DeclarationKind> {
        self.kinds.get(fqn).copied()
    }
}

///
/// Scope
///
/// Name table for one model file. Local names win; an explicit import beats
/// a wildcard; two imports offering the same name make it ambiguous.
///

#[derive(Debug, Default)]
pub(crate) struct Scope {
    pub names: BTreeMap<String, String>,
    ambiguous: BTreeMap<String, BTreeSet<String>>,
}

impl Scope {
    fn lookup(&self, name: &str) -> Result<&str, String> {
        if let Some(fqn) = self.names.get(name) {
            return Ok(fqn);
        }
        if let Some(candidates) = self.ambiguous.get(name) {
            let list = candidates.iter().cloned().collect::<Vec<_>>().join(", ");
            return Err(format!("type '{name}' is ambiguous between imports: {list}"));
        }

        Err(format!("type '{name}' is not declared or imported"))
    }
}

/// Build the scope of every model file, reporting unresolvable imports.
pub(crate) fn resolve_scopes(
    files: &BTreeMap<String, ModelFileDef>,
    index: &TypeIndex,
    errs: &mut ErrorTree,
) -> BTreeMap<String, Scope> {
    let mut scopes = BTreeMap::new();

    for (ns, file) in files {
        let mut scope = Scope::default();
        let mut explicit = BTreeMap::<String, String>::new();
        let mut wildcard = BTreeMap::<String, BTreeSet<String>>::new();

        for import in &file.imports {
            if let Some(import_ns) = import.strip_suffix(".*") {
                let Some(names) = index.by_namespace.get(import_ns) else {
                    errs.add_for(ns.clone(), format!("import '{import}': unknown namespace"));
                    continue;
                };
                for name in names {
                    wildcard
                        .entry(name.clone())
                        .or_default()
                        .insert(fully_qualified_name(import_ns, name));
                }
                continue;
            }

            match split_fully_qualified_name(import) {
                Some((_, name)) if index.kind(import).is_some() => {
                    if let Some(prev) = explicit.insert(name.to_string(), import.clone())
                        && prev != *import
                    {
                        errs.add_for(
                            ns.clone(),
                            format!("imports '{prev}' and '{import}' both bind '{name}'"),
                        );
                    }
                }
                _ => errs.add_for(ns.clone(), format!("import '{import}': unknown type")),
            }
        }

        for (name, candidates) in wildcard {
            if explicit.contains_key(&name) {
                continue;
            }
            if candidates.len() == 1 {
                if let Some(fqn) = candidates.into_iter().next() {
                    scope.names.insert(name, fqn);
                }
            } else {
                scope.ambiguous.insert(name, candidates);
            }
        }
        scope.names.extend(explicit);
        for fqn in scope.names.values().cloned().collect::<Vec<_>>() {
            scope.names.insert(fqn.clone(), fqn);
        }

        // locals shadow everything imported
        for decl in &file.declarations {
            let fqn = fully_qualified_name(ns, &decl.name);
            scope.ambiguous.remove(&decl.name);
            scope.names.insert(decl.name.clone(), fqn.clone());
            scope.names.insert(fqn.clone(), fqn);
        }

        scopes.insert(ns.clone(), scope);
    }

    scopes
}

/// Resolve super types and property types of every declaration, keyed by
/// fully qualified name, in namespace then source order.
pub(crate) fn resolve_types(
    files: &BTreeMap<String, ModelFileDef>,
    scopes: &BTreeMap<String, Scope>,
    index: &TypeIndex,
    errs: &mut ErrorTree,
) -> BTreeMap<String, ClassDeclaration> {
    let mut decls = BTreeMap::new();
    let empty = Scope::default();

    for (ns, file) in files {
        let scope = scopes.get(ns).unwrap_or(&empty);

        for decl in &file.declarations {
            let fqn = fully_qualified_name(ns, &decl.name);
            let mut decl = decl.clone();
            let mut tree = ErrorTree::new();

            if let Some(super_name) = &decl.super_type {
                match scope.lookup(super_name) {
                    Ok(super_fqn) => {
                        let super_kind = index.kind(super_fqn);
                        if super_kind != Some(decl.kind) {
                            err!(
                                tree,
                                "{} '{}' cannot extend {} '{super_fqn}'",
                                decl.kind,
                                decl.name,
                                super_kind.map_or_else(|| "unknown".to_string(), |k| k.to_string()),
                            );
                        }
                        decl.resolved.super_type = Some(super_fqn.to_string());
                    }
                    Err(msg) => err!(tree, "super type: {msg}"),
                }
            }

            for prop in &mut decl.properties {
                if let Err(msg) = resolve_property(prop, scope, index) {
                    tree.add_for(prop.name.clone(), msg);
                }
            }

            errs.merge_for(fqn.clone(), tree);
            decls.insert(fqn, decl);
        }
    }

    decls
}

fn resolve_property(prop: &mut Property, scope: &Scope, index: &TypeIndex) -> Result<(), String> {
    match prop.kind {
        PropertyKind::EnumValue => Ok(()),
        PropertyKind::Field { .. } => {
            if prop.is_primitive() {
                return Ok(());
            }
            let fqn = scope.lookup(&prop.type_name)?;
            prop.resolved_type = Some(fqn.to_string());

            Ok(())
        }
        PropertyKind::Relationship => {
            if Primitive::from_type_name(&prop.type_name).is_some() {
                return Err(format!(
                    "relationship cannot target primitive type '{}'",
                    prop.type_name
                ));
            }
            let fqn = scope.lookup(&prop.type_name)?;
            match index.kind(fqn) {
                Some(kind) if kind.is_identifiable() => {
                    prop.resolved_type = Some(fqn.to_string());
                    Ok(())
                }
                Some(kind) => Err(format!(
                    "relationship cannot target {kind} '{fqn}', only assets, participants and transactions"
                )),
                None => Err(format!("type '{fqn}' is not declared")),
            }
        }
    }
}
