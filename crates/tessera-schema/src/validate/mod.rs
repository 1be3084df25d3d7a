//! Registry validation, run in staged, deterministic order while the
//! registry is being built.
//!
//! 1. `nodes`: local checks on every node, stamping namespaces and parents.
//! 2. `resolve`: import scopes, super types and property types.
//! 3. `inheritance`: chain flattening, collisions and identifier fields.
//!
//! Every phase keeps going after a failure so one load reports everything.

pub(crate) mod inheritance;
pub(crate) mod naming;
pub(crate) mod resolve;

use crate::{TRANSACTION_TIMESTAMP_FIELD, prelude::*};
use std::collections::BTreeMap;

/// Phase 1: run `ValidateNode` on every file and declaration, drop duplicate
/// namespaces, and stamp resolved namespaces and property parents.
pub(crate) fn validate_nodes(
    defs: Vec<ModelFileDef>,
    errs: &mut ErrorTree,
) -> BTreeMap<String, ModelFileDef> {
    let mut files = BTreeMap::new();

    for mut def in defs {
        let ns = def.namespace.clone();
        if files.contains_key(&ns) {
            errs.add_for(ns, "namespace is declared by more than one model file");
            continue;
        }

        if let Err(tree) = def.validate() {
            errs.merge_for(ns.clone(), tree);
        }

        for decl in &mut def.declarations {
            let fqn = fully_qualified_name(&ns, &decl.name);

            if decl.is_transaction() && decl.super_type.is_none() {
                add_transaction_timestamp(decl, &fqn, errs);
            }
            if let Err(tree) = decl.validate() {
                errs.merge_for(fqn.clone(), tree);
            }

            decl.resolved.namespace.clone_from(&ns);
            for prop in &mut decl.properties {
                prop.parent.clone_from(&fqn);
            }
        }

        files.insert(ns, def);
    }

    files
}

// Root transactions carry an implicit `timestamp: DateTime` unless they
// declare one, in which case it must have that exact shape.
fn add_transaction_timestamp(decl: &mut ClassDeclaration, fqn: &str, errs: &mut ErrorTree) {
    match decl.get_own_property(TRANSACTION_TIMESTAMP_FIELD) {
        Some(prop) => {
            if prop.primitive() != Some(Primitive::DateTime) || prop.array {
                errs.add_for(
                    fqn,
                    format!("transaction field '{TRANSACTION_TIMESTAMP_FIELD}' must be a DateTime"),
                );
            }
        }
        None => decl
            .properties
            .push(Property::field(TRANSACTION_TIMESTAMP_FIELD, Primitive::DateTime.as_str())),
    }
}
