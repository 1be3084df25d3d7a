use crate::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

///
/// Flattened
///

#[derive(Clone, Debug, Default)]
struct Flattened {
    properties: Vec<Property>,
    identifier: Option<String>,
}

///
/// FlattenState
///

#[derive(Default)]
struct FlattenState {
    done: BTreeMap<String, Flattened>,
    failed: BTreeSet<String>,
    stack: Vec<String>,
}

/// Compute and cache `all_properties` and the effective identifier of every
/// declaration. Collisions, cycles and bad identifier fields are reported
/// against the declaration that introduces them.
pub(crate) fn flatten(decls: &mut BTreeMap<String, ClassDeclaration>, errs: &mut ErrorTree) {
    let mut state = FlattenState::default();

    for fqn in decls.keys() {
        flatten_one(fqn, decls, &mut state, errs);
    }

    for (fqn, flat) in state.done {
        if let Some(decl) = decls.get_mut(&fqn) {
            decl.resolved.all_properties = flat.properties;
            decl.resolved.identifier = flat.identifier;
        }
    }
}

fn flatten_one(
    fqn: &str,
    decls: &BTreeMap<String, ClassDeclaration>,
    state: &mut FlattenState,
    errs: &mut ErrorTree,
) -> bool {
    if state.done.contains_key(fqn) {
        return true;
    }
    if state.failed.contains(fqn) {
        return false;
    }
    if let Some(pos) = state.stack.iter().position(|s| s == fqn) {
        let cycle = state.stack[pos..].join(" -> ");
        errs.add_for(fqn, format!("inheritance cycle: {cycle} -> {fqn}"));
        state.failed.insert(fqn.to_string());
        return false;
    }

    // unknown super types were reported during resolution
    let Some(decl) = decls.get(fqn) else {
        return false;
    };

    let inherited = match decl.resolved.super_type.as_deref() {
        Some(super_fqn) => {
            state.stack.push(fqn.to_string());
            let ok = flatten_one(super_fqn, decls, state, errs);
            state.stack.pop();

            match state.done.get(super_fqn) {
                Some(flat) if ok => flat.clone(),
                _ => {
                    state.failed.insert(fqn.to_string());
                    return false;
                }
            }
        }
        None => Flattened::default(),
    };

    let mut tree = ErrorTree::new();
    let mut properties = inherited.properties;
    for prop in &decl.properties {
        if let Some(prev) = properties.iter().find(|p| p.name == prop.name) {
            tree.add_for(
                prop.name.clone(),
                format!(
                    "property '{}' collides with the one inherited from '{}'",
                    prop.name,
                    prev.parent()
                ),
            );
        } else {
            properties.push(prop.clone());
        }
    }

    let identifier = match (&decl.identifier, inherited.identifier) {
        (Some(own), Some(parent)) if *own != parent => {
            err!(
                tree,
                "identifier '{own}' redeclares the identifier '{parent}' inherited from an ancestor"
            );
            None
        }
        (Some(own), _) => Some(own.clone()),
        (None, parent) => parent,
    };

    if let Some(id) = &identifier {
        check_identifier(id, &properties, &mut tree);
    }

    if !tree.is_empty() {
        errs.merge_for(fqn.to_string(), tree);
        state.failed.insert(fqn.to_string());
        return false;
    }

    state.done.insert(
        fqn.to_string(),
        Flattened {
            properties,
            identifier,
        },
    );

    true
}

// The identifying field must be a required, scalar String field.
fn check_identifier(id: &str, properties: &[Property], tree: &mut ErrorTree) {
    match properties.iter().find(|p| p.name == id) {
        None => err!(tree, "identifying field '{id}' is not declared"),
        Some(prop) => {
            if prop.primitive() != Some(Primitive::String) || prop.array || prop.optional {
                err!(
                    tree,
                    "identifying field '{id}' must be a required String field, found {} '{}'",
                    prop.tag(),
                    prop.type_name
                );
            }
        }
    }
}
