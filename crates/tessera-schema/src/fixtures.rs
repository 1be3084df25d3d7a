//! Small registries built in code, shared by tests across the workspace.

use crate::prelude::*;

// Fixtures are hand-checked; a build failure here is a broken fixture.
fn build(files: Vec<ModelFileDef>) -> ModelManager {
    match ModelManager::builder().add_model_files(files).build() {
        Ok(mm) => mm,
        Err(e) => panic!("fixture registry is invalid: {e}"),
    }
}

/// `org.acme` with a single `Vehicle` asset identified by `vin` and an
/// optional `owner`.
#[must_use]
pub fn vehicles() -> ModelManager {
    build(vec![ModelFileDef::new("org.acme").declare(
        ClassDeclaration::asset("Vehicle")
            .identified_by("vin")
            .property(Property::field("vin", "String"))
            .property(Property::field("owner", "String").optional()),
    )])
}

/// Two namespaces: shared base types in `org.acme.base`, concrete assets
/// and transactions in `org.acme.fleet` importing them by wildcard.
#[must_use]
pub fn fleet() -> ModelManager {
    let base = ModelFileDef::new("org.acme.base")
        .declare(
            ClassDeclaration::asset("Vehicle")
                .set_abstract()
                .identified_by("vin")
                .property(Property::field("vin", "String"))
                .property(Property::field("colour", "Colour"))
                .property(Property::relationship("owner", "Person").optional()),
        )
        .declare(
            ClassDeclaration::participant("Person")
                .identified_by("email")
                .property(Property::field("email", "String"))
                .property(Property::field("name", "String"))
                .property(Property::field("address", "Address").optional()),
        )
        .declare(ClassDeclaration::enumeration("Colour", ["RED", "GREEN", "BLUE"]))
        .declare(
            ClassDeclaration::concept("Address")
                .property(Property::field("street", "String"))
                .property(Property::field("city", "String"))
                .property(Property::field("zip", "String").optional()),
        );

    let fleet = ModelFileDef::new("org.acme.fleet")
        .import("org.acme.base.*")
        .declare(
            ClassDeclaration::asset("Car")
                .extends("Vehicle")
                .property(Property::field("seats", "Integer").with_default("5"))
                .property(Property::field("convertible", "Boolean").with_default("true"))
                .property(Property::field("registered", "DateTime").optional()),
        )
        .declare(
            ClassDeclaration::asset("Truck")
                .extends("Vehicle")
                .property(Property::field("payload", "Double"))
                .property(Property::field("axles", "Long").optional())
                .property(Property::relationship("drivers", "Person").array())
                .property(Property::field("depots", "Address").array()),
        )
        .declare(
            ClassDeclaration::transaction("Transfer")
                .property(Property::relationship("vehicle", "Vehicle"))
                .property(Property::relationship("buyer", "Person"))
                .property(Property::field("price", "Double")),
        )
        .declare(
            ClassDeclaration::transaction("Recall")
                .set_abstract()
                .property(Property::field("reason", "String")),
        );

    build(vec![base, fleet])
}

/// Three concepts chained `A -> B -> C`.
#[must_use]
pub fn chain() -> ModelManager {
    build(vec![
        ModelFileDef::new("test")
            .declare(ClassDeclaration::concept("A").property(Property::field("a", "String")))
            .declare(
                ClassDeclaration::concept("B")
                    .extends("A")
                    .property(Property::field("b", "Integer")),
            )
            .declare(
                ClassDeclaration::concept("C")
                    .extends("B")
                    .property(Property::field("c", "Boolean")),
            ),
    ])
}

/// A concept that refers to itself through optional and array properties,
/// for exercising recursion bounds.
#[must_use]
pub fn recursive() -> ModelManager {
    build(vec![
        ModelFileDef::new("test")
            .declare(ClassDeclaration::enumeration("Shape", ["ROUND", "SQUARE"]))
            .declare(
                ClassDeclaration::concept("Node")
                    .property(Property::field("label", "String"))
                    .property(Property::field("shape", "Shape"))
                    .property(Property::relationship("tree", "Tree"))
                    .property(Property::field("next", "Node").optional())
                    .property(Property::field("children", "Node").array()),
            )
            .declare(
                ClassDeclaration::asset("Tree")
                    .identified_by("id")
                    .property(Property::field("id", "String"))
                    .property(Property::field("root", "Node")),
            ),
    ])
}

///
/// TESTS
///
