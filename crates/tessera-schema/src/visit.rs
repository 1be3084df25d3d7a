//! Double-dispatch traversal over the schema.
//!
//! Nodes implement [`Visitable`]; `accept` matches on the closed variant set
//! and calls exactly one [`Visitor`] method. Traversal state lives in the
//! visitor's `Context`, an owned value threaded through every call by `&mut`.
//! Visitors only read the schema.

use crate::{ThisError, prelude::*};
use derive_more::Display;

///
/// NodeKind
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum NodeKind {
    #[display("asset")]
    Asset,
    #[display("concept")]
    Concept,
    #[display("enum")]
    Enum,
    #[display("enum value")]
    EnumValue,
    #[display("field")]
    Field,
    #[display("model file")]
    ModelFile,
    #[display("model manager")]
    ModelManager,
    #[display("participant")]
    Participant,
    #[display("relationship")]
    Relationship,
    #[display("transaction")]
    Transaction,
}

impl From<DeclarationKind> for NodeKind {
    fn from(kind: DeclarationKind) -> Self {
        match kind {
            DeclarationKind::Asset => Self::Asset,
            DeclarationKind::Participant => Self::Participant,
            DeclarationKind::Transaction => Self::Transaction,
            DeclarationKind::Enum => Self::Enum,
            DeclarationKind::Concept => Self::Concept,
        }
    }
}

impl From<PropertyTag> for NodeKind {
    fn from(tag: PropertyTag) -> Self {
        match tag {
            PropertyTag::Field => Self::Field,
            PropertyTag::Relationship => Self::Relationship,
            PropertyTag::EnumValue => Self::EnumValue,
        }
    }
}

///
/// DispatchError
///
/// A visitor was handed a node it has no meaning for in its current
/// position. This is a programming error in the traversal and aborts it.
///

#[derive(Debug, Eq, PartialEq, ThisError)]
#[error("{visitor} cannot visit {node} '{name}'")]
pub struct DispatchError {
    pub visitor: &'static str,
    pub node: NodeKind,
    pub name: String,
}

impl DispatchError {
    #[must_use]
    pub fn new(visitor: &'static str, node: NodeKind, name: impl Into<String>) -> Self {
        Self {
            visitor,
            node,
            name: name.into(),
        }
    }
}

///
/// Visitor
///
/// One method per node kind. `Output` is what a visit produces for its
/// caller (an inlined artifact, a generated value); `Error` must be able to
/// carry a `DispatchError` so unsupported nodes can abort the traversal.
///

pub trait Visitor<'s> {
    type Context;
    type Output;
    type Error: From<DispatchError>;

    fn visit_model_manager(
        &mut self,
        node: &'s ModelManager,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_model_file(
        &mut self,
        node: &'s ModelFile,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_asset(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_participant(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_transaction(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_enum(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_concept(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_field(
        &mut self,
        node: &'s Property,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_relationship(
        &mut self,
        node: &'s Property,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_enum_value(
        &mut self,
        node: &'s Property,
        ctx: &mut Self::Context,
    ) -> Result<Self::Output, Self::Error>;
}

///
/// Visitable
///

pub trait Visitable<'s> {
    fn accept<V: Visitor<'s>>(
        &'s self,
        visitor: &mut V,
        ctx: &mut V::Context,
    ) -> Result<V::Output, V::Error>;
}

impl<'s> Visitable<'s> for ModelManager {
    fn accept<V: Visitor<'s>>(
        &'s self,
        visitor: &mut V,
        ctx: &mut V::Context,
    ) -> Result<V::Output, V::Error> {
        visitor.visit_model_manager(self, ctx)
    }
}

impl<'s> Visitable<'s> for ModelFile {
    fn accept<V: Visitor<'s>>(
        &'s self,
        visitor: &mut V,
        ctx: &mut V::Context,
    ) -> Result<V::Output, V::Error> {
        visitor.visit_model_file(self, ctx)
    }
}

impl<'s> Visitable<'s> for ClassDeclaration {
    fn accept<V: Visitor<'s>>(
        &'s self,
        visitor: &mut V,
        ctx: &mut V::Context,
    ) -> Result<V::Output, V::Error> {
        match self.kind {
            DeclarationKind::Asset => visitor.visit_asset(self, ctx),
            DeclarationKind::Participant => visitor.visit_participant(self, ctx),
            DeclarationKind::Transaction => visitor.visit_transaction(self, ctx),
            DeclarationKind::Enum => visitor.visit_enum(self, ctx),
            DeclarationKind::Concept => visitor.visit_concept(self, ctx),
        }
    }
}

impl<'s> Visitable<'s> for Property {
    fn accept<V: Visitor<'s>>(
        &'s self,
        visitor: &mut V,
        ctx: &mut V::Context,
    ) -> Result<V::Output, V::Error> {
        match self.kind {
            PropertyKind::Field { .. } => visitor.visit_field(self, ctx),
            PropertyKind::Relationship => visitor.visit_relationship(self, ctx),
            PropertyKind::EnumValue => visitor.visit_enum_value(self, ctx),
        }
    }
}

///
/// TESTS
///
