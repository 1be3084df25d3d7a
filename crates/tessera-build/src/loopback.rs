//! LoopBack model definitions.
//!
//! One `<fqn>.json` document per concrete asset and transaction, in the
//! LoopBack definition language: a `PersistedModel` whose properties are
//! the declaration's full (inherited) property list. Embedded classes are
//! inlined as nested objects, except a class already being inlined on the
//! same path, which becomes a bare `object`. Relationships become plain
//! identifier strings and are never expanded.

use crate::{CodegenError, context::CodegenContext};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Value as JsonValue, ser::PrettyFormatter};
use std::collections::BTreeMap;
use tessera_schema::prelude::*;

const VISITOR: &str = "LoopbackVisitor";
const BASE_MODEL: &str = "PersistedModel";
const OBJECT_TYPE: &str = "object";
const STRING_TYPE: &str = "string";
const INDENT: &[u8] = b"    ";

///
/// LoopbackModel
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopbackModel {
    pub name: String,
    pub description: String,
    pub plural: String,
    pub base: String,
    pub id_injection: bool,
    pub options: ModelOptions,
    pub properties: Properties,
    pub validations: Vec<JsonValue>,
    pub relations: BTreeMap<String, JsonValue>,
    pub acls: Vec<JsonValue>,
    pub methods: Vec<JsonValue>,
}

impl LoopbackModel {
    fn new(decl: &ClassDeclaration, description: String, properties: Properties) -> Self {
        Self {
            name: decl.name.clone(),
            description,
            plural: decl.fully_qualified_name(),
            base: BASE_MODEL.to_string(),
            id_injection: true,
            options: ModelOptions {
                validate_upsert: true,
            },
            properties,
            validations: Vec::new(),
            relations: BTreeMap::new(),
            acls: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Pretty JSON with a four space indent.
    pub fn to_json(&self) -> Result<String, CodegenError> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
        self.serialize(&mut ser)?;

        Ok(String::from_utf8(buf)?)
    }
}

///
/// ModelOptions
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOptions {
    pub validate_upsert: bool,
}

///
/// ClassSchema
/// An inlined class: what a non-top-level declaration visit returns.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ClassSchema {
    pub description: String,
    pub properties: Properties,
}

///
/// Properties
///
/// Property schemas in declaration order, serialized as a JSON object.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(Vec<(String, PropertySchema)>);

impl Properties {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertySchema> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, name: String, schema: PropertySchema) {
        self.0.push((name, schema));
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, schema) in &self.0 {
            map.serialize_entry(name, schema)?;
        }

        map.end()
    }
}

///
/// TypeSchema
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypeSchema {
    Scalar(String),
    Array([String; 1]),
}

impl TypeSchema {
    fn new(name: &str, array: bool) -> Self {
        if array {
            Self::Array([name.to_string()])
        } else {
            Self::Scalar(name.to_string())
        }
    }
}

///
/// PropertySchema
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub type_schema: TypeSchema,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub id: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    pub required: bool,
}

impl PropertySchema {
    fn new(type_name: &str, prop: &Property) -> Self {
        Self {
            type_schema: TypeSchema::new(type_name, prop.array),
            default: None,
            id: false,
            description: None,
            properties: None,
            required: !prop.optional,
        }
    }
}

///
/// Emitted
/// What one visit hands back to its caller.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Emitted {
    Class(ClassSchema),
    Model(LoopbackModel),
    Models(Vec<LoopbackModel>),
    Nothing,
    Property(PropertySchema),
}

///
/// LoopbackVisitor
///

#[derive(Clone, Copy, Debug, Default)]
pub struct LoopbackVisitor;

impl LoopbackVisitor {
    fn declaration<'s>(
        &mut self,
        decl: &'s ClassDeclaration,
        ctx: &mut CodegenContext<'s>,
    ) -> Result<Emitted, CodegenError> {
        let top_level = ctx.take_top_level();
        tracing::trace!(fqn = %decl.fully_qualified_name(), top_level, "loopback declaration");

        ctx.begin_expansion(decl);
        let properties = self.properties(decl, ctx);
        ctx.end_expansion();
        let properties = properties?;

        if !top_level {
            return Ok(Emitted::Class(ClassSchema {
                description: class_description(decl),
                properties,
            }));
        }

        let description = match decl.kind {
            DeclarationKind::Transaction => format!("A transaction named {}", decl.name),
            _ => format!("An asset named {}", decl.name),
        };
        let model = LoopbackModel::new(decl, description, properties);
        ctx.emit(format!("{}.json", decl.fully_qualified_name()), &model.to_json()?)?;

        Ok(Emitted::Model(model))
    }

    fn properties<'s>(
        &mut self,
        decl: &'s ClassDeclaration,
        ctx: &mut CodegenContext<'s>,
    ) -> Result<Properties, CodegenError> {
        let mut properties = Properties::default();
        for prop in decl.all_properties() {
            let Emitted::Property(schema) = prop.accept(self, ctx)? else {
                return Err(unexpected(prop.tag().into(), &prop.name));
            };
            properties.push(prop.name.clone(), schema);
        }

        Ok(properties)
    }

    fn field<'s>(&mut self, prop: &'s Property, ctx: &mut CodegenContext<'s>) -> Result<Emitted, CodegenError> {
        if let Some(primitive) = prop.primitive() {
            let mut schema = PropertySchema::new(primitive_type(primitive), prop);
            schema.default = prop.default_value().map(str::to_string);

            let manager = ctx.model_manager();
            let identifier = manager
                .get_type(prop.parent())
                .ok()
                .and_then(ClassDeclaration::identifier_field_name);
            if identifier == Some(prop.name.as_str()) {
                schema.id = true;
                schema.description = Some("The instance identifier for this type".to_string());
            }

            return Ok(Emitted::Property(schema));
        }

        let target = ctx.model_manager().get_type(prop.fully_qualified_type_name())?;

        if target.is_enum() {
            let mut schema = PropertySchema::new(STRING_TYPE, prop);
            schema.default = prop.default_value().map(str::to_string);

            // registered, never inlined
            target.accept(self, ctx)?;

            return Ok(Emitted::Property(schema));
        }

        let mut schema = PropertySchema::new(OBJECT_TYPE, prop);
        if ctx.is_expanding(target) {
            schema.description = Some(class_description(target));

            return Ok(Emitted::Property(schema));
        }

        let Emitted::Class(class) = target.accept(self, ctx)? else {
            return Err(unexpected(target.kind.into(), &target.name));
        };
        schema.description = Some(class.description);
        schema.properties = Some(class.properties);

        Ok(Emitted::Property(schema))
    }
}

impl<'s> Visitor<'s> for LoopbackVisitor {
    type Context = CodegenContext<'s>;
    type Output = Emitted;
    type Error = CodegenError;

    fn visit_model_manager(
        &mut self,
        node: &'s ModelManager,
        ctx: &mut Self::Context,
    ) -> Result<Emitted, CodegenError> {
        let mut models = Vec::new();

        for file in node.model_files() {
            let Emitted::Models(file_models) = file.accept(self, ctx)? else {
                return Err(unexpected(NodeKind::ModelFile, file.namespace()));
            };
            models.extend(file_models);
        }

        Ok(Emitted::Models(models))
    }

    fn visit_model_file(&mut self, node: &'s ModelFile, ctx: &mut Self::Context) -> Result<Emitted, CodegenError> {
        tracing::debug!(namespace = node.namespace(), "loopback model file");
        ctx.enter_model_file(node);

        let declarations = node
            .declarations_of(DeclarationKind::Asset)
            .chain(node.declarations_of(DeclarationKind::Transaction))
            .filter(|d| !d.is_abstract);

        let mut models = Vec::new();
        for decl in declarations {
            ctx.open_top_level();

            let Emitted::Model(model) = decl.accept(self, ctx)? else {
                return Err(unexpected(decl.kind.into(), &decl.name));
            };
            models.push(model);
        }

        Ok(Emitted::Models(models))
    }

    fn visit_asset(&mut self, node: &'s ClassDeclaration, ctx: &mut Self::Context) -> Result<Emitted, CodegenError> {
        self.declaration(node, ctx)
    }

    fn visit_participant(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<Emitted, CodegenError> {
        self.declaration(node, ctx)
    }

    fn visit_transaction(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<Emitted, CodegenError> {
        self.declaration(node, ctx)
    }

    fn visit_enum(&mut self, node: &'s ClassDeclaration, ctx: &mut Self::Context) -> Result<Emitted, CodegenError> {
        tracing::trace!(fqn = %node.fully_qualified_name(), "loopback enum");

        for prop in node.all_properties() {
            prop.accept(self, ctx)?;
        }

        Ok(Emitted::Nothing)
    }

    fn visit_concept(&mut self, node: &'s ClassDeclaration, ctx: &mut Self::Context) -> Result<Emitted, CodegenError> {
        self.declaration(node, ctx)
    }

    fn visit_field(&mut self, node: &'s Property, ctx: &mut Self::Context) -> Result<Emitted, CodegenError> {
        self.field(node, ctx)
    }

    fn visit_relationship(&mut self, node: &'s Property, _: &mut Self::Context) -> Result<Emitted, CodegenError> {
        let mut schema = PropertySchema::new(STRING_TYPE, node);
        schema.description = Some(format!(
            "The identifier of an instance of {}",
            node.fully_qualified_type_name()
        ));

        Ok(Emitted::Property(schema))
    }

    fn visit_enum_value(&mut self, _: &'s Property, _: &mut Self::Context) -> Result<Emitted, CodegenError> {
        Ok(Emitted::Nothing)
    }
}

const fn primitive_type(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Boolean => "boolean",
        Primitive::DateTime => "date",
        Primitive::Double | Primitive::Integer | Primitive::Long => "number",
        Primitive::String => STRING_TYPE,
    }
}

fn class_description(decl: &ClassDeclaration) -> String {
    format!("An instance of {}", decl.fully_qualified_name())
}

fn unexpected(node: NodeKind, name: &str) -> CodegenError {
    DispatchError::new(VISITOR, node, name).into()
}

///
/// TESTS
///
