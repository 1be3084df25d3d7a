//! JSON wire form of resources.
//!
//! Every object carries its class under `$class`. Relationships are written
//! as `resource:<fqn>#<id>` URIs; on input a bare id is also accepted and
//! taken to point at the declared target type. Date-times are RFC 3339 in
//! UTC with millisecond precision.

use crate::{
    ThisError,
    relationship::{RELATIONSHIP_SCHEME, Relationship},
    resource::{Resource, Validation, ValidationError},
    value::{Embedded, Value, format_date_time, parse_date_time},
};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use tessera_schema::{node::split_fully_qualified_name, prelude::*, registry::ResolveError};

/// Key holding the fully qualified class name of a JSON object.
pub const CLASS_KEY: &str = "$class";

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("cannot deserialize abstract type '{0}'")]
    AbstractType(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("object has no '{CLASS_KEY}' string")]
    MissingClass,

    #[error("identifying field '{field}' of '{type_name}' is missing")]
    MissingIdentifier { type_name: String, field: String },

    #[error("property '{property}' holds {value}, which JSON cannot represent")]
    NonFiniteNumber { property: String, value: f64 },

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("property '{property}' expects {expected}, found JSON {found}")]
    UnexpectedValue {
        property: String,
        expected: String,
        found: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

///
/// Serializer
///
/// Converts resources to and from their wire form.
///

pub trait Serializer<'m> {
    fn to_json(&self, resource: &Resource<'m>) -> Result<JsonValue, SerializeError>;

    fn from_json(&self, json: &JsonValue) -> Result<Resource<'m>, SerializeError>;

    fn to_bytes(&self, resource: &Resource<'m>) -> Result<Vec<u8>, SerializeError> {
        Ok(serde_json::to_vec(&self.to_json(resource)?)?)
    }

    fn from_bytes(&self, bytes: &[u8]) -> Result<Resource<'m>, SerializeError> {
        let json: JsonValue = serde_json::from_slice(bytes)?;

        self.from_json(&json)
    }
}

///
/// JsonSerializer
///
/// Validates the whole instance in both directions unless built with
/// `without_validation`.
///

#[derive(Clone, Copy, Debug)]
pub struct JsonSerializer<'m> {
    manager: &'m ModelManager,
    validate: bool,
}

impl<'m> JsonSerializer<'m> {
    #[must_use]
    pub const fn new(manager: &'m ModelManager) -> Self {
        Self {
            manager,
            validate: true,
        }
    }

    #[must_use]
    pub const fn without_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    fn class_of<'j>(
        &self,
        json: &'j JsonValue,
        declared: Option<&str>,
    ) -> Result<(&'m ClassDeclaration, &'j Map<String, JsonValue>), SerializeError> {
        let JsonValue::Object(fields) = json else {
            return Err(SerializeError::NotAnObject(json_kind(json)));
        };

        let class = match fields.get(CLASS_KEY) {
            Some(JsonValue::String(class)) => class.as_str(),
            Some(_) => return Err(SerializeError::MissingClass),
            None => declared.ok_or(SerializeError::MissingClass)?,
        };

        Ok((self.manager.get_type(class)?, fields))
    }

    fn values(
        &self,
        decl: &'m ClassDeclaration,
        fields: &Map<String, JsonValue>,
    ) -> Result<BTreeMap<String, Value>, SerializeError> {
        let mut values = BTreeMap::new();

        for (name, json) in fields {
            if name == CLASS_KEY || json.is_null() {
                continue;
            }

            let prop = decl
                .get_property(name)
                .ok_or_else(|| ValidationError::UnknownProperty {
                    type_name: decl.fully_qualified_name(),
                    property: name.clone(),
                })?;

            values.insert(name.clone(), self.property(prop, json)?);
        }

        Ok(values)
    }

    fn property(&self, prop: &'m Property, json: &JsonValue) -> Result<Value, SerializeError> {
        if !prop.array {
            return self.scalar(prop, json);
        }

        let JsonValue::Array(items) = json else {
            return Err(unexpected(prop, json));
        };

        items
            .iter()
            .map(|item| self.scalar(prop, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn scalar(&self, prop: &'m Property, json: &JsonValue) -> Result<Value, SerializeError> {
        let decoded = match &prop.kind {
            PropertyKind::EnumValue => None,
            PropertyKind::Relationship => json
                .as_str()
                .and_then(|text| relationship(prop, text))
                .map(Value::Relationship),
            PropertyKind::Field { .. } => match prop.primitive() {
                Some(primitive) => decode_primitive(primitive, json),
                None => {
                    let target = self.manager.get_type(prop.fully_qualified_type_name())?;
                    if !target.is_enum() {
                        return self.embedded(target, json);
                    }

                    json.as_str().map(|v| Value::Enum(v.to_string()))
                }
            },
        };

        decoded.ok_or_else(|| unexpected(prop, json))
    }

    fn embedded(&self, declared: &'m ClassDeclaration, json: &JsonValue) -> Result<Value, SerializeError> {
        let declared = declared.fully_qualified_name();
        let (decl, fields) = self.class_of(json, Some(&declared))?;
        let values = self.values(decl, fields)?;

        Ok(Embedded {
            class: decl.fully_qualified_name(),
            id: identifier(decl, &values),
            values,
        }
        .into())
    }
}

impl<'m> Serializer<'m> for JsonSerializer<'m> {
    fn to_json(&self, resource: &Resource<'m>) -> Result<JsonValue, SerializeError> {
        if self.validate {
            resource.validate()?;
        }

        encode_object(&resource.fully_qualified_type_name(), resource.values())
    }

    fn from_json(&self, json: &JsonValue) -> Result<Resource<'m>, SerializeError> {
        let (decl, fields) = self.class_of(json, None)?;
        if decl.is_abstract {
            return Err(SerializeError::AbstractType(decl.fully_qualified_name()));
        }

        let values = self.values(decl, fields)?;
        let id = identifier(decl, &values);

        if let Some(field) = decl.identifier_field_name()
            && id.is_none()
        {
            return Err(SerializeError::MissingIdentifier {
                type_name: decl.fully_qualified_name(),
                field: field.to_string(),
            });
        }

        let mut resource = Resource::new(self.manager, decl, id, Validation::Checked);
        for (name, value) in values {
            resource.insert(name, value);
        }

        if self.validate {
            resource.validate()?;
        }
        tracing::trace!(fqn = %resource.fully_qualified_identifier(), "resource deserialized");

        Ok(resource)
    }
}

fn encode_object(class: &str, values: &BTreeMap<String, Value>) -> Result<JsonValue, SerializeError> {
    let mut map = Map::new();
    map.insert(CLASS_KEY.to_string(), JsonValue::String(class.to_string()));

    for (name, value) in values {
        map.insert(name.clone(), encode(name, value)?);
    }

    Ok(JsonValue::Object(map))
}

// `name` is the property the value belongs to, for error reporting
fn encode(name: &str, value: &Value) -> Result<JsonValue, SerializeError> {
    let json = match value {
        Value::Boolean(v) => JsonValue::Bool(*v),
        Value::DateTime(v) => JsonValue::String(format_date_time(v)),
        Value::Double(v) => serde_json::Number::from_f64(*v)
            .map(JsonValue::Number)
            .ok_or_else(|| SerializeError::NonFiniteNumber {
                property: name.to_string(),
                value: *v,
            })?,
        Value::Enum(v) | Value::String(v) => JsonValue::String(v.clone()),
        Value::Integer(v) => JsonValue::from(*v),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| encode(name, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Long(v) => JsonValue::from(*v),
        Value::Relationship(rel) => JsonValue::String(rel.to_uri()),
        Value::Resource(embedded) => encode_object(&embedded.class, &embedded.values)?,
    };

    Ok(json)
}

fn decode_primitive(primitive: Primitive, json: &JsonValue) -> Option<Value> {
    match primitive {
        Primitive::Boolean => json.as_bool().map(Value::Boolean),
        Primitive::DateTime => json
            .as_str()
            .and_then(parse_date_time)
            .map(Value::DateTime),
        Primitive::Double => json.as_f64().map(Value::Double),
        Primitive::Integer => json
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Integer),
        Primitive::Long => json.as_i64().map(Value::Long),
        Primitive::String => json.as_str().map(Value::from),
    }
}

// full URI, or a bare id pointing at the declared target type
fn relationship(prop: &Property, text: &str) -> Option<Relationship> {
    if text.starts_with(RELATIONSHIP_SCHEME) {
        return Relationship::from_uri(text);
    }
    if text.is_empty() {
        return None;
    }

    let (namespace, type_name) = split_fully_qualified_name(prop.fully_qualified_type_name())?;

    Some(Relationship::new(namespace, type_name, text))
}

fn identifier(decl: &ClassDeclaration, values: &BTreeMap<String, Value>) -> Option<String> {
    decl.identifier_field_name()
        .and_then(|field| values.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn unexpected(prop: &Property, json: &JsonValue) -> SerializeError {
    let target = prop.fully_qualified_type_name();

    SerializeError::UnexpectedValue {
        property: prop.name.clone(),
        expected: if prop.array {
            format!("{target}[]")
        } else {
            target.to_string()
        },
        found: json_kind(json),
    }
}

const fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

///
/// TESTS
///
