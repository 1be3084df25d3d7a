//! Sample-data generation.
//!
//! [`Generator`] is a schema [`Visitor`]: visiting a declaration fills the
//! resource on top of the [`TypedStack`] with random values, pushing a new
//! resource for each embedded class it has to build. Past
//! `GeneratorConfig::max_depth` only required properties are generated and
//! arrays stay empty, so self-referential schemas terminate with instances
//! that still validate. A class that requires an instance of itself has no
//! finite sample and fails with [`GenerateError::RequiredCycle`].

use crate::{
    ThisError,
    relationship::Relationship,
    resource::{Resource, Validation, ValidationError},
    value::Value,
};
use rand::{Rng, SeedableRng, distributions::Alphanumeric, rngs::StdRng, seq::SliceRandom};
use tessera_config::GeneratorConfig;
use tessera_schema::{prelude::*, registry::ResolveError};
use time::OffsetDateTime;

const ID_LEN: usize = 8;
const STRING_LEN: usize = 12;

// 1970..2033, whole seconds
const MAX_TIMESTAMP_SECS: i64 = 2_000_000_000;

///
/// GenerateError
///

#[derive(Debug, ThisError)]
pub enum GenerateError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("enum '{0}' declares no values")]
    EmptyEnum(String),

    #[error("type '{0}' has no concrete subtype to instantiate")]
    NoConcreteSubtype(String),

    #[error("'{0}' requires an instance of itself, so no finite sample exists")]
    RequiredCycle(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("generator stack is empty")]
    EmptyStack,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

///
/// TypedStack
///
/// Resources under construction; the top is the one being filled. Its
/// length is the current generation depth.
///

#[derive(Debug, Default)]
pub struct TypedStack<'m> {
    items: Vec<Resource<'m>>,
}

impl<'m> TypedStack<'m> {
    #[must_use]
    pub fn new(root: Resource<'m>) -> Self {
        Self { items: vec![root] }
    }

    pub fn push(&mut self, resource: Resource<'m>) {
        self.items.push(resource);
    }

    pub fn pop(&mut self) -> Option<Resource<'m>> {
        self.items.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Resource<'m>> {
        self.items.last()
    }

    pub fn peek_mut(&mut self) -> Option<&mut Resource<'m>> {
        self.items.last_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Is an instance of `decl` already under construction?
    #[must_use]
    pub fn holds(&self, decl: &ClassDeclaration) -> bool {
        self.items
            .iter()
            .any(|r| std::ptr::eq(r.class_declaration(), decl))
    }
}

///
/// Generator
///

pub struct Generator<'m> {
    manager: &'m ModelManager,
    config: GeneratorConfig,
    rng: StdRng,
}

impl<'m> Generator<'m> {
    #[must_use]
    pub fn new(manager: &'m ModelManager, config: GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            manager,
            config,
            rng,
        }
    }

    /// Fill `resource` with sample data and hand it back.
    pub fn populate(&mut self, resource: Resource<'m>) -> Result<Resource<'m>, GenerateError> {
        let decl = resource.class_declaration();
        let mut stack = TypedStack::new(resource);

        decl.accept(self, &mut stack)?;

        stack.pop().ok_or(GenerateError::EmptyStack)
    }

    fn fill(&mut self, decl: &'m ClassDeclaration, stack: &mut TypedStack<'m>) -> Result<(), GenerateError> {
        tracing::trace!(fqn = %decl.fully_qualified_name(), depth = stack.len(), "generating");

        for prop in decl.all_properties() {
            prop.accept(self, stack)?;
        }

        Ok(())
    }

    // past the bound only required properties are generated
    fn exhausted(&self, stack: &TypedStack<'m>) -> bool {
        stack.items.len() >= self.config.max_depth
    }

    fn generate_property(
        &mut self,
        prop: &'m Property,
        stack: &mut TypedStack<'m>,
    ) -> Result<(), GenerateError> {
        let top = stack.peek_mut().ok_or(GenerateError::EmptyStack)?;

        // identifiers are never sampled
        if top.class_declaration().identifier_field_name() == Some(prop.name.as_str())
            && let Some(id) = top.id().map(str::to_string)
        {
            top.set(prop.name.clone(), Value::String(id))?;
            return Ok(());
        }

        let exhausted = self.exhausted(stack);
        if prop.optional && exhausted {
            return Ok(());
        }

        let value = if prop.array {
            let len = if exhausted || self.config.max_array_len == 0 {
                0
            } else {
                self.rng.gen_range(1..=self.config.max_array_len)
            };

            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(self.scalar(prop, stack)?);
            }

            Value::List(items)
        } else {
            self.scalar(prop, stack)?
        };

        stack
            .peek_mut()
            .ok_or(GenerateError::EmptyStack)?
            .set(prop.name.clone(), value)?;

        Ok(())
    }

    fn scalar(&mut self, prop: &'m Property, stack: &mut TypedStack<'m>) -> Result<Value, GenerateError> {
        if prop.is_relationship() {
            return self.relationship(prop.fully_qualified_type_name()).map(Value::Relationship);
        }
        if let Some(primitive) = prop.primitive() {
            return Ok(self.primitive(primitive));
        }

        let decl = self.manager.get_type(prop.fully_qualified_type_name())?;
        if decl.is_enum() {
            let values: Vec<&str> = decl.enum_values().collect();
            return values
                .choose(&mut self.rng)
                .map(|v| Value::Enum((*v).to_string()))
                .ok_or_else(|| GenerateError::EmptyEnum(decl.fully_qualified_name()));
        }

        self.embedded(decl, stack)
    }

    fn primitive(&mut self, primitive: Primitive) -> Value {
        match primitive {
            Primitive::Boolean => Value::Boolean(self.rng.r#gen()),
            Primitive::DateTime => {
                let secs = self.rng.gen_range(0..MAX_TIMESTAMP_SECS);
                Value::DateTime(
                    OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH),
                )
            }
            Primitive::Double => Value::Double((self.rng.gen_range(0.0..10_000.0_f64) * 100.0).round() / 100.0),
            Primitive::Integer => Value::Integer(self.rng.gen_range(0..10_000)),
            Primitive::Long => Value::Long(self.rng.gen_range(0..1_000_000)),
            Primitive::String => Value::String(self.text(STRING_LEN)),
        }
    }

    fn relationship(&mut self, target: &str) -> Result<Relationship, GenerateError> {
        let decl = self.concrete(target)?;
        let id = self.text(ID_LEN);

        Ok(Relationship::new(decl.namespace(), &decl.name, id))
    }

    // Build a nested class instance. Past the bound a class already under
    // construction can only be reached through required properties.
    fn embedded(&mut self, target: &'m ClassDeclaration, stack: &mut TypedStack<'m>) -> Result<Value, GenerateError> {
        let decl = self.concrete(&target.fully_qualified_name())?;
        if self.exhausted(stack) && stack.holds(decl) {
            return Err(GenerateError::RequiredCycle(decl.fully_qualified_name()));
        }

        let validation = stack.peek().map_or(Validation::Checked, Resource::validation);
        let id = decl.identifier_field_name().map(|_| self.text(ID_LEN));
        let mut nested = Resource::new(self.manager, decl, id, validation);
        nested.assign_field_defaults();

        stack.push(nested);
        decl.accept(self, stack)?;
        let nested = stack.pop().ok_or(GenerateError::EmptyStack)?;

        Ok(nested.into_embedded().into())
    }

    fn concrete(&mut self, fqn: &str) -> Result<&'m ClassDeclaration, GenerateError> {
        let candidates = self.manager.concrete_subtypes(fqn);

        candidates
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| GenerateError::NoConcreteSubtype(fqn.to_string()))
    }

    fn text(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

impl<'m> Visitor<'m> for Generator<'m> {
    type Context = TypedStack<'m>;
    type Output = ();
    type Error = GenerateError;

    fn visit_model_manager(&mut self, _: &'m ModelManager, _: &mut Self::Context) -> Result<(), GenerateError> {
        Err(DispatchError::new("Generator", NodeKind::ModelManager, "registry").into())
    }

    fn visit_model_file(&mut self, node: &'m ModelFile, _: &mut Self::Context) -> Result<(), GenerateError> {
        Err(DispatchError::new("Generator", NodeKind::ModelFile, node.namespace()).into())
    }

    fn visit_asset(&mut self, node: &'m ClassDeclaration, ctx: &mut Self::Context) -> Result<(), GenerateError> {
        self.fill(node, ctx)
    }

    fn visit_participant(&mut self, node: &'m ClassDeclaration, ctx: &mut Self::Context) -> Result<(), GenerateError> {
        self.fill(node, ctx)
    }

    fn visit_transaction(&mut self, node: &'m ClassDeclaration, ctx: &mut Self::Context) -> Result<(), GenerateError> {
        self.fill(node, ctx)
    }

    fn visit_enum(&mut self, node: &'m ClassDeclaration, _: &mut Self::Context) -> Result<(), GenerateError> {
        Err(DispatchError::new("Generator", NodeKind::Enum, &node.name).into())
    }

    fn visit_concept(&mut self, node: &'m ClassDeclaration, ctx: &mut Self::Context) -> Result<(), GenerateError> {
        self.fill(node, ctx)
    }

    fn visit_field(&mut self, node: &'m Property, ctx: &mut Self::Context) -> Result<(), GenerateError> {
        self.generate_property(node, ctx)
    }

    fn visit_relationship(&mut self, node: &'m Property, ctx: &mut Self::Context) -> Result<(), GenerateError> {
        self.generate_property(node, ctx)
    }

    fn visit_enum_value(&mut self, node: &'m Property, _: &mut Self::Context) -> Result<(), GenerateError> {
        Err(DispatchError::new("Generator", NodeKind::EnumValue, &node.name).into())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_schema::fixtures;

    fn config(max_depth: usize) -> GeneratorConfig {
        GeneratorConfig {
            max_depth,
            max_array_len: 2,
            seed: Some(7),
        }
    }

    fn blank<'m>(mm: &'m ModelManager, fqn: &str) -> Resource<'m> {
        let decl = mm.get_type(fqn).unwrap();
        Resource::new(mm, decl, Some("ROOT".into()), Validation::Checked)
    }

    #[test]
    fn fills_every_property_within_bounds() {
        let mm = fixtures::fleet();
        let truck = Generator::new(&mm, config(4))
            .populate(blank(&mm, "org.acme.fleet.Truck"))
            .unwrap();

        for prop in truck.class_declaration().all_properties() {
            assert!(truck.contains(&prop.name), "missing {}", prop.name);
        }
        truck.validate().unwrap();

        let drivers = truck.get("drivers").and_then(Value::as_list).unwrap();
        assert!((1..=2).contains(&drivers.len()));
        assert!(drivers.iter().all(|d| d.as_relationship().is_some()));
    }

    #[test]
    fn same_seed_same_data() {
        let mm = fixtures::fleet();

        let a = Generator::new(&mm, config(3)).populate(blank(&mm, "org.acme.base.Person")).unwrap();
        let b = Generator::new(&mm, config(3)).populate(blank(&mm, "org.acme.base.Person")).unwrap();

        assert_eq!(a.values(), b.values());
    }

    #[test]
    fn relationships_point_at_concrete_types() {
        let mm = fixtures::fleet();
        let transfer = Generator::new(&mm, config(4))
            .populate(blank(&mm, "org.acme.fleet.Transfer"))
            .unwrap();

        let vehicle = transfer.get("vehicle").and_then(Value::as_relationship).unwrap();
        assert_eq!(vehicle.namespace(), "org.acme.fleet");
        assert!(["Car", "Truck"].contains(&vehicle.type_name()));
        assert_eq!(vehicle.id().len(), ID_LEN);
    }

    #[test]
    fn recursion_stops_at_max_depth() {
        let mm = fixtures::recursive();
        let tree = Generator::new(&mm, config(3))
            .populate(blank(&mm, "test.Tree"))
            .unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.get("id"), Some(&Value::from("ROOT")));

        // depth 1: Tree, depth 2: root node, depth 3: root.next
        let root = tree.get("root").and_then(Value::as_embedded).unwrap();
        assert!(root.values.contains_key("next"));

        let next = root.values.get("next").and_then(Value::as_embedded).unwrap();
        assert!(next.values.contains_key("label"));
        assert!(next.values.contains_key("shape"));
        assert!(next.values.get("tree").and_then(Value::as_relationship).is_some());
        assert_eq!(next.values.get("children"), Some(&Value::List(Vec::new())));
        assert!(!next.values.contains_key("next"));
    }

    #[test]
    fn required_cycles_have_no_sample() {
        let mm = ModelManager::builder()
            .add_model_file(
                ModelFileDef::new("test")
                    .declare(ClassDeclaration::concept("Loop").property(Property::field("again", "Loop")))
                    .declare(
                        ClassDeclaration::asset("Holder")
                            .identified_by("id")
                            .property(Property::field("id", "String"))
                            .property(Property::field("head", "Loop")),
                    ),
            )
            .build()
            .unwrap();

        let err = Generator::new(&mm, config(3))
            .populate(blank(&mm, "test.Holder"))
            .unwrap_err();

        assert!(matches!(err, GenerateError::RequiredCycle(ref fqn) if fqn == "test.Loop"));
    }

    #[test]
    fn embedded_identifiable_classes_keep_their_id() {
        let mm = fixtures::fleet();
        let person = Generator::new(&mm, config(4))
            .populate(blank(&mm, "org.acme.base.Person"))
            .unwrap();

        assert_eq!(person.get("email"), Some(&Value::from("ROOT")));
        person.validate().unwrap();
    }

    #[test]
    fn model_files_are_not_generatable() {
        let mm = fixtures::vehicles();
        let mut generator = Generator::new(&mm, config(2));
        let mut stack = TypedStack::default();

        let file = mm.get_model_file("org.acme").unwrap();
        let err = file.accept(&mut generator, &mut stack).unwrap_err();

        assert!(matches!(
            err,
            GenerateError::Dispatch(DispatchError { node: NodeKind::ModelFile, .. })
        ));
    }
}
