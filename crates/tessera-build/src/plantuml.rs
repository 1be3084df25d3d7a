//! PlantUML class diagrams, one `<namespace>.puml` per model file.
//!
//! Classes list their own members only; inheritance and relationships are
//! drawn as arrows between fully qualified names.

use crate::{CodegenError, context::CodegenContext};
use std::fmt::Write;
use tessera_schema::prelude::*;

const VISITOR: &str = "PlantUmlVisitor";
const INDENT: &str = "    ";

///
/// PlantUmlVisitor
///

#[derive(Clone, Copy, Debug, Default)]
pub struct PlantUmlVisitor;

impl PlantUmlVisitor {
    fn class<'s>(&mut self, decl: &'s ClassDeclaration, ctx: &mut CodegenContext<'s>) -> Result<String, CodegenError> {
        let fqn = decl.fully_qualified_name();
        let keyword = if decl.is_abstract { "abstract class" } else { "class" };

        let mut out = String::new();
        writeln!(out, "{keyword} {fqn} << {} >> {{", decl.kind)?;
        for prop in decl.own_properties() {
            writeln!(out, "{INDENT}{}", prop.accept(self, ctx)?)?;
        }
        writeln!(out, "}}")?;

        if let Some(parent) = decl.super_type_name() {
            writeln!(out, "{fqn} --|> {parent}")?;
        }
        for prop in decl.own_properties().iter().filter(|p| p.is_relationship()) {
            let arity = if prop.array { "\"*\" " } else { "" };
            writeln!(
                out,
                "{fqn} --> {arity}{} : {}",
                prop.fully_qualified_type_name(),
                prop.name
            )?;
        }

        Ok(out)
    }
}

impl<'s> Visitor<'s> for PlantUmlVisitor {
    type Context = CodegenContext<'s>;
    type Output = String;
    type Error = CodegenError;

    fn visit_model_manager(&mut self, node: &'s ModelManager, ctx: &mut Self::Context) -> Result<String, CodegenError> {
        let mut out = String::new();
        for file in node.model_files() {
            out.push_str(&file.accept(self, ctx)?);
        }

        Ok(out)
    }

    fn visit_model_file(&mut self, node: &'s ModelFile, ctx: &mut Self::Context) -> Result<String, CodegenError> {
        tracing::debug!(namespace = node.namespace(), "plantuml model file");
        ctx.enter_model_file(node);

        let mut out = String::new();
        writeln!(out, "@startuml")?;
        writeln!(out, "title {}", node.namespace())?;
        for decl in node.declarations() {
            out.push_str(&decl.accept(self, ctx)?);
        }
        writeln!(out, "@enduml")?;

        ctx.emit(format!("{}.puml", node.namespace()), &out)?;

        Ok(out)
    }

    fn visit_asset(&mut self, node: &'s ClassDeclaration, ctx: &mut Self::Context) -> Result<String, CodegenError> {
        self.class(node, ctx)
    }

    fn visit_participant(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<String, CodegenError> {
        self.class(node, ctx)
    }

    fn visit_transaction(
        &mut self,
        node: &'s ClassDeclaration,
        ctx: &mut Self::Context,
    ) -> Result<String, CodegenError> {
        self.class(node, ctx)
    }

    fn visit_enum(&mut self, node: &'s ClassDeclaration, ctx: &mut Self::Context) -> Result<String, CodegenError> {
        let mut out = String::new();
        writeln!(out, "enum {} {{", node.fully_qualified_name())?;
        for prop in node.own_properties() {
            writeln!(out, "{INDENT}{}", prop.accept(self, ctx)?)?;
        }
        writeln!(out, "}}")?;

        Ok(out)
    }

    fn visit_concept(&mut self, node: &'s ClassDeclaration, ctx: &mut Self::Context) -> Result<String, CodegenError> {
        self.class(node, ctx)
    }

    fn visit_field(&mut self, node: &'s Property, _: &mut Self::Context) -> Result<String, CodegenError> {
        Ok(member(node))
    }

    fn visit_relationship(&mut self, node: &'s Property, _: &mut Self::Context) -> Result<String, CodegenError> {
        Ok(member(node))
    }

    fn visit_enum_value(&mut self, node: &'s Property, ctx: &mut Self::Context) -> Result<String, CodegenError> {
        // enum values only make sense inside a model file walk
        if ctx.model_file().is_none() {
            return Err(DispatchError::new(VISITOR, NodeKind::EnumValue, &node.name).into());
        }

        Ok(format!("+ {}", node.name))
    }
}

// `+ String[] name`, with optional members marked
fn member(prop: &Property) -> String {
    let array = if prop.array { "[]" } else { "" };
    let optional = if prop.optional { " (optional)" } else { "" };

    format!("+ {}{array} {}{optional}", prop.type_name, prop.name)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::MemoryWriter;
    use tessera_schema::fixtures;

    fn diagrams(mm: &ModelManager) -> MemoryWriter {
        let mut writer = MemoryWriter::new();
        let mut ctx = CodegenContext::new(mm).with_writer(&mut writer);
        mm.accept(&mut PlantUmlVisitor, &mut ctx).unwrap();
        drop(ctx);

        writer
    }

    #[test]
    fn one_diagram_per_namespace() {
        let mm = fixtures::fleet();
        let writer = diagrams(&mm);

        let names: Vec<_> = writer.files().keys().map(String::as_str).collect();
        assert_eq!(names, ["org.acme.base.puml", "org.acme.fleet.puml"]);

        let base = writer.get("org.acme.base.puml").unwrap();
        assert!(base.starts_with("@startuml\ntitle org.acme.base\n"));
        assert!(base.ends_with("@enduml\n"));
    }

    #[test]
    fn classes_show_own_members_and_arrows() {
        let mm = fixtures::fleet();
        let writer = diagrams(&mm);
        let fleet = writer.get("org.acme.fleet.puml").unwrap();

        assert!(fleet.contains("class org.acme.fleet.Truck << asset >> {\n    + Double payload\n"));
        assert!(fleet.contains("    + Long axles (optional)\n"));
        assert!(fleet.contains("org.acme.fleet.Truck --|> org.acme.base.Vehicle\n"));
        assert!(fleet.contains("org.acme.fleet.Truck --> \"*\" org.acme.base.Person : drivers\n"));
        assert!(!fleet.contains("+ String vin"));
        assert!(fleet.contains("abstract class org.acme.fleet.Recall << transaction >>"));
    }

    #[test]
    fn enums_list_their_values() {
        let mm = fixtures::fleet();
        let writer = diagrams(&mm);
        let base = writer.get("org.acme.base.puml").unwrap();

        assert!(base.contains("enum org.acme.base.Colour {\n    + RED\n    + GREEN\n    + BLUE\n}\n"));
    }

    #[test]
    fn lone_enum_values_are_rejected() {
        let mm = fixtures::fleet();
        let colour = mm.get_type("org.acme.base.Colour").unwrap();
        let mut ctx = CodegenContext::new(&mm);

        let err = colour.accept(&mut PlantUmlVisitor, &mut ctx).unwrap_err();
        assert!(matches!(err, CodegenError::Dispatch(_)));
    }
}
