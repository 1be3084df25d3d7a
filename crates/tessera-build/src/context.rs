use crate::{CodegenError, writer::FileWriter};
use tessera_schema::prelude::*;

///
/// CodegenContext
///
/// Traversal state shared by the code-generation visitors. Besides the
/// registry and the model file currently entered it tracks whether the next
/// declaration opens a top-level artifact and which classes are being
/// expanded, so self-referential classes are expanded once per path.
/// Without a sink artifacts are computed and returned but never written.
///

pub struct CodegenContext<'s> {
    manager: &'s ModelManager,
    model_file: Option<&'s ModelFile>,
    top_level: bool,
    expanding: Vec<&'s ClassDeclaration>,
    writer: Option<&'s mut dyn FileWriter>,
    artifacts: Vec<String>,
}

impl<'s> CodegenContext<'s> {
    #[must_use]
    pub const fn new(manager: &'s ModelManager) -> Self {
        Self {
            manager,
            model_file: None,
            top_level: false,
            expanding: Vec::new(),
            writer: None,
            artifacts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_writer(mut self, writer: &'s mut dyn FileWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    #[must_use]
    pub const fn model_manager(&self) -> &'s ModelManager {
        self.manager
    }

    #[must_use]
    pub const fn model_file(&self) -> Option<&'s ModelFile> {
        self.model_file
    }

    /// Names of the artifacts emitted so far, in emission order.
    #[must_use]
    pub fn artifacts(&self) -> &[String] {
        &self.artifacts
    }

    #[must_use]
    pub fn into_artifacts(self) -> Vec<String> {
        self.artifacts
    }

    pub(crate) const fn enter_model_file(&mut self, file: &'s ModelFile) {
        self.model_file = Some(file);
    }

    pub(crate) const fn open_top_level(&mut self) {
        self.top_level = true;
    }

    /// True once per `open_top_level`: for the declaration that opened it.
    pub(crate) const fn take_top_level(&mut self) -> bool {
        let top = self.top_level;
        self.top_level = false;

        top
    }

    pub(crate) fn begin_expansion(&mut self, decl: &'s ClassDeclaration) {
        self.expanding.push(decl);
    }

    pub(crate) fn end_expansion(&mut self) {
        self.expanding.pop();
    }

    /// Is `decl` already being expanded further up the current path?
    #[must_use]
    pub fn is_expanding(&self, decl: &ClassDeclaration) -> bool {
        self.expanding.iter().any(|d| std::ptr::eq(*d, decl))
    }

    /// Hand a finished artifact to the sink, if there is one.
    pub(crate) fn emit(&mut self, name: String, contents: &str) -> Result<(), CodegenError> {
        if let Some(writer) = self.writer.as_deref_mut() {
            writer.open_file(&name)?;
            writer.write(contents)?;
            writer.close_file()?;
        }
        tracing::debug!(artifact = %name, persisted = self.writer.is_some(), "artifact emitted");

        self.artifacts.push(name);

        Ok(())
    }
}
