//! Code generation over a schema registry.
//!
//! Each target is a schema visitor that maps declarations into an external
//! format and hands the finished artifacts to a [`FileWriter`].

pub mod context;
pub mod loopback;
pub mod plantuml;
pub mod writer;

use crate::{context::CodegenContext, loopback::LoopbackVisitor, plantuml::PlantUmlVisitor, writer::FileWriter};
use derive_more::Display;
use std::{io, path::PathBuf, str::FromStr, string::FromUtf8Error};
use tessera_schema::{prelude::*, registry::ResolveError};
use thiserror::Error as ThisError;

///
/// CodegenError
///

#[derive(Debug, ThisError)]
pub enum CodegenError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("sink already has '{0}' open")]
    FileAlreadyOpen(String),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),

    #[error("failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("no file is open")]
    NoOpenFile,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("unknown codegen target '{0}'")]
    UnknownTarget(String),

    #[error(transparent)]
    Utf8(#[from] FromUtf8Error),
}

///
/// Target
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Target {
    #[display("loopback")]
    Loopback,
    #[display("plantuml")]
    PlantUml,
}

impl Target {
    pub const ALL: [Self; 2] = [Self::Loopback, Self::PlantUml];
}

impl FromStr for Target {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CodegenError::UnknownTarget(s.to_string()))
    }
}

/// Run one target over the whole registry. Returns the names of the
/// artifacts produced; they are only written when a sink is given.
pub fn generate(
    manager: &ModelManager,
    target: Target,
    writer: Option<&mut dyn FileWriter>,
) -> Result<Vec<String>, CodegenError> {
    let mut ctx = CodegenContext::new(manager);
    if let Some(writer) = writer {
        ctx = ctx.with_writer(writer);
    }

    match target {
        Target::Loopback => {
            manager.accept(&mut LoopbackVisitor, &mut ctx)?;
        }
        Target::PlantUml => {
            manager.accept(&mut PlantUmlVisitor, &mut ctx)?;
        }
    }

    let artifacts = ctx.into_artifacts();
    tracing::info!(%target, count = artifacts.len(), "code generated");

    Ok(artifacts)
}

///
/// TESTS
///
