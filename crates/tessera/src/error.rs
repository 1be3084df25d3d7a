use derive_more::Display;
use serde::{Deserialize, Serialize};
use tessera_build::CodegenError;
use tessera_config::ConfigError;
use tessera_core::{
    connector::ConnectorError,
    factory::FactoryError,
    generator::GenerateError,
    ledger::LedgerError,
    resource::ValidationError,
    serialize::SerializeError,
};
use tessera_schema::{
    registry::{BuildError, ResolveError},
    visit::DispatchError,
};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type: a stable kind plus the underlying message.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn of(kind: ErrorKind, err: &impl std::error::Error) -> Self {
        Self::new(kind, err.to_string())
    }
}

///
/// ErrorKind
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Configuration is missing or wrong.
    Configuration,

    /// Abstract or otherwise non-instantiable type, or a transaction built
    /// from a non-transaction declaration.
    Construction,

    /// A visitor met a node it cannot handle. A bug, not a runtime condition.
    InternalDispatch,

    Io,

    /// A required argument was empty or absent.
    MalformedInput,

    /// Namespace or type not found.
    Resolution,

    /// The schema failed load-time validation.
    Schema,

    Serialization,

    /// The ledger transport or a connector failed.
    Transport,

    /// A value does not conform to its declaration.
    Validation,
}

//
// schema
//

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Self::of(ErrorKind::Schema, &err)
    }
}

impl From<DispatchError> for Error {
    fn from(err: DispatchError) -> Self {
        Self::of(ErrorKind::InternalDispatch, &err)
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        Self::of(ErrorKind::Resolution, &err)
    }
}

impl From<tessera_schema::Error> for Error {
    fn from(err: tessera_schema::Error) -> Self {
        match err {
            tessera_schema::Error::BuildError(err) => err.into(),
            tessera_schema::Error::ResolveError(err) => err.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::of(ErrorKind::Serialization, &err)
    }
}

//
// config
//

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::of(ErrorKind::Configuration, &err)
    }
}

//
// core
//

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::of(ErrorKind::Validation, &err)
    }
}

impl From<FactoryError> for Error {
    fn from(err: FactoryError) -> Self {
        match err {
            FactoryError::Generate(err) => err.into(),
            FactoryError::Resolve(err) => err.into(),
            FactoryError::Validation(err) => err.into(),
            FactoryError::MalformedInput(_) => Self::of(ErrorKind::MalformedInput, &err),
            FactoryError::AbstractType(_)
            | FactoryError::NotATransaction(_)
            | FactoryError::NotInstantiable { .. } => Self::of(ErrorKind::Construction, &err),
        }
    }
}

impl From<GenerateError> for Error {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Dispatch(err) => err.into(),
            GenerateError::Resolve(err) => err.into(),
            GenerateError::Validation(err) => err.into(),
            GenerateError::EmptyEnum(_)
            | GenerateError::NoConcreteSubtype(_)
            | GenerateError::RequiredCycle(_) => Self::of(ErrorKind::Construction, &err),
            GenerateError::EmptyStack => Self::of(ErrorKind::InternalDispatch, &err),
        }
    }
}

impl From<SerializeError> for Error {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Resolve(err) => err.into(),
            SerializeError::Validation(err) => err.into(),
            SerializeError::AbstractType(_) => Self::of(ErrorKind::Construction, &err),
            SerializeError::Json(_)
            | SerializeError::MissingClass
            | SerializeError::MissingIdentifier { .. }
            | SerializeError::NonFiniteNumber { .. }
            | SerializeError::NotAnObject(_)
            | SerializeError::UnexpectedValue { .. } => Self::of(ErrorKind::Serialization, &err),
        }
    }
}

impl From<LedgerError> for Error {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Serialize(err) => err.into(),
            LedgerError::MalformedInput(_) | LedgerError::NoIdentifier(_) => {
                Self::of(ErrorKind::MalformedInput, &err)
            }
            LedgerError::Json(_) => Self::of(ErrorKind::Serialization, &err),
            LedgerError::Transport(_) => Self::of(ErrorKind::Transport, &err),
        }
    }
}

impl From<ConnectorError> for Error {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::Config(err) => err.into(),
            ConnectorError::Connect { .. } => Self::of(ErrorKind::Transport, &err),
            ConnectorError::MissingNetwork(_) | ConnectorError::UnknownType { .. } => {
                Self::of(ErrorKind::Configuration, &err)
            }
        }
    }
}

impl From<tessera_core::Error> for Error {
    fn from(err: tessera_core::Error) -> Self {
        match err {
            tessera_core::Error::ConnectorError(err) => err.into(),
            tessera_core::Error::FactoryError(err) => err.into(),
            tessera_core::Error::GenerateError(err) => err.into(),
            tessera_core::Error::LedgerError(err) => err.into(),
            tessera_core::Error::SerializeError(err) => err.into(),
            tessera_core::Error::ValidationError(err) => err.into(),
        }
    }
}

//
// build
//

impl From<CodegenError> for Error {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::Dispatch(err) => err.into(),
            CodegenError::Resolve(err) => err.into(),
            CodegenError::UnknownTarget(_) => Self::of(ErrorKind::Configuration, &err),
            CodegenError::FileAlreadyOpen(_) | CodegenError::Io { .. } | CodegenError::NoOpenFile => {
                Self::of(ErrorKind::Io, &err)
            }
            CodegenError::Fmt(_) | CodegenError::Json(_) | CodegenError::Utf8(_) => {
                Self::of(ErrorKind::Serialization, &err)
            }
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_keep_their_kind() {
        let err: Error = FactoryError::Resolve(ResolveError::TypeNotFound {
            namespace: "org.acme".into(),
            type_name: "Trailer".into(),
        })
        .into();

        assert_eq!(err.kind, ErrorKind::Resolution);
        assert_eq!(err.message, "type 'Trailer' is not defined in namespace 'org.acme'");
    }

    #[test]
    fn ledger_input_errors_are_malformed_input() {
        let err: Error = LedgerError::MalformedInput("id").into();

        assert_eq!(err.kind, ErrorKind::MalformedInput);
        assert_eq!(err.to_string(), "id not specified");
    }

    #[test]
    fn kinds_display_by_name() {
        assert_eq!(ErrorKind::InternalDispatch.to_string(), "InternalDispatch");
    }
}
