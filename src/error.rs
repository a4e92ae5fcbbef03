use miette::Diagnostic;
use thiserror::Error;

/// Result type for CFG construction operations
pub type Result<T> = std::result::Result<T, Error>;

/// Custom error types for CFG construction
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid call sequence: {message}")]
    #[diagnostic(code(bytecode_cfg::invalid_state))]
    InvalidState { message: String },

    #[error("Invalid argument: {message}")]
    #[diagnostic(code(bytecode_cfg::invalid_argument))]
    InvalidArgument { message: String },

    #[error("Method {unit}.{method} is already registered")]
    #[diagnostic(code(bytecode_cfg::method_already_registered))]
    MethodAlreadyRegistered { unit: String, method: String },

    #[error("Method {unit}.{method} was never registered")]
    #[diagnostic(code(bytecode_cfg::unknown_method))]
    UnknownMethod { unit: String, method: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(bytecode_cfg::internal_error))]
    Internal { message: String },
}

impl Error {
    /// Create an invalid-state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState {
            message: message.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Create an already-registered error
    pub fn already_registered(unit: impl Into<String>, method: impl Into<String>) -> Self {
        Error::MethodAlreadyRegistered {
            unit: unit.into(),
            method: method.into(),
        }
    }

    /// Create an unknown-method error
    pub fn unknown_method(unit: impl Into<String>, method: impl Into<String>) -> Self {
        Error::UnknownMethod {
            unit: unit.into(),
            method: method.into(),
        }
    }
}
