//! Core error types for shadec-core.
//!
//! Uses `thiserror` for structured, matchable error variants. These are the
//! errors surfaced to the parser through the context-mutation API; the parser
//! decides how to report them (typically as diagnostics at the declaration
//! site) and continues to a safe boundary.

use thiserror::Error;

/// Errors produced by the shadec-core data model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A variable with the same name already exists in the current scope.
    #[error("variable '{name}' is already defined in this scope")]
    VariableRedefined { name: String },

    /// A local declaration at the top of a function body collides with a
    /// function parameter.
    #[error("variable '{name}' redefines a function parameter")]
    ParameterShadowed { name: String },

    /// Attempting to register a type name that already exists in the scope.
    #[error("duplicate type name: '{name}'")]
    DuplicateTypeName { name: String },

    /// Only named types can be registered in a scope's type lookup.
    #[error("anonymous type cannot be registered in a scope")]
    UnnamedType,

    /// Redeclaring a user-defined function as an intrinsic.
    #[error("redeclaring user-defined function '{name}' as an intrinsic")]
    IntrinsicRedefinition { name: String },
}
