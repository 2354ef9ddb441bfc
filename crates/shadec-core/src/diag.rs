//! Diagnostics: source locations, severities, error codes, and the sink
//! boundary.
//!
//! The context accumulates [`Diagnostic`]s while the parser and the middle
//! end run; the compile driver drains them into the caller-provided
//! [`DiagnosticSink`] at pass boundaries. Emitting at [`Severity::Error`]
//! sets the context's sticky `failed` flag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the source text. `file` indexes the context's source-file
/// table; file 0 is the unnamed primary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: u32,
    pub line: u32,
    pub column: u32,
}

impl Default for SourceLocation {
    fn default() -> Self {
        SourceLocation {
            file: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Diagnostic severity. Errors set the sticky `failed` flag on the context;
/// warnings and notes never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// The fixed enumeration of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// An identifier (including the entry point) could not be resolved.
    NotDefined,
    /// A varying leaf or entry return value has no semantic attached.
    MissingSemantic,
    /// Mismatched operands, illegal casts and other type errors.
    InvalidType,
    /// Reserved for the lexer/parser.
    Syntax,
    /// A name was defined twice in the same scope.
    Redefined,
}

/// A single diagnostic message. Notes carry no code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub severity: Severity,
    pub code: Option<ErrorCode>,
    pub message: String,
}

/// Receiver for diagnostics, implemented by the host driver. Calls are
/// synchronous; the sink must not re-enter the compiler.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: &Diagnostic);
}

/// A sink that collects diagnostics into a vector. Useful for tests and for
/// hosts that post-process messages in bulk.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for CollectingSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}
