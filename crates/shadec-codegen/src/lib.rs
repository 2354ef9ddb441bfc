//! The shadec middle end: profile decoding, entry-point lowering, the
//! transform pipeline and liveness indexing, glued together by the
//! [`compile_shader`] driver.
//!
//! The lexer/parser and the bytecode emitter are external collaborators,
//! reached through the [`Frontend`] and [`Emitter`] traits.

pub mod compiler;
pub mod error;
pub mod liveness;
pub mod lowering;
pub mod profile;
pub mod transform;

pub use compiler::{compile_shader, process_entry_function, Emitter, Frontend, ShaderArtifact};
pub use error::CodegenError;
pub use profile::{find_profile, ProfileInfo, ShaderKind};

use serde::{Deserialize, Serialize};

/// Shader source text: an opaque byte buffer plus its display label.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    pub code: &'a [u8],
    pub source_name: Option<&'a str>,
}

/// Host-provided compile options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Target profile string, e.g. `vs_4_0` or `ps_3_sw`.
    pub profile: String,
    /// Entry-point function name; `main` when absent.
    pub entry_point: Option<String>,
}

impl CompileOptions {
    pub fn new(profile: impl Into<String>) -> Self {
        CompileOptions {
            profile: profile.into(),
            entry_point: None,
        }
    }
}
