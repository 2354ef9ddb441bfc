//! Lexical scopes and variables.
//!
//! Scopes form a tree rooted at the globals scope. Each scope holds an
//! ordered list of variables and a name-keyed lookup for named types. Name
//! resolution for variables always walks upward; for types it walks upward
//! only when the caller requests recursive search.
//!
//! Variables are owned by the scope that contains them and freed with the
//! context.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diag::SourceLocation;
use crate::id::{ScopeId, VarId};
use crate::type_id::TypeId;
use crate::types::Modifiers;

/// An explicit register binding from the source, e.g. `register(c12)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterReservation {
    /// Register file letter (`c`, `s`, ...).
    pub class: char,
    pub index: u32,
}

/// A named storage location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub data_type: TypeId,
    pub loc: SourceLocation,
    pub semantic: Option<String>,
    pub modifiers: Modifiers,
    pub reg_reservation: Option<RegisterReservation>,
    /// Set during lowering: this variable shadows a constant-bank resource.
    pub is_uniform: bool,
    /// Set during lowering: this variable is bound to an input semantic.
    pub is_input_varying: bool,
    /// Set during lowering: this variable is bound to an output semantic.
    pub is_output_varying: bool,
    /// Liveness: index of the first write, 0 when never written. Uniforms,
    /// input varyings and entry parameters are seeded with 1 (function
    /// entry).
    pub first_write: u32,
    /// Liveness: index of the last read, 0 when never read, `u32::MAX` when
    /// the value reaches the end of the shader (output varyings).
    pub last_read: u32,
}

impl Variable {
    pub fn new(name: impl Into<String>, data_type: TypeId, loc: SourceLocation) -> Self {
        Variable {
            name: name.into(),
            data_type,
            loc,
            semantic: None,
            modifiers: Modifiers::empty(),
            reg_reservation: None,
            is_uniform: false,
            is_input_varying: false,
            is_output_varying: false,
            first_write: 0,
            last_read: 0,
        }
    }

    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = Some(semantic.into());
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// One level of the scope tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    /// Variables in declaration order.
    pub vars: Vec<VarId>,
    /// Named types registered in this scope.
    types: IndexMap<String, TypeId>,
    /// Enclosing scope; `None` for globals.
    pub parent: Option<ScopeId>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Scope {
            vars: Vec::new(),
            types: IndexMap::new(),
            parent,
        }
    }

    /// Registers a named type in this scope. Returns `false` when the name
    /// is already taken.
    pub fn add_type(&mut self, name: &str, ty: TypeId) -> bool {
        if self.types.contains_key(name) {
            return false;
        }
        self.types.insert(name.to_string(), ty);
        true
    }

    /// Looks up a type name in this scope only.
    pub fn get_type(&self, name: &str) -> Option<TypeId> {
        self.types.get(name).copied()
    }
}
