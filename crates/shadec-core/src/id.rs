//! Stable ID newtypes for context-owned entities.
//!
//! All IDs are distinct newtype wrappers over `u32`, providing type safety
//! so that a `VarId` cannot be accidentally used where a `NodeId` is
//! expected. Each ID indexes an arena owned by the
//! [`Context`](crate::context::Context).

use std::fmt;

use serde::{Deserialize, Serialize};

/// IR node identifier. Indexes the context's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Variable identifier. Indexes the context's variable arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub u32);

/// Scope identifier. Indexes the context's scope arena; `ScopeId(0)` is
/// always the globals scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

/// Function declaration (overload) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclId(pub u32);

/// Function entry identifier within the function table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", NodeId(7)), "7");
        assert_eq!(format!("{}", VarId(0)), "0");
        assert_eq!(format!("{}", DeclId(42)), "42");
    }

    #[test]
    fn id_types_are_distinct() {
        // Same inner value, different types; a compile-time guarantee.
        let node = NodeId(1);
        let var = VarId(1);
        assert_eq!(node.0, var.0);
    }

    #[test]
    fn serde_roundtrip() {
        let id = NodeId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
