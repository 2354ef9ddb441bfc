pub mod context;
pub mod diag;
pub mod dump;
pub mod error;
pub mod function;
pub mod id;
pub mod node;
pub mod ops;
pub mod scope;
pub mod type_id;
pub mod types;

// Re-export commonly used types
pub use context::Context;
pub use diag::{CollectingSink, Diagnostic, DiagnosticSink, ErrorCode, Severity, SourceLocation};
pub use error::CoreError;
pub use function::{Function, FunctionDecl, FunctionTable};
pub use id::{DeclId, FunctionId, NodeId, ScopeId, VarId};
pub use node::{Block, Deref, Expr, If, Load, Loop, Node, NodeKind, Store, Swizzle, Use};
pub use ops::{writemask_str, ExprOp, JumpKind, WRITEMASK_ALL};
pub use scope::{RegisterReservation, Scope, Variable};
pub use type_id::{BuiltinTypes, TypeId, TypeRegistry};
pub use types::{
    ConstValue, Modifiers, ObjectKind, SamplerDim, ScalarBase, StructField, Type, TypeKind,
};
