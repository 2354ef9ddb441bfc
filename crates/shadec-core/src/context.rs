//! The per-compile context.
//!
//! [`Context`] owns every heap object created during one compilation: types,
//! variables, IR nodes, function declarations and scopes all live in arenas
//! here and are freed together when the context is dropped. There is no
//! process-wide state; compiling on multiple threads just means one context
//! per thread.
//!
//! The external parser populates the context through the methods below
//! (scope push/pop, `add_var`, `add_type`, the `new_*` IR constructors,
//! `add_function`), then the middle end rewrites the entry function in
//! place. Diagnostics accumulate on the context and are drained by the
//! compile driver; emitting at error severity sets the sticky `failed`
//! flag.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::diag::{Diagnostic, ErrorCode, Severity, SourceLocation};
use crate::error::CoreError;
use crate::function::{Function, FunctionDecl, FunctionTable};
use crate::id::{DeclId, NodeId, ScopeId, VarId};
use crate::node::{Block, Deref, Expr, If, Load, Loop, Node, NodeKind, Store, Swizzle, Use};
use crate::ops::{ExprOp, JumpKind};
use crate::scope::{Scope, Variable};
use crate::type_id::{TypeId, TypeRegistry};
use crate::types::{ConstValue, Modifiers, ScalarBase};

/// Per-compile state. See the module docs.
pub struct Context {
    pub types: TypeRegistry,
    pub functions: FunctionTable,
    /// Instructions to splice in front of the entry body before lowering.
    pub static_initializers: Block,
    /// Default matrix majority applied by the parser; column-major unless a
    /// pragma overrides it.
    pub matrix_majority: Modifiers,
    vars: Vec<Variable>,
    nodes: Vec<Option<Node>>,
    decls: Vec<FunctionDecl>,
    scopes: Vec<Scope>,
    cur_scope: ScopeId,
    source_files: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    failed: bool,
}

impl Context {
    /// Creates a context with the predefined types installed in the globals
    /// scope.
    pub fn new() -> Self {
        let types = TypeRegistry::new();
        let mut globals = Scope::new(None);
        for (id, name) in types.named_types() {
            globals.add_type(name, id);
        }
        Context {
            types,
            functions: FunctionTable::new(),
            static_initializers: Block::new(),
            matrix_majority: Modifiers::COLUMN_MAJOR,
            vars: Vec::new(),
            nodes: Vec::new(),
            decls: Vec::new(),
            scopes: vec![globals],
            cur_scope: ScopeId(0),
            source_files: vec![String::new()],
            diagnostics: Vec::new(),
            failed: false,
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    pub fn note(&mut self, location: SourceLocation, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            location,
            severity: Severity::Note,
            code: None,
            message: message.into(),
        });
    }

    pub fn warning(
        &mut self,
        location: SourceLocation,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            location,
            severity: Severity::Warning,
            code: Some(code),
            message: message.into(),
        });
    }

    /// Reports an error and sets the sticky `failed` flag.
    pub fn error(
        &mut self,
        location: SourceLocation,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            location,
            severity: Severity::Error,
            code: Some(code),
            message: message.into(),
        });
        self.failed = true;
    }

    /// Whether an error has been reported. Once set, never cleared.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn set_failed(&mut self) {
        self.failed = true;
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // -----------------------------------------------------------------------
    // Source files
    // -----------------------------------------------------------------------

    /// Registers a source file name and returns its index for
    /// [`SourceLocation::file`](crate::diag::SourceLocation).
    pub fn add_source_file(&mut self, name: impl Into<String>) -> u32 {
        self.source_files.push(name.into());
        (self.source_files.len() - 1) as u32
    }

    pub fn source_file(&self, index: u32) -> Option<&str> {
        self.source_files.get(index as usize).map(String::as_str)
    }

    // -----------------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------------

    /// The globals scope, root of the scope tree.
    pub fn globals(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current_scope(&self) -> ScopeId {
        self.cur_scope
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// All scopes, in creation order.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Enters a new scope nested in the current one.
    pub fn push_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(Some(self.cur_scope)));
        self.cur_scope = id;
        id
    }

    /// Leaves the current scope. Popping the globals scope is a caller bug.
    pub fn pop_scope(&mut self) {
        let parent = self.scope(self.cur_scope).parent;
        assert!(parent.is_some(), "popped the globals scope");
        if let Some(parent) = parent {
            self.cur_scope = parent;
        }
    }

    // -----------------------------------------------------------------------
    // Variables
    // -----------------------------------------------------------------------

    /// Allocates a variable in the arena without attaching it to a scope.
    pub fn new_var(&mut self, var: Variable) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(var);
        id
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.0 as usize]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.vars[id.0 as usize]
    }

    /// Attaches a variable to a scope without collision checking. Used for
    /// compiler-synthesised variables whose names cannot collide.
    pub fn add_var_to_scope(&mut self, scope: ScopeId, var: VarId) {
        self.scope_mut(scope).vars.push(var);
    }

    /// Allocates a variable and attaches it to the globals scope.
    pub fn new_synthetic_var(
        &mut self,
        name: impl Into<String>,
        ty: TypeId,
        loc: SourceLocation,
    ) -> VarId {
        let id = self.new_var(Variable::new(name, ty, loc));
        self.add_var_to_scope(self.globals(), id);
        id
    }

    /// Adds `decl` to the current scope.
    ///
    /// The name must be free within the scope. When `local_var` is set and
    /// the current scope is the top block of a function body, the enclosing
    /// parameter scope is also checked, so locals cannot shadow parameters.
    pub fn add_var(&mut self, decl: VarId, local_var: bool) -> Result<(), CoreError> {
        let name = self.var(decl).name.clone();
        let scope = self.scope(self.cur_scope);
        if scope.vars.iter().any(|&v| self.var(v).name == name) {
            return Err(CoreError::VariableRedefined { name });
        }
        if local_var {
            if let Some(parent) = scope.parent {
                if self.scope(parent).parent == Some(self.globals())
                    && self
                        .scope(parent)
                        .vars
                        .iter()
                        .any(|&v| self.var(v).name == name)
                {
                    return Err(CoreError::ParameterShadowed { name });
                }
            }
        }
        self.scope_mut(self.cur_scope).vars.push(decl);
        Ok(())
    }

    /// Resolves a variable name, walking from the current scope upward.
    pub fn get_var(&self, name: &str) -> Option<VarId> {
        let mut scope = Some(self.cur_scope);
        while let Some(id) = scope {
            let s = self.scope(id);
            if let Some(&var) = s.vars.iter().find(|&&v| self.var(v).name == name) {
                return Some(var);
            }
            scope = s.parent;
        }
        None
    }

    // -----------------------------------------------------------------------
    // Named types in scopes
    // -----------------------------------------------------------------------

    /// Registers a named type in the current scope's type lookup.
    pub fn add_type(&mut self, ty: TypeId) -> Result<(), CoreError> {
        let name = match self.types[ty].name.clone() {
            Some(name) => name,
            None => return Err(CoreError::UnnamedType),
        };
        if !self.scope_mut(self.cur_scope).add_type(&name, ty) {
            return Err(CoreError::DuplicateTypeName { name });
        }
        Ok(())
    }

    /// Resolves a type name in the current scope, walking upward only when
    /// `recursive` is set.
    pub fn get_type(&self, name: &str, recursive: bool) -> Option<TypeId> {
        let mut scope = Some(self.cur_scope);
        while let Some(id) = scope {
            let s = self.scope(id);
            if let Some(ty) = s.get_type(name) {
                return Some(ty);
            }
            if !recursive {
                break;
            }
            scope = s.parent;
        }
        None
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.0 as usize]
            .as_ref()
            .expect("use of freed node")
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0 as usize]
            .as_mut()
            .expect("use of freed node")
    }

    pub fn node_is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.0 as usize)
            .map(Option::is_some)
            .unwrap_or(false)
    }

    /// Allocates a node and threads each of its source slots onto the
    /// referent's uses list.
    fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let srcs = node.kind.srcs();
        self.nodes.push(Some(node));
        for (slot, src) in srcs {
            self.node_mut(src).uses.push(Use { user: id, slot });
        }
        id
    }

    pub fn new_constant(&mut self, ty: TypeId, value: ConstValue, loc: SourceLocation) -> NodeId {
        self.alloc_node(Node::new(NodeKind::Constant(value), Some(ty), loc))
    }

    /// A scalar uint constant; the workhorse for register offsets.
    pub fn new_uint_constant(&mut self, value: u32, loc: SourceLocation) -> NodeId {
        let uint = self.types.scalar(ScalarBase::Uint);
        self.new_constant(uint, ConstValue::Uint([value, 0, 0, 0]), loc)
    }

    pub fn new_load(
        &mut self,
        var: VarId,
        offset: Option<NodeId>,
        ty: TypeId,
        loc: SourceLocation,
    ) -> NodeId {
        self.alloc_node(Node::new(
            NodeKind::Load(Load {
                src: Deref { var, offset },
            }),
            Some(ty),
            loc,
        ))
    }

    /// Loads a whole variable.
    pub fn new_var_load(&mut self, var: VarId, loc: SourceLocation) -> NodeId {
        let ty = self.var(var).data_type;
        self.new_load(var, None, ty, loc)
    }

    /// A store to `var` at `offset`. A zero writemask is auto-filled from
    /// the source's dimensions when the source fits a single register.
    pub fn new_store(
        &mut self,
        var: VarId,
        offset: Option<NodeId>,
        rhs: NodeId,
        mut writemask: u8,
        loc: SourceLocation,
    ) -> NodeId {
        if writemask == 0 {
            if let Some(rhs_ty) = self.node(rhs).data_type {
                let ty = &self.types[rhs_ty];
                if ty.is_single_reg() {
                    writemask = (1 << ty.dimx) - 1;
                }
            }
        }
        self.alloc_node(Node::new(
            NodeKind::Store(Store {
                lhs: Deref { var, offset },
                rhs,
                writemask,
            }),
            None,
            loc,
        ))
    }

    /// A whole-variable store.
    pub fn new_simple_store(&mut self, var: VarId, rhs: NodeId) -> NodeId {
        let loc = self.node(rhs).loc;
        self.new_store(var, None, rhs, 0, loc)
    }

    pub fn new_unary_expr(&mut self, op: ExprOp, arg: NodeId, loc: SourceLocation) -> NodeId {
        let ty = self.node(arg).data_type;
        self.alloc_node(Node::new(
            NodeKind::Expr(Expr {
                op,
                operands: [Some(arg), None, None],
            }),
            ty,
            loc,
        ))
    }

    /// A binary expression. Operand types must already agree; the parser
    /// inserts casts before building the expression.
    pub fn new_binary_expr(&mut self, op: ExprOp, arg1: NodeId, arg2: NodeId) -> NodeId {
        let (t1, t2) = (self.node(arg1).data_type, self.node(arg2).data_type);
        debug_assert!(matches!((t1, t2), (Some(a), Some(b)) if self.types.equal(a, b)));
        let loc = self.node(arg1).loc;
        self.alloc_node(Node::new(
            NodeKind::Expr(Expr {
                op,
                operands: [Some(arg1), Some(arg2), None],
            }),
            t1,
            loc,
        ))
    }

    /// A cast built as a unary expression whose result type is overridden.
    pub fn new_cast(&mut self, node: NodeId, ty: TypeId, loc: SourceLocation) -> NodeId {
        let cast = self.new_unary_expr(ExprOp::Cast, node, loc);
        self.node_mut(cast).data_type = Some(ty);
        cast
    }

    /// A component swizzle producing a `components`-wide vector of the
    /// source's base type.
    pub fn new_swizzle(
        &mut self,
        swizzle: u32,
        components: u32,
        val: NodeId,
        loc: SourceLocation,
    ) -> NodeId {
        let base = self
            .node(val)
            .data_type
            .and_then(|ty| self.types[ty].scalar_base())
            .unwrap_or(ScalarBase::Float);
        let ty = self.types.vector(base, components);
        self.alloc_node(Node::new(
            NodeKind::Swizzle(Swizzle { val, swizzle }),
            Some(ty),
            loc,
        ))
    }

    /// A conditional. The child blocks transfer ownership of their nodes to
    /// the new node.
    pub fn new_if(
        &mut self,
        condition: NodeId,
        then_block: Block,
        else_block: Block,
        loc: SourceLocation,
    ) -> NodeId {
        self.alloc_node(Node::new(
            NodeKind::If(If {
                condition,
                then_block,
                else_block,
            }),
            None,
            loc,
        ))
    }

    pub fn new_loop(&mut self, body: Block, loc: SourceLocation) -> NodeId {
        self.alloc_node(Node::new(
            NodeKind::Loop(Loop {
                body,
                next_index: 0,
            }),
            None,
            loc,
        ))
    }

    pub fn new_jump(&mut self, kind: JumpKind, loc: SourceLocation) -> NodeId {
        self.alloc_node(Node::new(NodeKind::Jump(kind), None, loc))
    }

    /// Rewires every use of the node at `pos` to `new`, unlinks it from the
    /// block and destroys it.
    pub fn replace_node(&mut self, block: &mut Block, pos: usize, new: NodeId) {
        let old = block.id_at(pos);
        let uses = std::mem::take(&mut self.node_mut(old).uses);
        for entry in &uses {
            self.node_mut(entry.user).kind.set_src(entry.slot, new);
        }
        self.node_mut(new).uses.extend(uses);
        block.remove(pos);
        self.free_node(old);
    }

    /// Unlinks the node at `pos` from the block and destroys it.
    pub fn remove_node(&mut self, block: &mut Block, pos: usize) {
        let id = block.remove(pos);
        self.free_node(id);
    }

    /// Destroys a node and, transitively, the nodes owned by its child
    /// blocks. Outbound source slots are severed from their referents' uses
    /// lists first. Iterative, so pathological nesting cannot overflow the
    /// stack.
    pub fn free_node(&mut self, id: NodeId) {
        let mut worklist = vec![id];
        while let Some(cursor) = worklist.pop() {
            let Some(node) = self.nodes[cursor.0 as usize].take() else {
                continue;
            };
            for (slot, src) in node.kind.srcs() {
                if let Some(referent) = self.nodes[src.0 as usize].as_mut() {
                    referent
                        .uses
                        .retain(|u| !(u.user == cursor && u.slot == slot));
                }
            }
            match node.kind {
                NodeKind::If(iff) => {
                    worklist.extend(iff.then_block.iter());
                    worklist.extend(iff.else_block.iter());
                }
                NodeKind::Loop(lp) => worklist.extend(lp.body.iter()),
                _ => {}
            }
        }
    }

    /// Destroys an instruction list and all nodes it owns.
    pub fn free_block(&mut self, block: Block) {
        for id in block.iter() {
            self.free_node(id);
        }
    }

    // -----------------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------------

    /// Creates a function declaration. A synthetic return variable is
    /// generated iff the return type is not void.
    pub fn new_func_decl(
        &mut self,
        return_type: TypeId,
        parameters: Vec<VarId>,
        semantic: Option<String>,
        loc: SourceLocation,
    ) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        let return_var = if self.types.is_void(return_type) {
            None
        } else {
            Some(self.new_synthetic_var(format!("<retval-{}>", id), return_type, loc))
        };
        self.decls.push(FunctionDecl {
            return_type,
            parameters,
            semantic,
            loc,
            return_var,
            body: None,
            func: None,
        });
        id
    }

    pub fn decl(&self, id: DeclId) -> &FunctionDecl {
        &self.decls[id.0 as usize]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut FunctionDecl {
        &mut self.decls[id.0 as usize]
    }

    pub fn set_decl_body(&mut self, id: DeclId, body: Block) {
        self.decl_mut(id).body = Some(body);
    }

    pub fn take_decl_body(&mut self, id: DeclId) -> Option<Block> {
        self.decl_mut(id).body.take()
    }

    /// Parameter-signature ordering between two declarations: parameter
    /// count first, then pairwise type comparison.
    pub fn compare_decl_params(&self, a: DeclId, b: DeclId) -> Ordering {
        let (pa, pb) = (&self.decl(a).parameters, &self.decl(b).parameters);
        let cmp = pa.len().cmp(&pb.len());
        if cmp != Ordering::Equal {
            return cmp;
        }
        for (&va, &vb) in pa.iter().zip(pb.iter()) {
            let cmp = self
                .types
                .compare_params(self.var(va).data_type, self.var(vb).data_type);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }

    /// Registers `decl` as an overload of `name`.
    ///
    /// Redeclaring a user-defined function as an intrinsic is rejected;
    /// redeclaring an intrinsic as user-defined clears the overload set and
    /// proceeds. A forward declaration never replaces an existing overload
    /// with the same signature; a definition evicts it.
    pub fn add_function(
        &mut self,
        name: &str,
        decl: DeclId,
        intrinsic: bool,
    ) -> Result<(), CoreError> {
        let Some(func_id) = self.functions.id_of(name) else {
            let func_id = self.functions.insert(Function {
                name: name.to_string(),
                intrinsic,
                overloads: vec![decl],
            });
            self.decl_mut(decl).func = Some(func_id);
            return Ok(());
        };

        let entry_intrinsic = self
            .functions
            .by_id(func_id)
            .map(|f| f.intrinsic)
            .unwrap_or(false);
        if intrinsic != entry_intrinsic {
            if intrinsic {
                return Err(CoreError::IntrinsicRedefinition {
                    name: name.to_string(),
                });
            }
            if let Some(func) = self.functions.get_mut(name) {
                func.intrinsic = false;
                func.overloads.clear();
            }
        }
        self.decl_mut(decl).func = Some(func_id);

        let overloads = match self.functions.get(name) {
            Some(func) => func.overloads.clone(),
            None => Vec::new(),
        };
        let slot = overloads.binary_search_by(|&existing| self.compare_decl_params(existing, decl));
        match slot {
            Ok(i) => {
                // A forward declaration cannot replace a defined overload or
                // a prior forward.
                if self.decl(decl).body.is_none() {
                    return Ok(());
                }
                if let Some(func) = self.functions.get_mut(name) {
                    func.overloads[i] = decl;
                }
            }
            Err(i) => {
                if let Some(func) = self.functions.get_mut(name) {
                    func.overloads.insert(i, decl);
                }
            }
        }
        Ok(())
    }

    /// The first overload registered under `name`, if any. Entry points are
    /// nullary, so this is how the driver resolves them.
    pub fn get_func_decl(&self, name: &str) -> Option<DeclId> {
        self.functions
            .get(name)
            .and_then(|func| func.overloads.first().copied())
    }

    // -----------------------------------------------------------------------
    // Consistency checking
    // -----------------------------------------------------------------------

    /// Verifies the use/def invariant over `body`: every source slot has a
    /// matching uses-list entry and vice versa, and no slot references a
    /// node outside the body's ownership tree. Panics on violation; meant
    /// for debug builds and tests.
    pub fn assert_use_def_consistency(&self, body: &Block) {
        let mut in_list: HashSet<NodeId> = HashSet::new();
        let mut stack: Vec<NodeId> = body.iter().collect();
        while let Some(id) = stack.pop() {
            in_list.insert(id);
            match &self.node(id).kind {
                NodeKind::If(iff) => {
                    stack.extend(iff.then_block.iter());
                    stack.extend(iff.else_block.iter());
                }
                NodeKind::Loop(lp) => stack.extend(lp.body.iter()),
                _ => {}
            }
        }

        for &id in &in_list {
            let node = self.node(id);
            for (slot, src) in node.kind.srcs() {
                assert!(
                    in_list.contains(&src),
                    "node {} slot {} references {} outside the body",
                    id,
                    slot,
                    src
                );
                let referent = self.node(src);
                assert!(
                    referent
                        .uses
                        .iter()
                        .any(|u| u.user == id && u.slot == slot),
                    "node {} missing uses entry for user {} slot {}",
                    src,
                    id,
                    slot
                );
            }
            for entry in &node.uses {
                assert!(
                    in_list.contains(&entry.user),
                    "node {} has a user {} outside the body",
                    id,
                    entry.user
                );
                let user = self.node(entry.user);
                assert!(
                    user.kind
                        .srcs()
                        .iter()
                        .any(|&(slot, src)| slot == entry.slot && src == id),
                    "uses entry on {} does not match a slot of {}",
                    id,
                    entry.user
                );
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKind;

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn predefined_types_resolve_in_globals() {
        let ctx = Context::new();
        for name in ["float", "float4", "float4x4", "uint", "bool3", "void", "sampler2D", "MATRIX"] {
            assert!(ctx.get_type(name, true).is_some(), "missing {}", name);
        }
        assert!(ctx.get_type("float5", true).is_none());
    }

    #[test]
    fn push_pop_restores_current_scope() {
        let mut ctx = Context::new();
        let before = ctx.current_scope();
        let inner = ctx.push_scope();
        assert_eq!(ctx.current_scope(), inner);
        ctx.pop_scope();
        assert_eq!(ctx.current_scope(), before);
    }

    #[test]
    fn add_var_rejects_duplicates_in_scope() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);
        ctx.push_scope();
        let a = ctx.new_var(Variable::new("x", float, loc()));
        let b = ctx.new_var(Variable::new("x", float, loc()));
        assert!(ctx.add_var(a, false).is_ok());
        assert!(matches!(
            ctx.add_var(b, false),
            Err(CoreError::VariableRedefined { .. })
        ));
    }

    #[test]
    fn local_cannot_shadow_parameter() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);
        // Parameter scope directly under globals, body scope under that.
        ctx.push_scope();
        let param = ctx.new_var(Variable::new("p", float, loc()));
        ctx.add_var(param, false).unwrap();
        ctx.push_scope();
        let local = ctx.new_var(Variable::new("p", float, loc()));
        assert!(matches!(
            ctx.add_var(local, true),
            Err(CoreError::ParameterShadowed { .. })
        ));
        // Without the local flag the declaration is accepted (e.g. globals).
        let other = ctx.new_var(Variable::new("p", float, loc()));
        assert!(ctx.add_var(other, false).is_ok());
    }

    #[test]
    fn get_var_walks_upward() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);
        let g = ctx.new_var(Variable::new("g", float, loc()));
        ctx.add_var(g, false).unwrap();
        ctx.push_scope();
        assert_eq!(ctx.get_var("g"), Some(g));
        assert_eq!(ctx.get_var("missing"), None);
    }

    #[test]
    fn type_lookup_respects_recursive_flag() {
        let mut ctx = Context::new();
        ctx.push_scope();
        assert!(ctx.get_type("float", false).is_none());
        assert!(ctx.get_type("float", true).is_some());
    }

    #[test]
    fn add_type_rejects_duplicates() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let s1 = ctx.types.new_struct_type(
            Some("S".into()),
            vec![crate::types::StructField::new("a", float4)],
        );
        let s2 = ctx.types.new_struct_type(
            Some("S".into()),
            vec![crate::types::StructField::new("a", float4)],
        );
        ctx.push_scope();
        assert!(ctx.add_type(s1).is_ok());
        assert!(matches!(
            ctx.add_type(s2),
            Err(CoreError::DuplicateTypeName { .. })
        ));
    }

    #[test]
    fn constructors_maintain_use_def_edges() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let var = ctx.new_synthetic_var("v", float4, loc());
        let load = ctx.new_var_load(var, loc());
        let store = ctx.new_simple_store(var, load);

        let uses = &ctx.node(load).uses;
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].user, store);
        assert_eq!(uses[0].slot, 0);
        // Auto-filled writemask for a float4 source.
        let NodeKind::Store(s) = &ctx.node(store).kind else {
            panic!("expected store");
        };
        assert_eq!(s.writemask, 0xf);
    }

    #[test]
    fn replace_node_rewires_uses() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let var = ctx.new_synthetic_var("v", float4, loc());
        let mut block = Block::new();
        let load = ctx.new_var_load(var, loc());
        block.push(load);
        let cast = ctx.new_cast(load, float4, loc());
        block.push(cast);
        let store = ctx.new_simple_store(var, cast);
        block.push(store);

        // Replace the cast with its source, as the cast-folding pass does.
        ctx.replace_node(&mut block, 1, load);

        assert!(!ctx.node_is_alive(cast));
        let NodeKind::Store(s) = &ctx.node(store).kind else {
            panic!("expected store");
        };
        assert_eq!(s.rhs, load);
        assert!(ctx.node(load).uses.iter().any(|u| u.user == store));
        ctx.assert_use_def_consistency(&block);
    }

    #[test]
    fn free_node_recurses_into_child_blocks() {
        let mut ctx = Context::new();
        let bool_ty = ctx.types.scalar(ScalarBase::Bool);
        let var = ctx.new_synthetic_var("c", bool_ty, loc());
        let cond = ctx.new_var_load(var, loc());
        let mut then_block = Block::new();
        let jump = ctx.new_jump(JumpKind::Discard, loc());
        then_block.push(jump);
        let iff = ctx.new_if(cond, then_block, Block::new(), loc());

        ctx.free_node(iff);
        assert!(!ctx.node_is_alive(iff));
        assert!(!ctx.node_is_alive(jump));
        // The condition is not owned by the if node and survives, with its
        // uses entry severed.
        assert!(ctx.node_is_alive(cond));
        assert!(ctx.node(cond).uses.is_empty());
    }

    #[test]
    fn func_decl_synthesizes_return_var_unless_void() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let void = ctx.types.void();
        let with_ret = ctx.new_func_decl(float4, vec![], Some("SV_Target".into()), loc());
        assert!(ctx.decl(with_ret).return_var.is_some());
        let void_decl = ctx.new_func_decl(void, vec![], None, loc());
        assert!(ctx.decl(void_decl).return_var.is_none());
    }

    #[test]
    fn overloads_keyed_by_parameter_types() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);
        let float4 = ctx.types.vector(ScalarBase::Float, 4);

        let p1 = ctx.new_var(Variable::new("x", float, loc()));
        let d1 = ctx.new_func_decl(float, vec![p1], None, loc());
        ctx.set_decl_body(d1, Block::new());
        ctx.add_function("f", d1, false).unwrap();

        let p2 = ctx.new_var(Variable::new("x", float4, loc()));
        let d2 = ctx.new_func_decl(float, vec![p2], None, loc());
        ctx.set_decl_body(d2, Block::new());
        ctx.add_function("f", d2, false).unwrap();

        assert_eq!(ctx.functions.get("f").unwrap().overloads.len(), 2);
    }

    #[test]
    fn scalar_and_vec1_share_an_overload_slot() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);
        let float1 = ctx.types.vector(ScalarBase::Float, 1);

        let p1 = ctx.new_var(Variable::new("x", float, loc()));
        let d1 = ctx.new_func_decl(float, vec![p1], None, loc());
        ctx.set_decl_body(d1, Block::new());
        ctx.add_function("f", d1, false).unwrap();

        let p2 = ctx.new_var(Variable::new("x", float1, loc()));
        let d2 = ctx.new_func_decl(float, vec![p2], None, loc());
        ctx.set_decl_body(d2, Block::new());
        ctx.add_function("f", d2, false).unwrap();

        let func = ctx.functions.get("f").unwrap();
        assert_eq!(func.overloads.len(), 1);
        // The definition evicted the earlier one.
        assert_eq!(func.overloads[0], d2);
    }

    #[test]
    fn forward_declaration_never_replaces() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);
        let p1 = ctx.new_var(Variable::new("x", float, loc()));
        let d1 = ctx.new_func_decl(float, vec![p1], None, loc());
        ctx.set_decl_body(d1, Block::new());
        ctx.add_function("f", d1, false).unwrap();

        let p2 = ctx.new_var(Variable::new("x", float, loc()));
        let d2 = ctx.new_func_decl(float, vec![p2], None, loc());
        // No body: a forward declaration.
        ctx.add_function("f", d2, false).unwrap();

        let func = ctx.functions.get("f").unwrap();
        assert_eq!(func.overloads, vec![d1]);
    }

    #[test]
    fn intrinsic_redeclaration_rules() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);

        let d1 = ctx.new_func_decl(float, vec![], None, loc());
        ctx.set_decl_body(d1, Block::new());
        ctx.add_function("dot", d1, true).unwrap();

        // Intrinsic redeclared as user-defined: overloads reset.
        let d2 = ctx.new_func_decl(float, vec![], None, loc());
        ctx.set_decl_body(d2, Block::new());
        ctx.add_function("dot", d2, false).unwrap();
        let func = ctx.functions.get("dot").unwrap();
        assert!(!func.intrinsic);
        assert_eq!(func.overloads, vec![d2]);

        // User function redeclared as intrinsic: rejected.
        let d3 = ctx.new_func_decl(float, vec![], None, loc());
        assert!(matches!(
            ctx.add_function("dot", d3, true),
            Err(CoreError::IntrinsicRedefinition { .. })
        ));
    }

    #[test]
    fn error_sets_sticky_failed() {
        let mut ctx = Context::new();
        assert!(!ctx.failed());
        ctx.warning(loc(), ErrorCode::Redefined, "only a warning");
        assert!(!ctx.failed());
        ctx.error(loc(), ErrorCode::NotDefined, "boom");
        assert!(ctx.failed());
        assert_eq!(ctx.diagnostics().len(), 2);
        let drained = ctx.take_diagnostics();
        assert_eq!(drained.len(), 2);
        assert!(ctx.failed());
    }

    #[test]
    fn source_file_table() {
        let mut ctx = Context::new();
        let idx = ctx.add_source_file("shader.hlsl");
        assert_eq!(ctx.source_file(idx), Some("shader.hlsl"));
        assert_eq!(ctx.source_file(0), Some(""));
    }

    #[test]
    fn swizzle_type_is_vector_of_source_base() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let var = ctx.new_synthetic_var("v", float4, loc());
        let load = ctx.new_var_load(var, loc());
        // .xy
        let swizzle = ctx.new_swizzle(0b0100, 2, load, loc());
        let ty = ctx.node(swizzle).data_type.unwrap();
        assert!(matches!(
            ctx.types[ty].kind,
            TypeKind::Vector { dimx: 2, .. }
        ));
    }
}
