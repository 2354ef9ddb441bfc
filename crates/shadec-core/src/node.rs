//! IR node definitions.
//!
//! Every node shares a header (kind payload, optional data type, source
//! location, liveness index, uses list) and lives in the context's node
//! arena. Instruction lists ([`Block`]) own their nodes: destroying a block
//! destroys its nodes, recursively through the child lists of `If` and
//! `Loop`.
//!
//! # Use/def invariant
//!
//! Each source slot inside a node is a back-edge: it holds the [`NodeId`] of
//! its referent *and* appears as a [`Use`] entry on that referent's uses
//! list. The two sides are kept synchronous by the context's wiring,
//! replacement and destruction operations; slots are relations, never
//! lifetime holders.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::diag::SourceLocation;
use crate::id::{NodeId, VarId};
use crate::ops::{ExprOp, JumpKind};
use crate::type_id::TypeId;
use crate::types::ConstValue;

/// A reverse use/def edge: `user`'s source slot `slot` refers to the node
/// carrying this entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Use {
    pub user: NodeId,
    pub slot: u8,
}

/// An ordered instruction list. The list exclusively owns its nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    ids: Vec<NodeId>,
}

impl Block {
    pub fn new() -> Self {
        Block::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn id_at(&self, pos: usize) -> NodeId {
        self.ids[pos]
    }

    pub fn push(&mut self, id: NodeId) {
        self.ids.push(id);
    }

    pub fn insert(&mut self, pos: usize, id: NodeId) {
        self.ids.insert(pos, id);
    }

    pub fn remove(&mut self, pos: usize) -> NodeId {
        self.ids.remove(pos)
    }

    /// Moves all of `other`'s instructions to the front, preserving their
    /// order.
    pub fn prepend(&mut self, other: Block) {
        let mut ids = other.ids;
        ids.append(&mut self.ids);
        self.ids = ids;
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids.iter().copied()
    }
}

/// A variable reference with an optional byte-offset expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deref {
    pub var: VarId,
    pub offset: Option<NodeId>,
}

/// Reads a variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub src: Deref,
}

/// Writes a variable through a writemask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub lhs: Deref,
    pub rhs: NodeId,
    pub writemask: u8,
}

/// A unary, binary or ternary operator over up to three sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub op: ExprOp,
    pub operands: [Option<NodeId>; 3],
}

/// Selects/permutes components of a source. Vector swizzles use 2 bits per
/// output component; matrix swizzles 4+4 bits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swizzle {
    pub val: NodeId,
    pub swizzle: u32,
}

/// Conditional with two child instruction lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct If {
    pub condition: NodeId,
    pub then_block: Block,
    pub else_block: Block,
}

/// Infinite loop; exits only via a jump in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    pub body: Block,
    /// First liveness index past the body, recorded by indexing.
    pub next_index: u32,
}

/// The tagged node payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeKind {
    Constant(ConstValue),
    Load(Load),
    Store(Store),
    Expr(Expr),
    Swizzle(Swizzle),
    If(If),
    Loop(Loop),
    Jump(JumpKind),
}

impl NodeKind {
    /// Collects this node's outbound source slots as `(slot, referent)`
    /// pairs, in slot order.
    pub fn srcs(&self) -> SmallVec<[(u8, NodeId); 3]> {
        let mut out = SmallVec::new();
        match self {
            NodeKind::Constant(_) | NodeKind::Jump(_) | NodeKind::Loop(_) => {}
            NodeKind::Load(load) => {
                if let Some(offset) = load.src.offset {
                    out.push((0, offset));
                }
            }
            NodeKind::Store(store) => {
                out.push((0, store.rhs));
                if let Some(offset) = store.lhs.offset {
                    out.push((1, offset));
                }
            }
            NodeKind::Expr(expr) => {
                for (i, operand) in expr.operands.iter().enumerate() {
                    if let Some(id) = operand {
                        out.push((i as u8, *id));
                    }
                }
            }
            NodeKind::Swizzle(swizzle) => out.push((0, swizzle.val)),
            NodeKind::If(iff) => out.push((0, iff.condition)),
        }
        out
    }

    /// Redirects source slot `slot` to `node`. The caller maintains the
    /// matching uses-list entries.
    pub fn set_src(&mut self, slot: u8, node: NodeId) {
        match self {
            NodeKind::Load(load) => {
                debug_assert_eq!(slot, 0);
                load.src.offset = Some(node);
            }
            NodeKind::Store(store) => match slot {
                0 => store.rhs = node,
                _ => store.lhs.offset = Some(node),
            },
            NodeKind::Expr(expr) => expr.operands[slot as usize] = Some(node),
            NodeKind::Swizzle(swizzle) => {
                debug_assert_eq!(slot, 0);
                swizzle.val = node;
            }
            NodeKind::If(iff) => {
                debug_assert_eq!(slot, 0);
                iff.condition = node;
            }
            NodeKind::Constant(_) | NodeKind::Jump(_) | NodeKind::Loop(_) => {
                debug_assert!(false, "node kind has no source slots")
            }
        }
    }

    /// Whether this node has an effect beyond producing a value. Nodes with
    /// side effects are never removed for having an empty uses list.
    pub fn has_side_effects(&self) -> bool {
        matches!(
            self,
            NodeKind::Store(_) | NodeKind::If(_) | NodeKind::Loop(_) | NodeKind::Jump(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "constant",
            NodeKind::Load(_) => "load",
            NodeKind::Store(_) => "store",
            NodeKind::Expr(_) => "expr",
            NodeKind::Swizzle(_) => "swizzle",
            NodeKind::If(_) => "if",
            NodeKind::Loop(_) => "loop",
            NodeKind::Jump(_) => "jump",
        }
    }
}

/// An IR node: shared header plus per-kind payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    /// Result type; `None` for control-flow nodes and stores.
    pub data_type: Option<TypeId>,
    pub loc: SourceLocation,
    /// Liveness index assigned by indexing; 0 means not yet indexed.
    pub index: u32,
    /// Index of the last instruction reading this node's value.
    pub last_read: u32,
    /// Source slots currently referring to this node.
    pub uses: SmallVec<[Use; 2]>,
}

impl Node {
    pub fn new(kind: NodeKind, data_type: Option<TypeId>, loc: SourceLocation) -> Self {
        Node {
            kind,
            data_type,
            loc,
            index: 0,
            last_read: 0,
            uses: SmallVec::new(),
        }
    }
}
