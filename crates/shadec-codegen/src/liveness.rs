//! Liveness indexing and analysis.
//!
//! Indexing walks the entry body depth-first and assigns a strictly
//! increasing index to every instruction, starting from 2 (0 means unused,
//! 1 means function entry). The index space is continuous across nested
//! blocks; each loop records the first index past its body.
//!
//! Liveness then computes, per variable, the index of its first write and
//! last read. A variable accessed inside a loop has its range extended to
//! the whole loop, since the value may cross iterations. Anonymous nodes
//! need no such extension: a node computed in an earlier iteration cannot
//! be referenced in a later one.

use shadec_core::{Block, Context, DeclId, NodeKind, VarId};

/// Indexes `body` and recomputes every variable's `first_write`/`last_read`
/// range.
pub fn compute_liveness(ctx: &mut Context, entry: DeclId, body: &Block) {
    index_block(ctx, body, 2);

    let all_vars: Vec<VarId> = ctx
        .scopes()
        .flat_map(|scope| scope.vars.iter().copied())
        .collect();
    for var in all_vars {
        let v = ctx.var_mut(var);
        v.first_write = 0;
        v.last_read = 0;
    }

    let globals: Vec<VarId> = ctx.scope(ctx.globals()).vars.clone();
    for var in globals {
        let v = ctx.var_mut(var);
        if v.is_uniform || v.is_input_varying {
            v.first_write = 1;
        } else if v.is_output_varying {
            v.last_read = u32::MAX;
        }
    }

    let params = ctx.decl(entry).parameters.clone();
    for var in params {
        ctx.var_mut(var).first_write = 1;
    }
    if let Some(ret) = ctx.decl(entry).return_var {
        ctx.var_mut(ret).last_read = u32::MAX;
    }

    mark_block(ctx, body, 0, 0);
}

/// Assigns a unique, ordered index to each instruction. Returns the next
/// free index.
fn index_block(ctx: &mut Context, block: &Block, mut index: u32) -> u32 {
    for id in block.iter() {
        ctx.node_mut(id).index = index;
        index += 1;

        let children: Option<(Block, Option<Block>)> = match &ctx.node(id).kind {
            NodeKind::If(iff) => Some((iff.then_block.clone(), Some(iff.else_block.clone()))),
            NodeKind::Loop(lp) => Some((lp.body.clone(), None)),
            _ => None,
        };
        if let Some((first, second)) = children {
            index = index_block(ctx, &first, index);
            match second {
                Some(else_block) => index = index_block(ctx, &else_block, index),
                None => {
                    if let NodeKind::Loop(lp) = &mut ctx.node_mut(id).kind {
                        lp.next_index = index;
                    }
                }
            }
        }
    }
    index
}

/// Walks a block marking variable and node liveness. Inside a loop,
/// `loop_first`/`loop_last` carry the enclosing loop's bounds (0 when not
/// in a loop) so accesses extend across iterations.
fn mark_block(ctx: &mut Context, block: &Block, loop_first: u32, loop_last: u32) {
    for id in block.iter() {
        let index = ctx.node(id).index;
        match ctx.node(id).kind.clone() {
            NodeKind::Store(store) => {
                let v = ctx.var_mut(store.lhs.var);
                if v.first_write == 0 {
                    v.first_write = if loop_first != 0 {
                        index.min(loop_first)
                    } else {
                        index
                    };
                }
                ctx.node_mut(store.rhs).last_read = index;
                if let Some(offset) = store.lhs.offset {
                    ctx.node_mut(offset).last_read = index;
                }
            }
            NodeKind::Load(load) => {
                let bound = if loop_last != 0 {
                    index.max(loop_last)
                } else {
                    index
                };
                let v = ctx.var_mut(load.src.var);
                v.last_read = v.last_read.max(bound);
                if let Some(offset) = load.src.offset {
                    ctx.node_mut(offset).last_read = index;
                }
            }
            NodeKind::Expr(expr) => {
                for operand in expr.operands.into_iter().flatten() {
                    ctx.node_mut(operand).last_read = index;
                }
            }
            NodeKind::Swizzle(swizzle) => {
                ctx.node_mut(swizzle.val).last_read = index;
            }
            NodeKind::If(iff) => {
                mark_block(ctx, &iff.then_block, loop_first, loop_last);
                mark_block(ctx, &iff.else_block, loop_first, loop_last);
                ctx.node_mut(iff.condition).last_read = index;
            }
            NodeKind::Loop(lp) => {
                let first = if loop_first != 0 { loop_first } else { index };
                let last = if loop_last != 0 { loop_last } else { lp.next_index };
                mark_block(ctx, &lp.body, first, last);
            }
            NodeKind::Constant(_) | NodeKind::Jump(_) => {}
        }
    }
}
