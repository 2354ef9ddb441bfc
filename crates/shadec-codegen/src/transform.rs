//! The transform pipeline: a generic fixed-point driver plus the rewrite
//! passes it applies to the entry body.
//!
//! A transform is a predicate over one instruction that may rewrite it or
//! splice neighbours into the containing block, reporting whether it made
//! progress. The driver recurses into the child lists of `If` and `Loop`
//! before visiting each node, and the caller re-invokes it until a whole
//! sweep reports no progress.

use shadec_core::{Block, ConstValue, Context, ExprOp, NodeKind};
use tracing::debug;

/// A rewrite predicate. Receives the containing block and the position of
/// the node under consideration; may mutate both.
pub type Transform = fn(&mut Context, &mut Block, usize) -> bool;

/// Applies `func` over `block`, children first. Returns whether any node
/// reported progress. When a node makes progress the same position is
/// revisited, since a rewrite usually leaves a different instruction there.
pub fn transform_block(ctx: &mut Context, block: &mut Block, func: Transform) -> bool {
    let mut progress = false;
    let mut i = 0;
    while i < block.len() {
        let id = block.id_at(i);

        let mut children: Option<(Block, Option<Block>)> = None;
        match &mut ctx.node_mut(id).kind {
            NodeKind::If(iff) => {
                children = Some((
                    std::mem::take(&mut iff.then_block),
                    Some(std::mem::take(&mut iff.else_block)),
                ));
            }
            NodeKind::Loop(lp) => {
                children = Some((std::mem::take(&mut lp.body), None));
            }
            _ => {}
        }
        if let Some((mut first, mut second)) = children {
            progress |= transform_block(ctx, &mut first, func);
            if let Some(block) = second.as_mut() {
                progress |= transform_block(ctx, block, func);
            }
            match &mut ctx.node_mut(id).kind {
                NodeKind::If(iff) => {
                    iff.then_block = first;
                    if let Some(else_block) = second {
                        iff.else_block = else_block;
                    }
                }
                NodeKind::Loop(lp) => lp.body = first,
                _ => {}
            }
        }

        if func(ctx, block, i) {
            progress = true;
        } else {
            i += 1;
        }
    }
    progress
}

/// Replaces a cast whose source and destination types are structurally
/// equal, or are both single-component values of the same base type, with
/// its source.
pub fn fold_redundant_casts(ctx: &mut Context, block: &mut Block, pos: usize) -> bool {
    let id = block.id_at(pos);
    let (src, src_ty, dst_ty) = {
        let node = ctx.node(id);
        let NodeKind::Expr(expr) = &node.kind else {
            return false;
        };
        if expr.op != ExprOp::Cast {
            return false;
        }
        let Some(src) = expr.operands[0] else {
            return false;
        };
        let (Some(src_ty), Some(dst_ty)) = (ctx.node(src).data_type, node.data_type) else {
            return false;
        };
        (src, src_ty, dst_ty)
    };

    let single_component_pair = {
        let (s, d) = (&ctx.types[src_ty], &ctx.types[dst_ty]);
        s.scalar_base().is_some()
            && s.scalar_base() == d.scalar_base()
            && s.is_vec1()
            && d.is_vec1()
    };
    if ctx.types.equal(src_ty, dst_ty) || single_component_pair {
        ctx.replace_node(block, pos, src);
        return true;
    }
    false
}

/// Expands a store whose right-hand side is a load of a struct into one
/// load/store pair per field, addressed at `base offset + reg_offset * 4`.
/// The original store is removed so that structs containing structs split
/// on a subsequent sweep. Structs never appear as sources of any
/// instruction other than loads and stores.
pub fn split_struct_copies(ctx: &mut Context, block: &mut Block, pos: usize) -> bool {
    let id = block.id_at(pos);
    let (lhs_var, lhs_offset, rhs) = {
        let NodeKind::Store(store) = &ctx.node(id).kind else {
            return false;
        };
        (store.lhs.var, store.lhs.offset, store.rhs)
    };
    let Some(rhs_ty) = ctx.node(rhs).data_type else {
        return false;
    };
    let fields = match &ctx.types[rhs_ty].kind {
        shadec_core::TypeKind::Struct { fields } => fields.clone(),
        _ => return false,
    };
    let NodeKind::Load(load) = &ctx.node(rhs).kind else {
        return false;
    };
    let (rhs_var, rhs_offset) = (load.src.var, load.src.offset);
    let loc = ctx.node(id).loc;

    let mut insert_at = pos;
    for field in &fields {
        let field_offset = ctx.new_uint_constant(field.reg_offset * 4, loc);
        block.insert(insert_at, field_offset);
        insert_at += 1;

        let src_offset = match rhs_offset {
            Some(base) => {
                let add = ctx.new_binary_expr(ExprOp::Add, base, field_offset);
                block.insert(insert_at, add);
                insert_at += 1;
                add
            }
            None => field_offset,
        };
        let field_load = ctx.new_load(rhs_var, Some(src_offset), field.ty, loc);
        block.insert(insert_at, field_load);
        insert_at += 1;

        let dst_offset = match lhs_offset {
            Some(base) => {
                let add = ctx.new_binary_expr(ExprOp::Add, base, field_offset);
                block.insert(insert_at, add);
                insert_at += 1;
                add
            }
            None => field_offset,
        };
        let field_store = ctx.new_store(lhs_var, Some(dst_offset), field_load, 0, loc);
        block.insert(insert_at, field_store);
        insert_at += 1;
    }

    // The original store now sits past the spliced copies.
    ctx.remove_node(block, insert_at);
    true
}

/// Replaces an expression whose operands are all constants with a constant
/// of the expression's type. Operators without a folding rule leave the
/// expression intact.
pub fn fold_constants(ctx: &mut Context, block: &mut Block, pos: usize) -> bool {
    let id = block.id_at(pos);
    let (op, operands, ty) = {
        let node = ctx.node(id);
        let NodeKind::Expr(expr) = &node.kind else {
            return false;
        };
        let Some(ty) = node.data_type else {
            return false;
        };
        (expr.op, expr.operands, ty)
    };

    let mut values: [Option<ConstValue>; 3] = [None, None, None];
    for (slot, operand) in operands.iter().enumerate() {
        if let Some(src) = operand {
            match &ctx.node(*src).kind {
                NodeKind::Constant(value) => values[slot] = Some(value.clone()),
                _ => return false,
            }
        }
    }
    let Some(arg1) = values[0].take() else {
        return false;
    };
    let arg2 = values[1].take();

    let dimx = ctx.types[ty].dimx as usize;
    let folded = match (&arg1, arg2.as_ref(), op) {
        (ConstValue::Uint(a), Some(ConstValue::Uint(b)), ExprOp::Add) => {
            let mut out = [0u32; 4];
            for (i, lane) in out.iter_mut().enumerate().take(dimx) {
                *lane = a[i].wrapping_add(b[i]);
            }
            Some(ConstValue::Uint(out))
        }
        (ConstValue::Uint(a), Some(ConstValue::Uint(b)), ExprOp::Mul) => {
            let mut out = [0u32; 4];
            for (i, lane) in out.iter_mut().enumerate().take(dimx) {
                *lane = a[i].wrapping_mul(b[i]);
            }
            Some(ConstValue::Uint(out))
        }
        _ => None,
    };
    let Some(value) = folded else {
        debug!(
            op = ?op,
            ty = %ctx.types.to_string(ty),
            "constant folding not implemented for this operator"
        );
        return false;
    };

    let loc = ctx.node(id).loc;
    let constant = ctx.new_constant(ty, value, loc);
    block.insert(pos, constant);
    ctx.replace_node(block, pos + 1, constant);
    true
}

/// Dead-code elimination step. Pure nodes with no uses are removed; a store
/// is removed when no instruction downstream reads its target variable.
/// Control flow is never removed. Relies on liveness having run.
pub fn dce(ctx: &mut Context, block: &mut Block, pos: usize) -> bool {
    let id = block.id_at(pos);
    let removable = {
        let node = ctx.node(id);
        match &node.kind {
            NodeKind::Constant(_)
            | NodeKind::Expr(_)
            | NodeKind::Load(_)
            | NodeKind::Swizzle(_) => node.uses.is_empty(),
            NodeKind::Store(store) => ctx.var(store.lhs.var).last_read < node.index,
            NodeKind::If(_) | NodeKind::Loop(_) | NodeKind::Jump(_) => false,
        }
    };
    if removable {
        ctx.remove_node(block, pos);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadec_core::{ScalarBase, SourceLocation, StructField, Variable};

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn redundant_cast_is_folded() {
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

        assert!(transform_block(&mut ctx, &mut block, fold_redundant_casts));
        assert_eq!(block.len(), 2);
        assert!(!ctx.node_is_alive(cast));
        // Fixed point: nothing further to fold.
        assert!(!transform_block(&mut ctx, &mut block, fold_redundant_casts));
        ctx.assert_use_def_consistency(&block);
    }

    #[test]
    fn scalar_to_vec1_cast_is_folded() {
        let mut ctx = Context::new();
        let float = ctx.types.scalar(ScalarBase::Float);
        let float1 = ctx.types.vector(ScalarBase::Float, 1);
        let var = ctx.new_synthetic_var("s", float, loc());
        let mut block = Block::new();
        let load = ctx.new_var_load(var, loc());
        block.push(load);
        let cast = ctx.new_cast(load, float1, loc());
        block.push(cast);
        let store = ctx.new_simple_store(var, cast);
        block.push(store);

        assert!(transform_block(&mut ctx, &mut block, fold_redundant_casts));
        assert!(!ctx.node_is_alive(cast));
    }

    #[test]
    fn mismatched_cast_is_kept() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let int4 = ctx.types.vector(ScalarBase::Int, 4);
        let var = ctx.new_synthetic_var("v", float4, loc());
        let mut block = Block::new();
        let load = ctx.new_var_load(var, loc());
        block.push(load);
        let cast = ctx.new_cast(load, int4, loc());
        block.push(cast);

        assert!(!transform_block(&mut ctx, &mut block, fold_redundant_casts));
        assert!(ctx.node_is_alive(cast));
    }

    #[test]
    fn struct_copy_splits_into_field_copies() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let s = ctx.types.new_struct_type(
            Some("S".into()),
            vec![
                StructField::new("a", float4),
                StructField::new("b", float4),
            ],
        );
        let src = ctx.new_synthetic_var("src", s, loc());
        let dst = ctx.new_synthetic_var("dst", s, loc());
        let mut block = Block::new();
        let load = ctx.new_var_load(src, loc());
        block.push(load);
        let store = ctx.new_simple_store(dst, load);
        block.push(store);

        assert!(transform_block(&mut ctx, &mut block, split_struct_copies));
        assert!(!ctx.node_is_alive(store));

        // No store has a struct-typed right-hand side any more.
        for id in block.iter() {
            if let NodeKind::Store(store) = &ctx.node(id).kind {
                let ty = ctx.node(store.rhs).data_type.unwrap();
                assert!(!matches!(
                    ctx.types[ty].kind,
                    shadec_core::TypeKind::Struct { .. }
                ));
            }
        }
        // Two field copies: offsets 0 and reg_size(a) * 4 = 4.
        let offsets: Vec<u32> = block
            .iter()
            .filter_map(|id| match &ctx.node(id).kind {
                NodeKind::Constant(ConstValue::Uint(u)) => Some(u[0]),
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![0, 4]);
        ctx.assert_use_def_consistency(&block);
    }

    #[test]
    fn uint_add_and_mul_fold() {
        let mut ctx = Context::new();
        let mut block = Block::new();
        let a = ctx.new_uint_constant(6, loc());
        block.push(a);
        let b = ctx.new_uint_constant(7, loc());
        block.push(b);
        let mul = ctx.new_binary_expr(ExprOp::Mul, a, b);
        block.push(mul);
        let uint = ctx.types.scalar(ScalarBase::Uint);
        let var = ctx.new_synthetic_var("n", uint, loc());
        let store = ctx.new_simple_store(var, mul);
        block.push(store);

        assert!(transform_block(&mut ctx, &mut block, fold_constants));
        let NodeKind::Store(store) = &ctx.node(store).kind else {
            panic!("expected store");
        };
        let NodeKind::Constant(ConstValue::Uint(folded)) = &ctx.node(store.rhs).kind else {
            panic!("expected folded constant");
        };
        assert_eq!(folded[0], 42);
        ctx.assert_use_def_consistency(&block);
    }

    #[test]
    fn unsupported_fold_leaves_expression() {
        let mut ctx = Context::new();
        let mut block = Block::new();
        let a = ctx.new_uint_constant(8, loc());
        block.push(a);
        let b = ctx.new_uint_constant(2, loc());
        block.push(b);
        let div = ctx.new_binary_expr(ExprOp::Div, a, b);
        block.push(div);

        assert!(!transform_block(&mut ctx, &mut block, fold_constants));
        assert!(ctx.node_is_alive(div));
    }

    #[test]
    fn transform_recurses_into_if_blocks() {
        let mut ctx = Context::new();
        let bool_ty = ctx.types.scalar(ScalarBase::Bool);
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let cvar = ctx.new_synthetic_var("c", bool_ty, loc());
        let var = ctx.new_synthetic_var("v", float4, loc());

        let cond = ctx.new_var_load(cvar, loc());
        let mut then_block = Block::new();
        let load = ctx.new_var_load(var, loc());
        then_block.push(load);
        let cast = ctx.new_cast(load, float4, loc());
        then_block.push(cast);
        let store = ctx.new_simple_store(var, cast);
        then_block.push(store);

        let mut block = Block::new();
        block.push(cond);
        let iff = ctx.new_if(cond, then_block, Block::new(), loc());
        block.push(iff);

        assert!(transform_block(&mut ctx, &mut block, fold_redundant_casts));
        assert!(!ctx.node_is_alive(cast));
        ctx.assert_use_def_consistency(&block);
    }
}
