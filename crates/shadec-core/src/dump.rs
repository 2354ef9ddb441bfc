//! Textual IR dumping for debugging and trace logging.
//!
//! The format is line-oriented: one instruction per line, prefixed by its
//! liveness index (or the raw arena id before indexing) and its data type.
//! Sources print as `@index` once indexed, `%id` before that.

use std::fmt::Write;

use crate::context::Context;
use crate::id::{DeclId, NodeId, VarId};
use crate::node::{Block, Deref, NodeKind};
use crate::ops::{writemask_str, WRITEMASK_ALL};
use crate::types::{ConstValue, Modifiers};

/// Renders modifier bits in source order.
pub fn modifiers_string(modifiers: Modifiers) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if modifiers.contains(Modifiers::EXTERN) {
        parts.push("extern");
    }
    if modifiers.contains(Modifiers::NOINTERPOLATION) {
        parts.push("nointerpolation");
    }
    if modifiers.contains(Modifiers::PRECISE) {
        parts.push("precise");
    }
    if modifiers.contains(Modifiers::SHARED) {
        parts.push("shared");
    }
    if modifiers.contains(Modifiers::GROUPSHARED) {
        parts.push("groupshared");
    }
    if modifiers.contains(Modifiers::STATIC) {
        parts.push("static");
    }
    if modifiers.contains(Modifiers::UNIFORM) {
        parts.push("uniform");
    }
    if modifiers.contains(Modifiers::VOLATILE) {
        parts.push("volatile");
    }
    if modifiers.contains(Modifiers::CONST) {
        parts.push("const");
    }
    if modifiers.contains(Modifiers::ROW_MAJOR) {
        parts.push("row_major");
    }
    if modifiers.contains(Modifiers::COLUMN_MAJOR) {
        parts.push("column_major");
    }
    if modifiers.contains(Modifiers::IN | Modifiers::OUT) {
        parts.push("inout");
    } else if modifiers.contains(Modifiers::IN) {
        parts.push("in");
    } else if modifiers.contains(Modifiers::OUT) {
        parts.push("out");
    }
    parts.join(" ")
}

/// Dumps a function declaration: parameters, return semantic, body.
pub fn dump_function(ctx: &Context, decl_id: DeclId) -> String {
    let mut out = String::new();
    let decl = ctx.decl(decl_id);
    let name = decl
        .func
        .and_then(|id| ctx.functions.by_id(id))
        .map(|f| f.name.as_str())
        .unwrap_or("<anonymous>");
    let _ = writeln!(out, "Dumping function {}.", name);
    let _ = writeln!(out, "Function parameters:");
    for &param in &decl.parameters {
        dump_var(ctx, &mut out, param);
        out.push('\n');
    }
    if let Some(semantic) = &decl.semantic {
        let _ = writeln!(out, "Function semantic: {}", semantic);
    }
    if let Some(body) = &decl.body {
        dump_block(ctx, &mut out, body);
    }
    out
}

fn dump_var(ctx: &Context, out: &mut String, var: VarId) {
    let v = ctx.var(var);
    if !v.modifiers.is_empty() {
        let _ = write!(out, "{} ", modifiers_string(v.modifiers));
    }
    let _ = write!(out, "{} {}", ctx.types.to_string(v.data_type), v.name);
    if let Some(semantic) = &v.semantic {
        let _ = write!(out, " : {}", semantic);
    }
}

fn dump_block(ctx: &Context, out: &mut String, block: &Block) {
    for id in block.iter() {
        dump_node(ctx, out, id);
        out.push('\n');
    }
}

fn dump_src(ctx: &Context, out: &mut String, id: NodeId) {
    let node = ctx.node(id);
    if node.index != 0 {
        let _ = write!(out, "@{}", node.index);
    } else {
        let _ = write!(out, "%{}", id);
    }
}

fn dump_deref(ctx: &Context, out: &mut String, deref: &Deref) {
    let _ = write!(out, "{}", ctx.var(deref.var).name);
    if let Some(offset) = deref.offset {
        out.push('[');
        dump_src(ctx, out, offset);
        out.push(']');
    }
}

fn dump_const(out: &mut String, value: &ConstValue, dimx: u32) {
    if dimx != 1 {
        out.push('{');
    }
    for x in 0..dimx as usize {
        match value {
            ConstValue::Bool(b) => {
                let _ = write!(out, "{} ", if b[x] { "true" } else { "false" });
            }
            ConstValue::Double(d) => {
                let _ = write!(out, "{:.16e} ", d[x]);
            }
            ConstValue::Float(f) | ConstValue::Half(f) => {
                let _ = write!(out, "{:.8e} ", f[x]);
            }
            ConstValue::Int(i) => {
                let _ = write!(out, "{} ", i[x]);
            }
            ConstValue::Uint(u) => {
                let _ = write!(out, "{} ", u[x]);
            }
        }
    }
    if dimx != 1 {
        out.push('}');
    }
}

fn dump_node(ctx: &Context, out: &mut String, id: NodeId) {
    let node = ctx.node(id);
    if node.index != 0 {
        let _ = write!(out, "{:4}: ", node.index);
    } else {
        let _ = write!(out, "%{:3}: ", id);
    }
    let ty = node
        .data_type
        .map(|t| ctx.types.to_string(t))
        .unwrap_or_default();
    let _ = write!(out, "{:>10} | ", ty);

    match &node.kind {
        NodeKind::Constant(value) => {
            let dimx = node.data_type.map(|t| ctx.types[t].dimx).unwrap_or(1);
            dump_const(out, value, dimx);
        }
        NodeKind::Load(load) => dump_deref(ctx, out, &load.src),
        NodeKind::Store(store) => {
            out.push_str("= (");
            dump_deref(ctx, out, &store.lhs);
            if store.writemask != WRITEMASK_ALL {
                out.push_str(&writemask_str(store.writemask));
            }
            out.push(' ');
            dump_src(ctx, out, store.rhs);
            out.push(')');
        }
        NodeKind::Expr(expr) => {
            let _ = write!(out, "{} (", expr.op.symbol());
            for operand in expr.operands.iter().flatten() {
                dump_src(ctx, out, *operand);
                out.push(' ');
            }
            out.push(')');
        }
        NodeKind::Swizzle(swizzle) => {
            dump_src(ctx, out, swizzle.val);
            out.push('.');
            let components = node.data_type.map(|t| ctx.types[t].dimx).unwrap_or(0);
            let src_dimy = ctx
                .node(swizzle.val)
                .data_type
                .map(|t| ctx.types[t].dimy)
                .unwrap_or(1);
            if src_dimy > 1 {
                for i in 0..components {
                    let _ = write!(
                        out,
                        "_m{}{}",
                        (swizzle.swizzle >> (i * 8)) & 0xf,
                        (swizzle.swizzle >> (i * 8 + 4)) & 0xf
                    );
                }
            } else {
                const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];
                for i in 0..components {
                    out.push(COMPONENTS[((swizzle.swizzle >> (i * 2)) & 0x3) as usize]);
                }
            }
        }
        NodeKind::If(iff) => {
            out.push_str("if (");
            dump_src(ctx, out, iff.condition);
            out.push_str(")\n{\n");
            dump_block(ctx, out, &iff.then_block);
            out.push_str("}\nelse\n{\n");
            dump_block(ctx, out, &iff.else_block);
            out.push_str("}\n");
        }
        NodeKind::Loop(lp) => {
            out.push_str("for (;;)\n{\n");
            dump_block(ctx, out, &lp.body);
            out.push_str("}\n");
        }
        NodeKind::Jump(kind) => out.push_str(kind.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::SourceLocation;
    use crate::scope::Variable;
    use crate::types::ScalarBase;

    #[test]
    fn modifier_rendering() {
        assert_eq!(
            modifiers_string(Modifiers::STATIC | Modifiers::CONST),
            "static const"
        );
        assert_eq!(
            modifiers_string(Modifiers::IN | Modifiers::OUT),
            "inout"
        );
        assert_eq!(modifiers_string(Modifiers::empty()), "");
    }

    #[test]
    fn dump_contains_stores_and_constants() {
        let mut ctx = Context::new();
        let loc = SourceLocation::default();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let var = ctx.new_var(Variable::new("color", float4, loc).with_semantic("COLOR0"));
        let decl = ctx.new_func_decl(float4, vec![var], Some("SV_Target".into()), loc);
        ctx.add_function("main", decl, false).unwrap();

        let mut body = Block::new();
        let c = ctx.new_constant(
            float4,
            ConstValue::Float([0.0, 0.25, 0.5, 1.0]),
            loc,
        );
        body.push(c);
        let store = ctx.new_simple_store(var, c);
        body.push(store);
        ctx.set_decl_body(decl, body);

        let text = dump_function(&ctx, decl);
        assert!(text.contains("Dumping function main."));
        assert!(text.contains("Function semantic: SV_Target"));
        assert!(text.contains("color"));
        assert!(text.contains("= ("));
        assert!(text.contains('{'));
    }

    #[test]
    fn vector_swizzle_spelling() {
        let mut ctx = Context::new();
        let loc = SourceLocation::default();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let var = ctx.new_synthetic_var("v", float4, loc);
        let decl = ctx.new_func_decl(float4, vec![], None, loc);
        ctx.add_function("f", decl, false).unwrap();

        let mut body = Block::new();
        let load = ctx.new_var_load(var, loc);
        body.push(load);
        // .wzyx = components 3,2,1,0.
        let swizzle = ctx.new_swizzle(0b00_01_10_11, 4, load, loc);
        body.push(swizzle);
        ctx.set_decl_body(decl, body);

        let text = dump_function(&ctx, decl);
        assert!(text.contains(".wzyx"), "dump was: {}", text);
    }
}
