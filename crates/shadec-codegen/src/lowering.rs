//! Entry-point lowering.
//!
//! Runs once before the transform pipeline. Uniforms, input varyings and
//! output varyings are materialised as explicit loads/stores between
//! register-class shadow variables (`<uniform-$name>`, `<input-$semantic>`,
//! `<output-$semantic>`, attached to the globals scope) and the original
//! variables, which become plain temporaries. Struct parameters are walked
//! leaf by leaf at byte offset `reg_offset * 4`; a leaf without a semantic
//! is an error.

use shadec_core::{
    Block, Context, DeclId, ErrorCode, Modifiers, StructField, TypeId, TypeKind, VarId, Variable,
};

/// Rewrites the entry function's body so the I/O contract is explicit.
///
/// Order matters: static initializers are spliced to the front, then
/// uniform copies for globals and parameters are prepended, input copies
/// prepended and output copies appended, and finally the synthetic return
/// variable is written out against the function's return semantic.
pub fn lower_entry_point(ctx: &mut Context, entry: DeclId, body: &mut Block) {
    body.prepend(std::mem::take(&mut ctx.static_initializers));

    mark_entry_point_io(ctx, entry);

    let globals: Vec<VarId> = ctx.scope(ctx.globals()).vars.clone();
    for var in globals {
        if ctx.var(var).is_uniform {
            prepend_uniform_copy(ctx, body, var);
        }
    }

    let params = ctx.decl(entry).parameters.clone();
    for var in params {
        if ctx.var(var).is_uniform {
            prepend_uniform_copy(ctx, body, var);
        }
        if ctx.var(var).is_input_varying {
            prepend_input_var_copy(ctx, body, var);
        }
        if ctx.var(var).is_output_varying {
            append_output_var_copy(ctx, body, var, None);
        }
    }

    if let Some(ret) = ctx.decl(entry).return_var {
        let semantic = ctx.decl(entry).semantic.clone();
        append_output_var_copy(ctx, body, ret, semantic.as_deref());
    }
}

/// Derives the I/O roles from declared storage classes: a global declared
/// extern or uniform (and not static) shadows the constant bank; entry
/// parameters split into uniforms, input varyings and output varyings by
/// their `uniform`/`in`/`out` bits, with `inout` producing both.
fn mark_entry_point_io(ctx: &mut Context, entry: DeclId) {
    let globals: Vec<VarId> = ctx.scope(ctx.globals()).vars.clone();
    for var in globals {
        let v = ctx.var(var);
        if v.modifiers.intersects(Modifiers::UNIFORM | Modifiers::EXTERN)
            && !v.modifiers.contains(Modifiers::STATIC)
        {
            ctx.var_mut(var).is_uniform = true;
        }
    }

    let params = ctx.decl(entry).parameters.clone();
    for var in params {
        let modifiers = ctx.var(var).modifiers;
        let v = ctx.var_mut(var);
        if modifiers.contains(Modifiers::UNIFORM) {
            v.is_uniform = true;
        } else {
            if modifiers.contains(Modifiers::OUT) {
                v.is_output_varying = true;
            }
            if modifiers.contains(Modifiers::IN) || !modifiers.contains(Modifiers::OUT) {
                v.is_input_varying = true;
            }
        }
    }
}

/// Splits a uniform into two variables representing the constant and temp
/// registers, and copies the former to the latter, so that writes to
/// uniforms work.
fn prepend_uniform_copy(ctx: &mut Context, body: &mut Block, var: VarId) {
    let (name, ty, loc, reservation) = {
        let v = ctx.var(var);
        (
            format!("<uniform-{}>", v.name),
            v.data_type,
            v.loc,
            v.reg_reservation,
        )
    };
    let shadow = ctx.new_var(Variable::new(name, ty, loc));
    ctx.var_mut(shadow).reg_reservation = reservation;
    ctx.var_mut(shadow).is_uniform = true;
    ctx.add_var_to_scope(ctx.globals(), shadow);
    ctx.var_mut(var).is_uniform = false;

    let load = ctx.new_var_load(shadow, loc);
    body.insert(0, load);
    let store = ctx.new_simple_store(var, load);
    body.insert(1, store);
}

fn struct_fields(ctx: &Context, ty: TypeId) -> Option<Vec<StructField>> {
    match &ctx.types[ty].kind {
        TypeKind::Struct { fields } => Some(fields.clone()),
        _ => None,
    }
}

/// Splits an input varying into the varying register and a writable temp,
/// copying the former into the latter at the head of the body.
fn prepend_input_var_copy(ctx: &mut Context, body: &mut Block, var: VarId) {
    let ty = ctx.var(var).data_type;
    if let Some(fields) = struct_fields(ctx, ty) {
        prepend_input_struct_copy(ctx, body, var, &fields, 0);
    } else if let Some(semantic) = ctx.var(var).semantic.clone() {
        prepend_input_copy(ctx, body, var, ty, 0, &semantic);
    }
    ctx.var_mut(var).is_input_varying = false;
}

fn prepend_input_struct_copy(
    ctx: &mut Context,
    body: &mut Block,
    var: VarId,
    fields: &[StructField],
    field_offset: u32,
) {
    for field in fields {
        if let Some(inner) = struct_fields(ctx, field.ty) {
            prepend_input_struct_copy(ctx, body, var, &inner, field_offset + field.reg_offset);
        } else if let Some(semantic) = &field.semantic {
            prepend_input_copy(
                ctx,
                body,
                var,
                field.ty,
                field_offset + field.reg_offset,
                semantic,
            );
        } else {
            ctx.error(
                field.loc,
                ErrorCode::MissingSemantic,
                format!("Field '{}' is missing a semantic.", field.name),
            );
        }
    }
}

fn prepend_input_copy(
    ctx: &mut Context,
    body: &mut Block,
    var: VarId,
    ty: TypeId,
    field_offset: u32,
    semantic: &str,
) {
    let loc = ctx.var(var).loc;
    let shadow = ctx.new_var(
        Variable::new(format!("<input-{}>", semantic), ty, loc).with_semantic(semantic),
    );
    ctx.var_mut(shadow).is_input_varying = true;
    ctx.add_var_to_scope(ctx.globals(), shadow);

    let load = ctx.new_var_load(shadow, loc);
    body.insert(0, load);
    if field_offset != 0 {
        let offset = ctx.new_uint_constant(field_offset * 4, loc);
        body.insert(1, offset);
        let store = ctx.new_store(var, Some(offset), load, 0, loc);
        body.insert(2, store);
    } else {
        let store = ctx.new_store(var, None, load, 0, loc);
        body.insert(1, store);
    }
}

/// Splits an output varying into a writable temp and the varying register,
/// copying the former into the latter at the tail of the body.
///
/// `semantic_override` supplies the function's return semantic when
/// lowering the synthetic return variable, which carries none of its own.
fn append_output_var_copy(
    ctx: &mut Context,
    body: &mut Block,
    var: VarId,
    semantic_override: Option<&str>,
) {
    let ty = ctx.var(var).data_type;
    if let Some(fields) = struct_fields(ctx, ty) {
        append_output_struct_copy(ctx, body, var, &fields, 0);
    } else {
        let semantic = semantic_override
            .map(str::to_string)
            .or_else(|| ctx.var(var).semantic.clone());
        if let Some(semantic) = semantic {
            append_output_copy(ctx, body, var, ty, 0, &semantic);
        }
    }
    ctx.var_mut(var).is_output_varying = false;
}

fn append_output_struct_copy(
    ctx: &mut Context,
    body: &mut Block,
    var: VarId,
    fields: &[StructField],
    field_offset: u32,
) {
    for field in fields {
        if let Some(inner) = struct_fields(ctx, field.ty) {
            append_output_struct_copy(ctx, body, var, &inner, field_offset + field.reg_offset);
        } else if let Some(semantic) = &field.semantic {
            append_output_copy(
                ctx,
                body,
                var,
                field.ty,
                field_offset + field.reg_offset,
                semantic,
            );
        } else {
            ctx.error(
                field.loc,
                ErrorCode::MissingSemantic,
                format!("Field '{}' is missing a semantic.", field.name),
            );
        }
    }
}

fn append_output_copy(
    ctx: &mut Context,
    body: &mut Block,
    var: VarId,
    ty: TypeId,
    field_offset: u32,
    semantic: &str,
) {
    let loc = ctx.var(var).loc;
    let shadow = ctx.new_var(
        Variable::new(format!("<output-{}>", semantic), ty, loc).with_semantic(semantic),
    );
    ctx.var_mut(shadow).is_output_varying = true;
    ctx.add_var_to_scope(ctx.globals(), shadow);

    let offset = if field_offset != 0 {
        let offset = ctx.new_uint_constant(field_offset * 4, loc);
        body.push(offset);
        Some(offset)
    } else {
        None
    };
    let load = ctx.new_load(var, offset, ty, loc);
    body.push(load);
    let store = ctx.new_store(shadow, None, load, 0, loc);
    body.push(store);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadec_core::{NodeKind, ScalarBase, SourceLocation, StructField};

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn uniform_copy_shape() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let u = ctx.new_var(
            Variable::new("u", float4, loc()).with_modifiers(Modifiers::UNIFORM),
        );
        ctx.add_var(u, false).unwrap();

        let void = ctx.types.void();
        let entry = ctx.new_func_decl(void, vec![], None, loc());
        ctx.add_function("main", entry, false).unwrap();
        let mut body = Block::new();
        lower_entry_point(&mut ctx, entry, &mut body);

        assert_eq!(body.len(), 2);
        let NodeKind::Load(load) = &ctx.node(body.id_at(0)).kind else {
            panic!("expected load first");
        };
        let shadow = load.src.var;
        assert_eq!(ctx.var(shadow).name, "<uniform-u>");
        assert!(ctx.var(shadow).is_uniform);
        assert!(!ctx.var(u).is_uniform);

        let NodeKind::Store(store) = &ctx.node(body.id_at(1)).kind else {
            panic!("expected store second");
        };
        assert_eq!(store.lhs.var, u);
    }

    #[test]
    fn struct_leaf_without_semantic_is_an_error() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let s = ctx.types.new_struct_type(
            Some("S".into()),
            vec![
                StructField::new("a", float4).with_semantic("TEXCOORD0"),
                StructField::new("b", float4),
            ],
        );
        let p = ctx.new_var(Variable::new("p", s, loc()));
        let void = ctx.types.void();
        let entry = ctx.new_func_decl(void, vec![p], None, loc());
        ctx.add_function("main", entry, false).unwrap();

        let mut body = Block::new();
        lower_entry_point(&mut ctx, entry, &mut body);
        assert!(ctx.failed());
        assert!(ctx
            .diagnostics()
            .iter()
            .any(|d| d.code == Some(ErrorCode::MissingSemantic)));
    }

    #[test]
    fn output_param_copies_append_at_tail() {
        let mut ctx = Context::new();
        let float4 = ctx.types.vector(ScalarBase::Float, 4);
        let p = ctx.new_var(
            Variable::new("result", float4, loc())
                .with_semantic("COLOR0")
                .with_modifiers(Modifiers::OUT),
        );
        let void = ctx.types.void();
        let entry = ctx.new_func_decl(void, vec![p], None, loc());
        ctx.add_function("main", entry, false).unwrap();

        let mut body = Block::new();
        lower_entry_point(&mut ctx, entry, &mut body);

        assert_eq!(body.len(), 2);
        let NodeKind::Store(store) = &ctx.node(body.id_at(1)).kind else {
            panic!("expected trailing store");
        };
        assert_eq!(ctx.var(store.lhs.var).name, "<output-COLOR0>");
        assert!(ctx.var(store.lhs.var).is_output_varying);
        assert!(!ctx.var(p).is_output_varying);
    }
}
