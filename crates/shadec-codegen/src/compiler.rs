//! The compile driver.
//!
//! [`compile_shader`] orchestrates the full flow: profile decoding, context
//! creation with predefined types, parsing through the [`Frontend`] seam,
//! entry-point resolution, lowering, the transform pipeline, final liveness
//! indexing, and hand-off to the [`Emitter`]. Diagnostics are drained into
//! the caller's sink at pass boundaries; the emitter is skipped whenever
//! the context's `failed` flag is set.

use shadec_core::{dump, Context, DeclId, DiagnosticSink, ErrorCode, SourceLocation, TypeKind};
use tracing::{debug, trace};

use crate::error::CodegenError;
use crate::profile::find_profile;
use crate::transform::{
    dce, fold_constants, fold_redundant_casts, split_struct_copies, transform_block,
};
use crate::{liveness, lowering, CompileOptions, ShaderSource};

/// The external parser. Populates the context from source text using the
/// context's scope, variable, type, function and IR-constructor methods,
/// reporting problems through the context's diagnostics.
pub trait Frontend {
    fn parse(&mut self, source: &ShaderSource<'_>, ctx: &mut Context) -> Result<(), CodegenError>;
}

/// The bytecode emitter. Receives the entry declaration with its body in
/// final lowered form, every node indexed and every variable carrying its
/// liveness range.
pub trait Emitter {
    fn emit(&mut self, ctx: &Context, entry: DeclId) -> Result<Vec<u8>, CodegenError>;
}

/// A compiled shader.
#[derive(Debug, Clone)]
pub struct ShaderArtifact {
    pub code: Vec<u8>,
}

fn drain_diagnostics(ctx: &mut Context, sink: &mut dyn DiagnosticSink) {
    for diagnostic in ctx.take_diagnostics() {
        sink.report(&diagnostic);
    }
}

/// Compiles shader source to target bytecode.
pub fn compile_shader(
    source: &ShaderSource<'_>,
    options: &CompileOptions,
    sink: &mut dyn DiagnosticSink,
    frontend: &mut dyn Frontend,
    emitter: &mut dyn Emitter,
) -> Result<ShaderArtifact, CodegenError> {
    if options.profile.is_empty() {
        return Err(CodegenError::InvalidArgument(
            "no target profile given".to_string(),
        ));
    }
    let Some(profile) = find_profile(&options.profile) else {
        return Err(CodegenError::NotImplemented(format!(
            "unknown compilation target \"{}\"",
            options.profile
        )));
    };
    let entry_point = options.entry_point.as_deref().unwrap_or("main");
    debug!(profile = profile.name, entry = entry_point, "compiling shader");

    let mut ctx = Context::new();
    if let Some(name) = source.source_name {
        ctx.add_source_file(name);
    }

    if let Err(err) = frontend.parse(source, &mut ctx) {
        drain_diagnostics(&mut ctx, sink);
        return Err(err);
    }
    if ctx.failed() {
        drain_diagnostics(&mut ctx, sink);
        return Err(CodegenError::InvalidShader);
    }

    let Some(entry) = ctx.get_func_decl(entry_point) else {
        ctx.error(
            SourceLocation::default(),
            ErrorCode::NotDefined,
            format!("Entry point \"{}\" is not defined.", entry_point),
        );
        drain_diagnostics(&mut ctx, sink);
        return Err(CodegenError::InvalidShader);
    };

    {
        let decl = ctx.decl(entry);
        let (return_type, loc, has_semantic) = (decl.return_type, decl.loc, decl.semantic.is_some());
        let is_struct = matches!(ctx.types[return_type].kind, TypeKind::Struct { .. });
        if !ctx.types.is_void(return_type) && !is_struct && !has_semantic {
            ctx.error(
                loc,
                ErrorCode::MissingSemantic,
                format!(
                    "Entry point \"{}\" is missing a return value semantic.",
                    entry_point
                ),
            );
        }
    }

    let processed = process_entry_function(&mut ctx, entry);
    drain_diagnostics(&mut ctx, sink);
    processed?;
    if ctx.failed() {
        return Err(CodegenError::InvalidShader);
    }

    let code = emitter.emit(&ctx, entry)?;
    Ok(ShaderArtifact { code })
}

/// Lowers the entry function and runs the transform pipeline to fixed
/// point, leaving the body in the form the emitter consumes. Errors
/// accumulate on the context; the pipeline itself always runs to the end so
/// one compile can report many problems.
pub fn process_entry_function(ctx: &mut Context, entry: DeclId) -> Result<(), CodegenError> {
    let Some(mut body) = ctx.take_decl_body(entry) else {
        let loc = ctx.decl(entry).loc;
        ctx.error(loc, ErrorCode::NotDefined, "Entry point has no body.");
        return Err(CodegenError::InvalidShader);
    };

    lowering::lower_entry_point(ctx, entry, &mut body);

    while transform_block(ctx, &mut body, fold_redundant_casts) {}
    debug!("fold_redundant_casts reached fixed point");
    while transform_block(ctx, &mut body, split_struct_copies) {}
    debug!("split_struct_copies reached fixed point");
    while transform_block(ctx, &mut body, fold_constants) {}
    debug!("fold_constants reached fixed point");

    loop {
        liveness::compute_liveness(ctx, entry, &body);
        if !transform_block(ctx, &mut body, dce) {
            break;
        }
    }
    liveness::compute_liveness(ctx, entry, &body);

    #[cfg(debug_assertions)]
    ctx.assert_use_def_consistency(&body);

    ctx.set_decl_body(entry, body);
    trace!("{}", dump::dump_function(ctx, entry));

    if ctx.failed() {
        return Err(CodegenError::InvalidShader);
    }
    Ok(())
}
