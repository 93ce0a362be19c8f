//! Batch-mode orchestration: read a file, lex, parse, codegen a `main`
//! entry point, emit the requested artifacts, and optionally invoke the
//! system linker.

use std::path::{Path, PathBuf};
use std::process::Command;

use inkwell::context::Context;
use inkwell::targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::OptimizationLevel;

use crate::codegen::context::CodegenContext;
use crate::codegen::codegen_expr;
use crate::diagnostics::{CompileError, DiagnosticSink};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::types::Type;

/// Which artifacts to emit, mirroring the CLI's `--emit-*` flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmitFlags {
    pub ir: bool,
    pub bc: bool,
    pub asm: bool,
    pub obj: bool,
}

impl EmitFlags {
    /// True when none of `--emit-ir/--emit-bc/--emit-asm/--emit-obj` were
    /// given, the default case that produces an object file and links it.
    fn none(&self) -> bool {
        !self.ir && !self.bc && !self.asm && !self.obj
    }

    /// Whether an object file needs to be emitted at all: either because it
    /// was asked for directly, asm was asked for (asm emission shares the
    /// target-machine setup with object emission), or nothing was asked for
    /// (the default link path).
    fn needs_object(&self) -> bool {
        self.obj || self.asm || (!self.ir && !self.bc)
    }
}

pub struct CompileOptions {
    pub input_file: PathBuf,
    pub output_name: Option<String>,
    pub emit: EmitFlags,
}

/// Derives the output base name from `-o`, or the input file's stem
/// (`foo/bar.mon` -> `bar`) when absent.
fn base_name(opts: &CompileOptions) -> String {
    if let Some(name) = &opts.output_name {
        return name.clone();
    }
    opts.input_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "a.out".to_string())
}

pub fn compile(opts: &CompileOptions) -> Result<(), CompileError> {
    let source = std::fs::read_to_string(&opts.input_file)
        .map_err(|e| CompileError::driver(format!("cannot open file: {}: {e}", opts.input_file.display())))?;

    let sink = DiagnosticSink::new(opts.input_file.display().to_string(), source.clone());

    log::info!("read {} bytes from {}", source.len(), opts.input_file.display());

    let tokens = match Lexer::new(&source).lex() {
        Ok(t) => t,
        Err(e) => sink.fatal(&e),
    };
    let exprs = match Parser::parse_all(tokens) {
        Ok(e) => e,
        Err(e) => sink.fatal(&e),
    };

    if exprs.is_empty() {
        sink.fatal(&CompileError::syntactic(
            crate::lexer::token::Span::point(1, 1),
            "no expression(s) found",
        ));
    }

    log::info!("parsed {} top-level expression(s)", exprs.len());
    println!("Compiling {} expression(s)", exprs.len());

    Target::initialize_native(&InitializationConfig::default())
        .map_err(|e| CompileError::driver(format!("failed to initialize native target: {e}")))?;

    let context = Context::create();
    let ctx = CodegenContext::new(&context, "monad_module", false);

    let main_type = ctx.context.i32_type().fn_type(&[], false);
    let main_fn = ctx.module.add_function("main", main_type, None);
    let entry = ctx.context.append_basic_block(main_fn, "entry");
    ctx.builder.position_at_end(entry);

    let mut last = None;
    for expr in &exprs {
        match codegen_expr(&ctx, expr) {
            Ok(v) => last = Some(v),
            Err(e) => sink.fatal(&e),
        }
    }

    let (result_value, result_type) = last.unwrap_or_else(|| (ctx.context.f64_type().const_float(0.0).into(), Type::Float));

    let result_i32 = if result_type.is_integer() {
        ctx.builder
            .build_int_truncate(result_value.into_int_value(), ctx.context.i32_type(), "result")
            .unwrap()
    } else {
        ctx.builder
            .build_float_to_signed_int(result_value.into_float_value(), ctx.context.i32_type(), "result")
            .unwrap()
    };
    ctx.builder.build_return(Some(&result_i32)).unwrap();

    if let Err(e) = ctx.module.verify() {
        sink.fatal(&CompileError::driver(format!("module failed verification: {e}")));
    }

    let base = base_name(opts);
    log::info!("emitting artifacts with base name {base}");
    emit_artifacts(&ctx, &base, opts.emit)?;

    println!("\nSymbol Table:");
    print!("{}", ctx.env.borrow().format_dump());

    Ok(())
}

fn emit_artifacts(ctx: &CodegenContext, base: &str, emit: EmitFlags) -> Result<(), CompileError> {
    if emit.ir {
        let path = format!("{base}.ll");
        ctx.module
            .print_to_file(Path::new(&path))
            .map_err(|e| CompileError::driver(format!("failed to write IR: {e}")))?;
        println!("Wrote IR to {path}");
    }

    if emit.bc {
        let path = format!("{base}.bc");
        if !ctx.module.write_bitcode_to_path(Path::new(&path)) {
            return Err(CompileError::driver("failed to write bitcode"));
        }
        println!("Wrote bitcode to {path}");
    }

    if !emit.needs_object() {
        return Ok(());
    }

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple)
        .map_err(|e| CompileError::driver(format!("failed to get target: {e}")))?;
    let machine = target
        .create_target_machine(
            &triple,
            "generic",
            "",
            OptimizationLevel::Default,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .ok_or_else(|| CompileError::driver("failed to create target machine"))?;

    if emit.asm {
        let path = format!("{base}.s");
        machine
            .write_to_file(&ctx.module, FileType::Assembly, Path::new(&path))
            .map_err(|e| CompileError::driver(format!("failed to emit assembly: {e}")))?;
        println!("Wrote assembly to {path}");
    }

    let obj_path = format!("{base}.o");
    machine
        .write_to_file(&ctx.module, FileType::Object, Path::new(&obj_path))
        .map_err(|e| CompileError::driver(format!("failed to emit object file: {e}")))?;

    if emit.obj {
        println!("Wrote object file to {obj_path}");
    }

    if emit.none() {
        log::info!("invoking linker: cc {obj_path} -o {base} -lm -no-pie");
        let status = Command::new("cc")
            .args([&obj_path, "-o", base, "-lm", "-no-pie"])
            .status();
        match status {
            Ok(s) if s.success() => {
                println!("Created executable: {base}");
                let _ = std::fs::remove_file(&obj_path);
            }
            _ => return Err(CompileError::driver("failed to link executable")),
        }
    }

    Ok(())
}
