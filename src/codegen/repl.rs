//! JIT REPL evaluation strategy: each top-level expression is
//! compiled into its own uniquely-named nullary wrapper function so it can
//! be run through the execution engine in isolation, while `define`d
//! variables live in module globals (not stack allocas) so they persist
//! across wrapper invocations.

use inkwell::execution_engine::ExecutionEngine;
use inkwell::OptimizationLevel;

use crate::diagnostics::CompileError;
use crate::parser::ast::AstNode;

use super::context::CodegenContext;
use super::{codegen_expr, precheck_builtin_arity, print_for_auto_print};

/// Builtin arity table the REPL registers at startup, matching the batch
/// driver's special-form set: `+ - * /` are fully variadic with at least
/// one argument, `show`/`quote` take exactly one, `define` is registered
/// with an unbounded upper arity (`2, -1`) the same way the original
/// marks it a special form for completion purposes, even though codegen
/// only ever sees the 2-argument shape the parser desugars everything to.
pub fn register_builtins(ctx: &CodegenContext) {
    let mut env = ctx.env.borrow_mut();
    for op in ["+", "-", "*", "/"] {
        env.insert_builtin(op, 1, -1);
    }
    env.insert_builtin("show", 1, 1);
    env.insert_builtin("quote", 1, 1);
    env.insert_builtin("define", 2, -1);
}

/// Creates the JIT execution engine backing REPL evaluation. No
/// optimisation passes run, since each expression is evaluated once and
/// discarded, so there is nothing to gain from optimising it.
pub fn create_execution_engine<'ctx>(
    ctx: &CodegenContext<'ctx>,
) -> Result<ExecutionEngine<'ctx>, CompileError> {
    ctx.module
        .create_jit_execution_engine(OptimizationLevel::None)
        .map_err(|e| CompileError::driver(format!("failed to create JIT execution engine: {e}")))
}

/// Builds and immediately runs the one-shot `__repl_init_globals` function,
/// so every format-string global exists before any `__repl_expr_N` wrapper
/// is built. This lets each wrapper assume the builder already has globals
/// to reference instead of materialising them inline.
pub fn init_globals<'ctx>(ctx: &CodegenContext<'ctx>, engine: &ExecutionEngine<'ctx>) {
    let fn_type = ctx.context.void_type().fn_type(&[], false);
    let function = ctx.module.add_function("__repl_init_globals", fn_type, None);
    let entry = ctx.context.append_basic_block(function, "entry");
    ctx.builder.position_at_end(entry);

    ctx.fmt_str_nl();
    ctx.fmt_char_nl();
    ctx.fmt_int_nl();
    ctx.fmt_float_nl();
    ctx.fmt_hex_nl();
    ctx.fmt_oct_nl();
    ctx.fmt_quoted_str_nl();
    ctx.fmt_quoted_char_nl();
    ctx.fmt_float_bare();
    ctx.fmt_str_bare();
    ctx.fmt_quoted_str_bare();
    ctx.fmt_quoted_char_bare();

    ctx.builder.build_return(None).unwrap();

    unsafe {
        engine.run_function(function, &[]);
    }
}

/// `define` and `show` print their own result line; every other top-level
/// expression gets its value auto-printed by the REPL after evaluation.
fn is_auto_print_suppressed(node: &AstNode) -> bool {
    matches!(
        node.as_list().and_then(|items| items.first()).and_then(|h| h.as_symbol_name()),
        Some("define") | Some("show")
    )
}

/// Compiles `node` into its own `__repl_expr_N` wrapper, runs it through the
/// JIT, and auto-prints its value unless it is a `define`/`show` (which
/// already printed). On an arity, codegen, or verification failure the
/// half-built wrapper is deleted and the module is left exactly as it was
/// before this call, returning to the prompt rather than aborting the
/// session. The REPL's caller applies the same non-fatal handling to
/// lexer/parser errors on a line, since a single malformed entry should
/// not end an interactive session.
pub fn eval_top_level<'ctx>(
    ctx: &CodegenContext<'ctx>,
    engine: &ExecutionEngine<'ctx>,
    node: &AstNode,
) -> Result<(), CompileError> {
    let index = ctx.next_expr_index();
    let name = format!("__repl_expr_{index}");
    let fn_type = ctx.context.void_type().fn_type(&[], false);
    let function = ctx.module.add_function(&name, fn_type, None);
    let entry = ctx.context.append_basic_block(function, "entry");
    ctx.builder.position_at_end(entry);

    let suppress_print = is_auto_print_suppressed(node);

    if let Err(err) = precheck_builtin_arity(ctx, node) {
        unsafe {
            function.delete();
        }
        return Err(err);
    }

    let codegen_result = codegen_expr(ctx, node);

    let (value, ty) = match codegen_result {
        Ok(v) => v,
        Err(err) => {
            unsafe {
                function.delete();
            }
            return Err(err);
        }
    };

    if !suppress_print {
        let printf_fn = ctx.get_or_declare_printf();
        print_for_auto_print(ctx, value, &ty, printf_fn);
    }

    ctx.builder.build_return(None).unwrap();

    if !function.verify(true) {
        unsafe {
            function.delete();
        }
        return Err(CompileError::driver(format!(
            "'{name}' failed LLVM module verification"
        )));
    }

    unsafe {
        engine
            .run_function(function, &[]);
    }

    Ok(())
}
