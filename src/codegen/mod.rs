//! AST to IR: the expression codegen contract, the special forms
//! `define`/`show`/`quote`/arithmetic, user-defined function calls
//! and the runtime print helpers.

pub mod context;
pub mod repl;

use inkwell::values::BasicValueEnum;

use crate::diagnostics::CompileError;
use crate::env::EnvEntry;
use crate::lexer::token::Span;
use crate::parser::ast::AstNode;
use crate::types::{coerce_arithmetic, infer_literal_type, type_from_name, FnParam, Type};

use context::CodegenContext;

/// Every codegen entry point returns the backend value alongside the
/// Monad type that produced it, so callers (`show`, arithmetic, `define`)
/// can keep dispatching on it without re-deriving it from the IR.
pub type CodegenResult<'ctx> = Result<(BasicValueEnum<'ctx>, Type), CompileError>;

pub fn codegen_expr<'ctx>(ctx: &CodegenContext<'ctx>, node: &AstNode) -> CodegenResult<'ctx> {
    match node {
        AstNode::Number { value, literal, .. } => {
            let ty = infer_literal_type(*value, literal.as_deref());
            let llvm_value = if ty.is_float() {
                ctx.context.f64_type().const_float(*value).into()
            } else {
                ctx.context.i64_type().const_int(*value as i64 as u64, true).into()
            };
            Ok((llvm_value, ty))
        }

        AstNode::Char { value, .. } => {
            let llvm_value = ctx.context.i8_type().const_int(*value as u64, false).into();
            Ok((llvm_value, Type::Char))
        }

        AstNode::Str { value, .. } => {
            let ptr = ctx
                .builder
                .build_global_string_ptr(value, "str")
                .unwrap()
                .as_pointer_value();
            Ok((ptr.into(), Type::String))
        }

        AstNode::Symbol { name, span } => {
            let entry = ctx
                .env
                .borrow()
                .lookup(name)
                .cloned()
                .ok_or_else(|| CompileError::reference(*span, format!("unbound variable: {name}")))?;
            match entry {
                EnvEntry::Variable { ty, storage } => {
                    let llvm_ty = ctx.llvm_type_for(&ty);
                    let loaded = ctx.builder.build_load(llvm_ty, storage, name).unwrap();
                    Ok((loaded, ty))
                }
                EnvEntry::Function { .. } => Err(CompileError::reference(
                    *span,
                    format!("function used as value: {name}"),
                )),
                EnvEntry::Builtin { .. } => Err(CompileError::reference(
                    *span,
                    format!("builtin used as value: {name}"),
                )),
            }
        }

        AstNode::Lambda { span, .. } => Err(CompileError::syntactic(
            *span,
            "a lambda value may only appear as the value of a 'define'",
        )),

        AstNode::List { items, span } => codegen_list(ctx, items, *span),
    }
}

fn codegen_list<'ctx>(ctx: &CodegenContext<'ctx>, items: &[AstNode], span: Span) -> CodegenResult<'ctx> {
    if items.is_empty() {
        return Err(CompileError::syntactic(span, "empty list not supported"));
    }

    let head = &items[0];
    let Some(head_name) = head.as_symbol_name() else {
        return Err(CompileError::syntactic(
            span,
            "function call requires symbol in head position",
        ));
    };

    match head_name {
        "define" => define_form(ctx, items, span),
        "show" => show_form(ctx, items, span),
        "quote" => Err(CompileError::syntactic(
            span,
            "'quote' is only meaningful as the argument of 'show'",
        )),
        "+" | "-" | "*" | "/" => arithmetic_form(ctx, head_name, items, span),
        _ => function_call_form(ctx, head_name, items, span),
    }
}

/// `define`: three shapes, plain, annotated, and lambda-materializing.
fn define_form<'ctx>(ctx: &CodegenContext<'ctx>, items: &[AstNode], span: Span) -> CodegenResult<'ctx> {
    if items.len() < 3 {
        return Err(CompileError::arity(span, "'define' requires at least 2 arguments"));
    }

    let name_expr = &items[1];
    let value_expr = &items[2];

    // Shape 3: `(define name (lambda ...))` materialises a function.
    if let AstNode::Lambda {
        params,
        return_type,
        docstring,
        body,
        ..
    } = value_expr
    {
        let AstNode::Symbol { name, span: name_span } = name_expr else {
            return Err(CompileError::syntactic(
                span,
                "'define' name must be symbol or type annotation",
            ));
        };
        return materialize_function(
            ctx,
            name,
            *name_span,
            params,
            return_type.as_deref(),
            docstring.clone(),
            body,
        );
    }

    // Shapes 1 and 2: a plain variable definition, optionally annotated.
    let (var_name, explicit_type) = match name_expr {
        AstNode::Symbol { name, .. } => (name.clone(), None),
        AstNode::List { items: ann, .. } => {
            let (name, ty) = parse_define_annotation(ann, span)?;
            (name, Some(ty))
        }
        _ => {
            return Err(CompileError::syntactic(
                span,
                "'define' name must be symbol or type annotation",
            ))
        }
    };

    let (value, inferred_type) = codegen_expr(ctx, value_expr)?;
    let final_type = explicit_type.unwrap_or_else(|| inferred_type.clone());

    let llvm_type = ctx.llvm_type_for(&final_type);
    let storage = ctx.allocate_storage(&var_name, llvm_type);

    let stored_value = coerce_value(ctx, value, &inferred_type, &final_type);
    ctx.builder.build_store(storage, stored_value).unwrap();

    ctx.env.borrow_mut().insert(&var_name, final_type.clone(), storage);

    if ctx.repl_mode {
        println!("{var_name} :: {final_type}");
    } else {
        println!("Defined {var_name} :: {final_type}");
    }

    Ok((stored_value, final_type))
}

/// `[name :: Type]` (or a bare `[TypeName]`, which this implementation
/// rejects, see the Open Question note in DESIGN.md).
fn parse_define_annotation(items: &[AstNode], span: Span) -> Result<(String, Type), CompileError> {
    if items.len() != 3 {
        return Err(CompileError::syntactic(
            span,
            "'define' name must be symbol or type annotation",
        ));
    }
    let AstNode::Symbol { name, .. } = &items[0] else {
        return Err(CompileError::syntactic(span, "expected a name in annotation"));
    };
    if !items[1].is_symbol("::") {
        return Err(CompileError::syntactic(span, "expected '::' in annotation"));
    }
    let AstNode::Symbol { name: type_name, .. } = &items[2] else {
        return Err(CompileError::syntactic(span, "expected a type name in annotation"));
    };
    Ok((name.clone(), type_from_name(type_name)))
}

/// `show`: dispatch on the static shape of its single argument.
/// Always returns a dummy `Float(0.0)`, since it is an effect.
fn show_form<'ctx>(ctx: &CodegenContext<'ctx>, items: &[AstNode], span: Span) -> CodegenResult<'ctx> {
    if items.len() != 2 {
        return Err(CompileError::arity(
            span,
            format!("'show' requires 1 argument, got {}", items.len().saturating_sub(1)),
        ));
    }
    let arg = &items[1];
    let printf_fn = ctx.get_or_declare_printf();

    // `(show '(quote e))` i.e. `(show 'e)`.
    if let AstNode::List { items: inner, .. } = arg {
        if inner.first().is_some_and(|h| h.is_symbol("quote")) && inner.len() == 2 {
            print_quoted(ctx, &inner[1]);
            return Ok(dummy_show_result(ctx));
        }
    }

    match arg {
        AstNode::Str { value, .. } => {
            let s = ctx.builder.build_global_string_ptr(value, "str").unwrap().as_pointer_value();
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_str_nl().into(), s.into()], "")
                .unwrap();
        }
        AstNode::Char { value, .. } => {
            let c = ctx.context.i8_type().const_int(*value as u64, false);
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_char_nl().into(), c.into()], "")
                .unwrap();
        }
        AstNode::Symbol { name, span: sym_span } => {
            let entry = ctx
                .env
                .borrow()
                .lookup(name)
                .cloned()
                .ok_or_else(|| CompileError::reference(*sym_span, format!("unbound variable: {name}")))?;
            let EnvEntry::Variable { ty, storage } = entry else {
                return Err(CompileError::reference(*sym_span, format!("unbound variable: {name}")));
            };
            let llvm_ty = ctx.llvm_type_for(&ty);
            let loaded = ctx.builder.build_load(llvm_ty, storage, name).unwrap();
            print_by_declared_type(ctx, loaded, &ty, printf_fn);
        }
        _ => {
            let (value, ty) = codegen_expr(ctx, arg)?;
            print_by_declared_type(ctx, value, &ty, printf_fn);
        }
    }

    Ok(dummy_show_result(ctx))
}

fn dummy_show_result<'ctx>(ctx: &CodegenContext<'ctx>) -> (BasicValueEnum<'ctx>, Type) {
    (ctx.context.f64_type().const_float(0.0).into(), Type::Float)
}

/// REPL auto-print: unlike explicit `show`, provenance-specific formatting
/// (`0x`/`0b`/`0o`) is not used here. Every integer variant prints as plain
/// `%ld\n`.
pub fn print_for_auto_print<'ctx>(
    ctx: &CodegenContext<'ctx>,
    value: BasicValueEnum<'ctx>,
    ty: &Type,
    printf_fn: inkwell::values::FunctionValue<'ctx>,
) {
    let collapsed = if ty.is_integer() && !matches!(ty, Type::Char) {
        Type::Int
    } else {
        ty.clone()
    };
    print_by_declared_type(ctx, value, &collapsed, printf_fn)
}

pub(crate) fn print_by_declared_type<'ctx>(
    ctx: &CodegenContext<'ctx>,
    value: BasicValueEnum<'ctx>,
    ty: &Type,
    printf_fn: inkwell::values::FunctionValue<'ctx>,
) {
    match ty {
        Type::Char => {
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_char_nl().into(), value.into()], "")
                .unwrap();
        }
        Type::String => {
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_str_nl().into(), value.into()], "")
                .unwrap();
        }
        Type::Hex => {
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_hex_nl().into(), value.into()], "")
                .unwrap();
        }
        Type::Oct => {
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_oct_nl().into(), value.into()], "")
                .unwrap();
        }
        Type::Bin => {
            let print_binary = ctx.get_or_build_print_binary();
            ctx.builder
                .build_call(print_binary, &[value.into()], "")
                .unwrap();
        }
        Type::Int => {
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_int_nl().into(), value.into()], "")
                .unwrap();
        }
        _ => {
            ctx.builder
                .build_call(printf_fn, &[ctx.fmt_float_nl().into(), value.into()], "")
                .unwrap();
        }
    }
}

/// Runtime pretty-printer for `(show 'e)`, emitting the calls that print `e`
/// in its quoted shape. Entry point; always prints the single trailing
/// newline that terminates the value as a whole.
fn print_quoted<'ctx>(ctx: &CodegenContext<'ctx>, node: &AstNode) {
    print_quoted_rec(ctx, node, true);
}

/// Elements nested inside a quoted `List` must not carry their own
/// newline: the list printer separates them with a single space and adds
/// exactly one `\n` after the closing `)` of the outermost list. `top_level`
/// is true only for the value passed directly to `print_quoted`; every
/// recursive call (list elements, nested lists) passes `false`.
fn print_quoted_rec<'ctx>(ctx: &CodegenContext<'ctx>, node: &AstNode, top_level: bool) {
    let printf_fn = ctx.get_or_declare_printf();
    match node {
        AstNode::Number { value, .. } => {
            let v = ctx.context.f64_type().const_float(*value);
            let fmt = if top_level { ctx.fmt_float_nl() } else { ctx.fmt_float_bare() };
            ctx.builder.build_call(printf_fn, &[fmt.into(), v.into()], "").unwrap();
        }
        AstNode::Symbol { name, .. } => {
            let s = ctx.builder.build_global_string_ptr(name, "sym").unwrap().as_pointer_value();
            let fmt = if top_level { ctx.fmt_str_nl() } else { ctx.fmt_str_bare() };
            ctx.builder.build_call(printf_fn, &[fmt.into(), s.into()], "").unwrap();
        }
        AstNode::Str { value, .. } => {
            let s = ctx.builder.build_global_string_ptr(value, "str").unwrap().as_pointer_value();
            let fmt = if top_level {
                ctx.fmt_quoted_str_nl()
            } else {
                ctx.fmt_quoted_str_bare()
            };
            ctx.builder.build_call(printf_fn, &[fmt.into(), s.into()], "").unwrap();
        }
        AstNode::Char { value, .. } => {
            let c = ctx.context.i8_type().const_int(*value as u64, false);
            let fmt = if top_level {
                ctx.fmt_quoted_char_nl()
            } else {
                ctx.fmt_quoted_char_bare()
            };
            ctx.builder.build_call(printf_fn, &[fmt.into(), c.into()], "").unwrap();
        }
        AstNode::List { items, .. } => {
            let lparen = ctx.builder.build_global_string_ptr("(", "lparen").unwrap().as_pointer_value();
            ctx.builder.build_call(printf_fn, &[lparen.into()], "").unwrap();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    let space = ctx.builder.build_global_string_ptr(" ", "space").unwrap().as_pointer_value();
                    ctx.builder.build_call(printf_fn, &[space.into()], "").unwrap();
                }
                print_quoted_rec(ctx, item, false);
            }
            let rparen_text = if top_level { ")\n" } else { ")" };
            let rparen = ctx
                .builder
                .build_global_string_ptr(rparen_text, "rparen")
                .unwrap()
                .as_pointer_value();
            ctx.builder.build_call(printf_fn, &[rparen.into()], "").unwrap();
        }
        AstNode::Lambda { .. } => {}
    }
}

/// Variadic `+ - * /`, left-folded, applying the coercion lattice at each
/// step.
fn arithmetic_form<'ctx>(ctx: &CodegenContext<'ctx>, op: &str, items: &[AstNode], span: Span) -> CodegenResult<'ctx> {
    let operands = &items[1..];
    if operands.is_empty() {
        return Err(CompileError::arity(span, format!("'{op}' requires at least 1 argument")));
    }

    let (mut result, mut result_type) = codegen_expr(ctx, &operands[0])?;
    if !result_type.is_numeric() {
        return Err(CompileError::type_error(
            span,
            format!("cannot perform arithmetic on type {result_type}"),
        ));
    }

    if op == "-" && operands.len() == 1 {
        return Ok(negate(ctx, result, result_type));
    }
    if op == "/" && operands.len() == 1 {
        return Ok(reciprocal(ctx, result, &result_type));
    }

    for rhs_node in &operands[1..] {
        let (rhs, rhs_type) = codegen_expr(ctx, rhs_node)?;
        if !rhs_type.is_numeric() {
            return Err(CompileError::type_error(
                span,
                format!("cannot perform arithmetic on type {rhs_type}"),
            ));
        }

        let coercion = coerce_arithmetic(&result_type, &rhs_type, span)?;
        let lhs_c = coerce_value(ctx, result, &result_type, &coercion.result);
        let rhs_c = coerce_value(ctx, rhs, &rhs_type, &coercion.result);

        result = apply_binary_op(ctx, op, lhs_c, rhs_c, &coercion.result);
        result_type = coercion.result;
    }

    Ok((result, result_type))
}

fn negate<'ctx>(ctx: &CodegenContext<'ctx>, value: BasicValueEnum<'ctx>, ty: Type) -> (BasicValueEnum<'ctx>, Type) {
    if ty.is_float() {
        let v = ctx.builder.build_float_neg(value.into_float_value(), "negtmp").unwrap();
        (v.into(), ty)
    } else {
        let zero = ctx.context.i64_type().const_zero();
        let v = ctx.builder.build_int_sub(zero, value.into_int_value(), "negtmp").unwrap();
        (v.into(), ty)
    }
}

fn reciprocal<'ctx>(ctx: &CodegenContext<'ctx>, value: BasicValueEnum<'ctx>, ty: &Type) -> (BasicValueEnum<'ctx>, Type) {
    let one = ctx.context.f64_type().const_float(1.0);
    let as_float = if ty.is_float() {
        value.into_float_value()
    } else {
        ctx.builder
            .build_signed_int_to_float(value.into_int_value(), ctx.context.f64_type(), "tofloat")
            .unwrap()
    };
    let v = ctx.builder.build_float_div(one, as_float, "invtmp").unwrap();
    (v.into(), Type::Float)
}

fn apply_binary_op<'ctx>(
    ctx: &CodegenContext<'ctx>,
    op: &str,
    lhs: BasicValueEnum<'ctx>,
    rhs: BasicValueEnum<'ctx>,
    result_type: &Type,
) -> BasicValueEnum<'ctx> {
    if result_type.is_float() {
        let l = lhs.into_float_value();
        let r = rhs.into_float_value();
        let v = match op {
            "+" => ctx.builder.build_float_add(l, r, "addtmp"),
            "-" => ctx.builder.build_float_sub(l, r, "subtmp"),
            "*" => ctx.builder.build_float_mul(l, r, "multmp"),
            "/" => ctx.builder.build_float_div(l, r, "divtmp"),
            _ => unreachable!(),
        };
        v.unwrap().into()
    } else {
        let l = lhs.into_int_value();
        let r = rhs.into_int_value();
        let v = match op {
            "+" => ctx.builder.build_int_add(l, r, "addtmp"),
            "-" => ctx.builder.build_int_sub(l, r, "subtmp"),
            "*" => ctx.builder.build_int_mul(l, r, "multmp"),
            "/" => ctx.builder.build_int_signed_div(l, r, "divtmp"),
            _ => unreachable!(),
        };
        v.unwrap().into()
    }
}

/// Converts `value` of type `from` into the backend representation of type
/// `to`: float to/from int, int to char (truncate), char to int
/// (sign-extend).
fn coerce_value<'ctx>(
    ctx: &CodegenContext<'ctx>,
    value: BasicValueEnum<'ctx>,
    from: &Type,
    to: &Type,
) -> BasicValueEnum<'ctx> {
    if std::mem::discriminant(from) == std::mem::discriminant(to) {
        return value;
    }

    match (from.is_float(), to.is_float()) {
        (false, true) => {
            let widened = if matches!(from, Type::Char) {
                ctx.builder
                    .build_int_s_extend(value.into_int_value(), ctx.context.i64_type(), "ext")
                    .unwrap()
            } else {
                value.into_int_value()
            };
            ctx.builder
                .build_signed_int_to_float(widened, ctx.context.f64_type(), "tofloat")
                .unwrap()
                .into()
        }
        (true, false) => {
            if matches!(to, Type::Char) {
                ctx.builder
                    .build_float_to_signed_int(value.into_float_value(), ctx.context.i8_type(), "tochar")
                    .unwrap()
                    .into()
            } else {
                ctx.builder
                    .build_float_to_signed_int(value.into_float_value(), ctx.context.i64_type(), "toint")
                    .unwrap()
                    .into()
            }
        }
        (false, false) => {
            if matches!(to, Type::Char) {
                ctx.builder
                    .build_int_truncate(value.into_int_value(), ctx.context.i8_type(), "tochar")
                    .unwrap()
                    .into()
            } else if matches!(from, Type::Char) {
                ctx.builder
                    .build_int_s_extend(value.into_int_value(), ctx.context.i64_type(), "ext")
                    .unwrap()
                    .into()
            } else {
                value
            }
        }
        (true, true) => value,
    }
}

/// `(define name (lambda <sig> <doc?> <body>))`: bind a fresh child
/// environment seeded with the parameters, codegen the body against it,
/// coerce the result to the declared return type, restore the outer
/// environment and insertion point, then bind `name` to the new `Function`.
#[allow(clippy::too_many_arguments)]
fn materialize_function<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    name_span: Span,
    params: &[crate::parser::ast::LambdaParam],
    return_type_name: Option<&str>,
    docstring: Option<String>,
    body: &AstNode,
) -> CodegenResult<'ctx> {
    let param_types: Vec<Type> = params
        .iter()
        .map(|p| p.type_name.as_deref().map(type_from_name).unwrap_or(Type::Float))
        .collect();
    let return_type = return_type_name.map(type_from_name).unwrap_or(Type::Float);

    let llvm_param_types: Vec<_> = param_types.iter().map(|t| ctx.llvm_type_for(t).into()).collect();
    let fn_type = match return_type {
        Type::Float => ctx.context.f64_type().fn_type(&llvm_param_types, false),
        Type::Char => ctx.context.i8_type().fn_type(&llvm_param_types, false),
        _ => ctx.context.i64_type().fn_type(&llvm_param_types, false),
    };

    let function = ctx.module.add_function(name, fn_type, None);

    let saved_block = ctx.builder.get_insert_block();
    let entry = ctx.context.append_basic_block(function, "entry");
    ctx.builder.position_at_end(entry);

    let outer_env = ctx.env.replace(crate::env::Environment::new());

    for (i, param) in params.iter().enumerate() {
        let llvm_ty = ctx.llvm_type_for(&param_types[i]);
        let slot = ctx.builder.build_alloca(llvm_ty, &param.name).unwrap();
        let incoming = function.get_nth_param(i as u32).unwrap();
        ctx.builder.build_store(slot, incoming).unwrap();
        ctx.env.borrow_mut().insert(&param.name, param_types[i].clone(), slot);
    }

    let body_result = codegen_expr(ctx, body);

    ctx.env.replace(outer_env);

    let (body_value, body_type) = match body_result {
        Ok(v) => v,
        Err(e) => {
            // The partially-built function is left in the module; batch
            // mode treats this as fatal anyway, and the REPL deletes the
            // whole wrapper (and everything emitted with it) on failure.
            return Err(e);
        }
    };

    let coerced = coerce_value(ctx, body_value, &body_type, &return_type);
    ctx.builder.build_return(Some(&coerced)).unwrap();

    if let Some(block) = saved_block {
        ctx.builder.position_at_end(block);
    }

    let fn_params: Vec<FnParam> = params
        .iter()
        .zip(param_types.iter())
        .map(|(p, t)| FnParam::new(Some(p.name.clone()), Some(t.clone())))
        .collect();

    ctx.env
        .borrow_mut()
        .insert_function(name, fn_params, return_type.clone(), function, docstring);

    let sig = params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(" ");
    if ctx.repl_mode {
        println!("{name} :: Fn ({sig}) -> {return_type}");
    } else {
        println!("Defined {name} :: Fn ({sig}) -> {return_type}");
    }

    let _ = name_span;
    Ok((coerced, return_type))
}

/// `(f e1 … en)` where `f` resolves to a user-defined `Function`.
fn function_call_form<'ctx>(
    ctx: &CodegenContext<'ctx>,
    name: &str,
    items: &[AstNode],
    span: Span,
) -> CodegenResult<'ctx> {
    let entry = ctx.env.borrow().lookup(name).cloned();
    let Some(EnvEntry::Function { params, return_type, function }) = entry else {
        return Err(CompileError::reference(span, format!("unknown function: {name}")));
    };

    let args = &items[1..];
    if args.len() != params.len() {
        return Err(CompileError::arity(
            span,
            format!(
                "function '{name}' expects {} argument(s), got {}",
                params.len(),
                args.len()
            ),
        ));
    }

    let mut llvm_args = Vec::with_capacity(args.len());
    for (arg_node, param) in args.iter().zip(params.iter()) {
        let (value, value_type) = codegen_expr(ctx, arg_node)?;
        let param_type = param.ty.as_deref().cloned().unwrap_or(Type::Float);
        let coerced = coerce_value(ctx, value, &value_type, &param_type);
        llvm_args.push(coerced.into());
    }

    let call = ctx.builder.build_call(function, &llvm_args, "calltmp").unwrap();
    let result = call
        .try_as_basic_value()
        .left()
        .expect("Monad functions always return a value");

    Ok((result, return_type))
}

/// Arity-range check shared by batch and REPL before lowering a builtin.
/// Special forms also carry their own exact-arity messages inline (reached
/// regardless, since batch mode never populates the builtin table); this is
/// the stored-arity-table path the REPL uses.
pub fn check_builtin_arity(name: &str, arity_min: i32, arity_max: i32, got: usize, span: Span) -> Result<(), CompileError> {
    let got = got as i32;
    if got < arity_min || (arity_max != -1 && got > arity_max) {
        return Err(CompileError::arity(
            span,
            format!("'{name}' called with {got} argument(s), expected [{arity_min}, {arity_max}]"),
        ));
    }
    Ok(())
}

/// REPL-only pre-check: before a builtin special form
/// lowers itself, consult its stored arity range from the environment's
/// `Builtin` entry and raise the same friendly error codegen would
/// eventually reach inline, without first partially emitting IR for it.
/// A no-op for anything that isn't a list headed by a registered builtin.
pub fn precheck_builtin_arity(ctx: &CodegenContext<'_>, node: &AstNode) -> Result<(), CompileError> {
    let AstNode::List { items, span } = node else {
        return Ok(());
    };
    let Some(head_name) = items.first().and_then(|h| h.as_symbol_name()) else {
        return Ok(());
    };
    let Some(EnvEntry::Builtin { arity_min, arity_max }) = ctx.env.borrow().lookup(head_name).cloned() else {
        return Ok(());
    };
    check_builtin_arity(head_name, arity_min, arity_max, items.len() - 1, *span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell::context::Context;

    fn parse_one(src: &str) -> AstNode {
        let tokens = crate::lexer::Lexer::new(src).lex().unwrap();
        crate::parser::Parser::parse_all(tokens).unwrap().remove(0)
    }

    #[test]
    fn define_hex_literal_infers_hex_type() {
        let context = Context::create();
        let ctx = CodegenContext::new(&context, "test", false);
        let node = parse_one("(define x 0xFF)");
        let (_, ty) = codegen_expr(&ctx, &node).unwrap();
        assert_eq!(ty, Type::Hex);
        assert!(ctx.env.borrow().lookup("x").is_some());
    }

    #[test]
    fn mixing_hex_and_bin_is_a_type_error() {
        let context = Context::create();
        let ctx = CodegenContext::new(&context, "test", false);
        let node = parse_one("(+ 0xFF 0b10)");
        assert!(codegen_expr(&ctx, &node).is_err());
    }

    #[test]
    fn arithmetic_left_fold_matches_p8() {
        let context = Context::create();
        let ctx = CodegenContext::new(&context, "test", false);
        let node = parse_one("(- 10 3 2)");
        let (value, ty) = codegen_expr(&ctx, &node).unwrap();
        assert_eq!(ty, Type::Int);
        assert_eq!(value.into_int_value().get_sign_extended_constant(), Some(5));
    }

    #[test]
    fn unbound_variable_is_a_reference_error() {
        let context = Context::create();
        let ctx = CodegenContext::new(&context, "test", false);
        let node = parse_one("nope");
        assert!(codegen_expr(&ctx, &node).is_err());
    }
}
