//! `CodegenContext`: the backend module, IR builder, context, environment
//! and lazily-materialised format-string globals shared by a single
//! compilation.

use std::cell::{Cell, RefCell};

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::types::BasicTypeEnum;
use inkwell::values::{FunctionValue, PointerValue};
use inkwell::AddressSpace;

use crate::env::Environment;
use crate::types::Type;

/// All format strings the runtime ever needs, created on first use so a
/// module that never calls `show` never carries them.
#[derive(Default)]
struct FormatStrings<'ctx> {
    str_nl: Option<PointerValue<'ctx>>,
    char_nl: Option<PointerValue<'ctx>>,
    int_nl: Option<PointerValue<'ctx>>,
    float_nl: Option<PointerValue<'ctx>>,
    hex_nl: Option<PointerValue<'ctx>>,
    oct_nl: Option<PointerValue<'ctx>>,
    quoted_str_nl: Option<PointerValue<'ctx>>,
    quoted_char_nl: Option<PointerValue<'ctx>>,
    /// Newline-free counterparts, used for elements nested inside a quoted
    /// list (only the outermost `show '(...)` print gets a trailing `\n`).
    float_bare: Option<PointerValue<'ctx>>,
    str_bare: Option<PointerValue<'ctx>>,
    quoted_str_bare: Option<PointerValue<'ctx>>,
    quoted_char_bare: Option<PointerValue<'ctx>>,
}

pub struct CodegenContext<'ctx> {
    pub context: &'ctx Context,
    pub module: Module<'ctx>,
    pub builder: Builder<'ctx>,
    pub env: RefCell<Environment<'ctx>>,
    /// REPL mode stores `define`d variables as module globals instead of
    /// stack allocas, so they persist across per-expression wrapper calls.
    pub repl_mode: bool,
    fmt: RefCell<FormatStrings<'ctx>>,
    print_binary_fn: RefCell<Option<FunctionValue<'ctx>>>,
    expr_counter: Cell<usize>,
}

impl<'ctx> CodegenContext<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str, repl_mode: bool) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            env: RefCell::new(Environment::new()),
            repl_mode,
            fmt: RefCell::new(FormatStrings::default()),
            print_binary_fn: RefCell::new(None),
            expr_counter: Cell::new(0),
        }
    }

    pub fn next_expr_index(&self) -> usize {
        let n = self.expr_counter.get();
        self.expr_counter.set(n + 1);
        n
    }

    pub fn llvm_type_for(&self, ty: &Type) -> BasicTypeEnum<'ctx> {
        match ty {
            Type::Int | Type::Hex | Type::Bin | Type::Oct => self.context.i64_type().into(),
            Type::Float => self.context.f64_type().into(),
            Type::Char => self.context.i8_type().into(),
            Type::String => self.context.ptr_type(AddressSpace::default()).into(),
            Type::Bool => self.context.bool_type().into(),
            Type::Unknown | Type::Fn { .. } => self.context.f64_type().into(),
        }
    }

    pub fn get_or_declare_printf(&self) -> FunctionValue<'ctx> {
        if let Some(f) = self.module.get_function("printf") {
            return f;
        }
        let i8_ptr = self.context.ptr_type(AddressSpace::default());
        let fn_type = self.context.i32_type().fn_type(&[i8_ptr.into()], true);
        self.module.add_function("printf", fn_type, None)
    }

    fn global_string(&self, text: &str, name: &str) -> PointerValue<'ctx> {
        self.builder
            .build_global_string_ptr(text, name)
            .expect("builder must be positioned before materialising globals")
            .as_pointer_value()
    }

    pub fn fmt_str_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().str_nl {
            return v;
        }
        let v = self.global_string("%s\n", "fmt_str");
        self.fmt.borrow_mut().str_nl = Some(v);
        v
    }

    pub fn fmt_char_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().char_nl {
            return v;
        }
        let v = self.global_string("%c\n", "fmt_char");
        self.fmt.borrow_mut().char_nl = Some(v);
        v
    }

    pub fn fmt_int_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().int_nl {
            return v;
        }
        let v = self.global_string("%ld\n", "fmt_int");
        self.fmt.borrow_mut().int_nl = Some(v);
        v
    }

    pub fn fmt_float_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().float_nl {
            return v;
        }
        let v = self.global_string("%g\n", "fmt_float");
        self.fmt.borrow_mut().float_nl = Some(v);
        v
    }

    pub fn fmt_hex_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().hex_nl {
            return v;
        }
        let v = self.global_string("0x%lX\n", "fmt_hex");
        self.fmt.borrow_mut().hex_nl = Some(v);
        v
    }

    pub fn fmt_oct_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().oct_nl {
            return v;
        }
        let v = self.global_string("0o%lo\n", "fmt_oct");
        self.fmt.borrow_mut().oct_nl = Some(v);
        v
    }

    pub fn fmt_quoted_str_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().quoted_str_nl {
            return v;
        }
        let v = self.global_string("\"%s\"\n", "fmt_quoted_str");
        self.fmt.borrow_mut().quoted_str_nl = Some(v);
        v
    }

    pub fn fmt_quoted_char_nl(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().quoted_char_nl {
            return v;
        }
        let v = self.global_string("'%c'\n", "fmt_quoted_char");
        self.fmt.borrow_mut().quoted_char_nl = Some(v);
        v
    }

    pub fn fmt_float_bare(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().float_bare {
            return v;
        }
        let v = self.global_string("%g", "fmt_float_bare");
        self.fmt.borrow_mut().float_bare = Some(v);
        v
    }

    pub fn fmt_str_bare(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().str_bare {
            return v;
        }
        let v = self.global_string("%s", "fmt_str_bare");
        self.fmt.borrow_mut().str_bare = Some(v);
        v
    }

    pub fn fmt_quoted_str_bare(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().quoted_str_bare {
            return v;
        }
        let v = self.global_string("\"%s\"", "fmt_quoted_str_bare");
        self.fmt.borrow_mut().quoted_str_bare = Some(v);
        v
    }

    pub fn fmt_quoted_char_bare(&self) -> PointerValue<'ctx> {
        if let Some(v) = self.fmt.borrow().quoted_char_bare {
            return v;
        }
        let v = self.global_string("'%c'", "fmt_quoted_char_bare");
        self.fmt.borrow_mut().quoted_char_bare = Some(v);
        v
    }

    /// `__print_binary(i64) -> i64`, emitted on first use of `show` on a
    /// `Bin`-typed value. Finds the highest set bit, prints MSB
    /// first with a `0b` prefix, `0b0` for zero, trailing newline, returns 0.
    pub fn get_or_build_print_binary(&self) -> FunctionValue<'ctx> {
        if let Some(f) = *self.print_binary_fn.borrow() {
            return f;
        }

        let i64_type = self.context.i64_type();
        let fn_type = i64_type.fn_type(&[i64_type.into()], false);
        let function = self.module.add_function("__print_binary", fn_type, None);

        let entry = self.context.append_basic_block(function, "entry");
        let zero_case = self.context.append_basic_block(function, "zero_case");
        let nonzero_case = self.context.append_basic_block(function, "nonzero_case");
        let find_msb = self.context.append_basic_block(function, "find_msb");
        let find_msb_body = self.context.append_basic_block(function, "find_msb_body");
        let find_msb_done = self.context.append_basic_block(function, "find_msb_done");
        let print_loop = self.context.append_basic_block(function, "print_loop");
        let print_loop_body = self.context.append_basic_block(function, "print_loop_body");
        let print_done = self.context.append_basic_block(function, "print_done");

        let saved_block = self.builder.get_insert_block();

        self.builder.position_at_end(entry);
        let value = function.get_nth_param(0).unwrap().into_int_value();
        let is_zero = self
            .builder
            .build_int_compare(inkwell::IntPredicate::EQ, value, i64_type.const_zero(), "is_zero")
            .unwrap();
        self.builder
            .build_conditional_branch(is_zero, zero_case, nonzero_case)
            .unwrap();

        self.builder.position_at_end(zero_case);
        let printf_fn = self.get_or_declare_printf();
        let zero_fmt = self.global_string("0b0\n", "fmt_bin_zero");
        self.builder
            .build_call(printf_fn, &[zero_fmt.into()], "")
            .unwrap();
        self.builder
            .build_return(Some(&i64_type.const_zero()))
            .unwrap();

        self.builder.position_at_end(nonzero_case);
        let prefix = self.global_string("0b", "fmt_bin_prefix");
        self.builder.build_call(printf_fn, &[prefix.into()], "").unwrap();
        let bit_alloca = self.builder.build_alloca(i64_type, "bit").unwrap();
        self.builder
            .build_store(bit_alloca, i64_type.const_int(63, false))
            .unwrap();
        self.builder.build_unconditional_branch(find_msb).unwrap();

        self.builder.position_at_end(find_msb);
        let bit = self
            .builder
            .build_load(i64_type, bit_alloca, "bit_val")
            .unwrap()
            .into_int_value();
        let shifted = self.builder.build_right_shift(value, bit, false, "shifted").unwrap();
        let one = i64_type.const_int(1, false);
        let masked = self.builder.build_and(shifted, one, "masked").unwrap();
        let bit_is_set = self
            .builder
            .build_int_compare(inkwell::IntPredicate::EQ, masked, one, "bit_is_set")
            .unwrap();
        self.builder
            .build_conditional_branch(bit_is_set, find_msb_done, find_msb_body)
            .unwrap();

        self.builder.position_at_end(find_msb_body);
        let next_bit = self.builder.build_int_sub(bit, one, "next_bit").unwrap();
        self.builder.build_store(bit_alloca, next_bit).unwrap();
        self.builder.build_unconditional_branch(find_msb).unwrap();

        self.builder.position_at_end(find_msb_done);
        self.builder.build_unconditional_branch(print_loop).unwrap();

        self.builder.position_at_end(print_loop);
        let cur_bit = self
            .builder
            .build_load(i64_type, bit_alloca, "cur_bit")
            .unwrap()
            .into_int_value();
        let done = self
            .builder
            .build_int_compare(inkwell::IntPredicate::SLT, cur_bit, i64_type.const_zero(), "done")
            .unwrap();
        self.builder
            .build_conditional_branch(done, print_done, print_loop_body)
            .unwrap();

        self.builder.position_at_end(print_loop_body);
        let bit2 = self
            .builder
            .build_load(i64_type, bit_alloca, "bit_val2")
            .unwrap()
            .into_int_value();
        let shifted2 = self.builder.build_right_shift(value, bit2, false, "shifted2").unwrap();
        let masked2 = self.builder.build_and(shifted2, one, "masked2").unwrap();
        let digit_char = self
            .builder
            .build_int_add(masked2, self.context.i64_type().const_int('0' as u64, false), "digit_char")
            .unwrap();
        let digit_fmt = self.global_string("%ld", "fmt_bin_digit");
        self.builder
            .build_call(printf_fn, &[digit_fmt.into(), digit_char.into()], "")
            .unwrap();
        let prev_bit = self.builder.build_int_sub(bit2, one, "prev_bit").unwrap();
        self.builder.build_store(bit_alloca, prev_bit).unwrap();
        self.builder.build_unconditional_branch(print_loop).unwrap();

        self.builder.position_at_end(print_done);
        let nl_fmt = self.global_string("\n", "fmt_bin_nl");
        self.builder.build_call(printf_fn, &[nl_fmt.into()], "").unwrap();
        self.builder
            .build_return(Some(&i64_type.const_zero()))
            .unwrap();

        if let Some(block) = saved_block {
            self.builder.position_at_end(block);
        }

        *self.print_binary_fn.borrow_mut() = Some(function);
        function
    }

    /// Create (or, in REPL mode, reuse) a module-level storage slot for a
    /// `define`d variable: a stack alloca in batch mode, an external-linkage
    /// zero-initialised global in REPL mode.
    pub fn allocate_storage(&self, name: &str, llvm_type: BasicTypeEnum<'ctx>) -> PointerValue<'ctx> {
        if self.repl_mode {
            if let Some(existing) = self.module.get_global(name) {
                return existing.as_pointer_value();
            }
            let global = self.module.add_global(llvm_type, None, name);
            global.set_linkage(Linkage::External);
            global.set_initializer(&zero_value(llvm_type));
            global.as_pointer_value()
        } else {
            self.builder.build_alloca(llvm_type, name).unwrap()
        }
    }
}

fn zero_value<'ctx>(ty: BasicTypeEnum<'ctx>) -> inkwell::values::BasicValueEnum<'ctx> {
    match ty {
        BasicTypeEnum::IntType(t) => t.const_zero().into(),
        BasicTypeEnum::FloatType(t) => t.const_zero().into(),
        BasicTypeEnum::PointerType(t) => t.const_null().into(),
        _ => unreachable!("Monad values are only ever int, float or pointer"),
    }
}
