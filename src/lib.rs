//! Monad: a Lisp-shaped, statically-typed expression language compiled to
//! native code through LLVM, with an interactive JIT REPL sharing the same
//! codegen core as the batch compiler.

pub mod codegen;
pub mod diagnostics;
pub mod driver;
pub mod env;
pub mod lexer;
pub mod parser;
pub mod types;
