//! Interactive JIT REPL entry point.

use std::path::PathBuf;

use clap::Parser as ClapParser;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context as RlContext, Editor, Helper};

use inkwell::context::Context;

use monadc::codegen::context::CodegenContext;
use monadc::codegen::repl;
use monadc::diagnostics::DiagnosticSink;
use monadc::lexer::Lexer;
use monadc::parser::Parser;

/// `monad-repl [--history <path>]`.
#[derive(ClapParser, Debug)]
#[command(name = "monad-repl", about = "Interactive JIT evaluator for the Monad expression language")]
struct Args {
    /// Override the history file location (default: `.monad_history` in the
    /// current directory).
    #[arg(long = "history")]
    history: Option<PathBuf>,
}

const TYPE_KEYWORDS: &[&str] = &["Int", "Float", "Char", "String", "Hex", "Bin", "Oct", "Bool"];

/// Tab completion against the type-name keywords and every currently-bound
/// environment entry.
struct MonadHelper<'a, 'ctx> {
    ctx: &'a CodegenContext<'ctx>,
}

impl<'a, 'ctx> MonadHelper<'a, 'ctx> {
    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ctx.env.borrow().names().iter().map(|s| s.to_string()).collect();
        names.extend(TYPE_KEYWORDS.iter().map(|s| s.to_string()));
        names
    }
}

impl<'a, 'ctx> Completer for MonadHelper<'a, 'ctx> {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &RlContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos].rfind(|c: char| c.is_whitespace() || "()[]'".contains(c)).map(|i| i + 1).unwrap_or(0);
        let prefix = &line[start..pos];
        let candidates = self
            .names()
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .map(|n| Pair {
                display: n.clone(),
                replacement: n,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl<'a, 'ctx> Hinter for MonadHelper<'a, 'ctx> {
    type Hint = String;
}
impl<'a, 'ctx> Highlighter for MonadHelper<'a, 'ctx> {}
impl<'a, 'ctx> Validator for MonadHelper<'a, 'ctx> {}
impl<'a, 'ctx> Helper for MonadHelper<'a, 'ctx> {}

fn main() {
    simple_logger::SimpleLogger::new().env().init().ok();

    let args = Args::parse();

    inkwell::targets::Target::initialize_native(&inkwell::targets::InitializationConfig::default())
        .expect("failed to initialize native target");

    let context = Context::create();
    let ctx = CodegenContext::new(&context, "monad_repl", true);
    repl::register_builtins(&ctx);

    let engine = match repl::create_execution_engine(&ctx) {
        Ok(e) => e,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };
    repl::init_globals(&ctx, &engine);
    println!("Monad REPL: type an expression, Ctrl-D to exit.");

    let mut editor: Editor<MonadHelper, rustyline::history::DefaultHistory> =
        Editor::new().expect("failed to initialize line editor");
    editor.set_helper(Some(MonadHelper { ctx: &ctx }));

    let history_path = args.history.unwrap_or_else(|| PathBuf::from(".monad_history"));
    let _ = editor.load_history(&history_path);
    log::info!("loaded history from {}", history_path.display());

    loop {
        match editor.readline("monad> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());

                let sink = DiagnosticSink::new("<repl>", line.clone());

                let tokens = match Lexer::new(&line).lex() {
                    Ok(t) => t,
                    Err(e) => {
                        sink.render(&e);
                        continue;
                    }
                };
                let exprs = match Parser::parse_all(tokens) {
                    Ok(e) => e,
                    Err(e) => {
                        sink.render(&e);
                        continue;
                    }
                };

                for expr in &exprs {
                    if let Err(err) = repl::eval_top_level(&ctx, &engine, expr) {
                        sink.render(&err);
                    }
                }
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                log::error!("{err}");
                break;
            }
        }
    }

    let _ = editor.save_history(&history_path);
}
