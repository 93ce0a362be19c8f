//! Batch compiler entry point.

use std::path::PathBuf;

use clap::Parser as ClapParser;

use monadc::driver::{self, CompileOptions, EmitFlags};

/// `monadc <file.mon> [options]`.
#[derive(ClapParser, Debug)]
#[command(name = "monadc", about = "Compiler for the Monad expression language")]
struct Args {
    /// Source file to compile.
    input_file: PathBuf,

    /// Output base name (default: input stem).
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Write `<name>.ll`.
    #[arg(long = "emit-ir")]
    emit_ir: bool,

    /// Write `<name>.bc`.
    #[arg(long = "emit-bc")]
    emit_bc: bool,

    /// Write `<name>.s`.
    #[arg(long = "emit-asm")]
    emit_asm: bool,

    /// Write `<name>.o`.
    #[arg(long = "emit-obj")]
    emit_obj: bool,
}

fn main() {
    simple_logger::SimpleLogger::new().env().init().ok();

    let args = Args::parse();

    let opts = CompileOptions {
        input_file: args.input_file,
        output_name: args.output,
        emit: EmitFlags {
            ir: args.emit_ir,
            bc: args.emit_bc,
            asm: args.emit_asm,
            obj: args.emit_obj,
        },
    };

    if let Err(err) = driver::compile(&opts) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
