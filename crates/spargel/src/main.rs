//! `spargel <file> [--dump-ast]`
//!
//! Parses a Spargel source file, printing diagnostics to stderr and, on
//! request, the syntax tree to stdout. Exits with 1 when no file is given, the
//! file cannot be read, or any error was reported.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use spargel::{CompileOptions, CompileOutput, compile_file};

#[derive(Parser, Debug)]
#[command(name = "spargel", version)]
#[command(about = "Parse a Spargel source file and report syntax errors")]
struct Args {
    /// Source file to compile
    input: Option<PathBuf>,

    /// Print the syntax tree to stdout
    #[arg(long = "dump-ast")]
    dump_ast: bool,
}

fn main() {
    spargel::init_logging();
    let args = Args::parse();
    process::exit(run(&args));
}

fn run(args: &Args) -> i32 {
    let Some(input) = &args.input else {
        eprintln!("error: no input file");
        return 1;
    };

    let options = CompileOptions {
        dump_ast: args.dump_ast,
    };
    match compile_file(input, &options) {
        Ok(output) => {
            if let Some(dump) = &output.dump {
                print!("{dump}");
            }
            exit_code(&output)
        }
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn exit_code(output: &CompileOutput) -> i32 {
    if output.has_errors() { 1 } else { 0 }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
