//! o3c — reads one source file, runs the pipeline, and prints whatever was
//! asked for to stdout/stderr. No backend selection, no clang/LLVM
//! invocation, no object-file writing: those layers are out of scope.

use clap::Parser as ClapParser;
use o3c::common::DiagnosticReporter;
use o3c::lower::CompileOptions;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser, Debug)]
#[command(name = "o3c")]
#[command(author = "o3c contributors")]
#[command(version)]
#[command(about = "Native frontend for the o3 Objective-C-3 dialect", long_about = None)]
struct Args {
    /// Input source file
    #[arg(required = true)]
    input: PathBuf,

    /// Dump the lexer's token stream
    #[arg(long)]
    dump_tokens: bool,

    /// Dump the parsed AST
    #[arg(long)]
    dump_ast: bool,

    /// Dump the emitted textual IR
    #[arg(long)]
    dump_ir: bool,

    /// Dump the compile manifest as JSON
    #[arg(long)]
    dump_manifest: bool,

    /// Maximum fixed message-send argument slots in the runtime dispatch ABI
    #[arg(short = 'o', long, default_value_t = o3c::lower::DEFAULT_ARG_SLOTS)]
    max_message_send_args: usize,

    /// Runtime dispatch symbol name baked into the IR header
    #[arg(long, default_value_t = o3c::lower::DEFAULT_RUNTIME_DISPATCH_SYMBOL.to_string())]
    runtime_dispatch_symbol: String,
}

fn main() {
    let args = Args::parse();
    if let Err(message) = run(&args) {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let source = fs::read_to_string(&args.input).map_err(|e| e.to_string())?;
    let filename = args.input.display().to_string();

    if args.dump_tokens {
        let (tokens, _) = o3c::lexer::lex(&source);
        eprintln!("=== tokens ===");
        for token in &tokens {
            eprintln!("{:?} {:?} @{}", token.kind, token.text, token.pos);
        }
    }

    if args.dump_ast {
        let (tokens, _) = o3c::lexer::lex(&source);
        let program = o3c::parser::parse(tokens);
        eprintln!("=== ast ===");
        eprintln!("{:#?}", program);
    }

    let options = CompileOptions {
        max_message_send_args: args.max_message_send_args,
        runtime_dispatch_symbol: args.runtime_dispatch_symbol.clone(),
    };
    let output = o3c::compile(&source, &options);

    if !output.diagnostics.is_empty() {
        let mut reporter = DiagnosticReporter::new();
        let file_id = reporter.add_file(filename, source);
        for diag in &output.diagnostics {
            reporter.report(file_id, diag);
        }
        return Err(format!("{} diagnostic(s)", output.diagnostics.len()));
    }

    if args.dump_ir {
        if let Some(ir) = &output.ir {
            println!("{}", ir);
        }
    }

    if args.dump_manifest {
        if let Some(manifest) = &output.manifest {
            println!("{}", manifest.to_json_pretty());
        }
    }

    Ok(())
}
