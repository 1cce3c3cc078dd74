//! `minic` CLI entry point: reads one source string from argv and writes
//! the compiled assembly to stdout.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

/// Compile a tiny C-like expression language to x86-64 assembly (Intel syntax).
#[derive(Parser)]
#[command(name = "minic", about, version)]
struct Cli {
    /// Source code to compile
    source: String,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "error",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match minic_core::compile(&cli.source) {
        Ok(asm) => print!("{asm}"),
        Err(err) => {
            report_error(&cli.source, &err);
            std::process::exit(1);
        }
    }
}

/// Prints the error message plus, when the error carries a byte offset, a
/// caret-marker line under the offending position in the source.
fn report_error(source: &str, err: &minic_core::CompileError) {
    eprintln!("{} {err}", "error:".red().bold());
    if let Some(offset) = err.offset() {
        eprintln!("{source}");
        eprintln!("{}^", " ".repeat(offset));
    }
    tracing::error!(%err, "compilation failed");
}
