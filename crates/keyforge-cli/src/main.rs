//! KeyForge CLI
//!
//! Inspect how templates are classified and what keys they produce.

use clap::{Parser, Subcommand};
use keyforge_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "keyforge")]
#[command(about = "KeyForge - Resource key template engine", long_about = None)]
struct Cli {
    /// Emit debug logs for compilation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print how a template would be evaluated
    Classify(commands::classify::ClassifyArgs),
    /// Compile a template and evaluate it against JSON arguments
    Eval(commands::eval::EvalArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Classify(args) => commands::classify::execute(args),
        Commands::Eval(args) => commands::eval::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
