mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::cash_flow::{IrrArgs, MpspArgs, NpvArgs};

/// Techno-economic cash-flow analysis
#[derive(Parser)]
#[command(
    name = "tea",
    version,
    about = "Techno-economic cash-flow analysis",
    long_about = "Project a facility's year-by-year cash flows from capital, operating \
                  and financing inputs with decimal precision, then solve for NPV, \
                  the IRR at a target NPV, or the minimum product selling price."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Net present value at a given IRR
    Npv(NpvArgs),
    /// IRR at which NPV reaches a target
    Irr(IrrArgs),
    /// Minimum product selling price at a given IRR
    Mpsp(MpspArgs),
    /// Print the default value of every optional parameter
    Defaults,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Npv(args) => commands::cash_flow::run_npv(args),
        Commands::Irr(args) => commands::cash_flow::run_irr(args),
        Commands::Mpsp(args) => commands::cash_flow::run_mpsp(args),
        Commands::Defaults => commands::cash_flow::run_defaults(),
        Commands::Version => {
            println!("tea {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            if let Err(e) = output::format_output(&cli.output, &value) {
                eprintln!("{}: {}", "error".red().bold(), e);
                process::exit(1);
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
