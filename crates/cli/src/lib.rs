pub mod commands;

use basket_core::recommend::OptionOverrides;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "basket",
    about = "Market basket recommendation operator CLI",
    long_about = "Inspect configuration, validate the rule artifact, and run recommendations from the command line.",
    after_help = "Examples:\n  basket doctor --json\n  basket rules\n  basket recommend \"whole milk\" yogurt --limit 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, artifact presence, and rule store availability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Summarize the rule artifact load: rows read, accepted, and rejected")]
    Rules {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Recommend items for a product or cart using the configured rules")]
    Recommend {
        #[arg(required = true, help = "Product names; several names form a cart")]
        items: Vec<String>,
        #[arg(long, help = "Minimum rule confidence (inclusive)")]
        min_confidence: Option<f64>,
        #[arg(long, help = "Lift a rule must strictly exceed")]
        min_lift: Option<f64>,
        #[arg(long, help = "Maximum number of recommendations")]
        limit: Option<usize>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Rules { json } => commands::rules::run(json),
        Command::Recommend { items, min_confidence, min_lift, limit } => {
            commands::recommend::run(&items, OptionOverrides { min_confidence, min_lift, limit })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
