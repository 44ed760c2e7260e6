pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::{price::PriceArgs, rates::RatesArgs};

#[derive(Debug, Parser)]
#[command(
    name = "tidyquote",
    about = "Tidyquote operator CLI",
    long_about = "Price cleaning quotes against the rate catalog, inspect rates and configuration, and run readiness checks.",
    after_help = "Examples:\n  tidyquote price --square-footage 1500 --frequency weekly --add-on pethaircleanup\n  tidyquote rates --category surcharge\n  tidyquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Price a quote request against the configured rate catalog")]
    Price {
        #[arg(long, help = "Home size in square feet")]
        square_footage: i64,
        #[arg(long, help = "weekly, biweekly, monthly or oneTime")]
        frequency: Option<String>,
        #[arg(long = "add-on", help = "Add-on key, repeatable (e.g. pethaircleanup)")]
        add_ons: Vec<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List active rates, optionally for one category")]
    Rates {
        #[arg(long, help = "squareFootage, surcharge or discount")]
        category: Option<String>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and rate catalog coverage")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Price { square_footage, frequency, add_ons, json } => {
            commands::price::run(&PriceArgs { square_footage, frequency, add_ons, json })
        }
        Command::Rates { category, json } => commands::rates::run(&RatesArgs { category, json }),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
