//! CLI entry point for basketbook.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use basketbook_cli::config::Config;
use basketbook_cli::error::Error;
use basketbook_cli::report;
use basketbook_cli::runner::{self, RunOptions};

#[derive(Parser)]
#[command(name = "basketbook")]
#[command(about = "Delta-one basket NAV simulator with daily PnL attribution")]
#[command(version)]
struct Cli {
    /// Path to basket config (TOML)
    #[arg(long, default_value = "basket.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate the basket and print NAV, attribution, and metrics
    Run {
        /// Path to the price table (CSV: date,SYM1,SYM2,...)
        prices: PathBuf,

        /// Rebalance schedule (JSON)
        #[arg(long)]
        schedule: Option<PathBuf>,

        /// Write full results as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Trailing NAV rows to print (overrides [output].tail)
        #[arg(long)]
        tail: Option<usize>,

        /// Do not append to the audit trail
        #[arg(long)]
        no_audit: bool,
    },

    /// Load and check inputs without simulating
    Validate {
        /// Path to the price table (CSV)
        prices: PathBuf,

        /// Rebalance schedule (JSON)
        #[arg(long)]
        schedule: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run {
            prices,
            schedule,
            output,
            tail,
            no_audit,
        } => {
            let opts = RunOptions {
                prices_file: prices,
                schedule_file: schedule,
                output_file: output,
                audit: !no_audit,
            };
            runner::run(&config, &opts).map(|results| {
                print!("{}", report::render(&results, tail.unwrap_or(config.output.tail)));
            })
        }
        Command::Validate { prices, schedule } => {
            let opts = RunOptions {
                prices_file: prices,
                schedule_file: schedule,
                ..RunOptions::default()
            };
            runner::validate(&config, &opts).map(|summary| print!("{summary}"))
        }
    };

    if let Err(e) = result {
        report_error(&e);
        process::exit(e.exit_code());
    }
}

fn report_error(e: &Error) {
    if e.is_simulation_failure() {
        eprintln!("Simulation failed: {e}");
    } else {
        eprintln!("Error: {e}");
    }
}
