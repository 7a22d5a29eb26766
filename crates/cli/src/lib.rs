pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use basket_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "basket",
    about = "Basket recommender operator CLI",
    long_about = "Recommend products for a cart from mined association rules and item similarity, and inspect the loaded artifacts and configuration.",
    after_help = "Examples:\n  basket seed\n  basket recommend --item bread --item milk\n  basket doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a basket.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory holding catalog.json, rules.json and neighbors.json")]
    artifacts_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rank additional products for the given cart")]
    Recommend {
        #[arg(long = "item", short = 'i', required = true, help = "Product identifier or name in the cart (repeatable)")]
        items: Vec<String>,
        #[arg(long, help = "Number of recommendations to return (defaults to recommend.top_n)")]
        top_n: Option<usize>,
        #[arg(long, help = "Weight of similarity signals (defaults to recommend.alpha)")]
        alpha: Option<f64>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List the products in the loaded catalog")]
    Catalog {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Write the deterministic demo artifacts to the configured paths")]
    Seed {
        #[arg(long, help = "Overwrite existing artifact files")]
        force: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config and artifact readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                artifacts_dir: self.artifacts_dir.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    if let Ok(config) = AppConfig::load(options.clone()) {
        if let Err(error) = logging::init_logging(&config.logging) {
            eprintln!("{error:#}");
        }
    }

    let result = match cli.command {
        Command::Recommend { items, top_n, alpha, json } => commands::recommend::run(
            &options,
            &commands::recommend::RecommendArgs { items, top_n, alpha, json },
        ),
        Command::Catalog { json } => commands::catalog::run(&options, json),
        Command::Seed { force } => commands::seed::run(&options, force),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
        Command::Doctor { json } => commands::doctor::run(&options, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
