use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use std::io;
use std::path::PathBuf;

use edu_ledger::cli::{run_demo, Repl};
use edu_ledger::{Ledger, LedgerConfig};

#[derive(Parser)]
#[command(name = "edu-ledger", version, about = "A minimal educational ledger")]
struct Cli {
    /// JSON file with ledger settings; missing keys use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Coins issued to the miner of each block
    #[arg(long)]
    reward: Option<f64>,

    /// Give up sealing a block after this many rejected proofs
    #[arg(long)]
    max_attempts: Option<u64>,

    /// Account credited by the REPL's `mine-block`
    #[arg(long)]
    miner: Option<String>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive prompt (default)
    Repl,
    /// Run the scripted walkthrough
    Demo {
        /// Print the chain as JSON
        #[arg(long)]
        json: bool,
    },
}

// Build the ledger configuration from the optional file and flag overrides
fn load_config(cli: &Cli) -> anyhow::Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LedgerConfig::default(),
    };

    if let Some(reward) = cli.reward {
        config.mining_reward = reward;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.max_proof_attempts = Some(max_attempts);
    }
    if let Some(miner) = &cli.miner {
        config.miner_name = miner.clone();
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(cli.log_level.as_str()));

    let config = load_config(&cli)?;
    let mut ledger = Ledger::with_config(config).context("Invalid ledger configuration")?;

    match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => {
            info!("Starting interactive ledger, type 'help' for commands");
            let stdin = io::stdin();
            let mut repl = Repl::new(ledger, stdin.lock(), io::stdout());
            repl.run()
        }
        Command::Demo { json } => {
            let stdout = io::stdout();
            run_demo(&mut ledger, &mut stdout.lock(), json)
        }
    }
}
