mod delivery;
mod lookup;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "medorch-cli")]
#[command(about = "Medicine lookup and delivery assignment tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look medicines up on every retail source and print merged records.
    Scrape {
        #[arg(required = true)]
        medicines: Vec<String>,

        /// Override MEDORCH_WORKERS_PER_SOURCE for this run.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Classify a saved ranking response (JSON file, `-` for stdin).
    Classify { path: PathBuf },
    /// Print the delivery agent nearest to a point.
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Agent registry file; defaults to MEDORCH_AGENTS_PATH.
        #[arg(long)]
        agents: Option<PathBuf>,
    },
}

impl Commands {
    /// Whether the command reads `MEDORCH_*` settings. Commands that do not
    /// keep working when the environment holds an invalid value.
    fn needs_config(&self) -> bool {
        match self {
            Commands::Scrape { .. } => true,
            Commands::Classify { .. } => false,
            Commands::Nearest { agents, .. } => agents.is_none(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("medorch-cli: use --help to list commands");
        return Ok(());
    };

    let config = if command.needs_config() {
        Some(medorch_core::load_app_config()?)
    } else {
        None
    };

    // Logs go to stderr so stdout stays machine-readable JSON.
    let log_level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match (command, config) {
        (Commands::Scrape { medicines, workers }, Some(config)) => {
            lookup::run_scrape(&config, &medicines, workers).await?;
        }
        (Commands::Classify { path }, _) => delivery::run_classify(&path)?,
        (Commands::Nearest { lat, lon, agents: Some(path) }, _) => {
            delivery::run_nearest(&path, lat, lon)?;
        }
        (Commands::Nearest { lat, lon, agents: None }, Some(config)) => {
            delivery::run_nearest(&config.agents_path, lat, lon)?;
        }
        (command, None) => anyhow::bail!("{command:?} requires the application config"),
    }

    Ok(())
}
