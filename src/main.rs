use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use gator::{AppState, Commands, Config, Console, Database, Result, Session};

/// Command-line RSS feed aggregator.
#[derive(Parser, Debug)]
#[command(name = "gator", version)]
#[command(about = "Command-line RSS feed aggregator", long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(long, short, default_value = "gator.toml")]
    config: PathBuf,

    /// Command to run.
    command: String,

    /// Arguments for the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config = match Config::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    if let Err(e) = gator::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        gator::logging::init_console_only(&config.logging.level);
    }

    match run(config, &args.command, &args.args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, command: &str, args: &[String]) -> Result<()> {
    config.validate()?;

    let db = Database::open(&config.database.path).await?;
    let session = Session::load(&config.session.path)?;
    let mut state = AppState::new(config, db, session, Console::stdout());

    debug!(command, "Dispatching command");
    Commands::builtin().run(&mut state, command, args).await
}
