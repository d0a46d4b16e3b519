//! Session Warden - keeps a messaging agent's transport session alive and
//! escalates to the operator when it cannot.

mod app;

use std::path::PathBuf;

use agent_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};

/// Session Warden command-line interface.
#[derive(Parser)]
#[command(name = "session-warden")]
#[command(about = "Session supervisor for a messaging agent with an operator channel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, credentials, logs). Defaults to ~/.session-warden
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent (default)
    Run,
    /// Validate the configuration and print the resolved settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    match cli.command {
        Some(Commands::CheckConfig) => {
            app::check_config(&config, &paths)?;
        }
        Some(Commands::Run) | None => {
            let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
            init_logging(level, Some(paths.log_file()));
            app::run_agent(config, paths).await?;
        }
    }

    Ok(())
}
