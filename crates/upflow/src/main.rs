mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "upflow")]
#[command(about = "One command from an image, a folder or a repo to a running container app.", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a container app and everything it needs
    Up(Box<commands::up::UpArgs>),
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Version needs neither configuration nor a login
    if matches!(cli.command, Commands::Version) {
        println!("upflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = upflow_config::Config::load()?;
    init_tracing(cli.verbose, config.log_level.as_deref());

    match cli.command {
        Commands::Up(args) => commands::up::handle(*args, &config).await?,
        Commands::Version => {}
    }

    Ok(())
}

/// Logs go to stderr. `RUST_LOG` wins over the configured level.
fn init_tracing(verbose: bool, configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(configured.unwrap_or("warn")));
    let filter = if verbose {
        filter.add_directive(tracing::Level::DEBUG.into())
    } else {
        filter
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
