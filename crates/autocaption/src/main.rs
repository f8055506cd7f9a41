//! Autocaption CLI - upload photos, get a caption and hashtags, schedule a post.
//!
//! Autocaption runs a small web service: upload an image, a vision model
//! describes it, hashtags are derived from the description and a simulated
//! social post fires a minute later.
//!
//! # Usage
//!
//! ```bash
//! # Run the web service
//! autocaption serve --port 8000
//!
//! # Caption local files without the server
//! autocaption caption photo.jpg --length 40
//!
//! # View configuration
//! autocaption config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Autocaption - caption photos, derive hashtags and schedule posts.
#[derive(Parser, Debug)]
#[command(name = "autocaption")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "AUTOCAPTION_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the upload web service
    Serve(cli::serve::ServeArgs),

    /// Caption local image files and print the results
    Caption(cli::caption::CaptionArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = cli::load_config(cli.config.as_deref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Autocaption v{}", autocaption_core::VERSION);

    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Caption(args) => cli::caption::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, cli.config).await,
    }
}
