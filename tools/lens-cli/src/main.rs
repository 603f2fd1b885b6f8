//! PriceLens CLI - find a product from a photo or link and compare prices.
//!
//! Commands:
//! - `pricelens search` - Search by product URL or image file
//! - `pricelens wishlist` - Manage saved offers
//! - `pricelens history` - Show or clear past searches
//! - `pricelens config` - Manage proxy and demo-data preferences

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lens_observability::{init_logging, LogConfig, LogFormat, LogLevel};

use commands::{ConfigArgs, HistoryArgs, SearchArgs, WishlistArgs};

/// PriceLens - visual shopping search and price comparison
#[derive(Parser)]
#[command(name = "pricelens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Signed-in user; wishlist and history are kept per user
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search by product URL or image file
    Search(SearchArgs),

    /// Manage the wishlist
    Wishlist(WishlistArgs),

    /// Show or clear search history
    History(HistoryArgs),

    /// Manage configuration and preferences
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Library logs go to stderr and stay quiet unless asked for
    let log_config = LogConfig::new(LogLevel::from_verbose(cli.verbose), LogFormat::Human);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("warning: {}", e);
    }

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = match context::Context::load(cli.config.as_deref(), cli.user.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Search(args) => commands::search::run(args, &ctx).await,
        Commands::Wishlist(args) => commands::wishlist::run(args, &ctx).await,
        Commands::History(args) => commands::history::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
