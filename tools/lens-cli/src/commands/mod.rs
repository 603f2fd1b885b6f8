//! CLI command implementations.

pub mod config;
pub mod history;
pub mod search;
pub mod wishlist;

use clap::{Args, Subcommand};

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// Product URL, search text, or path to an image file.
    pub input: String,

    /// Maximum number of results (default from config).
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Search the books category.
    #[arg(short, long)]
    pub book: bool,

    /// Use demo data for this search.
    #[arg(long, conflicts_with = "live")]
    pub mock: bool,

    /// Query the provider even if demo data is enabled.
    #[arg(long)]
    pub live: bool,

    /// Use the relay at this index for this search.
    #[arg(long, conflicts_with = "direct")]
    pub proxy: Option<usize>,

    /// Skip relays for this search.
    #[arg(long)]
    pub direct: bool,

    /// Add (or remove) the result at this position in the wishlist.
    #[arg(short, long, value_name = "POS")]
    pub save: Option<u32>,
}

/// Arguments for the wishlist command.
#[derive(Args)]
pub struct WishlistArgs {
    #[command(subcommand)]
    pub command: Option<WishlistCommand>,
}

#[derive(Subcommand)]
pub enum WishlistCommand {
    /// List saved offers.
    List,
    /// Remove a saved offer.
    Remove {
        /// Wishlist item ID.
        id: String,
    },
    /// Remove every saved offer.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the history command.
#[derive(Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: Option<HistoryCommand>,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List past searches, newest first.
    List,
    /// Forget every past search.
    Clear {
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Select the relay used for shopping searches.
    Proxy {
        /// Relay index (see `config show`).
        index: usize,
    },
    /// Turn demo data on or off.
    Mock {
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Print the config file and data directory paths.
    Path,
    /// Write a config file with the current settings.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
