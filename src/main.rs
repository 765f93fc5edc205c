use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use std::fs;
use std::path::PathBuf;

use statcards::github::GithubClient;
use statcards::loader::{CACHE_FILE, FileCacheSource};
use statcards::model::RenderInput;
use statcards::pipeline::prepare_user_stats;

/// statcards - aggregated GitHub activity stats for animated stat cards
#[derive(Parser, Debug)]
#[command(name = "statcards")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the render input document from cached stats
    Prepare {
        /// Accounts to aggregate, in merge order (repeatable)
        #[arg(short, long = "username", default_values_t = [String::from("jepsterrr")])]
        usernames: Vec<String>,

        /// Stats cache file to read
        #[arg(long, default_value = CACHE_FILE)]
        cache: PathBuf,

        /// Output path for the render input document
        #[arg(short, long, default_value = "input.json")]
        output: PathBuf,
    },

    /// Fetch live stats for one account and persist them to the cache
    Fetch {
        /// Account to fetch (needs ACCESS_TOKEN in the environment)
        #[arg(short, long)]
        username: String,

        /// Stats cache file to write
        #[arg(long, default_value = CACHE_FILE)]
        cache: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(err) = run(cli.command).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Prepare {
            usernames,
            cache,
            output,
        } => {
            let source = FileCacheSource::new(cache);
            let Some(user_stats) = prepare_user_stats(&source, &usernames)? else {
                info!("no usernames requested; nothing to write");
                return Ok(());
            };

            let doc = RenderInput { user_stats };
            let json = serde_json::to_string_pretty(&doc)?;
            fs::write(&output, json)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("Successfully updated {} with fresh stats!", output.display());
        }

        Commands::Fetch { username, cache } => {
            let client = GithubClient::new()?;
            info!("fetching live stats for {username}");
            let record = client.fetch_user_stats(&username).await?;

            let json = serde_json::to_string_pretty(&record)?;
            fs::write(&cache, json)
                .with_context(|| format!("failed to write {}", cache.display()))?;
            println!("Saved stats for {username} to {}", cache.display());
        }
    }

    Ok(())
}
