//! fcast-read - Read-only queries: search, notifications, profiles, feeds

use clap::{Parser, Subcommand};
use libfcast::logging;
use libfcast::service::reader::DEFAULT_LIMIT;
use libfcast::service::{Reader, SearchOptions};
use libfcast::{Config, FcastError, Result};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "fcast-read")]
#[command(version)]
#[command(about = "Read-only Farcaster queries")]
#[command(long_about = r#"Read-only Farcaster queries. Results are printed as JSON.

Never touches the local state file and never posts.

EXAMPLES:
    fcast-read search "rust async" --min-followers 100 --max-age 6h
    fcast-read notifications --limit 10
    fcast-read user dwr
    fcast-read feed 3 --limit 5
    fcast-read trending --channel rust
    fcast-read thread 0xabc123 --pretty | jq '.cast.text'

EXIT CODES:
    0 - Success
    1 - API or network failure
    2 - Missing API key
    3 - Invalid input (unknown user, missing FID)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search casts
    Search {
        query: String,

        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Drop casts from authors with fewer followers
        #[arg(long, value_name = "N")]
        min_followers: Option<u64>,

        /// Drop casts older than this (30m, 6h, 2d)
        #[arg(long, value_name = "AGE")]
        max_age: Option<String>,
    },

    /// Notifications for an FID (defaults to the configured FID)
    Notifications {
        #[arg(long)]
        fid: Option<u64>,

        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Look up a profile by FID or username
    User { target: String },

    /// Recent casts by a user (FID or username)
    Feed {
        target: String,

        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Trending casts from the last 24 hours
    Trending {
        #[arg(short, long)]
        channel: Option<String>,

        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Conversation around a cast
    Thread { hash: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn print_json(value: &Value, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| FcastError::InvalidInput(format!("Failed to encode output: {}", e)))?;
    println!("{}", out);
    Ok(())
}

async fn require_fid(reader: &Reader, target: &str) -> Result<u64> {
    reader
        .resolve_fid(target)
        .await?
        .ok_or_else(|| FcastError::InvalidInput(format!("User not found: {}", target)))
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let reader = Reader::from_config(&config)?;

    let value = match cli.command {
        Commands::Search {
            query,
            limit,
            min_followers,
            max_age,
        } => {
            let options = SearchOptions {
                limit,
                min_followers,
                max_age,
            };
            Value::Array(reader.search(&query, &options).await?)
        }
        Commands::Notifications { fid, limit } => {
            Value::Array(reader.notifications(fid, limit).await?)
        }
        Commands::User { target } => {
            let user = if target.bytes().all(|b| b.is_ascii_digit()) && !target.is_empty() {
                let fid = require_fid(&reader, &target).await?;
                reader.user(fid).await?
            } else {
                reader.user_by_name(target.trim_start_matches('@')).await?
            };
            user.ok_or_else(|| FcastError::InvalidInput(format!("User not found: {}", target)))?
        }
        Commands::Feed { target, limit } => {
            let fid = require_fid(&reader, &target).await?;
            Value::Array(reader.feed(fid, limit).await?)
        }
        Commands::Trending { channel, limit } => {
            Value::Array(reader.trending(channel.as_deref(), limit).await?)
        }
        Commands::Thread { hash } => reader
            .thread(&hash)
            .await?
            .ok_or_else(|| FcastError::InvalidInput(format!("Cast not found: {}", hash)))?,
    };

    print_json(&value, cli.pretty)
}
