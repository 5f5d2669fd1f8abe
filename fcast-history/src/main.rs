use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use libfcast::state::now_millis;
use libfcast::{PostRecord, StateStore};
use serde::Serialize;

const RATE_WINDOW: Duration = Duration::from_secs(3600);

#[derive(Parser, Debug)]
#[command(name = "fcast-history")]
#[command(version, about = "Inspect the local posting state")]
#[command(long_about = r#"Inspect the local posting state: recent casts, live cooldowns, and
how many casts count against the hourly rate limit.

EXAMPLES:
    # Show last 20 casts (default)
    fcast-history

    # Show more casts
    fcast-history --limit 50

    # JSON output for scripting
    fcast-history --format json | jq '.[] | .hash'

    # JSONL output (one JSON object per line)
    fcast-history --format jsonl

    # Cooldowns that are still running
    fcast-history --cooldowns

    # Casts in the current rate window
    fcast-history --window

OUTPUT FORMATS:
    text  - Human-readable text with timestamps (default)
    json  - JSON array
    jsonl - JSON lines, one object per line (streaming-friendly)

EXIT CODES:
    0 - Success (including empty results)
    1 - Error (state file not found, unreadable config, etc.)
"#)]
struct Args {
    /// Maximum number of casts to return
    #[arg(short, long, default_value = "20", value_name = "N")]
    limit: usize,

    /// Output format
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    #[arg(value_parser = ["text", "json", "jsonl"])]
    format: String,

    /// List live cooldowns instead of casts
    #[arg(long, conflicts_with = "window")]
    cooldowns: bool,

    /// Count casts in the last hour instead of listing them
    #[arg(long)]
    window: bool,

    /// State file path (overrides FARCASTER_STATE_PATH and config)
    #[arg(long, value_name = "PATH")]
    state: Option<String>,
}

/// A cooldown that has not expired yet
#[derive(Debug, Serialize)]
struct CooldownEntry {
    key: String,
    until: i64,
    remaining_secs: i64,
}

#[derive(Debug, Serialize)]
struct WindowSummary {
    casts: usize,
    max_per_hour: usize,
}

/// Drop expired cooldowns (persisting the removal) and return the rest.
fn live_cooldowns(store: &mut StateStore, now: i64) -> Vec<CooldownEntry> {
    let keys: Vec<String> = store.data().cooldowns.keys().cloned().collect();
    let mut entries = Vec::new();
    for key in keys {
        if !store.is_on_cooldown_at(&key, now) {
            continue;
        }
        if let Some(&until) = store.data().cooldowns.get(&key) {
            entries.push(CooldownEntry {
                key,
                until,
                remaining_secs: (until - now + 999) / 1000,
            });
        }
    }
    entries
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_else(chrono::Utc::now)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn preview(text: &str) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > 60 {
        format!("{}...", single_line.chars().take(60).collect::<String>())
    } else {
        single_line
    }
}

fn print_records<T: Serialize>(format: &str, records: &[T]) -> Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(records)?),
        _ => {
            for record in records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}

fn print_posts(format: &str, posts: &[PostRecord]) -> Result<()> {
    if format != "text" {
        return print_records(format, posts);
    }

    for post in posts {
        println!(
            "{} | {} | {}",
            format_timestamp(post.timestamp),
            post.external_id,
            preview(&post.text)
        );
        if let Some(ref channel) = post.channel {
            println!("  channel: {}", channel);
        }
        if let Some(ref parent) = post.reply_to {
            println!("  reply to: {}", parent);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    libfcast::logging::init(false);

    let args = Args::parse();

    tracing::debug!("fcast-history started with args: {:?}", args);

    let config = libfcast::Config::load().context("Failed to load configuration")?;
    let state_path = libfcast::config::resolve_state_path(args.state.as_deref(), &config)
        .context("Failed to resolve state path")?;

    if !state_path.exists() {
        eprintln!("Error: State file not found at {}", state_path.display());
        eprintln!("Have you posted anything yet? Try: fcast-post 'gm'");
        std::process::exit(1);
    }

    let mut store = StateStore::open(&state_path, config.state.history_size);
    let now = now_millis();

    if args.cooldowns {
        let entries = live_cooldowns(&mut store, now);
        if args.format == "text" {
            for entry in &entries {
                let remaining = Duration::from_secs(entry.remaining_secs.max(0) as u64);
                println!(
                    "{} | until {} | {} left",
                    entry.key,
                    format_timestamp(entry.until),
                    humantime::format_duration(remaining)
                );
            }
            return Ok(());
        }
        return print_records(&args.format, &entries);
    }

    if args.window {
        let summary = WindowSummary {
            casts: store.posts_in_window_at(RATE_WINDOW, now),
            max_per_hour: config.guards.max_per_hour,
        };
        if args.format == "text" {
            println!(
                "{}/{} casts in the last hour",
                summary.casts, summary.max_per_hour
            );
        } else {
            println!("{}", serde_json::to_string(&summary)?);
        }
        return Ok(());
    }

    print_posts(&args.format, store.recent_posts(args.limit))
}
