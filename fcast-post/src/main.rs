//! fcast-post - Publish a cast through the safety guards

use std::io::{IsTerminal, Read};
use std::time::Duration;

use clap::Parser;
use libfcast::logging;
use libfcast::types::{CastOptions, PostOutcome, PostStage, ReplyTarget, TargetCooldown};
use libfcast::{Config, FcastError, FcastService, Result};

#[derive(Parser, Debug)]
#[command(name = "fcast-post")]
#[command(version)]
#[command(about = "Publish a cast through the safety guards")]
#[command(long_about = r#"Publish a cast through the safety guards.

Every cast runs through the content validator, the PII filter, and the rate
limiter before anything is signed. The first guard to object wins and nothing
is sent.

EXAMPLES:
    fcast-post "shipped a new release"
    echo "gm" | fcast-post --channel rust
    fcast-post --reply 0xabc123:3 "agreed"
    fcast-post --cooldown-key fid:3 --cooldown 1h --reply 0xabc123:3 "thanks!"
    fcast-post --format json "hello" | jq .hash

ENVIRONMENT:
    NEYNAR_API_KEY         API key for the hub and query endpoints
    SIGNER_KEY_PATH        Signer key file ({"fid": N, "signerPrivateKey": "0x..."})
    FARCASTER_FID          FID override
    FARCASTER_STATE_PATH   State file location
    FCAST_CONFIG           Config file location

EXIT CODES:
    0 - Cast posted
    1 - Hub or network failure
    2 - Signer or credential problem
    3 - Rejected by a guard, or invalid input
"#)]
struct Cli {
    /// Cast text (reads from stdin if not provided)
    text: Option<String>,

    /// Post into a channel
    #[arg(short, long, value_name = "CHANNEL")]
    channel: Option<String>,

    /// Reply to a cast, given as HASH:FID
    #[arg(short, long, value_name = "HASH:FID")]
    reply: Option<String>,

    /// Attach a URL embed (repeatable)
    #[arg(short, long = "embed", value_name = "URL")]
    embeds: Vec<String>,

    /// Cooldown key to check and set (e.g. fid:3)
    #[arg(long, value_name = "KEY", requires = "cooldown")]
    cooldown_key: Option<String>,

    /// Cooldown length, e.g. 30m or 1h
    #[arg(long, value_name = "DURATION", requires = "cooldown_key")]
    #[arg(value_parser = humantime::parse_duration)]
    cooldown: Option<Duration>,

    /// Skip all guards
    #[arg(long)]
    no_guards: bool,

    /// State file path (overrides FARCASTER_STATE_PATH and config)
    #[arg(long, value_name = "PATH")]
    state: Option<String>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn read_text(arg: Option<String>) -> Result<String> {
    let text = match arg {
        Some(text) => text,
        None => {
            let mut stdin = std::io::stdin();
            if stdin.is_terminal() {
                return Err(FcastError::InvalidInput(
                    "No text given. Pass it as an argument or pipe it on stdin".to_string(),
                ));
            }
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .map_err(|e| FcastError::InvalidInput(format!("Failed to read stdin: {}", e)))?;
            buf
        }
    };

    if text.trim().is_empty() {
        return Err(FcastError::InvalidInput("Cast text is empty".to_string()));
    }
    Ok(text)
}

fn build_options(cli: &Cli) -> Result<CastOptions> {
    let reply_to = cli
        .reply
        .as_deref()
        .map(|raw| {
            ReplyTarget::parse(raw).ok_or_else(|| {
                FcastError::InvalidInput(format!("Invalid --reply '{}', expected HASH:FID", raw))
            })
        })
        .transpose()?;

    let cooldown = match (&cli.cooldown_key, cli.cooldown) {
        (Some(key), Some(duration)) => Some(TargetCooldown {
            key: key.clone(),
            duration,
        }),
        _ => None,
    };

    Ok(CastOptions {
        channel: cli.channel.clone(),
        embeds: cli.embeds.clone(),
        reply_to,
        cooldown,
    })
}

fn exit_code(outcome: &PostOutcome) -> i32 {
    match outcome {
        PostOutcome::Posted { .. } => 0,
        PostOutcome::Rejected { .. } => 3,
        PostOutcome::Failed {
            stage: PostStage::Sign,
            ..
        } => 2,
        PostOutcome::Failed { .. } => 1,
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let options = build_options(&cli)?;
    let text = read_text(cli.text.clone())?;

    let config = Config::load()?;
    let mut service = FcastService::from_config(&config, cli.state.as_deref())?;
    if cli.no_guards {
        tracing::warn!("Guards disabled for this cast");
        service = service.with_guards(false);
    }

    let outcome = service.post(text.trim(), options).await;

    if cli.format == "json" {
        println!("{}", outcome.to_json());
    } else {
        match &outcome {
            PostOutcome::Posted { hash, .. } => println!("{}", hash),
            PostOutcome::Rejected { guard, reason } => {
                eprintln!("Rejected by {} guard: {}", guard, reason)
            }
            PostOutcome::Failed { reason, .. } => eprintln!("Error: {}", reason),
        }
    }

    Ok(exit_code(&outcome))
}
