//! Roadmap operator binary.
//!
//! Runs engine operations against a SQLite database and prints the result as
//! JSON on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use roadmap::store::SqliteStore;
use roadmap::{
    CreateRequest, Engine, EngineConfig, Feature, FeatureId, IdentityMode, VoteRequest,
};

/// Roadmap command line arguments.
#[derive(Parser, Debug)]
#[command(name = "roadmap")]
#[command(about = "Feature requests ranked by votes")]
#[command(version)]
struct Args {
    /// SQLite database file
    #[arg(long, env = "ROADMAP_DB", default_value = "roadmap.db", value_name = "PATH")]
    db: PathBuf,

    /// Upper bound on each store call, in milliseconds
    #[arg(long, env = "ROADMAP_TIMEOUT_MS", default_value_t = 5000)]
    timeout_ms: u64,

    /// Store a digest of each origin instead of the raw address
    #[arg(long, env = "ROADMAP_HASH_IDENTITIES")]
    hash_identities: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a feature request; the caller's vote is counted
    Create {
        title: String,
        /// Caller origin token (e.g. forwarded-for value)
        #[arg(long)]
        origin: String,
    },
    /// Vote for a feature
    Vote {
        id: FeatureId,
        #[arg(long)]
        origin: String,
    },
    /// Mark a feature as released
    Release { id: FeatureId },
    /// Clear the released flag
    Unrelease { id: FeatureId },
    /// Print the ranked list
    List,
    /// Delete every feature and reset the creation order
    Flush,
}

/// A single feature as printed by mutating commands.
#[derive(Serialize)]
struct FeatureOut<'a> {
    id: FeatureId,
    title: &'a str,
    score: u64,
    released: bool,
}

impl<'a> From<&'a Feature> for FeatureOut<'a> {
    fn from(f: &'a Feature) -> Self {
        Self {
            id: f.id(),
            title: f.title().as_str(),
            score: f.score(),
            released: f.is_released(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_tracing(args.verbose);

    let store = SqliteStore::open(&args.db)
        .with_context(|| format!("opening database {}", args.db.display()))?;
    info!(db = %args.db.display(), "database opened");

    let config = EngineConfig {
        op_timeout: Duration::from_millis(args.timeout_ms),
        identity_mode: if args.hash_identities {
            IdentityMode::Hashed
        } else {
            IdentityMode::Plain
        },
    };
    let engine = Engine::new(store, config);

    let output = run(&engine, args.command).await?;
    println!("{}", output);
    Ok(())
}

async fn run(engine: &Engine<SqliteStore>, command: Command) -> Result<String> {
    let json = match command {
        Command::Create { title, origin } => {
            let feature = engine.submit(&CreateRequest::new(title, origin)).await?;
            serde_json::to_string_pretty(&FeatureOut::from(&feature))?
        }
        Command::Vote { id, origin } => {
            let feature = engine.cast(&VoteRequest::new(id, origin)).await?;
            serde_json::to_string_pretty(&FeatureOut::from(&feature))?
        }
        Command::Release { id } => {
            let feature = engine.release(&id).await?;
            serde_json::to_string_pretty(&FeatureOut::from(&feature))?
        }
        Command::Unrelease { id } => {
            let feature = engine.set_released(&id, false).await?;
            serde_json::to_string_pretty(&FeatureOut::from(&feature))?
        }
        Command::List => serde_json::to_string_pretty(&engine.snapshot().await?)?,
        Command::Flush => {
            engine.flush_all().await?;
            serde_json::json!({ "body": "success" }).to_string()
        }
    };
    Ok(json)
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("roadmap=debug,roadmap_store=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
