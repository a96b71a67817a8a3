//! agoraindex CLI — inspect and manage indexer state.
//!
//! Usage:
//! ```bash
//! agoraindex status --db ./agora.db --id topics
//! agoraindex reset  --db ./agora.db --id topics
//! agoraindex info
//! ```

use std::env;
use std::process;

use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use tracing_subscriber::EnvFilter;

use agoraindex_core::cursor::CursorStore;
use agoraindex_storage::sqlite::SqliteStorage;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "info" => cmd_info(),
        "status" => cmd_status(&args[2..]).await?,
        "reset" => cmd_reset(&args[2..]).await?,
        "version" | "--version" | "-V" => {
            println!("agoraindex {}", env!("CARGO_PKG_VERSION"));
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
    Ok(())
}

fn print_usage() {
    println!("agoraindex {}", env!("CARGO_PKG_VERSION"));
    println!("Event indexing and aggregation engine for the Agora platform\n");
    println!("USAGE:");
    println!("    agoraindex <COMMAND>\n");
    println!("COMMANDS:");
    println!("    status   Show the persisted cursor (--db <path> --id <indexer>)");
    println!("    reset    Delete the persisted cursor (--db <path> --id <indexer>)");
    println!("    info     Show AgoraIndex configuration info");
    println!("    version  Print version");
    println!("    help     Print this help");
}

fn cmd_info() {
    println!("AgoraIndex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Default reconnect budget: 5 attempts, 500ms initial backoff");
    println!("  Storage backends: memory, SQLite (feature: sqlite)");
    println!("  Aggregates: contract_state, epoch_state, user_profile, user_epoch_state");
    println!("  Event kinds: {} registered", agoraindex_aggregates::build_registry().len());
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn open_args(args: &[String]) -> Result<(String, String)> {
    let Some(db) = flag_value(args, "--db") else {
        bail!("missing --db <path>");
    };
    let Some(id) = flag_value(args, "--id") else {
        bail!("missing --id <indexer>");
    };
    Ok((db.to_string(), id.to_string()))
}

async fn cmd_status(args: &[String]) -> Result<()> {
    let (db, id) = open_args(args)?;
    let store = SqliteStorage::open(&db)
        .await
        .with_context(|| format!("opening {db}"))?;

    match store.load(&id).await? {
        Some(cursor) => {
            let saved = Utc
                .timestamp_opt(cursor.updated_at, 0)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| cursor.updated_at.to_string());
            println!("indexer:  {id}");
            println!("block:    {}", cursor.block_number);
            println!("hash:     {}", cursor.block_hash);
            println!("saved at: {saved}");
        }
        None => println!("no cursor persisted for indexer '{id}'"),
    }
    Ok(())
}

async fn cmd_reset(args: &[String]) -> Result<()> {
    let (db, id) = open_args(args)?;
    let store = SqliteStorage::open(&db)
        .await
        .with_context(|| format!("opening {db}"))?;
    store.delete(&id).await?;
    println!("cursor for '{id}' deleted; next run re-indexes from the configured start");
    Ok(())
}
