//! ChainEvents CLI: inspect contract events, decode logs, query history and
//! watch live events.
//!
//! # Commands
//! ```text
//! chainevents schema      --abi <path.json> [--event <name>]
//! chainevents decode-log  --abi <path.json> --topics <...> --data <hex>
//! chainevents history     --abi <path.json> --address <addr> --event <name> --where from=0x..,0x..
//! chainevents watch       --abi <path.json> --address <addr> --event <name>
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use alloy_primitives::Address;
use chainevents_core::filter::{BlockNumber, BlockRange};
use chainevents_observability::init_tracing;

mod args;
mod cmd_live;
mod config;
mod output;

use config::AppConfig;

#[derive(Parser)]
#[command(
    name = "chainevents",
    about = "Typed Ethereum event queries and subscriptions",
    long_about = "
ChainEvents CLI: build topic filters from a contract ABI, fetch historical
events over HTTP JSON-RPC and stream live events over WebSocket.

ENVIRONMENT VARIABLES:
  CHAINEVENTS_CONFIG    Path to a chainevents.yaml config file
  CHAINEVENTS_RPC_URL   HTTP(S) JSON-RPC endpoint
  CHAINEVENTS_WS_URL    WebSocket JSON-RPC endpoint
",
    version
)]
struct Cli {
    /// Config file (YAML with `chain`, `stream` and `log` sections)
    #[arg(long, global = true, env = "CHAINEVENTS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the events of an ABI with their signatures and topic layout
    Schema {
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: PathBuf,
        /// Only show this event
        #[arg(long)]
        event: Option<String>,
    },

    /// Decode one log from raw topics + data
    #[command(name = "decode-log")]
    DecodeLog {
        /// Path to the ABI JSON file
        #[arg(long)]
        abi: PathBuf,
        /// topics[0] = event signature hash, topics[1..] = indexed params
        #[arg(long, num_args = 1..)]
        topics: Vec<String>,
        /// Non-indexed params (hex, 0x-prefixed)
        #[arg(long, default_value = "0x")]
        data: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch and decode historical events
    History {
        #[command(flatten)]
        query: QueryArgs,
        /// First block (number, 0x-hex, "earliest" or "latest")
        #[arg(long, value_parser = args::parse_block, default_value = "earliest")]
        from_block: BlockNumber,
        /// Last block, inclusive
        #[arg(long, value_parser = args::parse_block, default_value = "latest")]
        to_block: BlockNumber,
    },

    /// Stream live events until Ctrl-C
    Watch {
        #[command(flatten)]
        query: QueryArgs,
        /// WebSocket endpoint (overrides `chain.websocket`)
        #[arg(long, env = "CHAINEVENTS_WS_URL")]
        ws: Option<String>,
    },
}

/// Flags shared by `history` and `watch`.
#[derive(Args)]
struct QueryArgs {
    /// Path to the ABI JSON file
    #[arg(long)]
    abi: PathBuf,
    /// Contract address (repeatable; none = any contract)
    #[arg(long)]
    address: Vec<Address>,
    /// Event name; omit to receive every event in the ABI
    #[arg(long)]
    event: Option<String>,
    /// Indexed-argument constraint `name=v1,v2` (repeatable)
    #[arg(long = "where", value_parser = args::parse_constraint)]
    constraints: Vec<(String, Vec<String>)>,
    /// HTTP(S) endpoint (overrides `chain.endpoint`)
    #[arg(long, env = "CHAINEVENTS_RPC_URL")]
    rpc: Option<String>,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let app = AppConfig::load(cli.config.as_deref())?;
    let mut log = app.log.clone();
    if cli.verbose {
        log.level = "debug".into();
    }
    init_tracing(&log);

    match cli.command {
        Commands::Schema { abi, event } => cmd_schema(&abi, event.as_deref()),

        Commands::DecodeLog { abi, topics, data, json } => {
            cmd_decode_log(&abi, &topics, &data, json)
        }

        Commands::History { query, from_block, to_block } => {
            cmd_live::history(&app, &query, BlockRange { from: from_block, to: to_block }).await
        }

        Commands::Watch { query, ws } => cmd_live::watch(&app, &query, ws.as_deref()).await,
    }
}

// ─── Command implementations ─────────────────────────────────────────────────

fn cmd_schema(abi_path: &std::path::Path, event: Option<&str>) -> Result<()> {
    let abi = args::load_abi(abi_path)?;
    let schemas: Vec<_> = match event {
        Some(name) => vec![abi.event_schema(name)?],
        None => abi.events().collect(),
    };
    if schemas.is_empty() {
        println!("(no events in '{}')", abi_path.display());
    }
    for schema in schemas {
        output::print_schema(schema);
    }
    Ok(())
}

fn cmd_decode_log(
    abi_path: &std::path::Path,
    topics: &[String],
    data: &str,
    as_json: bool,
) -> Result<()> {
    use chainevents_core::event::RawLog;
    use chainevents_evm::LogDecoder;

    let abi = args::load_abi(abi_path)?;
    let raw = RawLog {
        topics: topics
            .iter()
            .map(|t| args::parse_topic(t))
            .collect::<Result<_>>()?,
        data: args::decode_hex(data).context("invalid data")?,
        ..RawLog::default()
    };

    let decoded = LogDecoder::new(abi).decode(&raw)?;
    output::print_event(&decoded, as_json)
}
