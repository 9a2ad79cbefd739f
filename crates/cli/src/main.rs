//! Waitroom CLI - Command-line client for the Waitroom daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9528";
const DEFAULT_QUEUE: &str = "default";

#[derive(Parser)]
#[command(name = "waitroom-cli")]
#[command(about = "Waitroom virtual waiting room CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "WAITROOM_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a participant in a wait queue
    Register {
        /// Participant id
        user_id: String,

        /// Queue name
        #[arg(short, long, default_value = DEFAULT_QUEUE)]
        queue: String,
    },

    /// Promote up to COUNT waiting participants right now
    Allow {
        count: u64,

        /// Queue name
        #[arg(short, long, default_value = DEFAULT_QUEUE)]
        queue: String,
    },

    /// Check whether a participant may proceed
    Allowed {
        /// Participant id
        user_id: String,

        /// Queue name
        #[arg(short, long, default_value = DEFAULT_QUEUE)]
        queue: String,
    },

    /// Show a participant's position in the wait queue
    Rank {
        /// Participant id
        user_id: String,

        /// Queue name
        #[arg(short, long, default_value = DEFAULT_QUEUE)]
        queue: String,
    },

    /// Show or switch the promotion scheduler
    Scheduler {
        /// Turn the scheduler on
        #[arg(long, conflicts_with = "off")]
        on: bool,

        /// Turn the scheduler off
        #[arg(long)]
        off: bool,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct AllowResult {
    requested_count: u64,
    allowed_count: u64,
}

#[derive(Deserialize, Tabled)]
struct SchedulerResult {
    enabled: bool,
    batch_size: u64,
    interval_ms: u64,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Register { user_id, queue } => {
            let params = json!({ "queue": queue, "user_id": user_id });
            let result = call_rpc(&cli.rpc_url, "queue.register.v1", params).await?;

            println!(
                "{} {} registered in {} at rank {}",
                "✓".green().bold(),
                user_id.bold(),
                queue.cyan(),
                result["rank"]
            );
        }

        Commands::Allow { count, queue } => {
            let params = json!({ "queue": queue, "count": count });
            let result = call_rpc(&cli.rpc_url, "queue.allow.v1", params).await?;
            let allow_result: AllowResult = serde_json::from_value(result)?;

            println!("{}", format!("✓ Promoted members of {}", queue).green().bold());
            println!();
            println!("{}", Table::new(vec![allow_result]));
        }

        Commands::Allowed { user_id, queue } => {
            let params = json!({ "queue": queue, "user_id": user_id });
            let result = call_rpc(&cli.rpc_url, "queue.allowed.v1", params).await?;

            if result["allowed"].as_bool().unwrap_or(false) {
                println!("{} {} may proceed", "✓".green().bold(), user_id.bold());
            } else {
                println!("{} {} is not allowed yet", "○".yellow(), user_id.bold());
            }
        }

        Commands::Rank { user_id, queue } => {
            let params = json!({ "queue": queue, "user_id": user_id });
            let result = call_rpc(&cli.rpc_url, "queue.rank.v1", params).await?;

            match result["rank"].as_i64() {
                Some(rank) if rank > 0 => {
                    println!("{} is number {} in {}", user_id.bold(), rank, queue.cyan())
                }
                _ => println!("{} {} is not waiting in {}", "○".yellow(), user_id.bold(), queue),
            }
        }

        Commands::Scheduler { on, off } => {
            let params = if on {
                json!({ "enabled": true })
            } else if off {
                json!({ "enabled": false })
            } else {
                json!({})
            };
            let result = call_rpc(&cli.rpc_url, "admin.scheduler.v1", params).await?;
            let scheduler: SchedulerResult = serde_json::from_value(result)?;

            println!("{}", "Promotion Scheduler".cyan().bold());
            println!();
            println!("{}", Table::new(vec![scheduler]));
        }
    }

    Ok(())
}
