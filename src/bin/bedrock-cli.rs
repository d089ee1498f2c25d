use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use bedrock_gateway::config::resolve_config;
use bedrock_gateway::http::translate;
use bedrock_gateway::rpc::{Dispatcher, Priority, WriteConsistency};

#[derive(Parser)]
#[command(name = "bedrock-cli")]
#[command(about = "Command-line client for a Bedrock cluster and its gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one command straight to the cluster
    Call {
        /// Command name, e.g. HelloWorld
        command: String,

        /// Parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// LOW, NORMAL or HIGH (defaults to the cluster setting)
        #[arg(long)]
        priority: Option<Priority>,

        /// ASYNC or STRONG (defaults to the cluster setting)
        #[arg(long)]
        consistency: Option<WriteConsistency>,

        /// Gateway configuration file describing the cluster
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Query a running gateway's status endpoint
    Status {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Call {
            command,
            params,
            priority,
            consistency,
            config,
        } => {
            let mut config = resolve_config(config.as_deref())?;
            if let Some(priority) = priority {
                config.cluster.priority = priority;
            }
            if let Some(consistency) = consistency {
                config.cluster.write_consistency = consistency;
            }

            let dispatcher = Dispatcher::new(&config.cluster);
            let params: BTreeMap<String, String> = params.into_iter().collect();
            let request = dispatcher.request(command, params)?;
            let result = translate(&dispatcher.dispatch(&request, None).await);

            let out = json!({
                "status": result.http_status,
                "body": Value::Object(result.json_body),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Status { url } => {
            let res = reqwest::get(format!("{}/api/status", url.trim_end_matches('/'))).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
