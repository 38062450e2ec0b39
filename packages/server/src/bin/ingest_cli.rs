//! Ingestion CLI: drives a running server's ingestion endpoints and maps
//! the result onto the exit codes named in `spec.md` §6. Uses `clap`
//! derive for argument parsing and `reqwest` as its HTTP client, matching
//! the teacher's own dependency stack rather than adding a new one.

use clap::{Parser, Subcommand};
use ragcore::error::exit_code as pipeline_exit_code;
use ragcore::PipelineError;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "ingest_cli", about = "Drive a running server's context ingestion endpoints")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    #[arg(long)]
    actor_id: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a single URL.
    Url { agent_id: String, url: String },
    /// Crawl a website, printing each progress frame as it arrives.
    Website {
        agent_id: String,
        url: String,
        #[arg(long, default_value_t = 10)]
        max_pages: u32,
        #[arg(long, default_value_t = 2)]
        max_depth: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let code = match cli.command {
        Command::Url { agent_id, url } => run_url(&client, &cli.server, &cli.actor_id, &agent_id, &url).await,
        Command::Website { agent_id, url, max_pages, max_depth } => {
            run_website(&client, &cli.server, &cli.actor_id, &agent_id, &url, max_pages, max_depth).await
        }
    };

    std::process::exit(code);
}

async fn run_url(client: &reqwest::Client, server: &str, actor_id: &str, agent_id: &str, url: &str) -> i32 {
    let response = match client
        .post(format!("{server}/agents/{agent_id}/context/url"))
        .header("x-actor-id", actor_id)
        .json(&serde_json::json!({ "url": url }))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("request failed: {e}");
            return 1;
        }
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        eprintln!("{}", body.get("message").and_then(Value::as_str).unwrap_or("request failed"));
        return exit_code_for_status(status.as_u16());
    }

    let degraded = body.pointer("/data/degraded").and_then(Value::as_bool).unwrap_or(false);
    if degraded {
        eprintln!("document ingested but rag indexing failed");
        return pipeline_exit_code(&PipelineError::RagDegraded(String::new()));
    }

    println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    0
}

async fn run_website(
    client: &reqwest::Client,
    server: &str,
    actor_id: &str,
    agent_id: &str,
    url: &str,
    max_pages: u32,
    max_depth: u32,
) -> i32 {
    use futures::StreamExt;

    let response = match client
        .post(format!("{server}/agents/{agent_id}/context/website"))
        .header("x-actor-id", actor_id)
        .json(&serde_json::json!({ "url": url, "options": { "maxPages": max_pages, "maxDepth": max_depth } }))
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("request failed: {e}");
            return 1;
        }
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        eprintln!("{}", body.get("message").and_then(Value::as_str).unwrap_or("request failed"));
        return exit_code_for_status(status);
    }

    let mut stream = response.bytes_stream();
    let mut buffer = String::new();
    let mut final_code = 0;

    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buffer.find("\n\n") {
            let frame = buffer[..pos].to_string();
            buffer.drain(..pos + 2);

            let mut event_type = "progress".to_string();
            let mut data = String::new();
            for line in frame.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event_type = value.trim().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push_str(value.trim());
                }
            }
            println!("[{event_type}] {data}");
            if event_type == "error" {
                final_code = 1;
            }
        }
    }

    final_code
}

fn exit_code_for_status(status: u16) -> i32 {
    match status {
        400 => 2,
        409 => 3,
        403 => 4,
        _ => 1,
    }
}
