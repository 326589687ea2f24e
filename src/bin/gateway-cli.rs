use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the worker gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered workers with their health and load
    Workers,
    /// Register a worker
    Register {
        #[arg(long)]
        host: String,
        #[arg(long)]
        port: u16,
        /// Ask for a specific worker id
        #[arg(long)]
        id: Option<u32>,
    },
    /// Remove a worker from the pool
    Unregister {
        #[arg(long)]
        id: u32,
    },
    /// Check that the gateway is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Workers => client.get(format!("{}/workers", cli.url)).send().await?,
        Commands::Register { host, port, id } => {
            let mut body = json!({ "host": host, "port": port });
            if let Some(id) = id {
                body["id"] = json!(id);
            }
            client
                .post(format!("{}/register", cli.url))
                .json(&body)
                .send()
                .await?
        }
        Commands::Unregister { id } => {
            client
                .post(format!("{}/unregister", cli.url))
                .json(&json!({ "id": id }))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", cli.url)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("{}", text);
        }
        std::process::exit(1);
    }

    let text = res.text().await?;
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
