use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the game gateway admin API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key, when the gateway requires one.
    #[arg(short, long, env = "ADMIN_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Status,
    /// Show the most recent exchanges
    Recent {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one recorded exchange
    Request { id: String },
    /// List installed mocks
    Mocks,
    /// Install or replace a mock
    MockSet {
        path: String,
        #[arg(short, long)]
        status: Option<u16>,
        /// Response header as `name:value`; repeatable
        #[arg(long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
        /// Response body as JSON; a JSON string is served verbatim
        #[arg(short, long, value_parser = parse_json)]
        body: Option<Value>,
    },
    /// Remove a mock
    MockClear { path: String },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once(':')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name:value, got '{}'", raw))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }
    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/_status", base)).send().await?,
        Commands::Recent { limit } => {
            let mut req = client.get(format!("{}/_admin/recent", base));
            if let Some(limit) = limit {
                req = req.query(&[("limit", limit)]);
            }
            req.send().await?
        }
        Commands::Request { id } => {
            client
                .get(format!("{}/_admin/request/{}", base, id))
                .send()
                .await?
        }
        Commands::Mocks => client.get(format!("{}/_admin/mocks", base)).send().await?,
        Commands::MockSet {
            path,
            status,
            headers,
            body,
        } => {
            let mut payload = Map::new();
            payload.insert("path".into(), Value::String(path));
            if let Some(status) = status {
                payload.insert("status".into(), json!(status));
            }
            if !headers.is_empty() {
                let headers: Map<String, Value> = headers
                    .into_iter()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect();
                payload.insert("headers".into(), Value::Object(headers));
            }
            if let Some(body) = body {
                payload.insert("body".into(), body);
            }
            client
                .post(format!("{}/_admin/mock", base))
                .json(&payload)
                .send()
                .await?
        }
        Commands::MockClear { path } => {
            client
                .post(format!("{}/_admin/mock/clear", base))
                .json(&json!({ "path": path }))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
