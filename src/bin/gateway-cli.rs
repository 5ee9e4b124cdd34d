use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the resilient data gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "GATEWAY_ADMIN_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status and uptime
    Status,
    /// Show circuit breaker phase and window
    Breaker,
    /// Force the circuit breaker back to CLOSED
    Reset,
    /// Show cache size and hit/miss counters
    Cache,
    /// Fetch the protected resource through the gateway
    Data,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)).headers(headers),
        Commands::Breaker => client.get(format!("{}/admin/breaker", cli.url)).headers(headers),
        Commands::Reset => client.post(format!("{}/admin/breaker/reset", cli.url)).headers(headers),
        Commands::Cache => client.get(format!("{}/admin/cache", cli.url)).headers(headers),
        Commands::Data => {
            let res = client.get(format!("{}/api/data", cli.url)).send().await?;
            let source = res
                .headers()
                .get("x-gateway-source")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            println!("[{}] {}", source, res.text().await?);
            return Ok(());
        }
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
