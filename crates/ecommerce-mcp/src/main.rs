//! E-commerce MCP server binary.

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use ecommerce_mcp::config::Config;
use ecommerce_mcp::server::McpServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// JSON-RPC over stdin/stdout (for Claude Desktop).
    Stdio,
    /// Streamable HTTP with SSE, REST API, and OAuth endpoints.
    Http,
}

#[derive(Debug, Parser)]
#[command(name = "ecommerce-mcp", version, about = "MCP server for a demo e-commerce storefront")]
struct Cli {
    /// Transport to run.
    #[arg(long, value_enum, default_value = "http")]
    transport: Transport,

    /// HTTP listen port.
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Public base URL used in OAuth metadata and SSE endpoint events.
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// OAuth resource identifier. Defaults to the base URL.
    #[arg(long, env = "RESOURCE_ID")]
    resource_id: Option<String>,

    /// Log filter (e.g. "info", "ecommerce_mcp=debug").
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));

    // Stdio transport owns stdout for the protocol, so logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if cli.json_logs {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    let config = match cli.base_url {
        Some(ref base_url) => Config::new(base_url, cli.resource_id.clone()),
        None => Config::from_env(),
    };

    let server = McpServer::new(config);

    match cli.transport {
        Transport::Stdio => server.run_stdio().await,
        Transport::Http => server.run_http(cli.port).await,
    }
}
