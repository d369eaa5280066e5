/// Gateway Entry Point
///
/// Loads configuration from the environment, builds the gateway state, and
/// starts the transport(s) selected by MCP_TRANSPORT_MODE: "http" (default),
/// "stdio", or "both".

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mcp_router::Gateway;
use mcp_router::core::config::Settings;
use mcp_router::core::server;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // stdout is reserved for the stdio transport's protocol stream
        .with_writer(std::io::stderr)
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    let transport = settings.transport.clone();
    let gateway = Arc::new(Gateway::new(settings));

    match transport.as_str() {
        "http" => server::run_server_http(gateway).await,
        "stdio" => server::run_server_stdio(gateway).await,
        "both" => {
            // Stdio in the background, HTTP in the foreground; when the HTTP
            // server exits the stdio task is torn down with it.
            let stdio_gateway = gateway.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_gateway).await {
                    tracing::error!("stdio transport error: {e}");
                }
            });

            let http_result = server::run_server_http(gateway).await;
            stdio_handle.abort();
            http_result
        }
        other => {
            tracing::error!("invalid transport mode '{other}': must be 'http', 'stdio', or 'both'");
            std::process::exit(1);
        }
    }
}
