/// Gateway Transports
///
/// HTTP binding (actix-web) and the line-based stdio loop. Both feed the
/// same JSON-RPC dispatcher in `core::rpc`; nothing protocol-shaped lives
/// here. HTTP routes:
/// - GET  /mcp         static handshake object
/// - POST /mcp         JSON-RPC 2.0 endpoint (always HTTP 200 for valid JSON)
/// - GET  /health      liveness probe
/// - GET  /diagnostics configuration echo + registry summary
/// - GET  /metrics     request counter

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use actix_web::middleware::{Compress, DefaultHeaders, Logger};
use actix_web::{App, HttpResponse, HttpServer, Result, web};
use serde_json::json;

use crate::Gateway;
use crate::core::rpc::{self, RpcRequest, RpcResponse};

/// Static MCP handshake for clients probing the endpoint.
async fn handshake() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "mcp": true,
        "transport": "http",
        "endpoint": "/mcp",
        "status": "ready"
    })))
}

/// Health check endpoint handler.
///
/// Used by load balancers and monitoring systems to verify server availability.
async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME")
    })))
}

/// Configuration echo and registry summary for operators. Secrets are
/// reported as set/unset flags only.
async fn diagnostics(gateway: web::Data<Gateway>) -> Result<HttpResponse> {
    let settings = &gateway.settings;
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "app": {
            "title": settings.app_title,
            "version": env!("CARGO_PKG_VERSION")
        },
        "upstream": {
            "client_ready": gateway.upstream.is_some(),
            "base_url": settings.base_url,
            "default_model": settings.default_model,
            "api_key_set": !settings.api_key.is_empty()
        },
        "tools": {
            "count": gateway.registry.len(),
            "names": gateway.registry.names()
        },
        "filesystem": {
            "base_dir": settings.files_base_dir.display().to_string(),
            "base_dir_exists": settings.files_base_dir.exists()
        }
    })))
}

/// Metrics endpoint handler: total requests processed since server start.
async fn metrics(counter: web::Data<AtomicU64>) -> Result<HttpResponse> {
    let count = counter.load(Ordering::Relaxed);
    Ok(HttpResponse::Ok().json(json!({
        "requests_total": count,
        "status": "ok"
    })))
}

/// JSON-RPC endpoint. Errors travel in the JSON-RPC body, not in the HTTP
/// status; only malformed JSON is rejected (400) by the extractor.
async fn mcp_rpc(
    gateway: web::Data<Gateway>,
    counter: web::Data<AtomicU64>,
    request: web::Json<RpcRequest>,
) -> Result<HttpResponse> {
    // Relaxed is enough: the counter needs atomicity, not ordering.
    counter.fetch_add(1, Ordering::Relaxed);

    let response = rpc::handle_request(&gateway, request.into_inner()).await;
    Ok(HttpResponse::Ok().json(response))
}

/// Register the gateway's routes. Split out from `run_server_http` so tests
/// can mount the same app on an in-process service.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/mcp", web::get().to(handshake))
        .route("/mcp", web::post().to(mcp_rpc))
        .route("/health", web::get().to(health))
        .route("/diagnostics", web::get().to(diagnostics))
        .route("/metrics", web::get().to(metrics));
}

/// Run the gateway in HTTP mode.
///
/// Worker count defaults to the CPU count capped at 16 (override with
/// WORKER_THREADS); connection limits and timeouts are tuned for a small
/// always-on service.
pub async fn run_server_http(gateway: Arc<Gateway>) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = format!("{}:{}", gateway.settings.host, gateway.settings.port);

    let gateway_data = web::Data::from(gateway.clone());
    let request_count = web::Data::new(AtomicU64::new(0));

    let workers = std::env::var("WORKER_THREADS")
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .unwrap_or_else(|| num_cpus::get().clamp(1, 16));

    tracing::info!(
        "starting HTTP transport on {} ({} workers, upstream {})",
        bind_addr,
        workers,
        gateway.settings.base_url
    );

    HttpServer::new(move || {
        App::new()
            .app_data(gateway_data.clone())
            .app_data(request_count.clone())
            // Compress JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            // %r = request line, %s = status, %Dms = duration
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
    })
    .workers(workers)
    .max_connections(10_000)
    .max_connection_rate(1_000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Run the gateway in STDIO mode: one JSON-RPC request per line on stdin,
/// one response per line on stdout. Logging goes to stderr only, so the
/// protocol stream stays clean. Requests without an id are notifications
/// and get no response.
pub async fn run_server_stdio(gateway: Arc<Gateway>) -> std::io::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    tracing::info!("starting STDIO transport");

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::with_capacity(8192, stdin).lines();
    let stdout = tokio::io::stdout();
    let mut stdout = BufWriter::with_capacity(8192, stdout);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => {
                if request.id.is_none() {
                    continue;
                }
                rpc::handle_request(&gateway, request).await
            }
            Err(e) => {
                // Recover the id from the raw JSON if possible so the client
                // can correlate the parse error; otherwise stay silent.
                let id = serde_json::from_str::<serde_json::Value>(&line)
                    .ok()
                    .and_then(|raw| raw.get("id").cloned());
                match id {
                    Some(id) => {
                        RpcResponse::error(Some(id), rpc::RpcError::parse_error(e.to_string()))
                    }
                    None => {
                        tracing::error!("unparseable request line: {e}");
                        continue;
                    }
                }
            }
        };

        let body = match serde_json::to_string(&response) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("failed to serialize response: {e}");
                continue;
            }
        };
        stdout.write_all(body.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        // Flush per response: callers block on the reply line.
        stdout.flush().await?;
    }

    Ok(())
}
