/// mcp-router
///
/// A minimal MCP gateway: exposes a JSON-RPC 2.0 endpoint with a small
/// static tool set (echo, read_file, chat) and routes chat tool calls to an
/// OpenAI-compatible completion API, selecting between the Chat Completions
/// and Responses API shapes per request.

pub mod core;
pub mod tools;
pub mod upstream;

use crate::core::config::Settings;
use crate::tools::Registry;
use crate::upstream::UpstreamClient;

/// Process-wide gateway state: configuration, tool registry, and the shared
/// upstream client handle. Built once in main and read-only afterwards.
pub struct Gateway {
    pub settings: Settings,
    pub registry: Registry,
    /// None when client construction failed at startup; chat calls then
    /// report an internal error instead of attempting the network.
    pub upstream: Option<UpstreamClient>,
}

impl Gateway {
    pub fn new(settings: Settings) -> Self {
        let upstream = match UpstreamClient::from_config(&settings) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("upstream client unavailable: {e}");
                None
            }
        };

        Self {
            registry: Registry::new(),
            upstream,
            settings,
        }
    }
}
