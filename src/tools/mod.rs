/// Tools Module
///
/// The static tool registry and the dispatch core. The registry is the
/// discoverable contract (names, descriptions, JSON Schemas) returned by
/// tools/list; dispatch resolves a tool name to its handler and enforces
/// argument shape. Handlers live one per submodule.

pub mod chat;
pub mod echo;
pub mod read_file;

use serde::Serialize;
use serde_json::{Value, json};

use crate::Gateway;
use crate::core::rpc::RpcError;

/// A tool's discoverable contract. Immutable; built once at process start.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// All registered tools, in declaration order. Listing order is the only
/// thing the order is used for.
pub struct Registry {
    tools: Vec<ToolSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tools: vec![echo::spec(), read_file::spec(), chat::spec()],
        }
    }

    pub fn list(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool identifiers with a bound handler, matched exhaustively in dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    Echo,
    ReadFile,
    Chat,
}

impl ToolName {
    pub fn resolve(name: &str) -> Option<Self> {
        match name {
            "echo" => Some(Self::Echo),
            "read_file" => Some(Self::ReadFile),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }
}

/// Execute a tools/call request body: `{name, arguments}`.
///
/// Check order: name must be a string naming a registered tool, arguments
/// must be an object (missing/null coerces to `{}`), and the registered
/// name must resolve to a handler. A registry entry without a handler is a
/// wiring defect and reports "Tool handler not implemented" rather than
/// "Tool not found".
pub async fn dispatch(gateway: &Gateway, params: Value) -> Result<Value, RpcError> {
    let name = match params.get("name").and_then(Value::as_str) {
        Some(name) => name,
        None => return Err(RpcError::tool_not_found(gateway.registry.names())),
    };

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => json!({}),
        Some(arguments) => arguments.clone(),
    };
    if !arguments.is_object() {
        return Err(RpcError::invalid_params("Invalid params: 'arguments' must be object"));
    }

    if !gateway.registry.contains(name) {
        return Err(RpcError::tool_not_found(gateway.registry.names()));
    }

    match ToolName::resolve(name) {
        Some(ToolName::Echo) => echo::handle(&arguments),
        Some(ToolName::ReadFile) => read_file::handle(&arguments, &gateway.settings),
        Some(ToolName::Chat) => chat::handle(arguments, gateway).await,
        None => Err(RpcError::tool_not_implemented()),
    }
}
