/// Safe File Read Tool
///
/// Reads a text file from the configured base directory. The path must be
/// relative and traversal-free, and the canonicalized target must stay under
/// the canonicalized base directory, so neither `..` segments nor symlinks
/// can escape. Read failures are reported inside the result payload (an
/// `error` string with size 0), not as RPC errors: the tool call itself
/// still succeeds at the RPC layer.

use std::io::{ErrorKind, Read};
use std::path::{Component, Path};

use serde::Serialize;
use serde_json::{Value, json};

use super::ToolSpec;
use crate::core::config::Settings;
use crate::core::rpc::RpcError;

const DEFAULT_MAX_BYTES: i64 = 200_000;

pub fn spec() -> ToolSpec {
    ToolSpec {
        name: "read_file",
        description: "Read a text file from the server's base directory (relative path).",
        input_schema: json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Relative path under the base directory"},
                "max_bytes": {
                    "type": "integer",
                    "description": "Max bytes to read",
                    "minimum": 1,
                    "default": DEFAULT_MAX_BYTES
                }
            },
            "required": ["path"],
            "additionalProperties": false
        }),
    }
}

/// Tool result payload. Successful reads omit `error`; failed reads carry an
/// error string alongside an empty text and size 0.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReadFileResult {
    pub path: String,
    pub size: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadFileResult {
    fn failure(path: &str, error: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            size: 0,
            text: String::new(),
            error: Some(error.into()),
        }
    }
}

pub fn handle(arguments: &Value, settings: &Settings) -> Result<Value, RpcError> {
    let path = arguments
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("Invalid params: 'path' must be string"))?;
    let max_bytes = arguments
        .get("max_bytes")
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_MAX_BYTES)
        .max(1) as u64;

    let result = safe_read(path, max_bytes, &settings.files_base_dir);
    serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
}

/// Read at most `max_bytes` bytes of `path` resolved under `base_dir`.
pub fn safe_read(path: &str, max_bytes: u64, base_dir: &Path) -> ReadFileResult {
    let raw = Path::new(path);
    let traverses = raw
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if raw.is_absolute() || traverses {
        return ReadFileResult::failure(path, "Invalid path (absolute or traversal not allowed)");
    }

    // Canonicalize both sides before the prefix check so a symlink inside the
    // base directory cannot point the read outside it.
    let target = match base_dir.join(raw).canonicalize() {
        Ok(target) => target,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return ReadFileResult::failure(path, "File not found");
        }
        Err(e) => return ReadFileResult::failure(path, e.to_string()),
    };
    let base = match base_dir.canonicalize() {
        Ok(base) => base,
        Err(e) => return ReadFileResult::failure(path, e.to_string()),
    };
    if !target.starts_with(&base) {
        return ReadFileResult::failure(path, "Path escapes base directory");
    }

    let file = match std::fs::File::open(&target) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return ReadFileResult::failure(path, "File not found");
        }
        Err(e) => return ReadFileResult::failure(path, e.to_string()),
    };

    let mut data = Vec::new();
    if let Err(e) = file.take(max_bytes).read_to_end(&mut data) {
        return ReadFileResult::failure(path, e.to_string());
    }

    ReadFileResult {
        path: path.to_string(),
        size: data.len(),
        text: String::from_utf8_lossy(&data).into_owned(),
        error: None,
    }
}
