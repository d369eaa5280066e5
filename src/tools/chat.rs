/// Chat Tool — Upstream Translation Core
///
/// Translates a chat tool call into one of two upstream API shapes and
/// normalizes whichever reply comes back into a single result shape, so
/// callers never need to know which path served them.
///
/// Branch rule: when `tools` is supplied as an array or `tool_choice` as a
/// string, the call goes to the Responses API (hosted tools such as
/// web_search); otherwise it goes to Chat Completions. Never both, never a
/// fallback from one to the other.
///
/// The branch is computed by `plan`, a pure step that builds the typed
/// request without touching the network; the handler then performs the
/// single matching call.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::ToolSpec;
use crate::Gateway;
use crate::core::config::Settings;
use crate::core::rpc::RpcError;
use crate::upstream::{
    ChatCompletion, CompletionRequest, ResponsesReply, ResponsesRequest, UpstreamError,
};

const DEFAULT_TEMPERATURE: f64 = 0.7;

pub fn spec() -> ToolSpec {
    ToolSpec {
        name: "chat",
        description: "Call an OpenAI-compatible router. Supports hosted tools via the Responses API when 'tools' are provided.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "model": {"type": "string", "description": "Model name, e.g. gpt-4.1-mini"},
                "messages": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "role": {"type": "string", "description": "system|user|assistant"},
                            "content": {"type": "string"}
                        },
                        "required": ["role", "content"],
                        "additionalProperties": false
                    },
                    "description": "Chat history (OpenAI format)."
                },
                "temperature": {"type": "number", "description": "0-2", "default": DEFAULT_TEMPERATURE},
                "max_tokens": {"type": "integer", "description": "Max tokens for the response"},
                "top_p": {"type": "number", "description": "Nucleus sampling"},
                "tools": {
                    "type": "array",
                    "description": "Hosted tools for the Responses API (e.g., [{'type':'web_search'}]).",
                    "items": {"type": "object"}
                },
                "tool_choice": {
                    "type": "string",
                    "description": "Tool choice mode for the Responses API (e.g., 'auto')."
                },
                "metadata": {"type": "object", "description": "Optional vendor-specific options"}
            },
            "required": ["model", "messages"],
            "additionalProperties": false
        }),
    }
}

/// Chat tool arguments. `tools` and `tool_choice` stay loosely typed because
/// only an array / a string counts toward the branch decision; other shapes
/// are ignored rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ChatArguments {
    pub model: Option<String>,
    pub messages: Option<Value>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
    pub top_p: Option<f64>,
    pub tools: Option<Value>,
    pub tool_choice: Option<Value>,
    pub metadata: Option<Value>,
}

/// The upstream call a given argument set resolves to.
#[derive(Debug, PartialEq)]
pub enum ChatCall {
    Responses(ResponsesRequest),
    Completion(CompletionRequest),
}

/// The single result shape both upstream paths converge on.
#[derive(Debug, Serialize)]
pub struct NormalizedChatResult {
    pub id: Option<String>,
    pub model: String,
    pub object: String,
    pub created: Option<i64>,
    pub message: AssistantMessage,
    pub finish_reason: Option<String>,
    pub usage: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

impl AssistantMessage {
    fn new(content: String) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
        }
    }
}

pub async fn handle(arguments: Value, gateway: &Gateway) -> Result<Value, RpcError> {
    let args: ChatArguments = serde_json::from_value(arguments)
        .map_err(|e| RpcError::invalid_params(format!("Invalid params: {e}")))?;

    // No upstream handle means client construction failed at startup: a
    // configuration failure, reported before any network attempt.
    let client = gateway
        .upstream
        .as_ref()
        .ok_or_else(|| RpcError::internal("Upstream client not available"))?;

    let result = match plan(args, &gateway.settings)? {
        ChatCall::Responses(request) => {
            let reply = client
                .responses(&request)
                .await
                .map_err(RpcError::upstream)?;
            normalize_responses(reply, request.model)
        }
        ChatCall::Completion(request) => {
            let completion = client
                .chat_completions(&request)
                .await
                .map_err(RpcError::upstream)?;
            normalize_completion(completion, request.model).map_err(RpcError::upstream)?
        }
    };

    serde_json::to_value(result).map_err(|e| RpcError::internal(e.to_string()))
}

/// Decide which upstream shape to call and build its typed request.
/// Pure: no network, no clock.
pub fn plan(args: ChatArguments, settings: &Settings) -> Result<ChatCall, RpcError> {
    let messages = match args.messages {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(RpcError::invalid_params("Invalid params: 'messages' must be array"));
        }
    };

    // An empty model name falls back to the default, same as an absent one.
    let model = args
        .model
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| settings.default_model.clone());
    let temperature = args.temperature.unwrap_or(DEFAULT_TEMPERATURE);

    let tools = match args.tools {
        Some(Value::Array(tools)) => Some(tools),
        _ => None,
    };
    let tool_choice = match args.tool_choice {
        Some(Value::String(choice)) => Some(choice),
        _ => None,
    };

    if tools.is_some() || tool_choice.is_some() {
        Ok(ChatCall::Responses(ResponsesRequest {
            model,
            input: messages,
            temperature,
            max_output_tokens: args.max_tokens,
            top_p: args.top_p,
            tools,
            tool_choice,
        }))
    } else {
        Ok(ChatCall::Completion(CompletionRequest {
            model,
            messages,
            temperature,
            max_tokens: args.max_tokens,
            top_p: args.top_p,
            include_reasoning: settings.include_reasoning,
        }))
    }
}

/// Hosted-tools path normalization. The Responses API does not report
/// created/finish_reason/usage in a comparable form; they stay null rather
/// than being fabricated.
fn normalize_responses(reply: ResponsesReply, model: String) -> NormalizedChatResult {
    let content = reply.flattened_text();
    NormalizedChatResult {
        id: reply.id,
        model,
        object: "response".to_string(),
        created: None,
        message: AssistantMessage::new(content),
        finish_reason: None,
        usage: None,
    }
}

/// Plain path normalization: first choice wins, upstream-echoed model and
/// object kind take precedence over the requested ones.
fn normalize_completion(
    completion: ChatCompletion,
    requested_model: String,
) -> Result<NormalizedChatResult, UpstreamError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::Malformed("response contained no choices".to_string()))?;
    let content = choice
        .message
        .and_then(|message| message.content)
        .unwrap_or_default();

    Ok(NormalizedChatResult {
        id: completion.id,
        model: completion.model.unwrap_or(requested_model),
        object: completion
            .object
            .unwrap_or_else(|| "chat.completion".to_string()),
        created: completion.created,
        message: AssistantMessage::new(content),
        finish_reason: choice.finish_reason,
        usage: completion.usage,
    })
}
