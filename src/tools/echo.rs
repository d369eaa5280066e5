/// Echo Tool
///
/// Pure tool: returns the `text` argument coerced to its string form.
/// Strings pass through unchanged; any other JSON value is rendered as JSON.
/// Never fails.

use serde_json::{Value, json};

use super::ToolSpec;
use crate::core::rpc::RpcError;

pub fn spec() -> ToolSpec {
    ToolSpec {
        name: "echo",
        description: "Echo text back.",
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "Text to echo"}
            },
            "required": ["text"],
            "additionalProperties": false
        }),
    }
}

pub fn handle(arguments: &Value) -> Result<Value, RpcError> {
    let text = match arguments.get("text") {
        None => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    Ok(json!({ "text": text }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn echoes_string_unchanged() {
        let result = handle(&json!({"text": "hello"})).unwrap();
        assert_eq!(result, json!({"text": "hello"}));
    }

    #[test]
    fn coerces_number_to_string_form() {
        let result = handle(&json!({"text": 123})).unwrap();
        assert_eq!(result, json!({"text": "123"}));
    }

    #[test]
    fn missing_text_echoes_empty_string() {
        let result = handle(&json!({})).unwrap();
        assert_eq!(result, json!({"text": ""}));
    }

    #[test]
    fn identical_calls_produce_identical_results() {
        let args = json!({"text": {"nested": true}});
        assert_eq!(handle(&args).unwrap(), handle(&args).unwrap());
    }
}
