//! Wire types for OpenAI-compatible chat completions

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Message, MessageRole, ToolChoice, ToolDescriptor};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Normally a JSON-encoded string; some local servers send an object
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
struct FunctionTool {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Tool {
    r#type: &'static str,
    function: FunctionTool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireMessage {
    role: MessageRole,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

// -----------
// Conversions
// -----------

/// Build a request. `tool_choice` is only sent alongside tools.
pub fn create_request(
    model: &str,
    messages: &[Message],
    tools: &[ToolDescriptor],
    tool_choice: ToolChoice,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: messages.iter().map(create_message).collect(),
        tools: tools.iter().map(create_tool).collect(),
        tool_choice: (!tools.is_empty()).then_some(tool_choice),
    }
}

#[inline]
fn create_message(msg: &Message) -> WireMessage {
    WireMessage {
        role: msg.role,
        content: msg.content.to_text(),
    }
}

#[inline]
fn create_tool(tool: &ToolDescriptor) -> Tool {
    Tool {
        r#type: "function",
        function: FunctionTool {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.input_schema.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let messages = vec![
            Message::system("You are a helpful assistant."),
            Message::user("What is the weather in Langebaan?"),
        ];
        let tools = vec![ToolDescriptor::new("get_current_weather", "Get the current weather")
            .with_schema(json!({
                "type": "object",
                "properties": { "location": { "type": "string" } },
                "required": ["location"]
            }))];

        let request = create_request("llama-3.1-8b", &messages, &tools, ToolChoice::Auto);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            json!({
                "model": "llama-3.1-8b",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "What is the weather in Langebaan?" }
                ],
                "tools": [{
                    "type": "function",
                    "function": {
                        "name": "get_current_weather",
                        "description": "Get the current weather",
                        "parameters": {
                            "type": "object",
                            "properties": { "location": { "type": "string" } },
                            "required": ["location"]
                        }
                    }
                }],
                "tool_choice": "auto"
            })
        );
    }

    #[test]
    fn test_no_tools_omits_tool_fields() {
        let request = create_request("m", &[Message::user("hi")], &[], ToolChoice::Required);
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_response() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "get_alerts", "arguments": "{\"state\":\"CA\"}" }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        });
        let response: ChatCompletionResponse = serde_json::from_value(body).unwrap();
        let message = &response.choices[0].message;
        assert_eq!(message.content, None);
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "get_alerts");
        assert_eq!(calls[0].function.arguments, json!("{\"state\":\"CA\"}"));
    }
}
