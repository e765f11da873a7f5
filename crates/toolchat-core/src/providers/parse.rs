//! Reduce a response message to a [`CompletionResult`]

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::error::MalformedToolCall;
use super::proto::{ResponseMessage, ToolCall};
use crate::types::{CompletionResult, ToolCallRequest};

/// `<function=NAME>{...}</function>`, the prompted calling convention. The
/// tag must span the whole reply, so the body runs to the last closing tag.
static FUNCTION_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^<function=(\w+)>(.*)</function>\s*$").expect("function tag pattern is valid")
});

/// Outcome of classifying one response message
#[derive(Debug)]
pub struct Classified {
    pub result: Result<CompletionResult, MalformedToolCall>,
    /// Structured tool calls that were dropped because only the first is honored
    pub ignored_calls: Vec<String>,
}

/// Classify a message. Structured tool calls take precedence over text; a
/// text body that starts with a function tag is treated as a tool call.
pub fn classify(message: ResponseMessage) -> Classified {
    if let Some(mut calls) = message.tool_calls.filter(|calls| !calls.is_empty()) {
        let first = calls.remove(0);
        let ignored_calls = calls.into_iter().map(|call| call.function.name).collect();
        return Classified {
            result: from_tool_call(first).map(CompletionResult::ToolInvocation),
            ignored_calls,
        };
    }

    let text = message.content.unwrap_or_default();
    let trimmed = text.trim();
    let result = match parse_function_tag(trimmed) {
        Some(parsed) => parsed.map(CompletionResult::ToolInvocation),
        None => Ok(CompletionResult::FinalAnswer(trimmed.to_string())),
    };
    Classified {
        result,
        ignored_calls: Vec::new(),
    }
}

/// Recognize the prompted calling convention.
///
/// `None` when `text` is not a function tag at all.
pub fn parse_function_tag(text: &str) -> Option<Result<ToolCallRequest, MalformedToolCall>> {
    let captures = FUNCTION_TAG.captures(text)?;
    let name = captures.get(1)?.as_str();
    let body = captures.get(2).map_or("", |m| m.as_str());

    let parsed = serde_json::from_str::<Value>(body)
        .map_err(|e| e.to_string())
        .and_then(into_arguments)
        .map(|arguments| ToolCallRequest::new(name, arguments))
        .map_err(|reason| MalformedToolCall {
            tool_name: name.to_string(),
            raw: text.to_string(),
            reason,
        });
    Some(parsed)
}

/// Structured calls may omit their arguments entirely; a tag body may not.
fn from_tool_call(call: ToolCall) -> Result<ToolCallRequest, MalformedToolCall> {
    let ToolCall { function } = call;
    let raw = match &function.arguments {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let arguments = match function.arguments {
        Value::Null => Ok(Map::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Map::new()),
        Value::String(s) => serde_json::from_str::<Value>(&s)
            .map_err(|e| e.to_string())
            .and_then(into_arguments),
        other => into_arguments(other),
    }
    .map_err(|reason| MalformedToolCall {
        tool_name: function.name.clone(),
        raw,
        reason,
    })?;

    Ok(ToolCallRequest::new(function.name, arguments))
}

fn into_arguments(value: Value) -> Result<Map<String, Value>, String> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("arguments must be a JSON object, got `{}`", other)),
    }
}
