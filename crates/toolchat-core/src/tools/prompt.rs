//! Tool instructions for models without native tool calling
//!
//! The model is asked to answer with `<function=NAME>{...}</function>`,
//! which the completion client recognizes like a native tool call.

use crate::types::ToolDescriptor;

/// Render the instruction message listing every tool.
pub fn render_tool_prompt(tools: &[ToolDescriptor]) -> String {
    let mut prompt = String::from("You have access to the following functions:\n\n");

    for tool in tools {
        let spec = serde_json::json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        });
        prompt.push_str(&format!(
            "Use the function '{}' to '{}':\n{}\n\n",
            tool.name, tool.description, spec
        ));
    }

    prompt.push_str(
        "If you choose to call a function ONLY reply in the following format with no prefix or suffix:\n\
         \n\
         <function=example_function_name>{\"example_name\": \"example_value\"}</function>\n\
         \n\
         Reminder:\n\
         - Function calls MUST follow the specified format, start with <function= and end with </function>\n\
         - Required parameters MUST be specified\n\
         - Only call one function at a time\n\
         - Put the entire function call reply on one line\n",
    );

    prompt
}
