//! System prompt: the discovered tools plus the strict reply-format contract.

use crate::tools::ToolDescriptor;

/// `Tool: <name>\nDescription: <desc>\nArguments:\n- <param>: <desc> (required)`.
pub fn format_tool(tool: &ToolDescriptor) -> String {
    let args: Vec<String> = tool
        .parameters
        .iter()
        .map(|p| {
            let mut line = format!("- {}: {}", p.name, p.description);
            if p.required {
                line.push_str(" (required)");
            }
            line
        })
        .collect();
    format!(
        "Tool: {}\nDescription: {}\nArguments:\n{}",
        tool.name,
        tool.description,
        args.join("\n")
    )
}

pub fn system_prompt(tools: &[ToolDescriptor]) -> String {
    let tools_description = tools
        .iter()
        .map(format_tool)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a helpful assistant with access to these tools:\n\n\
         {tools_description}\n\
         Choose the appropriate tool based on the user's question. \
         If no tool is needed, reply directly.\n\n\
         IMPORTANT: When you need to use a tool, you must ONLY respond with \
         the exact JSON object format below, nothing else:\n\
         {{\n    \"tool\": \"tool-name\",\n    \"arguments\": {{\n        \"argument-name\": \"value\"\n    }}\n}}\n\n\
         Do not wrap the JSON in a code block (\"```json\" is not allowed).\n\n\
         After receiving a tool's response:\n\
         1. Transform the raw data into a natural, conversational response\n\
         2. Keep responses concise but informative\n\
         3. Focus on the most relevant information\n\
         4. Use appropriate context from the user's question\n\
         5. Avoid simply repeating the raw data\n\n\
         Please use only the tools that are explicitly defined above."
    )
}
