//! toolchat core library: chat orchestration over an OpenAI-compatible endpoint, the MCP client
//! for the tool provider, and the toolbox the provider binary serves.

pub mod agent;
pub mod config;
pub mod llm;
pub mod prompt;
pub mod toolbox;
pub mod tools;
pub mod transcript;
