//! MCP server implementation
//!
//! - `handler`: `ServerHandler` exposing the Omada tools
//! - `tools`: the tool catalog and argument handling
//! - `context`: helpers reading HTTP request data from MCP request contexts
//! - `stdio`: the stdio transport entry point

pub mod context;
pub mod handler;
mod stdio;
pub mod tools;

pub use handler::OmadaMcpHandler;
pub use stdio::serve_stdio;
pub use tools::{catalog, OmadaTool, ToolCall, ToolOutput};
