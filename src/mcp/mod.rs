//! MCP tool-call front end.
//!
//! Exposes the forum operations as tools over newline-delimited JSON-RPC.
//! Tool failures are returned as text content starting with `Error: `.

mod server;
pub mod tools;
pub mod transport;

pub use server::{Content, ToolResult, ToolServer};
pub use tools::ToolDescriptor;
pub use transport::serve;
