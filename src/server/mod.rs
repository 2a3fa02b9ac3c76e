pub mod http;
pub mod mcp;
