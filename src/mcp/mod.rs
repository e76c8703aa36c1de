//! Model Context Protocol (MCP) client for the tool provider process.

pub mod client;
pub mod connection;
pub mod script;
pub mod transport;

pub use client::MCPClient;
pub use connection::ProviderConnection;
pub use script::{ProviderScript, ScriptKind};
pub use transport::{MCPTransport, ProviderService, ScriptTransport};

/// Build an unconnected client that will launch `script` on initialize.
pub fn client_for_script(script: &ProviderScript) -> MCPClient {
    MCPClient::new(Box::new(ScriptTransport::new(script.clone())))
}
