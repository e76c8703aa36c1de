//! The provider connection seam used by the tool registry and the session.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::tools::ToolDescriptor;

/// A long-lived connection to a tool provider.
///
/// Opened once per session, shared by reference with every registry call and
/// closed exactly once on teardown.
#[async_trait]
pub trait ProviderConnection: Send + Sync {
    /// Perform the protocol handshake. Calling it again is a no-op.
    async fn initialize(&mut self) -> Result<(), RelayError>;

    /// List the tools the provider currently exposes.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RelayError>;

    /// Run one tool and return its result payload.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError>;

    /// Release the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), RelayError>;
}
