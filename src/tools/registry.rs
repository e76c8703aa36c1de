//! Tool registry adapter over a provider connection.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::catalog::ToolDescriptor;
use crate::error::RelayError;
use crate::mcp::ProviderConnection;

/// Lists and invokes tools for the orchestrator.
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RelayError>;

    /// Invoke a tool from the most recent listing by name.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError>;
}

/// Stateless forwarding facade over a borrowed [`ProviderConnection`].
///
/// The only thing it remembers is the name set of the latest listing, so
/// calls for tools the model could not have seen are rejected locally.
pub struct ProviderToolRegistry<'a, C: ?Sized> {
    connection: &'a C,
    listed: RwLock<HashSet<String>>,
}

impl<'a, C> ProviderToolRegistry<'a, C>
where
    C: ProviderConnection + ?Sized,
{
    pub fn new(connection: &'a C) -> Self {
        Self {
            connection,
            listed: RwLock::new(HashSet::new()),
        }
    }

    fn is_listed(&self, name: &str) -> bool {
        self.listed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }
}

#[async_trait]
impl<'a, C> ToolRegistry for ProviderToolRegistry<'a, C>
where
    C: ProviderConnection + ?Sized,
{
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RelayError> {
        let tools = self.connection.list_tools().await?;
        let names: HashSet<String> = tools.iter().map(|tool| tool.name.clone()).collect();
        *self.listed.write().unwrap_or_else(PoisonError::into_inner) = names;
        debug!(count = tools.len(), "listed provider tools");
        Ok(tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError> {
        if !self.is_listed(name) {
            return Err(RelayError::tool(name, "tool is not in the current catalog"));
        }
        debug!(tool = name, "calling provider tool");
        self.connection.call_tool(name, arguments).await
    }
}
