//! Launching the provider process and running the MCP handshake over its stdio.

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::TokioChildProcess;
use tokio::process::Command;
use tracing::debug;

use super::script::ProviderScript;

/// A running rmcp client session with the provider.
pub type ProviderService = RunningService<RoleClient, Box<dyn DynService<RoleClient>>>;

/// How the client reaches a provider.
#[async_trait]
pub trait MCPTransport: Send + Sync {
    /// Start the provider and complete the `initialize` exchange.
    async fn handshake(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<ProviderService, ClientInitializeError>;

    /// Mark the transport spent. Later handshakes fail.
    fn shut(&mut self);
}

/// Runs a [`ProviderScript`] under its interpreter, speaking MCP on its stdio.
pub struct ScriptTransport {
    script: ProviderScript,
    spent: bool,
}

impl ScriptTransport {
    pub fn new(script: ProviderScript) -> Self {
        Self {
            script,
            spent: false,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(self.script.interpreter());
        command.arg(self.script.path());
        command
    }
}

#[async_trait]
impl MCPTransport for ScriptTransport {
    async fn handshake(
        &mut self,
        client_info: ClientInfo,
    ) -> Result<ProviderService, ClientInitializeError> {
        if self.spent {
            return Err(ClientInitializeError::ConnectionClosed(
                "provider transport already shut down".into(),
            ));
        }

        debug!(
            interpreter = self.script.interpreter(),
            script = %self.script.path().display(),
            "launching provider"
        );
        let child = TokioChildProcess::new(self.command()).map_err(|error| {
            ClientInitializeError::transport::<TokioChildProcess>(error, "launch provider script")
        })?;

        client_info.into_dyn().serve(child).await
    }

    fn shut(&mut self) {
        self.spent = true;
    }
}
