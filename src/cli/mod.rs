//! Command-line arguments for the toolrelay binary.

use std::path::PathBuf;

use clap::Parser;

use crate::error::RelayError;
use crate::mcp::ProviderScript;

/// Chat with a model that can call tools from a local MCP server
#[derive(Parser, Debug)]
#[command(name = "toolrelay", version, about)]
pub struct Cli {
    /// Path to the MCP server script (.py or .js)
    pub server_script: PathBuf,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The provider script, validated before anything is launched.
    pub fn provider_script(&self) -> Result<ProviderScript, RelayError> {
        ProviderScript::from_path(&self.server_script)
    }
}
