//! toolrelay — a command-line agent that lets a hosted model call tools
//! served by a local MCP provider process.
//!
//! The pieces are:
//! - [`mcp`]: launches the provider script and speaks MCP to it over stdio.
//! - [`tools`]: the registry adapter the orchestrator lists and calls tools through.
//! - [`gateway`]: one request/response call to the Anthropic Messages API.
//! - [`agent`]: the tool-use loop and the session that owns the connection.
//!
//! # Quick Start
//!
//! ```no_run
//! use toolrelay::agent::Orchestrator;
//! use toolrelay::config::RelayConfig;
//! use toolrelay::gateway::AnthropicGateway;
//! use toolrelay::mcp::{client_for_script, ProviderConnection, ProviderScript};
//! use toolrelay::tools::ProviderToolRegistry;
//!
//! # async fn example() -> toolrelay::error::Result<()> {
//! let script = ProviderScript::from_path("server.py")?;
//! let gateway = AnthropicGateway::from_config(&RelayConfig::from_env()?)?;
//!
//! let mut client = client_for_script(&script);
//! client.initialize().await?;
//! let registry = ProviderToolRegistry::new(&client);
//! let answer = Orchestrator::new(&gateway, &registry)
//!     .process_query("List my last five transactions")
//!     .await;
//! client.close().await?;
//! println!("{}", answer?);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
