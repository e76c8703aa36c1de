//! Model gateway trait and the Anthropic implementation.

pub mod anthropic;
pub mod http;

use async_trait::async_trait;

use crate::error::RelayError;
use crate::tools::ToolCatalog;
use crate::types::{AssistantResponse, Transcript};

pub use anthropic::AnthropicGateway;

/// A single request/response call to a hosted model.
///
/// Implementations are stateless between calls: no retries, no streaming.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// The model identifier every call is sent to.
    fn model_id(&self) -> &str;

    /// Ask the model for the next assistant turn.
    async fn complete(
        &self,
        transcript: &Transcript,
        catalog: &ToolCatalog,
    ) -> Result<AssistantResponse, RelayError>;
}
