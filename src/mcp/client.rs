//! MCP client for the tool provider.

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientInfo, Content, JsonObject, ProtocolVersion,
    ResourceContents,
};
use rmcp::service::{ClientInitializeError, ServiceError};
use tracing::{debug, info};

use super::connection::ProviderConnection;
use super::transport::{MCPTransport, ProviderService};
use crate::error::RelayError;
use crate::tools::ToolDescriptor;

/// Where the client is in its lifecycle. Each state owns what it needs.
enum Link {
    Idle(Box<dyn MCPTransport>),
    Live {
        transport: Box<dyn MCPTransport>,
        service: ProviderService,
    },
    Closed,
}

/// Client for a Model Context Protocol server.
pub struct MCPClient {
    link: Link,
}

impl MCPClient {
    /// Create an unconnected client; nothing starts until `initialize`.
    pub fn new(transport: Box<dyn MCPTransport>) -> Self {
        Self {
            link: Link::Idle(transport),
        }
    }

    fn service(&self) -> Result<&ProviderService, RelayError> {
        match &self.link {
            Link::Live { service, .. } => Ok(service),
            Link::Idle(_) => Err(RelayError::Connection(
                "MCP client used before initialize".into(),
            )),
            Link::Closed => Err(closed()),
        }
    }
}

#[async_trait]
impl ProviderConnection for MCPClient {
    async fn initialize(&mut self) -> Result<(), RelayError> {
        let mut transport = match std::mem::replace(&mut self.link, Link::Closed) {
            Link::Idle(transport) => transport,
            live @ Link::Live { .. } => {
                self.link = live;
                return Ok(());
            }
            Link::Closed => return Err(closed()),
        };

        match handshake(transport.as_mut()).await {
            Ok(service) => {
                if let Some(peer) = service.peer_info() {
                    info!(
                        server = %peer.server_info.name,
                        version = %peer.server_info.version,
                        "connected to MCP provider"
                    );
                }
                self.link = Link::Live { transport, service };
                Ok(())
            }
            Err(err) => {
                self.link = Link::Idle(transport);
                Err(err)
            }
        }
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RelayError> {
        let service = self.service()?;

        // Servers that reject the paginated walk still answer a single page.
        let tools = match service.list_all_tools().await {
            Err(ServiceError::UnexpectedResponse) => {
                service.list_tools(None).await.map(|page| page.tools)
            }
            other => other,
        }
        .map_err(|e| RelayError::Connection(format!("tools/list failed: {e}")))?;

        Ok(tools.into_iter().map(descriptor_from_mcp).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError> {
        let service = self.service()?;
        let arguments = tool_arguments(name, arguments)?;

        let result = service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| RelayError::tool(name, format!("tools/call failed: {e}")))?;

        tool_payload(name, result)
    }

    async fn close(&mut self) -> Result<(), RelayError> {
        match std::mem::replace(&mut self.link, Link::Closed) {
            Link::Closed => Ok(()),
            Link::Idle(mut transport) => {
                transport.shut();
                Ok(())
            }
            Link::Live {
                mut transport,
                service,
            } => {
                transport.shut();
                let reason = service.cancel().await.map_err(|e| {
                    RelayError::Connection(format!("provider shutdown failed: {e}"))
                })?;
                info!(?reason, "MCP provider closed");
                Ok(())
            }
        }
    }
}

fn closed() -> RelayError {
    RelayError::Connection("MCP client is closed".into())
}

/// Handshake at the newest protocol, falling back once to 2024-11-05.
async fn handshake(transport: &mut dyn MCPTransport) -> Result<ProviderService, RelayError> {
    let client_info = |protocol_version| ClientInfo {
        protocol_version,
        ..Default::default()
    };

    let result = match transport.handshake(client_info(ProtocolVersion::LATEST)).await {
        Err(err) if is_version_mismatch(&err) => {
            debug!("provider rejected the latest protocol version, retrying with 2024-11-05");
            transport
                .handshake(client_info(ProtocolVersion::V_2024_11_05))
                .await
        }
        other => other,
    };
    result.map_err(|e| RelayError::Connection(format!("MCP handshake failed: {e}")))
}

fn is_version_mismatch(err: &ClientInitializeError) -> bool {
    match err {
        ClientInitializeError::JsonRpcError(data) => {
            let message = data.message.to_lowercase();
            message.contains("protocol") && message.contains("version")
        }
        _ => false,
    }
}

fn descriptor_from_mcp(tool: rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.into_owned(),
        description: tool.description.map(String::from).unwrap_or_default(),
        input_schema: serde_json::Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Model tool inputs are JSON objects; `null` means no arguments.
fn tool_arguments(
    name: &str,
    arguments: serde_json::Value,
) -> Result<Option<JsonObject>, RelayError> {
    match arguments {
        serde_json::Value::Object(map) => Ok(Some(map)),
        serde_json::Value::Null => Ok(None),
        other => Err(RelayError::tool(
            name,
            format!("arguments must be a JSON object, got {other}"),
        )),
    }
}

/// The value handed back to the model: structured content, else the joined
/// text parts, else the raw content list.
fn tool_payload(name: &str, result: CallToolResult) -> Result<serde_json::Value, RelayError> {
    let text = joined_text(&result.content);

    if result.is_error == Some(true) {
        let message = text
            .or_else(|| result.structured_content.as_ref().map(|v| v.to_string()))
            .unwrap_or_else(|| "provider reported an error".into());
        return Err(RelayError::tool(name, message));
    }

    if let Some(structured) = result.structured_content {
        return Ok(structured);
    }
    if let Some(text) = text {
        return Ok(serde_json::Value::String(text));
    }
    Ok(serde_json::Value::Array(
        result
            .content
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect(),
    ))
}

fn joined_text(content: &[Content]) -> Option<String> {
    let parts: Vec<&str> = content
        .iter()
        .filter_map(|item| {
            if let Some(text) = item.as_text() {
                return Some(text.text.as_str());
            }
            match &item.as_resource()?.resource {
                ResourceContents::TextResourceContents { text, .. } => Some(text.as_str()),
                _ => None,
            }
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join("\n"))
}
