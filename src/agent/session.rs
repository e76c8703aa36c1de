//! Interactive session over one provider connection.

use futures::{Stream, StreamExt};
use tracing::{info, warn};

use super::orchestrator::Orchestrator;
use crate::error::RelayError;
use crate::gateway::ModelGateway;
use crate::mcp::ProviderConnection;
use crate::tools::{ProviderToolRegistry, ToolRegistry};

/// Progress reported to the session's caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connection is up; names of the tools the provider listed.
    Connected { tools: Vec<String> },
    /// About to wait for the next query line.
    AwaitingQuery,
    /// A query finished.
    Answer { query: String, answer: String },
}

/// Run queries from `queries` until `quit` or end of input.
///
/// Takes ownership of `connection` and closes it exactly once, whichever
/// way the session ends. If the session failed, a close error is only
/// logged and the original error is returned.
pub async fn run_session<C, S, F>(
    mut connection: C,
    gateway: &dyn ModelGateway,
    queries: S,
    mut on_event: F,
) -> Result<(), RelayError>
where
    C: ProviderConnection,
    S: Stream<Item = std::io::Result<String>> + Unpin,
    F: FnMut(SessionEvent),
{
    let outcome = drive(&mut connection, gateway, queries, &mut on_event).await;
    let closed = connection.close().await;

    match (outcome, closed) {
        (Ok(()), closed) => closed,
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "failed to close provider connection");
            Err(err)
        }
    }
}

async fn drive<C, S, F>(
    connection: &mut C,
    gateway: &dyn ModelGateway,
    mut queries: S,
    on_event: &mut F,
) -> Result<(), RelayError>
where
    C: ProviderConnection,
    S: Stream<Item = std::io::Result<String>> + Unpin,
    F: FnMut(SessionEvent),
{
    connection.initialize().await?;

    let registry = ProviderToolRegistry::new(&*connection);
    let tools = registry
        .list_tools()
        .await?
        .into_iter()
        .map(|tool| tool.name)
        .collect::<Vec<_>>();
    info!(tools = ?tools, "provider connected");
    on_event(SessionEvent::Connected { tools });

    let orchestrator = Orchestrator::new(gateway, &registry);
    loop {
        on_event(SessionEvent::AwaitingQuery);
        let Some(line) = queries.next().await else {
            break;
        };
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") {
            break;
        }

        let answer = orchestrator.process_query(query).await?;
        on_event(SessionEvent::Answer {
            query: query.to_string(),
            answer,
        });
    }

    Ok(())
}
