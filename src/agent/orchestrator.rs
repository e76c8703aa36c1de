//! The tool-use turn loop.
//!
//! A query is driven as a two-state machine. `Scanning` walks the current
//! model response block by block; a `ToolUse` block commits the assistant
//! turn built so far, runs the tool, appends its result and replaces the
//! response with the model's next one, starting over at its first block.
//! Walking off the end of a response moves to `Done`.

use tracing::debug;

use crate::error::RelayError;
use crate::gateway::ModelGateway;
use crate::tools::{ToolCatalog, ToolRegistry};
use crate::types::{AssistantResponse, ContentBlock, Transcript, Turn};

/// Everything a finished query produced.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    /// Emitted lines joined with `\n`.
    pub output: String,
    /// The full transcript, final assistant turn included.
    pub transcript: Transcript,
    pub model_calls: usize,
    pub tool_calls: usize,
}

enum WalkState {
    Scanning {
        response: AssistantResponse,
        cursor: usize,
        turn: Vec<ContentBlock>,
    },
    Done,
}

impl WalkState {
    fn scanning(response: AssistantResponse) -> Self {
        Self::Scanning {
            response,
            cursor: 0,
            turn: Vec::new(),
        }
    }
}

/// State owned by one query for its whole lifetime.
struct QueryState {
    transcript: Transcript,
    lines: Vec<String>,
    model_calls: usize,
    tool_calls: usize,
}

/// Drives one conversation between the user, the model and the tools.
///
/// Holds only borrowed collaborators; every query gets a fresh transcript.
/// Queries must not overlap on one orchestrator.
pub struct Orchestrator<'a> {
    gateway: &'a dyn ModelGateway,
    registry: &'a dyn ToolRegistry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(gateway: &'a dyn ModelGateway, registry: &'a dyn ToolRegistry) -> Self {
        Self { gateway, registry }
    }

    /// Answer `query`, calling tools as the model requests them.
    pub async fn process_query(&self, query: &str) -> Result<String, RelayError> {
        Ok(self.run(query).await?.output)
    }

    /// Like [`Self::process_query`], also returning the transcript and counts.
    pub async fn run(&self, query: &str) -> Result<QueryOutcome, RelayError> {
        let mut query_state = QueryState {
            transcript: Transcript::new(),
            lines: Vec::new(),
            model_calls: 0,
            tool_calls: 0,
        };
        query_state.transcript.push(Turn::user(query));

        let catalog = ToolCatalog::new(self.registry.list_tools().await?);
        debug!(tools = catalog.len(), "catalog fixed for query");

        let first = self.complete(&mut query_state, &catalog).await?;
        let mut state = WalkState::scanning(first);
        while let WalkState::Scanning {
            response,
            cursor,
            turn,
        } = state
        {
            state = self
                .step(response, cursor, turn, &mut query_state, &catalog)
                .await?;
        }

        Ok(QueryOutcome {
            output: query_state.lines.join("\n"),
            transcript: query_state.transcript,
            model_calls: query_state.model_calls,
            tool_calls: query_state.tool_calls,
        })
    }

    async fn step(
        &self,
        response: AssistantResponse,
        cursor: usize,
        mut turn: Vec<ContentBlock>,
        query_state: &mut QueryState,
        catalog: &ToolCatalog,
    ) -> Result<WalkState, RelayError> {
        let Some(block) = response.blocks.get(cursor).cloned() else {
            query_state.transcript.push(Turn::assistant(turn));
            return Ok(WalkState::Done);
        };

        match block {
            ContentBlock::Text { ref text } => {
                query_state.lines.push(text.clone());
                turn.push(block);
                Ok(WalkState::Scanning {
                    response,
                    cursor: cursor + 1,
                    turn,
                })
            }
            ContentBlock::ToolUse {
                ref id,
                ref name,
                ref input,
            } => {
                query_state
                    .lines
                    .push(format!("[Calling tool {name} with args {input}]"));
                let (id, name, input) = (id.clone(), name.clone(), input.clone());
                turn.push(block);
                query_state.transcript.push(Turn::assistant(turn));

                debug!(tool = %name, tool_use_id = %id, "model requested tool");
                let result = self.registry.call_tool(&name, input).await?;
                query_state.tool_calls += 1;
                query_state.transcript.push(Turn::tool_result(id, result));

                let next = self.complete(query_state, catalog).await?;
                Ok(WalkState::scanning(next))
            }
            ContentBlock::ToolResult { tool_use_id, .. } => Err(RelayError::Model(format!(
                "assistant response contains a tool_result block for '{tool_use_id}'"
            ))),
        }
    }

    async fn complete(
        &self,
        query_state: &mut QueryState,
        catalog: &ToolCatalog,
    ) -> Result<AssistantResponse, RelayError> {
        let response = self
            .gateway
            .complete(&query_state.transcript, catalog)
            .await?;
        query_state.model_calls += 1;
        debug!(
            model = self.gateway.model_id(),
            blocks = response.blocks.len(),
            tool_use = response.has_tool_use(),
            stop_reason = ?response.stop_reason,
            "model responded"
        );
        Ok(response)
    }
}
