//! Shared test helpers: a scripted model gateway and a scripted provider.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use toolrelay::error::RelayError;
use toolrelay::gateway::ModelGateway;
use toolrelay::mcp::ProviderConnection;
use toolrelay::tools::{ToolCatalog, ToolDescriptor};
use toolrelay::types::{AssistantResponse, ContentBlock, Transcript};

/// A gateway that replays queued responses and records every request.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<AssistantResponse, String>>>,
    requests: Mutex<Vec<(Transcript, Vec<String>)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response made of the given blocks.
    pub fn queue(&self, blocks: Vec<ContentBlock>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(AssistantResponse::new(blocks)));
        self
    }

    /// Queue a single text block response.
    pub fn queue_text(&self, text: &str) -> &Self {
        self.queue(vec![ContentBlock::text(text)])
    }

    /// Queue a response that is a single tool use.
    pub fn queue_tool_use(&self, id: &str, name: &str, input: serde_json::Value) -> &Self {
        self.queue(vec![ContentBlock::tool_use(id, name, input)])
    }

    /// Queue a model failure.
    pub fn queue_failure(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Transcripts as they were at each call, in call order.
    pub fn transcripts(&self) -> Vec<Transcript> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(transcript, _)| transcript.clone())
            .collect()
    }

    /// Tool names offered to the model at each call.
    pub fn offered_tools(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, tools)| tools.clone())
            .collect()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        transcript: &Transcript,
        catalog: &ToolCatalog,
    ) -> Result<AssistantResponse, RelayError> {
        let names = catalog.names().into_iter().map(str::to_string).collect();
        self.requests
            .lock()
            .unwrap()
            .push((transcript.clone(), names));
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(RelayError::Model(message)),
            None => Err(RelayError::Model("no scripted response left".into())),
        }
    }
}

/// Where a [`ScriptedConnection`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Initialize,
    ListTools,
    /// Listings succeed this many times, then fail.
    ListToolsAfter(usize),
    CallTool,
    Close,
}

/// Counters shared with the test after the connection is moved away.
#[derive(Debug, Default)]
pub struct ConnectionLog {
    pub initialize: AtomicUsize,
    pub list_tools: AtomicUsize,
    pub close: AtomicUsize,
    pub calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl ConnectionLog {
    pub fn closes(&self) -> usize {
        self.close.load(Ordering::SeqCst)
    }

    pub fn listings(&self) -> usize {
        self.list_tools.load(Ordering::SeqCst)
    }

    pub fn tool_calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

/// An in-memory provider. Tool calls echo their name and arguments.
pub struct ScriptedConnection {
    tools: Vec<ToolDescriptor>,
    fail_at: Option<FailAt>,
    initialized: bool,
    closed: bool,
    log: Arc<ConnectionLog>,
}

impl ScriptedConnection {
    pub fn new(tool_names: &[&str]) -> Self {
        Self {
            tools: tool_names
                .iter()
                .map(|name| {
                    ToolDescriptor::new(
                        *name,
                        format!("{name} tool"),
                        json!({"type": "object", "properties": {}}),
                    )
                })
                .collect(),
            fail_at: None,
            initialized: false,
            closed: false,
            log: Arc::new(ConnectionLog::default()),
        }
    }

    /// A connection that has already completed its handshake.
    pub fn initialized(tool_names: &[&str]) -> Self {
        let mut connection = Self::new(tool_names);
        connection.initialized = true;
        connection
    }

    pub fn failing_at(mut self, fail_at: FailAt) -> Self {
        self.fail_at = Some(fail_at);
        self
    }

    pub fn log(&self) -> Arc<ConnectionLog> {
        Arc::clone(&self.log)
    }

    fn ensure_open(&self) -> Result<(), RelayError> {
        if self.closed {
            return Err(RelayError::Connection("connection is closed".into()));
        }
        if !self.initialized {
            return Err(RelayError::Connection(
                "connection is not initialized".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderConnection for ScriptedConnection {
    async fn initialize(&mut self) -> Result<(), RelayError> {
        self.log.initialize.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(FailAt::Initialize) {
            return Err(RelayError::Connection(
                "provider exited during handshake".into(),
            ));
        }
        self.initialized = true;
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, RelayError> {
        self.ensure_open()?;
        let listing = self.log.list_tools.fetch_add(1, Ordering::SeqCst) + 1;
        let fails = match self.fail_at {
            Some(FailAt::ListTools) => true,
            Some(FailAt::ListToolsAfter(ok)) => listing > ok,
            _ => false,
        };
        if fails {
            return Err(RelayError::Connection("tools/list failed".into()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, RelayError> {
        self.ensure_open()?;
        self.log
            .calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        if self.fail_at == Some(FailAt::CallTool) {
            return Err(RelayError::tool(name, "provider raised an exception"));
        }
        Ok(json!({ "tool": name, "arguments": arguments }))
    }

    async fn close(&mut self) -> Result<(), RelayError> {
        self.log.close.fetch_add(1, Ordering::SeqCst);
        self.closed = true;
        if self.fail_at == Some(FailAt::Close) {
            return Err(RelayError::Connection("provider did not exit".into()));
        }
        Ok(())
    }
}
