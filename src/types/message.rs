//! Conversation types exchanged between the orchestrator and the model.

use serde::{Deserialize, Serialize};

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single unit of turn content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// A tool invocation requested by the model. `id` is model-generated.
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// The provider's answer to an earlier `ToolUse` with the same id.
    ToolResult {
        tool_use_id: String,
        content: serde_json::Value,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: serde_json::Value) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
        }
    }
}

/// Turn content: either plain text or an ordered list of blocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One immutable entry in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    /// A user turn carrying the raw query text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
        }
    }

    /// An assistant turn built from response blocks.
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Blocks(blocks),
        }
    }

    /// A user turn answering one tool use.
    pub fn tool_result(tool_use_id: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Blocks(vec![ContentBlock::tool_result(tool_use_id, content)]),
        }
    }

    /// Blocks of this turn; empty for plain-text turns.
    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.content {
            TurnContent::Text(_) => &[],
            TurnContent::Blocks(blocks) => blocks,
        }
    }

    /// Ids of every `ToolUse` block in this turn.
    pub fn tool_use_ids(&self) -> Vec<&str> {
        self.blocks()
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Append-only history of turns for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn. Turns are never rewritten or removed.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

/// One assistant turn as returned by the model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistantResponse {
    pub blocks: Vec<ContentBlock>,
    /// Informational only; the orchestrator decides from the blocks.
    pub stop_reason: Option<String>,
}

impl AssistantResponse {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        Self {
            blocks,
            stop_reason: None,
        }
    }

    pub fn has_tool_use(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}
