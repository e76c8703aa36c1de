//! Provider script paths and the interpreters that launch them.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::RelayError;

/// Script types a provider may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Python,
    Node,
}

impl ScriptKind {
    /// Every accepted kind, in the order suffixes are reported to users.
    pub const ALL: [ScriptKind; 2] = [ScriptKind::Python, ScriptKind::Node];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::Node => "js",
        }
    }

    pub fn interpreter(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
        }
    }

    fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension() == extension)
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

/// A validated path to an executable tool-provider script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderScript {
    path: PathBuf,
    kind: ScriptKind,
}

impl ProviderScript {
    /// Validate `path` against the suffix allow-list.
    ///
    /// Suffix matching is case-sensitive. Nothing is touched on disk; a
    /// missing file surfaces later as a connection error.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, RelayError> {
        let path = path.into();
        let kind = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ScriptKind::from_extension)
            .ok_or_else(|| {
                let allowed = ScriptKind::ALL
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" or ");
                RelayError::Configuration(format!(
                    "Server script must be a {allowed} file: {}",
                    path.display()
                ))
            })?;
        Ok(Self { path, kind })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ScriptKind {
        self.kind
    }

    /// The program that runs this script, with the path as its only argument.
    pub fn interpreter(&self) -> &'static str {
        self.kind.interpreter()
    }
}
