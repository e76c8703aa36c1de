//! Tool catalog and the registry adapter the orchestrator calls through.

pub mod catalog;
pub mod registry;

pub use catalog::{ToolCatalog, ToolDescriptor};
pub use registry::{ProviderToolRegistry, ToolRegistry};
