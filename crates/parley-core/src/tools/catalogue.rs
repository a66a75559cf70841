//! Tool port and catalogue.
//!
//! Each tool exposes a name, a JSON-schema input contract, and an async
//! invocation. The catalogue preserves declared order (the prompt builder
//! depends on it for determinism) and rejects duplicate names at
//! construction. Adding a tool means registering an implementation -- no
//! pipeline code changes.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parley_types::tool::{CatalogueError, ToolError, ToolSpec};

/// Trait for agent tools (weather lookups, exchange rates, ...).
///
/// Uses native async fn in traits (RPITIT); [`BoxTool`] provides the
/// object-safe wrapper the catalogue stores. Implementations live in
/// `parley-infra`.
pub trait Tool: Send + Sync {
    /// Declared contract: name, description, input schema.
    fn spec(&self) -> &ToolSpec;

    /// Execute the tool. Arguments have already been validated against the
    /// declared input schema. Retry policy belongs to the implementation.
    fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> impl Future<Output = Result<serde_json::Value, ToolError>> + Send;
}

/// Object-safe version of [`Tool`] with boxed futures.
pub trait ToolDyn: Send + Sync {
    fn spec(&self) -> &ToolSpec;

    fn invoke_boxed(
        &self,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>>;
}

impl<T: Tool> ToolDyn for T {
    fn spec(&self) -> &ToolSpec {
        Tool::spec(self)
    }

    fn invoke_boxed(
        &self,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>> {
        Box::pin(self.invoke(arguments))
    }
}

/// Type-erased tool.
pub struct BoxTool {
    inner: Box<dyn ToolDyn + Send + Sync>,
}

impl BoxTool {
    /// Wrap a concrete tool in a type-erased box.
    pub fn new<T: Tool + 'static>(tool: T) -> Self {
        Self {
            inner: Box::new(tool),
        }
    }

    /// Declared contract of the wrapped tool.
    pub fn spec(&self) -> &ToolSpec {
        self.inner.spec()
    }

    /// Execute the wrapped tool.
    pub async fn invoke(
        &self,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        self.inner.invoke_boxed(arguments).await
    }
}

/// Process-wide, read-only tool registry.
///
/// Safe for unlimited concurrent readers; built once at startup.
pub struct ToolCatalogue {
    tools: Vec<Arc<BoxTool>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolCatalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCatalogue")
            .field(
                "tools",
                &self.tools.iter().map(|t| &t.spec().name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ToolCatalogue {
    /// Build a catalogue, preserving declared order.
    pub fn new(tools: Vec<BoxTool>) -> Result<Self, CatalogueError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            let name = tool.spec().name.clone();
            if index.insert(name.clone(), i).is_some() {
                return Err(CatalogueError::DuplicateName(name));
            }
        }
        Ok(Self {
            tools: tools.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// An empty catalogue (no tools registered).
    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Tool specs in declared order, for the prompt builder.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec().clone()).collect()
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<BoxTool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.tools[i]))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
