//! ReasoningBackend port -- the language-model side of the pipeline.
//!
//! A backend performs exactly one schema-constrained completion per call;
//! retries, schema repair, and the tool-round state machine all live in
//! [`super::engine::ReasoningEngine`]. Implementations live in
//! `parley-infra` (e.g. `OpenAiCompatBackend`).

use std::future::Future;
use std::pin::Pin;

use parley_types::llm::{LlmError, ReasoningRequest, StructuredCompletion};

/// Trait for structured-output model backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition);
/// [`BoxReasoningBackend`] provides the object-safe wrapper.
pub trait ReasoningBackend: Send + Sync {
    /// Human-readable backend name (e.g. "openai_compatible").
    fn name(&self) -> &str;

    /// Perform one structured completion.
    fn complete_structured(
        &self,
        request: &ReasoningRequest,
    ) -> impl Future<Output = Result<StructuredCompletion, LlmError>> + Send;
}

/// Object-safe version of [`ReasoningBackend`] with boxed futures.
pub trait ReasoningBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn complete_structured_boxed<'a>(
        &'a self,
        request: &'a ReasoningRequest,
    ) -> Pin<Box<dyn Future<Output = Result<StructuredCompletion, LlmError>> + Send + 'a>>;
}

impl<T: ReasoningBackend> ReasoningBackendDyn for T {
    fn name(&self) -> &str {
        ReasoningBackend::name(self)
    }

    fn complete_structured_boxed<'a>(
        &'a self,
        request: &'a ReasoningRequest,
    ) -> Pin<Box<dyn Future<Output = Result<StructuredCompletion, LlmError>> + Send + 'a>> {
        Box::pin(self.complete_structured(request))
    }
}

/// Type-erased reasoning backend for runtime provider selection.
pub struct BoxReasoningBackend {
    inner: Box<dyn ReasoningBackendDyn + Send + Sync>,
}

impl BoxReasoningBackend {
    /// Wrap a concrete backend in a type-erased box.
    pub fn new<T: ReasoningBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    /// Human-readable backend name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Perform one structured completion.
    pub async fn complete_structured(
        &self,
        request: &ReasoningRequest,
    ) -> Result<StructuredCompletion, LlmError> {
        self.inner.complete_structured_boxed(request).await
    }
}
