//! OpenTelemetry GenAI Semantic Convention attribute constants.
//!
//! These follow the OTel GenAI Semantic Conventions for consistent LLM
//! call instrumentation across the pipeline. All constants are string
//! slices usable as `tracing::span!` field names.
//!
//! Span naming convention: `"{operation} {model}"` (e.g. `"chat gpt-4.1"`).

// --- Required attributes ---

/// The name of the operation being performed (e.g. "chat").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g. "openai_compatible").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Recommended attributes ---

/// The model ID requested (e.g. "gpt-4.1").
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";

/// The sampling temperature for the request.
pub const GEN_AI_REQUEST_TEMPERATURE: &str = "gen_ai.request.temperature";

/// The maximum number of output tokens requested.
pub const GEN_AI_REQUEST_MAX_TOKENS: &str = "gen_ai.request.max_tokens";

/// The number of input tokens consumed.
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";

/// The number of output tokens generated.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// The unique response id from the provider.
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";

// --- Pipeline-specific attributes ---

/// The conversation the request belongs to.
pub const GEN_AI_CONVERSATION_ID: &str = "gen_ai.conversation.id";

/// The persona applied to the prompt.
pub const PARLEY_PERSONA: &str = "parley.persona";

/// Which tool a span concerns.
pub const PARLEY_TOOL_NAME: &str = "parley.tool.name";

// --- Operation name values ---

/// A structured reasoning completion (either pass).
pub const OP_CHAT: &str = "chat";

/// One tool-dispatch round.
pub const OP_EXECUTE_TOOLS: &str = "execute_tools";

/// Persistence of the finished exchange.
pub const OP_SYNC_EXCHANGE: &str = "sync_exchange";
