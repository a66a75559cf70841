//! Reasoning engine -- drives the structured-output model call through the
//! request state machine.
//!
//! One request moves `Drafting -> (ToolsPending | Finalized | Failed)`;
//! `ToolsPending -> Drafting` happens at most once (the tool-round cap is
//! an enforced invariant, not a convention). Malformed model output gets a
//! single corrective retry; transport failures get bounded retries with
//! exponential backoff. OTel GenAI spans instrument every completion.

use std::time::Duration;

use tracing::{Instrument, debug, info_span, warn};

use parley_types::error::PipelineError;
use parley_types::llm::{
    LlmTrace, PromptMessage, ReasoningOutput, ReasoningRequest, StructuredCompletion,
};
use parley_types::message::MessageRole;
use parley_types::tool::{ToolCallRequest, ToolResult};
use parley_types::trace::{ReasoningTrace, ROUTING_TOOL_DISPATCH};
use parley_types::ui::UiMetadata;

use crate::prompt::{AssembledPrompt, PromptBuilder};

use super::backend::BoxReasoningBackend;

/// At most one tool-dispatch round per request.
const MAX_TOOL_ROUNDS: u8 = 1;

/// Tunables for the reasoning engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Transport attempts per completion (first try included).
    pub transport_attempts: u32,
    /// Base delay for exponential backoff between transport attempts.
    pub backoff_base: Duration,
}

impl EngineSettings {
    pub fn new(model: String, temperature: f64, max_tokens: u32) -> Self {
        Self {
            model,
            temperature,
            max_tokens,
            transport_attempts: 3,
            backoff_base: Duration::from_millis(200),
        }
    }
}

/// The answer produced by a finalized pass, before composition.
#[derive(Debug, Clone)]
pub struct FinalDraft {
    pub answer: String,
    pub trace: ReasoningTrace,
    pub metadata: Option<UiMetadata>,
}

/// Result of one drafting pass.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    /// A complete answer with its trace; the request is done reasoning.
    Finalized(FinalDraft),
    /// The model wants tool results before answering.
    ToolsPending {
        calls: Vec<ToolCallRequest>,
        provisional: ReasoningTrace,
    },
}

/// Request-scoped state of the reasoning state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Drafting,
    ToolsPending,
    Finalized,
    Failed,
}

/// Invokes the model backend with a strict output schema and parses the
/// result. Purely functional given its inputs -- no side effects beyond
/// the outbound call.
pub struct ReasoningEngine {
    backend: BoxReasoningBackend,
    settings: EngineSettings,
    output_schema: serde_json::Value,
}

impl ReasoningEngine {
    pub fn new(backend: BoxReasoningBackend, settings: EngineSettings) -> Self {
        let output_schema = serde_json::to_value(schemars::schema_for!(ReasoningOutput))
            .unwrap_or_else(|_| serde_json::json!({}));
        Self {
            backend,
            settings,
            output_schema,
        }
    }

    /// Start a reasoning session for an assembled prompt.
    pub fn begin(&self, prompt: AssembledPrompt) -> ReasoningSession<'_> {
        ReasoningSession {
            engine: self,
            system: prompt.system,
            messages: prompt.messages,
            state: SessionState::Drafting,
            tool_rounds: 0,
            llm_trace: LlmTrace::default(),
        }
    }

    /// One completion with bounded transport retries and backoff.
    async fn complete_with_retries(
        &self,
        messages: &[PromptMessage],
        system: &str,
    ) -> Result<StructuredCompletion, PipelineError> {
        let request = ReasoningRequest {
            model: self.settings.model.clone(),
            system: system.to_string(),
            messages: messages.to_vec(),
            output_schema: self.output_schema.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        };

        let mut last_error = String::new();
        for attempt in 1..=self.settings.transport_attempts {
            let span = info_span!(
                "gen_ai.reasoning",
                gen_ai.operation.name = "chat",
                gen_ai.provider.name = self.backend.name(),
                gen_ai.request.model = %request.model,
                gen_ai.request.max_tokens = request.max_tokens,
                attempt,
            );

            match self
                .backend
                .complete_structured(&request)
                .instrument(span)
                .await
            {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_transient() => {
                    last_error = err.to_string();
                    warn!(attempt, error = %err, "Transient model backend failure");
                    if attempt < self.settings.transport_attempts {
                        let delay = self.settings.backoff_base * 2u32.pow(attempt - 1);
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => {
                    // Auth and request-shape failures will not heal on retry.
                    return Err(PipelineError::ModelUnavailable {
                        attempts: attempt,
                        last_error: err.to_string(),
                    });
                }
            }
        }

        Err(PipelineError::ModelUnavailable {
            attempts: self.settings.transport_attempts,
            last_error,
        })
    }
}

/// One request's walk through the reasoning state machine.
///
/// Accumulates LLM usage across every completion spent on the request
/// (schema repair and the post-tool pass included).
pub struct ReasoningSession<'a> {
    engine: &'a ReasoningEngine,
    system: String,
    messages: Vec<PromptMessage>,
    state: SessionState,
    tool_rounds: u8,
    llm_trace: LlmTrace,
}

impl ReasoningSession<'_> {
    /// Run one drafting pass.
    ///
    /// Fails with `ToolLoopExceeded` when the model requests tools after
    /// its dispatch round has already been spent, with `ReasoningSchema`
    /// when the output stays malformed through the corrective retry, and
    /// with `ModelUnavailable` when transport retries are exhausted.
    pub async fn draft(&mut self) -> Result<PassOutcome, PipelineError> {
        assert_eq!(
            self.state,
            SessionState::Drafting,
            "draft() called outside the Drafting state"
        );

        let output = match self.complete_and_parse().await {
            Ok(output) => output,
            Err(err) => {
                self.state = SessionState::Failed;
                return Err(err);
            }
        };

        if !output.tool_calls.is_empty() {
            if self.tool_rounds >= MAX_TOOL_ROUNDS {
                warn!(
                    rounds = self.tool_rounds,
                    "Model requested tools after its dispatch round was spent"
                );
                self.state = SessionState::Failed;
                return Err(PipelineError::ToolLoopExceeded);
            }

            let mut provisional = output.trace.clone();
            if provisional.routing.path != ROUTING_TOOL_DISPATCH {
                provisional.routing.path = ROUTING_TOOL_DISPATCH.to_string();
            }

            self.state = SessionState::ToolsPending;
            return Ok(PassOutcome::ToolsPending {
                calls: output.tool_calls,
                provisional,
            });
        }

        match output.answer {
            Some(answer) if !answer.trim().is_empty() => {
                self.state = SessionState::Finalized;
                Ok(PassOutcome::Finalized(FinalDraft {
                    answer,
                    trace: output.trace,
                    metadata: output.metadata,
                }))
            }
            _ => {
                // Neither an answer nor tool calls: the document is
                // schema-shaped but semantically empty.
                self.state = SessionState::Failed;
                Err(PipelineError::ReasoningSchema(
                    "output carried neither an answer nor tool calls".to_string(),
                ))
            }
        }
    }

    /// Fold tool results into the conversation and re-enter Drafting.
    pub fn fold_tool_results(&mut self, results: &[ToolResult]) {
        assert_eq!(
            self.state,
            SessionState::ToolsPending,
            "fold_tool_results() called outside the ToolsPending state"
        );
        self.messages.push(PromptBuilder::tool_results_message(results));
        self.tool_rounds += 1;
        self.state = SessionState::Drafting;
        debug!(round = self.tool_rounds, "Tool results folded; re-drafting");
    }

    /// Accumulated usage across all completions so far.
    pub fn llm_trace(&self) -> &LlmTrace {
        &self.llm_trace
    }

    /// Consume the session, yielding the accumulated usage.
    pub fn into_llm_trace(self) -> LlmTrace {
        self.llm_trace
    }

    /// One completion, with a single corrective retry on malformed output.
    async fn complete_and_parse(&mut self) -> Result<ReasoningOutput, PipelineError> {
        let completion = self
            .engine
            .complete_with_retries(&self.messages, &self.system)
            .await?;
        self.llm_trace.absorb(&completion);

        match serde_json::from_value::<ReasoningOutput>(completion.output.clone()) {
            Ok(output) => {
                self.push_assistant_echo(&completion);
                Ok(output)
            }
            Err(parse_error) => {
                warn!(error = %parse_error, "Schema validation failed; issuing corrective retry");
                self.push_assistant_echo(&completion);
                self.messages
                    .push(PromptBuilder::schema_repair_message(&parse_error.to_string()));

                let retry = self
                    .engine
                    .complete_with_retries(&self.messages, &self.system)
                    .await?;
                self.llm_trace.absorb(&retry);

                match serde_json::from_value::<ReasoningOutput>(retry.output.clone()) {
                    Ok(output) => {
                        self.push_assistant_echo(&retry);
                        Ok(output)
                    }
                    Err(second_error) => Err(PipelineError::ReasoningSchema(
                        second_error.to_string(),
                    )),
                }
            }
        }
    }

    /// Keep the model's own output in the message list so follow-up passes
    /// see a coherent conversation.
    fn push_assistant_echo(&mut self, completion: &StructuredCompletion) {
        let content =
            serde_json::to_string(&completion.output).unwrap_or_else(|_| "{}".to_string());
        self.messages.push(PromptMessage {
            role: MessageRole::Assistant,
            content,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::backend::ReasoningBackend;
    use parley_types::llm::{LlmError, Usage};
    use parley_types::tool::ToolOutcome;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend that replays a scripted sequence of results.
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<serde_json::Value, LlmError>>>,
        calls: AtomicU32,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<serde_json::Value, LlmError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            }
        }
    }

    impl ReasoningBackend for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete_structured(
            &self,
            request: &ReasoningRequest,
        ) -> Result<StructuredCompletion, LlmError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");
            next.map(|output| StructuredCompletion {
                id: format!("resp_{call}"),
                model: request.model.clone(),
                output,
                usage: Usage {
                    input_tokens: 100,
                    output_tokens: 10,
                },
            })
        }
    }

    fn final_answer_doc() -> serde_json::Value {
        json!({
            "answer": "It is 18 C in Paris.",
            "trace": {
                "routing": {"path": "answer-direct", "rationale": "had the data"},
                "evidence": ["tool:weather:c1"],
                "verification": "verified"
            }
        })
    }

    fn tool_dispatch_doc() -> serde_json::Value {
        json!({
            "trace": {
                "routing": {"path": "tool-dispatch", "rationale": "needs live data"},
                "verification": "unverified"
            },
            "tool_calls": [{
                "id": "c1",
                "tool_name": "weather",
                "arguments": {"city": "Paris"},
                "rationale": "current conditions requested"
            }]
        })
    }

    fn engine(script: Vec<Result<serde_json::Value, LlmError>>) -> ReasoningEngine {
        let mut settings = EngineSettings::new("test-model".to_string(), 0.2, 1024);
        settings.backoff_base = Duration::from_millis(1);
        ReasoningEngine::new(BoxReasoningBackend::new(ScriptedBackend::new(script)), settings)
    }

    fn prompt() -> AssembledPrompt {
        AssembledPrompt {
            system: "system".to_string(),
            messages: vec![PromptMessage {
                role: MessageRole::User,
                content: "What's the weather in Paris?".to_string(),
            }],
        }
    }

    fn weather_result() -> ToolResult {
        ToolResult {
            request: ToolCallRequest {
                id: "c1".to_string(),
                tool_name: "weather".to_string(),
                arguments: json!({"city": "Paris"}),
                rationale: "r".to_string(),
            },
            outcome: ToolOutcome::Success {
                payload: json!({"temp_c": 18.0}),
            },
        }
    }

    #[tokio::test]
    async fn test_direct_final_answer() {
        let engine = engine(vec![Ok(final_answer_doc())]);
        let mut session = engine.begin(prompt());

        let outcome = session.draft().await.unwrap();
        match outcome {
            PassOutcome::Finalized(draft) => {
                assert_eq!(draft.answer, "It is 18 C in Paris.");
                assert_eq!(draft.trace.evidence, vec!["tool:weather:c1"]);
            }
            other => panic!("expected Finalized, got {other:?}"),
        }
        assert_eq!(session.llm_trace().total_tokens, 110);
    }

    #[tokio::test]
    async fn test_tool_dispatch_then_final() {
        let engine = engine(vec![Ok(tool_dispatch_doc()), Ok(final_answer_doc())]);
        let mut session = engine.begin(prompt());

        let outcome = session.draft().await.unwrap();
        let calls = match outcome {
            PassOutcome::ToolsPending { calls, provisional } => {
                assert_eq!(provisional.routing.path, "tool-dispatch");
                calls
            }
            other => panic!("expected ToolsPending, got {other:?}"),
        };
        assert_eq!(calls.len(), 1);

        session.fold_tool_results(&[weather_result()]);
        let outcome = session.draft().await.unwrap();
        assert!(matches!(outcome, PassOutcome::Finalized(_)));

        // Two completions worth of usage accumulated.
        assert_eq!(session.llm_trace().total_tokens, 220);
    }

    #[tokio::test]
    async fn test_second_tool_request_is_loop_exceeded() {
        let engine = engine(vec![Ok(tool_dispatch_doc()), Ok(tool_dispatch_doc())]);
        let mut session = engine.begin(prompt());

        let outcome = session.draft().await.unwrap();
        assert!(matches!(outcome, PassOutcome::ToolsPending { .. }));

        session.fold_tool_results(&[weather_result()]);
        let err = session.draft().await.unwrap_err();
        assert!(matches!(err, PipelineError::ToolLoopExceeded));
    }

    #[tokio::test]
    async fn test_malformed_output_repaired_once() {
        let engine = engine(vec![
            Ok(json!({"nonsense": true})),
            Ok(final_answer_doc()),
        ]);
        let mut session = engine.begin(prompt());

        let outcome = session.draft().await.unwrap();
        assert!(matches!(outcome, PassOutcome::Finalized(_)));
        // Both completions counted.
        assert_eq!(session.llm_trace().total_tokens, 220);
    }

    #[tokio::test]
    async fn test_malformed_output_twice_is_schema_error() {
        let engine = engine(vec![
            Ok(json!({"nonsense": true})),
            Ok(json!({"still": "wrong"})),
        ]);
        let mut session = engine.begin(prompt());

        let err = session.draft().await.unwrap_err();
        assert!(matches!(err, PipelineError::ReasoningSchema(_)));
    }

    #[tokio::test]
    async fn test_empty_document_treated_as_schema_failure() {
        // Schema-shaped but with neither answer nor tool calls, twice.
        let empty = json!({
            "trace": {
                "routing": {"path": "answer-direct", "rationale": "r"},
                "verification": "unverified"
            }
        });
        let engine = engine(vec![Ok(empty.clone()), Ok(empty)]);
        let mut session = engine.begin(prompt());

        let err = session.draft().await.unwrap_err();
        assert!(matches!(err, PipelineError::ReasoningSchema(_)));
    }

    #[tokio::test]
    async fn test_transient_failures_retried_then_succeed() {
        let engine = engine(vec![
            Err(LlmError::Timeout),
            Err(LlmError::Overloaded("529".to_string())),
            Ok(final_answer_doc()),
        ]);
        let mut session = engine.begin(prompt());

        let outcome = session.draft().await.unwrap();
        assert!(matches!(outcome, PassOutcome::Finalized(_)));
    }

    #[tokio::test]
    async fn test_transport_retries_exhausted() {
        let engine = engine(vec![
            Err(LlmError::Timeout),
            Err(LlmError::Timeout),
            Err(LlmError::Timeout),
        ]);
        let mut session = engine.begin(prompt());

        let err = session.draft().await.unwrap_err();
        match err {
            PipelineError::ModelUnavailable { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected ModelUnavailable, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let engine = engine(vec![Err(LlmError::AuthenticationFailed)]);
        let mut session = engine.begin(prompt());

        let err = session.draft().await.unwrap_err();
        match err {
            PipelineError::ModelUnavailable { attempts, last_error } => {
                assert_eq!(attempts, 1);
                assert!(last_error.contains("authentication"));
            }
            other => panic!("expected ModelUnavailable, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_answer_string_rejected() {
        let blank = json!({
            "answer": "   ",
            "trace": {
                "routing": {"path": "answer-direct", "rationale": "r"},
                "verification": "unverified"
            }
        });
        let engine = engine(vec![Ok(blank.clone()), Ok(blank)]);
        let mut session = engine.begin(prompt());

        let err = session.draft().await.unwrap_err();
        assert!(matches!(err, PipelineError::ReasoningSchema(_)));
    }
}
