//! Pipeline entry point -- one call per inbound chat request.
//!
//! Stage order: persona resolution, context assembly, prompt build, first
//! reasoning pass, optional tool dispatch plus second pass, composition,
//! backend sync. Every collaborator is an explicitly injected object; the
//! pipeline holds no ambient globals and no lock across an external call.
//! Requests are independent -- the only shared state is the read-only
//! persona registry and tool catalogue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use parley_types::config::PipelineConfig;
use parley_types::error::PipelineError;
use parley_types::message::{ChatRequest, MessageRole, StoredTurn};
use parley_types::response::AgentResponse;
use parley_types::tool::ToolResult;

use crate::compose::{ComposeParams, ResponseComposer};
use crate::context::ContextAssembler;
use crate::persona::PersonaRegistry;
use crate::prompt::PromptBuilder;
use crate::reasoning::{
    BoxReasoningBackend, EngineSettings, FinalDraft, PassOutcome, ReasoningEngine,
};
use crate::store::BoxConversationStore;
use crate::sync::BackendSync;
use crate::tools::{ToolCatalogue, ToolExecutor};

/// The response-generation pipeline.
///
/// Construct once at startup and share across request tasks; `handle` is
/// `&self` and safe for unlimited concurrent callers.
pub struct AgentPipeline {
    config: PipelineConfig,
    personas: PersonaRegistry,
    catalogue: Arc<ToolCatalogue>,
    engine: ReasoningEngine,
    assembler: ContextAssembler,
    executor: ToolExecutor,
    composer: ResponseComposer,
    sync: BackendSync,
    store: BoxConversationStore,
}

impl AgentPipeline {
    pub fn new(
        config: PipelineConfig,
        personas: PersonaRegistry,
        catalogue: ToolCatalogue,
        backend: BoxReasoningBackend,
        store: BoxConversationStore,
    ) -> Self {
        let catalogue = Arc::new(catalogue);
        let settings =
            EngineSettings::new(config.model.clone(), config.temperature, config.max_tokens);
        let engine = ReasoningEngine::new(backend, settings);
        let assembler = ContextAssembler::new(config.profile.clone(), config.history_window);
        let executor = ToolExecutor::new(
            Arc::clone(&catalogue),
            config.tool_concurrency,
            Duration::from_millis(config.tool_timeout_ms),
        );
        let sync = BackendSync::new(Duration::from_millis(config.sync_timeout_ms));

        Self {
            config,
            personas,
            catalogue,
            engine,
            assembler,
            executor,
            composer: ResponseComposer::default(),
            sync,
            store,
        }
    }

    /// Replace the context assembler (tests pin its clock).
    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Handle one chat request end-to-end.
    #[instrument(skip_all, fields(conversation_id))]
    pub async fn handle(
        &self,
        request: ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse, PipelineError> {
        // Persona resolution comes first: a misconfigured persona must fail
        // before any model call is made.
        let persona_key = request
            .persona
            .as_deref()
            .unwrap_or(&self.config.default_persona);
        let persona = self
            .personas
            .get(persona_key)
            .map_err(|_| PipelineError::PersonaNotFound(persona_key.to_string()))?;

        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        tracing::Span::current().record("conversation_id", conversation_id.as_str());
        info!(persona = persona_key, "Handling chat request");

        self.ensure_live(cancel)?;
        let context = self.assembler.assemble(&self.store, &conversation_id).await;

        let persona_text = self.personas.render(persona, &self.persona_vars());
        let format = request.format.unwrap_or(persona.default_format);
        let prompt = PromptBuilder::build(
            &persona_text,
            &context,
            &self.catalogue.specs(),
            format,
            &request.text,
        );

        self.ensure_live(cancel)?;
        let mut session = self.engine.begin(prompt);

        let mut draft = match session.draft().await? {
            PassOutcome::Finalized(draft) => draft,
            PassOutcome::ToolsPending { calls, .. } => {
                self.ensure_live(cancel)?;
                let results = self.executor.execute(calls).await;

                self.ensure_live(cancel)?;
                session.fold_tool_results(&results);
                match session.draft().await? {
                    PassOutcome::Finalized(draft) => {
                        Self::merge_tool_evidence(draft, &results)
                    }
                    // The engine's round cap makes this unreachable, but the
                    // invariant belongs to the pipeline too.
                    PassOutcome::ToolsPending { .. } => {
                        return Err(PipelineError::ToolLoopExceeded);
                    }
                }
            }
        };
        draft.answer = draft.answer.trim().to_string();

        self.ensure_live(cancel)?;
        let response = self.composer.compose(ComposeParams {
            draft,
            conversation_id: conversation_id.clone(),
            message_id: Uuid::now_v7(),
            text_format: format,
            history_degraded: context.history_degraded,
            llm_trace: session.into_llm_trace(),
        });

        let user_turn = StoredTurn {
            message_id: Uuid::now_v7(),
            role: MessageRole::User,
            text: request.text,
            text_format: format,
            metadata: None,
            trace: None,
            created_at: Utc::now(),
        };
        let response = match self
            .sync
            .persist_exchange(&self.store, &conversation_id, &user_turn, &response)
            .await
        {
            Some(warning) => response.with_warning(warning),
            None => response,
        };

        Ok(response)
    }

    /// Substitutions available to persona templates.
    fn persona_vars(&self) -> HashMap<&'static str, String> {
        let profile = &self.config.profile;
        HashMap::from([
            ("user_name", profile.display_name.clone()),
            ("locale", profile.locale.clone()),
            ("units", profile.units.clone()),
        ])
    }

    /// Guarantee the trace cites every executed tool result, whether or not
    /// the model remembered to.
    fn merge_tool_evidence(mut draft: FinalDraft, results: &[ToolResult]) -> FinalDraft {
        for result in results {
            let id = result.request.evidence_id();
            if !draft.trace.evidence.contains(&id) {
                draft.trace.push_evidence(id);
            }
        }
        draft
    }

    fn ensure_live(&self, cancel: &CancellationToken) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
