//! Prompt builder -- combines persona, context, tool catalogue, and the
//! latest user message into a single structured prompt.
//!
//! The system prompt uses XML tag boundaries so the model can distinguish
//! persona, user context, output contract, and tool sections. Ordering is
//! strictly deterministic: history oldest-to-newest, tools in declared
//! order, serialized schemas with sorted keys -- identical inputs produce
//! byte-identical prompts.
//!
//! Layout:
//! ```text
//! <persona>{rendered persona template}</persona>
//! <user_context>Name: ... Locale: ... Local time: ...</user_context>
//! <output_contract>{schema contract + format instructions}</output_contract>
//! <tools><tool name="...">...</tool>...</tools>
//! ```

use parley_types::llm::PromptMessage;
use parley_types::message::{MessageRole, TextFormat};
use parley_types::tool::{ToolResult, ToolSpec};

use crate::context::ConversationContext;

/// A fully assembled prompt: system instructions plus ordered messages.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub system: String,
    /// History oldest-to-newest, latest user turn last.
    pub messages: Vec<PromptMessage>,
}

/// Builds prompts for the reasoning backend.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Assemble the prompt for the first reasoning pass.
    pub fn build(
        persona_text: &str,
        context: &ConversationContext,
        tools: &[ToolSpec],
        format: TextFormat,
        user_text: &str,
    ) -> AssembledPrompt {
        let mut sections = Vec::with_capacity(4);

        if !persona_text.trim().is_empty() {
            sections.push(format!("<persona>\n{}\n</persona>", persona_text.trim()));
        }

        sections.push(Self::user_context_section(context));
        sections.push(Self::output_contract_section(format));

        if !tools.is_empty() {
            sections.push(Self::tools_section(tools));
        }

        let mut messages: Vec<PromptMessage> = context
            .history
            .iter()
            .map(|turn| PromptMessage {
                role: turn.role,
                content: turn.text.clone(),
            })
            .collect();
        messages.push(PromptMessage {
            role: MessageRole::User,
            content: user_text.to_string(),
        });

        AssembledPrompt {
            system: sections.join("\n\n"),
            messages,
        }
    }

    /// Follow-up message folding tool results into the second pass.
    ///
    /// Results are serialized in request order with their evidence ids so
    /// the model can cite them. Failed calls appear with their error shape
    /// -- the model is expected to recover or apologize, not the pipeline.
    pub fn tool_results_message(results: &[ToolResult]) -> PromptMessage {
        let mut lines = Vec::with_capacity(results.len() + 2);
        lines.push("<tool_results>".to_string());
        for result in results {
            let outcome =
                serde_json::to_string(&result.outcome).unwrap_or_else(|_| "null".to_string());
            lines.push(format!(
                "<result id=\"{}\" tool=\"{}\">{}</result>",
                result.request.evidence_id(),
                result.request.tool_name,
                outcome
            ));
        }
        lines.push("</tool_results>".to_string());
        lines.push(
            "Produce the final answer now, citing the result ids above as evidence. \
             Do not request further tool calls."
                .to_string(),
        );

        PromptMessage {
            role: MessageRole::User,
            content: lines.join("\n"),
        }
    }

    /// Corrective follow-up after a schema-validation failure.
    pub fn schema_repair_message(parse_error: &str) -> PromptMessage {
        PromptMessage {
            role: MessageRole::User,
            content: format!(
                "Your previous reply did not conform to the required output schema \
                 ({parse_error}). Reply again with a single JSON document that \
                 conforms exactly. Do not include any text outside the JSON."
            ),
        }
    }

    fn user_context_section(context: &ConversationContext) -> String {
        let profile = &context.profile;
        let mut lines = vec![
            format!("Name: {}", profile.display_name),
            format!("Locale: {}", profile.locale),
            format!("Units: {}", profile.units),
            format!("Local time: {}", context.local_time),
        ];
        if let Some(city) = &profile.home_city {
            lines.push(format!("Home city: {city}"));
        }
        format!("<user_context>\n{}\n</user_context>", lines.join("\n"))
    }

    fn output_contract_section(format: TextFormat) -> String {
        format!(
            "<output_contract>\n\
             Reply with a single JSON document conforming to the provided schema.\n\
             Always include the trace: the routing decision with its rationale, the \
             evidence ids you consulted, and a verification status of verified, \
             unverified, or contradicted.\n\
             Request tool_calls only when the answer needs live data you do not have; \
             leave the answer absent in that case.\n\
             Never repeat in metadata elements any text already present in the answer \
             body; each fact lives in exactly one place.\n\
             {}\n\
             </output_contract>",
            Self::format_instructions(format)
        )
    }

    /// Format-specific answer instructions. Voice aliases to plain; the
    /// audio rendering happens outside this pipeline.
    fn format_instructions(format: TextFormat) -> &'static str {
        match format.instruction_alias() {
            TextFormat::Plain | TextFormat::Voice => {
                "Write the answer as plain text without any markup or formatting."
            }
            TextFormat::Markdown => {
                "Write the answer in Markdown; prefer short paragraphs and lists over tables."
            }
            TextFormat::Html => {
                "Write the answer as a minimal HTML fragment using only p, ul, li, b, and a tags."
            }
        }
    }

    fn tools_section(tools: &[ToolSpec]) -> String {
        let mut lines = Vec::with_capacity(tools.len() + 2);
        lines.push("<tools>".to_string());
        for tool in tools {
            // serde_json serializes maps with sorted keys, keeping the
            // schema text stable across calls.
            let schema =
                serde_json::to_string(&tool.input_schema).unwrap_or_else(|_| "{}".to_string());
            lines.push(format!(
                "<tool name=\"{}\">\n{}\nInput schema: {}\n</tool>",
                tool.name, tool.description, schema
            ));
        }
        lines.push("</tools>".to_string());
        lines.join("\n")
    }
}
