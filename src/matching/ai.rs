use serde::{Deserialize, Serialize};

use crate::detect::website::WebsiteContext;
use crate::error::AutofillError;
use crate::matching::compress::{CompressedFieldData, CompressedMemoryData};
use crate::matching::fallback::FallbackMatcher;
use crate::matching::mapping_model::{
    ALTERNATIVE_PENALTY, AlternativeMatch, FieldMapping, MAX_ALTERNATIVES, MIN_MATCH_CONFIDENCE,
    round_confidence,
};

/// Memory answers are shortened to this many characters in the prompt
/// text only; the compressed structs keep the full answer.
const PROMPT_ANSWER_MAX_LEN: usize = 120;

// ============================================================================
// Model backends
// ============================================================================

/// A text-completion backend the matcher can call. One prompt in, one
/// raw (JSON-constrained) completion out.
pub trait MatchBackend {
    fn provider(&self) -> &str;
    fn complete(&self, prompt: &str) -> Result<String, AutofillError>;
}

pub struct OllamaBackend {
    pub endpoint: String,
    pub model: String,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "qwen2.5:1.5b".to_string(),
        }
    }
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl MatchBackend for OllamaBackend {
    fn provider(&self) -> &str {
        "ollama"
    }

    fn complete(&self, prompt: &str) -> Result<String, AutofillError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json",
        };

        let client = reqwest::blocking::Client::new();
        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| AutofillError::Backend {
                provider: "ollama".into(),
                error: e.to_string(),
            })?;

        let body: OllamaResponse = response.json().map_err(|e| AutofillError::Backend {
            provider: "ollama".into(),
            error: format!("bad response body: {}", e),
        })?;

        Ok(body.response)
    }
}

/// Canned-response backend for tests and offline runs.
pub struct MockBackend {
    pub response: String,
}

impl MatchBackend for MockBackend {
    fn provider(&self) -> &str {
        "mock"
    }

    fn complete(&self, _prompt: &str) -> Result<String, AutofillError> {
        Ok(self.response.clone())
    }
}

/// Backend that always fails; exercises the fallback path.
pub struct FailingBackend;

impl MatchBackend for FailingBackend {
    fn provider(&self) -> &str {
        "failing"
    }

    fn complete(&self, _prompt: &str) -> Result<String, AutofillError> {
        Err(AutofillError::Backend {
            provider: "failing".into(),
            error: "backend unavailable".into(),
        })
    }
}

// ============================================================================
// Response schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct ModelMatchList {
    #[serde(default)]
    matches: Vec<ModelFieldMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelFieldMatch {
    field_opid: String,
    #[serde(default)]
    memory_id: Option<String>,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    alternative_memory_ids: Vec<String>,
    #[serde(default)]
    rephrased_answer: Option<String>,
}

// ============================================================================
// AI matcher
// ============================================================================

/// Model-backed field/memory matcher.
///
/// All-or-nothing per request: any backend or schema failure downgrades
/// the entire batch to the fallback matcher; there is no partial
/// per-field failure.
pub struct AiMatcher {
    backend: Box<dyn MatchBackend>,
}

impl AiMatcher {
    pub fn new(backend: Box<dyn MatchBackend>) -> Self {
        Self { backend }
    }

    pub fn with_ollama(endpoint: &str, model: &str) -> Self {
        Self::new(Box::new(OllamaBackend::new(endpoint, model)))
    }

    pub fn with_mock_response(response: &str) -> Self {
        Self::new(Box::new(MockBackend {
            response: response.to_string(),
        }))
    }

    pub fn provider(&self) -> &str {
        self.backend.provider()
    }

    /// Match every field against the memory set. Password fields must
    /// already have been excluded upstream; the prompt forbids them again
    /// as a second line of defense only.
    pub fn match_fields(
        &self,
        fields: &[CompressedFieldData],
        memories: &[CompressedMemoryData],
        context: Option<&WebsiteContext>,
    ) -> Vec<FieldMapping> {
        if fields.is_empty() {
            return Vec::new();
        }

        let prompt = build_match_prompt(fields, memories, context);

        let parsed = self
            .backend
            .complete(&prompt)
            .and_then(|raw| parse_match_response(&raw));

        match parsed {
            Ok(list) => postprocess(fields, memories, list),
            Err(_) => FallbackMatcher::match_fields(fields, memories),
        }
    }
}

fn parse_match_response(raw: &str) -> Result<ModelMatchList, AutofillError> {
    serde_json::from_str(raw).map_err(|e| AutofillError::JsonParse {
        context: "model match response".into(),
        source: e,
    })
}

/// Convert the model's answer into field mappings, defending against
/// hallucinated ids and out-of-range confidences.
fn postprocess(
    fields: &[CompressedFieldData],
    memories: &[CompressedMemoryData],
    list: ModelMatchList,
) -> Vec<FieldMapping> {
    let requested = |opid: &str| fields.iter().any(|f| f.opid == opid);

    let mut out: Vec<FieldMapping> = Vec::new();

    // One mapping per requested field, in request order.
    for field in fields {
        let decision = list.matches.iter().find(|m| m.field_opid == field.opid);
        let Some(decision) = decision else {
            out.push(FieldMapping::no_match(
                &field.opid,
                "model returned no decision for this field",
            ));
            continue;
        };

        out.push(mapping_from_decision(decision, memories));
    }

    // A response opid the matcher never sent becomes an explicit no-match
    // instead of propagating a hallucinated id.
    for decision in &list.matches {
        if !requested(&decision.field_opid) {
            out.push(FieldMapping::no_match(
                &decision.field_opid,
                "field not found in request",
            ));
        }
    }

    out
}

fn mapping_from_decision(
    decision: &ModelFieldMatch,
    memories: &[CompressedMemoryData],
) -> FieldMapping {
    let memory_by_id = |id: &str| memories.iter().find(|m| m.id == id);
    let confidence = round_confidence(decision.confidence);

    let resolved = decision
        .memory_id
        .as_deref()
        .filter(|_| confidence >= MIN_MATCH_CONFIDENCE)
        .and_then(memory_by_id);

    let (memory_id, value) = match resolved {
        Some(memory) => (Some(memory.id.clone()), Some(memory.answer.clone())),
        None => (None, None),
    };

    let rephrased_value = decision
        .rephrased_answer
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty() && value.is_some())
        .map(str::to_string);
    let is_rephrased = rephrased_value.is_some();

    let alternative_matches = if memory_id.is_some() {
        decision
            .alternative_memory_ids
            .iter()
            .filter(|id| Some(id.as_str()) != memory_id.as_deref())
            .filter_map(|id| memory_by_id(id.as_str()))
            .take(MAX_ALTERNATIVES)
            .map(|memory| AlternativeMatch {
                memory_id: memory.id.clone(),
                value: memory.answer.clone(),
                confidence: round_confidence((confidence - ALTERNATIVE_PENALTY).max(0.0)),
            })
            .collect()
    } else {
        Vec::new()
    };

    let reasoning = if decision.reasoning.trim().is_empty() {
        "no reasoning provided".to_string()
    } else {
        decision.reasoning.clone()
    };

    FieldMapping {
        field_opid: decision.field_opid.clone(),
        memory_id,
        value,
        rephrased_value,
        is_rephrased,
        confidence,
        reasoning,
        alternative_matches,
        auto_fill: false,
    }
}

// ============================================================================
// Prompt building
// ============================================================================

fn build_match_prompt(
    fields: &[CompressedFieldData],
    memories: &[CompressedMemoryData],
    context: Option<&WebsiteContext>,
) -> String {
    let fields_summary = fields
        .iter()
        .map(|f| {
            format!(
                "  - opid={} type={:?} purpose={:?} labels=[{}] context=\"{}\"",
                f.opid,
                f.field_type,
                f.purpose,
                f.labels.join(", "),
                f.context
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let memories_summary = memories
        .iter()
        .map(|m| {
            format!(
                "  - id={} category={:?} question=\"{}\" answer=\"{}\"",
                m.id,
                m.category,
                m.question,
                truncate_for_prompt(&m.answer)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let context_summary = match context {
        Some(ctx) => format!(
            "site_type={:?} form_intent={:?} title=\"{}\"",
            ctx.site_type, ctx.form_intent, ctx.page_title
        ),
        None => "(unknown)".to_string(),
    };

    format!(
        r#"You match form fields to a user's stored memories for autofill.

WEBSITE CONTEXT (dominant signal for ambiguous fields): {context}

FIELDS:
{fields}

MEMORIES:
{memories}

RULES:
- Match on semantic similarity between field labels/context and memory questions.
- The memory answer must be type-compatible with the field type.
- Use the website context to resolve ambiguity (a "title" field on a job portal is a job title, not a salutation).
- Never match password fields; they are not present above and must not appear in your answer.
- confidence is 0..1; use below {floor} when unsure, and null memoryId when there is no plausible match.
- rephrasedAnswer: only when the stored answer needs reshaping to fit the field (full name into a first-name field); otherwise null.
- At most {max_alts} alternativeMemoryIds, each plausible but weaker than the primary.

Return ONLY valid JSON matching this exact schema:
{{
  "matches": [
    {{
      "fieldOpid": "opid from FIELDS",
      "memoryId": "id from MEMORIES or null",
      "confidence": 0.0,
      "reasoning": "one short sentence",
      "alternativeMemoryIds": [],
      "rephrasedAnswer": null
    }}
  ]
}}

Respond with ONLY valid JSON, no explanation."#,
        context = context_summary,
        fields = if fields_summary.is_empty() {
            "  (none)".to_string()
        } else {
            fields_summary
        },
        memories = if memories_summary.is_empty() {
            "  (none)".to_string()
        } else {
            memories_summary
        },
        floor = MIN_MATCH_CONFIDENCE,
        max_alts = MAX_ALTERNATIVES,
    )
}

fn truncate_for_prompt(answer: &str) -> String {
    if answer.chars().count() <= PROMPT_ANSWER_MAX_LEN {
        return answer.to_string();
    }
    let truncated: String = answer.chars().take(PROMPT_ANSWER_MAX_LEN).collect();
    format!("{}…", truncated)
}
