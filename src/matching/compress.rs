use serde::{Deserialize, Serialize};

use crate::detect::field_model::{DetectedFieldSnapshot, FieldPurpose, FieldType};
use crate::detect::labels::is_cryptic;
use crate::memory::memory_model::{MemoryCategory, MemoryEntry};

/// Bound on fields handed to one matching prompt. Truncation is
/// oldest-first array slicing, not relevance ranking.
pub const MAX_FIELDS_PER_PAGE: usize = 50;

/// Bound on memories considered per prompt; same slicing caveat.
pub const MAX_MEMORIES_PER_PROMPT: usize = 100;

/// Token-efficient projection of a field for the matching prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedFieldData {
    pub opid: String,
    pub field_type: FieldType,
    pub purpose: FieldPurpose,
    /// Deduplicated label candidates, source-priority order.
    pub labels: Vec<String>,
    /// Placeholder + helper text + non-cryptic name/id, merged.
    pub context: String,
}

/// Token-efficient projection of a memory for the matching prompt.
/// The answer is carried whole here; display-length truncation happens
/// only at the prompt-formatting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedMemoryData {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: MemoryCategory,
}

pub fn compress_field(field: &DetectedFieldSnapshot) -> CompressedFieldData {
    let meta = &field.metadata;

    let mut labels: Vec<String> = Vec::new();
    for candidate in meta.label_candidates() {
        let trimmed = candidate.trim().to_string();
        if !labels.iter().any(|l| l.eq_ignore_ascii_case(&trimmed)) {
            labels.push(trimmed);
        }
    }

    let mut context_parts: Vec<String> = Vec::new();
    if let Some(p) = meta.placeholder.as_deref() {
        if !p.trim().is_empty() {
            context_parts.push(p.trim().to_string());
        }
    }
    if let Some(h) = meta.helper_text.as_deref() {
        if !h.trim().is_empty() {
            context_parts.push(h.trim().to_string());
        }
    }
    for ident in [meta.name.as_deref(), meta.html_id.as_deref()] {
        if let Some(ident) = ident {
            let ident = ident.trim();
            if !ident.is_empty() && !is_cryptic(ident) {
                context_parts.push(ident.to_string());
            }
        }
    }

    CompressedFieldData {
        opid: field.opid.clone(),
        field_type: meta.field_type,
        purpose: meta.field_purpose,
        labels,
        context: context_parts.join("; "),
    }
}

pub fn compress_fields(fields: &[DetectedFieldSnapshot]) -> Vec<CompressedFieldData> {
    fields
        .iter()
        .take(MAX_FIELDS_PER_PAGE)
        .map(compress_field)
        .collect()
}

pub fn compress_memory(memory: &MemoryEntry) -> CompressedMemoryData {
    CompressedMemoryData {
        id: memory.id.clone(),
        question: memory.question.clone().unwrap_or_default(),
        answer: memory.answer.clone(),
        category: memory.category,
    }
}

pub fn compress_memories(memories: &[MemoryEntry]) -> Vec<CompressedMemoryData> {
    memories
        .iter()
        .take(MAX_MEMORIES_PER_PROMPT)
        .map(compress_memory)
        .collect()
}
