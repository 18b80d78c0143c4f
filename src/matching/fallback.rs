use crate::detect::field_model::{FieldPurpose, FieldType};
use crate::matching::compress::{CompressedFieldData, CompressedMemoryData};
use crate::matching::mapping_model::FieldMapping;
use crate::matching::similarity::combined_similarity;
use crate::memory::memory_model::MemoryCategory;

/// Fixed confidence for a purpose-plus-text match. Above the matcher
/// floor so the mapping carries a value, below the default UI threshold
/// so fallback output lands in preview rather than auto-fill.
pub const FALLBACK_MATCH_CONFIDENCE: f32 = 0.6;

/// Minimum label/question similarity for a match when the field's
/// purpose is unknown and text is the only signal.
const TEXT_ONLY_THRESHOLD: f32 = 0.5;

/// Deterministic label/type matcher used when no model is configured or
/// the model call fails. Never fails; always returns exactly one mapping
/// per input field, in input order.
pub struct FallbackMatcher;

impl FallbackMatcher {
    pub fn match_fields(
        fields: &[CompressedFieldData],
        memories: &[CompressedMemoryData],
    ) -> Vec<FieldMapping> {
        fields
            .iter()
            .map(|field| Self::match_one(field, memories))
            .collect()
    }

    fn match_one(field: &CompressedFieldData, memories: &[CompressedMemoryData]) -> FieldMapping {
        let field_purpose = effective_purpose(field);

        let mut best: Option<(&CompressedMemoryData, f32)> = None;
        let mut best_aligned = false;

        for memory in memories {
            let aligned = field_purpose != FieldPurpose::Unknown
                && (memory_purpose(memory) == field_purpose
                    || category_aligns(memory.category, field_purpose));
            let sim = text_similarity(field, memory);

            // Purpose-aligned candidates always outrank text-only ones.
            let candidate = if aligned {
                Some((memory, sim))
            } else if field_purpose == FieldPurpose::Unknown && sim >= TEXT_ONLY_THRESHOLD {
                Some((memory, sim))
            } else {
                None
            };

            if let Some((memory, sim)) = candidate {
                let better = match best {
                    None => true,
                    Some((_, best_sim)) => {
                        (aligned && !best_aligned) || (aligned == best_aligned && sim > best_sim)
                    }
                };
                if better {
                    best = Some((memory, sim));
                    best_aligned = aligned;
                }
            }
        }

        match best {
            Some((memory, sim)) => FieldMapping {
                field_opid: field.opid.clone(),
                memory_id: Some(memory.id.clone()),
                value: Some(memory.answer.clone()),
                rephrased_value: None,
                is_rephrased: false,
                confidence: FALLBACK_MATCH_CONFIDENCE,
                reasoning: format!(
                    "label/type match: purpose {:?}, text similarity {:.2}",
                    field_purpose, sim
                ),
                alternative_matches: Vec::new(),
                auto_fill: false,
            },
            None => FieldMapping::no_match(&field.opid, "no matching memory found"),
        }
    }
}

/// Field purpose, falling back to what the structural type implies.
fn effective_purpose(field: &CompressedFieldData) -> FieldPurpose {
    if field.purpose != FieldPurpose::Unknown {
        return field.purpose;
    }
    match field.field_type {
        FieldType::Email => FieldPurpose::Email,
        FieldType::Tel => FieldPurpose::Phone,
        _ => FieldPurpose::Unknown,
    }
}

/// Purpose a memory answers, inferred from its question text.
fn memory_purpose(memory: &CompressedMemoryData) -> FieldPurpose {
    crate::detect::labels::purpose_from_text(&memory.question)
}

fn category_aligns(category: MemoryCategory, purpose: FieldPurpose) -> bool {
    match category {
        MemoryCategory::Contact => {
            matches!(purpose, FieldPurpose::Email | FieldPurpose::Phone)
        }
        MemoryCategory::Address => matches!(
            purpose,
            FieldPurpose::Address
                | FieldPurpose::City
                | FieldPurpose::State
                | FieldPurpose::Zip
                | FieldPurpose::Country
        ),
        MemoryCategory::Personal => matches!(purpose, FieldPurpose::Name),
        MemoryCategory::Professional => {
            matches!(purpose, FieldPurpose::Company | FieldPurpose::Title)
        }
        _ => false,
    }
}

/// Strongest similarity between any field label (or its context) and the
/// memory's question.
fn text_similarity(field: &CompressedFieldData, memory: &CompressedMemoryData) -> f32 {
    if memory.question.is_empty() {
        return 0.0;
    }

    let mut best: f32 = 0.0;
    for label in &field.labels {
        best = best.max(combined_similarity(label, &memory.question));
    }
    if !field.context.is_empty() {
        best = best.max(combined_similarity(&field.context, &memory.question));
    }
    best
}
