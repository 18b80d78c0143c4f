use serde::Serialize;

use crate::detect::field_model::{DetectedForm, FieldPurpose, FieldType};
use crate::dom::document::DomDocument;
use crate::memory::dedup::{CapturedField, MergeAction, plan_capture_merge};
use crate::memory::memory_model::{MemoryCategory, MemoryEntry, MemorySource};
use crate::memory::store::MemoryStore;

/// Outcome of persisting one capture batch. `saved_count` counts created
/// and updated memories combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub success: bool,
    pub saved_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read the current values of a submitted form into capture records.
/// Password fields and empty values never produce a capture.
pub fn capture_form_values(doc: &DomDocument, form: &DetectedForm) -> Vec<CapturedField> {
    form.fields
        .iter()
        .filter(|field| field.metadata.field_type != FieldType::Password)
        .filter_map(|field| {
            let answer = doc
                .value(field.node)
                .or(field.metadata.value.as_deref())
                .map(str::trim)
                .filter(|v| !v.is_empty())?;

            let question = field
                .metadata
                .primary_label()
                .or(field.metadata.placeholder.as_deref())
                .or(field.metadata.name.as_deref())
                .unwrap_or_default()
                .to_string();

            Some(CapturedField {
                question,
                answer: answer.to_string(),
                field_name: field
                    .metadata
                    .name
                    .clone()
                    .or_else(|| field.metadata.html_id.clone()),
                purpose: field.metadata.field_purpose,
            })
        })
        .collect()
}

/// Merge captured fields into the store and persist. A storage failure
/// reports `success: false` with zero saved; no partial-write guarantee
/// is claimed.
pub fn save_captured_memories(store: &mut MemoryStore, captured: &[CapturedField]) -> SaveResult {
    let plan = plan_capture_merge(captured, store.entries());
    let mut saved = 0usize;

    for action in plan {
        match action {
            MergeAction::Create { question, answer, purpose } => {
                let question = if question.is_empty() { None } else { Some(question) };
                let entry = MemoryEntry::new(
                    question,
                    answer,
                    category_for_purpose(purpose),
                    MemorySource::Autofill,
                )
                .with_purpose(purpose);
                store.insert(entry);
                saved += 1;
            }
            MergeAction::Update { memory_id, answer } => {
                // The id came from the store we are holding; a miss here
                // is a real bug and surfaces as a failed save.
                if let Err(e) = store.update_answer(&memory_id, &answer, 1.0) {
                    return SaveResult {
                        success: false,
                        saved_count: 0,
                        error: Some(e.to_string()),
                    };
                }
                saved += 1;
            }
            MergeAction::Skip { .. } => {}
        }
    }

    if let Err(e) = store.save() {
        return SaveResult {
            success: false,
            saved_count: 0,
            error: Some(e.to_string()),
        };
    }

    SaveResult {
        success: true,
        saved_count: saved,
        error: None,
    }
}

fn category_for_purpose(purpose: FieldPurpose) -> MemoryCategory {
    match purpose {
        FieldPurpose::Email | FieldPurpose::Phone => MemoryCategory::Contact,
        FieldPurpose::Address
        | FieldPurpose::City
        | FieldPurpose::State
        | FieldPurpose::Zip
        | FieldPurpose::Country => MemoryCategory::Address,
        FieldPurpose::Name => MemoryCategory::Personal,
        FieldPurpose::Company | FieldPurpose::Title => MemoryCategory::Professional,
        FieldPurpose::Unknown => MemoryCategory::Other,
    }
}
