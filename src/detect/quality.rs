use serde::Serialize;

use crate::detect::field_model::{DetectedFieldSnapshot, FieldMetadata, FieldPurpose};
use crate::detect::labels::is_cryptic;

/// Fields scoring below this are dropped before matching.
pub const QUALITY_THRESHOLD: f32 = 0.3;

/// Aggregate counts emitted by one filter pass, for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub total: usize,
    pub kept: usize,
    pub no_quality: usize,
    pub unknown_unlabeled: usize,
    pub duplicate_label: usize,
}

/// Usability score in [0, 1] from label presence, contextual text, and
/// purpose specificity.
pub fn score(metadata: &FieldMetadata) -> f32 {
    let mut score: f32 = 0.0;

    if metadata.has_any_label() {
        score += 0.4;
    }
    if has_valid_context(metadata) {
        score += 0.3;
    }
    if metadata.field_purpose != FieldPurpose::Unknown {
        score += 0.3;
    }

    score.clamp(0.0, 1.0)
}

/// Whether the field carries any usable free-text context: placeholder,
/// helper text, or a non-cryptic name/id.
pub fn has_valid_context(metadata: &FieldMetadata) -> bool {
    let usable = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .is_some_and(|t| !t.is_empty() && !is_cryptic(t))
    };

    metadata
        .placeholder
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty())
        || metadata
            .helper_text
            .as_deref()
            .is_some_and(|h| !h.trim().is_empty())
        || usable(&metadata.name)
        || usable(&metadata.html_id)
}

/// Drop unusable fields before matching.
///
/// Two distinct rejection paths: fields with unknown purpose and neither
/// label nor context are dropped unconditionally; everything else is
/// held to the numeric threshold. Within one pass, a later field whose
/// primary label repeats an earlier one (case-insensitive, trimmed) is
/// dropped as a duplicate.
pub fn filter_fields(fields: Vec<DetectedFieldSnapshot>) -> (Vec<DetectedFieldSnapshot>, FilterStats) {
    let mut stats = FilterStats {
        total: fields.len(),
        ..FilterStats::default()
    };

    let mut seen_labels: Vec<String> = Vec::new();
    let mut kept = Vec::new();

    for field in fields {
        let meta = &field.metadata;

        if meta.field_purpose == FieldPurpose::Unknown
            && !meta.has_any_label()
            && !has_valid_context(meta)
        {
            stats.unknown_unlabeled += 1;
            continue;
        }

        if score(meta) < QUALITY_THRESHOLD {
            stats.no_quality += 1;
            continue;
        }

        if let Some(label) = meta.primary_label() {
            let key = label.trim().to_lowercase();
            if seen_labels.contains(&key) {
                stats.duplicate_label += 1;
                continue;
            }
            seen_labels.push(key);
        }

        kept.push(field);
    }

    stats.kept = kept.len();
    (kept, stats)
}
