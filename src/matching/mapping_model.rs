use serde::{Deserialize, Serialize};

/// Matcher-internal floor: a mapping carries a resolved value/memory only
/// when its rounded confidence reaches this. Independent of the
/// user-configured UI threshold applied downstream.
pub const MIN_MATCH_CONFIDENCE: f32 = 0.5;

/// Flat confidence penalty for alternative matches, floored at zero.
pub const ALTERNATIVE_PENALTY: f32 = 0.1;

pub const MAX_ALTERNATIVES: usize = 3;

/// A lower-ranked candidate the user can pick instead of the primary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeMatch {
    pub memory_id: String,
    pub value: String,
    pub confidence: f32,
}

/// The match result for one field.
///
/// `value` holds the original memory answer; when `is_rephrased` is set,
/// `rephrased_value` is what gets written into the page and `value` stays
/// around for preview/audit display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub field_opid: String,
    pub memory_id: Option<String>,
    pub value: Option<String>,
    pub rephrased_value: Option<String>,
    pub is_rephrased: bool,
    pub confidence: f32,
    pub reasoning: String,
    pub alternative_matches: Vec<AlternativeMatch>,
    /// Set downstream by thresholding against the user-configured
    /// confidence value, never by the matcher itself.
    pub auto_fill: bool,
}

impl FieldMapping {
    pub fn no_match(field_opid: &str, reasoning: &str) -> Self {
        Self {
            field_opid: field_opid.to_string(),
            memory_id: None,
            value: None,
            rephrased_value: None,
            is_rephrased: false,
            confidence: 0.0,
            reasoning: reasoning.to_string(),
            alternative_matches: Vec::new(),
            auto_fill: false,
        }
    }

    /// The text that should actually be written into the page.
    pub fn fill_value(&self) -> Option<&str> {
        if self.is_rephrased {
            self.rephrased_value.as_deref()
        } else {
            self.value.as_deref()
        }
    }
}

/// Clamp to [0, 1] and round to 2 decimals.
pub fn round_confidence(confidence: f32) -> f32 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// Downstream UI gate: mark mappings auto-fillable when they carry a
/// value and clear the user's configured threshold.
pub fn apply_confidence_threshold(mappings: &mut [FieldMapping], threshold: f32) {
    for mapping in mappings {
        mapping.auto_fill = mapping.value.is_some() && mapping.confidence >= threshold;
    }
}
