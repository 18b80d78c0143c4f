use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::detect::quality::FilterStats;

/// One structured line in the pipeline trace. Built with the `with_*`
/// setters; only populated fields are serialized.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,

    /// Pipeline stage: detect, collect, match, fill, capture, progress.
    pub stage: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forms: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_stats: Option<FilterStats>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub opid: Option<String>,
}

impl TraceEvent {
    pub fn stage(stage: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            stage: stage.to_string(),
            detail: None,
            forms: None,
            fields: None,
            filter_stats: None,
            confidence: None,
            opid: None,
        }
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_counts(mut self, forms: usize, fields: usize) -> Self {
        self.forms = Some(forms);
        self.fields = Some(fields);
        self
    }

    pub fn with_filter_stats(mut self, stats: &FilterStats) -> Self {
        self.filter_stats = Some(stats.clone());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_opid(mut self, opid: impl ToString) -> Self {
        self.opid = Some(opid.to_string());
        self
    }
}
