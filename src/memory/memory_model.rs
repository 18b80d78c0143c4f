use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::detect::field_model::FieldPurpose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryCategory {
    Personal,
    Contact,
    Address,
    Professional,
    Education,
    Preferences,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorySource {
    Manual,
    Import,
    Autofill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetadata {
    pub created_at: u64,
    pub updated_at: u64,
    pub source: MemorySource,
    pub usage_count: u32,
    /// Purpose hint recorded at capture time, when known.
    pub field_purpose: Option<FieldPurpose>,
}

/// One stored personal-data record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub id: String,
    pub question: Option<String>,
    pub answer: String,
    pub category: MemoryCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub confidence: f32,
    pub metadata: MemoryMetadata,
}

impl MemoryEntry {
    pub fn new(
        question: Option<String>,
        answer: String,
        category: MemoryCategory,
        source: MemorySource,
    ) -> Self {
        let now = now_epoch_secs();
        Self {
            id: memory_id(question.as_deref().unwrap_or(""), &answer),
            question,
            answer,
            category,
            tags: Vec::new(),
            confidence: 1.0,
            metadata: MemoryMetadata {
                created_at: now,
                updated_at: now,
                source,
                usage_count: 0,
                field_purpose: None,
            },
        }
    }

    pub fn with_purpose(mut self, purpose: FieldPurpose) -> Self {
        if purpose != FieldPurpose::Unknown {
            self.metadata.field_purpose = Some(purpose);
        }
        self
    }
}

pub fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

static MEMORY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stable-format id: fingerprint of the content plus a process-unique
/// counter, so two identical captures in one run still get distinct ids.
fn memory_id(question: &str, answer: &str) -> String {
    use sha1::{Digest, Sha1};

    let counter = MEMORY_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha1::new();
    hasher.update(question.as_bytes());
    hasher.update(answer.as_bytes());
    hasher.update(counter.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("mem-{}", &digest[..12])
}
