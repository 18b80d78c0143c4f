use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::detect::field_model::DetectedFormSnapshot;
use crate::detect::website::WebsiteContext;

/// How long the collector waits for frame responses. Best-effort gather:
/// hitting the deadline is not an error.
pub const FRAME_GATHER_TIMEOUT_MS: u64 = 2000;

/// Parent-walk cap when computing nesting depth, so a cross-origin access
/// error cannot turn into an unbounded walk.
pub const MAX_FRAME_DEPTH: usize = 10;

/// Identity of the responding frame, reported alongside its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameInfo {
    pub is_main_frame: bool,
    pub url: Option<String>,
    pub parent_url: Option<String>,
    pub depth: usize,
}

/// One frame's detection payload, the shape that crosses the frame
/// boundary: snapshots only, no element handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectResponse {
    pub success: bool,
    pub forms: Vec<DetectedFormSnapshot>,
    pub total_fields: usize,
    pub website_context: Option<WebsiteContext>,
    pub frame_info: FrameInfo,
    #[serde(default)]
    pub error: Option<String>,
}

/// Broadcast asking every frame to run its local detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectRequest {
    pub request_id: String,
}

/// A frame's answer, correlated solely by request id and never by frame
/// identity, so concurrent gathers in other tabs cannot cross-contaminate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectReply {
    pub request_id: String,
    pub response: DetectResponse,
}

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-unique correlation id for one gather.
pub fn next_request_id() -> String {
    use sha1::{Digest, Sha1};

    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let mut hasher = Sha1::new();
    hasher.update(counter.to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("req-{}", &digest[..12])
}
