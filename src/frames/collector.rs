use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::detect::detector::FormDetector;
use crate::detect::field_model::DetectedFormSnapshot;
use crate::detect::website::{WebsiteContext, classify_website};
use crate::dom::document::DomDocument;
use crate::dom::dom_model::DomSnapshot;
use crate::frames::protocol::{
    CollectReply, CollectRequest, DetectResponse, FRAME_GATHER_TIMEOUT_MS, FrameInfo,
    MAX_FRAME_DEPTH, next_request_id,
};

/// A browsing-context frame the collector can ask to detect forms.
///
/// `detect` runs the frame's local detector and returns its reply, or
/// None for a frame that never answers (dead, detached, cross-origin).
pub trait FrameHost: Send + Sync {
    fn detect(&self, request: &CollectRequest) -> Option<CollectReply>;
}

/// Aggregated result of one cross-frame gather.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectResult {
    pub success: bool,
    pub forms: Vec<DetectedFormSnapshot>,
    pub total_fields: usize,
    pub website_context: Option<WebsiteContext>,
    pub frames_expected: usize,
    pub frames_responded: usize,
    pub error: Option<String>,
}

/// Fan-out/fan-in: broadcast a collect request to every frame, gather
/// replies matching the correlation id until all arrive or the deadline
/// passes, then merge whatever arrived.
///
/// The receiver exists before any frame is asked, so a fast frame cannot
/// answer into the void; the gather resolves exactly once (completion or
/// deadline) and the listener goes away with it on both paths.
pub fn collect_forms(frames: Vec<Arc<dyn FrameHost>>, timeout: Duration) -> CollectResult {
    let request_id = next_request_id();
    let request = CollectRequest {
        request_id: request_id.clone(),
    };

    let expected = frames.len();
    let (tx, rx) = mpsc::channel::<CollectReply>();

    for frame in frames {
        let tx = tx.clone();
        let request = request.clone();
        // Detached on purpose: a frame that blocks past the deadline must
        // not hold the gather open. Its late send lands in a closed
        // channel and is discarded.
        thread::spawn(move || {
            if let Some(reply) = frame.detect(&request) {
                let _ = tx.send(reply);
            }
        });
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    let mut replies: Vec<CollectReply> = Vec::new();

    while replies.len() < expected {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(reply) if reply.request_id == request_id => replies.push(reply),
            Ok(_) => continue, // stray reply from another gather
            Err(_) => break,   // timeout or all senders gone
        }
    }

    merge_replies(expected, replies)
}

/// Gather with the standard timeout.
pub fn collect_forms_default(frames: Vec<Arc<dyn FrameHost>>) -> CollectResult {
    collect_forms(frames, Duration::from_millis(FRAME_GATHER_TIMEOUT_MS))
}

fn merge_replies(expected: usize, replies: Vec<CollectReply>) -> CollectResult {
    let responded = replies.len();

    if expected > 0 && responded == 0 {
        return CollectResult {
            success: false,
            forms: Vec::new(),
            total_fields: 0,
            website_context: None,
            frames_expected: expected,
            frames_responded: 0,
            error: Some("no frame responded to the collect request".into()),
        };
    }

    let mut forms = Vec::new();
    let mut total_fields = 0;
    let mut main_context: Option<WebsiteContext> = None;
    let mut first_context: Option<WebsiteContext> = None;

    for reply in replies {
        let response = reply.response;
        if !response.success {
            continue;
        }

        total_fields += response.total_fields;
        forms.extend(response.forms);

        if let Some(ctx) = response.website_context {
            if response.frame_info.is_main_frame {
                main_context.get_or_insert(ctx);
            } else {
                first_context.get_or_insert(ctx);
            }
        }
    }

    CollectResult {
        success: true,
        forms,
        total_fields,
        website_context: main_context.or(first_context),
        frames_expected: expected,
        frames_responded: responded,
        error: None,
    }
}

// ============================================================================
// Snapshot-backed frames
// ============================================================================

/// A frame backed by a DOM snapshot: runs the real detector on demand.
pub struct SnapshotFrame {
    snapshot: DomSnapshot,
    info: FrameInfo,
    /// Summed origin of ancestor iframes, so rects come out in
    /// top-document page coordinates.
    offset_x: f32,
    offset_y: f32,
}

impl FrameHost for SnapshotFrame {
    fn detect(&self, request: &CollectRequest) -> Option<CollectReply> {
        let mut doc = DomDocument::from_snapshot(self.snapshot.clone());
        let mut detector = FormDetector::new();
        let result = detector.detect_all(&mut doc);

        let context = classify_website(doc.url(), doc.title(), &result.forms);
        let forms: Vec<DetectedFormSnapshot> = result
            .forms
            .iter()
            .map(|f| f.to_snapshot(self.offset_x, self.offset_y))
            .collect();

        Some(CollectReply {
            request_id: request.request_id.clone(),
            response: DetectResponse {
                success: true,
                total_fields: result.total_fields,
                forms,
                website_context: Some(context),
                frame_info: self.info.clone(),
                error: None,
            },
        })
    }
}

/// Split a root snapshot into one `SnapshotFrame` per browsing context,
/// walking nested frame snapshots breadth-first. Depth is computed by
/// walking the parent chain, capped so a malformed chain cannot loop.
pub fn frames_from_snapshot(root: DomSnapshot) -> Vec<Arc<dyn FrameHost>> {
    let mut out: Vec<Arc<dyn FrameHost>> = Vec::new();

    // (snapshot, parent url, depth, accumulated offset)
    let mut queue: Vec<(DomSnapshot, Option<String>, usize, f32, f32)> =
        vec![(root, None, 0, 0.0, 0.0)];

    while let Some((snapshot, parent_url, depth, off_x, off_y)) = queue.pop() {
        if depth >= MAX_FRAME_DEPTH {
            continue;
        }

        let url = snapshot.url.clone();
        let doc = DomDocument::from_snapshot(snapshot.clone());

        for child in doc.child_frames() {
            queue.push((
                child.snapshot.clone(),
                url.clone(),
                depth + 1,
                off_x + child.rect.x,
                off_y + child.rect.y,
            ));
        }

        out.push(Arc::new(SnapshotFrame {
            snapshot,
            info: FrameInfo {
                is_main_frame: depth == 0,
                url,
                parent_url,
                depth,
            },
            offset_x: off_x,
            offset_y: off_y,
        }));
    }

    out
}
