use std::sync::Arc;
use std::thread;
use std::time::Duration;

use form_autofill::frames::collector::{FrameHost, collect_forms, frames_from_snapshot};
use form_autofill::frames::protocol::{
    CollectReply, CollectRequest, DetectResponse, FrameInfo, next_request_id,
};

use crate::common::fixtures::{el, form, input, snapshot, with_attr, with_children, with_rect};

mod common;

// =========================================================================
// Test frame hosts
// =========================================================================

/// Answers after an optional delay with a canned field count.
struct StubFrame {
    delay: Option<Duration>,
    fields: usize,
    is_main: bool,
}

impl FrameHost for StubFrame {
    fn detect(&self, request: &CollectRequest) -> Option<CollectReply> {
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        Some(CollectReply {
            request_id: request.request_id.clone(),
            response: DetectResponse {
                success: true,
                forms: Vec::new(),
                total_fields: self.fields,
                website_context: None,
                frame_info: FrameInfo {
                    is_main_frame: self.is_main,
                    url: Some("https://example.com".into()),
                    parent_url: None,
                    depth: if self.is_main { 0 } else { 1 },
                },
                error: None,
            },
        })
    }
}

/// A frame that never answers at all.
struct DeadFrame;

impl FrameHost for DeadFrame {
    fn detect(&self, _request: &CollectRequest) -> Option<CollectReply> {
        None
    }
}

// =========================================================================
// Gather semantics
// =========================================================================

#[test]
fn gather_merges_all_responsive_frames() {
    let frames: Vec<Arc<dyn FrameHost>> = vec![
        Arc::new(StubFrame { delay: None, fields: 3, is_main: true }),
        Arc::new(StubFrame { delay: None, fields: 2, is_main: false }),
    ];

    let result = collect_forms(frames, Duration::from_millis(500));

    assert!(result.success);
    assert_eq!(result.frames_expected, 2);
    assert_eq!(result.frames_responded, 2);
    assert_eq!(result.total_fields, 5, "Field counts sum across frames");
}

#[test]
fn slow_frame_times_out_without_failing_the_gather() {
    // One frame never responds within the timeout; the
    // gather still succeeds with the other frames' fields.
    let frames: Vec<Arc<dyn FrameHost>> = vec![
        Arc::new(StubFrame { delay: None, fields: 4, is_main: true }),
        Arc::new(StubFrame {
            delay: Some(Duration::from_secs(5)),
            fields: 9,
            is_main: false,
        }),
    ];

    let result = collect_forms(frames, Duration::from_millis(150));

    assert!(result.success, "Timeout is best-effort, not an error");
    assert_eq!(result.frames_responded, 1);
    assert_eq!(
        result.total_fields, 4,
        "totalFields sums only over frames that responded"
    );
    assert!(result.error.is_none());
}

#[test]
fn dead_frames_simply_contribute_nothing() {
    let frames: Vec<Arc<dyn FrameHost>> = vec![
        Arc::new(DeadFrame),
        Arc::new(StubFrame { delay: None, fields: 1, is_main: true }),
    ];

    let result = collect_forms(frames, Duration::from_millis(300));

    assert!(result.success);
    assert_eq!(result.frames_responded, 1);
    assert_eq!(result.total_fields, 1);
}

#[test]
fn zero_responses_is_a_whole_operation_failure() {
    let frames: Vec<Arc<dyn FrameHost>> = vec![Arc::new(DeadFrame), Arc::new(DeadFrame)];

    let result = collect_forms(frames, Duration::from_millis(100));

    assert!(!result.success, "No frame at all responding is the one fatal case");
    assert!(result.error.is_some());
    assert_eq!(result.total_fields, 0);
}

#[test]
fn request_ids_are_unique_per_gather() {
    let a = next_request_id();
    let b = next_request_id();
    assert_ne!(a, b, "Correlation ids never repeat within a process");
}

// =========================================================================
// Snapshot frame splitting
// =========================================================================

fn nested_page() -> form_autofill::dom::dom_model::DomSnapshot {
    // Main document with a login form plus an iframe at (100, 200)
    // hosting its own newsletter form.
    let child = snapshot(
        "https://widget.example.com",
        "Newsletter",
        vec![form(
            "newsletter",
            vec![with_rect(
                with_attr(input("email", "email"), "aria-label", "Email"),
                10.0,
                20.0,
                200.0,
                30.0,
            )],
        )],
    );

    let mut iframe = with_rect(el("iframe"), 100.0, 200.0, 400.0, 300.0);
    iframe.frame_snapshot = Some(Box::new(child));

    snapshot(
        "https://example.com",
        "Home",
        vec![
            form(
                "login",
                vec![with_attr(input("email", "user"), "aria-label", "Username")],
            ),
            with_children(el("div"), vec![iframe]),
        ],
    )
}

#[test]
fn frames_split_with_depth_and_parent_url() {
    let frames = frames_from_snapshot(nested_page());
    assert_eq!(frames.len(), 2, "Main frame plus one child frame");

    let request = CollectRequest {
        request_id: next_request_id(),
    };

    let replies: Vec<_> = frames
        .iter()
        .map(|f| f.detect(&request).expect("snapshot frames always answer"))
        .collect();

    let main = replies
        .iter()
        .find(|r| r.response.frame_info.is_main_frame)
        .unwrap();
    let child = replies
        .iter()
        .find(|r| !r.response.frame_info.is_main_frame)
        .unwrap();

    assert_eq!(main.response.frame_info.depth, 0);
    assert_eq!(child.response.frame_info.depth, 1);
    assert_eq!(
        child.response.frame_info.parent_url.as_deref(),
        Some("https://example.com")
    );
}

#[test]
fn child_frame_rects_are_offset_into_page_coordinates() {
    let frames = frames_from_snapshot(nested_page());
    let result = collect_forms(frames, Duration::from_millis(500));
    assert!(result.success);

    let newsletter = result
        .forms
        .iter()
        .find(|f| f.name.as_deref() == Some("newsletter"))
        .expect("child frame form collected");
    let rect = &newsletter.fields[0].rect;

    assert_eq!(rect.x, 110.0, "iframe origin added to the field's x");
    assert_eq!(rect.y, 220.0, "iframe origin added to the field's y");
    assert_eq!(rect.right, 310.0);
    assert_eq!(rect.bottom, 250.0);
}
