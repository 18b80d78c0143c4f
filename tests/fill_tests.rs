use std::time::{Duration, Instant};

use form_autofill::detect::detector::FormDetector;
use form_autofill::detect::session::{DetectionSession, MutationDebouncer};
use form_autofill::dom::document::DomDocument;
use form_autofill::fill::filler::{FillInstruction, FillRequest, fill_fields};
use form_autofill::fill::progress::{ProgressState, ProgressTracker};
use form_autofill::trace::logger::TraceLogger;

use crate::common::fixtures::{form, input, snapshot, with_attr};

mod common;

// =========================================================================
// Helpers
// =========================================================================

fn detected_page() -> (DomDocument, DetectionSession, u64) {
    let page = snapshot(
        "https://example.com",
        "Profile",
        vec![form(
            "profile",
            vec![
                with_attr(input("email", "email"), "aria-label", "Email"),
                with_attr(input("text", "city"), "aria-label", "City"),
                with_attr(input("password", "pw"), "aria-label", "Password"),
            ],
        )],
    );

    let mut doc = DomDocument::from_snapshot(page);
    let result = FormDetector::new().detect_all(&mut doc);
    let mut session = DetectionSession::new();
    let generation = session.install(&result);
    (doc, session, generation)
}

fn instruction(opid: &str, value: &str) -> FillInstruction {
    FillInstruction {
        field_opid: opid.to_string(),
        value: value.to_string(),
    }
}

// =========================================================================
// Fill behavior
// =========================================================================

#[test]
fn fills_fields_through_the_session_cache() {
    let (mut doc, session, generation) = detected_page();
    let tracer = TraceLogger::disabled();

    let request = FillRequest {
        generation,
        fields_to_fill: vec![
            instruction("__0", "jane@example.com"),
            instruction("__1", "Lisbon"),
        ],
    };

    let result = fill_fields(&mut doc, &session, &request, &tracer);

    assert!(result.success);
    assert_eq!(result.filled, 2);
    assert!(result.skipped.is_empty());

    let email_node = session.lookup("__0", generation).unwrap().node;
    assert_eq!(doc.value(email_node), Some("jane@example.com"));
}

#[test]
fn unknown_opid_is_skipped_without_aborting_the_batch() {
    let (mut doc, session, generation) = detected_page();
    let tracer = TraceLogger::disabled();

    let request = FillRequest {
        generation,
        fields_to_fill: vec![
            instruction("__404", "ghost"),
            instruction("__1", "Lisbon"),
        ],
    };

    let result = fill_fields(&mut doc, &session, &request, &tracer);

    assert!(result.success, "Per-field failures never fail the batch");
    assert_eq!(result.filled, 1, "The remaining field still fills");
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].field_opid, "__404");
    assert!(result.skipped[0].reason.contains("not found"));
}

#[test]
fn stale_generation_recovers_through_the_stamped_attribute() {
    let (mut doc, mut session, _old_generation) = detected_page();
    let tracer = TraceLogger::disabled();

    // A re-detection invalidates the old generation but restamps the
    // same opids on this unchanged document.
    let result = FormDetector::new().detect_all(&mut doc);
    let _new_generation = session.install(&result);

    let request = FillRequest {
        generation: 1, // minted against the first pass
        fields_to_fill: vec![instruction("__0", "jane@example.com")],
    };

    let fill = fill_fields(&mut doc, &session, &request, &tracer);

    assert_eq!(
        fill.filled, 1,
        "Cache rejects the stale generation; the data attribute recovers"
    );
}

#[test]
fn password_fields_are_refused() {
    let (mut doc, session, generation) = detected_page();
    let tracer = TraceLogger::disabled();

    let request = FillRequest {
        generation,
        fields_to_fill: vec![instruction("__2", "hunter2")],
    };

    let result = fill_fields(&mut doc, &session, &request, &tracer);

    assert_eq!(result.filled, 0);
    assert_eq!(result.skipped.len(), 1);
    assert!(result.skipped[0].reason.contains("password"));

    let pw_node = session.lookup("__2", generation).unwrap().node;
    assert_eq!(doc.value(pw_node), None, "Password value untouched");
}

// =========================================================================
// Session generations
// =========================================================================

#[test]
fn stale_generation_lookups_are_rejected() {
    let (mut doc, mut session, first_generation) = detected_page();

    assert!(session.lookup("__0", first_generation).is_ok());

    let result = FormDetector::new().detect_all(&mut doc);
    let second_generation = session.install(&result);

    assert!(
        session.lookup("__0", first_generation).is_err(),
        "Old generation must not resolve against the new cache"
    );
    assert!(session.lookup("__0", second_generation).is_ok());
}

// =========================================================================
// Mutation debounce
// =========================================================================

#[test]
fn debouncer_waits_for_the_quiet_period() {
    let mut debouncer = MutationDebouncer::with_quiet_period(Duration::from_millis(500));
    let t0 = Instant::now();

    assert!(!debouncer.should_redetect(t0), "Nothing recorded yet");

    debouncer.record(t0);
    assert!(
        !debouncer.should_redetect(t0 + Duration::from_millis(100)),
        "Still inside the quiet period"
    );

    // A burst of mutations keeps pushing the trigger out.
    debouncer.record(t0 + Duration::from_millis(400));
    assert!(!debouncer.should_redetect(t0 + Duration::from_millis(700)));

    assert!(
        debouncer.should_redetect(t0 + Duration::from_millis(950)),
        "Quiet period elapsed since the last mutation"
    );
    assert!(
        !debouncer.should_redetect(t0 + Duration::from_millis(2000)),
        "Trigger is consumed once fired"
    );
}

// =========================================================================
// Progress state machine
// =========================================================================

#[test]
fn progress_moves_monotonically_forward() {
    let tracer = TraceLogger::disabled();
    let mut progress = ProgressTracker::new();

    progress.advance(ProgressState::Detecting, &tracer).unwrap();
    progress.advance(ProgressState::Analyzing, &tracer).unwrap();
    progress.advance(ProgressState::Matching, &tracer).unwrap();
    progress.advance(ProgressState::ShowingPreview, &tracer).unwrap();
    progress.advance(ProgressState::Completed, &tracer).unwrap();

    assert_eq!(progress.state(), Some(&ProgressState::Completed));
}

#[test]
fn progress_can_skip_states_but_never_move_backward() {
    let tracer = TraceLogger::disabled();
    let mut progress = ProgressTracker::new();

    progress.advance(ProgressState::Detecting, &tracer).unwrap();
    progress.advance(ProgressState::Matching, &tracer).unwrap();

    assert!(
        progress.advance(ProgressState::Analyzing, &tracer).is_err(),
        "Backward transition rejected"
    );
    assert!(
        progress.advance(ProgressState::Matching, &tracer).is_err(),
        "Repeated state rejected"
    );
}

#[test]
fn failure_is_reachable_from_any_non_terminal_state() {
    let tracer = TraceLogger::disabled();

    let mut early = ProgressTracker::new();
    early.advance(ProgressState::Detecting, &tracer).unwrap();
    early.fail("frames unavailable", &tracer).unwrap();
    assert!(matches!(early.state(), Some(ProgressState::Failed { .. })));

    let mut late = ProgressTracker::new();
    late.advance(ProgressState::Detecting, &tracer).unwrap();
    late.advance(ProgressState::ShowingPreview, &tracer).unwrap();
    late.fail("user cancelled", &tracer).unwrap();
    assert!(matches!(late.state(), Some(ProgressState::Failed { .. })));
}

#[test]
fn terminal_states_accept_no_further_transitions() {
    let tracer = TraceLogger::disabled();
    let mut progress = ProgressTracker::new();

    progress.advance(ProgressState::Detecting, &tracer).unwrap();
    progress.fail("boom", &tracer).unwrap();

    assert!(progress.advance(ProgressState::Matching, &tracer).is_err());
    assert!(progress.fail("again", &tracer).is_err());
}
