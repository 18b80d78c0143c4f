use std::time::Duration;

use form_autofill::detect::website::{FormIntent, SiteType, classify_website};
use form_autofill::detect::detector::FormDetector;
use form_autofill::dom::document::DomDocument;
use form_autofill::matching::ai::AiMatcher;
use form_autofill::memory::memory_model::{MemoryCategory, MemoryEntry, MemorySource};
use form_autofill::run_match_pipeline;
use form_autofill::trace::logger::TraceLogger;

use crate::common::fixtures::{el, form, input, label_for, snapshot, with_attr, with_children, with_value};

mod common;

// =========================================================================
// Helpers
// =========================================================================

fn memory(question: &str, answer: &str, category: MemoryCategory) -> MemoryEntry {
    MemoryEntry::new(
        Some(question.to_string()),
        answer.to_string(),
        category,
        MemorySource::Manual,
    )
}

fn application_page() -> form_autofill::dom::dom_model::DomSnapshot {
    snapshot(
        "https://jobs.example.com/apply",
        "Apply - Example Corp Careers",
        vec![form(
            "application",
            vec![
                label_for("email", "Email"),
                with_attr(input("email", "email"), "id", "email"),
                label_for("name", "Full Name"),
                with_attr(input("text", "full_name"), "id", "name"),
                label_for("pw", "Password"),
                with_attr(input("password", "password"), "id", "pw"),
                // No label, no context, unknown purpose: filtered out.
                input("text", ""),
            ],
        )],
    )
}

// =========================================================================
// End-to-end pipeline
// =========================================================================

#[test]
fn pipeline_detects_filters_matches_and_gates() {
    let memories = vec![
        memory("Email address", "jane@example.com", MemoryCategory::Contact),
        memory("Full name", "Jane Doe", MemoryCategory::Personal),
    ];

    // Mock model answering both surviving fields. The detector assigns
    // __0 to the email input and __1 to the name input.
    let response = r#"{
      "matches": [
        {"fieldOpid": "__0", "memoryId": "MEM_EMAIL", "confidence": 0.92, "reasoning": "email label"},
        {"fieldOpid": "__1", "memoryId": "MEM_NAME", "confidence": 0.64, "reasoning": "name label"}
      ]
    }"#
    .replace("MEM_EMAIL", &memories[0].id)
    .replace("MEM_NAME", &memories[1].id);

    let matcher = AiMatcher::with_mock_response(&response);
    let tracer = TraceLogger::disabled();

    let outcome = run_match_pipeline(
        application_page(),
        &memories,
        Some(&matcher),
        0.75,
        Duration::from_millis(500),
        &tracer,
    )
    .expect("pipeline succeeds");

    // The password field and the anonymous field never reach matching.
    assert_eq!(outcome.filter_stats.total, 3, "Password excluded before filtering");
    assert_eq!(outcome.filter_stats.kept, 2);
    assert_eq!(outcome.filter_stats.unknown_unlabeled, 1);

    assert_eq!(outcome.mappings.len(), 2);
    let email = &outcome.mappings[0];
    assert_eq!(email.value.as_deref(), Some("jane@example.com"));
    assert!(email.auto_fill, "0.92 clears the 0.75 threshold");

    let name = &outcome.mappings[1];
    assert_eq!(name.value.as_deref(), Some("Jane Doe"));
    assert!(!name.auto_fill, "0.64 stays preview-only");
}

#[test]
fn pipeline_with_no_matcher_uses_the_fallback() {
    let memories = vec![memory("Email address", "jane@example.com", MemoryCategory::Contact)];
    let tracer = TraceLogger::disabled();

    let outcome = run_match_pipeline(
        application_page(),
        &memories,
        None,
        0.75,
        Duration::from_millis(500),
        &tracer,
    )
    .expect("pipeline succeeds without a model");

    assert_eq!(outcome.mappings.len(), 2);
    let email = &outcome.mappings[0];
    assert_eq!(email.value.as_deref(), Some("jane@example.com"));
}

#[test]
fn pipeline_with_zero_memories_still_succeeds() {
    let tracer = TraceLogger::disabled();

    let outcome = run_match_pipeline(
        application_page(),
        &[],
        None,
        0.75,
        Duration::from_millis(500),
        &tracer,
    )
    .expect("empty memory set is not an error");

    assert_eq!(outcome.mappings.len(), 2, "One no-match mapping per field");
    assert!(outcome.mappings.iter().all(|m| m.value.is_none()));
}

// =========================================================================
// Website context
// =========================================================================

#[test]
fn job_portal_pages_classify_as_such() {
    let page = application_page();
    let mut doc = DomDocument::from_snapshot(page);
    let result = FormDetector::new().detect_all(&mut doc);

    let context = classify_website(doc.url(), doc.title(), &result.forms);

    assert_eq!(context.site_type, SiteType::JobPortal);
    assert_eq!(context.form_intent, FormIntent::JobApplication);
    assert_eq!(context.page_title, "Apply - Example Corp Careers");
}

#[test]
fn login_shaped_forms_classify_as_login() {
    let page = snapshot(
        "https://example.com/account",
        "Welcome back",
        vec![form(
            "login",
            vec![
                with_attr(input("email", "email"), "aria-label", "Email"),
                with_attr(input("password", "password"), "aria-label", "Password"),
            ],
        )],
    );

    let mut doc = DomDocument::from_snapshot(page);
    let result = FormDetector::new().detect_all(&mut doc);
    let context = classify_website(doc.url(), doc.title(), &result.forms);

    assert_eq!(context.form_intent, FormIntent::Login, "Small form with a password");
    assert_eq!(context.site_type, SiteType::Other);
}

#[test]
fn capture_reads_submitted_values_back_out() {
    use form_autofill::memory::capture::capture_form_values;
    use form_autofill::memory::store::MemoryStore;
    use form_autofill::memory::capture::save_captured_memories;

    let page = snapshot(
        "https://example.com",
        "Contact",
        vec![form(
            "contact",
            vec![
                with_children(
                    with_attr(el("label"), "for", "em"),
                    vec![],
                ),
                with_attr(
                    with_value(input("email", "email"), "jane@example.com"),
                    "aria-label",
                    "Email",
                ),
                with_attr(input("password", "pw"), "aria-label", "Password"),
                with_attr(input("text", "city"), "aria-label", "City"), // left empty
            ],
        )],
    );

    let mut doc = DomDocument::from_snapshot(page);
    let result = FormDetector::new().detect_all(&mut doc);
    let contact = &result.forms[0];

    let captured = capture_form_values(&doc, contact);

    assert_eq!(captured.len(), 1, "Passwords and empty fields never capture");
    assert_eq!(captured[0].question, "Email");
    assert_eq!(captured[0].answer, "jane@example.com");

    let mut store = MemoryStore::in_memory();
    let saved = save_captured_memories(&mut store, &captured);
    assert!(saved.success);
    assert_eq!(saved.saved_count, 1);
    assert_eq!(store.entries()[0].answer, "jane@example.com");
}
