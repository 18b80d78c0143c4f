use form_autofill::detect::field_model::FieldPurpose;
use form_autofill::matching::similarity::{combined_similarity, dice_coefficient, jaro_winkler};
use form_autofill::memory::dedup::{
    CapturedField, MergeAction, canonical_question, normalize_field_name, plan_capture_merge,
    questions_similar,
};
use form_autofill::memory::memory_model::{MemoryCategory, MemoryEntry, MemorySource};
use form_autofill::memory::store::MemoryStore;
use form_autofill::memory::capture::save_captured_memories;

// =========================================================================
// Helpers
// =========================================================================

fn captured(question: &str, answer: &str) -> CapturedField {
    CapturedField {
        question: question.to_string(),
        answer: answer.to_string(),
        field_name: None,
        purpose: FieldPurpose::Unknown,
    }
}

fn stored(question: &str, answer: &str) -> MemoryEntry {
    MemoryEntry::new(
        Some(question.to_string()),
        answer.to_string(),
        MemoryCategory::Other,
        MemorySource::Manual,
    )
}

// =========================================================================
// Similarity primitives
// =========================================================================

#[test]
fn similarity_primitives_behave_at_the_edges() {
    assert_eq!(dice_coefficient("email", "email"), 1.0);
    assert_eq!(dice_coefficient("email", "zzzz"), 0.0);
    assert!(jaro_winkler("email address", "email adress") > 0.9, "Near-typo scores high");
    assert!(combined_similarity("phone number", "phone numbre") > 0.75);
    assert!(combined_similarity("first name", "shipping country") < 0.5);
}

// =========================================================================
// Canonicalization
// =========================================================================

#[test]
fn canonical_table_folds_synonyms() {
    assert_eq!(canonical_question("surname"), "last name");
    assert_eq!(canonical_question("family name"), "last name");
    assert_eq!(canonical_question("e-mail"), "email address");
    assert_eq!(canonical_question("zip"), "postal code");
    assert_eq!(
        canonical_question("favorite color"),
        "favorite color",
        "Unlisted questions pass through unchanged"
    );
}

#[test]
fn field_names_fold_across_case_styles() {
    assert_eq!(normalize_field_name("firstName"), "first name");
    assert_eq!(normalize_field_name("first_name"), "first name");
    assert_eq!(normalize_field_name("first-name"), "first name");
    assert_eq!(normalize_field_name("FIRST_NAME"), "first name");
}

// =========================================================================
// Question similarity signals, in precedence order
// =========================================================================

#[test]
fn exact_normalized_equality_wins_first() {
    assert!(questions_similar(
        &captured("  Email   Address ", "x"),
        &stored("email address", "y")
    ));
}

#[test]
fn canonical_equality_matches_synonyms() {
    assert!(questions_similar(&captured("Surname", "x"), &stored("Last Name", "y")));
    assert!(questions_similar(&captured("E-mail", "x"), &stored("Email Address", "y")));
}

#[test]
fn matching_purposes_connect_differently_worded_questions() {
    let mut cap = captured("Where can we reach you?", "x");
    cap.purpose = FieldPurpose::Email;

    let mem = stored("Contact email", "y").with_purpose(FieldPurpose::Email);

    assert!(questions_similar(&cap, &mem));
}

#[test]
fn folded_field_name_matches_the_stored_question() {
    let mut cap = captured("", "x");
    cap.field_name = Some("firstName".to_string());

    assert!(questions_similar(&cap, &stored("first name", "y")));
}

#[test]
fn fuzzy_similarity_is_the_last_resort() {
    assert!(
        questions_similar(&captured("Phone number", "x"), &stored("Phone numbre", "y")),
        "Typo-level distance clears the fuzzy threshold"
    );
    assert!(
        !questions_similar(&captured("Favorite color", "x"), &stored("Shipping country", "y")),
        "Unrelated questions stay distinct"
    );
}

// =========================================================================
// Merge planning
// =========================================================================

#[test]
fn identical_answer_under_canonical_question_is_a_noop() {
    // Idempotence: capturing "Email" against an existing "E-mail"
    // with the same answer produces zero creates and zero updates.
    let existing = vec![stored("E-mail", "a@b.com")];
    let plan = plan_capture_merge(&[captured("Email", "a@b.com")], &existing);

    assert_eq!(plan.len(), 1);
    assert!(
        matches!(plan[0], MergeAction::Skip { .. }),
        "Canonical-equal question with identical answer skips"
    );
}

#[test]
fn differing_answer_queues_an_update() {
    let existing = vec![stored("Email address", "old@b.com")];
    let plan = plan_capture_merge(&[captured("Email", "new@b.com")], &existing);

    match &plan[0] {
        MergeAction::Update { memory_id, answer } => {
            assert_eq!(memory_id, &existing[0].id);
            assert_eq!(answer, "new@b.com");
        }
        other => panic!("expected update, got {:?}", other),
    }
}

#[test]
fn unseen_question_queues_a_create() {
    let existing = vec![stored("Email address", "a@b.com")];
    let plan = plan_capture_merge(&[captured("Favorite color", "teal")], &existing);

    assert!(matches!(plan[0], MergeAction::Create { .. }));
}

// =========================================================================
// Saving captures through the store
// =========================================================================

#[test]
fn saved_count_covers_creates_and_updates_combined() {
    let mut store = MemoryStore::in_memory();
    store.insert(stored("Email address", "old@b.com"));
    store.insert(stored("Phone number", "555-0100"));

    let batch = vec![
        captured("E-mail", "new@b.com"),      // update (canonical match, new answer)
        captured("Phone", "555-0100"),        // skip (canonical match, same answer)
        captured("Favorite color", "teal"),   // create
    ];

    let result = save_captured_memories(&mut store, &batch);

    assert!(result.success);
    assert_eq!(result.saved_count, 2, "One update plus one create");
    assert_eq!(store.len(), 3);
    let updated = store.entries().iter().find(|e| e.answer == "new@b.com");
    assert!(updated.is_some(), "Existing memory answer replaced in place");
}

#[test]
fn update_bumps_confidence_to_at_least_the_greater_value() {
    let mut store = MemoryStore::in_memory();
    let mut entry = stored("Email address", "old@b.com");
    entry.confidence = 0.4;
    let id = entry.id.clone();
    store.insert(entry);

    store.update_answer(&id, "new@b.com", 0.9).unwrap();
    assert_eq!(store.get(&id).unwrap().confidence, 0.9);

    store.update_answer(&id, "newer@b.com", 0.2).unwrap();
    assert_eq!(
        store.get(&id).unwrap().confidence,
        0.9,
        "Confidence never decreases on update"
    );
}

#[test]
fn updating_a_missing_id_is_an_error() {
    let mut store = MemoryStore::in_memory();
    let result = store.update_answer("mem-does-not-exist", "x", 1.0);
    assert!(result.is_err(), "Missing id is a contract violation, not a no-op");
}
