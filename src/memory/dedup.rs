use crate::detect::field_model::FieldPurpose;
use crate::matching::similarity::{combined_similarity, normalize_text};
use crate::memory::memory_model::MemoryEntry;

/// Combined Dice/Jaro-Winkler score at or above this means the two
/// questions ask the same thing.
pub const FUZZY_SIMILARITY_THRESHOLD: f32 = 0.75;

/// Additive boost when the canonical forms of both questions are
/// themselves highly similar (secondary canonicalization pass).
const CANONICAL_BOOST: f32 = 0.1;
const CANONICAL_BOOST_TRIGGER: f32 = 0.8;

/// A freshly captured answer from a submitted form.
#[derive(Debug, Clone)]
pub struct CapturedField {
    pub question: String,
    pub answer: String,
    /// Raw name/id of the source field, for name-equality matching.
    pub field_name: Option<String>,
    pub purpose: FieldPurpose,
}

/// What to do with one captured field.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    /// No similar question exists; store a new memory.
    Create { question: String, answer: String, purpose: FieldPurpose },
    /// A similar question exists with a different answer.
    Update { memory_id: String, answer: String },
    /// A similar question exists with the identical answer.
    Skip { memory_id: String },
}

/// Partition captured fields into creates, updates, and skips against the
/// existing memory set. O(existing × incoming); both sets are small.
pub fn plan_capture_merge(captured: &[CapturedField], existing: &[MemoryEntry]) -> Vec<MergeAction> {
    captured
        .iter()
        .map(|cap| {
            match existing.iter().find(|memory| questions_similar(cap, memory)) {
                Some(memory) => {
                    if normalize_text(&memory.answer) == normalize_text(&cap.answer) {
                        MergeAction::Skip {
                            memory_id: memory.id.clone(),
                        }
                    } else {
                        MergeAction::Update {
                            memory_id: memory.id.clone(),
                            answer: cap.answer.clone(),
                        }
                    }
                }
                None => MergeAction::Create {
                    question: cap.question.clone(),
                    answer: cap.answer.clone(),
                    purpose: cap.purpose,
                },
            }
        })
        .collect()
}

/// Multi-signal question similarity, first true signal wins:
/// 1. normalized equality
/// 2. canonical-table equality
/// 3. field-purpose equality (both known)
/// 4. normalized-field-name equality
/// 5. combined fuzzy similarity with canonical boost
pub fn questions_similar(captured: &CapturedField, memory: &MemoryEntry) -> bool {
    let cap_q = normalize_text(&captured.question);
    let mem_q = normalize_text(memory.question.as_deref().unwrap_or(""));

    // 1. exact normalized equality
    if !cap_q.is_empty() && cap_q == mem_q {
        return true;
    }

    // 2. both map to the same canonical form
    let cap_canon = canonical_question(&cap_q);
    let mem_canon = canonical_question(&mem_q);
    if !cap_canon.is_empty() && cap_canon == mem_canon {
        return true;
    }

    // 3. matching non-unknown purposes
    if captured.purpose != FieldPurpose::Unknown
        && memory.metadata.field_purpose == Some(captured.purpose)
    {
        return true;
    }

    // 4. field-name equality after case-style folding
    if let Some(name) = captured.field_name.as_deref() {
        let folded = normalize_field_name(name);
        if !folded.is_empty()
            && (folded == normalize_field_name(&mem_q) || folded == mem_canon)
        {
            return true;
        }
    }

    // 5. fuzzy similarity with canonical boost
    if cap_q.is_empty() || mem_q.is_empty() {
        return false;
    }
    let mut score = combined_similarity(&cap_q, &mem_q);
    if combined_similarity(&cap_canon, &mem_canon) >= CANONICAL_BOOST_TRIGGER {
        score += CANONICAL_BOOST;
    }
    score >= FUZZY_SIMILARITY_THRESHOLD
}

// ============================================================================
// Canonicalization
// ============================================================================

/// Fixed synonym table folding common question phrasings onto one
/// canonical form. Input must already be normalized.
pub fn canonical_question(normalized: &str) -> String {
    const TABLE: &[(&[&str], &str)] = &[
        (
            &["email", "e-mail", "e-mail address", "email address", "your email", "mail"],
            "email address",
        ),
        (
            &["phone", "telephone", "phone number", "mobile", "mobile number", "cell phone"],
            "phone number",
        ),
        (
            &["surname", "family name", "last name", "lastname"],
            "last name",
        ),
        (
            &["first name", "given name", "firstname", "forename"],
            "first name",
        ),
        (&["name", "full name", "your name"], "full name"),
        (
            &["zip", "zip code", "postal code", "postcode"],
            "postal code",
        ),
        (
            &["address", "street address", "home address", "address line 1"],
            "street address",
        ),
        (&["city", "town"], "city"),
        (&["state", "province", "region"], "state"),
        (&["country", "nation"], "country"),
        (
            &["company", "employer", "organization", "organisation", "company name"],
            "company",
        ),
        (
            &["job title", "title", "position", "role", "occupation"],
            "job title",
        ),
        (&["website", "url", "homepage", "personal website"], "website"),
        (&["birthday", "date of birth", "dob", "birth date"], "date of birth"),
    ];

    for (synonyms, canonical) in TABLE {
        if synonyms.contains(&normalized) {
            return (*canonical).to_string();
        }
    }
    normalized.to_string()
}

/// Fold camelCase, snake_case and kebab-case identifiers into lowercase
/// space-separated tokens.
pub fn normalize_field_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 8);
    let mut prev_lower = false;

    for c in name.chars() {
        match c {
            '_' | '-' | '.' => {
                out.push(' ');
                prev_lower = false;
            }
            c if c.is_uppercase() => {
                if prev_lower {
                    out.push(' ');
                }
                out.extend(c.to_lowercase());
                prev_lower = false;
            }
            c => {
                out.push(c);
                prev_lower = c.is_lowercase();
            }
        }
    }

    normalize_text(&out)
}
