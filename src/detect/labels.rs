use crate::detect::field_model::{FieldPurpose, FieldType};
use crate::dom::document::{DomDocument, NodeId};

/// Positional text longer than this is page copy, not a field label.
const MAX_POSITIONAL_LABEL_LEN: usize = 60;

/// Label candidates gathered from independent sources for one element.
#[derive(Debug, Clone, Default)]
pub struct LabelSources {
    pub label_for: Option<String>,
    pub wrapping: Option<String>,
    pub aria: Option<String>,
    pub positional: Option<String>,
    pub helper_text: Option<String>,
}

/// Gather every label source for a field element.
pub fn extract_labels(doc: &DomDocument, node: NodeId) -> LabelSources {
    LabelSources {
        label_for: explicit_label(doc, node),
        wrapping: wrapping_label(doc, node),
        aria: aria_label(doc, node),
        positional: positional_text(doc, node),
        helper_text: described_by_text(doc, node),
    }
}

/// `<label for="...">` pointing at this element's id.
fn explicit_label(doc: &DomDocument, node: NodeId) -> Option<String> {
    let id = doc.attr(node, "id")?;
    for candidate in doc.all_nodes() {
        if doc.tag(candidate) == "label" && doc.attr(candidate, "for") == Some(id) {
            return non_empty(doc.deep_text(candidate));
        }
    }
    None
}

/// Nearest `<label>` ancestor wrapping the element.
fn wrapping_label(doc: &DomDocument, node: NodeId) -> Option<String> {
    for ancestor in doc.ancestors(node) {
        if doc.tag(ancestor) == "label" {
            return non_empty(doc.deep_text(ancestor));
        }
    }
    None
}

/// aria-label, or the joined text of aria-labelledby targets.
fn aria_label(doc: &DomDocument, node: NodeId) -> Option<String> {
    if let Some(label) = doc.attr(node, "aria-label") {
        return non_empty(label.to_string());
    }

    let ids = doc.attr(node, "aria-labelledby")?;
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| doc.find_by_attr("id", id))
        .map(|n| doc.deep_text(n))
        .filter(|t| !t.trim().is_empty())
        .collect();

    non_empty(parts.join(" "))
}

fn described_by_text(doc: &DomDocument, node: NodeId) -> Option<String> {
    let ids = doc.attr(node, "aria-describedby")?;
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| doc.find_by_attr("id", id))
        .map(|n| doc.deep_text(n))
        .filter(|t| !t.trim().is_empty())
        .collect();

    non_empty(parts.join(" "))
}

/// Nearby text heuristic: the immediately preceding sibling's short text,
/// falling back to the parent's own direct text. Scanning further back
/// would attach some other field's label.
fn positional_text(doc: &DomDocument, node: NodeId) -> Option<String> {
    if let Some(sibling) = doc.preceding_siblings(node).into_iter().next() {
        let text = doc.deep_text(sibling);
        let text = text.trim();
        if !text.is_empty() && text.len() <= MAX_POSITIONAL_LABEL_LEN {
            return Some(text.to_string());
        }
    }

    let parent = doc.parent(node)?;
    let text = doc.text(parent)?.trim().to_string();
    if !text.is_empty() && text.len() <= MAX_POSITIONAL_LABEL_LEN {
        Some(text)
    } else {
        None
    }
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

// ============================================================================
// Field type classification
// ============================================================================

/// Classify a field-capable element, or None for tags/types the detector
/// ignores (hidden, submit, buttons, file pickers, and similar).
pub fn classify_field_type(tag: &str, type_attr: Option<&str>) -> Option<FieldType> {
    match tag {
        "textarea" => return Some(FieldType::Textarea),
        "select" => return Some(FieldType::Select),
        "input" => {}
        _ => return None,
    }

    match type_attr.map(|t| t.to_ascii_lowercase()).as_deref() {
        None | Some("text") | Some("search") => Some(FieldType::Text),
        Some("email") => Some(FieldType::Email),
        Some("tel") => Some(FieldType::Tel),
        Some("url") => Some(FieldType::Url),
        Some("password") => Some(FieldType::Password),
        Some("number") => Some(FieldType::Number),
        Some("date") | Some("datetime-local") | Some("month") | Some("week") => {
            Some(FieldType::Date)
        }
        Some("checkbox") => Some(FieldType::Checkbox),
        Some("radio") => Some(FieldType::Radio),

        // Explicit non-fields
        Some("hidden") | Some("submit") | Some("reset") | Some("button") | Some("image")
        | Some("file") | Some("color") | Some("range") => None,

        // Unknown type attribute: treat as free text
        Some(_) => Some(FieldType::Text),
    }
}

// ============================================================================
// Field purpose inference
// ============================================================================

/// Infer the semantic purpose. The autocomplete attribute is authoritative
/// and checked before any free-text pattern.
pub fn infer_purpose(autocomplete: Option<&str>, texts: &[&str]) -> FieldPurpose {
    if let Some(ac) = autocomplete {
        if let Some(purpose) = purpose_from_autocomplete(ac) {
            return purpose;
        }
    }

    let combined = texts.join(" ").to_lowercase();
    purpose_from_text(&combined)
}

fn purpose_from_autocomplete(autocomplete: &str) -> Option<FieldPurpose> {
    // Tokens may carry section prefixes ("shipping postal-code").
    for token in autocomplete.to_lowercase().split_whitespace() {
        let purpose = match token {
            "email" => FieldPurpose::Email,
            "tel" | "tel-national" | "tel-local" => FieldPurpose::Phone,
            "name" | "given-name" | "family-name" | "additional-name" | "nickname" => {
                FieldPurpose::Name
            }
            "street-address" | "address-line1" | "address-line2" | "address-line3" => {
                FieldPurpose::Address
            }
            "address-level2" => FieldPurpose::City,
            "address-level1" => FieldPurpose::State,
            "postal-code" => FieldPurpose::Zip,
            "country" | "country-name" => FieldPurpose::Country,
            "organization" => FieldPurpose::Company,
            "organization-title" => FieldPurpose::Title,
            _ => continue,
        };
        return Some(purpose);
    }
    None
}

/// Keyword patterns over label/name/id/placeholder text, checked in order
/// of decreasing specificity.
pub fn purpose_from_text(text: &str) -> FieldPurpose {
    let t = text.to_lowercase();

    if t.contains("email") || t.contains("e-mail") {
        return FieldPurpose::Email;
    }
    if t.contains("phone") || t.contains("mobile") || t.contains("telephone") {
        return FieldPurpose::Phone;
    }
    if t.contains("zip") || t.contains("postal") || t.contains("postcode") {
        return FieldPurpose::Zip;
    }
    if t.contains("city") || t.contains("town") {
        return FieldPurpose::City;
    }
    if t.contains("state") || t.contains("province") || t.contains("region") {
        return FieldPurpose::State;
    }
    if t.contains("country") {
        return FieldPurpose::Country;
    }
    if t.contains("company") || t.contains("employer") || t.contains("organization")
        || t.contains("organisation")
    {
        return FieldPurpose::Company;
    }
    if t.contains("job title") || t.contains("position") || t.contains("role")
        || t.contains("occupation")
    {
        return FieldPurpose::Title;
    }
    if t.contains("address") || t.contains("street") {
        return FieldPurpose::Address;
    }
    // "username" is an account handle, not a person's name
    if t.contains("name") && !t.contains("username") && !t.contains("user name") {
        return FieldPurpose::Name;
    }

    FieldPurpose::Unknown
}

// ============================================================================
// Cryptic string detection
// ============================================================================

/// Whether a name/id is machine-generated noise (UUIDs, long hex/base64
/// blobs, framework ids like `input_3fa94c`) that must never reach a
/// model prompt as context.
pub fn is_cryptic(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }

    if looks_like_uuid(s) {
        return true;
    }

    // Long hex run
    if s.len() >= 16 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        return true;
    }

    // Long base64-ish token: no spaces, mixed case + digits
    if s.len() >= 20
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_lowercase())
    {
        return true;
    }

    // Generated-id pattern: word_hexsuffix
    if let Some((_, suffix)) = s.rsplit_once(['_', '-']) {
        if suffix.len() >= 5
            && suffix.chars().all(|c| c.is_ascii_hexdigit())
            && suffix.chars().any(|c| c.is_ascii_digit())
        {
            return true;
        }
    }

    false
}

fn looks_like_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    s.char_indices().all(|(i, c)| match i {
        8 | 13 | 18 | 23 => c == '-',
        _ => c.is_ascii_hexdigit(),
    })
}
