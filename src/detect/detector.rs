use std::collections::{HashMap, HashSet};

use crate::detect::field_model::{
    DetectedField, DetectedForm, DetectionResult, FieldMetadata, FieldOption, FieldType,
    OPID_ATTR, STANDALONE_FORM_OPID,
};
use crate::detect::labels::{classify_field_type, extract_labels, infer_purpose};
use crate::dom::document::{DomDocument, NodeId};

/// Walks one frame's document and produces `DetectedForm`s.
///
/// All state is reset at the start of every `detect_all` call: opids are
/// consistent only within a single pass, and a later pass may reuse an
/// opid string for a structurally different field.
pub struct FormDetector {
    field_counter: usize,
    form_counter: usize,
    highlight_counter: u32,
    claimed: HashSet<NodeId>,
    shadow_fields: Vec<NodeId>,
}

impl FormDetector {
    pub fn new() -> Self {
        Self {
            field_counter: 0,
            form_counter: 0,
            highlight_counter: 0,
            claimed: HashSet::new(),
            shadow_fields: Vec::new(),
        }
    }

    /// Detect every form and field in the document. Deterministic for a
    /// stable document. Stamps each detected element with its opid
    /// attribute so the fill path can recover from a stale cache.
    pub fn detect_all(&mut self, doc: &mut DomDocument) -> DetectionResult {
        self.field_counter = 0;
        self.form_counter = 0;
        self.highlight_counter = 0;
        self.claimed.clear();
        self.shadow_fields.clear();

        let mut forms = Vec::new();

        // Pass 1: <form> elements in document order. The arena is stored
        // in preorder with shadow content flattened in place, so index
        // order is document order.
        let form_nodes: Vec<NodeId> = doc
            .all_nodes()
            .filter(|n| doc.tag(*n) == "form")
            .collect();

        for form_node in form_nodes {
            let form_opid = self.next_form_opid();
            let fields = self.collect_form_fields(doc, form_node, &form_opid);

            forms.push(DetectedForm {
                opid: form_opid,
                node: Some(form_node),
                name: doc.attr(form_node, "name").map(str::to_string),
                action: doc.attr(form_node, "action").map(str::to_string),
                method: doc.attr(form_node, "method").map(str::to_string),
                fields,
            });
        }

        // Pass 2: standalone fields: no owning form at all, plus fields
        // collected from shadow roots a form could not reach.
        let standalone = self.collect_standalone_fields(doc);
        if !standalone.is_empty() {
            forms.push(DetectedForm {
                opid: STANDALONE_FORM_OPID.to_string(),
                node: None,
                name: None,
                action: None,
                method: None,
                fields: standalone,
            });
        }

        let total_fields = forms.iter().map(|f| f.fields.len()).sum();
        DetectionResult { forms, total_fields }
    }

    fn collect_form_fields(
        &mut self,
        doc: &mut DomDocument,
        form_node: NodeId,
        form_opid: &str,
    ) -> Vec<DetectedField> {
        let mut fields: Vec<DetectedField> = Vec::new();
        // form+name radio group key -> index into `fields`
        let mut radio_groups: HashMap<String, usize> = HashMap::new();

        for node in doc.descendants(form_node) {
            if node == form_node || self.claimed.contains(&node) {
                continue;
            }

            // A form's association does not pierce shadow boundaries; a
            // shadow-root field under a light-DOM form goes to the side
            // list and ends up in the standalone group.
            if doc.in_shadow(node) != doc.in_shadow(form_node) {
                if field_type_of(doc, node).is_some() && is_valid_field(doc, node) {
                    self.shadow_fields.push(node);
                }
                continue;
            }

            let Some(field_type) = field_type_of(doc, node) else {
                continue;
            };
            if !is_valid_field(doc, node) {
                continue;
            }

            self.claimed.insert(node);
            self.add_field(doc, node, field_type, form_opid, &mut fields, &mut radio_groups);
        }

        fields
    }

    fn collect_standalone_fields(&mut self, doc: &mut DomDocument) -> Vec<DetectedField> {
        let mut fields: Vec<DetectedField> = Vec::new();
        let mut radio_groups: HashMap<String, usize> = HashMap::new();

        let candidates: Vec<NodeId> = doc
            .all_nodes()
            .filter(|n| !self.claimed.contains(n))
            .filter(|n| field_type_of(doc, *n).is_some() && is_valid_field(doc, *n))
            .filter(|n| !doc.ancestors(*n).iter().any(|a| doc.tag(*a) == "form"))
            .collect();

        let shadow_extras: Vec<NodeId> = self
            .shadow_fields
            .drain(..)
            .filter(|n| !self.claimed.contains(n))
            .collect();

        for node in candidates.into_iter().chain(shadow_extras) {
            if self.claimed.contains(&node) {
                continue;
            }
            let Some(field_type) = field_type_of(doc, node) else {
                continue;
            };
            self.claimed.insert(node);
            self.add_field(
                doc,
                node,
                field_type,
                STANDALONE_FORM_OPID,
                &mut fields,
                &mut radio_groups,
            );
        }

        fields
    }

    /// Register one element as a field, folding same-name radios within a
    /// form into a single logical field with one option per radio.
    fn add_field(
        &mut self,
        doc: &mut DomDocument,
        node: NodeId,
        field_type: FieldType,
        form_opid: &str,
        fields: &mut Vec<DetectedField>,
        radio_groups: &mut HashMap<String, usize>,
    ) {
        if field_type == FieldType::Radio {
            if let Some(name) = doc.attr(node, "name").map(str::to_string) {
                let group_key = format!("{}::{}", form_opid, name);
                if let Some(&idx) = radio_groups.get(&group_key) {
                    let option = radio_option(doc, node);
                    fields[idx].metadata.options.push(option);
                    strip_option_labels(&mut fields[idx].metadata);
                    return;
                }
                let field = self.build_field(doc, node, field_type, form_opid);
                radio_groups.insert(group_key, fields.len());
                fields.push(field);
                return;
            }
        }

        let field = self.build_field(doc, node, field_type, form_opid);
        fields.push(field);
    }

    fn build_field(
        &mut self,
        doc: &mut DomDocument,
        node: NodeId,
        field_type: FieldType,
        form_opid: &str,
    ) -> DetectedField {
        let opid = self.next_field_opid();
        doc.set_attr(node, OPID_ATTR, &opid);

        let labels = extract_labels(doc, node);

        let html_id = doc.attr(node, "id").map(str::to_string);
        let name = doc.attr(node, "name").map(str::to_string);
        let placeholder = doc.attr(node, "placeholder").map(str::to_string);
        let autocomplete = doc.attr(node, "autocomplete").map(str::to_string);

        let purpose_texts: Vec<&str> = [
            labels.label_for.as_deref(),
            labels.wrapping.as_deref(),
            labels.aria.as_deref(),
            labels.positional.as_deref(),
            name.as_deref(),
            html_id.as_deref(),
            placeholder.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();

        let field_purpose = infer_purpose(autocomplete.as_deref(), &purpose_texts);

        let disabled = doc.has_attr(node, "disabled");
        let readonly = doc.has_attr(node, "readonly");
        let visible = doc.is_visible(node);
        let interactive = visible && !disabled && !readonly;

        let options = match field_type {
            FieldType::Select => select_options(doc, node),
            FieldType::Radio => vec![radio_option(doc, node)],
            _ => Vec::new(),
        };

        let mut metadata = FieldMetadata {
            html_id,
            name,
            css_class: doc.attr(node, "class").map(str::to_string),
            input_type: doc.attr(node, "type").map(str::to_string),
            placeholder,
            autocomplete,
            max_length: doc.attr(node, "maxlength").and_then(|m| m.parse().ok()),
            required: doc.has_attr(node, "required"),
            disabled,
            readonly,
            label_for: labels.label_for,
            label_wrapping: labels.wrapping,
            label_aria: labels.aria,
            label_positional: labels.positional,
            helper_text: labels.helper_text,
            field_type,
            field_purpose,
            visible,
            interactive,
            value: doc
                .value(node)
                .map(str::to_string)
                .or_else(|| doc.attr(node, "value").map(str::to_string)),
            options,
            rect: doc.rect(node),
        };

        if matches!(field_type, FieldType::Select | FieldType::Radio) {
            strip_option_labels(&mut metadata);
        }

        let highlight_index = if visible && doc.is_topmost(node) && interactive {
            let idx = self.highlight_counter;
            self.highlight_counter += 1;
            Some(idx)
        } else {
            None
        };

        DetectedField {
            opid,
            form_opid: form_opid.to_string(),
            node,
            metadata,
            highlight_index,
        }
    }

    fn next_field_opid(&mut self) -> String {
        let opid = format!("__{}", self.field_counter);
        self.field_counter += 1;
        opid
    }

    fn next_form_opid(&mut self) -> String {
        let opid = format!("__form__{}", self.form_counter);
        self.form_counter += 1;
        opid
    }
}

impl Default for FormDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Element filters
// ============================================================================

fn field_type_of(doc: &DomDocument, node: NodeId) -> Option<FieldType> {
    classify_field_type(doc.tag(node), doc.attr(node, "type"))
}

/// Validity filter: opt-out attribute, hidden elements, and anything the
/// type table already rejected.
fn is_valid_field(doc: &DomDocument, node: NodeId) -> bool {
    if doc.has_attr(node, "data-bwignore") {
        return false;
    }
    // offsetParent === null analog from the extractor
    if !doc.is_visible(node) {
        return false;
    }
    true
}

// ============================================================================
// Choice-field helpers
// ============================================================================

fn select_options(doc: &DomDocument, node: NodeId) -> Vec<FieldOption> {
    doc.descendants(node)
        .into_iter()
        .filter(|n| doc.tag(*n) == "option")
        .map(|n| {
            let text = doc.deep_text(n);
            let value = doc
                .attr(n, "value")
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            FieldOption { value, label: text }
        })
        .collect()
}

fn radio_option(doc: &DomDocument, node: NodeId) -> FieldOption {
    let value = doc
        .attr(node, "value")
        .or_else(|| doc.value(node))
        .unwrap_or("on")
        .to_string();
    let labels = extract_labels(doc, node);
    let label = labels
        .wrapping
        .or(labels.label_for)
        .or(labels.aria)
        .or(labels.positional)
        .unwrap_or_else(|| value.clone());
    FieldOption { value, label }
}

/// Clear any label candidate whose text exactly equals one of the field's
/// option values or option texts. Generic positional heuristics sometimes
/// attach an option's own text as the field's question; a side effect is
/// that a legitimately short label coinciding with an option value (a
/// Yes/No field labeled "Yes") is cleared too.
fn strip_option_labels(metadata: &mut FieldMetadata) {
    let option_texts: Vec<String> = metadata
        .options
        .iter()
        .flat_map(|o| [o.value.trim().to_string(), o.label.trim().to_string()])
        .collect();

    let matches_option =
        |label: &Option<String>| label.as_deref().is_some_and(|l| option_texts.contains(&l.trim().to_string()));

    if matches_option(&metadata.label_for) {
        metadata.label_for = None;
    }
    if matches_option(&metadata.label_wrapping) {
        metadata.label_wrapping = None;
    }
    if matches_option(&metadata.label_aria) {
        metadata.label_aria = None;
    }
    if matches_option(&metadata.label_positional) {
        metadata.label_positional = None;
    }
}
