use serde::{Deserialize, Serialize};

use crate::dom::document::NodeId;
use crate::dom::dom_model::NodeRect;

/// Opid of the synthetic form that groups fields with no owning `<form>`.
pub const STANDALONE_FORM_OPID: &str = "__form__standalone";

/// Attribute stamped on detected elements; the fill path uses it as a
/// best-effort recovery when the opid cache has been invalidated.
pub const OPID_ATTR: &str = "data-autofill-opid";

/// Structural classification of a field element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Tel,
    Url,
    Password,
    Number,
    Date,
    Checkbox,
    Radio,
    Select,
    Textarea,
}

/// Semantic purpose inferred from autocomplete attributes and label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPurpose {
    Email,
    Phone,
    Name,
    Address,
    City,
    State,
    Zip,
    Country,
    Company,
    Title,
    Unknown,
}

/// One choice of a select or radio-group field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

/// Everything the matcher and UI need to know about a field, with no
/// element handle inside. Rect is frame-local here; the snapshot
/// projection converts it to page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    pub html_id: Option<String>,
    pub name: Option<String>,
    pub css_class: Option<String>,
    /// Raw `type` attribute as written in the document.
    pub input_type: Option<String>,
    pub placeholder: Option<String>,
    pub autocomplete: Option<String>,
    pub max_length: Option<u32>,
    pub required: bool,
    pub disabled: bool,
    pub readonly: bool,

    // Independently-sourced label candidates.
    pub label_for: Option<String>,
    pub label_wrapping: Option<String>,
    pub label_aria: Option<String>,
    pub label_positional: Option<String>,
    /// aria-describedby text, when present.
    pub helper_text: Option<String>,

    pub field_type: FieldType,
    pub field_purpose: FieldPurpose,

    pub visible: bool,
    pub interactive: bool,

    pub value: Option<String>,
    pub options: Vec<FieldOption>,

    pub rect: NodeRect,
}

impl FieldMetadata {
    /// Label candidates in source-priority order, skipping empties.
    pub fn label_candidates(&self) -> Vec<&str> {
        [
            self.label_for.as_deref(),
            self.label_wrapping.as_deref(),
            self.label_aria.as_deref(),
            self.label_positional.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|l| !l.trim().is_empty())
        .collect()
    }

    /// Highest-priority non-empty label, if any.
    pub fn primary_label(&self) -> Option<&str> {
        self.label_candidates().first().copied()
    }

    pub fn has_any_label(&self) -> bool {
        !self.label_candidates().is_empty()
    }
}

/// A field detected in the live document. Owns the node handle; never
/// serialized; `to_snapshot` projects the wire shape.
#[derive(Debug, Clone)]
pub struct DetectedField {
    pub opid: String,
    pub form_opid: String,
    pub node: NodeId,
    pub metadata: FieldMetadata,
    /// Sequential UI annotation index; None for non-interactive fields.
    pub highlight_index: Option<u32>,
}

/// A form detected in the live document. `node` is None for the
/// standalone pseudo-form.
#[derive(Debug, Clone)]
pub struct DetectedForm {
    pub opid: String,
    pub node: Option<NodeId>,
    pub name: Option<String>,
    pub action: Option<String>,
    pub method: Option<String>,
    pub fields: Vec<DetectedField>,
}

/// Page-coordinate rect with all edges expanded, for overlay placement
/// in the top document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl FieldRect {
    pub fn from_local(rect: NodeRect, offset_x: f32, offset_y: f32) -> Self {
        let x = rect.x + offset_x;
        let y = rect.y + offset_y;
        Self {
            x,
            y,
            width: rect.width,
            height: rect.height,
            top: y,
            right: x + rect.width,
            bottom: y + rect.height,
            left: x,
        }
    }
}

/// Handle-free projection of a `DetectedField`; the only field shape that
/// crosses a serialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFieldSnapshot {
    pub opid: String,
    pub form_opid: String,
    pub metadata: FieldMetadata,
    pub rect: FieldRect,
    pub highlight_index: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedFormSnapshot {
    pub opid: String,
    pub name: Option<String>,
    pub action: Option<String>,
    pub method: Option<String>,
    pub fields: Vec<DetectedFieldSnapshot>,
}

impl DetectedField {
    /// One-way projection into the serializable shape. `offset` is the
    /// summed origin of ancestor iframes, so the rect lands in top-document
    /// page coordinates.
    pub fn to_snapshot(&self, offset_x: f32, offset_y: f32) -> DetectedFieldSnapshot {
        DetectedFieldSnapshot {
            opid: self.opid.clone(),
            form_opid: self.form_opid.clone(),
            metadata: self.metadata.clone(),
            rect: FieldRect::from_local(self.metadata.rect, offset_x, offset_y),
            highlight_index: self.highlight_index,
        }
    }
}

impl DetectedForm {
    pub fn to_snapshot(&self, offset_x: f32, offset_y: f32) -> DetectedFormSnapshot {
        DetectedFormSnapshot {
            opid: self.opid.clone(),
            name: self.name.clone(),
            action: self.action.clone(),
            method: self.method.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| f.to_snapshot(offset_x, offset_y))
                .collect(),
        }
    }
}

/// Result of one `detect_all` pass over a single frame's document.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub forms: Vec<DetectedForm>,
    pub total_fields: usize,
}

impl DetectionResult {
    pub fn field_count(&self) -> usize {
        self.forms.iter().map(|f| f.fields.len()).sum()
    }
}
