use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One page's DOM snapshot, as emitted by the host-side extractor.
///
/// The extractor serializes the rendered tree once per frame; layout facts
/// (rect, visibility, top-most hit test) are captured at extraction time
/// because they cannot be recomputed outside a rendering engine.
#[derive(Debug, Clone, Deserialize)]
pub struct DomSnapshot {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub title: String,

    pub root: RawNode,
}

/// A node in the serialized DOM tree.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub tag: String,

    #[serde(default)]
    pub attrs: HashMap<String, String>,

    /// Direct text content (not including descendants).
    #[serde(default)]
    pub text: Option<String>,

    /// Current value for value-carrying elements.
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub children: Vec<RawNode>,

    /// Children attached under this element's shadow root, if any.
    #[serde(default, rename = "shadowChildren")]
    pub shadow_children: Vec<RawNode>,

    /// Frame document hosted by this element (iframe only).
    #[serde(default, rename = "frameSnapshot")]
    pub frame_snapshot: Option<Box<DomSnapshot>>,

    #[serde(default)]
    pub rect: NodeRect,

    /// offsetParent !== null at extraction time.
    #[serde(default = "default_true")]
    pub visible: bool,

    /// Element was the top-most hit at its own center point.
    #[serde(default = "default_true")]
    pub topmost: bool,
}

fn default_true() -> bool {
    true
}

/// Viewport-relative bounding box, frame-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            width: self.width,
            height: self.height,
        }
    }
}
