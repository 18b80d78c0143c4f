// Each test binary compiles its own copy and uses a subset.
#![allow(dead_code)]

use std::collections::HashMap;

use form_autofill::dom::dom_model::{DomSnapshot, NodeRect, RawNode};

/// Bare element with sane defaults: visible, top-most, no attributes.
pub fn el(tag: &str) -> RawNode {
    RawNode {
        tag: tag.to_string(),
        attrs: HashMap::new(),
        text: None,
        value: None,
        children: Vec::new(),
        shadow_children: Vec::new(),
        frame_snapshot: None,
        rect: NodeRect::default(),
        visible: true,
        topmost: true,
    }
}

pub fn with_attr(mut node: RawNode, name: &str, value: &str) -> RawNode {
    node.attrs.insert(name.to_string(), value.to_string());
    node
}

pub fn with_text(mut node: RawNode, text: &str) -> RawNode {
    node.text = Some(text.to_string());
    node
}

pub fn with_value(mut node: RawNode, value: &str) -> RawNode {
    node.value = Some(value.to_string());
    node
}

pub fn with_children(mut node: RawNode, children: Vec<RawNode>) -> RawNode {
    node.children = children;
    node
}

pub fn with_shadow(mut node: RawNode, shadow: Vec<RawNode>) -> RawNode {
    node.shadow_children = shadow;
    node
}

pub fn with_rect(mut node: RawNode, x: f32, y: f32, w: f32, h: f32) -> RawNode {
    node.rect = NodeRect::new(x, y, w, h);
    node
}

pub fn hidden(mut node: RawNode) -> RawNode {
    node.visible = false;
    node
}

/// `<input type=... name=...>`
pub fn input(input_type: &str, name: &str) -> RawNode {
    with_attr(with_attr(el("input"), "type", input_type), "name", name)
}

/// `<label for=...>text</label>`
pub fn label_for(target: &str, text: &str) -> RawNode {
    with_text(with_attr(el("label"), "for", target), text)
}

/// `<form name=...>children</form>`
pub fn form(name: &str, children: Vec<RawNode>) -> RawNode {
    with_children(with_attr(el("form"), "name", name), children)
}

/// Full-page snapshot wrapping children in a body element.
pub fn snapshot(url: &str, title: &str, children: Vec<RawNode>) -> DomSnapshot {
    DomSnapshot {
        url: Some(url.to_string()),
        title: title.to_string(),
        root: with_children(el("body"), children),
    }
}

/// `<select name=...>` with one `<option>` per (value, text) pair.
pub fn select(name: &str, options: &[(&str, &str)]) -> RawNode {
    let children = options
        .iter()
        .map(|(value, text)| with_text(with_attr(el("option"), "value", value), text))
        .collect();
    with_children(with_attr(el("select"), "name", name), children)
}
