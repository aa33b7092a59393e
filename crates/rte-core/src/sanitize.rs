//! Offending elements and attributes are removed; the input as a whole is never
//! rejected.

use std::sync::LazyLock;

use regex::Regex;

use crate::convert::{ATTACHMENT_ID_ATTR, UPLOADING_ATTR};
use crate::dom::{NodeId, Surface};
use crate::html;

/// Elements removed together with their whole subtree.
const BLOCKED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "form",
    "button", "select", "option", "optgroup", "textarea", "meta", "link", "base",
];

const BLOCKED_ATTRIBUTES: &[&str] = &["srcdoc", "formaction", "xlink:href", "ping"];

const URL_ATTRIBUTES: &[&str] = &["href", "src", "action"];

const ALLOWED_DATA_ATTRIBUTES: &[&str] = &[ATTACHMENT_ID_ATTR, UPLOADING_ATTR];

const ALLOWED_URL_SCHEMES: &[&str] = &["http:", "https:", "mailto:", "tel:"];

static EVENT_HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^on[a-z]+$").expect("EVENT_HANDLER_RE: hardcoded regex is valid")
});

static DATA_ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^data-").expect("DATA_ATTRIBUTE_RE: hardcoded regex is valid")
});

static SCRIPT_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(java|vb)script:").expect("SCRIPT_SCHEME_RE: hardcoded regex is valid")
});

pub fn sanitize(html: &str) -> String {
    let mut surface = Surface::new();
    let container = html::parse_fragment(&mut surface, html);
    sanitize_children(&mut surface, container);
    html::inner_html(&surface, container)
}

/// Sanitizes the subtree below `root` in place.
pub fn sanitize_children(surface: &mut Surface, root: NodeId) {
    for child in surface.children(root).to_vec() {
        sanitize_node(surface, child);
    }
}

fn sanitize_node(surface: &mut Surface, node: NodeId) {
    let Some(tag) = surface.tag(node).map(str::to_string) else {
        return;
    };

    if is_blocked_element(surface, node, &tag) {
        tracing::debug!(tag = %tag, "removing blocked element");
        surface.remove(node);
        return;
    }

    let blocked: Vec<String> = surface
        .attrs(node)
        .iter()
        .filter(|(name, value)| is_blocked_attribute(name, value))
        .map(|(name, _)| name.clone())
        .collect();
    for name in blocked {
        tracing::debug!(tag = %tag, attribute = %name, "removing blocked attribute");
        surface.remove_attr(node, &name);
    }

    sanitize_children(surface, node);
}

fn is_blocked_element(surface: &Surface, node: NodeId, tag: &str) -> bool {
    if BLOCKED_ELEMENTS.contains(&tag) {
        return true;
    }
    // Task-list checkboxes carry checked state for import; every other input goes.
    tag == "input"
        && !surface
            .attr(node, "type")
            .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox"))
}

fn is_blocked_attribute(name: &str, value: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    if EVENT_HANDLER_RE.is_match(&lower) {
        return true;
    }
    if DATA_ATTRIBUTE_RE.is_match(&lower) && !ALLOWED_DATA_ATTRIBUTES.contains(&lower.as_str()) {
        return true;
    }
    if BLOCKED_ATTRIBUTES.contains(&lower.as_str()) {
        return true;
    }
    if URL_ATTRIBUTES.contains(&lower.as_str()) && !is_allowed_url(value) {
        return true;
    }
    SCRIPT_SCHEME_RE.is_match(&compact(value))
}

fn is_allowed_url(value: &str) -> bool {
    let value = value.trim();
    if value.starts_with('#') {
        return true;
    }
    if value.starts_with('/') && !value.starts_with("//") {
        return true;
    }
    let lower = value.to_ascii_lowercase();
    ALLOWED_URL_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Drops whitespace and control characters that browsers ignore inside a scheme.
fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect()
}
