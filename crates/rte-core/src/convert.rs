//! [`content_to_dom`] emits exactly one surface node per tree node; selection paths
//! depend on that shape.

use crate::checkbox::{self, is_blank};
use crate::content::{AttrKey, Attributes, EditorContent, EditorNode, NodeType};
use crate::dom::{NodeId, NodeKind, Surface};
use crate::html;
use crate::style;

pub const UPLOADING_ATTR: &str = "data-uploading";
pub const ATTACHMENT_ID_ATTR: &str = "data-attachment-id";
/// Set on links when [`RenderOptions::custom_link_rendering`] is on, for the host to
/// post-process.
pub const CUSTOM_LINK_ATTR: &str = "data-rte-link";

const IMAGE_DEFAULT_STYLE: [(&str, &str); 4] = [
    ("max-width", "100%"),
    ("height", "auto"),
    ("display", "block"),
    ("margin", "8px 0"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub custom_link_rendering: bool,
}

pub fn dom_to_content(surface: &mut Surface, root: NodeId) -> EditorContent {
    checkbox::ensure_all_checkboxes(surface, root);
    let surface: &Surface = surface;

    let mut blocks: Vec<EditorNode> = Vec::new();
    let mut inline_run: Vec<EditorNode> = Vec::new();

    for &child in surface.children(root) {
        if surface.text(child).is_some_and(|text| text.trim().is_empty()) {
            continue;
        }
        let Some(node) = convert_node(surface, child) else {
            continue;
        };
        if node.kind.is_block() {
            flush_inline_run(&mut inline_run, &mut blocks);
            blocks.push(node);
        } else {
            inline_run.push(node);
        }
    }
    flush_inline_run(&mut inline_run, &mut blocks);

    EditorContent::new(blocks)
}

/// Bare top-level inline content is wrapped in a synthetic paragraph.
fn flush_inline_run(inline_run: &mut Vec<EditorNode>, blocks: &mut Vec<EditorNode>) {
    if inline_run.is_empty() {
        return;
    }
    blocks.push(EditorNode::element(
        NodeType::P,
        std::mem::take(inline_run),
    ));
}

fn convert_node(surface: &Surface, node: NodeId) -> Option<EditorNode> {
    match surface.kind(node)? {
        NodeKind::Text(text) => convert_text(surface, node, text),
        NodeKind::Element { tag, .. } => convert_element(surface, node, tag),
    }
}

fn convert_children(surface: &Surface, node: NodeId) -> Vec<EditorNode> {
    surface
        .children(node)
        .iter()
        .filter_map(|child| convert_node(surface, *child))
        .collect()
}

fn convert_text(surface: &Surface, node: NodeId, text: &str) -> Option<EditorNode> {
    if is_blank(text) {
        let parent = surface.parent(node);
        // Lists only hold items; whitespace between them is formatting.
        if parent.is_some_and(|parent| checkbox::is_list(surface, parent)) {
            return None;
        }
        if let Some(item) = surface.closest(node, &["li"]) {
            if checkbox::is_checkbox_item(surface, item)
                && !is_blank(&surface.text_content(item))
            {
                return None;
            }
        }
    }
    Some(EditorNode::text(text))
}

fn convert_element(surface: &Surface, node: NodeId, tag: &str) -> Option<EditorNode> {
    if tag == "br" {
        return None;
    }
    if tag == "img" {
        return Some(convert_image(surface, node));
    }
    if let Some(kind) = NodeType::from_block_tag(tag) {
        return Some(convert_block(surface, node, kind));
    }
    if let Some(kind) = NodeType::from_inline_tag(tag) {
        return convert_inline(surface, node, kind);
    }
    tracing::trace!(tag, "dropping unrecognized element");
    None
}

fn convert_image(surface: &Surface, node: NodeId) -> EditorNode {
    let mut image = EditorNode::element(NodeType::Image, Vec::new());
    if let Some(src) = surface.attr(node, "src") {
        image.attributes.insert(AttrKey::Src, src.to_string());
    }
    if let Some(alt) = surface.attr(node, "alt") {
        image.attributes.insert(AttrKey::Alt, alt.to_string());
    }
    if surface.attr(node, UPLOADING_ATTR) == Some("true") {
        image.attributes.insert(AttrKey::Uploading, "true".to_string());
    }
    if let Some(id) = surface.attr(node, ATTACHMENT_ID_ATTR) {
        image.attributes.insert(AttrKey::AttachmentId, id.to_string());
    }
    copy_class(surface, node, &mut image);
    image
}

fn convert_block(surface: &Surface, node: NodeId, kind: NodeType) -> EditorNode {
    let mut block = EditorNode::element(kind, convert_children(surface, node));
    if kind == NodeType::Ul && checkbox::is_checkbox_list(surface, node) {
        // Dialect classes collapse to the canonical one.
        block.attributes.insert(
            AttrKey::Class,
            checkbox::CHECKBOX_LIST_CLASS.to_string(),
        );
    } else if kind == NodeType::Li && checkbox::is_checkbox_item(surface, node) {
        if surface.attr(node, "role") == Some("checkbox") {
            let checked = if checkbox::is_checked(surface, node) {
                "true"
            } else {
                "false"
            };
            block
                .attributes
                .insert(AttrKey::CheckboxChecked, checked.to_string());
        }
    } else {
        copy_class(surface, node, &mut block);
    }
    block
}

fn convert_inline(surface: &Surface, node: NodeId, kind: NodeType) -> Option<EditorNode> {
    if kind == NodeType::Span {
        return convert_span(surface, node);
    }
    let mut inline = EditorNode::element(kind, convert_children(surface, node));
    if kind == NodeType::Link {
        if let Some(href) = surface.attr(node, "href") {
            inline.attributes.insert(AttrKey::Href, href.to_string());
        }
    }
    copy_class(surface, node, &mut inline);
    Some(inline)
}

/// Spans carrying font size, colors or a class keep those as attributes. Any other
/// span is a presentational wrapper (Lexical wraps every text run in one) and is
/// unwrapped.
fn convert_span(surface: &Surface, node: NodeId) -> Option<EditorNode> {
    let mut span = EditorNode::element(NodeType::Span, Vec::new());
    span.attributes = span_style_attributes(surface, node);
    copy_class(surface, node, &mut span);
    if !span.attributes.is_empty() {
        span.children = Some(convert_children(surface, node));
        return Some(span);
    }

    match surface.children(node) {
        [] => None,
        [only] => convert_node(surface, *only),
        _ => Some(EditorNode::element(
            NodeType::Span,
            convert_children(surface, node),
        )),
    }
}

fn copy_class(surface: &Surface, node: NodeId, target: &mut EditorNode) {
    if let Some(class) = surface
        .attr(node, "class")
        .map(str::trim)
        .filter(|class| !class.is_empty())
    {
        target.attributes.insert(AttrKey::Class, class.to_string());
    }
}

fn span_style_attributes(surface: &Surface, node: NodeId) -> Attributes {
    let declarations = surface.attr(node, "style").map(style::parse).unwrap_or_default();
    AttrKey::STYLE_KEYS
        .into_iter()
        .filter_map(|key| {
            let property = key.style_property()?;
            let value = style::get(&declarations, property)?;
            Some((key, value.to_string()))
        })
        .collect()
}

pub fn content_to_dom(
    surface: &mut Surface,
    root: NodeId,
    content: &EditorContent,
    options: &RenderOptions,
) {
    surface.clear_children(root);
    for block in &content.blocks {
        let node = materialize(surface, block, options);
        surface.append_child(root, node);
    }
    checkbox::ensure_all_checkboxes(surface, root);
}

fn materialize(surface: &mut Surface, node: &EditorNode, options: &RenderOptions) -> NodeId {
    let Some(tag) = node.kind.tag() else {
        return surface.create_text(node.text.clone().unwrap_or_default());
    };

    let element = surface.create_element(tag);
    if node.kind == NodeType::Image {
        for (property, value) in IMAGE_DEFAULT_STYLE {
            surface.set_style_property(element, property, value);
        }
    }
    apply_attributes(surface, element, node);
    if node.kind == NodeType::Link && options.custom_link_rendering {
        surface.set_attr(element, CUSTOM_LINK_ATTR, "pending");
    }

    for child in node.children() {
        let child = materialize(surface, child, options);
        surface.append_child(element, child);
    }
    element
}

fn apply_attributes(surface: &mut Surface, element: NodeId, node: &EditorNode) {
    for (key, value) in &node.attributes {
        if let Some(property) = key.style_property() {
            surface.set_style_property(element, property, value);
            continue;
        }
        match key {
            AttrKey::CheckboxChecked => {
                if node.kind == NodeType::Li {
                    surface.set_attr(element, "role", "checkbox");
                    surface.set_attr(element, "tabindex", "-1");
                    let checked = if value == "true" { "true" } else { "false" };
                    surface.set_attr(element, "aria-checked", checked);
                }
            }
            AttrKey::Uploading => {
                if value == "true" {
                    surface.set_attr(element, UPLOADING_ATTR, "true");
                }
            }
            AttrKey::AttachmentId => surface.set_attr(element, ATTACHMENT_ID_ATTR, value.as_str()),
            AttrKey::Src => surface.set_attr(element, "src", value.as_str()),
            AttrKey::Alt => surface.set_attr(element, "alt", value.as_str()),
            AttrKey::Href => surface.set_attr(element, "href", value.as_str()),
            AttrKey::Class => surface.set_attr(element, "class", value.as_str()),
            AttrKey::FontSize | AttrKey::Color | AttrKey::BackgroundColor => {}
        }
    }
}

pub fn content_to_html(content: &EditorContent) -> String {
    content_to_html_with(content, &RenderOptions::default())
}

pub fn content_to_html_with(content: &EditorContent, options: &RenderOptions) -> String {
    let mut surface = Surface::new();
    let container = surface.create_element("div");
    content_to_dom(&mut surface, container, content, options);
    html::inner_html(&surface, container)
}

pub fn html_to_content(html: &str) -> EditorContent {
    let mut surface = Surface::new();
    let container = html::parse_fragment(&mut surface, html);
    dom_to_content(&mut surface, container)
}
