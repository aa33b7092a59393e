//! HTML string bridge for [`Surface`]: fragment parsing through html5ever and
//! HTML5-style serialization.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_fragment as parse_html_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::dom::{NodeId, NodeKind, Surface};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

/// Parses `html` as a body fragment into a new detached `div` container and returns it.
pub fn parse_fragment(surface: &mut Surface, html: &str) -> NodeId {
    let container = surface.create_element("div");

    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = parse_html_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(html);

    // Fragment parsing wraps the result in a synthetic <html> element.
    let document_children = dom.document.children.borrow();
    let roots: Vec<Handle> = match document_children.first() {
        Some(first) if is_html_root(first) => first.children.borrow().clone(),
        _ => document_children.clone(),
    };

    for handle in &roots {
        import_node(surface, container, handle);
    }
    container
}

fn is_html_root(handle: &Handle) -> bool {
    matches!(&handle.data, NodeData::Element { name, .. } if name.local.as_ref() == "html")
}

fn import_node(surface: &mut Surface, parent: NodeId, handle: &Handle) {
    match &handle.data {
        NodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            // Adjacent text runs are merged, like a normalized DOM.
            if let Some(last) = surface.last_child(parent) {
                if let Some(existing) = surface.text(last) {
                    let merged = format!("{existing}{text}");
                    surface.set_text(last, merged);
                    return;
                }
            }
            let node = surface.create_text(text);
            surface.append_child(parent, node);
        }
        NodeData::Element { name, attrs, .. } => {
            let element = surface.create_element(name.local.as_ref());
            for attr in attrs.borrow().iter() {
                let key = match &attr.name.prefix {
                    Some(prefix) => format!("{}:{}", prefix.as_ref(), attr.name.local.as_ref()),
                    None => attr.name.local.as_ref().to_string(),
                };
                surface.set_attr(element, &key, attr.value.to_string());
            }
            surface.append_child(parent, element);
            for child in handle.children.borrow().iter() {
                import_node(surface, element, child);
            }
        }
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                import_node(surface, parent, child);
            }
        }
        NodeData::Doctype { .. } | NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
}

pub fn inner_html(surface: &Surface, id: NodeId) -> String {
    let mut out = String::new();
    let raw = surface.has_tag(id, RAW_TEXT_ELEMENTS);
    for child in surface.children(id) {
        write_node(surface, *child, raw, &mut out);
    }
    out
}

pub fn outer_html(surface: &Surface, id: NodeId) -> String {
    let mut out = String::new();
    write_node(surface, id, false, &mut out);
    out
}

fn write_node(surface: &Surface, id: NodeId, raw_text: bool, out: &mut String) {
    match surface.kind(id) {
        Some(NodeKind::Text(text)) => {
            if raw_text {
                out.push_str(text);
            } else {
                let escaped = html_escape::encode_text(text);
                out.push_str(&escaped.replace('\u{a0}', "&nbsp;"));
            }
        }
        Some(NodeKind::Element { tag, attrs }) => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(value));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            out.push_str(&inner_html(surface, id));
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        None => {}
    }
}
