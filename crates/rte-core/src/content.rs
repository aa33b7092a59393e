use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    P,
    Div,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Blockquote,
    Ul,
    Ol,
    Li,
    Text,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link,
    Image,
    Span,
}

impl NodeType {
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeType::P
                | NodeType::Div
                | NodeType::H1
                | NodeType::H2
                | NodeType::H3
                | NodeType::H4
                | NodeType::H5
                | NodeType::H6
                | NodeType::Blockquote
                | NodeType::Ul
                | NodeType::Ol
                | NodeType::Li
        )
    }

    pub fn is_inline(self) -> bool {
        !self.is_block()
    }

    pub fn is_list(self) -> bool {
        matches!(self, NodeType::Ul | NodeType::Ol)
    }

    /// The tag emitted when materializing a node of this type. `None` for text.
    pub fn tag(self) -> Option<&'static str> {
        Some(match self {
            NodeType::P => "p",
            NodeType::Div => "div",
            NodeType::H1 => "h1",
            NodeType::H2 => "h2",
            NodeType::H3 => "h3",
            NodeType::H4 => "h4",
            NodeType::H5 => "h5",
            NodeType::H6 => "h6",
            NodeType::Blockquote => "blockquote",
            NodeType::Ul => "ul",
            NodeType::Ol => "ol",
            NodeType::Li => "li",
            NodeType::Bold => "strong",
            NodeType::Italic => "em",
            NodeType::Underline => "u",
            NodeType::Strikethrough => "s",
            NodeType::Link => "a",
            NodeType::Image => "img",
            NodeType::Span => "span",
            NodeType::Text => return None,
        })
    }

    pub fn from_block_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "p" => NodeType::P,
            "div" => NodeType::Div,
            "h1" => NodeType::H1,
            "h2" => NodeType::H2,
            "h3" => NodeType::H3,
            "h4" => NodeType::H4,
            "h5" => NodeType::H5,
            "h6" => NodeType::H6,
            "blockquote" => NodeType::Blockquote,
            "ul" => NodeType::Ul,
            "ol" => NodeType::Ol,
            "li" => NodeType::Li,
            _ => return None,
        })
    }

    pub fn from_inline_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "strong" | "b" => NodeType::Bold,
            "em" | "i" => NodeType::Italic,
            "u" => NodeType::Underline,
            "s" | "del" | "strike" => NodeType::Strikethrough,
            "a" => NodeType::Link,
            "span" => NodeType::Span,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttrKey {
    Src,
    Alt,
    Href,
    Class,
    CheckboxChecked,
    FontSize,
    Color,
    BackgroundColor,
    Uploading,
    AttachmentId,
}

impl AttrKey {
    /// CSS property backing a style-derived attribute.
    pub fn style_property(self) -> Option<&'static str> {
        match self {
            AttrKey::FontSize => Some("font-size"),
            AttrKey::Color => Some("color"),
            AttrKey::BackgroundColor => Some("background-color"),
            _ => None,
        }
    }

    pub const STYLE_KEYS: [AttrKey; 3] = [AttrKey::FontSize, AttrKey::Color, AttrKey::BackgroundColor];
}

pub type Attributes = BTreeMap<AttrKey, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorNode {
    #[serde(rename = "type")]
    pub kind: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<EditorNode>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
}

impl EditorNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: NodeType::Text,
            text: Some(text.into()),
            children: None,
            attributes: Attributes::new(),
        }
    }

    pub fn element(kind: NodeType, children: Vec<EditorNode>) -> Self {
        Self {
            kind,
            text: None,
            children: Some(children),
            attributes: Attributes::new(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::element(NodeType::P, Vec::new());
        }
        Self::element(NodeType::P, vec![Self::text(text)])
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::element(NodeType::Image, Vec::new()).with_attr(AttrKey::Src, src)
    }

    pub fn with_attr(mut self, key: AttrKey, value: impl Into<String>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }

    pub fn attr(&self, key: AttrKey) -> Option<&str> {
        self.attributes.get(&key).map(String::as_str)
    }

    pub fn children(&self) -> &[EditorNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            NodeType::Text => self.text.is_some() && self.children.is_none(),
            _ => {
                self.text.is_none()
                    && self
                        .children
                        .as_ref()
                        .is_some_and(|children| children.iter().all(EditorNode::is_well_formed))
            }
        }
    }

    pub fn plain_text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.children().iter().map(EditorNode::plain_text).collect(),
        }
    }

    fn is_pending_upload(&self) -> bool {
        self.kind == NodeType::Image && self.attr(AttrKey::Uploading) == Some("true")
    }

    /// `None` when the node is a pending upload, or only wrapped pending uploads.
    fn without_pending_uploads(&self) -> Option<Self> {
        if self.is_pending_upload() {
            return None;
        }
        let Some(children) = &self.children else {
            return Some(self.clone());
        };
        let kept: Vec<Self> = children
            .iter()
            .filter_map(EditorNode::without_pending_uploads)
            .collect();
        if kept.is_empty() && !children.is_empty() {
            return None;
        }
        Some(Self {
            kind: self.kind,
            text: self.text.clone(),
            children: Some(kept),
            attributes: self.attributes.clone(),
        })
    }

    fn repair(&mut self) {
        if self.kind == NodeType::Text {
            self.children = None;
            self.text.get_or_insert_with(String::new);
            return;
        }
        self.text = None;
        for child in self.children.get_or_insert_with(Vec::new) {
            child.repair();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorContent {
    #[serde(default)]
    pub blocks: Vec<EditorNode>,
}

impl Default for EditorContent {
    fn default() -> Self {
        Self::empty()
    }
}

impl EditorContent {
    pub fn new(blocks: Vec<EditorNode>) -> Self {
        let mut content = Self { blocks };
        content.ensure_not_empty();
        content
    }

    /// A document with a single empty paragraph.
    pub fn empty() -> Self {
        Self {
            blocks: vec![EditorNode::paragraph("")],
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.blocks.is_empty() && self.blocks.iter().all(EditorNode::is_well_formed)
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(EditorNode::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The document with in-flight image placeholders removed.
    pub fn without_pending_uploads(&self) -> Self {
        Self::new(
            self.blocks
                .iter()
                .filter_map(EditorNode::without_pending_uploads)
                .collect(),
        )
    }

    fn ensure_not_empty(&mut self) {
        if self.blocks.is_empty() {
            self.blocks.push(EditorNode::paragraph(""));
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ContentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ContentError> {
        let mut content: Self = serde_json::from_str(s)?;
        for block in &mut content.blocks {
            block.repair();
        }
        content.ensure_not_empty();
        Ok(content)
    }
}
