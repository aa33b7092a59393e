pub mod checkbox;
pub mod convert;
pub mod dom;
pub mod html;
pub mod list;
pub mod sanitize;
pub mod selection;
pub mod style;
pub mod upload;

mod content;
mod editor;
mod error;
mod history;
mod plugin;

pub use crate::content::*;
pub use crate::convert::{
    RenderOptions, content_to_dom, content_to_html, content_to_html_with, dom_to_content,
    html_to_content,
};
pub use crate::dom::{NodeId, NodeKind, Surface};
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::history::*;
pub use crate::plugin::*;
pub use crate::sanitize::sanitize;
pub use crate::selection::{DomPoint, DomSelection, SelectionPoint, SelectionState};
pub use crate::upload::{ImageUploader, PendingImage, UploadedImage};
