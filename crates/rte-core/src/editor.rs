use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checkbox;
use crate::content::{AttrKey, EditorContent, EditorNode, NodeType};
use crate::convert::{self, RenderOptions, UPLOADING_ATTR};
use crate::dom::{NodeId, Surface};
use crate::error::{ConfigError, UploadError};
use crate::history::{DEFAULT_MAX_HISTORY, History, HistoryEntry};
use crate::list::DEFAULT_MAX_LIST_DEPTH;
use crate::plugin::{CommandError, CommandOutcome, PluginRegistry, QueryError};
use crate::sanitize;
use crate::selection::{self, DomSelection};
use crate::upload::{ImageUploader, PendingImage, UploadedImage};

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub max_history: usize,
    pub debounce_ms: u64,
    pub max_list_depth: usize,
    pub custom_link_rendering: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_list_depth: DEFAULT_MAX_LIST_DEPTH,
            custom_link_rendering: false,
        }
    }
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_history == 0 {
            self.max_history = DEFAULT_MAX_HISTORY;
        }
        if self.debounce_ms == 0 {
            self.debounce_ms = DEFAULT_DEBOUNCE_MS;
        }
        if self.max_list_depth == 0 {
            self.max_list_depth = DEFAULT_MAX_LIST_DEPTH;
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        Ok(config.with_defaults())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            custom_link_rendering: self.custom_link_rendering,
        }
    }
}

/// Handle for an image upload started with [`Editor::begin_image_upload`].
#[derive(Debug)]
pub struct UploadTicket {
    placeholder: NodeId,
    editor_alive: Rc<Cell<bool>>,
}

impl UploadTicket {
    pub fn placeholder(&self) -> NodeId {
        self.placeholder
    }
}

/// One editor instance: the live surface, its selection and its history.
///
/// Host code mutates the surface (typing, IME) through [`Editor::surface_mut`] and
/// reports it with [`Editor::record_change`]; structural edits go through
/// [`Editor::run_command`], which re-normalizes checkbox lists and snapshots history.
pub struct Editor {
    surface: Surface,
    root: NodeId,
    selection: Option<DomSelection>,
    history: History,
    config: EditorConfig,
    registry: PluginRegistry,
    pending_since: Option<Instant>,
    alive: Rc<Cell<bool>>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::from_content(EditorContent::empty(), config)
    }

    pub fn from_content(content: EditorContent, config: EditorConfig) -> Self {
        let config = config.with_defaults();
        let mut surface = Surface::new();
        let root = surface.create_element("div");
        surface.set_attr(root, "contenteditable", "true");

        let mut editor = Self {
            surface,
            root,
            selection: None,
            history: History::new(config.max_history),
            config,
            registry: PluginRegistry::core(),
            pending_since: None,
            alive: Rc::new(Cell::new(true)),
        };
        convert::content_to_dom(
            &mut editor.surface,
            root,
            &content,
            &editor.config.render_options(),
        );
        let start = selection::start_of(&editor.surface, root);
        editor.selection = Some(DomSelection::new(start, start));
        editor.commit_snapshot();
        editor
    }

    /// Imports external HTML; it is sanitized before conversion.
    pub fn from_html(html: &str, config: EditorConfig) -> Self {
        let content = convert::html_to_content(&sanitize::sanitize(html));
        Self::from_content(content, config)
    }

    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn selection(&self) -> Option<&DomSelection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<DomSelection>) {
        self.selection = selection;
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Reads the surface back into a tree.
    pub fn content(&mut self) -> EditorContent {
        convert::dom_to_content(&mut self.surface, self.root)
    }

    pub fn html(&mut self) -> String {
        let content = self.content();
        convert::content_to_html_with(&content, &self.config.render_options())
    }

    /// Replaces the document, keeping the cursor where the new shape allows.
    pub fn set_content(&mut self, content: &EditorContent) {
        self.flush_pending_now();
        let saved = selection::serialize(&self.surface, self.root, self.selection.as_ref());
        convert::content_to_dom(
            &mut self.surface,
            self.root,
            content,
            &self.config.render_options(),
        );
        self.selection = saved.and_then(|state| selection::restore(&self.surface, self.root, &state));
        self.commit_snapshot();
    }

    pub fn set_html(&mut self, html: &str) {
        let content = convert::html_to_content(&sanitize::sanitize(html));
        self.set_content(&content);
    }

    /// Notes a host-side edit. Edits closer together than the debounce window collapse
    /// into one history entry.
    pub fn record_change(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn has_pending_change(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Snapshots a pending change once its debounce window has elapsed.
    pub fn flush_pending(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.config.debounce() => {
                self.commit_snapshot()
            }
            _ => false,
        }
    }

    fn flush_pending_now(&mut self) {
        if self.pending_since.is_some() {
            self.commit_snapshot();
        }
    }

    /// Pushes the current state unless it matches the current history entry.
    pub fn commit_snapshot(&mut self) -> bool {
        self.pending_since = None;
        let content = self.content().without_pending_uploads();
        if self
            .history
            .current()
            .is_some_and(|entry| entry.content == content)
        {
            return false;
        }
        let state = selection::serialize(&self.surface, self.root, self.selection.as_ref());
        self.history.push(&content, state.as_ref());
        true
    }

    pub fn undo(&mut self) -> bool {
        self.flush_pending_now();
        match self.history.undo() {
            Some(entry) => {
                self.apply_entry(entry);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.flush_pending_now();
        match self.history.redo() {
            Some(entry) => {
                self.apply_entry(entry);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.pending_since.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.pending_since.is_none() && self.history.can_redo()
    }

    fn apply_entry(&mut self, entry: HistoryEntry) {
        convert::content_to_dom(
            &mut self.surface,
            self.root,
            &entry.content,
            &self.config.render_options(),
        );
        self.selection = entry
            .selection
            .and_then(|state| selection::restore(&self.surface, self.root, &state));
    }

    pub fn run_command(
        &mut self,
        id: &str,
        args: Option<Value>,
    ) -> Result<CommandOutcome, CommandError> {
        let Some(command) = self.registry.command(id) else {
            return Err(CommandError::new(format!("Unknown command: {id}")));
        };
        let outcome = (command.handler)(self, args)?;
        if outcome == CommandOutcome::ContentChanged {
            checkbox::ensure_all_checkboxes(&mut self.surface, self.root);
            self.commit_snapshot();
        }
        Ok(outcome)
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let Some(query) = self.registry.query(id) else {
            return Err(QueryError::new(format!("Unknown query: {id}")));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("Failed to decode query result: {err}")))
    }

    /// Marks the editor as gone; uploads finishing afterwards are dropped.
    pub fn teardown(&mut self) {
        self.alive.set(false);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Inserts an uploading placeholder image in a new paragraph after the block holding
    /// the cursor (or at the end of the document).
    pub fn begin_image_upload(&mut self, image: &PendingImage) -> UploadTicket {
        let mut placeholder = EditorNode::element(NodeType::Image, Vec::new())
            .with_attr(AttrKey::Uploading, "true")
            .with_attr(AttrKey::Alt, image.file_name.clone());
        if let Some(src) = &image.preview_src {
            placeholder = placeholder.with_attr(AttrKey::Src, src.clone());
        }
        let block = EditorNode::element(NodeType::P, vec![placeholder]);

        let content = EditorContent::new(vec![block]);
        let scratch = self.surface.create_element("div");
        convert::content_to_dom(&mut self.surface, scratch, &content, &self.config.render_options());
        let paragraph = self.surface.first_child(scratch).unwrap_or(scratch);
        let img = self
            .surface
            .descendants(paragraph)
            .into_iter()
            .find(|node| self.surface.has_tag(*node, &["img"]))
            .unwrap_or(paragraph);

        match self.current_block() {
            Some(block) => self.surface.insert_after(self.root, paragraph, block),
            None => self.surface.append_child(self.root, paragraph),
        }
        self.surface.remove(scratch);

        UploadTicket {
            placeholder: img,
            editor_alive: Rc::clone(&self.alive),
        }
    }

    /// Applies an upload result to its placeholder. Returns `false` when the result was
    /// discarded (editor torn down, placeholder gone) or the upload failed.
    pub fn finish_image_upload(
        &mut self,
        ticket: UploadTicket,
        result: Result<String, UploadError>,
    ) -> bool {
        if !ticket.editor_alive.get() {
            tracing::debug!("editor torn down before upload finished; dropping result");
            return false;
        }
        let img = ticket.placeholder;
        if !self.surface.contains(self.root, img)
            || self.surface.attr(img, UPLOADING_ATTR) != Some("true")
        {
            tracing::debug!("upload placeholder no longer present; dropping result");
            return false;
        }

        let uploaded = result.and_then(|raw| {
            let uploaded = UploadedImage::parse(&raw);
            if uploaded.url.is_empty() {
                Err(UploadError::EmptyUrl)
            } else {
                Ok(uploaded)
            }
        });

        match uploaded {
            Ok(uploaded) => {
                self.surface.set_attr(img, "src", uploaded.url);
                self.surface.remove_attr(img, UPLOADING_ATTR);
                if let Some(alt) = uploaded.alt {
                    self.surface.set_attr(img, "alt", alt);
                }
                if let Some(id) = uploaded.attachment_id {
                    self.surface.set_attr(img, convert::ATTACHMENT_ID_ATTR, id);
                }
                self.commit_snapshot();
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "image upload failed; removing placeholder");
                let wrapper = self
                    .surface
                    .parent(img)
                    .filter(|parent| *parent != self.root && self.surface.child_count(*parent) == 1);
                self.surface.remove(wrapper.unwrap_or(img));
                false
            }
        }
    }

    /// The top-level block containing the selection anchor.
    fn current_block(&self) -> Option<NodeId> {
        let anchor = self.selection?.anchor.node;
        self.surface
            .ancestors(anchor)
            .find(|node| self.surface.parent(*node) == Some(self.root))
    }
}

/// Runs a complete upload against an editor shared with the UI.
///
/// Only a weak handle is held while the upload is in flight; if the editor is dropped
/// or torn down by the time it resolves, the result is discarded.
pub async fn upload_image<U: ImageUploader>(
    editor: Weak<RefCell<Editor>>,
    uploader: &U,
    image: PendingImage,
) -> bool {
    let ticket = {
        let Some(editor) = editor.upgrade() else {
            return false;
        };
        let mut editor = editor.borrow_mut();
        editor.begin_image_upload(&image)
    };

    let result = uploader.upload(image).await;

    let Some(editor) = editor.upgrade() else {
        tracing::debug!("editor dropped before upload finished; dropping result");
        return false;
    };
    let mut editor = editor.borrow_mut();
    editor.finish_image_upload(ticket, result)
}
