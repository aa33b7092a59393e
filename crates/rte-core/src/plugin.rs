use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::checkbox::{self, Direction};
use crate::content::AttrKey;
use crate::editor::Editor;
use crate::list;
use crate::selection::{self, DomSelection};

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What a command did, so the dispatcher knows whether to normalize and snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Unchanged,
    SelectionMoved,
    ContentChanged,
    HistoryRestored,
}

pub type CommandHandler =
    Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<CommandOutcome, CommandError> + Send + Sync>;

pub type QueryHandler = Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<CommandOutcome, CommandError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            keywords: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

/// Contributes commands and queries to the editor. Toolbars render from these.
pub trait EditorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default, Clone)]
pub struct PluginRegistry {
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    pub fn new(plugins: impl IntoIterator<Item = Box<dyn EditorPlugin>>) -> Result<Self, String> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register_plugin(plugin)?;
        }
        Ok(registry)
    }

    pub fn core() -> Self {
        let plugins: Vec<Box<dyn EditorPlugin>> = vec![
            Box::new(HistoryPlugin),
            Box::new(ListPlugin),
            Box::new(CheckboxPlugin),
            Box::new(SelectionPlugin),
        ];
        Self::new(plugins).expect("core registry must be valid")
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<(), String> {
        for cmd in plugin.commands() {
            if self.commands.contains_key(&cmd.id) {
                return Err(format!("Duplicate command id: {}", cmd.id));
            }
            self.commands.insert(cmd.id.clone(), cmd);
        }

        for query in plugin.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(format!("Duplicate query id: {}", query.id));
            }
            self.queries.insert(query.id.clone(), query);
        }

        tracing::debug!(plugin = plugin.id(), "registered editor plugin");
        Ok(())
    }

    pub fn commands(&self) -> &HashMap<String, CommandSpec> {
        &self.commands
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn queries(&self) -> &HashMap<String, QuerySpec> {
        &self.queries
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }
}

struct HistoryPlugin;

impl EditorPlugin for HistoryPlugin {
    fn id(&self) -> &'static str {
        "history"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("history.undo", "Undo", |editor, _args| {
                Ok(if editor.undo() {
                    CommandOutcome::HistoryRestored
                } else {
                    CommandOutcome::Unchanged
                })
            })
            .keywords(["undo", "history"]),
            CommandSpec::new("history.redo", "Redo", |editor, _args| {
                Ok(if editor.redo() {
                    CommandOutcome::HistoryRestored
                } else {
                    CommandOutcome::Unchanged
                })
            })
            .keywords(["redo", "history"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("history.can_undo", |editor, _args| {
                Ok(Value::Bool(editor.can_undo()))
            }),
            QuerySpec::new("history.can_redo", |editor, _args| {
                Ok(Value::Bool(editor.can_redo()))
            }),
        ]
    }
}

struct ListPlugin;

impl EditorPlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.indent", "Indent list item", |editor, _args| {
                let max_depth = editor.config().max_list_depth;
                Ok(with_selection(editor, |surface, selection| {
                    list::indent_list_item_with_max(surface, selection, max_depth)
                }))
            })
            .description("Nest the list item at the cursor one level deeper.")
            .keywords(["indent", "tab", "list"]),
            CommandSpec::new("list.outdent", "Outdent list item", |editor, _args| {
                Ok(with_selection(editor, list::outdent_list_item))
            })
            .description("Move the list item at the cursor, and the items after it, up one level.")
            .keywords(["outdent", "list"]),
        ]
    }
}

fn with_selection(
    editor: &mut Editor,
    op: impl FnOnce(&mut crate::dom::Surface, &mut DomSelection) -> bool,
) -> CommandOutcome {
    let Some(mut selection) = editor.selection().copied() else {
        return CommandOutcome::Unchanged;
    };
    if !op(editor.surface_mut(), &mut selection) {
        return CommandOutcome::Unchanged;
    }
    editor.set_selection(Some(selection));
    CommandOutcome::ContentChanged
}

struct CheckboxPlugin;

impl EditorPlugin for CheckboxPlugin {
    fn id(&self) -> &'static str {
        "checkbox"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("checkbox.toggle", "Toggle checked", |editor, _args| {
                let Some(item) = active_checkbox_item(editor) else {
                    return Ok(CommandOutcome::Unchanged);
                };
                Ok(
                    if checkbox::toggle_list_item_checked(editor.surface_mut(), item) {
                        CommandOutcome::ContentChanged
                    } else {
                        CommandOutcome::Unchanged
                    },
                )
            })
            .keywords(["todo", "task", "checkbox", "checked"]),
            CommandSpec::new("checkbox.focus_next", "Next checklist item", |editor, _args| {
                Ok(focus_sibling(editor, Direction::Next))
            }),
            CommandSpec::new(
                "checkbox.focus_previous",
                "Previous checklist item",
                |editor, _args| Ok(focus_sibling(editor, Direction::Previous)),
            ),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("checkbox.is_checked", |editor, _args| {
            let checked = active_checkbox_item(editor)
                .is_some_and(|item| checkbox::is_checked(editor.surface(), item));
            Ok(Value::Bool(checked))
        })]
    }
}

fn active_checkbox_item(editor: &Editor) -> Option<crate::dom::NodeId> {
    let anchor = editor.selection()?.anchor.node;
    let surface = editor.surface();
    let item = surface.closest(anchor, &["li"])?;
    (checkbox::is_checkbox_item(surface, item) && checkbox::is_leaf_item(surface, item))
        .then_some(item)
}

fn focus_sibling(editor: &mut Editor, direction: Direction) -> CommandOutcome {
    let Some(item) = active_checkbox_item(editor) else {
        return CommandOutcome::Unchanged;
    };
    let Some(target) = checkbox::find_check_list_item_sibling(editor.surface(), item, direction)
    else {
        return CommandOutcome::Unchanged;
    };
    let start = selection::start_of(editor.surface(), target);
    editor.set_selection(Some(DomSelection::new(start, start)));
    CommandOutcome::SelectionMoved
}

struct SelectionPlugin;

impl EditorPlugin for SelectionPlugin {
    fn id(&self) -> &'static str {
        "selection"
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("selection.font_size", |editor, _args| {
            Ok(active_font_size(editor).map_or(Value::Null, Value::String))
        })]
    }
}

/// Only an explicitly authored size on an enclosing span counts; inherited or default
/// sizes are not reported.
fn active_font_size(editor: &Editor) -> Option<String> {
    let anchor = editor.selection()?.anchor.node;
    let surface = editor.surface();
    let property = AttrKey::FontSize.style_property()?;
    surface
        .ancestors(anchor)
        .take_while(|node| *node != editor.root())
        .filter(|node| surface.has_tag(*node, &["span"]))
        .find_map(|node| surface.style_property(node, property))
}
