use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use rte_core::{
    AttrKey, CommandOutcome, CommandSpec, DomSelection, Editor, EditorConfig, EditorContent,
    EditorNode, EditorPlugin, NodeId, PluginRegistry,
};

fn text_node(editor: &Editor, needle: &str) -> NodeId {
    let surface = editor.surface();
    let Some(node) = surface
        .descendants(editor.root())
        .into_iter()
        .find(|node| surface.text(*node) == Some(needle))
    else {
        panic!("text {needle:?} not found");
    };
    node
}

fn place_cursor(editor: &mut Editor, needle: &str, offset: usize) {
    let node = text_node(editor, needle);
    editor.set_selection(Some(DomSelection::collapsed(node, offset)));
}

fn cursor_text(editor: &Editor) -> Option<String> {
    let anchor = editor.selection()?.anchor.node;
    editor.surface().text(anchor).map(str::to_string)
}

#[test]
fn indent_command_snapshots_and_undo_restores() {
    let mut editor = Editor::from_html("<ul><li>a</li><li>b</li></ul>", EditorConfig::default());
    assert!(!editor.can_undo());
    place_cursor(&mut editor, "b", 0);

    let outcome = editor.run_command("list.indent", None).unwrap();
    assert_eq!(outcome, CommandOutcome::ContentChanged);
    assert_eq!(editor.html(), "<ul><li>a<ul><li>b</li></ul></li></ul>");
    assert_eq!(editor.history().len(), 2);
    assert!(editor.run_query::<bool>("history.can_undo", None).unwrap());

    let outcome = editor.run_command("history.undo", None).unwrap();
    assert_eq!(outcome, CommandOutcome::HistoryRestored);
    assert_eq!(editor.html(), "<ul><li>a</li><li>b</li></ul>");
    assert_eq!(cursor_text(&editor).as_deref(), Some("a"));
    assert!(editor.run_query::<bool>("history.can_redo", None).unwrap());

    editor.run_command("history.redo", None).unwrap();
    assert_eq!(editor.html(), "<ul><li>a<ul><li>b</li></ul></li></ul>");
    assert_eq!(cursor_text(&editor).as_deref(), Some("b"));

    let outcome = editor.run_command("history.redo", None).unwrap();
    assert_eq!(outcome, CommandOutcome::Unchanged);
}

#[test]
fn outdent_command_reverses_indent() {
    let mut editor = Editor::from_html(
        "<ul><li>a<ul><li>b</li></ul></li></ul>",
        EditorConfig::default(),
    );
    place_cursor(&mut editor, "b", 0);
    editor.run_command("list.outdent", None).unwrap();
    assert_eq!(editor.html(), "<ul><li>a</li><li>b</li></ul>");

    let outcome = editor.run_command("list.outdent", None).unwrap();
    assert_eq!(outcome, CommandOutcome::Unchanged);
    assert_eq!(editor.history().len(), 2);
}

#[test]
fn configured_max_list_depth_limits_indent() {
    let config = EditorConfig {
        max_list_depth: 1,
        ..EditorConfig::default()
    };
    let mut editor = Editor::from_html("<ul><li>a</li><li>b</li><li>c</li></ul>", config);
    place_cursor(&mut editor, "b", 0);
    assert_eq!(
        editor.run_command("list.indent", None).unwrap(),
        CommandOutcome::ContentChanged
    );
    place_cursor(&mut editor, "c", 0);
    assert_eq!(
        editor.run_command("list.indent", None).unwrap(),
        CommandOutcome::ContentChanged
    );
    assert_eq!(
        editor.run_command("list.indent", None).unwrap(),
        CommandOutcome::Unchanged
    );
}

#[test]
fn checkbox_commands_toggle_and_navigate() {
    let mut editor = Editor::from_html(
        r#"<ul class="contains-task-list"><li><input type="checkbox" checked>Done</li><li><input type="checkbox">Todo</li></ul>"#,
        EditorConfig::default(),
    );
    place_cursor(&mut editor, "Todo", 2);
    assert!(!editor.run_query::<bool>("checkbox.is_checked", None).unwrap());

    assert_eq!(
        editor.run_command("checkbox.toggle", None).unwrap(),
        CommandOutcome::ContentChanged
    );
    assert!(editor.run_query::<bool>("checkbox.is_checked", None).unwrap());
    let content = editor.content();
    assert_eq!(
        content.blocks[0].children()[1].attr(AttrKey::CheckboxChecked),
        Some("true")
    );

    assert_eq!(
        editor.run_command("checkbox.focus_previous", None).unwrap(),
        CommandOutcome::SelectionMoved
    );
    assert_eq!(cursor_text(&editor).as_deref(), Some("Done"));
    assert_eq!(
        editor.run_command("checkbox.focus_previous", None).unwrap(),
        CommandOutcome::Unchanged
    );
    assert_eq!(
        editor.run_command("checkbox.focus_next", None).unwrap(),
        CommandOutcome::SelectionMoved
    );
    assert_eq!(cursor_text(&editor).as_deref(), Some("Todo"));

    editor.run_command("history.undo", None).unwrap();
    place_cursor(&mut editor, "Todo", 0);
    assert!(!editor.run_query::<bool>("checkbox.is_checked", None).unwrap());
}

#[test]
fn checkbox_commands_ignore_plain_lists() {
    let mut editor = Editor::from_html("<ul><li>plain</li></ul>", EditorConfig::default());
    place_cursor(&mut editor, "plain", 0);
    assert_eq!(
        editor.run_command("checkbox.toggle", None).unwrap(),
        CommandOutcome::Unchanged
    );
    assert!(!editor.run_query::<bool>("checkbox.is_checked", None).unwrap());
}

#[test]
fn font_size_query_reports_explicit_size_only() {
    let mut editor = Editor::from_html(
        r#"<p><span style="font-size: 20px"><strong>big</strong></span> plain</p>"#,
        EditorConfig::default(),
    );
    place_cursor(&mut editor, "big", 1);
    assert_eq!(
        editor
            .run_query::<Option<String>>("selection.font_size", None)
            .unwrap(),
        Some("20px".to_string())
    );

    place_cursor(&mut editor, " plain", 1);
    assert_eq!(
        editor
            .run_query::<Option<String>>("selection.font_size", None)
            .unwrap(),
        None
    );

    editor.set_selection(None);
    assert_eq!(
        editor
            .run_query::<Option<String>>("selection.font_size", None)
            .unwrap(),
        None
    );
}

#[test]
fn unknown_ids_are_errors() {
    let mut editor = Editor::new(EditorConfig::default());
    let Err(err) = editor.run_command("nope", None) else {
        panic!("expected unknown command error");
    };
    assert_eq!(err.message(), "Unknown command: nope");

    let Err(err) = editor.run_query_json("nope", None) else {
        panic!("expected unknown query error");
    };
    assert_eq!(err.message(), "Unknown query: nope");

    assert!(editor.run_query::<String>("history.can_undo", None).is_err());
}

#[test]
fn debounce_coalesces_rapid_changes_into_one_entry() {
    let mut editor = Editor::from_html("<p>a</p>", EditorConfig::default());
    let start = Instant::now();

    let text = text_node(&editor, "a");
    editor.surface_mut().set_text(text, "ab");
    editor.record_change(start);
    assert!(editor.can_undo());
    assert!(!editor.flush_pending(start + Duration::from_millis(100)));

    editor.surface_mut().set_text(text, "abc");
    editor.record_change(start + Duration::from_millis(100));
    assert!(!editor.flush_pending(start + Duration::from_millis(350)));
    assert!(editor.flush_pending(start + Duration::from_millis(400)));
    assert!(!editor.has_pending_change());
    assert_eq!(editor.history().len(), 2);

    assert!(editor.undo());
    assert_eq!(editor.html(), "<p>a</p>");
    assert!(editor.redo());
    assert_eq!(editor.html(), "<p>abc</p>");
}

#[test]
fn undo_flushes_pending_change_first() {
    let mut editor = Editor::from_html("<p>a</p>", EditorConfig::default());
    let text = text_node(&editor, "a");
    editor.surface_mut().set_text(text, "typed");
    editor.record_change(Instant::now());
    assert!(!editor.can_redo());

    assert!(editor.undo());
    assert_eq!(editor.html(), "<p>a</p>");
    assert!(editor.redo());
    assert_eq!(editor.html(), "<p>typed</p>");
}

#[test]
fn unchanged_snapshot_is_skipped() {
    let mut editor = Editor::from_html("<p>a</p>", EditorConfig::default());
    assert!(!editor.commit_snapshot());
    editor.record_change(Instant::now());
    assert!(!editor.flush_pending(Instant::now() + Duration::from_secs(1)));
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn history_is_bounded_by_config() {
    let config = EditorConfig {
        max_history: 3,
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(config);
    for ix in 0..10 {
        editor.set_content(&EditorContent::new(vec![EditorNode::paragraph(format!("v{ix}"))]));
    }
    assert_eq!(editor.history().len(), 3);
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.html(), "<p>v7</p>");
}

#[test]
fn set_content_keeps_cursor_position_when_shape_matches() {
    let mut editor = Editor::from_html("<p>hello</p><p>there</p>", EditorConfig::default());
    place_cursor(&mut editor, "there", 3);

    editor.set_html("<p>HELLO</p><p>THERE</p>");
    let Some(selection) = editor.selection().copied() else {
        panic!("expected restored selection");
    };
    assert_eq!(editor.surface().text(selection.anchor.node), Some("THERE"));
    assert_eq!(selection.anchor.offset, 3);

    editor.set_html("<p>x</p>");
    assert!(editor.selection().is_none());
}

#[test]
fn imported_html_is_sanitized() {
    let mut editor = Editor::from_html(
        r#"<p onclick="steal()">safe<script>alert(1)</script></p><a href="javascript:x">bad</a>"#,
        EditorConfig::default(),
    );
    assert_eq!(editor.html(), "<p>safe</p><p><a>bad</a></p>");
}

#[test]
fn config_parses_camel_case_json_and_fills_defaults() {
    let config =
        EditorConfig::from_json_str(r#"{"maxHistory": 0, "debounceMs": 10, "customLinkRendering": true}"#)
            .unwrap();
    assert_eq!(
        config,
        EditorConfig {
            max_history: 50,
            debounce_ms: 10,
            max_list_depth: 6,
            custom_link_rendering: true,
        }
    );
    assert_eq!(config.debounce(), Duration::from_millis(10));
    assert!(EditorConfig::from_json_str(r#"{"maxHistory": "many"}"#).is_err());
}

struct ShoutPlugin;

impl EditorPlugin for ShoutPlugin {
    fn id(&self) -> &'static str {
        "shout"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("shout.upper", "Uppercase", |editor, _args| {
                let mut content = editor.content();
                for block in &mut content.blocks {
                    *block = EditorNode::paragraph(block.plain_text().to_uppercase());
                }
                editor.set_content(&content);
                Ok(CommandOutcome::ContentChanged)
            })
            .keywords(["case"]),
        ]
    }
}

struct ClashingPlugin;

impl EditorPlugin for ClashingPlugin {
    fn id(&self) -> &'static str {
        "clash"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("history.undo", "Undo again", |_editor, _args| {
            Ok(CommandOutcome::Unchanged)
        })]
    }
}

#[test]
fn custom_plugins_extend_the_registry() {
    let mut registry = PluginRegistry::core();
    registry.register_plugin(Box::new(ShoutPlugin)).unwrap();
    assert!(registry.command("shout.upper").is_some());

    let Err(err) = registry.register_plugin(Box::new(ClashingPlugin)) else {
        panic!("expected duplicate id error");
    };
    assert_eq!(err, "Duplicate command id: history.undo");

    let mut editor = Editor::from_html("<p>quiet</p>", EditorConfig::default()).with_registry(registry);
    editor.run_command("shout.upper", None).unwrap();
    assert_eq!(editor.html(), "<p>QUIET</p>");
    assert_eq!(editor.history().len(), 2);
}

#[test]
fn core_registry_exposes_every_core_command() {
    let registry = PluginRegistry::core();
    let mut ids: Vec<&str> = registry.commands().keys().map(String::as_str).collect();
    ids.sort_unstable();
    assert_eq!(
        ids,
        [
            "checkbox.focus_next",
            "checkbox.focus_previous",
            "checkbox.toggle",
            "history.redo",
            "history.undo",
            "list.indent",
            "list.outdent",
        ]
    );
    assert!(registry.query("selection.font_size").is_some());

    let plugins: Vec<Box<dyn EditorPlugin>> = vec![Box::new(ShoutPlugin), Box::new(ClashingPlugin)];
    assert!(PluginRegistry::new(plugins).is_ok());
    let plugins: Vec<Box<dyn EditorPlugin>> = vec![Box::new(ClashingPlugin), Box::new(ClashingPlugin)];
    let Err(err) = PluginRegistry::new(plugins) else {
        panic!("expected duplicate id error");
    };
    assert_eq!(err, "Duplicate command id: history.undo");
}
