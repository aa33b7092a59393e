use pretty_assertions::assert_eq;
use rte_core::checkbox::{
    self, CHECKBOX_LIST_CLASS, Direction, ensure_all_checkboxes, find_check_list_item_sibling,
    toggle_list_item_checked,
};
use rte_core::{AttrKey, EditorContent, EditorNode, NodeId, NodeType, Surface, html, html_to_content};

const CANONICAL: &str = r#"<ul class="rte-checkbox-list"><li role="checkbox" tabindex="-1" aria-checked="true">Done</li><li role="checkbox" tabindex="-1" aria-checked="false">Todo</li></ul>"#;

const LEXICAL: &str = r#"<ul class="editor-checklist" __lexicallisttype="check">
  <li role="checkbox" tabindex="-1" aria-checked="true" value="1" class="editor-listitem-checked"><span style="white-space: pre-wrap;">Done</span></li>
  <li role="checkbox" tabindex="-1" aria-checked="false" value="2" class="editor-listitem-unchecked"><span style="white-space: pre-wrap;">Todo</span></li>
</ul>"#;

const TASK_LIST: &str = r#"<ul class="contains-task-list">
<li class="task-list-item"><input type="checkbox" class="task-list-item-checkbox" disabled checked>Done</li>
<li class="task-list-item"><input type="checkbox" class="task-list-item-checkbox" disabled>Todo</li>
</ul>"#;

fn expected_list() -> EditorContent {
    EditorContent::new(vec![
        EditorNode::element(
            NodeType::Ul,
            vec![
                EditorNode::element(NodeType::Li, vec![EditorNode::text("Done")])
                    .with_attr(AttrKey::CheckboxChecked, "true"),
                EditorNode::element(NodeType::Li, vec![EditorNode::text("Todo")])
                    .with_attr(AttrKey::CheckboxChecked, "false"),
            ],
        )
        .with_attr(AttrKey::Class, CHECKBOX_LIST_CLASS),
    ])
}

fn parse(html_str: &str) -> (Surface, NodeId) {
    let mut surface = Surface::new();
    let root = html::parse_fragment(&mut surface, html_str);
    (surface, root)
}

fn items(surface: &Surface, root: NodeId) -> Vec<NodeId> {
    surface
        .descendants(root)
        .into_iter()
        .filter(|node| surface.has_tag(*node, &["li"]))
        .collect()
}

#[test]
fn all_three_dialects_import_to_the_same_tree() {
    assert_eq!(html_to_content(CANONICAL), expected_list());
    assert_eq!(html_to_content(LEXICAL), expected_list());
    assert_eq!(html_to_content(TASK_LIST), expected_list());
}

#[test]
fn task_list_inputs_become_aria_state() {
    let (mut surface, root) = parse(TASK_LIST);
    ensure_all_checkboxes(&mut surface, root);

    let [done, todo] = items(&surface, root)[..] else {
        panic!("expected two items");
    };
    for item in [done, todo] {
        assert_eq!(surface.attr(item, "role"), Some("checkbox"));
        assert_eq!(surface.attr(item, "tabindex"), Some("-1"));
    }
    assert_eq!(surface.attr(done, "aria-checked"), Some("true"));
    assert_eq!(surface.attr(todo, "aria-checked"), Some("false"));

    let inputs = surface
        .descendants(root)
        .into_iter()
        .filter(|node| surface.has_tag(*node, &["input"]))
        .count();
    assert_eq!(inputs, 0);

    let Some(list) = surface.first_child(root) else {
        panic!("expected list");
    };
    assert!(surface.has_class(list, CHECKBOX_LIST_CLASS));
    assert!(surface.has_class(list, "contains-task-list"));
}

#[test]
fn normalization_is_idempotent() {
    let (mut surface, root) = parse(LEXICAL);
    ensure_all_checkboxes(&mut surface, root);
    let once = html::inner_html(&surface, root);
    ensure_all_checkboxes(&mut surface, root);
    assert_eq!(html::inner_html(&surface, root), once);
}

#[test]
fn nested_container_items_lose_checkbox_triad() {
    let (mut surface, root) = parse(
        r#"<ul class="rte-checkbox-list"><li role="checkbox" aria-checked="true"><ul class="rte-checkbox-list"><li>inner</li></ul></li></ul>"#,
    );
    ensure_all_checkboxes(&mut surface, root);

    let [container, inner] = items(&surface, root)[..] else {
        panic!("expected two items");
    };
    assert!(!checkbox::is_leaf_item(&surface, container));
    assert_eq!(surface.attr(container, "role"), None);
    assert_eq!(surface.attr(container, "aria-checked"), None);
    assert_eq!(surface.attr(inner, "role"), Some("checkbox"));
    assert_eq!(surface.attr(inner, "aria-checked"), Some("false"));
}

#[test]
fn plain_lists_are_left_alone() {
    let source = "<ul><li>one</li></ul><ol class=\"checklist\"><li>two</li></ol>";
    let (mut surface, root) = parse(source);
    ensure_all_checkboxes(&mut surface, root);
    assert_eq!(html::inner_html(&surface, root), source);
}

#[test]
fn toggle_flips_checked_state() {
    let (mut surface, root) = parse(CANONICAL);
    let [done, _] = items(&surface, root)[..] else {
        panic!("expected two items");
    };

    assert!(checkbox::is_checked(&surface, done));
    assert!(toggle_list_item_checked(&mut surface, done));
    assert!(!checkbox::is_checked(&surface, done));
    assert!(toggle_list_item_checked(&mut surface, done));
    assert!(checkbox::is_checked(&surface, done));

    let Some(list) = surface.first_child(root) else {
        panic!("expected list");
    };
    assert!(!toggle_list_item_checked(&mut surface, list));
}

#[test]
fn sibling_navigation_crosses_nesting_levels() {
    let (mut surface, root) = parse(
        r#"<ul class="rte-checkbox-list"><li>a</li><li><ul class="rte-checkbox-list"><li>b</li><li>c</li></ul></li><li>d</li></ul>"#,
    );
    ensure_all_checkboxes(&mut surface, root);

    let leaves: Vec<NodeId> = items(&surface, root)
        .into_iter()
        .filter(|item| checkbox::is_leaf_item(&surface, *item))
        .collect();
    let [a, b, c, d] = leaves[..] else {
        panic!("expected four leaf items");
    };

    assert_eq!(find_check_list_item_sibling(&surface, a, Direction::Next), Some(b));
    assert_eq!(find_check_list_item_sibling(&surface, b, Direction::Next), Some(c));
    assert_eq!(find_check_list_item_sibling(&surface, c, Direction::Next), Some(d));
    assert_eq!(find_check_list_item_sibling(&surface, d, Direction::Next), None);

    assert_eq!(find_check_list_item_sibling(&surface, d, Direction::Previous), Some(c));
    assert_eq!(find_check_list_item_sibling(&surface, b, Direction::Previous), Some(a));
    assert_eq!(find_check_list_item_sibling(&surface, a, Direction::Previous), None);
}

#[test]
fn previous_from_first_nested_item_returns_leaf_parent() {
    let (mut surface, root) = parse(
        r#"<ul class="rte-checkbox-list"><li>parent<ul class="rte-checkbox-list"><li>child</li></ul></li></ul>"#,
    );
    ensure_all_checkboxes(&mut surface, root);

    let [parent, child] = items(&surface, root)[..] else {
        panic!("expected two items");
    };
    assert!(checkbox::is_leaf_item(&surface, parent));
    assert_eq!(
        find_check_list_item_sibling(&surface, child, Direction::Previous),
        Some(parent)
    );
    assert_eq!(
        find_check_list_item_sibling(&surface, parent, Direction::Next),
        Some(child)
    );
}

#[test]
fn export_emits_canonical_markup_only() {
    let html_out = rte_core::content_to_html(&html_to_content(TASK_LIST));
    assert_eq!(html_out, CANONICAL);
    assert!(!html_out.contains("input"));
    assert!(!html_out.contains("contains-task-list"));
}
