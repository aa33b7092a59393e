//! Lexical (`__lexicallisttype="check"`) and GitHub task-list markup are rewritten in
//! place into the `rte-checkbox-list` form.

use crate::dom::{NodeId, Surface};

pub const CHECKBOX_LIST_CLASS: &str = "rte-checkbox-list";
pub const TASK_LIST_CLASS: &str = "contains-task-list";
pub const LEXICAL_LIST_TYPE_ATTR: &str = "__lexicallisttype";
pub const LEXICAL_CHECK_LIST_TYPE: &str = "check";

const ROLE_CHECKBOX: &str = "checkbox";
const CHECKBOX_TABINDEX: &str = "-1";
const ZERO_WIDTH_SPACE: char = '\u{200b}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

pub fn is_list(surface: &Surface, node: NodeId) -> bool {
    surface.has_tag(node, &["ul", "ol"])
}

pub fn is_checkbox_list(surface: &Surface, node: NodeId) -> bool {
    if !surface.has_tag(node, &["ul"]) {
        return false;
    }
    if surface
        .attr(node, LEXICAL_LIST_TYPE_ATTR)
        .is_some_and(|value| value.eq_ignore_ascii_case(LEXICAL_CHECK_LIST_TYPE))
    {
        return true;
    }
    surface.class_list(node).into_iter().any(|class| {
        class == CHECKBOX_LIST_CLASS
            || class == TASK_LIST_CLASS
            || class.to_ascii_lowercase().contains("checklist")
    })
}

/// True for `li` elements whose parent list is a checkbox list.
pub fn is_checkbox_item(surface: &Surface, item: NodeId) -> bool {
    surface.has_tag(item, &["li"])
        && surface
            .parent(item)
            .is_some_and(|list| is_checkbox_list(surface, list))
}

/// A leaf item carries its own content; a nested item only groups a sub-list.
pub fn is_leaf_item(surface: &Surface, item: NodeId) -> bool {
    match first_significant_child(surface, item) {
        Some(child) => !is_list(surface, child),
        None => true,
    }
}

fn first_significant_child(surface: &Surface, node: NodeId) -> Option<NodeId> {
    surface
        .children(node)
        .iter()
        .copied()
        .find(|child| surface.text(*child).is_none_or(|text| !is_blank(text)))
}

/// Whitespace-only, counting zero-width spaces left behind by other editors.
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == ZERO_WIDTH_SPACE)
}

pub fn is_checked(surface: &Surface, item: NodeId) -> bool {
    surface.attr(item, "aria-checked") == Some("true")
}

pub fn ensure_all_checkboxes(surface: &mut Surface, root: NodeId) {
    let lists: Vec<NodeId> = std::iter::once(root)
        .chain(surface.descendants(root))
        .filter(|node| is_checkbox_list(surface, *node))
        .collect();
    for list in lists {
        ensure_checkbox_list(surface, list);
    }
}

fn ensure_checkbox_list(surface: &mut Surface, list: NodeId) {
    surface.add_class(list, CHECKBOX_LIST_CLASS);

    let items: Vec<NodeId> = surface
        .element_children(list)
        .into_iter()
        .filter(|child| surface.has_tag(*child, &["li"]))
        .collect();

    for item in items {
        absorb_checkbox_inputs(surface, item);

        if is_leaf_item(surface, item) {
            let checked = match surface.attr(item, "aria-checked") {
                Some("true") => "true",
                _ => "false",
            };
            surface.set_attr(item, "role", ROLE_CHECKBOX);
            surface.set_attr(item, "tabindex", CHECKBOX_TABINDEX);
            surface.set_attr(item, "aria-checked", checked);
        } else {
            surface.remove_attr(item, "role");
            surface.remove_attr(item, "tabindex");
            surface.remove_attr(item, "aria-checked");
        }
    }
}

/// Moves the state of embedded `<input type="checkbox">` elements onto the item and
/// drops the inputs. Inputs inside nested lists belong to those lists' items.
fn absorb_checkbox_inputs(surface: &mut Surface, item: NodeId) {
    let mut inputs = Vec::new();
    let mut stack: Vec<NodeId> = surface.children(item).to_vec();
    while let Some(node) = stack.pop() {
        if is_list(surface, node) {
            continue;
        }
        if surface.has_tag(node, &["input"])
            && surface
                .attr(node, "type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("checkbox"))
        {
            inputs.push(node);
            continue;
        }
        stack.extend(surface.children(node).iter().copied());
    }

    for input in inputs {
        if !surface.has_attr(item, "aria-checked") {
            let checked = surface.has_attr(input, "checked");
            surface.set_attr(item, "aria-checked", if checked { "true" } else { "false" });
        }
        surface.remove(input);
    }
}

pub fn toggle_list_item_checked(surface: &mut Surface, item: NodeId) -> bool {
    if !surface.has_tag(item, &["li"]) {
        return false;
    }
    let next = !is_checked(surface, item);
    if !surface.has_attr(item, "role") {
        surface.set_attr(item, "role", ROLE_CHECKBOX);
    }
    surface.set_attr(item, "aria-checked", if next { "true" } else { "false" });
    true
}

/// Finds the neighbouring leaf item in document order, crossing nesting levels.
pub fn find_check_list_item_sibling(
    surface: &Surface,
    item: NodeId,
    direction: Direction,
) -> Option<NodeId> {
    match direction {
        Direction::Next => next_leaf(surface, item),
        Direction::Previous => previous_leaf(surface, item),
    }
}

fn list_items(surface: &Surface, list: NodeId) -> Vec<NodeId> {
    surface
        .element_children(list)
        .into_iter()
        .filter(|child| surface.has_tag(*child, &["li"]))
        .collect()
}

fn nested_lists(surface: &Surface, item: NodeId) -> Vec<NodeId> {
    surface
        .element_children(item)
        .into_iter()
        .filter(|child| is_list(surface, *child))
        .collect()
}

/// The list item containing `item`'s list, if `item` is nested.
fn parent_item(surface: &Surface, item: NodeId) -> Option<NodeId> {
    let list = surface.parent(item)?;
    let parent = surface.parent(list)?;
    surface.has_tag(parent, &["li"]).then_some(parent)
}

fn first_leaf_in(surface: &Surface, item: NodeId) -> Option<NodeId> {
    if is_leaf_item(surface, item) {
        return Some(item);
    }
    nested_lists(surface, item)
        .into_iter()
        .flat_map(|list| list_items(surface, list))
        .find_map(|child| first_leaf_in(surface, child))
}

fn last_leaf_in(surface: &Surface, item: NodeId) -> Option<NodeId> {
    let nested = nested_lists(surface, item)
        .into_iter()
        .rev()
        .flat_map(|list| list_items(surface, list).into_iter().rev())
        .find_map(|child| last_leaf_in(surface, child));
    if nested.is_some() {
        return nested;
    }
    is_leaf_item(surface, item).then_some(item)
}

fn next_leaf(surface: &Surface, item: NodeId) -> Option<NodeId> {
    // A leaf with its own sub-list continues into it.
    if let Some(leaf) = nested_lists(surface, item)
        .into_iter()
        .flat_map(|list| list_items(surface, list))
        .find_map(|child| first_leaf_in(surface, child))
    {
        return Some(leaf);
    }

    let mut current = item;
    loop {
        let mut sibling = surface.next_element_sibling(current);
        while let Some(candidate) = sibling {
            if surface.has_tag(candidate, &["li"]) {
                if let Some(leaf) = first_leaf_in(surface, candidate) {
                    return Some(leaf);
                }
            }
            sibling = surface.next_element_sibling(candidate);
        }
        current = parent_item(surface, current)?;
    }
}

fn previous_leaf(surface: &Surface, item: NodeId) -> Option<NodeId> {
    let mut current = item;
    loop {
        let mut sibling = surface.previous_element_sibling(current);
        while let Some(candidate) = sibling {
            if surface.has_tag(candidate, &["li"]) {
                if let Some(leaf) = last_leaf_in(surface, candidate) {
                    return Some(leaf);
                }
            }
            sibling = surface.previous_element_sibling(candidate);
        }
        let parent = parent_item(surface, current)?;
        if is_leaf_item(surface, parent) {
            return Some(parent);
        }
        current = parent;
    }
}
