//! Neither operation records history.

use crate::checkbox::is_list;
use crate::dom::{NodeId, Surface};
use crate::selection::{self, DomSelection};

pub const DEFAULT_MAX_LIST_DEPTH: usize = 6;

fn enclosing_item(surface: &Surface, selection: &DomSelection) -> Option<NodeId> {
    let item = surface.closest(selection.anchor.node, &["li"])?;
    surface
        .parent(item)
        .is_some_and(|list| is_list(surface, list))
        .then_some(item)
}

/// Number of list items enclosing `item`; 0 for an item of a top-level list.
pub fn list_depth(surface: &Surface, item: NodeId) -> usize {
    let mut depth = 0;
    let mut current = item;
    while let Some(parent_item) = surface
        .parent(current)
        .filter(|list| is_list(surface, *list))
        .and_then(|list| surface.parent(list))
        .filter(|parent| surface.has_tag(*parent, &["li"]))
    {
        depth += 1;
        current = parent_item;
    }
    depth
}

/// Creates an empty list shaped like `template`: same tag and class.
fn create_list_like(surface: &mut Surface, template: NodeId) -> NodeId {
    let tag = surface.tag(template).unwrap_or("ul").to_string();
    let list = surface.create_element(&tag);
    if let Some(class) = surface.attr(template, "class").map(str::to_string) {
        surface.set_attr(list, "class", class);
    }
    list
}

fn following_items(surface: &Surface, item: NodeId) -> Vec<NodeId> {
    let Some(list) = surface.parent(item) else {
        return Vec::new();
    };
    let children = surface.children(list);
    let Some(ix) = children.iter().position(|child| *child == item) else {
        return Vec::new();
    };
    children[ix + 1..]
        .iter()
        .copied()
        .filter(|child| !surface.text(*child).is_some_and(|text| text.trim().is_empty()))
        .collect()
}

pub fn indent_list_item(surface: &mut Surface, selection: &mut DomSelection) -> bool {
    indent_list_item_with_max(surface, selection, DEFAULT_MAX_LIST_DEPTH)
}

pub fn indent_list_item_with_max(
    surface: &mut Surface,
    selection: &mut DomSelection,
    max_depth: usize,
) -> bool {
    let Some(item) = enclosing_item(surface, selection) else {
        return false;
    };
    let depth = list_depth(surface, item);
    if depth >= max_depth {
        tracing::debug!(depth, max_depth, "refusing to indent past maximum depth");
        return false;
    }
    let Some(list) = surface.parent(item) else {
        return false;
    };

    let previous = surface
        .previous_element_sibling(item)
        .filter(|sibling| surface.has_tag(*sibling, &["li"]));

    let moved = match previous {
        Some(previous) => {
            let existing = surface
                .element_children(previous)
                .into_iter()
                .rev()
                .find(|child| is_list(surface, *child));
            let nested = match existing {
                Some(nested) => nested,
                None => {
                    let nested = create_list_like(surface, list);
                    surface.append_child(previous, nested);
                    nested
                }
            };
            surface.append_child(nested, item);
            item
        }
        None => {
            let nested = create_list_like(surface, list);
            let following = following_items(surface, item);
            surface.append_child(item, nested);
            for sibling in &following {
                surface.append_child(nested, *sibling);
            }
            match following.first() {
                Some(first) => *first,
                None => {
                    let placeholder = surface.create_element("li");
                    surface.append_child(nested, placeholder);
                    placeholder
                }
            }
        }
    };

    let start = selection::start_of(surface, moved);
    *selection = DomSelection::new(start, start);
    true
}

pub fn outdent_list_item(surface: &mut Surface, selection: &mut DomSelection) -> bool {
    let Some(item) = enclosing_item(surface, selection) else {
        return false;
    };
    let Some(list) = surface.parent(item) else {
        return false;
    };
    let Some(parent_item) = surface
        .parent(list)
        .filter(|parent| surface.has_tag(*parent, &["li"]))
    else {
        return false;
    };
    let Some(outer_list) = surface.parent(parent_item) else {
        return false;
    };

    let mut moving = vec![item];
    moving.extend(following_items(surface, item));

    let mut anchor = parent_item;
    for node in moving {
        surface.insert_after(outer_list, node, anchor);
        anchor = node;
    }

    let list_is_empty = surface
        .children(list)
        .iter()
        .all(|child| surface.text(*child).is_some_and(|text| text.trim().is_empty()));
    if list_is_empty {
        surface.remove(list);
    }

    let start = selection::start_of(surface, item);
    *selection = DomSelection::new(start, start);
    true
}
