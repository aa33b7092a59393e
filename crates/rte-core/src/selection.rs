use serde::{Deserialize, Serialize};

use crate::dom::{NodeId, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl DomPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomSelection {
    pub anchor: DomPoint,
    pub focus: DomPoint,
}

impl DomSelection {
    pub fn new(anchor: DomPoint, focus: DomPoint) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(node: NodeId, offset: usize) -> Self {
        let point = DomPoint::new(node, offset);
        Self {
            anchor: point,
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPoint {
    #[serde(default)]
    pub path: Vec<usize>,
    pub offset: usize,
}

impl SelectionPoint {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
}

impl SelectionState {
    pub fn collapsed(point: SelectionPoint) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }
}

/// Converts a live selection into root-relative paths.
///
/// Returns `None` without a selection, or when either endpoint is outside `root`
/// or detached from it.
pub fn serialize(
    surface: &Surface,
    root: NodeId,
    selection: Option<&DomSelection>,
) -> Option<SelectionState> {
    let selection = selection?;
    let anchor = serialize_point(surface, root, &selection.anchor)?;
    let focus = serialize_point(surface, root, &selection.focus)?;
    Some(SelectionState { anchor, focus })
}

fn serialize_point(surface: &Surface, root: NodeId, point: &DomPoint) -> Option<SelectionPoint> {
    Some(SelectionPoint {
        path: path_from_root(surface, root, point.node)?,
        offset: point.offset,
    })
}

pub fn path_from_root(surface: &Surface, root: NodeId, node: NodeId) -> Option<Vec<usize>> {
    if !surface.exists(node) {
        return None;
    }
    let mut path = Vec::new();
    let mut current = node;
    while current != root {
        let parent = surface.parent(current)?;
        path.push(surface.index_in_parent(current)?);
        current = parent;
    }
    path.reverse();
    Some(path)
}

pub fn resolve_path(surface: &Surface, root: NodeId, path: &[usize]) -> Option<NodeId> {
    let mut current = root;
    for &ix in path {
        current = surface.child(current, ix)?;
    }
    Some(current)
}

/// Resolves a serialized selection against the current surface.
///
/// Best effort: an index that no longer exists yields `None`; offsets are clamped to
/// the length of the node they resolve to.
pub fn restore(surface: &Surface, root: NodeId, state: &SelectionState) -> Option<DomSelection> {
    let anchor = restore_point(surface, root, &state.anchor);
    let focus = restore_point(surface, root, &state.focus);
    match (anchor, focus) {
        (Some(anchor), Some(focus)) => Some(DomSelection { anchor, focus }),
        _ => {
            tracing::trace!(?state, "selection path no longer resolves");
            None
        }
    }
}

fn restore_point(surface: &Surface, root: NodeId, point: &SelectionPoint) -> Option<DomPoint> {
    let node = resolve_path(surface, root, &point.path)?;
    Some(DomPoint {
        node,
        offset: point.offset.min(surface.node_len(node)),
    })
}

/// First position inside `node`: offset 0 of its first text descendant, or of the node.
pub fn start_of(surface: &Surface, node: NodeId) -> DomPoint {
    let target = surface
        .descendants(node)
        .into_iter()
        .find(|candidate| surface.is_text(*candidate))
        .unwrap_or(node);
    DomPoint::new(target, 0)
}
