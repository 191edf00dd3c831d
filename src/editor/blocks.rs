use std::mem;

use crate::document::{Document, Element, ElementKind, ListKind, Node};

use super::structure::{
    ancestor_paths, block_path, children_at_mut, element_at, element_at_mut, text_leaf_paths,
};
use super::{Path, Point, Selection};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Code,
    OrderedList,
    UnorderedList,
}

impl BlockKind {
    pub fn element_kind(self) -> ElementKind {
        match self {
            BlockKind::Paragraph => ElementKind::Paragraph,
            BlockKind::Heading1 => ElementKind::Heading1,
            BlockKind::Heading2 => ElementKind::Heading2,
            BlockKind::Heading3 => ElementKind::Heading3,
            BlockKind::Code => ElementKind::Code,
            BlockKind::OrderedList => ElementKind::OrderedList,
            BlockKind::UnorderedList => ElementKind::UnorderedList,
        }
    }

    pub fn list_kind(self) -> Option<ListKind> {
        match self {
            BlockKind::OrderedList => Some(ListKind::Ordered),
            BlockKind::UnorderedList => Some(ListKind::Unordered),
            _ => None,
        }
    }

    pub fn from_list_kind(kind: ListKind) -> Self {
        match kind {
            ListKind::Ordered => BlockKind::OrderedList,
            ListKind::Unordered => BlockKind::UnorderedList,
        }
    }
}

/// Consecutive sibling blocks under one parent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BlockRun {
    pub parent: Vec<usize>,
    pub first: usize,
    pub len: usize,
}

impl BlockRun {
    fn single(path: &[usize]) -> Option<Self> {
        let (idx, parent) = path.split_last()?;
        Some(Self {
            parent: parent.to_vec(),
            first: *idx,
            len: 1,
        })
    }

    fn path(&self, idx: usize) -> Vec<usize> {
        let mut path = self.parent.clone();
        path.push(self.first + idx);
        path
    }

    fn paths(&self) -> Vec<Vec<usize>> {
        (0..self.len).map(|idx| self.path(idx)).collect()
    }

    /// Index within the run of the block at `path`.
    fn position_of(&self, path: &[usize]) -> Option<usize> {
        let (idx, parent) = path.split_last()?;
        if parent != self.parent.as_slice() || *idx < self.first || *idx >= self.first + self.len {
            return None;
        }
        Some(idx - self.first)
    }
}

/// Leaves touched by the selection, with the focus leaf always included.
fn selected_leaves(document: &Document, selection: &Selection) -> Vec<Vec<usize>> {
    let start = selection.start();
    let end = selection.end();
    let mut leaves: Vec<Vec<usize>> = text_leaf_paths(&document.children)
        .into_iter()
        .filter(|path| {
            path.as_slice() >= start.path.as_slice() && path.as_slice() <= end.path.as_slice()
        })
        .collect();
    if !leaves.iter().any(|path| path.as_slice() == selection.focus.path.as_slice()) {
        leaves.push(selection.focus.path.to_vec());
    }
    leaves
}

pub(crate) fn is_block_active(document: &Document, selection: &Selection, kind: BlockKind) -> bool {
    let target = kind.element_kind();
    selected_leaves(document, selection).iter().any(|leaf| {
        ancestor_paths(leaf).any(|prefix| {
            element_at(&document.children, prefix).is_some_and(|element| element.kind == target)
        })
    })
}

/// The lowest blocks covered by the selection when they share a parent,
/// otherwise the focus block alone.
pub(crate) fn selected_run(document: &Document, selection: &Selection) -> Option<BlockRun> {
    let nodes = &document.children;
    let focus_block = block_path(nodes, &selection.focus.path)?;
    let start_block = block_path(nodes, &selection.start().path)?;
    let end_block = block_path(nodes, &selection.end().path)?;
    let (Some((start_idx, start_parent)), Some((end_idx, end_parent))) =
        (start_block.split_last(), end_block.split_last())
    else {
        return BlockRun::single(&focus_block);
    };
    if start_parent != end_parent || start_idx > end_idx {
        return BlockRun::single(&focus_block);
    }
    Some(BlockRun {
        parent: start_parent.to_vec(),
        first: *start_idx,
        len: end_idx - start_idx + 1,
    })
}

pub(crate) fn toggle_block(
    document: &mut Document,
    selection: &Selection,
    kind: BlockKind,
    active: bool,
) -> Option<Selection> {
    let run = selected_run(document, selection)?;
    let paths = run.paths();
    let blocks_ok = paths.iter().all(|path| {
        element_at(&document.children, path).is_some_and(|element| {
            element.kind.holds_inline_content() && !element.kind.is_table_cell()
        })
    });
    if !blocks_ok {
        return None;
    }
    let anchor = relative_point(&run, &selection.anchor);
    let focus = relative_point(&run, &selection.focus)?;

    let nodes = &mut document.children;
    let run = unwrap_lists(nodes, run);
    let new_paths = match kind.list_kind() {
        Some(list) if !active => {
            retype_run(nodes, &run, ElementKind::ListItem);
            wrap_run_in_list(nodes, &run, list)?
        }
        _ => {
            let target = if active || kind.list_kind().is_some() {
                ElementKind::Paragraph
            } else {
                kind.element_kind()
            };
            retype_run(nodes, &run, target);
            run.paths()
        }
    };

    let focus = absolute_point(&new_paths, &focus)?;
    let anchor = anchor
        .and_then(|anchor| absolute_point(&new_paths, &anchor))
        .unwrap_or_else(|| focus.clone());
    Some(Selection::new(anchor, focus))
}

/// A point expressed as (index in run, path below the block, offset).
type RunPoint = (usize, Vec<usize>, usize);

fn relative_point(run: &BlockRun, point: &Point) -> Option<RunPoint> {
    (1..point.path.len()).rev().find_map(|len| {
        let idx = run.position_of(&point.path[..len])?;
        Some((idx, point.path[len..].to_vec(), point.offset))
    })
}

fn absolute_point(paths: &[Vec<usize>], (idx, rel, offset): &RunPoint) -> Option<Point> {
    let block = paths.get(*idx)?;
    Some(Point::new(Path::new(block.clone()).join(rel), *offset))
}

fn retype_run(nodes: &mut [Node], run: &BlockRun, kind: ElementKind) {
    for path in run.paths() {
        if let Some(element) = element_at_mut(nodes, &path) {
            element.kind = kind.clone();
        }
    }
}

/// Lift the run out of every enclosing list, splitting each list around it.
pub(crate) fn unwrap_lists(nodes: &mut Vec<Node>, mut run: BlockRun) -> BlockRun {
    loop {
        let Some(list) = element_at_mut(nodes, &run.parent) else {
            return run;
        };
        if !list.kind.is_list() {
            return run;
        }
        let kind = list.kind.clone();
        let mut before = mem::take(&mut list.children);
        let after = before.split_off((run.first + run.len).min(before.len()));
        let lifted = before.split_off(run.first.min(before.len()));

        let Some((list_idx, grand_parent)) = run.parent.split_last() else {
            return run;
        };
        let list_idx = *list_idx;
        let grand_parent = grand_parent.to_vec();
        let Some(siblings) = children_at_mut(nodes, &grand_parent) else {
            return run;
        };

        let mut replacement = Vec::with_capacity(lifted.len() + 2);
        let mut first = list_idx;
        if !before.is_empty() {
            replacement.push(
                Element {
                    kind: kind.clone(),
                    children: before,
                }
                .into(),
            );
            first += 1;
        }
        let len = lifted.len();
        replacement.extend(lifted);
        if !after.is_empty() {
            replacement.push(Element { kind, children: after }.into());
        }
        siblings.splice(list_idx..list_idx + 1, replacement);
        run = BlockRun {
            parent: grand_parent,
            first,
            len,
        };
    }
}

/// Wrap the run in a new list container, merging it into an adjacent list of
/// the same kind. Returns the new paths of the run's blocks.
fn wrap_run_in_list(
    nodes: &mut Vec<Node>,
    run: &BlockRun,
    kind: ListKind,
) -> Option<Vec<Vec<usize>>> {
    let list_kind = kind.element_kind();
    let siblings = children_at_mut(nodes, &run.parent)?;
    let items: Vec<Node> = siblings.drain(run.first..run.first + run.len).collect();
    let count = items.len();
    siblings.insert(
        run.first,
        Element {
            kind: list_kind.clone(),
            children: items,
        }
        .into(),
    );

    let same_kind = |node: Option<&Node>| {
        node.and_then(Node::as_element)
            .is_some_and(|element| element.kind == list_kind)
    };
    if same_kind(siblings.get(run.first + 1)) {
        let next = siblings.remove(run.first + 1);
        if let (Some(list), Node::Element(next)) = (siblings[run.first].as_element_mut(), next) {
            list.children.extend(next.children);
        }
    }
    let mut list_idx = run.first;
    let mut item_offset = 0;
    if run.first > 0 && same_kind(siblings.get(run.first - 1)) {
        let current = siblings.remove(run.first);
        list_idx = run.first - 1;
        if let (Some(prev), Node::Element(current)) =
            (siblings[list_idx].as_element_mut(), current)
        {
            item_offset = prev.children.len();
            prev.children.extend(current.children);
        }
    }

    let mut list_path = run.parent.clone();
    list_path.push(list_idx);
    Some(
        (0..count)
            .map(|idx| {
                let mut path = list_path.clone();
                path.push(item_offset + idx);
                path
            })
            .collect(),
    )
}

#[cfg(test)]
#[path = "blocks_tests.rs"]
mod blocks_tests;
