use crate::document::{Document, Element, ElementKind, Node, Text};

use super::{Affinity, Point};

// ============================================================================
// Path lookup
// ============================================================================

pub(crate) fn node_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Node> {
    let (first, rest) = path.split_first()?;
    let mut node = nodes.get(*first)?;
    for idx in rest {
        node = node.as_element()?.children.get(*idx)?;
    }
    Some(node)
}

pub(crate) fn node_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let mut node = nodes.get_mut(*first)?;
    for idx in rest {
        node = node.as_element_mut()?.children.get_mut(*idx)?;
    }
    Some(node)
}

pub(crate) fn element_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Element> {
    node_at(nodes, path)?.as_element()
}

pub(crate) fn element_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Element> {
    node_at_mut(nodes, path)?.as_element_mut()
}

pub(crate) fn text_at<'a>(nodes: &'a [Node], path: &[usize]) -> Option<&'a Text> {
    node_at(nodes, path)?.as_text()
}

pub(crate) fn text_at_mut<'a>(nodes: &'a mut [Node], path: &[usize]) -> Option<&'a mut Text> {
    node_at_mut(nodes, path)?.as_text_mut()
}

/// Children of the node at `parent`; the empty path addresses the document root.
pub(crate) fn children_at<'a>(nodes: &'a [Node], parent: &[usize]) -> Option<&'a [Node]> {
    if parent.is_empty() {
        return Some(nodes);
    }
    Some(&element_at(nodes, parent)?.children)
}

pub(crate) fn children_at_mut<'a>(
    nodes: &'a mut Vec<Node>,
    parent: &[usize],
) -> Option<&'a mut Vec<Node>> {
    if parent.is_empty() {
        return Some(nodes);
    }
    Some(&mut element_at_mut(nodes, parent)?.children)
}

pub(crate) fn insert_node_at(nodes: &mut Vec<Node>, path: &[usize], node: Node) -> bool {
    let Some((idx, parent)) = path.split_last() else {
        return false;
    };
    let Some(children) = children_at_mut(nodes, parent) else {
        return false;
    };
    if *idx > children.len() {
        return false;
    }
    children.insert(*idx, node);
    true
}

pub(crate) fn remove_node_at(nodes: &mut Vec<Node>, path: &[usize]) -> Option<Node> {
    let (idx, parent) = path.split_last()?;
    let children = children_at_mut(nodes, parent)?;
    if *idx >= children.len() {
        return None;
    }
    Some(children.remove(*idx))
}

/// Element paths from the root down to (excluding) `path`.
pub(crate) fn ancestor_paths(path: &[usize]) -> impl Iterator<Item = &[usize]> {
    (1..path.len()).map(move |len| &path[..len])
}

/// Nearest element on the ancestor chain of `path` (including `path` itself)
/// whose kind satisfies `predicate`.
pub(crate) fn nearest_ancestor(
    nodes: &[Node],
    path: &[usize],
    predicate: impl Fn(&ElementKind) -> bool,
) -> Option<Vec<usize>> {
    (1..=path.len()).rev().find_map(|len| {
        let candidate = &path[..len];
        let element = element_at(nodes, candidate)?;
        predicate(&element.kind).then(|| candidate.to_vec())
    })
}

/// The innermost non-inline element holding the node at `path`.
pub(crate) fn block_path(nodes: &[Node], path: &[usize]) -> Option<Vec<usize>> {
    nearest_ancestor(nodes, path, |kind| !kind.is_inline())
}

pub(crate) fn inside_void(nodes: &[Node], path: &[usize]) -> bool {
    ancestor_paths(path)
        .any(|prefix| element_at(nodes, prefix).is_some_and(|element| element.kind.is_void()))
}

// ============================================================================
// Character offsets within a block
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LeafSpan {
    /// Path of the leaf relative to its block.
    pub rel: Vec<usize>,
    pub start: usize,
    pub len: usize,
}

impl LeafSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Editable text leaves of `block` in document order with their character
/// ranges. Void elements contribute nothing.
pub(crate) fn leaf_spans(block: &Element) -> Vec<LeafSpan> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    let mut prefix = Vec::new();
    collect_leaf_spans(&block.children, &mut prefix, &mut cursor, &mut spans);
    spans
}

fn collect_leaf_spans(
    children: &[Node],
    prefix: &mut Vec<usize>,
    cursor: &mut usize,
    out: &mut Vec<LeafSpan>,
) {
    for (idx, child) in children.iter().enumerate() {
        prefix.push(idx);
        match child {
            Node::Text(text) => {
                let len = text.char_len();
                out.push(LeafSpan {
                    rel: prefix.clone(),
                    start: *cursor,
                    len,
                });
                *cursor += len;
            }
            Node::Element(element) if element.kind.is_void() => {}
            Node::Element(element) => collect_leaf_spans(&element.children, prefix, cursor, out),
        }
        prefix.pop();
    }
}

pub(crate) fn block_char_len(block: &Element) -> usize {
    leaf_spans(block).last().map(LeafSpan::end).unwrap_or(0)
}

/// Character offset inside `block` of a leaf position given relative to it.
pub(crate) fn char_offset_in_block(block: &Element, rel: &[usize], offset: usize) -> Option<usize> {
    leaf_spans(block)
        .into_iter()
        .find(|span| span.rel == rel)
        .map(|span| span.start + offset.min(span.len))
}

/// Character offset of `point` inside the block that holds it.
pub(crate) fn point_char_offset(nodes: &[Node], point: &Point) -> Option<(Vec<usize>, usize)> {
    let block = block_path(nodes, &point.path)?;
    let element = element_at(nodes, &block)?;
    let offset = char_offset_in_block(element, &point.path[block.len()..], point.offset)?;
    Some((block, offset))
}

/// Map a character offset inside the block at `block_path` back to a text
/// position. When the offset sits on a leaf boundary, `Backward` picks the
/// leaf ending there and `Forward` the one starting there.
pub(crate) fn point_at_char(
    nodes: &[Node],
    block_path: &[usize],
    char_offset: usize,
    affinity: Affinity,
) -> Option<Point> {
    let block = element_at(nodes, block_path)?;
    let spans = leaf_spans(block);
    let total = spans.last().map(LeafSpan::end).unwrap_or(0);
    let target = char_offset.min(total);
    let mut candidates = spans
        .iter()
        .filter(|span| span.start <= target && target <= span.end());
    let span = match affinity {
        Affinity::Backward => candidates.next(),
        Affinity::Forward => candidates.last(),
    }?;
    let mut path = block_path.to_vec();
    path.extend_from_slice(&span.rel);
    Some(Point::new(path, target - span.start))
}

// ============================================================================
// Text positions across the document
// ============================================================================

/// Every editable text leaf of the tree in document order.
pub(crate) fn text_leaf_paths(nodes: &[Node]) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    collect_text_leaf_paths(nodes, &mut prefix, &mut out);
    out
}

fn collect_text_leaf_paths(nodes: &[Node], prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (idx, node) in nodes.iter().enumerate() {
        prefix.push(idx);
        match node {
            Node::Text(_) => out.push(prefix.clone()),
            Node::Element(element) if element.kind.is_void() => {}
            Node::Element(element) => collect_text_leaf_paths(&element.children, prefix, out),
        }
        prefix.pop();
    }
}

pub(crate) fn first_text_point(nodes: &[Node], path: &[usize]) -> Option<Point> {
    let leaf = text_leaf_paths(nodes)
        .into_iter()
        .find(|leaf| leaf.starts_with(path))?;
    Some(Point::new(leaf, 0))
}

pub(crate) fn last_text_point(nodes: &[Node], path: &[usize]) -> Option<Point> {
    let leaf = text_leaf_paths(nodes)
        .into_iter()
        .rev()
        .find(|leaf| leaf.starts_with(path))?;
    let len = text_at(nodes, &leaf)?.char_len();
    Some(Point::new(leaf, len))
}

/// Resolve `point` to a valid text position: the same leaf with a clamped
/// offset, the first leaf under the addressed element, or the closest leaf
/// before it in document order.
pub(crate) fn resolve_text_point(nodes: &[Node], point: &Point) -> Option<Point> {
    if !inside_void(nodes, &point.path) {
        if let Some(text) = text_at(nodes, &point.path) {
            return Some(Point::new(point.path.clone(), point.offset.min(text.char_len())));
        }
        if element_at(nodes, &point.path).is_some() {
            if let Some(found) = first_text_point(nodes, &point.path) {
                return Some(found);
            }
        }
    }
    let leaves = text_leaf_paths(nodes);
    let before = leaves
        .iter()
        .rev()
        .find(|leaf| leaf.as_slice() <= point.path.as_slice());
    let leaf = before.or_else(|| leaves.first())?;
    let len = text_at(nodes, leaf)?.char_len();
    let offset = if before.is_some() { len } else { 0 };
    Some(Point::new(leaf.clone(), offset))
}

// ============================================================================
// Normalization
// ============================================================================

pub(crate) fn ensure_document_initialized(document: &mut Document) {
    if document.children.is_empty() {
        document
            .children
            .push(Element::empty(ElementKind::Paragraph).into());
    }
}

pub(crate) fn normalize_document(document: &mut Document) {
    for node in &mut document.children {
        if let Node::Element(element) = node {
            normalize_element(element);
        }
    }
    ensure_document_initialized(document);
}

pub(crate) fn normalize_element(element: &mut Element) {
    if element.kind.is_void() {
        element.ensure_child();
        return;
    }
    if element.kind.holds_inline_content() || element.kind.is_inline() {
        normalize_inline_children(&mut element.children);
    } else {
        for child in element.child_elements_mut() {
            normalize_element(child);
        }
    }
    element.ensure_child();
}

/// Merge equal-mark neighbours, drop empty leaves that sit next to another
/// leaf, and pad inline elements with text on both sides.
pub(crate) fn normalize_inline_children(children: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(children.len());
    for mut child in children.drain(..) {
        if let Node::Element(element) = &mut child {
            normalize_element(element);
        }
        if let (Node::Text(next), Some(Node::Text(prev))) = (&child, merged.last_mut()) {
            if prev.marks == next.marks {
                prev.text.push_str(&next.text);
                continue;
            }
            if next.is_empty() {
                continue;
            }
            if prev.is_empty() {
                *prev = next.clone();
                continue;
            }
        }
        merged.push(child);
    }

    let mut padded: Vec<Node> = Vec::with_capacity(merged.len() + 2);
    for child in merged {
        if child.is_inline_element() && !padded.last().is_some_and(Node::is_text) {
            padded.push(Node::text(""));
        }
        padded.push(child);
    }
    if padded.last().is_some_and(Node::is_inline_element) {
        padded.push(Node::text(""));
    }
    if padded.is_empty() {
        padded.push(Node::text(""));
    }
    *children = padded;
}

/// Split the text leaf at `path` so that a leaf boundary falls on `offset`.
/// Returns the index of the leaf starting at `offset`.
pub(crate) fn split_text_leaf(nodes: &mut [Node], path: &[usize], offset: usize) -> Option<usize> {
    let (idx, parent) = path.split_last()?;
    let parent_element = element_at_mut(nodes, parent)?;
    let text = parent_element.children.get_mut(*idx)?.as_text_mut()?;
    let len = text.char_len();
    if offset == 0 {
        return Some(*idx);
    }
    if offset >= len {
        return Some(idx + 1);
    }
    let byte_idx = super::content::char_to_byte_idx(&text.text, offset);
    let tail = Text {
        text: text.text.split_off(byte_idx),
        marks: text.marks,
    };
    parent_element.children.insert(idx + 1, tail.into());
    Some(idx + 1)
}

#[cfg(test)]
#[path = "structure_tests.rs"]
mod structure_tests;
