use crate::document::{Document, Element, ElementKind, Node};

use super::structure::{
    block_path, children_at, children_at_mut, element_at, last_text_point, leaf_spans,
    nearest_ancestor, normalize_document, point_at_char, point_char_offset, split_text_leaf,
};
use super::{Affinity, Point, Selection, recompute_table_positions};

/// Characters a node contributes to its block; void elements contribute none.
fn char_len(node: &Node) -> usize {
    match node {
        Node::Text(text) => text.char_len(),
        Node::Element(element) if element.kind.is_void() => 0,
        Node::Element(element) => element.children.iter().map(char_len).sum(),
    }
}

/// Where inline nodes land for a caret at `point`: the parent path, the child
/// index and the block character offset of that spot.
fn inline_insertion_spot(
    document: &mut Document,
    point: &Point,
) -> Option<(Vec<usize>, usize, usize)> {
    let nodes = &document.children;
    let block = block_path(nodes, &point.path)?;
    let link = nearest_ancestor(nodes, &point.path, |kind| {
        matches!(kind, ElementKind::Link { .. })
    });
    if let Some(link) = link {
        let block_element = element_at(nodes, &block)?;
        let link_rel = &link[block.len()..];
        let link_end = leaf_spans(block_element)
            .into_iter()
            .filter(|span| span.rel.starts_with(link_rel))
            .map(|span| span.end())
            .max()?;
        let (idx, parent) = link.split_last()?;
        return Some((parent.to_vec(), idx + 1, link_end));
    }

    let (_, char_offset) = point_char_offset(nodes, point)?;
    let parent = point.path.parent()?.into_vec();
    let idx = split_text_leaf(&mut document.children, &point.path, point.offset)?;
    Some((parent, idx, char_offset))
}

/// Insert a link or image at the caret and land in the text leaf after it.
pub(crate) fn insert_inline(
    document: &mut Document,
    selection: &Selection,
    node: Node,
) -> Option<Selection> {
    if !node.is_inline_element() {
        return None;
    }
    insert_inline_nodes(document, &selection.focus, vec![node])
}

fn insert_inline_nodes(
    document: &mut Document,
    point: &Point,
    nodes: Vec<Node>,
) -> Option<Selection> {
    let ends_with_element = nodes.last()?.is_inline_element();
    let block = block_path(&document.children, &point.path)?;
    let inserted: usize = nodes.iter().map(char_len).sum();
    let count = nodes.len();
    let (parent, idx, char_offset) = inline_insertion_spot(document, point)?;
    let siblings = children_at_mut(&mut document.children, &parent)?;
    let at = idx.min(siblings.len());
    siblings.splice(at..at, nodes);
    let elements_before = siblings[..at + count - 1]
        .iter()
        .filter(|node| !node.is_text())
        .count();
    normalize_document(document);

    if !ends_with_element {
        let target = point_at_char(
            &document.children,
            &block,
            char_offset + inserted,
            Affinity::Backward,
        )?;
        return Some(Selection::collapsed(target));
    }

    // Normalization merges and pads text leaves but keeps every element in order.
    let (element_idx, _) = children_at(&document.children, &parent)?
        .iter()
        .enumerate()
        .filter(|(_, node)| !node.is_text())
        .nth(elements_before)?;
    let mut path = parent;
    path.push(element_idx + 1);
    Some(Selection::collapsed(Point::new(path, 0)))
}

/// Insert converted paste content at the caret.
pub(crate) fn insert_fragment(
    document: &mut Document,
    selection: &Selection,
    fragment: Vec<Node>,
) -> Option<Selection> {
    if fragment.iter().all(Node::is_inline) {
        return insert_inline_nodes(document, &selection.focus, fragment);
    }
    insert_block_fragment(document, &selection.focus, fragment)
}

/// Group loose inline runs into paragraphs and stray items into a list.
fn into_blocks(fragment: Vec<Node>) -> Vec<Node> {
    let mut blocks: Vec<Node> = Vec::new();
    let mut inline_run: Vec<Node> = Vec::new();
    for node in fragment {
        if node.is_inline() {
            inline_run.push(node);
            continue;
        }
        if !inline_run.is_empty() {
            blocks.push(Element::paragraph(std::mem::take(&mut inline_run)).into());
        }
        match node {
            Node::Element(element) if element.kind == ElementKind::ListItem => {
                match blocks.last_mut().and_then(Node::as_element_mut) {
                    Some(list) if list.kind == ElementKind::UnorderedList => {
                        list.children.push(element.into())
                    }
                    _ => blocks.push(
                        Element::new(ElementKind::UnorderedList, vec![element.into()]).into(),
                    ),
                }
            }
            other => blocks.push(other),
        }
    }
    if !inline_run.is_empty() {
        blocks.push(Element::paragraph(inline_run).into());
    }
    blocks
}

fn insert_block_fragment(
    document: &mut Document,
    point: &Point,
    fragment: Vec<Node>,
) -> Option<Selection> {
    let top = *point.path.first()?;
    let blocks = into_blocks(fragment);
    let count = blocks.len();
    if count == 0 {
        return None;
    }
    let replace = document
        .children
        .get(top)
        .and_then(Node::as_element)
        .is_some_and(|element| element.kind == ElementKind::Paragraph && element.is_empty());
    let at = (if replace { top } else { top + 1 }).min(document.children.len());
    let end = if replace { at + 1 } else { at };
    document.children.splice(at..end, blocks);
    normalize_document(document);
    recompute_table_positions(&mut document.children);
    tracing::debug!(at, count, replace, "inserted block fragment");
    let target = last_text_point(&document.children, &[at + count - 1])?;
    Some(Selection::collapsed(target))
}

#[cfg(test)]
#[path = "inline_tests.rs"]
mod inline_tests;
