use crate::document::{Document, Element, ElementKind, Marks, Node, Text};

use super::structure::{
    block_char_len, block_path, children_at_mut, element_at, element_at_mut, first_text_point,
    last_text_point, leaf_spans, nearest_ancestor, normalize_document, point_at_char,
    point_char_offset, remove_node_at, split_text_leaf, text_at, text_at_mut, text_leaf_paths,
};
use super::{Affinity, Path, Point, Selection};

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

/// Characters `start..end` of `text`, clamped to its length.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let from = char_to_byte_idx(text, start);
    let to = char_to_byte_idx(text, end.max(start));
    &text[from..to]
}

fn split_text(text: &str, offset: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, offset);
    (text[..byte_idx].to_string(), text[byte_idx..].to_string())
}

fn remove_chars(text: &mut String, start: usize, end: usize) -> bool {
    let from = char_to_byte_idx(text, start);
    let to = char_to_byte_idx(text, end);
    if from >= to {
        return false;
    }
    text.drain(from..to);
    true
}

/// Insert `text` at the caret. Pending marks that differ from the leaf's
/// marks put the text into a leaf of its own.
pub(crate) fn insert_text(
    document: &mut Document,
    selection: &Selection,
    text: &str,
    pending: Option<Marks>,
) -> Option<Selection> {
    let point = &selection.focus;
    let (block, char_offset) = point_char_offset(&document.children, point)?;
    let leaf_marks = text_at(&document.children, &point.path)?.marks;
    let inserted = text.chars().count();

    match pending {
        Some(marks) if marks != leaf_marks => {
            let parent = point.path.parent()?;
            let idx = split_text_leaf(&mut document.children, &point.path, point.offset)?;
            let siblings = children_at_mut(&mut document.children, &parent)?;
            siblings.insert(idx, Text::new(text).with_marks(marks).into());
        }
        _ => {
            let leaf = text_at_mut(&mut document.children, &point.path)?;
            let byte_idx = char_to_byte_idx(&leaf.text, point.offset);
            leaf.text.insert_str(byte_idx, text);
        }
    }
    normalize_document(document);
    let target = point_at_char(
        &document.children,
        &block,
        char_offset + inserted,
        Affinity::Backward,
    )?;
    Some(Selection::collapsed(target))
}

/// Remove the characters `start..end` of a block, dropping links that end up
/// without text.
fn delete_block_range(document: &mut Document, block: &[usize], start: usize, end: usize) -> bool {
    let Some(element) = element_at_mut(&mut document.children, block) else {
        return false;
    };
    let mut changed = false;
    for span in leaf_spans(element).into_iter().rev() {
        if span.end() <= start || span.start >= end {
            continue;
        }
        let from = start.saturating_sub(span.start);
        let to = (end - span.start).min(span.len);
        if let Some(text) = text_at_mut(&mut element.children, &span.rel) {
            changed |= remove_chars(&mut text.text, from, to);
        }
    }
    drop_empty_links(&mut element.children);
    changed
}

fn drop_empty_links(children: &mut Vec<Node>) {
    children.retain(|child| match child {
        Node::Element(element) if matches!(element.kind, ElementKind::Link { .. }) => {
            !element.is_empty()
        }
        _ => true,
    });
    for child in children.iter_mut() {
        if let Node::Element(element) = child {
            if element.kind.is_inline() && !element.kind.is_void() {
                drop_empty_links(&mut element.children);
            }
        }
    }
}

pub(crate) fn delete_backward(document: &mut Document, selection: &Selection) -> Option<Selection> {
    if !selection.is_collapsed() {
        return delete_range(document, selection);
    }
    let point = &selection.focus;
    let (block, char_offset) = point_char_offset(&document.children, point)?;

    if point.offset == 0 {
        if let Some(target) = delete_void_before(document, point, &block, char_offset) {
            return Some(target);
        }
    }
    if char_offset > 0 {
        if !delete_block_range(document, &block, char_offset - 1, char_offset) {
            return None;
        }
        normalize_document(document);
        let target =
            point_at_char(&document.children, &block, char_offset - 1, Affinity::Backward)?;
        return Some(Selection::collapsed(target));
    }
    merge_into_previous_block(document, point, &block)
}

fn delete_range(document: &mut Document, selection: &Selection) -> Option<Selection> {
    let (start_block, start) = point_char_offset(&document.children, selection.start())?;
    let (end_block, end) = point_char_offset(&document.children, selection.end())?;
    if start_block != end_block {
        return None;
    }
    delete_block_range(document, &start_block, start, end);
    normalize_document(document);
    let target = point_at_char(&document.children, &start_block, start, Affinity::Backward)?;
    Some(Selection::collapsed(target))
}

/// Backspace right after an image removes the image.
fn delete_void_before(
    document: &mut Document,
    point: &Point,
    block: &[usize],
    char_offset: usize,
) -> Option<Selection> {
    let (idx, parent) = point.path.split_last()?;
    let before = idx.checked_sub(1)?;
    let mut sibling = parent.to_vec();
    sibling.push(before);
    if !element_at(&document.children, &sibling).is_some_and(|element| element.kind.is_void()) {
        return None;
    }
    remove_node_at(&mut document.children, &sibling)?;
    normalize_document(document);
    let target = point_at_char(&document.children, block, char_offset, Affinity::Backward)?;
    Some(Selection::collapsed(target))
}

fn is_in_cell(document: &Document, path: &[usize]) -> bool {
    nearest_ancestor(&document.children, path, ElementKind::is_table_cell).is_some()
}

/// Backspace at the start of a block appends its content to the block before it.
fn merge_into_previous_block(
    document: &mut Document,
    point: &Point,
    block: &[usize],
) -> Option<Selection> {
    if is_in_cell(document, block) {
        return None;
    }
    let leaves = text_leaf_paths(&document.children);
    let previous_leaf = leaves
        .iter()
        .rev()
        .find(|leaf| leaf.as_slice() < point.path.as_slice() && !leaf.starts_with(block))?;
    let previous_block = block_path(&document.children, previous_leaf)?;

    if is_in_cell(document, &previous_block) {
        let current = element_at(&document.children, block)?;
        if !current.is_empty() {
            return None;
        }
        remove_block(document, block);
        let target = last_text_point(&document.children, &previous_block)?;
        return Some(Selection::collapsed(target));
    }

    let previous_len = block_char_len(element_at(&document.children, &previous_block)?);
    let Some(Node::Element(current)) = remove_block(document, block) else {
        return None;
    };
    let previous = element_at_mut(&mut document.children, &previous_block)?;
    previous.children.extend(current.children);
    normalize_document(document);
    tracing::debug!(block = ?block, into = ?previous_block, "merged block backward");
    let target = point_at_char(
        &document.children,
        &previous_block,
        previous_len,
        Affinity::Backward,
    )?;
    Some(Selection::collapsed(target))
}

/// Remove the block at `path` and any list containers left empty by it.
fn remove_block(document: &mut Document, path: &[usize]) -> Option<Node> {
    let removed = remove_node_at(&mut document.children, path)?;
    let mut parent = Path::from(path).parent();
    while let Some(current) = parent {
        let empty_list = element_at(&document.children, &current)
            .is_some_and(|element| element.kind.is_list() && element.children.is_empty());
        if !empty_list {
            break;
        }
        remove_node_at(&mut document.children, &current);
        parent = current.parent();
    }
    if document.children.is_empty() {
        document.children.push(Element::empty(ElementKind::Paragraph).into());
    }
    Some(removed)
}

/// Split `children` at the leaf addressed by `rel`, returning everything
/// after the split point. Inline elements on the way are split too.
fn split_inline_children(children: &mut Vec<Node>, rel: &[usize], offset: usize) -> Vec<Node> {
    let Some((&idx, rest)) = rel.split_first() else {
        return Vec::new();
    };
    if idx >= children.len() {
        return Vec::new();
    }
    let mut trailing = children.split_off(idx + 1);
    let head = match &mut children[idx] {
        Node::Text(text) => {
            let (left, right) = split_text(&text.text, offset);
            text.text = left;
            Some(Node::Text(Text {
                text: right,
                marks: text.marks,
            }))
        }
        Node::Element(element) => {
            let tail = split_inline_children(&mut element.children, rest, offset);
            element.ensure_child();
            Some(Element::new(element.kind.clone(), tail).into())
        }
    };
    if let Some(head) = head {
        trailing.insert(0, head);
    }
    trailing
}

/// Split the block holding the caret in two; the new block keeps its kind.
pub(crate) fn insert_break(document: &mut Document, selection: &Selection) -> Option<Selection> {
    let point = &selection.focus;
    let block = block_path(&document.children, &point.path)?;
    if is_in_cell(document, &block) {
        return None;
    }
    let rel = point.path[block.len()..].to_vec();
    let element = element_at_mut(&mut document.children, &block)?;
    let tail = split_inline_children(&mut element.children, &rel, point.offset);
    let next = Element::new(element.kind.clone(), tail);
    element.ensure_child();

    let (idx, parent) = block.split_last()?;
    let siblings = children_at_mut(&mut document.children, parent)?;
    siblings.insert(idx + 1, next.into());
    normalize_document(document);

    let mut next_path = parent.to_vec();
    next_path.push(idx + 1);
    let target = first_text_point(&document.children, &next_path)?;
    Some(Selection::collapsed(target))
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod content_tests;
