use std::sync::OnceLock;

use regex::Regex;

use crate::document::{Document, Element, ElementKind, ListKind, Node};

use super::blocks::BlockKind;
use super::structure::{
    children_at_mut, element_at, element_at_mut, nearest_ancestor, point_char_offset,
    remove_node_at,
};
use super::{Path, Point, Selection};

fn ordered_trigger_regex() -> &'static Regex {
    static ORDERED_TRIGGER: OnceLock<Regex> = OnceLock::new();
    ORDERED_TRIGGER.get_or_init(|| Regex::new(r"^[0-9]\.$").expect("Invalid list trigger regex"))
}

pub(crate) fn item_path(document: &Document, point: &Point) -> Option<Vec<usize>> {
    nearest_ancestor(&document.children, &point.path, |kind| {
        *kind == ElementKind::ListItem
    })
}

pub(crate) fn list_depth(document: &Document, point: &Point) -> Option<usize> {
    let item = item_path(document, point)?;
    let depth = (1..item.len())
        .filter(|len| {
            element_at(&document.children, &item[..*len])
                .is_some_and(|element| element.kind.is_list())
        })
        .count();
    Some(depth)
}

/// Kind of the innermost list holding the point.
pub(crate) fn innermost_list_kind(document: &Document, point: &Point) -> Option<ListKind> {
    let list = nearest_ancestor(&document.children, &point.path, ElementKind::is_list)?;
    element_at(&document.children, &list)?.kind.list_kind()
}

pub(crate) fn at_item_start(document: &Document, point: &Point) -> bool {
    let Some(item) = item_path(document, point) else {
        return false;
    };
    let Some((block, offset)) = point_char_offset(&document.children, point) else {
        return false;
    };
    block == item && offset == 0
}

pub(crate) fn item_is_empty(document: &Document, point: &Point) -> bool {
    let Some(item) = item_path(document, point) else {
        return false;
    };
    element_at(&document.children, &item).is_some_and(Element::is_empty)
}

fn relocate(point: &Point, from: &[usize], to: &[usize]) -> Option<Point> {
    if !point.path.starts_with(from) {
        return None;
    }
    Some(Point::new(Path::from(to).join(&point.path[from.len()..]), point.offset))
}

fn relocated_selection(selection: &Selection, from: &[usize], to: &[usize]) -> Option<Selection> {
    let focus = relocate(&selection.focus, from, to)?;
    let anchor = relocate(&selection.anchor, from, to).unwrap_or_else(|| focus.clone());
    Some(Selection::new(anchor, focus))
}

/// Wrap the focused item in a nested list of its list's kind.
pub(crate) fn indent_item(document: &mut Document, selection: &Selection) -> Option<Selection> {
    let item = item_path(document, &selection.focus)?;
    let (_, list_path) = item.split_last()?;
    let list_kind = element_at(&document.children, list_path)?.kind.clone();
    if !list_kind.is_list() {
        return None;
    }
    let node = remove_node_at(&mut document.children, &item)?;
    let siblings = children_at_mut(&mut document.children, list_path)?;
    let idx = item[item.len() - 1];
    siblings.insert(
        idx,
        Element {
            kind: list_kind,
            children: vec![node],
        }
        .into(),
    );
    tracing::debug!(item = ?item, "indented list item");
    let mut nested = item.clone();
    nested.push(0);
    relocated_selection(selection, &item, &nested)
}

/// Nested items lose one list level; top-level items leave the list as a
/// paragraph placed right after it.
pub(crate) fn unindent_item(document: &mut Document, selection: &Selection) -> Option<Selection> {
    let item = item_path(document, &selection.focus)?;
    let depth = list_depth(document, &selection.focus)?;
    let (item_idx, list_path) = item.split_last()?;
    let (list_idx, outer_path) = list_path.split_last()?;
    let item_idx = *item_idx;
    let list_idx = *list_idx;
    if !element_at(&document.children, list_path).is_some_and(|element| element.kind.is_list()) {
        return None;
    }

    if depth > 1 {
        let Some(Node::Element(list)) = remove_node_at(&mut document.children, list_path) else {
            return None;
        };
        let siblings = children_at_mut(&mut document.children, outer_path)?;
        siblings.splice(list_idx..list_idx, list.children);
        let mut target = outer_path.to_vec();
        target.push(list_idx + item_idx);
        tracing::debug!(item = ?item, depth, "unwrapped nested list");
        return relocated_selection(selection, &item, &target);
    }

    let Some(Node::Element(mut paragraph)) = remove_node_at(&mut document.children, &item) else {
        return None;
    };
    paragraph.kind = ElementKind::Paragraph;
    let list_emptied = element_at(&document.children, list_path)
        .is_some_and(|list| list.children.is_empty());
    let insert_idx = if list_emptied {
        remove_node_at(&mut document.children, list_path);
        list_idx
    } else {
        list_idx + 1
    };
    let siblings = children_at_mut(&mut document.children, outer_path)?;
    siblings.insert(insert_idx, paragraph.into());
    let mut target = outer_path.to_vec();
    target.push(insert_idx);
    tracing::debug!(item = ?item, "moved list item out of its list");
    relocated_selection(selection, &item, &target)
}

/// The list kind a paragraph holding only `*` or `<digit>.` converts to when
/// a space is typed at its end.
pub(crate) fn autoformat_trigger(document: &Document, selection: &Selection) -> Option<BlockKind> {
    if !selection.is_collapsed() {
        return None;
    }
    let (block, offset) = point_char_offset(&document.children, &selection.focus)?;
    let paragraph = element_at(&document.children, &block)?;
    if paragraph.kind != ElementKind::Paragraph {
        return None;
    }
    let text = paragraph.plain_text();
    if offset != text.chars().count() {
        return None;
    }
    if text == "*" {
        Some(BlockKind::UnorderedList)
    } else if ordered_trigger_regex().is_match(&text) {
        Some(BlockKind::OrderedList)
    } else {
        None
    }
}

/// Empty the focused block, keeping the caret in its single leaf.
pub(crate) fn clear_trigger(document: &mut Document, selection: &Selection) -> Option<Selection> {
    let (block, _) = point_char_offset(&document.children, &selection.focus)?;
    let element = element_at_mut(&mut document.children, &block)?;
    element.children = vec![Node::text("")];
    let mut path = block;
    path.push(0);
    Some(Selection::collapsed(Point::new(path, 0)))
}

#[cfg(test)]
#[path = "lists_tests.rs"]
mod lists_tests;
