use crate::document::{Document, Mark, Marks};

use super::structure::{
    normalize_document, point_at_char, point_char_offset, split_text_leaf, text_at, text_at_mut,
    text_leaf_paths,
};
use super::{Affinity, Point, Selection};

pub(crate) fn marks_at(document: &Document, point: &Point) -> Option<Marks> {
    text_at(&document.children, &point.path).map(|text| text.marks)
}

pub(crate) fn is_mark_active(
    document: &Document,
    selection: &Selection,
    pending: Option<Marks>,
    mark: Mark,
) -> bool {
    if selection.is_collapsed() {
        return pending
            .or_else(|| marks_at(document, &selection.focus))
            .is_some_and(|marks| marks.get(mark));
    }
    let touched = touched_leaves(document, selection);
    if touched.is_empty() {
        return marks_at(document, &selection.focus).is_some_and(|marks| marks.get(mark));
    }
    touched.iter().all(|path| {
        text_at(&document.children, path).is_some_and(|text| text.marks.get(mark))
    })
}

/// Leaves that contribute at least one character to the selected range.
fn touched_leaves(document: &Document, selection: &Selection) -> Vec<Vec<usize>> {
    let start = selection.start();
    let end = selection.end();
    text_leaf_paths(&document.children)
        .into_iter()
        .filter(|path| path.as_slice() >= start.path.as_slice())
        .filter(|path| path.as_slice() <= end.path.as_slice())
        .filter(|path| {
            let Some(text) = text_at(&document.children, path) else {
                return false;
            };
            let from = if path.as_slice() == start.path.as_slice() {
                start.offset
            } else {
                0
            };
            let to = if path.as_slice() == end.path.as_slice() {
                end.offset
            } else {
                text.char_len()
            };
            to > from
        })
        .collect()
}

/// Set or clear `mark` on every character of an expanded selection and
/// return the selection over the same characters after re-normalizing.
pub(crate) fn set_mark_in_range(
    document: &mut Document,
    selection: &Selection,
    mark: Mark,
    value: bool,
) -> Option<Selection> {
    let start = selection.start().clone();
    let end = selection.end().clone();
    let (start_block, start_offset) = point_char_offset(&document.children, &start)?;
    let (end_block, end_offset) = point_char_offset(&document.children, &end)?;
    let start_len = text_at(&document.children, &start.path)?.char_len();

    let end_parent = end.path.parent()?;
    let start_parent = start.path.parent()?;
    let end_idx = split_text_leaf(&mut document.children, &end.path, end.offset)?;
    let start_idx = split_text_leaf(&mut document.children, &start.path, start.offset)?;

    // Splitting the start leaf shifts every later sibling under its parent.
    let range_start = start_parent.child(start_idx);
    let mut range_end = end_parent.child(end_idx).into_vec();
    let depth = start_parent.len();
    if start.offset > 0
        && start.offset < start_len
        && range_end.starts_with(&start_parent)
        && range_end.len() > depth
        && range_end[depth] > start.path[depth]
    {
        range_end[depth] += 1;
    }
    let in_range: Vec<Vec<usize>> = text_leaf_paths(&document.children)
        .into_iter()
        .filter(|path| path.as_slice() >= range_start.as_slice())
        .filter(|path| path.as_slice() < range_end.as_slice())
        .collect();
    for path in &in_range {
        if let Some(text) = text_at_mut(&mut document.children, path) {
            text.marks.set(mark, value);
        }
    }
    normalize_document(document);

    let new_start =
        point_at_char(&document.children, &start_block, start_offset, Affinity::Forward)?;
    let new_end = point_at_char(&document.children, &end_block, end_offset, Affinity::Backward)?;
    if selection.anchor <= selection.focus {
        Some(Selection::new(new_start, new_end))
    } else {
        Some(Selection::new(new_end, new_start))
    }
}

#[cfg(test)]
#[path = "marks_tests.rs"]
mod marks_tests;
