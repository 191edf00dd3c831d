use crate::document::Document;

use super::structure::{
    block_char_len, block_path, element_at, point_at_char, point_char_offset, text_leaf_paths,
};
use super::{Affinity, Point};

/// Paths of every block holding editable text, in document order.
pub(crate) fn text_blocks(document: &Document) -> Vec<Vec<usize>> {
    let mut blocks: Vec<Vec<usize>> = Vec::new();
    for leaf in text_leaf_paths(&document.children) {
        let Some(block) = block_path(&document.children, &leaf) else {
            continue;
        };
        if blocks.last() != Some(&block) {
            blocks.push(block);
        }
    }
    blocks
}

fn neighbour_block(document: &Document, block: &[usize], forward: bool) -> Option<Vec<usize>> {
    let blocks = text_blocks(document);
    let idx = blocks.iter().position(|candidate| candidate.as_slice() == block)?;
    if forward {
        blocks.get(idx + 1).cloned()
    } else {
        blocks.get(idx.checked_sub(1)?).cloned()
    }
}

fn block_len(document: &Document, block: &[usize]) -> Option<usize> {
    element_at(&document.children, block).map(block_char_len)
}

pub(crate) fn next_point(document: &Document, point: &Point) -> Option<Point> {
    let (block, offset) = point_char_offset(&document.children, point)?;
    if offset < block_len(document, &block)? {
        return point_at_char(&document.children, &block, offset + 1, Affinity::Backward);
    }
    let next = neighbour_block(document, &block, true)?;
    point_at_char(&document.children, &next, 0, Affinity::Backward)
}

pub(crate) fn previous_point(document: &Document, point: &Point) -> Option<Point> {
    let (block, offset) = point_char_offset(&document.children, point)?;
    if offset > 0 {
        return point_at_char(&document.children, &block, offset - 1, Affinity::Backward);
    }
    let previous = neighbour_block(document, &block, false)?;
    let len = block_len(document, &previous)?;
    point_at_char(&document.children, &previous, len, Affinity::Backward)
}

fn vertical_point(document: &Document, point: &Point, forward: bool) -> Option<Point> {
    let (block, offset) = point_char_offset(&document.children, point)?;
    let target = neighbour_block(document, &block, forward)?;
    let len = block_len(document, &target)?;
    point_at_char(&document.children, &target, offset.min(len), Affinity::Backward)
}

pub(crate) fn point_above(document: &Document, point: &Point) -> Option<Point> {
    vertical_point(document, point, false)
}

pub(crate) fn point_below(document: &Document, point: &Point) -> Option<Point> {
    vertical_point(document, point, true)
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod cursor_tests;
