use std::{fmt, ops::Deref};

use crate::document::{
    Document, Element, ElementKind, ListKind, Mark, Marks, Node, Pos, assign_cell_positions,
    clear_table_selection,
};

mod blocks;
mod content;
mod cursor;
mod inline;
mod lists;
mod marks;
mod structure;
mod table;

pub use blocks::BlockKind;
pub use content::{char_to_byte_idx, slice_chars};

use structure::{
    block_path, element_at, element_at_mut, normalize_document, resolve_text_point, text_at,
};

/// Child-index sequence locating a node from the document root.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn parent(&self) -> Option<Path> {
        let (_, parent) = self.0.split_last()?;
        Some(Path(parent.to_vec()))
    }

    pub fn child(&self, idx: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(idx);
        Path(indices)
    }

    pub fn join(&self, rel: &[usize]) -> Path {
        let mut indices = self.0.clone();
        indices.extend_from_slice(rel);
        Path(indices)
    }

    pub fn with_last(&self, idx: usize) -> Path {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = idx;
        }
        Path(indices)
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Path {
    fn from(value: Vec<usize>) -> Self {
        Path(value)
    }
}

impl From<&[usize]> for Path {
    fn from(value: &[usize]) -> Self {
        Path(value.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Path {
    fn from(value: [usize; N]) -> Self {
        Path(value.to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn start(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.anchor
        } else {
            &self.focus
        }
    }

    pub fn end(&self) -> &Point {
        if self.anchor <= self.focus {
            &self.focus
        } else {
            &self.anchor
        }
    }
}

/// Which leaf a character offset resolves to when it sits on a leaf boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affinity {
    Backward,
    Forward,
}

pub struct Editor {
    document: Document,
    selection: Option<Selection>,
    pending_marks: Option<Marks>,
}

impl Editor {
    /// Take ownership of a loaded tree. Stale table highlights are dropped,
    /// inline content is normalized, cell positions are recomputed and the
    /// caret is placed at the start of the document.
    pub fn new(mut document: Document) -> Self {
        clear_table_selection(&mut document.children);
        normalize_document(&mut document);
        recompute_table_positions(&mut document.children);
        let start = structure::first_text_point(&document.children, &[]);
        let mut editor = Self {
            document,
            selection: None,
            pending_marks: None,
        };
        if let Some(point) = start {
            editor.set_selection(Selection::collapsed(point));
        }
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn pending_marks(&self) -> Option<Marks> {
        self.pending_marks
    }

    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        structure::node_at(&self.document.children, path)
    }

    /// Move the selection without touching the tree. The previous selection's
    /// tables lose their highlight and the new one's cell is highlighted.
    pub fn set_selection(&mut self, selection: Selection) -> bool {
        let Some(selection) = self.resolve_selection(selection) else {
            return false;
        };
        if let Some(previous) = self.selection.take() {
            run_deselect_hooks(&mut self.document, &previous);
        }
        run_select_hooks(&mut self.document, &selection);
        self.selection = Some(selection);
        self.pending_marks = None;
        true
    }

    pub fn clear_selection(&mut self) {
        if let Some(previous) = self.selection.take() {
            run_deselect_hooks(&mut self.document, &previous);
        }
        self.pending_marks = None;
    }

    /// Run a structural command: deselect hooks on the current selection,
    /// the mutation, then select hooks on the selection it returns. A
    /// mutation returning `None` must leave the tree untouched.
    pub(crate) fn update_selected<F>(&mut self, mutate: F) -> bool
    where
        F: FnOnce(&mut Document, &Selection) -> Option<Selection>,
    {
        let Some(current) = self.selection.clone() else {
            return false;
        };
        run_deselect_hooks(&mut self.document, &current);
        let Some(target) = mutate(&mut self.document, &current) else {
            run_select_hooks(&mut self.document, &current);
            return false;
        };
        let Some(target) = self.resolve_selection(target) else {
            tracing::warn!("command left no text position to select");
            self.selection = None;
            self.pending_marks = None;
            return true;
        };
        run_select_hooks(&mut self.document, &target);
        self.selection = Some(target);
        self.pending_marks = None;
        true
    }

    fn resolve_selection(&self, selection: Selection) -> Option<Selection> {
        let anchor = self.resolve_point(selection.anchor)?;
        let focus = self.resolve_point(selection.focus)?;
        Some(Selection { anchor, focus })
    }

    fn resolve_point(&self, point: Point) -> Option<Point> {
        let nodes = &self.document.children;
        let resolved = resolve_text_point(nodes, &point)?;
        if resolved != point {
            tracing::warn!(
                "repaired selection point {}:{} to {}:{}",
                point.path,
                point.offset,
                resolved.path,
                resolved.offset
            );
        }
        Some(resolved)
    }

    pub(crate) fn set_pending_marks(&mut self, marks: Option<Marks>) {
        self.pending_marks = marks;
    }

    /// Kinds of every element on the focus's ancestor chain, outermost first.
    pub fn focus_ancestor_kinds(&self) -> Vec<&ElementKind> {
        let Some(selection) = &self.selection else {
            return Vec::new();
        };
        structure::ancestor_paths(&selection.focus.path)
            .filter_map(|prefix| element_at(&self.document.children, prefix))
            .map(|element| &element.kind)
            .collect()
    }

    pub fn focus_block(&self) -> Option<(Path, &Element)> {
        let selection = self.selection.as_ref()?;
        let path = block_path(&self.document.children, &selection.focus.path)?;
        let element = element_at(&self.document.children, &path)?;
        Some((Path::new(path), element))
    }

    /// Character offset of the focus inside its block.
    pub fn focus_block_offset(&self) -> Option<usize> {
        let selection = self.selection.as_ref()?;
        let (_, offset) = structure::point_char_offset(&self.document.children, &selection.focus)?;
        Some(offset)
    }

    pub fn focus_text(&self) -> Option<&str> {
        let selection = self.selection.as_ref()?;
        text_at(&self.document.children, &selection.focus.path).map(|text| text.text.as_str())
    }

    // ------------------------------------------------------------------
    // Marks
    // ------------------------------------------------------------------

    pub fn is_mark_active(&self, mark: Mark) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        marks::is_mark_active(&self.document, selection, self.pending_marks, mark)
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> bool {
        let Some(selection) = self.selection.clone() else {
            return false;
        };
        if selection.is_collapsed() {
            let base = self
                .pending_marks
                .or_else(|| marks::marks_at(&self.document, &selection.focus))
                .unwrap_or_default();
            let mut pending = base;
            pending.set(mark, !base.get(mark));
            tracing::debug!(?mark, enabled = pending.get(mark), "pending mark toggled");
            self.pending_marks = Some(pending);
            return true;
        }
        let active = self.is_mark_active(mark);
        tracing::debug!(?mark, enabled = !active, "toggling mark over range");
        self.update_selected(|document, selection| {
            marks::set_mark_in_range(document, selection, mark, !active)
        })
    }

    // ------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------

    pub fn is_block_active(&self, kind: BlockKind) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        blocks::is_block_active(&self.document, selection, kind)
    }

    pub fn toggle_block(&mut self, kind: BlockKind) -> bool {
        let active = self.is_block_active(kind);
        tracing::debug!(?kind, active, "toggling block");
        self.update_selected(|document, selection| {
            blocks::toggle_block(document, selection, kind, active)
        })
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    /// Number of list containers above the list item holding the focus.
    pub fn list_depth(&self) -> Option<usize> {
        let selection = self.selection.as_ref()?;
        lists::list_depth(&self.document, &selection.focus)
    }

    /// Kind of the innermost list holding the focus.
    pub fn current_list_kind(&self) -> Option<ListKind> {
        let selection = self.selection.as_ref()?;
        lists::innermost_list_kind(&self.document, &selection.focus)
    }

    pub fn at_list_item_start(&self) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        selection.is_collapsed() && lists::at_item_start(&self.document, &selection.focus)
    }

    pub fn in_empty_list_item(&self) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        lists::item_is_empty(&self.document, &selection.focus)
    }

    pub fn indent_list_item(&mut self) -> bool {
        self.update_selected(lists::indent_item)
    }

    pub fn unindent_list_item(&mut self) -> bool {
        self.update_selected(lists::unindent_item)
    }

    /// Turn a paragraph holding only `*` or `<digit>.` into a list item.
    pub fn autoformat_list(&mut self) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        let Some(kind) = lists::autoformat_trigger(&self.document, selection) else {
            return false;
        };
        self.update_selected(|document, selection| {
            lists::clear_trigger(document, selection)
        });
        self.toggle_block(kind)
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    pub fn insert_table(&mut self) -> bool {
        self.update_selected(table::insert_table)
    }

    /// Insert a data row at `index`, counted among data rows only.
    pub fn insert_table_row(&mut self, index: usize) -> bool {
        self.update_selected(|document, selection| {
            table::insert_row(document, selection, index)
        })
    }

    pub fn insert_table_col(&mut self, index: usize) -> bool {
        self.update_selected(|document, selection| {
            table::insert_col(document, selection, index)
        })
    }

    pub fn insert_paragraph(&mut self, path: &[usize]) -> bool {
        self.update_selected(|document, _| table::insert_paragraph(document, path))
    }

    /// Path of the innermost table holding the focus.
    pub fn table_path(&self) -> Option<Path> {
        let selection = self.selection.as_ref()?;
        table::table_path(&self.document, &selection.focus).map(Path::new)
    }

    pub fn selected_table_pos(&self) -> Option<Pos> {
        let path = self.table_path()?;
        match &element_at(&self.document.children, &path)?.kind {
            ElementKind::Table { selected_pos } => *selected_pos,
            _ => None,
        }
    }

    pub fn on_last_cell(&self) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        table::on_last_cell(&self.document, selection)
    }

    pub fn at_table_start(&self) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        table::at_table_start(&self.document, selection)
    }

    // ------------------------------------------------------------------
    // Inline content and paste
    // ------------------------------------------------------------------

    pub fn insert_link(&mut self, href: &str, text: &str) -> bool {
        let link = Element::link(href, text);
        self.update_selected(|document, selection| {
            inline::insert_inline(document, selection, link.into())
        })
    }

    pub fn insert_image(&mut self, url: &str) -> bool {
        let image = Element::image(url);
        self.update_selected(|document, selection| {
            inline::insert_inline(document, selection, image.into())
        })
    }

    /// Insert already converted nodes at the caret.
    pub fn insert_fragment(&mut self, fragment: Vec<Node>) -> bool {
        if fragment.is_empty() {
            return false;
        }
        self.update_selected(|document, selection| {
            inline::insert_fragment(document, selection, fragment)
        })
    }

    pub fn paste_html(&mut self, html: &str) -> bool {
        let fragment = crate::html::deserialize(html);
        tracing::debug!(nodes = fragment.len(), "pasting html fragment");
        self.insert_fragment(fragment)
    }

    // ------------------------------------------------------------------
    // Typing
    // ------------------------------------------------------------------

    pub fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let pending = self.pending_marks;
        self.update_selected(|document, selection| {
            content::insert_text(document, selection, text, pending)
        })
    }

    pub fn delete_backward(&mut self) -> bool {
        self.update_selected(content::delete_backward)
    }

    pub fn insert_break(&mut self) -> bool {
        self.update_selected(content::insert_break)
    }

    pub fn move_left(&mut self) -> bool {
        self.move_with(cursor::previous_point)
    }

    pub fn move_right(&mut self) -> bool {
        self.move_with(cursor::next_point)
    }

    pub fn move_up(&mut self) -> bool {
        self.move_with(cursor::point_above)
    }

    pub fn move_down(&mut self) -> bool {
        self.move_with(cursor::point_below)
    }

    pub fn move_to_start(&mut self) -> bool {
        let Some(point) = structure::first_text_point(&self.document.children, &[]) else {
            return false;
        };
        self.set_selection(Selection::collapsed(point))
    }

    pub fn move_to_end(&mut self) -> bool {
        let Some(point) = structure::last_text_point(&self.document.children, &[]) else {
            return false;
        };
        self.set_selection(Selection::collapsed(point))
    }

    fn move_with(&mut self, step: fn(&Document, &Point) -> Option<Point>) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        let Some(point) = step(&self.document, &selection.focus) else {
            return false;
        };
        self.set_selection(Selection::collapsed(point))
    }
}

fn run_deselect_hooks(document: &mut Document, selection: &Selection) {
    for point in [&selection.anchor, &selection.focus] {
        for len in 1..=point.path.len() {
            let Some(element) = element_at_mut(&mut document.children, &point.path[..len]) else {
                break;
            };
            if let ElementKind::Table { selected_pos } = &mut element.kind {
                *selected_pos = None;
            }
        }
    }
}

fn run_select_hooks(document: &mut Document, selection: &Selection) {
    for point in [&selection.anchor, &selection.focus] {
        let mut table: Option<&[usize]> = None;
        let mut writes: Vec<(Vec<usize>, Pos)> = Vec::new();
        for len in 1..=point.path.len() {
            let prefix = &point.path[..len];
            let Some(element) = element_at(&document.children, prefix) else {
                break;
            };
            if element.kind.is_table() {
                table = Some(prefix);
            }
            if let (Some(table), Some(pos)) = (table, element.kind.cell_pos()) {
                writes.push((table.to_vec(), pos));
            }
        }
        for (table, pos) in writes {
            if let Some(element) = element_at_mut(&mut document.children, &table) {
                if let ElementKind::Table { selected_pos } = &mut element.kind {
                    *selected_pos = Some(pos);
                }
            }
        }
    }
}

pub(crate) fn recompute_table_positions(nodes: &mut [Node]) {
    for node in nodes {
        if let Node::Element(element) = node {
            if element.kind.is_table() {
                assign_cell_positions(element);
            }
            recompute_table_positions(&mut element.children);
        }
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
