use crate::document::{Document, Element, ElementKind, Node, Pos, assign_cell_positions};

use super::structure::{
    children_at_mut, element_at, element_at_mut, insert_node_at, nearest_ancestor,
    point_char_offset,
};
use super::{Point, Selection};

/// Index of the head section inside a table.
const HEAD: usize = 0;
/// Index of the body section inside a table.
const BODY: usize = 1;

fn empty_cell(kind: ElementKind) -> Node {
    Element::empty(kind).into()
}

fn header_cell() -> Node {
    empty_cell(ElementKind::TableHeader { pos: (0, 0) })
}

fn data_cell() -> Node {
    empty_cell(ElementKind::TableData { pos: (0, 0) })
}

fn row(cells: Vec<Node>) -> Node {
    Element::new(ElementKind::TableRow, cells).into()
}

/// One header row and one data row, two columns each.
pub(crate) fn new_table() -> Element {
    let mut table = Element::new(
        ElementKind::Table { selected_pos: None },
        vec![
            Element::new(ElementKind::TableHead, vec![row(vec![header_cell(), header_cell()])])
                .into(),
            Element::new(ElementKind::TableBody, vec![row(vec![data_cell(), data_cell()])]).into(),
        ],
    );
    assign_cell_positions(&mut table);
    table
}

pub(crate) fn table_path(document: &Document, point: &Point) -> Option<Vec<usize>> {
    nearest_ancestor(&document.children, &point.path, ElementKind::is_table)
}

fn table_at<'a>(document: &'a Document, path: &[usize]) -> Option<&'a Element> {
    element_at(&document.children, path).filter(|element| element.kind.is_table())
}

fn selected_pos(table: &Element) -> Option<Pos> {
    match table.kind {
        ElementKind::Table { selected_pos } => selected_pos,
        _ => None,
    }
}

fn section<'a>(table: &'a Element, idx: usize) -> Option<&'a Element> {
    table.children.get(idx)?.as_element()
}

pub(crate) fn insert_table(document: &mut Document, selection: &Selection) -> Option<Selection> {
    let top = *selection.focus.path.first()?;
    let replace = document
        .children
        .get(top)
        .and_then(Node::as_element)
        .is_some_and(|element| element.kind == ElementKind::Paragraph && element.is_empty());
    let at = if replace {
        document.children[top] = new_table().into();
        top
    } else {
        let at = (top + 1).min(document.children.len());
        document.children.insert(at, new_table().into());
        at
    };
    tracing::debug!(at, replace, "inserted table");
    Some(Selection::collapsed(Point::new(vec![at, HEAD, 0, 0, 0], 0)))
}

/// Insert an empty data row at `index` among the body rows.
pub(crate) fn insert_row(
    document: &mut Document,
    selection: &Selection,
    index: usize,
) -> Option<Selection> {
    let table = table_path(document, &selection.focus)?;
    let table_element = table_at(document, &table)?;
    let body = section(table_element, BODY)?;
    if index > body.children.len() {
        return None;
    }
    let width = body
        .child_elements()
        .next()
        .or_else(|| section(table_element, HEAD)?.child_elements().next())
        .map(|first| first.children.len())?;

    let mut body_path = table.clone();
    body_path.push(BODY);
    let rows = children_at_mut(&mut document.children, &body_path)?;
    rows.insert(index, row((0..width).map(|_| data_cell()).collect()));
    assign_cell_positions(element_at_mut(&mut document.children, &table)?);
    tracing::debug!(index, width, "inserted table row");

    let mut target = body_path;
    target.extend([index, 0, 0]);
    Some(Selection::collapsed(Point::new(target, 0)))
}

/// Insert an empty column at `index`: a header cell in the head row and a
/// data cell in every body row.
pub(crate) fn insert_col(
    document: &mut Document,
    selection: &Selection,
    index: usize,
) -> Option<Selection> {
    let table = table_path(document, &selection.focus)?;
    let table_element = table_at(document, &table)?;
    let columns = section(table_element, HEAD)?
        .child_elements()
        .next()
        .map(|head_row| head_row.children.len())?;
    if index > columns {
        return None;
    }

    let table_element = element_at_mut(&mut document.children, &table)?;
    for (section_idx, section) in table_element.child_elements_mut().enumerate() {
        for row in section.child_elements_mut() {
            let cell = if section_idx == HEAD {
                header_cell()
            } else {
                data_cell()
            };
            let at = index.min(row.children.len());
            row.children.insert(at, cell);
        }
    }
    assign_cell_positions(table_element);
    tracing::debug!(index, "inserted table column");

    let mut target = table;
    target.extend([HEAD, 0, index, 0]);
    Some(Selection::collapsed(Point::new(target, 0)))
}

/// Insert an empty paragraph at `path` and put the caret in it.
pub(crate) fn insert_paragraph(document: &mut Document, path: &[usize]) -> Option<Selection> {
    let paragraph = Element::empty(ElementKind::Paragraph).into();
    if !insert_node_at(&mut document.children, path, paragraph) {
        return None;
    }
    let mut target = path.to_vec();
    target.push(0);
    Some(Selection::collapsed(Point::new(target, 0)))
}

fn last_data_pos(table: &Element) -> Option<Pos> {
    section(table, BODY)?
        .child_elements()
        .last()?
        .child_elements()
        .last()?
        .kind
        .cell_pos()
}

pub(crate) fn on_last_cell(document: &Document, selection: &Selection) -> bool {
    let Some(path) = table_path(document, &selection.focus) else {
        return false;
    };
    let Some(table) = table_at(document, &path) else {
        return false;
    };
    let Some(selected) = selected_pos(table) else {
        return false;
    };
    last_data_pos(table) == Some(selected)
}

pub(crate) fn at_table_start(document: &Document, selection: &Selection) -> bool {
    let Some(path) = table_path(document, &selection.focus) else {
        return false;
    };
    let Some(table) = table_at(document, &path) else {
        return false;
    };
    if selected_pos(table) != Some((0, 0)) {
        return false;
    }
    point_char_offset(&document.children, &selection.focus).is_some_and(|(_, offset)| offset == 0)
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod table_tests;
