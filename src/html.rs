//! Conversion of pasted HTML into document nodes.
//!
//! Markup is read by a tolerant tokenizer ([`reader`]) into a small tree of
//! classified tags, then converted into the note grammar: unknown tags pass
//! their children through, formatting tags become marks on the leaves below
//! them, and tables are normalized into one head row plus body rows of equal
//! width.

use crate::document::{Element, ElementKind, Mark, Marks, Node, Text, assign_cell_positions};

pub mod reader;

pub use reader::{Markup, Tag, parse};

/// Parse `html` and convert it into nodes ready for insertion.
pub fn deserialize(html: &str) -> Vec<Node> {
    let markup = parse(html);
    let nodes = convert_all(&markup, Marks::default());
    if nodes.iter().any(|node| !node.is_inline()) {
        nodes
            .into_iter()
            .filter(|node| !is_source_whitespace(node))
            .collect()
    } else {
        nodes
    }
}

/// Whitespace-only leaves containing a line break come from source
/// formatting between tags.
fn is_source_whitespace(node: &Node) -> bool {
    match node {
        Node::Text(text) => text.text.contains('\n') && text.text.trim().is_empty(),
        Node::Element(_) => false,
    }
}

fn convert_all(markup: &[Markup], marks: Marks) -> Vec<Node> {
    markup
        .iter()
        .flat_map(|node| convert(node, marks))
        .collect()
}

fn with_mark(marks: Marks, mark: Mark) -> Marks {
    marks.with(mark)
}

pub fn convert(markup: &Markup, marks: Marks) -> Vec<Node> {
    let (tag, children) = match markup {
        Markup::Text(text) => {
            if text.is_empty() {
                return Vec::new();
            }
            return vec![Text::new(text.clone()).with_marks(marks).into()];
        }
        Markup::Element { tag, children, .. } => (tag, children),
    };

    match tag {
        Tag::Html | Tag::Body => convert_all(children, marks),
        Tag::P => {
            let content: Vec<Node> = inline_content(convert_all(children, marks))
                .into_iter()
                .filter(|node| !is_source_whitespace(node))
                .collect();
            vec![Element::new(ElementKind::Paragraph, content).into()]
        }
        Tag::A => match markup.attr("href") {
            Some(href) => vec![
                Element::new(
                    ElementKind::Link {
                        href: href.to_string(),
                    },
                    inline_content(convert_all(children, marks)),
                )
                .into(),
            ],
            None => convert_all(children, marks),
        },
        Tag::Ul => vec![list(ElementKind::UnorderedList, convert_all(children, marks))],
        Tag::Ol => vec![list(ElementKind::OrderedList, convert_all(children, marks))],
        Tag::Li => list_item(convert_all(children, marks)),
        Tag::H1 => vec![block(ElementKind::Heading1, convert_all(children, marks))],
        Tag::H2 => vec![block(ElementKind::Heading2, convert_all(children, marks))],
        Tag::H3 => vec![block(ElementKind::Heading3, convert_all(children, marks))],
        Tag::Table => vec![table(children, marks).into()],
        Tag::Thead | Tag::Tbody | Tag::Tr | Tag::Th | Tag::Td => convert_all(children, marks),
        Tag::Img => match markup.attr("src") {
            Some(src) => vec![Element::image(src).into()],
            None => Vec::new(),
        },
        Tag::Bold => convert_all(children, with_mark(marks, Mark::Bold)),
        Tag::Italic => convert_all(children, with_mark(marks, Mark::Italic)),
        Tag::Underline => convert_all(children, with_mark(marks, Mark::Underline)),
        Tag::Ignored => Vec::new(),
        Tag::Other(_) => convert_all(children, marks),
    }
}

/// Inline nodes only: block elements are replaced by their inline content.
fn inline_content(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(_) => out.push(node),
            Node::Element(mut element) if element.kind.is_inline() => {
                if !element.kind.is_void() {
                    element.children = inline_content(element.children);
                    element.ensure_child();
                }
                out.push(element.into());
            }
            Node::Element(element) => out.extend(inline_content(element.children)),
        }
    }
    out
}

fn block(kind: ElementKind, children: Vec<Node>) -> Node {
    Element::new(kind, inline_content(children)).into()
}

/// A list item keeps its inline content; nested lists found inside it are
/// hoisted to follow it in the parent list.
fn list_item(children: Vec<Node>) -> Vec<Node> {
    let mut content = Vec::new();
    let mut nested = Vec::new();
    for child in children {
        match child {
            Node::Element(element) if element.kind.is_list() => nested.push(element.into()),
            other => content.push(other),
        }
    }
    let content: Vec<Node> = inline_content(content)
        .into_iter()
        .filter(|node| !is_source_whitespace(node))
        .collect();
    let mut out = vec![Element::new(ElementKind::ListItem, content).into()];
    out.extend(nested);
    out
}

fn list(kind: ElementKind, children: Vec<Node>) -> Node {
    let mut items: Vec<Node> = Vec::new();
    let mut loose: Vec<Node> = Vec::new();
    for child in children {
        if child.is_inline() {
            if !is_source_whitespace(&child) {
                loose.push(child);
            }
            continue;
        }
        if !loose.is_empty() {
            items.push(Element::new(ElementKind::ListItem, std::mem::take(&mut loose)).into());
        }
        match child {
            Node::Element(element)
                if element.kind == ElementKind::ListItem || element.kind.is_list() =>
            {
                items.push(element.into())
            }
            Node::Element(element) => items.push(
                Element::new(ElementKind::ListItem, inline_content(element.children)).into(),
            ),
            text => items.push(text),
        }
    }
    if !loose.is_empty() {
        items.push(Element::new(ElementKind::ListItem, loose).into());
    }
    if items.is_empty() {
        items.push(Element::empty(ElementKind::ListItem).into());
    }
    Element { kind, children: items }.into()
}

struct RawRow {
    cells: Vec<Vec<Node>>,
    in_head: bool,
}

fn collect_rows(markup: &[Markup], marks: Marks, in_head: bool, rows: &mut Vec<RawRow>) {
    for node in markup {
        let Markup::Element { tag, children, .. } = node else {
            continue;
        };
        match tag {
            Tag::Thead => collect_rows(children, marks, true, rows),
            Tag::Tbody => collect_rows(children, marks, false, rows),
            Tag::Tr => {
                let cells = children
                    .iter()
                    .filter_map(|cell| match cell {
                        Markup::Element {
                            tag: Tag::Th | Tag::Td,
                            children,
                            ..
                        } => Some(inline_content(convert_all(children, marks))),
                        _ => None,
                    })
                    .collect();
                rows.push(RawRow { cells, in_head });
            }
            Tag::Bold => collect_rows(children, with_mark(marks, Mark::Bold), in_head, rows),
            Tag::Italic => collect_rows(children, with_mark(marks, Mark::Italic), in_head, rows),
            Tag::Underline => {
                collect_rows(children, with_mark(marks, Mark::Underline), in_head, rows)
            }
            _ => {}
        }
    }
}

fn cell_row(cells: Vec<Vec<Node>>, width: usize, header: bool) -> Node {
    let mut cells: Vec<Node> = cells
        .into_iter()
        .take(width)
        .map(|content| {
            let kind = if header {
                ElementKind::TableHeader { pos: (0, 0) }
            } else {
                ElementKind::TableData { pos: (0, 0) }
            };
            let content = content
                .into_iter()
                .filter(|node| !is_source_whitespace(node))
                .collect();
            Element::new(kind, content).into()
        })
        .collect();
    while cells.len() < width {
        let kind = if header {
            ElementKind::TableHeader { pos: (0, 0) }
        } else {
            ElementKind::TableData { pos: (0, 0) }
        };
        cells.push(Element::empty(kind).into());
    }
    Element::new(ElementKind::TableRow, cells).into()
}

/// One head row (the first `thead` row, else the first row), at least one
/// body row, every row padded or cut to the head row's width.
fn table(markup: &[Markup], marks: Marks) -> Element {
    let mut rows = Vec::new();
    collect_rows(markup, marks, false, &mut rows);
    let head_idx = rows.iter().position(|row| row.in_head).unwrap_or(0);
    let head = if rows.is_empty() {
        RawRow {
            cells: Vec::new(),
            in_head: true,
        }
    } else {
        rows.remove(head_idx)
    };
    let width = if head.cells.is_empty() {
        rows.iter().map(|row| row.cells.len()).max().unwrap_or(0).max(1)
    } else {
        head.cells.len()
    };

    let mut body: Vec<Node> = rows
        .into_iter()
        .map(|row| cell_row(row.cells, width, false))
        .collect();
    if body.is_empty() {
        body.push(cell_row(Vec::new(), width, false));
    }

    let mut element = Element::new(
        ElementKind::Table { selected_pos: None },
        vec![
            Element::new(ElementKind::TableHead, vec![cell_row(head.cells, width, true)]).into(),
            Element::new(ElementKind::TableBody, body).into(),
        ],
    );
    assign_cell_positions(&mut element);
    element
}

#[cfg(test)]
#[path = "html_tests.rs"]
mod html_tests;
