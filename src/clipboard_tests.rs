use super::*;
use crate::document::{Document, Element, ElementKind, Mark, Node, Text};
use crate::editor::{Point, Selection};
use pretty_assertions::assert_eq;

struct FixedEncoder;

impl ImageEncoder for FixedEncoder {
    fn encode(&self, bytes: &[u8], mime: &str) -> String {
        format!("blob:{mime}:{}", bytes.len())
    }
}

fn editor_at(text: &str, offset: usize) -> Editor {
    let mut editor = Editor::new(
        Document::new().with_children(vec![Element::paragraph(vec![Node::text(text)]).into()]),
    );
    assert!(editor.set_selection(Selection::collapsed(Point::new([0, 0], offset))));
    editor
}

fn paragraph(children: Vec<Node>) -> Node {
    Element::paragraph(children).into()
}

#[test]
fn test_data_url_encoding() {
    assert_eq!(
        DataUrlEncoder.encode(b"hi", "image/png"),
        "data:image/png;base64,aGk="
    );
}

#[test]
fn test_image_payload_detection() {
    assert!(FilePayload::new(vec![1], "image/jpeg").is_image());
    assert!(!FilePayload::new(vec![1], "text/plain").is_image());
}

#[test]
fn test_paste_plain_text() {
    let mut editor = editor_at("ad", 1);

    assert!(insert_data(&mut editor, &DataTransfer::html("bc"), &DataUrlEncoder));

    assert_eq!(editor.document().children, vec![paragraph(vec![Node::text("abcd")])]);
    assert_eq!(editor.selection().unwrap().focus, Point::new([0, 0], 3));
}

#[test]
fn test_paste_formatting() {
    let mut editor = editor_at("", 0);

    assert!(insert_data(
        &mut editor,
        &DataTransfer::html("<b>bold</b> and <i>it</i>"),
        &DataUrlEncoder,
    ));

    assert_eq!(
        editor.document().children,
        vec![paragraph(vec![
            Text::new("bold").with_mark(Mark::Bold).into(),
            Node::text(" and "),
            Text::new("it").with_mark(Mark::Italic).into(),
        ])]
    );
}

#[test]
fn test_paste_link() {
    let mut editor = editor_at("see ", 4);

    assert!(insert_data(
        &mut editor,
        &DataTransfer::html(r#"<a href="https://example.com">this</a>"#),
        &DataUrlEncoder,
    ));

    assert_eq!(
        editor.document().children,
        vec![paragraph(vec![
            Node::text("see "),
            Element::link("https://example.com", "this").into(),
            Node::text(""),
        ])]
    );
    assert_eq!(editor.selection().unwrap().focus, Point::new([0, 2], 0));
}

#[test]
fn test_paste_blocks_into_empty_note() {
    let mut editor = editor_at("", 0);

    assert!(insert_data(
        &mut editor,
        &DataTransfer::html("<h1>Title</h1><ul><li>one</li></ul>"),
        &DataUrlEncoder,
    ));

    assert_eq!(
        editor.document().children,
        vec![
            Element::new(ElementKind::Heading1, vec![Node::text("Title")]).into(),
            Element::new(
                ElementKind::UnorderedList,
                vec![Element::new(ElementKind::ListItem, vec![Node::text("one")]).into()],
            )
            .into(),
        ]
    );
    assert_eq!(editor.selection().unwrap().focus, Point::new([1, 0, 0], 3));
}

#[test]
fn test_dropped_image_file_is_inserted() {
    let mut editor = editor_at("", 0);

    assert!(insert_data(
        &mut editor,
        &DataTransfer::file(vec![0u8; 3], "image/gif"),
        &FixedEncoder,
    ));

    assert_eq!(
        editor.document().children,
        vec![paragraph(vec![
            Node::text(""),
            Element::image("blob:image/gif:3").into(),
            Node::text(""),
        ])]
    );
}

#[test]
fn test_non_image_files_are_not_consumed() {
    let mut editor = editor_at("a", 1);

    assert!(!insert_data(
        &mut editor,
        &DataTransfer::file(b"notes".to_vec(), "text/plain"),
        &DataUrlEncoder,
    ));
    assert_eq!(editor.document().children, vec![paragraph(vec![Node::text("a")])]);
}

#[test]
fn test_html_wins_over_files() {
    let mut editor = editor_at("", 0);
    let mut data = DataTransfer::html("x");
    data.files.push(FilePayload::new(vec![1], "image/png"));

    assert!(insert_data(&mut editor, &data, &FixedEncoder));

    assert_eq!(editor.document().children, vec![paragraph(vec![Node::text("x")])]);
}

#[test]
fn test_nothing_is_inserted_without_selection() {
    let mut editor = editor_at("a", 0);
    editor.clear_selection();

    assert!(!insert_data(&mut editor, &DataTransfer::html("x"), &DataUrlEncoder));
}

#[test]
fn test_paste_three_marks_gives_three_leaves() {
    let mut editor = editor_at("", 0);

    assert!(insert_data(
        &mut editor,
        &DataTransfer::html("<b>X</b><i>Y</i><u>Z</u>"),
        &DataUrlEncoder,
    ));

    assert_eq!(
        editor.document().children,
        vec![paragraph(vec![
            Text::new("X").with_mark(Mark::Bold).into(),
            Text::new("Y").with_mark(Mark::Italic).into(),
            Text::new("Z").with_mark(Mark::Underline).into(),
        ])]
    );
}

fn cell_positions(node: &Node, out: &mut Vec<(usize, usize)>) {
    let Node::Element(element) = node else {
        return;
    };
    if let Some(pos) = element.kind.cell_pos() {
        out.push(pos);
    }
    for child in &element.children {
        cell_positions(child, out);
    }
}

#[test]
fn test_paste_table_numbers_cells() {
    let mut editor = editor_at("", 0);

    assert!(insert_data(
        &mut editor,
        &DataTransfer::html(
            "<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>"
        ),
        &DataUrlEncoder,
    ));

    let children = &editor.document().children;
    assert_eq!(children.len(), 1);
    let table = children[0].as_element().unwrap();
    assert!(table.kind.is_table());
    let mut positions = Vec::new();
    cell_positions(&children[0], &mut positions);
    assert_eq!(positions, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    assert_eq!(table.plain_text(), "AB12");
}
