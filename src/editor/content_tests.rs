use super::*;
use crate::editor::Editor;
use pretty_assertions::assert_eq;

fn paragraph(children: Vec<Node>) -> Node {
    Element::paragraph(children).into()
}

fn text_paragraph(text: &str) -> Node {
    paragraph(vec![Node::text(text)])
}

fn item(text: &str) -> Node {
    Element::new(ElementKind::ListItem, vec![Node::text(text)]).into()
}

fn editor_at(children: Vec<Node>, path: &[usize], offset: usize) -> Editor {
    let mut editor = Editor::new(Document::new().with_children(children));
    assert!(editor.set_selection(Selection::collapsed(Point::new(path, offset))));
    editor
}

fn focus(editor: &Editor) -> Point {
    editor.selection().unwrap().focus.clone()
}

#[test]
fn test_char_indices_handle_multibyte_text() {
    assert_eq!(char_to_byte_idx("héllo", 2), 3);
    assert_eq!(char_to_byte_idx("héllo", 9), "héllo".len());
    assert_eq!(slice_chars("héllo", 1, 3), "él");
    assert_eq!(slice_chars("abc", 2, 1), "");
}

#[test]
fn test_insert_text_at_caret() {
    let mut editor = editor_at(vec![text_paragraph("ab")], &[0, 0], 1);

    assert!(editor.insert_text("xy"));

    assert_eq!(editor.document().children, vec![text_paragraph("axyb")]);
    assert_eq!(focus(&editor), Point::new([0, 0], 3));
}

#[test]
fn test_delete_backward_removes_previous_char() {
    let mut editor = editor_at(vec![text_paragraph("abc")], &[0, 0], 2);

    assert!(editor.delete_backward());

    assert_eq!(editor.document().children, vec![text_paragraph("ac")]);
    assert_eq!(focus(&editor), Point::new([0, 0], 1));
}

#[test]
fn test_delete_at_block_start_merges_into_previous() {
    let mut editor = editor_at(
        vec![text_paragraph("ab"), text_paragraph("cd")],
        &[1, 0],
        0,
    );

    assert!(editor.delete_backward());

    assert_eq!(editor.document().children, vec![text_paragraph("abcd")]);
    assert_eq!(focus(&editor), Point::new([0, 0], 2));
}

#[test]
fn test_delete_at_document_start_does_nothing() {
    let mut editor = editor_at(vec![text_paragraph("ab")], &[0, 0], 0);

    assert!(!editor.delete_backward());
    assert_eq!(editor.document().children, vec![text_paragraph("ab")]);
}

#[test]
fn test_delete_merges_list_items() {
    let list = |items| -> Node { Element::new(ElementKind::UnorderedList, items).into() };
    let mut editor = editor_at(vec![list(vec![item("a"), item("b")])], &[0, 1, 0], 0);

    assert!(editor.delete_backward());

    assert_eq!(editor.document().children, vec![list(vec![item("ab")])]);
    assert_eq!(focus(&editor), Point::new([0, 0, 0], 1));
}

#[test]
fn test_deleting_last_link_char_drops_link() {
    let mut editor = editor_at(
        vec![paragraph(vec![
            Node::text("a"),
            Element::link("https://example.com", "b").into(),
            Node::text("c"),
        ])],
        &[0, 1, 0],
        1,
    );

    assert!(editor.delete_backward());

    assert_eq!(editor.document().children, vec![text_paragraph("ac")]);
    assert_eq!(focus(&editor), Point::new([0, 0], 1));
}

#[test]
fn test_backspace_after_image_removes_it() {
    let mut editor = editor_at(
        vec![paragraph(vec![
            Node::text("a"),
            Element::image("x.png").into(),
            Node::text(""),
        ])],
        &[0, 2],
        0,
    );

    assert!(editor.delete_backward());

    assert_eq!(editor.document().children, vec![text_paragraph("a")]);
    assert_eq!(focus(&editor), Point::new([0, 0], 1));
}

#[test]
fn test_range_delete_within_block() {
    let mut editor = Editor::new(Document::new().with_children(vec![text_paragraph("abcdef")]));
    editor.set_selection(Selection::new(Point::new([0, 0], 1), Point::new([0, 0], 4)));

    assert!(editor.delete_backward());

    assert_eq!(editor.document().children, vec![text_paragraph("aef")]);
    assert_eq!(focus(&editor), Point::new([0, 0], 1));
}

#[test]
fn test_range_delete_across_blocks_is_ignored() {
    let children = vec![text_paragraph("ab"), text_paragraph("cd")];
    let mut editor = Editor::new(Document::new().with_children(children.clone()));
    editor.set_selection(Selection::new(Point::new([0, 0], 1), Point::new([1, 0], 1)));

    assert!(!editor.delete_backward());
    assert_eq!(editor.document().children, children);
}

#[test]
fn test_insert_break_splits_paragraph() {
    let mut editor = editor_at(vec![text_paragraph("abcd")], &[0, 0], 2);

    assert!(editor.insert_break());

    assert_eq!(
        editor.document().children,
        vec![text_paragraph("ab"), text_paragraph("cd")]
    );
    assert_eq!(focus(&editor), Point::new([1, 0], 0));
}

#[test]
fn test_insert_break_keeps_block_kind() {
    let heading = |text: &str| -> Node {
        Element::new(ElementKind::Heading1, vec![Node::text(text)]).into()
    };
    let mut editor = editor_at(vec![heading("Title")], &[0, 0], 5);

    assert!(editor.insert_break());

    assert_eq!(editor.document().children, vec![heading("Title"), heading("")]);
}

#[test]
fn test_insert_break_splits_link() {
    let mut editor = editor_at(
        vec![paragraph(vec![Node::text(""), Element::link("u", "abcd").into(), Node::text("")])],
        &[0, 1, 0],
        2,
    );

    assert!(editor.insert_break());

    assert_eq!(
        editor.document().children,
        vec![
            paragraph(vec![Node::text(""), Element::link("u", "ab").into(), Node::text("")]),
            paragraph(vec![Node::text(""), Element::link("u", "cd").into(), Node::text("")]),
        ]
    );
}

#[test]
fn test_insert_break_in_table_cell_is_refused() {
    let mut editor = Editor::new(Document::empty_note());
    assert!(editor.insert_table());
    let before = editor.document().clone();

    assert!(!editor.insert_break());
    assert_eq!(editor.document(), &before);
}
