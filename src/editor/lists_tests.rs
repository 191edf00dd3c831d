use super::*;
use crate::editor::Editor;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn item(text: &str) -> Node {
    Element::new(ElementKind::ListItem, vec![Node::text(text)]).into()
}

fn paragraph(text: &str) -> Node {
    Element::paragraph(vec![Node::text(text)]).into()
}

fn ul(items: Vec<Node>) -> Node {
    Element::new(ElementKind::UnorderedList, items).into()
}

fn ol(items: Vec<Node>) -> Node {
    Element::new(ElementKind::OrderedList, items).into()
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
fn test_list_depth_counts_enclosing_lists() {
    let editor = editor_at(vec![ul(vec![item("a"), ul(vec![item("b")])])], &[0, 1, 0, 0], 0);

    assert_eq!(editor.list_depth(), Some(2));
    assert_eq!(editor.current_list_kind(), Some(ListKind::Unordered));
}

#[test]
fn test_list_queries_outside_lists() {
    let editor = editor_at(vec![paragraph("a")], &[0, 0], 0);

    assert_eq!(editor.list_depth(), None);
    assert!(!editor.at_list_item_start());
    assert!(!editor.in_empty_list_item());
}

#[test]
fn test_item_start_and_emptiness() {
    let editor = editor_at(vec![ul(vec![item("a"), item("")])], &[0, 0, 0], 0);
    assert!(editor.at_list_item_start());
    assert!(!editor.in_empty_list_item());

    let editor = editor_at(vec![ul(vec![item("a"), item("")])], &[0, 1, 0], 0);
    assert!(editor.in_empty_list_item());
}

#[test]
fn test_indent_wraps_item_in_nested_list_of_same_kind() {
    let mut editor = editor_at(vec![ol(vec![item("a"), item("b")])], &[0, 1, 0], 1);

    assert!(editor.indent_list_item());

    assert_eq!(
        editor.document().children,
        vec![ol(vec![item("a"), ol(vec![item("b")])])]
    );
    assert_eq!(focus(&editor), Point::new([0, 1, 0, 0], 1));
}

#[test]
fn test_unindent_nested_item_lifts_one_level() {
    let mut editor = editor_at(
        vec![ul(vec![item("a"), ul(vec![item("b"), item("c")])])],
        &[0, 1, 1, 0],
        0,
    );

    assert!(editor.unindent_list_item());

    assert_eq!(
        editor.document().children,
        vec![ul(vec![item("a"), item("b"), item("c")])]
    );
    assert_eq!(focus(&editor), Point::new([0, 2, 0], 0));
}

#[test]
fn test_unindent_top_level_item_becomes_paragraph_after_list() {
    let mut editor = editor_at(vec![ul(vec![item("a"), item("b")])], &[0, 1, 0], 0);

    assert!(editor.unindent_list_item());

    assert_eq!(
        editor.document().children,
        vec![ul(vec![item("a")]), paragraph("b")]
    );
    assert_eq!(focus(&editor), Point::new([1, 0], 0));
}

#[test]
fn test_unindent_only_item_removes_list() {
    let mut editor = editor_at(vec![paragraph("x"), ul(vec![item("a")])], &[1, 0, 0], 1);

    assert!(editor.unindent_list_item());

    assert_eq!(
        editor.document().children,
        vec![paragraph("x"), paragraph("a")]
    );
    assert_eq!(focus(&editor), Point::new([1, 0], 1));
}

#[test]
fn test_indent_outside_list_does_nothing() {
    let mut editor = editor_at(vec![paragraph("a")], &[0, 0], 0);

    assert!(!editor.indent_list_item());
    assert!(!editor.unindent_list_item());
}

#[rstest]
#[case("*", Some(BlockKind::UnorderedList))]
#[case("1.", Some(BlockKind::OrderedList))]
#[case("7.", Some(BlockKind::OrderedList))]
#[case("12.", None)]
#[case("* a", None)]
#[case("-", None)]
fn test_autoformat_trigger(#[case] text: &str, #[case] expected: Option<BlockKind>) {
    let document = Document::new().with_children(vec![paragraph(text)]);
    let offset = text.chars().count();
    let selection = Selection::collapsed(Point::new([0, 0], offset));

    assert_eq!(autoformat_trigger(&document, &selection), expected);
}

#[test]
fn test_autoformat_requires_caret_at_end() {
    let document = Document::new().with_children(vec![paragraph("1.")]);
    let selection = Selection::collapsed(Point::new([0, 0], 1));

    assert_eq!(autoformat_trigger(&document, &selection), None);
}

#[test]
fn test_autoformat_ignores_headings() {
    let document = Document::new().with_children(vec![
        Element::new(ElementKind::Heading1, vec![Node::text("*")]).into(),
    ]);
    let selection = Selection::collapsed(Point::new([0, 0], 1));

    assert_eq!(autoformat_trigger(&document, &selection), None);
}

#[test]
fn test_autoformat_list_converts_paragraph() {
    let mut editor = editor_at(vec![paragraph("3.")], &[0, 0], 2);

    assert!(editor.autoformat_list());

    assert_eq!(editor.document().children, vec![ol(vec![item("")])]);
    assert_eq!(focus(&editor), Point::new([0, 0, 0], 0));
}
