use super::*;
use crate::document::Mark;
use pretty_assertions::assert_eq;

fn paragraph(children: Vec<Node>) -> Node {
    Element::paragraph(children).into()
}

fn bold(text: &str) -> Node {
    Text::new(text).with_mark(Mark::Bold).into()
}

fn sample() -> Vec<Node> {
    vec![
        paragraph(vec![
            Node::text("ab"),
            Element::link("u", "cd").into(),
            Node::text("e"),
        ]),
        Element::new(
            ElementKind::UnorderedList,
            vec![Element::new(ElementKind::ListItem, vec![Node::text("item")]).into()],
        )
        .into(),
    ]
}

#[test]
fn test_node_lookup_follows_child_indices() {
    let nodes = sample();

    assert_eq!(text_at(&nodes, &[0, 1, 0]).map(|t| t.text.as_str()), Some("cd"));
    assert_eq!(
        element_at(&nodes, &[1, 0]).map(|e| e.kind.clone()),
        Some(ElementKind::ListItem)
    );
    assert!(node_at(&nodes, &[0, 9]).is_none());
    assert!(node_at(&nodes, &[]).is_none());
    assert!(text_at(&nodes, &[0]).is_none());
}

#[test]
fn test_block_path_skips_inline_elements() {
    let nodes = sample();

    assert_eq!(block_path(&nodes, &[0, 1, 0]), Some(vec![0]));
    assert_eq!(block_path(&nodes, &[1, 0, 0]), Some(vec![1, 0]));
}

#[test]
fn test_leaf_spans_cover_nested_text() {
    let Node::Element(block) = &sample()[0] else {
        panic!("expected element");
    };

    let spans = leaf_spans(block);

    assert_eq!(
        spans,
        vec![
            LeafSpan {
                rel: vec![0],
                start: 0,
                len: 2,
            },
            LeafSpan {
                rel: vec![1, 0],
                start: 2,
                len: 2,
            },
            LeafSpan {
                rel: vec![2],
                start: 4,
                len: 1,
            },
        ]
    );
    assert_eq!(block_char_len(block), 5);
}

#[test]
fn test_point_at_char_respects_affinity() {
    let nodes = sample();

    assert_eq!(
        point_at_char(&nodes, &[0], 2, Affinity::Backward),
        Some(Point::new([0, 0], 2))
    );
    assert_eq!(
        point_at_char(&nodes, &[0], 2, Affinity::Forward),
        Some(Point::new([0, 1, 0], 0))
    );
    assert_eq!(
        point_at_char(&nodes, &[0], 99, Affinity::Forward),
        Some(Point::new([0, 2], 1))
    );
}

#[test]
fn test_point_char_offset_inside_link() {
    let nodes = sample();

    assert_eq!(
        point_char_offset(&nodes, &Point::new([0, 1, 0], 1)),
        Some((vec![0], 3))
    );
}

#[test]
fn test_first_and_last_text_points() {
    let nodes = sample();

    assert_eq!(first_text_point(&nodes, &[]), Some(Point::new([0, 0], 0)));
    assert_eq!(last_text_point(&nodes, &[]), Some(Point::new([1, 0, 0], 4)));
    assert_eq!(first_text_point(&nodes, &[1]), Some(Point::new([1, 0, 0], 0)));
}

#[test]
fn test_resolve_clamps_offset_and_descends_into_elements() {
    let nodes = sample();

    assert_eq!(
        resolve_text_point(&nodes, &Point::new([0, 0], 50)),
        Some(Point::new([0, 0], 2))
    );
    assert_eq!(
        resolve_text_point(&nodes, &Point::new([1], 0)),
        Some(Point::new([1, 0, 0], 0))
    );
}

#[test]
fn test_resolve_falls_back_to_previous_leaf() {
    let nodes = sample();

    assert_eq!(
        resolve_text_point(&nodes, &Point::new([0, 7], 0)),
        Some(Point::new([0, 2], 1))
    );
}

#[test]
fn test_resolve_never_lands_inside_image() {
    let nodes = vec![paragraph(vec![
        Node::text("a"),
        Element::image("x.png").into(),
        Node::text(""),
    ])];

    assert_eq!(
        resolve_text_point(&nodes, &Point::new([0, 1, 0], 0)),
        Some(Point::new([0, 0], 1))
    );
}

#[test]
fn test_normalize_merges_equal_marks_and_drops_empty_leaves() {
    let mut children = vec![
        Node::text("a"),
        Node::text("b"),
        bold(""),
        bold("c"),
        bold("d"),
    ];

    normalize_inline_children(&mut children);

    assert_eq!(children, vec![Node::text("ab"), bold("cd")]);
}

#[test]
fn test_normalize_pads_inline_elements_with_text() {
    let mut children = vec![Element::link("u", "x").into()];

    normalize_inline_children(&mut children);

    assert_eq!(
        children,
        vec![Node::text(""), Element::link("u", "x").into(), Node::text("")]
    );
}

#[test]
fn test_normalize_document_adds_paragraph_to_empty_tree() {
    let mut document = Document::new();

    normalize_document(&mut document);

    assert_eq!(document, Document::empty_note());
}

#[test]
fn test_split_text_leaf_keeps_marks() {
    let mut nodes = vec![paragraph(vec![bold("abcd")])];

    assert_eq!(split_text_leaf(&mut nodes, &[0, 0], 1), Some(1));

    assert_eq!(
        nodes,
        vec![Node::Element(Element {
            kind: ElementKind::Paragraph,
            children: vec![bold("a"), bold("bcd")],
        })]
    );
}

#[test]
fn test_split_at_leaf_edges_does_not_split() {
    let mut nodes = vec![paragraph(vec![Node::text("ab")])];

    assert_eq!(split_text_leaf(&mut nodes, &[0, 0], 0), Some(0));
    assert_eq!(split_text_leaf(&mut nodes, &[0, 0], 2), Some(1));
    assert_eq!(nodes, vec![paragraph(vec![Node::text("ab")])]);
}

#[test]
fn test_insert_and_remove_node_at_root() {
    let mut nodes = sample();

    assert!(insert_node_at(&mut nodes, &[0], paragraph(vec![Node::text("new")])));
    assert_eq!(nodes.len(), 3);
    let removed = remove_node_at(&mut nodes, &[0]);

    assert_eq!(removed, Some(paragraph(vec![Node::text("new")])));
    assert!(!insert_node_at(&mut nodes, &[5], Node::text("x")));
}
