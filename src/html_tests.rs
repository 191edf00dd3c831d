use super::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn text(value: &str) -> Markup {
    Markup::Text(value.to_string())
}

fn paragraph(children: Vec<Node>) -> Node {
    Element::paragraph(children).into()
}

fn item(value: &str) -> Node {
    Element::new(ElementKind::ListItem, vec![Node::text(value)]).into()
}

fn marked(value: &str, marks: Marks) -> Node {
    Text::new(value).with_marks(marks).into()
}

fn cell(kind: ElementKind, value: &str) -> Node {
    Element::new(kind, vec![Node::text(value)]).into()
}

fn th(value: &str) -> Node {
    cell(ElementKind::TableHeader { pos: (0, 0) }, value)
}

fn td(value: &str) -> Node {
    cell(ElementKind::TableData { pos: (0, 0) }, value)
}

fn expected_table(head: Vec<Node>, body: Vec<Vec<Node>>) -> Node {
    let row = |cells: Vec<Node>| -> Node { Element::new(ElementKind::TableRow, cells).into() };
    let mut table = Element::new(
        ElementKind::Table { selected_pos: None },
        vec![
            Element::new(ElementKind::TableHead, vec![row(head)]).into(),
            Element::new(ElementKind::TableBody, body.into_iter().map(row).collect()).into(),
        ],
    );
    assign_cell_positions(&mut table);
    table.into()
}

// ============================================================================
// Reader
// ============================================================================

#[test]
fn test_reader_builds_tree_with_attributes() {
    let markup = parse(r#"<p class="x">a<b>b</b></p>"#);

    assert_eq!(
        markup,
        vec![Markup::Element {
            tag: Tag::P,
            attrs: vec![("class".to_string(), "x".to_string())],
            children: vec![
                text("a"),
                Markup::Element {
                    tag: Tag::Bold,
                    attrs: Vec::new(),
                    children: vec![text("b")],
                },
            ],
        }]
    );
}

#[test]
fn test_reader_reads_quoted_and_bare_attributes() {
    let markup = parse("<a href='x' target=_blank TITLE=\"t &amp; u\">y</a>");

    assert_eq!(markup[0].attr("href"), Some("x"));
    assert_eq!(markup[0].attr("target"), Some("_blank"));
    assert_eq!(markup[0].attr("title"), Some("t & u"));
    assert_eq!(markup[0].attr("rel"), None);
}

#[test]
fn test_reader_decodes_entities() {
    assert_eq!(parse("a &amp; b &lt;c&gt;"), vec![text("a & b <c>")]);
}

#[test]
fn test_reader_closes_unclosed_elements() {
    let markup = parse("<ul><li>a");

    assert_eq!(
        markup,
        vec![Markup::Element {
            tag: Tag::Ul,
            attrs: Vec::new(),
            children: vec![Markup::Element {
                tag: Tag::Li,
                attrs: Vec::new(),
                children: vec![text("a")],
            }],
        }]
    );
}

#[test]
fn test_reader_ignores_stray_closing_tags_and_comments() {
    assert_eq!(parse("a</b>c<!-- note -->d"), vec![text("a"), text("c"), text("d")]);
}

#[test]
fn test_reader_skips_script_bodies() {
    assert_eq!(parse(r#"<script>var x = "<p>";</script>ok"#), vec![text("ok")]);
}

#[test]
fn test_reader_treats_void_tags_as_leaves() {
    let markup = parse(r#"<img src="a.png">after"#);

    assert_eq!(markup.len(), 2);
    assert_eq!(markup[0].attr("src"), Some("a.png"));
    assert_eq!(markup[1], text("after"));
}

#[rstest]
#[case("STRONG", Tag::Bold)]
#[case("em", Tag::Italic)]
#[case("tfoot", Tag::Tbody)]
#[case("style", Tag::Ignored)]
#[case("span", Tag::Other("span".to_string()))]
fn test_tag_names(#[case] name: &str, #[case] expected: Tag) {
    assert_eq!(Tag::from_name(name), expected);
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_plain_text_stays_inline() {
    assert_eq!(deserialize("hello"), vec![Node::text("hello")]);
}

#[test]
fn test_formatting_tags_become_marks() {
    let bold = Marks::default().with(Mark::Bold);
    let both = bold.with(Mark::Italic);

    assert_eq!(
        deserialize("<b>x</b> <strong><em>y</em></strong>"),
        vec![marked("x", bold), Node::text(" "), marked("y", both)]
    );
}

#[test]
fn test_links_need_href() {
    assert_eq!(
        deserialize(r#"<a href="https://example.com">site</a>"#),
        vec![Element::link("https://example.com", "site").into()]
    );
    assert_eq!(deserialize("<a>bare</a>"), vec![Node::text("bare")]);
}

#[test]
fn test_paragraph_source_whitespace_is_dropped() {
    assert_eq!(
        deserialize("<p>a</p>\n  <p>b</p>\n"),
        vec![
            paragraph(vec![Node::text("a")]),
            paragraph(vec![Node::text("b")]),
        ]
    );
}

#[test]
fn test_unknown_wrappers_pass_children_through() {
    assert_eq!(
        deserialize("<div><span>a</span></div>"),
        vec![Node::text("a")]
    );
    assert_eq!(
        deserialize("<html><head><title>T</title></head><body><p>a</p></body></html>"),
        vec![paragraph(vec![Node::text("a")])]
    );
}

#[test]
fn test_headings_keep_inline_content() {
    assert_eq!(
        deserialize("<h2>T<b>x</b></h2>"),
        vec![
            Element::new(
                ElementKind::Heading2,
                vec![Node::text("T"), marked("x", Marks::default().with(Mark::Bold))],
            )
            .into()
        ]
    );
}

#[test]
fn test_nested_lists_follow_their_item() {
    assert_eq!(
        deserialize("<ul>\n<li>a</li>\n<li>b<ol><li>c</li></ol></li>\n</ul>"),
        vec![
            Element::new(
                ElementKind::UnorderedList,
                vec![
                    item("a"),
                    item("b"),
                    Element::new(ElementKind::OrderedList, vec![item("c")]).into(),
                ],
            )
            .into()
        ]
    );
}

#[test]
fn test_images_need_src() {
    assert_eq!(
        deserialize(r#"<img src="cat.png">"#),
        vec![Element::image("cat.png").into()]
    );
    assert_eq!(deserialize("<img alt=\"x\">"), Vec::<Node>::new());
}

#[test]
fn test_table_rows_are_padded_to_head_width() {
    let html = "<table><thead><tr><th>A</th><th>B</th></tr></thead>\
                <tbody><tr><td>1</td></tr></tbody></table>";

    assert_eq!(
        deserialize(html),
        vec![expected_table(
            vec![th("A"), th("B")],
            vec![vec![td("1"), td("")]],
        )]
    );
}

#[test]
fn test_table_without_head_promotes_first_row() {
    let html = "<table><tr><td>A</td></tr><tr><td>1</td><td>extra</td></tr></table>";

    assert_eq!(
        deserialize(html),
        vec![expected_table(vec![th("A")], vec![vec![td("1")]])]
    );
}

#[test]
fn test_table_with_single_row_gets_empty_body_row() {
    assert_eq!(
        deserialize("<table><tr><th>A</th></tr></table>"),
        vec![expected_table(vec![th("A")], vec![vec![td("")]])]
    );
}
