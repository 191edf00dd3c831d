use serde::{Deserialize, Serialize};

/// Zero-indexed `(row, col)` of a table cell.
pub type Pos = (usize, usize);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub children: Vec<Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// The content a fresh note starts with: one empty paragraph.
    pub fn empty_note() -> Self {
        Self::new().with_children(vec![Element::empty(ElementKind::Paragraph).into()])
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Text leaves and inline elements may sit side by side in an inline container.
    pub fn is_inline(&self) -> bool {
        match self {
            Node::Text(_) => true,
            Node::Element(element) => element.kind.is_inline(),
        }
    }

    pub fn is_inline_element(&self) -> bool {
        matches!(self, Node::Element(element) if element.kind.is_inline())
    }

    /// Concatenated text of every leaf below this node.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_plain_text(self, &mut out);
        out
    }
}

fn collect_plain_text(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&text.text),
        Node::Element(element) => {
            for child in &element.children {
                collect_plain_text(child, out);
            }
        }
    }
}

impl From<Text> for Node {
    fn from(value: Text) -> Self {
        Node::Text(value)
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

impl Mark {
    pub const ALL: [Mark; 3] = [Mark::Bold, Mark::Italic, Mark::Underline];
}

impl Marks {
    pub fn get(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
        }
    }

    pub fn set(&mut self, mark: Mark, value: bool) {
        match mark {
            Mark::Bold => self.bold = value,
            Mark::Italic => self.italic = value,
            Mark::Underline => self.underline = value,
        }
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
    #[serde(flatten)]
    pub marks: Marks,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn with_marks(mut self, marks: Marks) -> Self {
        self.marks = marks;
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.set(mark, true);
        self
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(flatten)]
    pub kind: ElementKind,
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ElementKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "h1")]
    Heading1,
    #[serde(rename = "h2")]
    Heading2,
    #[serde(rename = "h3")]
    Heading3,
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "orderedList")]
    OrderedList,
    #[serde(rename = "unorderedList")]
    UnorderedList,
    #[serde(rename = "listItem")]
    ListItem,
    #[serde(rename = "link")]
    Link { href: String },
    #[serde(rename = "image")]
    Image { url: String },
    #[serde(rename = "table")]
    Table {
        #[serde(
            rename = "selectedPos",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        selected_pos: Option<Pos>,
    },
    #[serde(rename = "table-head")]
    TableHead,
    #[serde(rename = "table-body")]
    TableBody,
    #[serde(rename = "table-row")]
    TableRow,
    #[serde(rename = "table-header")]
    TableHeader { pos: Pos },
    #[serde(rename = "table-data")]
    TableData { pos: Pos },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListKind {
    Ordered,
    Unordered,
}

impl ListKind {
    pub fn element_kind(self) -> ElementKind {
        match self {
            ListKind::Ordered => ElementKind::OrderedList,
            ListKind::Unordered => ElementKind::UnorderedList,
        }
    }
}

impl ElementKind {
    pub fn is_inline(&self) -> bool {
        matches!(self, ElementKind::Link { .. } | ElementKind::Image { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ElementKind::Image { .. })
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        match self {
            ElementKind::OrderedList => Some(ListKind::Ordered),
            ElementKind::UnorderedList => Some(ListKind::Unordered),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        self.list_kind().is_some()
    }

    pub fn is_table_cell(&self) -> bool {
        self.cell_pos().is_some()
    }

    pub fn cell_pos(&self) -> Option<Pos> {
        match self {
            ElementKind::TableHeader { pos } | ElementKind::TableData { pos } => Some(*pos),
            _ => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, ElementKind::Table { .. })
    }

    /// Blocks whose children are text leaves and inline elements.
    pub fn holds_inline_content(&self) -> bool {
        match self {
            ElementKind::Paragraph
            | ElementKind::Heading1
            | ElementKind::Heading2
            | ElementKind::Heading3
            | ElementKind::Code
            | ElementKind::ListItem
            | ElementKind::TableHeader { .. }
            | ElementKind::TableData { .. } => true,
            ElementKind::OrderedList
            | ElementKind::UnorderedList
            | ElementKind::Link { .. }
            | ElementKind::Image { .. }
            | ElementKind::Table { .. }
            | ElementKind::TableHead
            | ElementKind::TableBody
            | ElementKind::TableRow => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Paragraph => "paragraph",
            ElementKind::Heading1 => "h1",
            ElementKind::Heading2 => "h2",
            ElementKind::Heading3 => "h3",
            ElementKind::Code => "code",
            ElementKind::OrderedList => "orderedList",
            ElementKind::UnorderedList => "unorderedList",
            ElementKind::ListItem => "listItem",
            ElementKind::Link { .. } => "link",
            ElementKind::Image { .. } => "image",
            ElementKind::Table { .. } => "table",
            ElementKind::TableHead => "table-head",
            ElementKind::TableBody => "table-body",
            ElementKind::TableRow => "table-row",
            ElementKind::TableHeader { .. } => "table-header",
            ElementKind::TableData { .. } => "table-data",
        }
    }
}

impl Element {
    pub fn new(kind: ElementKind, children: Vec<Node>) -> Self {
        let mut element = Self { kind, children };
        element.ensure_child();
        element
    }

    /// An element owning a single empty text leaf.
    pub fn empty(kind: ElementKind) -> Self {
        Self {
            kind,
            children: vec![Node::text("")],
        }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::new(ElementKind::Paragraph, children)
    }

    pub fn link(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            ElementKind::Link { href: href.into() },
            vec![Node::text(text)],
        )
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::empty(ElementKind::Image { url: url.into() })
    }

    pub fn ensure_child(&mut self) {
        if self.children.is_empty() {
            self.children.push(Node::text(""));
        }
    }

    /// True when the element holds nothing but empty text leaves.
    pub fn is_empty(&self) -> bool {
        self.children.iter().all(|child| match child {
            Node::Text(text) => text.is_empty(),
            Node::Element(element) => !element.kind.is_void() && element.is_empty(),
        })
    }

    pub fn plain_text(&self) -> String {
        self.children.iter().map(Node::plain_text).collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }
}

/// Stamp `pos` on every cell of `table` in document order: head rows first,
/// then body rows, columns left to right.
pub fn assign_cell_positions(table: &mut Element) {
    let mut row_index = 0;
    for section in table.child_elements_mut() {
        for row in section.child_elements_mut() {
            if row.kind != ElementKind::TableRow {
                continue;
            }
            let mut col_index = 0;
            for cell in row.child_elements_mut() {
                match &mut cell.kind {
                    ElementKind::TableHeader { pos } | ElementKind::TableData { pos } => {
                        *pos = (row_index, col_index);
                        col_index += 1;
                    }
                    _ => {}
                }
            }
            row_index += 1;
        }
    }
}

/// Clear `selectedPos` on every table of the tree.
pub fn clear_table_selection(nodes: &mut [Node]) {
    for node in nodes {
        if let Node::Element(element) = node {
            if let ElementKind::Table { selected_pos } = &mut element.kind {
                *selected_pos = None;
            }
            clear_table_selection(&mut element.children);
        }
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod document_tests;
