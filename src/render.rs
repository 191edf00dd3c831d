use std::ops::Range;

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::document::{Document, Element, ElementKind, Marks, Node, Pos};
use crate::editor::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
}

/// Character ranges of a text leaf to flag as uncommon words.
pub type Highlighter<'a> = &'a dyn Fn(&str) -> Vec<Range<usize>>;

pub fn render_document(
    document: &Document,
    cursor: Option<&Point>,
    width: usize,
    highlighter: Option<Highlighter<'_>>,
) -> RenderResult {
    let mut renderer = Renderer::new(width.max(1), cursor, highlighter);
    renderer.render_document(document);
    renderer.finish()
}

struct Renderer<'a> {
    wrap_width: usize,
    cursor_point: Option<&'a Point>,
    highlighter: Option<Highlighter<'a>>,
    cursor: Option<CursorVisualPosition>,
    lines: Vec<Line<'static>>,
    current_line_index: usize,
}

impl<'a> Renderer<'a> {
    fn new(
        wrap_width: usize,
        cursor_point: Option<&'a Point>,
        highlighter: Option<Highlighter<'a>>,
    ) -> Self {
        Self {
            wrap_width,
            cursor_point,
            highlighter,
            cursor: None,
            lines: Vec::new(),
            current_line_index: 0,
        }
    }

    fn render_document(&mut self, document: &Document) {
        for (idx, node) in document.children.iter().enumerate() {
            if idx > 0 {
                self.push_blank_line();
            }
            if let Node::Element(element) = node {
                self.render_block(element, &[idx], "");
            }
        }
    }

    fn render_block(&mut self, element: &Element, path: &[usize], prefix: &str) {
        match &element.kind {
            ElementKind::Paragraph | ElementKind::ListItem => {
                self.render_text_block(element, path, prefix, prefix)
            }
            ElementKind::Heading1 => self.render_heading(element, path, prefix, None),
            ElementKind::Heading2 => self.render_heading(element, path, prefix, Some('=')),
            ElementKind::Heading3 => self.render_heading(element, path, prefix, Some('-')),
            ElementKind::Code => self.render_code_block(element, path, prefix),
            ElementKind::OrderedList | ElementKind::UnorderedList => {
                self.render_list(element, path, prefix)
            }
            ElementKind::Table { selected_pos } => {
                self.render_table(element, path, prefix, *selected_pos)
            }
            ElementKind::Link { .. }
            | ElementKind::Image { .. }
            | ElementKind::TableHead
            | ElementKind::TableBody
            | ElementKind::TableRow
            | ElementKind::TableHeader { .. }
            | ElementKind::TableData { .. } => {
                self.render_text_block(element, path, prefix, prefix)
            }
        }
    }

    fn block_fragments(&self, element: &Element, path: &[usize], base: Style) -> Vec<FragmentItem> {
        let mut fragments = Vec::new();
        let mut child_path = path.to_vec();
        self.collect_fragments(&element.children, &mut child_path, base, &mut fragments);
        fragments
    }

    fn collect_fragments(
        &self,
        children: &[Node],
        path: &mut Vec<usize>,
        base: Style,
        fragments: &mut Vec<FragmentItem>,
    ) {
        for (idx, child) in children.iter().enumerate() {
            path.push(idx);
            match child {
                Node::Text(text) => {
                    let style = merge_style(base, text.marks);
                    let cursor = self
                        .cursor_point
                        .filter(|point| point.path.as_slice() == path.as_slice())
                        .map(|point| point.offset);
                    let uncommon = self
                        .highlighter
                        .map(|highlight| highlight(&text.text))
                        .unwrap_or_default();
                    for run in styled_runs(&text.text, style, &uncommon, cursor) {
                        tokenize_text(&run.text, run.style, run.cursor, fragments);
                    }
                }
                Node::Element(element) => match &element.kind {
                    ElementKind::Image { .. } => {
                        tokenize_text("[image]", base.fg(Color::Magenta), None, fragments);
                    }
                    ElementKind::Link { .. } => {
                        let style = base.add_modifier(Modifier::UNDERLINED).fg(Color::Blue);
                        self.collect_fragments(&element.children, path, style, fragments);
                    }
                    _ => self.collect_fragments(&element.children, path, base, fragments),
                },
            }
            path.pop();
        }
    }

    fn render_text_block(
        &mut self,
        element: &Element,
        path: &[usize],
        first_prefix: &str,
        continuation_prefix: &str,
    ) {
        let fragments = self.block_fragments(element, path, Style::default());
        let lines = wrap_fragments(
            &fragments,
            first_prefix,
            continuation_prefix,
            self.wrap_width,
        );
        self.consume_lines(lines);
    }

    fn render_heading(
        &mut self,
        element: &Element,
        path: &[usize],
        prefix: &str,
        underline: Option<char>,
    ) {
        let base = Style::default().add_modifier(Modifier::BOLD);
        let fragments = self.block_fragments(element, path, base);
        let lines = wrap_fragments(&fragments, prefix, prefix, self.wrap_width);
        self.consume_lines(lines);

        if let Some(underline_char) = underline {
            let width = self.lines.last().map(|line| line_width(line)).unwrap_or(0);
            let underline = underline_string(width, underline_char);
            self.push_plain_line(&underline);
        }
    }

    fn render_code_block(&mut self, element: &Element, path: &[usize], prefix: &str) {
        let fence = self.code_block_fence(prefix);
        self.push_plain_line(&fence);

        let base = Style::default().add_modifier(Modifier::DIM);
        let fragments = self.block_fragments(element, path, base);
        let lines = wrap_fragments(&fragments, prefix, prefix, usize::MAX / 4);
        self.consume_lines(lines);

        self.push_plain_line(&fence);
    }

    /// Items are numbered among items only; a nested list renders one level
    /// deeper without taking a number.
    fn render_list(&mut self, list: &Element, path: &[usize], prefix: &str) {
        let ordered = list.kind == ElementKind::OrderedList;
        let mut number = 0;
        for (idx, child) in list.children.iter().enumerate() {
            let Node::Element(element) = child else {
                continue;
            };
            let mut child_path = path.to_vec();
            child_path.push(idx);
            if element.kind.is_list() {
                let nested_prefix = format!("{prefix}   ");
                self.render_list(element, &child_path, &nested_prefix);
                continue;
            }
            number += 1;
            let marker = if ordered {
                format!("{number}. ")
            } else {
                "• ".to_string()
            };
            let first_prefix = format!("{prefix}{marker}");
            let continuation_prefix = format!("{prefix}{}", " ".repeat(visible_width(&marker)));
            self.render_text_block(element, &child_path, &first_prefix, &continuation_prefix);
        }
    }

    fn render_table(
        &mut self,
        table: &Element,
        path: &[usize],
        prefix: &str,
        selected: Option<Pos>,
    ) {
        let mut rows: Vec<(bool, Vec<TableCell>)> = Vec::new();
        for (section_idx, section) in table.children.iter().enumerate() {
            let Node::Element(section) = section else {
                continue;
            };
            for (row_idx, row) in section.children.iter().enumerate() {
                let Node::Element(row) = row else {
                    continue;
                };
                let mut cells = Vec::new();
                for (cell_idx, cell) in row.children.iter().enumerate() {
                    let Node::Element(cell) = cell else {
                        continue;
                    };
                    let mut cell_path = path.to_vec();
                    cell_path.extend([section_idx, row_idx, cell_idx]);
                    let mut base = Style::default();
                    if matches!(cell.kind, ElementKind::TableHeader { .. }) {
                        base = base.add_modifier(Modifier::BOLD);
                    }
                    if selected.is_some() && cell.kind.cell_pos() == selected {
                        base = base.add_modifier(Modifier::REVERSED);
                    }
                    let fragments = self.block_fragments(cell, &cell_path, base);
                    let outputs = wrap_fragments(&fragments, "", "", usize::MAX / 4);
                    cells.push(TableCell::from_outputs(outputs));
                }
                rows.push((section.kind == ElementKind::TableHead, cells));
            }
        }

        let columns = rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        let widths: Vec<usize> = (0..columns)
            .map(|col| {
                rows.iter()
                    .filter_map(|(_, cells)| cells.get(col))
                    .map(|cell| cell.width)
                    .max()
                    .unwrap_or(0)
                    .max(1)
            })
            .collect();

        self.push_plain_line(&table_border(prefix, &widths, '┌', '┬', '┐'));
        for (is_head, cells) in rows {
            self.consume_lines(vec![table_row_line(prefix, &widths, cells)]);
            if is_head {
                self.push_plain_line(&table_border(prefix, &widths, '├', '┼', '┤'));
            }
        }
        self.push_plain_line(&table_border(prefix, &widths, '└', '┴', '┘'));
    }

    fn push_blank_line(&mut self) {
        self.lines.push(Line::from(""));
        self.current_line_index += 1;
    }

    fn push_plain_line(&mut self, content: &str) {
        let span = Span::raw(content.to_string());
        self.lines.push(Line::from(vec![span]));
        self.current_line_index += 1;
    }

    fn code_block_fence(&self, prefix: &str) -> String {
        const MIN_FENCE_WIDTH: usize = 4;
        let available_width = self.wrap_width.saturating_sub(visible_width(prefix));
        let dash_count = available_width.max(MIN_FENCE_WIDTH);
        format!("{}{}", prefix, "-".repeat(dash_count))
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>) {
        for output in outputs {
            let spans: Vec<Span<'static>> = output
                .spans
                .into_iter()
                .map(|segment| Span::styled(segment.text, segment.style))
                .collect();
            if let Some(column) = output.cursor_columns.first() {
                self.cursor = Some(CursorVisualPosition {
                    line: self.current_line_index,
                    column: *column,
                });
            }
            self.lines.push(Line::from(spans));
            self.current_line_index += 1;
        }
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        let total_lines = self.lines.len();
        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
        }
    }
}

/// One rendered table cell flattened onto a single line.
struct TableCell {
    spans: Vec<LineSegment>,
    cursor: Option<usize>,
    width: usize,
}

impl TableCell {
    fn from_outputs(outputs: Vec<LineOutput>) -> Self {
        let mut spans = Vec::new();
        let mut cursor = None;
        let mut width = 0;
        for output in outputs {
            if cursor.is_none() {
                cursor = output
                    .cursor_columns
                    .first()
                    .map(|column| width + *column as usize);
            }
            for segment in output.spans {
                width += visible_width(&segment.text);
                spans.push(segment);
            }
        }
        Self {
            spans,
            cursor,
            width,
        }
    }
}

fn table_border(prefix: &str, widths: &[usize], left: char, middle: char, right: char) -> String {
    let mut line = String::from(prefix);
    line.push(left);
    for (idx, width) in widths.iter().enumerate() {
        if idx > 0 {
            line.push(middle);
        }
        line.push_str(&"─".repeat(width + 2));
    }
    line.push(right);
    line
}

fn table_row_line(prefix: &str, widths: &[usize], cells: Vec<TableCell>) -> LineOutput {
    let mut builder = LineBuilder::new(prefix.to_string());
    builder.push_raw("│");
    let mut cells = cells.into_iter();
    for width in widths {
        builder.push_raw(" ");
        let cell = cells.next().unwrap_or(TableCell {
            spans: Vec::new(),
            cursor: None,
            width: 0,
        });
        if let Some(offset) = cell.cursor {
            builder.cursor_columns.push((builder.width + offset) as u16);
        }
        for segment in cell.spans {
            builder.width += visible_width(&segment.text);
            builder.segments.push(segment);
        }
        builder.push_raw(&" ".repeat(width.saturating_sub(cell.width) + 1));
        builder.push_raw("│");
    }
    builder.build_line()
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

#[derive(Clone)]
struct LineOutput {
    spans: Vec<LineSegment>,
    cursor_columns: Vec<u16>,
}

#[derive(Clone)]
struct Fragment {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    /// Cursor offsets, in columns from the fragment start.
    cursors: Vec<usize>,
}

#[derive(Clone, Copy)]
enum FragmentKind {
    Word,
    Whitespace,
}

#[derive(Clone)]
enum FragmentItem {
    Token(Fragment),
    LineBreak,
}

fn merge_style(base: Style, marks: Marks) -> Style {
    let mut style = base;
    if marks.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if marks.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if marks.underline {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    style
}

struct StyledRun {
    text: String,
    style: Style,
    cursor: Option<usize>,
}

/// Split a leaf into runs at the uncommon-word boundaries, attaching the
/// cursor to the run holding it.
fn styled_runs(
    text: &str,
    style: Style,
    uncommon: &[Range<usize>],
    cursor: Option<usize>,
) -> Vec<StyledRun> {
    let chars: Vec<char> = text.chars().collect();
    let mut bounds = vec![0, chars.len()];
    for range in uncommon {
        bounds.push(range.start.min(chars.len()));
        bounds.push(range.end.min(chars.len()));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut runs = Vec::new();
    let last = bounds.len().saturating_sub(2);
    for (idx, window) in bounds.windows(2).enumerate() {
        let (start, end) = (window[0], window[1]);
        let flagged = uncommon
            .iter()
            .any(|range| range.start <= start && end <= range.end);
        let run_style = if flagged {
            style.add_modifier(Modifier::UNDERLINED).fg(Color::Yellow)
        } else {
            style
        };
        let run_cursor = cursor
            .filter(|offset| (start..end).contains(offset) || (idx == last && *offset >= end))
            .map(|offset| offset.min(end) - start);
        runs.push(StyledRun {
            text: chars[start..end].iter().collect(),
            style: run_style,
            cursor: run_cursor,
        });
    }
    if runs.is_empty() {
        runs.push(StyledRun {
            text: String::new(),
            style,
            cursor,
        });
    }
    runs
}

fn tokenize_text(
    text: &str,
    style: Style,
    cursor: Option<usize>,
    fragments: &mut Vec<FragmentItem>,
) {
    let mut builder: Option<TokenBuilder> = None;
    let mut pending_cursor = false;
    let mut buffer: Vec<char> = Vec::new();
    for (char_idx, ch) in text.chars().enumerate() {
        if cursor == Some(char_idx) {
            pending_cursor = true;
        }
        if ch == '\r' {
            continue;
        }
        if ch == '\n' {
            if let Some(mut token) = builder.take() {
                token.add_cursor(&mut pending_cursor);
                fragments.push(FragmentItem::Token(token.finish()));
            } else if pending_cursor {
                fragments.push(FragmentItem::Token(Fragment::cursor_only(style)));
                pending_cursor = false;
            }
            fragments.push(FragmentItem::LineBreak);
            continue;
        }

        buffer.clear();
        if ch == '\t' {
            buffer.extend_from_slice(&[' '; 4]);
        } else {
            buffer.push(ch);
        }

        for actual in &buffer {
            let is_whitespace = actual.is_whitespace();
            if builder
                .as_ref()
                .is_some_and(|existing| existing.kind_matches(is_whitespace))
            {
                if let Some(current) = builder.as_mut() {
                    current.add_cursor(&mut pending_cursor);
                    current.push_char(*actual);
                }
            } else {
                if let Some(existing) = builder.take() {
                    fragments.push(FragmentItem::Token(existing.finish()));
                }
                let mut new_builder = TokenBuilder::new(style, is_whitespace);
                new_builder.add_cursor(&mut pending_cursor);
                new_builder.push_char(*actual);
                builder = Some(new_builder);
            }
        }
    }
    if cursor.is_some_and(|offset| offset >= text.chars().count()) {
        pending_cursor = true;
    }

    if let Some(mut token) = builder {
        token.add_cursor(&mut pending_cursor);
        fragments.push(FragmentItem::Token(token.finish()));
    } else if pending_cursor {
        fragments.push(FragmentItem::Token(Fragment::cursor_only(style)));
    }
}

impl Fragment {
    fn cursor_only(style: Style) -> Self {
        Fragment {
            text: String::new(),
            style,
            kind: FragmentKind::Word,
            width: 0,
            cursors: vec![0],
        }
    }
}

struct TokenBuilder {
    text: String,
    style: Style,
    kind: FragmentKind,
    width: usize,
    cursors: Vec<usize>,
}

impl TokenBuilder {
    fn new(style: Style, is_whitespace: bool) -> Self {
        Self {
            text: String::new(),
            style,
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
            cursors: Vec::new(),
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn add_cursor(&mut self, pending: &mut bool) {
        if *pending {
            self.cursors.push(self.width);
            *pending = false;
        }
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            text: self.text,
            style: self.style,
            kind: self.kind,
            width: self.width,
            cursors: self.cursors,
        }
    }
}

fn wrap_fragments(
    fragments: &[FragmentItem],
    first_prefix: &str,
    continuation_prefix: &str,
    width: usize,
) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(first_prefix.to_string());
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment {
            FragmentItem::LineBreak => {
                builder.consume_pending(&mut pending_whitespace);
                outputs.push(builder.build_line());
                builder = LineBuilder::new(continuation_prefix.to_string());
            }
            FragmentItem::Token(token) => match token.kind {
                FragmentKind::Whitespace => {
                    pending_whitespace.push(token.clone());
                }
                FragmentKind::Word => {
                    let whitespace_width: usize =
                        pending_whitespace.iter().map(|item| item.width).sum();
                    if builder.width > builder.prefix_width
                        && builder.width + whitespace_width + token.width > width
                    {
                        builder.consume_pending(&mut pending_whitespace);
                        outputs.push(builder.build_line());
                        builder = LineBuilder::new(continuation_prefix.to_string());
                    }

                    builder.consume_pending(&mut pending_whitespace);
                    builder.append_token(token.clone());
                }
            },
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    cursor_columns: Vec<u16>,
    width: usize,
    prefix_width: usize,
}

impl LineBuilder {
    fn new(prefix: String) -> Self {
        let prefix_width = visible_width(&prefix);
        let mut segments = Vec::new();
        if !prefix.is_empty() {
            segments.push(LineSegment {
                text: prefix,
                style: Style::default(),
            });
        }
        Self {
            segments,
            cursor_columns: Vec::new(),
            width: prefix_width,
            prefix_width,
        }
    }

    fn push_raw(&mut self, text: &str) {
        self.width += visible_width(text);
        self.segments.push(LineSegment {
            text: text.to_string(),
            style: Style::default(),
        });
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        let start = self.width;
        if !fragment.text.is_empty() {
            self.segments.push(LineSegment {
                text: fragment.text,
                style: fragment.style,
            });
            self.width += fragment.width;
        }
        for offset in fragment.cursors {
            self.cursor_columns.push((start + offset) as u16);
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        self.cursor_columns.sort_unstable();
        LineOutput {
            spans: self.segments,
            cursor_columns: self.cursor_columns,
        }
    }
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| visible_width(span.content.as_ref()))
        .sum()
}

fn underline_string(width: usize, ch: char) -> String {
    std::iter::repeat_n(ch, width.max(1)).collect()
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod render_tests;
