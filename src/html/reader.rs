use std::sync::OnceLock;

use regex::Regex;

/// Tag names the converter understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    Html,
    Body,
    P,
    A,
    Ul,
    Ol,
    Li,
    H1,
    H2,
    H3,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
    Img,
    Bold,
    Italic,
    Underline,
    /// Elements whose content is never pasted.
    Ignored,
    Other(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "body" => Tag::Body,
            "p" => Tag::P,
            "a" => Tag::A,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" | "tfoot" => Tag::Tbody,
            "tr" => Tag::Tr,
            "th" => Tag::Th,
            "td" => Tag::Td,
            "img" => Tag::Img,
            "b" | "strong" => Tag::Bold,
            "i" | "em" => Tag::Italic,
            "u" => Tag::Underline,
            "head" | "title" | "script" | "style" | "meta" | "link" => Tag::Ignored,
            other => Tag::Other(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Markup {
    Element {
        tag: Tag,
        attrs: Vec<(String, String)>,
        children: Vec<Markup>,
    },
    Text(String),
}

impl Markup {
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            Markup::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            Markup::Text(_) => None,
        }
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(
            r#"(?s)<!--.*?-->|<![^>]*>|<\?[^>]*>|</\s*([A-Za-z][A-Za-z0-9-]*)\s*>|<([A-Za-z][A-Za-z0-9-]*)((?:\s+[^\s/>="']+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+))?)*)\s*(/?)>"#,
        )
        .expect("Invalid markup token regex")
    })
}

fn attr_regex() -> &'static Regex {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    ATTR.get_or_init(|| {
        Regex::new(r#"([^\s/>="']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+)))?"#)
            .expect("Invalid markup attribute regex")
    })
}

fn is_void(name: &str) -> bool {
    matches!(
        name,
        "img" | "br" | "hr" | "meta" | "link" | "input" | "col" | "source" | "wbr" | "area" | "base"
    )
}

fn is_raw_text(name: &str) -> bool {
    matches!(name, "script" | "style")
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    attr_regex()
        .captures_iter(raw)
        .map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|value| decode(value.as_str()))
                .unwrap_or_default();
            (name, value)
        })
        .collect()
}

struct Frame {
    name: String,
    tag: Tag,
    attrs: Vec<(String, String)>,
    children: Vec<Markup>,
}

impl Frame {
    fn into_markup(self) -> Markup {
        Markup::Element {
            tag: self.tag,
            attrs: self.attrs,
            children: self.children,
        }
    }
}

fn push_child(stack: &mut [Frame], roots: &mut Vec<Markup>, child: Markup) {
    match stack.last_mut() {
        Some(frame) => frame.children.push(child),
        None => roots.push(child),
    }
}

fn close_frame(stack: &mut Vec<Frame>, roots: &mut Vec<Markup>) {
    if let Some(frame) = stack.pop() {
        let markup = frame.into_markup();
        push_child(stack, roots, markup);
    }
}

/// Tolerant reader: unknown or unbalanced tags never fail, unclosed elements
/// are closed at the end of input and stray closing tags are ignored.
pub fn parse(html: &str) -> Vec<Markup> {
    let mut roots = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(found) = token_regex().captures_at(html, pos) else {
            break;
        };
        let Some(whole) = found.get(0) else {
            break;
        };
        if whole.start() > pos {
            push_child(&mut stack, &mut roots, Markup::Text(decode(&html[pos..whole.start()])));
        }
        pos = whole.end();

        if let Some(closing) = found.get(1) {
            let name = closing.as_str().to_ascii_lowercase();
            if let Some(depth) = stack.iter().rposition(|frame| frame.name == name) {
                while stack.len() > depth {
                    close_frame(&mut stack, &mut roots);
                }
            }
            continue;
        }
        let Some(opening) = found.get(2) else {
            continue;
        };
        let name = opening.as_str().to_ascii_lowercase();
        let attrs = found.get(3).map(|raw| parse_attrs(raw.as_str())).unwrap_or_default();
        let self_closing = found.get(4).is_some_and(|slash| !slash.as_str().is_empty());

        if is_raw_text(&name) {
            let close = format!("</{name}");
            let rest = &html[pos..];
            let end = rest.to_ascii_lowercase().find(&close).unwrap_or(rest.len());
            pos += end;
            if let Some(gt) = html[pos..].find('>') {
                pos += gt + 1;
            }
            continue;
        }

        let frame = Frame {
            tag: Tag::from_name(&name),
            name,
            attrs,
            children: Vec::new(),
        };
        if self_closing || is_void(&frame.name) {
            push_child(&mut stack, &mut roots, frame.into_markup());
        } else {
            stack.push(frame);
        }
    }
    if pos < html.len() {
        push_child(&mut stack, &mut roots, Markup::Text(decode(&html[pos..])));
    }
    while !stack.is_empty() {
        close_frame(&mut stack, &mut roots);
    }
    roots
}
