//! Stubs for HTML-like documents.
//!
//! The document is read with a tolerant `quick_xml` reader into a small node
//! tree: end-tag names are not checked, unmatched end tags are dropped, HTML
//! void elements never take children and unclosed elements are closed at end
//! of input. `<script>` and `<style>` bodies are raw text and never tokenized,
//! and a `<` that cannot start a tag is kept as `&lt;` text. The tree is then
//! compacted and written back pretty-printed.

use log;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use std::borrow::Cow;

/// Direct children kept in long lists, tables and selects.
pub const HTML_TRUNCATE_ITEMS: usize = 2;

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];
const LANDMARK_ELEMENTS: [&str; 4] = ["nav", "header", "footer", "aside"];
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Element {
    /// Lowercased, used for matching.
    name: String,
    /// Name as written, used for the closing tag.
    tag_name: String,
    /// Everything between `<` and `>` of the start tag.
    start_tag: String,
    children: Vec<Node>,
    leaf: bool,
}

impl Element {
    fn new(tag_name: &[u8], start_tag: &[u8], leaf: bool) -> Self {
        let tag_name = String::from_utf8_lossy(tag_name).into_owned();
        Self {
            name: tag_name.to_lowercase(),
            tag_name,
            start_tag: String::from_utf8_lossy(start_tag).trim_end().to_string(),
            children: Vec::new(),
            leaf,
        }
    }

    fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

fn list_child_name(container: &str) -> Option<&'static str> {
    match container {
        "ul" | "ol" => Some("li"),
        "tbody" => Some("tr"),
        "select" => Some("option"),
        _ => None,
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Element>,
}

impl TreeBuilder {
    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn open(&mut self, element: Element) {
        self.stack.push(element);
    }

    fn close(&mut self, name: &str) {
        let Some(pos) = self.stack.iter().rposition(|el| el.is(name)) else {
            log::trace!("Dropping unmatched end tag </{}>", name);
            return;
        };
        while self.stack.len() > pos {
            let Some(element) = self.stack.pop() else {
                break;
            };
            self.attach(Node::Element(element));
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(element) = self.stack.pop() {
            self.attach(Node::Element(element));
        }
        self.root
    }
}

/// A `<` that cannot open a tag is text.
static BARE_LT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([^A-Za-z/!?]|$)").expect("bare '<' pattern is valid"));

fn escape_bare_lt(content: &str) -> Cow<'_, str> {
    BARE_LT.replace_all(content, "&lt;${1}")
}

fn new_reader(input: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    reader
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Body of a raw-text element starting at `body_start`, and the offset just
/// past its end tag. The body runs to the next case-insensitive `</name`.
fn raw_text_body<'a>(content: &'a str, body_start: usize, name: &str) -> (&'a str, usize) {
    let rest = content.get(body_start..).unwrap_or_default();
    let end_tag = format!("</{}", name);
    let Some(end) = rest.to_ascii_lowercase().find(&end_tag) else {
        return (rest, content.len());
    };
    let after_name = end + end_tag.len();
    let resume = rest[after_name..]
        .find('>')
        .map_or(content.len(), |gt| body_start + after_name + gt + 1);
    (&rest[..end], resume)
}

fn parse(content: &str) -> Result<Vec<Node>, quick_xml::Error> {
    let mut builder = TreeBuilder::default();
    let mut offset = 0;

    // Raw-text bodies are cut out by hand, then tokenizing resumes after them.
    'segments: while offset < content.len() {
        let segment = &content[offset..];
        let mut reader = new_reader(segment);
        loop {
            let before = position(&reader);
            match reader.read_event()? {
                Event::Start(e) => {
                    let mut element = Element::new(e.name().as_ref(), &e, false);
                    if RAW_TEXT_ELEMENTS.contains(&element.name.as_str()) {
                        let body_start = offset + position(&reader);
                        let (body, resume) = raw_text_body(content, body_start, &element.name);
                        if !body.trim().is_empty() {
                            element.children.push(Node::Text(body.trim().to_string()));
                        }
                        builder.attach(Node::Element(element));
                        offset = resume;
                        continue 'segments;
                    } else if VOID_ELEMENTS.contains(&element.name.as_str()) {
                        element.leaf = true;
                        builder.attach(Node::Element(element));
                    } else {
                        builder.open(element);
                    }
                }
                Event::Empty(e) => {
                    builder.attach(Node::Element(Element::new(e.name().as_ref(), &e, true)));
                }
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                    builder.close(&name);
                }
                Event::Text(t) => {
                    let text = String::from_utf8_lossy(&t);
                    if !text.trim().is_empty() {
                        builder.attach(Node::Text(text.trim().to_string()));
                    }
                }
                Event::Comment(c) => {
                    builder.attach(Node::Comment(String::from_utf8_lossy(&c).into_owned()));
                }
                Event::CData(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                    let raw = segment
                        .get(before..position(&reader))
                        .unwrap_or_default()
                        .trim();
                    builder.attach(Node::Raw(raw.to_string()));
                }
                Event::Eof => break 'segments,
            }
        }
    }
    Ok(builder.finish())
}

fn compact_nodes(nodes: &mut [Node]) {
    for node in nodes {
        if let Node::Element(element) = node {
            compact_element(element);
        }
    }
}

fn compact_element(element: &mut Element) {
    if RAW_TEXT_ELEMENTS.contains(&element.name.as_str()) {
        if !element.children.is_empty() {
            element.children = vec![Node::Text(format!(
                "// ... Inline {} omitted ...",
                element.name
            ))];
        }
        return;
    }

    if LANDMARK_ELEMENTS.contains(&element.name.as_str()) {
        element.children = vec![Node::Comment(format!(
            " ... Full '{}' omitted ... ",
            element.name
        ))];
        return;
    }

    if let Some(child_name) = list_child_name(&element.name) {
        let is_item = |node: &Node| matches!(node, Node::Element(el) if el.is(child_name));
        let total = element.children.iter().filter(|n| is_item(n)).count();
        if total > HTML_TRUNCATE_ITEMS {
            let mut seen = 0;
            element.children.retain(|node| {
                if is_item(node) {
                    seen += 1;
                    seen <= HTML_TRUNCATE_ITEMS
                } else {
                    true
                }
            });
            element.children.push(Node::Comment(format!(
                " ... {} more '{}' omitted ... ",
                total - HTML_TRUNCATE_ITEMS,
                child_name
            )));
        }
    }

    compact_nodes(&mut element.children);
}

fn render_nodes(nodes: &[Node], depth: usize, out: &mut String) {
    let indent = " ".repeat(depth);
    for node in nodes {
        match node {
            Node::Element(el) if el.leaf => {
                out.push_str(&format!("{}<{}/>\n", indent, el.start_tag));
            }
            Node::Element(el) => {
                out.push_str(&format!("{}<{}>\n", indent, el.start_tag));
                render_nodes(&el.children, depth + 1, out);
                out.push_str(&format!("{}</{}>\n", indent, el.tag_name));
            }
            Node::Text(text) => out.push_str(&format!("{}{}\n", indent, text)),
            Node::Comment(text) => out.push_str(&format!("{}<!--{}-->\n", indent, text)),
            Node::Raw(raw) => out.push_str(&format!("{}{}\n", indent, raw)),
        }
    }
}

pub fn stub(content: &str) -> String {
    let escaped = escape_bare_lt(content);
    let mut nodes = match parse(&escaped) {
        Ok(nodes) => nodes,
        Err(e) => {
            log::warn!("HTML parse failed ({}), returning raw.", e);
            return content.to_string();
        }
    };
    compact_nodes(&mut nodes);
    let mut out = String::with_capacity(content.len() / 2);
    render_nodes(&nodes, 0, &mut out);
    out
}
