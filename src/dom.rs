// ABOUTME: Owned document snapshot used by the pure page transforms
// ABOUTME: Reads and writes HTML with quick-xml and answers simple CSS selectors

use crate::errors::{FolioError, Result};
use log::debug;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Write as _;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text and must not be tokenized as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// A node of the snapshot tree.
///
/// Text, comment and attribute values are stored in their escaped source form
/// so that a page survives a read/write cycle byte-for-byte in its content.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    Doctype(String),
}

impl Node {
    /// Text node from unescaped text.
    pub fn text(content: &str) -> Self {
        Node::Text(escape(content).into_owned())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attr`]; `value` is escaped.
    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.set_attr(name, &escape(value));
        self
    }

    /// Builder form replacing the whole class list.
    pub fn with_class(mut self, class_list: &str) -> Self {
        self.set_attr("class", class_list);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute to an already escaped value.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self
                .attrs
                .push((name.to_ascii_lowercase(), value.to_string())),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut list: Vec<&str> = self.classes().collect();
        list.push(class);
        let joined = list.join(" ");
        self.set_attr("class", &joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let joined = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("class", &joined);
    }

    /// Flips `class` and reports whether it is now present, like
    /// `DOMTokenList.toggle`.
    pub fn toggle_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            self.remove_class(class);
            false
        } else {
            self.add_class(class);
            true
        }
    }

    /// Sets or clears `class` depending on `on`.
    pub fn set_class(&mut self, class: &str, on: bool) {
        if on {
            self.add_class(class);
        } else {
            self.remove_class(class);
        }
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_element_count(&self) -> usize {
        self.element_children().count()
    }

    /// Concatenated, unescaped text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// First descendant (not `self`) matching `selector`.
    pub fn find(&self, selector: &Selector) -> Option<&Element> {
        let mut ancestors = vec![self];
        find_in(&self.children, selector, &mut ancestors)
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(raw) => match unescape(raw) {
                Ok(text) => out.push_str(&text),
                Err(_) => out.push_str(raw),
            },
            Node::Element(element) => collect_text(&element.children, out),
            _ => {}
        }
    }
}

fn find_in<'a>(
    nodes: &'a [Node],
    selector: &Selector,
    ancestors: &mut Vec<&'a Element>,
) -> Option<&'a Element> {
    for element in nodes.iter().filter_map(Node::as_element) {
        if selector.matches(element, ancestors) {
            return Some(element);
        }
        ancestors.push(element);
        let found = find_in(&element.children, selector, ancestors);
        ancestors.pop();
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Location of a node as child indices from the document root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NodePath(pub Vec<usize>);

/// A parsed page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    /// Parse HTML markup into a snapshot.
    ///
    /// The reader is lenient where HTML differs from XML: void elements need
    /// no closing tag, `script`/`style` bodies are kept verbatim, attributes
    /// may be unquoted or valueless, and stray end tags are ignored.
    pub fn parse(html: &str) -> Result<Self> {
        let mut base = 0;
        let mut reader = lenient_reader(html);

        let mut roots: Vec<Node> = Vec::new();
        let mut open: Vec<Element> = Vec::new();

        loop {
            let position = base + reader.buffer_position();
            let event = reader.read_event().map_err(|e| FolioError::ParseError {
                position,
                message: e.to_string(),
            })?;
            match event {
                Event::Start(start) | Event::Empty(start)
                    if !is_tag_name(start.name().as_ref()) =>
                {
                    // A `<` that does not open a tag is text; resume just after it.
                    attach(&mut open, &mut roots, Node::Text("&lt;".to_string()));
                    base = position + 1;
                    reader = lenient_reader(&html[base..]);
                }
                Event::Start(start) => {
                    let mut element = element_from_start(&start, position)?;
                    if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                        attach(&mut open, &mut roots, Node::Element(element));
                    } else if RAW_TEXT_ELEMENTS.contains(&element.tag.as_str()) {
                        // Raw text is sliced out of the source and the reader
                        // restarted after the closing tag.
                        let body_start = base + reader.buffer_position();
                        let (body, resume) = raw_text_body(html, body_start, &element.tag)
                            .ok_or_else(|| FolioError::ParseError {
                                position,
                                message: format!("unterminated <{}>", element.tag),
                            })?;
                        if !body.is_empty() {
                            element.children.push(Node::Text(body.to_string()));
                        }
                        attach(&mut open, &mut roots, Node::Element(element));
                        base = resume;
                        reader = lenient_reader(&html[resume..]);
                    } else {
                        open.push(element);
                    }
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start, position)?;
                    attach(&mut open, &mut roots, Node::Element(element));
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                    close(&mut open, &mut roots, &name);
                }
                Event::Text(text) => {
                    let raw = String::from_utf8_lossy(&text).into_owned();
                    attach(&mut open, &mut roots, Node::Text(raw));
                }
                Event::CData(data) => {
                    let raw = format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data));
                    attach(&mut open, &mut roots, Node::Text(raw));
                }
                Event::Comment(comment) => {
                    let raw = String::from_utf8_lossy(&comment).into_owned();
                    attach(&mut open, &mut roots, Node::Comment(raw));
                }
                Event::DocType(doctype) => {
                    let raw = String::from_utf8_lossy(&doctype).trim().to_string();
                    attach(&mut open, &mut roots, Node::Doctype(raw));
                }
                Event::Decl(_) | Event::PI(_) => {}
                Event::Eof => break,
            }
        }

        while let Some(element) = open.pop() {
            debug!("Closing unterminated <{}> at end of input", element.tag);
            attach(&mut open, &mut roots, Node::Element(element));
        }

        Ok(Self { nodes: roots })
    }

    /// Serialize back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_node(node, &mut out);
        }
        out
    }

    /// Paths of all elements matching `selector`, in document order.
    pub fn select_paths(&self, selector: &Selector) -> Vec<NodePath> {
        let mut found = Vec::new();
        let mut ancestors = Vec::new();
        let mut path = Vec::new();
        collect_paths(&self.nodes, selector, &mut ancestors, &mut path, &mut found);
        found
    }

    /// Path of the first element matching `selector`.
    pub fn select_first(&self, selector: &Selector) -> Option<NodePath> {
        self.select_paths(selector).into_iter().next()
    }

    /// First element matching a selector given as text.
    pub fn query(&self, selector: &str) -> Result<Option<&Element>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .select_first(&selector)
            .and_then(|path| self.element(&path)))
    }

    /// All elements matching a selector given as text.
    pub fn query_all(&self, selector: &str) -> Result<Vec<&Element>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .select_paths(&selector)
            .iter()
            .filter_map(|path| self.element(path))
            .collect())
    }

    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.nodes.get(*first)?;
        for index in rest {
            node = node.as_element()?.children.get(*index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let (first, rest) = path.0.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for index in rest {
            node = node.as_element_mut()?.children.get_mut(*index)?;
        }
        Some(node)
    }

    pub fn element(&self, path: &NodePath) -> Option<&Element> {
        self.node(path).and_then(Node::as_element)
    }

    pub fn element_mut(&mut self, path: &NodePath) -> Option<&mut Element> {
        self.node_mut(path).and_then(Node::as_element_mut)
    }

    /// Swap the node at `path` for `replacement`, returning the old node.
    pub fn replace(&mut self, path: &NodePath, replacement: Node) -> Option<Node> {
        let slot = self.node_mut(path)?;
        Some(std::mem::replace(slot, replacement))
    }

    /// Insert raw markup as the last child of the first `tag` element.
    ///
    /// Returns false when there is no such element.
    pub fn append_raw(&mut self, tag: &str, raw: &str) -> bool {
        let selector = Selector::parse(tag);
        let Some(path) = selector.ok().and_then(|s| self.select_first(&s)) else {
            return false;
        };
        match self.element_mut(&path) {
            Some(element) => {
                element.children.push(Node::Text(raw.to_string()));
                true
            }
            None => false,
        }
    }
}

fn collect_paths<'a>(
    nodes: &'a [Node],
    selector: &Selector,
    ancestors: &mut Vec<&'a Element>,
    path: &mut Vec<usize>,
    found: &mut Vec<NodePath>,
) {
    for (index, node) in nodes.iter().enumerate() {
        let Node::Element(element) = node else {
            continue;
        };
        path.push(index);
        if selector.matches(element, ancestors) {
            found.push(NodePath(path.clone()));
        }
        ancestors.push(element);
        collect_paths(&element.children, selector, ancestors, path, found);
        ancestors.pop();
        path.pop();
    }
}

fn lenient_reader(source: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(source);
    reader.check_end_names(false);
    reader.trim_text(false);
    reader
}

/// Body of a raw text element starting at `body_start`, and the offset just
/// past its closing tag.
fn raw_text_body<'a>(html: &'a str, body_start: usize, tag: &str) -> Option<(&'a str, usize)> {
    let rest = &html[body_start..];
    let needle = format!("</{}", tag);
    let body_len = rest.to_ascii_lowercase().find(&needle)?;
    let after = body_start + body_len;
    let resume = html[after..]
        .find('>')
        .map(|i| after + i + 1)
        .unwrap_or(html.len());
    Some((&rest[..body_len], resume))
}

fn is_tag_name(name: &[u8]) -> bool {
    name.first().is_some_and(u8::is_ascii_alphabetic)
}

fn element_from_start(start: &BytesStart<'_>, position: usize) -> Result<Element> {
    let mut element = Element::new(&String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.html_attributes() {
        let attr = attr.map_err(|e| FolioError::ParseError {
            position,
            message: e.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        // Values are always written back double-quoted.
        let value = String::from_utf8_lossy(&attr.value).replace('"', "&quot;");
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn attach(open: &mut [Element], roots: &mut Vec<Node>, node: Node) {
    let siblings = match open.last_mut() {
        Some(parent) => &mut parent.children,
        None => roots,
    };
    if let Node::Text(raw) = &node {
        if let Some(Node::Text(previous)) = siblings.last_mut() {
            previous.push_str(raw);
            return;
        }
    }
    siblings.push(node);
}

/// Close the nearest open element named `name`, implicitly closing anything
/// opened after it. A stray end tag with no open counterpart is dropped.
fn close(open: &mut Vec<Element>, roots: &mut Vec<Node>, name: &str) {
    let Some(depth) = open.iter().rposition(|element| element.tag == name) else {
        debug!("Ignoring stray </{}>", name);
        return;
    };
    while open.len() > depth {
        if let Some(element) = open.pop() {
            attach(open, roots, Node::Element(element));
        }
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Element(element) => write_element(element, out),
        Node::Text(raw) => out.push_str(raw),
        Node::Comment(raw) => {
            let _ = write!(out, "<!--{}-->", raw);
        }
        Node::Doctype(raw) => {
            let _ = write!(out, "<!DOCTYPE {}>", raw);
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (key, value) in &element.attrs {
        let _ = write!(out, " {}=\"{}\"", key, value.replace('"', "&quot;"));
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&element.tag.as_str()) {
        return;
    }
    for child in &element.children {
        write_node(child, out);
    }
    let _ = write!(out, "</{}>", element.tag);
}

/// How an attribute value is compared in `[name op "value"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatch {
    Exists,
    Equals(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrMatch)>,
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, op)| match (element.attr(name), op) {
            (None, _) => false,
            (Some(_), AttrMatch::Exists) => true,
            (Some(value), AttrMatch::Equals(expected)) => value == expected,
            (Some(value), AttrMatch::Prefix(prefix)) => value.starts_with(prefix.as_str()),
        })
    }
}

/// The subset of CSS selectors the page scripts rely on: type, `#id`,
/// `.class`, `[attr]`, `[attr="v"]`, `[attr^="v"]`, the descendant combinator
/// and comma-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for group in split_top_level(source, ',') {
            let mut chain = Vec::new();
            for part in split_top_level(&group, ' ') {
                chain.push(parse_compound(&part, source)?);
            }
            if chain.is_empty() {
                return Err(FolioError::SelectorError(source.to_string()));
            }
            alternatives.push(chain);
        }
        if alternatives.is_empty() {
            return Err(FolioError::SelectorError(source.to_string()));
        }
        Ok(Self { alternatives })
    }

    /// Whether `element`, sitting under `ancestors` (outermost first), matches.
    pub fn matches(&self, element: &Element, ancestors: &[&Element]) -> bool {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(chain, element, ancestors))
    }
}

fn chain_matches(chain: &[Compound], element: &Element, ancestors: &[&Element]) -> bool {
    let Some((last, rest)) = chain.split_last() else {
        return false;
    };
    if !last.matches(element) {
        return false;
    }
    let mut remaining = rest.iter().rev().peekable();
    for ancestor in ancestors.iter().rev() {
        match remaining.peek() {
            Some(compound) if compound.matches(ancestor) => {
                remaining.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    remaining.peek().is_none()
}

/// Split on `sep` outside of `[...]` and quotes, dropping empty pieces.
fn split_top_level(source: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut bracket = false;
    let mut quote: Option<char> = None;
    for ch in source.chars() {
        match (ch, quote) {
            ('"' | '\'', None) if bracket => {
                quote = Some(ch);
                current.push(ch);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(ch);
            }
            (_, Some(_)) => current.push(ch),
            ('[', None) => {
                bracket = true;
                current.push(ch);
            }
            (']', None) => {
                bracket = false;
                current.push(ch);
            }
            (c, None) if !bracket && (c == sep || (sep == ' ' && c.is_whitespace())) => {
                if !current.trim().is_empty() {
                    parts.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

fn parse_compound(part: &str, source: &str) -> Result<Compound> {
    let invalid = || FolioError::SelectorError(source.to_string());
    let mut compound = Compound::default();
    let mut rest = part;

    let tag_len = rest
        .find(|c: char| c == '#' || c == '.' || c == '[')
        .unwrap_or(rest.len());
    if tag_len > 0 {
        let tag = &rest[..tag_len];
        if tag != "*" {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_len..];
    }

    while let Some(first) = rest.chars().next() {
        match first {
            '#' | '.' => {
                let body = &rest[1..];
                let len = body
                    .find(|c: char| c == '#' || c == '.' || c == '[')
                    .unwrap_or(body.len());
                if len == 0 {
                    return Err(invalid());
                }
                let name = body[..len].to_string();
                if first == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                rest = &body[len..];
            }
            '[' => {
                let close = rest.find(']').ok_or_else(invalid)?;
                let inner = &rest[1..close];
                compound.attrs.push(parse_attr_match(inner).ok_or_else(invalid)?);
                rest = &rest[close + 1..];
            }
            _ => return Err(invalid()),
        }
    }
    Ok(compound)
}

fn parse_attr_match(inner: &str) -> Option<(String, AttrMatch)> {
    let unquote = |v: &str| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    if let Some((name, value)) = inner.split_once("^=") {
        return Some((name.trim().to_ascii_lowercase(), AttrMatch::Prefix(unquote(value))));
    }
    if let Some((name, value)) = inner.split_once('=') {
        return Some((name.trim().to_ascii_lowercase(), AttrMatch::Equals(unquote(value))));
    }
    let name = inner.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_ascii_lowercase(), AttrMatch::Exists))
}
