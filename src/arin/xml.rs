//! Minimal XML plumbing shared by every registry payload.
//!
//! Writing is done by [`XmlWriter`], which knows the two recurring shapes of
//! the Reg-RWS schema: a namespaced root element and multi-line text fields
//! wrapped in numbered `<line number="N">` elements. Reading parses the whole
//! response into an [`XmlNode`] tree with `quick-xml` and lets payloads pick
//! fields by local name, so namespace prefixes in responses do not matter.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

/// Namespace of the core Reg-RWS payloads.
pub const CORE_NS: &str = "http://www.arin.net/regrws/core/v1";
/// Namespace of the RPKI payloads (ROA).
pub const RPKI_NS: &str = "http://www.arin.net/regrws/rpki/v1";

/// Payloads that serialize to a standalone registry document.
pub trait ToXml {
    fn to_xml(&self) -> String;
}

/// Payloads that can be read back from a registry response body.
pub trait FromXml: Sized {
    const ROOT: &'static str;

    fn from_node(node: &XmlNode) -> Result<Self, ParseError>;

    fn from_xml(text: &str) -> Result<Self, ParseError> {
        let root = XmlNode::parse(text)?;
        if root.name != Self::ROOT {
            return Err(ParseError::UnexpectedRoot {
                expected: Self::ROOT,
                found: root.name,
            });
        }
        Self::from_node(&root)
    }
}

pub struct XmlWriter {
    out: String,
    open: Vec<String>,
}

impl XmlWriter {
    /// Start a document whose root element carries `xmlns`.
    pub fn root(name: &str, namespace: &str) -> Self {
        let mut writer = Self::fragment();
        writer.open_with(name, &[("xmlns", namespace)]);
        writer
    }

    /// Start an unrooted fragment, used for elements embedded in another payload.
    pub fn fragment() -> Self {
        Self {
            out: String::new(),
            open: Vec::new(),
        }
    }

    pub fn open(&mut self, name: &str) -> &mut Self {
        self.open_with(name, &[])
    }

    pub fn open_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> &mut Self {
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&escape(*value));
            self.out.push('"');
        }
        self.out.push('>');
        self.open.push(name.to_string());
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if let Some(name) = self.open.pop() {
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push('>');
        }
        self
    }

    /// `<name>value</name>`; an empty value still produces both tags.
    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.open(name);
        self.out.push_str(&escape(value));
        self.close()
    }

    /// Like [`XmlWriter::text`] but emits nothing for `None`.
    pub fn opt_text(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.text(name, value);
        }
        self
    }

    /// Multi-line field: one `<line number="N">` per line, numbered from 0.
    /// `None` omits the element, `Some("")` emits a single empty line.
    pub fn lines(&mut self, name: &str, value: Option<&str>) -> &mut Self {
        let Some(value) = value else {
            return self;
        };
        self.open(name);
        for (number, line) in value.split('\n').enumerate() {
            let number = number.to_string();
            self.open_with("line", &[("number", &number)]);
            self.out.push_str(&escape(line.trim_end_matches('\r')));
            self.close();
        }
        self.close()
    }

    /// Append an already-serialized fragment verbatim.
    pub fn raw(&mut self, fragment: &str) -> &mut Self {
        self.out.push_str(fragment);
        self
    }

    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.close();
        }
        self.out
    }
}

/// A parsed element: local name, attributes, direct text and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn parse(text: &str) -> Result<XmlNode, ParseError> {
        let mut reader = Reader::from_str(text);

        let mut stack: Vec<XmlNode> = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(Self::from_start(&start)?),
                Ok(Event::Empty(start)) => {
                    let node = Self::from_start(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Ok(node),
                    }
                }
                Ok(Event::Text(t)) => {
                    let value = t
                        .unescape()
                        .map_err(|e| ParseError::Malformed(e.to_string()))?;
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&value);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Ok(Event::End(_)) => {
                    let Some(mut node) = stack.pop() else {
                        return Err(ParseError::Malformed("unbalanced end tag".into()));
                    };
                    // indentation between child elements; leaf text stays verbatim
                    if !node.children.is_empty() && node.text.trim().is_empty() {
                        node.text.clear();
                    }
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => return Ok(node),
                    }
                }
                Ok(Event::Eof) => {
                    return Err(match stack.first() {
                        Some(open) => {
                            ParseError::Malformed(format!("unterminated element <{}>", open.name))
                        }
                        None => ParseError::MissingRoot,
                    });
                }
                Ok(_) => {}
                Err(e) => return Err(ParseError::Malformed(e.to_string())),
            }
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<XmlNode, ParseError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::Malformed(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            if key == "xmlns" || attr.key.as_ref().starts_with(b"xmlns:") {
                continue;
            }
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::Malformed(e.to_string()))?;
            attrs.push((key, value.into_owned()));
        }
        Ok(XmlNode {
            name,
            attrs,
            ..Default::default()
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a `/`-separated path of child names.
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        path.split('/').try_fold(self, |node, name| node.child(name))
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Text of the element at `path`; `None` when the element is absent.
    pub fn text_at(&self, path: &str) -> Option<String> {
        self.find(path).map(|n| n.text.clone())
    }

    /// Like [`XmlNode::text_at`] but treats an empty element as absent. Used for
    /// server-assigned fields, which are blank until the registry fills them.
    pub fn assigned_at(&self, path: &str) -> Option<String> {
        self.text_at(path).filter(|s| !s.is_empty())
    }

    /// Rejoin a numbered-line field in `number` order.
    pub fn lines_at(&self, path: &str) -> Option<String> {
        let node = self.find(path)?;
        let mut lines: Vec<(u32, &str)> = node
            .children_named("line")
            .enumerate()
            .map(|(i, line)| {
                let number = line
                    .attr("number")
                    .and_then(|n| n.trim().parse().ok())
                    .unwrap_or(i as u32);
                (number, line.text.as_str())
            })
            .collect();
        if lines.is_empty() {
            return Some(node.text.clone());
        }
        lines.sort_by_key(|(number, _)| *number);
        Some(
            lines
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Parse the text at `path` with `FromStr`, mapping failures to `ParseError`.
    pub fn parse_at<T: std::str::FromStr>(&self, path: &str) -> Result<Option<T>, ParseError> {
        match self.assigned_at(path) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ParseError::InvalidField {
                    field: path.to_string(),
                    value: raw,
                }),
        }
    }
}
