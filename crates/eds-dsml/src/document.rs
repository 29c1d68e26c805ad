//! Immutable, queryable view of one DSML response.

use crate::query::{Axis, QName, QueryPattern, Step, DSML_VALUE_QUERY};
use crate::Result;
use eds_core::Error;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Deepest element nesting a response may have.
pub const MAX_DEPTH: usize = 256;

static STANDARD_QUERY: OnceLock<Result<QueryPattern>> = OnceLock::new();

/// [`DSML_VALUE_QUERY`], parsed on first use.
fn standard_query() -> &'static Result<QueryPattern> {
    STANDARD_QUERY.get_or_init(|| QueryPattern::parse(DSML_VALUE_QUERY))
}

/// Element or attribute name with its resolved namespace.
#[derive(Debug, Clone)]
struct NodeName {
    prefix: Option<String>,
    local: String,
    namespace: Option<String>,
}

#[derive(Debug, Clone)]
struct Element {
    /// Position in document order.
    index: usize,
    name: NodeName,
    attributes: Vec<(NodeName, String)>,
    children: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn child_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Collects this element (optionally) and all descendants in document order.
    fn collect_subtree<'a>(&'a self, include_self: bool, out: &mut Vec<&'a Element>) {
        let mut pending: Vec<&'a Element> = Vec::new();
        if include_self {
            pending.push(self);
        } else {
            pending.extend(self.child_elements().rev());
        }
        while let Some(element) = pending.pop() {
            out.push(element);
            pending.extend(element.child_elements().rev());
        }
    }

    /// Concatenated direct text and CDATA children.
    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    fn attribute(&self, name: &QName, scope: &[(String, String)]) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| name_matches(name, attr, scope))
            .map(|(_, value)| value.as_str())
    }
}

/// A parsed directory response.
///
/// Built once from the raw response bytes and never mutated afterwards.
/// Every query goes through the [`QueryPattern`] supplied at construction,
/// which defaults to [`DSML_VALUE_QUERY`].
#[derive(Clone)]
pub struct ResponseDocument {
    raw: Vec<u8>,
    root: Element,
    /// Namespace bindings in scope on the root element (prefix, uri); the
    /// empty prefix is the default namespace.
    root_scope: Vec<(String, String)>,
    query: QueryPattern,
    element_count: usize,
}

impl ResponseDocument {
    /// Parses raw response bytes using the standard attribute-value query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the bytes are not well-formed XML or
    /// nest elements deeper than [`MAX_DEPTH`].
    pub fn build(raw: impl Into<Vec<u8>>) -> Result<Self> {
        let query = standard_query().clone()?;
        Self::with_query(raw, query)
    }

    /// Parses raw response bytes, answering queries with `query`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the bytes are not well-formed XML.
    pub fn with_query(raw: impl Into<Vec<u8>>, query: QueryPattern) -> Result<Self> {
        let raw = raw.into();
        let text = std::str::from_utf8(&raw)
            .map_err(|e| Error::ParseError(format!("response is not valid UTF-8: {e}")))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let (root, root_scope, element_count) = TreeBuilder::default().parse(text)?;
        debug!(
            bytes = raw.len(),
            elements = element_count,
            "parsed DSML response"
        );

        Ok(Self {
            raw,
            root,
            root_scope,
            query,
            element_count,
        })
    }

    /// Every value of `attribute`, in document order.
    ///
    /// An attribute absent from the document yields an empty list.
    #[must_use]
    pub fn query_values(&self, attribute: &str) -> Vec<String> {
        self.evaluate(self.query.steps(), attribute)
            .into_iter()
            .map(Element::text)
            .collect()
    }

    /// The first value of `attribute`, or `None` if it has no values.
    #[must_use]
    pub fn query_first_value(&self, attribute: &str) -> Option<String> {
        self.evaluate(self.query.steps(), attribute)
            .first()
            .map(|element| element.text())
    }

    /// Number of nodes selected by the query's first step (the `dsml:entry`
    /// elements for the standard query).
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.evaluate(&self.query.steps()[..1], "").len()
    }

    /// Total number of elements in the document.
    #[must_use]
    pub const fn element_count(&self) -> usize {
        self.element_count
    }

    /// The response body this document was built from.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// The query used to answer attribute lookups.
    #[must_use]
    pub const fn query(&self) -> &QueryPattern {
        &self.query
    }

    fn evaluate(&self, steps: &[Step], bound: &str) -> Vec<&Element> {
        let mut context: Vec<&Element> = Vec::new();

        for (position, step) in steps.iter().enumerate() {
            let mut candidates = Vec::new();
            if position == 0 {
                // The context of the first step is the document node, whose
                // only child is the root element.
                match step.axis {
                    Axis::Child => candidates.push(&self.root),
                    Axis::Descendant => self.root.collect_subtree(true, &mut candidates),
                }
            } else {
                for element in &context {
                    match step.axis {
                        Axis::Child => candidates.extend(element.child_elements()),
                        Axis::Descendant => element.collect_subtree(false, &mut candidates),
                    }
                }
            }

            candidates.retain(|element| self.step_matches(step, element, bound));
            candidates.sort_by_key(|element| element.index);
            candidates.dedup_by_key(|element| element.index);
            context = candidates;

            if context.is_empty() {
                break;
            }
        }

        context
    }

    fn step_matches(&self, step: &Step, element: &Element, bound: &str) -> bool {
        if !name_matches(&step.name, &element.name, &self.root_scope) {
            return false;
        }
        match &step.predicate {
            None => true,
            Some(predicate) => element
                .attribute(&predicate.attribute, &self.root_scope)
                .is_some_and(|value| value == predicate.value.resolve(bound)),
        }
    }
}

impl fmt::Debug for ResponseDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseDocument")
            .field("bytes", &self.raw.len())
            .field("elements", &self.element_count)
            .field("query", &self.query.as_str())
            .finish()
    }
}

/// Matches a pattern name against a document name.
///
/// A pattern prefix bound on the root compares namespace URIs; an unbound
/// prefix falls back to comparing the literal prefix. Unprefixed pattern names
/// only match names outside any namespace.
fn name_matches(pattern: &QName, name: &NodeName, scope: &[(String, String)]) -> bool {
    if pattern.local() != name.local {
        return false;
    }
    match pattern.prefix() {
        None => name.namespace.is_none(),
        Some(prefix) => match lookup(scope, prefix) {
            Some(uri) => name.namespace.as_deref() == Some(uri),
            None => name.prefix.as_deref() == Some(prefix),
        },
    }
}

fn lookup<'a>(scope: &'a [(String, String)], prefix: &str) -> Option<&'a str> {
    if prefix == "xml" {
        return Some(XML_NAMESPACE);
    }
    scope
        .iter()
        .rev()
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.as_str())
        .filter(|uri| !uri.is_empty())
}

/// Event-driven construction of the element tree.
#[derive(Default)]
struct TreeBuilder {
    /// Open elements, innermost last, each with the number of namespace
    /// bindings it pushed onto `scope`.
    open: Vec<(Element, usize)>,
    scope: Vec<(String, String)>,
    root: Option<(Element, Vec<(String, String)>)>,
    root_scope: Option<Vec<(String, String)>>,
    next_index: usize,
}

impl TreeBuilder {
    fn parse(mut self, text: &str) -> Result<(Element, Vec<(String, String)>, usize)> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().check_end_names = true;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::ParseError(format!(
                    "malformed XML at byte {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(start) => {
                    let (element, pushed) = self.open_element(&start)?;
                    self.open.push((element, pushed));
                }
                Event::Empty(start) => {
                    let (element, pushed) = self.open_element(&start)?;
                    self.close_element(element, pushed);
                }
                Event::End(_) => {
                    let (element, pushed) = self
                        .open
                        .pop()
                        .ok_or_else(|| Error::ParseError("unexpected closing tag".into()))?;
                    self.close_element(element, pushed);
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| Error::ParseError(format!("invalid text content: {e}")))?;
                    self.push_text(&text)?;
                }
                Event::CData(cdata) => {
                    let text = std::str::from_utf8(&cdata)
                        .map_err(|e| Error::ParseError(format!("invalid CDATA content: {e}")))?;
                    self.push_text(text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some((element, _)) = self.open.last() {
            return Err(Error::ParseError(format!(
                "unclosed element <{}>",
                display_name(&element.name)
            )));
        }

        match self.root {
            Some((root, scope)) => Ok((root, scope, self.next_index)),
            None => Err(Error::ParseError("document has no root element".into())),
        }
    }

    fn open_element(&mut self, start: &BytesStart<'_>) -> Result<(Element, usize)> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(Error::ParseError(
                "content after the root element".into(),
            ));
        }
        if self.open.len() >= MAX_DEPTH {
            return Err(Error::ParseError(format!(
                "document nesting too deep (limit {MAX_DEPTH})"
            )));
        }

        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::ParseError(format!("invalid attribute: {e}")))?;
            let key = utf8(attr.key.as_ref())?.to_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::ParseError(format!("invalid attribute value: {e}")))?
                .into_owned();

            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_owned(), value));
            } else {
                raw_attributes.push((key, value));
            }
        }

        let pushed = declarations.len();
        self.scope.extend(declarations);

        let qualified = utf8(start.name().as_ref())?.to_owned();
        let (prefix, local) = split_qualified(&qualified);
        let namespace = lookup(&self.scope, prefix.unwrap_or("")).map(str::to_owned);
        let name = NodeName {
            prefix: prefix.map(str::to_owned),
            local: local.to_owned(),
            namespace,
        };

        // Unprefixed attributes are never in a namespace.
        let attributes = raw_attributes
            .into_iter()
            .map(|(key, value)| {
                let (prefix, local) = split_qualified(&key);
                let namespace = prefix.and_then(|p| lookup(&self.scope, p)).map(str::to_owned);
                let name = NodeName {
                    prefix: prefix.map(str::to_owned),
                    local: local.to_owned(),
                    namespace,
                };
                (name, value)
            })
            .collect();

        if self.open.is_empty() {
            self.root_scope = Some(self.scope.clone());
        }

        let element = Element {
            index: self.next_index,
            name,
            attributes,
            children: Vec::new(),
        };
        self.next_index += 1;
        Ok((element, pushed))
    }

    fn close_element(&mut self, element: Element, pushed: usize) {
        self.scope.truncate(self.scope.len() - pushed);
        match self.open.last_mut() {
            Some((parent, _)) => parent.children.push(Node::Element(element)),
            None => {
                let scope = self.root_scope.take().unwrap_or_default();
                self.root = Some((element, scope));
            }
        }
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        match self.open.last_mut() {
            Some((parent, _)) => {
                if !text.is_empty() {
                    parent.children.push(Node::Text(text.to_owned()));
                }
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(Error::ParseError(
                "text outside the root element".into(),
            )),
        }
    }
}

fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::ParseError(format!("invalid name: {e}")))
}

fn display_name(name: &NodeName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{prefix}:{}", name.local),
        None => name.local.clone(),
    }
}
