//! A small element tree for inspecting TISS documents.
//!
//! Lookups go by local name so `ans:numeroLote`, `numeroLote` and `tiss:numeroLote` all match;
//! payers are inconsistent about prefixes, especially inside SOAP responses.

use crate::error::{IntegrityError, IntegrityResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// XML declaration values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `ans:mensagemTISS`
    pub name: String,
    pub local_name: String,
    pub attributes: Vec<(String, String)>,
    /// Direct text content, trimmed
    pub text: String,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub declaration: Option<Declaration>,
    pub root: Element,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> IntegrityResult<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| IntegrityError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| IntegrityError::Xml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            local_name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    /// Namespace prefix of this element, if any
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of a namespace declaration bound to `prefix` (`None` for the default namespace)
    pub fn namespace_for(&self, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some(prefix) => self.attribute(&format!("xmlns:{}", prefix)),
            None => self.attribute("xmlns"),
        }
    }

    /// First direct child with the given local name
    pub fn child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name == local_name)
    }

    /// All direct children with the given local name
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.local_name == local_name)
    }

    /// Every element below this one, depth first, in document order
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(element) = stack.pop() {
            out.push(element);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    /// First descendant with the given local name
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        self.descendants()
            .into_iter()
            .find(|e| e.local_name == local_name)
    }

    pub fn find_all(&self, local_name: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|e| e.local_name == local_name)
            .collect()
    }

    /// Trimmed text of the first descendant with the given local name, if non-empty
    pub fn text_of(&self, local_name: &str) -> Option<&str> {
        self.find(local_name)
            .map(|e| e.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// True when the element carries no child elements
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Non-empty text values of this subtree in document order
    pub fn leaf_values(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if !self.text.is_empty() {
            out.push(self.text.as_str());
        }
        for element in self.descendants() {
            if !element.text.is_empty() {
                out.push(element.text.as_str());
            }
        }
        out
    }
}

/// Parse a document into an element tree.
pub fn parse(doc: &str) -> IntegrityResult<Document> {
    let mut reader = Reader::from_str(doc);
    reader.config_mut().trim_text(false);

    let mut declaration = None;
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Decl(decl) => {
                let version = decl
                    .version()
                    .map(|v| String::from_utf8_lossy(&v).into_owned())
                    .unwrap_or_default();
                let encoding = decl
                    .encoding()
                    .and_then(|e| e.ok())
                    .map(|e| String::from_utf8_lossy(&e).into_owned());
                declaration = Some(Declaration { version, encoding });
            }
            Event::Start(start) => {
                if root.is_some() {
                    return Err(IntegrityError::Structure(
                        "content after the root element".to_string(),
                    ));
                }
                stack.push(Element::from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack.pop().ok_or_else(|| {
                    IntegrityError::Structure("unbalanced closing tag".to_string())
                })?;
                element.text = element.text.trim().to_string();
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(IntegrityError::Structure(format!(
            "unclosed element <{}>",
            stack.last().map(|e| e.name.as_str()).unwrap_or_default()
        )));
    }

    let root = root.ok_or_else(|| IntegrityError::Structure("document has no root element".to_string()))?;
    Ok(Document { declaration, root })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> IntegrityResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_some() {
                return Err(IntegrityError::Structure(
                    "document has more than one root element".to_string(),
                ));
            }
            *root = Some(element);
        }
    }
    Ok(())
}
