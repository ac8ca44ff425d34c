//! Streaming selector matching over a compiled rule set.
//!
//! The matcher follows element start and end events in document order and
//! keeps one set of automaton states per open element. Nothing of the
//! document is retained beyond the open elements and, for each of them, the
//! states of its last closed child.

mod evaluate;
mod streaming;

pub use streaming::Matcher;

/// The XHTML namespace. Only elements in it take their language from a plain
/// `lang` attribute.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Declared type of an attribute, as far as selectors care.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    #[default]
    Cdata,
    /// An identifier attribute; `#value` tests these.
    Id,
}

/// An attribute of an element start event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Namespace URI, `None` for un-namespaced attributes.
    pub namespace: Option<String>,
    pub local_name: String,
    /// Qualified name as written, e.g. `xml:lang`.
    pub qname: String,
    pub value: String,
    pub kind: AttributeKind,
}

impl Attribute {
    /// An un-namespaced attribute whose qualified name is its local name.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            namespace: None,
            local_name: name.to_owned(),
            qname: name.to_owned(),
            value: value.to_owned(),
            kind: AttributeKind::Cdata,
        }
    }

    /// The same attribute, typed as an identifier.
    #[must_use]
    pub fn into_id(mut self) -> Self {
        self.kind = AttributeKind::Id;
        self
    }

    /// Namespace URI with the empty string folded into `None`.
    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|uri| !uri.is_empty())
    }
}

/// Matcher settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatcherConfig {
    /// Language of the document root when no element declares one.
    pub default_language: String,
    /// Log every element and state transition at trace level.
    pub trace: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            default_language: "en-GB".to_owned(),
            trace: false,
        }
    }
}
