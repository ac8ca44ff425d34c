//! The automaton alphabet.

use crate::symbols::{Symbol, SymbolReader, SymbolTable};
use css_selectors::ElementSelector;

/// Namespace axis of an element event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamespaceTest {
    /// Any namespace, including none.
    Any,
    /// Elements without a namespace.
    NoNamespace,
    Uri(Symbol),
}

/// Local name axis of an element event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameTest {
    Any,
    Name(Symbol),
}

/// Transition label between automaton states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {
    /// An element start, with a wildcard allowed on either axis.
    Element {
        namespace: NamespaceTest,
        local_name: NameTest,
    },
    /// Step from an element to its immediately following sibling.
    Sibling,
}

impl Event {
    /// The `*|*` event, which is also what a bare `*` selector compiles to.
    pub const ANY_ELEMENT: Self = Self::Element {
        namespace: NamespaceTest::Any,
        local_name: NameTest::Any,
    };

    /// Event for a type or universal selector, interning its names.
    pub fn for_selector(element: &ElementSelector, symbols: &mut SymbolTable) -> Self {
        Self::Element {
            namespace: match element.namespace.as_deref() {
                None => NamespaceTest::Any,
                Some("") => NamespaceTest::NoNamespace,
                Some(uri) => NamespaceTest::Uri(symbols.intern(uri)),
            },
            local_name: element
                .local_name
                .as_deref()
                .map_or(NameTest::Any, |name| NameTest::Name(symbols.intern(name))),
        }
    }

    /// Render the event with resolved names.
    pub fn describe(&self, symbols: &SymbolReader) -> String {
        match *self {
            Self::Sibling => "SIBLING".to_owned(),
            Self::Element {
                namespace,
                local_name,
            } => {
                let name = match local_name {
                    NameTest::Any => "*",
                    NameTest::Name(symbol) => symbols.resolve(symbol),
                };
                match namespace {
                    NamespaceTest::Any => format!("*|{name}"),
                    NamespaceTest::NoNamespace => format!("|{name}"),
                    NamespaceTest::Uri(uri) => format!("{}|{name}", symbols.resolve(uri)),
                }
            }
        }
    }
}

/// Candidate events of an element start, most specific first.
///
/// A namespaced element tries `(uri, name)`, `(*, name)`, `(uri, *)`; an
/// element without a namespace tries `(*, name)`, `(none, name)`, `(none, *)`.
/// Both end with `(*, *)`. Names no selector mentions are never interned, so their
/// exact variants are skipped.
pub fn element_variants(
    symbols: &SymbolReader,
    namespace: Option<&str>,
    local_name: &str,
) -> Vec<Event> {
    let name = symbols.get(local_name).map(NameTest::Name);
    let uri = namespace
        .filter(|uri| !uri.is_empty())
        .map(|uri| symbols.get(uri).map(NamespaceTest::Uri));
    let mut variants = Vec::with_capacity(4);
    match uri {
        Some(uri) => {
            if let (Some(uri), Some(name)) = (uri, name) {
                variants.push(Event::Element {
                    namespace: uri,
                    local_name: name,
                });
            }
            if let Some(name) = name {
                variants.push(Event::Element {
                    namespace: NamespaceTest::Any,
                    local_name: name,
                });
            }
            if let Some(uri) = uri {
                variants.push(Event::Element {
                    namespace: uri,
                    local_name: NameTest::Any,
                });
            }
        }
        None => {
            if let Some(name) = name {
                variants.push(Event::Element {
                    namespace: NamespaceTest::Any,
                    local_name: name,
                });
                variants.push(Event::Element {
                    namespace: NamespaceTest::NoNamespace,
                    local_name: name,
                });
            }
            variants.push(Event::Element {
                namespace: NamespaceTest::NoNamespace,
                local_name: NameTest::Any,
            });
        }
    }
    variants.push(Event::ANY_ELEMENT);
    variants
}
