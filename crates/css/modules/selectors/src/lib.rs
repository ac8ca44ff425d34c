//! CSS2 selector model consumed by the automaton builder.
//! See <https://www.w3.org/TR/CSS2/selector.html>
//!
//! This crate provides:
//! - A closed tagged union of selector and condition kinds
//! - Specificity calculation
//! - The selector chain (infix flattening of a selector tree)
//! - A parser from selector text (with `@namespace` prefixes) into the tree
//!
//! Selectors beyond CSS2 (general sibling, negated type selectors, CSS3
//! attribute operators, structural pseudo-classes with arguments) are
//! representable so that a style sheet using them still loads, but they never
//! match anything.

mod display;
mod flatten;
mod parser;
mod specificity;

// Re-export public API
pub use flatten::{SelectorChain, selector_chain};
pub use parser::{NamespacePrefixes, SelectorParseError, parse_selector, parse_selector_group};
pub use specificity::{Specificity, specificity_of};

/// Element type selector. `None` on either axis is the `*` wildcard.
///
/// The namespace follows the `@namespace` conventions: `None` means any
/// namespace, `Some("")` means no namespace, anything else is a URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementSelector {
    /// Namespace URI constraint.
    pub namespace: Option<String>,
    /// Local name, `None` for `*`.
    pub local_name: Option<String>,
}

impl ElementSelector {
    /// The `*` selector: any element in any namespace.
    #[inline]
    pub const fn universal() -> Self {
        Self {
            namespace: None,
            local_name: None,
        }
    }

    /// A type selector in any namespace.
    #[inline]
    pub fn named(local_name: &str) -> Self {
        Self {
            namespace: None,
            local_name: Some(local_name.to_owned()),
        }
    }
}

/// A selector tree node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `E`, `ns|E`, `*`
    Element(ElementSelector),
    /// `::first-line`, `::before`, ... Only valid as the child of a `Child` node.
    PseudoElement(String),
    /// A simple selector refined by a condition, e.g. `p.note`.
    Conditional {
        selector: Box<Self>,
        condition: Condition,
    },
    /// `A B`
    Descendant {
        ancestor: Box<Self>,
        descendant: Box<Self>,
    },
    /// `A > B`. Also carries pseudo-elements: `p::first-line` is a child
    /// relation between `p` and the pseudo-element.
    Child { parent: Box<Self>, child: Box<Self> },
    /// `A + B`
    DirectAdjacent {
        previous: Box<Self>,
        next: Box<Self>,
    },
    /// `A ~ B` (not CSS2, never matches)
    GeneralSibling {
        previous: Box<Self>,
        next: Box<Self>,
    },
    /// Negated simple selector (not CSS2, never matches)
    Negative(Box<Self>),
}

impl Selector {
    /// True for a bare pseudo-element node.
    #[inline]
    pub const fn is_pseudo_element(&self) -> bool {
        matches!(self, Self::PseudoElement(_))
    }
}

/// Attribute test shared by `[a]`, `[a=v]`, `[a~=v]` and `[a|=v]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributeCondition {
    /// `None` matches the local name in any namespace, `Some("")` only
    /// un-namespaced attributes.
    pub namespace: Option<String>,
    pub local_name: String,
    /// `None` tests presence only.
    pub value: Option<String>,
}

/// A condition attached to a simple selector. Conditions are never folded into
/// the automaton alphabet; they are evaluated against the concrete element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// `#value`: an identifier-typed attribute with this value.
    Id(String),
    /// `.value`
    Class(String),
    /// `[a]`, `[a=v]`
    Attribute(AttributeCondition),
    /// `[a~=v]`
    OneOfAttribute(AttributeCondition),
    /// `[a|=v]`
    BeginHyphenAttribute(AttributeCondition),
    /// `:lang(value)`
    Lang(String),
    /// `:first-child`, `:before`, `:after`, `:hover`, ...
    PseudoClass(String),
    /// Matches when exactly `position` preceding siblings have been seen.
    Positional { position: usize },
    And(Box<Self>, Box<Self>),
    Or(Box<Self>, Box<Self>),
    Negation(Box<Self>),
    /// Anything outside CSS2; always false.
    Unsupported(String),
}

impl Condition {
    /// Fold a non-empty list of conditions into a left-leaning `And` tree.
    pub fn all(conditions: Vec<Self>) -> Option<Self> {
        let mut iter = conditions.into_iter();
        let first = iter.next()?;
        Some(iter.fold(first, |acc, next| Self::And(Box::new(acc), Box::new(next))))
    }
}
