//! Text forms of selectors and conditions, used by automaton dumps and traces.

use crate::{AttributeCondition, Condition, ElementSelector, Selector};
use core::fmt::{self, Display, Formatter};

impl Display for ElementSelector {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.namespace.as_deref() {
            None => {}
            Some("") => formatter.write_str("|")?,
            Some(uri) => write!(formatter, "{{{uri}}}|")?,
        }
        formatter.write_str(self.local_name.as_deref().unwrap_or("*"))
    }
}

impl Display for Selector {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(element) => element.fmt(formatter),
            Self::PseudoElement(name) => write!(formatter, "::{name}"),
            Self::Conditional {
                selector,
                condition,
            } => write!(formatter, "{selector}{condition}"),
            Self::Descendant {
                ancestor,
                descendant,
            } => write!(formatter, "{ancestor} {descendant}"),
            Self::Child { parent, child } if child.is_pseudo_element() => {
                write!(formatter, "{parent}{child}")
            }
            Self::Child { parent, child } => write!(formatter, "{parent} > {child}"),
            Self::DirectAdjacent { previous, next } => write!(formatter, "{previous} + {next}"),
            Self::GeneralSibling { previous, next } => write!(formatter, "{previous} ~ {next}"),
            Self::Negative(simple) => write!(formatter, ":not({simple})"),
        }
    }
}

fn write_attribute(
    formatter: &mut Formatter<'_>,
    attribute: &AttributeCondition,
    operator: &str,
) -> fmt::Result {
    formatter.write_str("[")?;
    match attribute.namespace.as_deref() {
        None => {}
        Some("") => formatter.write_str("|")?,
        Some(uri) => write!(formatter, "{{{uri}}}|")?,
    }
    formatter.write_str(&attribute.local_name)?;
    if let Some(value) = &attribute.value {
        write!(formatter, "{operator}\"{value}\"")?;
    }
    formatter.write_str("]")
}

impl Display for Condition {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(value) => write!(formatter, "#{value}"),
            Self::Class(value) => write!(formatter, ".{value}"),
            Self::Attribute(attribute) => write_attribute(formatter, attribute, "="),
            Self::OneOfAttribute(attribute) => write_attribute(formatter, attribute, "~="),
            Self::BeginHyphenAttribute(attribute) => write_attribute(formatter, attribute, "|="),
            Self::Lang(lang) => write!(formatter, ":lang({lang})"),
            Self::PseudoClass(name) => write!(formatter, ":{name}"),
            Self::Positional { position } => write!(formatter, ":position({position})"),
            Self::And(first, second) => write!(formatter, "{first}{second}"),
            Self::Or(first, second) => write!(formatter, "({first}|{second})"),
            Self::Negation(inner) => write!(formatter, ":not({inner})"),
            Self::Unsupported(text) => write!(formatter, "<unsupported {text}>"),
        }
    }
}
