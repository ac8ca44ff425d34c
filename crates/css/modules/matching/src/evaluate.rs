//! Condition evaluation against an open element.

use crate::{Attribute, AttributeKind};
use css_selectors::{AttributeCondition, Condition};

/// What conditions can observe about an element at its start event.
#[derive(Debug)]
pub struct ElementFacts<'doc> {
    pub attributes: &'doc [Attribute],
    pub language: &'doc str,
    /// Number of preceding siblings.
    pub position: usize,
}

impl ElementFacts<'_> {
    /// Value of the attribute with this qualified name.
    fn value_of(&self, qname: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.qname == qname)
            .map(|attribute| attribute.value.as_str())
    }

    /// Whether `condition` holds for this element.
    pub fn holds(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Id(value) => self
                .attributes
                .iter()
                .any(|attribute| attribute.kind == AttributeKind::Id && attribute.value == *value),
            Condition::Class(value) => self
                .value_of("class")
                .is_some_and(|classes| has_token(classes, value)),
            Condition::Attribute(test) => self.attribute_holds(test, |actual, expected| actual == expected),
            Condition::OneOfAttribute(test) => self.attribute_holds(test, has_token),
            Condition::BeginHyphenAttribute(test) => self.attribute_holds(test, begins_with_subtag),
            Condition::Lang(language) => begins_with_subtag(self.language, language),
            Condition::Positional { position } => self.position == *position,
            Condition::PseudoClass(name) => match name.as_str() {
                // Generated content is selected as a pseudo-element later on.
                "before" | "after" => true,
                "first-child" => self.position == 0,
                _ => false,
            },
            Condition::And(first, second) => self.holds(first) && self.holds(second),
            Condition::Or(first, second) => self.holds(first) || self.holds(second),
            Condition::Negation(inner) => !self.holds(inner),
            Condition::Unsupported(_) => false,
        }
    }

    fn attribute_holds(&self, test: &AttributeCondition, compare: fn(&str, &str) -> bool) -> bool {
        let passes = |attribute: &Attribute| {
            test.value
                .as_deref()
                .is_none_or(|expected| compare(&attribute.value, expected))
        };
        match test.namespace.as_deref() {
            Some("") => self
                .attributes
                .iter()
                .find(|attribute| attribute.qname == test.local_name)
                .is_some_and(passes),
            Some(uri) => self
                .attributes
                .iter()
                .find(|attribute| {
                    attribute.namespace() == Some(uri) && attribute.local_name == test.local_name
                })
                .is_some_and(passes),
            None => self
                .attributes
                .iter()
                .filter(|attribute| attribute.local_name == test.local_name)
                .any(passes),
        }
    }
}

/// Whether the whitespace-separated list `list` contains `token`.
fn has_token(list: &str, token: &str) -> bool {
    list.split_ascii_whitespace().any(|candidate| candidate == token)
}

/// `value` equals `prefix` or starts with `prefix` followed by a hyphen.
fn begins_with_subtag(value: &str, prefix: &str) -> bool {
    value
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(attributes: &[Attribute]) -> ElementFacts<'_> {
        ElementFacts {
            attributes,
            language: "en-GB",
            position: 0,
        }
    }

    fn attribute_test(name: &str, value: Option<&str>) -> AttributeCondition {
        AttributeCondition {
            namespace: None,
            local_name: name.to_owned(),
            value: value.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn class_is_a_token_test() {
        let attributes = [Attribute::new("class", "lead  note")];
        let element = facts(&attributes);
        assert!(element.holds(&Condition::Class("note".into())));
        assert!(!element.holds(&Condition::Class("not".into())));
    }

    #[test]
    fn attribute_operators() {
        let attributes = [Attribute::new("lang", "en-US"), Attribute::new("rel", "a b")];
        let element = facts(&attributes);
        assert!(element.holds(&Condition::Attribute(attribute_test("rel", None))));
        assert!(element.holds(&Condition::Attribute(attribute_test("rel", Some("a b")))));
        assert!(!element.holds(&Condition::Attribute(attribute_test("rel", Some("a")))));
        assert!(element.holds(&Condition::OneOfAttribute(attribute_test("rel", Some("b")))));
        assert!(element.holds(&Condition::BeginHyphenAttribute(attribute_test("lang", Some("en")))));
        assert!(!element.holds(&Condition::BeginHyphenAttribute(attribute_test("lang", Some("e")))));
    }

    #[test]
    fn namespaced_attribute_lookup() {
        let attributes = [Attribute {
            namespace: Some("urn:x".into()),
            local_name: "role".into(),
            qname: "x:role".into(),
            value: "main".into(),
            kind: AttributeKind::Cdata,
        }];
        let element = facts(&attributes);
        let mut test = attribute_test("role", Some("main"));
        assert!(element.holds(&Condition::Attribute(test.clone())));
        test.namespace = Some("urn:x".into());
        assert!(element.holds(&Condition::Attribute(test.clone())));
        test.namespace = Some(String::new());
        assert!(!element.holds(&Condition::Attribute(test)));
    }

    #[test]
    fn id_needs_an_identifier_attribute() {
        let plain = [Attribute::new("id", "top")];
        assert!(!facts(&plain).holds(&Condition::Id("top".into())));
        let typed = [Attribute::new("id", "top").into_id()];
        assert!(facts(&typed).holds(&Condition::Id("top".into())));
    }

    #[test]
    fn structural_and_logical_conditions() {
        let element = ElementFacts {
            attributes: &[],
            language: "en-GB",
            position: 2,
        };
        assert!(element.holds(&Condition::Positional { position: 2 }));
        assert!(!element.holds(&Condition::PseudoClass("first-child".into())));
        assert!(element.holds(&Condition::PseudoClass("before".into())));
        assert!(!element.holds(&Condition::PseudoClass("hover".into())));
        assert!(element.holds(&Condition::Lang("en".into())));
        assert!(!element.holds(&Condition::Lang("en-US".into())));
        assert!(element.holds(&Condition::Negation(Box::new(Condition::Lang("fr".into())))));
        assert!(!element.holds(&Condition::Unsupported("::x".into())));
        assert!(element.holds(&Condition::Or(
            Box::new(Condition::Unsupported(String::new())),
            Box::new(Condition::Positional { position: 2 }),
        )));
    }
}
