//! `@page` rules and their cascade.
//! Spec: <https://www.w3.org/TR/CSS2/page.html#page-selectors>

use crate::rules::Property;

/// Page style names that refine another page style and therefore sort after
/// it. Earlier entries weigh more: `first` sorts after all the others.
const REFINING_NAMES: [&str; 4] = ["first", "last", "left", "right"];

/// An `@page` rule under its composed style name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRule {
    name: String,
    properties: Vec<Property>,
}

impl PageRule {
    #[inline]
    pub const fn new(name: String, properties: Vec<Property>) -> Self {
        Self { name, properties }
    }

    /// `pseudo-name`, `name`, `pseudo` or `unnamed`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Replace any property with the same name and append `property`.
    fn set_property(&mut self, property: Property) {
        self.properties.retain(|kept| kept.name != property.name);
        self.properties.push(property);
    }

    /// Property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|property| property.name == name)
    }
}

/// Sort key: `unnamed` first, then any other name, with the refining names
/// last; ties keep insertion order.
fn sort_key(rule: &PageRule, index: usize) -> (bool, [bool; 4], usize) {
    let name = rule.name();
    (
        name != "unnamed",
        REFINING_NAMES.map(|refining| name == refining),
        index,
    )
}

/// Order page rules for the cascade.
pub fn sort_page_rules(rules: &[PageRule]) -> Vec<&PageRule> {
    let mut keyed: Vec<_> = rules
        .iter()
        .enumerate()
        .map(|(index, rule)| (sort_key(rule, index), rule))
        .collect();
    keyed.sort_by(|left, right| left.0.cmp(&right.0));
    keyed.into_iter().map(|(_, rule)| rule).collect()
}

/// Merge page rules per name: later declarations of a property replace
/// earlier ones. Names appear in the order of their first rule after sorting.
pub fn recompose_page_rules(rules: &[PageRule]) -> Vec<PageRule> {
    let mut merged: Vec<PageRule> = Vec::new();
    for rule in sort_page_rules(rules) {
        let position = match merged.iter().position(|kept| kept.name == rule.name) {
            Some(position) => position,
            None => {
                merged.push(PageRule::new(rule.name.clone(), Vec::new()));
                merged.len().saturating_sub(1)
            }
        };
        if let Some(target) = merged.get_mut(position) {
            for property in &rule.properties {
                target.set_property(property.clone());
            }
        }
    }
    merged
}
