//! Rules as written in a style sheet and rules as applied to one property.

use core::cmp::Ordering;
use css_selectors::{ElementSelector, Selector, selector_chain, specificity_of};
use css_style_attr::normalize_style_attribute;
use css_syntax::Declaration;
use std::sync::Arc;

/// One property declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    /// Lowercased property name.
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl From<&Declaration> for Property {
    fn from(declaration: &Declaration) -> Self {
        Self {
            name: declaration.name.clone(),
            value: declaration.value.clone(),
            important: declaration.important,
        }
    }
}

/// A selector with its declarations, as found in a style sheet. A selector
/// group yields one `CssRule` per selector.
#[derive(Clone, Debug)]
pub struct CssRule {
    selector: Arc<Selector>,
    specificity: i32,
    element_name: Option<String>,
    pseudo_element_name: Option<String>,
    properties: Vec<Property>,
}

impl CssRule {
    /// Derive specificity and target names from the selector.
    pub fn new(selector: Selector, properties: Vec<Property>) -> Self {
        let chain = selector_chain(&selector);
        let element_name = chain.element_name().map(ToOwned::to_owned);
        let pseudo_element_name = chain.pseudo_element_name().map(ToOwned::to_owned);
        let specificity = specificity_of(&selector).value();
        Self {
            selector: Arc::new(selector),
            specificity,
            element_name,
            pseudo_element_name,
            properties,
        }
    }

    /// The rule standing for a `style` attribute.
    fn for_style_attribute(properties: Vec<Property>) -> Self {
        Self {
            selector: Arc::new(Selector::Element(ElementSelector::universal())),
            specificity: i32::MAX,
            element_name: None,
            pseudo_element_name: None,
            properties,
        }
    }

    #[inline]
    pub fn selector(&self) -> &Arc<Selector> {
        &self.selector
    }

    /// Base specificity, before any origin offset.
    #[inline]
    pub const fn specificity(&self) -> i32 {
        self.specificity
    }

    /// Local name of the element the selector ends on, if it names one.
    #[inline]
    pub fn element_name(&self) -> Option<&str> {
        self.element_name.as_deref()
    }

    /// Pseudo-element the rule applies to, if any.
    #[inline]
    pub fn pseudo_element_name(&self) -> Option<&str> {
        self.pseudo_element_name.as_deref()
    }

    #[inline]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }
}

/// A `CssRule` split down to one property, placed in the cascade.
#[derive(Clone, Debug)]
pub struct Rule {
    source: Arc<CssRule>,
    property: Property,
    position: u32,
    specificity: i32,
}

impl Rule {
    #[inline]
    pub const fn new(source: Arc<CssRule>, property: Property, position: u32, specificity: i32) -> Self {
        Self {
            source,
            property,
            position,
            specificity,
        }
    }

    #[inline]
    pub const fn source(&self) -> &Arc<CssRule> {
        &self.source
    }

    #[inline]
    pub const fn property(&self) -> &Property {
        &self.property
    }

    /// Order of addition to the rule set.
    #[inline]
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Specificity including the origin offset.
    #[inline]
    pub const fn specificity(&self) -> i32 {
        self.specificity
    }

    #[inline]
    pub fn element_name(&self) -> Option<&str> {
        self.source.element_name()
    }

    #[inline]
    pub fn pseudo_element_name(&self) -> Option<&str> {
        self.source.pseudo_element_name()
    }

    #[inline]
    pub fn selector(&self) -> &Selector {
        &self.source.selector
    }

    /// Cascade order: ascending by specificity, then position. The last rule
    /// of a property wins.
    #[inline]
    pub fn cascade_order(&self, other: &Self) -> Ordering {
        (self.specificity, self.position).cmp(&(other.specificity, other.position))
    }
}

/// Rules for the declarations of a `style` attribute. They carry the highest
/// specificity and position, so they win over every style sheet rule. A
/// property declared twice yields one rule, for its last value.
pub fn style_attribute_rules(style: &str) -> Vec<Rule> {
    let properties: Vec<Property> = normalize_style_attribute(style)
        .iter()
        .map(Property::from)
        .collect();
    if properties.is_empty() {
        return Vec::new();
    }
    let source = Arc::new(CssRule::for_style_attribute(properties));
    source
        .properties
        .iter()
        .map(|property| Rule::new(Arc::clone(&source), property.clone(), u32::MAX, i32::MAX))
        .collect()
}

/// The winning declaration per property name, for rules in ascending cascade
/// order. Later rules replace earlier ones; the result keeps the order in
/// which property names first appear.
pub fn winning_properties<'rule, I>(rules: I) -> Vec<&'rule Property>
where
    I: IntoIterator<Item = &'rule Rule>,
{
    let mut winners: Vec<&'rule Property> = Vec::new();
    for rule in rules {
        let property = rule.property();
        match winners.iter_mut().find(|kept| kept.name == property.name) {
            Some(kept) => *kept = property,
            None => winners.push(property),
        }
    }
    winners
}
