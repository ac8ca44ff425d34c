//! CSS2 cascade: style sheet rules split per property, origin offsets and the
//! per-conversion rule set compiled into a selector DFA.
//! Spec: <https://www.w3.org/TR/CSS2/cascade.html>
//!
//! Ordering is a single ascending key of (specificity, position). Origins are
//! folded into the specificity as multiples of [`ORIGIN_WEIGHT`], so a rule of
//! a weaker origin never outranks a rule of a stronger one.

#![forbid(unsafe_code)]

mod errors;
mod pages;
mod rules;
mod sheets;

pub use errors::CssError;
pub use pages::{PageRule, recompose_page_rules, sort_page_rules};
pub use rules::{CssRule, Property, Rule, style_attribute_rules, winning_properties};
pub use sheets::{CompiledRules, CssRuleSet, ORIGIN_WEIGHT, Origin, RuleSet};
