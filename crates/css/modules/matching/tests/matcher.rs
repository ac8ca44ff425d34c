#![cfg(test)]

use core::error::Error;
use css_cascade::{CompiledRules, CssRuleSet, Origin, RuleSet, style_attribute_rules, winning_properties};
use css_matching::{Attribute, Matcher, MatcherConfig};
use css_syntax::{ParseOptions, parse_stylesheet};
use std::sync::Arc;

fn init_logging() {
    if env_logger::builder().is_test(true).try_init().is_err() {
        log::debug!("test logger already installed");
    }
}

/// Compile an author style sheet.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
fn compile(css: &str) -> Result<Arc<CompiledRules>, Box<dyn Error>> {
    let parsed = parse_stylesheet(css, &ParseOptions::default())?;
    let set = CssRuleSet::from_stylesheet(None, &parsed, Vec::new())?;
    let mut rule_set = RuleSet::new(true);
    rule_set.add_rule_set(&set, Origin::Author.offset());
    Ok(rule_set.compiled_rules())
}

/// A tracing matcher positioned at the start of a document.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
fn matcher(css: &str) -> Result<Matcher, Box<dyn Error>> {
    init_logging();
    let config = MatcherConfig {
        trace: true,
        ..MatcherConfig::default()
    };
    let mut matcher = Matcher::new(compile(css)?, config);
    matcher.start_document();
    Ok(matcher)
}

/// Property values of the matching element rules, in cascade order.
fn values(matcher: &Matcher) -> Vec<String> {
    matcher
        .matching_rules()
        .iter()
        .map(|rule| rule.property().value.clone())
        .collect()
}

fn open(matcher: &mut Matcher, name: &str) {
    matcher.start_element(None, name, &[]);
}

/// Descendant selectors match at any depth but not across siblings.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn descendant_matches_at_any_depth() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("div p { color: red }")?;
    open(&mut matcher, "div");
    open(&mut matcher, "p");
    assert_eq!(values(&matcher), ["red"]);
    matcher.end_element();

    for name in ["section", "a", "b", "span"] {
        open(&mut matcher, name);
    }
    open(&mut matcher, "p");
    assert_eq!(matcher.depth(), 6);
    assert_eq!(values(&matcher), ["red"]);

    matcher.start_document();
    open(&mut matcher, "body");
    open(&mut matcher, "div");
    matcher.end_element();
    open(&mut matcher, "p");
    assert!(values(&matcher).is_empty());
    Ok(())
}

/// A wrapper element breaks a child relation.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn child_needs_the_direct_parent() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("div > p { color: red }")?;
    open(&mut matcher, "div");
    open(&mut matcher, "p");
    assert_eq!(values(&matcher), ["red"]);
    matcher.end_element();
    open(&mut matcher, "span");
    open(&mut matcher, "p");
    assert!(values(&matcher).is_empty());
    Ok(())
}

/// Only the element right after the heading is its adjacent sibling.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn adjacent_sibling_matches_once() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("h1 + p { margin-top: 0 }")?;
    open(&mut matcher, "body");
    open(&mut matcher, "h1");
    matcher.end_element();
    open(&mut matcher, "p");
    assert_eq!(values(&matcher), ["0"]);
    matcher.end_element();
    open(&mut matcher, "p");
    assert!(values(&matcher).is_empty());
    Ok(())
}

/// `:first-child` holds for the first element of a parent only.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn first_child() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("li:first-child { color: red }")?;
    open(&mut matcher, "ul");
    open(&mut matcher, "li");
    assert_eq!(values(&matcher), ["red"]);
    matcher.end_element();
    open(&mut matcher, "li");
    assert!(values(&matcher).is_empty());
    Ok(())
}

/// Languages are inherited, declared with `xml:lang` or an XHTML `lang`.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn language_is_inherited() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("p:lang(fr) { quotes: none } p:lang(en) { color: red }")?;
    open(&mut matcher, "p");
    assert_eq!(matcher.language(), Some("en-GB"));
    assert_eq!(values(&matcher), ["red"]);
    matcher.end_element();

    matcher.start_element(None, "div", &[Attribute::new("xml:lang", "fr-CA")]);
    open(&mut matcher, "p");
    assert_eq!(matcher.language(), Some("fr-CA"));
    assert_eq!(values(&matcher), ["none"]);
    matcher.end_element();

    // A plain `lang` attribute outside XHTML declares nothing.
    matcher.start_element(None, "p", &[Attribute::new("lang", "en")]);
    assert_eq!(values(&matcher), ["none"]);
    matcher.end_element();
    matcher.start_element(Some(css_matching::XHTML_NAMESPACE), "p", &[Attribute::new("lang", "en")]);
    assert_eq!(values(&matcher), ["red"]);
    Ok(())
}

/// `#id` needs an identifier-typed attribute.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn id_selector() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("#top { color: red }")?;
    matcher.start_element(None, "div", &[Attribute::new("id", "top").into_id()]);
    assert_eq!(values(&matcher), ["red"]);
    matcher.end_element();
    matcher.start_element(None, "div", &[Attribute::new("id", "top")]);
    assert!(values(&matcher).is_empty());
    Ok(())
}

/// Class selectors test one token of the `class` attribute.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn class_selector() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("p.x { color: red }")?;
    matcher.start_element(None, "p", &[Attribute::new("class", "a x")]);
    assert_eq!(values(&matcher), ["red"]);
    matcher.end_element();
    matcher.start_element(None, "p", &[Attribute::new("class", "ax")]);
    assert!(values(&matcher).is_empty());
    Ok(())
}

/// The more specific rule comes last whatever the source order.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn specificity_orders_matches() -> Result<(), Box<dyn Error>> {
    for css in ["p { color: red } p.x { color: blue }", "p.x { color: blue } p { color: red }"] {
        let mut matcher = matcher(css)?;
        matcher.start_element(None, "p", &[Attribute::new("class", "x")]);
        let rules = matcher.matching_rules();
        let winners = winning_properties(rules.iter().copied());
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].value, "blue");
    }
    Ok(())
}

/// Universal and type rules match once each, in cascade order.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn matches_are_deduplicated_and_ordered() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("p { color: red } * { margin: 0 } div * { color: blue }")?;
    open(&mut matcher, "div");
    open(&mut matcher, "p");
    assert_eq!(values(&matcher), ["0", "red", "blue"]);
    Ok(())
}

/// `style` attribute declarations override every matched rule.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn style_attribute_wins() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("#top { color: red; margin: 1em }")?;
    matcher.start_element(None, "p", &[Attribute::new("id", "top").into_id()]);
    let inline = style_attribute_rules("color: green");
    let rules = matcher.matching_rules();
    let winners = winning_properties(rules.iter().copied().chain(inline.iter()));
    let pairs: Vec<(&str, &str)> = winners
        .iter()
        .map(|property| (property.name.as_str(), property.value.as_str()))
        .collect();
    assert_eq!(pairs, [("color", "green"), ("margin", "1em")]);
    Ok(())
}

/// Pseudo-element rules are reported apart from element rules.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn pseudo_element_rules() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("p::first-line { color: red } p { color: blue } p:first-letter { float: left }")?;
    open(&mut matcher, "p");
    assert_eq!(values(&matcher), ["blue"]);
    assert_eq!(matcher.matching_pseudo_rules().len(), 2);
    let first_line = matcher.matching_pseudo_rules_for("first-line");
    assert_eq!(first_line.len(), 1);
    assert_eq!(first_line[0].property().value, "red");
    assert!(matcher.matching_pseudo_rules_for("before").is_empty());
    Ok(())
}

/// Namespaced type selectors see the element namespace.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn namespaced_type_selector() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher("@namespace x url(urn:x); x|p { color: red } |p { color: blue }")?;
    matcher.start_element(Some("urn:x"), "p", &[]);
    assert_eq!(values(&matcher), ["red"]);
    matcher.end_element();
    matcher.start_element(None, "p", &[]);
    assert_eq!(values(&matcher), ["blue"]);
    matcher.end_element();
    matcher.start_element(Some("urn:y"), "p", &[]);
    assert!(values(&matcher).is_empty());
    Ok(())
}

/// `|*` selects any element without a namespace, and only those.
///
/// # Errors
/// Returns an error if the style sheet does not parse.
#[test]
fn no_namespace_universal_selector() -> Result<(), Box<dyn Error>> {
    let mut matcher = matcher(".a { color: red } |* { margin: 0 }")?;
    let classes = [Attribute::new("class", "b\ta")];
    matcher.start_element(None, "p", &classes);
    assert_eq!(values(&matcher), ["0", "red"]);
    matcher.end_element();
    matcher.start_element(Some("urn:x"), "p", &classes);
    assert_eq!(values(&matcher), ["red"]);
    Ok(())
}
