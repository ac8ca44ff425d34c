//! CSS Style Attributes: style="..." attribute processing.
//! Spec: <https://www.w3.org/TR/css-style-attr/>

#![forbid(unsafe_code)]

use css_syntax::{Declaration, parse_declaration_list};

/// Parse the value of a `style` attribute into a list of declarations, in
/// source order.
///
/// The attribute value is a declaration list without braces. Tokenizing goes
/// through the same `cssparser` body parser as rule blocks, so `!important`,
/// comments and quoted `;` are handled. Invalid items are skipped.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
pub fn parse_style_attribute(input: &str) -> Vec<Declaration> {
    if input.trim().is_empty() {
        return Vec::new();
    }
    parse_declaration_list(input)
}

/// Keep only the last occurrence of each property, in source order of those
/// last occurrences.
///
/// Spec: <https://www.w3.org/TR/css-style-attr/#interpreting>
pub fn normalize_style_attribute(input: &str) -> Vec<Declaration> {
    let declarations = parse_style_attribute(input);
    let mut kept: Vec<Declaration> = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        kept.retain(|earlier| earlier.name != declaration.name);
        kept.push(declaration);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_attribute_has_no_declarations() {
        assert!(parse_style_attribute("  ").is_empty());
    }

    #[test]
    fn lowercases_names_and_keeps_values() {
        let declarations = parse_style_attribute("Color: Red; content: \"a;b\"; margin: 0 !important");
        assert_eq!(declarations.len(), 3);
        assert_eq!(declarations[0].name, "color");
        assert_eq!(declarations[0].value, "Red");
        assert_eq!(declarations[1].value, "\"a;b\"");
        assert!(declarations[2].important);
    }

    #[test]
    fn normalize_keeps_last_occurrence() {
        let declarations = normalize_style_attribute("color: red; margin: 0; color: blue");
        let pairs: Vec<(&str, &str)> = declarations
            .iter()
            .map(|decl| (decl.name.as_str(), decl.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("margin", "0"), ("color", "blue")]);
    }
}
