//! CSS2 selector parsing.
//! See <https://www.w3.org/TR/CSS2/selector.html> and
//! <https://www.w3.org/TR/css3-namespace/> for the `ns|name` syntax.
//!
//! The parser works over the raw prelude text handed over by the style sheet
//! front end. It accepts everything CSS2 defines and maps the rest onto the
//! non-matching kinds of the selector model instead of failing, so that a style
//! sheet using newer selectors still loads.

use crate::{AttributeCondition, Condition, ElementSelector, Selector};
use std::collections::HashMap;
use thiserror::Error;

/// `@namespace` declarations in scope: prefix to URI. The empty prefix holds
/// the default namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespacePrefixes {
    /// Declared prefixes.
    map: HashMap<String, String>,
}

impl NamespacePrefixes {
    /// Declare `prefix` (empty for the default namespace).
    #[inline]
    pub fn declare(&mut self, prefix: &str, uri: &str) {
        self.map.insert(prefix.to_owned(), uri.to_owned());
    }

    /// Look up a declared prefix.
    #[inline]
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.map.get(prefix).map(String::as_str)
    }

    /// The default namespace, if one was declared.
    #[inline]
    pub fn default_namespace(&self) -> Option<&str> {
        self.resolve("")
    }
}

/// Reasons a selector could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    #[error("undeclared namespace prefix {0:?}")]
    UndeclaredPrefix(String),
    #[error("pseudo-element ::{0} must end the selector")]
    MisplacedPseudoElement(String),
}

/// Combinators between compounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    AdjacentSibling,
    GeneralSibling,
}

/// One half of a `prefix|name` pair.
enum NamePart {
    Star,
    Name(String),
}

/// A compound selector before it is folded into the selector tree.
struct Compound {
    element: ElementSelector,
    conditions: Vec<Condition>,
    pseudo_element: Option<String>,
}

impl Compound {
    fn into_selector(self) -> Selector {
        let element = Selector::Element(self.element);
        let refined = match Condition::all(self.conditions) {
            Some(condition) => Selector::Conditional {
                selector: Box::new(element),
                condition,
            },
            None => element,
        };
        match self.pseudo_element {
            Some(name) => Selector::Child {
                parent: Box::new(refined),
                child: Box::new(Selector::PseudoElement(name)),
            },
            None => refined,
        }
    }
}

/// Cursor over a selector string.
struct SelectorTokenizer<'input> {
    /// Selector text.
    input: &'input str,
    /// Current byte offset into `input`.
    index: usize,
    /// Namespace prefixes in scope.
    prefixes: &'input NamespacePrefixes,
}

impl<'input> SelectorTokenizer<'input> {
    #[inline]
    const fn new(input: &'input str, prefixes: &'input NamespacePrefixes) -> Self {
        Self {
            input,
            index: 0,
            prefixes,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.index).copied()
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.input
            .as_bytes()
            .get(self.index.saturating_add(ahead))
            .copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.index >= self.input.len()
    }

    /// Error for whatever sits at the cursor.
    fn unexpected(&self) -> SelectorParseError {
        self.input
            .get(self.index..)
            .and_then(|rest| rest.chars().next())
            .map_or(SelectorParseError::UnexpectedEnd, |found| {
                SelectorParseError::Unexpected {
                    found,
                    offset: self.index,
                }
            })
    }

    /// Skip whitespace and comments; returns whether anything was skipped.
    fn skip_whitespace(&mut self) -> bool {
        let start = self.index;
        loop {
            match self.peek() {
                Some(byte) if byte.is_ascii_whitespace() => self.advance(),
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let body = self.index.saturating_add(2);
                    let rest = self.input.get(body..).unwrap_or("");
                    self.index = rest
                        .find("*/")
                        .map_or(self.input.len(), |end| body.saturating_add(end).saturating_add(2));
                }
                _ => break,
            }
        }
        self.index != start
    }

    #[inline]
    fn expect(&mut self, byte: u8) -> Result<(), SelectorParseError> {
        if self.peek() == Some(byte) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// True if the cursor sits at the start of an identifier.
    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some(b'-') => self
                .peek_at(1)
                .is_some_and(|next| is_name_start(next) || next == b'\\'),
            Some(b'\\') => true,
            Some(byte) => is_name_start(byte),
            None => false,
        }
    }

    /// Consume a run of name characters, resolving escapes.
    fn consume_name(&mut self) -> String {
        let mut out = String::new();
        while let Some(byte) = self.peek() {
            if byte == b'\\' {
                self.advance();
                self.consume_escape(&mut out);
            } else if is_name_char(byte) {
                let start = self.index;
                while self.peek().is_some_and(is_name_char) {
                    self.advance();
                }
                out.push_str(self.input.get(start..self.index).unwrap_or(""));
            } else {
                break;
            }
        }
        out
    }

    /// Consume an identifier, failing if none starts at the cursor.
    fn consume_ident(&mut self) -> Result<String, SelectorParseError> {
        if !self.at_ident_start() {
            return Err(self.unexpected());
        }
        Ok(self.consume_name())
    }

    /// Consume the part of an escape after the backslash.
    fn consume_escape(&mut self, out: &mut String) {
        let start = self.index;
        while self.index.saturating_sub(start) < 6 && self.peek().is_some_and(|byte| byte.is_ascii_hexdigit()) {
            self.advance();
        }
        if self.index > start {
            let digits = self.input.get(start..self.index).unwrap_or("");
            let decoded = u32::from_str_radix(digits, 16)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            out.push(decoded);
            if self.peek().is_some_and(|byte| byte.is_ascii_whitespace()) {
                self.advance();
            }
        } else if let Some(escaped) = self.input.get(self.index..).and_then(|rest| rest.chars().next()) {
            out.push(escaped);
            self.index = self.index.saturating_add(escaped.len_utf8());
        }
    }

    /// Consume a quoted string after its opening quote.
    fn consume_quoted(&mut self, quote: u8) -> Result<String, SelectorParseError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(SelectorParseError::UnexpectedEnd),
                Some(byte) if byte == quote => {
                    self.advance();
                    return Ok(out);
                }
                Some(b'\\') => {
                    self.advance();
                    self.consume_escape(&mut out);
                }
                Some(_) => {
                    let start = self.index;
                    while self
                        .peek()
                        .is_some_and(|byte| byte != quote && byte != b'\\')
                    {
                        self.advance();
                    }
                    out.push_str(self.input.get(start..self.index).unwrap_or(""));
                }
            }
        }
    }

    /// Resolve a declared namespace prefix.
    fn resolve_prefix(&self, prefix: &str) -> Result<String, SelectorParseError> {
        self.prefixes
            .resolve(prefix)
            .map(ToOwned::to_owned)
            .ok_or_else(|| SelectorParseError::UndeclaredPrefix(prefix.to_owned()))
    }

    /// `*` or an identifier.
    fn consume_name_part(&mut self) -> Result<NamePart, SelectorParseError> {
        if self.peek() == Some(b'*') {
            self.advance();
            Ok(NamePart::Star)
        } else {
            self.consume_ident().map(NamePart::Name)
        }
    }

    /// True if the cursor sits on a `|` namespace separator (and not `|=`).
    fn at_namespace_separator(&self) -> bool {
        self.peek() == Some(b'|') && self.peek_at(1) != Some(b'=')
    }

    /// Type or universal selector with an optional namespace prefix.
    fn parse_type_selector(&mut self) -> Result<Option<ElementSelector>, SelectorParseError> {
        let first = if self.at_namespace_separator() {
            None
        } else if self.peek() == Some(b'*') || self.at_ident_start() {
            Some(self.consume_name_part()?)
        } else {
            return Ok(None);
        };

        let (namespace, local) = if self.at_namespace_separator() {
            self.advance();
            let namespace = match first {
                None => Some(String::new()),
                Some(NamePart::Star) => None,
                Some(NamePart::Name(prefix)) => Some(self.resolve_prefix(&prefix)?),
            };
            (namespace, self.consume_name_part()?)
        } else {
            let default = self.prefixes.default_namespace().map(ToOwned::to_owned);
            match first {
                Some(part) => (default, part),
                None => return Err(self.unexpected()),
            }
        };

        Ok(Some(ElementSelector {
            namespace,
            local_name: match local {
                NamePart::Star => None,
                NamePart::Name(name) => Some(name),
            },
        }))
    }

    /// `[...]` after the opening bracket.
    fn parse_attribute(&mut self, start: usize) -> Result<Condition, SelectorParseError> {
        self.skip_whitespace();
        let (namespace, local_name) = if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'|') {
            self.advance();
            self.advance();
            (None, self.consume_ident()?)
        } else if self.at_namespace_separator() {
            self.advance();
            (Some(String::new()), self.consume_ident()?)
        } else {
            let first = self.consume_ident()?;
            if self.at_namespace_separator() {
                self.advance();
                (Some(self.resolve_prefix(&first)?), self.consume_ident()?)
            } else {
                (None, first)
            }
        };
        self.skip_whitespace();

        let operator = match self.peek() {
            Some(b']') => {
                self.advance();
                return Ok(Condition::Attribute(AttributeCondition {
                    namespace,
                    local_name,
                    value: None,
                }));
            }
            Some(b'=') => {
                self.advance();
                b'='
            }
            Some(byte @ (b'~' | b'|' | b'^' | b'$' | b'*')) if self.peek_at(1) == Some(b'=') => {
                self.advance();
                self.advance();
                byte
            }
            _ => return Err(self.unexpected()),
        };
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.advance();
                self.consume_quoted(quote)?
            }
            _ => self.consume_ident()?,
        };
        self.skip_whitespace();
        self.expect(b']')?;

        let attribute = AttributeCondition {
            namespace,
            local_name,
            value: Some(value),
        };
        Ok(match operator {
            b'=' => Condition::Attribute(attribute),
            b'~' => Condition::OneOfAttribute(attribute),
            b'|' => Condition::BeginHyphenAttribute(attribute),
            _ => Condition::Unsupported(self.input.get(start..self.index).unwrap_or("").to_owned()),
        })
    }

    /// Skip to the `)` closing a functional pseudo-class, honouring nesting.
    fn skip_arguments(&mut self) -> Result<(), SelectorParseError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek() {
                None => return Err(SelectorParseError::UnexpectedEnd),
                Some(b'(') => depth = depth.saturating_add(1),
                Some(b')') => depth = depth.saturating_sub(1),
                Some(quote @ (b'"' | b'\'')) => {
                    self.advance();
                    self.consume_quoted(quote)?;
                    continue;
                }
                Some(_) => {}
            }
            self.advance();
        }
        Ok(())
    }

    /// The argument of `:not(...)`. Only simple conditions can be negated in
    /// this model; a negated type selector degrades to an unsupported
    /// condition.
    fn parse_negation(&mut self, start: usize) -> Result<Condition, SelectorParseError> {
        self.skip_whitespace();
        let negated = match self.peek() {
            Some(b'.' | b'#' | b'[' | b':') => {
                let mut conditions = Vec::new();
                let pseudo = self.parse_simple_condition(&mut conditions)?;
                match (pseudo, conditions.pop()) {
                    (None, Some(condition)) if conditions.is_empty() => {
                        Some(Condition::Negation(Box::new(condition)))
                    }
                    _ => None,
                }
            }
            _ => None,
        };
        self.skip_whitespace();
        if let Some(condition) = negated
            && self.peek() == Some(b')')
        {
            self.advance();
            return Ok(condition);
        }
        self.skip_arguments()?;
        Ok(Condition::Unsupported(
            self.input.get(start..self.index).unwrap_or("").to_owned(),
        ))
    }

    /// `:name`, `:name(...)` or `::name` after the first colon.
    /// Returns a pseudo-element name when one was parsed.
    fn parse_pseudo(
        &mut self,
        start: usize,
        conditions: &mut Vec<Condition>,
    ) -> Result<Option<String>, SelectorParseError> {
        if self.peek() == Some(b':') {
            self.advance();
            return Ok(Some(self.consume_ident()?.to_ascii_lowercase()));
        }
        let name = self.consume_ident()?.to_ascii_lowercase();
        if self.peek() == Some(b'(') {
            self.advance();
            match name.as_str() {
                "lang" => {
                    self.skip_whitespace();
                    let lang = self.consume_ident()?;
                    self.skip_whitespace();
                    self.expect(b')')?;
                    conditions.push(Condition::Lang(lang));
                }
                "not" => conditions.push(self.parse_negation(start)?),
                _ => {
                    self.skip_arguments()?;
                    conditions.push(Condition::Unsupported(
                        self.input.get(start..self.index).unwrap_or("").to_owned(),
                    ));
                }
            }
            return Ok(None);
        }
        match name.as_str() {
            // CSS2 pseudo-elements, which CSS2 writes with a single colon.
            "first-line" | "first-letter" => Ok(Some(name)),
            _ => {
                conditions.push(Condition::PseudoClass(name));
                Ok(None)
            }
        }
    }

    /// One of `.class`, `#id`, `[attr]`, `:pseudo`.
    fn parse_simple_condition(
        &mut self,
        conditions: &mut Vec<Condition>,
    ) -> Result<Option<String>, SelectorParseError> {
        let start = self.index;
        match self.peek() {
            Some(b'.') => {
                self.advance();
                conditions.push(Condition::Class(self.consume_ident()?));
            }
            Some(b'#') => {
                self.advance();
                let name = self.consume_name();
                if name.is_empty() {
                    return Err(self.unexpected());
                }
                conditions.push(Condition::Id(name));
            }
            Some(b'[') => {
                self.advance();
                conditions.push(self.parse_attribute(start)?);
            }
            Some(b':') => {
                self.advance();
                return self.parse_pseudo(start, conditions);
            }
            _ => return Err(self.unexpected()),
        }
        Ok(None)
    }

    /// A compound selector: optional type selector followed by conditions and
    /// at most one trailing pseudo-element.
    fn parse_compound(&mut self) -> Result<Compound, SelectorParseError> {
        let element = self.parse_type_selector()?;
        let mut conditions = Vec::new();
        let mut pseudo_element: Option<String> = None;

        while let Some(b'.' | b'#' | b'[' | b':') = self.peek() {
            if let Some(name) = pseudo_element.take() {
                return Err(SelectorParseError::MisplacedPseudoElement(name));
            }
            pseudo_element = self.parse_simple_condition(&mut conditions)?;
        }

        if element.is_none() && conditions.is_empty() && pseudo_element.is_none() {
            return Err(self.unexpected());
        }

        Ok(Compound {
            element: element.unwrap_or_else(|| ElementSelector {
                namespace: self.prefixes.default_namespace().map(ToOwned::to_owned),
                local_name: None,
            }),
            conditions,
            pseudo_element,
        })
    }

    /// A complex selector: compounds joined by combinators, up to a `,` or
    /// the end of input.
    fn parse_complex(&mut self) -> Result<Selector, SelectorParseError> {
        self.skip_whitespace();
        let first = self.parse_compound()?;
        let mut trailing_pseudo = first.pseudo_element.clone();
        let mut result = first.into_selector();

        loop {
            let saw_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(b',') => break,
                Some(b'>') => Combinator::Child,
                Some(b'+') => Combinator::AdjacentSibling,
                Some(b'~') => Combinator::GeneralSibling,
                Some(_) if saw_whitespace => Combinator::Descendant,
                Some(_) => return Err(self.unexpected()),
            };
            if let Some(name) = trailing_pseudo.take() {
                return Err(SelectorParseError::MisplacedPseudoElement(name));
            }
            if combinator != Combinator::Descendant {
                self.advance();
                self.skip_whitespace();
            }
            let next = self.parse_compound()?;
            trailing_pseudo.clone_from(&next.pseudo_element);
            result = combine(combinator, result, next.into_selector());
        }
        Ok(result)
    }
}

/// Join two selectors with a combinator.
fn combine(combinator: Combinator, left: Selector, right: Selector) -> Selector {
    let (left, right) = (Box::new(left), Box::new(right));
    match combinator {
        Combinator::Descendant => Selector::Descendant {
            ancestor: left,
            descendant: right,
        },
        Combinator::Child => Selector::Child {
            parent: left,
            child: right,
        },
        Combinator::AdjacentSibling => Selector::DirectAdjacent {
            previous: left,
            next: right,
        },
        Combinator::GeneralSibling => Selector::GeneralSibling {
            previous: left,
            next: right,
        },
    }
}

#[inline]
const fn is_name_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

#[inline]
const fn is_name_char(byte: u8) -> bool {
    is_name_start(byte) || byte.is_ascii_digit() || byte == b'-'
}

/// Parse one complex selector.
///
/// # Errors
/// Returns an error if the text is not a selector or uses an undeclared
/// namespace prefix.
pub fn parse_selector(
    input: &str,
    prefixes: &NamespacePrefixes,
) -> Result<Selector, SelectorParseError> {
    let mut tokens = SelectorTokenizer::new(input, prefixes);
    tokens.skip_whitespace();
    if tokens.at_end() {
        return Err(SelectorParseError::Empty);
    }
    let selector = tokens.parse_complex()?;
    tokens.skip_whitespace();
    if tokens.at_end() {
        Ok(selector)
    } else {
        Err(tokens.unexpected())
    }
}

/// Parse a comma separated group of selectors, as found in a rule prelude.
///
/// # Errors
/// Returns an error if any selector of the group is malformed; a group is
/// accepted or rejected as a whole.
pub fn parse_selector_group(
    input: &str,
    prefixes: &NamespacePrefixes,
) -> Result<Vec<Selector>, SelectorParseError> {
    let mut tokens = SelectorTokenizer::new(input, prefixes);
    let mut group = Vec::new();
    loop {
        tokens.skip_whitespace();
        if tokens.at_end() {
            return Err(SelectorParseError::Empty);
        }
        group.push(tokens.parse_complex()?);
        tokens.skip_whitespace();
        match tokens.peek() {
            None => return Ok(group),
            Some(b',') => tokens.advance(),
            Some(_) => return Err(tokens.unexpected()),
        }
    }
}
