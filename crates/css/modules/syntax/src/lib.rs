//! CSS style sheet front end: rule preludes, declaration blocks and the CSS2
//! at-rules (`@import`, `@namespace`, `@media`, `@page`).
//! Spec: <https://www.w3.org/TR/CSS2/syndata.html>
//!
//! Tokenizing is delegated to `cssparser`. Selector preludes are kept as raw
//! text; turning them into selector trees needs the namespace prefixes, which
//! the caller takes from [`Stylesheet::namespaces`].
use cssparser::AtRuleParser as CssAtRuleParser;
use cssparser::BasicParseErrorKind;
use cssparser::CowRcStr;
use cssparser::DeclarationParser as CssDeclarationParser;
use cssparser::ParseError;
use cssparser::Parser;
use cssparser::ParserInput;
use cssparser::ParserState;
use cssparser::QualifiedRuleParser as CssQualifiedRuleParser;
use cssparser::RuleBodyItemParser as CssRuleBodyItemParser;
use cssparser::RuleBodyParser as CssRuleBodyParser;
use cssparser::StyleSheetParser;
use cssparser::Token;
use cssparser::parse_important;
use log::{debug, warn};
use thiserror::Error;

/// A single CSS declaration (property: value [!important]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Lowercased property name.
    pub name: String,
    /// Raw value text (without trailing !important).
    pub value: String,
    /// Whether the declaration was marked as `!important`.
    pub important: bool,
}

/// Line and column of a construct in the style sheet text, both 1-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

/// A single style rule with a raw prelude and parsed declarations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRule {
    /// Raw prelude text (the selector group).
    pub prelude: String,
    /// Declarations within the rule block.
    pub declarations: Vec<Declaration>,
    /// Where the prelude starts.
    pub position: SourcePosition,
}

/// `@import url(...) media, ...;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportRule {
    /// The URL reference as written, unresolved.
    pub url: String,
    /// Lowercased media types; empty means all media.
    pub media: Vec<String>,
}

/// `@namespace [prefix] url(...);`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceRule {
    /// `None` declares the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

/// `@page [name][:pseudo] { ... }`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRule {
    pub name: Option<String>,
    pub pseudo: Option<String>,
    pub declarations: Vec<Declaration>,
}

impl PageRule {
    /// The composed page style name: `pseudo-name`, `name`, `pseudo` or
    /// `unnamed`.
    pub fn style_name(&self) -> String {
        match (self.name.as_deref(), self.pseudo.as_deref()) {
            (Some(name), Some(pseudo)) => format!("{pseudo}-{name}"),
            (Some(name), None) => name.to_owned(),
            (None, Some(pseudo)) => pseudo.to_owned(),
            (None, None) => "unnamed".to_owned(),
        }
    }
}

/// A parsed style sheet. Rules inside accepted `@media` blocks are flattened
/// into the top-level lists in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub imports: Vec<ImportRule>,
    pub namespaces: Vec<NamespaceRule>,
    /// Style rules in source order. Rules without declarations are dropped.
    pub rules: Vec<StyleRule>,
    pub pages: Vec<PageRule>,
}

/// Front end options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Media types whose rules and imports are kept.
    pub media: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            media: vec!["all".to_owned(), "print".to_owned()],
        }
    }
}

impl ParseOptions {
    /// Whether a media list selects one of the accepted media. An empty list
    /// means all media.
    pub fn accepts(&self, media: &[String]) -> bool {
        media.is_empty()
            || media
                .iter()
                .any(|medium| self.media.iter().any(|accepted| accepted.eq_ignore_ascii_case(medium)))
    }
}

/// A style sheet that could not be parsed. The whole sheet is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// Whether the rest of the input is exactly `! important`.
fn important_tail(input: &mut Parser) -> bool {
    input
        .try_parse(|tail| {
            parse_important(tail)?;
            tail.expect_exhausted()
        })
        .is_ok()
}

/// `counter-reset: page [N]` inside `@page` sets the initial page number.
fn rewrite_page_counter(declaration: Declaration) -> Declaration {
    if declaration.name != "counter-reset" {
        return declaration;
    }
    let mut words = declaration.value.split_whitespace();
    let number = match (words.next(), words.next(), words.next()) {
        (Some("page"), None, None) => "1".to_owned(),
        (Some("page"), Some(number), None) if number.parse::<i32>().is_ok() => number.to_owned(),
        _ => return declaration,
    };
    Declaration {
        name: "initial-page-number".to_owned(),
        value: number,
        important: declaration.important,
    }
}

/// Consume the rest of a parser's input.
fn exhaust(input: &mut Parser) {
    while input.next_including_whitespace_and_comments().is_ok() {}
}

/// Lowercased media types from a media list; other tokens are skipped.
fn media_list(input: &mut Parser) -> Vec<String> {
    let mut media = Vec::new();
    while let Ok(token) = input.next() {
        if let Token::Ident(name) = token {
            media.push(name.to_ascii_lowercase());
        }
    }
    media
}

/// A declaration parser that records property name and its raw value.
struct BodyDeclParser;

impl<'input> CssDeclarationParser<'input> for BodyDeclParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
        _decl_start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'input, Self::Error>> {
        let start = input.position();
        let (end, important) = loop {
            let before = input.position();
            if important_tail(input) {
                break (before, true);
            }
            if input.next_including_whitespace_and_comments().is_err() {
                break (input.position(), false);
            }
        };
        let value = input.slice(start..end).trim().to_owned();
        if value.is_empty() {
            return Err(input.new_error(BasicParseErrorKind::EndOfInput));
        }
        Ok(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
        })
    }
}

impl<'input> CssAtRuleParser<'input> for BodyDeclParser {
    type Prelude = ();
    type AtRule = Declaration; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::AtRuleInvalid(name)))
    }
}

impl<'input> CssQualifiedRuleParser<'input> for BodyDeclParser {
    type Prelude = ();
    type QualifiedRule = Declaration; // Not produced
    type Error = ();

    #[inline]
    fn parse_prelude<'tokens>(
        &mut self,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        Err(input.new_error(BasicParseErrorKind::QualifiedRuleInvalid))
    }
}

impl CssRuleBodyItemParser<'_, Declaration, ()> for BodyDeclParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

/// Parse declarations from a block, skipping the invalid ones.
fn parse_declarations_from_block(block: &mut Parser) -> Vec<Declaration> {
    let mut out: Vec<Declaration> = Vec::new();
    let mut body = BodyDeclParser;
    for item in CssRuleBodyParser::new(block, &mut body) {
        match item {
            Ok(decl) => out.push(decl),
            Err((error, text)) => debug!("Skipping invalid declaration {text:?}: {:?}", error.kind),
        }
    }
    out
}

/// At-rule preludes the front end understands.
enum AtRulePrelude {
    Import(ImportRule),
    Namespace(NamespaceRule),
    Media(Vec<String>),
    Page { name: Option<String>, pseudo: Option<String> },
    Ignored(String),
}

/// Top-level parser. Rules are collected into `sheet` as they are parsed, so
/// that `@media` blocks can feed the same sheet.
struct TopLevelParser<'opts> {
    options: &'opts ParseOptions,
    sheet: Stylesheet,
    /// First rule-level error of a nested `@media` block.
    nested_error: Option<SyntaxError>,
}

fn syntax_error(error: &ParseError<'_, ()>, text: &str) -> SyntaxError {
    SyntaxError {
        line: error.location.line.saturating_add(1),
        column: error.location.column,
        message: format!("invalid rule {:?}", text.trim()),
    }
}

impl<'input> CssAtRuleParser<'input> for TopLevelParser<'_> {
    type Prelude = AtRulePrelude;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'tokens>(
        &mut self,
        name: CowRcStr<'input>,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "import" => {
                let url = input.expect_url_or_string()?.as_ref().to_owned();
                Ok(AtRulePrelude::Import(ImportRule {
                    url,
                    media: media_list(input),
                }))
            }
            "namespace" => {
                let prefix = input
                    .try_parse(|prefix_input| prefix_input.expect_ident_cloned())
                    .ok()
                    .map(|prefix| prefix.as_ref().to_owned());
                let uri = input.expect_url_or_string()?.as_ref().to_owned();
                Ok(AtRulePrelude::Namespace(NamespaceRule { prefix, uri }))
            }
            "media" => Ok(AtRulePrelude::Media(media_list(input))),
            "page" => {
                let name = input
                    .try_parse(|name_input| name_input.expect_ident_cloned())
                    .ok()
                    .map(|page_name| page_name.as_ref().to_owned());
                let pseudo = match input.try_parse(|colon| colon.expect_colon()) {
                    Ok(()) => Some(input.expect_ident()?.to_ascii_lowercase()),
                    Err(_) => None,
                };
                Ok(AtRulePrelude::Page { name, pseudo })
            }
            _ => {
                exhaust(input);
                Ok(AtRulePrelude::Ignored(lower))
            }
        }
    }

    fn parse_block<'tokens>(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::AtRule, ParseError<'input, Self::Error>> {
        match prelude {
            AtRulePrelude::Media(media) if self.options.accepts(&media) => {
                let mut nested = Vec::new();
                for item in StyleSheetParser::new(input, &mut *self) {
                    if let Err((error, text)) = item {
                        nested.push(syntax_error(&error, text));
                    }
                }
                if let Some(first) = nested.into_iter().next()
                    && self.nested_error.is_none()
                {
                    self.nested_error = Some(first);
                }
            }
            AtRulePrelude::Page { name, pseudo } => {
                let declarations: Vec<Declaration> = parse_declarations_from_block(input)
                    .into_iter()
                    .map(rewrite_page_counter)
                    .collect();
                if !declarations.is_empty() {
                    self.sheet.pages.push(PageRule {
                        name,
                        pseudo,
                        declarations,
                    });
                }
            }
            AtRulePrelude::Media(media) => {
                debug!("Ignoring @media {}", media.join(", "));
                exhaust(input);
            }
            AtRulePrelude::Ignored(name) => {
                warn!("Ignoring unsupported @{name} rule");
                exhaust(input);
            }
            AtRulePrelude::Import(_) | AtRulePrelude::Namespace(_) => {
                return Err(input.new_error(BasicParseErrorKind::AtRuleBodyInvalid));
            }
        }
        Ok(())
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _state: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        match prelude {
            AtRulePrelude::Import(import) => {
                if self.options.accepts(&import.media) {
                    self.sheet.imports.push(import);
                } else {
                    debug!("Ignoring @import {} for media {}", import.url, import.media.join(", "));
                }
                Ok(())
            }
            AtRulePrelude::Namespace(namespace) => {
                self.sheet.namespaces.push(namespace);
                Ok(())
            }
            AtRulePrelude::Ignored(_) => Ok(()),
            AtRulePrelude::Media(_) | AtRulePrelude::Page { .. } => Err(()),
        }
    }
}

impl<'input> CssQualifiedRuleParser<'input> for TopLevelParser<'_> {
    type Prelude = (String, SourcePosition);
    type QualifiedRule = ();
    type Error = ();

    #[inline]
    fn parse_prelude<'tokens>(
        &mut self,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::Prelude, ParseError<'input, Self::Error>> {
        let location = input.current_source_location();
        let start = input.state();
        exhaust(input);
        let prelude = input.slice_from(start.position()).trim().to_owned();
        Ok((
            prelude,
            SourcePosition {
                line: location.line.saturating_add(1),
                column: location.column,
            },
        ))
    }

    #[inline]
    fn parse_block<'tokens>(
        &mut self,
        (prelude, position): Self::Prelude,
        _state: &ParserState,
        input: &mut Parser<'input, 'tokens>,
    ) -> Result<Self::QualifiedRule, ParseError<'input, Self::Error>> {
        let declarations = parse_declarations_from_block(input);
        if declarations.is_empty() {
            debug!("Dropping rule without declarations: {prelude}");
        } else {
            self.sheet.rules.push(StyleRule {
                prelude,
                declarations,
                position,
            });
        }
        Ok(())
    }
}

/// Parse a full style sheet using cssparser.
///
/// # Errors
/// Returns the first rule-level error. A style sheet with an error
/// contributes nothing.
pub fn parse_stylesheet(css: &str, options: &ParseOptions) -> Result<Stylesheet, SyntaxError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut top = TopLevelParser {
        options,
        sheet: Stylesheet::default(),
        nested_error: None,
    };
    let mut first_error = None;
    for item in StyleSheetParser::new(&mut parser, &mut top) {
        if let Err((error, text)) = item
            && first_error.is_none()
        {
            first_error = Some(syntax_error(&error, text));
        }
    }
    match first_error.or(top.nested_error) {
        Some(error) => Err(error),
        None => Ok(top.sheet),
    }
}

/// Parse a bare declaration list, such as the value of a `style` attribute.
/// Invalid declarations are skipped.
pub fn parse_declaration_list(text: &str) -> Vec<Declaration> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    parse_declarations_from_block(&mut parser)
}
