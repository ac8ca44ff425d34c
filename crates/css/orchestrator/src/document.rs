//! Drives the matcher from XML text.

use crate::config::EngineConfig;
use crate::context::Context;
use anyhow::{Context as _, Result, bail};
use css_cascade::{Property, Rule, style_attribute_rules, winning_properties};
use css_matching::{Attribute, AttributeKind, Matcher, XHTML_NAMESPACE};
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::str;

/// An element with the rules that apply to it, in cascade order.
#[derive(Clone, Debug)]
pub struct StyledElement {
    pub namespace: Option<String>,
    pub local_name: String,
    /// 1 for the document element.
    pub depth: usize,
    /// Element rules, followed by `style` attribute rules if any.
    pub rules: Vec<Rule>,
    pub pseudo_rules: Vec<Rule>,
}

impl StyledElement {
    /// The winning declaration per property.
    pub fn properties(&self) -> Vec<&Property> {
        winning_properties(&self.rules)
    }

    /// Winning value of one property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.property().name == name)
            .map(|rule| rule.property().value.as_str())
    }

    /// The winning declarations of one pseudo-element.
    pub fn pseudo_properties(&self, pseudo_element: &str) -> Vec<&Property> {
        winning_properties(
            self.pseudo_rules
                .iter()
                .filter(|rule| rule.pseudo_element_name() == Some(pseudo_element)),
        )
    }
}

/// Match every element of `xml` against the rules of `context`, in document
/// order.
///
/// # Errors
/// Returns an error if the document is not well-formed or uses an undeclared
/// namespace prefix.
pub fn style_document(context: &mut Context, xml: &str) -> Result<Vec<StyledElement>> {
    let mut matcher = context.matcher();
    let config = context.config();
    let mut reader = NsReader::from_str(xml);
    let mut styled = Vec::new();

    matcher.start_document();
    loop {
        let (resolved, event) = reader.read_resolved_event().context("malformed XML document")?;
        let namespace = namespace_uri(resolved)?;
        match event {
            Event::Start(start) => {
                let attributes = attributes(&reader, &start, config)?;
                styled.push(enter(&mut matcher, namespace, &start, &attributes)?);
            }
            Event::Empty(start) => {
                let attributes = attributes(&reader, &start, config)?;
                styled.push(enter(&mut matcher, namespace, &start, &attributes)?);
                matcher.end_element();
            }
            Event::End(_) => matcher.end_element(),
            Event::Eof => break,
            _ => {}
        }
    }
    debug!("Styled {} elements", styled.len());
    Ok(styled)
}

fn enter(
    matcher: &mut Matcher,
    namespace: Option<String>,
    start: &BytesStart<'_>,
    attributes: &[Attribute],
) -> Result<StyledElement> {
    let local = start.local_name();
    let local_name = str::from_utf8(local.as_ref())?.to_owned();
    matcher.start_element(namespace.as_deref(), &local_name, attributes);

    let mut rules: Vec<Rule> = matcher.matching_rules().into_iter().cloned().collect();
    let inline_style = attributes
        .iter()
        .find(|attribute| attribute.qname == "style")
        .filter(|_| namespace.as_deref() == Some(XHTML_NAMESPACE));
    if let Some(style) = inline_style {
        rules.extend(style_attribute_rules(&style.value));
    }
    Ok(StyledElement {
        depth: matcher.depth(),
        pseudo_rules: matcher.matching_pseudo_rules().into_iter().cloned().collect(),
        namespace,
        local_name,
        rules,
    })
}

fn attributes(reader: &NsReader<&[u8]>, start: &BytesStart<'_>, config: &EngineConfig) -> Result<Vec<Attribute>> {
    let mut attributes = Vec::new();
    for entry in start.attributes() {
        let attribute = entry?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let qname = str::from_utf8(attribute.key.as_ref())?.to_owned();
        let kind = if config.is_id_attribute(&qname) {
            AttributeKind::Id
        } else {
            AttributeKind::Cdata
        };
        attributes.push(Attribute {
            namespace: namespace_uri(resolved)?,
            local_name: str::from_utf8(local.as_ref())?.to_owned(),
            value: attribute.unescape_value()?.into_owned(),
            qname,
            kind,
        });
    }
    Ok(attributes)
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Ok(Some(str::from_utf8(uri)?.to_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => bail!(
            "undeclared namespace prefix {:?}",
            String::from_utf8_lossy(&prefix)
        ),
    }
}
