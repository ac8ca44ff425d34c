#![cfg(test)]

use anyhow::{Result, anyhow};
use css_cascade::{CssError, Origin};
use css_orchestrator::{
    Context, CssResolver as _, DefaultCssResolver, EngineConfig, MemoryLoader, StyledElement, style_document,
};
use css_syntax::ParseOptions;
use std::sync::Arc;
use std::thread;
use url::Url;

fn init_logging() {
    if env_logger::builder().is_test(true).try_init().is_err() {
        log::debug!("test logger already installed");
    }
}

fn location(text: &str) -> Result<Url> {
    Ok(Url::parse(text)?)
}

/// A resolver over in-memory sheets.
///
/// # Errors
/// Returns an error if a sheet URL is malformed.
fn resolver(sheets: &[(&str, &str)]) -> Result<DefaultCssResolver<MemoryLoader>> {
    let mut loader = MemoryLoader::new();
    for &(address, text) in sheets {
        loader = loader.with_sheet(location(address)?, text);
    }
    Ok(DefaultCssResolver::new(loader, ParseOptions::default()))
}

fn element<'doc>(styled: &'doc [StyledElement], local_name: &str, nth: usize) -> Result<&'doc StyledElement> {
    styled
        .iter()
        .filter(|element| element.local_name == local_name)
        .nth(nth)
        .ok_or_else(|| anyhow!("no {local_name} #{nth}"))
}

/// Imported sheets lose ties against the importing sheet.
///
/// # Errors
/// Returns an error if a sheet or the document fails to load.
#[test]
fn imports_precede_the_importer() -> Result<()> {
    init_logging();
    let resolver = resolver(&[
        ("mem:/css/base.css", "p { color: red; margin: 0 }"),
        ("mem:/css/main.css", "@import url(base.css); p { color: blue }"),
    ])?;
    let main = resolver.rule_set(&location("mem:/css/main.css")?)?;
    assert_eq!(main.includes().len(), 1);

    let mut context = Context::default();
    context.add_rule_set(&main, Origin::Author);
    let styled = style_document(&mut context, "<doc><p/></doc>")?;
    let para = element(&styled, "p", 0)?;
    assert_eq!(para.property("color"), Some("blue"));
    assert_eq!(para.property("margin"), Some("0"));
    assert_eq!(para.depth, 2);
    Ok(())
}

/// Sheets are memoized per URL.
///
/// # Errors
/// Returns an error if a sheet fails to load.
#[test]
fn resolver_memoizes_sheets() -> Result<()> {
    let resolver = resolver(&[
        ("mem:/a.css", "@import \"b.css\"; a { color: red }"),
        ("mem:/b.css", "b { color: red }"),
    ])?;
    let first = resolver.rule_set(&location("mem:/a.css")?)?;
    let second = resolver.rule_set(&location("mem:/a.css")?)?;
    assert!(Arc::ptr_eq(&first, &second));
    let imported = resolver.rule_set(&location("mem:/b.css")?)?;
    assert!(Arc::ptr_eq(&first.includes()[0], &imported));
    assert_eq!(resolver.cached(), 2);
    Ok(())
}

/// Concurrent lookups converge on the published instances, includes too.
///
/// # Errors
/// Returns an error if a sheet fails to load or a worker thread dies.
#[test]
fn concurrent_lookups_share_published_sheets() -> Result<()> {
    let shared = Arc::new(resolver(&[
        ("mem:/a.css", "@import \"b.css\"; a { color: red }"),
        ("mem:/b.css", "b { color: blue }"),
    ])?);
    let importer = location("mem:/a.css")?;
    let imported = location("mem:/b.css")?;

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let worker_resolver = Arc::clone(&shared);
            let (first, second) = (importer.clone(), imported.clone());
            thread::spawn(move || -> Result<_, CssError> {
                Ok((worker_resolver.rule_set(&first)?, worker_resolver.rule_set(&second)?))
            })
        })
        .collect();
    let mut results = Vec::with_capacity(workers.len());
    for worker in workers {
        let joined = worker.join().map_err(|_| anyhow!("resolver thread panicked"))?;
        results.push(joined?);
    }

    let published_a = shared.rule_set(&importer)?;
    let published_b = shared.rule_set(&imported)?;
    assert!(Arc::ptr_eq(&published_a.includes()[0], &published_b));
    for (sheet_a, sheet_b) in &results {
        assert!(Arc::ptr_eq(sheet_a, &published_a));
        assert!(Arc::ptr_eq(sheet_b, &published_b));
        assert!(Arc::ptr_eq(&sheet_a.includes()[0], &published_b));
    }
    assert_eq!(shared.cached(), 2);
    Ok(())
}

/// Import cycles are broken instead of recursing forever.
///
/// # Errors
/// Returns an error if a sheet fails to load.
#[test]
fn import_cycles_are_broken() -> Result<()> {
    let resolver = resolver(&[
        ("mem:/a.css", "@import \"b.css\"; a { color: red }"),
        ("mem:/b.css", "@import \"a.css\"; b { color: blue }"),
    ])?;
    let sheet = resolver.rule_set(&location("mem:/a.css")?)?;
    let flattened = sheet.includes_recursive();
    assert_eq!(flattened.len(), 1);
    assert!(flattened[0].includes().is_empty());

    let inline = resolver.rule_set_from_text(Some(&location("mem:/b.css")?), "@import \"b.css\";")?;
    assert_eq!(inline.includes().len(), 0);
    Ok(())
}

/// A missing import fails the whole sheet.
///
/// # Errors
/// Returns an error if a sheet URL is malformed.
#[test]
fn missing_import_is_a_load_error() -> Result<()> {
    let resolver = resolver(&[("mem:/a.css", "@import \"gone.css\"; a { color: red }")])?;
    let result = resolver.rule_set(&location("mem:/a.css")?);
    assert!(matches!(result, Err(CssError::Load { .. })));
    assert_eq!(resolver.cached(), 0);
    Ok(())
}

/// `style` attributes override sheets on XHTML elements only.
///
/// # Errors
/// Returns an error if the sheet or the document fails to parse.
#[test]
fn style_attributes_apply_to_xhtml() -> Result<()> {
    let resolver = resolver(&[])?;
    let sheet = resolver.rule_set_from_text(None, "p { color: red }")?;
    let mut context = Context::default();
    context.add_rule_set(&sheet, Origin::Author);

    let xml = r#"<html xmlns="http://www.w3.org/1999/xhtml"><p style="color: green"/><q:p xmlns:q="urn:q" style="color: green"/></html>"#;
    let styled = style_document(&mut context, xml)?;
    let xhtml = element(&styled, "p", 0)?;
    assert_eq!(xhtml.property("color"), Some("green"));
    let foreign = element(&styled, "p", 1)?;
    assert_eq!(foreign.namespace.as_deref(), Some("urn:q"));
    assert_eq!(foreign.property("color"), Some("red"));
    Ok(())
}

/// Configured identifier attributes feed `#id` selectors.
///
/// # Errors
/// Returns an error if the configuration, sheet or document fails to parse.
#[test]
fn id_attributes_come_from_the_configuration() -> Result<()> {
    let config = EngineConfig::from_json(r#"{ "id-attributes": ["xml:id", "key"], "trace": true }"#)?;
    let resolver = DefaultCssResolver::new(MemoryLoader::new(), config.parse_options());
    let sheet = resolver.rule_set_from_text(None, "#top { color: red }")?;
    let mut context = Context::new(config);
    context.add_rule_set(&sheet, Origin::Author);

    let styled = style_document(&mut context, r#"<doc><a xml:id="top"/><b key="top"/><c id="top"/></doc>"#)?;
    assert_eq!(element(&styled, "a", 0)?.property("color"), Some("red"));
    assert_eq!(element(&styled, "b", 0)?.property("color"), Some("red"));
    assert_eq!(element(&styled, "c", 0)?.property("color"), None);
    Ok(())
}

/// Pseudo-element rules travel next to the element rules.
///
/// # Errors
/// Returns an error if the sheet or the document fails to parse.
#[test]
fn pseudo_element_properties() -> Result<()> {
    let resolver = resolver(&[])?;
    let sheet = resolver.rule_set_from_text(None, "p::first-line { color: red } p::first-line { color: blue }")?;
    let mut context = Context::default();
    context.add_rule_set(&sheet, Origin::Author);
    let styled = style_document(&mut context, "<p>text</p>")?;
    let para = element(&styled, "p", 0)?;
    assert!(para.rules.is_empty());
    let first_line = para.pseudo_properties("first-line");
    assert_eq!(first_line.len(), 1);
    assert_eq!(first_line[0].value, "blue");
    Ok(())
}

/// User agent rules lose against author rules whatever their specificity.
///
/// # Errors
/// Returns an error if a sheet or the document fails to parse.
#[test]
fn origins_outrank_specificity() -> Result<()> {
    let resolver = resolver(&[])?;
    let agent = resolver.rule_set_from_text(None, "#x { display: block }")?;
    let author = resolver.rule_set_from_text(None, "* { display: inline }")?;
    let mut context = Context::default();
    context.add_rule_set(&agent, Origin::UserAgent);
    context.add_rule_set(&author, Origin::Author);
    let styled = style_document(&mut context, r#"<doc id="x"/>"#)?;
    assert_eq!(element(&styled, "doc", 0)?.property("display"), Some("inline"));
    Ok(())
}

/// Page rules are merged per page name and the context can be reused.
///
/// # Errors
/// Returns an error if the sheet fails to parse.
#[test]
fn page_rules_and_clearing() -> Result<()> {
    let resolver = resolver(&[])?;
    let sheet = resolver.rule_set_from_text(
        None,
        "@page { margin: 1cm } @page :first { margin: 2cm } @page { size: a4; margin: 3cm }",
    )?;
    let mut context = Context::default();
    context.add_rule_set(&sheet, Origin::Author);
    let pages = context.page_rules();
    let names: Vec<&str> = pages.iter().map(|page| page.name()).collect();
    assert_eq!(names, ["unnamed", "first"]);
    let margin = pages[0].property("margin").map(|property| property.value.as_str());
    assert_eq!(margin, Some("3cm"));

    context.clear();
    assert!(context.page_rules().is_empty());
    assert_eq!(context.rule_set().rule_count(), 0);
    Ok(())
}

/// Malformed documents are reported.
///
/// # Errors
/// Returns an error if a malformed document is accepted.
#[test]
fn malformed_xml_is_an_error() -> Result<()> {
    let mut context = Context::default();
    for xml in ["<doc><p></doc>", "<x:doc/>"] {
        if style_document(&mut context, xml).is_ok() {
            return Err(anyhow!("accepted {xml}"));
        }
    }
    Ok(())
}
