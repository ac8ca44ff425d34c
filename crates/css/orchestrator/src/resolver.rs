//! Style sheet resolution: loading, parsing and memoizing rule sets per URL.

use css_cascade::{CssError, CssRuleSet};
use css_syntax::{ParseOptions, parse_stylesheet};
use dashmap::DashMap;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use url::Url;

/// Source of style sheet text.
pub trait StyleSheetLoader: Send + Sync {
    /// Text of the style sheet at `url`.
    ///
    /// # Errors
    /// Returns `CssError::Load` if the sheet cannot be retrieved.
    fn load(&self, url: &Url) -> Result<String, CssError>;
}

/// Loads `file:` URLs from the local file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileLoader;

impl StyleSheetLoader for FileLoader {
    fn load(&self, url: &Url) -> Result<String, CssError> {
        let load_error = |message: String| CssError::Load {
            url: url.to_string(),
            message,
        };
        let path = url
            .to_file_path()
            .map_err(|()| load_error("not a local file URL".to_owned()))?;
        fs::read_to_string(&path).map_err(|error| load_error(error.to_string()))
    }
}

/// Serves style sheets registered up front.
#[derive(Clone, Debug, Default)]
pub struct MemoryLoader {
    sheets: HashMap<Url, String>,
}

impl MemoryLoader {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` as the sheet at `url`.
    #[must_use]
    pub fn with_sheet(mut self, url: Url, text: &str) -> Self {
        self.sheets.insert(url, text.to_owned());
        self
    }
}

impl StyleSheetLoader for MemoryLoader {
    fn load(&self, url: &Url) -> Result<String, CssError> {
        self.sheets.get(url).cloned().ok_or_else(|| CssError::Load {
            url: url.to_string(),
            message: "no such style sheet".to_owned(),
        })
    }
}

/// Produces parsed rule sets for style sheet URLs and inline text.
pub trait CssResolver: Send + Sync {
    /// The rule set of the sheet at `url`, with its imports.
    ///
    /// # Errors
    /// Returns an error if the sheet or one of its imports cannot be loaded or
    /// parsed.
    fn rule_set(&self, url: &Url) -> Result<Arc<CssRuleSet>, CssError>;

    /// The rule set of inline style sheet text. Relative imports resolve
    /// against `base`.
    ///
    /// # Errors
    /// Returns an error if the text or one of its imports cannot be loaded or
    /// parsed.
    fn rule_set_from_text(&self, base: Option<&Url>, text: &str) -> Result<Arc<CssRuleSet>, CssError>;
}

/// Memoizes rule sets per URL. Concurrent misses may parse the same sheet
/// twice; every caller gets the instance published first.
#[derive(Debug)]
pub struct DefaultCssResolver<L = FileLoader> {
    loader: L,
    options: ParseOptions,
    cache: DashMap<Url, Arc<CssRuleSet>>,
}

impl Default for DefaultCssResolver {
    #[inline]
    fn default() -> Self {
        Self::new(FileLoader, ParseOptions::default())
    }
}

impl<L: StyleSheetLoader> DefaultCssResolver<L> {
    pub fn new(loader: L, options: ParseOptions) -> Self {
        Self {
            loader,
            options,
            cache: DashMap::new(),
        }
    }

    /// Number of memoized sheets.
    #[inline]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// `ancestry` holds the sheets currently being built, outermost first.
    fn load_chain(&self, url: &Url, ancestry: &mut Vec<Url>) -> Result<Arc<CssRuleSet>, CssError> {
        if let Some(hit) = self.cache.get(url) {
            return Ok(Arc::clone(hit.value()));
        }
        let text = self.loader.load(url)?;
        ancestry.push(url.clone());
        let built = self.build(Some(url), &text, ancestry);
        ancestry.pop();

        let set = Arc::new(built?);
        let published = self.cache.entry(url.clone()).or_insert(set);
        Ok(Arc::clone(published.value()))
    }

    fn build(&self, base: Option<&Url>, text: &str, ancestry: &mut Vec<Url>) -> Result<CssRuleSet, CssError> {
        let sheet = parse_stylesheet(text, &self.options)?;
        let mut includes = Vec::with_capacity(sheet.imports.len());
        for import in &sheet.imports {
            let url = resolve_reference(base, &import.url)?;
            if ancestry.contains(&url) {
                debug!("Skipping cyclic import of {url}");
                continue;
            }
            includes.push(self.load_chain(&url, ancestry)?);
        }
        CssRuleSet::from_stylesheet(base.cloned(), &sheet, includes)
    }
}

impl<L: StyleSheetLoader> CssResolver for DefaultCssResolver<L> {
    fn rule_set(&self, url: &Url) -> Result<Arc<CssRuleSet>, CssError> {
        self.load_chain(url, &mut Vec::new())
    }

    fn rule_set_from_text(&self, base: Option<&Url>, text: &str) -> Result<Arc<CssRuleSet>, CssError> {
        let mut ancestry: Vec<Url> = base.into_iter().cloned().collect();
        Ok(Arc::new(self.build(base, text, &mut ancestry)?))
    }
}

/// Resolve an import reference against the importing sheet.
fn resolve_reference(base: Option<&Url>, reference: &str) -> Result<Url, CssError> {
    base.map_or_else(|| Url::parse(reference), |origin| origin.join(reference))
        .map_err(|_| CssError::InvalidUrl {
            base: base.map_or_else(String::new, ToString::to_string),
            reference: reference.to_owned(),
        })
}
