//! Styling of XML documents with CSS2 rule sets.
//!
//! The orchestrator wires the pieces together: engine configuration, the
//! resolver that turns style sheet URLs into memoized rule sets, the
//! per-conversion [`Context`] and a driver that feeds XML text to the
//! streaming matcher.

mod config;
mod context;
mod document;
mod resolver;

pub use config::EngineConfig;
pub use context::Context;
pub use document::{StyledElement, style_document};
pub use resolver::{CssResolver, DefaultCssResolver, FileLoader, MemoryLoader, StyleSheetLoader};
