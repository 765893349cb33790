//! Asset inlining engine.
//!
//! Rewrites one document so external stylesheet, image, and script
//! references are embedded in place. The three asset kinds run as
//! concurrent sub-passes over element records collected in a single parse;
//! every reference that cannot be inlined is downgraded to a warning and
//! left untouched, so one bad asset never aborts the rest of the document.

mod image;
mod script;
mod stylesheet;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::bundle::BundleCache;
use crate::config::InlineConfig;
use crate::markup::{self, Edit, ElementRef};

// ============================================================================
// Types
// ============================================================================

/// Inlining outcome for one document.
#[derive(Debug, Default)]
pub struct InlineOutput {
    /// Rewritten document text.
    pub html: String,
    /// Absolute paths embedded into the document, deduplicated.
    pub inlined_files: FxHashSet<PathBuf>,
    /// Per-reference failures, reported upward as build warnings.
    pub warnings: Vec<String>,
}

/// Result of one asset-kind sub-pass.
#[derive(Debug, Default)]
pub(crate) struct PassOutput {
    pub edits: Vec<Edit>,
    pub inlined: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

// ============================================================================
// Engine
// ============================================================================

/// Inlines eligible asset references of a document in place.
pub struct Inliner {
    bundles: Arc<BundleCache>,
    config: InlineConfig,
}

impl Inliner {
    pub fn new(bundles: Arc<BundleCache>, config: InlineConfig) -> Self {
        Self { bundles, config }
    }

    /// Inline eligible references of `html`, resolving locators against
    /// `base_dir` (the build output root the document was emitted into).
    ///
    /// Infallible by design: a document that cannot be parsed is returned
    /// unchanged with a warning.
    pub async fn inline_document(&self, html: &str, base_dir: &Path) -> InlineOutput {
        let elements = match markup::collect_elements(html, &["link", "img", "script"]) {
            Ok(elements) => elements,
            Err(error) => {
                return InlineOutput {
                    html: html.to_string(),
                    inlined_files: FxHashSet::default(),
                    warnings: vec![format!("document left unchanged: {error}")],
                };
            }
        };

        let mut stylesheets = Vec::new();
        let mut preload_hints = Vec::new();
        let mut images = Vec::new();
        let mut scripts = Vec::new();
        for element in elements {
            if element.name == "link" {
                if element.attr_eq("rel", "stylesheet") {
                    stylesheets.push(element);
                } else if element.attr_eq("rel", "modulepreload") {
                    preload_hints.push(element);
                }
            } else if element.name == "img" {
                images.push(element);
            } else if element.name == "script" {
                scripts.push(element);
            }
        }
        if !self.config.stylesheets {
            stylesheets.clear();
        }
        if !self.config.images {
            images.clear();
        }
        if !self.config.scripts {
            scripts.clear();
        }

        let (css, img, js) = tokio::join!(
            stylesheet::inline_stylesheets(stylesheets, base_dir),
            image::inline_images(images, base_dir),
            script::inline_scripts(scripts, base_dir, &self.bundles),
        );

        let mut inlined_files = FxHashSet::default();
        let mut edits = Vec::new();
        let mut warnings = Vec::new();
        for pass in [css, img, js] {
            edits.extend(pass.edits);
            inlined_files.extend(pass.inlined);
            warnings.extend(pass.warnings);
        }

        // Preload hints are only valid for externally loaded scripts; drop
        // the ones whose target now lives inside the document.
        for hint in &preload_hints {
            let Some(href) = hint.attr("href") else { continue };
            if !href.ends_with(".js") || is_external(href) {
                continue;
            }
            if inlined_files.contains(&resolve_locator(base_dir, href)) {
                edits.push(Edit::remove(hint.span.clone()));
            }
        }

        InlineOutput {
            html: markup::apply_edits(html, edits),
            inlined_files,
            warnings,
        }
    }
}

// ============================================================================
// Eligibility
// ============================================================================

/// True when a locator points at an externally hosted resource.
pub(crate) fn is_external(locator: &str) -> bool {
    locator
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http://"))
        || locator
            .get(..8)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("https://"))
        || locator.starts_with("//")
}

/// Resolve an asset locator against the build output root.
///
/// A leading `/` marks a root-relative locator.
pub(crate) fn resolve_locator(base_dir: &Path, locator: &str) -> PathBuf {
    base_dir.join(locator.trim_start_matches('/'))
}

/// Locator value eligible for inlining: non-empty and locally served.
pub(crate) fn local_locator(element: &ElementRef, attr: &str) -> Option<String> {
    let value = element.attr(attr)?;
    if value.is_empty() || is_external(value) {
        return None;
    }
    Some(value.to_string())
}
