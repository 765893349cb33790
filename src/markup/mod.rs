//! Queryable view over an HTML document with span-based editing.
//!
//! `tl` parses the source zero-copy; element queries are resolved to owned
//! records with byte spans up front, so the async asset reads can run
//! without borrowing the DOM and rewrites happen afterwards as plain,
//! ordered string splices.

use std::borrow::Cow;
use std::ops::Range;

use anyhow::{Result, anyhow};

// ============================================================================
// Element extraction
// ============================================================================

/// One element occurrence in the source document.
#[derive(Debug, Clone)]
pub struct ElementRef {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in parse order; `None` marks a bare attribute.
    pub attrs: Vec<(String, Option<String>)>,
    /// Byte range of the full element in the source, children included.
    pub span: Range<usize>,
}

impl ElementRef {
    /// Value of the named attribute, if present with a value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_deref())
    }

    /// True when the named attribute equals `value` (ASCII case-insensitive).
    pub fn attr_eq(&self, name: &str, value: &str) -> bool {
        self.attr(name).is_some_and(|v| v.eq_ignore_ascii_case(value))
    }
}

/// Collect every element whose tag name is one of `names`, in source order.
///
/// Fails only when the document cannot be parsed at all.
pub fn collect_elements(html: &str, names: &[&str]) -> Result<Vec<ElementRef>> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| anyhow!("failed to parse document: {e}"))?;
    let parser = dom.parser();

    let mut elements = Vec::new();
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else { continue };

        let name = tag.name().as_utf8_str().to_ascii_lowercase();
        if !names.contains(&name.as_str()) {
            continue;
        }

        let attrs = tag
            .attributes()
            .iter()
            .map(|(key, value)| (key.into_owned(), value.map(Cow::into_owned)))
            .collect();

        // boundaries() reports an inclusive end index
        let (start, end) = tag.boundaries(parser);
        elements.push(ElementRef {
            name,
            attrs,
            span: start..end + 1,
        });
    }

    Ok(elements)
}

// ============================================================================
// Splice edits
// ============================================================================

/// A pending splice: replace `span` with `replacement`.
#[derive(Debug)]
pub struct Edit {
    pub span: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn replace(span: Range<usize>, replacement: String) -> Self {
        Self { span, replacement }
    }

    pub fn remove(span: Range<usize>) -> Self {
        Self {
            span,
            replacement: String::new(),
        }
    }
}

/// Apply edits to the source in one pass.
///
/// Edits are sorted by start offset; spans must not overlap (element spans
/// of distinct reference nodes never do). An overlapping edit is dropped.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.span.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.span.start < cursor || edit.span.end > source.len() {
            debug_assert!(false, "overlapping or out-of-bounds edit");
            continue;
        }
        out.push_str(&source[cursor..edit.span.start]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&source[cursor..]);
    out
}

// ============================================================================
// Attribute serialization
// ============================================================================

/// Escape an HTML attribute value.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Serialize attributes back to source form, skipping names in `omit`.
///
/// Output starts with a space when non-empty, ready to concatenate after a
/// tag name.
pub fn render_attrs(attrs: &[(String, Option<String>)], omit: &[&str]) -> String {
    let mut out = String::new();
    for (key, value) in attrs {
        if omit.iter().any(|name| key.eq_ignore_ascii_case(name)) {
            continue;
        }
        out.push(' ');
        out.push_str(key);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
    }
    out
}
