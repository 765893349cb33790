use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use super::*;
use crate::bundle::{BundleCache, BundleOutput, Bundler};
use crate::config::InlineConfig;

/// Stand-in bundler: returns the file contents untouched.
struct EchoBundler;

#[async_trait]
impl Bundler for EchoBundler {
    async fn bundle(&self, entry: &Path) -> Result<BundleOutput> {
        let code = tokio::fs::read_to_string(entry).await?;
        Ok(BundleOutput {
            code: code.trim().to_string(),
            input_files: vec![entry.to_path_buf()],
        })
    }
}

fn make_inliner() -> Inliner {
    Inliner::new(
        Arc::new(BundleCache::new(Box::new(EchoBundler))),
        InlineConfig::default(),
    )
}

fn make_inliner_with(config: InlineConfig) -> Inliner {
    Inliner::new(Arc::new(BundleCache::new(Box::new(EchoBundler))), config)
}

#[tokio::test]
async fn test_stylesheet_is_inlined() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("style.css"), "body{color:red}").unwrap();

    let html = r#"<html><head><link rel="stylesheet" href="/style.css"></head><body></body></html>"#;
    let out = make_inliner().inline_document(html, temp.path()).await;

    assert!(out.html.contains("<style>body{color:red}</style>"));
    assert!(!out.html.contains("stylesheet"));
    assert!(out.warnings.is_empty());
    assert!(out.inlined_files.contains(&temp.path().join("style.css")));
}

#[tokio::test]
async fn test_external_and_data_references_untouched() {
    let temp = TempDir::new().unwrap();
    let html = concat!(
        r#"<link rel="stylesheet" href="https://cdn.example.com/a.css">"#,
        r#"<img src="data:image/png;base64,AAAA">"#,
        r#"<img src="//cdn.example.com/logo.png">"#,
        r#"<script src="HTTP://cdn.example.com/app.js"></script>"#,
    );
    let out = make_inliner().inline_document(html, temp.path()).await;

    assert_eq!(out.html, html);
    assert!(out.warnings.is_empty());
    assert!(out.inlined_files.is_empty());
}

#[tokio::test]
async fn test_missing_stylesheet_warns_and_keeps_node() {
    let temp = TempDir::new().unwrap();
    let html = r#"<link rel="stylesheet" href="/gone.css">"#;
    let out = make_inliner().inline_document(html, temp.path()).await;

    assert_eq!(out.html, html);
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("gone.css"));
    assert!(out.inlined_files.is_empty());
}

#[tokio::test]
async fn test_image_becomes_data_uri() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();

    let html = r#"<img class="logo" src="/logo.png" alt="logo">"#;
    let out = make_inliner().inline_document(html, temp.path()).await;

    assert!(out.html.contains("src=\"data:image/png;base64,"));
    // The other attributes survive the rewrite
    assert!(out.html.contains("class=\"logo\""));
    assert!(out.html.contains("alt=\"logo\""));
    assert!(out.warnings.is_empty());
    assert!(out.inlined_files.contains(&temp.path().join("logo.png")));
}

#[tokio::test]
async fn test_unrecognized_image_extension_warns_and_keeps_node() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("logo.bmp"), [0u8; 8]).unwrap();

    let html = r#"<img src="/logo.bmp">"#;
    let out = make_inliner().inline_document(html, temp.path()).await;

    assert_eq!(out.html, html);
    assert_eq!(out.warnings.len(), 1);
    assert!(out.warnings[0].contains("content type"));
    assert!(out.inlined_files.is_empty());
}

#[tokio::test]
async fn test_script_inlined_with_attributes_kept() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("app.js"), "console.log(\"hi\")\n").unwrap();

    let html = r#"<body><script type="module" src="/app.js"></script></body>"#;
    let out = make_inliner().inline_document(html, temp.path()).await;

    assert!(
        out.html
            .contains(r#"<script type="module">console.log("hi")</script>"#)
    );
    assert!(!out.html.contains("src="));
    assert!(out.inlined_files.contains(&temp.path().join("app.js")));
}

#[tokio::test]
async fn test_same_script_twice_recorded_once() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("app.js"), "run()").unwrap();

    let html = concat!(
        r#"<script src="/app.js"></script>"#,
        r#"<div>middle</div>"#,
        r#"<script src="/app.js"></script>"#,
    );
    let out = make_inliner().inline_document(html, temp.path()).await;

    // Inlined twice in the markup, recorded once in the set
    assert_eq!(out.html.matches("run()").count(), 2);
    assert_eq!(out.inlined_files.len(), 1);
}

#[tokio::test]
async fn test_modulepreload_removed_for_inlined_target() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("app.js"), "run()").unwrap();

    let html = concat!(
        r#"<link rel="modulepreload" href="/app.js">"#,
        r#"<link rel="modulepreload" href="/other.js">"#,
        r#"<script src="/app.js"></script>"#,
    );
    let out = make_inliner().inline_document(html, temp.path()).await;

    // The hint for the inlined script is gone; the unrelated one stays
    assert!(!out.html.contains(r#"href="/app.js""#));
    assert!(out.html.contains(r#"href="/other.js""#));
}

#[tokio::test]
async fn test_modulepreload_kept_when_scripts_disabled() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("app.js"), "run()").unwrap();

    let html = concat!(
        r#"<link rel="modulepreload" href="/app.js">"#,
        r#"<script src="/app.js"></script>"#,
    );
    let config = InlineConfig {
        scripts: false,
        ..InlineConfig::default()
    };
    let out = make_inliner_with(config).inline_document(html, temp.path()).await;

    assert_eq!(out.html, html);
    assert!(out.inlined_files.is_empty());
}

#[tokio::test]
async fn test_disabled_kinds_left_untouched() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("style.css"), "body{}").unwrap();
    std::fs::write(temp.path().join("logo.png"), [1u8]).unwrap();

    let html = concat!(
        r#"<link rel="stylesheet" href="/style.css">"#,
        r#"<img src="/logo.png">"#,
    );
    let config = InlineConfig {
        stylesheets: false,
        images: false,
        scripts: true,
    };
    let out = make_inliner_with(config).inline_document(html, temp.path()).await;

    assert_eq!(out.html, html);
    assert!(out.inlined_files.is_empty());
    assert!(out.warnings.is_empty());
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("style.css"), "body{color:red}").unwrap();
    std::fs::write(temp.path().join("logo.png"), [0x89, b'P']).unwrap();
    std::fs::write(temp.path().join("app.js"), "run()").unwrap();

    let html = concat!(
        r#"<html><head><link rel="stylesheet" href="/style.css">"#,
        r#"<link rel="modulepreload" href="/app.js"></head>"#,
        r#"<body><img src="/logo.png"><script src="/app.js"></script></body></html>"#,
    );
    let inliner = make_inliner();

    let first = inliner.inline_document(html, temp.path()).await;
    assert!(first.warnings.is_empty());
    assert_eq!(first.inlined_files.len(), 3);

    let second = inliner.inline_document(&first.html, temp.path()).await;
    assert_eq!(second.html, first.html);
    assert!(second.warnings.is_empty());
    assert!(second.inlined_files.is_empty());
}
