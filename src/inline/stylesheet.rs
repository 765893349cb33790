//! Stylesheet sub-pass: `<link rel="stylesheet">` becomes `<style>`.

use std::path::Path;

use tokio::task::JoinSet;

use super::{PassOutput, local_locator, resolve_locator};
use crate::markup::{Edit, ElementRef};

/// Replace local stylesheet references with inline style blocks holding the
/// file's raw UTF-8 contents. Failures warn and leave the node unchanged.
pub(crate) async fn inline_stylesheets(refs: Vec<ElementRef>, base_dir: &Path) -> PassOutput {
    let mut tasks = JoinSet::new();

    for (index, element) in refs.into_iter().enumerate() {
        let Some(href) = local_locator(&element, "href") else {
            continue;
        };
        if !href.ends_with(".css") {
            continue;
        }

        let path = resolve_locator(base_dir, &href);
        let span = element.span.clone();
        tasks.spawn(async move {
            let outcome = match tokio::fs::read_to_string(&path).await {
                Ok(css) => Ok((span, path, css)),
                Err(error) => Err(format!(
                    "could not inline stylesheet {} (href: {href}): {error}",
                    path.display()
                )),
            };
            (index, outcome)
        });
    }

    let mut settled = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        if let Ok(item) = joined {
            settled.push(item);
        }
    }
    settled.sort_by_key(|(index, _)| *index);

    let mut out = PassOutput::default();
    for (_, outcome) in settled {
        match outcome {
            Ok((span, path, css)) => {
                out.edits.push(Edit::replace(span, format!("<style>{css}</style>")));
                out.inlined.push(path);
            }
            Err(warning) => out.warnings.push(warning),
        }
    }
    out
}
