//! Script sub-pass: `<script src>` becomes an inline script with bundled code.

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::{PassOutput, local_locator, resolve_locator};
use crate::bundle::BundleCache;
use crate::markup::{Edit, ElementRef, render_attrs};

/// Replace local script references with inline script nodes carrying the
/// bundled, self-contained code. The original attributes survive minus the
/// source locator. Bundling failures warn and leave the node unchanged.
pub(crate) async fn inline_scripts(
    refs: Vec<ElementRef>,
    base_dir: &Path,
    bundles: &Arc<BundleCache>,
) -> PassOutput {
    let mut tasks = JoinSet::new();

    for (index, element) in refs.into_iter().enumerate() {
        let Some(src) = local_locator(&element, "src") else {
            continue;
        };
        if !src.ends_with(".js") {
            continue;
        }

        let path = resolve_locator(base_dir, &src);
        let bundles = Arc::clone(bundles);
        tasks.spawn(async move {
            let outcome = match bundles.obtain(&path).await {
                Ok(bundle) => {
                    let attrs = render_attrs(&element.attrs, &["src"]);
                    let replacement = format!("<script{attrs}>{}</script>", bundle.code);
                    Ok((element.span.clone(), bundle.input_files.clone(), replacement))
                }
                Err(error) => Err(format!(
                    "failed to bundle and inline script {} (src: {src}): {error:#}",
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
            Ok((span, input_files, replacement)) => {
                out.edits.push(Edit::replace(span, replacement));
                out.inlined.extend(input_files);
            }
            Err(warning) => out.warnings.push(warning),
        }
    }
    out
}
