//! Image sub-pass: `<img src>` becomes a base64 data URI.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::task::JoinSet;

use super::{PassOutput, local_locator, resolve_locator};
use crate::markup::{Edit, ElementRef, render_attrs};

/// Image content types that are safe to declare in a data URI.
///
/// An unrecognized extension is left alone: an unknown content type cannot
/// be safely declared.
fn image_mime(ext: &str) -> Option<&'static str> {
    match ext {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Rewrite local image references to embedded data URIs, keeping all other
/// attributes of the tag. Failures warn and leave the node unchanged.
pub(crate) async fn inline_images(refs: Vec<ElementRef>, base_dir: &Path) -> PassOutput {
    let mut tasks = JoinSet::new();

    for (index, element) in refs.into_iter().enumerate() {
        let Some(src) = local_locator(&element, "src") else {
            continue;
        };
        // Embedded-data references are never re-inlined
        if src.starts_with("data:") {
            continue;
        }

        let path = resolve_locator(base_dir, &src);
        tasks.spawn(async move {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();

            let outcome = match tokio::fs::read(&path).await {
                Ok(bytes) => match image_mime(&ext) {
                    Some(mime) => {
                        let data_uri = format!("data:{mime};base64,{}", STANDARD.encode(&bytes));
                        let mut attrs = element.attrs.clone();
                        for (key, value) in &mut attrs {
                            if key.eq_ignore_ascii_case("src") {
                                *value = Some(data_uri.clone());
                            }
                        }
                        let replacement = format!("<img{}>", render_attrs(&attrs, &[]));
                        Ok((element.span.clone(), path, replacement))
                    }
                    None => Err(format!(
                        "could not determine content type for image {}; skipping inline",
                        path.display()
                    )),
                },
                Err(error) => Err(format!(
                    "could not inline image {} (src: {src}): {error}",
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
            Ok((span, path, replacement)) => {
                out.edits.push(Edit::replace(span, replacement));
                out.inlined.push(path);
            }
            Err(warning) => out.warnings.push(warning),
        }
    }
    out
}
