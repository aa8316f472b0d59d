//! Minimal HTML page that shows an artifact inline for manual saving.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::export::types::EncodedArtifact;

const PAGE_TITLE: &str = "Result image";

/// Builds a standalone page embedding `artifact` as a `data:` URI.
///
/// The image is part of the page content rather than a file reference, so the
/// page keeps working after the artifact's temporary files are gone.
pub fn render_viewer_page(artifact: &EncodedArtifact) -> String {
    let payload = STANDARD.encode(&artifact.bytes);
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
    <style>
      body {{
        margin: 0;
        padding: 20px;
        background: #f0f0f0;
        display: flex;
        justify-content: center;
        align-items: center;
        min-height: 100vh;
        box-sizing: border-box;
      }}
      img {{
        max-width: 100%;
        box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15);
        border-radius: 8px;
      }}
    </style>
  </head>
  <body>
    <img src="data:{mime};base64,{payload}" width="{width}" height="{height}" alt="{title}">
  </body>
</html>
"#,
        title = PAGE_TITLE,
        mime = artifact.mime_type,
        payload = payload,
        width = logical_size(artifact.width, artifact.scale),
        height = logical_size(artifact.height, artifact.scale),
    )
}

/// Displays high-density captures at their logical size.
fn logical_size(pixels: u32, scale: f64) -> u32 {
    if scale > 0.0 {
        ((pixels as f64) / scale).round().max(1.0) as u32
    } else {
        pixels
    }
}
