//! Static file serving under a URL prefix.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::pipeline::{Flow, Stage, StageFuture};
use crate::request::Request;
use crate::response::Response;

/// Serves files from a root directory under a fixed URL prefix.
///
/// Requests outside the prefix fall through untouched. Requests under the
/// prefix are terminal: they either stream the file with a content type
/// derived from its extension, or answer 404 — including for any path whose
/// resolution would escape the root. The rejected path is logged, never
/// echoed to the client.
pub struct StaticFiles {
    prefix: String,
    root: PathBuf,
}

impl StaticFiles {
    /// `prefix` is matched against the raw request path (`"/uploads"`);
    /// `root` is the directory its remainder resolves against.
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_owned(),
            root: root.into(),
        }
    }
}

impl Stage for StaticFiles {
    fn name(&self) -> &'static str {
        "static-files"
    }

    fn handle(&self, req: Request) -> StageFuture {
        let prefix = self.prefix.clone();
        let root = self.root.clone();
        Box::pin(async move {
            let Some(rest) = strip_prefix(req.path(), &prefix) else {
                return Flow::Next(req);
            };
            match load(&root, &rest).await {
                Some((bytes, content_type)) => Flow::Halt(Response::bytes(content_type, bytes)),
                None => Flow::Halt(Response::not_found()),
            }
        })
    }
}

/// Returns the path remainder if `path` sits under `prefix` on a segment
/// boundary (`/uploads/a.txt` matches `/uploads`; `/uploadsx` does not).
fn strip_prefix(path: &str, prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest.trim_start_matches('/').to_owned())
    } else {
        None
    }
}

/// Resolves `rest` against `root` and reads the file.
///
/// Both the root and the candidate are canonicalized; a candidate that
/// resolves outside the root (parent segments, symlinks) is treated exactly
/// like a missing file.
async fn load(root: &Path, rest: &str) -> Option<(Vec<u8>, &'static str)> {
    let root = tokio::fs::canonicalize(root).await.ok()?;
    let resolved = tokio::fs::canonicalize(root.join(rest)).await.ok()?;

    if !resolved.starts_with(&root) {
        warn!(resolved = %resolved.display(), "path traversal attempt blocked");
        return None;
    }
    if !tokio::fs::metadata(&resolved).await.ok()?.is_file() {
        return None;
    }

    let bytes = tokio::fs::read(&resolved).await.ok()?;
    let content_type = content_type_for(resolved.extension().and_then(|e| e.to_str()));
    Some((bytes, content_type))
}

/// Content type from a file extension. Unknown extensions download as
/// opaque bytes.
fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
