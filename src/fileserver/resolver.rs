//! Request path to filesystem path resolution.
//!
//! Resolution is `normalize → join(root, prefix, path) → canonicalize →
//! containment check → stat`. Every step that fails ends the request; there
//! is no fallback lookup.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ResolveError;

/// Resolves URL paths under one mount to regular files inside its root.
#[derive(Debug, Clone)]
pub struct SafeFileResolver {
    /// `root` joined with the optional prefix. Requests can never leave it.
    base: PathBuf,
}

impl SafeFileResolver {
    /// The prefix is joined after `root`, so `root/prefix/<request>` is what
    /// gets looked up.
    pub fn new(root: impl Into<PathBuf>, prefix: Option<&str>) -> Self {
        let mut base = root.into();
        if let Some(prefix) = prefix {
            let prefix = prefix.trim_start_matches('/');
            if !prefix.is_empty() {
                base.push(prefix);
            }
        }
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve `request_path` (already percent-decoded, relative to the mount)
    /// to a regular file.
    pub async fn resolve(&self, request_path: &str) -> Result<PathBuf, ResolveError> {
        let relative = normalize(request_path)?;
        let candidate = self.base.join(&relative);

        let jail = tokio::fs::canonicalize(&self.base)
            .await
            .map_err(map_io_error)?;
        let resolved = tokio::fs::canonicalize(&candidate)
            .await
            .map_err(map_io_error)?;

        if !resolved.starts_with(&jail) {
            tracing::warn!(
                path = %request_path,
                "Static path resolves outside mount root"
            );
            return Err(ResolveError::Forbidden);
        }

        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(map_io_error)?;
        if !metadata.is_file() {
            return Err(ResolveError::Forbidden);
        }

        Ok(resolved)
    }
}

/// Clean a URL path the way `path.Clean` would on a rooted path.
///
/// `.` and empty segments vanish, `..` pops a segment and stops at the root.
/// Segments that are not plain file names on this platform are rejected.
pub fn normalize(request_path: &str) -> Result<PathBuf, ResolveError> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in request_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => {
                if !is_plain_segment(name) {
                    return Err(ResolveError::Forbidden);
                }
                segments.push(name);
            }
        }
    }

    Ok(segments.iter().collect())
}

fn is_plain_segment(segment: &str) -> bool {
    if segment.contains('\0') || segment.contains('\\') {
        return false;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn map_io_error(err: io::Error) -> ResolveError {
    match err.kind() {
        io::ErrorKind::NotFound => ResolveError::NotFound,
        io::ErrorKind::PermissionDenied => ResolveError::Forbidden,
        // A path component that is a file, e.g. `/index.html/x`
        io::ErrorKind::NotADirectory => ResolveError::NotFound,
        _ => ResolveError::Io(err),
    }
}
