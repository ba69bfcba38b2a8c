//! Mapping request paths onto the served root.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::error::ServeError;

/// What a resolved path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    File,
    Directory,
}

/// A request path resolved against the served root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute filesystem path
    pub absolute: PathBuf,
    /// Normalized forward-slash path relative to the root ("" for the root itself)
    pub link: String,
}

/// Resolve `relative` under `root` without touching the filesystem.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
/// Anything that would climb above `root`, absolute components and NUL bytes
/// are rejected as [`ServeError::Forbidden`].
pub fn resolve_path(root: &Path, relative: &str) -> Result<ResolvedPath, ServeError> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in relative.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    warn!("Path traversal attempt detected: {:?}", relative);
                    return Err(ServeError::Forbidden);
                }
            }
            name => {
                if name.contains('\0') {
                    warn!("Path segment contains null byte: {:?}", name);
                    return Err(ServeError::Forbidden);
                }
                // Catches platform separators and prefixes hidden inside one segment.
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => segments.push(name),
                    _ => {
                        warn!("Rejected path segment {:?} in {:?}", name, relative);
                        return Err(ServeError::Forbidden);
                    }
                }
            }
        }
    }

    let mut absolute = root.to_path_buf();
    absolute.extend(&segments);

    Ok(ResolvedPath {
        absolute,
        link: segments.join("/"),
    })
}

/// Resolve `relative` and make sure symlinks do not lead outside `root`.
///
/// Paths that do not exist are returned unchanged; the following stat
/// reports them.
pub fn resolve_and_verify_path(root: &Path, relative: &str) -> Result<ResolvedPath, ServeError> {
    let resolved = resolve_path(root, relative)?;

    if resolved.absolute.exists() {
        let canonical_root = root
            .canonicalize()
            .map_err(|e| ServeError::io(root, e))?;
        let canonical_path = resolved
            .absolute
            .canonicalize()
            .map_err(|e| ServeError::io(&resolved.absolute, e))?;

        if !canonical_path.starts_with(&canonical_root) {
            warn!(
                "Symlink escape attempt: {:?} resolved to {:?} which is outside {:?}",
                resolved.absolute, canonical_path, canonical_root
            );
            return Err(ServeError::Forbidden);
        }
    }

    Ok(resolved)
}

/// Stat `path` and classify it. Devices, sockets and dangling links are errors.
pub fn classify(path: &Path) -> Result<TargetKind, ServeError> {
    let metadata = std::fs::metadata(path).map_err(|e| ServeError::io(path, e))?;

    if metadata.is_file() {
        Ok(TargetKind::File)
    } else if metadata.is_dir() {
        Ok(TargetKind::Directory)
    } else {
        Err(ServeError::UnsupportedTarget(path.to_path_buf()))
    }
}

/// Join a child name onto a forward-slash link path.
pub fn join_link(parent: &str, name: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
