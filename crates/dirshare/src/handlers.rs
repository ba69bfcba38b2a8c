use std::path::Path as FsPath;

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::ServeState;
use crate::error::ServeError;
use crate::listing::{ListingPayload, entries_under, read_entries};
use crate::resolver::{ResolvedPath, TargetKind, classify, resolve_and_verify_path};
use crate::shell::Notice;

/// Icon served for `*/favicon.ico`, regardless of the served directory.
pub const FAVICON: &[u8] = include_bytes!("../assets/favicon.ico");

const FAVICON_NAME: &str = "favicon.ico";

// ============================================================================
// Handlers
// ============================================================================

/// GET / - List the served root
pub async fn index(State(state): State<ServeState>, headers: HeaderMap) -> Response {
    respond(&state, "", &headers).await
}

/// GET /{*path} - Stream a file or list a directory under the served root
pub async fn serve_path(
    State(state): State<ServeState>,
    Path(subpath): Path<String>,
    headers: HeaderMap,
) -> Response {
    if is_favicon(&subpath) {
        return favicon().await;
    }
    respond(&state, &subpath, &headers).await
}

/// GET */favicon.ico - Bundled application icon
pub async fn favicon() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/x-icon")],
        Bytes::from_static(FAVICON),
    )
        .into_response()
}

// ============================================================================
// Helper functions
// ============================================================================

fn is_favicon(subpath: &str) -> bool {
    subpath.rsplit('/').next() == Some(FAVICON_NAME)
}

/// Report request failures to the shell and turn them into a response.
async fn respond(state: &ServeState, subpath: &str, headers: &HeaderMap) -> Response {
    match serve(state, subpath, headers).await {
        Ok(response) => response,
        Err(err) => {
            warn!("Request for /{} failed: {}", subpath, err);
            state.shell.error(&Notice::new("Error", err.to_string()));
            err.into_response()
        }
    }
}

async fn serve(
    state: &ServeState,
    subpath: &str,
    headers: &HeaderMap,
) -> Result<Response, ServeError> {
    let root = state.root.clone();
    let relative = subpath.to_string();

    let (resolved, kind) = tokio::task::spawn_blocking(move || {
        let resolved = resolve_and_verify_path(&root, &relative)?;
        let kind = classify(&resolved.absolute)?;
        Ok::<_, ServeError>((resolved, kind))
    })
    .await
    .map_err(|err| ServeError::io(state.root.as_path(), std::io::Error::other(err)))??;

    match kind {
        TargetKind::File => stream_file(&resolved.absolute).await,
        TargetKind::Directory => list_directory(state, resolved, headers).await,
    }
}

/// Stream a file without loading it into memory.
async fn stream_file(path: &FsPath) -> Result<Response, ServeError> {
    debug!("Streaming file: {}", path.display());

    let metadata = fs::metadata(path)
        .await
        .map_err(|e| ServeError::io(path, e))?;
    let file = fs::File::open(path)
        .await
        .map_err(|e| ServeError::io(path, e))?;

    let body = Body::from_stream(ReaderStream::new(file));
    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
        ],
        body,
    )
        .into_response())
}

async fn list_directory(
    state: &ServeState,
    resolved: ResolvedPath,
    headers: &HeaderMap,
) -> Result<Response, ServeError> {
    let dir = resolved.absolute.clone();
    let names = tokio::task::spawn_blocking(move || read_entries(&dir))
        .await
        .map_err(|err| ServeError::io(&resolved.absolute, std::io::Error::other(err)))??;

    debug!(
        "Listing {} ({} entries)",
        resolved.absolute.display(),
        names.len()
    );

    let listing = ListingPayload {
        ip: state.ip,
        port: state.port,
        directory: resolved.absolute.display().to_string(),
        subdirectories: entries_under(&resolved.link, names),
    };

    if wants_json(headers) {
        Ok(Json(listing).into_response())
    } else {
        Ok(Html(state.renderer.render(&listing)).into_response())
    }
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}
