//! Companion UI file serving.
//!
//! Every path outside `/messages` is looked up under the asset root.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use super::AppState;
use crate::web::error::ApiError;

/// Methods accepted on asset paths.
pub const ASSETS_ALLOW: &str = "OPTIONS, GET";

/// File served for `/`.
pub const INDEX_FILE: &str = "index.html";

/// Content type for a file, by extension.
pub fn content_type_for(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("js") => "text/javascript".to_string(),
        Some("wasm") => "application/wasm".to_string(),
        Some("css") => "text/css".to_string(),
        Some("html") => "text/html".to_string(),
        _ => mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Map a request path onto a file below `root`.
///
/// Returns `None` for paths that would leave the root.
pub fn resolve_asset_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let relative = decoded.trim_start_matches('/');
    let relative = if relative.is_empty() {
        INDEX_FILE
    } else {
        relative
    };

    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(path)
}

async fn serve_file(root: &Path, request_path: &str) -> Result<Response, ApiError> {
    let not_found = || ApiError::not_found("File not found");

    let path = resolve_asset_path(root, request_path).ok_or_else(not_found)?;
    let file = tokio::fs::File::open(&path).await.map_err(|_| not_found())?;
    let metadata = file.metadata().await.map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&path))
        .header(header::CONTENT_LENGTH, metadata.len())
        .body(body)
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// Fallback for every path other than `/messages`.
pub async fn asset_fallback(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    match method {
        Method::GET => {
            tracing::debug!(path = uri.path(), "asset request");
            serve_file(&state.assets_dir, uri.path())
                .await
                .unwrap_or_else(IntoResponse::into_response)
        }
        Method::OPTIONS => (StatusCode::OK, [(header::ALLOW, ASSETS_ALLOW)]).into_response(),
        _ => ApiError::bad_request("Unknown request method").into_response(),
    }
}
