//! Request/response logging middleware.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// Logs request method, path, status, and duration.
///
/// License keys appear in some paths, so only the route shape is logged
/// for `/api/licenses/*` and `/api/admin/licenses/*`.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = redact_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "HTTP request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis() as u64,
            "HTTP request"
        );
    }

    response
}

/// Replaces the key segment of license paths with `{key}`.
fn redact_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let key_index = match segments.as_slice() {
        ["", "api", "licenses", key, ..] if !matches!(*key, "activate" | "usage" | "verify") => Some(3),
        ["", "api", "admin", "licenses", key, ..] if *key != "stats" => Some(4),
        _ => None,
    };

    match key_index {
        Some(index) => segments
            .iter()
            .enumerate()
            .map(|(i, s)| if i == index { "{key}" } else { *s })
            .collect::<Vec<_>>()
            .join("/"),
        None => path.to_string(),
    }
}
