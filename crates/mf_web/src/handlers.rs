use axum::http::StatusCode;

/// Liveness only: 204 with an empty body while the process is up.
pub async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
