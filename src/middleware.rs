//! Axum adapter for the gate.
//!
//! The middleware runs once per inbound request: it normalizes the path,
//! strips the configured proxy prefix, rejects disabled endpoints, runs the
//! gate and either forwards the request (attaching the [`Identity`] as a
//! request extension) or replies with the gate's status and a generic JSON
//! body. 401 replies carry the aggregated `WWW-Authenticate` challenges.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::StatusCode;

use crate::{
    auth::{ErrorResponse, Identity},
    gate::{AuthGate, GateDecision},
    routing::normalize_path,
};

/// Gate middleware; install with
/// `axum::middleware::from_fn_with_state(gate, gate_middleware)`.
pub async fn gate_middleware(
    State(gate): State<Arc<AuthGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let id = gate.next_request_id();

    let full_path = normalize_path(request.uri().path());
    let configured_prefix = gate.config().prefix.as_str();
    let (prefix, mut path) = split_prefix(&full_path, configured_prefix);
    if path.is_empty() {
        path = "/";
    }

    tracing::debug!(
        request_id = id,
        method = %request.method(),
        path,
        "gate check"
    );

    if gate.is_endpoint_disabled(path).await {
        return error_response(
            StatusCode::LOCKED,
            format!("Endpoint {path:?} is disabled"),
        );
    }

    let query = request.uri().query().map(str::to_owned);
    let decision = gate
        .check(id, prefix, path, request.headers(), query.as_deref())
        .await;

    match decision {
        GateDecision::Open => next.run(request).await,
        GateDecision::Granted(identity) => {
            tracing::debug!(
                request_id = id,
                user = %identity.user,
                method = identity.method,
                "user logged in"
            );
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        GateDecision::Unauthorized => {
            let mut response =
                error_response(StatusCode::UNAUTHORIZED, "Unauthorized".to_string());
            gate.write_auth_request_headers(response.headers_mut(), prefix, path)
                .await;
            response
        }
        GateDecision::Forbidden => error_response(StatusCode::FORBIDDEN, "Forbidden".to_string()),
    }
}

/// Split a configured proxy prefix off the path. The prefix matches only at
/// whole-segment boundaries.
fn split_prefix<'a>(path: &'a str, prefix: &'a str) -> (&'a str, &'a str) {
    if prefix.is_empty() {
        return ("", path);
    }
    if path == prefix {
        return (prefix, "");
    }
    if let Some(rest) = path.strip_prefix(prefix)
        && rest.starts_with('/')
    {
        return (prefix, rest);
    }
    ("", path)
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
