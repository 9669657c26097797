//! Request middleware: CORS and the identity gate

use super::{error::ApiError, AppState};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use manager_lib::{auth::AuthError, health::components};
use std::sync::Arc;
use tracing::debug;

const ALLOWED_METHODS: &str = "GET, POST, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "authorization, content-type";

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}

/// Allow any origin; preflight requests are answered before routing
pub async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

/// Verify the bearer token of every core request.
///
/// Passes everything through when no identity verifier is configured.
pub async fn require_identity(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(gate) = &state.gate else {
        return next.run(request).await;
    };

    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match gate.authorize(authorization.as_deref()).await {
        Ok(identity) => {
            state
                .health_registry
                .set_healthy(components::IDENTITY)
                .await;
            debug!(
                user = identity.user_name.as_deref().unwrap_or("unknown"),
                gid = %identity.gid,
                "Request authorized"
            );
            next.run(request).await
        }
        Err(err) => {
            match &err {
                AuthError::VerifierUnreachable(reason) => {
                    state.metrics.inc_collaborator_errors(components::IDENTITY);
                    state
                        .logger
                        .log_collaborator_failure(components::IDENTITY, reason);
                    state
                        .health_registry
                        .set_degraded(components::IDENTITY, reason.clone())
                        .await;
                }
                AuthError::Rejected { .. } | AuthError::NotAdministrator => {
                    state
                        .health_registry
                        .set_healthy(components::IDENTITY)
                        .await;
                }
                AuthError::MissingToken => {}
            }

            debug!(error = %err, "Request refused by identity gate");
            ApiError::from(err).into_response()
        }
    }
}
