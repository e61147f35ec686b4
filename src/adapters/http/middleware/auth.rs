//! Request identity extraction.
//!
//! Identity arrives on the `X-User-Id` header, set by the reverse proxy
//! after session validation. Handlers that act on behalf of a customer
//! take [`AuthenticatedUser`]; admin-only routes additionally mount
//! [`require_admin`] which checks the `X-Admin` header.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};

use crate::domain::foundation::UserId;

use super::super::error::ErrorResponse;

/// Authenticated user context extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection for a missing or malformed `X-User-Id` header.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

/// Middleware gating admin routes on the `X-Admin: true` header.
pub async fn require_admin(request: Request, next: Next) -> Response {
    let is_admin = request
        .headers()
        .get("X-Admin")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true")
        .unwrap_or(false);

    if !is_admin {
        let error = ErrorResponse::new("FORBIDDEN", "Admin access is required");
        return (StatusCode::FORBIDDEN, Json(error)).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn whoami(user: AuthenticatedUser) -> String {
        user.user_id.to_string()
    }

    #[tokio::test]
    async fn missing_user_header_is_unauthorized() {
        let app = Router::new().route("/whoami", get(whoami));
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn user_header_is_extracted() {
        let app = Router::new().route("/whoami", get(whoami));
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header("X-User-Id", "user-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_middleware_rejects_without_header() {
        let app = Router::new()
            .route("/admin", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(require_admin));
        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/admin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
