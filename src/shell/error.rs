use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

// Status codes only: the login route belongs to `AuthConfig`, and handlers
// that want a redirect build it from there.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::AuthExpired => (StatusCode::UNAUTHORIZED, self.to_string()).into_response(),
            Self::Provider { .. } | Self::MalformedCallback | Self::StateMismatch => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::Network(_) | Self::Status { .. } => {
                tracing::error!(error = %self, "Backend call failed");
                (StatusCode::BAD_GATEWAY, "Backend unavailable").into_response()
            }
            Self::Storage(_) | Self::Serialization(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::header::LOCATION;

    use super::*;

    #[test]
    fn auth_expired_is_unauthorized_without_redirect() {
        let response = Error::AuthExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(LOCATION).is_none());
    }

    #[tokio::test]
    async fn provider_error_is_bad_request_with_message() {
        let response = Error::Provider {
            error: "access_denied".into(),
            description: Some("User said no".into()),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(LOCATION).is_none());

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"User said no");
    }

    #[test]
    fn config_error_is_internal() {
        let response = Error::Config("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
