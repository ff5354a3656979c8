//! Request identity.
//!
//! Authentication lives in front of this service; by the time a request
//! arrives the proxy has verified the caller and injected their id as the
//! `X-Tradelens-User` header. This extractor only parses it.

use crate::AppState;
use crate::errors::{Error, Result};
use crate::types::UserId;
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::trace;

/// Header carrying the verified user id, set by the auth proxy.
pub const USER_ID_HEADER: &str = "x-tradelens-user";

/// The authenticated caller of the current request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: UserId,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self> {
        let Some(header) = parts.headers.get(USER_ID_HEADER) else {
            trace!("No user id header on request");
            return Err(Error::Unauthorized {
                message: "Missing user identity header".to_string(),
            });
        };

        let id = header
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<UserId>().ok())
            .ok_or_else(|| Error::Unauthorized {
                message: "Malformed user identity header".to_string(),
            })?;

        Ok(CurrentUser { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts as _;
    use uuid::Uuid;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(value) = value {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_valid_header_extracts_user() {
        let state = crate::test_state();
        let id = Uuid::new_v4();
        let mut parts = parts_with_header(Some(&id.to_string()));
        let user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let state = crate::test_state();
        let mut parts = parts_with_header(None);
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        let state = crate::test_state();
        let mut parts = parts_with_header(Some("not-a-uuid"));
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
