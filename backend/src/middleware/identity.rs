//! Caller identity taken from the `x-user-id` header.
//!
//! Authentication happens upstream of this service; the gateway forwards the
//! authenticated user's id in the header.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::str::FromStr;

use crate::error::AppError;
use crate::types::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Required caller identity; rejects with 401 when the header is missing or
/// not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

/// Caller identity when the header is present. A malformed header is still
/// rejected with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeUser(pub Option<UserId>);

fn user_from_parts(parts: &Parts) -> Result<Option<UserId>, AppError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))?;
    UserId::from_str(raw.trim())
        .map(Some)
        .map_err(|_| AppError::Unauthorized("Invalid x-user-id header".into()))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts)?
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_from_parts(parts).map(MaybeUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/sessions");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).expect("request").into_parts().0
    }

    #[tokio::test]
    async fn current_user_requires_header() {
        let err = CurrentUser::from_request_parts(&mut parts(None), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let user = UserId::new();
        let extracted = CurrentUser::from_request_parts(&mut parts(Some(&user.to_string())), &())
            .await
            .expect("user");
        assert_eq!(extracted, CurrentUser(user));
    }

    #[tokio::test]
    async fn maybe_user_allows_absence_but_not_garbage() {
        let absent = MaybeUser::from_request_parts(&mut parts(None), &())
            .await
            .expect("absent is fine");
        assert_eq!(absent, MaybeUser(None));

        let err = MaybeUser::from_request_parts(&mut parts(Some("not-a-uuid")), &())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
