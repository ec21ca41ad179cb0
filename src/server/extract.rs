use crate::constants::USER_ID_HEADER;
use crate::error::ParksError;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::http::request::Parts;

/// JSON body whose rejections render as `{"error": ...}` with status 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ParksError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ParksError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ParksError))]
pub struct ApiPath<T>(pub T);

/// Caller identity from the `x-user-id` header, recorded in audit rows.
#[derive(Debug, Clone, Default)]
pub struct ChangedBy(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ChangedBy {
    type Rejection = ParksError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.headers.get(USER_ID_HEADER) {
            None => None,
            Some(value) => {
                let text = value.to_str().map_err(|_| {
                    ParksError::validation(format!("{USER_ID_HEADER} header is not valid text"))
                })?;
                Some(text.trim().to_string()).filter(|t| !t.is_empty())
            }
        };
        Ok(ChangedBy(user))
    }
}
