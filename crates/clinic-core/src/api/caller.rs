//! Caller identity from the authenticating gateway
//!
//! Tokens are verified upstream. The gateway forwards the verified identity
//! in two headers, which are trusted as-is.

use axum::http::HeaderMap;

use super::error::{ApiError, ApiResult};
use crate::types::{Caller, Role};

pub const USER_ID_HEADER: &str = "x-clinic-user-id";
pub const ROLE_HEADER: &str = "x-clinic-role";

pub fn caller_from_headers(headers: &HeaderMap) -> ApiResult<Caller> {
    let user_id = header_str(headers, USER_ID_HEADER)?
        .parse::<i64>()
        .map_err(|_| ApiError::unauthenticated("invalid caller id"))?;
    let role = header_str(headers, ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|_| ApiError::unauthenticated("invalid caller role"))?;

    Ok(Caller::new(user_id, role))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> ApiResult<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::unauthenticated("missing caller identity"))
}
