//! Caller identity forwarded by the upstream authentication gateway.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use log::warn;
use uuid::Uuid;

use crate::domain::caller::Caller;
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
const ADMIN_ROLE: &str = "admin";

/// Extractor wrapping the domain [`Caller`].
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Caller);

fn caller_from(req: &HttpRequest) -> Result<Caller, AppError> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
        .to_str()
        .ok()
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(|| AppError::Unauthorized(format!("malformed {USER_ID_HEADER} header")))?;

    let is_admin = req
        .headers()
        .get(USER_ROLE_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|role| role.trim().eq_ignore_ascii_case(ADMIN_ROLE));

    Ok(if is_admin {
        Caller::admin(user_id)
    } else {
        Caller::customer(user_id)
    })
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(caller_from(req).map(Identity).inspect_err(|e| {
            warn!("Rejected {} {}: {}", req.method(), req.path(), e);
        }))
    }
}
