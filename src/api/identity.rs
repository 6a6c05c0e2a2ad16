use actix_web::{dev::Payload, error::ErrorUnauthorized, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::domain::access::{Actor, Role};

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Caller identity as asserted by the auth gateway in front of the service
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl Identity {
    fn from_headers(req: &HttpRequest) -> Result<Actor, String> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| format!("missing {} header", name))
        };

        let id = Uuid::parse_str(header(USER_ID_HEADER)?.trim())
            .map_err(|_| format!("invalid {} header", USER_ID_HEADER))?;
        let role: Role = header(USER_ROLE_HEADER)?.parse().map_err(|e| format!("{}", e))?;
        Ok(Actor::new(id, role))
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(match Self::from_headers(req) {
            Ok(actor) => Ok(Identity(actor)),
            Err(reason) => {
                tracing::debug!(path = %req.path(), reason = %reason, "Rejected request without identity");
                Err(ErrorUnauthorized(reason))
            }
        })
    }
}
