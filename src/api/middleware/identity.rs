use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::{
    domain::{Identity, Role},
    error::{AppError, Result},
};

/// Trusts the upstream identity service: it authenticates the caller and
/// asserts `X-User-Id` / `X-User-Role` on the proxied request. The core
/// performs no credential logic; role checks happen in the services.
pub async fn require_identity(mut req: Request, next: Next) -> Result<Response> {
    let user_id = req
        .headers()
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok());

    let role = req
        .headers()
        .get("x-user-role")
        .and_then(|v| v.to_str().ok())
        .and_then(Role::from_str);

    match (user_id, role) {
        (Some(user_id), Some(role)) => {
            req.extensions_mut().insert(Identity { user_id, role });
            Ok(next.run(req).await)
        }
        _ => Err(AppError::Unauthorized),
    }
}
