use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    domain::{Coupon, CreateCouponRequest, Identity, UpdateCouponRequest},
    error::{AppError, Result},
};

pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<Coupon>)> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if state
        .service_context
        .coupon_repo
        .find_by_code(&req.code)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Coupon '{}' already exists",
            req.code
        )));
    }

    let coupon = state.service_context.coupon_repo.create(req).await?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Edits apply to future quotes only; applications already frozen onto
/// bookings keep the discount they recorded.
pub async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCouponRequest>,
) -> Result<Json<Coupon>> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }

    let coupon = state.service_context.coupon_repo.update(id, req).await?;
    Ok(Json(coupon))
}
