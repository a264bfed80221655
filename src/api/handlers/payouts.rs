use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{HostEarning, HostPayout, Identity},
    error::{AppError, Result},
};

pub async fn list_earnings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(host_id): Path<Uuid>,
) -> Result<Json<Vec<HostEarning>>> {
    if !identity.can_act_for(host_id) {
        return Err(AppError::Forbidden);
    }

    let earnings = state
        .service_context
        .settlement_service
        .list_host_earnings(host_id)
        .await?;

    Ok(Json(earnings))
}

#[derive(Debug, Deserialize)]
pub struct BatchPayoutBody {
    pub period_end: NaiveDate,
}

pub async fn run_batch(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(host_id): Path<Uuid>,
    Json(body): Json<BatchPayoutBody>,
) -> Result<(StatusCode, Json<HostPayout>)> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }

    let payout = state
        .service_context
        .settlement_service
        .batch_payout(host_id, body.period_end)
        .await?;

    Ok((StatusCode::CREATED, Json(payout)))
}

pub async fn confirm(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<HostPayout>> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }

    let payout = state
        .service_context
        .settlement_service
        .confirm_payout(id)
        .await?;

    Ok(Json(payout))
}

pub async fn fail(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<HostPayout>> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }

    let payout = state
        .service_context
        .settlement_service
        .fail_payout(id)
        .await?;

    Ok(Json(payout))
}
