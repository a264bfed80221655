use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Identity, Refund, RefundTicket},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct RaiseTicketBody {
    pub booking_id: Uuid,
    pub requested_cents: i64,
    pub reason: String,
}

pub async fn raise(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<RaiseTicketBody>,
) -> Result<(StatusCode, Json<RefundTicket>)> {
    let ticket = state
        .service_context
        .refund_service
        .raise_ticket(body.booking_id, body.requested_cents, body.reason, &identity)
        .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    pub amount_cents: i64,
}

pub async fn approve(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(body): Json<ApproveBody>,
) -> Result<Json<RefundTicket>> {
    let ticket = state
        .service_context
        .refund_service
        .approve(id, body.amount_cents, &identity)
        .await?;

    Ok(Json(ticket))
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundTicket>> {
    let ticket = state
        .service_context
        .refund_service
        .reject(id, &identity)
        .await?;

    Ok(Json(ticket))
}

pub async fn execute(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<Refund>> {
    let refund = state
        .service_context
        .refund_service
        .execute(id, &identity)
        .await?;

    Ok(Json(refund))
}

pub async fn list_for_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<RefundTicket>>> {
    let tickets = state
        .service_context
        .refund_service
        .list_tickets(booking_id, &identity)
        .await?;

    Ok(Json(tickets))
}
