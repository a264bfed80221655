use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{Booking, CouponApplication, Identity, PaymentMethod},
    error::{AppError, Result},
    service::QuoteRequest,
};

#[derive(Debug, Deserialize)]
pub struct QuoteBody {
    pub room_type_id: Uuid,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub occupancy: i32,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub booking: Booking,
    pub coupon: Option<CouponApplication>,
}

pub async fn quote(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<QuoteBody>,
) -> Result<(StatusCode, Json<QuoteResponse>)> {
    let quote = state
        .service_context
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: body.room_type_id,
            guest_id: identity.user_id,
            check_in: body.check_in,
            check_out: body.check_out,
            occupancy: body.occupancy,
            coupon_code: body.coupon_code,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(QuoteResponse {
            booking: quote.booking,
            coupon: quote.coupon,
        }),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .reservation_service
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if !identity.can_act_for(booking.guest_id) {
        return Err(AppError::Forbidden);
    }

    Ok(Json(booking))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Booking>>> {
    let bookings = state
        .service_context
        .reservation_service
        .list_guest_bookings(identity.user_id)
        .await?;

    Ok(Json(bookings))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    pub method: PaymentMethod,
}

pub async fn confirm(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .reservation_service
        .confirm_booking(id, body.method, &identity)
        .await?;

    Ok(Json(booking))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>> {
    let booking = state
        .service_context
        .reservation_service
        .cancel_booking(id, &identity)
        .await?;

    Ok(Json(booking))
}
