mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use qbooking::{
    domain::{Booking, BookingStatus, PaymentMethod},
    service::QuoteRequest,
};

use common::{guest, seed_room_type, setup, TestApp};

async fn confirmed_stay_starting_in(
    app: &TestApp,
    guest_id: Uuid,
    days_ahead: i64,
) -> anyhow::Result<Booking> {
    let room_type = seed_room_type(app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let check_in = Utc::now().date_naive() + Duration::days(days_ahead);

    let quote = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id,
            check_in,
            check_out: check_in + Duration::days(3),
            occupancy: 2,
            coupon_code: None,
        })
        .await?;

    let booking = app
        .ctx
        .reservation_service
        .confirm_booking(quote.booking.id, PaymentMethod::Card, &guest(guest_id))
        .await?;

    Ok(booking)
}

#[tokio::test]
async fn early_cancellation_requests_a_full_refund() -> anyhow::Result<()> {
    let app = setup().await?;
    let guest_id = Uuid::new_v4();
    // Well outside the 7-day window
    let booking = confirmed_stay_starting_in(&app, guest_id, 30).await?;

    let cancelled = app
        .ctx
        .reservation_service
        .cancel_booking(booking.id, &guest(guest_id))
        .await?;
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let tickets = app
        .ctx
        .refund_service
        .list_tickets(booking.id, &guest(guest_id))
        .await?;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].requested_cents, 30_000);

    Ok(())
}

#[tokio::test]
async fn late_cancellation_withholds_the_fee() -> anyhow::Result<()> {
    let app = setup().await?;
    let guest_id = Uuid::new_v4();
    // Two days out: a 20% fee applies
    let booking = confirmed_stay_starting_in(&app, guest_id, 2).await?;

    app.ctx
        .reservation_service
        .cancel_booking(booking.id, &guest(guest_id))
        .await?;

    let tickets = app
        .ctx
        .refund_service
        .list_tickets(booking.id, &guest(guest_id))
        .await?;
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].requested_cents, 30_000 - 6_000);

    Ok(())
}

#[tokio::test]
async fn cancelling_an_unpaid_quote_opens_no_ticket() -> anyhow::Result<()> {
    let app = setup().await?;
    let guest_id = Uuid::new_v4();
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let check_in = Utc::now().date_naive() + Duration::days(30);

    let quote = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id,
            check_in,
            check_out: check_in + Duration::days(3),
            occupancy: 2,
            coupon_code: None,
        })
        .await?;

    app.ctx
        .reservation_service
        .cancel_booking(quote.booking.id, &guest(guest_id))
        .await?;

    let tickets = app
        .ctx
        .refund_service
        .list_tickets(quote.booking.id, &guest(guest_id))
        .await?;
    assert!(tickets.is_empty());

    Ok(())
}

#[tokio::test]
async fn cancelling_a_held_booking_frees_the_dates() -> anyhow::Result<()> {
    let app = setup().await?;
    let guest_id = Uuid::new_v4();
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let check_in = Utc::now().date_naive() + Duration::days(30);

    let quote = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id,
            check_in,
            check_out: check_in + Duration::days(3),
            occupancy: 2,
            coupon_code: None,
        })
        .await?;
    app.ctx.calendar.try_hold(&quote.booking).await?;

    let cancelled = app
        .ctx
        .reservation_service
        .cancel_booking(quote.booking.id, &guest(guest_id))
        .await?;
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    // Another guest can now book the same range
    let other = Uuid::new_v4();
    let rival = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id: other,
            check_in,
            check_out: check_in + Duration::days(3),
            occupancy: 2,
            coupon_code: None,
        })
        .await?;
    let confirmed = app
        .ctx
        .reservation_service
        .confirm_booking(rival.booking.id, PaymentMethod::Card, &guest(other))
        .await?;
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    Ok(())
}
