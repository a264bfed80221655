mod common;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use qbooking::{
    domain::{BookingStatus, DiscountType, PaymentMethod, UpdateCouponRequest},
    error::AppError,
    service::QuoteRequest,
};

use common::{guest, seed_coupon, seed_room_type, setup, TestApp};

async fn quote_stay(
    app: &TestApp,
    room_type_id: Uuid,
    guest_id: Uuid,
    check_in: NaiveDate,
    nights: i64,
    coupon_code: Option<&str>,
) -> anyhow::Result<qbooking::service::Quote> {
    let quote = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id,
            guest_id,
            check_in,
            check_out: check_in + Duration::days(nights),
            occupancy: 2,
            coupon_code: coupon_code.map(|c| c.to_string()),
        })
        .await?;
    Ok(quote)
}

#[tokio::test]
async fn quote_then_confirm_charges_and_blocks_the_dates() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let guest_id = Uuid::new_v4();
    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let quote = quote_stay(&app, room_type.id, guest_id, check_in, 3, None).await?;
    assert_eq!(quote.booking.status, BookingStatus::Quoted);

    let confirmed = app
        .ctx
        .reservation_service
        .confirm_booking(quote.booking.id, PaymentMethod::Card, &guest(guest_id))
        .await?;

    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(app.ctx.ledger.total_paid(confirmed.id).await?, 30_000);

    // An overlapping stay on the same room type cannot be confirmed
    let rival = quote_stay(
        &app,
        room_type.id,
        Uuid::new_v4(),
        check_in + Duration::days(1),
        3,
        None,
    )
    .await?;
    let err = app
        .ctx
        .reservation_service
        .confirm_booking(rival.booking.id, PaymentMethod::Card, &guest(rival.booking.guest_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DatesUnavailable(_)));

    Ok(())
}

#[tokio::test]
async fn checkout_day_back_to_back_stays_do_not_conflict() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let first = quote_stay(&app, room_type.id, Uuid::new_v4(), check_in, 3, None).await?;
    app.ctx
        .reservation_service
        .confirm_booking(first.booking.id, PaymentMethod::Card, &guest(first.booking.guest_id))
        .await?;

    // Check-in on the first stay's checkout day
    let second = quote_stay(
        &app,
        room_type.id,
        Uuid::new_v4(),
        check_in + Duration::days(3),
        2,
        None,
    )
    .await?;
    let confirmed = app
        .ctx
        .reservation_service
        .confirm_booking(second.booking.id, PaymentMethod::Card, &guest(second.booking.guest_id))
        .await?;

    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    Ok(())
}

#[tokio::test]
async fn declined_payment_cancels_and_frees_the_dates() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let guest_id = Uuid::new_v4();
    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let quote = quote_stay(&app, room_type.id, guest_id, check_in, 3, None).await?;

    app.gateway.set_decline_all(true);
    let err = app
        .ctx
        .reservation_service
        .confirm_booking(quote.booking.id, PaymentMethod::Card, &guest(guest_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PaymentDeclined(_)));

    let booking = app
        .ctx
        .reservation_service
        .get_booking(quote.booking.id)
        .await?
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    // The failed attempt released the hold, so the dates are free again
    app.gateway.set_decline_all(false);
    let retry = quote_stay(&app, room_type.id, guest_id, check_in, 3, None).await?;
    let confirmed = app
        .ctx
        .reservation_service
        .confirm_booking(retry.booking.id, PaymentMethod::Card, &guest(guest_id))
        .await?;
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    Ok(())
}

#[tokio::test]
async fn confirmed_total_keeps_the_quoted_coupon_discount() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let coupon = seed_coupon(&app, "SAVE10", DiscountType::Percentage, 10, 0, None, None).await?;

    let guest_id = Uuid::new_v4();
    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
    let quote = quote_stay(&app, room_type.id, guest_id, check_in, 3, Some("SAVE10")).await?;
    assert_eq!(quote.booking.total_cents, 27_000);

    // Editing the coupon after the quote never reprices it
    app.ctx
        .coupon_repo
        .update(
            coupon.id,
            UpdateCouponRequest {
                value: Some(50),
                ..Default::default()
            },
        )
        .await?;

    let confirmed = app
        .ctx
        .reservation_service
        .confirm_booking(quote.booking.id, PaymentMethod::Card, &guest(guest_id))
        .await?;

    assert_eq!(confirmed.total_cents, 27_000);
    assert_eq!(app.ctx.ledger.total_paid(confirmed.id).await?, 27_000);

    let application = app
        .ctx
        .coupon_repo
        .find_application(confirmed.id)
        .await?
        .unwrap();
    assert_eq!(application.discount_cents, 3_000);

    Ok(())
}

#[tokio::test]
async fn confirming_twice_is_a_conflict() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let guest_id = Uuid::new_v4();
    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let quote = quote_stay(&app, room_type.id, guest_id, check_in, 3, None).await?;
    app.ctx
        .reservation_service
        .confirm_booking(quote.booking.id, PaymentMethod::Card, &guest(guest_id))
        .await?;

    let err = app
        .ctx
        .reservation_service
        .confirm_booking(quote.booking.id, PaymentMethod::Card, &guest(guest_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn cancelling_a_quoted_booking_needs_no_calendar_work() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let guest_id = Uuid::new_v4();
    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let quote = quote_stay(&app, room_type.id, guest_id, check_in, 3, None).await?;
    let cancelled = app
        .ctx
        .reservation_service
        .cancel_booking(quote.booking.id, &guest(guest_id))
        .await?;
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    // A cancelled booking cannot be cancelled again
    let err = app
        .ctx
        .reservation_service
        .cancel_booking(quote.booking.id, &guest(guest_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn guests_cannot_touch_other_guests_bookings() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let guest_id = Uuid::new_v4();
    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    let quote = quote_stay(&app, room_type.id, guest_id, check_in, 3, None).await?;

    let stranger = guest(Uuid::new_v4());
    let err = app
        .ctx
        .reservation_service
        .confirm_booking(quote.booking.id, PaymentMethod::Card, &stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}
