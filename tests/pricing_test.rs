mod common;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use qbooking::{
    domain::{BookingStatus, CreateCouponRequest, DiscountType, PaymentMethod},
    error::AppError,
    service::QuoteRequest,
};

use common::{guest, seed_coupon, seed_room_type, setup};

fn stay(check_in: (i32, u32, u32), nights: i64) -> (NaiveDate, NaiveDate) {
    let check_in = NaiveDate::from_ymd_opt(check_in.0, check_in.1, check_in.2).unwrap();
    (check_in, check_in + Duration::days(nights))
}

#[tokio::test]
async fn percentage_coupon_discounts_the_base() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    seed_coupon(&app, "SAVE10", DiscountType::Percentage, 10, 20_000, None, None).await?;

    let (check_in, check_out) = stay((2026, 9, 1), 3);
    let quote = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id: Uuid::new_v4(),
            check_in,
            check_out,
            occupancy: 2,
            coupon_code: Some("SAVE10".to_string()),
        })
        .await?;

    // 3 nights at $100, 10% off
    assert_eq!(quote.booking.base_cents, 30_000);
    assert_eq!(quote.booking.discount_cents, 3_000);
    assert_eq!(quote.booking.total_cents, 27_000);

    let application = quote.coupon.expect("coupon should be applied");
    assert_eq!(application.code, "SAVE10");
    assert_eq!(application.discount_cents, 3_000);

    Ok(())
}

#[tokio::test]
async fn coupon_below_minimum_spend_is_rejected() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    seed_coupon(&app, "SAVE10", DiscountType::Percentage, 10, 20_000, None, None).await?;

    // One night at $100 is below the $200 minimum spend
    let (check_in, check_out) = stay((2026, 9, 1), 1);
    let err = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id: Uuid::new_v4(),
            check_in,
            check_out,
            occupancy: 2,
            coupon_code: Some("SAVE10".to_string()),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::QuoteRejected(ref msg) if msg.contains("minimum spend")));

    Ok(())
}

#[tokio::test]
async fn unknown_and_expired_coupons_are_rejected() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;

    let (check_in, check_out) = stay((2026, 9, 1), 3);
    let req = QuoteRequest {
        room_type_id: room_type.id,
        guest_id: Uuid::new_v4(),
        check_in,
        check_out,
        occupancy: 2,
        coupon_code: Some("NOSUCH".to_string()),
    };

    let err = app.ctx.pricing_service.quote(req.clone()).await.unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(ref msg) if msg.contains("does not exist")));

    // A coupon whose validity window has already closed
    app.ctx
        .coupon_repo
        .create(CreateCouponRequest {
            code: "EXPIRED".to_string(),
            discount_type: DiscountType::Percentage,
            value: 10,
            min_spend_cents: 0,
            global_limit: None,
            per_user_limit: None,
            valid_from: Utc::now() - Duration::days(30),
            valid_until: Utc::now() - Duration::days(1),
        })
        .await?;

    let err = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            coupon_code: Some("EXPIRED".to_string()),
            ..req
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(ref msg) if msg.contains("not currently active")));

    Ok(())
}

#[tokio::test]
async fn fixed_discount_never_exceeds_the_base() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 2_500).await?;
    seed_coupon(&app, "BIGOFF", DiscountType::Fixed, 50_000, 0, None, None).await?;

    let (check_in, check_out) = stay((2026, 9, 1), 3);
    let quote = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id: Uuid::new_v4(),
            check_in,
            check_out,
            occupancy: 2,
            coupon_code: Some("BIGOFF".to_string()),
        })
        .await?;

    // Discount clamps at the base; fees are still owed
    assert_eq!(quote.booking.base_cents, 30_000);
    assert_eq!(quote.booking.discount_cents, 30_000);
    assert_eq!(quote.booking.total_cents, 2_500);

    Ok(())
}

#[tokio::test]
async fn per_user_limit_counts_confirmations_not_quotes() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    seed_coupon(&app, "ONCE", DiscountType::Percentage, 10, 0, None, Some(1)).await?;

    let guest_id = Uuid::new_v4();
    let identity = guest(guest_id);

    let make_request = |check_in: (i32, u32, u32)| {
        let (check_in, check_out) = stay(check_in, 2);
        QuoteRequest {
            room_type_id: room_type.id,
            guest_id,
            check_in,
            check_out,
            occupancy: 2,
            coupon_code: Some("ONCE".to_string()),
        }
    };

    // An abandoned quote does not consume the limit
    app.ctx.pricing_service.quote(make_request((2026, 9, 1))).await?;
    let second = app.ctx.pricing_service.quote(make_request((2026, 10, 1))).await?;
    assert!(second.coupon.is_some());

    app.ctx
        .reservation_service
        .confirm_booking(second.booking.id, PaymentMethod::Card, &identity)
        .await?;

    // Confirmation redeemed the coupon; the next quote is rejected
    let err = app
        .ctx
        .pricing_service
        .quote(make_request((2026, 11, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(ref msg) if msg.contains("for this account")));

    Ok(())
}

#[tokio::test]
async fn two_live_quotes_cannot_both_redeem_the_last_slot() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let coupon = seed_coupon(&app, "ONCE", DiscountType::Percentage, 10, 0, None, Some(1)).await?;

    let guest_id = Uuid::new_v4();
    let identity = guest(guest_id);

    let make_request = |check_in: (i32, u32, u32)| {
        let (check_in, check_out) = stay(check_in, 2);
        QuoteRequest {
            room_type_id: room_type.id,
            guest_id,
            check_in,
            check_out,
            occupancy: 2,
            coupon_code: Some("ONCE".to_string()),
        }
    };

    // Both quotes pass the limit check while nothing is redeemed yet
    let first = app.ctx.pricing_service.quote(make_request((2026, 9, 1))).await?;
    let second = app.ctx.pricing_service.quote(make_request((2026, 10, 1))).await?;

    app.ctx
        .reservation_service
        .confirm_booking(first.booking.id, PaymentMethod::Card, &identity)
        .await?;

    // The second confirmation loses the re-check and must re-quote
    let err = app
        .ctx
        .reservation_service
        .confirm_booking(second.booking.id, PaymentMethod::Card, &identity)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(_)));

    assert_eq!(app.ctx.coupon_repo.user_usage(coupon.id, guest_id).await?, 1);

    // The loser was never charged or held; it stays a quote
    let loser = app
        .ctx
        .reservation_service
        .get_booking(second.booking.id)
        .await?
        .unwrap();
    assert_eq!(loser.status, BookingStatus::Quoted);

    Ok(())
}

#[tokio::test]
async fn global_limit_caps_redemptions_across_guests() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;
    let coupon = seed_coupon(&app, "FIRST", DiscountType::Percentage, 10, 0, Some(1), None).await?;

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let make_request = |guest_id, check_in: (i32, u32, u32)| {
        let (check_in, check_out) = stay(check_in, 2);
        QuoteRequest {
            room_type_id: room_type.id,
            guest_id,
            check_in,
            check_out,
            occupancy: 2,
            coupon_code: Some("FIRST".to_string()),
        }
    };

    let alices = app
        .ctx
        .pricing_service
        .quote(make_request(alice, (2026, 9, 1)))
        .await?;
    let bobs = app
        .ctx
        .pricing_service
        .quote(make_request(bob, (2026, 10, 1)))
        .await?;

    app.ctx
        .reservation_service
        .confirm_booking(alices.booking.id, PaymentMethod::Card, &guest(alice))
        .await?;

    let err = app
        .ctx
        .reservation_service
        .confirm_booking(bobs.booking.id, PaymentMethod::Card, &guest(bob))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(_)));

    assert_eq!(app.ctx.coupon_repo.global_usage(coupon.id).await?, 1);

    // Redeemed out: a fresh quote is rejected up front too
    let err = app
        .ctx
        .pricing_service
        .quote(make_request(bob, (2026, 11, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(ref msg) if msg.contains("limit reached")));

    Ok(())
}

#[tokio::test]
async fn invalid_stays_are_rejected() -> anyhow::Result<()> {
    let app = setup().await?;
    let room_type = seed_room_type(&app, Uuid::new_v4(), 10_000, 2, 0).await?;

    let check_in = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

    // Zero-night stay
    let err = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id: Uuid::new_v4(),
            check_in,
            check_out: check_in,
            occupancy: 2,
            coupon_code: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(_)));

    // Over capacity
    let err = app
        .ctx
        .pricing_service
        .quote(QuoteRequest {
            room_type_id: room_type.id,
            guest_id: Uuid::new_v4(),
            check_in,
            check_out: check_in + Duration::days(2),
            occupancy: 5,
            coupon_code: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuoteRejected(_)));

    Ok(())
}
