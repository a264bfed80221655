mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use qbooking::{
    domain::{Booking, BookingStatus, PaymentMethod, PayoutStatus},
    error::AppError,
    service::QuoteRequest,
};

use common::{admin, guest, seed_room_type, setup, TestApp};

/// A fully paid stay that checked out a week ago, ready for completion.
async fn past_booking(app: &TestApp, host_id: Uuid, guest_id: Uuid) -> anyhow::Result<Booking> {
    let room_type = seed_room_type(app, host_id, 10_000, 2, 0).await?;
    let check_in = Utc::now().date_naive() - Duration::days(10);

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
async fn completion_accrues_one_earning_per_booking() -> anyhow::Result<()> {
    let app = setup().await?;
    let host_id = Uuid::new_v4();
    let booking = past_booking(&app, host_id, Uuid::new_v4()).await?;

    let completed = app
        .ctx
        .reservation_service
        .complete_past_checkouts(Utc::now().date_naive())
        .await?;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].status, BookingStatus::Completed);

    let earnings = app.ctx.settlement_service.list_host_earnings(host_id).await?;
    assert_eq!(earnings.len(), 1);
    let earning = &earnings[0];
    assert_eq!(earning.booking_id, booking.id);
    assert_eq!(earning.gross_cents, 30_000);
    // 12% platform fee
    assert_eq!(earning.platform_fee_cents, 3_600);
    assert_eq!(earning.net_cents, 26_400);

    // Accruing again refreshes the same row instead of duplicating it
    app.ctx.settlement_service.accrue(booking.id).await?;
    let earnings = app.ctx.settlement_service.list_host_earnings(host_id).await?;
    assert_eq!(earnings.len(), 1);

    Ok(())
}

#[tokio::test]
async fn open_refund_tickets_defer_completion() -> anyhow::Result<()> {
    let app = setup().await?;
    let host_id = Uuid::new_v4();
    let guest_id = Uuid::new_v4();
    let booking = past_booking(&app, host_id, guest_id).await?;

    app.ctx
        .refund_service
        .raise_ticket(booking.id, 5_000, "Dispute".to_string(), &guest(guest_id))
        .await?;

    let completed = app
        .ctx
        .reservation_service
        .complete_past_checkouts(Utc::now().date_naive())
        .await?;
    assert!(completed.is_empty());

    // Once the ticket is resolved, the next sweep completes the stay
    let tickets = app
        .ctx
        .refund_service
        .list_tickets(booking.id, &guest(guest_id))
        .await?;
    app.ctx.refund_service.reject(tickets[0].id, &admin()).await?;

    let completed = app
        .ctx
        .reservation_service
        .complete_past_checkouts(Utc::now().date_naive())
        .await?;
    assert_eq!(completed.len(), 1);

    Ok(())
}

#[tokio::test]
async fn earnings_accrue_only_for_completed_stays() -> anyhow::Result<()> {
    let app = setup().await?;
    let booking = past_booking(&app, Uuid::new_v4(), Uuid::new_v4()).await?;

    // Still confirmed, not completed
    let err = app.ctx.settlement_service.accrue(booking.id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn completed_bookings_without_an_earning_are_swept_again() -> anyhow::Result<()> {
    let app = setup().await?;
    let host_id = Uuid::new_v4();
    let booking = past_booking(&app, host_id, Uuid::new_v4()).await?;

    // Completed, but the accrual never landed (as if it failed after the
    // status flip)
    app.ctx
        .booking_repo
        .update_status(booking.id, BookingStatus::Completed)
        .await?;
    assert!(app
        .ctx
        .settlement_service
        .list_host_earnings(host_id)
        .await?
        .is_empty());

    // The next sweep retries the accrual without re-completing anything
    let completed = app
        .ctx
        .reservation_service
        .complete_past_checkouts(Utc::now().date_naive())
        .await?;
    assert!(completed.is_empty());

    let earnings = app.ctx.settlement_service.list_host_earnings(host_id).await?;
    assert_eq!(earnings.len(), 1);
    assert_eq!(earnings[0].net_cents, 26_400);

    // Once the earning exists the booking drops out of the sweep
    app.ctx
        .reservation_service
        .complete_past_checkouts(Utc::now().date_naive())
        .await?;
    let earnings = app.ctx.settlement_service.list_host_earnings(host_id).await?;
    assert_eq!(earnings.len(), 1);

    Ok(())
}

#[tokio::test]
async fn payout_batch_lifecycle() -> anyhow::Result<()> {
    let app = setup().await?;
    let host_id = Uuid::new_v4();
    past_booking(&app, host_id, Uuid::new_v4()).await?;
    let today = Utc::now().date_naive();

    app.ctx.reservation_service.complete_past_checkouts(today).await?;

    let payout = app.ctx.settlement_service.batch_payout(host_id, today).await?;
    assert_eq!(payout.status, PayoutStatus::Pending);
    assert_eq!(payout.total_cents, 26_400);

    // Everything is attached now; a second batch has nothing to pay
    let err = app
        .ctx
        .settlement_service
        .batch_payout(host_id, today)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NothingToPayout));

    let paid = app.ctx.settlement_service.confirm_payout(payout.id).await?;
    assert_eq!(paid.status, PayoutStatus::Paid);

    // A settled payout cannot change state again
    let err = app
        .ctx
        .settlement_service
        .confirm_payout(payout.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn failed_payouts_release_earnings_for_the_next_batch() -> anyhow::Result<()> {
    let app = setup().await?;
    let host_id = Uuid::new_v4();
    past_booking(&app, host_id, Uuid::new_v4()).await?;
    let today = Utc::now().date_naive();

    app.ctx.reservation_service.complete_past_checkouts(today).await?;

    let payout = app.ctx.settlement_service.batch_payout(host_id, today).await?;
    let failed = app.ctx.settlement_service.fail_payout(payout.id).await?;
    assert_eq!(failed.status, PayoutStatus::Failed);

    // The detached earnings are picked up by a fresh batch
    let retry = app.ctx.settlement_service.batch_payout(host_id, today).await?;
    assert_eq!(retry.total_cents, 26_400);

    Ok(())
}

#[tokio::test]
async fn refunds_after_completion_recompute_the_earning() -> anyhow::Result<()> {
    let app = setup().await?;
    let host_id = Uuid::new_v4();
    let guest_id = Uuid::new_v4();
    let booking = past_booking(&app, host_id, guest_id).await?;
    let today = Utc::now().date_naive();
    let staff = admin();

    app.ctx.reservation_service.complete_past_checkouts(today).await?;

    let ticket = app
        .ctx
        .refund_service
        .raise_ticket(booking.id, 5_000, "Broken heating".to_string(), &guest(guest_id))
        .await?;
    app.ctx.refund_service.approve(ticket.id, 5_000, &staff).await?;
    app.ctx.refund_service.execute(ticket.id, &staff).await?;

    let earnings = app.ctx.settlement_service.list_host_earnings(host_id).await?;
    assert_eq!(earnings.len(), 1);
    assert_eq!(earnings[0].refunded_cents, 5_000);
    assert_eq!(earnings[0].net_cents, 26_400 - 5_000);

    Ok(())
}
