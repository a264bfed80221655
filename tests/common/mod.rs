#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use qbooking::{
    config::Settings,
    domain::{
        Coupon, CreateCouponRequest, CreatePropertyRequest, CreateRoomTypeRequest, DiscountType,
        Identity, Role, RoomType,
    },
    integrations::NotifierManager,
    payments::FakeGateway,
    service::ServiceContext,
};

pub struct TestApp {
    pub ctx: Arc<ServiceContext>,
    pub gateway: Arc<FakeGateway>,
}

pub async fn setup() -> anyhow::Result<TestApp> {
    setup_with(Settings::default()).await
}

pub async fn setup_with(settings: Settings) -> anyhow::Result<TestApp> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let gateway = Arc::new(FakeGateway::new());
    let notifier_manager = Arc::new(NotifierManager::new());

    let ctx = Arc::new(ServiceContext::new(
        pool,
        gateway.clone(),
        notifier_manager,
        &settings,
    ));

    Ok(TestApp { ctx, gateway })
}

/// A property with one room type, owned by a fresh host. Returns the room
/// type ready to quote against.
pub async fn seed_room_type(
    app: &TestApp,
    host_id: Uuid,
    base_rate_cents: i64,
    capacity: i32,
    cleaning_fee_cents: i64,
) -> anyhow::Result<RoomType> {
    let property = app
        .ctx
        .property_repo
        .create_property(CreatePropertyRequest {
            host_id,
            name: "Test Property".to_string(),
            city: "Testville".to_string(),
        })
        .await?;

    let room_type = app
        .ctx
        .property_repo
        .create_room_type(CreateRoomTypeRequest {
            property_id: property.id,
            name: "Standard Double".to_string(),
            base_rate_cents,
            capacity,
            cleaning_fee_cents,
        })
        .await?;

    Ok(room_type)
}

pub async fn seed_coupon(
    app: &TestApp,
    code: &str,
    discount_type: DiscountType,
    value: i64,
    min_spend_cents: i64,
    global_limit: Option<i64>,
    per_user_limit: Option<i64>,
) -> anyhow::Result<Coupon> {
    let coupon = app
        .ctx
        .coupon_repo
        .create(CreateCouponRequest {
            code: code.to_string(),
            discount_type,
            value,
            min_spend_cents,
            global_limit,
            per_user_limit,
            valid_from: Utc::now() - Duration::days(1),
            valid_until: Utc::now() + Duration::days(30),
        })
        .await?;

    Ok(coupon)
}

pub fn guest(user_id: Uuid) -> Identity {
    Identity {
        user_id,
        role: Role::Guest,
    }
}

pub fn admin() -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    }
}
