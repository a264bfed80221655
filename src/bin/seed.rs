use chrono::{Duration, Utc};
use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use qbooking::{
    domain::{
        CreateCouponRequest, CreatePropertyRequest, CreateRoomTypeRequest, DiscountType,
    },
    repository::{
        CouponRepository, PropertyRepository, SqliteCouponRepository, SqlitePropertyRepository,
    },
};

#[derive(Parser)]
#[command(about = "Seed the QBooking database with demo inventory and coupons")]
struct Args {
    /// Database to seed. Falls back to DATABASE_URL, then a local file.
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:qbooking.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let property_repo = SqlitePropertyRepository::new(db_pool.clone());
    let coupon_repo = SqliteCouponRepository::new(db_pool.clone());

    println!("🏠 Creating properties...");

    let host_ana = Uuid::new_v4();
    let host_marco = Uuid::new_v4();

    let harbor_house = property_repo
        .create_property(CreatePropertyRequest {
            host_id: host_ana,
            name: "Harbor House".to_string(),
            city: "Lisbon".to_string(),
        })
        .await?;

    let cedar_lodge = property_repo
        .create_property(CreatePropertyRequest {
            host_id: host_marco,
            name: "Cedar Lodge".to_string(),
            city: "Innsbruck".to_string(),
        })
        .await?;

    println!("  ✅ Created 2 properties (hosts {} / {})", host_ana, host_marco);

    println!("🛏️  Creating room types...");

    let harbor_double = property_repo
        .create_room_type(CreateRoomTypeRequest {
            property_id: harbor_house.id,
            name: "Harbor View Double".to_string(),
            base_rate_cents: 10000, // $100.00/night
            capacity: 2,
            cleaning_fee_cents: 0,
        })
        .await?;

    let harbor_suite = property_repo
        .create_room_type(CreateRoomTypeRequest {
            property_id: harbor_house.id,
            name: "Rooftop Suite".to_string(),
            base_rate_cents: 22500,
            capacity: 4,
            cleaning_fee_cents: 3500,
        })
        .await?;

    let cedar_cabin = property_repo
        .create_room_type(CreateRoomTypeRequest {
            property_id: cedar_lodge.id,
            name: "Alpine Cabin".to_string(),
            base_rate_cents: 15000,
            capacity: 6,
            cleaning_fee_cents: 5000,
        })
        .await?;

    println!("  ✅ Created 3 room types");

    println!("✨ Creating amenities...");

    let wifi = property_repo.create_amenity("Wi-Fi").await?;
    let parking = property_repo.create_amenity("Parking").await?;
    let hot_tub = property_repo.create_amenity("Hot Tub").await?;

    property_repo.attach_amenity(harbor_double.id, wifi.id).await?;
    property_repo.attach_amenity(harbor_suite.id, wifi.id).await?;
    property_repo.attach_amenity(cedar_cabin.id, wifi.id).await?;
    property_repo.attach_amenity(cedar_cabin.id, parking.id).await?;
    property_repo.attach_amenity(cedar_cabin.id, hot_tub.id).await?;

    println!("  ✅ Created 3 amenities with attachments");

    println!("🎟️  Creating coupons...");

    coupon_repo
        .create(CreateCouponRequest {
            code: "SAVE10".to_string(),
            discount_type: DiscountType::Percentage,
            value: 10,
            min_spend_cents: 20000,
            global_limit: Some(1000),
            per_user_limit: Some(1),
            valid_from: Utc::now() - Duration::days(1),
            valid_until: Utc::now() + Duration::days(90),
        })
        .await?;

    coupon_repo
        .create(CreateCouponRequest {
            code: "WELCOME25".to_string(),
            discount_type: DiscountType::Fixed,
            value: 2500, // $25.00 off
            min_spend_cents: 0,
            global_limit: None,
            per_user_limit: Some(1),
            valid_from: Utc::now() - Duration::days(1),
            valid_until: Utc::now() + Duration::days(365),
        })
        .await?;

    println!("  ✅ Created 2 coupons (SAVE10, WELCOME25)");

    println!("\n✨ Database seeding complete!");
    println!("\n📝 Sample room types:");
    println!("  Harbor View Double: {}", harbor_double.id);
    println!("  Rooftop Suite:      {}", harbor_suite.id);
    println!("  Alpine Cabin:       {}", cedar_cabin.id);

    Ok(())
}
