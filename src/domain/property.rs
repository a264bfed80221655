use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub host_id: Uuid,
    pub name: String,
    pub city: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bookable inventory unit. The calendar tracks availability per
/// RoomType, not per Property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomType {
    pub id: Uuid,
    pub property_id: Uuid,
    pub name: String,
    pub base_rate_cents: i64,
    pub capacity: i32,
    pub cleaning_fee_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amenity {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    pub host_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 80))]
    pub city: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoomTypeRequest {
    pub property_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(range(min = 0))]
    pub base_rate_cents: i64,
    #[validate(range(min = 1, max = 32))]
    pub capacity: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub cleaning_fee_cents: i64,
}
