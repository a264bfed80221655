use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Amenity, CreatePropertyRequest, CreateRoomTypeRequest, Property, RoomType},
    error::{AppError, Result},
    repository::PropertyRepository,
};

#[derive(FromRow)]
struct PropertyRow {
    id: String,
    host_id: String,
    name: String,
    city: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct RoomTypeRow {
    id: String,
    property_id: String,
    name: String,
    base_rate_cents: i64,
    capacity: i32,
    cleaning_fee_cents: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePropertyRepository {
    pool: SqlitePool,
}

impl SqlitePropertyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_uuid(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
    }

    fn row_to_property(row: PropertyRow) -> Result<Property> {
        Ok(Property {
            id: Self::parse_uuid(&row.id)?,
            host_id: Self::parse_uuid(&row.host_id)?,
            name: row.name,
            city: row.city,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_room_type(row: RoomTypeRow) -> Result<RoomType> {
        Ok(RoomType {
            id: Self::parse_uuid(&row.id)?,
            property_id: Self::parse_uuid(&row.property_id)?,
            name: row.name,
            base_rate_cents: row.base_rate_cents,
            capacity: row.capacity,
            cleaning_fee_cents: row.cleaning_fee_cents,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl PropertyRepository for SqlitePropertyRepository {
    async fn create_property(&self, req: CreatePropertyRequest) -> Result<Property> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO properties (id, host_id, name, city, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(req.host_id.to_string())
        .bind(&req.name)
        .bind(&req.city)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_property(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created property".to_string()))
    }

    async fn find_property(&self, id: Uuid) -> Result<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(
            "SELECT id, host_id, name, city, created_at, updated_at FROM properties WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_property(r)?)),
            None => Ok(None),
        }
    }

    async fn delete_property(&self, id: Uuid) -> Result<()> {
        // Explicit ownership cascade: the property owns its room types and
        // their amenity links. Bookings are audit rows and stay.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            DELETE FROM room_type_amenities
            WHERE room_type_id IN (SELECT id FROM room_types WHERE property_id = ?)
            "#,
        )
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM room_types WHERE property_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM properties WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn create_room_type(&self, req: CreateRoomTypeRequest) -> Result<RoomType> {
        let property = self
            .find_property(req.property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO room_types (
                id, property_id, name, base_rate_cents, capacity,
                cleaning_fee_cents, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(property.id.to_string())
        .bind(&req.name)
        .bind(req.base_rate_cents)
        .bind(req.capacity)
        .bind(req.cleaning_fee_cents)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_room_type(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created room type".to_string()))
    }

    async fn find_room_type(&self, id: Uuid) -> Result<Option<RoomType>> {
        let row = sqlx::query_as::<_, RoomTypeRow>(
            r#"
            SELECT id, property_id, name, base_rate_cents, capacity,
                   cleaning_fee_cents, created_at, updated_at
            FROM room_types
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_room_type(r)?)),
            None => Ok(None),
        }
    }

    async fn list_room_types(&self, property_id: Uuid) -> Result<Vec<RoomType>> {
        let rows = sqlx::query_as::<_, RoomTypeRow>(
            r#"
            SELECT id, property_id, name, base_rate_cents, capacity,
                   cleaning_fee_cents, created_at, updated_at
            FROM room_types
            WHERE property_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(property_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_room_type).collect()
    }

    async fn create_amenity(&self, name: &str) -> Result<Amenity> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO amenities (id, name) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Amenity {
            id,
            name: name.to_string(),
        })
    }

    async fn attach_amenity(&self, room_type_id: Uuid, amenity_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO room_type_amenities (room_type_id, amenity_id)
            VALUES (?, ?)
            "#,
        )
        .bind(room_type_id.to_string())
        .bind(amenity_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_amenity(&self, id: Uuid) -> Result<()> {
        let referenced: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM room_type_amenities WHERE amenity_id = ?",
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if referenced.0 > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete amenity: {} room types still reference it",
                referenced.0
            )));
        }

        sqlx::query("DELETE FROM amenities WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
