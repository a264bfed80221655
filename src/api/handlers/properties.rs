use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::state::AppState,
    domain::{
        Amenity, CreatePropertyRequest, CreateRoomTypeRequest, Identity, Property, RoomType,
    },
    error::{AppError, Result},
};

pub async fn create_property(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>)> {
    if !identity.can_act_for(req.host_id) {
        return Err(AppError::Forbidden);
    }
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let property = state.service_context.property_repo.create_property(req).await?;
    Ok((StatusCode::CREATED, Json(property)))
}

pub async fn delete_property(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    let property = state
        .service_context
        .property_repo
        .find_property(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

    if !identity.can_act_for(property.host_id) {
        return Err(AppError::Forbidden);
    }

    state.service_context.property_repo.delete_property(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_room_type(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateRoomTypeRequest>,
) -> Result<(StatusCode, Json<RoomType>)> {
    let property = state
        .service_context
        .property_repo
        .find_property(req.property_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;

    if !identity.can_act_for(property.host_id) {
        return Err(AppError::Forbidden);
    }
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let room_type = state.service_context.property_repo.create_room_type(req).await?;
    Ok((StatusCode::CREATED, Json(room_type)))
}

pub async fn list_room_types(
    State(state): State<AppState>,
    Path(property_id): Path<Uuid>,
) -> Result<Json<Vec<RoomType>>> {
    let room_types = state
        .service_context
        .property_repo
        .list_room_types(property_id)
        .await?;

    Ok(Json(room_types))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAmenityBody {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
}

pub async fn create_amenity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<CreateAmenityBody>,
) -> Result<(StatusCode, Json<Amenity>)> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let amenity = state
        .service_context
        .property_repo
        .create_amenity(&body.name)
        .await?;

    Ok((StatusCode::CREATED, Json(amenity)))
}

#[derive(Debug, Deserialize)]
pub struct AttachAmenityBody {
    pub amenity_id: Uuid,
}

pub async fn attach_amenity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(room_type_id): Path<Uuid>,
    Json(body): Json<AttachAmenityBody>,
) -> Result<StatusCode> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }

    state
        .service_context
        .property_repo
        .attach_amenity(room_type_id, body.amenity_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_amenity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !identity.role.is_staff() {
        return Err(AppError::Forbidden);
    }

    state.service_context.property_repo.delete_amenity(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
