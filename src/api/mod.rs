pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api", api_routes())
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/bookings", booking_routes())
        .nest("/refunds", refund_routes())
        .nest("/hosts", host_routes())
        .nest("/payouts", payout_routes())
        .nest("/properties", property_routes())
        .nest("/room-types", room_type_routes())
        .nest("/amenities", amenity_routes())
        .nest("/coupons", coupon_routes())
        .route_layer(axum::middleware::from_fn(
            middleware::identity::require_identity,
        ))
}

fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/quote", post(handlers::bookings::quote))
        .route("/", get(handlers::bookings::list_mine))
        .route("/:id", get(handlers::bookings::get))
        .route("/:id/confirm", post(handlers::bookings::confirm))
        .route("/:id/cancel", post(handlers::bookings::cancel))
        .route("/:id/refund-tickets", get(handlers::refunds::list_for_booking))
}

fn refund_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::refunds::raise))
        .route("/:id/approve", post(handlers::refunds::approve))
        .route("/:id/reject", post(handlers::refunds::reject))
        .route("/:id/execute", post(handlers::refunds::execute))
}

fn host_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/earnings", get(handlers::payouts::list_earnings))
        .route("/:id/payouts", post(handlers::payouts::run_batch))
}

fn payout_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/confirm", post(handlers::payouts::confirm))
        .route("/:id/fail", post(handlers::payouts::fail))
}

fn property_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::properties::create_property))
        .route("/:id", delete(handlers::properties::delete_property))
        .route("/:id/room-types", get(handlers::properties::list_room_types))
}

fn room_type_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::properties::create_room_type))
        .route("/:id/amenities", post(handlers::properties::attach_amenity))
}

fn amenity_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::properties::create_amenity))
        .route("/:id", delete(handlers::properties::delete_amenity))
}

fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::coupons::create))
        .route("/:id", put(handlers::coupons::update))
}
