use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qbooking::{
    api,
    config::Settings,
    integrations::{webhook::WebhookNotifier, NotifierManager},
    payments::{FakeGateway, PaymentGateway, StripeGateway},
    service::{sweep::spawn_sweeper, ServiceContext},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qbooking=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting QBooking server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Pick the payment gateway
    let gateway: Arc<dyn PaymentGateway> = if settings.stripe.enabled {
        match settings.stripe.secret_key.clone() {
            Some(api_key) => {
                tracing::info!("Stripe payment processing enabled");
                Arc::new(StripeGateway::new(api_key))
            }
            None => {
                tracing::warn!("Stripe enabled but missing secret key, using fake gateway");
                Arc::new(FakeGateway::new())
            }
        }
    } else {
        tracing::info!("Stripe payment processing disabled, using fake gateway");
        Arc::new(FakeGateway::new())
    };

    // Register notifiers
    let notifier_manager = Arc::new(NotifierManager::new());
    if let Some(webhook) = WebhookNotifier::new(settings.notifications.webhook.clone()) {
        notifier_manager.register(Arc::new(webhook)).await;
    }

    let health_results = notifier_manager.health_check_all().await;
    for (name, result) in health_results {
        match result {
            Ok(_) => tracing::info!("Notifier {} is healthy", name),
            Err(e) => tracing::warn!("Notifier {} health check failed: {:?}", name, e),
        }
    }

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        db_pool,
        gateway,
        notifier_manager,
        &settings,
    ));

    // Background sweeper: expires stale holds, completes past-checkout stays
    spawn_sweeper(
        service_context.clone(),
        settings.booking.sweep_interval_secs,
    );

    let app = api::create_app(service_context, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
