//! Railbook headless client
//!
//! Opens both stores against the configured API and storage file, runs a
//! search, and reports the outcome through notifications.

use anyhow::Context;
use railbook_app::types::{NotificationOptions, SearchCriteria};
use railbook_app::{
    AppConfig, AppError, BookingStore, BookingStoreConfig, HttpBookingService, ProviderScope,
    TimestampIdGenerator, TracingDocument, UiStore, UiStoreConfig,
};
use railbook_core::environment::SystemClock;
use railbook_runtime::StoreConfig;
use railbook_storage::{DurableStorage, FileBackend};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "railbook_app=debug,railbook_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()
        .map_err(AppError::from)
        .context("invalid configuration")?;
    tracing::info!(api = %config.api_base_url, storage = %config.storage_path.display(), "Starting Railbook");

    railbook_app::metrics::register_metrics();

    let storage = DurableStorage::new(FileBackend::new(&config.storage_path));
    let store_config = StoreConfig::default().with_shutdown_timeout(config.shutdown_timeout);

    let ui = UiStore::open(
        &storage,
        Arc::new(TracingDocument),
        Arc::new(TimestampIdGenerator::new(Arc::new(SystemClock))),
        UiStoreConfig::default()
            .with_notification_duration(config.notification_duration)
            .with_store(store_config.clone()),
    )
    .await?;

    let service = HttpBookingService::from_config(&config)?;
    let booking = BookingStore::new(
        Arc::new(service),
        BookingStoreConfig::default()
            .with_discard_stale_searches(config.discard_stale_searches)
            .with_store(store_config),
    );

    let scope = ProviderScope::builder().with_ui(ui).with_booking(booking).build();
    let ui = scope.use_app()?;
    let booking = scope.use_booking()?;

    let theme = ui.state(|s| s.theme).await;
    tracing::info!(%theme, "Restored theme");

    let criteria = SearchCriteria::new("New Delhi", "Agra Cantt", "2025-03-01");
    match booking.search_trains(&criteria).await {
        Ok(results) => {
            ui.show_success(format!("Found {} trains", results.len()), NotificationOptions::new())
                .await?;
        },
        Err(error) => {
            ui.show_error(error.to_string(), NotificationOptions::new()).await?;
        },
    }

    let notifications = ui.state(|s| s.notifications.clone()).await;
    for notification in &notifications {
        tracing::info!(kind = notification.kind.as_str(), message = %notification.message, "Notification");
    }

    scope.close(config.shutdown_timeout).await?;
    tracing::info!("Railbook stopped");
    Ok(())
}
