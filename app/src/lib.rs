//! # Railbook App
//!
//! Client-side application state for the Railbook train booking front end.
//!
//! Two stores are built on the Railbook runtime:
//!
//! - **[`UiStore`]**: sidebar and modal flags, theme, language, notifications
//!   with auto-expiry timers, global loading/error, and persisted settings
//! - **[`BookingStore`]**: train search, schedule selection, the booking
//!   wizard, the user's bookings and station reference data, backed by a
//!   [`BookingService`]
//!
//! Views reach both through a [`ProviderScope`]. Preferences that live
//! outside the stores (drafts, search history, display choices) are in
//! [`preferences`].
//!
//! ## Example
//!
//! ```ignore
//! use railbook_app::{BookingStore, BookingStoreConfig, ProviderScope, UiStore, UiStoreConfig};
//!
//! let ui = UiStore::open(&storage, document, ids, UiStoreConfig::default()).await?;
//! let booking = BookingStore::new(service, BookingStoreConfig::default());
//! let scope = ProviderScope::builder().with_ui(ui).with_booking(booking).build();
//!
//! let results = scope
//!     .use_booking()?
//!     .search_trains(&SearchCriteria::new("Delhi", "Agra", "2025-03-01"))
//!     .await?;
//! ```

pub mod booking;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod ids;
pub mod metrics;
pub mod mocks;
pub mod preferences;
pub mod provider;
pub mod service;
pub mod types;
pub mod ui;

pub use booking::{BookingAction, BookingReducer, BookingState, BookingStore, BookingStoreConfig};
pub use config::{AppConfig, ConfigError};
pub use document::{DocumentHook, TracingDocument};
pub use error::AppError;
pub use http::HttpBookingService;
pub use ids::TimestampIdGenerator;
pub use provider::{ProviderError, ProviderScope};
pub use service::{BookingService, ServiceError};
pub use ui::{UiAction, UiReducer, UiState, UiStore, UiStoreConfig};
