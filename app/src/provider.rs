//! The boundary views reach the stores through.
//!
//! A [`ProviderScope`] is built once at startup and handed to whatever needs
//! a store. Asking it for a store it was not given is a programming error and
//! fails immediately with [`ProviderError::MissingProvider`].

use crate::booking::BookingStore;
use crate::error::AppError;
use crate::ui::UiStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Misuse of a [`ProviderScope`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// A store was requested from a scope that does not hold it
    #[error("{consumer} must be used within a {provider}")]
    MissingProvider {
        /// Accessor that was called
        consumer: &'static str,
        /// Provider that should have been installed
        provider: &'static str,
    },
}

/// Holds the application's stores for the lifetime of the app
///
/// # Example
///
/// ```ignore
/// let scope = ProviderScope::builder()
///     .with_ui(ui)
///     .with_booking(booking)
///     .build();
///
/// scope.use_app()?.show_info("Welcome back", NotificationOptions::new()).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProviderScope {
    ui: Option<Arc<UiStore>>,
    booking: Option<Arc<BookingStore>>,
}

impl ProviderScope {
    /// Start building a scope
    #[must_use]
    pub fn builder() -> ProviderScopeBuilder {
        ProviderScopeBuilder::default()
    }

    /// The UI store
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingProvider`] if the scope has no UI store.
    pub fn use_app(&self) -> Result<Arc<UiStore>, ProviderError> {
        self.ui.clone().ok_or(ProviderError::MissingProvider {
            consumer: "useApp",
            provider: "AppProvider",
        })
    }

    /// The booking store
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingProvider`] if the scope has no booking store.
    pub fn use_booking(&self) -> Result<Arc<BookingStore>, ProviderError> {
        self.booking.clone().ok_or(ProviderError::MissingProvider {
            consumer: "useBooking",
            provider: "BookingProvider",
        })
    }

    /// Shut down every store in the scope
    ///
    /// Handles already given out keep working for reads; actions sent through
    /// them fail with [`AppError::Store`].
    ///
    /// # Errors
    ///
    /// Returns the first shutdown failure; every store is still asked to shut
    /// down.
    pub async fn close(&self, timeout: Duration) -> Result<(), AppError> {
        tracing::info!("Closing provider scope");

        let ui = match &self.ui {
            Some(ui) => ui.shutdown(timeout).await,
            None => Ok(()),
        };
        let booking = match &self.booking {
            Some(booking) => booking.shutdown(timeout).await,
            None => Ok(()),
        };
        ui.and(booking)
    }
}

/// Builder for [`ProviderScope`]
#[derive(Debug, Default)]
pub struct ProviderScopeBuilder {
    ui: Option<Arc<UiStore>>,
    booking: Option<Arc<BookingStore>>,
}

impl ProviderScopeBuilder {
    /// Provide the UI store
    #[must_use]
    pub fn with_ui(mut self, ui: impl Into<Arc<UiStore>>) -> Self {
        self.ui = Some(ui.into());
        self
    }

    /// Provide the booking store
    #[must_use]
    pub fn with_booking(mut self, booking: impl Into<Arc<BookingStore>>) -> Self {
        self.booking = Some(booking.into());
        self
    }

    /// Finish the scope
    #[must_use]
    pub fn build(self) -> ProviderScope {
        ProviderScope {
            ui: self.ui,
            booking: self.booking,
        }
    }
}
