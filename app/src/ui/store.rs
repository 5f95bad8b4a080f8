//! UI store: action creators over [`UiReducer`] plus theme/settings persistence.

use super::reducer::{UiReducer, notification_timer};
use super::state::{UiAction, UiState};
use crate::document::DocumentHook;
use crate::error::AppError;
use crate::types::{
    Notification, NotificationId, NotificationKind, NotificationOptions, Settings, SettingsPatch,
    Theme,
};
use railbook_core::effect::EffectId;
use railbook_core::environment::IdGenerator;
use railbook_runtime::{Store, StoreConfig};
use railbook_storage::{DurableStorage, PersistedValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, watch};

/// Durable key holding the theme
pub const THEME_KEY: &str = "theme";

/// Durable key holding [`Settings`]
pub const SETTINGS_KEY: &str = "appSettings";

/// Runtime store type behind [`UiStore`]
pub type UiRuntime = Store<UiState, UiAction, (), UiReducer>;

/// Configuration for [`UiStore`]
#[derive(Debug, Clone)]
pub struct UiStoreConfig {
    /// Lifetime of auto-closing notifications that do not set one
    pub notification_duration: Duration,
    /// Runtime settings
    pub store: StoreConfig,
}

impl Default for UiStoreConfig {
    fn default() -> Self {
        Self {
            notification_duration: Duration::from_millis(4000),
            store: StoreConfig::default(),
        }
    }
}

impl UiStoreConfig {
    /// Set the default notification lifetime
    #[must_use]
    pub const fn with_notification_duration(mut self, duration: Duration) -> Self {
        self.notification_duration = duration;
        self
    }

    /// Set the runtime settings
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

/// Layout, theme, language, notifications and settings for the whole app
///
/// Theme and settings are mirrored to durable storage under [`THEME_KEY`] and
/// [`SETTINGS_KEY`]. Both mirrors are read once, in [`UiStore::open`]; changes
/// made by other instances afterwards are not observed.
///
/// # Example
///
/// ```ignore
/// let ui = UiStore::open(&storage, Arc::new(TracingDocument), ids, UiStoreConfig::default()).await?;
///
/// ui.toggle_theme().await?;
/// let id = ui.show_error("Payment failed", NotificationOptions::new()).await?;
/// ui.remove_notification(id).await?;
/// ```
pub struct UiStore {
    store: UiRuntime,
    theme: PersistedValue<Theme>,
    settings: PersistedValue<Settings>,
    document: Arc<dyn DocumentHook>,
    ids: Arc<dyn IdGenerator>,
    config: UiStoreConfig,
    // Held across dispatch + persist so the durable value follows state order.
    persist: Mutex<()>,
}

impl std::fmt::Debug for UiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiStore")
            .field("theme", &self.theme)
            .field("settings", &self.settings)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UiStore {
    /// Build the store and pull persisted theme and settings into it
    ///
    /// # Errors
    ///
    /// Only fails if the underlying store refuses the rehydration actions,
    /// which does not happen for a freshly built store.
    pub async fn open(
        storage: &DurableStorage,
        document: Arc<dyn DocumentHook>,
        ids: Arc<dyn IdGenerator>,
        config: UiStoreConfig,
    ) -> Result<Self, AppError> {
        let ui = Self {
            store: Store::with_config(UiState::default(), UiReducer::new(), (), config.store.clone()),
            theme: storage.persisted(THEME_KEY, Theme::default()),
            settings: storage.persisted(SETTINGS_KEY, Settings::default()),
            document,
            ids,
            config,
            persist: Mutex::new(()),
        };

        if ui.sync_persisted().await? {
            tracing::info!("Rehydrated UI state from storage");
        }
        Ok(ui)
    }

    /// Pull the persisted theme and settings into live state if they differ
    ///
    /// Returns whether anything was dispatched. The persisted mirrors are only
    /// read from storage at [`UiStore::open`] and every later write goes
    /// through them, so after startup this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn sync_persisted(&self) -> Result<bool, AppError> {
        let _persist = self.persist.lock().await;
        let mut changed = false;

        let persisted_theme = self.theme.get();
        if self.store.state(|s| s.theme).await != persisted_theme {
            self.apply_theme(persisted_theme).await?;
            changed = true;
        }

        let persisted_settings = self.settings.get();
        let live_settings = self.store.state(|s| s.settings).await;
        if live_settings != persisted_settings {
            self.store
                .send(UiAction::UpdateSettings(persisted_settings.into()))
                .await?;
            changed = true;
        }

        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Flip the sidebar
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn toggle_sidebar(&self) -> Result<(), AppError> {
        self.dispatch(UiAction::ToggleSidebar).await
    }

    /// Flip the mobile menu
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn toggle_mobile_menu(&self) -> Result<(), AppError> {
        self.dispatch(UiAction::ToggleMobileMenu).await
    }

    /// Flip the search dialog
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn toggle_search_modal(&self) -> Result<(), AppError> {
        self.dispatch(UiAction::ToggleSearchModal).await
    }

    /// Show or hide the sidebar
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_sidebar_open(&self, open: bool) -> Result<(), AppError> {
        self.dispatch(UiAction::SetSidebarOpen(open)).await
    }

    /// Show or hide the mobile menu
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_mobile_menu_open(&self, open: bool) -> Result<(), AppError> {
        self.dispatch(UiAction::SetMobileMenuOpen(open)).await
    }

    /// Show or hide the search dialog
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_search_modal_open(&self, open: bool) -> Result<(), AppError> {
        self.dispatch(UiAction::SetSearchModalOpen(open)).await
    }

    // ------------------------------------------------------------------
    // Theme and language
    // ------------------------------------------------------------------

    /// Switch theme, persist it and apply it to the document
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    #[tracing::instrument(skip(self))]
    pub async fn set_theme(&self, theme: Theme) -> Result<(), AppError> {
        let _persist = self.persist.lock().await;
        self.apply_theme(theme).await
    }

    /// Flip between light and dark, returning the new theme
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn toggle_theme(&self) -> Result<Theme, AppError> {
        let _persist = self.persist.lock().await;
        self.store.send(UiAction::ToggleTheme).await?;

        let theme = self.store.state(|s| s.theme).await;
        tracing::debug!(%theme, "Toggled theme");
        self.theme.set(theme);
        self.document.set_theme_attribute(theme);
        Ok(theme)
    }

    async fn apply_theme(&self, theme: Theme) -> Result<(), AppError> {
        self.store.send(UiAction::SetTheme(theme)).await?;
        self.theme.set(theme);
        self.document.set_theme_attribute(theme);
        Ok(())
    }

    /// Switch the locale and apply it to the document; not persisted
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_language(&self, language: impl Into<String>) -> Result<(), AppError> {
        let language = language.into();
        tracing::debug!(%language, "Setting language");
        self.store.send(UiAction::SetLanguage(language.clone())).await?;
        self.document.set_language_attribute(&language);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Append a notification and return its id
    ///
    /// Unset options default to `info`, auto-closing after the configured
    /// duration. An auto-closing notification is removed when its timer
    /// fires unless it was removed or cleared first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn add_notification(
        &self,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Result<NotificationId, AppError> {
        self.notify(message.into(), NotificationOptions::new(), options).await
    }

    /// Auto-closing `success` notification
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn show_success(
        &self,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Result<NotificationId, AppError> {
        let preset = NotificationOptions::new().kind(NotificationKind::Success);
        self.notify(message.into(), preset, options).await
    }

    /// Sticky `error` notification; pass `auto_close(true)` to let it expire
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn show_error(
        &self,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Result<NotificationId, AppError> {
        let preset = NotificationOptions::new()
            .kind(NotificationKind::Error)
            .auto_close(false);
        self.notify(message.into(), preset, options).await
    }

    /// Auto-closing `warning` notification
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn show_warning(
        &self,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Result<NotificationId, AppError> {
        let preset = NotificationOptions::new().kind(NotificationKind::Warning);
        self.notify(message.into(), preset, options).await
    }

    /// Auto-closing `info` notification
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn show_info(
        &self,
        message: impl Into<String>,
        options: NotificationOptions,
    ) -> Result<NotificationId, AppError> {
        let preset = NotificationOptions::new().kind(NotificationKind::Info);
        self.notify(message.into(), preset, options).await
    }

    async fn notify(
        &self,
        message: String,
        preset: NotificationOptions,
        options: NotificationOptions,
    ) -> Result<NotificationId, AppError> {
        let defaults = NotificationOptions::new()
            .kind(NotificationKind::Info)
            .auto_close(true)
            .duration(self.config.notification_duration);
        let resolved = defaults.overlay(preset).overlay(options);

        let kind = resolved.kind.unwrap_or_default();
        let duration = resolved.duration.unwrap_or(self.config.notification_duration);
        let notification = Notification {
            id: NotificationId::new(self.ids.next_id()),
            kind,
            message,
            auto_close: resolved.auto_close.unwrap_or(true),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        };
        let id = notification.id.clone();

        tracing::debug!(
            notification_id = %id,
            kind = kind.as_str(),
            auto_close = notification.auto_close,
            "Adding notification"
        );
        metrics::counter!("ui.notifications.added", "type" => kind.as_str()).increment(1);

        self.store.send(UiAction::AddNotification(notification)).await?;
        Ok(id)
    }

    /// Remove a notification and cancel its timer; unknown ids are a no-op
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn remove_notification(&self, id: NotificationId) -> Result<(), AppError> {
        self.dispatch(UiAction::RemoveNotification(id)).await
    }

    /// Remove every notification and cancel every timer
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn clear_notifications(&self) -> Result<(), AppError> {
        self.dispatch(UiAction::ClearNotifications).await
    }

    /// Ids of the auto-close timers still pending
    #[must_use]
    pub fn pending_timers(&self) -> Vec<EffectId> {
        self.store.pending_cancellables()
    }

    /// Whether the notification `id` still has a pending auto-close timer
    #[must_use]
    pub fn has_pending_timer(&self, id: &NotificationId) -> bool {
        self.store.is_pending(&notification_timer(id))
    }

    // ------------------------------------------------------------------
    // Global loading and error
    // ------------------------------------------------------------------

    /// Set the page-wide loading flag
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_global_loading(&self, loading: bool) -> Result<(), AppError> {
        self.dispatch(UiAction::SetGlobalLoading(loading)).await
    }

    /// Set or clear the page-wide error
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_global_error(&self, error: Option<String>) -> Result<(), AppError> {
        self.dispatch(UiAction::SetGlobalError(error)).await
    }

    /// Clear the page-wide error
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn clear_global_error(&self) -> Result<(), AppError> {
        self.dispatch(UiAction::ClearGlobalError).await
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Shallow-merge `patch` into the settings and persist the result
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, AppError> {
        let _persist = self.persist.lock().await;
        self.store.send(UiAction::UpdateSettings(patch)).await?;

        let settings = self.store.state(|s| s.settings).await;
        if !self.settings.set(settings).is_persisted() {
            tracing::debug!("Settings kept in memory only");
        }
        Ok(settings)
    }

    /// Restore and persist the default settings
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn reset_settings(&self) -> Result<(), AppError> {
        let _persist = self.persist.lock().await;
        self.store.send(UiAction::ResetSettings).await?;
        self.settings.set(Settings::default());
        Ok(())
    }

    /// Last theme written through this store, or the one read at startup
    #[must_use]
    pub fn persisted_theme(&self) -> Theme {
        self.theme.get()
    }

    /// Last settings written through this store, or the ones read at startup
    #[must_use]
    pub fn persisted_settings(&self) -> Settings {
        self.settings.get()
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Read state through a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&UiState) -> T,
    {
        self.store.state(f).await
    }

    /// Clone the current state
    pub async fn snapshot(&self) -> UiState {
        self.store.snapshot().await
    }

    /// Revision counter bumped after every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Every action reduced from now on
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<UiAction> {
        self.store.subscribe_actions()
    }

    /// Stop accepting actions, cancel pending timers and wait for effects
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if effects are still running at `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), AppError> {
        Ok(self.store.shutdown(timeout).await?)
    }

    async fn dispatch(&self, action: UiAction) -> Result<(), AppError> {
        tracing::trace!(?action, "Dispatching UI action");
        self.store.send(action).await?;
        Ok(())
    }
}
