//! UI state record and the actions that change it.

use crate::types::{Notification, NotificationId, Settings, SettingsPatch, Theme};
use serde::{Deserialize, Serialize};

/// Layout flags, theme, language, notifications and settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    /// Sidebar visible
    pub sidebar_open: bool,
    /// Mobile menu visible
    pub mobile_menu_open: bool,
    /// Search dialog visible
    pub search_modal_open: bool,
    /// Active colour scheme
    pub theme: Theme,
    /// Locale tag, e.g. `en`
    pub language: String,
    /// Live notifications in display order
    pub notifications: Vec<Notification>,
    /// A page-wide operation is running
    pub global_loading: bool,
    /// Page-wide error message
    pub global_error: Option<String>,
    /// Application settings
    pub settings: Settings,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_open: false,
            mobile_menu_open: false,
            search_modal_open: false,
            theme: Theme::Light,
            language: String::from("en"),
            notifications: Vec::new(),
            global_loading: false,
            global_error: None,
            settings: Settings::default(),
        }
    }
}

impl UiState {
    /// Look up a live notification
    #[must_use]
    pub fn notification(&self, id: &NotificationId) -> Option<&Notification> {
        self.notifications.iter().find(|n| &n.id == id)
    }
}

/// Every transition of [`UiState`]
///
/// Serialized adjacently tagged, e.g. `{"type": "SET_SIDEBAR_OPEN", "payload": true}`.
/// Any other `type` decodes to [`UiAction::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiAction {
    /// Flip `sidebar_open`
    ToggleSidebar,
    /// Flip `mobile_menu_open`
    ToggleMobileMenu,
    /// Flip `search_modal_open`
    ToggleSearchModal,
    /// Assign `sidebar_open`
    SetSidebarOpen(bool),
    /// Assign `mobile_menu_open`
    SetMobileMenuOpen(bool),
    /// Assign `search_modal_open`
    SetSearchModalOpen(bool),
    /// Assign `theme`
    SetTheme(Theme),
    /// Flip between light and dark
    ToggleTheme,
    /// Assign `language`
    SetLanguage(String),
    /// Append a notification and arm its timer if it auto-closes
    AddNotification(Notification),
    /// Drop the notification with this id and disarm its timer
    RemoveNotification(NotificationId),
    /// Drop every notification and disarm every timer
    ClearNotifications,
    /// Assign `global_loading`
    SetGlobalLoading(bool),
    /// Assign `global_error`
    SetGlobalError(Option<String>),
    /// Clear `global_error`
    ClearGlobalError,
    /// Shallow-merge into `settings`
    UpdateSettings(SettingsPatch),
    /// Restore default settings
    ResetSettings,
    /// An action type this build does not know; leaves state untouched
    #[serde(other)]
    Unrecognized,
}
