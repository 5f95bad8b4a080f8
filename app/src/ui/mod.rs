//! UI slice: layout flags, theme, language, notifications and settings.

mod reducer;
mod state;
mod store;

pub use reducer::{UiReducer, notification_timer};
pub use state::{UiAction, UiState};
pub use store::{SETTINGS_KEY, THEME_KEY, UiRuntime, UiStore, UiStoreConfig};
