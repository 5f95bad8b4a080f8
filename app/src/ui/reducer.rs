//! UI reducer: layout flags, theme, notifications and settings.
//!
//! Auto-closing notifications are expired through cancellable timers keyed by
//! the notification id. Removing or clearing notifications cancels those
//! timers in the same reduction, so a timer that outlives its notification
//! never fires against a later one.

use super::state::{UiAction, UiState};
use crate::types::{NotificationId, Settings};
use railbook_core::cancellable_delay;
use railbook_core::effect::{Effect, EffectId};
use railbook_core::reducer::Reducer;
use railbook_core::{SmallVec, smallvec};

/// Effect id of the auto-close timer for `id`
#[must_use]
pub fn notification_timer(id: &NotificationId) -> EffectId {
    EffectId::new(format!("notification:{id}"))
}

/// Reducer for [`UiState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UiReducer;

impl UiReducer {
    /// Creates a new UI reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for UiReducer {
    type State = UiState;
    type Action = UiAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut UiState,
        action: UiAction,
        _env: &(),
    ) -> SmallVec<[Effect<UiAction>; 4]> {
        match action {
            UiAction::ToggleSidebar => state.sidebar_open = !state.sidebar_open,
            UiAction::ToggleMobileMenu => state.mobile_menu_open = !state.mobile_menu_open,
            UiAction::ToggleSearchModal => state.search_modal_open = !state.search_modal_open,
            UiAction::SetSidebarOpen(open) => state.sidebar_open = open,
            UiAction::SetMobileMenuOpen(open) => state.mobile_menu_open = open,
            UiAction::SetSearchModalOpen(open) => state.search_modal_open = open,
            UiAction::SetTheme(theme) => state.theme = theme,
            UiAction::ToggleTheme => state.theme = state.theme.toggled(),
            UiAction::SetLanguage(language) => state.language = language,

            UiAction::AddNotification(notification) => {
                let timer = notification.auto_close.then(|| {
                    cancellable_delay! {
                        id: notification_timer(&notification.id),
                        duration: notification.duration(),
                        action: UiAction::RemoveNotification(notification.id.clone())
                    }
                });
                state.notifications.push(notification);
                return timer.into_iter().collect();
            },
            UiAction::RemoveNotification(id) => {
                state.notifications.retain(|n| n.id != id);
                return smallvec![Effect::Cancel(notification_timer(&id))];
            },
            UiAction::ClearNotifications => {
                return state
                    .notifications
                    .drain(..)
                    .filter(|n| n.auto_close)
                    .map(|n| Effect::Cancel(notification_timer(&n.id)))
                    .collect();
            },

            UiAction::SetGlobalLoading(loading) => state.global_loading = loading,
            UiAction::SetGlobalError(error) => state.global_error = error,
            UiAction::ClearGlobalError => state.global_error = None,
            UiAction::UpdateSettings(patch) => state.settings.merge(patch),
            UiAction::ResetSettings => state.settings = Settings::default(),

            UiAction::Unrecognized => {
                tracing::debug!("Ignoring unrecognized UI action");
            },
        }

        SmallVec::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Notification, NotificationKind, SettingsPatch, Theme};
    use railbook_testing::{ReducerTest, assertions};
    use std::time::Duration;

    fn notification(id: &str, auto_close: bool) -> Notification {
        Notification {
            id: NotificationId::new(id),
            kind: NotificationKind::Info,
            message: format!("message {id}"),
            auto_close,
            duration_ms: 4000,
        }
    }

    #[test]
    fn test_toggles_flip_one_flag() {
        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_actions([UiAction::ToggleSidebar, UiAction::ToggleSearchModal])
            .when_action(UiAction::ToggleSearchModal)
            .then_state(|state| {
                assert!(state.sidebar_open);
                assert!(!state.mobile_menu_open);
                assert!(!state.search_modal_open);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_toggle_theme_flips() {
        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_action(UiAction::ToggleTheme)
            .then_state(|state| assert_eq!(state.theme, Theme::Dark))
            .run();
    }

    #[test]
    fn test_add_notification_arms_timer() {
        let id = NotificationId::new("n-1");
        let expected_id = id.clone();

        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_action(UiAction::AddNotification(notification("n-1", true)))
            .then_state(move |state| {
                assert_eq!(state.notifications.len(), 1);
                assert_eq!(state.notifications[0].id, expected_id);
            })
            .then_effects(move |effects| {
                let timer = notification_timer(&id);
                let (duration, action) = assertions::scheduled_delay(effects, &timer).unwrap();
                assert_eq!(duration, Duration::from_millis(4000));
                assert_eq!(action, &UiAction::RemoveNotification(id));
            })
            .run();
    }

    #[test]
    fn test_sticky_notification_has_no_timer() {
        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_action(UiAction::AddNotification(notification("n-1", false)))
            .then_state(|state| assert_eq!(state.notifications.len(), 1))
            .then_effects(|effects| assertions::assert_effects_count(effects, 0))
            .run();
    }

    #[test]
    fn test_notifications_keep_arrival_order() {
        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_actions([
                UiAction::AddNotification(notification("a", true)),
                UiAction::AddNotification(notification("b", false)),
                UiAction::AddNotification(notification("c", true)),
            ])
            .then_state(|state| {
                let ids: Vec<&str> = state.notifications.iter().map(|n| n.id.as_str()).collect();
                assert_eq!(ids, ["a", "b", "c"]);
            })
            .run();
    }

    #[test]
    fn test_remove_notification_cancels_timer_and_is_idempotent() {
        let id = NotificationId::new("gone");

        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_action(UiAction::AddNotification(notification("kept", true)))
            .when_action(UiAction::RemoveNotification(id.clone()))
            .then_state(|state| assert_eq!(state.notifications.len(), 1))
            .then_effects(move |effects| assertions::assert_cancels(effects, &notification_timer(&id)))
            .run();
    }

    #[test]
    fn test_clear_notifications_cancels_every_armed_timer() {
        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_actions([
                UiAction::AddNotification(notification("a", true)),
                UiAction::AddNotification(notification("b", false)),
                UiAction::AddNotification(notification("c", true)),
                UiAction::ClearNotifications,
            ])
            .then_state(|state| assert!(state.notifications.is_empty()))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 2);
                assertions::assert_cancels(effects, &notification_timer(&NotificationId::new("a")));
                assertions::assert_cancels(effects, &notification_timer(&NotificationId::new("c")));
            })
            .run();
    }

    #[test]
    fn test_update_settings_merges_shallowly() {
        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_action(UiAction::UpdateSettings(SettingsPatch {
                auto_save: Some(false),
                ..SettingsPatch::default()
            }))
            .then_state(|state| {
                assert!(!state.settings.auto_save);
                assert!(state.settings.notifications.email);
                assert!(state.settings.privacy.cookies);
            })
            .run();
    }

    #[test]
    fn test_reset_settings_restores_defaults() {
        let mut state = UiState::default();
        state.settings.auto_save = false;
        state.settings.privacy.analytics = false;

        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(state)
            .when_action(UiAction::ResetSettings)
            .then_state(|state| assert_eq!(state.settings, Settings::default()))
            .run();
    }

    #[test]
    fn test_global_error_set_and_clear() {
        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_action(UiAction::SetGlobalError(Some("offline".to_string())))
            .then_state(|state| assert_eq!(state.global_error.as_deref(), Some("offline")))
            .run();

        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(UiState::default())
            .when_actions([
                UiAction::SetGlobalError(Some("offline".to_string())),
                UiAction::ClearGlobalError,
            ])
            .then_state(|state| assert!(state.global_error.is_none()))
            .run();
    }

    #[test]
    fn test_unknown_action_type_leaves_state_unchanged() {
        let action: UiAction = serde_json::from_str(r#"{"type":"NOT_A_REAL_ACTION"}"#).unwrap();
        assert_eq!(action, UiAction::Unrecognized);

        let mut state = UiState::default();
        state.sidebar_open = true;
        let before = state.clone();

        ReducerTest::new(UiReducer)
            .with_env(())
            .given_state(state)
            .when_action(action)
            .then_state(move |state| assert_eq!(state, &before))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_actions_use_adjacent_tagging() {
        let json = serde_json::to_value(UiAction::SetSidebarOpen(true)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SET_SIDEBAR_OPEN", "payload": true}));

        let parsed: UiAction =
            serde_json::from_value(serde_json::json!({"type": "SET_THEME", "payload": "dark"})).unwrap();
        assert_eq!(parsed, UiAction::SetTheme(Theme::Dark));
    }
}
