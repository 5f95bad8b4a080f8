//! Persisted user preferences that live outside the stores.
//!
//! Each helper owns a [`PersistedValue`] under a fixed key and exposes the
//! edits a view needs. Like every [`PersistedValue`], a helper reads its key
//! once when built; two helpers over the same key do not see each other's
//! writes.

use crate::document::DocumentHook;
use crate::types::{NotificationSettings, PopularRoute, SearchFiltersPatch, Theme};
use railbook_storage::{DurableStorage, PersistedValue, WriteOutcome};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key of [`SearchPreferences`]
pub const SEARCH_PREFERENCES_KEY: &str = "searchPreferences";
/// Key of [`ThemePreference`]
pub const THEME_PREFERENCE_KEY: &str = "themePreference";
/// Key of [`LanguagePreference`]
pub const LANGUAGE_PREFERENCE_KEY: &str = "languagePreference";
/// Key of [`UserPreferences`]
pub const USER_PREFERENCES_KEY: &str = "userPreferences";

/// Most recent searches kept
pub const RECENT_SEARCH_LIMIT: usize = 10;
/// Most favourite routes kept
pub const FAVORITE_ROUTE_LIMIT: usize = 5;

/// Which browser storage area a value lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageScope {
    /// Survives restarts
    #[default]
    Local,
    /// Lives as long as the session
    Session,
}

/// The local and session storage areas
#[derive(Debug, Clone)]
pub struct PreferenceStorage {
    local: DurableStorage,
    session: DurableStorage,
}

impl PreferenceStorage {
    /// Pair a durable area with a session area
    #[must_use]
    pub const fn new(local: DurableStorage, session: DurableStorage) -> Self {
        Self { local, session }
    }

    /// The area for `scope`
    #[must_use]
    pub const fn scope(&self, scope: StorageScope) -> &DurableStorage {
        match scope {
            StorageScope::Local => &self.local,
            StorageScope::Session => &self.session,
        }
    }

    /// A persisted value in the chosen area
    pub fn persistent_state<T>(&self, key: impl Into<String>, initial: T, scope: StorageScope) -> PersistedValue<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        self.scope(scope).persisted(key, initial)
    }
}

// ============================================================================
// Forms
// ============================================================================

/// Draft form data kept under `form_<key>`
#[derive(Debug)]
pub struct PersistentForm {
    data: PersistedValue<Map<String, Value>>,
}

impl PersistentForm {
    /// Restore the draft for `form_key`, or start from `initial`
    pub fn open(storage: &DurableStorage, form_key: &str, initial: Map<String, Value>) -> Self {
        Self {
            data: storage.persisted(format!("form_{form_key}"), initial),
        }
    }

    /// Storage key of the draft
    #[must_use]
    pub fn key(&self) -> &str {
        self.data.key()
    }

    /// Current draft
    #[must_use]
    pub fn data(&self) -> Map<String, Value> {
        self.data.get()
    }

    /// One field of the draft
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        self.data.with(|data| data.get(name).cloned())
    }

    /// Replace the whole draft
    pub fn save(&self, data: Map<String, Value>) -> WriteOutcome {
        self.data.set(data)
    }

    /// Set one field, keeping the others
    pub fn update_field(&self, name: impl Into<String>, value: impl Into<Value>) -> WriteOutcome {
        let name = name.into();
        let value = value.into();
        self.data.update(|previous| {
            let mut next = previous.clone();
            next.insert(name, value);
            next
        })
    }

    /// Drop the draft and return to the initial data
    pub fn clear(&self) -> WriteOutcome {
        self.data.remove()
    }
}

// ============================================================================
// Search preferences
// ============================================================================

/// A search the user ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSearch {
    /// Origin station
    pub from: String,
    /// Destination station
    pub to: String,
    /// `yyyy-MM-dd`, when the search had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
}

impl RecentSearch {
    fn same_route(&self, from: &str, to: &str) -> bool {
        self.from == from && self.to == to
    }
}

/// Stored search history and defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPreferenceValues {
    /// Newest first
    pub recent_searches: Vec<RecentSearch>,
    /// Newest first
    pub favorite_routes: Vec<PopularRoute>,
    /// Filters applied to new searches
    pub default_filters: SearchFiltersPatch,
    /// Result ordering, e.g. `departure_asc`
    pub sort_preference: String,
}

impl Default for SearchPreferenceValues {
    fn default() -> Self {
        Self {
            recent_searches: Vec::new(),
            favorite_routes: Vec::new(),
            default_filters: SearchFiltersPatch::default(),
            sort_preference: String::from("departure_asc"),
        }
    }
}

/// Recent searches, favourite routes and search defaults
#[derive(Debug)]
pub struct SearchPreferences {
    values: PersistedValue<SearchPreferenceValues>,
}

impl SearchPreferences {
    /// Restore from `searchPreferences`
    pub fn open(storage: &DurableStorage) -> Self {
        Self {
            values: storage.persisted(SEARCH_PREFERENCES_KEY, SearchPreferenceValues::default()),
        }
    }

    /// Current preferences
    #[must_use]
    pub fn get(&self) -> SearchPreferenceValues {
        self.values.get()
    }

    /// Put `search` first, dropping an older search for the same route
    pub fn add_recent_search(&self, search: RecentSearch) -> WriteOutcome {
        self.values.update(|previous| {
            let mut next = previous.clone();
            next.recent_searches = std::iter::once(search.clone())
                .chain(
                    previous
                        .recent_searches
                        .iter()
                        .filter(|s| !s.same_route(&search.from, &search.to))
                        .cloned(),
                )
                .take(RECENT_SEARCH_LIMIT)
                .collect();
            next
        })
    }

    /// Put `route` first among the favourites
    pub fn add_favorite_route(&self, route: PopularRoute) -> WriteOutcome {
        self.values.update(|previous| {
            let mut next = previous.clone();
            next.favorite_routes = std::iter::once(route.clone())
                .chain(
                    previous
                        .favorite_routes
                        .iter()
                        .filter(|r| !(r.from == route.from && r.to == route.to))
                        .cloned(),
                )
                .take(FAVORITE_ROUTE_LIMIT)
                .collect();
            next
        })
    }

    /// Forget a favourite route
    pub fn remove_favorite_route(&self, route: &PopularRoute) -> WriteOutcome {
        self.values.update(|previous| {
            let mut next = previous.clone();
            next.favorite_routes
                .retain(|r| !(r.from == route.from && r.to == route.to));
            next
        })
    }

    /// Merge `filters` into the default filters
    pub fn update_default_filters(&self, filters: SearchFiltersPatch) -> WriteOutcome {
        self.values.update(|previous| {
            let mut next = previous.clone();
            next.default_filters = previous.default_filters.clone().overlay(filters);
            next
        })
    }

    /// Set the result ordering
    pub fn update_sort_preference(&self, sort_by: impl Into<String>) -> WriteOutcome {
        let sort_by = sort_by.into();
        self.values.update(|previous| SearchPreferenceValues {
            sort_preference: sort_by,
            ..previous.clone()
        })
    }

    /// Forget everything
    pub fn clear(&self) -> WriteOutcome {
        self.values.remove()
    }
}

// ============================================================================
// Theme and language
// ============================================================================

/// Theme kept under `themePreference`, mirrored onto the document
pub struct ThemePreference {
    theme: PersistedValue<Theme>,
    document: Arc<dyn DocumentHook>,
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference")
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

impl ThemePreference {
    /// Restore the theme and apply it to the document
    pub fn open(storage: &DurableStorage, document: Arc<dyn DocumentHook>) -> Self {
        let theme = storage.persisted(THEME_PREFERENCE_KEY, Theme::Light);
        document.set_theme_attribute(theme.get());
        Self { theme, document }
    }

    /// Current theme
    #[must_use]
    pub fn get(&self) -> Theme {
        self.theme.get()
    }

    /// Change the theme
    pub fn set(&self, theme: Theme) -> WriteOutcome {
        let outcome = self.theme.set(theme);
        self.document.set_theme_attribute(theme);
        outcome
    }

    /// Flip the theme, returning the new one
    pub fn toggle(&self) -> Theme {
        self.theme.update(|previous| previous.toggled());
        let theme = self.theme.get();
        self.document.set_theme_attribute(theme);
        theme
    }
}

/// Language kept under `languagePreference`, mirrored onto the document
pub struct LanguagePreference {
    language: PersistedValue<String>,
    document: Arc<dyn DocumentHook>,
}

impl std::fmt::Debug for LanguagePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguagePreference")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl LanguagePreference {
    /// Restore the language (`en` by default) and apply it to the document
    pub fn open(storage: &DurableStorage, document: Arc<dyn DocumentHook>) -> Self {
        let language = storage.persisted(LANGUAGE_PREFERENCE_KEY, String::from("en"));
        language.with(|language| document.set_language_attribute(language));
        Self { language, document }
    }

    /// Current language
    #[must_use]
    pub fn get(&self) -> String {
        self.language.get()
    }

    /// Change the language
    pub fn set(&self, language: impl Into<String>) -> WriteOutcome {
        let language = language.into();
        self.document.set_language_attribute(&language);
        self.language.set(language)
    }
}

// ============================================================================
// User preferences
// ============================================================================

/// Data sharing choices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyPreferences {
    /// Share usage data with partners
    pub share_data: bool,
    /// Receive marketing
    pub marketing: bool,
}

/// How values are formatted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPreferences {
    /// ISO currency code
    pub currency: String,
    /// e.g. `DD/MM/YYYY`
    pub date_format: String,
    /// `24h` or `12h`
    pub time_format: String,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            currency: String::from("INR"),
            date_format: String::from("DD/MM/YYYY"),
            time_format: String::from("24h"),
        }
    }
}

/// Everything stored under `userPreferences`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferenceValues {
    /// Contact channels
    pub notifications: NotificationSettings,
    /// Data sharing
    pub privacy: PrivacyPreferences,
    /// Formatting
    pub display: DisplayPreferences,
}

/// Per-category account preferences
///
/// Each `update_*` edits one category in place and leaves the others alone.
#[derive(Debug)]
pub struct UserPreferences {
    values: PersistedValue<UserPreferenceValues>,
}

impl UserPreferences {
    /// Restore from `userPreferences`
    pub fn open(storage: &DurableStorage) -> Self {
        Self {
            values: storage.persisted(USER_PREFERENCES_KEY, UserPreferenceValues::default()),
        }
    }

    /// Current preferences
    #[must_use]
    pub fn get(&self) -> UserPreferenceValues {
        self.values.get()
    }

    /// Edit the contact channels
    pub fn update_notifications(&self, edit: impl FnOnce(&mut NotificationSettings)) -> WriteOutcome {
        self.values.update(|previous| {
            let mut next = previous.clone();
            edit(&mut next.notifications);
            next
        })
    }

    /// Edit the data sharing choices
    pub fn update_privacy(&self, edit: impl FnOnce(&mut PrivacyPreferences)) -> WriteOutcome {
        self.values.update(|previous| {
            let mut next = previous.clone();
            edit(&mut next.privacy);
            next
        })
    }

    /// Edit the formatting choices
    pub fn update_display(&self, edit: impl FnOnce(&mut DisplayPreferences)) -> WriteOutcome {
        self.values.update(|previous| {
            let mut next = previous.clone();
            edit(&mut next.display);
            next
        })
    }

    /// Store the defaults
    pub fn reset(&self) -> WriteOutcome {
        self.values.set(UserPreferenceValues::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{DocumentChange, RecordingDocument};
    use railbook_storage::MemoryBackend;
    use railbook_testing::helpers::memory_storage;
    use serde_json::json;

    fn route(from: &str, to: &str) -> PopularRoute {
        PopularRoute {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    fn search(from: &str, to: &str) -> RecentSearch {
        RecentSearch {
            from: from.to_string(),
            to: to.to_string(),
            departure_date: None,
        }
    }

    #[test]
    fn test_scopes_are_separate_areas() {
        let local = MemoryBackend::new();
        let session = MemoryBackend::new();
        let storage = PreferenceStorage::new(DurableStorage::new(local.clone()), DurableStorage::new(session.clone()));

        storage
            .persistent_state("draft", 0_u32, StorageScope::Session)
            .set(7);

        assert!(local.is_empty());
        assert_eq!(session.raw("draft").as_deref(), Some("7"));
    }

    #[test]
    fn test_form_update_field_keeps_other_fields() {
        let (backend, storage, _) = memory_storage();
        let mut initial = Map::new();
        initial.insert("name".to_string(), json!(""));
        let form = PersistentForm::open(&storage, "passenger", initial.clone());

        form.update_field("name", "Asha");
        form.update_field("age", 31);

        assert_eq!(form.key(), "form_passenger");
        assert_eq!(form.field("name"), Some(json!("Asha")));
        assert_eq!(form.field("age"), Some(json!(31)));
        assert!(backend.raw("form_passenger").is_some());

        form.clear();
        assert_eq!(form.data(), initial);
        assert!(backend.raw("form_passenger").is_none());
    }

    #[test]
    fn test_recent_searches_dedupe_and_cap() {
        let (_, storage, _) = memory_storage();
        let preferences = SearchPreferences::open(&storage);

        for i in 0..12 {
            preferences.add_recent_search(search("Delhi", &format!("City {i}")));
        }
        preferences.add_recent_search(search("Delhi", "City 5"));

        let recent = preferences.get().recent_searches;
        assert_eq!(recent.len(), RECENT_SEARCH_LIMIT);
        assert_eq!(recent[0], search("Delhi", "City 5"));
        assert_eq!(recent.iter().filter(|s| s.to == "City 5").count(), 1);
        assert!(recent.iter().all(|s| s.to != "City 0" && s.to != "City 1"));
    }

    #[test]
    fn test_favourites_cap_and_remove() {
        let (_, storage, _) = memory_storage();
        let preferences = SearchPreferences::open(&storage);

        for to in ["A", "B", "C", "D", "E", "F"] {
            preferences.add_favorite_route(route("Delhi", to));
        }
        let favourites = preferences.get().favorite_routes;
        assert_eq!(favourites.len(), FAVORITE_ROUTE_LIMIT);
        assert_eq!(favourites[0], route("Delhi", "F"));

        preferences.remove_favorite_route(&route("Delhi", "F"));
        assert_eq!(preferences.get().favorite_routes[0], route("Delhi", "E"));
    }

    #[test]
    fn test_default_filters_merge_and_persist() {
        let (_, storage, _) = memory_storage();
        let preferences = SearchPreferences::open(&storage);

        preferences.update_default_filters(SearchFiltersPatch {
            seat_class: Some("AC".to_string()),
            ..SearchFiltersPatch::default()
        });
        preferences.update_default_filters(SearchFiltersPatch {
            train_type: Some("EXPRESS".to_string()),
            ..SearchFiltersPatch::default()
        });
        preferences.update_sort_preference("price_asc");

        let reopened = SearchPreferences::open(&storage).get();
        assert_eq!(reopened.default_filters.seat_class.as_deref(), Some("AC"));
        assert_eq!(reopened.default_filters.train_type.as_deref(), Some("EXPRESS"));
        assert_eq!(reopened.sort_preference, "price_asc");

        preferences.clear();
        assert_eq!(preferences.get(), SearchPreferenceValues::default());
    }

    #[test]
    fn test_theme_preference_toggles_document() {
        let (backend, storage, _) = memory_storage();
        let document = RecordingDocument::new();
        let theme = ThemePreference::open(&storage, Arc::new(document.clone()));

        assert_eq!(theme.toggle(), Theme::Dark);
        assert_eq!(backend.raw(THEME_PREFERENCE_KEY).as_deref(), Some("\"dark\""));
        assert_eq!(
            document.changes(),
            vec![DocumentChange::Theme(Theme::Light), DocumentChange::Theme(Theme::Dark)]
        );
    }

    #[test]
    fn test_language_preference_defaults_to_english() {
        let (_, storage, _) = memory_storage();
        let document = RecordingDocument::new();
        let language = LanguagePreference::open(&storage, Arc::new(document.clone()));

        assert_eq!(language.get(), "en");
        assert!(language.set("hi").is_persisted());
        assert_eq!(LanguagePreference::open(&storage, Arc::new(document.clone())).get(), "hi");
        assert_eq!(document.changes().last(), Some(&DocumentChange::Language("hi".to_string())));
    }

    #[test]
    fn test_user_preferences_update_one_category() {
        let (backend, storage, _) = memory_storage();
        let preferences = UserPreferences::open(&storage);

        preferences.update_notifications(|n| n.sms = true);
        preferences.update_display(|d| d.currency = "USD".to_string());

        let values = preferences.get();
        assert!(values.notifications.sms);
        assert!(values.notifications.email);
        assert_eq!(values.display.currency, "USD");
        assert_eq!(values.display.date_format, "DD/MM/YYYY");

        let raw: Value = serde_json::from_str(&backend.raw(USER_PREFERENCES_KEY).unwrap()).unwrap();
        assert_eq!(raw["privacy"], json!({"shareData": false, "marketing": false}));
        assert_eq!(raw["display"]["timeFormat"], json!("24h"));

        preferences.reset();
        assert_eq!(preferences.get(), UserPreferenceValues::default());
    }
}
