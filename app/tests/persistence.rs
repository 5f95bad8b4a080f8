//! Integration tests for persisted UI state and preferences
//!
//! Covers restarts over a storage file, independent mirrors over one key,
//! and storage that refuses reads or writes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use railbook_app::mocks::{DocumentChange, RecordingDocument};
use railbook_app::preferences::{SearchPreferences, UserPreferences};
use railbook_app::types::{SettingsPatch, Theme};
use railbook_app::ui::{SETTINGS_KEY, THEME_KEY};
use railbook_app::{UiStore, UiStoreConfig};
use railbook_storage::{DurableStorage, FileBackend, MemoryBackend, Operation, WriteOutcome};
use railbook_testing::{RecordingDiagnostics, SequentialIdGenerator};
use std::sync::Arc;

async fn open_ui(storage: &DurableStorage, document: &RecordingDocument) -> UiStore {
    UiStore::open(
        storage,
        Arc::new(document.clone()),
        Arc::new(SequentialIdGenerator::new("n")),
        UiStoreConfig::default(),
    )
    .await
    .unwrap()
}

fn recorded(backend: MemoryBackend) -> (DurableStorage, RecordingDiagnostics) {
    let diagnostics = RecordingDiagnostics::new();
    let storage = DurableStorage::new(backend).with_diagnostics(Arc::new(diagnostics.clone()));
    (storage, diagnostics)
}

#[tokio::test]
async fn test_theme_and_settings_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("railbook").join("storage.json");

    {
        let storage = DurableStorage::new(FileBackend::new(&path));
        let ui = open_ui(&storage, &RecordingDocument::new()).await;
        ui.set_theme(Theme::Dark).await.unwrap();
        ui.update_settings(SettingsPatch {
            auto_save: Some(false),
            ..SettingsPatch::default()
        })
        .await
        .unwrap();
        ui.set_language("hi").await.unwrap();
    }

    let document = RecordingDocument::new();
    let storage = DurableStorage::new(FileBackend::new(&path));
    let ui = open_ui(&storage, &document).await;
    let state = ui.snapshot().await;

    assert_eq!(state.theme, Theme::Dark);
    assert!(!state.settings.auto_save);
    assert_eq!(state.language, "en");
    assert_eq!(document.changes(), vec![DocumentChange::Theme(Theme::Dark)]);
}

#[tokio::test]
async fn test_second_instance_does_not_observe_later_writes() {
    let backend = MemoryBackend::new();
    let storage = DurableStorage::new(backend.clone());

    let first = open_ui(&storage, &RecordingDocument::new()).await;
    let second = open_ui(&storage, &RecordingDocument::new()).await;

    first.set_theme(Theme::Dark).await.unwrap();

    assert_eq!(backend.raw(THEME_KEY).as_deref(), Some("\"dark\""));
    assert!(!second.sync_persisted().await.unwrap());
    assert_eq!(second.state(|s| s.theme).await, Theme::Light);
}

#[tokio::test]
async fn test_unavailable_storage_keeps_the_app_working() {
    let backend = MemoryBackend::new();
    backend.set_available(false);
    let (storage, diagnostics) = recorded(backend);

    let ui = open_ui(&storage, &RecordingDocument::new()).await;
    assert_eq!(ui.state(|s| s.theme).await, Theme::Light);
    assert_eq!(diagnostics.failures_for(THEME_KEY)[0].operation, Operation::Read);

    assert_eq!(ui.toggle_theme().await.unwrap(), Theme::Dark);
    let settings = ui
        .update_settings(SettingsPatch {
            auto_save: Some(false),
            ..SettingsPatch::default()
        })
        .await
        .unwrap();

    assert!(!settings.auto_save);
    assert_eq!(ui.persisted_theme(), Theme::Dark);
    let writes: Vec<_> = diagnostics
        .failures()
        .into_iter()
        .filter(|f| f.operation == Operation::Write)
        .map(|f| f.key)
        .collect();
    assert_eq!(writes, vec![THEME_KEY.to_string(), SETTINGS_KEY.to_string()]);
}

#[test]
fn test_quota_exceeded_is_absorbed() {
    let backend = MemoryBackend::with_quota(16);
    let (storage, diagnostics) = recorded(backend.clone());
    let preferences = UserPreferences::open(&storage);

    let outcome = preferences.update_display(|d| d.currency = "EUR".to_string());

    assert_eq!(outcome, WriteOutcome::MemoryOnly);
    assert_eq!(preferences.get().display.currency, "EUR");
    assert!(backend.is_empty());
    assert!(diagnostics.failures()[0].message.contains("Quota exceeded"));
}

#[tokio::test]
async fn test_corrupt_storage_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let diagnostics = RecordingDiagnostics::new();
    let storage = DurableStorage::new(FileBackend::new(&path)).with_diagnostics(Arc::new(diagnostics.clone()));

    let ui = open_ui(&storage, &RecordingDocument::new()).await;
    let search = SearchPreferences::open(&storage);

    assert_eq!(ui.state(|s| s.theme).await, Theme::Light);
    assert!(search.get().recent_searches.is_empty());
    assert!(
        diagnostics
            .failures()
            .iter()
            .all(|f| f.operation == Operation::Read && f.message.contains("Corrupt"))
    );
    assert_eq!(diagnostics.failures().len(), 3);
}

#[tokio::test]
async fn test_writes_recover_a_corrupt_storage_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{truncated").unwrap();

    {
        let storage = DurableStorage::new(FileBackend::new(&path));
        let ui = open_ui(&storage, &RecordingDocument::new()).await;
        assert_eq!(ui.state(|s| s.theme).await, Theme::Light);
        ui.set_theme(Theme::Dark).await.unwrap();
    }

    let diagnostics = RecordingDiagnostics::new();
    let storage = DurableStorage::new(FileBackend::new(&path)).with_diagnostics(Arc::new(diagnostics.clone()));
    let ui = open_ui(&storage, &RecordingDocument::new()).await;

    assert_eq!(ui.state(|s| s.theme).await, Theme::Dark);
    assert!(diagnostics.is_empty());
    assert_eq!(std::fs::read_to_string(dir.path().join("storage.json.corrupt")).unwrap(), "{truncated");
}

#[tokio::test]
async fn test_partially_stored_settings_survive_restart() {
    let backend = MemoryBackend::new();
    backend.insert_raw(SETTINGS_KEY, r#"{"autoSave":false}"#);
    let (storage, diagnostics) = recorded(backend);

    let ui = open_ui(&storage, &RecordingDocument::new()).await;

    assert!(!ui.state(|s| s.settings.auto_save).await);
    assert!(diagnostics.is_empty());
}
