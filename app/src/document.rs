//! Document-level side effects of theme and language changes.

use crate::types::Theme;

/// Receives the document attributes the UI store maintains
///
/// In a browser these are `data-theme` and `lang` on the root element.
pub trait DocumentHook: Send + Sync {
    /// Apply `theme` to the document
    fn set_theme_attribute(&self, theme: Theme);

    /// Apply `language` to the document
    fn set_language_attribute(&self, language: &str);
}

/// Hook for headless hosts: logs each change
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDocument;

impl DocumentHook for TracingDocument {
    fn set_theme_attribute(&self, theme: Theme) {
        tracing::info!(data_theme = %theme, "Document theme updated");
    }

    fn set_language_attribute(&self, language: &str) {
        tracing::info!(lang = language, "Document language updated");
    }
}
