//! Errors returned by the application stores.

use crate::config::ConfigError;
use crate::provider::ProviderError;
use crate::service::ServiceError;
use railbook_runtime::StoreError;
use thiserror::Error;

/// Everything an action creator can fail with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The store rejected the action, usually because it is shutting down
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A remote call failed; the message is also stored in the slice's error
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A store was requested from a scope that does not provide it
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The environment held an unusable setting
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    /// The service failure, if this is one
    #[must_use]
    pub const fn service(&self) -> Option<&ServiceError> {
        match self {
            Self::Service(error) => Some(error),
            Self::Store(_) | Self::Provider(_) | Self::Config(_) => None,
        }
    }
}
