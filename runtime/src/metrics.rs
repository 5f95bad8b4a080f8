//! Metric descriptions for the store runtime.
//!
//! The store records metrics through the `metrics` facade. Nothing is
//! exported unless the host application installs a recorder; calling
//! [`register_metrics`] once after installing it attaches descriptions.
//!
//! # Example
//!
//! ```rust,ignore
//! // After installing a recorder of your choice
//! railbook_runtime::metrics::register_metrics();
//! ```

use metrics::{describe_counter, describe_histogram};

/// Register descriptions for every metric the store records.
pub fn register_metrics() {
    describe_counter!("store.commands.total", "Total number of actions reduced by stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time spent inside reducers per action"
    );
    describe_counter!(
        "store.effects.executed",
        "Total number of effects dispatched, labelled by effect type"
    );
    describe_counter!(
        "store.effects.cancelled",
        "Total number of pending effects cancelled or replaced"
    );
    describe_counter!("store.shutdown.initiated", "Total number of store shutdowns started");
    describe_counter!(
        "store.shutdown.completed",
        "Total number of store shutdowns that drained all effects"
    );
    describe_counter!(
        "store.shutdown.timeout",
        "Total number of store shutdowns that timed out"
    );
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Total number of actions rejected during shutdown"
    );
}
