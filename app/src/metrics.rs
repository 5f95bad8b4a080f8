//! Metric descriptions for the application stores.
//!
//! Call [`register_metrics`] once after installing a recorder; it also
//! describes the runtime's store metrics.

use metrics::describe_counter;

/// Register descriptions for every metric the app and its stores record.
pub fn register_metrics() {
    railbook_runtime::metrics::register_metrics();

    describe_counter!(
        "booking.service.failures",
        "Total number of failed booking service calls, labelled by operation"
    );
    describe_counter!(
        "booking.search.stale_discarded",
        "Total number of search results dropped because a newer search was started"
    );
    describe_counter!(
        "ui.notifications.added",
        "Total number of notifications shown, labelled by type"
    );
}
