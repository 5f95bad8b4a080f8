//! The remote booking service the booking store calls into.

use crate::types::{
    Booking, BookingConfirmation, BookingFilters, BookingId, BookingRequest, BookingUpdate,
    CancellationReceipt, PopularRoute, Schedule, ScheduleId, SearchCriteria, SeatMap,
    UserBookingsResponse,
};
use async_trait::async_trait;
use thiserror::Error;

/// A failed service call, normalized to a message and an HTTP-like status
///
/// Status `0` means no response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ServiceError {
    /// Text suitable for showing to the user
    pub message: String,
    /// HTTP status, or `0` when the server was unreachable
    pub status: u16,
}

impl ServiceError {
    /// Message used when no response arrives
    pub const NETWORK_MESSAGE: &'static str = "Network error. Please check your connection.";

    /// Message used for `404`
    pub const NOT_FOUND_MESSAGE: &'static str = "Requested resource not found.";

    /// Build an error
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// The server could not be reached
    #[must_use]
    pub fn network() -> Self {
        Self::new(0, Self::NETWORK_MESSAGE)
    }

    /// The resource does not exist
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(404, Self::NOT_FOUND_MESSAGE)
    }

    /// Whether no response was received
    #[must_use]
    pub const fn is_network(&self) -> bool {
        self.status == 0
    }
}

/// Remote operations behind the booking store
///
/// Every call may fail with a [`ServiceError`]; the store only ever reads its
/// `message`.
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Schedules matching `criteria`, in server order
    async fn search_trains(&self, criteria: &SearchCriteria) -> Result<Vec<Schedule>, ServiceError>;

    /// Full detail for one schedule
    async fn get_schedule_details(&self, id: ScheduleId) -> Result<Schedule, ServiceError>;

    /// Seat availability for one class of a schedule
    async fn get_available_seats(
        &self,
        schedule_id: ScheduleId,
        seat_class: &str,
    ) -> Result<SeatMap, ServiceError>;

    /// Create a booking
    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation, ServiceError>;

    /// Bookings of `user_id`
    async fn get_user_bookings(
        &self,
        user_id: i64,
        filters: &BookingFilters,
    ) -> Result<UserBookingsResponse, ServiceError>;

    /// One booking
    async fn get_booking_details(&self, id: BookingId) -> Result<Booking, ServiceError>;

    /// Change an existing booking
    async fn update_booking(&self, id: BookingId, update: &BookingUpdate) -> Result<Booking, ServiceError>;

    /// Cancel a booking
    async fn cancel_booking(&self, id: BookingId, reason: &str) -> Result<CancellationReceipt, ServiceError>;

    /// Look a booking up by its reference code
    async fn get_booking_by_pnr(&self, pnr: &str) -> Result<Booking, ServiceError>;

    /// Every station name
    async fn get_all_stations(&self) -> Result<Vec<String>, ServiceError>;

    /// Frequently booked routes
    async fn get_popular_routes(&self) -> Result<Vec<PopularRoute>, ServiceError>;
}
