//! Booking workflow state and the actions that change it.

use crate::types::{
    Booking, BookingConfirmation, BookingData, BookingDataPatch, BookingId, BookingPatch,
    Pagination, PaginationPatch, PopularRoute, Schedule, SearchFilters, SearchFiltersPatch,
    SeatMap,
};
use serde::{Deserialize, Serialize};

/// Search, selection, wizard, user-bookings, details and reference data
///
/// Each slice with a `*_loading` flag and a `*_error` keeps them mutually
/// exclusive: starting a request clears the error, recording an error clears
/// the flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingState {
    // Search
    /// Schedules from the latest applied search, in server order
    pub search_results: Vec<Schedule>,
    /// A search is running
    pub search_loading: bool,
    /// Message of the last failed search
    pub search_error: Option<String>,
    /// Filters shown with the results
    pub search_filters: SearchFilters,

    // Selection
    /// Schedule picked by the user, detailed once fetched
    pub selected_schedule: Option<Schedule>,
    /// Seat data keyed by seat class
    pub available_seats: SeatMap,
    /// Seat data is being fetched
    pub seats_loading: bool,

    // Booking wizard
    /// Data collected so far
    pub booking_data: BookingData,
    /// Index into [`BOOKING_STEPS`](crate::types::BOOKING_STEPS); not range-checked
    pub booking_step: usize,
    /// A booking is being created
    pub booking_loading: bool,
    /// Message of the last failed booking
    pub booking_error: Option<String>,
    /// Confirmation of the booking just made
    pub current_booking: Option<BookingConfirmation>,

    // User bookings
    /// The user's bookings, unique by id
    pub user_bookings: Vec<Booking>,
    /// Bookings are being fetched or changed
    pub bookings_loading: bool,
    /// Message of the last failed bookings call
    pub bookings_error: Option<String>,
    /// Paging of `user_bookings`
    pub bookings_pagination: Pagination,

    // Details
    /// Booking opened in the details view
    pub booking_details: Option<Booking>,
    /// Details are being fetched
    pub details_loading: bool,

    // Reference data
    /// Station names in first-seen order, without repeats
    pub stations: Vec<String>,
    /// Frequently booked routes
    pub popular_routes: Vec<PopularRoute>,
}

impl BookingState {
    /// Look up a booking in `user_bookings`
    #[must_use]
    pub fn user_booking(&self, id: BookingId) -> Option<&Booking> {
        self.user_bookings.iter().find(|b| b.id == id)
    }
}

/// Every transition of [`BookingState`]
///
/// Serialized adjacently tagged, e.g. `{"type": "SET_BOOKING_STEP", "payload": 2}`.
/// Any other `type` decodes to [`BookingAction::Unrecognized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingAction {
    // Search
    /// Assign `search_loading` and clear `search_error`
    SetSearchLoading(bool),
    /// Store results, ending the search
    SetSearchResults(Vec<Schedule>),
    /// Store a search failure, ending the search
    SetSearchError(String),
    /// Shallow-merge into `search_filters`
    SetSearchFilters(SearchFiltersPatch),
    /// Drop results and the search error
    ClearSearchResults,

    // Selection
    /// Assign `selected_schedule`
    SetSelectedSchedule(Option<Schedule>),
    /// Store seat data, ending the fetch
    SetAvailableSeats(SeatMap),
    /// Assign `seats_loading`
    SetSeatsLoading(bool),

    // Booking wizard
    /// Shallow-merge into `booking_data`
    SetBookingData(BookingDataPatch),
    /// Assign `booking_step`
    SetBookingStep(usize),
    /// Assign `booking_loading` and clear `booking_error`
    SetBookingLoading(bool),
    /// Store a booking failure, ending the request
    SetBookingError(String),
    /// Store the confirmation, ending the request
    SetCurrentBooking(Option<BookingConfirmation>),
    /// Reset the wizard, the selection and the current booking
    ResetBookingProcess,

    // User bookings
    /// Assign `bookings_loading` and clear `bookings_error`
    SetBookingsLoading(bool),
    /// Replace the list (duplicates by id are dropped), ending the request
    SetUserBookings(Vec<Booking>),
    /// Store a bookings failure, ending the request
    SetBookingsError(String),
    /// Shallow-merge into `bookings_pagination`
    SetBookingsPagination(PaginationPatch),
    /// Shallow-merge into the listed booking with the same id, if any
    UpdateBookingInList(BookingPatch),
    /// Drop the listed booking with this id, if any
    RemoveBookingFromList(BookingId),

    // Details
    /// Assign `booking_details`, ending the fetch
    SetBookingDetails(Option<Booking>),
    /// Assign `details_loading`
    SetDetailsLoading(bool),

    // Reference data
    /// Replace the station names (repeats dropped)
    SetStations(Vec<String>),
    /// Replace the popular routes
    SetPopularRoutes(Vec<PopularRoute>),

    /// Clear the search, booking and bookings errors
    ClearErrors,

    /// An action type this build does not know; leaves state untouched
    #[serde(other)]
    Unrecognized,
}
