//! Booking store: action creators that drive the booking service.
//!
//! Creators that call the service follow one protocol: mark the slice as
//! loading (clearing its error), await the call, then either store the result
//! or store the error message and return the failure to the caller.

use super::reducer::BookingReducer;
use super::state::{BookingAction, BookingState};
use crate::error::AppError;
use crate::service::{BookingService, ServiceError};
use crate::types::{
    Booking, BookingConfirmation, BookingDataPatch, BookingFilters, BookingId, BookingPatch,
    BookingRequest, BookingStatus, BookingUpdate, CancellationReceipt, PopularRoute, Schedule,
    ScheduleId, SearchCriteria, SearchFiltersPatch, SeatMap, UserBookingsResponse,
};
use railbook_runtime::{Store, StoreConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast, watch};

/// Runtime store type behind [`BookingStore`]
pub type BookingRuntime = Store<BookingState, BookingAction, (), BookingReducer>;

/// Configuration for [`BookingStore`]
#[derive(Debug, Clone)]
pub struct BookingStoreConfig {
    /// Ignore search responses that arrive after a newer search started
    ///
    /// With `false`, whichever search completes last overwrites the results.
    pub discard_stale_searches: bool,
    /// Runtime settings
    pub store: StoreConfig,
}

impl Default for BookingStoreConfig {
    fn default() -> Self {
        Self {
            discard_stale_searches: true,
            store: StoreConfig::default(),
        }
    }
}

impl BookingStoreConfig {
    /// Keep or drop stale search responses
    #[must_use]
    pub const fn with_discard_stale_searches(mut self, discard: bool) -> Self {
        self.discard_stale_searches = discard;
        self
    }

    /// Set the runtime settings
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}

/// Search, booking wizard and bookings management
///
/// # Example
///
/// ```ignore
/// let booking = BookingStore::new(Arc::new(service), BookingStoreConfig::default());
///
/// let results = booking.search_trains(&SearchCriteria::new("Delhi", "Agra", "2025-03-01")).await?;
/// booking.select_schedule(results[0].clone()).await?;
/// ```
pub struct BookingStore {
    store: BookingRuntime,
    service: Arc<dyn BookingService>,
    config: BookingStoreConfig,
    // Ticket of the most recently started search.
    search_ticket: Mutex<u64>,
}

impl std::fmt::Debug for BookingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BookingStore {
    /// Create a store with empty state over `service`
    #[must_use]
    pub fn new(service: Arc<dyn BookingService>, config: BookingStoreConfig) -> Self {
        Self {
            store: Store::with_config(
                BookingState::default(),
                BookingReducer::new(),
                (),
                config.store.clone(),
            ),
            service,
            config,
            search_ticket: Mutex::new(0),
        }
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Search for schedules and store them with the criteria as filters
    ///
    /// When [`BookingStoreConfig::discard_stale_searches`] is set, a search
    /// overtaken by a newer one leaves state alone on completion; its result
    /// is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the search fails (the message is also
    /// stored in `search_error`), or [`AppError::Store`] if the store is shut
    /// down.
    #[tracing::instrument(skip(self, criteria), fields(from = %criteria.departure_station, to = %criteria.arrival_station))]
    pub async fn search_trains(&self, criteria: &SearchCriteria) -> Result<Vec<Schedule>, AppError> {
        let ticket = {
            let mut latest = self.search_ticket.lock().await;
            *latest += 1;
            self.store.send(BookingAction::SetSearchLoading(true)).await?;
            *latest
        };

        let outcome = self.service.search_trains(criteria).await;

        let latest = self.search_ticket.lock().await;
        if self.config.discard_stale_searches && *latest != ticket {
            tracing::debug!(ticket, latest = *latest, "Discarding stale search response");
            metrics::counter!("booking.search.stale_discarded").increment(1);
            return outcome.map_err(|error| self.failure("search_trains", error));
        }

        match outcome {
            Ok(results) => {
                tracing::debug!(results = results.len(), "Search completed");
                self.store
                    .send(BookingAction::SetSearchResults(results.clone()))
                    .await?;
                self.store
                    .send(BookingAction::SetSearchFilters(SearchFiltersPatch::from(criteria)))
                    .await?;
                Ok(results)
            },
            Err(error) => {
                self.store
                    .send(BookingAction::SetSearchError(error.message.clone()))
                    .await?;
                Err(self.failure("search_trains", error))
            },
        }
    }

    /// Shallow-merge into the search filters
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_search_filters(&self, filters: SearchFiltersPatch) -> Result<(), AppError> {
        self.dispatch(BookingAction::SetSearchFilters(filters)).await
    }

    /// Drop the results and the search error
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn clear_search_results(&self) -> Result<(), AppError> {
        self.dispatch(BookingAction::ClearSearchResults).await
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select a schedule, fetching its details unless it already has them
    ///
    /// The summary is selected immediately and replaced by the details once
    /// they arrive. Returns the schedule left selected.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the details fetch fails; the summary
    /// stays selected and no error is stored.
    pub async fn select_schedule(&self, schedule: Schedule) -> Result<Schedule, AppError> {
        let id = schedule.id;
        let detailed = schedule.is_detailed();
        self.store
            .send(BookingAction::SetSelectedSchedule(Some(schedule.clone())))
            .await?;

        if detailed {
            return Ok(schedule);
        }

        tracing::debug!(schedule_id = %id, "Fetching schedule details");
        match self.service.get_schedule_details(id).await {
            Ok(details) => {
                self.store
                    .send(BookingAction::SetSelectedSchedule(Some(details.clone())))
                    .await?;
                Ok(details)
            },
            Err(error) => Err(self.failure("get_schedule_details", error)),
        }
    }

    /// Fetch seat availability for one class of a schedule
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the fetch fails.
    pub async fn get_available_seats(
        &self,
        schedule_id: ScheduleId,
        seat_class: &str,
    ) -> Result<SeatMap, AppError> {
        self.store.send(BookingAction::SetSeatsLoading(true)).await?;

        match self.service.get_available_seats(schedule_id, seat_class).await {
            Ok(seats) => {
                self.store
                    .send(BookingAction::SetAvailableSeats(seats.clone()))
                    .await?;
                Ok(seats)
            },
            Err(error) => {
                self.store.send(BookingAction::SetSeatsLoading(false)).await?;
                Err(self.failure("get_available_seats", error))
            },
        }
    }

    // ------------------------------------------------------------------
    // Booking wizard
    // ------------------------------------------------------------------

    /// Shallow-merge into the wizard data
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn update_booking_data(&self, data: BookingDataPatch) -> Result<(), AppError> {
        self.dispatch(BookingAction::SetBookingData(data)).await
    }

    /// Move the wizard to `step`
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn set_booking_step(&self, step: usize) -> Result<(), AppError> {
        self.dispatch(BookingAction::SetBookingStep(step)).await
    }

    /// Create a booking and keep its confirmation as the current booking
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if creation fails (the message is also
    /// stored in `booking_error`).
    #[tracing::instrument(skip(self, request), fields(schedule_id = %request.schedule_id))]
    pub async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation, AppError> {
        self.store.send(BookingAction::SetBookingLoading(true)).await?;

        match self.service.create_booking(request).await {
            Ok(confirmation) => {
                tracing::info!(pnr = %confirmation.pnr_number, "Booking created");
                self.store
                    .send(BookingAction::SetCurrentBooking(Some(confirmation.clone())))
                    .await?;
                Ok(confirmation)
            },
            Err(error) => {
                self.store
                    .send(BookingAction::SetBookingError(error.message.clone()))
                    .await?;
                Err(self.failure("create_booking", error))
            },
        }
    }

    /// Reset the wizard, the selection and the current booking
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn reset_booking_process(&self) -> Result<(), AppError> {
        self.dispatch(BookingAction::ResetBookingProcess).await
    }

    // ------------------------------------------------------------------
    // User bookings
    // ------------------------------------------------------------------

    /// Load the bookings of `user_id`, and their paging if the server sends it
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the fetch fails (the message is also
    /// stored in `bookings_error`).
    pub async fn get_user_bookings(
        &self,
        user_id: i64,
        filters: &BookingFilters,
    ) -> Result<UserBookingsResponse, AppError> {
        self.store.send(BookingAction::SetBookingsLoading(true)).await?;

        match self.service.get_user_bookings(user_id, filters).await {
            Ok(response) => {
                self.store
                    .send(BookingAction::SetUserBookings(response.bookings().to_vec()))
                    .await?;
                if let Some(pagination) = response.pagination() {
                    self.store
                        .send(BookingAction::SetBookingsPagination(pagination))
                        .await?;
                }
                Ok(response)
            },
            Err(error) => {
                self.store
                    .send(BookingAction::SetBookingsError(error.message.clone()))
                    .await?;
                Err(self.failure("get_user_bookings", error))
            },
        }
    }

    /// Open one booking in the details view
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the fetch fails; the details slice has
    /// no error field, so only the loading flag is reset.
    pub async fn get_booking_details(&self, id: BookingId) -> Result<Booking, AppError> {
        self.store.send(BookingAction::SetDetailsLoading(true)).await?;

        match self.service.get_booking_details(id).await {
            Ok(booking) => {
                self.store
                    .send(BookingAction::SetBookingDetails(Some(booking.clone())))
                    .await?;
                Ok(booking)
            },
            Err(error) => {
                self.store.send(BookingAction::SetDetailsLoading(false)).await?;
                Err(self.failure("get_booking_details", error))
            },
        }
    }

    /// Change a booking, patching the listed copy and the open details
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the update fails (the message is also
    /// stored in `bookings_error`).
    pub async fn update_booking(&self, id: BookingId, update: &BookingUpdate) -> Result<Booking, AppError> {
        self.store.send(BookingAction::SetBookingsLoading(true)).await?;

        match self.service.update_booking(id, update).await {
            Ok(updated) => {
                self.store
                    .send(BookingAction::UpdateBookingInList(BookingPatch::from(updated.clone())))
                    .await?;

                let viewing = self
                    .store
                    .state(|s| s.booking_details.as_ref().is_some_and(|b| b.id == id))
                    .await;
                if viewing {
                    self.store
                        .send(BookingAction::SetBookingDetails(Some(updated.clone())))
                        .await?;
                }

                self.store.send(BookingAction::SetBookingsLoading(false)).await?;
                Ok(updated)
            },
            Err(error) => {
                self.store
                    .send(BookingAction::SetBookingsError(error.message.clone()))
                    .await?;
                Err(self.failure("update_booking", error))
            },
        }
    }

    /// Cancel a booking and mark the listed copy `CANCELLED`
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the cancellation fails (the message is
    /// also stored in `bookings_error`).
    #[tracing::instrument(skip(self, reason))]
    pub async fn cancel_booking(&self, id: BookingId, reason: &str) -> Result<CancellationReceipt, AppError> {
        self.store.send(BookingAction::SetBookingsLoading(true)).await?;

        match self.service.cancel_booking(id, reason).await {
            Ok(receipt) => {
                self.store
                    .send(BookingAction::UpdateBookingInList(BookingPatch::status(
                        id,
                        BookingStatus::Cancelled,
                    )))
                    .await?;
                self.store.send(BookingAction::SetBookingsLoading(false)).await?;
                Ok(receipt)
            },
            Err(error) => {
                self.store
                    .send(BookingAction::SetBookingsError(error.message.clone()))
                    .await?;
                Err(self.failure("cancel_booking", error))
            },
        }
    }

    /// Look a booking up by its reference code; state is not touched
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the lookup fails.
    pub async fn get_booking_by_pnr(&self, pnr: &str) -> Result<Booking, AppError> {
        self.service
            .get_booking_by_pnr(pnr)
            .await
            .map_err(|error| self.failure("get_booking_by_pnr", error))
    }

    // ------------------------------------------------------------------
    // Reference data
    // ------------------------------------------------------------------

    /// Load the station names
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the fetch fails.
    pub async fn get_stations(&self) -> Result<Vec<String>, AppError> {
        let stations = self
            .service
            .get_all_stations()
            .await
            .map_err(|error| self.failure("get_all_stations", error))?;
        self.store
            .send(BookingAction::SetStations(stations.clone()))
            .await?;
        Ok(stations)
    }

    /// Load the popular routes
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Service`] if the fetch fails.
    pub async fn get_popular_routes(&self) -> Result<Vec<PopularRoute>, AppError> {
        let routes = self
            .service
            .get_popular_routes()
            .await
            .map_err(|error| self.failure("get_popular_routes", error))?;
        self.store
            .send(BookingAction::SetPopularRoutes(routes.clone()))
            .await?;
        Ok(routes)
    }

    /// Clear the search, booking and bookings errors
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the store is shut down.
    pub async fn clear_errors(&self) -> Result<(), AppError> {
        self.dispatch(BookingAction::ClearErrors).await
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Read state through a closure
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&BookingState) -> T,
    {
        self.store.state(f).await
    }

    /// Clone the current state
    pub async fn snapshot(&self) -> BookingState {
        self.store.snapshot().await
    }

    /// Revision counter bumped after every change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Every action reduced from now on
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<BookingAction> {
        self.store.subscribe_actions()
    }

    /// Stop accepting actions and wait for running effects
    ///
    /// In-flight service calls are not cancelled; their completions fail with
    /// [`AppError::Store`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if effects are still running at `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), AppError> {
        Ok(self.store.shutdown(timeout).await?)
    }

    async fn dispatch(&self, action: BookingAction) -> Result<(), AppError> {
        tracing::trace!(?action, "Dispatching booking action");
        self.store.send(action).await?;
        Ok(())
    }

    fn failure(&self, operation: &'static str, error: ServiceError) -> AppError {
        tracing::warn!(operation, status = error.status, error = %error, "Booking service call failed");
        metrics::counter!("booking.service.failures", "operation" => operation).increment(1);
        AppError::Service(error)
    }
}
