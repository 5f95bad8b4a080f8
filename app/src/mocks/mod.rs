//! In-memory collaborators for tests and demos.
//!
//! [`MockBookingService`] answers from canned data and can be told to fail or
//! to stall specific calls; [`RecordingDocument`] keeps every document change.

use crate::document::DocumentHook;
use crate::service::{BookingService, ServiceError};
use crate::types::{
    Booking, BookingConfirmation, BookingFilters, BookingId, BookingRequest, BookingStatus,
    BookingUpdate, CancellationReceipt, PopularRoute, Schedule, ScheduleId, SearchCriteria,
    SeatMap, Theme, UserBookingsResponse,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Canned {
    search_results: HashMap<String, Vec<Schedule>>,
    search_delays: HashMap<String, Duration>,
    schedule_details: HashMap<ScheduleId, Schedule>,
    seats: SeatMap,
    confirmation: Option<BookingConfirmation>,
    user_bookings: Option<UserBookingsResponse>,
    bookings: BTreeMap<BookingId, Booking>,
    stations: Vec<String>,
    routes: Vec<PopularRoute>,
    failures: HashMap<&'static str, ServiceError>,
    calls: Vec<&'static str>,
}

/// Scriptable [`BookingService`]
///
/// Operation names passed to [`MockBookingService::fail`] are the trait
/// method names, e.g. `"search_trains"`. Unknown schedules and bookings yield
/// a `404` error.
///
/// ```ignore
/// let service = MockBookingService::new()
///     .with_search_results("Delhi", vec![schedule])
///     .delay_search("Delhi", Duration::from_millis(200));
/// service.fail("create_booking", ServiceError::new(422, "No seats left"));
/// ```
#[derive(Debug, Default)]
pub struct MockBookingService {
    canned: Mutex<Canned>,
}

impl MockBookingService {
    /// A service with no data
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn canned(&self) -> MutexGuard<'_, Canned> {
        self.canned.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn canned_mut(&mut self) -> &mut Canned {
        self.canned.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Results for searches departing from `from`
    #[must_use]
    pub fn with_search_results(mut self, from: impl Into<String>, results: Vec<Schedule>) -> Self {
        self.canned_mut().search_results.insert(from.into(), results);
        self
    }

    /// Stall searches departing from `from` for `delay`
    #[must_use]
    pub fn delay_search(mut self, from: impl Into<String>, delay: Duration) -> Self {
        self.canned_mut().search_delays.insert(from.into(), delay);
        self
    }

    /// Details returned for `schedule.id`
    #[must_use]
    pub fn with_schedule_details(mut self, schedule: Schedule) -> Self {
        self.canned_mut().schedule_details.insert(schedule.id, schedule);
        self
    }

    /// Seat map returned for every schedule and class
    #[must_use]
    pub fn with_seats(mut self, seats: SeatMap) -> Self {
        self.canned_mut().seats = seats;
        self
    }

    /// Confirmation returned by `create_booking`
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: BookingConfirmation) -> Self {
        self.canned_mut().confirmation = Some(confirmation);
        self
    }

    /// Response returned by `get_user_bookings`
    #[must_use]
    pub fn with_user_bookings(mut self, response: UserBookingsResponse) -> Self {
        self.canned_mut().user_bookings = Some(response);
        self
    }

    /// A booking known to the details, update, cancel and PNR calls
    #[must_use]
    pub fn with_booking(mut self, booking: Booking) -> Self {
        self.canned_mut().bookings.insert(booking.id, booking);
        self
    }

    /// Station names
    #[must_use]
    pub fn with_stations<I, S>(mut self, stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.canned_mut().stations = stations.into_iter().map(Into::into).collect();
        self
    }

    /// Popular routes
    #[must_use]
    pub fn with_routes(mut self, routes: Vec<PopularRoute>) -> Self {
        self.canned_mut().routes = routes;
        self
    }

    /// Make `operation` fail with `error` until [`MockBookingService::recover`]
    pub fn fail(&self, operation: &'static str, error: ServiceError) {
        self.canned().failures.insert(operation, error);
    }

    /// Let `operation` succeed again
    pub fn recover(&self, operation: &'static str) {
        self.canned().failures.remove(operation);
    }

    /// Every call made so far, by operation name
    #[must_use]
    pub fn calls(&self) -> Vec<&'static str> {
        self.canned().calls.clone()
    }

    /// How many times `operation` was called
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.canned().calls.iter().filter(|call| **call == operation).count()
    }

    fn begin(&self, operation: &'static str) -> Result<(), ServiceError> {
        let mut canned = self.canned();
        canned.calls.push(operation);
        canned.failures.get(operation).cloned().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl BookingService for MockBookingService {
    async fn search_trains(&self, criteria: &SearchCriteria) -> Result<Vec<Schedule>, ServiceError> {
        let delay = {
            let mut canned = self.canned();
            canned.calls.push("search_trains");
            canned.search_delays.get(&criteria.departure_station).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let canned = self.canned();
        if let Some(error) = canned.failures.get("search_trains") {
            return Err(error.clone());
        }
        Ok(canned
            .search_results
            .get(&criteria.departure_station)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_schedule_details(&self, id: ScheduleId) -> Result<Schedule, ServiceError> {
        self.begin("get_schedule_details")?;
        self.canned()
            .schedule_details
            .get(&id)
            .cloned()
            .ok_or_else(ServiceError::not_found)
    }

    async fn get_available_seats(
        &self,
        _schedule_id: ScheduleId,
        _seat_class: &str,
    ) -> Result<SeatMap, ServiceError> {
        self.begin("get_available_seats")?;
        Ok(self.canned().seats.clone())
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation, ServiceError> {
        self.begin("create_booking")?;
        let canned = self.canned();
        Ok(canned.confirmation.clone().unwrap_or_else(|| {
            let id = canned.bookings.keys().next_back().map_or(1, |id| id.0 + 1);
            BookingConfirmation {
                pnr_number: format!("PNR{id:06}"),
                booking_id: BookingId(id),
                status: BookingStatus::Confirmed,
                booking_date: None,
                total_amount: Some(f64::from(request.seat_count) * 100.0),
            }
        }))
    }

    async fn get_user_bookings(
        &self,
        _user_id: i64,
        _filters: &BookingFilters,
    ) -> Result<UserBookingsResponse, ServiceError> {
        self.begin("get_user_bookings")?;
        let canned = self.canned();
        Ok(canned
            .user_bookings
            .clone()
            .unwrap_or_else(|| UserBookingsResponse::List(canned.bookings.values().cloned().collect())))
    }

    async fn get_booking_details(&self, id: BookingId) -> Result<Booking, ServiceError> {
        self.begin("get_booking_details")?;
        self.canned()
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(ServiceError::not_found)
    }

    async fn update_booking(&self, id: BookingId, update: &BookingUpdate) -> Result<Booking, ServiceError> {
        self.begin("update_booking")?;
        let mut canned = self.canned();
        let booking = canned.bookings.get_mut(&id).ok_or_else(ServiceError::not_found)?;

        if let Some(name) = &update.passenger_name {
            booking.passenger_name = Some(name.clone());
        }
        if let Some(email) = &update.passenger_email {
            booking.passenger_email = Some(email.clone());
        }
        if let Some(phone) = &update.passenger_phone {
            booking.passenger_phone = Some(phone.clone());
        }
        if let Some(seats) = update.seat_count {
            booking.seat_count = Some(seats);
        }
        if let Some(status) = update.booking_status {
            booking.status = Some(status);
        }
        Ok(booking.clone())
    }

    async fn cancel_booking(&self, id: BookingId, _reason: &str) -> Result<CancellationReceipt, ServiceError> {
        self.begin("cancel_booking")?;
        let mut canned = self.canned();
        let booking = canned.bookings.get_mut(&id).ok_or_else(ServiceError::not_found)?;
        booking.status = Some(BookingStatus::Cancelled);

        Ok(CancellationReceipt {
            booking_id: id,
            message: Some("Booking cancelled successfully".to_string()),
            booking: Some(booking.clone()),
        })
    }

    async fn get_booking_by_pnr(&self, pnr: &str) -> Result<Booking, ServiceError> {
        self.begin("get_booking_by_pnr")?;
        self.canned()
            .bookings
            .values()
            .find(|b| b.pnr_number.as_deref() == Some(pnr))
            .cloned()
            .ok_or_else(ServiceError::not_found)
    }

    async fn get_all_stations(&self) -> Result<Vec<String>, ServiceError> {
        self.begin("get_all_stations")?;
        Ok(self.canned().stations.clone())
    }

    async fn get_popular_routes(&self) -> Result<Vec<PopularRoute>, ServiceError> {
        self.begin("get_popular_routes")?;
        Ok(self.canned().routes.clone())
    }
}

/// One attribute change seen by [`RecordingDocument`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    /// `data-theme` set
    Theme(Theme),
    /// `lang` set
    Language(String),
}

/// [`DocumentHook`] that records every change; clones share the record
#[derive(Debug, Clone, Default)]
pub struct RecordingDocument {
    changes: Arc<Mutex<Vec<DocumentChange>>>,
}

impl RecordingDocument {
    /// An empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes in the order they were applied
    #[must_use]
    pub fn changes(&self) -> Vec<DocumentChange> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, change: DocumentChange) {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(change);
    }
}

impl DocumentHook for RecordingDocument {
    fn set_theme_attribute(&self, theme: Theme) {
        self.push(DocumentChange::Theme(theme));
    }

    fn set_language_attribute(&self, language: &str) {
        self.push(DocumentChange::Language(language.to_string()));
    }
}
