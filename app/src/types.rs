//! Domain values shared by the UI and booking stores.
//!
//! Field names serialize in camelCase so persisted values and service
//! payloads keep the shape the booking API and the browser storage use.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Overwrite `target.field` with every field set in `patch`
///
/// The `optional` form is for targets whose fields are themselves `Option`.
macro_rules! apply_patch {
    (optional $target:expr, $patch:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = Some(value);
            }
        )*
    };
    ($target:expr, $patch:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = value;
            }
        )*
    };
}

// ============================================================================
// Theme
// ============================================================================

/// Colour scheme applied to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light scheme
    #[default]
    Light,
    /// Dark scheme
    Dark,
}

impl Theme {
    /// The other theme
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Attribute value written to the document
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Neutral information
    #[default]
    Info,
    /// An operation succeeded
    Success,
    /// Something needs attention
    Warning,
    /// An operation failed
    Error,
}

impl NotificationKind {
    /// Wire name, e.g. `"warning"`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Identifier of a live notification
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Wrap an id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A toast shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Assigned once by the UI store, never changed
    pub id: NotificationId,
    /// Severity
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Text shown to the user
    pub message: String,
    /// Whether the notification removes itself after `duration`
    pub auto_close: bool,
    /// Lifetime in milliseconds when `auto_close` is set
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl Notification {
    /// Lifetime as a [`Duration`]
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Caller overrides for a new notification
///
/// Unset fields fall back to the store's defaults: `info`, auto-closing, and
/// the configured duration (4000 ms unless changed).
///
/// ```ignore
/// let options = NotificationOptions::new()
///     .kind(NotificationKind::Warning)
///     .duration(Duration::from_secs(10));
/// ui.add_notification("Seats are running out", options).await?;
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationOptions {
    /// Severity override
    pub kind: Option<NotificationKind>,
    /// Auto-close override
    pub auto_close: Option<bool>,
    /// Lifetime override
    pub duration: Option<Duration>,
}

impl NotificationOptions {
    /// No overrides
    #[must_use]
    pub const fn new() -> Self {
        Self {
            kind: None,
            auto_close: None,
            duration: None,
        }
    }

    /// Set the severity
    #[must_use]
    pub const fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set whether the notification closes itself
    #[must_use]
    pub const fn auto_close(mut self, auto_close: bool) -> Self {
        self.auto_close = Some(auto_close);
        self
    }

    /// Set the lifetime
    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Layer `over` on top of `self`; fields set in `over` win
    #[must_use]
    pub fn overlay(self, over: Self) -> Self {
        Self {
            kind: over.kind.or(self.kind),
            auto_close: over.auto_close.or(self.auto_close),
            duration: over.duration.or(self.duration),
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Which channels the user wants to hear from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Email updates
    pub email: bool,
    /// Push notifications
    pub push: bool,
    /// Text messages
    pub sms: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            sms: false,
        }
    }
}

/// Tracking consent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacySettings {
    /// Usage analytics
    pub analytics: bool,
    /// Non-essential cookies
    pub cookies: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            analytics: true,
            cookies: true,
        }
    }
}

/// Application settings, persisted under `appSettings`
///
/// Fields missing from a stored value take their defaults, so older or
/// partial records still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Save drafts automatically
    pub auto_save: bool,
    /// Notification channels
    pub notifications: NotificationSettings,
    /// Privacy choices
    pub privacy: PrivacySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_save: true,
            notifications: NotificationSettings::default(),
            privacy: PrivacySettings::default(),
        }
    }
}

impl Settings {
    /// Shallow merge: each top-level field present in `patch` replaces ours
    pub fn merge(&mut self, patch: SettingsPatch) {
        apply_patch!(self, patch, [auto_save, notifications, privacy]);
    }
}

/// Partial [`Settings`]; nested records are replaced whole, not merged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// New `autoSave`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_save: Option<bool>,
    /// New notification channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationSettings>,
    /// New privacy choices
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<PrivacySettings>,
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            auto_save: Some(settings.auto_save),
            notifications: Some(settings.notifications),
            privacy: Some(settings.privacy),
        }
    }
}

// ============================================================================
// Schedules and search
// ============================================================================

/// Identifier of a train schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub i64);

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled departure as returned by search or the details endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Schedule id
    #[serde(alias = "scheduleId")]
    pub id: ScheduleId,
    /// Train id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_id: Option<i64>,
    /// Train number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_number: Option<String>,
    /// Train name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_name: Option<String>,
    /// Train type (express, local, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_type: Option<String>,
    /// Origin station
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_station: Option<String>,
    /// Destination station
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_station: Option<String>,
    /// `yyyy-MM-dd`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
    /// Departure time of day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    /// Arrival time of day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    /// Fare per seat
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fare: Option<f64>,
    /// Seats still free
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_seats: Option<u32>,
    /// Seats on the train
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_seats: Option<u32>,
    /// Extra detail only the details endpoint fills in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_info: Option<serde_json::Value>,
}

impl Schedule {
    /// A bare schedule with only its id set
    #[must_use]
    pub const fn new(id: ScheduleId) -> Self {
        Self {
            id,
            train_id: None,
            train_number: None,
            train_name: None,
            train_type: None,
            departure_station: None,
            arrival_station: None,
            departure_date: None,
            departure_time: None,
            arrival_time: None,
            fare: None,
            available_seats: None,
            total_seats: None,
            detailed_info: None,
        }
    }

    /// Whether the details endpoint has already been consulted
    #[must_use]
    pub fn is_detailed(&self) -> bool {
        match &self.detailed_info {
            None | Some(serde_json::Value::Null | serde_json::Value::Bool(false)) => false,
            Some(_) => true,
        }
    }
}

/// Seat data keyed by seat class
pub type SeatMap = BTreeMap<String, serde_json::Value>;

/// What the user searched for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Origin station
    pub departure_station: String,
    /// Destination station
    pub arrival_station: String,
    /// `yyyy-MM-dd`
    pub departure_date: String,
    /// Seats required
    #[serde(default = "default_seat_count")]
    pub seat_count: u32,
}

const fn default_seat_count() -> u32 {
    1
}

impl SearchCriteria {
    /// Criteria for one seat
    #[must_use]
    pub fn new(
        departure_station: impl Into<String>,
        arrival_station: impl Into<String>,
        departure_date: impl Into<String>,
    ) -> Self {
        Self {
            departure_station: departure_station.into(),
            arrival_station: arrival_station.into(),
            departure_date: departure_date.into(),
            seat_count: default_seat_count(),
        }
    }
}

/// Filters shown next to the search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Origin station
    pub from: String,
    /// Destination station
    pub to: String,
    /// `yyyy-MM-dd`
    pub departure_date: String,
    /// Train type filter; empty for any
    pub train_type: String,
    /// Seat class filter; empty for any
    pub seat_class: String,
    /// Sort key, e.g. `departure_asc`
    pub sort_by: String,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            from: String::new(),
            to: String::new(),
            departure_date: String::new(),
            train_type: String::new(),
            seat_class: String::new(),
            sort_by: String::from("departure_asc"),
        }
    }
}

impl SearchFilters {
    /// Shallow merge of `patch` into these filters
    pub fn merge(&mut self, patch: SearchFiltersPatch) {
        apply_patch!(self, patch, [from, to, departure_date, train_type, seat_class, sort_by]);
    }
}

/// Partial [`SearchFilters`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFiltersPatch {
    /// New origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// New destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// New date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
    /// New train type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_type: Option<String>,
    /// New seat class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_class: Option<String>,
    /// New sort key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl SearchFiltersPatch {
    /// Layer `over` on top of `self`; fields set in `over` win
    #[must_use]
    pub fn overlay(self, over: Self) -> Self {
        Self {
            from: over.from.or(self.from),
            to: over.to.or(self.to),
            departure_date: over.departure_date.or(self.departure_date),
            train_type: over.train_type.or(self.train_type),
            seat_class: over.seat_class.or(self.seat_class),
            sort_by: over.sort_by.or(self.sort_by),
        }
    }
}

impl From<&SearchCriteria> for SearchFiltersPatch {
    fn from(criteria: &SearchCriteria) -> Self {
        Self {
            from: Some(criteria.departure_station.clone()),
            to: Some(criteria.arrival_station.clone()),
            departure_date: Some(criteria.departure_date.clone()),
            ..Self::default()
        }
    }
}

/// A frequently booked origin/destination pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularRoute {
    /// Origin station
    pub from: String,
    /// Destination station
    pub to: String,
}

// ============================================================================
// Booking wizard
// ============================================================================

/// Titles of the booking wizard steps; `bookingStep` indexes into this
pub const BOOKING_STEPS: [&str; 4] = [
    "Schedule Details",
    "Passenger Information",
    "Payment",
    "Confirmation",
];

/// One traveller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    /// Full name
    pub name: String,
    /// Age in years
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Free-form gender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// How to reach the person booking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Data collected by the booking wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingData {
    /// Travellers in entry order
    pub passengers: Vec<Passenger>,
    /// Chosen seat class; empty until picked
    pub seat_class: String,
    /// Seats to book
    pub seat_count: u32,
    /// Contact details
    pub contact_info: ContactInfo,
}

impl Default for BookingData {
    fn default() -> Self {
        Self {
            passengers: Vec::new(),
            seat_class: String::new(),
            seat_count: default_seat_count(),
            contact_info: ContactInfo::default(),
        }
    }
}

impl BookingData {
    /// Shallow merge of `patch` into this data
    pub fn merge(&mut self, patch: BookingDataPatch) {
        apply_patch!(self, patch, [passengers, seat_class, seat_count, contact_info]);
    }
}

/// Partial [`BookingData`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDataPatch {
    /// Replacement passenger list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passengers: Option<Vec<Passenger>>,
    /// New seat class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_class: Option<String>,
    /// New seat count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_count: Option<u32>,
    /// Replacement contact details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
}

/// Payload sent to create a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    /// Schedule being booked
    pub schedule_id: ScheduleId,
    /// Lead passenger name
    pub passenger_name: String,
    /// Lead passenger email
    pub passenger_email: String,
    /// Lead passenger phone
    pub passenger_phone: String,
    /// Seats to book
    pub seat_count: u32,
}

// ============================================================================
// Bookings
// ============================================================================

/// Identifier of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a booking on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Awaiting confirmation
    Pending,
    /// Confirmed
    Confirmed,
    /// Cancelled by the user
    Cancelled,
    /// Journey done
    Completed,
    /// Money returned
    Refunded,
}

/// A booking as listed in the user's bookings or shown in details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking id; the list is keyed by it
    #[serde(alias = "bookingId")]
    pub id: BookingId,
    /// Reference code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnr_number: Option<String>,
    /// Server status
    #[serde(default, alias = "bookingStatus", skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// Schedule booked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<ScheduleId>,
    /// Lead passenger name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_name: Option<String>,
    /// Lead passenger email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_email: Option<String>,
    /// Lead passenger phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_phone: Option<String>,
    /// Seats booked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_count: Option<u32>,
    /// Amount charged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    /// When the booking was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<String>,
    /// Train number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_number: Option<String>,
    /// Train name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_name: Option<String>,
    /// Origin station
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_station: Option<String>,
    /// Destination station
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_station: Option<String>,
    /// Travel date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
    /// Departure time of day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    /// Arrival time of day
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
}

impl Booking {
    /// A bare booking with only its id set
    #[must_use]
    pub const fn new(id: BookingId) -> Self {
        Self {
            id,
            pnr_number: None,
            status: None,
            schedule_id: None,
            passenger_name: None,
            passenger_email: None,
            passenger_phone: None,
            seat_count: None,
            total_amount: None,
            booking_date: None,
            train_number: None,
            train_name: None,
            departure_station: None,
            arrival_station: None,
            departure_date: None,
            departure_time: None,
            arrival_time: None,
        }
    }

    /// Set the status
    #[must_use]
    pub const fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Shallow merge: every field present in `patch` overwrites ours
    ///
    /// The id is not touched.
    pub fn merge(&mut self, patch: BookingPatch) {
        apply_patch!(optional self, patch, [
            pnr_number,
            status,
            schedule_id,
            passenger_name,
            passenger_email,
            passenger_phone,
            seat_count,
            total_amount,
            booking_date,
            train_number,
            train_name,
            departure_station,
            arrival_station,
            departure_date,
            departure_time,
            arrival_time,
        ]);
    }
}

/// Partial [`Booking`] addressed by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    /// Booking to patch
    #[serde(alias = "bookingId")]
    pub id: BookingId,
    /// New reference code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnr_number: Option<String>,
    /// New status
    #[serde(default, alias = "bookingStatus", skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// New schedule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_id: Option<ScheduleId>,
    /// New lead passenger name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_name: Option<String>,
    /// New lead passenger email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_email: Option<String>,
    /// New lead passenger phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_phone: Option<String>,
    /// New seat count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_count: Option<u32>,
    /// New amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    /// New booking date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<String>,
    /// New train number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_number: Option<String>,
    /// New train name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_name: Option<String>,
    /// New origin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_station: Option<String>,
    /// New destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_station: Option<String>,
    /// New travel date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_date: Option<String>,
    /// New departure time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    /// New arrival time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
}

impl BookingPatch {
    /// A patch that only names the booking
    #[must_use]
    pub const fn new(id: BookingId) -> Self {
        Self {
            id,
            pnr_number: None,
            status: None,
            schedule_id: None,
            passenger_name: None,
            passenger_email: None,
            passenger_phone: None,
            seat_count: None,
            total_amount: None,
            booking_date: None,
            train_number: None,
            train_name: None,
            departure_station: None,
            arrival_station: None,
            departure_date: None,
            departure_time: None,
            arrival_time: None,
        }
    }

    /// Patch only the status
    #[must_use]
    pub const fn status(id: BookingId, status: BookingStatus) -> Self {
        let mut patch = Self::new(id);
        patch.status = Some(status);
        patch
    }
}

impl From<Booking> for BookingPatch {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            pnr_number: booking.pnr_number,
            status: booking.status,
            schedule_id: booking.schedule_id,
            passenger_name: booking.passenger_name,
            passenger_email: booking.passenger_email,
            passenger_phone: booking.passenger_phone,
            seat_count: booking.seat_count,
            total_amount: booking.total_amount,
            booking_date: booking.booking_date,
            train_number: booking.train_number,
            train_name: booking.train_name,
            departure_station: booking.departure_station,
            arrival_station: booking.arrival_station,
            departure_date: booking.departure_date,
            departure_time: booking.departure_time,
            arrival_time: booking.arrival_time,
        }
    }
}

/// Fields a user may change on an existing booking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    /// New lead passenger name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_name: Option<String>,
    /// New lead passenger email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_email: Option<String>,
    /// New lead passenger phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_phone: Option<String>,
    /// New seat count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_count: Option<u32>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_status: Option<BookingStatus>,
}

/// Server confirmation of a new booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    /// Reference code
    pub pnr_number: String,
    /// New booking id
    pub booking_id: BookingId,
    /// Initial status
    #[serde(alias = "bookingStatus")]
    pub status: BookingStatus,
    /// When the booking was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<String>,
    /// Amount charged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
}

/// Server acknowledgement of a cancellation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationReceipt {
    /// Cancelled booking
    pub booking_id: BookingId,
    /// Server message, when one was sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The booking as the server now sees it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
}

/// Paging of the user's bookings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// One-based page number
    pub page: u32,
    /// Page size
    pub size: u32,
    /// Total bookings
    pub total: u64,
    /// Total pages
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            size: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

impl Pagination {
    /// Shallow merge of `patch`
    pub fn merge(&mut self, patch: PaginationPatch) {
        apply_patch!(self, patch, [page, size, total, total_pages]);
    }
}

/// Partial [`Pagination`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationPatch {
    /// New page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// New size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// New total
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// New page count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// Query for the user's bookings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingFilters {
    /// Only bookings in this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    /// Page to fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// The user's bookings, paged or as a plain list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserBookingsResponse {
    /// `{ bookings, pagination }`
    Paged {
        /// This page of bookings
        bookings: Vec<Booking>,
        /// Paging, when the server sent it
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pagination: Option<PaginationPatch>,
    },
    /// A bare array
    List(Vec<Booking>),
}

impl UserBookingsResponse {
    /// The bookings, whichever shape arrived
    #[must_use]
    pub fn bookings(&self) -> &[Booking] {
        match self {
            Self::Paged { bookings, .. } | Self::List(bookings) => bookings,
        }
    }

    /// Paging, if the server sent any
    #[must_use]
    pub const fn pagination(&self) -> Option<PaginationPatch> {
        match self {
            Self::Paged { pagination, .. } => *pagination,
            Self::List(_) => None,
        }
    }
}
