//! Booking slice: search, schedule selection, the booking wizard, the user's
//! bookings and station reference data.

mod reducer;
mod state;
mod store;

pub use reducer::BookingReducer;
pub use state::{BookingAction, BookingState};
pub use store::{BookingRuntime, BookingStore, BookingStoreConfig};
