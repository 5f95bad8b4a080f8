//! Booking reducer: search, selection, wizard, user bookings and reference data.
//!
//! Every external call is driven by [`BookingStore`](super::BookingStore);
//! this reducer only records its progress and never produces effects.

use super::state::{BookingAction, BookingState};
use crate::types::{Booking, BookingData, SeatMap};
use railbook_core::SmallVec;
use railbook_core::effect::Effect;
use railbook_core::reducer::Reducer;
use std::collections::HashSet;

/// Reducer for [`BookingState`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new booking reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut BookingState,
        action: BookingAction,
        _env: &(),
    ) -> SmallVec<[Effect<BookingAction>; 4]> {
        match action {
            // Search
            BookingAction::SetSearchLoading(loading) => {
                state.search_loading = loading;
                state.search_error = None;
            },
            BookingAction::SetSearchResults(results) => {
                state.search_results = results;
                state.search_loading = false;
                state.search_error = None;
            },
            BookingAction::SetSearchError(message) => {
                state.search_error = Some(message);
                state.search_loading = false;
            },
            BookingAction::SetSearchFilters(patch) => state.search_filters.merge(patch),
            BookingAction::ClearSearchResults => {
                state.search_results.clear();
                state.search_error = None;
            },

            // Selection
            BookingAction::SetSelectedSchedule(schedule) => state.selected_schedule = schedule,
            BookingAction::SetAvailableSeats(seats) => {
                state.available_seats = seats;
                state.seats_loading = false;
            },
            BookingAction::SetSeatsLoading(loading) => state.seats_loading = loading,

            // Booking wizard
            BookingAction::SetBookingData(patch) => state.booking_data.merge(patch),
            BookingAction::SetBookingStep(step) => state.booking_step = step,
            BookingAction::SetBookingLoading(loading) => {
                state.booking_loading = loading;
                state.booking_error = None;
            },
            BookingAction::SetBookingError(message) => {
                state.booking_error = Some(message);
                state.booking_loading = false;
            },
            BookingAction::SetCurrentBooking(confirmation) => {
                state.current_booking = confirmation;
                state.booking_loading = false;
            },
            BookingAction::ResetBookingProcess => {
                state.booking_data = BookingData::default();
                state.booking_step = 0;
                state.booking_loading = false;
                state.booking_error = None;
                state.current_booking = None;
                state.selected_schedule = None;
                state.available_seats = SeatMap::new();
            },

            // User bookings
            BookingAction::SetBookingsLoading(loading) => {
                state.bookings_loading = loading;
                state.bookings_error = None;
            },
            BookingAction::SetUserBookings(bookings) => {
                state.user_bookings = unique_by_id(bookings);
                state.bookings_loading = false;
                state.bookings_error = None;
            },
            BookingAction::SetBookingsError(message) => {
                state.bookings_error = Some(message);
                state.bookings_loading = false;
            },
            BookingAction::SetBookingsPagination(patch) => state.bookings_pagination.merge(patch),
            BookingAction::UpdateBookingInList(patch) => {
                match state.user_bookings.iter_mut().find(|b| b.id == patch.id) {
                    Some(booking) => booking.merge(patch),
                    None => tracing::debug!(booking_id = %patch.id, "Booking not listed, nothing to update"),
                }
            },
            BookingAction::RemoveBookingFromList(id) => state.user_bookings.retain(|b| b.id != id),

            // Details
            BookingAction::SetBookingDetails(booking) => {
                state.booking_details = booking;
                state.details_loading = false;
            },
            BookingAction::SetDetailsLoading(loading) => state.details_loading = loading,

            // Reference data
            BookingAction::SetStations(stations) => {
                let mut seen = HashSet::new();
                state.stations = stations
                    .into_iter()
                    .filter(|name| seen.insert(name.clone()))
                    .collect();
            },
            BookingAction::SetPopularRoutes(routes) => state.popular_routes = routes,

            BookingAction::ClearErrors => {
                state.search_error = None;
                state.booking_error = None;
                state.bookings_error = None;
            },

            BookingAction::Unrecognized => {
                tracing::debug!("Ignoring unrecognized booking action");
            },
        }

        SmallVec::new()
    }
}

/// Keep the first booking seen for each id
fn unique_by_id(bookings: Vec<Booking>) -> Vec<Booking> {
    let mut seen = HashSet::new();
    bookings.into_iter().filter(|b| seen.insert(b.id)).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{
        BookingConfirmation, BookingDataPatch, BookingId, BookingPatch, BookingStatus,
        PaginationPatch, Passenger, Schedule, ScheduleId, SearchFiltersPatch,
    };
    use railbook_testing::{ReducerTest, assertions};

    fn booking(id: i64, name: &str) -> Booking {
        let mut booking = Booking::new(BookingId(id)).with_status(BookingStatus::Confirmed);
        booking.passenger_name = Some(name.to_string());
        booking
    }

    fn test(state: BookingState) -> ReducerTest<BookingReducer, BookingState, BookingAction, ()> {
        ReducerTest::new(BookingReducer).with_env(()).given_state(state)
    }

    #[test]
    fn test_search_loading_and_error_are_exclusive() {
        test(BookingState {
            search_error: Some("old".to_string()),
            ..BookingState::default()
        })
        .when_action(BookingAction::SetSearchLoading(true))
        .then_state(|state| {
            assert!(state.search_loading);
            assert_eq!(state.search_error, None);
        })
        .run();

        test(BookingState {
            search_loading: true,
            ..BookingState::default()
        })
        .when_action(BookingAction::SetSearchError("boom".to_string()))
        .then_state(|state| {
            assert!(!state.search_loading);
            assert_eq!(state.search_error.as_deref(), Some("boom"));
        })
        .run();
    }

    #[test]
    fn test_search_results_end_search() {
        let results = vec![Schedule::new(ScheduleId(1)), Schedule::new(ScheduleId(2))];

        test(BookingState::default())
            .when_actions([
                BookingAction::SetSearchLoading(true),
                BookingAction::SetSearchResults(results.clone()),
            ])
            .then_state(move |state| {
                assert_eq!(state.search_results, results);
                assert!(!state.search_loading);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_search_filters_merge_preserves_omitted_fields() {
        test(BookingState::default())
            .when_actions([
                BookingAction::SetSearchFilters(SearchFiltersPatch {
                    from: Some("Delhi".to_string()),
                    train_type: Some("EXPRESS".to_string()),
                    ..SearchFiltersPatch::default()
                }),
                BookingAction::SetSearchFilters(SearchFiltersPatch {
                    to: Some("Mumbai".to_string()),
                    ..SearchFiltersPatch::default()
                }),
            ])
            .then_state(|state| {
                let filters = &state.search_filters;
                assert_eq!(filters.from, "Delhi");
                assert_eq!(filters.to, "Mumbai");
                assert_eq!(filters.train_type, "EXPRESS");
                assert_eq!(filters.sort_by, "departure_asc");
            })
            .run();
    }

    #[test]
    fn test_clear_search_results_keeps_filters() {
        test(BookingState {
            search_results: vec![Schedule::new(ScheduleId(1))],
            search_error: Some("stale".to_string()),
            ..BookingState::default()
        })
        .when_actions([
            BookingAction::SetSearchFilters(SearchFiltersPatch {
                from: Some("Pune".to_string()),
                ..SearchFiltersPatch::default()
            }),
            BookingAction::ClearSearchResults,
        ])
        .then_state(|state| {
            assert!(state.search_results.is_empty());
            assert_eq!(state.search_error, None);
            assert_eq!(state.search_filters.from, "Pune");
        })
        .run();
    }

    #[test]
    fn test_reset_booking_process_touches_only_the_wizard() {
        let results = vec![Schedule::new(ScheduleId(1)), Schedule::new(ScheduleId(2))];
        let bookings = vec![booking(7, "Asha")];
        let stations = vec!["Delhi".to_string(), "Agra".to_string()];

        let mut seats = SeatMap::new();
        seats.insert("SLEEPER".to_string(), serde_json::json!({"available": 12}));

        let given = BookingState {
            search_results: results.clone(),
            user_bookings: bookings.clone(),
            stations: stations.clone(),
            selected_schedule: Some(Schedule::new(ScheduleId(1))),
            available_seats: seats,
            booking_step: 2,
            booking_loading: true,
            booking_error: Some("x".to_string()),
            current_booking: Some(BookingConfirmation {
                pnr_number: "PNR1".to_string(),
                booking_id: BookingId(7),
                status: BookingStatus::Confirmed,
                booking_date: None,
                total_amount: None,
            }),
            booking_data: BookingData {
                passengers: vec![Passenger {
                    name: "Asha".to_string(),
                    age: Some(30),
                    gender: None,
                }],
                seat_class: "AC".to_string(),
                seat_count: 1,
                contact_info: crate::types::ContactInfo::default(),
            },
            ..BookingState::default()
        };

        test(given)
            .when_action(BookingAction::ResetBookingProcess)
            .then_state(move |state| {
                assert_eq!(state.booking_step, 0);
                assert_eq!(state.booking_data, BookingData::default());
                assert!(!state.booking_loading);
                assert_eq!(state.booking_error, None);
                assert_eq!(state.current_booking, None);
                assert_eq!(state.selected_schedule, None);
                assert!(state.available_seats.is_empty());

                assert_eq!(state.search_results, results);
                assert_eq!(state.user_bookings, bookings);
                assert_eq!(state.stations, stations);
            })
            .run();
    }

    #[test]
    fn test_booking_data_merge() {
        test(BookingState::default())
            .when_actions([
                BookingAction::SetBookingData(BookingDataPatch {
                    seat_class: Some("AC".to_string()),
                    ..BookingDataPatch::default()
                }),
                BookingAction::SetBookingData(BookingDataPatch {
                    seat_count: Some(3),
                    ..BookingDataPatch::default()
                }),
            ])
            .then_state(|state| {
                assert_eq!(state.booking_data.seat_class, "AC");
                assert_eq!(state.booking_data.seat_count, 3);
                assert!(state.booking_data.passengers.is_empty());
            })
            .run();
    }

    #[test]
    fn test_booking_step_is_stored_unchecked() {
        test(BookingState::default())
            .when_action(BookingAction::SetBookingStep(9))
            .then_state(|state| assert_eq!(state.booking_step, 9))
            .run();
    }

    #[test]
    fn test_set_user_bookings_drops_duplicate_ids() {
        test(BookingState {
            bookings_loading: true,
            ..BookingState::default()
        })
        .when_action(BookingAction::SetUserBookings(vec![
            booking(1, "first"),
            booking(2, "other"),
            booking(1, "second"),
        ]))
        .then_state(|state| {
            assert_eq!(state.user_bookings.len(), 2);
            assert_eq!(
                state.user_booking(BookingId(1)).unwrap().passenger_name.as_deref(),
                Some("first")
            );
            assert!(!state.bookings_loading);
        })
        .run();
    }

    #[test]
    fn test_update_booking_in_list_patches_status_only() {
        test(BookingState {
            user_bookings: vec![booking(1, "Asha"), booking(2, "Ravi")],
            ..BookingState::default()
        })
        .when_action(BookingAction::UpdateBookingInList(BookingPatch::status(
            BookingId(2),
            BookingStatus::Cancelled,
        )))
        .then_state(|state| {
            let updated = state.user_booking(BookingId(2)).unwrap();
            assert_eq!(updated.status, Some(BookingStatus::Cancelled));
            assert_eq!(updated.passenger_name.as_deref(), Some("Ravi"));
            assert_eq!(
                state.user_booking(BookingId(1)).unwrap().status,
                Some(BookingStatus::Confirmed)
            );
        })
        .run();
    }

    #[test]
    fn test_update_booking_in_list_ignores_unknown_id() {
        let listed = vec![booking(1, "Asha"), booking(2, "Ravi")];

        test(BookingState {
            user_bookings: listed.clone(),
            ..BookingState::default()
        })
        .when_action(BookingAction::UpdateBookingInList(BookingPatch::status(
            BookingId(99),
            BookingStatus::Cancelled,
        )))
        .then_state(move |state| assert_eq!(state.user_bookings, listed))
        .run();
    }

    #[test]
    fn test_remove_booking_from_list() {
        test(BookingState {
            user_bookings: vec![booking(1, "Asha"), booking(2, "Ravi")],
            ..BookingState::default()
        })
        .when_actions([
            BookingAction::RemoveBookingFromList(BookingId(1)),
            BookingAction::RemoveBookingFromList(BookingId(1)),
        ])
        .then_state(|state| {
            assert_eq!(state.user_bookings.len(), 1);
            assert_eq!(state.user_bookings[0].id, BookingId(2));
        })
        .run();
    }

    #[test]
    fn test_pagination_merge() {
        test(BookingState::default())
            .when_action(BookingAction::SetBookingsPagination(PaginationPatch {
                total: Some(42),
                total_pages: Some(5),
                ..PaginationPatch::default()
            }))
            .then_state(|state| {
                assert_eq!(state.bookings_pagination.page, 1);
                assert_eq!(state.bookings_pagination.size, 10);
                assert_eq!(state.bookings_pagination.total, 42);
                assert_eq!(state.bookings_pagination.total_pages, 5);
            })
            .run();
    }

    #[test]
    fn test_stations_keep_first_seen_order() {
        test(BookingState::default())
            .when_action(BookingAction::SetStations(vec![
                "Delhi".to_string(),
                "Agra".to_string(),
                "Delhi".to_string(),
                "Jaipur".to_string(),
            ]))
            .then_state(|state| assert_eq!(state.stations, ["Delhi", "Agra", "Jaipur"]))
            .run();
    }

    #[test]
    fn test_details_and_seats_end_their_fetch() {
        test(BookingState::default())
            .when_actions([
                BookingAction::SetDetailsLoading(true),
                BookingAction::SetSeatsLoading(true),
                BookingAction::SetBookingDetails(Some(booking(3, "Mira"))),
                BookingAction::SetAvailableSeats(SeatMap::new()),
            ])
            .then_state(|state| {
                assert!(!state.details_loading);
                assert!(!state.seats_loading);
                assert_eq!(state.booking_details.as_ref().unwrap().id, BookingId(3));
            })
            .run();
    }

    #[test]
    fn test_clear_errors() {
        test(BookingState {
            search_error: Some("a".to_string()),
            booking_error: Some("b".to_string()),
            bookings_error: Some("c".to_string()),
            ..BookingState::default()
        })
        .when_action(BookingAction::ClearErrors)
        .then_state(|state| {
            assert_eq!(state.search_error, None);
            assert_eq!(state.booking_error, None);
            assert_eq!(state.bookings_error, None);
        })
        .run();
    }

    #[test]
    fn test_unknown_action_type_is_identity() {
        let action: BookingAction = serde_json::from_str(r#"{"type":"NOT_A_REAL_ACTION"}"#).unwrap();
        assert_eq!(action, BookingAction::Unrecognized);

        let given = BookingState {
            booking_step: 1,
            stations: vec!["Delhi".to_string()],
            ..BookingState::default()
        };
        let expected = given.clone();

        test(given)
            .when_action(action)
            .then_state(move |state| assert_eq!(*state, expected))
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_actions_use_adjacent_tagging() {
        let json = serde_json::to_value(BookingAction::SetBookingStep(2)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SET_BOOKING_STEP", "payload": 2}));

        let action: BookingAction =
            serde_json::from_value(serde_json::json!({"type": "REMOVE_BOOKING_FROM_LIST", "payload": 4}))
                .unwrap();
        assert_eq!(action, BookingAction::RemoveBookingFromList(BookingId(4)));
    }
}
