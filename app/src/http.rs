//! [`BookingService`] over the booking REST API.
//!
//! Responses arrive wrapped as `{status, message, data, timestamp}`; the
//! client unwraps `data` wherever the server sends it. Failed calls are
//! normalized to a [`ServiceError`] whose message can be shown as is.

use crate::config::AppConfig;
use crate::service::{BookingService, ServiceError};
use crate::types::{
    Booking, BookingConfirmation, BookingFilters, BookingId, BookingRequest, BookingUpdate,
    CancellationReceipt, PopularRoute, Schedule, ScheduleId, SearchCriteria, SeatMap,
    UserBookingsResponse,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Message for `401`
pub const UNAUTHORIZED_MESSAGE: &str = "Your session has expired. Please sign in again.";
/// Message for `403`
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
/// Fallback message for `422`
pub const VALIDATION_MESSAGE: &str = "Please check your input and try again.";
/// Fallback message for every other failure status
pub const SERVER_MESSAGE: &str = "Server error. Please try again later.";
/// Message for a success response whose body does not decode
pub const UNEXPECTED_RESPONSE_MESSAGE: &str = "Unexpected response from server.";

/// Turn a failed response into a [`ServiceError`]
///
/// `401`, `403` and `404` get fixed messages. Everything else uses the
/// server's `message` when it sent a non-empty one.
#[must_use]
pub fn normalize_error(status: u16, body: &Value) -> ServiceError {
    let server_message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty());

    let message = match status {
        401 => UNAUTHORIZED_MESSAGE,
        403 => FORBIDDEN_MESSAGE,
        404 => ServiceError::NOT_FOUND_MESSAGE,
        422 => server_message.unwrap_or(VALIDATION_MESSAGE),
        _ => server_message.unwrap_or(SERVER_MESSAGE),
    };
    ServiceError::new(status, message)
}

/// The `data` member of an API envelope, or the body itself if it is not one
#[must_use]
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut fields) if fields.contains_key("data") => {
            fields.remove("data").unwrap_or(Value::Null)
        },
        other => other,
    }
}

/// JSON client for the booking API
#[derive(Debug, Clone)]
pub struct HttpBookingService {
    client: Client,
    base_url: String,
}

impl HttpBookingService {
    /// Client for `base_url` (e.g. `http://localhost:8080/api`) with a
    /// per-request `timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ServiceError::new(0, format!("Failed to build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Client configured from [`AppConfig`]
    ///
    /// # Errors
    ///
    /// See [`HttpBookingService::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(config.api_base_url.clone(), config.api_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send `request`, returning the status and the raw body of a success
    async fn fetch(&self, request: RequestBuilder) -> Result<(u16, Value), ServiceError> {
        let response = request.send().await.map_err(|error| {
            tracing::warn!(%error, "Request got no response");
            ServiceError::network()
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|error| {
            tracing::warn!(%error, status, "Response body could not be read");
            ServiceError::network()
        })?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if !(200..300).contains(&status) {
            tracing::debug!(status, "Request failed");
            return Err(normalize_error(status, &body));
        }
        Ok((status, body))
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let (status, body) = self.fetch(request).await?;
        decode(status, unwrap_envelope(body))
    }

    /// Like [`Self::call`], but a missing or `null` payload is an empty list
    async fn call_list<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, ServiceError> {
        let (status, body) = self.fetch(request).await?;
        decode::<Option<Vec<T>>>(status, unwrap_envelope(body)).map(Option::unwrap_or_default)
    }
}

fn decode<T: DeserializeOwned>(status: u16, data: Value) -> Result<T, ServiceError> {
    serde_json::from_value(data).map_err(|error| {
        tracing::warn!(%error, status, "Response did not match the expected shape");
        ServiceError::new(status, UNEXPECTED_RESPONSE_MESSAGE)
    })
}

#[async_trait]
impl BookingService for HttpBookingService {
    async fn search_trains(&self, criteria: &SearchCriteria) -> Result<Vec<Schedule>, ServiceError> {
        self.call_list(self.client.post(self.url("/bookings/search")).json(criteria))
            .await
    }

    async fn get_schedule_details(&self, id: ScheduleId) -> Result<Schedule, ServiceError> {
        self.call(self.client.get(self.url(&format!("/schedules/{id}"))))
            .await
    }

    async fn get_available_seats(
        &self,
        schedule_id: ScheduleId,
        seat_class: &str,
    ) -> Result<SeatMap, ServiceError> {
        let request = self
            .client
            .get(self.url(&format!("/schedules/{schedule_id}/seats")))
            .query(&[("seatClass", seat_class)]);
        self.call(request).await
    }

    async fn create_booking(&self, request: &BookingRequest) -> Result<BookingConfirmation, ServiceError> {
        self.call(self.client.post(self.url("/bookings/book")).json(request))
            .await
    }

    async fn get_user_bookings(
        &self,
        user_id: i64,
        filters: &BookingFilters,
    ) -> Result<UserBookingsResponse, ServiceError> {
        let request = self
            .client
            .get(self.url(&format!("/bookings/user/{user_id}")))
            .query(filters);
        self.call(request).await
    }

    async fn get_booking_details(&self, id: BookingId) -> Result<Booking, ServiceError> {
        self.call(self.client.get(self.url(&format!("/bookings/{id}"))))
            .await
    }

    async fn update_booking(&self, id: BookingId, update: &BookingUpdate) -> Result<Booking, ServiceError> {
        self.call(self.client.put(self.url(&format!("/bookings/{id}"))).json(update))
            .await
    }

    async fn cancel_booking(&self, id: BookingId, reason: &str) -> Result<CancellationReceipt, ServiceError> {
        let body = if reason.is_empty() {
            serde_json::json!({})
        } else {
            serde_json::json!({ "reason": reason })
        };
        let request = self
            .client
            .patch(self.url(&format!("/bookings/{id}/cancel")))
            .json(&body);

        let (_status, envelope) = self.fetch(request).await?;

        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let booking = match unwrap_envelope(envelope) {
            Value::Null => None,
            data => serde_json::from_value(data).ok(),
        };

        Ok(CancellationReceipt {
            booking_id: id,
            message,
            booking,
        })
    }

    async fn get_booking_by_pnr(&self, pnr: &str) -> Result<Booking, ServiceError> {
        self.call(self.client.get(self.url(&format!("/bookings/pnr/{pnr}"))))
            .await
    }

    async fn get_all_stations(&self) -> Result<Vec<String>, ServiceError> {
        self.call_list(self.client.get(self.url("/bookings/stations")))
            .await
    }

    async fn get_popular_routes(&self) -> Result<Vec<PopularRoute>, ServiceError> {
        self.call_list(self.client.get(self.url("/routes/popular")))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_messages_for_auth_and_missing() {
        let body = json!({"message": "ignored"});
        assert_eq!(normalize_error(401, &body).message, UNAUTHORIZED_MESSAGE);
        assert_eq!(normalize_error(403, &body).message, FORBIDDEN_MESSAGE);

        let missing = normalize_error(404, &body);
        assert_eq!(missing.message, "Requested resource not found.");
        assert_eq!(missing.status, 404);
    }

    #[test]
    fn test_validation_prefers_server_message() {
        assert_eq!(
            normalize_error(422, &json!({"message": "Seat count must be positive"})).message,
            "Seat count must be positive"
        );
        assert_eq!(normalize_error(422, &Value::Null).message, VALIDATION_MESSAGE);
        assert_eq!(normalize_error(422, &json!({"message": ""})).message, VALIDATION_MESSAGE);
    }

    #[test]
    fn test_other_statuses_fall_back_to_server_message() {
        assert_eq!(normalize_error(500, &Value::Null).message, SERVER_MESSAGE);
        assert_eq!(
            normalize_error(409, &json!({"message": "Seats already taken"})).message,
            "Seats already taken"
        );
    }

    #[test]
    fn test_unwrap_envelope() {
        let envelope = json!({
            "status": "SUCCESS",
            "message": "ok",
            "data": ["Delhi", "Agra"],
            "timestamp": "2025-01-01T00:00:00"
        });
        assert_eq!(unwrap_envelope(envelope), json!(["Delhi", "Agra"]));

        let bare = json!({"id": 1, "pnrNumber": "PNR1"});
        assert_eq!(unwrap_envelope(bare.clone()), bare);
        assert_eq!(unwrap_envelope(json!({"data": null})), Value::Null);
    }

    #[test]
    fn test_null_list_payload_decodes_empty() {
        let stations: Vec<String> = decode::<Option<Vec<String>>>(200, Value::Null)
            .unwrap()
            .unwrap_or_default();
        assert!(stations.is_empty());
    }

    #[test]
    fn test_mismatched_payload_is_unexpected_response() {
        let error = decode::<Booking>(200, json!("nope")).unwrap_err();
        assert_eq!(error.message, UNEXPECTED_RESPONSE_MESSAGE);
        assert_eq!(error.status, 200);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let service = HttpBookingService::new("http://localhost:8080/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(service.url("/routes/popular"), "http://localhost:8080/api/routes/popular");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let service = HttpBookingService::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        let error = service.get_all_stations().await.unwrap_err();

        assert!(error.is_network());
        assert_eq!(error.message, ServiceError::NETWORK_MESSAGE);
    }
}
