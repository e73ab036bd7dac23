use super::dto::{BookingRequest, BookingResponse, Envelope, ErrorResponse, LoginRequest, LoginResponse, VenueResponse};
use super::model::{Booking, NewBooking, Venue};
use crate::availability::MalformedDateWarning;
use crate::config::model::{Config, DEFAULT_PAGE_LIMIT};
use crate::session::Session;
use futures::future;
use lazy_static::lazy_static;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

const VENUES_PATH: &str = "/holidaze/venues";
const BOOKINGS_PATH: &str = "/holidaze/bookings";
const LOGIN_PATH: &str = "/auth/login";
const API_KEY_HEADER: &str = "x-noroff-api-key";
const MAX_RETRIES: u32 = 5;

lazy_static! {
    static ref REST_CLIENT: ClientWithMiddleware = ClientBuilder::new(Client::new())
        .with(RetryTransientMiddleware::new_with_policy(
            ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES)
        ))
        .build();
}

#[derive(Debug, Error)]
pub enum APIError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Received invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Booking was created with unusable dates: {0}")]
    InvalidBooking(MalformedDateWarning),
}

/// Client for the Noroff Holidaze API.
pub struct HolidazeAPI {
    base_url: String,
    api_key: String,
    page_limit: u32,
}

impl HolidazeAPI {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.as_str(), config.api_key.as_str()).with_page_limit(config.page_limit)
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit.max(1);
        self
    }

    pub fn headers(&self, access_token: Option<&str>) -> Result<HeaderMap, APIError> {
        build_headers(&self.api_key, access_token)
    }

    fn venues_page_url(&self, page: u32) -> String {
        format!(
            "{}{}?page={}&limit={}&sort=created&sortOrder=desc&_bookings=true",
            self.base_url, VENUES_PATH, page, self.page_limit
        )
    }

    fn venue_url(&self, id: Uuid) -> String {
        format!(
            "{}{}/{}?_bookings=true&_owner=true",
            self.base_url, VENUES_PATH, id
        )
    }

    fn bookings_url(&self) -> String {
        format!("{}{}", self.base_url, BOOKINGS_PATH)
    }

    fn login_url(&self) -> String {
        format!("{}{}?_holidaze=true", self.base_url, LOGIN_PATH)
    }

    /**
    Returns every venue with its bookings, newest first.
    Keeps requesting pages until the API reports the last one
    */
    #[tracing::instrument(skip(self))]
    pub async fn get_all_venues(&self) -> Result<Vec<Venue>, APIError> {
        let mut venues = Vec::new();
        let mut page = 1;

        loop {
            let response = REST_CLIENT
                .get(self.venues_page_url(page))
                .headers(self.headers(None)?)
                .send()
                .await?;
            let envelope: Envelope<Vec<VenueResponse>> = read_response(response, "Failed to fetch venues").await?;
            let received = envelope.data.len();

            venues.extend(envelope.data.iter().map(VenueResponse::to_model));

            debug!("Got page {} with {} venues", page, received);

            if envelope.meta.is_last_page || received == 0 {
                break;
            }

            page += 1;
        }

        info!("Got {} venues", venues.len());

        Ok(venues)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_venue(&self, id: Uuid) -> Result<Venue, APIError> {
        let response = REST_CLIENT
            .get(self.venue_url(id))
            .headers(self.headers(None)?)
            .send()
            .await?;
        let envelope: Envelope<VenueResponse> = read_response(response, "Failed to fetch venue").await?;
        let venue = envelope.data.to_model();

        info!(
            "Venue '{}' has {} bookings ({} unusable)",
            venue.name,
            venue.bookings.len(),
            venue.skipped_bookings.len()
        );

        Ok(venue)
    }

    /// Fetches the venues concurrently, failing if any of them fails.
    pub async fn get_venues(&self, ids: &[Uuid]) -> Result<Vec<Venue>, APIError> {
        future::try_join_all(ids.iter().map(|&id| self.get_venue(id))).await
    }

    #[tracing::instrument(skip(self, session), fields(user = %session.user().name))]
    pub async fn create_booking(&self, session: &Session, booking: &NewBooking) -> Result<Booking, APIError> {
        info!("Creating booking");

        let response = REST_CLIENT
            .post(self.bookings_url())
            .headers(self.headers(Some(session.access_token()))?)
            .body(to_body(&BookingRequest::from(booking))?)
            .send()
            .await?;
        let envelope: Envelope<BookingResponse> = read_response(response, "Failed to create booking").await?;

        envelope.data.to_model(0).map_err(APIError::InvalidBooking)
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, APIError> {
        let response = REST_CLIENT
            .post(self.login_url())
            .headers(self.headers(None)?)
            .body(to_body(&LoginRequest { email, password })?)
            .send()
            .await?;
        let envelope: Envelope<LoginResponse> = read_response(response, "Login failed").await?;

        Ok(envelope.data.to_session())
    }
}

/// The headers every request needs, plus bearer auth when a token is given.
pub fn build_headers(api_key: &str, access_token: Option<&str>) -> Result<HeaderMap, APIError> {
    if api_key.trim().is_empty() {
        return Err(APIError::MissingApiKey);
    }

    let mut headers = HeaderMap::new();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(API_KEY_HEADER, HeaderValue::from_str(api_key)?);

    if let Some(token) = access_token.filter(|token| !token.is_empty()) {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

fn to_body<T: Serialize>(body: &T) -> Result<Vec<u8>, APIError> {
    Ok(serde_json::to_vec(body)?)
}

async fn read_response<T: DeserializeOwned>(response: Response, fallback_message: &str) -> Result<T, APIError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = error_message(&body, fallback_message);

        error!("Request failed with {}: {}", status, message);

        return Err(APIError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str::<T>(&body).map_err(|e| {
        error!("Response parse failed: {:?}", e);
        APIError::InvalidResponse(e)
    })
}

fn error_message(body: &str, fallback_message: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(ErrorResponse::into_message)
        .unwrap_or_else(|| fallback_message.to_string())
}
