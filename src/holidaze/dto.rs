use super::model::{Booking, Location, Media, NewBooking, Profile, Venue, VenueMeta};
use crate::availability::{MalformedDateWarning, RawReservation};
use crate::session::Session;
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Every Holidaze response wraps its payload in `data`, with paging details in `meta`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageMeta {
    pub is_first_page: bool,
    pub is_last_page: bool,
    pub current_page: u32,
    pub previous_page: Option<u32>,
    pub next_page: Option<u32>,
    pub page_count: u32,
    pub total_count: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
    pub message: Option<String>,
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}

impl ErrorResponse {
    /// The first detailed error, falling back to the top level message.
    pub fn into_message(self) -> Option<String> {
        self.errors
            .into_iter()
            .map(|error| error.message)
            .find(|message| !message.is_empty())
            .or(self.message.filter(|message| !message.is_empty()))
    }
}

// Note: several String fields come back as null, so they go through the custom deserializer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueResponse {
    pub id: Uuid,
    #[serde(deserialize_with = "deserialize_str")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_str")]
    pub description: String,
    #[serde(default)]
    pub media: Vec<MediaResponse>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub max_guests: u32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub meta: MetaResponse,
    #[serde(default)]
    pub location: LocationResponse,
    #[serde(default)]
    pub owner: Option<ProfileResponse>,
    #[serde(default)]
    pub bookings: Vec<BookingResponse>,
}

impl VenueResponse {
    #[tracing::instrument(skip(self), fields(self.id = %self.id))]
    pub fn to_model(&self) -> Venue {
        let mut bookings = Vec::with_capacity(self.bookings.len());
        let mut skipped_bookings = Vec::new();

        for (index, booking) in self.bookings.iter().enumerate() {
            match booking.to_model(index) {
                Ok(booking) => bookings.push(booking),
                Err(warning) => {
                    warn!("Omitting booking: {}", warning);
                    skipped_bookings.push(warning);
                }
            }
        }

        Venue {
            id: self.id,
            name: self.name.to_string(),
            description: self.description.to_string(),
            media: self.media.iter().map(MediaResponse::to_model).collect(),
            price: self.price,
            max_guests: self.max_guests,
            rating: self.rating,
            meta: self.meta.to_model(),
            location: self.location.to_model(),
            owner: self.owner.as_ref().map(ProfileResponse::to_model),
            bookings,
            skipped_bookings,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MediaResponse {
    #[serde(deserialize_with = "deserialize_str")]
    pub url: String,
    #[serde(default, deserialize_with = "deserialize_str")]
    pub alt: String,
}

impl MediaResponse {
    pub fn to_model(&self) -> Media {
        Media {
            url: self.url.to_string(),
            alt: self.alt.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetaResponse {
    pub wifi: bool,
    pub parking: bool,
    pub breakfast: bool,
    pub pets: bool,
}

impl MetaResponse {
    pub fn to_model(&self) -> VenueMeta {
        VenueMeta {
            wifi: self.wifi,
            parking: self.parking,
            breakfast: self.breakfast,
            pets: self.pets,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationResponse {
    #[serde(default, deserialize_with = "deserialize_str")]
    pub address: String,
    #[serde(default, deserialize_with = "deserialize_str")]
    pub city: String,
    #[serde(default, deserialize_with = "deserialize_str")]
    pub zip: String,
    #[serde(default, deserialize_with = "deserialize_str")]
    pub country: String,
    #[serde(default, deserialize_with = "deserialize_str")]
    pub continent: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl LocationResponse {
    pub fn to_model(&self) -> Location {
        Location {
            address: self.address.to_string(),
            city: self.city.to_string(),
            zip: self.zip.to_string(),
            country: self.country.to_string(),
            continent: self.continent.to_string(),
            lat: self.lat.unwrap_or_default(),
            lng: self.lng.unwrap_or_default(),
        }
    }
}

/// Dates stay as strings here so that a bad one can be skipped instead of failing the venue.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub date_from: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub date_to: Option<String>,
    #[serde(default)]
    pub guests: u32,
    #[serde(default)]
    pub customer: Option<ProfileResponse>,
}

impl BookingResponse {
    pub fn to_raw(&self) -> RawReservation {
        RawReservation {
            label: Some(self.id.to_string()),
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
        }
    }

    pub fn to_model(&self, index: usize) -> Result<Booking, MalformedDateWarning> {
        let reservation = self.to_raw().parse(index)?;

        Ok(Booking {
            id: self.id,
            reservation,
            guests: self.guests,
            customer: self.customer.as_ref().map(ProfileResponse::to_model),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(deserialize_with = "deserialize_str")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_str")]
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_opt_str")]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<MediaResponse>,
    #[serde(default)]
    pub venue_manager: bool,
}

impl ProfileResponse {
    pub fn to_model(&self) -> Profile {
        Profile {
            name: self.name.to_string(),
            email: self.email.to_string(),
            bio: self.bio.clone(),
            avatar: self
                .avatar
                .as_ref()
                .filter(|avatar| !avatar.url.is_empty())
                .map(MediaResponse::to_model),
            venue_manager: self.venue_manager,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub access_token: String,
}

impl LoginResponse {
    pub fn to_session(&self) -> Session {
        Session::new(self.profile.to_model(), self.access_token.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub guests: u32,
    pub venue_id: Uuid,
}

impl From<&NewBooking> for BookingRequest {
    fn from(booking: &NewBooking) -> Self {
        Self {
            date_from: booking.date_from,
            date_to: booking.date_to,
            guests: booking.guests,
            venue_id: booking.venue_id,
        }
    }
}

fn deserialize_str<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s.parse().map_err(de::Error::custom)?,
        _ => String::new(),
    })
}

fn deserialize_opt_str<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}
