use crate::availability::{occupied_from_reservations, MalformedDateWarning, OccupancyReport, Reservation};
use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub media: Vec<Media>,
    pub price: f64,
    pub max_guests: u32,
    pub rating: f64,
    pub meta: VenueMeta,
    pub location: Location,
    pub owner: Option<Profile>,
    pub bookings: Vec<Booking>,
    /// Bookings the API returned but whose dates could not be used.
    pub skipped_bookings: Vec<MalformedDateWarning>,
}

impl Venue {
    pub fn occupancy(&self) -> OccupancyReport {
        OccupancyReport {
            occupied: occupied_from_reservations(self.bookings.iter().map(|b| &b.reservation)),
            skipped: self.skipped_bookings.clone(),
        }
    }

    pub fn is_owned_by(&self, profile_name: &str) -> bool {
        self.owner
            .as_ref()
            .is_some_and(|owner| owner.name == profile_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VenueMeta {
    pub wifi: bool,
    pub parking: bool,
    pub breakfast: bool,
    pub pets: bool,
}

impl VenueMeta {
    pub fn facilities(&self) -> Vec<Facility> {
        [
            (self.wifi, Facility::Wifi),
            (self.parking, Facility::Parking),
            (self.breakfast, Facility::Breakfast),
            (self.pets, Facility::Pets),
        ]
        .into_iter()
        .filter_map(|(offered, facility)| offered.then_some(facility))
        .collect()
    }
}

#[derive(strum::IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Facility {
    Wifi,
    Parking,
    Breakfast,
    Pets,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub continent: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub reservation: Reservation,
    pub guests: u32,
    pub customer: Option<Profile>,
}

impl Booking {
    pub fn customer_name(&self) -> &str {
        self.customer
            .as_ref()
            .map(|customer| customer.name.as_str())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub avatar: Option<Media>,
    pub venue_manager: bool,
}

/// A stay about to be submitted to the booking service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub venue_id: Uuid,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub guests: u32,
}
