use super::model::{Location, Venue};
use crate::availability::{is_range_available, AvailabilityError};
use chrono::NaiveDate;
use tracing::debug;

/// Filters for the venue list. An empty query matches every venue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueQuery {
    pub location: Option<String>,
    pub guests: Option<u32>,
    pub dates: Option<(NaiveDate, NaiveDate)>,
}

impl VenueQuery {
    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_guests(mut self, guests: u32) -> Self {
        self.guests = Some(guests);
        self
    }

    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.dates = Some((start, end));
        self
    }

    /// Whether any filter is set. A blank location counts as unset.
    pub fn is_search(&self) -> bool {
        self.location_term().is_some() || self.guests.is_some() || self.dates.is_some()
    }

    fn location_term(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    // A date search still needs room for at least one guest.
    fn min_guests(&self) -> Option<u32> {
        self.guests.or(self.dates.map(|_| 1))
    }
}

fn matches_location(location: &Location, term: &str) -> bool {
    [&location.address, &location.city, &location.country]
        .into_iter()
        .any(|field| field.to_lowercase().contains(term))
}

/**
Keeps the venues that fit every filter in `query`, in their original order.
A venue passes the date filter only if none of `start..=end` is occupied, so a stay
that shares just a boundary day with a booking is rejected
*/
pub fn search_venues<'a>(venues: &'a [Venue], query: &VenueQuery) -> Result<Vec<&'a Venue>, AvailabilityError> {
    if let Some((start, end)) = query.dates {
        if end < start {
            return Err(AvailabilityError::InvalidRange { start, end });
        }
    }

    let term = query.location_term();
    let min_guests = query.min_guests();
    let mut found = Vec::new();

    for venue in venues {
        if min_guests.is_some_and(|guests| venue.max_guests < guests) {
            continue;
        }

        if term
            .as_deref()
            .is_some_and(|term| !matches_location(&venue.location, term))
        {
            continue;
        }

        if let Some((start, end)) = query.dates {
            if !is_range_available(start, end, &venue.occupancy().occupied)? {
                continue;
            }
        }

        found.push(venue);
    }

    debug!("{} of {} venues match {:?}", found.len(), venues.len(), query);

    Ok(found)
}
