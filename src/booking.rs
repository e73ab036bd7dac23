use crate::availability::{
    is_day_available, is_selectable, AvailabilityError, OccupancyReport, OccupiedDates, ProposedRange,
};
use crate::holidaze::api::{APIError, HolidazeAPI};
use crate::holidaze::model::{Booking, NewBooking, Venue};
use crate::session::Session;
use chrono::NaiveDate;
use itertools::Itertools;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Availability(#[from] AvailabilityError),

    #[error("{start} is before the earliest bookable day {today}")]
    BeforeMinimumDate { start: NaiveDate, today: NaiveDate },

    #[error("Already booked on {}", .conflicts.iter().join(", "))]
    Unavailable { conflicts: Vec<NaiveDate> },

    #[error("Guests must be between 1 and {max_guests}, got {guests}")]
    InvalidGuests { guests: u32, max_guests: u32 },

    #[error(transparent)]
    API(#[from] APIError),
}

/// Wherever new bookings are sent to.
#[allow(async_fn_in_trait)]
pub trait BookingService {
    async fn create_booking(&self, session: &Session, booking: &NewBooking) -> Result<Booking, APIError>;
}

impl BookingService for HolidazeAPI {
    async fn create_booking(&self, session: &Session, booking: &NewBooking) -> Result<Booking, APIError> {
        HolidazeAPI::create_booking(self, session, booking).await
    }
}

/// One venue's booking calendar: a snapshot of its occupied days and the stay being picked.
#[derive(Debug, Clone)]
pub struct BookingCalendar {
    venue_id: Uuid,
    max_guests: u32,
    occupied: OccupiedDates,
    skipped: usize,
    range: ProposedRange,
}

impl BookingCalendar {
    pub fn new(venue_id: Uuid, max_guests: u32, report: OccupancyReport) -> Self {
        let mut calendar = Self {
            venue_id,
            max_guests,
            occupied: OccupiedDates::new(),
            skipped: 0,
            range: ProposedRange::default(),
        };

        calendar.refresh(report);
        calendar
    }

    pub fn for_venue(venue: &Venue) -> Self {
        Self::new(venue.id, venue.max_guests, venue.occupancy())
    }

    pub fn venue_id(&self) -> Uuid {
        self.venue_id
    }

    pub fn occupied(&self) -> &OccupiedDates {
        &self.occupied
    }

    pub fn range(&self) -> &ProposedRange {
        &self.range
    }

    /// How many reservations could not be shown, so the UI can say availability is partial.
    pub fn skipped_reservations(&self) -> usize {
        self.skipped
    }

    /// Replaces the snapshot with the authoritative one. The current selection is kept.
    pub fn refresh(&mut self, report: OccupancyReport) {
        if !report.is_complete() {
            warn!(
                "Some availability data could not be loaded: {} reservations skipped",
                report.skipped.len()
            );
        }

        self.occupied = report.occupied;
        self.skipped = report.skipped.len();
    }

    pub fn select(&mut self, day: NaiveDate) {
        self.range.select(day);
    }

    pub fn reset(&mut self) {
        self.range.reset();
    }

    /// Days the date picker must disable, ascending.
    pub fn excluded_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.occupied.iter().copied()
    }

    pub fn is_day_selectable(&self, day: NaiveDate, today: NaiveDate) -> bool {
        is_selectable(day, today) && is_day_available(day, &self.occupied)
    }

    /// Checks the current selection and returns it as `(start, end)`.
    pub fn validate(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), BookingError> {
        let (start, end) = match (self.range.start, self.range.end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(AvailabilityError::IncompleteRange.into()),
        };

        if !is_selectable(start, today) {
            return Err(BookingError::BeforeMinimumDate { start, today });
        }

        let conflicts = self.occupied.conflicts(start, end)?;
        if !conflicts.is_empty() {
            return Err(BookingError::Unavailable { conflicts });
        }

        Ok((start, end))
    }

    fn validate_guests(&self, guests: u32) -> Result<(), BookingError> {
        if guests == 0 || guests > self.max_guests {
            return Err(BookingError::InvalidGuests {
                guests,
                max_guests: self.max_guests,
            });
        }

        Ok(())
    }

    /// Books the current selection. On success the new stay is merged into the snapshot right
    /// away and the selection is cleared, ahead of the next [`BookingCalendar::refresh`].
    #[instrument(skip(self, service, session), fields(venue_id = %self.venue_id))]
    pub async fn submit<S: BookingService>(
        &mut self,
        service: &S,
        session: &Session,
        guests: u32,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let (date_from, date_to) = self.validate(today)?;
        self.validate_guests(guests)?;

        let request = NewBooking {
            venue_id: self.venue_id,
            date_from,
            date_to,
            guests,
        };
        let booking = service.create_booking(session, &request).await?;

        info!(
            "Booked {} to {} for {} guests",
            booking.reservation.date_from(),
            booking.reservation.date_to(),
            booking.guests
        );

        self.occupied.merge(&booking.reservation);
        self.range.reset();

        Ok(booking)
    }
}
