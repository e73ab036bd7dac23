//! Occupancy of a venue's calendar, computed from its reservations.
//!
//! Every date is reduced to a civil day (`NaiveDate`) before it is compared, using the
//! calendar date written in the timestamp's own offset. Ranges are closed on both ends, so a
//! reservation ending on a day still occupies that day.

pub mod error;

pub use error::{AvailabilityError, DateField, MalformedDateWarning};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::btree_set;
use std::collections::BTreeSet;
use std::iter::FusedIterator;
use tracing::{debug, warn};

const DAY_FORMAT: &str = "%Y-%m-%d";

// `%#z` also takes `Z` and offsets without minutes (`+02`).
const OFFSET_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
];

const NAIVE_TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601-ish date or timestamp into the civil day it was written for.
///
/// `2024-06-10T23:00:00+02:00`, `2024-06-10T23:00:00+0200`, `2024-06-10T00:00:00.000Z`,
/// `2024-06-10 08:30:00` and `2024-06-10` all yield `2024-06-10`: the offset is never applied.
pub fn parse_day(value: &str) -> Result<NaiveDate, AvailabilityError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(AvailabilityError::MissingDate);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.date_naive());
    }

    if let Some(timestamp) = OFFSET_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
    {
        return Ok(timestamp.date_naive());
    }

    if let Ok(timestamp) = value.parse::<NaiveDateTime>() {
        return Ok(timestamp.date());
    }

    if let Some(timestamp) = NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Ok(timestamp.date());
    }

    NaiveDate::parse_from_str(value, DAY_FORMAT)
        .map_err(|_| AvailabilityError::MalformedDate(value.to_string()))
}

/// Every day from `start` through `end`, inclusive.
///
/// Cheap to clone; a clone restarts from wherever the original currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRange {
    front: NaiveDate,
    back: NaiveDate,
    exhausted: bool,
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AvailabilityError> {
        if end < start {
            return Err(AvailabilityError::InvalidRange { start, end });
        }

        Ok(Self {
            front: start,
            back: end,
            exhausted: false,
        })
    }

    fn remaining(&self) -> usize {
        if self.exhausted {
            0
        } else {
            (self.back - self.front).num_days() as usize + 1
        }
    }
}

impl Iterator for DayRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let day = self.front;

        match day.succ_opt() {
            Some(next) if day < self.back => self.front = next,
            _ => self.exhausted = true,
        }

        Some(day)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for DayRange {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        let day = self.back;

        match day.pred_opt() {
            Some(previous) if day > self.front => self.back = previous,
            _ => self.exhausted = true,
        }

        Some(day)
    }
}

impl ExactSizeIterator for DayRange {}

impl FusedIterator for DayRange {}

pub fn expand_range(date_from: NaiveDate, date_to: NaiveDate) -> Result<DayRange, AvailabilityError> {
    DayRange::new(date_from, date_to)
}

/// A confirmed stay, `date_from` through `date_to` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reservation {
    date_from: NaiveDate,
    date_to: NaiveDate,
}

impl Reservation {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Result<Self, AvailabilityError> {
        if date_to < date_from {
            return Err(AvailabilityError::InvalidRange {
                start: date_from,
                end: date_to,
            });
        }

        Ok(Self { date_from, date_to })
    }

    pub fn date_from(&self) -> NaiveDate {
        self.date_from
    }

    pub fn date_to(&self) -> NaiveDate {
        self.date_to
    }

    pub fn days(&self) -> DayRange {
        DayRange {
            front: self.date_from,
            back: self.date_to,
            exhausted: false,
        }
    }

    pub fn nights(&self) -> i64 {
        (self.date_to - self.date_from).num_days() + 1
    }
}

/// A reservation as delivered by the booking service, before any date has been parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReservation {
    pub label: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl RawReservation {
    pub fn new(date_from: impl Into<String>, date_to: impl Into<String>) -> Self {
        Self {
            label: None,
            date_from: Some(date_from.into()),
            date_to: Some(date_to.into()),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// `index` is the record's position in its batch; it only appears in the warning.
    pub fn parse(&self, index: usize) -> Result<Reservation, MalformedDateWarning> {
        let warning = |field: Option<DateField>, reason: AvailabilityError| MalformedDateWarning {
            index,
            label: self.label.clone(),
            field,
            reason,
        };

        let date_from = Self::parse_field(self.date_from.as_deref())
            .map_err(|reason| warning(Some(DateField::DateFrom), reason))?;
        let date_to = Self::parse_field(self.date_to.as_deref())
            .map_err(|reason| warning(Some(DateField::DateTo), reason))?;

        Reservation::new(date_from, date_to).map_err(|reason| warning(None, reason))
    }

    fn parse_field(value: Option<&str>) -> Result<NaiveDate, AvailabilityError> {
        value.map_or(Err(AvailabilityError::MissingDate), parse_day)
    }
}

/// The set of civil days covered by at least one reservation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupiedDates {
    days: BTreeSet<NaiveDate>,
}

impl OccupiedDates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.days.contains(&day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Ascending order.
    pub fn iter(&self) -> btree_set::Iter<'_, NaiveDate> {
        self.days.iter()
    }

    /// Adds a reservation that is not yet part of the authoritative list.
    pub fn merge(&mut self, reservation: &Reservation) {
        self.days.extend(reservation.days());
    }

    /// Occupied days inside `start..=end`, ascending.
    pub fn conflicts(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, AvailabilityError> {
        let range = DayRange::new(start, end)?;

        Ok(self.days.range(range.front..=range.back).copied().collect())
    }
}

impl FromIterator<NaiveDate> for OccupiedDates {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

impl Extend<NaiveDate> for OccupiedDates {
    fn extend<T: IntoIterator<Item = NaiveDate>>(&mut self, iter: T) {
        self.days.extend(iter);
    }
}

impl<'a> IntoIterator for &'a OccupiedDates {
    type Item = &'a NaiveDate;
    type IntoIter = btree_set::Iter<'a, NaiveDate>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyReport {
    pub occupied: OccupiedDates,
    pub skipped: Vec<MalformedDateWarning>,
}

impl OccupancyReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Unions the days of every reservation. Records with unusable dates are skipped and
/// reported instead of failing the batch.
pub fn build_occupied_set(reservations: &[RawReservation]) -> OccupancyReport {
    let mut report = OccupancyReport::default();

    for (index, raw) in reservations.iter().enumerate() {
        match raw.parse(index) {
            Ok(reservation) => report.occupied.merge(&reservation),
            Err(warning) => {
                warn!("Skipping reservation: {}", warning);
                report.skipped.push(warning);
            }
        }
    }

    debug!(
        "Built occupied set with {} days from {} reservations ({} skipped)",
        report.occupied.len(),
        reservations.len(),
        report.skipped.len()
    );

    report
}

pub fn occupied_from_reservations<'a, I>(reservations: I) -> OccupiedDates
where
    I: IntoIterator<Item = &'a Reservation>,
{
    reservations
        .into_iter()
        .flat_map(Reservation::days)
        .collect()
}

/// Only checks occupancy; days in the past are [`is_selectable`]'s concern.
pub fn is_day_available(day: NaiveDate, occupied: &OccupiedDates) -> bool {
    !occupied.contains(day)
}

/// True if no day of `start..=end` is occupied. Sharing a boundary day with a reservation
/// counts as a conflict.
pub fn is_range_available(
    start: NaiveDate,
    end: NaiveDate,
    occupied: &OccupiedDates,
) -> Result<bool, AvailabilityError> {
    let mut days = expand_range(start, end)?;

    Ok(days.all(|day| is_day_available(day, occupied)))
}

/// The minimum selectable date policy: nothing before `today`.
pub fn is_selectable(day: NaiveDate, today: NaiveDate) -> bool {
    day >= today
}

/// The stay a user is in the middle of picking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProposedRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ProposedRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Follows a range picker: the first pick sets the start, the second the end. A second pick
    /// before the start, or any pick on a finished range, starts over from that day.
    pub fn select(&mut self, day: NaiveDate) {
        match (self.start, self.end) {
            (Some(start), None) if day >= start => self.end = Some(day),
            _ => {
                self.start = Some(day);
                self.end = None;
            }
        }
    }

    pub fn reset(&mut self) {
        self.start = None;
        self.end = None;
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn validate(&self) -> Result<DayRange, AvailabilityError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => DayRange::new(start, end),
            _ => Err(AvailabilityError::IncompleteRange),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn june_10_to_15() -> Vec<RawReservation> {
        vec![RawReservation::new("2024-06-10", "2024-06-15")]
    }

    #[test_log::test]
    fn should_parse_day_from_every_supported_format() {
        let expected = day(2024, 6, 10);

        assert_eq!(parse_day("2024-06-10"), Ok(expected));
        assert_eq!(parse_day("2024-06-10T00:00:00.000Z"), Ok(expected));
        assert_eq!(parse_day("2024-06-10T23:00:00+02:00"), Ok(expected));
        assert_eq!(parse_day("2024-06-10T08:30:00"), Ok(expected));
        assert_eq!(parse_day("  2024-06-10 "), Ok(expected));
        assert_eq!(parse_day("2024-06-10T23:00:00+0200"), Ok(expected));
        assert_eq!(parse_day("2024-06-10T23:00:00+02"), Ok(expected));
        assert_eq!(parse_day("2024-06-10T23:00Z"), Ok(expected));
        assert_eq!(parse_day("2024-06-10T08:30"), Ok(expected));
        assert_eq!(parse_day("2024-06-10 08:30:00"), Ok(expected));
        assert_eq!(parse_day("2024-06-10 08:30:00.250"), Ok(expected));
        assert_eq!(parse_day("2024-06-10 23:00:00-05:00"), Ok(expected));
    }

    #[test_log::test]
    fn should_reject_empty_and_garbage_dates() {
        assert_eq!(parse_day(""), Err(AvailabilityError::MissingDate));
        assert_eq!(parse_day("   "), Err(AvailabilityError::MissingDate));
        assert_eq!(
            parse_day("bad"),
            Err(AvailabilityError::MalformedDate("bad".to_string()))
        );
        assert!(parse_day("2024-02-30").is_err());
    }

    #[test_log::test]
    fn when_offsets_differ_the_written_day_should_still_match() {
        let evening_in_oslo = parse_day("2024-06-10T23:00:00+02:00").unwrap();
        let morning_in_new_york = parse_day("2024-06-10T01:00:00-05:00").unwrap();

        assert_eq!(evening_in_oslo, morning_in_new_york);
    }

    #[test_log::test]
    fn should_expand_range_inclusively_in_ascending_order() {
        let days = expand_range(day(2024, 2, 27), day(2024, 3, 2))
            .unwrap()
            .collect::<Vec<_>>();

        assert_eq!(
            days,
            vec![
                day(2024, 2, 27),
                day(2024, 2, 28),
                day(2024, 2, 29),
                day(2024, 3, 1),
                day(2024, 3, 2),
            ]
        );
    }

    #[test_log::test]
    fn expanded_range_should_have_one_entry_per_day() {
        let starts = [day(2023, 12, 30), day(2024, 2, 28), day(2024, 6, 10)];

        for start in starts {
            for length in [0, 1, 2, 31, 366] {
                let end = start + chrono::Days::new(length);
                let range = expand_range(start, end).unwrap();

                assert_eq!(range.len(), length as usize + 1);

                let days = range.collect::<Vec<_>>();
                assert_eq!(days.len(), length as usize + 1);
                assert!(days.windows(2).all(|pair| pair[0] < pair[1]));
            }
        }
    }

    #[test_log::test]
    fn expanded_range_should_be_restartable_and_reversible() {
        let range = expand_range(day(2024, 6, 10), day(2024, 6, 12)).unwrap();

        let first_pass = range.clone().collect::<Vec<_>>();
        let second_pass = range.clone().collect::<Vec<_>>();
        let backwards = range.rev().collect::<Vec<_>>();

        assert_eq!(first_pass, second_pass);
        assert_eq!(
            backwards,
            vec![day(2024, 6, 12), day(2024, 6, 11), day(2024, 6, 10)]
        );
    }

    #[test_log::test]
    fn when_range_is_inverted_should_fail() {
        let result = expand_range(day(2024, 6, 15), day(2024, 6, 10));

        assert_eq!(
            result,
            Err(AvailabilityError::InvalidRange {
                start: day(2024, 6, 15),
                end: day(2024, 6, 10),
            })
        );
    }

    #[test_log::test]
    fn every_reserved_day_should_be_occupied() {
        let report = build_occupied_set(&june_10_to_15());

        assert!(report.is_complete());
        assert_eq!(report.occupied.len(), 6);

        for reserved in expand_range(day(2024, 6, 10), day(2024, 6, 15)).unwrap() {
            assert!(report.occupied.contains(reserved), "{reserved} missing");
        }
    }

    #[test_log::test]
    fn building_twice_should_yield_equal_sets() {
        let reservations = vec![
            RawReservation::new("2024-06-10", "2024-06-15"),
            RawReservation::new("2024-07-01T00:00:00.000Z", "2024-07-03T00:00:00.000Z"),
        ];

        let first = build_occupied_set(&reservations);
        let second = build_occupied_set(&reservations);

        assert_eq!(first, second);
        assert!(first.occupied.iter().eq(second.occupied.iter()));
    }

    #[test_log::test]
    fn overlapping_reservations_should_share_the_overlapping_day_once() {
        let reservations = vec![
            RawReservation::new("2024-06-10", "2024-06-12"),
            RawReservation::new("2024-06-12T14:00:00+02:00", "2024-06-14"),
        ];

        let report = build_occupied_set(&reservations);

        assert_eq!(report.occupied.len(), 5);
        assert_eq!(
            report.occupied.iter().filter(|&&d| d == day(2024, 6, 12)).count(),
            1
        );
    }

    #[test_log::test]
    fn reservation_order_should_not_change_range_availability() {
        let reservations = vec![
            RawReservation::new("2024-06-01", "2024-06-03"),
            RawReservation::new("2024-06-10", "2024-06-15"),
            RawReservation::new("2024-06-20", "2024-06-21"),
            RawReservation::new("2024-06-14", "2024-06-18"),
        ];
        let proposals = [
            (day(2024, 6, 4), day(2024, 6, 9)),
            (day(2024, 6, 16), day(2024, 6, 19)),
            (day(2024, 6, 22), day(2024, 6, 30)),
        ];

        let expected = proposals
            .iter()
            .map(|&(start, end)| {
                is_range_available(start, end, &build_occupied_set(&reservations).occupied).unwrap()
            })
            .collect::<Vec<_>>();

        assert_eq!(expected, vec![true, false, true]);

        for shuffled in reservations.iter().cloned().permutations(reservations.len()) {
            let occupied = build_occupied_set(&shuffled).occupied;
            let results = proposals
                .iter()
                .map(|&(start, end)| is_range_available(start, end, &occupied).unwrap())
                .collect::<Vec<_>>();

            assert_eq!(results, expected);
        }
    }

    #[test_log::test]
    fn sharing_a_boundary_day_should_be_a_conflict() {
        let occupied = build_occupied_set(&june_10_to_15()).occupied;

        let result = is_range_available(day(2024, 6, 15), day(2024, 6, 20), &occupied);

        assert_eq!(result, Ok(false));
    }

    #[test_log::test]
    fn checkout_day_should_not_be_free_for_a_new_checkin() {
        let occupied = build_occupied_set(&june_10_to_15()).occupied;

        assert!(!is_day_available(day(2024, 6, 15), &occupied));
        assert_eq!(
            is_range_available(day(2024, 6, 5), day(2024, 6, 10), &occupied),
            Ok(false)
        );
        assert_eq!(
            is_range_available(day(2024, 6, 16), day(2024, 6, 20), &occupied),
            Ok(true)
        );
    }

    #[test_log::test]
    fn when_proposed_range_is_inverted_should_return_an_error() {
        let occupied = build_occupied_set(&june_10_to_15()).occupied;

        let result = is_range_available(day(2024, 6, 20), day(2024, 6, 16), &occupied);

        assert!(matches!(result, Err(AvailabilityError::InvalidRange { .. })));
    }

    #[test_log::test]
    fn malformed_records_should_be_skipped_and_reported() {
        let reservations = vec![
            RawReservation::new("bad", "2024-06-15"),
            RawReservation::new("2024-07-01", "2024-07-03"),
        ];

        let report = build_occupied_set(&reservations);

        assert_eq!(
            report.occupied.iter().copied().collect::<Vec<_>>(),
            vec![day(2024, 7, 1), day(2024, 7, 2), day(2024, 7, 3)]
        );
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 0);
        assert_eq!(report.skipped[0].field, Some(DateField::DateFrom));
    }

    #[test_log::test]
    fn missing_and_inverted_records_should_be_skipped() {
        let reservations = vec![
            RawReservation {
                label: Some("no end".to_string()),
                date_from: Some("2024-06-01".to_string()),
                date_to: None,
            },
            RawReservation::new("2024-06-20", "2024-06-18").with_label("inverted"),
            RawReservation::new("2024-06-25", "2024-06-25"),
        ];

        let report = build_occupied_set(&reservations);

        assert_eq!(report.occupied.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].field, Some(DateField::DateTo));
        assert_eq!(report.skipped[0].reason, AvailabilityError::MissingDate);
        assert_eq!(report.skipped[1].field, None);
        assert_eq!(
            report.skipped[1].to_string(),
            "reservation #1 (inverted) was skipped: invalid range: 2024-06-18 is before 2024-06-20"
        );
    }

    #[test_log::test]
    fn past_days_should_still_be_available() {
        let occupied = OccupiedDates::new();
        let today = day(2024, 6, 10);
        let yesterday = day(2024, 6, 9);

        assert!(is_day_available(yesterday, &occupied));
        assert!(!is_selectable(yesterday, today));
        assert!(is_selectable(today, today));
    }

    #[test_log::test]
    fn merging_a_reservation_should_occupy_its_days() {
        let mut occupied = build_occupied_set(&june_10_to_15()).occupied;
        let new_stay = Reservation::new(day(2024, 6, 20), day(2024, 6, 22)).unwrap();

        assert_eq!(is_range_available(day(2024, 6, 20), day(2024, 6, 22), &occupied), Ok(true));

        occupied.merge(&new_stay);

        assert_eq!(
            occupied.conflicts(day(2024, 6, 14), day(2024, 6, 21)),
            Ok(vec![
                day(2024, 6, 14),
                day(2024, 6, 15),
                day(2024, 6, 20),
                day(2024, 6, 21)
            ])
        );
    }

    #[test_log::test]
    fn validated_reservations_should_build_the_same_set() {
        let reservations = [
            Reservation::new(day(2024, 6, 10), day(2024, 6, 15)).unwrap(),
            Reservation::new(day(2024, 6, 14), day(2024, 6, 16)).unwrap(),
        ];

        let occupied = occupied_from_reservations(&reservations);

        assert_eq!(occupied.len(), 7);
        assert_eq!(reservations[0].nights(), 6);
    }

    #[test_log::test]
    fn proposed_range_should_follow_picker_clicks() {
        let mut range = ProposedRange::default();

        range.select(day(2024, 6, 10));
        assert_eq!(range, ProposedRange::new(Some(day(2024, 6, 10)), None));
        assert_eq!(range.validate(), Err(AvailabilityError::IncompleteRange));

        range.select(day(2024, 6, 8));
        assert_eq!(range, ProposedRange::new(Some(day(2024, 6, 8)), None));

        range.select(day(2024, 6, 12));
        assert!(range.is_complete());
        assert_eq!(range.validate().map(|days| days.len()), Ok(5));

        range.select(day(2024, 7, 1));
        assert_eq!(range, ProposedRange::new(Some(day(2024, 7, 1)), None));

        range.reset();
        assert_eq!(range, ProposedRange::default());
    }

    #[test_log::test]
    fn proposed_range_set_directly_should_reject_inverted_days() {
        let range = ProposedRange::new(Some(day(2024, 6, 12)), Some(day(2024, 6, 10)));

        assert!(matches!(
            range.validate(),
            Err(AvailabilityError::InvalidRange { .. })
        ));
    }
}
