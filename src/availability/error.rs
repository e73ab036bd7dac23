use chrono::NaiveDate;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    #[error("invalid range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("range is incomplete: both a start and an end day are required")]
    IncompleteRange,

    #[error("date is missing")]
    MissingDate,

    #[error("malformed date '{0}'")]
    MalformedDate(String),
}

/// Which side of a reservation a warning refers to.
#[derive(strum::IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    #[strum(serialize = "dateFrom")]
    DateFrom,
    #[strum(serialize = "dateTo")]
    DateTo,
}

/// A reservation record that was left out of the occupied set.
///
/// `field` is `None` when both dates parsed but the range itself is inverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedDateWarning {
    pub index: usize,
    pub label: Option<String>,
    pub field: Option<DateField>,
    pub reason: AvailabilityError,
}

impl Display for MalformedDateWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "reservation #{}", self.index)?;

        if let Some(label) = &self.label {
            write!(f, " ({})", label)?;
        }

        match self.field {
            Some(field) => {
                let field: &'static str = field.into();
                write!(f, " has an unusable {}: {}", field, self.reason)
            }
            None => write!(f, " was skipped: {}", self.reason),
        }
    }
}
