use std::time::Duration;

use thiserror::Error;

use crate::TicketId;

/// Reasons why passenger data is rejected before anything is stored
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The name is empty or consists of whitespace only
    #[error("name must not be empty")]
    EmptyName,
    /// The name exceeds the column width
    #[error("name has {len} characters, at most {max} are allowed")]
    NameTooLong {
        /// Submitted length
        len: usize,
        /// Maximum length
        max: usize,
    },
    /// The age is negative or out of range
    #[error("age {0} is not a valid age")]
    InvalidAge(i64),
    /// The gender is neither male nor female
    #[error("gender {0:?} is not one of M, F")]
    UnknownGender(String),
}

/// Errors of the booking and cancellation operations
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BookingError {
    /// Malformed passenger input
    #[error("invalid passenger: {0}")]
    Validation(#[from] ValidationError),

    /// Confirmed, RAC and the waiting list are all full
    #[error("No tickets available")]
    CapacityExceeded,

    /// The ticket does not exist or was already cancelled
    #[error("ticket {0} not found")]
    NotFound(TicketId),

    /// The allocator found no berth although the classifier promised one
    ///
    /// This indicates a bookkeeping bug. The transaction is aborted and the
    /// operation must not be retried.
    #[error("internal consistency violated: {0}")]
    InternalConsistency(String),

    /// The booking lock could not be acquired in time
    #[error("booking office busy, lock not acquired within {0:?}")]
    Busy(Duration),
}

impl BookingError {
    /// HTTP status code used when reporting this error to a client
    pub fn status_code(&self) -> u16 {
        match self {
            BookingError::Validation(_) | BookingError::CapacityExceeded => 400,
            BookingError::NotFound(_) => 404,
            BookingError::InternalConsistency(_) => 500,
            BookingError::Busy(_) => 503,
        }
    }

    /// Whether the error is a programming-invariant violation
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, BookingError::InternalConsistency(_))
    }
}
