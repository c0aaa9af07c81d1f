//! 🏗 Infrastructure shared by the berth reservation system: domain types,
//! errors, configuration and request handling.
#![warn(missing_docs)]

mod error;
mod passenger;
mod request;
mod ticket;

use serde::{Deserialize, Serialize};

pub use error::{BookingError, ValidationError};
pub use passenger::{
    Gender, Passenger, PassengerDetails, PassengerFields, PassengerId, CHILD_AGE_LIMIT,
    MAX_NAME_LEN,
};
pub use request::{RawRequest, Request, RequestHandler, RequestKind, RequestMethod};
pub use ticket::{
    Availability, Berth, BerthType, Cancellation, Promotion, Ticket, TicketId, TicketStatus,
};

/// Configuration of the berth reservation system
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Re-stamp `created_at` when a waitlisted ticket is promoted to RAC
    ///
    /// The promoted ticket then queues behind every ticket that already held
    /// RAC when it comes to the next RAC → Confirmed promotion.
    pub restamp_on_promotion: bool,

    /// Count berth-less (child) Confirmed tickets against the Confirmed
    /// capacity
    pub children_hold_confirmed: bool,

    /// Upper bound in milliseconds for acquiring the booking lock
    pub lock_timeout_ms: u64,

    /// Seed for the berth selection random source
    ///
    /// With [`None`], the source is seeded from the operating system.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            restamp_on_promotion: true,
            children_hold_confirmed: false,
            lock_timeout_ms: 5_000,
            seed: None,
        }
    }
}

impl Config {
    /// Lock timeout as a [`std::time::Duration`]
    #[inline]
    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_timeout_ms)
    }
}
