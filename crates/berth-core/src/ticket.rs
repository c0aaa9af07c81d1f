use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Passenger;

/// Identifier of a ticket
///
/// Identifiers are handed out in increasing order, so they also break ties
/// between tickets stamped at the same instant.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TicketId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(TicketId)
    }
}

/// Tier a ticket currently holds
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Guaranteed berth (or none, for a child)
    #[serde(rename = "CNF")]
    Confirmed,
    /// Reservation against cancellation, sharing a side lower berth
    #[serde(rename = "RAC")]
    Rac,
    /// Waiting list, no berth
    #[serde(rename = "WL")]
    Waitlisted,
}

impl TicketStatus {
    /// Short code as used on the wire
    pub fn code(self) -> &'static str {
        match self {
            TicketStatus::Confirmed => "CNF",
            TicketStatus::Rac => "RAC",
            TicketStatus::Waitlisted => "WL",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Physical kind of a berth
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum BerthType {
    /// Lower berth
    #[serde(rename = "LB")]
    LowerBerth,
    /// Middle berth
    #[serde(rename = "MB")]
    MiddleBerth,
    /// Upper berth
    #[serde(rename = "UB")]
    UpperBerth,
    /// Side upper berth
    #[serde(rename = "SU")]
    SideUpper,
    /// Side lower berth, only ever used for RAC
    #[serde(rename = "SL")]
    SideLower,
}

impl BerthType {
    /// Short code as used on the wire
    pub fn code(self) -> &'static str {
        match self {
            BerthType::LowerBerth => "LB",
            BerthType::MiddleBerth => "MB",
            BerthType::UpperBerth => "UB",
            BerthType::SideUpper => "SU",
            BerthType::SideLower => "SL",
        }
    }
}

impl fmt::Display for BerthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A concrete berth: its number and its type
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Berth {
    /// Berth number in `1..=72`
    pub number: u32,
    /// Berth type derived from the number
    pub kind: BerthType,
}

impl fmt::Display for Berth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.kind)
    }
}

/// A ticket together with its passenger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TicketRepr", try_from = "TicketRepr")]
pub struct Ticket {
    /// Identifier
    pub id: TicketId,
    /// The passenger travelling on this ticket
    pub passenger: Passenger,
    /// Current tier
    pub status: TicketStatus,
    /// Assigned berth, if any
    pub berth: Option<Berth>,
    /// Position within the tier's FIFO queue
    pub created_at: SystemTime,
    /// Whether the ticket has been cancelled
    pub cancelled: bool,
}

impl Ticket {
    /// Number of the assigned berth
    #[inline]
    pub fn berth_number(&self) -> Option<u32> {
        self.berth.map(|b| b.number)
    }

    /// Type of the assigned berth
    #[inline]
    pub fn berth_type(&self) -> Option<BerthType> {
        self.berth.map(|b| b.kind)
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.berth {
            Some(berth) => write!(f, "{} - {} (Berth: {berth})", self.passenger.name, self.status),
            None => write!(f, "{} - {} (Berth: none)", self.passenger.name, self.status),
        }
    }
}

/// Flat wire representation: the berth is split into two nullable columns
/// and `created_at` is an RFC 3339 timestamp
#[derive(Serialize, Deserialize)]
struct TicketRepr {
    id: TicketId,
    passenger: Passenger,
    status: TicketStatus,
    berth_number: Option<u32>,
    berth_type: Option<BerthType>,
    created_at: DateTime<Utc>,
    cancelled: bool,
}

impl From<Ticket> for TicketRepr {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            berth_number: t.berth_number(),
            berth_type: t.berth_type(),
            passenger: t.passenger,
            status: t.status,
            created_at: DateTime::from(t.created_at),
            cancelled: t.cancelled,
        }
    }
}

impl TryFrom<TicketRepr> for Ticket {
    type Error = String;

    fn try_from(r: TicketRepr) -> Result<Self, Self::Error> {
        let berth = match (r.berth_number, r.berth_type) {
            (Some(number), Some(kind)) => Some(Berth { number, kind }),
            (None, None) => None,
            _ => return Err("berth_number and berth_type must both be set or both be null".into()),
        };
        Ok(Self {
            id: r.id,
            passenger: r.passenger,
            status: r.status,
            berth,
            created_at: SystemTime::from(r.created_at),
            cancelled: r.cancelled,
        })
    }
}

/// First tier that still has room
///
/// At most one field is set. All fields are [`None`] when everything is sold
/// out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// Remaining Confirmed berths
    pub available: Option<u32>,
    /// Number the next RAC ticket would get
    pub rac: Option<u32>,
    /// Number the next waiting list ticket would get
    pub waiting_list: Option<u32>,
}

impl Availability {
    /// No tier has room
    #[inline]
    pub fn is_sold_out(&self) -> bool {
        self.available.is_none() && self.rac.is_none() && self.waiting_list.is_none()
    }
}

/// A single upgrade performed while cascading a cancellation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// The promoted ticket
    pub ticket: TicketId,
    /// Tier before the promotion
    pub from: TicketStatus,
    /// Tier after the promotion
    pub to: TicketStatus,
    /// Berth assigned by the promotion
    pub berth: Berth,
}

/// Outcome of a cancellation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    /// The cancelled ticket
    pub ticket: TicketId,
    /// Tier the ticket held before it was cancelled
    pub prior_status: TicketStatus,
    /// Promotions in the order they were applied
    pub promotions: Vec<Promotion>,
}
