//! Decides which tier a new booking falls into

use berth_core::{Availability, TicketStatus};

use crate::topology::{CONFIRMED_BERTHS, RAC_SLOTS, WAITING_LIST_SLOTS};

/// Active ticket counts per tier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TierCounts {
    /// Confirmed tickets counted against the Confirmed capacity
    pub confirmed: u32,
    /// RAC tickets
    pub rac: u32,
    /// Waitlisted tickets
    pub waitlisted: u32,
}

/// Outcome of classifying a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Confirmed,
    Rac,
    Waitlisted,
    /// No tier has room
    Rejected,
}

impl Tier {
    /// Ticket status for an accepted booking
    pub fn status(self) -> Option<TicketStatus> {
        match self {
            Tier::Confirmed => Some(TicketStatus::Confirmed),
            Tier::Rac => Some(TicketStatus::Rac),
            Tier::Waitlisted => Some(TicketStatus::Waitlisted),
            Tier::Rejected => None,
        }
    }
}

/// Classify a booking against the current counts
///
/// Tiers are tried in order Confirmed, RAC, waiting list.
pub fn classify(counts: TierCounts) -> Tier {
    if counts.confirmed < CONFIRMED_BERTHS {
        Tier::Confirmed
    } else if counts.rac < RAC_SLOTS {
        Tier::Rac
    } else if counts.waitlisted < WAITING_LIST_SLOTS {
        Tier::Waitlisted
    } else {
        Tier::Rejected
    }
}

/// Report the first tier with room, with the same precedence as [`classify`]
pub fn availability(counts: TierCounts) -> Availability {
    let mut report = Availability::default();
    match classify(counts) {
        Tier::Confirmed => report.available = Some(CONFIRMED_BERTHS - counts.confirmed),
        Tier::Rac => report.rac = Some(counts.rac + 1),
        Tier::Waitlisted => report.waiting_list = Some(counts.waitlisted + 1),
        Tier::Rejected => {}
    }
    report
}
