//! Booking workflow: validation, classification, allocation, persistence

use berth_core::{BookingError, Config, PassengerFields, Ticket, TicketStatus};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::allocator;
use crate::classifier::{self, Tier};
use crate::database::Database;

/// Book a ticket for the passenger described by `fields`.
///
/// The caller must hold the booking lock. Either a passenger and a ticket
/// are stored, or nothing is.
pub fn book<R: Rng + ?Sized>(
    database: &mut Database,
    rng: &mut R,
    config: &Config,
    fields: PassengerFields,
) -> Result<Ticket, BookingError> {
    let details = fields.validate().map_err(|err| {
        debug!(%err, "passenger rejected");
        BookingError::from(err)
    })?;

    database.transaction(|tx| {
        let passenger = tx.insert_passenger(details);

        if passenger.is_child() {
            let id = tx.insert_ticket(passenger.id, TicketStatus::Confirmed, None);
            info!(ticket = %id, age = passenger.age, "child booked without berth");
            return stored(tx, id);
        }

        let counts = tx.tier_counts(config.children_hold_confirmed);
        let tier = classifier::classify(counts);
        debug!(?counts, ?tier, "booking classified");

        let berth = match tier {
            Tier::Confirmed => Some(allocator::allocate_confirmed(
                &tx.occupied_berths(),
                &passenger,
                rng,
            )?),
            Tier::Rac => Some(allocator::allocate_rac(&tx.rac_occupancy())?),
            Tier::Waitlisted => None,
            Tier::Rejected => {
                warn!(?counts, "booking rejected, no capacity left");
                return Err(BookingError::CapacityExceeded);
            }
        };
        let status = tier
            .status()
            .ok_or_else(|| BookingError::InternalConsistency(format!("{tier:?} has no status")))?;

        let id = tx.insert_ticket(passenger.id, status, berth);
        info!(ticket = %id, %status, berth = ?berth, "ticket booked");
        stored(tx, id)
    })
}

fn stored(database: &Database, id: berth_core::TicketId) -> Result<Ticket, BookingError> {
    database.ticket(id).ok_or_else(|| {
        BookingError::InternalConsistency(format!("ticket {id} vanished right after insertion"))
    })
}
