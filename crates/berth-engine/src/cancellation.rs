//! Cancellation and the promotion cascade
//!
//! Freeing a confirmed berth pulls the oldest RAC ticket up to it, and the
//! side lower place that ticket leaves behind goes to the oldest waitlisted
//! ticket. Freeing a RAC place only pulls up the waiting list.

use berth_core::{
    Berth, BookingError, Cancellation, Config, Promotion, TicketId, TicketStatus,
};
use tracing::{debug, info};

use crate::database::{Database, TicketFilter};

/// Cancel ticket `id` and cascade promotions.
///
/// The caller must hold the booking lock. On error, nothing is changed.
pub fn cancel(
    database: &mut Database,
    config: &Config,
    id: TicketId,
) -> Result<Cancellation, BookingError> {
    database.transaction(|tx| {
        let record = tx
            .record_mut(id)
            .filter(|t| !t.cancelled)
            .ok_or(BookingError::NotFound(id))?;
        record.cancelled = true;
        let (prior_status, freed) = (record.status, record.berth);

        let mut promotions = Vec::new();
        match (prior_status, freed) {
            (TicketStatus::Confirmed, Some(berth)) => {
                promote_rac_to_confirmed(tx, config, berth, &mut promotions)?
            }
            (TicketStatus::Rac, Some(berth)) => {
                promote_waitlisted_to_rac(tx, config, berth, &mut promotions)
            }
            (TicketStatus::Rac, None) => {
                return Err(BookingError::InternalConsistency(format!(
                    "RAC ticket {id} holds no berth"
                )))
            }
            // A child's ticket frees no berth and nothing queues behind the
            // waiting list.
            (TicketStatus::Confirmed, None) | (TicketStatus::Waitlisted, _) => {}
        }

        info!(ticket = %id, status = %prior_status, promotions = promotions.len(), "ticket cancelled");
        Ok(Cancellation {
            ticket: id,
            prior_status,
            promotions,
        })
    })
}

/// Seat the oldest RAC ticket on the freed confirmed `berth`.
///
/// Its side lower place is handed to the waiting list first.
fn promote_rac_to_confirmed(
    tx: &mut Database,
    config: &Config,
    berth: Berth,
    promotions: &mut Vec<Promotion>,
) -> Result<(), BookingError> {
    let Some(rac) = tx.oldest(&TicketFilter::active().status(TicketStatus::Rac)) else {
        debug!(%berth, "no RAC ticket to promote, berth stays free");
        return Ok(());
    };
    let rac_id = rac.id;
    let vacated = rac.berth.ok_or_else(|| {
        BookingError::InternalConsistency(format!("RAC ticket {rac_id} holds no berth"))
    })?;

    promote_waitlisted_to_rac(tx, config, vacated, promotions);

    if let Some(rac) = tx.record_mut(rac_id) {
        rac.status = TicketStatus::Confirmed;
        rac.berth = Some(berth);
    }
    info!(ticket = %rac_id, %berth, "RAC ticket confirmed");
    promotions.push(Promotion {
        ticket: rac_id,
        from: TicketStatus::Rac,
        to: TicketStatus::Confirmed,
        berth,
    });
    Ok(())
}

/// Move the oldest waitlisted ticket onto the freed RAC `berth`.
fn promote_waitlisted_to_rac(
    tx: &mut Database,
    config: &Config,
    berth: Berth,
    promotions: &mut Vec<Promotion>,
) {
    let Some(wl_id) = tx
        .oldest(&TicketFilter::active().status(TicketStatus::Waitlisted))
        .map(|t| t.id)
    else {
        debug!(%berth, "waiting list empty, RAC place stays free");
        return;
    };

    let stamp = config.restamp_on_promotion.then(|| tx.now());
    if let Some(wl) = tx.record_mut(wl_id) {
        wl.status = TicketStatus::Rac;
        wl.berth = Some(berth);
        if let Some(stamp) = stamp {
            wl.created_at = stamp;
        }
    }
    info!(ticket = %wl_id, %berth, "waitlisted ticket moved to RAC");
    promotions.push(Promotion {
        ticket: wl_id,
        from: TicketStatus::Waitlisted,
        to: TicketStatus::Rac,
        berth,
    });
}
