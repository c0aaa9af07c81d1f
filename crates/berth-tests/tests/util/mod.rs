use berth_core::{Gender, PassengerFields, Ticket, TicketStatus};
use berth_engine::topology::{CONFIRMED_BERTHS, RAC_SLOTS};
use berth_tests::Api;
use eyre::Result;

/// Passenger without any claim to a lower berth
#[allow(unused)]
pub fn adult(name: impl Into<String>) -> PassengerFields {
    PassengerFields::new(name, 30, Gender::Male, false)
}

/// Books `n` adults one after another, asserting that each gets `status`.
#[allow(unused)]
pub async fn book_adults(api: &Api, n: u32, status: TicketStatus) -> Result<Vec<Ticket>> {
    let mut tickets = Vec::with_capacity(n as usize);
    for i in 0..n {
        let ticket = api.book_ticket(&adult(format!("{status:?} {i}"))).await?.result?;
        assert_eq!(
            ticket.status, status,
            "Booking {i} of {n} must end up {status}, got {ticket}."
        );
        tickets.push(ticket);
    }
    Ok(tickets)
}

/// Fills the coach up to the waiting list: every Confirmed berth and RAC place.
#[allow(unused)]
pub async fn fill_confirmed_and_rac(api: &Api) -> Result<(Vec<Ticket>, Vec<Ticket>)> {
    let confirmed = book_adults(api, CONFIRMED_BERTHS, TicketStatus::Confirmed).await?;
    let rac = book_adults(api, RAC_SLOTS, TicketStatus::Rac).await?;
    Ok((confirmed, rac))
}

/// Active tickets with the given status
#[allow(unused)]
pub async fn with_status(api: &Api, status: TicketStatus) -> Result<Vec<Ticket>> {
    let tickets = api.list_tickets().await?.result?;
    Ok(tickets.into_iter().filter(|t| t.status == status).collect())
}
