//! Implementation of the booking office
//!
//! The office owns the database and serializes every operation on it behind
//! one lock, held for the whole booking or cancellation.
use berth_core::{
    Availability, BookingError, Cancellation, Config, PassengerFields, Request, RequestHandler,
    RequestKind, Ticket, TicketId,
};
use parking_lot::{Mutex, MutexGuard};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tracing::{error, info_span, warn};

use crate::classifier;
use crate::database::{Database, TicketFilter};
use crate::{booking, cancellation};

/// State guarded by the booking lock
struct Desk {
    database: Database,
    rng: Box<dyn RngCore + Send>,
}

/// Implementation of the booking office
///
/// This struct implements the [`RequestHandler`] trait and can be shared
/// between any number of request threads.
pub struct BookingOffice {
    config: Config,
    desk: Mutex<Desk>,
}

#[derive(Serialize)]
struct Message {
    message: &'static str,
}

impl BookingOffice {
    /// Create a new [`BookingOffice`]
    ///
    /// Berths are picked with a generator seeded from `config.seed`, or from
    /// the operating system if no seed is given.
    pub fn new(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, Box::new(rng))
    }

    /// Create a new [`BookingOffice`] picking berths with `rng`
    pub fn with_rng(config: &Config, rng: Box<dyn RngCore + Send>) -> Self {
        Self {
            config: *config,
            desk: Mutex::new(Desk {
                database: Database::new(),
                rng,
            }),
        }
    }

    /// Acquire the booking lock, waiting at most the configured timeout
    fn desk(&self) -> Result<MutexGuard<'_, Desk>, BookingError> {
        let timeout = self.config.lock_timeout();
        self.desk.try_lock_for(timeout).ok_or_else(|| {
            warn!(?timeout, "booking lock not acquired in time");
            BookingError::Busy(timeout)
        })
    }

    /// Book a ticket for the passenger described by `fields`
    pub fn book(&self, fields: PassengerFields) -> Result<Ticket, BookingError> {
        let mut desk = self.desk()?;
        let Desk { database, rng } = &mut *desk;
        booking::book(database, rng.as_mut(), &self.config, fields).map_err(report)
    }

    /// Cancel ticket `id` and promote waiting tickets
    pub fn cancel(&self, id: TicketId) -> Result<Cancellation, BookingError> {
        let mut desk = self.desk()?;
        cancellation::cancel(&mut desk.database, &self.config, id).map_err(report)
    }

    /// First tier that still has room
    pub fn availability(&self) -> Result<Availability, BookingError> {
        let desk = self.desk()?;
        let counts = desk
            .database
            .tier_counts(self.config.children_hold_confirmed);
        Ok(classifier::availability(counts))
    }

    /// Get an active ticket
    pub fn ticket(&self, id: TicketId) -> Result<Option<Ticket>, BookingError> {
        let desk = self.desk()?;
        Ok(desk.database.ticket(id).filter(|t| !t.cancelled))
    }

    /// Get all active tickets in booking order
    pub fn tickets(&self) -> Result<Vec<Ticket>, BookingError> {
        let desk = self.desk()?;
        Ok(desk.database.tickets(&TicketFilter::active()))
    }
}

/// Log invariant violations loudly before handing them to the caller
fn report(err: BookingError) -> BookingError {
    if err.is_fatal() {
        error!(%err, "transaction aborted");
    }
    err
}

impl RequestHandler for BookingOffice {
    fn handle(&self, mut rq: Request) {
        let span = info_span!(
            "request",
            id = %rq.request_id(),
            kind = ?rq.kind(),
            method = ?rq.method(),
            url = rq.url(),
        );
        let _enter = span.enter();

        match rq.kind() {
            RequestKind::Availability => match self.availability() {
                Ok(report) if report.is_sold_out() => rq.respond_with_json(
                    200,
                    &Message {
                        message: "No tickets available",
                    },
                ),
                Ok(report) => rq.respond_with_json(200, &report),
                Err(err) => rq.respond_with_error(&err),
            },
            RequestKind::BookTicket => {
                let fields = match rq.read_string() {
                    Ok(body) => serde_json::from_str::<PassengerFields>(&body),
                    Err(err) => {
                        rq.respond_with_detail(400, &format!("could not read body: {err}"));
                        return;
                    }
                };
                match fields {
                    Ok(fields) => match self.book(fields) {
                        Ok(ticket) => rq.respond_with_json(201, &ticket),
                        Err(err) => rq.respond_with_error(&err),
                    },
                    Err(err) => rq.respond_with_detail(400, &format!("malformed passenger: {err}")),
                }
            }
            RequestKind::CancelTicket => match rq.ticket_id() {
                Some(id) => match self.cancel(id) {
                    Ok(_) => rq.respond_with_detail(200, "Ticket cancelled successfully"),
                    Err(err) => rq.respond_with_error(&err),
                },
                None => rq.respond_with_detail(400, "No ticket id provided!"),
            },
            RequestKind::ListTickets => match self.tickets() {
                Ok(tickets) => rq.respond_with_json(200, &tickets),
                Err(err) => rq.respond_with_error(&err),
            },
            RequestKind::GetTicket => match rq.ticket_id() {
                Some(id) => match self.ticket(id) {
                    Ok(Some(ticket)) => rq.respond_with_json(200, &ticket),
                    Ok(None) => rq.respond_with_error(&BookingError::NotFound(id)),
                    Err(err) => rq.respond_with_error(&err),
                },
                None => rq.respond_with_detail(400, "No ticket id provided!"),
            },
            RequestKind::Debug => {
                let summary = match self.availability() {
                    Ok(report) => format!("{report:?}"),
                    Err(err) => err.to_string(),
                };
                rq.respond_with_string(summary);
            }
        }
    }

    fn shutdown(self) {
        // nothing to do, the database lives in memory
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use berth_core::{Gender, RawRequest, RequestMethod, TicketStatus};
    use rand::rngs::mock::StepRng;
    use uuid::Uuid;

    use super::*;
    use crate::topology::{CONFIRMED_BERTHS, RAC_SLOTS, WAITING_LIST_SLOTS};

    #[test]
    fn injected_source_decides_the_berth() {
        let office = BookingOffice::with_rng(&Config::default(), Box::new(StepRng::new(0, 0)));
        let senior = PassengerFields::new("Old", 71, Gender::Male, false);
        assert_eq!(office.book(senior).unwrap().berth_number(), Some(1));
    }

    #[test]
    fn same_seed_same_berths() {
        let config = Config {
            seed: Some(42),
            ..Config::default()
        };
        let berths = || {
            let office = BookingOffice::new(&config);
            (0..10)
                .map(|i| {
                    let p = PassengerFields::new(format!("p{i}"), 30, Gender::Female, false);
                    office.book(p).unwrap().berth_number()
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(berths(), berths());
    }

    #[test]
    fn held_lock_times_out() {
        let config = Config {
            lock_timeout_ms: 10,
            ..Config::default()
        };
        let office = BookingOffice::new(&config);
        let _held = office.desk.lock();
        assert_eq!(
            office.availability(),
            Err(BookingError::Busy(Duration::from_millis(10)))
        );
    }

    #[test]
    fn concurrent_bookings_respect_capacity() {
        let office = Arc::new(BookingOffice::new(&Config::default()));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let office = office.clone();
                thread::spawn(move || {
                    (0..20)
                        .filter_map(|i| {
                            let p = PassengerFields::new(format!("{t}-{i}"), 30, Gender::Male, false);
                            office.book(p).ok()
                        })
                        .count() as u32
                })
            })
            .collect();
        let booked: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(booked, CONFIRMED_BERTHS + RAC_SLOTS + WAITING_LIST_SLOTS);

        let tickets = office.tickets().unwrap();
        let confirmed = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Confirmed)
            .count() as u32;
        assert_eq!(confirmed, CONFIRMED_BERTHS);
        assert!(office.availability().unwrap().is_sold_out());
    }

    type Answer = Arc<Mutex<Option<(u16, String)>>>;

    /// Transport that keeps the answer for inspection
    struct Recorder {
        url: String,
        method: RequestMethod,
        body: Option<String>,
        answer: Answer,
    }

    impl RawRequest for Recorder {
        fn url(&self) -> &str {
            &self.url
        }

        fn method(&self) -> RequestMethod {
            self.method
        }

        fn read_string(&mut self) -> std::io::Result<String> {
            Ok(self.body.take().unwrap_or_default())
        }

        fn respond_with_json(self: Box<Self>, status: u16, body: String, _: Uuid) {
            *self.answer.lock() = Some((status, body));
        }

        fn respond_with_string(self: Box<Self>, s: String, _: Uuid) {
            *self.answer.lock() = Some((200, s));
        }
    }

    fn serve(
        office: &BookingOffice,
        kind: RequestKind,
        ticket: Option<TicketId>,
        body: Option<String>,
    ) -> (u16, String) {
        let (url, method) = match kind {
            RequestKind::BookTicket => ("/api/tickets/book_ticket/".into(), RequestMethod::Post),
            RequestKind::CancelTicket => (
                format!("/api/tickets/{}/cancel_ticket/", ticket.unwrap()),
                RequestMethod::Post,
            ),
            _ => ("/api/tickets/".into(), RequestMethod::Get),
        };
        let answer = Answer::default();
        let raw = Recorder {
            url,
            method,
            body,
            answer: answer.clone(),
        };
        office.handle(Request::from_raw(kind, ticket, Uuid::new_v4(), Box::new(raw)));
        let answer = answer.lock().take();
        answer.expect("the office must answer every request")
    }

    #[test]
    fn handler_books_and_cancels_over_json() {
        let office = BookingOffice::with_rng(&Config::default(), Box::new(StepRng::new(0, 0)));
        let fields = PassengerFields::new("Meera", 66, Gender::Female, false);

        let (status, body) = serve(
            &office,
            RequestKind::BookTicket,
            None,
            Some(serde_json::to_string(&fields).unwrap()),
        );
        assert_eq!(status, 201);
        let ticket: Ticket = serde_json::from_str(&body).unwrap();
        assert_eq!(ticket.berth_number(), Some(1));

        let (status, body) = serve(&office, RequestKind::CancelTicket, Some(ticket.id), None);
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"detail":"Ticket cancelled successfully"}"#);

        let (status, _) = serve(&office, RequestKind::GetTicket, Some(ticket.id), None);
        assert_eq!(status, 404);

        let (status, _) = serve(&office, RequestKind::BookTicket, None, Some("{".into()));
        assert_eq!(status, 400);
        assert!(office.tickets().unwrap().is_empty());
    }
}
