//! Implementation of the central database for passengers and tickets

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, SystemTime};

use berth_core::{
    Berth, Passenger, PassengerDetails, PassengerId, Ticket, TicketId, TicketStatus,
};

use crate::classifier::TierCounts;

/// A stored ticket row
///
/// The passenger is referenced by id, [`Database::ticket`] joins it in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketRecord {
    pub id: TicketId,
    pub passenger: PassengerId,
    pub status: TicketStatus,
    pub berth: Option<Berth>,
    pub created_at: SystemTime,
    pub cancelled: bool,
}

impl TicketRecord {
    /// FIFO key within a tier
    #[inline]
    fn queue_key(&self) -> (SystemTime, TicketId) {
        (self.created_at, self.id)
    }
}

/// Filter over ticket rows
///
/// Unset fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub cancelled: Option<bool>,
    pub has_berth: Option<bool>,
    pub berth_number: Option<u32>,
}

impl TicketFilter {
    /// Tickets that have not been cancelled
    pub const fn active() -> Self {
        Self {
            status: None,
            cancelled: Some(false),
            has_berth: None,
            berth_number: None,
        }
    }

    /// Restrict to `status`
    pub const fn status(mut self, status: TicketStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to tickets that hold a berth
    pub const fn with_berth(mut self) -> Self {
        self.has_berth = Some(true);
        self
    }

    /// Restrict to berth `number`
    pub const fn berth_number(mut self, number: u32) -> Self {
        self.berth_number = Some(number);
        self
    }

    fn matches(&self, t: &TicketRecord) -> bool {
        self.status.map_or(true, |s| t.status == s)
            && self.cancelled.map_or(true, |c| t.cancelled == c)
            && self.has_berth.map_or(true, |h| t.berth.is_some() == h)
            && self
                .berth_number
                .map_or(true, |n| t.berth.map(|b| b.number) == Some(n))
    }
}

/// Strictly increasing wall clock
///
/// Two stamps taken from the same clock never compare equal, so the
/// `created_at` order within a tier is total.
#[derive(Clone, Debug)]
struct Clock {
    last: SystemTime,
}

impl Clock {
    fn new() -> Self {
        Self {
            last: SystemTime::UNIX_EPOCH,
        }
    }

    fn now(&mut self) -> SystemTime {
        let now = SystemTime::now();
        self.last = if now > self.last {
            now
        } else {
            self.last + Duration::from_nanos(1)
        };
        self.last
    }
}

/// Row change recorded while a transaction is open
#[derive(Clone, Debug)]
enum Undo {
    InsertedPassenger(PassengerId),
    InsertedTicket(TicketId),
    /// Ticket row as it was before it was handed out for modification
    UpdatedTicket(TicketRecord),
}

/// Undo log of the open transaction
#[derive(Clone, Debug)]
struct Journal {
    entries: Vec<Undo>,
    next_passenger: u64,
    next_ticket: u64,
}

/// Implementation of the central database for passengers and tickets
#[derive(Clone, Debug)]
pub struct Database {
    passengers: BTreeMap<PassengerId, Passenger>,
    tickets: BTreeMap<TicketId, TicketRecord>,
    next_passenger: u64,
    next_ticket: u64,
    clock: Clock,
    journal: Option<Journal>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    /// Create a new, empty [`Database`].
    pub fn new() -> Self {
        Self {
            passengers: BTreeMap::new(),
            tickets: BTreeMap::new(),
            next_passenger: 1,
            next_ticket: 1,
            clock: Clock::new(),
            journal: None,
        }
    }

    /// Run `f` as one all-or-nothing unit.
    ///
    /// If `f` returns [`Err`], every change it made is rolled back. Only the
    /// rows `f` touches are journaled, so the cost does not grow with the
    /// ticket history. A nested call joins the enclosing transaction.
    pub fn transaction<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        if self.journal.is_some() {
            return f(self);
        }
        self.journal = Some(Journal {
            entries: Vec::new(),
            next_passenger: self.next_passenger,
            next_ticket: self.next_ticket,
        });
        let result = f(self);
        if let Some(journal) = self.journal.take() {
            if result.is_err() {
                self.roll_back(journal);
            }
        }
        result
    }

    fn roll_back(&mut self, journal: Journal) {
        for undo in journal.entries.into_iter().rev() {
            match undo {
                Undo::InsertedPassenger(id) => {
                    self.passengers.remove(&id);
                }
                Undo::InsertedTicket(id) => {
                    self.tickets.remove(&id);
                }
                Undo::UpdatedTicket(record) => {
                    self.tickets.insert(record.id, record);
                }
            }
        }
        self.next_passenger = journal.next_passenger;
        self.next_ticket = journal.next_ticket;
    }

    fn log(&mut self, undo: Undo) {
        if let Some(journal) = &mut self.journal {
            journal.entries.push(undo);
        }
    }

    /// Take a fresh timestamp.
    pub fn now(&mut self) -> SystemTime {
        self.clock.now()
    }

    /// Store a passenger.
    pub fn insert_passenger(&mut self, details: PassengerDetails) -> Passenger {
        let id = PassengerId(self.next_passenger);
        self.next_passenger += 1;
        let passenger = Passenger::new(id, details);
        self.passengers.insert(id, passenger.clone());
        self.log(Undo::InsertedPassenger(id));
        passenger
    }

    /// Store a new ticket for `passenger`, stamped with the current time.
    pub fn insert_ticket(
        &mut self,
        passenger: PassengerId,
        status: TicketStatus,
        berth: Option<Berth>,
    ) -> TicketId {
        let id = TicketId(self.next_ticket);
        self.next_ticket += 1;
        let created_at = self.now();
        self.tickets.insert(
            id,
            TicketRecord {
                id,
                passenger,
                status,
                berth,
                created_at,
                cancelled: false,
            },
        );
        self.log(Undo::InsertedTicket(id));
        id
    }

    /// Get a ticket row, cancelled or not.
    pub fn record(&self, id: TicketId) -> Option<&TicketRecord> {
        self.tickets.get(&id)
    }

    /// Get a mutable ticket row, cancelled or not.
    ///
    /// Inside a transaction the row is journaled before it is handed out.
    pub fn record_mut(&mut self, id: TicketId) -> Option<&mut TicketRecord> {
        if let (Some(journal), Some(record)) = (&mut self.journal, self.tickets.get(&id)) {
            journal.entries.push(Undo::UpdatedTicket(record.clone()));
        }
        self.tickets.get_mut(&id)
    }

    /// Get a ticket joined with its passenger, cancelled or not.
    pub fn ticket(&self, id: TicketId) -> Option<Ticket> {
        self.tickets.get(&id).and_then(|t| self.join(t))
    }

    /// Get all tickets matching `filter`, joined with their passengers, in
    /// ascending id order.
    pub fn tickets(&self, filter: &TicketFilter) -> Vec<Ticket> {
        self.query(*filter).filter_map(|t| self.join(t)).collect()
    }

    /// Get a stored passenger.
    pub fn passenger(&self, id: PassengerId) -> Option<&Passenger> {
        self.passengers.get(&id)
    }

    /// Get the number of stored passengers.
    pub fn num_passengers(&self) -> usize {
        self.passengers.len()
    }

    /// Iterate over ticket rows matching `filter` in ascending id order.
    pub fn query(&self, filter: TicketFilter) -> impl Iterator<Item = &TicketRecord> + '_ {
        self.tickets.values().filter(move |t| filter.matches(t))
    }

    /// Count ticket rows matching `filter`.
    pub fn count(&self, filter: &TicketFilter) -> u32 {
        self.query(*filter).count() as u32
    }

    /// Get the ticket row matching `filter` that is first in FIFO order.
    pub fn oldest(&self, filter: &TicketFilter) -> Option<&TicketRecord> {
        self.query(*filter).min_by_key(|t| t.queue_key())
    }

    /// Count active tickets per tier.
    ///
    /// Only berthed Confirmed tickets are counted unless
    /// `children_hold_confirmed` is set.
    pub fn tier_counts(&self, children_hold_confirmed: bool) -> TierCounts {
        let mut confirmed = TicketFilter::active().status(TicketStatus::Confirmed);
        if !children_hold_confirmed {
            confirmed = confirmed.with_berth();
        }
        TierCounts {
            confirmed: self.count(&confirmed),
            rac: self.count(&TicketFilter::active().status(TicketStatus::Rac)),
            waitlisted: self.count(&TicketFilter::active().status(TicketStatus::Waitlisted)),
        }
    }

    /// Berth numbers held by active tickets.
    pub fn occupied_berths(&self) -> BTreeSet<u32> {
        self.query(TicketFilter::active().with_berth())
            .filter_map(|t| t.berth.map(|b| b.number))
            .collect()
    }

    /// Number of active RAC tickets per berth number.
    pub fn rac_occupancy(&self) -> BTreeMap<u32, u32> {
        let mut occupancy = BTreeMap::new();
        let filter = TicketFilter::active().status(TicketStatus::Rac).with_berth();
        for berth in self.query(filter).filter_map(|t| t.berth) {
            *occupancy.entry(berth.number).or_insert(0) += 1;
        }
        occupancy
    }

    fn join(&self, t: &TicketRecord) -> Option<Ticket> {
        let passenger = self.passengers.get(&t.passenger)?.clone();
        Some(Ticket {
            id: t.id,
            passenger,
            status: t.status,
            berth: t.berth,
            created_at: t.created_at,
            cancelled: t.cancelled,
        })
    }
}
