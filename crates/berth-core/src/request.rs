use std::io;

use serde::Serialize;
use uuid::Uuid;

use crate::{BookingError, TicketId};

/// Kind of the request
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum RequestKind {
    /// Report the first tier that still has room
    Availability,

    /// Book a ticket for the passenger given in the JSON payload
    BookTicket,

    /// Cancel the ticket addressed by the URL
    ///
    /// Triggers the promotion cascade.
    CancelTicket,

    /// List all active tickets
    ListTickets,

    /// Retrieve a single active ticket
    GetTicket,

    /// Useful for sending information for debugging
    Debug,
}

/// Request sent by a client
pub struct Request {
    kind: RequestKind,
    ticket: Option<TicketId>,
    request_id: Uuid,
    raw: Box<dyn RawRequest + Send>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("kind", &self.kind)
            .field("ticket", &self.ticket)
            .field("request_id", &self.request_id)
            .field("raw", &format_args!(".."))
            .finish()
    }
}

/// HTTP request method
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum RequestMethod {
    /// GET request
    Get,
    /// POST request, may have a payload
    Post,
}

/// Interface for handling requests from a client
pub trait RequestHandler {
    /// Handle a request
    ///
    /// This method may be called concurrently from different threads.
    fn handle(&self, request: Request);

    /// Shut the system down
    fn shutdown(self);
}

/// A raw request, implemented by the transport
pub trait RawRequest {
    /// Get the URL
    fn url(&self) -> &str;
    /// Get the request method
    fn method(&self) -> RequestMethod;

    /// Read the request body as string
    fn read_string(&mut self) -> io::Result<String>;

    /// Respond with a JSON document and the given status code
    fn respond_with_json(self: Box<Self>, status: u16, body: String, request_id: Uuid);
    /// Respond with plain text
    fn respond_with_string(self: Box<Self>, s: String, request_id: Uuid);
}

#[derive(Serialize)]
struct Detail<'a> {
    detail: &'a str,
}

impl Request {
    /// Get the request's kind
    #[inline]
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Ticket addressed by the URL, if any
    #[inline]
    pub fn ticket_id(&self) -> Option<TicketId> {
        self.ticket
    }

    /// Identifier used to correlate the request with log output
    #[inline]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Get the request URL
    #[inline]
    pub fn url(&self) -> &str {
        self.raw.url()
    }

    /// Get the request method
    #[inline]
    pub fn method(&self) -> RequestMethod {
        self.raw.method()
    }

    /// Read the payload as a UTF-8 string
    ///
    /// This method has side effects and should be called only once per
    /// request.
    #[inline]
    pub fn read_string(&mut self) -> io::Result<String> {
        self.raw.read_string()
    }

    /// Respond with `value` serialized as JSON
    ///
    /// This method blocks until the response has been sent.
    pub fn respond_with_json<T: Serialize + ?Sized>(self, status: u16, value: &T) {
        match serde_json::to_string(value) {
            Ok(body) => self.raw.respond_with_json(status, body, self.request_id),
            Err(err) => self.respond_with_detail(500, &format!("serialization failed: {err}")),
        }
    }

    /// Respond with `{"detail": msg}`
    pub fn respond_with_detail(self, status: u16, msg: &str) {
        let body = serde_json::to_string(&Detail { detail: msg })
            .unwrap_or_else(|_| String::from("{}"));
        self.raw.respond_with_json(status, body, self.request_id);
    }

    /// Report `err` with the status code belonging to its kind
    #[inline]
    pub fn respond_with_error(self, err: &BookingError) {
        self.respond_with_detail(err.status_code(), &err.to_string());
    }

    /// Respond with an arbitrary string
    #[inline]
    pub fn respond_with_string(self, s: impl Into<String>) {
        self.raw.respond_with_string(s.into(), self.request_id);
    }

    /// Create a new request from a [`RawRequest`]
    #[inline]
    pub fn from_raw(
        kind: RequestKind,
        ticket: Option<TicketId>,
        request_id: Uuid,
        raw: Box<dyn RawRequest + Send>,
    ) -> Self {
        Self {
            kind,
            ticket,
            request_id,
            raw,
        }
    }
}
