//! 🏗 HTTP request implementation

use std::io;
use std::io::{Read, Write};

use berth_core::{RequestKind, TicketId};
use tiny_http::{Header, Response};
use tracing::debug;
use uuid::Uuid;

/// Length of any hyphenated UUID
const UUID_LEN: usize = b"a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8".len();

const ROUTES: &str = "🚂 could not find the service you are looking for!

Valid requests are:
  GET  /api/tickets/
  GET  /api/tickets/available/
  POST /api/tickets/book_ticket/
  GET  /api/tickets/<id>/
  POST /api/tickets/<id>/cancel_ticket/
  GET  /api/debug(.*)
  POST /api/debug(.*)";

struct HTTPRequest(tiny_http::Request);

impl berth_core::RawRequest for HTTPRequest {
    fn url(&self) -> &str {
        self.0.url()
    }

    fn method(&self) -> berth_core::RequestMethod {
        match self.0.method() {
            tiny_http::Method::Post => berth_core::RequestMethod::Post,
            _ => berth_core::RequestMethod::Get,
        }
    }

    fn read_string(&mut self) -> io::Result<String> {
        let mut s = String::with_capacity(self.0.body_length().unwrap_or(0));
        self.0.as_reader().read_to_string(&mut s)?;
        Ok(s)
    }

    fn respond_with_json(self: Box<Self>, status: u16, body: String, request_id: Uuid) {
        let mut res = Response::from_string(body).with_status_code(status);
        res.add_header(header(b"Content-Type", b"application/json"));
        self.respond(res, request_id)
    }

    fn respond_with_string(self: Box<Self>, s: String, request_id: Uuid) {
        self.respond(
            Response::from_string(s).with_status_code(200),
            request_id,
        )
    }
}

impl HTTPRequest {
    /// Add HTTP headers (CORS, X-Request-Id) to `res` and send it
    fn respond<R: Read>(self, mut res: Response<R>, request_id: Uuid) {
        add_response_cors_headers(&mut res);

        let mut rid = Vec::<u8>::with_capacity(UUID_LEN);
        // Writing into a Vec cannot fail
        let _ = write!(&mut rid, "{}", request_id.hyphenated());
        res.add_header(header(b"X-Request-Id", &rid));

        send(self.0, res);
    }
}

/// Map a URL below `/api/tickets` to the request kind and addressed ticket
///
/// Trailing slashes are optional. [`None`] means no such route.
fn route(
    method: &tiny_http::Method,
    url: &str,
) -> Option<Result<(RequestKind, Option<TicketId>), ()>> {
    use tiny_http::Method::*;

    let path = url.split('?').next().unwrap_or("");
    let rest = path.strip_prefix("/api/tickets")?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    let routed: (RequestKind, Option<TicketId>) = match (method, segments.as_slice()) {
        (Get, []) => (RequestKind::ListTickets, None),
        (Get, ["available"]) => (RequestKind::Availability, None),
        (Post, ["book_ticket"]) => (RequestKind::BookTicket, None),
        (Get, [id]) => (RequestKind::GetTicket, Some(id.parse().ok()?)),
        (Post, [id, "cancel_ticket"]) => (RequestKind::CancelTicket, Some(id.parse().ok()?)),
        (Get, _) | (Post, _) => return None,
        _ => return Some(Err(())),
    };
    Some(Ok(routed))
}

/// Parse the given HTTP request
///
/// If [`None`] is returned, the request was already answered with a
/// corresponding error message.
pub fn parse(rq: tiny_http::Request) -> Option<berth_core::Request> {
    use tiny_http::Method::*;

    if *rq.method() == Options {
        let mut res = Response::empty(204);
        add_response_cors_headers(&mut res);
        send(rq, res);
        return None;
    }

    let (kind, ticket) = match route(rq.method(), rq.url()) {
        Some(Ok(routed)) => routed,
        Some(Err(())) => {
            let mut res = Response::empty(405);
            add_response_cors_headers(&mut res);
            send(rq, res);
            return None;
        }
        None if rq.url().starts_with("/api/debug") => (RequestKind::Debug, None),
        None => {
            let mut res = Response::from_string(ROUTES).with_status_code(404);
            add_response_cors_headers(&mut res);
            send(rq, res);
            return None;
        }
    };

    let request_id = rq
        .headers()
        .iter()
        .find(|hdr| hdr.field.equiv("x-request-id"))
        .and_then(|hdr| Uuid::parse_str(hdr.value.as_str()).ok())
        .unwrap_or_else(Uuid::new_v4);
    debug!(%request_id, method = %rq.method(), url = rq.url(), ?kind, "request received");

    Some(berth_core::Request::from_raw(
        kind,
        ticket,
        request_id,
        Box::new(HTTPRequest(rq)),
    ))
}

fn send<R: Read>(rq: tiny_http::Request, res: Response<R>) {
    if let Err(err) = rq.respond(res) {
        debug!(%err, "HTTP response failed");
    }
}

/// Build a header from ASCII parts
fn header(field: &[u8], value: &[u8]) -> Header {
    Header::from_bytes(field, value).unwrap()
}

/// Add CORS headers to `res`
fn add_response_cors_headers<R: Read>(res: &mut Response<R>) {
    res.add_header(header(b"Access-Control-Request-Method", b"*"));
    res.add_header(header(b"Access-Control-Allow-Origin", b"*"));
    res.add_header(header(b"Access-Control-Allow-Headers", b"*"));
    res.add_header(header(b"Access-Control-Expose-Headers", b"*"));
}

#[cfg(test)]
mod tests {
    use tiny_http::Method;

    use super::*;

    #[test]
    fn routes_with_and_without_trailing_slash() {
        assert_eq!(
            route(&Method::Get, "/api/tickets/available/"),
            Some(Ok((RequestKind::Availability, None)))
        );
        assert_eq!(
            route(&Method::Get, "/api/tickets/available"),
            Some(Ok((RequestKind::Availability, None)))
        );
        assert_eq!(
            route(&Method::Post, "/api/tickets/12/cancel_ticket"),
            Some(Ok((RequestKind::CancelTicket, Some(TicketId(12)))))
        );
        assert_eq!(
            route(&Method::Get, "/api/tickets/?page=2"),
            Some(Ok((RequestKind::ListTickets, None)))
        );
    }

    #[test]
    fn unknown_routes() {
        assert_eq!(route(&Method::Get, "/api/tickets/abc/"), None);
        assert_eq!(route(&Method::Post, "/api/tickets/"), None);
        assert_eq!(route(&Method::Get, "/api/trains/"), None);
        assert_eq!(route(&Method::Get, "/api/tickets5"), None);
        assert_eq!(route(&Method::Get, "/api/ticketsavailable"), None);
        assert_eq!(route(&Method::Post, "/api/tickets5/cancel_ticket/"), None);
        assert_eq!(route(&Method::Delete, "/api/tickets/1/"), Some(Err(())));
    }
}
