//! Mock API implementation directly using the `berth-engine` crate

use std::sync::Arc;

use berth_core::{RawRequest, Request, RequestHandler, RequestKind, RequestMethod, TicketId};
use tokio::sync::oneshot;
use tokio::task::{self, JoinHandle};
use uuid::Uuid;

use super::{Api, RequestMsg, Response};

pub struct MockOffice {
    office: Arc<berth_engine::BookingOffice>,
    join_handles: Vec<JoinHandle<()>>,
}

struct MockRawRequest {
    url: String,
    payload: Option<String>,
    kind: RequestKind,
    response_channel: oneshot::Sender<Response>,
}

pub async fn start(workers: u16, config: berth_core::Config) -> (MockOffice, Api) {
    let office = Arc::new(
        task::spawn_blocking(move || berth_engine::launch(&config))
            .await
            .unwrap(),
    );

    let it = (0..workers).map(|_| {
        let (sender, receiver) = flume::bounded::<RequestMsg>(65536);
        let office = office.clone();
        let handle = task::spawn_blocking(move || {
            let office = &*office;
            for msg in receiver.into_iter() {
                let raw = Box::new(MockRawRequest {
                    url: url(msg.kind, msg.ticket),
                    payload: msg.payload,
                    kind: msg.kind,
                    response_channel: msg.response_channel,
                });
                office.handle(Request::from_raw(msg.kind, msg.ticket, msg.request_id, raw))
            }
        });
        (sender, handle)
    });
    let (senders, join_handles) = it.unzip();

    let mock_office = MockOffice {
        office,
        join_handles,
    };
    (mock_office, Api::new(senders))
}

impl MockOffice {
    pub async fn shutdown(self) {
        for handle in self.join_handles {
            handle.await.unwrap()
        }
        task::spawn_blocking(move || Arc::into_inner(self.office).unwrap().shutdown())
            .await
            .unwrap();
    }
}

fn url(kind: RequestKind, ticket: Option<TicketId>) -> String {
    use RequestKind::*;
    let id = ticket.map(|id| id.to_string()).unwrap_or_default();
    match kind {
        Availability => "/api/tickets/available/".into(),
        BookTicket => "/api/tickets/book_ticket/".into(),
        CancelTicket => format!("/api/tickets/{id}/cancel_ticket/"),
        ListTickets => "/api/tickets/".into(),
        GetTicket => format!("/api/tickets/{id}/"),
        Debug => "/api/debug".into(),
    }
}

impl RawRequest for MockRawRequest {
    fn url(&self) -> &str {
        &self.url
    }

    fn method(&self) -> RequestMethod {
        use RequestKind::*;
        match self.kind {
            BookTicket | CancelTicket => RequestMethod::Post,
            Availability | ListTickets | GetTicket | Debug => RequestMethod::Get,
        }
    }

    fn read_string(&mut self) -> std::io::Result<String> {
        Ok(self.payload.take().unwrap_or_default())
    }

    fn respond_with_json(self: Box<Self>, status: u16, body: String, request_id: Uuid) {
        let response = Response::Json {
            status,
            body,
            request_id,
        };
        self.response_channel.send(response).unwrap()
    }

    fn respond_with_string(self: Box<Self>, text: String, request_id: Uuid) {
        let response = Response::Text { text, request_id };
        self.response_channel.send(response).unwrap()
    }
}
