use std::sync::Arc;

use berth_core::{Availability, PassengerFields, RequestKind, Ticket, TicketId};
use eyre::{eyre, Result};
use flume::Sender;
use nanorand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

pub mod mock;

#[derive(Debug, Error)]
#[error("Error {status}: {detail}")]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
enum Response {
    Json {
        status: u16,
        body: String,
        request_id: Uuid,
    },
    Text {
        text: String,
        #[allow(unused)]
        request_id: Uuid,
    },
}

#[derive(Deserialize)]
struct Detail {
    detail: String,
}

impl Response {
    fn into_api_response<T: DeserializeOwned>(self, rq_kind: RequestKind) -> Result<ApiResponse<T>> {
        let (status, body, request_id) = match self {
            Response::Json {
                status,
                body,
                request_id,
            } => (status, body, request_id),
            resp => return Err(eyre!("{rq_kind:?} must not be answered by {resp:?}")),
        };

        let result = if (200..300).contains(&status) {
            Ok(serde_json::from_str(&body)
                .map_err(|e| eyre!("{rq_kind:?} answered with unexpected body {body}: {e}"))?)
        } else {
            let Detail { detail } = serde_json::from_str(&body)
                .map_err(|e| eyre!("error body {body} lacks a detail: {e}"))?;
            Err(ApiError { status, detail })
        };
        Ok(ApiResponse {
            request_id,
            status,
            result,
        })
    }
}

struct RequestMsg {
    kind: RequestKind,
    ticket: Option<TicketId>,
    payload: Option<String>,
    request_id: Uuid,
    response_channel: oneshot::Sender<Response>,
}

pub struct Api {
    /// One channel per worker thread
    channels: Arc<Vec<Sender<RequestMsg>>>,

    my_channel: Sender<RequestMsg>,
    my_index: usize,
}

impl Api {
    fn new(channels: Vec<Sender<RequestMsg>>) -> Self {
        let my_channel = channels[0].clone();
        Self {
            channels: Arc::new(channels),
            my_channel,
            my_index: 0,
        }
    }
}

impl Clone for Api {
    fn clone(&self) -> Self {
        let my_index = (self.my_index + 1) % self.channels.len();
        Self {
            channels: self.channels.clone(),
            my_channel: self.channels[my_index].clone(),
            my_index,
        }
    }
}

impl Api {
    async fn make_request(
        &self,
        kind: RequestKind,
        ticket: Option<TicketId>,
        payload: Option<String>,
    ) -> Result<Response> {
        let (sender, receiver) = oneshot::channel();
        let msg = RequestMsg {
            kind,
            ticket,
            payload,
            request_id: random_request_id(),
            response_channel: sender,
        };
        self.my_channel.send_async(msg).await?;
        Ok(receiver.await?)
    }

    pub async fn available(&self) -> Result<ApiResponse<Availability>> {
        let kind = RequestKind::Availability;
        let response = self.make_request(kind, None, None).await?;
        // A sold out coach answers `{"message": ..}`, which leaves every tier unset
        response.into_api_response(kind)
    }

    pub async fn book_ticket(&self, passenger: &PassengerFields) -> Result<ApiResponse<Ticket>> {
        self.book_raw(serde_json::to_string(passenger)?).await
    }

    /// Book with an arbitrary request body
    pub async fn book_raw(&self, body: impl Into<String>) -> Result<ApiResponse<Ticket>> {
        let kind = RequestKind::BookTicket;
        let response = self.make_request(kind, None, Some(body.into())).await?;
        response.into_api_response(kind)
    }

    pub async fn cancel_ticket(&self, ticket: TicketId) -> Result<ApiResponse<String>> {
        let kind = RequestKind::CancelTicket;
        let response = self.make_request(kind, Some(ticket), None).await?;
        let response: ApiResponse<Detail> = response.into_api_response(kind)?;
        response.map_response(|d| Ok(d.detail))
    }

    pub async fn get_ticket(&self, ticket: TicketId) -> Result<ApiResponse<Ticket>> {
        let kind = RequestKind::GetTicket;
        let response = self.make_request(kind, Some(ticket), None).await?;
        response.into_api_response(kind)
    }

    pub async fn list_tickets(&self) -> Result<ApiResponse<Vec<Ticket>>> {
        let kind = RequestKind::ListTickets;
        let response = self.make_request(kind, None, None).await?;
        response.into_api_response(kind)
    }

    pub async fn debug(&self) -> Result<String> {
        match self.make_request(RequestKind::Debug, None, None).await? {
            Response::Text { text, .. } => Ok(text),
            resp => Err(eyre!("Debug must not be answered by {resp:?}")),
        }
    }
}

fn random_request_id() -> Uuid {
    let mut bytes = [0u8; 16];
    nanorand::tls_rng().fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

pub struct ApiResponse<T> {
    pub request_id: Uuid,
    pub status: u16,
    pub result: ApiResult<T>,
}

impl<T> ApiResponse<T> {
    pub fn map_response<R, F: FnOnce(T) -> Result<R>>(self, func: F) -> Result<ApiResponse<R>> {
        let result = match self.result.map(func) {
            Ok(result) => Ok(result?),
            Err(err) => Err(err),
        };
        Ok(ApiResponse {
            request_id: self.request_id,
            status: self.status,
            result,
        })
    }
}
