//! Webhook dispatch: effective-URL resolution, payload shape, and the HTTP
//! transport used to deliver it (spec §4.4).

mod client;
mod dispatcher;
mod error;
mod http;
mod payload;

pub use client::ReqwestClient;
pub use dispatcher::{is_well_formed_webhook_url, resolve_effective_webhook, WebhookDispatcher};
pub use error::{DispatchError, HttpError};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use payload::WebhookPayload;

#[cfg(test)]
pub(crate) use client::mock::MockHttpClient;
