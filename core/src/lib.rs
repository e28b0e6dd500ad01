//! Client for the payment-api: create, query and cancel payments.
//!
//! # Overview
//! `PayClient::init` validates a `PayClientConfig` once and returns a client
//! whose `create`, `query` and `cancel` methods attach the user's bearer
//! token and a service-to-service token to each request.
//!
//! # Design
//! - Each operation has a `build_*` half that validates inputs and returns an
//!   `HttpRequest` without I/O, and an async half that sends it through a
//!   `Transport`.
//! - Responses are returned as received; `parse_payment` / `parse_cancel`
//!   are opt-in helpers for callers that want typed results.
//! - No retries, caching or timeouts live here. Configure those on the
//!   transport.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod reference;
pub mod transport;
pub mod types;

pub use client::PayClient;
pub use config::{CaseReferencePolicy, EndpointStyle, PayClientConfig};
pub use error::PayError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use reference::CompositeReference;
pub use transport::{ReqwestTransport, Transport};
pub use types::{CreatePayment, Payment, User, UserId};
