//! Error types for the payment-api client.
//!
//! # Design
//! The `Missing*` variants are produced locally before any request leaves the
//! client. `Transport` wraps the underlying HTTP client error untouched.
//! `NotFound` and `HttpError` only come out of the optional `parse_*`
//! helpers; `create`, `query` and `cancel` hand non-2xx responses back as
//! plain `HttpResponse` values.

use thiserror::Error;

/// Errors returned by `PayClient`.
#[derive(Debug, Error)]
pub enum PayError {
    /// A required configuration field was empty when the client was built.
    #[error("{0} must be set")]
    MissingConfiguration(&'static str),

    /// No service-to-service bearer token was supplied for the call.
    #[error("Service Authorization Token must be set")]
    MissingCredential,

    /// No payment reference was supplied to `query` or `cancel`.
    #[error("Missing Payment ID")]
    MissingReference,

    /// No case reference was supplied to `create` while the client requires one.
    #[error("Case Reference not supplied")]
    MissingCaseReference,

    /// A `$$$`-delimited payment reference could not be parsed.
    #[error("invalid payment reference: {0}")]
    InvalidReference(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a status the caller did not expect.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The HTTP transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
