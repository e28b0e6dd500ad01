//! Client configuration.
//!
//! # Design
//! `PayClientConfig` is validated once by `PayClient::init` and then shared
//! read-only by every call. It derives `Deserialize` with camelCase names so
//! a host can load it from whatever JSON source it already has; the client
//! itself never reads the environment.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVICE_NAME: &str = "DIVORCE";

/// Which payment-api endpoint family `create` and `query` target.
///
/// `cancel` always uses `/users/{id}/payments/{reference}/cancel`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndpointStyle {
    /// `POST /card-payments`, `GET /card-payments/{reference}`.
    #[default]
    CardPayments,
    /// `POST /users/{id}/payments`, `GET /users/{id}/payments/{reference}`.
    UserPayments,
}

/// What `create` does when no case reference is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaseReferencePolicy {
    /// Reject the call with `PayError::MissingCaseReference`.
    Required,
    /// Substitute a freshly generated UUID.
    Generate,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayClientConfig {
    /// Base URL of the payment-api, e.g. `http://payment-api:8080`.
    pub api_base_url: String,
    /// Short identifier of the calling service, the first field of
    /// composite payment references.
    #[serde(default)]
    pub service_identification: String,
    /// Static service-to-service token, exposed through
    /// `PayClient::configured_service_token` for callers that have no
    /// per-call token source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_authorization_token: Option<String>,
    #[serde(default)]
    pub endpoint_style: EndpointStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_reference_policy: Option<CaseReferencePolicy>,
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

impl fmt::Debug for PayClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("service_identification", &self.service_identification)
            .field(
                "service_authorization_token",
                &self.service_authorization_token.as_ref().map(|_| "<redacted>"),
            )
            .field("endpoint_style", &self.endpoint_style)
            .field("case_reference_policy", &self.case_reference_policy)
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl PayClientConfig {
    pub fn new(api_base_url: &str, service_identification: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            service_identification: service_identification.to_string(),
            service_authorization_token: None,
            endpoint_style: EndpointStyle::default(),
            case_reference_policy: None,
            service_name: default_service_name(),
        }
    }

    pub fn with_service_authorization_token(mut self, token: &str) -> Self {
        self.service_authorization_token = Some(token.to_string());
        self
    }

    pub fn with_endpoint_style(mut self, style: EndpointStyle) -> Self {
        self.endpoint_style = style;
        self
    }

    pub fn with_case_reference_policy(mut self, policy: CaseReferencePolicy) -> Self {
        self.case_reference_policy = Some(policy);
        self
    }

    pub fn with_service_name(mut self, name: &str) -> Self {
        self.service_name = name.to_string();
        self
    }

    /// The explicit policy, or the one implied by the endpoint style.
    pub fn case_reference_policy(&self) -> CaseReferencePolicy {
        self.case_reference_policy.unwrap_or(match self.endpoint_style {
            EndpointStyle::CardPayments => CaseReferencePolicy::Required,
            EndpointStyle::UserPayments => CaseReferencePolicy::Generate,
        })
    }

    /// `api_base_url` without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
