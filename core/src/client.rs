//! Request builders and the bound payment client.
//!
//! # Design
//! `PayClient` holds the validated configuration behind an `Arc` and a
//! transport; it carries no other state between calls. Each operation is
//! split into a `build_*` method that validates its inputs and produces an
//! `HttpRequest`, and an async method that sends that request through the
//! transport and returns the response untouched. Every validation failure is
//! returned before the transport sees anything.

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{CaseReferencePolicy, EndpointStyle, PayClientConfig};
use crate::error::PayError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::reference::CompositeReference;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    CardPaymentRequest, CreatePayment, Fee, Payment, User, UserPaymentRequest, CURRENCY,
    DEFAULT_CASE_TYPE, DEFAULT_FEE_VERSION, DEFAULT_SITE_ID,
};

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Client for the payment-api, bound to one configuration.
#[derive(Debug, Clone)]
pub struct PayClient<T = ReqwestTransport> {
    config: Arc<PayClientConfig>,
    transport: T,
}

impl PayClient<ReqwestTransport> {
    /// Validate `config` and bind it to a default reqwest transport.
    pub fn init(config: PayClientConfig) -> Result<Self, PayError> {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<T> PayClient<T> {
    /// Validate `config` and bind it to `transport`.
    pub fn with_transport(config: PayClientConfig, transport: T) -> Result<Self, PayError> {
        if config.service_identification.trim().is_empty() {
            return Err(PayError::MissingConfiguration("Service Identification"));
        }
        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }

    pub fn config(&self) -> &PayClientConfig {
        &self.config
    }

    /// The statically configured service token, if any.
    pub fn configured_service_token(&self) -> Option<&str> {
        self.config.service_authorization_token.as_deref()
    }

    pub fn build_create(
        &self,
        user: &User,
        service_token: Option<&str>,
        payment: &CreatePayment,
    ) -> Result<HttpRequest, PayError> {
        let service_token = require_service_token(service_token)?;
        let case_reference = self.resolve_case_reference(payment.case_reference.as_deref())?;
        let fee = Fee {
            calculated_amount: payment.amount,
            code: payment.fee_code.clone(),
            version: payment
                .fee_version
                .clone()
                .unwrap_or_else(|| DEFAULT_FEE_VERSION.to_string()),
        };

        let (url, body) = match self.config.endpoint_style {
            EndpointStyle::CardPayments => {
                let case_type = payment
                    .case_type
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| {
                        info!("Default Case Type is being used");
                        DEFAULT_CASE_TYPE
                    });
                let body = CardPaymentRequest {
                    amount: payment.amount,
                    ccd_case_number: case_reference,
                    description: payment.description.clone(),
                    service: self.config.service_name.clone(),
                    currency: CURRENCY.to_string(),
                    case_type: case_type.to_string(),
                    fees: vec![fee],
                    language: language_field(payment.language.as_deref()),
                };
                (format!("{}/card-payments", self.config.base_url()), to_json(&body)?)
            }
            EndpointStyle::UserPayments => {
                let site_id = payment
                    .site_id
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| {
                        info!("Default Site ID is being used");
                        DEFAULT_SITE_ID
                    });
                let reference = CompositeReference::new(
                    self.config.service_identification.as_str(),
                    case_reference,
                    site_id,
                    payment.fee_code.as_str(),
                );
                reference.validate()?;
                let body = UserPaymentRequest {
                    amount: payment.amount,
                    description: payment.description.clone(),
                    reference: reference.to_string(),
                    site_id: site_id.to_string(),
                    currency: CURRENCY.to_string(),
                    fees: vec![fee],
                    return_url: payment.return_url.clone(),
                };
                let url = format!(
                    "{}/users/{}/payments",
                    self.config.base_url(),
                    user_segment(user)?
                );
                (url, to_json(&body)?)
            }
        };

        let mut headers = auth_headers(user, service_token);
        headers.push(("content-type".to_string(), "application/json".to_string()));
        if !payment.return_url.is_empty() {
            headers.push(("return-url".to_string(), payment.return_url.clone()));
        }
        if let Some(callback) = payment.service_callback_url.as_deref().filter(|u| !u.is_empty()) {
            headers.push(("service-callback-url".to_string(), callback.to_string()));
        }

        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers,
            body: Some(body),
        })
    }

    pub fn build_query(
        &self,
        user: &User,
        service_token: Option<&str>,
        reference: Option<&str>,
    ) -> Result<HttpRequest, PayError> {
        let service_token = require_service_token(service_token)?;
        let reference = path_segment(require_reference(reference)?)?;
        let url = match self.config.endpoint_style {
            EndpointStyle::CardPayments => {
                format!("{}/card-payments/{reference}", self.config.base_url())
            }
            EndpointStyle::UserPayments => format!(
                "{}/users/{}/payments/{reference}",
                self.config.base_url(),
                user_segment(user)?
            ),
        };
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: auth_headers(user, service_token),
            body: None,
        })
    }

    pub fn build_cancel(
        &self,
        user: &User,
        service_token: Option<&str>,
        reference: Option<&str>,
    ) -> Result<HttpRequest, PayError> {
        let service_token = require_service_token(service_token)?;
        let reference = path_segment(require_reference(reference)?)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!(
                "{}/users/{}/payments/{reference}/cancel",
                self.config.base_url(),
                user_segment(user)?
            ),
            headers: auth_headers(user, service_token),
            body: None,
        })
    }

    /// Decode a create or query response into a `Payment`.
    pub fn parse_payment(&self, response: HttpResponse) -> Result<Payment, PayError> {
        check_status(&response, &[200, 201])?;
        serde_json::from_str(&response.body)
            .map_err(|e| PayError::DeserializationError(e.to_string()))
    }

    /// Interpret a cancel response; the payment-api answers 204 or 200.
    pub fn parse_cancel(&self, response: HttpResponse) -> Result<(), PayError> {
        check_status(&response, &[200, 204])
    }

    fn resolve_case_reference(&self, case_reference: Option<&str>) -> Result<String, PayError> {
        match case_reference.filter(|r| !r.is_empty()) {
            Some(reference) => Ok(reference.to_string()),
            None => match self.config.case_reference_policy() {
                CaseReferencePolicy::Required => {
                    error!("Case Reference is not supplied");
                    Err(PayError::MissingCaseReference)
                }
                CaseReferencePolicy::Generate => {
                    let generated = Uuid::new_v4().to_string();
                    debug!(case_reference = %generated, "generated case reference");
                    Ok(generated)
                }
            },
        }
    }
}

impl<T: Transport> PayClient<T> {
    /// Create a payment. The response is returned as received.
    pub async fn create(
        &self,
        user: &User,
        service_token: Option<&str>,
        payment: &CreatePayment,
    ) -> Result<HttpResponse, PayError> {
        let request = self.build_create(user, service_token, payment)?;
        self.send(request).await
    }

    /// Fetch a payment by reference. The response is returned as received.
    pub async fn query(
        &self,
        user: &User,
        service_token: Option<&str>,
        reference: Option<&str>,
    ) -> Result<HttpResponse, PayError> {
        let request = self.build_query(user, service_token, reference)?;
        self.send(request).await
    }

    /// Ask the payment-api to cancel a payment. Whether the payment can still
    /// be cancelled is decided by the server.
    pub async fn cancel(
        &self,
        user: &User,
        service_token: Option<&str>,
        reference: Option<&str>,
    ) -> Result<HttpResponse, PayError> {
        let request = self.build_cancel(user, service_token, reference)?;
        self.send(request).await
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PayError> {
        debug!(method = %request.method, url = %request.url, "sending payment-api request");
        self.transport.send(request).await
    }
}

fn require_service_token(token: Option<&str>) -> Result<&str, PayError> {
    token.filter(|t| !t.is_empty()).ok_or(PayError::MissingCredential)
}

fn require_reference(reference: Option<&str>) -> Result<&str, PayError> {
    reference.filter(|r| !r.is_empty()).ok_or(PayError::MissingReference)
}

/// Percent-encode `value` as a single path segment. Dot segments are
/// rejected since URL normalization would resolve them.
fn path_segment(value: &str) -> Result<String, PayError> {
    if value == "." || value == ".." {
        return Err(PayError::InvalidReference(value.to_string()));
    }
    Ok(utf8_percent_encode(value, PATH_SEGMENT).to_string())
}

fn user_segment(user: &User) -> Result<String, PayError> {
    path_segment(&user.id.to_string())
}

fn auth_headers(user: &User, service_token: &str) -> Vec<(String, String)> {
    vec![
        ("Authorization".to_string(), format!("Bearer {}", user.bearer_token)),
        ("ServiceAuthorization".to_string(), format!("Bearer {service_token}")),
    ]
}

fn language_field(language: Option<&str>) -> String {
    match language {
        None | Some("") | Some("en") => String::new(),
        Some(other) => other.to_uppercase(),
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<String, PayError> {
    serde_json::to_string(body).map_err(|e| PayError::SerializationError(e.to_string()))
}

/// Map unexpected status codes to the appropriate `PayError` variant.
fn check_status(response: &HttpResponse, expected: &[u16]) -> Result<(), PayError> {
    if expected.contains(&response.status) {
        return Ok(());
    }
    if response.status == 404 {
        return Err(PayError::NotFound);
    }
    Err(PayError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
