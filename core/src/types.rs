//! Domain DTOs for the payment-api.
//!
//! # Design
//! Call inputs (`User`, `CreatePayment`) are plain structs with optional
//! fields; defaults are substituted explicitly by the request builders, not
//! by serde. The two request body shapes mirror the two endpoint families.
//! `Payment` is lenient: only the fields the client knows about are typed,
//! the rest stay in `extra`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub const CURRENCY: &str = "GBP";
pub const DEFAULT_CASE_TYPE: &str = "DIVORCE";
pub const DEFAULT_SITE_ID: &str = "AA00";
pub const DEFAULT_FEE_VERSION: &str = "1";

/// A user identifier as issued by the identity service: numeric or opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(u64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{id}"),
            UserId::Text(id) => f.write_str(id),
        }
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        UserId::Numeric(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::Text(id.to_string())
    }
}

/// The end user on whose behalf a call is made. Not retained by the client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub bearer_token: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, bearer_token: &str) -> Self {
        Self {
            id: id.into(),
            bearer_token: bearer_token.to_string(),
        }
    }
}

// Keeps bearer tokens out of logs and panic messages.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}

/// Inputs for `PayClient::create`.
///
/// `case_type` is used by the card-payments body, `site_id` by the
/// user-payments body. Amounts are in minor units (pence).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePayment {
    #[serde(default)]
    pub case_reference: Option<String>,
    #[serde(default)]
    pub case_type: Option<String>,
    #[serde(default)]
    pub site_id: Option<String>,
    pub fee_code: String,
    #[serde(default)]
    pub fee_version: Option<String>,
    pub amount: u64,
    pub description: String,
    pub return_url: String,
    #[serde(default)]
    pub service_callback_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl CreatePayment {
    pub fn new(fee_code: &str, amount: u64, description: &str, return_url: &str) -> Self {
        Self {
            fee_code: fee_code.to_string(),
            amount,
            description: description.to_string(),
            return_url: return_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_case_reference(mut self, case_reference: &str) -> Self {
        self.case_reference = Some(case_reference.to_string());
        self
    }

    pub fn with_case_type(mut self, case_type: &str) -> Self {
        self.case_type = Some(case_type.to_string());
        self
    }

    pub fn with_site_id(mut self, site_id: &str) -> Self {
        self.site_id = Some(site_id.to_string());
        self
    }

    pub fn with_fee_version(mut self, fee_version: &str) -> Self {
        self.fee_version = Some(fee_version.to_string());
        self
    }

    pub fn with_service_callback_url(mut self, url: &str) -> Self {
        self.service_callback_url = Some(url.to_string());
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }
}

/// One line of the fee breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub calculated_amount: u64,
    pub code: String,
    pub version: String,
}

/// Request body for `POST /card-payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPaymentRequest {
    pub amount: u64,
    pub ccd_case_number: String,
    pub description: String,
    pub service: String,
    pub currency: String,
    pub case_type: String,
    pub fees: Vec<Fee>,
    /// Empty for English, otherwise the upper-cased language code.
    pub language: String,
}

/// Request body for `POST /users/{id}/payments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPaymentRequest {
    pub amount: u64,
    pub description: String,
    /// `$$$`-delimited composite reference.
    pub reference: String,
    pub site_id: String,
    pub currency: String,
    pub fees: Vec<Fee>,
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<Link>,
}

/// A payment as returned by the payment-api.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<Number>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "_links")]
    pub links: Option<Links>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const FINISHED_STATUSES: [&str; 4] = ["success", "failed", "cancelled", "error"];

impl Payment {
    /// URL the user should be sent to in order to complete the payment.
    pub fn next_url(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|links| links.next_url.as_ref())
            .map(|link| link.href.as_str())
    }

    /// Whether the payment has reached a terminal status. Cancelling a
    /// finished payment is rejected by the payment-api.
    pub fn is_finished(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| FINISHED_STATUSES.iter().any(|f| f.eq_ignore_ascii_case(s)))
    }
}
