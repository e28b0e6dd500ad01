use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const FINISHED_STATUSES: [&str; 3] = ["Success", "Failed", "Cancelled"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub method: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    pub next_url: Link,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub reference: String,
    pub status: String,
    pub amount: u64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ccd_case_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Deserialize)]
pub struct Fee {
    pub calculated_amount: u64,
    pub code: String,
    pub version: String,
}

#[derive(Deserialize)]
pub struct CardPaymentRequest {
    pub amount: u64,
    pub ccd_case_number: String,
    pub description: String,
    pub service: String,
    pub currency: String,
    pub case_type: String,
    pub fees: Vec<Fee>,
    #[serde(default)]
    pub language: String,
}

#[derive(Deserialize)]
pub struct UserPaymentRequest {
    pub amount: u64,
    pub description: String,
    pub reference: String,
    pub site_id: String,
    pub currency: String,
    #[serde(default)]
    pub fees: Vec<Fee>,
    pub return_url: String,
}

pub type Db = Arc<RwLock<HashMap<String, Payment>>>;

type Rejection = (StatusCode, String);

pub fn app() -> Router {
    app_with_db(Db::default())
}

/// Router over a caller-supplied store, so tests can inspect or seed it.
pub fn app_with_db(db: Db) -> Router {
    Router::new()
        .route("/card-payments", post(create_card_payment))
        .route("/card-payments/{reference}", get(get_card_payment))
        .route("/users/{user_id}/payments", post(create_user_payment))
        .route("/users/{user_id}/payments/{reference}", get(get_user_payment))
        .route(
            "/users/{user_id}/payments/{reference}/cancel",
            post(cancel_payment),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Overwrite the status of a stored payment, e.g. to simulate the user
/// completing it. Returns false if the reference is unknown.
pub async fn set_status(db: &Db, reference: &str, status: &str) -> bool {
    match db.write().await.get_mut(reference) {
        Some(payment) => {
            payment.status = status.to_string();
            true
        }
        None => false,
    }
}

/// Both bearer headers must be present: 401 without the user's, 403 without
/// the service's.
fn authorize(headers: &HeaderMap) -> Result<(), Rejection> {
    let bearer = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| !token.is_empty())
    };
    if !bearer("authorization") {
        return Err((StatusCode::UNAUTHORIZED, "missing user bearer token".to_string()));
    }
    if !bearer("serviceauthorization") {
        return Err((StatusCode::FORBIDDEN, "missing service bearer token".to_string()));
    }
    Ok(())
}

/// A fresh `RC-xxxx-xxxx-xxxx-xxxx` reference.
fn new_reference() -> String {
    let digits = format!("{:016}", Uuid::new_v4().as_u128() % 10_000_000_000_000_000);
    format!(
        "RC-{}-{}-{}-{}",
        &digits[0..4],
        &digits[4..8],
        &digits[8..12],
        &digits[12..16]
    )
}

fn next_url(reference: &str) -> Links {
    Links {
        next_url: Link {
            href: format!("https://card.payments.example/secure/{reference}"),
            method: "GET".to_string(),
        },
    }
}

async fn create_card_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CardPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), Rejection> {
    authorize(&headers)?;
    let reference = new_reference();
    let payment = Payment {
        reference: reference.clone(),
        status: "Initiated".to_string(),
        amount: input.amount,
        description: input.description,
        ccd_case_number: Some(input.ccd_case_number),
        external_reference: None,
        user_id: None,
        links: next_url(&reference),
    };
    tracing::info!(%reference, case_type = %input.case_type, "card payment created");
    db.write().await.insert(reference, payment.clone());
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn get_card_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> Result<Json<Payment>, Rejection> {
    authorize(&headers)?;
    let payments = db.read().await;
    payments
        .get(&reference)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("payment {reference} not found")))
}

async fn create_user_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    Json(input): Json<UserPaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), Rejection> {
    authorize(&headers)?;
    if input.reference.split("$$$").count() != 4 {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("malformed reference {}", input.reference),
        ));
    }
    let reference = new_reference();
    let payment = Payment {
        reference: reference.clone(),
        status: "Initiated".to_string(),
        amount: input.amount,
        description: input.description,
        ccd_case_number: None,
        external_reference: Some(input.reference),
        user_id: Some(user_id),
        links: next_url(&reference),
    };
    tracing::info!(%reference, site_id = %input.site_id, "user payment created");
    db.write().await.insert(reference, payment.clone());
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn get_user_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user_id, reference)): Path<(String, String)>,
) -> Result<Json<Payment>, Rejection> {
    authorize(&headers)?;
    let payments = db.read().await;
    payments
        .get(&reference)
        .filter(|p| owned_by(p, &user_id))
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, format!("payment {reference} not found")))
}

async fn cancel_payment(
    State(db): State<Db>,
    headers: HeaderMap,
    Path((user_id, reference)): Path<(String, String)>,
) -> Result<StatusCode, Rejection> {
    authorize(&headers)?;
    let mut payments = db.write().await;
    let payment = payments
        .get_mut(&reference)
        .filter(|p| owned_by(p, &user_id))
        .ok_or((StatusCode::NOT_FOUND, format!("payment {reference} not found")))?;
    if FINISHED_STATUSES.contains(&payment.status.as_str()) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("payment {reference} is already {}", payment.status),
        ));
    }
    payment.status = "Cancelled".to_string();
    tracing::info!(%reference, "payment cancelled");
    Ok(StatusCode::NO_CONTENT)
}

// Card payments carry no owner and may be cancelled through any user path.
fn owned_by(payment: &Payment, user_id: &str) -> bool {
    payment.user_id.as_deref().map_or(true, |owner| owner == user_id)
}
