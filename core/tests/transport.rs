//! Async operations against an in-memory recording transport.
//!
//! Verifies which requests reach the transport, and that rejected calls
//! never do.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pay_client::{
    CaseReferencePolicy, CreatePayment, EndpointStyle, HttpMethod, HttpRequest, HttpResponse,
    PayClient, PayClientConfig, PayError, Transport, User,
};

#[derive(Default)]
struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, PayError> {
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: 500,
            headers: Vec::new(),
            body: "upstream unavailable".to_string(),
        })
    }
}

fn config(style: EndpointStyle) -> PayClientConfig {
    PayClientConfig::new("http://base-url", "XYZ1")
        .with_service_authorization_token("service-token")
        .with_endpoint_style(style)
}

fn client(style: EndpointStyle) -> (PayClient<Arc<RecordingTransport>>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let client = PayClient::with_transport(config(style), transport.clone()).unwrap();
    (client, transport)
}

fn user() -> User {
    User::new(99, "user-token")
}

fn payment() -> CreatePayment {
    CreatePayment::new("CODE", 5000, "description", "https://return-url")
        .with_case_reference("CASE-REFERENCE")
        .with_site_id("some-site-id")
}

#[test]
fn init_without_service_identification_fails_for_any_config() {
    let configs = [
        PayClientConfig::new("http://base-url", ""),
        PayClientConfig::new("", "").with_service_authorization_token("foo"),
        PayClientConfig::new("http://base-url", "")
            .with_endpoint_style(EndpointStyle::UserPayments)
            .with_case_reference_policy(CaseReferencePolicy::Generate),
    ];
    for config in configs {
        let result = PayClient::with_transport(config, RecordingTransport::default());
        assert!(matches!(result, Err(PayError::MissingConfiguration(_))));
    }
}

#[tokio::test]
async fn missing_service_token_never_reaches_transport() {
    for style in [EndpointStyle::CardPayments, EndpointStyle::UserPayments] {
        let (client, transport) = client(style);
        for token in [None, Some("")] {
            let err = client.create(&user(), token, &payment()).await.unwrap_err();
            assert!(matches!(err, PayError::MissingCredential));
            let err = client.query(&user(), token, Some("21238")).await.unwrap_err();
            assert!(matches!(err, PayError::MissingCredential));
            let err = client.cancel(&user(), token, Some("21238")).await.unwrap_err();
            assert!(matches!(err, PayError::MissingCredential));
        }
        assert!(transport.requests().is_empty());
    }
}

#[tokio::test]
async fn missing_reference_never_reaches_transport() {
    let (client, transport) = client(EndpointStyle::CardPayments);
    let err = client.query(&user(), Some("service-token"), None).await.unwrap_err();
    assert!(matches!(err, PayError::MissingReference));
    let err = client.cancel(&user(), Some("service-token"), Some("")).await.unwrap_err();
    assert!(matches!(err, PayError::MissingReference));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn malformed_references_never_reach_transport() {
    let (client, transport) = client(EndpointStyle::UserPayments);
    let input = payment().with_case_reference("A$$$B");
    let err = client.create(&user(), Some("service-token"), &input).await.unwrap_err();
    assert!(matches!(err, PayError::InvalidReference(_)));
    let err = client.cancel(&user(), Some("service-token"), Some("..")).await.unwrap_err();
    assert!(matches!(err, PayError::InvalidReference(_)));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn missing_case_reference_never_reaches_transport() {
    let (client, transport) = client(EndpointStyle::CardPayments);
    let mut input = payment();
    input.case_reference = None;
    let err = client.create(&user(), Some("service-token"), &input).await.unwrap_err();
    assert!(matches!(err, PayError::MissingCaseReference));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn create_sends_user_payment_request() {
    let (client, transport) = client(EndpointStyle::UserPayments);
    client.create(&user(), Some("service-token"), &payment()).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, HttpMethod::Post);
    assert_eq!(req.url, "http://base-url/users/99/payments");
    assert_eq!(req.header("Authorization"), Some("Bearer user-token"));
    assert_eq!(req.header("ServiceAuthorization"), Some("Bearer service-token"));

    let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["reference"], "XYZ1$$$CASE-REFERENCE$$$some-site-id$$$CODE");
    assert_eq!(body["amount"], 5000);
}

#[tokio::test]
async fn query_sends_both_bearer_headers() {
    let (client, transport) = client(EndpointStyle::UserPayments);
    client.query(&user(), Some("per-call-token"), Some("21238")).await.unwrap();

    let req = &transport.requests()[0];
    assert_eq!(req.method, HttpMethod::Get);
    assert_eq!(req.url, "http://base-url/users/99/payments/21238");
    assert_eq!(req.header("Authorization"), Some("Bearer user-token"));
    assert_eq!(req.header("ServiceAuthorization"), Some("Bearer per-call-token"));
}

#[tokio::test]
async fn responses_are_returned_uninterpreted() {
    let (client, _transport) = client(EndpointStyle::CardPayments);
    let response = client
        .cancel(&user(), Some("service-token"), Some("234786"))
        .await
        .unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.body, "upstream unavailable");
}

#[tokio::test]
async fn client_is_reusable_after_rejection() {
    let (client, transport) = client(EndpointStyle::CardPayments);
    assert!(client.query(&user(), None, Some("1")).await.is_err());
    client.query(&user(), Some("service-token"), Some("1")).await.unwrap();
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let (client, transport) = client(EndpointStyle::CardPayments);
    let user = user();
    let (a, b) = tokio::join!(
        client.query(&user, Some("service-token"), Some("1")),
        client.cancel(&user, Some("service-token"), Some("2")),
    );
    a.unwrap();
    b.unwrap();

    let mut urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "http://base-url/card-payments/1".to_string(),
            "http://base-url/users/99/payments/2/cancel".to_string(),
        ]
    );
}
