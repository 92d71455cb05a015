//! PayPal REST (v1 payments) client.
//!
//! Covers the three calls checkout needs: an OAuth2 client-credentials token,
//! payment creation with redirect URLs, and payment execution after the buyer
//! approves. Tokens are cached for 30 minutes.

use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use techshop_core::{OrderId, Price};

use crate::config::PayPalConfig;

/// How long an access token is reused.
const TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// HTTP timeout for provider calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to PayPal.
#[derive(Debug, Error)]
pub enum PayPalError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or build a URL.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Input for [`PayPalClient::create_payment`].
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub order_id: OrderId,
    pub total: Price,
    pub return_url: Url,
    pub cancel_url: Url,
}

/// A payment PayPal accepted, awaiting buyer approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPayment {
    /// PayPal payment id (`PAYID-...`).
    pub id: String,
    pub state: String,
    /// Where to send the buyer; the link whose method is `REDIRECT`.
    pub approval_url: Option<String>,
}

/// Result of executing an approved payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedPayment {
    pub id: String,
    pub state: String,
    /// Id of the sale transaction, when PayPal reports one.
    pub sale_id: Option<String>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct PaymentRequest<'a> {
    intent: &'static str,
    payer: Payer,
    redirect_urls: RedirectUrls<'a>,
    transactions: [Transaction; 1],
}

#[derive(Debug, Serialize)]
struct Payer {
    payment_method: &'static str,
}

#[derive(Debug, Serialize)]
struct RedirectUrls<'a> {
    return_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Debug, Serialize)]
struct Transaction {
    amount: Amount,
    description: String,
}

#[derive(Debug, Serialize)]
struct Amount {
    total: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    payer_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    transactions: Vec<TransactionResponse>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
    #[serde(default)]
    method: String,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    #[serde(default)]
    related_resources: Vec<RelatedResource>,
}

#[derive(Debug, Deserialize)]
struct RelatedResource {
    sale: Option<Sale>,
}

#[derive(Debug, Deserialize)]
struct Sale {
    id: String,
}

// =============================================================================
// Client
// =============================================================================

/// PayPal REST API client.
///
/// Cheap to clone; clones share the HTTP connection pool and token cache.
#[derive(Clone)]
pub struct PayPalClient {
    client: reqwest::Client,
    api_base: Url,
    client_id: String,
    client_secret: SecretString,
    token_cache: Cache<(), String>,
}

impl PayPalClient {
    /// Create a new PayPal client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PayPalConfig) -> Result<Self, PayPalError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(TOKEN_TTL)
                .build(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PayPalError> {
        self.api_base
            .join(path)
            .map_err(|e| PayPalError::Parse(format!("invalid endpoint {path}: {e}")))
    }

    /// Get an OAuth2 access token, reusing a cached one when fresh.
    ///
    /// # Errors
    ///
    /// Returns error if the token request fails.
    pub async fn access_token(&self) -> Result<String, PayPalError> {
        if let Some(token) = self.token_cache.get(&()).await {
            return Ok(token);
        }

        let response = self
            .client
            .post(self.endpoint("/v1/oauth2/token")?)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let token: TokenResponse = parse_response(response).await?;
        self.token_cache.insert((), token.access_token.clone()).await;
        tracing::debug!("PayPal access token refreshed");

        Ok(token.access_token)
    }

    /// Create a sale payment for an order.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or PayPal rejects the payment.
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_payment(
        &self,
        request: &CreatePayment,
    ) -> Result<CreatedPayment, PayPalError> {
        let token = self.access_token().await?;

        let body = PaymentRequest {
            intent: "sale",
            payer: Payer {
                payment_method: "paypal",
            },
            redirect_urls: RedirectUrls {
                return_url: request.return_url.as_str(),
                cancel_url: request.cancel_url.as_str(),
            },
            transactions: [Transaction {
                amount: Amount {
                    total: request.total.amount_string(),
                    currency: request.total.currency_code.to_string(),
                },
                description: format!("Payment for order #{}", request.order_id),
            }],
        };

        let response = self
            .client
            .post(self.endpoint("/v1/payments/payment")?)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let payment: PaymentResponse = parse_response(response).await?;
        let approval_url = payment
            .links
            .into_iter()
            .find(|link| link.method.eq_ignore_ascii_case("REDIRECT"))
            .map(|link| link.href);

        Ok(CreatedPayment {
            id: payment.id,
            state: payment.state,
            approval_url,
        })
    }

    /// Execute a payment the buyer approved.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or PayPal refuses execution.
    #[tracing::instrument(skip(self, payer_id))]
    pub async fn execute_payment(
        &self,
        payment_id: &str,
        payer_id: &str,
    ) -> Result<ExecutedPayment, PayPalError> {
        let token = self.access_token().await?;

        let path = format!(
            "/v1/payments/payment/{}/execute",
            urlencoding::encode(payment_id)
        );
        let response = self
            .client
            .post(self.endpoint(&path)?)
            .bearer_auth(token)
            .json(&ExecuteRequest { payer_id })
            .send()
            .await?;

        let payment: PaymentResponse = parse_response(response).await?;
        let sale_id = payment
            .transactions
            .into_iter()
            .flat_map(|t| t.related_resources)
            .find_map(|r| r.sale)
            .map(|sale| sale.id);

        Ok(ExecutedPayment {
            id: payment.id,
            state: payment.state,
            sale_id,
        })
    }
}

/// Turn a response into `T`, mapping non-2xx statuses to `PayPalError::Api`.
async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, PayPalError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(PayPalError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| PayPalError::Parse(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use rust_decimal::Decimal;
    use serde_json::{Value, json};
    use techshop_core::CurrencyCode;

    use super::*;
    use crate::config::PayPalMode;

    #[derive(Default)]
    struct Fake {
        token_calls: AtomicUsize,
        last_body: std::sync::Mutex<Option<Value>>,
    }

    async fn token(State(fake): State<Arc<Fake>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
        fake.token_calls.fetch_add(1, Ordering::SeqCst);
        if !headers.contains_key("authorization") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"})));
        }
        (
            StatusCode::OK,
            Json(json!({"access_token": "A21AAF", "token_type": "Bearer", "expires_in": 32400})),
        )
    }

    async fn create(State(fake): State<Arc<Fake>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        *fake.last_body.lock().unwrap() = Some(body);
        (
            StatusCode::CREATED,
            Json(json!({
                "id": "PAYID-TEST",
                "state": "created",
                "links": [
                    {"href": "https://api.sandbox.paypal.com/v1/payments/payment/PAYID-TEST", "rel": "self", "method": "GET"},
                    {"href": "https://www.sandbox.paypal.com/checkoutnow?token=EC-1", "rel": "approval_url", "method": "REDIRECT"}
                ]
            })),
        )
    }

    async fn execute(Path(id): Path<String>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["payer_id"] != "PAYER1" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"name": "PAYER_ID_MISSING", "message": "payer id mismatch"})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "id": id,
                "state": "approved",
                "transactions": [{"related_resources": [{"sale": {"id": "SALE-42", "state": "completed"}}]}]
            })),
        )
    }

    async fn spawn_fake() -> (PayPalClient, Arc<Fake>) {
        let fake = Arc::new(Fake::default());
        let app = Router::new()
            .route("/v1/oauth2/token", post(token))
            .route("/v1/payments/payment", post(create))
            .route("/v1/payments/payment/{id}/execute", post(execute))
            .with_state(fake.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = PayPalConfig {
            mode: PayPalMode::Sandbox,
            api_base: Url::parse(&format!("http://{addr}")).unwrap(),
            client_id: "client".to_string(),
            client_secret: SecretString::from("Zq8vL2mN5xR7tY1w"),
            currency: CurrencyCode::default(),
        };
        (PayPalClient::new(&config).unwrap(), fake)
    }

    fn create_request(currency: &CurrencyCode) -> CreatePayment {
        CreatePayment {
            order_id: OrderId::new(12),
            total: Price::new(Decimal::from_str("180").unwrap(), currency.clone()),
            return_url: Url::parse("http://shop.test/payments/success/3").unwrap(),
            cancel_url: Url::parse("http://shop.test/payments/cancel/3").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_payment_wire_format() {
        let (client, fake) = spawn_fake().await;
        let currency = CurrencyCode::parse("EUR").unwrap();

        let created = client.create_payment(&create_request(&currency)).await.unwrap();
        assert_eq!(created.id, "PAYID-TEST");
        assert_eq!(
            created.approval_url.as_deref(),
            Some("https://www.sandbox.paypal.com/checkoutnow?token=EC-1")
        );

        let body = fake.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(body["intent"], "sale");
        assert_eq!(body["payer"]["payment_method"], "paypal");
        assert_eq!(body["redirect_urls"]["return_url"], "http://shop.test/payments/success/3");
        assert_eq!(body["transactions"][0]["amount"]["total"], "180.00");
        assert_eq!(body["transactions"][0]["amount"]["currency"], "EUR");
        assert_eq!(body["transactions"][0]["description"], "Payment for order #12");
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let (client, fake) = spawn_fake().await;
        let currency = CurrencyCode::default();

        client.create_payment(&create_request(&currency)).await.unwrap();
        client.create_payment(&create_request(&currency)).await.unwrap();

        assert_eq!(fake.token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_payment_returns_sale_id() {
        let (client, _fake) = spawn_fake().await;

        let executed = client.execute_payment("PAYID-TEST", "PAYER1").await.unwrap();
        assert_eq!(executed.id, "PAYID-TEST");
        assert_eq!(executed.state, "approved");
        assert_eq!(executed.sale_id.as_deref(), Some("SALE-42"));
    }

    #[tokio::test]
    async fn test_execute_payment_api_error() {
        let (client, _fake) = spawn_fake().await;

        let err = client.execute_payment("PAYID-TEST", "WRONG").await.unwrap_err();
        match err {
            PayPalError::Api { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("PAYER_ID_MISSING"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
