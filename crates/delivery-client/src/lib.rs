use std::time::Duration;

use anyhow::Context;
use delivery_types::domain::order::Order;
use delivery_types::domain::user::Role;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
pub struct DeliveryClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

#[derive(Clone)]
pub struct DeliveryClient {
    base: Url,
    client: reqwest::Client,
}

/// Non-2xx reply from the server. The body is the server's plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

async fn check(res: Response) -> anyhow::Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let message = res.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), %message, "request failed");
    Err(ApiError {
        status: status.as_u16(),
        message,
    }
    .into())
}

impl DeliveryClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<DeliveryClientBuilder> {
        let base = Url::parse(base_url).context("invalid base url")?;
        Ok(DeliveryClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    pub async fn register(&self, req: RegisterRequest) -> anyhow::Result<RegisterResponse> {
        let res = self
            .client
            .post(self.url("register")?)
            .json(&req)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    /// Returns the session token.
    pub async fn login(&self, username: &str, password: &str) -> anyhow::Result<String> {
        let res = self
            .client
            .post(self.url("login")?)
            .json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let body: TokenResponse = check(res).await?.json().await?;
        Ok(body.token)
    }

    pub async fn place_order(&self, req: PlaceOrderRequest) -> anyhow::Result<()> {
        let res = self
            .client
            .post(self.url("place-order")?)
            .json(&req)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }

    /// Orders still waiting for a driver.
    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let res = self.client.get(self.url("orders")?).send().await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn accept_order(&self, req: AcceptOrderRequest) -> anyhow::Result<()> {
        let res = self
            .client
            .post(self.url("accept-order")?)
            .json(&req)
            .send()
            .await?;
        check(res).await?;
        Ok(())
    }
}

impl DeliveryClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<DeliveryClient> {
        if let Some(client) = self.client {
            return Ok(DeliveryClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder();
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(DeliveryClient {
            base: self.base,
            client,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub phone: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct TokenResponse {
    token: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlaceOrderRequest {
    pub customer_id: i64,
    pub photo: String,
    pub description: String,
    pub location: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct AcceptOrderRequest {
    pub order_id: i64,
    pub driver_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_types::domain::order::OrderStatus;
    use httpmock::prelude::*;

    fn sample_order() -> Order {
        Order {
            order_id: 1,
            customer_id: 1,
            product_photo: "p.jpg".into(),
            description: "food".into(),
            location: "loc".into(),
            status: OrderStatus::Pending,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn register_and_login() {
        let server = MockServer::start();

        let register_mock = server.mock(|when, then| {
            when.method(POST).path("/register").json_body(serde_json::json!({
                "username": "alice",
                "password": "pw123",
                "role": "customer",
                "phone": "555"
            }));
            then.status(200).json_body(serde_json::json!({
                "message": "User registered successfully",
                "token": "a.b.c"
            }));
        });

        let login_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/login")
                .json_body(serde_json::json!({ "username": "alice", "password": "pw123" }));
            then.status(200)
                .json_body(serde_json::json!({ "token": "d.e.f" }));
        });

        let client = DeliveryClient::new(&server.base_url()).unwrap();
        let registered = client
            .register(RegisterRequest {
                username: "alice".into(),
                password: "pw123".into(),
                role: Role::Customer,
                phone: "555".into(),
            })
            .await
            .unwrap();
        assert_eq!(registered.token, "a.b.c");

        let token = client.login("alice", "pw123").await.unwrap();
        assert_eq!(token, "d.e.f");

        register_mock.assert();
        login_mock.assert();
    }

    #[tokio::test]
    async fn place_list_accept() {
        let server = MockServer::start();
        let order = sample_order();

        let place_mock = server.mock(|when, then| {
            when.method(POST).path("/place-order").json_body(serde_json::json!({
                "customer_id": 1,
                "photo": "p.jpg",
                "description": "food",
                "location": "loc"
            }));
            then.status(200).body("Order placed successfully");
        });

        let list_mock = server.mock(|when, then| {
            when.method(GET).path("/orders");
            then.status(200).json_body_obj(&vec![order.clone()]);
        });

        let accept_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/accept-order")
                .json_body(serde_json::json!({ "order_id": 1, "driver_id": 7 }));
            then.status(200).body("Order accepted successfully");
        });

        let client = DeliveryClient::new(&server.base_url()).unwrap();
        client
            .place_order(PlaceOrderRequest {
                customer_id: 1,
                photo: "p.jpg".into(),
                description: "food".into(),
                location: "loc".into(),
            })
            .await
            .unwrap();

        let listed = client.list_orders().await.unwrap();
        assert_eq!(listed, vec![order]);

        client
            .accept_order(AcceptOrderRequest {
                order_id: 1,
                driver_id: 7,
            })
            .await
            .unwrap();

        place_mock.assert();
        list_mock.assert();
        accept_mock.assert();
    }

    #[tokio::test]
    async fn error_status_carries_server_message() {
        let server = MockServer::start();
        let login_mock = server.mock(|when, then| {
            when.method(POST).path("/login");
            then.status(401).body("Invalid username or password");
        });

        let client = DeliveryClient::new(&server.base_url()).unwrap();
        let err = client.login("alice", "wrong").await.unwrap_err();
        let api = err.downcast_ref::<ApiError>().expect("api error");
        assert_eq!(api.status, 401);
        assert_eq!(api.message, "Invalid username or password");

        login_mock.assert();
    }
}
