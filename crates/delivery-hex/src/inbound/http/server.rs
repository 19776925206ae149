use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    serve, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use super::extract::JsonBody;
use crate::application::auth_service::AuthService;
use crate::application::order_service::OrderService;
use crate::errors::AppError;
use delivery_types::domain::order::Order;
use delivery_types::domain::user::Role;
use delivery_types::ports::DeliveryRepository;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// Services shared by every handler. Requests hold no other state.
pub struct AppState<R: DeliveryRepository> {
    pub auth: Arc<AuthService<R>>,
    pub orders: Arc<OrderService<R>>,
}

impl<R: DeliveryRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
            orders: self.orders.clone(),
        }
    }
}

pub struct HttpServer<R: DeliveryRepository> {
    pub state: AppState<R>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_id: i64,
    pub photo: String,
    pub description: String,
    pub location: String,
}

#[derive(Deserialize)]
pub struct AcceptOrderRequest {
    pub order_id: i64,
    pub driver_id: i64,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

impl<R: DeliveryRepository> HttpServer<R> {
    pub async fn new(
        auth: AuthService<R>,
        orders: OrderService<R>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            state: AppState {
                auth: Arc::new(auth),
                orders: Arc::new(orders),
            },
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health).fallback(method_not_allowed))
            .route(
                "/register",
                post(register::<R>).fallback(method_not_allowed),
            )
            .route("/login", post(login::<R>).fallback(method_not_allowed))
            .route(
                "/place-order",
                post(place_order::<R>).fallback(method_not_allowed),
            )
            .route(
                "/orders",
                get(available_orders::<R>).fallback(method_not_allowed),
            )
            .route(
                "/accept-order",
                post(accept_order::<R>).fallback(method_not_allowed),
            )
            .layer(trace_layer)
            .with_state(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn register<R: DeliveryRepository>(
    State(state): State<AppState<R>>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let token = state
        .auth
        .register(
            payload.username,
            payload.password,
            payload.role,
            payload.phone,
        )
        .await?;
    Ok(Json(RegisterResponse {
        message: "User registered successfully".into(),
        token,
    }))
}

async fn login<R: DeliveryRepository>(
    State(state): State<AppState<R>>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state
        .auth
        .login(&payload.username, payload.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

async fn place_order<R: DeliveryRepository>(
    State(state): State<AppState<R>>,
    JsonBody(payload): JsonBody<PlaceOrderRequest>,
) -> Result<&'static str, AppError> {
    state
        .orders
        .place(
            payload.customer_id,
            payload.photo,
            payload.description,
            payload.location,
        )
        .await?;
    Ok("Order placed successfully")
}

async fn available_orders<R: DeliveryRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<Order>>, AppError> {
    let list = state.orders.list_available().await?;
    Ok(Json(list))
}

async fn accept_order<R: DeliveryRepository>(
    State(state): State<AppState<R>>,
    JsonBody(payload): JsonBody<AcceptOrderRequest>,
) -> Result<&'static str, AppError> {
    state
        .orders
        .accept(payload.order_id, payload.driver_id)
        .await?;
    Ok("Order accepted successfully")
}
