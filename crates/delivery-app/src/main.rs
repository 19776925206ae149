use delivery_hex::application::auth_service::AuthService;
use delivery_hex::application::order_service::OrderService;
use delivery_hex::config::Config;
use delivery_hex::inbound::http::{HttpServer, HttpServerConfig};
use delivery_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT / JWT_SECRET when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "loaded config");

    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    let auth = AuthService::new(repo.clone(), config.auth()?);
    let orders = OrderService::new(repo);

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let http = HttpServer::new(auth, orders, server_cfg).await?;
    http.run().await
}
