///  To run :
///  cargo r --example client_example
use delivery_client::{AcceptOrderRequest, DeliveryClient, PlaceOrderRequest, RegisterRequest};
use delivery_hex::application::auth_service::{AuthConfig, AuthService};
use delivery_hex::application::order_service::OrderService;
use delivery_hex::inbound::http::{HttpServer, HttpServerConfig};
use delivery_repo::build_repo;
use delivery_types::domain::user::Role;
use tempfile::tempdir;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let port = find_free_port();
    let addr = format!("http://127.0.0.1:{port}/");

    // Use a temp file-backed SQLite DB so multiple connections see the same data.
    let tmp = tempdir()?;
    let db_path = tmp.path().join("delivery.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let repo = build_repo(Some(&db_url)).await?;
    let auth = AuthService::new(repo.clone(), AuthConfig::new("example-secret"));
    let orders = OrderService::new(repo);
    let server = HttpServer::new(
        auth,
        orders,
        HttpServerConfig {
            port: port.to_string(),
        },
    )
    .await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            eprintln!("server error: {e}");
        }
    });

    // Give the server a moment to start.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let client = DeliveryClient::new(&addr)?;
    let registered = client
        .register(RegisterRequest {
            username: "alice".into(),
            password: "pw123".into(),
            role: Role::Customer,
            phone: "555".into(),
        })
        .await?;
    println!("registered: {}", registered.message);

    let token = client.login("alice", "pw123").await?;
    println!("login token: {}...", &token[..token.len().min(16)]);

    client
        .place_order(PlaceOrderRequest {
            customer_id: 1,
            photo: "p.jpg".into(),
            description: "food".into(),
            location: "loc".into(),
        })
        .await?;

    let available = client.list_orders().await?;
    println!("available orders: {}", available.len());

    if let Some(order) = available.first() {
        client
            .accept_order(AcceptOrderRequest {
                order_id: order.order_id,
                driver_id: 7,
            })
            .await?;
        println!("order {} accepted by driver 7", order.order_id);
    }

    println!("still available: {}", client.list_orders().await?.len());

    handle.abort();
    Ok(())
}
