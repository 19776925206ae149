#![cfg(feature = "sqlite")]

use delivery_repo::sqlite::SqliteRepo;
use delivery_types::domain::order::{DriverOrder, NewOrder, OrderStatus};
use delivery_types::domain::user::{Role, User};
use delivery_types::ports::order_repository::OrderRepository;
use delivery_types::ports::user_repository::UserRepository;
use delivery_types::ports::{RepoError, TxStage};
use std::path::PathBuf;

fn temp_db_url() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut path = PathBuf::from(dir.path());
    path.push("delivery.db");
    let url = format!("sqlite://{}", path.display());
    (dir, url)
}

fn sample_order() -> NewOrder {
    NewOrder::new(1, "p.jpg".into(), "food".into(), "loc".into())
}

#[tokio::test]
async fn sqlite_repo_order_flow() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();

    let order = repo.insert(sample_order()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_id, 1);
    assert_eq!(order.product_photo, "p.jpg");

    let listed = repo.list_by_status(OrderStatus::Pending).await.unwrap();
    assert_eq!(listed, vec![order.clone()]);

    let assignment = repo.accept(order.order_id, 7).await.unwrap();
    assert_eq!(assignment, DriverOrder::accepted(order.order_id, 7));

    assert!(repo
        .list_by_status(OrderStatus::Pending)
        .await
        .unwrap()
        .is_empty());
    let accepted = repo.list_by_status(OrderStatus::Accepted).await.unwrap();
    assert_eq!(accepted.len(), 1);
    assert_eq!(
        repo.assignments(order.order_id).await.unwrap(),
        vec![DriverOrder::accepted(order.order_id, 7)]
    );
}

#[tokio::test]
async fn sqlite_repo_guards_accept() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let order = repo.insert(sample_order()).await.unwrap();

    repo.accept(order.order_id, 7).await.unwrap();
    assert!(matches!(
        repo.accept(order.order_id, 8).await,
        Err(RepoError::NotPending { .. })
    ));
    assert!(matches!(
        repo.accept(order.order_id + 100, 8).await,
        Err(RepoError::NotFound(_))
    ));
    assert_eq!(repo.assignments(order.order_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_repo_rolls_back_when_assignment_insert_fails() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let order = repo.insert(sample_order()).await.unwrap();

    sqlx::query(
        "CREATE TRIGGER fail_assignment BEFORE INSERT ON driver_orders
         BEGIN SELECT RAISE(ABORT, 'assignment rejected'); END",
    )
    .execute(repo.pool())
    .await
    .unwrap();

    let res = repo.accept(order.order_id, 7).await;
    assert!(matches!(
        res,
        Err(RepoError::Transaction {
            stage: TxStage::InsertAssignment,
            ..
        })
    ));

    let after = repo.get(order.order_id).await.unwrap().unwrap();
    assert_eq!(after.status, OrderStatus::Pending);
    assert!(repo.assignments(order.order_id).await.unwrap().is_empty());

    sqlx::query("DROP TRIGGER fail_assignment")
        .execute(repo.pool())
        .await
        .unwrap();
    repo.accept(order.order_id, 7).await.unwrap();
    assert_eq!(repo.assignments(order.order_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_repo_concurrent_accepts_assign_once() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let order = repo.insert(sample_order()).await.unwrap();

    let order_id = order.order_id;
    let handles: Vec<_> = (1..=4)
        .map(|driver_id| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.accept(order_id, driver_id).await })
        })
        .collect();

    let mut succeeded = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(repo.assignments(order_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sqlite_repo_users_are_unique() {
    let (_dir, url) = temp_db_url();
    let repo = SqliteRepo::new(&url).await.unwrap();
    let user = User::new("alice".into(), "hash".into(), Role::Driver, "555".into()).unwrap();

    repo.create(user.clone()).await.unwrap();
    assert_eq!(
        repo.password_hash("alice").await.unwrap().as_deref(),
        Some("hash")
    );
    assert!(repo.password_hash("bob").await.unwrap().is_none());
    assert!(matches!(
        repo.create(user).await,
        Err(RepoError::Conflict(_))
    ));
}

#[tokio::test]
async fn sqlite_repo_reopens_existing_database() {
    let (_dir, url) = temp_db_url();
    let order_id = {
        let repo = SqliteRepo::new(&url).await.unwrap();
        repo.insert(sample_order()).await.unwrap().order_id
    };
    let repo = SqliteRepo::new(&url).await.unwrap();
    let order = repo.get(order_id).await.unwrap().unwrap();
    assert_eq!(order.description, "food");
}
