use async_trait::async_trait;
use chrono::{DateTime, Utc};
use delivery_types::domain::order::{DriverOrder, NewOrder, Order, OrderStatus};
use delivery_types::domain::user::User;
use delivery_types::ports::order_repository::OrderRepository;
use delivery_types::ports::user_repository::UserRepository;
use delivery_types::ports::{RepoError, TxStage};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

const SCHEMA: &str = include_str!("../migrations/0001_create_delivery.sql");

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbOrder {
    order_id: i64,
    customer_id: i64,
    product_photo: String,
    description: String,
    location: String,
    status: String,
    created_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = parse_status(&self.status)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| RepoError::DbError(e.to_string()))?
            .with_timezone(&Utc);
        Ok(Order {
            order_id: self.order_id,
            customer_id: self.customer_id,
            product_photo: self.product_photo,
            description: self.description,
            location: self.location,
            status,
            created_at,
        })
    }
}

#[derive(FromRow)]
struct DbDriverOrder {
    order_id: i64,
    driver_id: i64,
    status: String,
}

fn parse_status(s: &str) -> Result<OrderStatus, RepoError> {
    OrderStatus::from_str(s).map_err(|e| RepoError::DbError(e.to_string()))
}

fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::DbError(e.to_string())
}

async fn rollback(tx: Transaction<'_, Sqlite>) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "rollback failed");
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if !in_memory {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database.
        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options.max_connections(1);
        }
        let pool = pool_options.connect_with(options).await?;

        for stmt in SCHEMA.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserRepository for SqliteRepo {
    async fn create(&self, user: User) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO users (username, password_hash, role, phone_number) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.phone)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepoError::Conflict(format!("username {} already exists", user.username))
            }
            other => db_err(other),
        })?;
        Ok(())
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, RepoError> {
        sqlx::query_scalar("SELECT password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepoError> {
        let row: DbOrder = sqlx::query_as(
            "INSERT INTO orders (customer_id, product_photo, description, location, status)
             VALUES (?, ?, ?, ?, 'pending')
             RETURNING order_id, customer_id, product_photo, description, location, status, created_at",
        )
        .bind(order.customer_id)
        .bind(&order.product_photo)
        .bind(&order.description)
        .bind(&order.location)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        row.into_order()
    }

    async fn get(&self, order_id: i64) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(
            "SELECT order_id, customer_id, product_photo, description, location, status, created_at
             FROM orders WHERE order_id = ?",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(
            "SELECT order_id, customer_id, product_photo, description, location, status, created_at
             FROM orders WHERE status = ? ORDER BY order_id",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn accept(&self, order_id: i64, driver_id: i64) -> Result<DriverOrder, RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::tx(TxStage::Begin, e))?;

        let updated = match sqlx::query(
            "UPDATE orders SET status = 'accepted' WHERE order_id = ? AND status = 'pending'",
        )
        .bind(order_id)
        .execute(&mut *tx)
        .await
        {
            Ok(res) => res.rows_affected(),
            Err(e) => {
                rollback(tx).await;
                return Err(RepoError::tx(TxStage::UpdateStatus, e));
            }
        };

        if updated == 0 {
            let current: Result<Option<String>, sqlx::Error> =
                sqlx::query_scalar("SELECT status FROM orders WHERE order_id = ?")
                    .bind(order_id)
                    .fetch_optional(&mut *tx)
                    .await;
            rollback(tx).await;
            return match current {
                Ok(None) => Err(RepoError::NotFound(order_id)),
                Ok(Some(s)) => Err(RepoError::NotPending {
                    order_id,
                    status: parse_status(&s)?,
                }),
                Err(e) => Err(RepoError::tx(TxStage::UpdateStatus, e)),
            };
        }

        let assignment = DriverOrder::accepted(order_id, driver_id);
        if let Err(e) =
            sqlx::query("INSERT INTO driver_orders (order_id, driver_id, status) VALUES (?, ?, ?)")
                .bind(assignment.order_id)
                .bind(assignment.driver_id)
                .bind(assignment.status.as_str())
                .execute(&mut *tx)
                .await
        {
            rollback(tx).await;
            return Err(RepoError::tx(TxStage::InsertAssignment, e));
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::tx(TxStage::Commit, e))?;
        Ok(assignment)
    }

    async fn assignments(&self, order_id: i64) -> Result<Vec<DriverOrder>, RepoError> {
        let rows: Vec<DbDriverOrder> = sqlx::query_as(
            "SELECT order_id, driver_id, status FROM driver_orders WHERE order_id = ? ORDER BY rowid",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|r| {
                Ok(DriverOrder {
                    order_id: r.order_id,
                    driver_id: r.driver_id,
                    status: parse_status(&r.status)?,
                })
            })
            .collect()
    }
}
