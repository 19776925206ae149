#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use delivery_types::domain::order::*;
use delivery_types::domain::user::User;
use delivery_types::ports::order_repository::OrderRepository;
use delivery_types::ports::user_repository::UserRepository;
use delivery_types::ports::RepoError;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub const DEFAULT_SQLITE_URL: &str = "sqlite://delivery.db";

/// Store selected at startup. Cloning is cheap: both adapters share their
/// state behind `Arc`s / a connection pool.
#[derive(Clone)]
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        if let Some(url) = url {
            tracing::warn!(%url, "sqlite feature disabled; ignoring DATABASE_URL");
        }
        Ok(Self::Memory(crate::memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or(DEFAULT_SQLITE_URL);
        tracing::info!(%url, "using sqlite store");
        Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // If both features are enabled, an explicit URL picks sqlite.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => {
                tracing::info!(%url, "using sqlite store");
                Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
            }
            None => {
                tracing::info!("using in-memory store");
                Ok(Self::Memory(crate::memory::InMemoryRepo::new()))
            }
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait::async_trait]
impl UserRepository for Repo {
    async fn create(&self, user: User) -> Result<(), RepoError> {
        dispatch!(self, r => r.create(user).await)
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, RepoError> {
        dispatch!(self, r => r.password_hash(username).await)
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepoError> {
        dispatch!(self, r => r.insert(order).await)
    }

    async fn get(&self, order_id: i64) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get(order_id).await)
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_by_status(status).await)
    }

    async fn accept(&self, order_id: i64, driver_id: i64) -> Result<DriverOrder, RepoError> {
        dispatch!(self, r => r.accept(order_id, driver_id).await)
    }

    async fn assignments(&self, order_id: i64) -> Result<Vec<DriverOrder>, RepoError> {
        dispatch!(self, r => r.assignments(order_id).await)
    }
}
