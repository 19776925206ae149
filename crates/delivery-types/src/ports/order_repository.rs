use async_trait::async_trait;

use super::RepoError;
use crate::domain::order::{DriverOrder, NewOrder, Order, OrderStatus};

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Insert a new order in status `pending`; the store assigns id and timestamp.
    async fn insert(&self, order: NewOrder) -> Result<Order, RepoError>;

    async fn get(&self, order_id: i64) -> Result<Option<Order>, RepoError>;

    /// Orders in `status`, ascending by `order_id`.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepoError>;

    /// Mark a pending order accepted and record the driver assignment as one
    /// atomic unit. Either both writes land or neither does.
    ///
    /// Returns `NotFound` for an unknown order and `NotPending` when the order
    /// has already left `pending`; in both cases nothing is written.
    async fn accept(&self, order_id: i64, driver_id: i64) -> Result<DriverOrder, RepoError>;

    async fn assignments(&self, order_id: i64) -> Result<Vec<DriverOrder>, RepoError>;
}
