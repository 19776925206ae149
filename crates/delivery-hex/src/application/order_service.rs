use crate::errors::AppError;
use delivery_types::domain::order::{DriverOrder, NewOrder, Order, OrderStatus};
use delivery_types::ports::order_repository::OrderRepository;

pub struct OrderService<R: OrderRepository> {
    repo: R,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn place(
        &self,
        customer_id: i64,
        photo: String,
        description: String,
        location: String,
    ) -> Result<Order, AppError> {
        let order = self
            .repo
            .insert(NewOrder::new(customer_id, photo, description, location))
            .await
            .map_err(|e| AppError::Store("Failed to place order", e))?;
        tracing::info!(order_id = order.order_id, customer_id, "order placed");
        Ok(order)
    }

    /// Orders still waiting for a driver. Empty when there are none.
    pub async fn list_available(&self) -> Result<Vec<Order>, AppError> {
        self.repo
            .list_by_status(OrderStatus::Pending)
            .await
            .map_err(|e| AppError::Store("Failed to retrieve orders", e))
    }

    /// Move a pending order to accepted and assign it to `driver_id`.
    /// The store applies both writes in one transaction; nothing is retried.
    pub async fn accept(&self, order_id: i64, driver_id: i64) -> Result<DriverOrder, AppError> {
        match self.repo.accept(order_id, driver_id).await {
            Ok(assignment) => {
                tracing::info!(order_id, driver_id, "order accepted");
                Ok(assignment)
            }
            Err(e) => {
                tracing::warn!(order_id, driver_id, error = %e, "accept failed");
                Err(AppError::from_accept(e))
            }
        }
    }

    pub async fn get_order(&self, order_id: i64) -> Result<Order, AppError> {
        match self
            .repo
            .get(order_id)
            .await
            .map_err(|e| AppError::Store("Failed to retrieve order", e))?
        {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("Order {order_id} not found"))),
        }
    }

    pub async fn assignments(&self, order_id: i64) -> Result<Vec<DriverOrder>, AppError> {
        self.repo
            .assignments(order_id)
            .await
            .map_err(|e| AppError::Store("Failed to retrieve driver orders", e))
    }
}
