use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use delivery_types::domain::order::{DriverOrder, NewOrder, Order, OrderStatus};
use delivery_types::domain::user::User;
use delivery_types::ports::order_repository::OrderRepository;
use delivery_types::ports::user_repository::UserRepository;
use delivery_types::ports::RepoError;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepo {
    pub users: Arc<DashMap<String, User>>,
    pub orders: Arc<DashMap<i64, Order>>,
    pub assignments: Arc<DashMap<i64, Vec<DriverOrder>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            assignments: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepo {
    async fn create(&self, user: User) -> Result<(), RepoError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(RepoError::Conflict(format!(
                "username {} already exists",
                user.username
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn password_hash(&self, username: &str) -> Result<Option<String>, RepoError> {
        Ok(self.users.get(username).map(|u| u.password_hash.clone()))
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let order = order.into_order(id, Utc::now());
        self.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get(&self, order_id: i64) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&order_id).map(|r| r.clone()))
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>, RepoError> {
        let mut list: Vec<Order> = self
            .orders
            .iter()
            .filter(|kv| kv.value().status == status)
            .map(|kv| kv.value().clone())
            .collect();
        list.sort_by_key(|o| o.order_id);
        Ok(list)
    }

    async fn accept(&self, order_id: i64, driver_id: i64) -> Result<DriverOrder, RepoError> {
        // The entry guard is held until both writes are done, so concurrent
        // accepts of the same order are serialized here.
        let mut order = self
            .orders
            .get_mut(&order_id)
            .ok_or(RepoError::NotFound(order_id))?;
        if !order.status.can_transition_to(OrderStatus::Accepted) {
            return Err(RepoError::NotPending {
                order_id,
                status: order.status,
            });
        }
        let assignment = DriverOrder::accepted(order_id, driver_id);
        self.assignments
            .entry(order_id)
            .or_default()
            .push(assignment.clone());
        order.status = OrderStatus::Accepted;
        Ok(assignment)
    }

    async fn assignments(&self, order_id: i64) -> Result<Vec<DriverOrder>, RepoError> {
        Ok(self
            .assignments
            .get(&order_id)
            .map(|r| r.clone())
            .unwrap_or_default())
    }
}
