use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Accepted,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
        }
    }

    /// Only `pending -> accepted` is a legal transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!((self, next), (OrderStatus::Pending, OrderStatus::Accepted))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            other => anyhow::bail!("unknown order status: {other}"),
        }
    }
}

/// A delivery request as persisted. `order_id` and `created_at` are assigned
/// by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: i64,
    pub product_photo: String,
    pub description: String,
    pub location: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for placing an order. There is no status field: new orders are
/// always inserted as pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub product_photo: String,
    pub description: String,
    pub location: String,
}

impl NewOrder {
    pub fn new(
        customer_id: i64,
        product_photo: String,
        description: String,
        location: String,
    ) -> Self {
        Self {
            customer_id,
            product_photo,
            description,
            location,
        }
    }

    pub fn into_order(self, order_id: i64, created_at: DateTime<Utc>) -> Order {
        Order {
            order_id,
            customer_id: self.customer_id,
            product_photo: self.product_photo,
            description: self.description,
            location: self.location,
            status: OrderStatus::Pending,
            created_at,
        }
    }
}

/// Assignment of an accepted order to the driver who accepted it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverOrder {
    pub order_id: i64,
    pub driver_id: i64,
    pub status: OrderStatus,
}

impl DriverOrder {
    pub fn accepted(order_id: i64, driver_id: i64) -> Self {
        Self {
            order_id,
            driver_id,
            status: OrderStatus::Accepted,
        }
    }
}
