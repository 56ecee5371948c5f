//! Order lifecycle rules.
//!
//! ```text
//! NEW ──► PROCESSING ──► COMPLETED
//!  │           │
//!  └───────────┴───────► CANCELLED
//! ```

use std::fmt;
use std::str::FromStr;

use crate::entity::sea_orm_active_enums::OrderStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid order status: {0}")]
pub struct UnknownStatus(pub String);

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Only a NEW order may be picked up by an employee.
    pub fn can_process(&self) -> bool {
        *self == OrderStatus::New
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::New, OrderStatus::Processing)
                | (OrderStatus::New, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Completed)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    /// Accepts exactly the upper-case names stored in the database.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "COMPLETED" => Ok(OrderStatus::Completed),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
