use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    dto::validation::{Violations, char_len, is_blank},
    error::AppResult,
    models::{Order, OrderItem},
};

const MAX_ADDRESS_LEN: usize = 50;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    #[serde(alias = "productId")]
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub address: String,
    #[serde(alias = "userId")]
    pub user_id: Uuid,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        v.check(!is_blank(&self.address), "address", "Address is required");
        v.check(
            char_len(self.address.trim()) <= MAX_ADDRESS_LEN,
            "address",
            "Address must be at most 50 characters",
        );
        v.check(
            !self.items.is_empty(),
            "items",
            "Order must contain at least one item",
        );
        v.into_result()
    }
}

pub type AddProductRequest = OrderItemRequest;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub address: Option<String>,
}

impl UpdateOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        if let Some(address) = &self.address {
            v.check(
                !is_blank(address) && char_len(address.trim()) <= MAX_ADDRESS_LEN,
                "address",
                "Address must be between 1 and 50 characters",
            );
        }
        v.into_result()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessOrderRequest {
    #[serde(alias = "employeeId")]
    pub employee_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewCountQuery {
    #[serde(alias = "newCount")]
    pub new_count: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Result of processing: the order plus the route estimate in km and minutes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProcessOrderResponse {
    pub order: OrderWithItems,
    pub distance: f64,
    pub time: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderItemList {
    #[schema(value_type = Vec<OrderItem>)]
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
