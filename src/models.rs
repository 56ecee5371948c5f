use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    order_items::Model as OrderItemModel,
    orders::Model as OrderModel,
    products::Model as ProductModel,
    sea_orm_active_enums::{OrderStatus, ProductCategory, ProductSize, ProductStatus, UserRole},
    users::Model as UserModel,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub active: bool,
    pub address: Option<String>,
    pub has_image: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub status: ProductStatus,
    pub size: ProductSize,
    pub price: Decimal,
    pub active: bool,
    pub total_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alcoholic: Option<bool>,
    pub has_image: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub price_at_order_time: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            active: model.active,
            address: model.address,
            has_image: model.image_data.is_some_and(|b| !b.is_empty()),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            category: model.category,
            status: model.status,
            size: model.size,
            price: model.price,
            active: model.active,
            total_amount: model.total_amount,
            alcoholic: model.alcoholic,
            has_image: model.image_data.is_some_and(|b| !b.is_empty()),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            address: model.address,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl OrderItem {
    pub fn from_entity(model: OrderItemModel, product: Option<&ProductModel>) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: product.map(|p| p.name.clone()),
            quantity: model.quantity,
            price_at_order_time: model.price_at_order_time,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
