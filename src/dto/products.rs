use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::validation::{Violations, char_len, is_blank},
    entity::sea_orm_active_enums::{ProductCategory, ProductSize, ProductStatus},
    error::AppResult,
    models::Product,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    #[serde(default = "default_status")]
    pub status: ProductStatus,
    pub size: ProductSize,
    pub price: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub total_amount: Decimal,
    pub alcoholic: Option<bool>,
}

fn default_status() -> ProductStatus {
    ProductStatus::Active
}

fn default_active() -> bool {
    true
}

impl CreateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        v.check(!is_blank(&self.name), "name", "Name is required");
        v.check(char_len(&self.name) <= 100, "name", "Name is too long");
        v.check(
            self.price >= Decimal::ZERO,
            "price",
            "Price must not be negative",
        );
        v.check(
            self.total_amount >= Decimal::ZERO,
            "total_amount",
            "Total amount must not be negative",
        );
        v.into_result()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProductCategory>,
    pub status: Option<ProductStatus>,
    pub size: Option<ProductSize>,
    pub price: Option<Decimal>,
    pub active: Option<bool>,
    pub total_amount: Option<Decimal>,
    pub alcoholic: Option<bool>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        if let Some(name) = &self.name {
            v.check(
                !is_blank(name) && char_len(name) <= 100,
                "name",
                "Name must be between 1 and 100 characters",
            );
        }
        if let Some(price) = self.price {
            v.check(price >= Decimal::ZERO, "price", "Price must not be negative");
        }
        if let Some(total) = self.total_amount {
            v.check(
                total >= Decimal::ZERO,
                "total_amount",
                "Total amount must not be negative",
            );
        }
        v.into_result()
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
