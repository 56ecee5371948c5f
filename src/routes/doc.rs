use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        orders::{
            CreateOrderRequest, OrderItemList, OrderItemRequest, OrderList, OrderWithItems,
            ProcessOrderRequest, ProcessOrderResponse, UpdateOrderRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        users::UpdateUserRequest,
    },
    entity::sea_orm_active_enums::{
        OrderStatus, ProductCategory, ProductSize, ProductStatus, UserRole,
    },
    error::ErrorBody,
    models::{Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{health, orders, params, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::get_user,
        users::update_user,
        users::deactivate_user,
        users::set_photo,
        users::get_photo,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::set_photo,
        products::get_photo,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::process_order,
        orders::delete_order,
        orders::list_items,
        orders::add_product,
        orders::remove_product,
        orders::set_quantity
    ),
    components(
        schemas(
            User,
            Product,
            Order,
            OrderItem,
            OrderStatus,
            ProductCategory,
            ProductSize,
            ProductStatus,
            UserRole,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateUserRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateOrderRequest,
            OrderItemRequest,
            UpdateOrderRequest,
            ProcessOrderRequest,
            ProcessOrderResponse,
            OrderWithItems,
            OrderItemList,
            OrderList,
            params::SortOrder,
            ErrorBody,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<ProcessOrderResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Users", description = "Registration, login and account endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Orders", description = "Order and line-item endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
