use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pizza_order_api::{
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::{LoginRequest, RegisterRequest},
        orders::{
            CreateOrderRequest, OrderItemRequest, ProcessOrderRequest, UpdateOrderRequest,
        },
        products::UpdateProductRequest,
    },
    entity::{
        OrderItems,
        order_items::Column as OrderItemCol,
        products::{ActiveModel as ProductActive, Model as ProductModel},
        sea_orm_active_enums::{
            OrderStatus, ProductCategory, ProductSize, ProductStatus, UserRole,
        },
        users::ActiveModel as UserActive,
    },
    error::AppError,
    geo::{DistanceEstimator, EstimateError, FixedEstimator, RouteEstimate},
    middleware::auth::AuthUser,
    services::{auth_service, order_service, product_service, user_service},
    state::{AppState, AuthSettings},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

// Each test creates its own users and products, so they can share a database
// and run concurrently.
async fn setup_state(estimator: Arc<dyn DistanceEstimator>) -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run order flow tests.");
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    Ok(Some(AppState {
        orm,
        estimator,
        auth: AuthSettings {
            jwt_secret: "flow-secret".into(),
            token_ttl_hours: 1,
        },
    }))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

async fn create_user(state: &AppState, role: UserRole, address: &str) -> anyhow::Result<AuthUser> {
    let name = unique("user");
    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(name.clone()),
        email: Set(format!("{name}@pizza.example")),
        password_hash: Set("unused".into()),
        role: Set(role),
        active: Set(true),
        address: Set(Some(address.to_string())),
        image_data: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

async fn create_product(
    state: &AppState,
    category: ProductCategory,
    cents: i64,
) -> anyhow::Result<ProductModel> {
    let now = Utc::now();
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(unique("product")),
        description: Set(None),
        category: Set(category),
        status: Set(ProductStatus::Active),
        size: Set(ProductSize::Medium),
        price: Set(Decimal::new(cents, 2)),
        active: Set(true),
        total_amount: Set(Decimal::ZERO),
        alcoholic: Set((category == ProductCategory::Drink).then_some(false)),
        image_data: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

struct UnreachableProvider;

#[async_trait]
impl DistanceEstimator for UnreachableProvider {
    async fn estimate(&self, _from: &str, _to: &str) -> Result<RouteEstimate, EstimateError> {
        Err(EstimateError::InvalidRequest("no usable provider URL".into()))
    }
}

fn item(product_id: Uuid, quantity: i32) -> OrderItemRequest {
    OrderItemRequest {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn order_lifecycle_merges_items_and_processes_once() -> anyhow::Result<()> {
    let route = RouteEstimate {
        distance_km: 3.2,
        eta_minutes: 11.0,
    };
    let Some(state) = setup_state(Arc::new(FixedEstimator(Some(route)))).await? else {
        return Ok(());
    };

    let customer = create_user(&state, UserRole::Customer, "Corso Francia 50").await?;
    let employee = create_user(&state, UserRole::Employee, "Via Garibaldi 12").await?;
    let pizza = create_product(&state, ProductCategory::Pizza, 850).await?;
    let drink = create_product(&state, ProductCategory::Drink, 250).await?;

    let created = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            address: "Corso Francia 50".into(),
            user_id: customer.user_id,
            items: vec![item(pizza.id, 1), item(drink.id, 2)],
        },
    )
    .await?
    .data
    .unwrap();
    let order_id = created.order.id;
    assert_eq!(created.order.status, OrderStatus::New);
    assert_eq!(created.items.len(), 2);

    // A later price change must not affect the existing snapshot.
    product_service::update_product(
        &state,
        &employee,
        pizza.id,
        UpdateProductRequest {
            price: Some(Decimal::new(900, 2)),
            ..Default::default()
        },
    )
    .await?;

    let merged = order_service::add_product(&state, &customer, order_id, item(pizza.id, 3))
        .await?
        .data
        .unwrap();
    assert_eq!(merged.items.len(), 2);
    let pizza_line = merged
        .items
        .iter()
        .find(|i| i.product_id == pizza.id)
        .unwrap();
    assert_eq!(pizza_line.quantity, 4);
    assert_eq!(pizza_line.price_at_order_time, Decimal::new(850, 2));

    let err = order_service::set_quantity(&state, &customer, order_id, drink.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidQuantity(_)));
    let items = order_service::list_items(&state, &customer, order_id)
        .await?
        .data
        .unwrap()
        .items;
    let drink_line = items.iter().find(|i| i.product_id == drink.id).unwrap();
    assert_eq!(drink_line.quantity, 2);

    let replaced = order_service::set_quantity(&state, &customer, order_id, drink.id, 5)
        .await?
        .data
        .unwrap();
    assert_eq!(replaced.quantity, 5);

    let err = order_service::remove_product(&state, &customer, order_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let remaining = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    assert_eq!(remaining, 2);

    let processed = order_service::process_order(
        &state,
        &employee,
        order_id,
        ProcessOrderRequest {
            employee_id: employee.user_id,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(processed.order.order.status, OrderStatus::Processing);
    assert_eq!(processed.distance, 3.2);
    assert_eq!(processed.time, 11.0);
    let processed_at = processed.order.order.updated_at;

    let err = order_service::process_order(
        &state,
        &employee,
        order_id,
        ProcessOrderRequest {
            employee_id: employee.user_id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::OrderNotProcessable(_)));
    let unchanged = order_service::get_order(&state, &customer, order_id)
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(unchanged.status, OrderStatus::Processing);
    assert_eq!(unchanged.updated_at, processed_at);

    let err = order_service::update_order(
        &state,
        &employee,
        order_id,
        UpdateOrderRequest {
            status: Some("DONE".into()),
            address: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let completed = order_service::update_order(
        &state,
        &employee,
        order_id,
        UpdateOrderRequest {
            status: Some("COMPLETED".into()),
            address: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(completed.order.status, OrderStatus::Completed);

    order_service::delete_order(&state, &employee, order_id).await?;
    let err = order_service::get_order(&state, &employee, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let orphaned = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orphaned, 0);

    Ok(())
}

#[tokio::test]
async fn duplicate_products_in_a_new_order_are_consolidated() -> anyhow::Result<()> {
    let Some(state) = setup_state(Arc::new(FixedEstimator::default())).await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::Customer, "Corso Francia 50").await?;
    let pizza = create_product(&state, ProductCategory::Pizza, 1100).await?;

    let created = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            address: "Corso Francia 50".into(),
            user_id: customer.user_id,
            items: vec![item(pizza.id, 1), item(pizza.id, 2)],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].quantity, 3);

    let err = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            address: "Corso Francia 50".into(),
            user_id: customer.user_id,
            items: vec![item(Uuid::new_v4(), 1)],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn processing_without_a_route_reports_zero() -> anyhow::Result<()> {
    let Some(state) = setup_state(Arc::new(FixedEstimator::default())).await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::Customer, "Corso Francia 50").await?;
    let employee = create_user(&state, UserRole::Employee, "Via Garibaldi 12").await?;
    let pizza = create_product(&state, ProductCategory::Pizza, 800).await?;

    let order_id = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            address: "Corso Francia 50".into(),
            user_id: customer.user_id,
            items: vec![item(pizza.id, 1)],
        },
    )
    .await?
    .data
    .unwrap()
    .order
    .id;

    let err = order_service::process_order(
        &state,
        &employee,
        order_id,
        ProcessOrderRequest {
            employee_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let processed = order_service::process_order(
        &state,
        &employee,
        order_id,
        ProcessOrderRequest {
            employee_id: employee.user_id,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(processed.distance, 0.0);
    assert_eq!(processed.time, 0.0);

    Ok(())
}

#[tokio::test]
async fn product_category_is_fixed_after_creation() -> anyhow::Result<()> {
    let Some(state) = setup_state(Arc::new(FixedEstimator::default())).await? else {
        return Ok(());
    };
    let employee = create_user(&state, UserRole::Employee, "Via Garibaldi 12").await?;
    let sauce = create_product(&state, ProductCategory::Sauce, 100).await?;

    let err = product_service::update_product(
        &state,
        &employee,
        sauce.id,
        UpdateProductRequest {
            category: Some(ProductCategory::Drink),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidProductUpdate(_)));

    let err = product_service::update_product(
        &state,
        &employee,
        sauce.id,
        UpdateProductRequest {
            alcoholic: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidProductUpdate(_)));

    Ok(())
}

#[tokio::test]
async fn deactivated_accounts_cannot_log_in() -> anyhow::Result<()> {
    let Some(state) = setup_state(Arc::new(FixedEstimator::default())).await? else {
        return Ok(());
    };
    let username = unique("anna");
    let register = || RegisterRequest {
        username: username.clone(),
        email: format!("{username}@pizza.example"),
        password: "margherita42".into(),
        role: None,
        address: Some("Via Po 3".into()),
    };

    let user = auth_service::register_user(&state, None, register())
        .await?
        .data
        .unwrap();
    assert_eq!(user.role, UserRole::Customer);

    let err = auth_service::register_user(&state, None, register())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyExists(_)));

    let login = || LoginRequest {
        username: username.clone(),
        password: "margherita42".into(),
    };
    let session = auth_service::login_user(&state, login()).await?.data.unwrap();
    assert_eq!(session.user_id, user.id);

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            username: username.clone(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let me = AuthUser {
        user_id: user.id,
        role: UserRole::Customer,
    };
    user_service::deactivate_user(&state, &me, user.id).await?;
    let err = auth_service::login_user(&state, login()).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn estimator_failure_leaves_the_order_new() -> anyhow::Result<()> {
    let Some(state) = setup_state(Arc::new(UnreachableProvider)).await? else {
        return Ok(());
    };
    let customer = create_user(&state, UserRole::Customer, "Corso Francia 50").await?;
    let employee = create_user(&state, UserRole::Employee, "Via Garibaldi 12").await?;
    let pizza = create_product(&state, ProductCategory::Pizza, 950).await?;

    let created = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            address: "Corso Francia 50".into(),
            user_id: customer.user_id,
            items: vec![item(pizza.id, 1)],
        },
    )
    .await?
    .data
    .unwrap()
    .order;

    let err = order_service::process_order(
        &state,
        &employee,
        created.id,
        ProcessOrderRequest {
            employee_id: employee.user_id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::FailedCalculation(_)));

    let reread = order_service::get_order(&state, &customer, created.id)
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(reread.status, OrderStatus::New);
    assert_eq!(reread.updated_at, created.updated_at);

    Ok(())
}
