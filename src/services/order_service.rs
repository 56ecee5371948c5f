use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    domain::line_items::{self, ExistingLine, LineItemChange},
    dto::orders::{
        AddProductRequest, CreateOrderRequest, OrderItemList, OrderList, OrderWithItems,
        ProcessOrderRequest, ProcessOrderResponse, UpdateOrderRequest,
    },
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
            Relation as OrderRelation,
        },
        products::{Column as ProdCol, Entity as Products},
        sea_orm_active_enums::OrderStatus,
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_employee, ensure_self_or_employee},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

fn order_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Order with ID {id} not found"))
}

fn product_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Product with ID {id} not found"))
}

fn user_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User with ID {id} not found"))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    // Customers only ever see their own orders.
    let user_filter = if user.is_employee() {
        query.user_id
    } else {
        Some(user.user_id)
    };
    if let Some(user_id) = user_filter {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(after) = query.created_after {
        condition = condition.add(OrderCol::CreatedAt.gte(after));
    }
    if let Some(before) = query.created_before {
        condition = condition.add(OrderCol::CreatedAt.lte(before));
    }

    let mut finder = Orders::find();
    if let Some(username) = query.username.as_deref().filter(|s| !s.is_empty()) {
        finder = finder
            .join(JoinType::InnerJoin, OrderRelation::Users.def())
            .filter(UserCol::Username.eq(username));
    }
    finder = finder.filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;
    ensure_self_or_employee(user, payload.user_id)?;

    let requested: Vec<(Uuid, i32)> = payload
        .items
        .iter()
        .map(|item| (item.product_id, item.quantity))
        .collect();
    let lines = line_items::consolidate(&requested)?;

    let txn = state.orm.begin().await?;

    Users::find_by_id(payload.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| user_not_found(payload.user_id))?;

    let product_ids: Vec<Uuid> = lines.iter().map(|(id, _)| *id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        address: Set(payload.address.trim().to_string()),
        status: Set(OrderStatus::New),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (product_id, quantity) in lines {
        let product = products
            .get(&product_id)
            .ok_or_else(|| product_not_found(product_id))?;
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            price_at_order_time: Set(product.price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from_entity(item, Some(product)));
    }

    txn.commit().await?;

    tracing::info!(order_id = %order.id, user_id = %order.user_id, items = items.len(), "order created");

    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    ensure_self_or_employee(user, order.user_id)?;

    let items = load_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success(
        "Ok",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Administrative override of status and address.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_employee(user)?;
    payload.validate()?;
    let status = payload
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let txn = state.orm.begin().await?;
    let order = find_for_update(&txn, id).await?;

    let current = order.status;
    let mut active: OrderActive = order.into();
    if let Some(next) = status {
        if next != current && !current.can_transition_to(next) {
            tracing::warn!(order_id = %id, from = %current, to = %next, "status overridden outside the lifecycle");
        }
        active.status = Set(next);
    }
    if let Some(address) = payload.address {
        active.address = Set(address.trim().to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    let items = load_items(&txn, order.id).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, status = %order.status, "order updated");

    Ok(ApiResponse::success(
        "Order updated",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| order_not_found(id))?;
    ensure_self_or_employee(user, order.user_id)?;

    order.delete(&state.orm).await?;
    tracing::info!(order_id = %id, "order deleted");
    Ok(())
}

pub async fn list_items(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<OrderItemList>> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    ensure_self_or_employee(user, order.user_id)?;

    let items = load_items(&state.orm, order_id).await?;
    Ok(ApiResponse::success(
        "Ok",
        OrderItemList { items },
        Some(Meta::empty()),
    ))
}

/// Adds a product to an order, merging into an existing line item for the
/// same product.
pub async fn add_product(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: AddProductRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;
    let order = find_for_update(&txn, order_id).await?;
    ensure_self_or_employee(user, order.user_id)?;

    let product = Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| product_not_found(payload.product_id))?;

    let existing = find_line(&txn, order_id, product.id).await?;
    let change = line_items::plan_addition(
        product.id,
        existing.as_ref().map(|line| ExistingLine {
            line_item_id: line.id,
            quantity: line.quantity,
        }),
        payload.quantity,
        product.price,
    )?;

    match (change, existing) {
        (LineItemChange::Insert { quantity, price }, _) => {
            OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                quantity: Set(quantity),
                price_at_order_time: Set(price),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?;
        }
        (LineItemChange::Merge { quantity, .. }, Some(line)) => {
            let mut active: OrderItemActive = line.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?;
        }
        (LineItemChange::Merge { line_item_id, .. }, None) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "merge planned for missing line item {line_item_id}"
            )));
        }
    }

    let order = touch(&txn, order).await?;
    let items = load_items(&txn, order_id).await?;
    txn.commit().await?;

    tracing::info!(%order_id, product_id = %product.id, quantity = payload.quantity, "product added to order");

    Ok(ApiResponse::success(
        "Product added",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_product(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    product_id: Uuid,
) -> AppResult<()> {
    let txn = state.orm.begin().await?;
    let order = find_for_update(&txn, order_id).await?;
    ensure_self_or_employee(user, order.user_id)?;

    Products::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| product_not_found(product_id))?;

    let line = find_line(&txn, order_id, product_id)
        .await?
        .ok_or_else(|| line_not_found(order_id, product_id))?;

    line.delete(&txn).await?;
    touch(&txn, order).await?;
    txn.commit().await?;

    tracing::info!(%order_id, %product_id, "product removed from order");
    Ok(())
}

/// Replaces the quantity of one line item.
pub async fn set_quantity(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    product_id: Uuid,
    new_count: i32,
) -> AppResult<ApiResponse<OrderItem>> {
    let quantity = line_items::ensure_positive(product_id, new_count)?;

    let txn = state.orm.begin().await?;
    let order = find_for_update(&txn, order_id).await?;
    ensure_self_or_employee(user, order.user_id)?;

    let line = find_line(&txn, order_id, product_id)
        .await?
        .ok_or_else(|| line_not_found(order_id, product_id))?;

    let mut active: OrderItemActive = line.into();
    active.quantity = Set(quantity);
    let line = active.update(&txn).await?;
    touch(&txn, order).await?;

    let product = Products::find_by_id(product_id).one(&txn).await?;
    txn.commit().await?;

    tracing::info!(%order_id, %product_id, quantity, "line item quantity set");

    Ok(ApiResponse::success(
        "Quantity updated",
        OrderItem::from_entity(line, product.as_ref()),
        Some(Meta::empty()),
    ))
}

/// Hands a NEW order to an employee and estimates the delivery route from
/// the employee's address to the order's address.
pub async fn process_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: ProcessOrderRequest,
) -> AppResult<ApiResponse<ProcessOrderResponse>> {
    ensure_employee(user)?;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    if !order.status.can_process() {
        return Err(not_processable(&order));
    }

    let employee = Users::find_by_id(payload.employee_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| user_not_found(payload.employee_id))?;

    let from = employee.address.unwrap_or_default();
    let estimate = state
        .estimator
        .estimate(&from, &order.address)
        .await
        .map_err(AppError::FailedCalculation)?;

    let txn = state.orm.begin().await?;
    let order = find_for_update(&txn, order_id).await?;
    // Another request may have processed it while the route was estimated.
    if !order.status.can_process() {
        return Err(not_processable(&order));
    }

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Processing);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    let items = load_items(&txn, order_id).await?;
    txn.commit().await?;

    tracing::info!(
        %order_id,
        employee_id = %payload.employee_id,
        distance_km = estimate.distance_km,
        eta_minutes = estimate.eta_minutes,
        "order processing"
    );

    Ok(ApiResponse::success(
        "Order processing",
        ProcessOrderResponse {
            order: OrderWithItems {
                order: order.into(),
                items,
            },
            distance: estimate.distance_km,
            time: estimate.eta_minutes,
        },
        Some(Meta::empty()),
    ))
}

fn not_processable(order: &OrderModel) -> AppError {
    AppError::OrderNotProcessable(format!(
        "Order with ID {} cannot be processed. Current status: {}",
        order.id, order.status
    ))
}

fn line_not_found(order_id: Uuid, product_id: Uuid) -> AppError {
    AppError::NotFound(format!(
        "Product with ID {product_id} is not part of order {order_id}"
    ))
}

async fn find_for_update<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or_else(|| order_not_found(id))
}

async fn find_line<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    product_id: Uuid,
) -> AppResult<Option<OrderItemModel>> {
    Ok(OrderItems::find()
        .filter(
            Condition::all()
                .add(OrderItemCol::OrderId.eq(order_id))
                .add(OrderItemCol::ProductId.eq(product_id)),
        )
        .one(conn)
        .await?)
}

async fn touch<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderModel> {
    let mut active: OrderActive = order.into();
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .find_also_related(Products)
        .all(conn)
        .await?
        .into_iter()
        .map(|(item, product)| OrderItem::from_entity(item, product.as_ref()))
        .collect())
}
