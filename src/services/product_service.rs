use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    domain::catalog,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_employee},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, SortOrder},
    state::AppState,
};

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Product with ID {id} not found"))
}

async fn find(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category));
    }
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }
    if let Some(size) = query.size {
        condition = condition.add(Column::Size.eq(size));
    }
    if let Some(active) = query.active {
        condition = condition.add(Column::Active.eq(active));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Asc) {
        SortOrder::Asc => finder.order_by_asc(Column::Name),
        SortOrder::Desc => finder.order_by_desc(Column::Name),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = find(state, id).await?;
    Ok(ApiResponse::success("Product", product.into(), None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_employee(user)?;
    payload.validate()?;
    let alcoholic = catalog::alcoholic_for_new(payload.category, payload.alcoholic)?;

    let now = Utc::now();
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        category: Set(payload.category),
        status: Set(payload.status),
        size: Set(payload.size),
        price: Set(payload.price),
        active: Set(payload.active),
        total_amount: Set(payload.total_amount),
        alcoholic: Set(alcoholic),
        image_data: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, category = ?product.category, "product created");

    Ok(ApiResponse::success(
        "Product created",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_employee(user)?;
    payload.validate()?;
    let existing = find(state, id).await?;

    catalog::ensure_category_unchanged(existing.category, payload.category)?;
    catalog::ensure_alcoholic_allowed(existing.category, payload.alcoholic)?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(size) = payload.size {
        active.size = Set(size);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(flag) = payload.active {
        active.active = Set(flag);
    }
    if let Some(total) = payload.total_amount {
        active.total_amount = Set(total);
    }
    if let Some(alcoholic) = payload.alcoholic {
        active.alcoholic = Set(Some(alcoholic));
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;
    tracing::info!(product_id = %product.id, "product updated");

    Ok(ApiResponse::success(
        "Updated",
        product.into(),
        Some(Meta::empty()),
    ))
}

/// Fails with an integrity error while order lines still reference the product.
pub async fn delete_product(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_employee(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(not_found(id));
    }
    tracing::info!(product_id = %id, "product deleted");
    Ok(())
}

/// Stores the raw image bytes; an empty body removes the image.
pub async fn set_photo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    bytes: Vec<u8>,
) -> AppResult<ApiResponse<Product>> {
    ensure_employee(user)?;
    let existing = find(state, id).await?;

    let mut active: ActiveModel = existing.into();
    active.image_data = Set((!bytes.is_empty()).then_some(bytes));
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Photo updated",
        product.into(),
        Some(Meta::empty()),
    ))
}

pub async fn get_photo(state: &AppState, id: Uuid) -> AppResult<Vec<u8>> {
    find(state, id)
        .await?
        .image_data
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::NotFound(format!("Product with ID {id} has no photo")))
}
