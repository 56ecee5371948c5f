use chrono::Utc;
use pizza_order_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        Products, Users,
        products::{self, Column as ProductCol},
        sea_orm_active_enums::{ProductCategory, ProductSize, ProductStatus, UserRole},
        users::{self, Column as UserCol},
    },
    services::auth_service::hash_password,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let employee_id = ensure_user(
        &orm,
        "luigi",
        "luigi@pizza.example",
        "employee123",
        UserRole::Employee,
        "Via Garibaldi 12, Torino",
    )
    .await?;
    let customer_id = ensure_user(
        &orm,
        "mario",
        "mario@pizza.example",
        "customer123",
        UserRole::Customer,
        "Corso Francia 50, Torino",
    )
    .await?;
    seed_products(&orm).await?;

    println!("Seed completed. Employee ID: {employee_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    username: &str,
    email: &str,
    password: &str,
    role: UserRole,
    address: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Username.eq(username))
        .one(orm)
        .await?
    {
        return Ok(existing.id);
    }

    let now = Utc::now();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?),
        role: Set(role),
        active: Set(true),
        address: Set(Some(address.to_string())),
        image_data: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(orm)
    .await?;
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let catalog = [
        ("Margherita", ProductCategory::Pizza, ProductSize::Medium, 850, None),
        ("Diavola", ProductCategory::Pizza, ProductSize::Large, 1150, None),
        ("Quattro Formaggi", ProductCategory::Pizza, ProductSize::Medium, 1050, None),
        ("Cola", ProductCategory::Drink, ProductSize::Small, 250, Some(false)),
        ("Birra Moretti", ProductCategory::Drink, ProductSize::Medium, 400, Some(true)),
        ("Garlic Dip", ProductCategory::Sauce, ProductSize::Small, 100, None),
    ];

    let now = Utc::now();
    for (name, category, size, cents, alcoholic) in catalog {
        let exists = Products::find()
            .filter(ProductCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(None),
            category: Set(category),
            status: Set(ProductStatus::Active),
            size: Set(size),
            price: Set(Decimal::new(cents, 2)),
            active: Set(true),
            total_amount: Set(Decimal::ZERO),
            alcoholic: Set(alcoholic),
            image_data: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(orm)
        .await?;
    }

    Ok(())
}
