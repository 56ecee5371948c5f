//! Product variants share one table; the category decides which
//! variant-specific fields are allowed.

use crate::entity::sea_orm_active_enums::ProductCategory;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Cannot change product category from {from:?} to {to:?}")]
    CategoryChange {
        from: ProductCategory,
        to: ProductCategory,
    },
    #[error("Only drinks can be marked as alcoholic, got {0:?}")]
    AlcoholicOnNonDrink(ProductCategory),
}

/// Value stored in the `alcoholic` column for a new product.
pub fn alcoholic_for_new(
    category: ProductCategory,
    requested: Option<bool>,
) -> Result<Option<bool>, CatalogError> {
    match (category, requested) {
        (ProductCategory::Drink, value) => Ok(Some(value.unwrap_or(false))),
        (_, None) => Ok(None),
        (other, Some(_)) => Err(CatalogError::AlcoholicOnNonDrink(other)),
    }
}

/// An update may repeat the category but never change it.
pub fn ensure_category_unchanged(
    current: ProductCategory,
    requested: Option<ProductCategory>,
) -> Result<(), CatalogError> {
    match requested {
        Some(to) if to != current => Err(CatalogError::CategoryChange { from: current, to }),
        _ => Ok(()),
    }
}

pub fn ensure_alcoholic_allowed(
    category: ProductCategory,
    requested: Option<bool>,
) -> Result<(), CatalogError> {
    if requested.is_some() && category != ProductCategory::Drink {
        return Err(CatalogError::AlcoholicOnNonDrink(category));
    }
    Ok(())
}
