use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use super::{Store, contains_ci, eq_ci};
use crate::error::CoreError;
use crate::id::{self, prefix};
use crate::model::Product;
use crate::model::product::default_currency;

/// Fields for a new catalog entry.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub cost_price: Option<Decimal>,
    pub sell_price: Decimal,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub fitment: Vec<String>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub cost_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub fitment: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Catalog filters. `category`/`subcategory`/`brand` are exact
/// case-insensitive; price bounds are inclusive on `sell_price`; `search`
/// substring-matches across sku, name, brand, category and description.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub is_active: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
}

impl Store {
    #[must_use]
    pub fn products(&self, filters: &ProductFilters) -> Vec<&Product> {
        self.data
            .products
            .iter()
            .filter(|p| filters.category.as_deref().is_none_or(|c| eq_ci(&p.category, c)))
            .filter(|p| {
                filters
                    .subcategory
                    .as_deref()
                    .is_none_or(|c| eq_ci(&p.subcategory, c))
            })
            .filter(|p| filters.brand.as_deref().is_none_or(|b| eq_ci(&p.brand, b)))
            .filter(|p| filters.is_active.is_none_or(|a| p.is_active == a))
            .filter(|p| filters.min_price.is_none_or(|min| p.sell_price >= min))
            .filter(|p| filters.max_price.is_none_or(|max| p.sell_price <= max))
            .filter(|p| {
                filters.search.as_deref().is_none_or(|q| {
                    contains_ci(&p.sku, q)
                        || contains_ci(&p.name, q)
                        || contains_ci(&p.brand, q)
                        || contains_ci(&p.category, q)
                        || contains_ci(&p.description, q)
                })
            })
            .collect()
    }

    #[must_use]
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.data.products.iter().find(|p| p.id == id)
    }

    /// Secondary-key lookup; SKU comparison is case-insensitive.
    #[must_use]
    pub fn product_by_sku(&self, sku: &str) -> Option<&Product> {
        self.data.products.iter().find(|p| p.sku_matches(sku))
    }

    /// Create a catalog entry. SKU uniqueness is checked here, inside the
    /// store, so there is no lookup-then-write race to lose.
    pub fn create_product(&mut self, new: NewProduct) -> Result<Product, CoreError> {
        if self.product_by_sku(&new.sku).is_some() {
            return Err(CoreError::DuplicateSku { sku: new.sku });
        }
        let now = Utc::now();
        let product = Product {
            id: id::new_id(prefix::PRODUCT),
            sku: new.sku,
            name: new.name,
            category: new.category.unwrap_or_default(),
            subcategory: new.subcategory.unwrap_or_default(),
            brand: new.brand.unwrap_or_default(),
            cost_price: new.cost_price.unwrap_or_default(),
            sell_price: new.sell_price,
            currency: new.currency.unwrap_or_else(default_currency),
            description: new.description.unwrap_or_default(),
            fitment: new.fitment,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        info!(product = %product.id, sku = %product.sku, "create product");
        self.commit(|data| {
            data.products.push(product.clone());
            product
        })
    }

    /// Returns `Ok(None)` when the id is unknown; re-pointing the SKU at a
    /// value held by another product is a conflict.
    pub fn update_product(
        &mut self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<Option<Product>, CoreError> {
        if self.product(id).is_none() {
            return Ok(None);
        }
        if let Some(sku) = patch.sku.as_deref() {
            if self.product_by_sku(sku).is_some_and(|other| other.id != id) {
                return Err(CoreError::DuplicateSku {
                    sku: sku.to_string(),
                });
            }
        }
        let id = id.to_string();
        self.commit(move |data| {
            let product = data.products.iter_mut().find(|p| p.id == id)?;
            if let Some(sku) = patch.sku {
                product.sku = sku;
            }
            if let Some(name) = patch.name {
                product.name = name;
            }
            if let Some(category) = patch.category {
                product.category = category;
            }
            if let Some(subcategory) = patch.subcategory {
                product.subcategory = subcategory;
            }
            if let Some(brand) = patch.brand {
                product.brand = brand;
            }
            if let Some(cost_price) = patch.cost_price {
                product.cost_price = cost_price;
            }
            if let Some(sell_price) = patch.sell_price {
                product.sell_price = sell_price;
            }
            if let Some(currency) = patch.currency {
                product.currency = currency;
            }
            if let Some(description) = patch.description {
                product.description = description;
            }
            if let Some(fitment) = patch.fitment {
                product.fitment = fitment;
            }
            if let Some(is_active) = patch.is_active {
                product.is_active = is_active;
            }
            product.updated_at = Utc::now();
            Some(product.clone())
        })
    }

    /// Soft delete: the product stays retrievable with `is_active = false`.
    pub fn delete_product(&mut self, id: &str) -> Result<bool, CoreError> {
        let deactivated = self.update_product(
            id,
            ProductPatch {
                is_active: Some(false),
                ..ProductPatch::default()
            },
        )?;
        Ok(deactivated.is_some())
    }

    /// Administrative hard delete.
    pub fn purge_product(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.product(id).is_none() {
            return Ok(false);
        }
        let id = id.to_string();
        info!(product = %id, "purge product");
        self.commit(move |data| {
            data.products.retain(|p| p.id != id);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{NewProduct, ProductFilters, ProductPatch};
    use crate::error::CoreError;
    use crate::store::Store;
    use rust_decimal::Decimal;

    fn new_product(sku: &str, sell_price: i64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category: Some("Suspension".to_string()),
            subcategory: None,
            brand: Some("Acme".to_string()),
            cost_price: None,
            sell_price: Decimal::from(sell_price),
            currency: None,
            description: None,
            fitment: vec![],
        }
    }

    #[test]
    fn duplicate_sku_is_a_conflict_case_insensitively() {
        let mut store = Store::in_memory();
        store.create_product(new_product("COIL-01", 100)).unwrap();

        let err = store.create_product(new_product("coil-01", 120)).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSku { .. }));
        assert_eq!(store.data().products.len(), 1);
    }

    #[test]
    fn update_to_existing_sku_is_a_conflict_but_own_sku_is_fine() {
        let mut store = Store::in_memory();
        let a = store.create_product(new_product("SKU-A", 100)).unwrap();
        store.create_product(new_product("SKU-B", 100)).unwrap();

        let err = store
            .update_product(
                &a.id,
                ProductPatch {
                    sku: Some("sku-b".to_string()),
                    ..ProductPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateSku { .. }));

        // Re-casing your own SKU is not a conflict.
        let updated = store
            .update_product(
                &a.id,
                ProductPatch {
                    sku: Some("sku-a".to_string()),
                    ..ProductPatch::default()
                },
            )
            .unwrap()
            .expect("exists");
        assert_eq!(updated.sku, "sku-a");
    }

    #[test]
    fn soft_delete_keeps_record_but_hides_from_active_listing() {
        let mut store = Store::in_memory();
        let product = store.create_product(new_product("COIL-01", 100)).unwrap();

        assert!(store.delete_product(&product.id).unwrap());
        let kept = store.product(&product.id).expect("still retrievable");
        assert!(!kept.is_active);

        let active = store.products(&ProductFilters {
            is_active: Some(true),
            ..ProductFilters::default()
        });
        assert!(active.is_empty());

        assert!(store.purge_product(&product.id).unwrap());
        assert!(store.product(&product.id).is_none());
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let mut store = Store::in_memory();
        store.create_product(new_product("A", 50)).unwrap();
        store.create_product(new_product("B", 100)).unwrap();
        store.create_product(new_product("C", 150)).unwrap();

        let mid = store.products(&ProductFilters {
            min_price: Some(Decimal::from(100)),
            max_price: Some(Decimal::from(100)),
            ..ProductFilters::default()
        });
        assert_eq!(mid.len(), 1);
        assert_eq!(mid[0].sku, "B");
    }

    #[test]
    fn search_is_substring_or_across_fields() {
        let mut store = Store::in_memory();
        let mut coil = new_product("COIL-01", 100);
        coil.name = "Front coilover kit".to_string();
        store.create_product(coil).unwrap();
        store.create_product(new_product("BRAKE-01", 100)).unwrap();

        let hits = store.products(&ProductFilters {
            search: Some("coil".to_string()),
            ..ProductFilters::default()
        });
        assert_eq!(hits.len(), 1);

        let by_brand = store.products(&ProductFilters {
            search: Some("acme".to_string()),
            ..ProductFilters::default()
        });
        assert_eq!(by_brand.len(), 2);
    }
}
