use chrono::Utc;
use tracing::info;

use super::{Store, contains_ci, eq_ci};
use crate::error::CoreError;
use crate::id::{self, prefix};
use crate::model::{Customer, CustomerKind};

/// Fields for a new customer. Kind defaults to `individual`.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub kind: Option<CustomerKind>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub abn: Option<String>,
    pub tags: Vec<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub kind: Option<CustomerKind>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub abn: Option<String>,
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Registry filters. `kind`/`source` are exact case-insensitive; `tag`
/// requires membership; `search` substring-matches across name, contact,
/// email and phone fields.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilters {
    pub kind: Option<CustomerKind>,
    pub source: Option<String>,
    pub tag: Option<String>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl Store {
    #[must_use]
    pub fn customers(&self, filters: &CustomerFilters) -> Vec<&Customer> {
        self.data
            .customers
            .iter()
            .filter(|c| filters.kind.is_none_or(|k| c.kind == k))
            .filter(|c| {
                filters
                    .source
                    .as_deref()
                    .is_none_or(|s| c.source.as_deref().is_some_and(|own| eq_ci(own, s)))
            })
            .filter(|c| {
                filters
                    .tag
                    .as_deref()
                    .is_none_or(|t| c.tags.iter().any(|own| eq_ci(own, t)))
            })
            .filter(|c| filters.is_active.is_none_or(|a| c.is_active == a))
            .filter(|c| {
                filters.search.as_deref().is_none_or(|q| {
                    contains_ci(&c.name, q)
                        || c.contact_name.as_deref().is_some_and(|v| contains_ci(v, q))
                        || c.email.as_deref().is_some_and(|v| contains_ci(v, q))
                        || c.phone.as_deref().is_some_and(|v| contains_ci(v, q))
                        || c.mobile.as_deref().is_some_and(|v| contains_ci(v, q))
                })
            })
            .collect()
    }

    #[must_use]
    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.data.customers.iter().find(|c| c.id == id)
    }

    /// Secondary-key lookup; email comparison is case-insensitive.
    #[must_use]
    pub fn customer_by_email(&self, email: &str) -> Option<&Customer> {
        self.data.customers.iter().find(|c| c.email_matches(email))
    }

    /// Create a registry entry. Email uniqueness (when an email is given)
    /// is checked here, inside the store, mirroring product SKUs.
    pub fn create_customer(&mut self, new: NewCustomer) -> Result<Customer, CoreError> {
        if let Some(email) = new.email.as_deref() {
            if self.customer_by_email(email).is_some() {
                return Err(CoreError::DuplicateEmail {
                    email: email.to_string(),
                });
            }
        }
        let now = Utc::now();
        let customer = Customer {
            id: id::new_id(prefix::CUSTOMER),
            kind: new.kind.unwrap_or(CustomerKind::Individual),
            name: new.name,
            contact_name: new.contact_name,
            email: new.email,
            phone: new.phone,
            mobile: new.mobile,
            address: new.address,
            abn: new.abn,
            tags: new.tags,
            source: new.source,
            notes: new.notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        info!(customer = %customer.id, "create customer");
        self.commit(|data| {
            data.customers.push(customer.clone());
            customer
        })
    }

    /// Returns `Ok(None)` when the id is unknown; re-pointing the email at
    /// a value held by another customer is a conflict.
    pub fn update_customer(
        &mut self,
        id: &str,
        patch: CustomerPatch,
    ) -> Result<Option<Customer>, CoreError> {
        if self.customer(id).is_none() {
            return Ok(None);
        }
        if let Some(email) = patch.email.as_deref() {
            if self
                .customer_by_email(email)
                .is_some_and(|other| other.id != id)
            {
                return Err(CoreError::DuplicateEmail {
                    email: email.to_string(),
                });
            }
        }
        let id = id.to_string();
        self.commit(move |data| {
            let customer = data.customers.iter_mut().find(|c| c.id == id)?;
            if let Some(name) = patch.name {
                customer.name = name;
            }
            if let Some(kind) = patch.kind {
                customer.kind = kind;
            }
            if let Some(contact_name) = patch.contact_name {
                customer.contact_name = Some(contact_name);
            }
            if let Some(email) = patch.email {
                customer.email = Some(email);
            }
            if let Some(phone) = patch.phone {
                customer.phone = Some(phone);
            }
            if let Some(mobile) = patch.mobile {
                customer.mobile = Some(mobile);
            }
            if let Some(address) = patch.address {
                customer.address = Some(address);
            }
            if let Some(abn) = patch.abn {
                customer.abn = Some(abn);
            }
            if let Some(tags) = patch.tags {
                customer.tags = tags;
            }
            if let Some(source) = patch.source {
                customer.source = Some(source);
            }
            if let Some(notes) = patch.notes {
                customer.notes = Some(notes);
            }
            if let Some(is_active) = patch.is_active {
                customer.is_active = is_active;
            }
            customer.updated_at = Utc::now();
            Some(customer.clone())
        })
    }

    /// Soft delete, mirroring products.
    pub fn delete_customer(&mut self, id: &str) -> Result<bool, CoreError> {
        let deactivated = self.update_customer(
            id,
            CustomerPatch {
                is_active: Some(false),
                ..CustomerPatch::default()
            },
        )?;
        Ok(deactivated.is_some())
    }

    /// Administrative hard delete.
    pub fn purge_customer(&mut self, id: &str) -> Result<bool, CoreError> {
        if self.customer(id).is_none() {
            return Ok(false);
        }
        let id = id.to_string();
        info!(customer = %id, "purge customer");
        self.commit(move |data| {
            data.customers.retain(|c| c.id != id);
            true
        })
    }
}
