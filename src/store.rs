use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Admin, Product, User};

#[cfg(test)]
pub mod memory;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("{0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Backend(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref write)) if write.code == 11000 => {
                StoreError::Duplicate(write.message.clone())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<mongodb::bson::de::Error> for StoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Product persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Atomically reserve the next sequential product id.
    async fn next_product_id(&self) -> Result<i64, StoreError>;

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError>;

    /// Delete the first product with this id. Returns whether one was removed.
    async fn delete_product(&self, id: i64) -> Result<bool, StoreError>;

    /// All products in storage order.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// The first `limit` products of a category, in storage order.
    async fn products_in_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<Product>, StoreError>;

    /// Up to `size` distinct products of a category, chosen at random.
    async fn sample_category(&self, category: &str, size: usize)
        -> Result<Vec<Product>, StoreError>;

    /// Returns how many products were deleted.
    async fn delete_all_products(&self) -> Result<u64, StoreError>;
}

/// User and admin credential persistence, including the user's cart slots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Add one to a cart slot. Returns false when the user does not exist.
    async fn increment_cart_slot(&self, user_id: &str, slot: &str) -> Result<bool, StoreError>;

    /// Subtract one from a cart slot that is above zero. Returns whether the slot changed.
    async fn decrement_cart_slot(&self, user_id: &str, slot: &str) -> Result<bool, StoreError>;

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;

    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError>;

    async fn count_admins(&self) -> Result<u64, StoreError>;
}
