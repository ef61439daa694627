use std::sync::Mutex;

use async_trait::async_trait;
use rand::seq::SliceRandom;

use super::{AccountStore, CatalogStore, StoreError};
use crate::models::{Admin, Product, User};

/// Vec-backed store that keeps insertion order, used by the HTTP tests.
#[derive(Default)]
pub struct MemoryStore {
    products: Mutex<Vec<Product>>,
    counter: Mutex<i64>,
    users: Mutex<Vec<User>>,
    admins: Mutex<Vec<Admin>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn cart_slot(&self, user_id: &str, slot: &str) -> Option<i64> {
        let users = self.users.lock().unwrap();
        let user = users.iter().find(|u| u.id == user_id)?;
        user.cart_data.get(slot).copied()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn next_product_id(&self) -> Result<i64, StoreError> {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        Ok(*counter)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn delete_product(&self, id: i64) -> Result<bool, StoreError> {
        let mut products = self.products.lock().unwrap();
        match products.iter().position(|p| p.id == id) {
            Some(index) => {
                products.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.lock().unwrap().clone())
    }

    async fn products_in_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<Product>, StoreError> {
        let products = self.products.lock().unwrap();
        Ok(products
            .iter()
            .filter(|p| p.category == category)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn sample_category(
        &self,
        category: &str,
        size: usize,
    ) -> Result<Vec<Product>, StoreError> {
        let products = self.products.lock().unwrap();
        let matching: Vec<&Product> = products.iter().filter(|p| p.category == category).collect();
        Ok(matching
            .choose_multiple(&mut rand::thread_rng(), size)
            .map(|p| (*p).clone())
            .collect())
    }

    async fn delete_all_products(&self) -> Result<u64, StoreError> {
        let mut products = self.products.lock().unwrap();
        let count = products.len() as u64;
        products.clear();
        Ok(count)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("duplicate email {}", user.email)));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn increment_cart_slot(&self, user_id: &str, slot: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                *user.cart_data.entry(slot.to_string()).or_insert(0) += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn decrement_cart_slot(&self, user_id: &str, slot: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        let quantity = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .and_then(|u| u.cart_data.get_mut(slot));
        match quantity {
            Some(q) if *q > 0 => {
                *q -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self
            .admins
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        let mut admins = self.admins.lock().unwrap();
        if admins.iter().any(|a| a.email == admin.email) {
            return Err(StoreError::Duplicate(format!("duplicate email {}", admin.email)));
        }
        admins.push(admin.clone());
        Ok(())
    }

    async fn count_admins(&self) -> Result<u64, StoreError> {
        Ok(self.admins.lock().unwrap().len() as u64)
    }
}
