use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOneOptions, FindOptions, IndexOptions,
    ReturnDocument, UpdateOptions,
};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::config::Config;
use crate::models::{Admin, Counter, Product, User};
use crate::store::{AccountStore, CatalogStore, StoreError};

const PRODUCT_SEQUENCE: &str = "productid";

pub async fn connect(config: &Config) -> Result<Database, mongodb::error::Error> {
    let client_options = ClientOptions::parse(&config.database_url).await?;
    let client = Client::with_options(client_options)?;
    Ok(client.database(&config.database_name))
}

/// Raises the product sequence to `max_id` without ever lowering it.
fn sequence_seed(max_id: i64) -> (Document, Document) {
    (
        doc! { "_id": PRODUCT_SEQUENCE },
        doc! { "$max": { "seq": max_id } },
    )
}

fn cart_field(slot: &str) -> String {
    format!("cartData.{}", slot)
}

fn cart_increment(user_id: &str, slot: &str) -> (Document, Document) {
    (
        doc! { "_id": user_id },
        doc! { "$inc": { cart_field(slot): 1_i64 } },
    )
}

/// Only matches while the slot is positive, so a quantity never drops below zero.
fn cart_decrement(user_id: &str, slot: &str) -> (Document, Document) {
    let field = cart_field(slot);
    (
        doc! { "_id": user_id, field.clone(): { "$gt": 0 } },
        doc! { "$inc": { field: -1_i64 } },
    )
}

pub struct MongoStore {
    products: Collection<Product>,
    users: Collection<User>,
    admins: Collection<Admin>,
    counters: Collection<Counter>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        MongoStore {
            products: db.collection("products"),
            users: db.collection("users"),
            admins: db.collection("admins"),
            counters: db.collection("counters"),
        }
    }

    /// Creates indexes and brings the product sequence up to the highest stored id.
    pub async fn init(&self) -> Result<(), StoreError> {
        let unique_email = || {
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };
        self.users.create_index(unique_email(), None).await?;
        self.admins.create_index(unique_email(), None).await?;
        self.products
            .create_index(IndexModel::builder().keys(doc! { "id": 1 }).build(), None)
            .await?;

        let newest = FindOneOptions::builder().sort(doc! { "id": -1 }).build();
        let max_id = self
            .products
            .find_one(doc! {}, newest)
            .await?
            .map(|p| p.id)
            .unwrap_or(0);

        let (filter, update) = sequence_seed(max_id);
        let upsert = UpdateOptions::builder().upsert(true).build();
        self.counters.update_one(filter, update, upsert).await?;

        log::info!("Product sequence at {}", max_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MongoStore {
    async fn next_product_id(&self) -> Result<i64, StoreError> {
        let filter = doc! { "_id": PRODUCT_SEQUENCE };
        let update = doc! { "$inc": { "seq": 1_i64 } };
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        match self.counters.find_one_and_update(filter, update, options).await? {
            Some(counter) => Ok(counter.seq),
            None => Err(StoreError::Backend(
                "Failed to generate sequence value".to_string(),
            )),
        }
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products.insert_one(product, None).await?;
        Ok(())
    }

    async fn delete_product(&self, id: i64) -> Result<bool, StoreError> {
        let result = self.products.delete_one(doc! { "id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let cursor = self.products.find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn products_in_category(
        &self,
        category: &str,
        limit: i64,
    ) -> Result<Vec<Product>, StoreError> {
        let options = FindOptions::builder().limit(limit).build();
        let cursor = self
            .products
            .find(doc! { "category": category }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn sample_category(
        &self,
        category: &str,
        size: usize,
    ) -> Result<Vec<Product>, StoreError> {
        let pipeline = vec![
            doc! { "$match": { "category": category } },
            doc! { "$sample": { "size": size as i64 } },
        ];
        let documents: Vec<Document> = self
            .products
            .aggregate(pipeline, None)
            .await?
            .try_collect()
            .await?;

        let mut products = Vec::with_capacity(documents.len());
        for document in documents {
            products.push(mongodb::bson::from_document(document)?);
        }
        Ok(products)
    }

    async fn delete_all_products(&self) -> Result<u64, StoreError> {
        let result = self.products.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }
}

#[async_trait]
impl AccountStore for MongoStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users.insert_one(user, None).await?;
        Ok(())
    }

    async fn increment_cart_slot(&self, user_id: &str, slot: &str) -> Result<bool, StoreError> {
        let (filter, update) = cart_increment(user_id, slot);
        let result = self.users.update_one(filter, update, None).await?;
        Ok(result.matched_count == 1)
    }

    async fn decrement_cart_slot(&self, user_id: &str, slot: &str) -> Result<bool, StoreError> {
        let (filter, update) = cart_decrement(user_id, slot);
        let result = self.users.update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self.admins.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        self.admins.insert_one(admin, None).await?;
        Ok(())
    }

    async fn count_admins(&self) -> Result<u64, StoreError> {
        Ok(self.admins.count_documents(doc! {}, None).await?)
    }
}
