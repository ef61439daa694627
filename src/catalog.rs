use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::error::ApiError;
use crate::models::{NewProductInput, Product, RemoveProductInput};
use crate::state::AppState;
use crate::uploads;

const NEW_COLLECTION_SIZE: usize = 8;
const POPULAR_CATEGORY: &str = "women";
const POPULAR_SIZE: i64 = 4;
const RELATED_SIZE: usize = 4;

/// Drops the first stored product, then keeps the last eight of the rest.
pub fn new_collection(mut products: Vec<Product>) -> Vec<Product> {
    if products.is_empty() {
        return products;
    }
    products.remove(0);
    let start = products.len().saturating_sub(NEW_COLLECTION_SIZE);
    products.split_off(start)
}

fn validate_price(field: &str, value: f64) -> Result<(), ApiError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("{} must be a non-negative number", field)))
    }
}

pub async fn add_product(
    state: web::Data<AppState>,
    data: web::Json<NewProductInput>,
) -> Result<HttpResponse, ApiError> {
    let data = data.into_inner();
    validate_price("new_price", data.new_price)?;
    validate_price("old_price", data.old_price)?;

    let id = state.catalog.next_product_id().await?;
    let product = Product {
        id,
        name: data.name,
        image: data.image,
        category: data.category,
        new_price: data.new_price,
        old_price: data.old_price,
        description: data.description,
        date: Utc::now(),
        available: true,
    };
    state.catalog.insert_product(&product).await?;
    log::info!("Saved product {} ({})", product.id, product.name);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "name": product.name,
    })))
}

pub async fn remove_product(
    state: web::Data<AppState>,
    data: web::Json<RemoveProductInput>,
) -> Result<HttpResponse, ApiError> {
    let removed = state.catalog.delete_product(data.id).await?;
    log::info!("Removed product {} (matched: {})", data.id, removed);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "name": data.name,
    })))
}

pub async fn all_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products = state.catalog.list_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn new_collection_view(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products = state.catalog.list_products().await?;
    log::debug!("New collection fetched");
    Ok(HttpResponse::Ok().json(new_collection(products)))
}

pub async fn popular_women(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let products = state
        .catalog
        .products_in_category(POPULAR_CATEGORY, POPULAR_SIZE)
        .await?;
    Ok(HttpResponse::Ok().json(products))
}

pub async fn related_products(
    state: web::Data<AppState>,
    category: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let category = category.into_inner();
    let products = state
        .catalog
        .sample_category(&category, RELATED_SIZE)
        .await
        .map_err(|e| ApiError::internal("Error fetching related products", e))?;

    log::debug!("Random related products for category {} fetched", category);
    Ok(HttpResponse::Ok().json(products))
}

pub async fn delete_all_products(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let deleted_products = state
        .catalog
        .delete_all_products()
        .await
        .map_err(|e| ApiError::internal("Error deleting products or images.", e))?;
    log::info!("Deleted {} products", deleted_products);

    let upload_dir = state.upload_dir.clone();
    let purge = web::block(move || uploads::purge_images(&upload_dir))
        .await
        .map_err(|e| ApiError::internal("Error deleting products or images.", e))?;
    log::info!(
        "Deleted {} images, {} failed",
        purge.deleted,
        purge.failed.len()
    );

    let success = purge.failed.is_empty();
    let message = if success {
        "All products and images deleted successfully."
    } else {
        "All products deleted; some images could not be removed."
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": success,
        "message": message,
        "deleted_products": deleted_products,
        "deleted_images": purge.deleted,
        "failed_images": purge.failed,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64) -> Product {
        Product {
            id,
            name: format!("p{}", id),
            image: "u".into(),
            category: "men".into(),
            new_price: 1.0,
            old_price: 2.0,
            description: None,
            date: Utc::now(),
            available: true,
        }
    }

    fn ids(products: &[Product]) -> Vec<i64> {
        products.iter().map(|p| p.id).collect()
    }

    #[test]
    fn new_collection_skips_first_and_keeps_last_eight() {
        let all: Vec<Product> = (1..=20).map(product).collect();
        assert_eq!(ids(&new_collection(all)), (13..=20).collect::<Vec<_>>());
    }

    #[test]
    fn new_collection_on_small_catalogs() {
        assert!(new_collection(vec![]).is_empty());
        assert!(new_collection(vec![product(1)]).is_empty());

        let five: Vec<Product> = (1..=5).map(product).collect();
        assert_eq!(ids(&new_collection(five)), vec![2, 3, 4, 5]);

        let nine: Vec<Product> = (1..=9).map(product).collect();
        assert_eq!(ids(&new_collection(nine)), (2..=9).collect::<Vec<_>>());
    }

    #[test]
    fn prices_must_be_non_negative() {
        assert!(validate_price("new_price", 0.0).is_ok());
        assert!(validate_price("new_price", -1.0).is_err());
        assert!(validate_price("old_price", f64::NAN).is_err());
    }
}
