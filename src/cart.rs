use actix_web::{web, HttpResponse};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::models::{CartData, CartItemInput};
use crate::state::AppState;

/// Every cart holds this many slots, keyed "0" through "299".
pub const CART_SLOTS: i64 = 300;

pub fn empty_cart() -> CartData {
    (0..CART_SLOTS).map(|slot| (slot.to_string(), 0)).collect()
}

pub fn slot_key(item_id: i64) -> Result<String, ApiError> {
    if (0..CART_SLOTS).contains(&item_id) {
        Ok(item_id.to_string())
    } else {
        Err(ApiError::BadRequest(format!("Invalid item id: {}", item_id)))
    }
}

pub async fn add_to_cart(
    state: web::Data<AppState>,
    identity: Identity,
    data: web::Json<CartItemInput>,
) -> Result<HttpResponse, ApiError> {
    let slot = slot_key(data.item_id)?;
    if !state.accounts.increment_cart_slot(&identity.id, &slot).await? {
        return Err(ApiError::Unauthorized);
    }

    log::info!("Added item {} to cart of {}", slot, identity.id);
    Ok(HttpResponse::Ok().body("added"))
}

pub async fn remove_from_cart(
    state: web::Data<AppState>,
    identity: Identity,
    data: web::Json<CartItemInput>,
) -> Result<HttpResponse, ApiError> {
    let slot = slot_key(data.item_id)?;
    if !state.accounts.decrement_cart_slot(&identity.id, &slot).await? {
        // nothing to take away, or the account is gone
        if state.accounts.find_user(&identity.id).await?.is_none() {
            return Err(ApiError::Unauthorized);
        }
    }

    log::info!("Removed item {} from cart of {}", slot, identity.id);
    Ok(HttpResponse::Ok().body("Removed"))
}

pub async fn get_cart(
    state: web::Data<AppState>,
    identity: Identity,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .accounts
        .find_user(&identity.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(HttpResponse::Ok().json(user.cart_data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cart_has_every_slot_at_zero() {
        let cart = empty_cart();
        assert_eq!(cart.len(), 300);
        assert!(cart.values().all(|&q| q == 0));
        assert!(cart.contains_key("0"));
        assert!(cart.contains_key("299"));
        assert!(!cart.contains_key("300"));
    }

    #[test]
    fn slot_keys_stay_in_range() {
        assert_eq!(slot_key(0).unwrap(), "0");
        assert_eq!(slot_key(299).unwrap(), "299");
        assert!(matches!(slot_key(300), Err(ApiError::BadRequest(_))));
        assert!(matches!(slot_key(-1), Err(ApiError::BadRequest(_))));
    }
}
