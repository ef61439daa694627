use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, Role};
use crate::cart::empty_cart;
use crate::error::ApiError;
use crate::middleware::identify;
use crate::models::{Admin, AdminInput, AuthResponse, LoginInput, SignUpInput, User};
use crate::state::AppState;
use crate::store::StoreError;

const USER_EXISTS: &str = "existing user found with the same email address";
const ADMIN_EXISTS: &str = "An admin with this email already exists";
const WRONG_EMAIL: &str = "Wrong email address";
const WRONG_PASSWORD: &str = "Wrong password";

fn conflict_on_duplicate(message: &'static str) -> impl Fn(StoreError) -> ApiError {
    move |err| match err {
        StoreError::Duplicate(_) => ApiError::Conflict(message.to_string()),
        other => other.into(),
    }
}

pub async fn sign_up(
    state: web::Data<AppState>,
    new_user: web::Json<SignUpInput>,
) -> Result<HttpResponse, ApiError> {
    let new_user = new_user.into_inner();
    if state.accounts.find_user_by_email(&new_user.email).await?.is_some() {
        log::info!("Signup rejected, {} already registered", new_user.email);
        return Err(ApiError::Conflict(USER_EXISTS.to_string()));
    }

    let account = User {
        id: Uuid::new_v4().to_string(),
        name: new_user.username,
        email: new_user.email,
        password: hash_password(&new_user.password)?,
        cart_data: empty_cart(),
        date: Utc::now(),
    };
    state
        .accounts
        .insert_user(&account)
        .await
        .map_err(conflict_on_duplicate(USER_EXISTS))?;
    log::info!("User {} created", account.id);

    let token = state.tokens.issue(Role::User, &account.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse { success: true, token }))
}

pub async fn login(
    state: web::Data<AppState>,
    data: web::Json<LoginInput>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .accounts
        .find_user_by_email(&data.email)
        .await?
        .ok_or_else(|| ApiError::NotFound(WRONG_EMAIL.to_string()))?;

    if !verify_password(&data.password, &user.password) {
        return Err(ApiError::Forbidden(WRONG_PASSWORD.to_string()));
    }

    let token = state.tokens.issue(Role::User, &user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse { success: true, token }))
}

/// Open while no admin exists, so the first one can be created; afterwards an admin token is required.
pub async fn add_admin(
    state: web::Data<AppState>,
    req: HttpRequest,
    data: web::Json<AdminInput>,
) -> Result<HttpResponse, ApiError> {
    if state.accounts.count_admins().await? > 0 {
        match identify(&req, &state.tokens) {
            Some(identity) if identity.role == Role::Admin => {}
            _ => return Err(ApiError::Unauthorized),
        }
    }

    let data = data.into_inner();
    if state.accounts.find_admin_by_email(&data.email).await?.is_some() {
        log::info!("Admin creation rejected, {} already registered", data.email);
        return Err(ApiError::Conflict(ADMIN_EXISTS.to_string()));
    }

    let admin = Admin {
        id: Uuid::new_v4().to_string(),
        name: data.name,
        email: data.email,
        password: hash_password(&data.password)?,
        date: Utc::now(),
    };
    state
        .accounts
        .insert_admin(&admin)
        .await
        .map_err(conflict_on_duplicate(ADMIN_EXISTS))?;
    log::info!("Admin {} created", admin.id);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Admin created successfully",
    })))
}

pub async fn admin_login(
    state: web::Data<AppState>,
    data: web::Json<LoginInput>,
) -> Result<HttpResponse, ApiError> {
    let admin = state
        .accounts
        .find_admin_by_email(&data.email)
        .await?
        .ok_or_else(|| ApiError::NotFound(WRONG_EMAIL.to_string()))?;

    if !verify_password(&data.password, &admin.password) {
        return Err(ApiError::Forbidden(WRONG_PASSWORD.to_string()));
    }

    let token = state.tokens.issue(Role::Admin, &admin.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse { success: true, token }))
}
