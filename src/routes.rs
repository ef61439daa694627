use actix_files::Files;
use actix_web::{web, HttpResponse, Responder};

use crate::error::ApiError;
use crate::middleware::{Access, AuthMiddleware};
use crate::state::AppState;
use crate::{accounts, cart, catalog, uploads};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Storefront API is running")
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into())
}

/// Registers shared state and every endpoint, including `/images` static files.
pub fn configure(cfg: &mut web::ServiceConfig, state: &web::Data<AppState>) {
    let guarded = |access| AuthMiddleware::new(state.tokens.clone(), access);

    cfg.app_data(state.clone())
        .app_data(json_config())
        .route("/", web::get().to(index))
        .route("/upload", web::post().to(uploads::upload_image))
        .route("/addproduct", web::post().to(catalog::add_product))
        .route("/removeproduct", web::post().to(catalog::remove_product))
        .route("/newCollection", web::get().to(catalog::new_collection_view))
        .route("/popularwomen", web::get().to(catalog::popular_women))
        .route("/relatedproduct/{category}", web::get().to(catalog::related_products))
        .route("/deleteallproducts", web::delete().to(catalog::delete_all_products))
        .route("/signup", web::post().to(accounts::sign_up))
        .route("/login", web::post().to(accounts::login))
        .route("/addadmin", web::post().to(accounts::add_admin))
        .route("/admin/login", web::post().to(accounts::admin_login))
        .service(
            web::resource("/allproducts")
                .wrap(guarded(Access::Any))
                .route(web::get().to(catalog::all_products)),
        )
        .service(
            web::resource("/addtocart")
                .wrap(guarded(Access::User))
                .route(web::post().to(cart::add_to_cart)),
        )
        .service(
            web::resource("/removefromcart")
                .wrap(guarded(Access::User))
                .route(web::post().to(cart::remove_from_cart)),
        )
        .service(
            web::resource("/getcart")
                .wrap(guarded(Access::User))
                .route(web::post().to(cart::get_cart)),
        )
        .service(Files::new("/images", &state.upload_dir));
}
