use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::store::{AccountStore, CatalogStore};

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub tokens: Arc<TokenService>,
    pub upload_dir: PathBuf,
    pub public_url: String,
    pub max_upload_bytes: usize,
}
