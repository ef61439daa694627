use std::fs;
use std::io;
use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "product";

#[derive(Debug, Serialize, PartialEq)]
pub struct FailedImage {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct PurgeReport {
    pub deleted: usize,
    pub failed: Vec<FailedImage>,
}

/// Names the upload directory in failure entries without exposing its absolute path.
fn directory_label(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string())
}

/// Removes every regular file in `dir`, carrying on past individual failures.
/// A directory that does not exist holds nothing to remove.
pub fn purge_images(dir: &Path) -> PurgeReport {
    let mut report = PurgeReport::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
        Err(e) => {
            report.failed.push(FailedImage {
                file: directory_label(dir),
                error: e.to_string(),
            });
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.failed.push(FailedImage {
                    file: directory_label(dir),
                    error: e.to_string(),
                });
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => report.deleted += 1,
            Err(e) => {
                log::warn!("Could not delete {}: {}", path.display(), e);
                report.failed.push(FailedImage {
                    file: entry.file_name().to_string_lossy().into_owned(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

/// `product_<unix millis>_<8 hex><.ext>`, keeping only an alphanumeric extension from the
/// client's name. The random suffix keeps uploads within the same millisecond apart.
pub fn stored_file_name(client_name: Option<&str>, millis: i64) -> String {
    let extension = client_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}{}", UPLOAD_FIELD, millis, &suffix[..8], extension)
}

pub async fn upload_image(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let invalid =
        |e: actix_multipart::MultipartError| ApiError::BadRequest(format!("Invalid upload: {}", e));

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(invalid)?;
        let disposition = field.content_disposition();
        let is_image = disposition.get_name() == Some(UPLOAD_FIELD);
        let client_name = disposition.get_filename().map(str::to_owned);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(invalid)?;
            if !is_image {
                continue;
            }
            if bytes.len() + chunk.len() > state.max_upload_bytes {
                return Err(ApiError::BadRequest(format!(
                    "Upload exceeds {} bytes",
                    state.max_upload_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }
        if !is_image {
            continue;
        }

        let millis = chrono::Utc::now().timestamp_millis();
        let filename = stored_file_name(client_name.as_deref(), millis);
        let dir = state.upload_dir.clone();
        let path = dir.join(&filename);
        web::block(move || {
            fs::create_dir_all(&dir)?;
            fs::write(path, bytes)
        })
        .await
        .map_err(|e| ApiError::internal("Failed to store image", e))?
        .map_err(|e| ApiError::internal("Failed to store image", e))?;

        log::info!("Stored image {}", filename);
        return Ok(HttpResponse::Ok().json(json!({
            "success": 1,
            "image_url": format!("{}/images/{}", state.public_url, filename),
        })));
    }

    Err(ApiError::BadRequest(format!(
        "Missing file field \"{}\"",
        UPLOAD_FIELD
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("storefront-purge-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn purge_removes_files_and_skips_subdirectories() {
        let dir = scratch_dir();
        fs::write(dir.join("product_1.png"), b"a").unwrap();
        fs::write(dir.join("product_2.jpg"), b"b").unwrap();
        fs::create_dir(dir.join("nested")).unwrap();

        let report = purge_images(&dir);
        assert_eq!(report.deleted, 2);
        assert!(report.failed.is_empty());
        assert!(dir.join("nested").is_dir());
        assert!(!dir.join("product_1.png").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn purge_of_missing_directory_is_empty() {
        let dir = std::env::temp_dir().join(format!("storefront-absent-{}", uuid::Uuid::new_v4()));
        let report = purge_images(&dir);
        assert_eq!(report.deleted, 0);
        assert!(report.failed.is_empty());
    }

    #[test]
    fn purge_of_unreadable_directory_reports_one_failure() {
        let dir = scratch_dir();
        let not_a_dir = dir.join("not_a_dir");
        fs::write(&not_a_dir, b"x").unwrap();

        let report = purge_images(&not_a_dir);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file, "not_a_dir");
        assert!(!report.failed[0].file.contains(&*dir.to_string_lossy()));

        fs::remove_dir_all(&dir).unwrap();
    }

    fn split_name(name: &str) -> (&str, &str) {
        match name.find('.') {
            Some(dot) => (&name[..dot], &name[dot..]),
            None => (name, ""),
        }
    }

    #[test]
    fn stored_names_keep_safe_extensions() {
        let cases = [
            (Some("shirt.png"), 42, "product_42_", ".png"),
            (Some("archive.tar.gz"), 1, "product_1_", ".gz"),
            (Some("noext"), 7, "product_7_", ""),
            (Some("evil.p/hp"), 7, "product_7_", ""),
            (None, 9, "product_9_", ""),
        ];
        for (client_name, millis, prefix, extension) in cases {
            let name = stored_file_name(client_name, millis);
            let (stem, ext) = split_name(&name);
            assert!(stem.starts_with(prefix), "{}", name);
            assert_eq!(stem.len(), prefix.len() + 8, "{}", name);
            assert!(stem[prefix.len()..].chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(ext, extension);
        }
    }

    #[test]
    fn stored_names_differ_within_one_millisecond() {
        assert_ne!(
            stored_file_name(Some("a.png"), 5),
            stored_file_name(Some("b.png"), 5)
        );
    }
}
