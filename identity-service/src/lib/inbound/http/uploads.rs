use std::path::Path;
use std::path::PathBuf;

use axum::extract::multipart::Field;
use uuid::Uuid;

use crate::inbound::http::handlers::ApiError;

/// Write a multipart file field to the upload temp directory.
///
/// The temp file gets a UUID name; only the extension of the client's
/// filename is kept. The caller owns the returned path and its cleanup.
pub async fn save_upload_field(
    field: Field<'_>,
    upload_dir: &Path,
) -> Result<PathBuf, ApiError> {
    let extension = field
        .file_name()
        .and_then(|name| Path::new(name).extension())
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_string();

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
    }

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let path = upload_dir.join(format!("{}.{}", Uuid::new_v4(), extension));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    Ok(path)
}

/// Best-effort removal of temp files after a failed request, so no orphan
/// uploads are left behind.
pub async fn discard_uploads(paths: impl IntoIterator<Item = PathBuf>) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to remove temp upload file"
                );
            }
        }
    }
}
