use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

/// Reads an image and returns it as a base64 `data:` URL.
pub async fn encode_photo(path: &Path) -> Result<String> {
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| mime.starts_with("image/"))
        .ok_or_else(|| anyhow!("'{}' is not an image file", path.display()))?;

    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    if metadata.len() > MAX_PHOTO_BYTES {
        bail!("File size must be less than 5MB");
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    Ok(data_url(mime_type, &bytes))
}

fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}
