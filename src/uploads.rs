//! Shared handling for user-supplied files (photos, signatures).

use anyhow::Result;
use uuid::Uuid;

use crate::storage::ObjectStorage;

const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];

pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn object_key(prefix: &str, filename: &str) -> String {
    format!("{}/{}_{}", prefix, Uuid::new_v4(), sanitize_filename(filename))
}

/// Uploads the bytes under a fresh key and returns that key as the durable
/// reference stored in the record store.
pub async fn store_upload(
    storage: &dyn ObjectStorage,
    prefix: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<String> {
    let key = object_key(prefix, filename);
    let content_type = mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.to_string());
    storage.put_object(&key, bytes, content_type).await?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list() {
        assert!(allowed_file("sig.png"));
        assert!(allowed_file("photo.JPG"));
        assert!(allowed_file("card.pdf"));
        assert!(!allowed_file("script.sh"));
        assert!(!allowed_file("noextension"));
    }

    #[test]
    fn object_keys_are_prefixed_and_sanitized() {
        let key = object_key("employee_photos", "my photo (1).jpg");
        assert!(key.starts_with("employee_photos/"));
        assert!(key.ends_with("_my_photo__1_.jpg"));
        assert!(!key.contains(' '));
    }
}
