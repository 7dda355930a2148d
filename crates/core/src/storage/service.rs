//! Blob store implementation using Apache OpenDAL.

use bytes::Bytes;
use opendal::{ErrorKind, Operator, services};
use uuid::Uuid;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;

/// Blob store for attachment payloads.
///
/// Blobs are addressed by opaque storage keys namespaced under the owning
/// post; the relational ledger stores the key, never a filesystem path.
pub struct BlobStore {
    operator: Operator,
    config: StorageConfig,
}

impl BlobStore {
    /// Create a new blob store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Validate an upload against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if file size or MIME type is invalid.
    pub fn validate_upload(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }

        if !self.config.is_mime_type_allowed(content_type) {
            return Err(StorageError::invalid_mime_type(content_type));
        }

        Ok(())
    }

    /// Generate the storage key for an attachment blob.
    ///
    /// Format: `posts/{post_id}/{attachment_id}/{sanitized_filename}`
    #[must_use]
    pub fn storage_key(post_id: Uuid, attachment_id: Uuid, filename: &str) -> String {
        let sanitized_filename = sanitize_filename(filename);
        format!("posts/{post_id}/{attachment_id}/{sanitized_filename}")
    }

    /// Write a blob under the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or fails the write.
    pub async fn write(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
        self.operator
            .write(key, data)
            .await
            .map(|_| ())
            .map_err(StorageError::from)
    }

    /// Read a blob's full contents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no blob exists under the key.
    pub async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        self.operator
            .read(key)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(StorageError::from)
    }

    /// Delete a blob by key.
    ///
    /// Idempotent: deleting a nonexistent key is not an error and reports
    /// `false`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend fails the delete itself.
    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        // The backend's delete is itself idempotent and succeeds for a
        // missing key, so the key has to be checked first for a truthful
        // removal report.
        match self.operator.stat(key).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(StorageError::from(e)),
        }

        self.operator
            .delete(key)
            .await
            .map_err(StorageError::from)?;
        Ok(true)
    }

    /// Check if a blob exists under the key.
    pub async fn exists(&self, key: &str) -> bool {
        match self.operator.stat(key).await {
            Ok(_) => true,
            Err(_) => false,
        }
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
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

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> BlobStore {
        let root = std::env::temp_dir().join(format!("murmur-store-{}", Uuid::new_v4()));
        let config = StorageConfig::new(StorageProvider::local_fs(root));
        BlobStore::from_config(config).expect("should create store")
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("selfie.png"), "selfie.png");
        assert_eq!(sanitize_filename("my file (1).pdf"), "my_file__1_.pdf");
        assert_eq!(sanitize_filename("test@#$%.doc"), "test____.doc");
        assert_eq!(sanitize_filename("日本語.pdf"), "___.pdf");
    }

    #[test]
    fn test_storage_key_format() {
        let post_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").expect("valid uuid");
        let att_id = Uuid::parse_str("6ba7b811-9dad-11d1-80b4-00c04fd430c8").expect("valid uuid");

        let key = BlobStore::storage_key(post_id, att_id, "selfie.png");
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "posts");
        assert_eq!(parts[1], post_id.to_string());
        assert_eq!(parts[2], att_id.to_string());
        assert_eq!(parts[3], "selfie.png");
    }

    #[test]
    fn test_validate_upload_size() {
        let root = std::env::temp_dir().join(format!("murmur-store-{}", Uuid::new_v4()));
        let config = StorageConfig::new(StorageProvider::local_fs(root)).with_max_file_size(1024);
        let store = BlobStore::from_config(config).expect("should create store");

        assert!(store.validate_upload("image/png", 512).is_ok());

        let err = store.validate_upload("image/png", 2048).unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_upload_mime_type() {
        let store = temp_store();

        assert!(store.validate_upload("image/png", 1024).is_ok());
        assert!(store.validate_upload("application/pdf", 1024).is_ok());

        let err = store
            .validate_upload("application/x-executable", 1024)
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidMimeType { .. }));
    }

    #[tokio::test]
    async fn test_write_read_delete_roundtrip() {
        let store = temp_store();
        let key = BlobStore::storage_key(Uuid::new_v4(), Uuid::new_v4(), "a.png");

        store
            .write(&key, Bytes::from_static(b"0123456789"))
            .await
            .expect("write should succeed");
        assert!(store.exists(&key).await);

        let data = store.read(&key).await.expect("read should succeed");
        assert_eq!(data.len(), 10);

        assert!(store.delete(&key).await.expect("delete should succeed"));
        assert!(!store.exists(&key).await);
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_not_an_error() {
        let store = temp_store();
        let key = BlobStore::storage_key(Uuid::new_v4(), Uuid::new_v4(), "gone.png");

        let removed = store.delete(&key).await.expect("delete should succeed");
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let store = temp_store();
        let err = store.read("posts/nope").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    // Sanitized filenames only contain characters safe for storage keys.
    proptest! {
        #[test]
        fn prop_sanitized_filename_safe_chars(filename in ".*") {
            let sanitized = sanitize_filename(&filename);

            for c in sanitized.chars() {
                let is_safe = c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_';
                prop_assert!(is_safe, "Unexpected character in sanitized filename: {}", c);
            }
        }
    }

    // Storage keys always nest under the owning post.
    proptest! {
        #[test]
        fn prop_storage_key_post_scoped(
            filename in "[a-zA-Z0-9_-]{1,50}\\.[a-z]{2,4}",
        ) {
            let post_id = Uuid::new_v4();
            let att_id = Uuid::new_v4();

            let key = BlobStore::storage_key(post_id, att_id, &filename);

            let prefix = format!("posts/{post_id}/");
            prop_assert!(key.starts_with(&prefix));
            prop_assert!(key.contains(&att_id.to_string()));

            let parts: Vec<&str> = key.split('/').collect();
            prop_assert_eq!(parts.len(), 4);
        }
    }

    // Size validation accepts exactly the configured range.
    proptest! {
        #[test]
        fn prop_file_size_validation(
            max_size in 1024u64..10_000_000,
            file_size in 0u64..20_000_000,
        ) {
            let root = std::env::temp_dir().join(format!("murmur-store-{}", Uuid::new_v4()));
            let config = StorageConfig::new(StorageProvider::local_fs(root))
                .with_max_file_size(max_size);
            let store = BlobStore::from_config(config).expect("should create store");

            let result = store.validate_upload("image/png", file_size);

            if file_size <= max_size {
                prop_assert!(result.is_ok(), "Expected Ok for valid file size");
            } else {
                let is_too_large = matches!(result, Err(StorageError::FileTooLarge { .. }));
                prop_assert!(is_too_large, "Expected FileTooLarge error");
            }
        }
    }
}
