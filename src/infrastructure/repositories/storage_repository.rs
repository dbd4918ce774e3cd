use async_trait::async_trait;

/// Repository for object-storage uploads.
/// Abstracts the underlying store (Supabase Storage, S3, a local fake, ...)
///
/// Implementations are responsible for:
/// - Writing the bytes under the given object name in the given bucket
/// - Returning a publicly resolvable URL for the stored object
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// Upload raw bytes and return the public URL of the stored object.
    ///
    /// # Arguments
    /// * `bucket` - Target bucket name
    /// * `object_name` - Object name within the bucket; the caller guarantees uniqueness
    /// * `content_type` - MIME type to store alongside the object
    /// * `data` - The raw bytes to persist
    ///
    /// # Errors
    /// Returns error if the store rejects the write or is unavailable
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, String>;
}
