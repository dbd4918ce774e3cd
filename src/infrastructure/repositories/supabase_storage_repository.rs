use super::storage_repository::StorageRepository;
use async_trait::async_trait;

/// Supabase Storage implementation of the storage repository.
///
/// Objects are written through the storage REST API with the service key and
/// read back through the public-object URL, so the buckets must be public.
pub struct SupabaseStorageRepository {
    base_url: String,
    service_key: String,
    http_client: reqwest::Client,
}

impl SupabaseStorageRepository {
    pub fn new(base_url: String, service_key: String, http_client: reqwest::Client) -> Self {
        Self {
            // Stored without a trailing slash so URL building stays predictable
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            http_client,
        }
    }

    fn object_url(&self, bucket: &str, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            bucket,
            urlencoding::encode(object_name)
        )
    }

    fn public_url(&self, bucket: &str, object_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            bucket,
            urlencoding::encode(object_name)
        )
    }
}

#[async_trait]
impl StorageRepository for SupabaseStorageRepository {
    async fn upload(
        &self,
        bucket: &str,
        object_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<String, String> {
        let upload_url = self.object_url(bucket, object_name);

        tracing::info!(
            bucket = bucket,
            object_name = object_name,
            content_type = content_type,
            size = data.len(),
            "Uploading object to Supabase Storage"
        );

        let response = self
            .http_client
            .post(&upload_url)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| format!("Supabase Storage request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                bucket = bucket,
                object_name = object_name,
                status = %status.as_u16(),
                error = %error_text,
                "Supabase Storage upload rejected"
            );
            return Err(format!(
                "Supabase Storage upload failed ({}): {}",
                status, error_text
            ));
        }

        Ok(self.public_url(bucket, object_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(base: &str) -> SupabaseStorageRepository {
        SupabaseStorageRepository::new(
            base.to_string(),
            "service-key".to_string(),
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_public_url_shape() {
        let repo = repo("https://example.supabase.co");
        assert_eq!(
            repo.public_url("voice-inputs", "123-sample.wav"),
            "https://example.supabase.co/storage/v1/object/public/voice-inputs/123-sample.wav"
        );
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let repo = repo("https://example.supabase.co/");
        assert_eq!(
            repo.object_url("voice-outputs", "out.mp3"),
            "https://example.supabase.co/storage/v1/object/voice-outputs/out.mp3"
        );
    }

    #[test]
    fn test_object_name_is_percent_encoded() {
        let repo = repo("https://example.supabase.co");
        let url = repo.public_url("voice-inputs", "my sample.wav");
        assert!(url.ends_with("/voice-inputs/my%20sample.wav"));
    }
}
