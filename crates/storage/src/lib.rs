//! S3-compatible object store client (MinIO in the default deployment).
//!
//! [`ObjectStore`] wraps the AWS S3 SDK configured for a custom endpoint
//! with path-style addressing. It covers exactly the three capabilities the
//! pipeline needs: ensure a bucket exists (optionally world-readable),
//! upload a local file under a key, and build resolvable/internal URLs.

use std::path::Path;

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

/// Connection settings for the object store.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// HTTP(S) endpoint, e.g. `http://minio:9000`.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
}

/// A connected S3-compatible client.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    endpoint: String,
}

impl ObjectStore {
    /// Build a client for the configured endpoint.
    ///
    /// Uses path-style addressing (`endpoint/bucket/key`), which MinIO
    /// serves by default. The region is nominal; MinIO ignores it.
    pub async fn connect(cfg: &ObjectStoreConfig) -> Self {
        let credentials = Credentials::new(
            cfg.access_key.clone(),
            cfg.secret_key.clone(),
            None,
            None,
            "admod",
        );

        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(&cfg.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&base)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Ensure `bucket` exists, creating it if necessary.
    ///
    /// With `public`, a read-only bucket policy is applied so every object
    /// is world-readable via GET (anonymous `s3:GetObject` on `bucket/*`).
    pub async fn ensure_bucket(&self, bucket: &str, public: bool) -> Result<(), StorageError> {
        let exists = self.client.head_bucket().bucket(bucket).send().await.is_ok();
        if !exists {
            self.client
                .create_bucket()
                .bucket(bucket)
                .send()
                .await
                .map_err(|e| StorageError::Bucket {
                    bucket: bucket.to_string(),
                    message: e.to_string(),
                })?;
            tracing::info!(bucket, "Created bucket");
        }

        if public {
            let policy = serde_json::json!({
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": {"AWS": ["*"]},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{bucket}/*")],
                }],
            });
            self.client
                .put_bucket_policy()
                .bucket(bucket)
                .policy(policy.to_string())
                .send()
                .await
                .map_err(|e| StorageError::Bucket {
                    bucket: bucket.to_string(),
                    message: format!("failed to apply public policy: {e}"),
                })?;
            tracing::info!(bucket, "Applied public read-only bucket policy");
        }

        Ok(())
    }

    /// Upload a local file under `key`, returning the key.
    pub async fn upload_file(
        &self,
        bucket: &str,
        local_path: &Path,
        key: &str,
    ) -> Result<String, StorageError> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: format!("cannot read {}: {e}", local_path.display()),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(key.to_string())
    }

    /// Externally resolvable URL for an object in a public bucket:
    /// `{endpoint}/{bucket}/{key}`.
    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{bucket}/{key}", self.endpoint)
    }
}

/// Canonical internal reference for an object in a private bucket.
pub fn internal_ref(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}

/// Errors from object-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Bucket creation or policy application failed.
    #[error("bucket {bucket}: {message}")]
    Bucket { bucket: String, message: String },

    /// An object upload failed.
    #[error("upload to {bucket}/{key} failed: {message}")]
    Upload {
        bucket: String,
        key: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_ref_is_scheme_bucket_key() {
        assert_eq!(
            internal_ref("client-media", "images/covered/A1/covered_a.jpg"),
            "s3://client-media/images/covered/A1/covered_a.jpg"
        );
    }
}
