use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{info, warn};

use super::{AssetStore, StoredAsset, validate_key, validate_segment};
use crate::error::StorageError;

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

/// Signed uploads to the Cloudinary image API.
pub struct CloudinaryStore {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, StorageError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/v1_1/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// Form for a signed call: the signed params plus `api_key` and `signature`.
    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&params, &self.config.api_secret);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature", signature));
        params
    }
}

/// Cloudinary request signature: hex SHA-1 of the params sorted by name,
/// joined as `k=v&k=v`, with the API secret appended.
pub(crate) fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(env) => format!("{}: {}", status, env.error.message),
        Err(_) => format!("{}: {}", status, text),
    }
}

#[async_trait]
impl AssetStore for CloudinaryStore {
    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredAsset, StorageError> {
        validate_segment(folder)?;
        validate_segment(filename)?;

        let public_id = filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(filename)
            .to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut form = self.signed_form(vec![
            ("folder", folder.to_string()),
            ("public_id", public_id),
            ("timestamp", timestamp),
        ]);
        form.push((
            "file",
            format!("data:{};base64,{}", content_type, B64.encode(&data)),
        ));

        let response = self.http.post(self.endpoint("upload")).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(error_message(response).await));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("unexpected response: {}", e)))?;

        info!(public_id = %uploaded.public_id, bytes = data.len(), "Uploaded asset to Cloudinary");
        Ok(StoredAsset {
            key: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let form = self.signed_form(vec![
            ("public_id", key.to_string()),
            ("timestamp", timestamp),
        ]);

        let response = self.http.post(self.endpoint("destroy")).form(&form).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::DeleteFailed(error_message(response).await));
        }

        let destroyed: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("unexpected response: {}", e)))?;

        match destroyed.result.as_str() {
            "ok" => {
                info!(public_id = %key, "Deleted asset from Cloudinary");
                Ok(())
            }
            "not found" => {
                warn!(public_id = %key, "Cloudinary asset already gone");
                Ok(())
            }
            other => Err(StorageError::DeleteFailed(other.to_string())),
        }
    }

    fn backend_name(&self) -> &'static str {
        "cloudinary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn store(api_base: String) -> CloudinaryStore {
        CloudinaryStore::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "key-123".into(),
            api_secret: "shh".into(),
            api_base,
        })
        .unwrap()
    }

    #[test]
    fn signature_ignores_param_order() {
        let a = sign(
            &[("timestamp", "1".into()), ("folder", "thumbnails".into())],
            "shh",
        );
        let b = sign(
            &[("folder", "thumbnails".into()), ("timestamp", "1".into())],
            "shh",
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert_ne!(a, sign(&[("folder", "thumbnails".into()), ("timestamp", "1".into())], "other"));
    }

    #[tokio::test]
    async fn upload_posts_signed_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1_1/demo/image/upload")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("folder".into(), "thumbnails".into()),
                Matcher::UrlEncoded("public_id".into(), "final-output-1".into()),
                Matcher::UrlEncoded("api_key".into(), "key-123".into()),
                Matcher::UrlEncoded("file".into(), "data:image/png;base64,cG5n".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"public_id":"thumbnails/final-output-1","secure_url":"https://res.cloudinary.com/demo/image/upload/thumbnails/final-output-1.png"}"#,
            )
            .create_async()
            .await;

        let asset = store(server.url())
            .upload("thumbnails", "final-output-1.png", "image/png", b"png".to_vec())
            .await
            .unwrap();
        assert_eq!(asset.key, "thumbnails/final-output-1");
        assert!(asset.url.starts_with("https://res.cloudinary.com/"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upload_error_surfaces_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1_1/demo/image/upload")
            .with_status(401)
            .with_body(r#"{"error":{"message":"Invalid Signature"}}"#)
            .create_async()
            .await;

        let err = store(server.url())
            .upload("thumbnails", "x.png", "image/png", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(ref m) if m.contains("Invalid Signature")));
    }

    #[tokio::test]
    async fn delete_tolerates_missing_asset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1_1/demo/image/destroy")
            .match_body(Matcher::UrlEncoded("public_id".into(), "thumbnails/gone".into()))
            .with_status(200)
            .with_body(r#"{"result":"not found"}"#)
            .create_async()
            .await;

        store(server.url()).delete("thumbnails/gone").await.unwrap();
        mock.assert_async().await;
    }
}
