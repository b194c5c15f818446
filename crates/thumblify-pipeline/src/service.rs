use std::sync::Arc;

use chrono::Utc;
use thumblify_db::Database;
use thumblify_db::models::NewThumbnail;
use thumblify_types::api::{GenerateThumbnailRequest, MAX_TITLE_LEN};
use thumblify_types::catalog::AspectRatio;
use thumblify_types::models::Thumbnail;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::assets::{AssetStore, StoredAsset};
use crate::error::PipelineError;
use crate::model::ImageModel;
use crate::prompt::compose_prompt;
use crate::records::thumbnail_from_row;

/// Folder every generated thumbnail is uploaded into.
pub const THUMBNAIL_FOLDER: &str = "thumbnails";

/// Owns the generate / list / get / delete lifecycle of thumbnail records.
#[derive(Clone)]
pub struct ThumbnailService {
    db: Arc<Database>,
    model: Arc<dyn ImageModel>,
    store: Arc<dyn AssetStore>,
}

impl ThumbnailService {
    pub fn new(db: Arc<Database>, model: Arc<dyn ImageModel>, store: Arc<dyn AssetStore>) -> Self {
        Self { db, model, store }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// Run the full pipeline for one request.
    ///
    /// The record is inserted with `is_generating` set before the model is
    /// called, so it is visible while generation runs. On any failure the
    /// record is removed again, together with an already-uploaded asset.
    ///
    /// The work runs on its own task: dropping the returned future (a client
    /// disconnect) does not interrupt generation or reconciliation.
    pub async fn generate(
        &self,
        user_id: Uuid,
        req: GenerateThumbnailRequest,
    ) -> Result<Thumbnail, PipelineError> {
        let service = self.clone();
        tokio::spawn(async move { service.run_generation(user_id, req).await })
            .await
            .map_err(|e| PipelineError::Database(anyhow::anyhow!("generation task failed: {}", e)))?
    }

    async fn run_generation(
        &self,
        user_id: Uuid,
        req: GenerateThumbnailRequest,
    ) -> Result<Thumbnail, PipelineError> {
        let req = validate(req)?;
        let prompt = compose_prompt(&req);
        let thumbnail_id = Uuid::new_v4();

        let insert_req = req.clone();
        let insert_prompt = prompt.clone();
        blocking(&self.db, move |db| {
            let id = thumbnail_id.to_string();
            let owner = user_id.to_string();
            db.insert_thumbnail(
                &NewThumbnail {
                    id: &id,
                    user_id: &owner,
                    title: &insert_req.title,
                    style: insert_req.style.as_str(),
                    aspect_ratio: insert_req.aspect_ratio.as_str(),
                    color_scheme: insert_req.color_scheme.map(|c| c.as_str()),
                    text_overlay: insert_req.text_overlay,
                    user_prompt: insert_req.prompt.as_deref(),
                    prompt_used: &insert_prompt,
                },
                Utc::now(),
            )
        })
        .await?;

        info!(
            thumbnail_id = %thumbnail_id,
            user_id = %user_id,
            style = %req.style,
            aspect_ratio = %req.aspect_ratio,
            "Thumbnail generation started"
        );

        let asset = match self.produce(thumbnail_id, &prompt, req.aspect_ratio).await {
            Ok(asset) => asset,
            Err(e) => {
                warn!(thumbnail_id = %thumbnail_id, error = %e, "Thumbnail generation failed");
                self.discard_record(thumbnail_id).await;
                return Err(e);
            }
        };

        let id = thumbnail_id.to_string();
        let url = asset.url.clone();
        let key = asset.key.clone();
        let finalized =
            blocking(&self.db, move |db| db.complete_thumbnail(&id, &url, &key, Utc::now())).await;

        match finalized {
            Ok(Some(row)) => {
                info!(
                    thumbnail_id = %thumbnail_id,
                    backend = self.store.backend_name(),
                    url = %asset.url,
                    "Thumbnail generation complete"
                );
                Ok(thumbnail_from_row(row)?)
            }
            Ok(None) => {
                warn!(thumbnail_id = %thumbnail_id, "Record removed while generating, discarding asset");
                self.discard_asset(&asset.key).await;
                Err(PipelineError::RecordMissing)
            }
            Err(e) => {
                error!(thumbnail_id = %thumbnail_id, error = %e, "Failed to finalize thumbnail record");
                self.discard_asset(&asset.key).await;
                self.discard_record(thumbnail_id).await;
                Err(e.into())
            }
        }
    }

    /// Model call followed by the upload.
    async fn produce(
        &self,
        thumbnail_id: Uuid,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<StoredAsset, PipelineError> {
        let image = self.model.generate(prompt, aspect_ratio).await?;

        let short_id = thumbnail_id.simple().to_string();
        let filename = format!(
            "final-output-{}-{}.{}",
            Utc::now().timestamp_millis(),
            &short_id[..8],
            image.extension()
        );

        let asset = self
            .store
            .upload(THUMBNAIL_FOLDER, &filename, &image.mime_type, image.bytes)
            .await?;
        Ok(asset)
    }

    async fn discard_record(&self, thumbnail_id: Uuid) {
        let id = thumbnail_id.to_string();
        if let Err(e) = blocking(&self.db, move |db| db.delete_thumbnail(&id)).await {
            error!(thumbnail_id = %thumbnail_id, error = %e, "Failed to remove thumbnail record");
        }
    }

    async fn discard_asset(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            error!(asset_key = %key, error = %e, "Failed to remove orphaned asset");
        }
    }

    /// The user's thumbnails, newest first.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Thumbnail>, PipelineError> {
        let rows =
            blocking(&self.db, move |db| db.list_thumbnails_for_user(&user_id.to_string())).await?;
        let thumbnails = rows
            .into_iter()
            .map(thumbnail_from_row)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(thumbnails)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Thumbnail>, PipelineError> {
        let row = blocking(&self.db, move |db| {
            db.get_thumbnail_for_user(&id.to_string(), &user_id.to_string())
        })
        .await?;
        Ok(row.map(thumbnail_from_row).transpose()?)
    }

    /// Delete an owned thumbnail and its stored image.
    /// Returns `false` if the user owns no thumbnail with that id.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, PipelineError> {
        let removed = blocking(&self.db, move |db| {
            db.delete_thumbnail_for_user(&id.to_string(), &user_id.to_string())
        })
        .await?;

        let Some(row) = removed else {
            return Ok(false);
        };
        if let Some(key) = row.asset_key.as_deref() {
            self.discard_asset(key).await;
        }
        info!(thumbnail_id = %id, user_id = %user_id, "Thumbnail deleted");
        Ok(true)
    }

    /// Remove records stuck in generation for longer than `older_than`,
    /// e.g. after a crash mid-request. Such records never have an asset.
    pub async fn sweep_stale(&self, older_than: chrono::Duration) -> Result<usize, PipelineError> {
        let cutoff = Utc::now() - older_than;
        let ids = blocking(&self.db, move |db| db.delete_stale_generating(cutoff)).await?;
        for id in &ids {
            warn!(thumbnail_id = %id, "Removed stale generating thumbnail");
        }
        Ok(ids.len())
    }
}

fn validate(mut req: GenerateThumbnailRequest) -> Result<GenerateThumbnailRequest, PipelineError> {
    req.title = req.title.trim().to_string();
    if req.title.is_empty() {
        return Err(PipelineError::Invalid("Title is required".into()));
    }
    if req.title.chars().count() > MAX_TITLE_LEN {
        return Err(PipelineError::Invalid(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    req.prompt = req
        .prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());
    Ok(req)
}

/// Run a blocking DB closure off the async runtime.
pub async fn blocking<F, T>(db: &Arc<Database>, f: F) -> anyhow::Result<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::test_helpers::{MockModel, MockStorage};
    use std::time::Duration;
    use thumblify_types::catalog::{ColorScheme, ThumbnailStyle};

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Arc<Database>,
        model: Arc<MockModel>,
        store: Arc<MockStorage>,
        service: ThumbnailService,
        user: Uuid,
    }

    fn fixture(model: MockModel) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("t.db")).unwrap());
        let user = Uuid::new_v4();
        db.create_user(&user.to_string(), "Ana", "ana@example.com", "hash", Utc::now())
            .unwrap();
        let model = Arc::new(model);
        let store = Arc::new(MockStorage::new());
        let service = ThumbnailService::new(db.clone(), model.clone(), store.clone());
        Fixture {
            _dir: dir,
            db,
            model,
            store,
            service,
            user,
        }
    }

    fn request(title: &str) -> GenerateThumbnailRequest {
        GenerateThumbnailRequest {
            title: title.into(),
            prompt: Some("  a cat on a keyboard ".into()),
            style: ThumbnailStyle::Illustrated,
            aspect_ratio: AspectRatio::Square,
            color_scheme: Some(ColorScheme::Pastel),
            text_overlay: true,
        }
    }

    #[tokio::test]
    async fn success_completes_record() {
        let f = fixture(MockModel::returning_png(b"image".to_vec()));
        let thumb = f.service.generate(f.user, request("  Cats  ")).await.unwrap();

        assert!(!thumb.is_generating);
        assert_eq!(thumb.title, "Cats");
        assert_eq!(thumb.user_prompt.as_deref(), Some("a cat on a keyboard"));
        assert_eq!(thumb.color_scheme, Some(ColorScheme::Pastel));
        let key = thumb.asset_key.clone().unwrap();
        assert!(key.starts_with("thumbnails/final-output-"));
        assert!(key.ends_with(".png"));
        assert_eq!(f.store.get(&key).unwrap(), b"image");
        assert_eq!(thumb.image_url.as_deref(), Some(format!("memory://{}", key).as_str()));

        assert_eq!(f.model.calls(), 1);
        let prompt = f.model.last_prompt().unwrap();
        assert_eq!(prompt, thumb.prompt_used);
        assert!(prompt.contains("for: \"Cats\""));

        let listed = f.service.list(f.user).await.unwrap();
        assert_eq!(listed, vec![thumb]);
    }

    #[tokio::test]
    async fn model_failure_removes_record() {
        let f = fixture(MockModel::failing_with_status(503));
        let err = f.service.generate(f.user, request("Cats")).await.unwrap_err();

        assert!(matches!(err, PipelineError::Model(ModelError::Status { status: 503, .. })));
        assert!(f.service.list(f.user).await.unwrap().is_empty());
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn missing_image_removes_record() {
        let f = fixture(MockModel::returning_no_image());
        let err = f.service.generate(f.user, request("Cats")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model(ModelError::NoImage)));
        assert!(f.service.list(f.user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_failure_removes_record() {
        let f = fixture(MockModel::returning_png(b"image".to_vec()));
        f.store.set_fail_uploads(true);
        let err = f.service.generate(f.user, request("Cats")).await.unwrap_err();

        assert!(matches!(err, PipelineError::Storage(_)));
        assert!(f.service.list(f.user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_title_never_reaches_model() {
        let f = fixture(MockModel::returning_png(b"image".to_vec()));
        let err = f.service.generate(f.user, request("   ")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Invalid(_)));

        let long = "x".repeat(MAX_TITLE_LEN + 1);
        let err = f.service.generate(f.user, request(&long)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Invalid(_)));

        assert_eq!(f.model.calls(), 0);
        assert!(f.service.list(f.user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_record_and_asset() {
        let f = fixture(MockModel::returning_png(b"image".to_vec()));
        let thumb = f.service.generate(f.user, request("Cats")).await.unwrap();
        let key = thumb.asset_key.clone().unwrap();

        let stranger = Uuid::new_v4();
        assert!(!f.service.delete(stranger, thumb.id).await.unwrap());
        assert!(f.store.get(&key).is_some());

        assert!(f.service.delete(f.user, thumb.id).await.unwrap());
        assert!(f.store.get(&key).is_none());
        assert!(f.service.get(f.user, thumb.id).await.unwrap().is_none());
        assert!(!f.service.delete(f.user, thumb.id).await.unwrap());
    }

    #[tokio::test]
    async fn get_is_owner_scoped() {
        let f = fixture(MockModel::returning_png(b"image".to_vec()));
        let thumb = f.service.generate(f.user, request("Cats")).await.unwrap();
        assert!(f.service.get(f.user, thumb.id).await.unwrap().is_some());
        assert!(f.service.get(Uuid::new_v4(), thumb.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_generating_rows() {
        let f = fixture(MockModel::returning_png(b"image".to_vec()));
        let done = f.service.generate(f.user, request("Done")).await.unwrap();

        let stuck = Uuid::new_v4().to_string();
        let owner = f.user.to_string();
        f.db.insert_thumbnail(
            &NewThumbnail {
                id: &stuck,
                user_id: &owner,
                title: "Stuck",
                style: "Minimalist",
                aspect_ratio: "16:9",
                color_scheme: None,
                text_overlay: false,
                user_prompt: None,
                prompt_used: "p",
            },
            Utc::now() - chrono::Duration::hours(2),
        )
        .unwrap();

        let swept = f.service.sweep_stale(chrono::Duration::minutes(15)).await.unwrap();
        assert_eq!(swept, 1);
        let remaining = f.service.list(f.user).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, done.id);
    }

    #[tokio::test]
    async fn dropped_caller_still_completes_generation() {
        let f = fixture(
            MockModel::returning_png(b"image".to_vec()).with_delay(Duration::from_millis(150)),
        );

        let dropped =
            tokio::time::timeout(Duration::from_millis(30), f.service.generate(f.user, request("Cats")))
                .await;
        assert!(dropped.is_err());

        let mut listed = Vec::new();
        for _ in 0..40 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            listed = f.service.list(f.user).await.unwrap();
            if !listed.is_empty() && listed.iter().all(|t| !t.is_generating) {
                break;
            }
        }
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_generating);
        let key = listed[0].asset_key.clone().unwrap();
        assert!(f.store.get(&key).is_some());
        assert!(listed[0].image_url.is_some());
    }

    /// Removes every generating record while the image is being produced.
    struct RowDeletingModel {
        db: Arc<Database>,
    }

    #[async_trait::async_trait]
    impl ImageModel for RowDeletingModel {
        async fn generate(
            &self,
            _prompt: &str,
            _aspect_ratio: AspectRatio,
        ) -> Result<crate::model::GeneratedImage, ModelError> {
            let removed = self
                .db
                .delete_stale_generating(Utc::now() + chrono::Duration::minutes(1))
                .unwrap();
            assert_eq!(removed.len(), 1);
            Ok(crate::model::GeneratedImage {
                bytes: b"image".to_vec(),
                mime_type: "image/png".into(),
            })
        }
    }

    #[tokio::test]
    async fn record_removed_mid_generation_discards_asset() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::open(&dir.path().join("t.db")).unwrap());
        let user = Uuid::new_v4();
        db.create_user(&user.to_string(), "Ana", "ana@example.com", "hash", Utc::now())
            .unwrap();
        let store = Arc::new(MockStorage::new());
        let service = ThumbnailService::new(
            db.clone(),
            Arc::new(RowDeletingModel { db: db.clone() }),
            store.clone(),
        );

        let err = service.generate(user, request("Cats")).await.unwrap_err();
        assert!(matches!(err, PipelineError::RecordMissing));
        assert!(store.is_empty());
        assert!(service.list(user).await.unwrap().is_empty());
    }
}
