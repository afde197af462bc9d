//! Template staging
//!
//! Templates below the inline ceiling are submitted as a body. Larger ones go
//! through a throw-away bucket that is removed again on every exit path: either
//! explicitly through [`StagingGuard::release`], or by a cleanup task spawned
//! when the guard is dropped unreleased.

use crate::api::{ObjectStore, PutObjectRequest, TemplateSource};
use crate::cancellable;
use crate::error::{CloudError, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Largest template, in bytes, the stack API accepts inline.
pub const INLINE_TEMPLATE_LIMIT: usize = 51_200;
pub const STAGING_BUCKET_PREFIX: &str = "com.docker.compose.";
pub const TEMPLATE_KEY: &str = "template.yaml";
pub const TEMPLATE_CONTENT_TYPE: &str = "application/x-yaml";
/// Region in which buckets must be created without a location constraint.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Tag key identifying the compose project owning a staged object or a stack.
pub const PROJECT_TAG: &str = "com.docker.compose.project";

/// A template ready for submission, plus whatever was staged for it.
pub struct StagedTemplate {
    pub source: TemplateSource,
    guard: Option<StagingGuard>,
}

impl StagedTemplate {
    pub fn inline(body: String) -> Self {
        Self {
            source: TemplateSource::Body(body),
            guard: None,
        }
    }

    pub fn is_staged(&self) -> bool {
        self.guard.is_some()
    }

    /// Remove staged objects. Cleanup errors are logged, never returned.
    pub async fn release(self) {
        if let Some(guard) = self.guard {
            guard.release().await;
        }
    }
}

/// Owns a staging bucket (and its object once uploaded) until released.
pub struct StagingGuard {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    object: Option<UploadedObject>,
    released: bool,
}

#[derive(Debug, Clone)]
struct UploadedObject {
    key: String,
    version_id: Option<String>,
}

impl StagingGuard {
    fn new(store: Arc<dyn ObjectStore>, bucket: String) -> Self {
        Self {
            store,
            bucket,
            object: None,
            released: false,
        }
    }

    pub async fn release(mut self) {
        self.released = true;
        cleanup(self.store.clone(), self.bucket.clone(), self.object.take()).await;
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let store = self.store.clone();
        let bucket = std::mem::take(&mut self.bucket);
        let object = self.object.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(%bucket, "staging guard dropped, cleaning up in background");
                handle.spawn(cleanup(store, bucket, object));
            }
            Err(_) => warn!(%bucket, "no runtime to remove staging bucket; delete it manually"),
        }
    }
}

async fn cleanup(store: Arc<dyn ObjectStore>, bucket: String, object: Option<UploadedObject>) {
    if let Some(object) = object
        && let Err(e) = store
            .delete_object(&bucket, &object.key, object.version_id.as_deref())
            .await
    {
        warn!(%bucket, key = %object.key, error = %e, "failed to delete staged template");
    }
    match store.delete_bucket(&bucket).await {
        Ok(()) => debug!(%bucket, "staging bucket removed"),
        Err(e) => warn!(%bucket, error = %e, "failed to delete staging bucket"),
    }
}

/// Make `template` submittable, staging it through object storage when it is
/// too large to send inline.
pub async fn stage(
    store: &Arc<dyn ObjectStore>,
    project: &str,
    region: &str,
    template: &[u8],
    cancel: &CancellationToken,
) -> Result<StagedTemplate> {
    if template.len() < INLINE_TEMPLATE_LIMIT {
        let body = String::from_utf8(template.to_vec())
            .map_err(|_| CloudError::Staging("template is not valid UTF-8".to_string()))?;
        return Ok(StagedTemplate::inline(body));
    }

    let bucket = format!("{}{}", STAGING_BUCKET_PREFIX, uuid::Uuid::new_v4());
    let location = (region != DEFAULT_REGION).then_some(region);
    info!(%bucket, bytes = template.len(), "staging template");

    cancellable(cancel, store.create_bucket(&bucket, location)).await?;
    let mut guard = StagingGuard::new(store.clone(), bucket.clone());

    let request = PutObjectRequest {
        bucket,
        key: TEMPLATE_KEY.to_string(),
        body: template.to_vec(),
        content_type: TEMPLATE_CONTENT_TYPE.to_string(),
        tagging: format!("{}={}", PROJECT_TAG, project),
    };
    let stored = match cancellable(cancel, store.put_object(request)).await {
        Ok(stored) => stored,
        Err(e) => {
            guard.release().await;
            return Err(e);
        }
    };
    guard.object = Some(UploadedObject {
        key: TEMPLATE_KEY.to_string(),
        version_id: stored.version_id,
    });

    Ok(StagedTemplate {
        source: TemplateSource::Url(stored.url),
        guard: Some(guard),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{Call, FakeCloud};

    fn store(fake: &Arc<FakeCloud>) -> Arc<dyn ObjectStore> {
        fake.clone()
    }

    #[tokio::test]
    async fn test_small_template_is_inline() {
        let fake = Arc::new(FakeCloud::default());
        let staged = stage(&store(&fake), "demo", "eu-west-1", b"Resources: {}", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(staged.source, TemplateSource::Body("Resources: {}".to_string()));
        assert!(!staged.is_staged());
        staged.release().await;
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_large_template_is_staged_and_released() {
        let fake = Arc::new(FakeCloud::default());
        let template = vec![b'a'; INLINE_TEMPLATE_LIMIT];

        let staged = stage(&store(&fake), "demo", "eu-west-1", &template, &CancellationToken::new())
            .await
            .unwrap();
        assert!(staged.is_staged());
        assert!(matches!(&staged.source, TemplateSource::Url(url) if url.ends_with("/template.yaml")));

        staged.release().await;

        let calls = fake.calls();
        assert_eq!(calls.len(), 4);
        let Call::CreateBucket { bucket, location } = &calls[0] else {
            panic!("expected bucket creation, got {:?}", calls[0]);
        };
        assert!(bucket.starts_with(STAGING_BUCKET_PREFIX));
        assert_eq!(location.as_deref(), Some("eu-west-1"));
        assert!(matches!(&calls[1], Call::PutObject(req)
            if req.key == TEMPLATE_KEY
                && req.content_type == TEMPLATE_CONTENT_TYPE
                && req.tagging == "com.docker.compose.project=demo"));
        assert!(matches!(&calls[2], Call::DeleteObject { version_id, .. } if version_id.as_deref() == Some("v1")));
        assert!(matches!(&calls[3], Call::DeleteBucket(b) if b == bucket));
    }

    #[tokio::test]
    async fn test_default_region_has_no_location_constraint() {
        let fake = Arc::new(FakeCloud::default());
        let template = vec![b'a'; INLINE_TEMPLATE_LIMIT + 1];

        let staged = stage(&store(&fake), "demo", DEFAULT_REGION, &template, &CancellationToken::new())
            .await
            .unwrap();
        staged.release().await;

        assert!(matches!(&fake.calls()[0], Call::CreateBucket { location: None, .. }));
    }

    #[tokio::test]
    async fn test_failed_upload_removes_bucket() {
        let fake = Arc::new(FakeCloud {
            fail_put_object: true,
            ..Default::default()
        });
        let template = vec![b'a'; INLINE_TEMPLATE_LIMIT];

        let result = stage(&store(&fake), "demo", "eu-west-1", &template, &CancellationToken::new()).await;
        assert!(matches!(result, Err(CloudError::Remote { .. })));

        let calls = fake.calls();
        assert!(matches!(calls.last(), Some(Call::DeleteBucket(_))));
        assert!(!calls.iter().any(|c| matches!(c, Call::DeleteObject { .. })));
    }

    #[tokio::test]
    async fn test_failed_bucket_creation_stages_nothing() {
        let fake = Arc::new(FakeCloud {
            fail_create_bucket: true,
            ..Default::default()
        });
        let template = vec![b'a'; INLINE_TEMPLATE_LIMIT];

        assert!(stage(&store(&fake), "demo", "eu-west-1", &template, &CancellationToken::new()).await.is_err());
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_guard_cleans_up() {
        let fake = Arc::new(FakeCloud::default());
        let template = vec![b'a'; INLINE_TEMPLATE_LIMIT];

        let staged = stage(&store(&fake), "demo", "eu-west-1", &template, &CancellationToken::new())
            .await
            .unwrap();
        drop(staged);

        for _ in 0..10 {
            if fake.calls().iter().any(|c| matches!(c, Call::DeleteBucket(_))) {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(fake.calls().iter().any(|c| matches!(c, Call::DeleteObject { .. })));
        assert!(fake.calls().iter().any(|c| matches!(c, Call::DeleteBucket(_))));
    }

    #[tokio::test]
    async fn test_cancelled_before_upload() {
        let fake = Arc::new(FakeCloud::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let template = vec![b'a'; INLINE_TEMPLATE_LIMIT];
        let result = stage(&store(&fake), "demo", "eu-west-1", &template, &cancel).await;
        assert!(matches!(result, Err(CloudError::Cancelled)));
        assert!(fake.calls().is_empty());
    }
}
