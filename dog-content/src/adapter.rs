use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    checksum_map, Asset, AssetBlob, AssetBlobStore, AssetStore, AttributeChange, Blob,
    BlobHeaders, BlobPayload, BlobRef, BlobStore, ByteStream, CacheController, CacheInfo, Checksums,
    ComponentId, Content, ContentConfig, ContentError, ContentPolicy, ContentResult,
    DefaultContentPolicy, NestedAttributes, TempBlob, BLOB_NAME_HEADER, CACHE,
    CONTENT_TYPE_HEADER, CREATED_BY_HEADER, CREATED_BY_IP_HEADER, DEFAULT_CONTENT_TYPE,
    REPO_NAME_HEADER,
};

/// Content operations for one repository.
///
/// Holds the stores and policy the per-asset [`FluentAsset`] facade works
/// against. The adapter itself keeps no state beyond its collaborators.
pub struct ContentAdapter {
    blobs: Arc<dyn BlobStore>,
    asset_blobs: Arc<dyn AssetBlobStore>,
    assets: Arc<dyn AssetStore>,
    policy: Arc<dyn ContentPolicy>,
    config: ContentConfig,
}

impl ContentAdapter {
    /// Create a new content adapter with the default policy
    pub fn new<B, AB, A>(blobs: B, asset_blobs: AB, assets: A, config: ContentConfig) -> Self
    where
        B: BlobStore + 'static,
        AB: AssetBlobStore + 'static,
        A: AssetStore + 'static,
    {
        Self {
            blobs: Arc::new(blobs),
            asset_blobs: Arc::new(asset_blobs),
            assets: Arc::new(assets),
            policy: Arc::new(DefaultContentPolicy::new()),
            config,
        }
    }

    /// Replace the attach/delete/content-type policy
    pub fn with_policy<P: ContentPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Wrap an asset for content operations
    pub fn asset(&self, asset: Asset) -> FluentAsset<'_> {
        FluentAsset {
            adapter: self,
            asset,
        }
    }

    /// Create and persist a new asset in this repository
    pub async fn create_asset<P, K>(&self, path: P, kind: K) -> ContentResult<FluentAsset<'_>>
    where
        P: Into<String>,
        K: Into<String>,
    {
        let asset = Asset::new(self.config.repository.clone(), path).with_kind(kind);
        let created = self.assets.create(asset).await?;
        debug!("Created asset {} in {}", created.path, created.repository);
        Ok(self.asset(created))
    }

    /// Look up an asset of this repository by path
    pub async fn find_asset(&self, path: &str) -> ContentResult<Option<FluentAsset<'_>>> {
        let found = self.assets.read(&self.config.repository, path).await?;
        Ok(found.map(|asset| self.asset(asset)))
    }

    /// Get configuration
    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    fn blob_ref(&self, blob: &Blob) -> BlobRef {
        BlobRef::new(
            self.config.node_name.clone(),
            self.config.blob_store_name.clone(),
            blob.id.clone(),
        )
    }

    /// Copy temporary content into permanent storage under the asset's headers
    async fn make_permanent(&self, asset: &Asset, temp: &Blob) -> ContentResult<Blob> {
        let content_type = self.policy.check_content_type(asset, temp).await?;

        let mut headers = BlobHeaders::new();
        headers.insert(REPO_NAME_HEADER.to_string(), self.config.repository.clone());
        headers.insert(BLOB_NAME_HEADER.to_string(), asset.path.clone());
        for name in [CREATED_BY_HEADER, CREATED_BY_IP_HEADER] {
            if let Some(value) = temp.header(name) {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        headers.insert(CONTENT_TYPE_HEADER.to_string(), content_type);

        self.blobs.copy(&temp.id, headers).await
    }

    /// Reuse the record for `blob_ref` or create it.
    ///
    /// A create that loses a race reports `Conflict`; the winner's record is
    /// then read back and used.
    async fn resolve_asset_blob(
        &self,
        blob_ref: BlobRef,
        blob: &Blob,
        checksums: &Checksums,
    ) -> ContentResult<AssetBlob> {
        if let Some(existing) = self.asset_blobs.read(&blob_ref).await? {
            debug!("Reusing asset blob {}", blob_ref);
            return Ok(existing);
        }

        let record = AssetBlob {
            blob_ref,
            blob_size: blob.metrics.content_size,
            content_type: blob
                .header(CONTENT_TYPE_HEADER)
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            checksums: checksum_map(checksums),
            blob_created: blob.metrics.creation_time,
            created_by: blob.header(CREATED_BY_HEADER).map(str::to_string),
            created_by_ip: blob.header(CREATED_BY_IP_HEADER).map(str::to_string),
        };

        match self.asset_blobs.create(record).await {
            Ok(created) => {
                debug!("Created asset blob {}", created.blob_ref);
                Ok(created)
            }
            Err(ContentError::Conflict { blob_ref }) => {
                warn!("Asset blob {} created concurrently, reading it back", blob_ref);
                let winner = self.asset_blobs.read(&blob_ref).await?;
                winner.ok_or_else(|| ContentError::conflict(blob_ref))
            }
            Err(e) => Err(e),
        }
    }
}

/// Content operations bound to a single asset
pub struct FluentAsset<'a> {
    adapter: &'a ContentAdapter,
    asset: Asset,
}

impl<'a> FluentAsset<'a> {
    pub fn repository(&self) -> &str {
        &self.asset.repository
    }

    pub fn path(&self) -> &str {
        &self.asset.path
    }

    pub fn kind(&self) -> &str {
        &self.asset.kind
    }

    pub fn component(&self) -> Option<ComponentId> {
        self.asset.component
    }

    pub fn blob_ref(&self) -> Option<&BlobRef> {
        self.asset.blob_ref.as_ref()
    }

    /// Read the linked asset blob record
    pub async fn blob(&self) -> ContentResult<Option<AssetBlob>> {
        match &self.asset.blob_ref {
            Some(blob_ref) => self.adapter.asset_blobs.read(blob_ref).await,
            None => Ok(None),
        }
    }

    pub fn attributes_map(&self) -> &NestedAttributes {
        &self.asset.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.asset.attributes.get(key)
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.asset.created
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.asset.last_updated
    }

    pub fn last_downloaded(&self) -> Option<DateTime<Utc>> {
        self.asset.last_downloaded
    }

    pub fn as_asset(&self) -> &Asset {
        &self.asset
    }

    pub fn unwrap(self) -> Asset {
        self.asset
    }

    /// Apply an attribute change, persisting only when it altered anything
    pub async fn attributes(
        &mut self,
        change: AttributeChange,
        key: &str,
        value: Value,
    ) -> ContentResult<&mut Self> {
        let mut updated = self.asset.clone();
        if !updated.attributes.apply(change, key, value) {
            debug!("Attribute change {:?} on {} left {} unchanged", change, key, updated.path);
            return Ok(self);
        }

        updated.last_updated = Utc::now();
        self.adapter.assets.update_attributes(&updated).await?;
        self.asset = updated;
        Ok(self)
    }

    /// Promote uploaded content and attach it
    #[instrument(skip(self, temp), fields(path = %self.asset.path))]
    pub async fn attach_temp(&mut self, temp: TempBlob) -> ContentResult<&mut Self> {
        self.adapter.policy.check_attach_allowed(&self.asset).await?;
        let blob = self.adapter.make_permanent(&self.asset, &temp.blob).await?;
        self.do_attach(&blob, &temp.hashes).await
    }

    /// Attach content that already lives in permanent storage
    #[instrument(skip(self, blob, checksums), fields(path = %self.asset.path, blob_id = %blob.id))]
    pub async fn attach(&mut self, blob: &Blob, checksums: &Checksums) -> ContentResult<&mut Self> {
        self.adapter.policy.check_attach_allowed(&self.asset).await?;
        self.do_attach(blob, checksums).await
    }

    async fn do_attach(&mut self, blob: &Blob, checksums: &Checksums) -> ContentResult<&mut Self> {
        let blob_ref = self.adapter.blob_ref(blob);
        let asset_blob = self
            .adapter
            .resolve_asset_blob(blob_ref, blob, checksums)
            .await?;

        let mut updated = self.asset.clone();
        updated.blob_ref = Some(asset_blob.blob_ref.clone());
        updated.last_updated = Utc::now();
        self.adapter.assets.update_blob_link(&updated).await?;
        self.asset = updated;

        info!("Attached {} to {}", asset_blob.blob_ref, self.asset.path);
        Ok(self)
    }

    /// Fetch the attached content.
    ///
    /// The returned content carries a copy of this asset in its attributes.
    #[instrument(skip(self), fields(path = %self.asset.path))]
    pub async fn download(&self) -> ContentResult<Content> {
        let blob_ref = self.asset.blob_ref.as_ref().ok_or_else(|| {
            ContentError::inconsistent(format!("No blob attached to {}", self.asset.path))
        })?;

        let asset_blob = self
            .adapter
            .asset_blobs
            .read(blob_ref)
            .await?
            .ok_or_else(|| {
                ContentError::inconsistent(format!(
                    "Asset blob {} linked from {} does not exist",
                    blob_ref, self.asset.path
                ))
            })?;

        let blob = match self.adapter.blobs.get(&blob_ref.blob_id).await? {
            Some(blob) => blob,
            None => {
                warn!("Blob {} referenced by {} is missing", blob_ref, self.asset.path);
                return Err(ContentError::missing_blob(blob_ref.clone()));
            }
        };

        let mut content = Content::new(BlobPayload::new(blob.content, asset_blob.content_type));
        content.attributes_mut().set(self.asset.clone());
        Ok(content)
    }

    /// Download and stream the bytes in chunks of the configured size
    pub async fn download_stream(&self) -> ContentResult<ByteStream> {
        let content = self.download().await?;
        Ok(content.into_stream(self.adapter.config.chunk_size))
    }

    pub async fn mark_as_downloaded(&mut self) -> ContentResult<&mut Self> {
        let at = self.adapter.assets.mark_downloaded(&self.asset).await?;
        self.asset.last_downloaded = Some(at);
        Ok(self)
    }

    /// Replace the asset's cache info
    pub async fn mark_as_cached(&mut self, info: &CacheInfo) -> ContentResult<&mut Self> {
        self.attributes(AttributeChange::Set, CACHE, info.to_map()?).await
    }

    /// Invalidate the asset's cache info, keeping its other entries
    pub async fn mark_as_stale(&mut self) -> ContentResult<&mut Self> {
        self.attributes(AttributeChange::Overlay, CACHE, CacheInfo::invalidated_overlay())
            .await
    }

    /// Cache info stored on the asset, if any
    pub fn cache_info(&self) -> Option<CacheInfo> {
        let stored = self.asset.attributes.get(CACHE)?;
        let info = CacheInfo::from_map(Some(stored));
        if info.is_none() {
            warn!("Unreadable cache info on {}: {}", self.asset.path, stored);
        }
        info
    }

    /// Never-cached assets are not stale
    pub fn is_stale<C: CacheController + ?Sized>(&self, controller: &C) -> bool {
        match self.cache_info() {
            Some(info) => controller.is_stale(&info),
            None => false,
        }
    }

    /// Delete the asset row; blobs and blob records are left in place
    pub async fn delete(&self) -> ContentResult<bool> {
        self.adapter.policy.check_delete_allowed(&self.asset).await?;
        let deleted = self.adapter.assets.delete(&self.asset).await?;
        info!("Deleted asset {}: {}", self.asset.path, deleted);
        Ok(deleted)
    }
}

impl std::fmt::Debug for FluentAsset<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluentAsset").field("asset", &self.asset).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryAssetBlobStore, MemoryAssetStore, MemoryBlobStore};
    use crate::HashAlgorithm;
    use bytes::Bytes;
    use futures_util::StreamExt;
    use tracing_test::traced_test;

    fn create_test_adapter(blobs: &MemoryBlobStore) -> ContentAdapter {
        ContentAdapter::new(
            blobs.clone(),
            MemoryAssetBlobStore::new(),
            MemoryAssetStore::new(),
            ContentConfig::new().with_repository("npm-proxy"),
        )
    }

    async fn create_test_blob(blobs: &MemoryBlobStore) -> Blob {
        let mut headers = BlobHeaders::new();
        headers.insert(CONTENT_TYPE_HEADER.to_string(), "application/json".to_string());
        blobs.create(Bytes::from_static(b"{}"), headers).await.unwrap()
    }

    #[tokio::test]
    async fn test_default_policy_takes_content_type_from_header() {
        let blobs = MemoryBlobStore::new();
        let adapter = create_test_adapter(&blobs);
        let temp = create_test_blob(&blobs).await;

        let mut asset = adapter.create_asset("react/-/package.json", "metadata").await.unwrap();
        let mut hashes = Checksums::new();
        hashes.insert(HashAlgorithm::Sha256, "ABCDEF".to_string());
        asset.attach_temp(TempBlob::new(temp, hashes)).await.unwrap();

        let asset_blob = asset.blob().await.unwrap().unwrap();
        assert_eq!(asset_blob.content_type, "application/json");
        assert_eq!(asset_blob.checksum("SHA256"), Some("abcdef"));
        assert_eq!(asset.repository(), "npm-proxy");
        assert_eq!(asset.kind(), "metadata");
    }

    #[tokio::test]
    async fn test_attach_without_content_type_header_defaults() {
        let blobs = MemoryBlobStore::new();
        let adapter = create_test_adapter(&blobs);
        let blob = blobs.create(Bytes::from_static(b"x"), BlobHeaders::new()).await.unwrap();

        let mut asset = adapter.create_asset("x.bin", "bin").await.unwrap();
        asset.attach(&blob, &Checksums::new()).await.unwrap();

        let asset_blob = asset.blob().await.unwrap().unwrap();
        assert_eq!(asset_blob.content_type, DEFAULT_CONTENT_TYPE);
        assert!(asset_blob.checksums.is_empty());
    }

    #[tokio::test]
    async fn test_download_stream_uses_configured_chunk_size() {
        let blobs = MemoryBlobStore::new();
        let adapter = ContentAdapter::new(
            blobs.clone(),
            MemoryAssetBlobStore::new(),
            MemoryAssetStore::new(),
            ContentConfig::new().with_chunk_size(4),
        );
        let blob = blobs
            .create(Bytes::from_static(b"0123456789"), BlobHeaders::new())
            .await
            .unwrap();

        let mut asset = adapter.create_asset("digits.txt", "text").await.unwrap();
        asset.attach(&blob, &Checksums::new()).await.unwrap();

        let chunks: Vec<Bytes> = asset
            .download_stream()
            .await
            .unwrap()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(chunks.iter().map(Bytes::len).collect::<Vec<_>>(), vec![4, 4, 2]);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_missing_blob_is_logged() {
        let blobs = MemoryBlobStore::new();
        let adapter = create_test_adapter(&blobs);
        let blob = create_test_blob(&blobs).await;

        let mut asset = adapter.create_asset("x.json", "json").await.unwrap();
        asset.attach(&blob, &Checksums::new()).await.unwrap();
        blobs.remove(&blob.id);

        assert!(matches!(asset.download().await, Err(ContentError::MissingBlob { .. })));
        assert!(logs_contain("is missing"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unreadable_cache_info_is_logged_and_not_stale() {
        let blobs = MemoryBlobStore::new();
        let adapter = create_test_adapter(&blobs);

        let mut asset = adapter.create_asset("x.json", "json").await.unwrap();
        asset
            .attributes(AttributeChange::Set, CACHE, serde_json::json!({"cache_token": 5}))
            .await
            .unwrap();

        assert!(asset.cache_info().is_none());
        assert!(!asset.is_stale(&crate::TtlCacheController::never_expires()));
        assert!(logs_contain("Unreadable cache info on x.json"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_dedup_hit_is_logged() {
        let blobs = MemoryBlobStore::new();
        let adapter = create_test_adapter(&blobs);
        let blob = create_test_blob(&blobs).await;

        let mut asset = adapter.create_asset("x.json", "json").await.unwrap();
        asset.attach(&blob, &Checksums::new()).await.unwrap();
        asset.attach(&blob, &Checksums::new()).await.unwrap();

        assert!(logs_contain("Reusing asset blob"));
    }
}
