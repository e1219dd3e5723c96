use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{
    Asset, AssetBlob, AssetBlobStore, AssetStore, Blob, BlobHeaders, BlobId, BlobMetrics,
    BlobRef, BlobStore, ContentError, ContentResult,
};

// (repository, path)
type AssetKey = (String, String);

fn not_found(what: String) -> ContentError {
    ContentError::backend(std::io::Error::new(std::io::ErrorKind::NotFound, what))
}

/// In-memory physical blob store for testing and development
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<BlobId, Blob>>>,
    copies: Arc<AtomicUsize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a blob behind the metadata's back
    pub fn remove(&self, id: &BlobId) -> bool {
        self.blobs.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Number of copy operations performed
    pub fn copy_count(&self) -> usize {
        self.copies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn create(&self, content: Bytes, headers: BlobHeaders) -> ContentResult<Blob> {
        let blob = Blob {
            id: BlobId::new(),
            headers,
            metrics: BlobMetrics {
                content_size: content.len() as u64,
                creation_time: Utc::now(),
            },
            content,
        };
        self.blobs.write().insert(blob.id.clone(), blob.clone());
        Ok(blob)
    }

    async fn get(&self, id: &BlobId) -> ContentResult<Option<Blob>> {
        Ok(self.blobs.read().get(id).cloned())
    }

    async fn copy(&self, source: &BlobId, headers: BlobHeaders) -> ContentResult<Blob> {
        let mut blobs = self.blobs.write();
        let content = blobs
            .get(source)
            .map(|blob| blob.content.clone())
            .ok_or_else(|| not_found(format!("Blob not found: {}", source)))?;

        let blob = Blob {
            id: BlobId::new(),
            headers,
            metrics: BlobMetrics {
                content_size: content.len() as u64,
                creation_time: Utc::now(),
            },
            content,
        };
        blobs.insert(blob.id.clone(), blob.clone());
        self.copies.fetch_add(1, Ordering::SeqCst);
        Ok(blob)
    }
}

/// In-memory asset blob records, unique per [`BlobRef`]
#[derive(Clone, Default)]
pub struct MemoryAssetBlobStore {
    records: Arc<RwLock<BTreeMap<BlobRef, AssetBlob>>>,
}

impl MemoryAssetBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl AssetBlobStore for MemoryAssetBlobStore {
    async fn read(&self, blob_ref: &BlobRef) -> ContentResult<Option<AssetBlob>> {
        Ok(self.records.read().get(blob_ref).cloned())
    }

    async fn create(&self, asset_blob: AssetBlob) -> ContentResult<AssetBlob> {
        let mut records = self.records.write();
        if records.contains_key(&asset_blob.blob_ref) {
            return Err(ContentError::conflict(asset_blob.blob_ref));
        }
        records.insert(asset_blob.blob_ref.clone(), asset_blob.clone());
        Ok(asset_blob)
    }
}

/// In-memory asset rows keyed by repository and path
#[derive(Clone, Default)]
pub struct MemoryAssetStore {
    assets: Arc<RwLock<HashMap<AssetKey, Asset>>>,
    attribute_writes: Arc<AtomicUsize>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    /// Number of attribute updates persisted
    pub fn attribute_writes(&self) -> usize {
        self.attribute_writes.load(Ordering::SeqCst)
    }

    fn update<F>(&self, asset: &Asset, apply: F) -> ContentResult<()>
    where
        F: FnOnce(&mut Asset),
    {
        let mut assets = self.assets.write();
        let stored = assets
            .get_mut(&asset.key())
            .ok_or_else(|| not_found(format!("Asset not found: {}", asset.path)))?;
        apply(stored);
        Ok(())
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn create(&self, asset: Asset) -> ContentResult<Asset> {
        let mut assets = self.assets.write();
        let key = asset.key();
        if assets.contains_key(&key) {
            return Err(ContentError::backend(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("Asset already exists: {}/{}", key.0, key.1),
            )));
        }
        assets.insert(key, asset.clone());
        Ok(asset)
    }

    async fn read(&self, repository: &str, path: &str) -> ContentResult<Option<Asset>> {
        let key = (repository.to_string(), path.to_string());
        Ok(self.assets.read().get(&key).cloned())
    }

    async fn update_attributes(&self, asset: &Asset) -> ContentResult<()> {
        self.update(asset, |stored| {
            stored.attributes = asset.attributes.clone();
            stored.last_updated = asset.last_updated;
        })?;
        self.attribute_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_blob_link(&self, asset: &Asset) -> ContentResult<()> {
        self.update(asset, |stored| {
            stored.blob_ref = asset.blob_ref.clone();
            stored.last_updated = asset.last_updated;
        })
    }

    async fn mark_downloaded(&self, asset: &Asset) -> ContentResult<DateTime<Utc>> {
        let now = Utc::now();
        self.update(asset, |stored| stored.last_downloaded = Some(now))?;
        Ok(now)
    }

    async fn delete(&self, asset: &Asset) -> ContentResult<bool> {
        Ok(self.assets.write().remove(&asset.key()).is_some())
    }
}
