use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::{Asset, AssetBlob, BlobId, BlobRef, Checksums, ContentResult};

pub const REPO_NAME_HEADER: &str = "Bucket.repo-name";
pub const BLOB_NAME_HEADER: &str = "BlobStore.blob-name";
pub const CREATED_BY_HEADER: &str = "BlobStore.created-by";
pub const CREATED_BY_IP_HEADER: &str = "BlobStore.created-by-ip";
pub const CONTENT_TYPE_HEADER: &str = "BlobStore.content-type";

/// Headers stored alongside physical blob content
pub type BlobHeaders = BTreeMap<String, String>;

/// Physical blob as returned by a [`BlobStore`]
#[derive(Debug, Clone)]
pub struct Blob {
    pub id: BlobId,
    pub headers: BlobHeaders,
    pub metrics: BlobMetrics,
    pub content: Bytes,
}

impl Blob {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Size and creation time of a physical blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetrics {
    pub content_size: u64,
    pub creation_time: DateTime<Utc>,
}

/// Uploaded content not yet attached to an asset, with its computed hashes
#[derive(Debug, Clone)]
pub struct TempBlob {
    pub blob: Blob,
    pub hashes: Checksums,
}

impl TempBlob {
    pub fn new(blob: Blob, hashes: Checksums) -> Self {
        Self { blob, hashes }
    }
}

/// Physical byte storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store new content under freshly assigned id
    async fn create(&self, content: Bytes, headers: BlobHeaders) -> ContentResult<Blob>;

    /// Fetch a blob; `None` when the store has no such id
    async fn get(&self, id: &BlobId) -> ContentResult<Option<Blob>>;

    /// Copy a blob's bytes under new headers, assigning a new id
    async fn copy(&self, source: &BlobId, headers: BlobHeaders) -> ContentResult<Blob>;
}

/// Persistence of asset blob metadata records, keyed by [`BlobRef`]
#[async_trait]
pub trait AssetBlobStore: Send + Sync {
    async fn read(&self, blob_ref: &BlobRef) -> ContentResult<Option<AssetBlob>>;

    /// Persist a new record.
    ///
    /// Must fail with [`crate::ContentError::Conflict`] when a record with the
    /// same reference already exists.
    async fn create(&self, asset_blob: AssetBlob) -> ContentResult<AssetBlob>;
}

/// Persistence of asset rows
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn create(&self, asset: Asset) -> ContentResult<Asset>;

    async fn read(&self, repository: &str, path: &str) -> ContentResult<Option<Asset>>;

    async fn update_attributes(&self, asset: &Asset) -> ContentResult<()>;

    async fn update_blob_link(&self, asset: &Asset) -> ContentResult<()>;

    /// Record a download, returning the time stored
    async fn mark_downloaded(&self, asset: &Asset) -> ContentResult<DateTime<Utc>>;

    /// Remove the asset row, returning whether one was removed
    async fn delete(&self, asset: &Asset) -> ContentResult<bool>;
}
