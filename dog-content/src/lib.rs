//! # dog-content: asset content management for DogRS repositories
//!
//! `dog-content` links the named assets of a repository to the physical
//! blobs holding their bytes. It promotes uploads into permanent storage,
//! keeps one metadata record per blob reference, serves downloads and
//! tracks cache freshness in the asset's attributes.
//!
//! ## Key Features
//!
//! - **Metadata dedup**: re-attaching an already known blob reference reuses its record
//! - **Checksum bookkeeping**: hex digests stored per algorithm name
//! - **Cache freshness**: cache info lives under the reserved `cache` attribute
//! - **Storage agnostic**: stores and policies are traits, with in-memory backends included
//!
//! ## Quick Start
//!
//! ```rust
//! use dog_content::prelude::*;
//! use dog_content::backend::memory::{MemoryAssetBlobStore, MemoryAssetStore, MemoryBlobStore};
//! use dog_content::{BlobHeaders, HashAlgorithm, TempBlob, CONTENT_TYPE_HEADER};
//!
//! # #[tokio::main]
//! # async fn main() -> ContentResult<()> {
//! let blobs = MemoryBlobStore::new();
//! let config = ContentConfig::new().with_repository("maven-releases");
//! let adapter = ContentAdapter::new(
//!     blobs.clone(),
//!     MemoryAssetBlobStore::new(),
//!     MemoryAssetStore::new(),
//!     config,
//! );
//!
//! // Upload lands in the blob store as temporary content
//! let mut headers = BlobHeaders::new();
//! headers.insert(CONTENT_TYPE_HEADER.to_string(), "application/java-archive".to_string());
//! let upload = blobs.create(bytes::Bytes::from_static(b"PK..."), headers).await?;
//! let mut hashes = Checksums::new();
//! hashes.insert(HashAlgorithm::Sha1, "deadbeef".to_string());
//!
//! let mut asset = adapter.create_asset("lib/foo-1.0.jar", "jar").await?;
//! asset.attach_temp(TempBlob::new(upload, hashes)).await?;
//!
//! let content = asset.download().await?;
//! assert_eq!(content.content_type(), "application/java-archive");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   FluentAsset   │  ← attach / download / cache / delete for one asset
//! ├─────────────────┤
//! │ ContentAdapter  │  ← stores, policy and config of one repository
//! ├─────────────────┤
//! │ BlobStore       │  ← physical bytes
//! │ AssetBlobStore  │  ← blob metadata, unique per BlobRef
//! │ AssetStore      │  ← asset rows
//! └─────────────────┘
//! ```
//!
//! Nothing here locks. Stores provide per-row atomicity, and
//! [`AssetBlobStore::create`] must report a duplicate reference as
//! [`ContentError::Conflict`] so concurrent attaches of the same blob settle
//! on a single record.

pub mod adapter;
mod asset;
mod attributes;
pub mod backend;
mod cache;
mod config;
mod content;
mod error;
mod policy;
pub mod store;
mod types;

// Re-export main types for clean API
pub use adapter::{ContentAdapter, FluentAsset};
pub use asset::{Asset, AssetBlob};
pub use attributes::{AttributeChange, NestedAttributes};
pub use cache::{CacheController, CacheInfo, Invalidation, TtlCacheController, CACHE, CACHE_TOKEN, INVALIDATION};
pub use config::ContentConfig;
pub use content::{BlobPayload, Content, ContentAttributes};
pub use error::{ContentError, ContentResult};
pub use policy::{ContentPolicy, DefaultContentPolicy, DEFAULT_CONTENT_TYPE};
pub use store::{
    AssetBlobStore, AssetStore, Blob, BlobHeaders, BlobMetrics, BlobStore, TempBlob,
    BLOB_NAME_HEADER, CONTENT_TYPE_HEADER, CREATED_BY_HEADER, CREATED_BY_IP_HEADER, REPO_NAME_HEADER,
};
pub use types::{checksum_map, BlobId, BlobRef, ByteStream, Checksums, ComponentId, HashAlgorithm};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Asset, AssetBlob, AttributeChange, BlobStore, CacheInfo, Checksums, Content,
        ContentAdapter, ContentConfig, ContentError, ContentResult, FluentAsset,
    };
}
