use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{BlobRef, ComponentId, NestedAttributes};

/// A named content item in a repository.
///
/// `(repository, path)` identifies an asset. The blob link is a key into
/// the asset blob records, which may be shared with other assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub repository: String,
    pub path: String,
    pub kind: String,
    pub component: Option<ComponentId>,
    pub blob_ref: Option<BlobRef>,
    pub attributes: NestedAttributes,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub last_downloaded: Option<DateTime<Utc>>,
}

impl Asset {
    pub fn new<R: Into<String>, P: Into<String>>(repository: R, path: P) -> Self {
        let now = Utc::now();
        Self {
            repository: repository.into(),
            path: path.into(),
            kind: String::new(),
            component: None,
            blob_ref: None,
            attributes: NestedAttributes::new(),
            created: now,
            last_updated: now,
            last_downloaded: None,
        }
    }

    pub fn with_kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_component(mut self, component: ComponentId) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_attributes(mut self, attributes: NestedAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Key identifying this asset within the asset store
    pub fn key(&self) -> (String, String) {
        (self.repository.clone(), self.path.clone())
    }
}

/// Metadata describing physical content: size, type, checksums and origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBlob {
    pub blob_ref: BlobRef,
    pub blob_size: u64,
    pub content_type: String,
    pub checksums: BTreeMap<String, String>,
    pub blob_created: DateTime<Utc>,
    pub created_by: Option<String>,
    pub created_by_ip: Option<String>,
}

impl AssetBlob {
    /// Checksum recorded for the named algorithm
    pub fn checksum(&self, algorithm: &str) -> Option<&str> {
        self.checksums.get(algorithm).map(String::as_str)
    }
}
