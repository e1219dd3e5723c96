use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::Pin;
use uuid::Uuid;

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Identifier assigned to a blob by the physical store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobId(pub String);

impl BlobId {
    /// Generate a new random blob ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key of a physical blob: which node, which store, which id.
///
/// Built from the id the store assigned after copying, so two uploads of
/// identical bytes usually end up with different references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlobRef {
    pub node: String,
    pub store: String,
    pub blob_id: BlobId,
}

impl BlobRef {
    pub fn new<N: Into<String>, S: Into<String>>(node: N, store: S, blob_id: BlobId) -> Self {
        Self {
            node: node.into(),
            store: store.into(),
            blob_id,
        }
    }

    /// Parse the `store@node:blob_id` form produced by `Display`
    pub fn parse(s: &str) -> Option<Self> {
        let (store, rest) = s.split_once('@')?;
        let (node, blob_id) = rest.split_once(':')?;
        if store.is_empty() || node.is_empty() || blob_id.is_empty() {
            return None;
        }
        Some(Self::new(node, store, BlobId::from_string(blob_id.to_string())))
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.store, self.node, self.blob_id)
    }
}

/// Identifier of the component an asset belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u64);

/// Hash algorithms recorded against asset blobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Name used as the key in stored checksum maps
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MD5" => Some(Self::Md5),
            "SHA1" => Some(Self::Sha1),
            "SHA256" => Some(Self::Sha256),
            "SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Hex digests keyed by the algorithm that produced them
pub type Checksums = BTreeMap<HashAlgorithm, String>;

/// Convert checksums into the stored `{algorithm-name: hex-digest}` shape
pub fn checksum_map(checksums: &Checksums) -> BTreeMap<String, String> {
    checksums
        .iter()
        .map(|(alg, digest)| (alg.name().to_string(), digest.to_ascii_lowercase()))
        .collect()
}
