use async_trait::async_trait;

use crate::{Asset, Blob, ContentError, ContentResult, CONTENT_TYPE_HEADER};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Checks a repository applies before content changes
#[async_trait]
pub trait ContentPolicy: Send + Sync {
    async fn check_attach_allowed(&self, asset: &Asset) -> ContentResult<()>;

    async fn check_delete_allowed(&self, asset: &Asset) -> ContentResult<()>;

    /// Resolve the content type to store for `blob` attached to `asset`
    async fn check_content_type(&self, asset: &Asset, blob: &Blob) -> ContentResult<String>;
}

/// Allows every attach and delete.
///
/// The content type comes from the blob's header. With `strict` set, a blob
/// without one is rejected; otherwise it falls back to
/// `application/octet-stream`.
#[derive(Debug, Clone, Default)]
pub struct DefaultContentPolicy {
    pub strict: bool,
}

impl DefaultContentPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }
}

#[async_trait]
impl ContentPolicy for DefaultContentPolicy {
    async fn check_attach_allowed(&self, _asset: &Asset) -> ContentResult<()> {
        Ok(())
    }

    async fn check_delete_allowed(&self, _asset: &Asset) -> ContentResult<()> {
        Ok(())
    }

    async fn check_content_type(&self, asset: &Asset, blob: &Blob) -> ContentResult<String> {
        match blob.header(CONTENT_TYPE_HEADER) {
            Some(content_type) => Ok(content_type.to_string()),
            None if self.strict => Err(ContentError::precondition(format!(
                "No content type for {}",
                asset.path
            ))),
            None => Ok(DEFAULT_CONTENT_TYPE.to_string()),
        }
    }
}
