use bytes::Bytes;
use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::ByteStream;

/// Typed side-channel values travelling with a [`Content`]
#[derive(Default)]
pub struct ContentAttributes {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ContentAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the previous one of the same type
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|previous| previous.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for ContentAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentAttributes")
            .field("len", &self.values.len())
            .finish()
    }
}

/// Blob bytes with their declared content type
#[derive(Debug, Clone)]
pub struct BlobPayload {
    pub bytes: Bytes,
    pub content_type: String,
}

impl BlobPayload {
    pub fn new<S: Into<String>>(bytes: Bytes, content_type: S) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Result of downloading an asset
#[derive(Debug)]
pub struct Content {
    payload: BlobPayload,
    attributes: ContentAttributes,
}

impl Content {
    pub fn new(payload: BlobPayload) -> Self {
        Self {
            payload,
            attributes: ContentAttributes::new(),
        }
    }

    pub fn payload(&self) -> &BlobPayload {
        &self.payload
    }

    pub fn content_type(&self) -> &str {
        &self.payload.content_type
    }

    pub fn size(&self) -> u64 {
        self.payload.size()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.payload.bytes
    }

    pub fn attributes(&self) -> &ContentAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut ContentAttributes {
        &mut self.attributes
    }

    /// Stream the payload in chunks of at most `chunk_size` bytes
    pub fn into_stream(self, chunk_size: usize) -> ByteStream {
        let bytes = self.payload.bytes;
        let chunk_size = chunk_size.max(1);
        let stream = async_stream::stream! {
            let mut offset = 0;
            while offset < bytes.len() {
                let end = (offset + chunk_size).min(bytes.len());
                yield Ok::<_, std::io::Error>(bytes.slice(offset..end));
                offset = end;
            }
        };
        Box::pin(stream)
    }
}
