pub mod memory;

pub use memory::{MemoryAssetBlobStore, MemoryAssetStore, MemoryBlobStore};
