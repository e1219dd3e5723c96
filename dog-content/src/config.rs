/// Configuration for content operations of one repository
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Name of the repository owning the assets
    pub repository: String,

    /// Identity of this node, recorded in every blob reference
    pub node_name: String,

    /// Name of the physical blob store backing the repository
    pub blob_store_name: String,

    /// Chunk size used when streaming downloaded content
    pub chunk_size: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            repository: "default".to_string(),
            node_name: "local".to_string(),
            blob_store_name: "default".to_string(),
            chunk_size: 64 * 1024, // 64KB
        }
    }
}

impl ContentConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `DOG_CONTENT_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(repository) = std::env::var("DOG_CONTENT_REPOSITORY") {
            config.repository = repository;
        }
        if let Ok(node_name) = std::env::var("DOG_CONTENT_NODE_NAME") {
            config.node_name = node_name;
        }
        if let Ok(store) = std::env::var("DOG_CONTENT_BLOB_STORE") {
            config.blob_store_name = store;
        }
        if let Some(chunk_size) = std::env::var("DOG_CONTENT_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|size| *size > 0)
        {
            config.chunk_size = chunk_size;
        }
        config
    }

    pub fn with_repository<S: Into<String>>(mut self, repository: S) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn with_node_name<S: Into<String>>(mut self, node_name: S) -> Self {
        self.node_name = node_name.into();
        self
    }

    pub fn with_blob_store_name<S: Into<String>>(mut self, name: S) -> Self {
        self.blob_store_name = name.into();
        self
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }
}
