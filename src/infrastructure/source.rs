//! Taxonomy sources: a file-backed tree and a memoizing wrapper

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::{TaxonomyArena, TaxonomyDocument, TaxonomyNode};
use crate::infrastructure::traits::{FileSystem, TaxonomySource};
use crate::infrastructure::{InfraError, InfraResult};

/// Parse a taxonomy document; `.json` files are JSON, everything else TOML.
pub fn parse_document(path: &Path, content: &str) -> InfraResult<TaxonomyDocument> {
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let parsed = if is_json {
        serde_json::from_str(content).map_err(|e| e.to_string())
    } else {
        toml::from_str(content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| InfraError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Taxonomy held in memory, loaded from a TOML or JSON file.
#[derive(Debug)]
pub struct FileTaxonomySource {
    arena: TaxonomyArena,
    page_size: usize,
}

impl FileTaxonomySource {
    pub fn new(arena: TaxonomyArena, page_size: usize) -> Self {
        Self { arena, page_size }
    }

    /// Read and index the taxonomy file.
    #[instrument(skip(fs))]
    pub fn load(fs: &dyn FileSystem, path: &Path, page_size: usize) -> InfraResult<Self> {
        let content = fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read taxonomy {}", path.display()), e))?;
        let doc = parse_document(path, &content)?;
        let arena = TaxonomyArena::from_document(&doc)?;
        debug!("loaded {} subjects, depth {}", arena.len(), arena.depth());
        Ok(Self::new(arena, page_size))
    }

    pub fn arena(&self) -> &TaxonomyArena {
        &self.arena
    }
}

#[async_trait]
impl TaxonomySource for FileTaxonomySource {
    async fn fetch_children(
        &self,
        parent_id: Option<&str>,
        tier: usize,
    ) -> io::Result<Vec<TaxonomyNode>> {
        let children = match parent_id {
            None if tier == 0 => self.arena.roots(),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("missing parent for tier {}", tier),
                ))
            }
            Some(id) => {
                let entry = self.arena.find(id).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("unknown subject: {}", id))
                })?;
                if entry.tier != tier {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("subject {} is at tier {}, not {}", id, entry.tier, tier),
                    ));
                }
                self.arena
                    .children_of(id)
                    .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?
            }
        };

        Ok(children
            .into_iter()
            .take(self.page_size)
            .cloned()
            .collect())
    }
}

type CacheKey = (Option<String>, usize);

/// Memoizes successful child lists per parent so repeated clicks do not re-query.
pub struct CachingTaxonomySource {
    inner: Arc<dyn TaxonomySource>,
    cache: RwLock<HashMap<CacheKey, Vec<TaxonomyNode>>>,
}

impl CachingTaxonomySource {
    pub fn new(inner: Arc<dyn TaxonomySource>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl TaxonomySource for CachingTaxonomySource {
    async fn fetch_children(
        &self,
        parent_id: Option<&str>,
        tier: usize,
    ) -> io::Result<Vec<TaxonomyNode>> {
        let key = (parent_id.map(str::to_string), tier);
        if let Some(hit) = self.cache.read().await.get(&key) {
            debug!(?parent_id, tier, "children cache hit");
            return Ok(hit.clone());
        }

        let children = self.inner.fetch_children(parent_id, tier).await?;
        self.cache.write().await.insert(key, children.clone());
        Ok(children)
    }
}
