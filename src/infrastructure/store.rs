//! JSON file persistence for the selected set

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::domain::SelectedSet;
use crate::infrastructure::traits::{FileSystem, SaveSink};
use crate::infrastructure::{InfraError, InfraResult};

/// Stores the selected set as a JSON array of paths.
pub struct JsonSelectionStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl JsonSelectionStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: PathBuf) -> Self {
        Self { fs, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved selection, or an empty set if nothing was saved yet.
    pub fn load(&self) -> InfraResult<SelectedSet> {
        if !self.fs.exists(&self.path) {
            debug!("no saved selection at {}", self.path.display());
            return Ok(SelectedSet::new());
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| InfraError::io(format!("read {}", self.path.display()), e))?;
        if content.trim().is_empty() {
            return Ok(SelectedSet::new());
        }
        serde_json::from_str(&content).map_err(|e| InfraError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

impl SaveSink for JsonSelectionStore {
    fn save(&self, selected: &SelectedSet) -> io::Result<()> {
        let json = serde_json::to_string_pretty(selected)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.fs.ensure_parent(&self.path)?;
        self.fs.write(&self.path, &format!("{json}\n"))?;
        debug!("saved {} paths to {}", selected.len(), self.path.display());
        Ok(())
    }
}
