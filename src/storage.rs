use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::StorageError;
use crate::schema::Row;

/// Durable home of the row collection: one JSON file holding the
/// serialized row array. The file plays the part of a single key in a
/// key-value store; writes replace the value wholesale.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Storage { path: path.into() }
    }

    /// Read the stored row collection. A missing file is an empty
    /// collection, not an error.
    pub fn load(&self) -> Result<Vec<Row>, StorageError> {
        if !self.path.exists() {
            debug!("No row store at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.display().to_string(),
            source,
        })?;
        let rows: Vec<Row> = serde_json::from_str(&raw).map_err(StorageError::Deserialize)?;
        info!("Loaded {} rows from {:?}", rows.len(), self.path);
        Ok(rows)
    }

    pub fn save(&self, rows: &[Row]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(rows).map_err(StorageError::Serialize)?;
        fs::write(&self.path, raw).map_err(|source| StorageError::Write {
            path: self.path.display().to_string(),
            source,
        })?;
        debug!("Persisted {} rows to {:?}", rows.len(), self.path);
        Ok(())
    }
}
