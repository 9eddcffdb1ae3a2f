use std::fs;
use std::path::Path;

use vend_core::{export_json, import_json};

use crate::error::{Result, StoreError};
use crate::store::Store;

impl Store {
    /// Import a snapshot file, initialising this store from its contents.
    /// Refuses to overwrite an already-initialised sale.
    pub fn import_json_file(&self, path: &Path, now: u64) -> Result<()> {
        let json = fs::read_to_string(path).map_err(|e| {
            StoreError::InvalidData(format!("failed to read {}: {e}", path.display()))
        })?;
        self.import_json_str(&json, now)
    }

    /// Import a snapshot string into this store.
    pub fn import_json_str(&self, json: &str, now: u64) -> Result<()> {
        let engine = import_json(json)
            .map_err(|e| StoreError::InvalidData(format!("invalid snapshot: {e}")))?;
        self.init_from_parts(&engine, now)
    }

    /// Export the persisted engine to a snapshot file.
    pub fn export_json_file(&self, path: &Path, exported_at: u64) -> Result<()> {
        let json = self.export_json_string(exported_at)?;
        fs::write(path, json).map_err(|e| {
            StoreError::InvalidData(format!("failed to write {}: {e}", path.display()))
        })
    }

    /// Export the persisted engine as a snapshot string.
    pub fn export_json_string(&self, exported_at: u64) -> Result<String> {
        let engine = self.load_engine()?;
        export_json(&engine, exported_at)
            .map_err(|e| StoreError::InvalidData(format!("snapshot export failed: {e}")))
    }
}
