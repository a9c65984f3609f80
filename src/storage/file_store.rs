use std::fs;
use std::path::{Path, PathBuf};

use super::SlotStore;
use crate::error::{PermanoteError, Result};

pub const PERMANOTE_DIR: &str = ".permanote";

/// Slot store backed by one `<key>.json` file per slot inside `.permanote/`
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Initialize a new permanote project
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(PERMANOTE_DIR);

        if dir.exists() {
            return Err(PermanoteError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open an existing permanote project
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(PERMANOTE_DIR);

        if !dir.is_dir() {
            return Err(PermanoteError::NotInitialized);
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SlotStore for FileSlotStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::write(self.slot_path(key), value)?;
        Ok(())
    }
}
