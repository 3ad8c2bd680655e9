use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::database::{Database, DatabaseImage};
use crate::error::Result;

/// Saves and restores a whole [Database] as one bincode file.
///
/// Saves are exclusive; loads may run concurrently with each other but never
/// with a save through the same snapshotter. Failures are returned to the
/// caller as is and never retried.
pub struct Snapshotter {
    path: PathBuf,
    lock: RwLock<()>,
}

impl Snapshotter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes every table of `database` to the snapshot file, replacing it.
    pub fn save(&self, database: &Database) -> Result<()> {
        let _guard = self.lock.write();
        let image = database.image();

        let result = self.write_image(&image);
        match &result {
            Ok(()) => info!(
                path = %self.path.display(),
                tables = image.tables.len(),
                "saved snapshot"
            ),
            Err(err) => warn!(path = %self.path.display(), %err, "snapshot save failed"),
        }
        result
    }

    fn write_image(&self, image: &DatabaseImage) -> Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        bincode::serialize_into(&mut writer, image)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads the snapshot file back into a new [Database].
    pub fn load(&self) -> Result<Database> {
        let _guard = self.lock.read();

        let result = self.read_image().and_then(Database::from_image);
        match &result {
            Ok(database) => info!(
                path = %self.path.display(),
                tables = database.table_names().len(),
                "loaded snapshot"
            ),
            Err(err) => warn!(path = %self.path.display(), %err, "snapshot load failed"),
        }
        result
    }

    fn read_image(&self) -> Result<DatabaseImage> {
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(bincode::deserialize_from(reader)?)
    }
}
