pub mod chirps;
pub mod error;
pub mod models;
pub mod moderation;
pub mod tokens;
pub mod users;

pub use chirps::SortOrder;
pub use error::{DbError, Result};
pub use models::{Chirp, RefreshToken, Snapshot, User};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Identifier counters owned by the store.
///
/// Guarded by the same lock as the file, so an id is handed out exactly once
/// per committed write and never reused after a deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    last_chirp_id: u64,
    last_user_id: u64,
}

impl Counters {
    fn observe(&mut self, snapshot: &Snapshot) {
        self.last_chirp_id = self.last_chirp_id.max(snapshot.max_chirp_id());
        self.last_user_id = self.last_user_id.max(snapshot.max_user_id());
    }

    pub fn next_chirp_id(&mut self) -> u64 {
        self.last_chirp_id += 1;
        self.last_chirp_id
    }

    pub fn next_user_id(&mut self) -> u64 {
        self.last_user_id += 1;
        self.last_user_id
    }
}

/// Flat JSON file database.
///
/// Reads take the shared lock only while the file is read. Writes go through
/// [`Database::with_snapshot_mut`], which holds the exclusive lock across the
/// whole load, mutate, persist sequence.
pub struct Database {
    path: PathBuf,
    lock: RwLock<Counters>,
}

impl Database {
    /// Open the database file, creating an empty one if it does not exist.
    pub fn open(path: &Path) -> Result<Self> {
        fs::OpenOptions::new().create(true).append(true).open(path)?;

        let snapshot = read_snapshot(path)?;
        let mut counters = Counters::default();
        counters.observe(&snapshot);

        info!(
            "Database opened at {} ({} chirps, {} users, {} tokens)",
            path.display(),
            snapshot.chirps.len(),
            snapshot.users.len(),
            snapshot.tokens.len()
        );
        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(counters),
        })
    }

    /// Truncate the database file and open it empty.
    pub fn create(path: &Path) -> Result<Self> {
        fs::File::create(path)?;
        info!("Database reset at {}", path.display());
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current on-disk snapshot.
    pub fn load(&self) -> Result<Snapshot> {
        let data = {
            let _guard = self.lock.read().map_err(|_| DbError::LockPoisoned)?;
            fs::read(&self.path)?
        };
        Ok(Snapshot::decode(&data)?)
    }

    /// Overwrite the file with `snapshot`. Counters never move backwards.
    pub fn replace(&self, snapshot: &Snapshot) -> Result<()> {
        let mut counters = self.lock.write().map_err(|_| DbError::LockPoisoned)?;
        write_snapshot(&self.path, snapshot)?;
        counters.observe(snapshot);
        Ok(())
    }

    pub fn with_snapshot<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Snapshot) -> Result<T>,
    {
        let snapshot = self.load()?;
        f(&snapshot)
    }

    /// Run one read-modify-write under the exclusive lock.
    ///
    /// Nothing is written and the counters are left untouched when `f` fails.
    pub fn with_snapshot_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot, &mut Counters) -> Result<T>,
    {
        self.with_snapshot_mut_if_changed(|snapshot, counters| {
            f(snapshot, counters).map(|out| (out, true))
        })
    }

    /// Like [`Database::with_snapshot_mut`], but `f` also reports whether it
    /// changed anything. The file is left untouched when it did not.
    pub fn with_snapshot_mut_if_changed<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Snapshot, &mut Counters) -> Result<(T, bool)>,
    {
        let mut counters = self.lock.write().map_err(|_| DbError::LockPoisoned)?;
        let mut snapshot = read_snapshot(&self.path)?;

        let mut next = *counters;
        let (out, changed) = f(&mut snapshot, &mut next)?;

        if changed {
            write_snapshot(&self.path, &snapshot)?;
            *counters = next;
        }
        Ok(out)
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let data = fs::read(path)?;
    Ok(Snapshot::decode(&data)?)
}

fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let bytes = snapshot.encode()?;
    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, &bytes)?;
    fs::rename(&temp_path, path)?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_db;

    #[test]
    fn open_creates_empty_file() {
        let (dir, db) = temp_db();
        let path = dir.path().join("database.json");
        assert!(path.exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(db.load().unwrap(), Snapshot::default());
    }

    #[test]
    fn replace_then_load() {
        let (_dir, db) = temp_db();
        let mut snapshot = Snapshot::default();
        snapshot.chirps.insert(3, Chirp { id: 3, body: "x".into(), author_id: Some(1) });
        db.replace(&snapshot).unwrap();
        assert_eq!(db.load().unwrap(), snapshot);
    }

    #[test]
    fn failed_mutation_writes_nothing() {
        let (_dir, db) = temp_db();
        let result: Result<()> = db.with_snapshot_mut(|snapshot, counters| {
            let id = counters.next_chirp_id();
            snapshot.chirps.insert(id, Chirp { id, body: "x".into(), author_id: None });
            Err(DbError::ChirpNotFound(id))
        });
        assert!(result.is_err());
        assert!(db.load().unwrap().chirps.is_empty());

        let id = db.with_snapshot_mut(|_, counters| Ok(counters.next_chirp_id())).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn reopen_resumes_from_max_existing_id() {
        let (dir, db) = temp_db();
        db.create_chirp("one", 1).unwrap();
        db.create_chirp("two", 1).unwrap();
        db.delete_chirp(2, 1).unwrap();
        drop(db);

        let db = Database::open(&dir.path().join("database.json")).unwrap();
        assert_eq!(db.create_chirp("three", 1).unwrap().id, 2);
    }

    #[test]
    fn create_truncates() {
        let (dir, db) = temp_db();
        db.create_chirp("one", 1).unwrap();
        drop(db);

        let db = Database::create(&dir.path().join("database.json")).unwrap();
        assert!(db.load().unwrap().chirps.is_empty());
        assert_eq!(db.create_chirp("fresh", 1).unwrap().id, 1);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let (_dir, db) = temp_db();
        fs::write(db.path(), b"not json").unwrap();
        let err = db.load().unwrap_err();
        assert_eq!(err.kind(), chirpy_types::error::ErrorKind::Storage);
        assert!(db.create_chirp("hello", 1).is_err());
    }
}
