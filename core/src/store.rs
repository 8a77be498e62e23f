use crate::config::{IndexConfig, StorageBackend};
use crate::error::StoreError;
use crate::posting::ListView;
use crate::{ClassLabel, DocId, PostingListId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies one persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Vocabulary,
    Meta,
    PostingList(PostingListId, ListView),
    Vector(DocId),
    Centroid(ClassLabel),
}

impl RecordKey {
    /// Location of the record relative to the storage root.
    pub fn relative_path(&self) -> String {
        match self {
            RecordKey::Vocabulary => "dictionary.json".to_string(),
            RecordKey::Meta => "meta.json".to_string(),
            RecordKey::PostingList(id, view) => format!("postings/{id:08}.{}", view.suffix()),
            RecordKey::Vector(doc_id) => format!("vectors/{doc_id}.vec"),
            RecordKey::Centroid(label) => format!("centroids/{label}.centroid"),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path())
    }
}

/// Key-value persistence for index records.
pub trait Store {
    /// `Ok(None)` when the record was never written.
    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError>;
    /// Replace the whole record.
    fn put(&self, key: &RecordKey, bytes: &[u8]) -> Result<(), StoreError>;
    /// Remove every index record.
    fn clear(&self) -> Result<(), StoreError>;
    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }
    fn put(&self, key: &RecordKey, bytes: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, bytes)
    }
    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
    fn flush(&self) -> Result<(), StoreError> {
        (**self).flush()
    }
}

/// Open the backend selected by the configuration.
pub fn open_store(config: &IndexConfig) -> Result<Box<dyn Store>, StoreError> {
    match config.storage_backend {
        StorageBackend::Files => Ok(Box::new(FileStore::new(&config.storage_root))),
        StorageBackend::Sled => Ok(Box::new(SledStore::open(&config.storage_root)?)),
    }
}

/// One file per record below a root directory.
pub struct FileStore {
    pub root: PathBuf,
}

impl FileStore {
    const RECORD_DIRS: [&'static str; 3] = ["postings", "vectors", "centroids"];
    const RECORD_FILES: [&'static str; 2] = ["dictionary.json", "meta.json"];

    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn path_of(&self, key: &RecordKey) -> PathBuf {
        self.root.join(key.relative_path())
    }
}

impl Store for FileStore {
    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        let mut f = match File::open(self.path_of(key)) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(key, e)),
        };
        let mut buf = Vec::new();
        f.read_to_end(&mut buf).map_err(|e| StoreError::io(key, e))?;
        Ok(Some(buf))
    }

    fn put(&self, key: &RecordKey, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_of(key);
        if let Some(dir) = path.parent() {
            match create_dir_all(dir) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(StoreError::io(key, e)),
            }
        }
        let mut f = File::create(&path).map_err(|e| StoreError::io(key, e))?;
        f.write_all(bytes).map_err(|e| StoreError::io(key, e))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        for dir in Self::RECORD_DIRS {
            let path = self.root.join(dir);
            match fs::remove_dir_all(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path.display(), e)),
            }
        }
        for file in Self::RECORD_FILES {
            let path = self.root.join(file);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io(path.display(), e)),
            }
        }
        tracing::debug!(root = %self.root.display(), "cleared file store");
        Ok(())
    }
}

/// All records in a single sled database, keyed by their relative path.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl Store for SledStore {
    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key.relative_path())?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &RecordKey, bytes: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key.relative_path(), bytes)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.db.clear()?;
        Ok(())
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Process-local store. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<RecordKey, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.records.read().contains_key(key)
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn put(&self, key: &RecordKey, bytes: &[u8]) -> Result<(), StoreError> {
        self.records.write().insert(key.clone(), bytes.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.records.write().clear();
        Ok(())
    }
}
