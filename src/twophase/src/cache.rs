use crate::{
    canonical_fsm::CanonicalFSM,
    coord::MoveTables,
    pruning::{PruningTable, PruningTables, TableId},
    start, success,
};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, LazyLock, Mutex, OnceLock},
    time::Instant,
};
use thiserror::Error;

/// Version of the table file layout. Each table lives in
/// `<name>.v<FORMAT_VERSION>.prun`:
///
/// ```text
/// magic      4 bytes   b"2PHT"
/// version    u32 LE    FORMAT_VERSION
/// table id   u8        position in TableId::ALL
/// entries    u64 LE    TableId::entries
/// checksum   32 bytes  SHA-256 of the table name followed by the payload
/// payload    TableId::byte_len bytes of packed entries
/// ```
pub const FORMAT_VERSION: u32 = 1;
const MAGIC: &[u8; 4] = b"2PHT";
const HEADER_LEN: usize = 4 + 4 + 1 + 8 + 32;

#[derive(Error, Debug)]
pub enum CacheIoError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Rejected {path}: {reason}")]
    Invalid { path: PathBuf, reason: &'static str },
}

/// Where a table handed out by [`TableCache::get_or_build`] came from.
#[derive(Debug)]
pub enum TableOrigin {
    /// Loaded from a valid cache file.
    Cache,
    /// Built and written to the cache directory.
    Built,
    /// Built in memory only because the cache could not be written.
    BuiltUncached(CacheIoError),
}

/// Everything the search reads. Built once per [`TableCache`] and immutable
/// afterwards.
pub struct Tables {
    pub moves: MoveTables,
    pub pruning: PruningTables,
    pub fsm: CanonicalFSM,
}

pub struct TableCache {
    dir: PathBuf,
    tables: OnceLock<Tables>,
}

static SHARED: LazyLock<Mutex<HashMap<PathBuf, Arc<TableCache>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn checksum(id: TableId, payload: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(id.name().as_bytes());
    hasher.update(payload);
    hasher.finalize().into()
}

fn table_number(id: TableId) -> u8 {
    TableId::ALL
        .iter()
        .position(|&other| other == id)
        .and_then(|i| u8::try_from(i).ok())
        .unwrap_or(u8::MAX)
}

impl TableCache {
    /// A cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tables: OnceLock::new(),
        }
    }

    /// The cache for `dir` shared by the whole process, so tables are built at
    /// most once per directory.
    pub fn shared(dir: impl Into<PathBuf>) -> Arc<Self> {
        let dir = dir.into();
        // A poisoned registry still holds valid entries
        let mut shared = SHARED
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(
            shared
                .entry(dir.clone())
                .or_insert_with(|| Arc::new(Self::new(dir))),
        )
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path(&self, id: TableId) -> PathBuf {
        self.dir
            .join(format!("{}.v{FORMAT_VERSION}.prun", id.name()))
    }

    /// Reads and validates a cached table.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not hold a valid table `id`.
    pub fn load(&self, id: TableId) -> Result<PruningTable, CacheIoError> {
        let path = self.path(id);
        let bytes = fs::read(&path).map_err(|source| CacheIoError::Read {
            path: path.clone(),
            source,
        })?;
        let invalid = |reason| CacheIoError::Invalid {
            path: path.clone(),
            reason,
        };

        if bytes.len() != HEADER_LEN + id.byte_len() {
            return Err(invalid("wrong size"));
        }
        let (header, payload) = bytes.split_at(HEADER_LEN);
        if &header[0..4] != MAGIC {
            return Err(invalid("bad magic"));
        }
        if header[4..8] != FORMAT_VERSION.to_le_bytes() {
            return Err(invalid("format version mismatch"));
        }
        if header[8] != table_number(id) {
            return Err(invalid("table id mismatch"));
        }
        if header[9..17] != (id.entries() as u64).to_le_bytes() {
            return Err(invalid("entry count mismatch"));
        }
        if header[17..49] != checksum(id, payload) {
            return Err(invalid("checksum mismatch"));
        }

        PruningTable::from_bytes(id, payload.to_vec()).ok_or_else(|| invalid("wrong size"))
    }

    /// Atomically writes `table` into the cache directory.
    ///
    /// # Errors
    ///
    /// Fails if the directory or the file cannot be written.
    pub fn store(&self, table: &PruningTable) -> Result<(), CacheIoError> {
        let id = table.id();
        let path = self.path(id);
        let tmp_path = self
            .dir
            .join(format!(
                "{}.{}.{:016x}.tmp",
                id.name(),
                std::process::id(),
                fastrand::u64(..)
            ));
        let write_error = |source| CacheIoError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_error)?;

        let payload = table.as_bytes();
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        header.push(table_number(id));
        header.extend_from_slice(&(id.entries() as u64).to_le_bytes());
        header.extend_from_slice(&checksum(id, payload));

        let result = (|| {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&header)?;
            file.write_all(payload)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &path)
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result.map_err(write_error)
    }

    /// Loads table `id` from the cache, or builds it and tries to cache it.
    /// Cache failures are logged and never fatal.
    pub fn get_or_build(&self, id: TableId, moves: &MoveTables) -> (PruningTable, TableOrigin) {
        match self.load(id) {
            Ok(table) => {
                debug!("Loaded the {id} pruning table from {}", self.path(id).display());
                return (table, TableOrigin::Cache);
            }
            Err(CacheIoError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                debug!("No cached {id} pruning table in {}", self.dir.display());
            }
            Err(err) => warn!("{err}; rebuilding the {id} pruning table"),
        }

        let table = PruningTable::build(id, moves);
        match self.store(&table) {
            Ok(()) => (table, TableOrigin::Built),
            Err(err) => {
                warn!("{err}; keeping the {id} pruning table in memory only");
                (table, TableOrigin::BuiltUncached(err))
            }
        }
    }

    /// The tables for this cache directory, built or loaded on first use.
    pub fn tables(&self) -> &Tables {
        self.tables.get_or_init(|| {
            info!(start!("Preparing tables in {}"), self.dir.display());
            let start = Instant::now();
            let moves = MoveTables::new();
            let get = |id| self.get_or_build(id, &moves).0;
            let pruning = PruningTables {
                slice_flip: get(TableId::SliceFlip),
                slice_twist: get(TableId::SliceTwist),
                corner_parity: get(TableId::CornerParity),
                edge_parity: get(TableId::EdgeParity),
            };
            info!(
                success!("Tables ready in {:.3}s"),
                start.elapsed().as_secs_f64()
            );
            Tables {
                moves,
                pruning,
                fsm: CanonicalFSM::new(),
            }
        })
    }

    /// Whether [`TableCache::tables`] has already been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.tables.get().is_some()
    }
}
