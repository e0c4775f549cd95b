//! File-backed cache store
//!
//! One file per entry under the cache root. Writes take an exclusive lock on
//! the entry file; reads take a shared lock so a half-written file is never
//! observed. There is no lock spanning several files.

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::codec::{CacheEntry, EntryCodec, Expiry, SerializationFormat};
use crate::cache::freeze::FreezeState;
use crate::cache::path::{enforce_path_length, PathMapper};
use crate::error::{CacheError, CacheResult, WriteFailure};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default lifetime of an entry when `set` is given none (one hour)
pub const DEFAULT_LIFETIME: u64 = 3600;

/// Settings a backend is opened with
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Name used in error messages
    pub cache_name: String,
    /// Directory holding the entry files
    pub cache_root: PathBuf,
    /// Appended to every identifier to form its file name
    pub entry_suffix: String,
    /// Lifetime in seconds used when `set` gets `None`; `0` = unlimited
    pub default_lifetime: u64,
    pub format: SerializationFormat,
}

impl BackendOptions {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_name: "default".to_string(),
            cache_root: cache_root.into(),
            entry_suffix: String::new(),
            default_lifetime: DEFAULT_LIFETIME,
            format: SerializationFormat::default(),
        }
    }
}

/// Called with the entry path after every successful `set`
pub trait PostWriteHook: Send + Sync {
    fn after_write(&self, path: &Path);
}

impl<F> PostWriteHook for F
where
    F: Fn(&Path) + Send + Sync,
{
    fn after_write(&self, path: &Path) {
        self(path)
    }
}

/// The cache engine: expiry, tagging and freezing over one directory
pub struct FileBackend {
    pub(super) name: String,
    pub(super) paths: PathMapper,
    pub(super) codec: EntryCodec,
    pub(super) default_lifetime: u64,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) state: FreezeState,
    post_write: Option<Box<dyn PostWriteHook>>,
}

impl FileBackend {
    /// Open the cache at `options.cache_root`, creating the directory if needed.
    ///
    /// Frozen state is re-derived here from the snapshot marker on disk.
    pub fn open(options: BackendOptions) -> CacheResult<Self> {
        let root = options.cache_root;
        fs::create_dir_all(&root).map_err(|e| CacheError::CacheDirCreate {
            path: root.clone(),
            source: e,
        })?;
        if !root.is_dir() {
            return Err(CacheError::CacheDirInvalid(root));
        }

        let mut backend = Self {
            name: options.cache_name,
            paths: PathMapper::new(root, options.entry_suffix),
            codec: EntryCodec::new(options.format),
            default_lifetime: options.default_lifetime,
            clock: Arc::new(SystemClock),
            state: FreezeState::Mutable,
            post_write: None,
        };
        backend.state = backend.load_freeze_state();

        debug!(
            "Opened cache {} at {} (frozen: {})",
            backend.name,
            backend.paths.root().display(),
            backend.is_frozen()
        );
        Ok(backend)
    }

    /// Replace the time source used for expiry
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_post_write_hook(mut self, hook: impl PostWriteHook + 'static) -> Self {
        self.post_write = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    pub fn format(&self) -> SerializationFormat {
        self.codec.format()
    }

    /// Store `payload` under `identifier`, replacing any previous entry.
    ///
    /// `lifetime` of `None` uses the default lifetime; `Some(0)` never expires.
    pub fn set(
        &self,
        identifier: &str,
        payload: &[u8],
        tags: &[String],
        lifetime: Option<u64>,
    ) -> CacheResult<()> {
        self.paths.validate(identifier)?;
        self.ensure_mutable()?;

        let lifetime = lifetime.unwrap_or(self.default_lifetime);
        let expiry = Expiry::from_lifetime(self.clock.now(), lifetime);
        let entry = CacheEntry::new(payload.to_vec(), tags.to_vec(), expiry);
        let blob = self.codec.encode(&entry)?;

        let path = self.paths.entry_path(identifier);
        self.write_entry_file(&path, &blob)?;

        if let Some(hook) = &self.post_write {
            hook.after_write(&path);
        }
        debug!("Stored cache entry {} ({:?})", identifier, expiry);
        Ok(())
    }

    /// Payload stored under `identifier`, or `None` on a miss.
    ///
    /// While frozen, only identifiers captured by the freeze are served and
    /// expiry is not checked.
    pub fn get(&self, identifier: &str) -> CacheResult<Option<Vec<u8>>> {
        self.paths.validate(identifier)?;

        if let FreezeState::Frozen(identifiers) = &self.state {
            if !identifiers.contains(identifier) {
                return Ok(None);
            }
            let entry = self.read_entry(&self.paths.entry_path(identifier));
            return Ok(entry.map(|e| e.payload));
        }

        let now = self.clock.now();
        let entry = self
            .read_entry(&self.paths.entry_path(identifier))
            .filter(|e| !e.is_expired(now));
        Ok(entry.map(|e| e.payload))
    }

    /// Whether a live entry exists for `identifier`
    pub fn has(&self, identifier: &str) -> CacheResult<bool> {
        self.paths.validate(identifier)?;

        if let FreezeState::Frozen(identifiers) = &self.state {
            return Ok(identifiers.contains(identifier));
        }
        Ok(!self.is_entry_file_expired(&self.paths.entry_path(identifier)))
    }

    /// Delete the entry for `identifier`. Returns whether a file was removed.
    ///
    /// A bare `<identifier>` file left behind next to `<identifier><suffix>`
    /// is removed as well, after the suffixed one.
    pub fn remove(&self, identifier: &str) -> CacheResult<bool> {
        self.paths.validate(identifier)?;
        self.ensure_mutable()?;

        let mut removed = delete_file(&self.paths.entry_path(identifier));
        if !self.paths.suffix().is_empty() {
            let stray = self.paths.root().join(identifier);
            if stray.is_file() && delete_file(&stray) {
                debug!("Removed stray cache file {}", stray.display());
                removed = true;
            }
        }

        if removed {
            debug!("Removed cache entry {}", identifier);
        }
        Ok(removed)
    }

    /// Delete everything under the cache root and leave frozen mode.
    ///
    /// The frozen flag is cleared even when a deletion fails. Failure to
    /// delete the snapshot marker is ignored: another process may be racing
    /// us on it.
    pub fn flush(&mut self) -> CacheResult<()> {
        let result = self.empty_directory();

        let snapshot = self.paths.snapshot_path();
        if let Err(e) = fs::remove_file(&snapshot) {
            if e.kind() != ErrorKind::NotFound {
                debug!("Ignoring failure to delete {}: {}", snapshot.display(), e);
            }
        }

        self.state = FreezeState::Mutable;
        info!("Flushed cache {}", self.name);
        result
    }

    /// Every entry file under the root as `(identifier, path)`, in directory order.
    ///
    /// Directories, the snapshot marker and names without the entry suffix
    /// are skipped.
    pub fn enumerate(&self) -> CacheResult<Vec<(String, PathBuf)>> {
        let root = self.paths.root();
        let entries = fs::read_dir(root)
            .map_err(|e| CacheError::io(format!("reading cache directory {}", root.display()), e))?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::io("reading cache directory entry", e))?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                continue;
            }

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(identifier) = self.paths.identifier_from_filename(file_name) {
                found.push((identifier.to_string(), entry.path()));
            }
        }
        Ok(found)
    }

    pub(super) fn ensure_mutable(&self) -> CacheResult<()> {
        if self.is_frozen() {
            return Err(CacheError::Frozen {
                cache: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Decode the entry at `path` under a shared lock; absent or corrupt is `None`.
    pub(super) fn read_entry(&self, path: &Path) -> Option<CacheEntry> {
        let blob = match read_locked(path) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                return None;
            }
        };

        match self.codec.decode(&blob) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Treating {} as a miss: {}", path.display(), e);
                None
            }
        }
    }

    /// Missing, unreadable and corrupt files all count as expired
    pub(super) fn is_entry_file_expired(&self, path: &Path) -> bool {
        match self.read_entry(path) {
            Some(entry) => entry.is_expired(self.clock.now()),
            None => true,
        }
    }

    pub(super) fn write_entry_file(&self, path: &Path, blob: &[u8]) -> CacheResult<()> {
        write_locked(path, blob).map_err(|e| {
            let source = match enforce_path_length(path) {
                Err(too_long) => too_long,
                Ok(()) => WriteFailure::Io(e),
            };
            CacheError::WriteFailed {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    fn empty_directory(&self) -> CacheResult<()> {
        let root = self.paths.root();
        let entries = fs::read_dir(root)
            .map_err(|e| CacheError::io(format!("reading cache directory {}", root.display()), e))?;

        let snapshot = self.paths.snapshot_path();
        let mut first_error = None;
        for entry in entries.flatten() {
            let path = entry.path();
            // The marker is removed separately, ignoring failure
            if path == snapshot {
                continue;
            }
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let result = if is_dir {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };

            match result {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to delete {}: {}", path.display(), e);
                    first_error.get_or_insert(CacheError::io(
                        format!("deleting {}", path.display()),
                        e,
                    ));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Read a whole file under a shared lock. `Ok(None)` if it does not exist.
pub(super) fn read_locked(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    FileExt::lock_shared(&file)?;

    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    // Lock is released when the file is closed
    Ok(Some(contents))
}

/// Read a whole file without locking
pub(super) fn read_unlocked(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Replace a file's contents while holding an exclusive lock on it.
///
/// The file is truncated only after the lock is held.
pub(super) fn write_locked(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    FileExt::lock_exclusive(&file)?;

    file.set_len(0)?;
    file.write_all(contents)?;
    file.flush()
}

fn delete_file(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!("Failed to delete cache file {}: {}", path.display(), e);
            false
        }
    }
}
