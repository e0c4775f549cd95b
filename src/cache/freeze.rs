//! Frozen mode
//!
//! Freezing records every identifier present into the snapshot marker and
//! switches the backend to a read-only mode where expiry is ignored and
//! existence checks never touch the directory. The only way back is
//! [`FileBackend::flush`].

use crate::cache::store::{read_locked, read_unlocked, FileBackend};
use crate::error::{CacheError, CacheResult};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Mutable or frozen, with the identifiers captured by the freeze
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeState {
    Mutable,
    Frozen(BTreeSet<String>),
}

impl FileBackend {
    /// Capture the current entries and reject mutation until the next flush.
    ///
    /// Entries are rewritten as they are, expired or not. The backend only
    /// becomes frozen once the snapshot marker is written.
    pub fn freeze(&mut self) -> CacheResult<()> {
        if self.is_frozen() {
            return Err(CacheError::AlreadyFrozen {
                cache: self.name.clone(),
            });
        }

        let mut identifiers = BTreeSet::new();
        for (identifier, path) in self.enumerate()? {
            // No lock here: freezing assumes nobody else is writing
            let blob = read_unlocked(&path)
                .map_err(|e| CacheError::io(format!("reading {}", path.display()), e))?;

            match blob.map(|b| self.codec.decode(&b)) {
                Some(Ok(entry)) => {
                    let normalized = self.codec.encode(&entry)?;
                    self.write_entry_file(&path, &normalized)?;
                }
                Some(Err(e)) => {
                    warn!("Freezing undecodable cache entry {} as-is: {}", identifier, e)
                }
                None => {}
            }
            identifiers.insert(identifier);
        }

        let snapshot = self.codec.encode_snapshot(&identifiers)?;
        self.write_entry_file(&self.paths.snapshot_path(), &snapshot)?;

        info!("Froze cache {} with {} entries", self.name, identifiers.len());
        self.state = FreezeState::Frozen(identifiers);
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.state, FreezeState::Frozen(_))
    }

    /// Identifiers captured by the freeze, if frozen
    pub fn frozen_identifiers(&self) -> Option<&BTreeSet<String>> {
        match &self.state {
            FreezeState::Frozen(identifiers) => Some(identifiers),
            FreezeState::Mutable => None,
        }
    }

    /// Derive frozen state from the snapshot marker on disk.
    ///
    /// An unreadable marker still means frozen, with nothing to serve.
    pub(super) fn load_freeze_state(&self) -> FreezeState {
        let path = self.paths.snapshot_path();
        if !path.is_file() {
            return FreezeState::Mutable;
        }

        let identifiers = match read_locked(&path) {
            Ok(Some(blob)) => self.codec.decode_snapshot(&blob).unwrap_or_else(|e| {
                warn!("Frozen snapshot {} is corrupt: {}", path.display(), e);
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Failed to read frozen snapshot {}: {}", path.display(), e);
                BTreeSet::new()
            }
        };

        debug!("Cache {} is frozen with {} entries", self.name, identifiers.len());
        FreezeState::Frozen(identifiers)
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::clock::ManualClock;
    use crate::cache::codec::{CacheEntry, EntryCodec, Expiry, SerializationFormat};
    use crate::cache::path::SNAPSHOT_FILE;
    use crate::cache::store::{BackendOptions, FileBackend};
    use crate::error::CacheError;
    use std::fs;
    use tempfile::TempDir;

    const T0: i64 = 1_700_000_000;

    fn open(temp: &TempDir, clock: &ManualClock) -> FileBackend {
        FileBackend::open(BackendOptions::new(temp.path()))
            .unwrap()
            .with_clock(clock.clone())
    }

    #[test]
    fn freeze_writes_snapshot_and_flips_state() {
        let temp = TempDir::new().unwrap();
        let clock = ManualClock::new(T0);
        let mut backend = open(&temp, &clock);
        backend.set("a", b"1", &[], None).unwrap();
        backend.set("b", b"2", &[], None).unwrap();

        backend.freeze().unwrap();

        assert!(backend.is_frozen());
        assert_eq!(
            fs::read(temp.path().join(SNAPSHOT_FILE)).unwrap(),
            b"[\"a\",\"b\"]"
        );
        assert_eq!(backend.frozen_identifiers().unwrap().len(), 2);
    }

    #[test]
    fn freeze_twice_fails() {
        let temp = TempDir::new().unwrap();
        let mut backend = open(&temp, &ManualClock::new(T0));
        backend.freeze().unwrap();
        assert!(matches!(
            backend.freeze(),
            Err(CacheError::AlreadyFrozen { .. })
        ));
    }

    #[test]
    fn failed_marker_write_stays_mutable() {
        let temp = TempDir::new().unwrap();
        let mut backend = open(&temp, &ManualClock::new(T0));
        backend.set("a", b"1", &[], None).unwrap();
        fs::create_dir(temp.path().join(SNAPSHOT_FILE)).unwrap();

        assert!(matches!(
            backend.freeze(),
            Err(CacheError::WriteFailed { .. })
        ));
        assert!(!backend.is_frozen());
        backend.set("b", b"2", &[], None).unwrap();
        assert!(!open(&temp, &ManualClock::new(T0)).is_frozen());
    }

    #[test]
    fn frozen_rejects_mutation() {
        let temp = TempDir::new().unwrap();
        let mut backend = open(&temp, &ManualClock::new(T0));
        backend.set("a", b"1", &[], None).unwrap();
        backend.freeze().unwrap();

        assert!(matches!(
            backend.set("a", b"2", &[], None),
            Err(CacheError::Frozen { .. })
        ));
        assert!(matches!(
            backend.set("new", b"2", &[], None),
            Err(CacheError::Frozen { .. })
        ));
        assert!(matches!(backend.remove("a"), Err(CacheError::Frozen { .. })));
        assert!(matches!(backend.remove("zzz"), Err(CacheError::Frozen { .. })));
    }

    #[test]
    fn frozen_reads_ignore_expiry() {
        let temp = TempDir::new().unwrap();
        let clock = ManualClock::new(T0);
        let mut backend = open(&temp, &clock);
        backend.set("a", b"payload", &[], Some(10)).unwrap();
        backend.freeze().unwrap();

        clock.advance(1_000);
        assert!(backend.has("a").unwrap());
        assert_eq!(backend.get("a").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn frozen_ignores_out_of_band_files() {
        let temp = TempDir::new().unwrap();
        let clock = ManualClock::new(T0);
        let mut backend = open(&temp, &clock);
        backend.freeze().unwrap();

        // A valid entry file placed after the freeze is invisible
        let blob = EntryCodec::default()
            .encode(&CacheEntry::new(b"x".to_vec(), Vec::new(), Expiry::Never))
            .unwrap();
        fs::write(temp.path().join("late"), blob).unwrap();

        assert!(!backend.has("late").unwrap());
        assert_eq!(backend.get("late").unwrap(), None);
    }

    #[test]
    fn frozen_still_validates_identifiers() {
        let temp = TempDir::new().unwrap();
        let mut backend = open(&temp, &ManualClock::new(T0));
        backend.freeze().unwrap();
        assert!(matches!(
            backend.has("a/b"),
            Err(CacheError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            backend.get(""),
            Err(CacheError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn frozen_state_rederived_on_open() {
        let temp = TempDir::new().unwrap();
        let clock = ManualClock::new(T0);
        let mut backend = open(&temp, &clock);
        backend.set("a", b"1", &[], Some(5)).unwrap();
        backend.freeze().unwrap();
        drop(backend);

        clock.advance(60);
        let reopened = open(&temp, &clock);
        assert!(reopened.is_frozen());
        assert!(reopened.has("a").unwrap());
        assert!(!reopened.has("b").unwrap());
    }

    #[test]
    fn corrupt_snapshot_means_frozen_and_empty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), b"whatever").unwrap();
        fs::write(temp.path().join(SNAPSHOT_FILE), b"{broken").unwrap();

        let backend = open(&temp, &ManualClock::new(T0));
        assert!(backend.is_frozen());
        assert!(!backend.has("a").unwrap());
    }

    #[test]
    fn flush_thaws() {
        let temp = TempDir::new().unwrap();
        let mut backend = open(&temp, &ManualClock::new(T0));
        backend.set("a", b"1", &[], None).unwrap();
        backend.freeze().unwrap();

        backend.flush().unwrap();

        assert!(!backend.is_frozen());
        assert!(!temp.path().join(SNAPSHOT_FILE).exists());
        assert!(!backend.has("a").unwrap());
        backend.set("b", b"2", &[], None).unwrap();
    }

    #[test]
    fn freeze_keeps_undecodable_entries_listed() {
        let temp = TempDir::new().unwrap();
        let mut backend = open(&temp, &ManualClock::new(T0));
        fs::write(temp.path().join("broken"), b"xx").unwrap();

        backend.freeze().unwrap();

        assert!(backend.has("broken").unwrap());
        assert_eq!(backend.get("broken").unwrap(), None);
        assert_eq!(fs::read(temp.path().join("broken")).unwrap(), b"xx");
    }

    #[test]
    fn binary_snapshot_round_trips_through_reopen() {
        let temp = TempDir::new().unwrap();
        let mut options = BackendOptions::new(temp.path());
        options.format = SerializationFormat::Binary;
        let mut backend = FileBackend::open(options.clone()).unwrap();
        backend.set("a", b"1", &["t".to_string()], None).unwrap();
        backend.freeze().unwrap();

        let reopened = FileBackend::open(options).unwrap();
        assert!(reopened.has("a").unwrap());
        assert_eq!(reopened.get("a").unwrap(), Some(b"1".to_vec()));
    }
}
