//! File-backed cache engine
//!
//! Stores opaque payloads under identifiers, one file per entry, with
//! per-entry expiry and tags. A cache can be frozen once its contents stop
//! changing, trading mutability for cheaper reads.
//!
//! # On-disk layout
//!
//! - `<root>/<identifier><suffix>`: one encoded entry (see [`codec`])
//! - `<root>/FrozenCache.data`: snapshot marker, present only while frozen
//!
//! # Modes
//!
//! | Mode | set/remove | get/has | Expiry | GC |
//! |------|------------|---------|--------|----|
//! | Mutable | allowed | read the entry file | checked | sweeps |
//! | Frozen | `Frozen` error | snapshot membership | ignored | no-op |
//!
//! The mode is re-derived from the marker file every time a backend is
//! opened. Two processes may briefly disagree while one of them freezes or
//! flushes.

pub mod clock;
pub mod codec;
pub mod freeze;
pub mod gc;
pub mod path;
pub mod store;
pub mod tags;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CacheEntry, EntryCodec, Expiry, SerializationFormat};
pub use freeze::FreezeState;
pub use gc::GcStats;
pub use path::{PathMapper, SNAPSHOT_FILE};
pub use store::{BackendOptions, FileBackend, PostWriteHook, DEFAULT_LIFETIME};
