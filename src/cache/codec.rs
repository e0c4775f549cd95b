//! Entry and snapshot encoding
//!
//! An entry file is a fixed 12-byte header followed by the tag section and
//! the raw payload:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 8 | expiry, Unix seconds, big-endian (`0` = never) |
//! | 8 | 4 | tag section length `n`, big-endian |
//! | 12 | n | tag list, encoded with the store's [`SerializationFormat`] |
//! | 12 + n | rest | payload bytes, untouched |
//!
//! The payload is never scanned; the header alone locates every section.

use crate::error::{CacheError, CacheResult, DecodeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

const EXPIRY_LEN: usize = 8;
const TAG_LEN_LEN: usize = 4;
const HEADER_LEN: usize = EXPIRY_LEN + TAG_LEN_LEN;

/// How tag lists and snapshots are serialized. Fixed per store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// JSON, readable with any text tool
    #[default]
    Text,
    /// MessagePack
    Binary,
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Binary => "binary",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for SerializationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "binary" => Ok(Self::Binary),
            other => Err(format!("unknown serialization format '{other}' (text, binary)")),
        }
    }
}

/// Absolute expiration instant of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// Unlimited lifetime, stored as `0`
    Never,
    /// Unix seconds at which the entry stops being served
    At(u64),
}

impl Expiry {
    /// Expiry for an entry written at `now` with `lifetime` seconds; `0` means unlimited.
    pub fn from_lifetime(now: i64, lifetime: u64) -> Self {
        if lifetime == 0 {
            Self::Never
        } else {
            Self::At((now.max(0) as u64).saturating_add(lifetime))
        }
    }

    fn from_raw(raw: u64) -> Self {
        if raw == 0 {
            Self::Never
        } else {
            Self::At(raw)
        }
    }

    fn to_raw(self) -> u64 {
        match self {
            Self::Never => 0,
            Self::At(at) => at,
        }
    }

    pub fn is_expired(self, now: i64) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => now >= 0 && now as u64 >= at,
        }
    }
}

/// A decoded cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub payload: Vec<u8>,
    pub tags: Vec<String>,
    pub expiry: Expiry,
}

impl CacheEntry {
    pub fn new(payload: impl Into<Vec<u8>>, tags: Vec<String>, expiry: Expiry) -> Self {
        Self {
            payload: payload.into(),
            tags,
            expiry,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expiry.is_expired(now)
    }

    /// Whether any of this entry's tags is in `wanted`
    pub fn has_any_tag(&self, wanted: &[String]) -> bool {
        self.tags.iter().any(|tag| wanted.contains(tag))
    }
}

/// Encodes entries and snapshots in one [`SerializationFormat`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryCodec {
    format: SerializationFormat,
}

impl EntryCodec {
    pub fn new(format: SerializationFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> SerializationFormat {
        self.format
    }

    /// Encode an entry into its on-disk blob
    pub fn encode(&self, entry: &CacheEntry) -> CacheResult<Vec<u8>> {
        let tags = self.serialize(&entry.tags)?;
        let tag_len = u32::try_from(tags.len())
            .map_err(|_| CacheError::Internal("tag section exceeds 4 GiB".to_string()))?;

        let mut blob = Vec::with_capacity(HEADER_LEN + tags.len() + entry.payload.len());
        blob.extend_from_slice(&entry.expiry.to_raw().to_be_bytes());
        blob.extend_from_slice(&tag_len.to_be_bytes());
        blob.extend_from_slice(&tags);
        blob.extend_from_slice(&entry.payload);
        Ok(blob)
    }

    /// Decode an entry blob. Either the whole entry comes back or an error does.
    pub fn decode(&self, blob: &[u8]) -> Result<CacheEntry, DecodeError> {
        if blob.len() < HEADER_LEN {
            return Err(DecodeError::Truncated(blob.len(), HEADER_LEN));
        }

        let mut expiry = [0u8; EXPIRY_LEN];
        expiry.copy_from_slice(&blob[..EXPIRY_LEN]);
        let mut tag_len = [0u8; TAG_LEN_LEN];
        tag_len.copy_from_slice(&blob[EXPIRY_LEN..HEADER_LEN]);

        let expiry = u64::from_be_bytes(expiry);
        let tag_len = u32::from_be_bytes(tag_len) as usize;
        let rest = &blob[HEADER_LEN..];

        if tag_len > rest.len() {
            return Err(DecodeError::TagSectionOverrun {
                declared: tag_len,
                available: rest.len(),
            });
        }

        let (tags, payload) = rest.split_at(tag_len);
        let tags: Vec<String> = self.deserialize(tags).map_err(DecodeError::Tags)?;

        Ok(CacheEntry {
            payload: payload.to_vec(),
            tags,
            expiry: Expiry::from_raw(expiry),
        })
    }

    /// Encode the identifier set captured by a freeze
    pub fn encode_snapshot(&self, identifiers: &BTreeSet<String>) -> CacheResult<Vec<u8>> {
        self.serialize(identifiers)
    }

    pub fn decode_snapshot(&self, blob: &[u8]) -> Result<BTreeSet<String>, DecodeError> {
        self.deserialize(blob).map_err(DecodeError::Snapshot)
    }

    fn serialize<T: Serialize>(&self, value: &T) -> CacheResult<Vec<u8>> {
        match self.format {
            SerializationFormat::Text => Ok(serde_json::to_vec(value)?),
            SerializationFormat::Binary => rmp_serde::to_vec(value)
                .map_err(|e| CacheError::Internal(format!("MessagePack encoding failed: {e}"))),
        }
    }

    fn deserialize<T: serde::de::DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, String> {
        match self.format {
            SerializationFormat::Text => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            SerializationFormat::Binary => rmp_serde::from_slice(bytes).map_err(|e| e.to_string()),
        }
    }
}
