#![allow(dead_code)]

use pinner_core::types::{ContentHash, GcConfig, LedgerConfig};
use pinner_core::{OriginSource, PinSource, Pinner, PinnerError, SourceError, Unpinner};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

pub const GRACE: Duration = Duration::from_secs(30);

pub fn make_hash(s: &str) -> ContentHash {
    ContentHash::try_from(s).unwrap()
}

pub fn hashes_with_prefix(prefix: &str, count: usize) -> Vec<ContentHash> {
    (0..count)
        .map(|i| make_hash(&format!("{prefix}{i}")))
        .collect()
}

pub fn t0() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

pub fn open_pinner(dir: &TempDir, name: &str) -> Result<Pinner, PinnerError> {
    Pinner::open(
        LedgerConfig {
            ledger_path: dir.path().join(format!("{name}.redb")),
        },
        GcConfig {
            grace_period: GRACE,
        },
    )
}

/// Listings registry shared by every node, like a chain would be.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    listings: Arc<Mutex<HashSet<ContentHash>>>,
}

impl InMemoryRegistry {
    pub fn create_listings(&self, hashes: &[ContentHash]) {
        self.listings.lock().unwrap().extend(hashes.iter().cloned());
    }
}

impl OriginSource for InMemoryRegistry {
    fn list_origin_hashes(&self) -> Result<HashSet<ContentHash>, SourceError> {
        Ok(self.listings.lock().unwrap().clone())
    }
}

/// One storage node's pin set.
#[derive(Default)]
pub struct InMemoryNode {
    pins: Mutex<HashSet<ContentHash>>,
    refuse_unpin: Mutex<HashSet<ContentHash>>,
}

impl InMemoryNode {
    pub fn pin(&self, hashes: &[ContentHash]) {
        self.pins.lock().unwrap().extend(hashes.iter().cloned());
    }

    pub fn pins(&self) -> HashSet<ContentHash> {
        self.pins.lock().unwrap().clone()
    }

    pub fn refuse_unpin(&self, hash: &ContentHash, refuse: bool) {
        let mut refused = self.refuse_unpin.lock().unwrap();
        if refuse {
            refused.insert(hash.clone());
        } else {
            refused.remove(hash);
        }
    }
}

impl PinSource for InMemoryNode {
    fn list_pinned_hashes(&self) -> Result<HashSet<ContentHash>, SourceError> {
        Ok(self.pins())
    }
}

impl Unpinner for InMemoryNode {
    fn unpin(&self, hash: &ContentHash) -> Result<(), SourceError> {
        if self.refuse_unpin.lock().unwrap().contains(hash) {
            return Err(SourceError::Transport("connection reset".to_string()));
        }
        self.pins.lock().unwrap().remove(hash);
        Ok(())
    }
}

pub fn ledger_hashes(pinner: &Pinner) -> HashSet<ContentHash> {
    pinner.ledger().read_all().unwrap().into_keys().collect()
}
