//! The promote / admit / evict decision.
//!
//! Pure: takes the three observed sets and a clock reading, returns what has
//! to change. Applying the plan is [`Pinner::run`](crate::core::Pinner::run)'s job.

use crate::types::{ContentHash, GcConfig};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, SystemTime};

/// Actions for one reconciliation run. The four sets are pairwise disjoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Ledger hashes now referenced by a listing. Leave pinned, forget.
    pub to_promote: BTreeSet<ContentHash>,
    /// Pinned, non-origin, untracked hashes. Start a grace window at `now`.
    pub to_admit: BTreeSet<ContentHash>,
    /// Tracked, still pinned, non-origin hashes past their grace window.
    pub to_evict: BTreeSet<ContentHash>,
    /// Tracked hashes that are no longer pinned. Forget without unpinning.
    pub to_drop: BTreeSet<ContentHash>,
}

impl ReconcilePlan {
    pub fn compute(
        pinned: &HashSet<ContentHash>,
        origin: &HashSet<ContentHash>,
        ledger: &HashMap<ContentHash, SystemTime>,
        gc_config: GcConfig,
        now: SystemTime,
    ) -> Self {
        let mut plan = Self::default();

        for (hash, first_seen_at) in ledger {
            // Promotion wins over everything else, whatever the elapsed time.
            if origin.contains(hash) {
                plan.to_promote.insert(hash.clone());
            } else if !pinned.contains(hash) {
                plan.to_drop.insert(hash.clone());
            } else if is_expired(*first_seen_at, now, gc_config.grace_period) {
                plan.to_evict.insert(hash.clone());
            }
        }

        plan.to_admit = pinned
            .iter()
            .filter(|hash| !origin.contains(*hash) && !ledger.contains_key(*hash))
            .cloned()
            .collect();

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.to_promote.is_empty()
            && self.to_admit.is_empty()
            && self.to_evict.is_empty()
            && self.to_drop.is_empty()
    }
}

/// `now - first_seen_at >= grace_period`. A `first_seen_at` in the future
/// (clock moved backwards) is never expired.
pub fn is_expired(first_seen_at: SystemTime, now: SystemTime, grace_period: Duration) -> bool {
    now.duration_since(first_seen_at)
        .map(|elapsed| elapsed >= grace_period)
        .unwrap_or(false)
}
