//! Reconciliation runs: ledger + sources + plan, applied once.

use crate::core::ledger::Ledger;
use crate::core::ledger::error::DatabaseError;
use crate::core::reconcile::ReconcilePlan;
use crate::core::source::{OriginSource, PinSource, SourceError, Unpinner};
use crate::types::{ContentHash, GcConfig, LedgerConfig, PinnerConfig};
use error::PinnerError;
use std::time::{Instant, SystemTime};
use tracing::{debug, info, warn};

pub mod ledger;
pub mod reconcile;
pub mod source;

pub mod error {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum PinnerError {
        #[error("{what} unavailable: {error}")]
        SourceUnavailable {
            what: &'static str,
            #[source]
            error: SourceError,
        },

        #[error("Ledger error: {0}")]
        Ledger(#[from] DatabaseError),

        #[error("Ledger write failed: {0}")]
        LedgerWriteFailed(#[source] DatabaseError),

        #[error("Another run holds the ledger")]
        RunInProgress,
    }
}

/// An unpin that did not go through. The hash stays in the ledger and is
/// retried on the next run.
#[derive(Debug)]
pub struct EvictionFailure {
    pub hash: ContentHash,
    pub error: SourceError,
}

#[derive(Debug, Default)]
pub struct RunOutcome {
    pub promoted: Vec<ContentHash>,
    pub admitted: Vec<ContentHash>,
    pub evicted: Vec<ContentHash>,
    pub dropped: Vec<ContentHash>,
    pub eviction_failures: Vec<EvictionFailure>,
}

/// The pin garbage collector for one storage node.
///
/// Holding a `Pinner` holds the ledger's file lock, so two runs against the
/// same ledger cannot overlap.
pub struct Pinner {
    ledger: Ledger,
    gc_config: GcConfig,
}

impl Pinner {
    pub fn open(config: LedgerConfig, gc_config: GcConfig) -> Result<Self, PinnerError> {
        let ledger = Ledger::open(config).map_err(|err| {
            if err.is_already_open() {
                PinnerError::RunInProgress
            } else {
                PinnerError::Ledger(err)
            }
        })?;

        Ok(Self { ledger, gc_config })
    }

    pub fn from_config(config: &PinnerConfig) -> Result<Self, PinnerError> {
        Self::open(LedgerConfig::from(config), GcConfig::from(config))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// Reconciliation.
impl Pinner {
    /// Performs one reconciliation run.
    ///
    /// Fails without touching the ledger if either source cannot be read.
    /// Individual unpin failures do not fail the run; they are reported in
    /// [`RunOutcome::eviction_failures`].
    pub fn run<R, N>(
        &mut self,
        registry: &R,
        node: &N,
        now: SystemTime,
    ) -> Result<RunOutcome, PinnerError>
    where
        R: OriginSource + Sync,
        N: PinSource + Unpinner + Sync,
    {
        let run_started = Instant::now();

        let ledger = self.ledger.read_all()?;
        info!("{} ledger pins not yet seen in the registry", ledger.len());

        // Both reads are independent; neither result is used until both are in.
        let (pinned, origin) = std::thread::scope(|scope| {
            let origin = scope.spawn(|| registry.list_origin_hashes());
            let pinned = node.list_pinned_hashes();
            let origin = origin
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
            (pinned, origin)
        });

        let pinned = pinned.map_err(|error| PinnerError::SourceUnavailable {
            what: "storage node",
            error,
        })?;
        let origin = origin.map_err(|error| PinnerError::SourceUnavailable {
            what: "registry",
            error,
        })?;

        info!("{} current pins on the storage node", pinned.len());
        info!("{} origin content hashes in the registry", origin.len());
        debug!("current pins: {:?}", pinned);
        debug!("origin content hashes: {:?}", origin);

        let plan = ReconcilePlan::compute(&pinned, &origin, &ledger, self.gc_config, now);
        info!(
            "plan: {} to promote, {} to admit, {} to evict, {} stale",
            plan.to_promote.len(),
            plan.to_admit.len(),
            plan.to_evict.len(),
            plan.to_drop.len()
        );

        let mut outcome = RunOutcome::default();

        for hash in &plan.to_evict {
            match node.unpin(hash) {
                Ok(()) => {
                    debug!("unpinned {}", hash);
                    outcome.evicted.push(hash.clone());
                }
                Err(error) => {
                    warn!("failed to unpin {}: {}", hash, error);
                    outcome.eviction_failures.push(EvictionFailure {
                        hash: hash.clone(),
                        error,
                    });
                }
            }
        }

        for hash in &plan.to_drop {
            warn!("{} is no longer pinned, dropping it from the ledger", hash);
        }

        self.commit(&plan, &outcome.evicted, now)?;

        outcome.promoted = plan.to_promote.into_iter().collect();
        outcome.admitted = plan.to_admit.into_iter().collect();
        outcome.dropped = plan.to_drop.into_iter().collect();

        info!(
            "promoted {}, admitted {}, unpinned {}, dropped {}, failed to unpin {}",
            outcome.promoted.len(),
            outcome.admitted.len(),
            outcome.evicted.len(),
            outcome.dropped.len(),
            outcome.eviction_failures.len()
        );
        info!(
            "finished run in {:.3}s",
            run_started.elapsed().as_secs_f64()
        );

        Ok(outcome)
    }

    /// Writes every ledger change of the run in one transaction: promotions,
    /// successful evictions, and stale drops are removed, admissions inserted.
    /// Nothing is written if any change fails.
    fn commit(
        &mut self,
        plan: &ReconcilePlan,
        evicted: &[ContentHash],
        now: SystemTime,
    ) -> Result<(), PinnerError> {
        let write = |ledger: &mut Ledger| -> Result<(), DatabaseError> {
            let txn = ledger.begin()?;

            for hash in plan.to_promote.iter().chain(evicted).chain(&plan.to_drop) {
                txn.remove(hash)?;
            }

            for hash in &plan.to_admit {
                txn.upsert(hash, now)?;
            }

            txn.commit()
        };

        write(&mut self.ledger).map_err(PinnerError::LedgerWriteFailed)
    }
}
