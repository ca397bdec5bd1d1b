//! One-time calibration and memoized dispatch.

use std::any::{TypeId, type_name};
use std::hint::black_box;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{Candidate, CandidateId, OperationKind, SampleProvider};
use crate::config::SelectorConfig;
use crate::error::{Error, Result};
use crate::profiling;

/// Measures one run of a candidate.
pub trait Timer: Send + Sync {
    fn measure(&self, candidate: CandidateId, run: &mut dyn FnMut()) -> Duration;
}

/// Wall-clock timing with [`Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantTimer;

impl Timer for InstantTimer {
    #[inline]
    fn measure(&self, _candidate: CandidateId, run: &mut dyn FnMut()) -> Duration {
        let start = Instant::now();
        run();
        return start.elapsed();
    }
}

type MemoKey = (OperationKind, TypeId);

/// Picks the fastest candidate per `(operation kind, element type)` once and
/// remembers it for the life of the selector.
///
/// Two threads racing to calibrate the same key may both do the timing; the
/// memo keeps whichever write lands last. Every candidate computes the same
/// answer, so only benchmarking work is wasted.
pub struct Selector<M: Timer = InstantTimer> {
    config: SelectorConfig,
    timer: M,
    memo: RwLock<FxHashMap<MemoKey, CandidateId>>,
}

static GLOBAL: OnceLock<Selector> = OnceLock::new();

impl Selector {
    pub fn new(config: SelectorConfig) -> Selector {
        return Selector::with_timer(config, InstantTimer);
    }

    /// The process-wide selector, created with default settings on first use.
    pub fn global() -> &'static Selector {
        return GLOBAL.get_or_init(|| Selector::new(SelectorConfig::default()));
    }
}

impl<M: Timer> Selector<M> {
    pub fn with_timer(config: SelectorConfig, timer: M) -> Selector<M> {
        return Selector {
            config,
            timer,
            memo: RwLock::new(FxHashMap::default()),
        };
    }

    pub fn config(&self) -> &SelectorConfig {
        return &self.config;
    }

    pub fn timer(&self) -> &M {
        return &self.timer;
    }

    /// The memoized winner for `kind` over `T`, if calibration has happened.
    pub fn memoized<T: 'static>(&self, kind: OperationKind) -> Option<CandidateId> {
        return self.memo.read().get(&(kind, TypeId::of::<T>())).copied();
    }

    /// Number of memoized decisions.
    pub fn memo_len(&self) -> usize {
        return self.memo.read().len();
    }

    /// Like [`resolve`](Self::resolve), but with selection switchable.
    /// When `enabled` is false the first candidate, the fixed default, is
    /// returned and nothing is timed.
    pub fn choose<T, P>(
        &self,
        enabled: bool,
        kind: OperationKind,
        candidates: &[Candidate<T>],
        samples: &P,
    ) -> Result<Candidate<T>>
    where
        T: Clone + 'static,
        P: SampleProvider<T> + ?Sized,
    {
        if !enabled {
            return candidates
                .first()
                .copied()
                .ok_or(Error::NoCandidates { operation: kind });
        }
        return self.resolve(kind, candidates, samples);
    }

    /// The candidate to dispatch `kind` over `T` to, calibrating on first
    /// request.
    pub fn resolve<T, P>(&self, kind: OperationKind, candidates: &[Candidate<T>], samples: &P) -> Result<Candidate<T>>
    where
        T: Clone + 'static,
        P: SampleProvider<T> + ?Sized,
    {
        if candidates.is_empty() {
            return Err(Error::NoCandidates { operation: kind });
        }

        if let Some(id) = self.memoized::<T>(kind) {
            if let Some(found) = candidates.iter().find(|c| c.id == id) {
                return Ok(*found);
            }
            log::warn!(
                "memoized candidate {} for {:?} over {} is not in the table; using {}",
                id.0,
                kind,
                type_name::<T>(),
                candidates[0].id.0
            );
            return Ok(candidates[0]);
        }

        let winner = self.calibrate(kind, candidates, samples);
        self.memo.write().insert((kind, TypeId::of::<T>()), winner.id);
        return Ok(winner);
    }

    /// Time every candidate against the large sample and return the fastest.
    /// Ties go to the earlier table entry.
    fn calibrate<T, P>(&self, kind: OperationKind, candidates: &[Candidate<T>], samples: &P) -> Candidate<T>
    where
        T: Clone + 'static,
        P: SampleProvider<T> + ?Sized,
    {
        profiling::calibration();
        let tiers = self.config.sample_tiers;

        for size in [tiers.small, tiers.medium] {
            let warmup = samples.sample(size);
            let Some(target) = warmup.get(kind.target_position(warmup.len())).cloned() else {
                continue;
            };
            for candidate in candidates {
                black_box((candidate.run)(warmup.collection(), &target));
            }
        }

        let large = samples.sample(tiers.large);
        let Some(target) = large.get(kind.target_position(large.len())).cloned() else {
            log::debug!("empty calibration sample for {:?}; keeping the default", kind);
            return candidates[0];
        };

        let mut best: Option<(Candidate<T>, Duration)> = None;
        for candidate in candidates {
            let mut total = Duration::ZERO;
            for _ in 0..self.config.repetitions {
                total += self.timer.measure(candidate.id, &mut || {
                    black_box((candidate.run)(large.collection(), &target));
                });
            }
            log::trace!("{:?} over {}: {} took {:?}", kind, type_name::<T>(), candidate.id.0, total);

            let faster = match best {
                Some((_, fastest)) => total < fastest,
                None => true,
            };
            if faster {
                best = Some((*candidate, total));
            }
        }

        let (winner, elapsed) = best.unwrap_or((candidates[0], Duration::ZERO));
        log::info!(
            "calibrated {:?} over {}: {} ({:?} for {} runs on {} elements)",
            kind,
            type_name::<T>(),
            winner.id.0,
            elapsed,
            self.config.repetitions,
            large.len()
        );
        return winner;
    }
}

impl<M: Timer> std::fmt::Debug for Selector<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f
            .debug_struct("Selector")
            .field("config", &self.config)
            .field("memoized", &self.memo_len())
            .finish();
    }
}
