//! Tests for adaptive operation selection: calibration, memoization and the
//! disabled path.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use distlist::adaptive::{
    Candidate, CandidateId, DefaultSamples, OperationKind, SampleProvider, Selector, Timer, standard_candidates,
};
use distlist::{BlockCollection, DistributedList, Error, FixedBalancer, SampleTiers, SelectorConfig};
use parking_lot::Mutex;

// =============================================================================
// Helper functions
// =============================================================================

/// Reports `fast` as quicker than everything else and counts every call.
struct InstrumentedTimer {
    fast: &'static str,
    calls: AtomicUsize,
    order: Mutex<Vec<&'static str>>,
}

impl InstrumentedTimer {
    fn new(fast: &'static str) -> InstrumentedTimer {
        return InstrumentedTimer {
            fast,
            calls: AtomicUsize::new(0),
            order: Mutex::new(Vec::new()),
        };
    }

    fn calls(&self) -> usize {
        return self.calls.load(Ordering::SeqCst);
    }
}

impl Timer for InstrumentedTimer {
    fn measure(&self, candidate: CandidateId, run: &mut dyn FnMut()) -> Duration {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut order = self.order.lock();
        if order.last() != Some(&candidate.0) {
            order.push(candidate.0);
        }
        run();
        if candidate.0 == self.fast {
            return Duration::from_nanos(10);
        }
        return Duration::from_nanos(1_000);
    }
}

/// Records the sizes requested and checks samples have selection off.
#[derive(Default)]
struct RecordingSamples {
    sizes: Mutex<Vec<usize>>,
}

impl SampleProvider<u32> for RecordingSamples {
    fn sample(&self, size: usize) -> DistributedList<u32> {
        self.sizes.lock().push(size);
        let mut list = DistributedList::with_balancer(Arc::new(FixedBalancer::uniform(16)), false);
        list.extend_from(0..size as u32);
        return list;
    }
}

fn config() -> SelectorConfig {
    return SelectorConfig {
        repetitions: 10,
        sample_tiers: SampleTiers {
            small: 8,
            medium: 32,
            large: 128,
        },
    };
}

fn scan_a(collection: &BlockCollection<u32>, item: &u32) -> Option<usize> {
    return collection.iter().position(|x| x == item);
}

fn scan_b(collection: &BlockCollection<u32>, item: &u32) -> Option<usize> {
    return collection.to_vec().iter().position(|x| x == item);
}

// =============================================================================
// Calibration
// =============================================================================

#[test]
fn faster_candidate_wins_in_either_order() {
    for table in [
        [Candidate::new("a", scan_a), Candidate::new("b", scan_b)],
        [Candidate::new("b", scan_b), Candidate::new("a", scan_a)],
    ] {
        let selector = Selector::with_timer(config(), InstrumentedTimer::new("a"));
        let chosen = selector.resolve(OperationKind::IndexOf, &table, &DefaultSamples).unwrap();
        assert_eq!(chosen.id, CandidateId("a"));
        assert_eq!(selector.timer().order.lock().as_slice(), &[table[0].id.0, table[1].id.0]);
    }
}

#[test]
fn memoized_choice_is_never_retimed() {
    let selector = Selector::with_timer(config(), InstrumentedTimer::new("b"));
    let table = [Candidate::new("a", scan_a), Candidate::new("b", scan_b)];

    selector.resolve(OperationKind::Contains, &table, &DefaultSamples).unwrap();
    let after_calibration = selector.timer().calls();
    assert_eq!(after_calibration, 20);

    for _ in 0..50 {
        let chosen = selector.resolve(OperationKind::Contains, &table, &DefaultSamples).unwrap();
        assert_eq!(chosen.id, CandidateId("b"));
    }
    assert_eq!(selector.timer().calls(), after_calibration);
    assert_eq!(selector.memoized::<u32>(OperationKind::Contains), Some(CandidateId("b")));
}

#[test]
fn memo_is_keyed_by_element_type() {
    let selector = Selector::with_timer(config(), InstrumentedTimer::new("block_scan"));
    let small = standard_candidates::<u32>(OperationKind::IndexOf);
    let wide = standard_candidates::<u64>(OperationKind::IndexOf);

    selector.resolve(OperationKind::IndexOf, &small, &DefaultSamples).unwrap();
    let calls = selector.timer().calls();
    selector.resolve(OperationKind::IndexOf, &wide, &DefaultSamples).unwrap();
    assert_eq!(selector.timer().calls(), calls * 2);
    assert_eq!(selector.memo_len(), 2);
    assert_eq!(selector.memoized::<u64>(OperationKind::IndexOf), Some(CandidateId("block_scan")));
}

#[test]
fn samples_cover_every_tier() {
    let selector = Selector::with_timer(config(), InstrumentedTimer::new("indexed_scan_rev"));
    let samples = RecordingSamples::default();
    let table = standard_candidates::<u32>(OperationKind::LastIndexOf);

    let chosen = selector.resolve(OperationKind::LastIndexOf, &table, &samples).unwrap();
    assert_eq!(chosen.id, CandidateId("indexed_scan_rev"));
    assert_eq!(samples.sizes.lock().as_slice(), &[8, 32, 128]);
}

#[test]
fn chosen_candidate_computes_the_answer() {
    let selector = Selector::with_timer(config(), InstrumentedTimer::new("block_scan_rev"));
    let table = standard_candidates::<u32>(OperationKind::LastIndexOf);
    let chosen = selector.resolve(OperationKind::LastIndexOf, &table, &DefaultSamples).unwrap();

    let list: DistributedList<u32> = [1, 2, 3, 2, 1].into_iter().collect();
    assert_eq!((chosen.run)(list.collection(), &2), Some(3));
}

#[test]
fn concurrent_calibration_keeps_one_decision() {
    let selector = Selector::with_timer(config(), InstrumentedTimer::new("a"));
    let table = [Candidate::new("b", scan_b), Candidate::new("a", scan_a)];

    let chosen: Vec<CandidateId> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                scope.spawn(|| {
                    return selector
                        .resolve(OperationKind::IndexOf, &table, &DefaultSamples)
                        .unwrap()
                        .id;
                })
            })
            .collect();
        return handles.into_iter().map(|h| h.join().unwrap()).collect();
    });

    assert_eq!(chosen, vec![CandidateId("a"), CandidateId("a")]);
    assert_eq!(selector.memo_len(), 1);
    assert_eq!(selector.memoized::<u32>(OperationKind::IndexOf), Some(CandidateId("a")));
    // Either both threads calibrated or one saw the other's decision.
    let calls = selector.timer().calls();
    assert!(calls == 20 || calls == 40);
}

// =============================================================================
// Failure and disabled paths
// =============================================================================

#[test]
fn empty_candidate_set_fails_at_resolution() {
    let selector = Selector::with_timer(config(), InstrumentedTimer::new("a"));
    let table: Vec<Candidate<u32>> = Vec::new();
    assert_eq!(
        selector.resolve(OperationKind::Contains, &table, &DefaultSamples).err(),
        Some(Error::NoCandidates {
            operation: OperationKind::Contains
        })
    );
    assert_eq!(selector.timer().calls(), 0);
}

#[test]
fn disabled_selection_always_uses_default() {
    let selector = Selector::with_timer(config(), InstrumentedTimer::new("block_scan"));
    let table = standard_candidates::<u32>(OperationKind::IndexOf);
    for _ in 0..5 {
        let chosen = selector
            .choose(false, OperationKind::IndexOf, &table, &DefaultSamples)
            .unwrap();
        assert_eq!(chosen.id, CandidateId("iterator_scan"));
    }
    assert_eq!(selector.timer().calls(), 0);
    assert_eq!(selector.memoized::<u32>(OperationKind::IndexOf), None);
}
