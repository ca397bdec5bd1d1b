//! Process-wide counters for understanding hot paths.
//!
//! Counters are relaxed atomics: cheap to bump, approximate under contention,
//! and never consulted by correctness logic.

use std::sync::atomic::{AtomicU64, Ordering};

pub static ARRAY_MAP_HITS: AtomicU64 = AtomicU64::new(0);
pub static ARRAY_MAP_MISSES: AtomicU64 = AtomicU64::new(0);
pub static BLOCK_SPLITS: AtomicU64 = AtomicU64::new(0);
pub static BLOCK_MERGES: AtomicU64 = AtomicU64::new(0);
pub static CALIBRATIONS: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn array_map_hit() {
    ARRAY_MAP_HITS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn array_map_miss() {
    ARRAY_MAP_MISSES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn block_split() {
    BLOCK_SPLITS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn block_merge() {
    BLOCK_MERGES.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn calibration() {
    CALIBRATIONS.fetch_add(1, Ordering::Relaxed);
}

pub fn reset() {
    ARRAY_MAP_HITS.store(0, Ordering::Relaxed);
    ARRAY_MAP_MISSES.store(0, Ordering::Relaxed);
    BLOCK_SPLITS.store(0, Ordering::Relaxed);
    BLOCK_MERGES.store(0, Ordering::Relaxed);
    CALIBRATIONS.store(0, Ordering::Relaxed);
}

pub fn report() -> String {
    let hits = ARRAY_MAP_HITS.load(Ordering::Relaxed);
    let misses = ARRAY_MAP_MISSES.load(Ordering::Relaxed);
    let total = hits + misses;
    let hit_rate = if total > 0 { hits as f64 / total as f64 * 100.0 } else { 0.0 };

    let splits = BLOCK_SPLITS.load(Ordering::Relaxed);
    let merges = BLOCK_MERGES.load(Ordering::Relaxed);
    let calibrations = CALIBRATIONS.load(Ordering::Relaxed);

    return format!(
        "ArrayMap: {}/{} ({:.1}% hit), Splits: {}, Merges: {}, Calibrations: {}",
        hits, total, hit_rate, splits, merges, calibrations
    );
}
