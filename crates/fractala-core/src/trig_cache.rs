//! Shared sine/cosine lookup tables, one pair per resolution power.
//!
//! Converting a pixel to a point on the sphere needs the sine and cosine of
//! its azimuth and inclination. Every layer evaluated at the same power reads
//! the same tables, so they are computed once and shared by `Arc`.
//!
//! Population is idempotent. Tables are computed into a private buffer with no
//! lock held and published under a short write lock; a concurrent caller that
//! loses the race simply drops its copy. Readers only ever see complete tables.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::{Arc, OnceLock, RwLock};

use tracing::debug;

use crate::error::{FractalError, Result};

/// Smallest power the cache accepts.
pub const MIN_POWER: u32 = 1;
/// Largest power the cache accepts (tables of 32 768 entries).
pub const MAX_POWER: u32 = 15;

/// The sine and cosine tables for one power.
///
/// Entry `i` holds `sin(i·2π/w)` / `cos(i·2π/w)` with `w = 2^power`.
#[derive(Debug)]
pub struct TrigTables {
    pub sine: Arc<[f64]>,
    pub cosine: Arc<[f64]>,
}

impl TrigTables {
    fn compute(power: u32) -> Self {
        let width = 1usize << power;
        let step = angle_per_pixel(width);
        let sine: Arc<[f64]> = (0..width).map(|i| (i as f64 * step).sin()).collect();
        let cosine: Arc<[f64]> = (0..width).map(|i| (i as f64 * step).cos()).collect();
        Self { sine, cosine }
    }

    pub fn len(&self) -> usize {
        self.sine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sine.is_empty()
    }
}

/// Angle in radians covered by one pixel of an equirectangular image of the
/// given width. Height is half the width, so the same step applies vertically.
pub fn angle_per_pixel(width: usize) -> f64 {
    TAU / width as f64
}

/// Thread-safe, append-only cache of [`TrigTables`] keyed by power.
#[derive(Debug, Default)]
pub struct TrigCache {
    tables: RwLock<HashMap<u32, Arc<TrigTables>>>,
}

impl TrigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by the preset constructors and by any
    /// fractal configured without an explicit cache.
    pub fn shared() -> Arc<TrigCache> {
        static SHARED: OnceLock<Arc<TrigCache>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(TrigCache::new())))
    }

    /// Ensure tables exist for `power`, computing them if absent.
    ///
    /// Fails with `InvalidArgument` if `power` is outside
    /// [`MIN_POWER`]..=[`MAX_POWER`].
    pub fn populate(&self, power: u32) -> Result<()> {
        if !(MIN_POWER..=MAX_POWER).contains(&power) {
            return Err(FractalError::invalid(format!(
                "power must be between {MIN_POWER} and {MAX_POWER}, got {power}"
            )));
        }
        if self.contains(power) {
            return Ok(());
        }

        let computed = Arc::new(TrigTables::compute(power));
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.entry(power).or_insert_with(|| {
            debug!(power, len = computed.len(), "populated trig tables");
            computed
        });
        Ok(())
    }

    /// True once `populate(power)` has succeeded. Never reverts.
    pub fn contains(&self, power: u32) -> bool {
        self.read().contains_key(&power)
    }

    /// Both tables for `power`, or `NotFound` if unpopulated.
    pub fn tables(&self, power: u32) -> Result<Arc<TrigTables>> {
        self.read()
            .get(&power)
            .cloned()
            .ok_or_else(|| FractalError::NotFound(format!("trig tables unpopulated for power {power}")))
    }

    pub fn sine(&self, power: u32) -> Result<Arc<[f64]>> {
        self.tables(power).map(|t| Arc::clone(&t.sine))
    }

    pub fn cosine(&self, power: u32) -> Result<Arc<[f64]>> {
        self.tables(power).map(|t| Arc::clone(&t.cosine))
    }

    /// Powers currently populated, ascending.
    pub fn powers(&self) -> Vec<u32> {
        let mut powers: Vec<u32> = self.read().keys().copied().collect();
        powers.sort_unstable();
        powers
    }

    // Tables are never left half-written, so a poisoned lock still guards a
    // consistent map.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<u32, Arc<TrigTables>>> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn populate_rejects_out_of_range_powers() {
        let cache = TrigCache::new();
        assert!(matches!(cache.populate(0), Err(FractalError::InvalidArgument(_))));
        assert!(matches!(cache.populate(16), Err(FractalError::InvalidArgument(_))));
        assert!(cache.populate(1).is_ok());
        assert!(cache.populate(15).is_ok());
    }

    #[test]
    fn unpopulated_lookup_is_not_found() {
        let cache = TrigCache::new();
        assert!(!cache.contains(4));
        assert!(matches!(cache.sine(4), Err(FractalError::NotFound(_))));
        assert!(matches!(cache.cosine(4), Err(FractalError::NotFound(_))));
    }

    #[test]
    fn tables_have_expected_length_and_values() {
        let cache = TrigCache::new();
        cache.populate(3).unwrap();
        let sine = cache.sine(3).unwrap();
        let cosine = cache.cosine(3).unwrap();
        assert_eq!(sine.len(), 8);
        assert_eq!(cosine.len(), 8);
        // Quarter turn sits at index 2 of 8.
        assert_relative_eq!(sine[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cosine[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(cosine[4], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn populate_is_idempotent() {
        let cache = TrigCache::new();
        cache.populate(6).unwrap();
        let first = cache.tables(6).unwrap();
        cache.populate(6).unwrap();
        let second = cache.tables(6).unwrap();
        assert!(Arc::ptr_eq(&first, &second), "second populate must not replace tables");
        assert!(cache.contains(6));
        assert_eq!(cache.powers(), vec![6]);
    }

    #[test]
    fn concurrent_population_publishes_one_table() {
        let cache = Arc::new(TrigCache::new());
        std::thread::scope(|s| {
            for _ in 0..8 {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    for power in 1..=10 {
                        cache.populate(power).unwrap();
                        let t = cache.tables(power).unwrap();
                        assert_eq!(t.len(), 1 << power, "reader saw a partial table");
                    }
                });
            }
        });
        assert_eq!(cache.powers(), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn shared_cache_is_a_singleton() {
        assert!(Arc::ptr_eq(&TrigCache::shared(), &TrigCache::shared()));
    }
}
