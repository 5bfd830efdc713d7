//! Kernel cache implementation
//!
//! Row-oriented LRU cache of kernel values. A row holds `K(i, ·)` for one
//! example slot against every slot of the arena; entries are filled lazily and
//! `NaN` marks a value that has not been computed yet. Rows are preferred over
//! scattered pairs because REPROCESS and gradient propagation walk whole rows
//! of the two examples being updated.
//!
//! The cache is transparent: a disabled cache (`budget = 0`) recomputes every
//! value and the solver produces exactly the same output.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Bytes per cached kernel value
const BYTES_PER_ENTRY: usize = std::mem::size_of::<f64>();

/// A cache never holds fewer rows than this (the two rows of an update)
const MIN_ROWS: usize = 2;

/// LRU cache of kernel rows keyed by example slot
pub struct KernelCache {
    rows: Option<LruCache<usize, Vec<f64>>>,
    row_len: usize,
    budget_bytes: usize,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a cache for rows of `row_len` entries within `budget_bytes`.
    /// A zero budget disables caching.
    pub fn new(budget_bytes: usize, row_len: usize) -> Self {
        let rows = (budget_bytes > 0)
            .then(|| LruCache::new(Self::row_capacity(budget_bytes, row_len)));
        Self {
            rows,
            row_len,
            budget_bytes,
            hits: 0,
            misses: 0,
        }
    }

    fn row_capacity(budget_bytes: usize, row_len: usize) -> NonZeroUsize {
        let row_bytes = row_len.max(1) * BYTES_PER_ENTRY;
        let rows = (budget_bytes / row_bytes).max(MIN_ROWS);
        NonZeroUsize::new(rows).unwrap_or(NonZeroUsize::MIN)
    }

    /// Look up K(i, j) in row `i`, then in row `j`
    pub fn get(&mut self, i: usize, j: usize) -> Option<f64> {
        let value = self.lookup(i, j);
        if value.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        value
    }

    fn lookup(&mut self, i: usize, j: usize) -> Option<f64> {
        let rows = self.rows.as_mut()?;
        if let Some(&value) = rows.get(&i).and_then(|row| row.get(j)) {
            if !value.is_nan() {
                return Some(value);
            }
        }
        // Symmetric entry; peek so a row touched only for symmetry keeps its age
        match rows.peek(&j).and_then(|row| row.get(i)) {
            Some(&value) if !value.is_nan() => Some(value),
            _ => None,
        }
    }

    /// Store K(i, j) in row `i`, creating the row (and evicting the least
    /// recently used one) if needed
    pub fn put(&mut self, i: usize, j: usize, value: f64) {
        let row_len = self.row_len;
        let Some(rows) = self.rows.as_mut() else {
            return;
        };
        if j >= row_len {
            return;
        }
        if let Some(row) = rows.get_mut(&i) {
            row[j] = value;
            return;
        }
        let mut row = vec![f64::NAN; row_len];
        row[j] = value;
        rows.put(i, row);
    }

    /// Return K(i, j), evaluating `compute` on a miss
    pub fn get_or_compute<F: FnOnce() -> f64>(&mut self, i: usize, j: usize, compute: F) -> f64 {
        if let Some(value) = self.get(i, j) {
            return value;
        }
        let value = compute();
        self.put(i, j, value);
        value
    }

    /// Grow every row to `row_len` entries after the arena was extended and
    /// recompute how many rows fit in the budget
    pub fn extend_rows(&mut self, row_len: usize) {
        if row_len <= self.row_len {
            return;
        }
        self.row_len = row_len;
        let capacity = Self::row_capacity(self.budget_bytes, row_len);
        if let Some(rows) = self.rows.as_mut() {
            rows.resize(capacity);
            for (_, row) in rows.iter_mut() {
                row.resize(row_len, f64::NAN);
            }
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.rows.as_ref().map_or(0, |rows| rows.cap().get()),
            rows: self.rows.as_ref().map_or(0, |rows| rows.len()),
            row_len: self.row_len,
        }
    }

}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Maximum number of rows
    pub capacity: usize,
    /// Rows currently held
    pub rows: usize,
    pub row_len: usize,
}

impl CacheStats {
    /// Share of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
