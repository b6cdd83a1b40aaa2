//! Row-band partitioning for parallel tracing.
//!
//! Divides the image into contiguous bands of whole rows that can be
//! rendered independently. Bands never overlap, so each one can own its
//! slice of the film.

use std::ops::Range;

/// A contiguous range of image rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    /// First row of the band
    pub start: usize,
    /// One past the last row of the band
    pub end: usize,
    /// Index of this band, top to bottom
    pub index: usize,
}

impl RowPartition {
    pub fn new(start: usize, end: usize, index: usize) -> Self {
        Self { start, end, index }
    }

    /// Number of rows in the band.
    pub fn row_count(&self) -> usize {
        self.end - self.start
    }

    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Bands handed to each worker thread on average.
///
/// More than one per worker keeps threads busy when some bands are
/// cheaper than others (e.g. rows of pure background).
pub const PARTITIONS_PER_WORKER: usize = 4;

/// Split `[0, height)` into bands of at most `rows_per_partition` rows.
///
/// # Panics
/// If `rows_per_partition` is zero.
pub fn partition_rows(height: usize, rows_per_partition: usize) -> Vec<RowPartition> {
    assert!(rows_per_partition > 0, "rows_per_partition must be positive");

    (0..height)
        .step_by(rows_per_partition)
        .enumerate()
        .map(|(index, start)| {
            RowPartition::new(start, (start + rows_per_partition).min(height), index)
        })
        .collect()
}

/// Band height that gives each of `workers` threads a few bands.
pub fn default_rows_per_partition(height: usize, workers: usize) -> usize {
    let partitions = workers.max(1) * PARTITIONS_PER_WORKER;
    height.div_ceil(partitions).max(1)
}
