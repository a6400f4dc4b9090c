// ========================================================================================
//                             High-Level Data Contracts
// ========================================================================================

// This file is ONLY for types that are SHARED BETWEEN FILES, not types that only are
// used in one file.

use serde::Deserialize;

/// One input pair, decoded straight from the record file. Immutable once loaded;
/// the engine only ever holds a shared `&[Record]` view of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Record {
    pub a: i32,
    pub b: i32,
}

impl Record {
    #[inline]
    pub fn new(a: i32, b: i32) -> Self {
        Self { a, b }
    }

    /// True when both operands are positive and their sum would exceed `i32::MAX`.
    ///
    /// Pairs that trip this guard are excluded from their batch sum entirely; they
    /// are reported as an [`OverflowEvent`] instead of being saturated or promoted.
    #[inline]
    pub fn trips_overflow_guard(&self) -> bool {
        self.a > 0 && self.b > 0 && self.a as i64 + self.b as i64 > i32::MAX as i64
    }

    /// The pair sum widened to the accumulator type.
    #[inline]
    pub fn wide_sum(&self) -> i64 {
        self.a as i64 + self.b as i64
    }
}

/// A structured diagnostic for one pair excluded by the overflow guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowEvent {
    /// Index of the offending pair in the full record sequence.
    pub index: usize,
    pub a: i32,
    pub b: i32,
}

/// The payload sent from a worker to the collector: the sum over one batch,
/// tagged with the batch's starting offset, plus any overflow diagnostics the
/// scan produced. Exactly one of these is emitted per dispatched offset.
#[derive(Debug)]
pub struct PartialResult {
    pub batch_start: usize,
    pub sum: i64,
    pub overflows: Vec<OverflowEvent>,
}

/// The final product of one aggregation call.
#[derive(Debug)]
pub struct AggregateOutcome {
    /// Sum of every pair that did not trip the overflow guard.
    pub total: i64,
    /// The worker count actually used after clamping to the record count.
    pub workers_used: usize,
    /// Lowest batch offset seen by the collector. Diagnostic only; `None` when
    /// no batches were dispatched.
    pub min_batch_start: Option<usize>,
    /// Every pair excluded by the overflow guard, in index order.
    pub overflows: Vec<OverflowEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_guard_trips_only_past_i32_max() {
        assert!(Record::new(i32::MAX, 1).trips_overflow_guard());
        assert!(Record::new(1, i32::MAX).trips_overflow_guard());
        // A sum landing exactly on i32::MAX is still representable.
        assert!(!Record::new(i32::MAX - 1, 1).trips_overflow_guard());
        assert!(!Record::new(5, 10).trips_overflow_guard());
    }

    #[test]
    fn overflow_guard_ignores_non_positive_operands() {
        // The guard requires both operands positive, matching the exclusion rule.
        assert!(!Record::new(i32::MAX, 0).trips_overflow_guard());
        assert!(!Record::new(-1, i32::MAX).trips_overflow_guard());
        assert!(!Record::new(i32::MIN, i32::MIN).trips_overflow_guard());
    }

    #[test]
    fn wide_sum_is_exact_at_the_extremes() {
        assert_eq!(
            Record::new(i32::MAX, i32::MAX).wide_sum(),
            2 * i32::MAX as i64
        );
        assert_eq!(
            Record::new(i32::MIN, i32::MIN).wide_sum(),
            2 * i32::MIN as i64
        );
        assert_eq!(Record::new(-3, 2).wide_sum(), -1);
    }
}
