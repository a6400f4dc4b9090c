// ========================================================================================
//
//                               THE BATCH PLANNER
//
// ========================================================================================
//
// Pure partitioning arithmetic, no state and no I/O. Given the dataset length and a
// requested worker count, the planner fixes the effective worker count and the batch
// size, and enumerates the batch-start offsets the dispatcher will feed to the pool.
//
// The naive `total / workers` split has two hazards: a zero worker count divides by
// zero, and a worker count above the record count truncates the batch size to zero,
// which would make the offset sequence step in place forever. Both are eliminated
// structurally here: the worker count is clamped to `[1, max(1, total)]` and the
// batch size is floored at 1, so every plan terminates.

/// The fixed partitioning of one record sequence. Cheap to copy; every worker
/// carries its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    total_records: usize,
    batch_size: usize,
    workers: usize,
}

impl BatchPlan {
    /// Builds a plan for `total_records` split across `requested_workers`.
    ///
    /// The requested count is clamped so that at least one worker runs and no
    /// worker outnumbers the records. When the division leaves a remainder, the
    /// final batch absorbs it (it is the only batch allowed to be short).
    pub fn new(total_records: usize, requested_workers: usize) -> Self {
        let workers = requested_workers.clamp(1, total_records.max(1));
        let batch_size = (total_records / workers).max(1);
        Self {
            total_records,
            batch_size,
            workers,
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[inline]
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    /// Batch-start offsets in dispatch order. Empty when there are no records.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + use<> {
        (0..self.total_records).step_by(self.batch_size)
    }

    /// Exclusive end of the batch beginning at `start`.
    #[inline]
    pub fn batch_end(&self, start: usize) -> usize {
        (start + self.batch_size).min(self.total_records)
    }
}
