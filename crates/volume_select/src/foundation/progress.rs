//! Progress reporting for partition-level jobs

use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of a job's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Units of work finished
    pub completed: usize,
    /// Units of work scheduled
    pub total: usize,
}

impl Progress {
    /// Fraction in `0.0..=1.0`; an empty job counts as done
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.completed.min(self.total) as f32 / self.total as f32
        }
    }
}

/// Callback invoked from worker threads as work completes
pub type ProgressCallback<'a> = &'a (dyn Fn(Progress) + Sync);

/// Thread-safe counter shared across rayon workers
#[derive(Debug)]
pub struct ProgressCounter {
    completed: AtomicUsize,
    total: usize,
}

impl ProgressCounter {
    /// Start a counter for `total` units
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one finished unit and return the new snapshot
    pub fn advance(&self) -> Progress {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        Progress {
            completed,
            total: self.total,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Progress {
        Progress {
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_counter_is_consistent_across_threads() {
        let counter = ProgressCounter::new(64);
        (0..64).into_par_iter().for_each(|_| {
            counter.advance();
        });
        let snapshot = counter.snapshot();
        assert_eq!(snapshot.completed, 64);
        assert!((snapshot.fraction() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_empty_job_is_complete() {
        assert!((Progress::default().fraction() - 1.0).abs() < f32::EPSILON);
    }
}
