//! Job budget: the cap on emitted records and the progress toward it

use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared counter enforcing the maximum-record limit
///
/// `claimed` counts slots handed out by [`JobBudget::try_reserve`] that have
/// not been released; `scraped` counts committed emissions. The invariant
/// `scraped <= claimed <= target` holds at every instant.
#[derive(Debug)]
pub struct JobBudget {
    target: usize,
    claimed: AtomicUsize,
    scraped: AtomicUsize,
}

impl JobBudget {
    /// Creates a budget; a target of zero is raised to one
    pub fn new(target: usize) -> Self {
        Self {
            target: target.max(1),
            claimed: AtomicUsize::new(0),
            scraped: AtomicUsize::new(0),
        }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    /// Records emitted so far
    pub fn scraped(&self) -> usize {
        self.scraped.load(Ordering::Acquire)
    }

    /// Slots not yet claimed by any worker
    ///
    /// Advisory only: another worker may claim a slot right after this returns.
    pub fn remaining(&self) -> usize {
        self.target
            .saturating_sub(self.claimed.load(Ordering::Acquire))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Atomically checks `claimed < target` and claims one slot
    ///
    /// Returns `None` once the budget is spent. The slot is given back if it
    /// is dropped without [`BudgetSlot::commit`].
    pub fn try_reserve(&self) -> Option<BudgetSlot<'_>> {
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |claimed| {
                (claimed < self.target).then_some(claimed + 1)
            })
            .ok()
            .map(|_| BudgetSlot {
                budget: self,
                committed: false,
            })
    }
}

/// One reserved emission
#[derive(Debug)]
#[must_use = "an uncommitted slot is released on drop"]
pub struct BudgetSlot<'a> {
    budget: &'a JobBudget,
    committed: bool,
}

impl BudgetSlot<'_> {
    /// Marks the emission as done and returns the new scraped count
    pub fn commit(mut self) -> usize {
        self.committed = true;
        self.budget.scraped.fetch_add(1, Ordering::AcqRel) + 1
    }
}

impl Drop for BudgetSlot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.budget.claimed.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_reserve_until_exhausted() {
        let budget = JobBudget::new(2);
        assert_eq!(budget.remaining(), 2);

        budget.try_reserve().unwrap().commit();
        budget.try_reserve().unwrap().commit();

        assert!(budget.try_reserve().is_none());
        assert!(budget.is_exhausted());
        assert_eq!(budget.scraped(), 2);
    }

    #[test]
    fn test_dropped_slot_is_released() {
        let budget = JobBudget::new(1);
        {
            let _slot = budget.try_reserve().unwrap();
            assert_eq!(budget.remaining(), 0);
            assert!(budget.try_reserve().is_none());
        }
        assert_eq!(budget.remaining(), 1);
        assert_eq!(budget.scraped(), 0);
    }

    #[test]
    fn test_zero_target_raised_to_one() {
        assert_eq!(JobBudget::new(0).target(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_commits_never_exceed_target() {
        for _ in 0..50 {
            let budget = Arc::new(JobBudget::new(3));
            let barrier = Arc::new(tokio::sync::Barrier::new(10));

            let handles: Vec<_> = (0..10)
                .map(|_| {
                    let budget = Arc::clone(&budget);
                    let barrier = Arc::clone(&barrier);
                    tokio::spawn(async move {
                        barrier.wait().await;
                        match budget.try_reserve() {
                            Some(slot) => {
                                slot.commit();
                                1
                            }
                            None => 0,
                        }
                    })
                })
                .collect();

            let mut emitted = 0;
            for handle in handles {
                emitted += handle.await.unwrap();
            }

            assert_eq!(emitted, 3);
            assert_eq!(budget.scraped(), 3);
        }
    }
}
