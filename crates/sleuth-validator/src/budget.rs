//! Cost and time budgets.
//!
//! The cost meter is the only state shared between hypotheses tested in the
//! same run. [`AtomicCostMeter`] updates it with compare-and-swap so that
//! concurrent charges can never take the balance below zero.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{BudgetError, BudgetResult};

/// Injected cost counter. Units are opaque to the validator.
pub trait CostMeter: Send + Sync {
    /// Units left.
    fn remaining(&self) -> u64;

    /// Deduct `amount`, or fail without deducting anything.
    fn charge(&self, amount: u64) -> BudgetResult<()>;

    /// Units charged so far.
    fn spent(&self) -> u64;
}

/// Lock-free cost meter with a fixed limit.
#[derive(Debug)]
pub struct AtomicCostMeter {
    limit: u64,
    spent: AtomicU64,
}

impl AtomicCostMeter {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            spent: AtomicU64::new(0),
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl CostMeter for AtomicCostMeter {
    fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.spent.load(Ordering::Acquire))
    }

    fn charge(&self, amount: u64) -> BudgetResult<()> {
        let mut spent = self.spent.load(Ordering::Acquire);
        loop {
            let remaining = self.limit.saturating_sub(spent);
            if amount > remaining {
                return Err(BudgetError::Exhausted {
                    requested: amount,
                    remaining,
                });
            }
            match self.spent.compare_exchange_weak(
                spent,
                spent + amount,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(current) => spent = current,
            }
        }
    }

    fn spent(&self) -> u64 {
        self.spent.load(Ordering::Acquire)
    }
}

/// Budget handle passed explicitly through a validation run.
///
/// Cloning shares the underlying meter; independent runs use independent
/// budgets.
#[derive(Clone)]
pub struct Budget {
    meter: Arc<dyn CostMeter>,
    deadline: Option<Instant>,
}

impl Budget {
    /// Budget backed by an injected meter, with no deadline.
    pub fn new(meter: Arc<dyn CostMeter>) -> Self {
        Self {
            meter,
            deadline: None,
        }
    }

    /// Budget with a fresh [`AtomicCostMeter`].
    pub fn with_limit(limit: u64) -> Self {
        Self::new(Arc::new(AtomicCostMeter::new(limit)))
    }

    /// Stop all work at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Stop all work `limit` from now.
    pub fn with_time_limit(self, limit: Duration) -> Self {
        self.with_deadline(Instant::now() + limit)
    }

    pub fn remaining(&self) -> u64 {
        self.meter.remaining()
    }

    pub fn spent(&self) -> u64 {
        self.meter.spent()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn time_left(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.time_left().is_some_and(|left| left.is_zero())
    }

    /// Reserve `amount` units before starting a piece of work.
    pub fn reserve(&self, amount: u64) -> BudgetResult<()> {
        if self.is_expired() {
            return Err(BudgetError::DeadlineExceeded);
        }
        self.meter.charge(amount)
    }
}

impl std::fmt::Debug for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Budget")
            .field("remaining", &self.remaining())
            .field("spent", &self.spent())
            .field("deadline", &self.deadline)
            .finish()
    }
}
