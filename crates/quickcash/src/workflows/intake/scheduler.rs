use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::step::WizardStep;

/// The single outstanding auto-advance request of a wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub generation: u64,
    pub step: WizardStep,
    pub deadline: Instant,
}

/// Debounced one-shot timer owned by one wizard.
///
/// Arming replaces whatever was pending, so at most one timer exists and it always
/// measures its quiet period from the latest arm. The timer is a deadline, not a spawned
/// task: dropping the scheduler leaves nothing running.
#[derive(Debug, Default)]
pub struct AutoAdvanceScheduler {
    pending: Option<PendingTimer>,
    generation: u64,
}

impl AutoAdvanceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, delay: Duration, step: WizardStep) -> PendingTimer {
        self.generation += 1;
        let timer = PendingTimer {
            generation: self.generation,
            step,
            deadline: Instant::now() + delay,
        };
        if let Some(replaced) = self.pending.replace(timer) {
            debug!(
                replaced = replaced.generation,
                generation = timer.generation,
                ?step,
                "auto-advance re-armed"
            );
        } else {
            debug!(generation = timer.generation, ?step, ?delay, "auto-advance armed");
        }
        timer
    }

    /// Clear the pending timer, if any. Safe to call repeatedly.
    pub fn cancel(&mut self) -> Option<PendingTimer> {
        let cancelled = self.pending.take();
        if let Some(timer) = cancelled {
            debug!(generation = timer.generation, step = ?timer.step, "auto-advance cancelled");
        }
        cancelled
    }

    pub fn pending(&self) -> Option<&PendingTimer> {
        self.pending.as_ref()
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Resolve when the pending timer reaches its deadline, consuming it.
    ///
    /// Never resolves while nothing is armed. Cancel-safe: dropping the future before
    /// the deadline leaves the timer pending.
    pub async fn fired(&mut self) -> PendingTimer {
        let Some(timer) = self.pending else {
            return std::future::pending().await;
        };

        tokio::time::sleep_until(timer.deadline).await;
        self.pending = None;
        debug!(generation = timer.generation, step = ?timer.step, "auto-advance fired");
        timer
    }
}
