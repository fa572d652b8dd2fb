//! Transition scheduler - lets a scene finish its exit animation before the
//! scene is actually swapped.
//!
//! The scheduler is tick driven: the owner advances it with elapsed time from
//! its event loop and applies whatever effect comes back. Nothing runs on
//! another thread, so a fired effect can never race a teardown that already
//! called [`TransitionScheduler::cancel`].

/// A scheduled, single-fire delayed effect.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition<E> {
    /// Milliseconds left before the effect fires.
    pub remaining_ms: u32,
    /// The effect handed back to the owner when the delay elapses.
    pub effect: E,
}

/// Holds at most one pending effect.
#[derive(Debug)]
pub struct TransitionScheduler<E> {
    pending: Option<PendingTransition<E>>,
}

impl<E: std::fmt::Debug> TransitionScheduler<E> {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Schedule `effect` to fire once `after_ms` has elapsed.
    ///
    /// A previously pending effect is cancelled and returned; it will never
    /// fire. A delay of zero fires on the next tick.
    pub fn schedule(&mut self, after_ms: u32, effect: E) -> Option<E> {
        let replaced = self.pending.take().map(|p| {
            log::warn!(
                "Replacing pending transition {:?} ({}ms left) with {:?}",
                p.effect,
                p.remaining_ms,
                effect
            );
            p.effect
        });
        log::debug!("Scheduled {:?} in {}ms", effect, after_ms);
        self.pending = Some(PendingTransition {
            remaining_ms: after_ms,
            effect,
        });
        replaced
    }

    /// Drop the pending effect, if any, so it never fires.
    pub fn cancel(&mut self) -> Option<E> {
        let cancelled = self.pending.take().map(|p| p.effect);
        if let Some(ref effect) = cancelled {
            log::debug!("Cancelled pending transition {:?}", effect);
        }
        cancelled
    }

    /// Advance time by `delta_ms`. Returns the effect exactly once, on the
    /// tick where its delay runs out.
    pub fn tick(&mut self, delta_ms: u32) -> Option<E> {
        let pending = self.pending.as_mut()?;
        pending.remaining_ms = pending.remaining_ms.saturating_sub(delta_ms);
        if pending.remaining_ms == 0 {
            self.pending.take().map(|p| p.effect)
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Milliseconds until the pending effect fires.
    pub fn remaining_ms(&self) -> Option<u32> {
        self.pending.as_ref().map(|p| p.remaining_ms)
    }
}

impl<E: std::fmt::Debug> Default for TransitionScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Fx {
        A,
        B,
    }

    fn drain(scheduler: &mut TransitionScheduler<Fx>, total_ms: u32, step: u32) -> Vec<Fx> {
        let mut fired = Vec::new();
        let mut elapsed = 0;
        while elapsed < total_ms {
            if let Some(fx) = scheduler.tick(step) {
                fired.push(fx);
            }
            elapsed += step;
        }
        fired
    }

    #[test]
    fn test_fires_once_after_delay() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(100, Fx::A);

        assert_eq!(scheduler.tick(50), None);
        assert_eq!(scheduler.remaining_ms(), Some(50));
        assert_eq!(scheduler.tick(50), Some(Fx::A));
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.tick(1000), None);
    }

    #[test]
    fn test_overshooting_tick_still_fires_once() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(10, Fx::A);
        assert_eq!(drain(&mut scheduler, 500, 16), vec![Fx::A]);
    }

    #[test]
    fn test_zero_delay_fires_on_next_tick() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(0, Fx::A);
        assert!(scheduler.is_pending());
        assert_eq!(scheduler.tick(0), Some(Fx::A));
    }

    #[test]
    fn test_double_schedule_executes_exactly_once() {
        let mut scheduler = TransitionScheduler::new();
        assert_eq!(scheduler.schedule(100, Fx::A), None);
        assert_eq!(scheduler.schedule(100, Fx::B), Some(Fx::A));

        assert_eq!(drain(&mut scheduler, 1000, 10), vec![Fx::B]);
    }

    #[test]
    fn test_replacement_restarts_countdown() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(100, Fx::A);
        scheduler.tick(90);
        scheduler.schedule(100, Fx::A);
        assert_eq!(scheduler.tick(20), None);
        assert_eq!(scheduler.remaining_ms(), Some(80));
    }

    #[test]
    fn test_cancel_before_expiry_fires_nothing() {
        let mut scheduler = TransitionScheduler::new();
        scheduler.schedule(100, Fx::A);
        scheduler.tick(99);
        assert_eq!(scheduler.cancel(), Some(Fx::A));
        assert!(drain(&mut scheduler, 1000, 10).is_empty());
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let mut scheduler: TransitionScheduler<Fx> = TransitionScheduler::default();
        assert_eq!(scheduler.cancel(), None);
        assert_eq!(scheduler.tick(10), None);
    }
}
