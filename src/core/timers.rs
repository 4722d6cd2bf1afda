//! Cancellable scheduler for transient effects.
//!
//! Every controller owns one `EffectTimers` and drives it from the host's
//! event loop. Time is logical: it only moves when the host advances it, so
//! the same sequence of inputs and advances always produces the same
//! effects.
//!
//! `cancel_all` starts a new epoch. Tokens handed out before that can no
//! longer cancel or match anything, and nothing scheduled before it will
//! fire, which is what keeps a reset controller safe from callbacks that
//! belong to the previous item.

use std::time::Duration;

/// Handle to a scheduled effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    id: u64,
    epoch: u64,
}

#[derive(Debug, Clone)]
struct PendingEffect<E> {
    token: TimerToken,
    due: Duration,
    period: Option<Duration>,
    effect: E,
}

/// Deterministic one-shot and repeating timers.
#[derive(Debug, Clone)]
pub struct EffectTimers<E> {
    now: Duration,
    epoch: u64,
    next_id: u64,
    pending: Vec<PendingEffect<E>>,
}

impl<E> Default for EffectTimers<E> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            epoch: 0,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<E: Clone> EffectTimers<E> {
    /// Create an empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logical time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Current epoch; bumped by every `cancel_all`.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of effects waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Schedule a one-shot effect `delay` from now.
    pub fn schedule(&mut self, delay: Duration, effect: E) -> TimerToken {
        self.push(delay, None, effect)
    }

    /// Schedule an effect that fires every `period`, starting one period from now.
    pub fn schedule_repeating(&mut self, period: Duration, effect: E) -> TimerToken {
        // A zero period would fire forever within a single advance
        let period = period.max(Duration::from_millis(1));
        self.push(period, Some(period), effect)
    }

    fn push(&mut self, delay: Duration, period: Option<Duration>, effect: E) -> TimerToken {
        let token = TimerToken {
            id: self.next_id,
            epoch: self.epoch,
        };
        self.next_id += 1;
        self.pending.push(PendingEffect {
            token,
            due: self.now + delay,
            period,
            effect,
        });
        token
    }

    /// Check whether a token still refers to a pending effect.
    pub fn is_pending(&self, token: TimerToken) -> bool {
        token.epoch == self.epoch && self.pending.iter().any(|p| p.token == token)
    }

    /// Cancel one effect. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        if token.epoch != self.epoch {
            return false;
        }
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        self.pending.len() != before
    }

    /// Cancel every pending effect matching the predicate.
    pub fn cancel_matching(&mut self, mut predicate: impl FnMut(&E) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| !predicate(&p.effect));
        before - self.pending.len()
    }

    /// Cancel everything and start a new epoch.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.epoch += 1;
    }

    /// Fire the earliest effect due at or before `until`, moving the clock to its due time.
    ///
    /// Ties fire in scheduling order. Repeating effects are re-armed.
    pub fn fire_next(&mut self, until: Duration) -> Option<E> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= until)
            .min_by_key(|(_, p)| (p.due, p.token.id))
            .map(|(i, _)| i)?;

        let due = self.pending[index].due;
        if due > self.now {
            self.now = due;
        }

        match self.pending[index].period {
            Some(period) => {
                let entry = &mut self.pending[index];
                entry.due += period;
                Some(entry.effect.clone())
            }
            None => Some(self.pending.remove(index).effect),
        }
    }

    /// Move the clock forward to `until` without firing anything.
    pub fn advance_to(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }

    /// Advance the clock and collect every effect that came due, in order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<E> {
        let until = self.now + elapsed;
        let mut fired = Vec::new();
        while let Some(effect) = self.fire_next(until) {
            fired.push(effect);
        }
        self.advance_to(until);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Fx {
        Shake,
        Celebrate,
        Tick,
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_one_shot_fires_once_when_due() {
        let mut timers = EffectTimers::new();
        let token = timers.schedule(ms(500), Fx::Shake);

        assert!(timers.advance(ms(499)).is_empty());
        assert!(timers.is_pending(token));
        assert_eq!(timers.advance(ms(1)), vec![Fx::Shake]);
        assert!(!timers.is_pending(token));
        assert!(timers.advance(ms(1000)).is_empty());
        assert_eq!(timers.now(), ms(1500));
    }

    #[test]
    fn test_effects_fire_in_due_order() {
        let mut timers = EffectTimers::new();
        timers.schedule(ms(3000), Fx::Celebrate);
        timers.schedule(ms(500), Fx::Shake);

        assert_eq!(timers.advance(ms(5000)), vec![Fx::Shake, Fx::Celebrate]);
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let mut timers = EffectTimers::new();
        timers.schedule(ms(100), Fx::Celebrate);
        timers.schedule(ms(100), Fx::Shake);

        assert_eq!(timers.advance(ms(100)), vec![Fx::Celebrate, Fx::Shake]);
    }

    #[test]
    fn test_repeating_fires_each_period() {
        let mut timers = EffectTimers::new();
        timers.schedule_repeating(ms(1000), Fx::Tick);

        assert_eq!(timers.advance(ms(999)), Vec::<Fx>::new());
        assert_eq!(timers.advance(ms(1)), vec![Fx::Tick]);
        assert_eq!(timers.advance(ms(3000)), vec![Fx::Tick, Fx::Tick, Fx::Tick]);
        assert_eq!(timers.pending_count(), 1);
    }

    #[test]
    fn test_zero_period_is_bounded() {
        let mut timers = EffectTimers::new();
        timers.schedule_repeating(Duration::ZERO, Fx::Tick);

        assert_eq!(timers.advance(ms(3)).len(), 3);
    }

    #[test]
    fn test_cancel_single() {
        let mut timers = EffectTimers::new();
        let shake = timers.schedule(ms(500), Fx::Shake);
        timers.schedule(ms(500), Fx::Celebrate);

        assert!(timers.cancel(shake));
        assert!(!timers.cancel(shake));
        assert_eq!(timers.advance(ms(500)), vec![Fx::Celebrate]);
    }

    #[test]
    fn test_cancel_matching() {
        let mut timers = EffectTimers::new();
        timers.schedule(ms(100), Fx::Shake);
        timers.schedule(ms(200), Fx::Shake);
        timers.schedule(ms(300), Fx::Celebrate);

        assert_eq!(timers.cancel_matching(|e| *e == Fx::Shake), 2);
        assert_eq!(timers.advance(ms(1000)), vec![Fx::Celebrate]);
    }

    #[test]
    fn test_cancel_all_invalidates_old_tokens() {
        let mut timers = EffectTimers::new();
        let old = timers.schedule(ms(500), Fx::Shake);
        timers.cancel_all();
        assert_eq!(timers.epoch(), 1);

        let new = timers.schedule(ms(500), Fx::Celebrate);
        assert!(!timers.is_pending(old));
        assert!(!timers.cancel(old));
        assert!(timers.is_pending(new));
        assert_eq!(timers.advance(ms(500)), vec![Fx::Celebrate]);
    }

    #[test]
    fn test_fire_next_moves_clock_to_due_time() {
        let mut timers = EffectTimers::new();
        timers.schedule(ms(300), Fx::Shake);

        assert_eq!(timers.fire_next(ms(1000)), Some(Fx::Shake));
        assert_eq!(timers.now(), ms(300));

        // Scheduling from inside a callback is relative to the due time
        timers.schedule(ms(300), Fx::Celebrate);
        assert_eq!(timers.fire_next(ms(1000)), Some(Fx::Celebrate));
        assert_eq!(timers.now(), ms(600));

        timers.advance_to(ms(1000));
        assert_eq!(timers.now(), ms(1000));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn one_shots_fire_once_in_due_order(
                delays in prop::collection::vec(0u64..5_000, 1..20),
                steps in prop::collection::vec(0u64..1_500, 1..30),
            ) {
                let mut timers = EffectTimers::new();
                for (i, delay) in delays.iter().enumerate() {
                    timers.schedule(ms(*delay), i);
                }

                let mut fired = Vec::new();
                for step in &steps {
                    fired.extend(timers.advance(ms(*step)));
                }
                fired.extend(timers.advance(ms(5_000)));

                let mut expected: Vec<usize> = (0..delays.len()).collect();
                expected.sort_by_key(|&i| (delays[i], i));
                prop_assert_eq!(fired, expected);
                prop_assert_eq!(timers.pending_count(), 0);
            }

            #[test]
            fn cancel_all_drops_every_earlier_effect(
                before in prop::collection::vec(0u64..2_000, 1..10),
                after in prop::collection::vec(0u64..2_000, 0..10),
                elapsed in 0u64..1_000,
            ) {
                let mut timers = EffectTimers::new();
                let old: Vec<TimerToken> = before
                    .iter()
                    .map(|delay| timers.schedule(ms(*delay), usize::MAX))
                    .collect();
                let mut fired = timers.advance(ms(elapsed));
                fired.clear();

                timers.cancel_all();
                for (i, delay) in after.iter().enumerate() {
                    timers.schedule(ms(*delay), i);
                }

                for token in old {
                    prop_assert!(!timers.is_pending(token));
                    prop_assert!(!timers.cancel(token));
                }
                fired.extend(timers.advance(ms(2_000)));
                prop_assert!(fired.iter().all(|&e| e != usize::MAX));
                prop_assert_eq!(fired.len(), after.len());
            }
        }
    }
}
