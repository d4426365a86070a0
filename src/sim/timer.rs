//! Tick-based countdown timer
//!
//! Every spawner, cooldown and timed power-up is one of these.

use serde::{Deserialize, Serialize};

/// Counts elapsed ticks up to a target duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    elapsed: u32,
    duration: u32,
}

impl Timer {
    /// Create a timer that becomes ready after `duration` ticks
    pub fn new(duration: u32) -> Self {
        Self {
            elapsed: 0,
            duration,
        }
    }

    /// Restart with a new duration
    pub fn start(&mut self, duration: u32) {
        self.duration = duration;
        self.elapsed = 0;
    }

    /// Advance by `delta` ticks. Saturates at the duration, so updating a
    /// ready timer changes nothing until `reset`.
    pub fn update(&mut self, delta: u32) {
        if self.is_ready() {
            return;
        }
        self.elapsed = self.elapsed.saturating_add(delta).min(self.duration);
    }

    pub fn is_ready(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
    }

    /// Fraction of the duration elapsed, clamped to [0, 1]
    pub fn progress(&self) -> f32 {
        if self.duration == 0 {
            return 1.0;
        }
        (self.elapsed as f32 / self.duration as f32).clamp(0.0, 1.0)
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Ticks left before the timer is ready
    pub fn remaining(&self) -> u32 {
        self.duration - self.elapsed
    }

    /// Advance one tick and, if that made the timer ready, reset it.
    /// Returns true on the tick it fires (spawner pattern).
    pub fn tick_and_fire(&mut self) -> bool {
        self.update(1);
        if self.is_ready() {
            self.reset();
            true
        } else {
            false
        }
    }
}

/// A timer that only counts while an effect is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectTimer {
    timer: Option<Timer>,
}

impl EffectTimer {
    /// (Re)activate for `duration` ticks
    pub fn activate(&mut self, duration: u32) {
        self.timer = Some(Timer::new(duration));
    }

    pub fn deactivate(&mut self) {
        self.timer = None;
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Advance one tick; expires the effect when its timer is ready.
    /// Returns true on the tick the effect ends.
    pub fn update(&mut self) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        timer.update(1);
        if timer.is_ready() {
            self.timer = None;
            return true;
        }
        false
    }

    /// Progress of the running effect (0 when inactive)
    pub fn progress(&self) -> f32 {
        self.timer.map(|t| t.progress()).unwrap_or(0.0)
    }

    pub fn remaining(&self) -> u32 {
        self.timer.map(|t| t.remaining()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_timer_becomes_ready() {
        let mut timer = Timer::new(3);
        assert!(!timer.is_ready());
        timer.update(2);
        assert!(!timer.is_ready());
        timer.update(1);
        assert!(timer.is_ready());
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn test_update_after_ready_is_noop() {
        let mut timer = Timer::new(5);
        timer.update(5);
        timer.update(100);
        assert_eq!(timer.elapsed(), 5);
        timer.reset();
        assert_eq!(timer.elapsed(), 0);
        assert!(!timer.is_ready());
    }

    #[test]
    fn test_start_changes_duration() {
        let mut timer = Timer::new(10);
        timer.update(4);
        timer.start(20);
        assert_eq!(timer.elapsed(), 0);
        assert_eq!(timer.duration(), 20);
    }

    #[test]
    fn test_zero_duration_is_ready() {
        let timer = Timer::new(0);
        assert!(timer.is_ready());
        assert_eq!(timer.progress(), 1.0);
    }

    #[test]
    fn test_tick_and_fire_cycles() {
        let mut timer = Timer::new(3);
        let fired: Vec<bool> = (0..7).map(|_| timer.tick_and_fire()).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true, false]);
    }

    #[test]
    fn test_effect_timer_expires() {
        let mut effect = EffectTimer::default();
        assert!(!effect.is_active());
        effect.activate(2);
        assert!(effect.is_active());
        assert!(!effect.update());
        assert!(effect.update());
        assert!(!effect.is_active());
    }

    proptest! {
        #[test]
        fn progress_stays_in_unit_range(duration in 0u32..10_000, steps in proptest::collection::vec(0u32..500, 0..50)) {
            let mut timer = Timer::new(duration);
            for step in steps {
                timer.update(step);
                let p = timer.progress();
                prop_assert!((0.0..=1.0).contains(&p));
                prop_assert!(timer.elapsed() <= timer.duration());
            }
        }
    }
}
