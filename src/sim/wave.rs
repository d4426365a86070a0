//! Wave director: difficulty formulas and spawn timers
//!
//! Meteors arrive in batches on a fixed timer; the batch size grows every
//! five waves and speed starts scaling from wave 20.

use rand::Rng;

use super::entities::{MeteorSpawn, PowerUpKind};
use super::timer::Timer;
use crate::consts::*;

/// Meteors spawned per timer firing
pub fn meteors_per_wave(wave: u32) -> u32 {
    METEORS_PER_WAVE_OFFSET.max(METEORS_PER_WAVE_OFFSET + wave.saturating_sub(1) / WAVE_METEOR_INCREMENT)
}

/// Meteor speed scale for a wave
pub fn speed_multiplier(wave: u32) -> f32 {
    if wave < WAVE_SPEED_SCALING_START {
        1.0
    } else {
        1.0 + (wave - WAVE_SPEED_SCALING_START) as f32 * WAVE_DIFFICULTY_FACTOR
    }
}

/// Pick the power-up for a timed drop
pub fn choose_power_up(rng: &mut impl Rng, wave: u32, boss_fight: bool) -> PowerUpKind {
    let high_tier = wave >= MIN_WAVE_FOR_HIGH_TIER;

    if boss_fight {
        if high_tier && rng.random::<f32>() < 0.60 {
            return if rng.random::<f32>() < 0.5 {
                PowerUpKind::Nuke
            } else {
                PowerUpKind::Laser
            };
        }
        return PowerUpKind::BASIC[rng.random_range(0..PowerUpKind::BASIC.len())];
    }

    if high_tier && rng.random::<f32>() < 0.50 {
        return PowerUpKind::ExtraLife;
    }
    if high_tier && rng.random::<f32>() < 0.60 {
        let roll: f32 = rng.random();
        return if roll < 0.25 {
            PowerUpKind::Nuke
        } else if roll < 0.50 {
            PowerUpKind::Multiplier
        } else {
            PowerUpKind::Laser
        };
    }
    let roll: f32 = rng.random();
    if roll < 0.25 {
        PowerUpKind::Shield
    } else if roll < 0.50 {
        PowerUpKind::SlowMotion
    } else if roll < 0.75 {
        PowerUpKind::Multiplier
    } else {
        PowerUpKind::SuperShot
    }
}

/// Boss trigger check for the Playing phase
pub fn should_spawn_boss(
    wave: u32,
    score: u64,
    boss_active: bool,
    on_cooldown: bool,
    warning_shown: bool,
) -> bool {
    if boss_active || on_cooldown || warning_shown {
        return false;
    }
    let wave_trigger = wave > 0 && wave % BOSS_WAVE_INTERVAL == 0;
    let score_trigger =
        (BOSS_SCORE_THRESHOLD..BOSS_SCORE_THRESHOLD + BOSS_SCORE_PROXIMITY).contains(&score);
    wave_trigger || score_trigger
}

/// Spawn timers for meteors and power-ups
#[derive(Debug, Clone)]
pub struct WaveDirector {
    pub meteor_timer: Timer,
    pub power_up_timer: Timer,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    pub fn new() -> Self {
        Self {
            meteor_timer: Timer::new(METEOR_SPAWN_TICKS),
            power_up_timer: Timer::new(POWERUP_SPAWN_TICKS),
        }
    }

    /// Advance the meteor timer. Returns the batch to spawn when it fires,
    /// empty while a nuke window suppresses spawning.
    pub fn meteor_batch(&mut self, wave: u32, nuke_active: bool, rng: &mut impl Rng) -> Vec<MeteorSpawn> {
        if nuke_active {
            return Vec::new();
        }
        if !self.meteor_timer.tick_and_fire() {
            return Vec::new();
        }
        let multiplier = speed_multiplier(wave);
        (0..meteors_per_wave(wave))
            .map(|_| MeteorSpawn::random(rng, multiplier))
            .collect()
    }

    /// Advance the power-up timer. Returns the kind to drop when it fires.
    pub fn power_up_drop(&mut self, wave: u32, boss_fight: bool, rng: &mut impl Rng) -> Option<PowerUpKind> {
        if !self.power_up_timer.tick_and_fire() {
            return None;
        }
        Some(choose_power_up(rng, wave, boss_fight))
    }

    /// Shorter drop interval while a boss is up
    pub fn enter_boss_fight(&mut self) {
        self.power_up_timer.start(POWERUP_SPAWN_TICKS_BOSS);
    }

    pub fn leave_boss_fight(&mut self) {
        self.power_up_timer.start(POWERUP_SPAWN_TICKS);
    }
}
