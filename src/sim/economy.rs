//! Score economy: combo, multiplier, wave leveling and coin banking

use serde::Serialize;

use super::state::{GameEvent, GameState};
use super::timer::Timer;
use crate::consts::*;
use crate::persistence::{Progress, UpgradeKind};

/// Points for a score event: `max(1, base + floor(combo * 0.5))`,
/// doubled while the multiplier runs.
pub fn score_points(base: u64, combo: u32, multiplier: bool) -> u64 {
    let combo_bonus = (combo as f32 * COMBO_MULTIPLIER).floor() as u64;
    let points = (base + combo_bonus).max(1);
    if multiplier { points * MULTIPLIER_BONUS } else { points }
}

/// Per-run score state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEconomy {
    pub score: u64,
    pub wave: u32,
    pub combo: u32,
    pub combo_timer: Timer,
    /// Coins credited during this run (after doubling)
    pub coins_earned: u64,
}

impl Default for ScoreEconomy {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreEconomy {
    pub fn new() -> Self {
        Self {
            score: 0,
            wave: 1,
            combo: 0,
            combo_timer: Timer::new(COMBO_TIMEOUT_TICKS),
            coins_earned: 0,
        }
    }

    /// Add points through the combo formula. Returns the points gained and
    /// whether the wave advanced.
    pub fn add_score(&mut self, base: u64, multiplier: bool) -> (u64, bool) {
        let points = score_points(base, self.combo, multiplier);
        self.score += points;
        (points, self.check_wave())
    }

    /// Flat award (boss rewards, minion kills, nuke payouts bypass the combo)
    pub fn award(&mut self, points: u64) -> bool {
        self.score += points;
        self.check_wave()
    }

    fn check_wave(&mut self) -> bool {
        if self.score >= u64::from(self.wave) * WAVE_SCORE_THRESHOLD {
            self.wave += 1;
            true
        } else {
            false
        }
    }

    /// Count a kill: bump the combo and restart its window
    pub fn bump_combo(&mut self) {
        self.combo += 1;
        self.combo_timer.reset();
    }

    /// Advance the combo window. Returns the lost combo when it timed out.
    pub fn update_combo(&mut self, nuke_active: bool) -> Option<u32> {
        self.combo_timer.update(1);
        if self.combo_timer.is_ready() && self.combo > 0 && !nuke_active {
            let lost = self.combo;
            self.combo = 0;
            return Some(lost);
        }
        None
    }

    pub fn reset_combo(&mut self) {
        self.combo = 0;
    }

    /// Credit a banked coin to persistent progress
    pub fn bank_coin(&mut self, value: u64, progress: &mut Progress) -> u64 {
        let credited = if progress.has(UpgradeKind::DoubleCoins) {
            value * 2
        } else {
            value
        };
        progress.add_coins(credited);
        self.coins_earned += credited;
        credited
    }
}

impl GameState {
    /// Score a kill-equivalent through the combo formula
    pub fn add_score(&mut self, base: u64) -> u64 {
        let multiplier = self.effects.multiplier.is_active();
        let (points, wave_up) = self.economy.add_score(base, multiplier);
        if wave_up {
            self.on_wave_up();
        }
        points
    }

    /// Laser kill: combo first, then score
    pub fn register_kill(&mut self) -> u64 {
        self.economy.bump_combo();
        self.meteors_destroyed += 1;
        self.add_score(1)
    }

    pub fn award(&mut self, points: u64) {
        if self.economy.award(points) {
            self.on_wave_up();
        }
    }

    fn on_wave_up(&mut self) {
        let wave = self.economy.wave;
        log::debug!("Wave {wave} reached at score {}", self.economy.score);
        self.emit(GameEvent::WaveReached(wave));
    }
}
