//! Power-up effect table and the run's timed effects

use serde::Serialize;

use super::entities::PowerUpKind;
use super::state::{GameEvent, GameState};
use super::timer::EffectTimer;
use crate::consts::*;
use crate::persistence::{Progress, UpgradeKind};
use crate::secs_to_ticks;

/// Timed effects that live on the run (the shield lives on the player)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimedEffect {
    SuperShot,
    SlowMotion,
    LaserBeam,
    Nuke,
    Multiplier,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActiveEffects {
    pub super_shot: EffectTimer,
    pub slow_motion: EffectTimer,
    pub laser_beam: EffectTimer,
    /// Spawn-free window after a nuke
    pub nuke: EffectTimer,
    pub multiplier: EffectTimer,
}

impl ActiveEffects {
    /// Tick every running effect. Returns the ones that ended this tick.
    pub fn update(&mut self) -> Vec<TimedEffect> {
        let mut expired = Vec::new();
        for (effect, timer) in [
            (TimedEffect::SuperShot, &mut self.super_shot),
            (TimedEffect::SlowMotion, &mut self.slow_motion),
            (TimedEffect::LaserBeam, &mut self.laser_beam),
            (TimedEffect::Nuke, &mut self.nuke),
            (TimedEffect::Multiplier, &mut self.multiplier),
        ] {
            if timer.update() {
                expired.push(effect);
            }
        }
        expired
    }

    /// Vertical scale applied to meteors
    pub fn meteor_time_scale(&self) -> f32 {
        if self.slow_motion.is_active() {
            SLOW_MOTION_FACTOR
        } else {
            1.0
        }
    }
}

/// Shop upgrade that extends a power-up, if any
pub fn upgrade_for(kind: PowerUpKind) -> Option<UpgradeKind> {
    match kind {
        PowerUpKind::SuperShot => Some(UpgradeKind::SuperPower),
        PowerUpKind::Shield => Some(UpgradeKind::Shield),
        PowerUpKind::SlowMotion => Some(UpgradeKind::SlowMotion),
        PowerUpKind::Laser => Some(UpgradeKind::Laser),
        PowerUpKind::Multiplier => Some(UpgradeKind::Multiplier),
        PowerUpKind::Heart | PowerUpKind::Nuke | PowerUpKind::ExtraLife => None,
    }
}

/// Extra ticks from upgrades: two seconds per level
pub fn upgrade_bonus_ticks(kind: PowerUpKind, progress: &Progress) -> u32 {
    upgrade_for(kind)
        .map(|upgrade| secs_to_ticks(u32::from(progress.level(upgrade)) * 2))
        .unwrap_or(0)
}

/// Total duration of a timed power-up, None for instant ones
pub fn effect_duration(kind: PowerUpKind, progress: &Progress) -> Option<u32> {
    let base = match kind {
        PowerUpKind::SuperShot => SUPER_SHOT_TICKS,
        PowerUpKind::Shield => SHIELD_TICKS,
        PowerUpKind::SlowMotion => SLOW_MOTION_TICKS,
        PowerUpKind::Laser => LASER_BEAM_TICKS,
        PowerUpKind::Multiplier => MULTIPLIER_TICKS,
        PowerUpKind::Nuke => return Some(NUKE_TICKS),
        PowerUpKind::Heart | PowerUpKind::ExtraLife => return None,
    };
    Some(base + upgrade_bonus_ticks(kind, progress))
}

impl GameState {
    /// Apply a collected power-up
    pub fn apply_power_up(&mut self, kind: PowerUpKind, progress: &Progress) {
        self.power_ups_collected += 1;
        let duration = effect_duration(kind, progress).unwrap_or(0);
        match kind {
            PowerUpKind::SuperShot => self.effects.super_shot.activate(duration),
            PowerUpKind::Heart => self.player.heal(),
            PowerUpKind::Shield => self.player.activate_shield(duration),
            PowerUpKind::SlowMotion => self.effects.slow_motion.activate(duration),
            PowerUpKind::Laser => self.effects.laser_beam.activate(duration),
            PowerUpKind::Nuke => self.activate_nuke(),
            PowerUpKind::ExtraLife => self.player.gain_extra_life(),
            PowerUpKind::Multiplier => self.effects.multiplier.activate(duration),
        }
        log::debug!("{} ({duration} ticks)", kind.notification());
        self.emit(GameEvent::PowerUpCollected(kind));
    }

    /// Clear every meteor on screen and open the spawn-free window
    pub fn activate_nuke(&mut self) {
        let destroyed = self.meteors.len();
        let centers: Vec<_> = self.meteors.iter().map(|m| m.center()).collect();
        for center in centers {
            self.explode(center, 5);
        }
        self.pools.meteors.release_all(self.meteors.drain(..));

        if destroyed > 0 {
            self.add_score(destroyed as u64 * 2);
        }
        self.add_screen_shake(SHAKE_NUKE);
        self.effects.nuke.activate(NUKE_TICKS);
        self.emit(GameEvent::NukeDetonated { destroyed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::{MeteorKind, MeteorSpawn};

    #[test]
    fn test_upgrade_bonus_extends_duration() {
        let mut progress = Progress::new();
        assert_eq!(effect_duration(PowerUpKind::Shield, &progress), Some(SHIELD_TICKS));
        progress.upgrade(UpgradeKind::Shield);
        progress.upgrade(UpgradeKind::Shield);
        assert_eq!(
            effect_duration(PowerUpKind::Shield, &progress),
            Some(SHIELD_TICKS + 4 * TICKS_PER_SECOND)
        );
        assert_eq!(effect_duration(PowerUpKind::Heart, &progress), None);
        assert_eq!(effect_duration(PowerUpKind::Nuke, &progress), Some(NUKE_TICKS));
    }

    #[test]
    fn test_effects_expire() {
        let mut effects = ActiveEffects::default();
        effects.laser_beam.activate(2);
        effects.slow_motion.activate(5);
        assert_eq!(effects.meteor_time_scale(), SLOW_MOTION_FACTOR);
        assert!(effects.update().is_empty());
        assert_eq!(effects.update(), vec![TimedEffect::LaserBeam]);
        assert!(effects.slow_motion.is_active());
    }

    #[test]
    fn test_nuke_clears_and_scores() {
        let mut state = GameState::new(5);
        for i in 0..4 {
            state.spawn_meteor(MeteorSpawn {
                x: i as f32 * 100.0,
                speed: 2.0,
                rotation_speed: 0.0,
                kind: MeteorKind::Normal,
            });
        }
        state.apply_power_up(PowerUpKind::Nuke, &Progress::new());
        assert!(state.meteors.is_empty());
        assert_eq!(state.economy.score, 8);
        assert!(state.effects.nuke.is_active());
        assert_eq!(state.screen_shake, SHAKE_NUKE);
        assert!(state.pools_balanced());
    }

    #[test]
    fn test_heart_and_extra_life_caps() {
        let mut state = GameState::new(5);
        let progress = Progress::new();
        state.apply_power_up(PowerUpKind::Heart, &progress);
        assert_eq!(state.player.lives, PLAYER_MAX_LIVES);
        state.apply_power_up(PowerUpKind::ExtraLife, &progress);
        assert_eq!(state.player.lives, PLAYER_MAX_LIVES + 1);
        assert_eq!(state.power_ups_collected, 2);
    }
}
