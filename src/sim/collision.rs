//! Collision resolution passes
//!
//! Each pass scans with removal masks and releases removed entities to
//! their pools in a single filtering step, so indices stay valid while a
//! pass runs.

use glam::Vec2;
use rand::Rng;

use super::entities::{Coin, DamageOutcome, Meteor, MeteorKind};
use super::pool::release_marked;
use super::state::{GameEvent, GameState};
use crate::consts::*;
use crate::distance_squared;
use crate::persistence::{Progress, UpgradeKind};

/// Summary of one laser × meteor pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaserPassReport {
    /// Meteors hit directly by lasers
    pub direct_kills: usize,
    /// Meteors caught in explosive splashes
    pub splash_kills: usize,
    pub lasers_spent: usize,
}

impl GameState {
    /// Lasers against meteors, including explosive splash
    pub fn resolve_laser_meteor(&mut self) -> LaserPassReport {
        let mut report = LaserPassReport::default();
        if self.lasers.is_empty() || self.meteors.is_empty() {
            return report;
        }
        let mut meteor_removed = vec![false; self.meteors.len()];
        let mut laser_removed = vec![false; self.lasers.len()];

        for li in 0..self.lasers.len() {
            let laser_box = self.lasers[li].collider();
            let beam = self.lasers[li].is_laser_beam;

            for mi in 0..self.meteors.len() {
                if meteor_removed[mi] || !laser_box.intersects(&self.meteors[mi].collider()) {
                    continue;
                }
                meteor_removed[mi] = true;
                report.direct_kills += 1;
                let (center, kind) = (self.meteors[mi].center(), self.meteors[mi].kind);
                // Splash victims score at the combo from before this kill
                if kind == MeteorKind::Explosive {
                    report.splash_kills += self.splash_marked(center, &mut meteor_removed);
                }
                self.register_kill();
                self.explode(center, PARTICLE_COUNT);
                self.emit(GameEvent::MeteorDestroyed { pos: center, kind });
                if !beam {
                    laser_removed[li] = true;
                    report.lasers_spent += 1;
                    break;
                }
            }
        }

        for (mi, removed) in meteor_removed.iter().enumerate() {
            if *removed {
                self.maybe_drop_coin(mi);
            }
        }
        release_marked(&mut self.meteors, &meteor_removed, &mut self.pools.meteors);
        release_marked(&mut self.lasers, &laser_removed, &mut self.pools.lasers);
        report
    }

    /// Mark and score every live meteor within the splash radius
    fn splash_marked(&mut self, center: Vec2, removed: &mut [bool]) -> usize {
        let radius_sq = METEOR_SPLASH_RADIUS * METEOR_SPLASH_RADIUS;
        let mut destroyed = 0;
        for i in 0..self.meteors.len() {
            if removed[i] {
                continue;
            }
            let other = self.meteors[i].center();
            if distance_squared(center, other) < radius_sq {
                removed[i] = true;
                destroyed += 1;
                self.meteors_destroyed += 1;
                self.add_score(1);
                self.explode(other, PARTICLE_COUNT);
            }
        }
        self.add_screen_shake(SHAKE_SPLASH);
        self.emit(GameEvent::SplashDetonated { pos: center, destroyed });
        destroyed
    }

    /// Splash around a detonation, releasing caught meteors immediately
    fn splash_direct(&mut self, center: Vec2) -> usize {
        let mut removed = vec![false; self.meteors.len()];
        let destroyed = self.splash_marked(center, &mut removed);
        release_marked(&mut self.meteors, &removed, &mut self.pools.meteors);
        destroyed
    }

    fn maybe_drop_coin(&mut self, meteor_index: usize) {
        if self.rng.random::<f32>() < COIN_DROP_CHANCE {
            let coin = Coin::from_meteor(&self.meteors[meteor_index]);
            self.coins.push(coin);
        }
    }

    /// Apply one hit to the player and its side effects
    pub fn damage_player(&mut self) -> DamageOutcome {
        let outcome = self.player.take_damage();
        match outcome {
            DamageOutcome::Absorbed => self.emit(GameEvent::DamageAbsorbed),
            DamageOutcome::Hurt => {
                self.economy.reset_combo();
                self.encounter.no_damage = false;
                self.add_screen_shake(SHAKE_HIT);
                self.emit(GameEvent::PlayerHit {
                    lives: self.player.lives,
                });
            }
            DamageOutcome::Killed => {
                self.economy.reset_combo();
                self.encounter.no_damage = false;
                self.emit(GameEvent::PlayerHit { lives: 0 });
                self.begin_player_death();
            }
        }
        outcome
    }

    /// First meteor touching the player. Returns true if it killed them.
    pub fn resolve_meteor_player(&mut self) -> bool {
        if self.encounter.post_boss_invincibility.is_active() {
            return false;
        }
        let player_box = self.player.collider();
        let Some(index) = self
            .meteors
            .iter()
            .position(|m| m.collider().intersects(&player_box))
        else {
            return false;
        };

        let meteor: Meteor = self.meteors.remove(index);
        let (center, kind) = (meteor.center(), meteor.kind);
        self.pools.meteors.release(meteor);
        self.explode(center, PARTICLE_COUNT);

        match kind {
            MeteorKind::Ice => {
                if self.player.apply_slow() {
                    self.emit(GameEvent::PlayerSlowed);
                } else {
                    self.emit(GameEvent::DamageAbsorbed);
                }
                false
            }
            MeteorKind::Explosive => {
                let outcome = self.damage_player();
                self.splash_direct(center);
                outcome == DamageOutcome::Killed
            }
            MeteorKind::Normal => self.damage_player() == DamageOutcome::Killed,
        }
    }

    /// First power-up touching the player gets applied
    pub fn resolve_power_up_pickup(&mut self, progress: &Progress) {
        let player_box = self.player.collider();
        let Some(index) = self
            .power_ups
            .iter()
            .position(|p| p.collider().intersects(&player_box))
        else {
            return;
        };
        let power_up = self.power_ups.remove(index);
        let kind = power_up.kind;
        self.pools.power_ups.release(power_up);
        self.apply_power_up(kind, progress);
    }

    /// Coin pickup, magnet pull and banking of coins that reached the HUD
    pub fn resolve_coins(&mut self, progress: &mut Progress) {
        let player_box = self.player.collider();
        let player_center = player_box.center();
        let magnet = progress.has(UpgradeKind::CoinMagnet);
        let magnet_sq = COIN_MAGNET_RADIUS * COIN_MAGNET_RADIUS;
        let target = Vec2::new(COIN_TARGET_X, COIN_TARGET_Y);

        let mut picked = 0;
        for coin in self.coins.iter_mut().filter(|c| !c.collected) {
            let touching = coin.collider().intersects(&player_box);
            let pulled =
                magnet && distance_squared(coin.collider().center(), player_center) < magnet_sq;
            if touching || pulled {
                coin.collect(target);
                picked += 1;
            }
        }
        for _ in 0..picked {
            self.emit(GameEvent::CoinPickedUp);
        }

        let mut banked = Vec::new();
        self.coins.retain(|c| {
            if c.has_reached_target() {
                banked.push(c.value);
                false
            } else {
                true
            }
        });
        for value in banked {
            let credited = self.economy.bank_coin(value, progress);
            self.emit(GameEvent::CoinBanked { value: credited });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::{LaserSpawn, MeteorSpawn, PowerUpKind};
    use crate::sim::state::GamePhase;

    fn meteor_at(state: &mut GameState, pos: Vec2, kind: MeteorKind) {
        state.spawn_meteor(MeteorSpawn {
            x: 0.0,
            speed: 0.0,
            rotation_speed: 0.0,
            kind,
        });
        if let Some(m) = state.meteors.last_mut() {
            m.pos = pos;
        }
    }

    fn laser_at(state: &mut GameState, center: Vec2, beam: bool) {
        state.spawn_laser(LaserSpawn {
            center,
            super_power: false,
            beam,
        });
    }

    fn playing_state() -> GameState {
        let mut state = GameState::new(77);
        state.start_run(&Progress::new());
        state
    }

    #[test]
    fn test_laser_kills_meteor_and_is_spent() {
        let mut state = playing_state();
        meteor_at(&mut state, Vec2::new(100.0, 100.0), MeteorKind::Normal);
        laser_at(&mut state, Vec2::new(124.0, 124.0), false);

        let report = state.resolve_laser_meteor();
        assert_eq!(report.direct_kills, 1);
        assert_eq!(report.lasers_spent, 1);
        assert!(state.meteors.is_empty());
        assert!(state.lasers.is_empty());
        assert_eq!(state.economy.combo, 1);
        assert_eq!(state.economy.score, 1);
        assert!(state.pools_balanced());
    }

    #[test]
    fn test_beam_pierces_multiple_meteors() {
        let mut state = playing_state();
        meteor_at(&mut state, Vec2::new(100.0, 100.0), MeteorKind::Normal);
        meteor_at(&mut state, Vec2::new(100.0, 110.0), MeteorKind::Normal);
        laser_at(&mut state, Vec2::new(124.0, 124.0), true);

        let report = state.resolve_laser_meteor();
        assert_eq!(report.direct_kills, 2);
        assert_eq!(state.lasers.len(), 1);
        assert!(state.meteors.is_empty());
    }

    #[test]
    fn test_explosive_splash_clears_cluster() {
        let mut state = playing_state();
        meteor_at(&mut state, Vec2::new(300.0, 300.0), MeteorKind::Explosive);
        meteor_at(&mut state, Vec2::new(340.0, 300.0), MeteorKind::Normal);
        meteor_at(&mut state, Vec2::new(300.0, 340.0), MeteorKind::Normal);
        meteor_at(&mut state, Vec2::new(270.0, 270.0), MeteorKind::Normal);
        // Far away, survives
        meteor_at(&mut state, Vec2::new(600.0, 100.0), MeteorKind::Normal);
        laser_at(&mut state, Vec2::new(324.0, 324.0), false);

        let score_before = state.economy.score;
        let report = state.resolve_laser_meteor();

        assert_eq!(report.direct_kills, 1);
        assert_eq!(report.splash_kills, 3);
        assert_eq!(state.meteors.len(), 1);
        assert_eq!(state.economy.score - score_before, 4);
        assert_eq!(state.screen_shake, SHAKE_SPLASH);
        assert!(state.pools_balanced());
    }

    #[test]
    fn test_splash_scores_before_combo_bump() {
        let mut state = playing_state();
        state.economy.combo = 3;
        meteor_at(&mut state, Vec2::new(300.0, 300.0), MeteorKind::Explosive);
        meteor_at(&mut state, Vec2::new(340.0, 300.0), MeteorKind::Normal);
        meteor_at(&mut state, Vec2::new(300.0, 340.0), MeteorKind::Normal);
        meteor_at(&mut state, Vec2::new(270.0, 270.0), MeteorKind::Normal);
        laser_at(&mut state, Vec2::new(324.0, 324.0), false);

        state.resolve_laser_meteor();
        // Three splash kills at combo 3 (2 each), then the direct kill at combo 4 (3)
        assert_eq!(state.economy.score, 9);
        assert_eq!(state.economy.combo, 4);
        assert_eq!(state.meteors_destroyed, 4);
    }

    #[test]
    fn test_shield_absorbs_meteor() {
        let mut state = playing_state();
        state.player.activate_shield(SHIELD_TICKS);
        let pos = state.player.pos;
        meteor_at(&mut state, pos, MeteorKind::Normal);

        assert!(!state.resolve_meteor_player());
        assert_eq!(state.player.lives, PLAYER_MAX_LIVES);
        assert!(state.meteors.is_empty());
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.pools_balanced());
    }

    #[test]
    fn test_ice_meteor_slows_without_damage() {
        let mut state = playing_state();
        let pos = state.player.pos;
        meteor_at(&mut state, pos, MeteorKind::Ice);

        assert!(!state.resolve_meteor_player());
        assert_eq!(state.player.lives, PLAYER_MAX_LIVES);
        assert!(state.player.slow.is_active());
        assert!(state.meteors.is_empty());
    }

    #[test]
    fn test_normal_meteor_hurts_and_resets_combo() {
        let mut state = playing_state();
        state.economy.combo = 4;
        let pos = state.player.pos;
        meteor_at(&mut state, pos, MeteorKind::Normal);

        assert!(!state.resolve_meteor_player());
        assert_eq!(state.player.lives, PLAYER_MAX_LIVES - 1);
        assert_eq!(state.economy.combo, 0);
        assert_eq!(state.screen_shake, SHAKE_HIT);
    }

    #[test]
    fn test_lethal_meteor_starts_death_sequence() {
        let mut state = playing_state();
        state.player.lives = 1;
        let pos = state.player.pos;
        meteor_at(&mut state, pos, MeteorKind::Normal);

        assert!(state.resolve_meteor_player());
        assert_eq!(state.phase, GamePhase::PlayerDeath);
    }

    #[test]
    fn test_explosive_contact_splashes_neighbors() {
        let mut state = playing_state();
        let pos = state.player.pos;
        meteor_at(&mut state, pos, MeteorKind::Explosive);
        meteor_at(&mut state, pos + Vec2::new(30.0, -40.0), MeteorKind::Normal);
        meteor_at(&mut state, Vec2::new(10.0, 10.0), MeteorKind::Normal);

        state.resolve_meteor_player();
        assert_eq!(state.player.lives, PLAYER_MAX_LIVES - 1);
        assert_eq!(state.meteors.len(), 1);
        assert!(state.pools_balanced());
    }

    #[test]
    fn test_post_boss_invincibility_skips_meteors() {
        let mut state = playing_state();
        state.encounter.post_boss_invincibility.activate(10);
        let pos = state.player.pos;
        meteor_at(&mut state, pos, MeteorKind::Normal);

        assert!(!state.resolve_meteor_player());
        assert_eq!(state.meteors.len(), 1);
        assert_eq!(state.player.lives, PLAYER_MAX_LIVES);
    }

    #[test]
    fn test_power_up_pickup_applies_first_only() {
        let mut state = playing_state();
        state.spawn_power_up(PowerUpKind::Shield);
        state.spawn_power_up(PowerUpKind::Multiplier);
        let pos = state.player.pos;
        for p in state.power_ups.iter_mut() {
            p.pos = pos;
        }

        state.resolve_power_up_pickup(&Progress::new());
        assert!(state.player.has_shield());
        assert!(!state.effects.multiplier.is_active());
        assert_eq!(state.power_ups.len(), 1);
        assert!(state.pools_balanced());
    }

    #[test]
    fn test_coin_banks_exactly_once() {
        let mut state = playing_state();
        let mut progress = Progress::new();
        state.coins.push(Coin::new(state.player.pos, COIN_VALUE));

        state.resolve_coins(&mut progress);
        assert!(state.coins[0].collected);
        assert_eq!(progress.coins, 0);

        for _ in 0..600 {
            for coin in state.coins.iter_mut() {
                coin.update();
            }
            state.resolve_coins(&mut progress);
        }
        assert!(state.coins.is_empty());
        assert_eq!(progress.coins, 1);
        assert_eq!(state.economy.coins_earned, 1);
    }

    #[test]
    fn test_coin_magnet_pulls_nearby_coins() {
        let mut state = playing_state();
        let mut progress = Progress::new();
        progress.upgrade(UpgradeKind::CoinMagnet);
        let near = state.player.pos + Vec2::new(0.0, -100.0);
        state.coins.push(Coin::new(near, COIN_VALUE));
        state.coins.push(Coin::new(Vec2::new(5.0, 5.0), COIN_VALUE));

        state.resolve_coins(&mut progress);
        assert!(state.coins[0].collected);
        assert!(!state.coins[1].collected);
    }
}
