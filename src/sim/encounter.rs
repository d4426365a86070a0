//! Boss encounter flow: warning, spawn, fight collisions and defeat

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::boss::{Boss, BossKind};
use super::entities::{Coin, DamageOutcome, PowerUpKind};
use super::pool::release_marked;
use super::state::{GameEvent, GamePhase, GameState};
use super::timer::{EffectTimer, Timer};
use crate::consts::*;

/// Encounter bookkeeping that outlives a single boss
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encounter {
    /// Set when the warning fires, cleared on defeat
    pub warning_shown: bool,
    pub announcement: Timer,
    /// Running while a fresh boss is not allowed
    pub cooldown: EffectTimer,
    /// Meteors pass through the player while active
    pub post_boss_invincibility: EffectTimer,
    /// No damage actually applied during the current fight
    pub no_damage: bool,
    pub bosses_defeated: u32,
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Encounter {
    pub fn new() -> Self {
        Self {
            warning_shown: false,
            announcement: Timer::new(BOSS_ANNOUNCEMENT_TICKS),
            cooldown: EffectTimer::default(),
            post_boss_invincibility: EffectTimer::default(),
            no_damage: true,
            bosses_defeated: 0,
        }
    }

    pub fn update_timers(&mut self) {
        self.cooldown.update();
        self.post_boss_invincibility.update();
    }
}

/// Reward for a defeat after `fight_ticks`: base plus two points per
/// second under the bonus window
pub fn boss_reward(fight_ticks: u64) -> u64 {
    let window = BOSS_TIME_BONUS_WINDOW_SECS * u64::from(TICKS_PER_SECOND);
    let bonus = if fight_ticks < window {
        (window - fight_ticks) * 2 / u64::from(TICKS_PER_SECOND)
    } else {
        0
    };
    BOSS_REWARD + bonus
}

impl GameState {
    /// Boss trigger: warn and enter the announcement
    pub fn trigger_boss_warning(&mut self) {
        self.encounter.warning_shown = true;
        self.encounter.announcement.reset();
        self.add_screen_shake(SHAKE_BOSS_WARNING);
        self.emit(GameEvent::BossWarning);
        self.set_phase(GamePhase::BossAnnouncement);
    }

    /// Announcement over: the boss arrives
    pub fn spawn_boss(&mut self) {
        let kind = BossKind::random(&mut self.rng);
        let boss = Boss::spawn(kind, &mut self.rng, self.time_ticks);
        log::info!("Boss spawned: {} ({} hp)", kind.name(), boss.health);
        self.boss = Some(boss);
        self.encounter.no_damage = true;
        self.director.enter_boss_fight();
        self.emit(GameEvent::BossSpawned(kind));
        self.set_phase(GamePhase::BossFight);
    }

    /// Move the boss and its minions, spawn whatever they fire
    pub fn update_boss(&mut self) {
        let player = self.player.center();
        let shots = match self.boss.as_mut() {
            Some(boss) => {
                boss.update(player);
                boss.fire()
            }
            None => return,
        };
        for shot in shots {
            self.spawn_projectile(shot);
        }
    }

    /// Boss-fight collisions. Returns true if the player died.
    pub fn resolve_boss_collisions(&mut self) -> bool {
        if self.boss.is_none() {
            return false;
        }
        if self.resolve_lasers_vs_boss() {
            // Boss is gone, nothing left to hit the player with
            return false;
        }
        if self.resolve_projectiles_vs_player() {
            return true;
        }
        self.resolve_minions_vs_player()
    }

    /// Returns true when the boss was defeated
    fn resolve_lasers_vs_boss(&mut self) -> bool {
        let mut laser_removed = vec![false; self.lasers.len()];
        let mut defeated = false;

        for li in 0..self.lasers.len() {
            let laser_box = self.lasers[li].collider();
            let damage = self.lasers[li].damage;
            let beam = self.lasers[li].is_laser_beam;
            let Some(boss) = self.boss.as_mut() else {
                break;
            };

            if laser_box.intersects(&boss.collider()) {
                let dead = boss.take_damage(damage);
                let (pos, health) = (boss.pos, boss.health);
                self.explode(pos, 5);
                if !beam {
                    laser_removed[li] = true;
                }
                self.add_screen_shake(SHAKE_BOSS_HIT);
                self.emit(GameEvent::BossHit { health });
                if dead {
                    defeated = true;
                    break;
                }
                continue;
            }

            let hit = boss
                .minions
                .iter()
                .position(|m| m.as_ref().is_some_and(|m| laser_box.intersects(&m.collider())));
            let Some(index) = hit else {
                continue;
            };
            let Some(minion) = boss.minion_mut(index) else {
                continue;
            };
            let killed = minion.take_damage(damage);
            let pos = minion.pos;
            if killed {
                boss.remove_minion(index);
            }
            self.explode(pos, PARTICLE_COUNT / 2);
            if !beam {
                laser_removed[li] = true;
            }
            if killed {
                self.award(POINTS_PER_MINION_KILL);
                self.emit(GameEvent::MinionKilled);
            }
        }

        release_marked(&mut self.lasers, &laser_removed, &mut self.pools.lasers);
        if defeated {
            self.defeat_boss();
        }
        defeated
    }

    fn resolve_projectiles_vs_player(&mut self) -> bool {
        let player_box = self.player.collider();
        let Some(index) = self
            .boss_projectiles
            .iter()
            .position(|p| p.collider().intersects(&player_box))
        else {
            return false;
        };
        let projectile = self.boss_projectiles.remove(index);
        self.pools.projectiles.release(projectile);
        self.damage_player() == DamageOutcome::Killed
    }

    fn resolve_minions_vs_player(&mut self) -> bool {
        let player_box = self.player.collider();
        let Some(boss) = self.boss.as_mut() else {
            return false;
        };
        let hit = boss
            .minions
            .iter()
            .position(|m| m.as_ref().is_some_and(|m| m.collider().intersects(&player_box)));
        let Some(minion) = hit.and_then(|index| boss.remove_minion(index)) else {
            return false;
        };
        self.explode(minion.pos, PARTICLE_COUNT / 2);
        self.damage_player() == DamageOutcome::Killed
    }

    /// Pay out and tear down the encounter. Runs once per boss: the boss
    /// is taken out of the state before anything else happens.
    pub fn defeat_boss(&mut self) {
        let Some(boss) = self.boss.take() else {
            return;
        };
        let fight_ticks = self.time_ticks.saturating_sub(boss.spawn_tick);
        let reward = boss_reward(fight_ticks);
        let perfect = self.encounter.no_damage;

        self.explode(boss.pos, PARTICLE_COUNT * 3);
        self.award(reward);
        self.add_screen_shake(SHAKE_BOSS_DEFEAT);

        let drops = if perfect { 2 } else { 1 };
        for _ in 0..drops {
            let kind = PowerUpKind::BASIC[self.rng.random_range(0..PowerUpKind::BASIC.len())];
            self.spawn_power_up(kind);
        }
        let coin_pos = boss.pos - Vec2::splat(COIN_SIZE / 2.0);
        self.coins.push(Coin::new(coin_pos, BOSS_COIN_VALUE));

        self.pools.projectiles.release_all(self.boss_projectiles.drain(..));

        self.encounter.warning_shown = false;
        self.encounter.bosses_defeated += 1;
        self.encounter.cooldown.activate(BOSS_COOLDOWN_TICKS);
        self.encounter
            .post_boss_invincibility
            .activate(POST_BOSS_INVINCIBILITY_TICKS);
        self.director.leave_boss_fight();

        log::info!(
            "Boss {} defeated in {:.1}s: +{reward}{}",
            boss.kind.name(),
            fight_ticks as f32 / TICKS_PER_SECOND as f32,
            if perfect { " (perfect)" } else { "" }
        );
        self.emit(GameEvent::BossDefeated {
            kind: boss.kind,
            reward,
            perfect,
        });
        self.set_phase(GamePhase::Playing);
    }
}
