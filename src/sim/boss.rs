//! Boss and minion entities
//!
//! A boss owns its minions as an ordered slot list. Killed minions leave a
//! `None` tombstone so slot indices stay stable for the rest of the fight.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{ProjectileSpawn, Rect};
use super::timer::Timer;
use crate::clamp_x;
use crate::consts::*;

/// Boss archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossKind {
    /// Slow, heavy, lots of health
    Tank,
    /// Fast and fragile, tracks the player
    Sniper,
    /// Double shot, extra minion
    Swarm,
}

/// Per-kind tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossStats {
    pub health: i32,
    pub speed: f32,
    pub shoot_cooldown: u32,
    pub size: f32,
    pub projectile_speed: f32,
    pub minion_count: usize,
}

impl BossKind {
    pub const ALL: [BossKind; 3] = [BossKind::Tank, BossKind::Sniper, BossKind::Swarm];

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    pub fn stats(&self) -> BossStats {
        match self {
            BossKind::Tank => BossStats {
                health: 150,
                speed: 2.0,
                shoot_cooldown: 60,
                size: 120.0,
                projectile_speed: 4.0,
                minion_count: MINION_COUNT,
            },
            BossKind::Sniper => BossStats {
                health: 80,
                speed: 4.8,
                shoot_cooldown: 36,
                size: 90.0,
                projectile_speed: 7.0,
                minion_count: MINION_COUNT,
            },
            BossKind::Swarm => BossStats {
                health: 100,
                speed: 5.25,
                shoot_cooldown: 72,
                size: 100.0,
                projectile_speed: 5.0,
                minion_count: SWARM_MINION_COUNT,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BossKind::Tank => "TANK",
            BossKind::Sniper => "SNIPER",
            BossKind::Swarm => "SWARM",
        }
    }
}

/// A small escort unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minion {
    /// Center
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: i32,
    /// -1 left, 1 right, 0 center
    pub side: f32,
    pub offset_x: f32,
    pub speed: f32,
    /// Ticks until the next shot
    pub shoot_cooldown: u32,
}

impl Minion {
    /// Minion for slot `index` of a boss at `boss_pos`
    pub fn new(boss_pos: Vec2, index: usize) -> Self {
        let (side, offset_x) = match index {
            0 => (-1.0, 60.0),
            1 => (1.0, 60.0),
            _ => (0.0, 0.0),
        };
        Self {
            pos: Vec2::new(boss_pos.x + side * offset_x, boss_pos.y),
            vel: Vec2::ZERO,
            health: MINION_HEALTH,
            side,
            offset_x,
            speed: 1.2,
            shoot_cooldown: 0,
        }
    }

    /// Follow the boss sideways, drift toward the player's height
    pub fn update(&mut self, boss_pos: Vec2, player: Vec2) {
        let target_x = boss_pos.x + self.side * self.offset_x;
        self.vel.x = (target_x - self.pos.x) * 0.15;

        let dy = player.y - self.pos.y;
        if dy > 0.0 && self.pos.y - boss_pos.y < 150.0 {
            self.vel.y = self.speed;
        } else if dy < -20.0 {
            self.vel.y = -self.speed * 0.8;
        } else {
            self.vel.y *= 0.9;
        }

        self.pos += self.vel;
        self.pos.x = clamp_x(self.pos.x, 20.0);
        self.pos.y = self.pos.y.max(boss_pos.y - 20.0);

        self.shoot_cooldown = self.shoot_cooldown.saturating_sub(1);
    }

    /// Fire if ready, restarting the cooldown
    pub fn try_shoot(&mut self) -> Option<ProjectileSpawn> {
        if self.shoot_cooldown > 0 {
            return None;
        }
        self.shoot_cooldown = MINION_SHOOT_COOLDOWN;
        Some(ProjectileSpawn {
            center: self.pos + Vec2::new(0.0, 10.0),
            speed: MINION_PROJECTILE_SPEED,
        })
    }

    /// Returns true when this hit killed the minion
    pub fn take_damage(&mut self, damage: i32) -> bool {
        self.health -= damage;
        self.health <= 0
    }

    pub fn collider(&self) -> Rect {
        Rect::centered(self.pos, Vec2::splat(MINION_RADIUS * 2.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub kind: BossKind,
    /// Center
    pub pos: Vec2,
    pub speed: f32,
    pub health: i32,
    pub max_health: i32,
    pub size: f32,
    pub shoot_timer: Timer,
    /// Movement pattern index in 0..4
    pub pattern: u8,
    pub pattern_time: f32,
    /// Sweep direction, -1 or 1
    pub direction: f32,
    /// Smoothed player x used by the tracking patterns
    pub tracking_x: f32,
    pub player_pos: Vec2,
    pub minions: Vec<Option<Minion>>,
    /// Sim tick the boss appeared on
    pub spawn_tick: u64,
    pub damage_flash: u32,
}

impl Boss {
    pub fn spawn(kind: BossKind, rng: &mut impl Rng, spawn_tick: u64) -> Self {
        let stats = kind.stats();
        let (start_x, direction) = if rng.random_bool(0.5) {
            (SCREEN_WIDTH / 4.0, 1.0)
        } else {
            (SCREEN_WIDTH * 3.0 / 4.0, -1.0)
        };
        let pos = Vec2::new(start_x, BOSS_SPAWN_Y);
        let minions = (0..stats.minion_count)
            .map(|i| Some(Minion::new(pos, i)))
            .collect();

        Self {
            kind,
            pos,
            speed: stats.speed,
            health: stats.health,
            max_health: stats.health,
            size: stats.size,
            shoot_timer: Timer::new(stats.shoot_cooldown),
            pattern: rng.random_range(0..4),
            pattern_time: 0.0,
            direction,
            tracking_x: start_x,
            player_pos: Vec2::ZERO,
            minions,
            spawn_tick,
            damage_flash: 0,
        }
    }

    /// Still descending into the arena
    pub fn is_descending(&self) -> bool {
        self.pos.y < BOSS_ENGAGE_Y
    }

    /// Advance movement, cooldowns and minions by one tick
    pub fn update(&mut self, player: Vec2) {
        self.player_pos = player;
        self.pattern_time += BOSS_PATTERN_STEP;
        self.damage_flash = self.damage_flash.saturating_sub(1);
        self.shoot_timer.update(1);

        if self.is_descending() {
            self.pos.y += self.speed;
        } else {
            match self.kind {
                BossKind::Tank => self.tank_movement(),
                BossKind::Sniper => self.sniper_movement(),
                BossKind::Swarm => self.swarm_movement(),
            }
            if self.pattern_time > BOSS_PATTERN_WINDOW {
                self.pattern = (self.pattern + 1) % 4;
                self.pattern_time = 0.0;
            }
        }
        self.pos.x = clamp_x(self.pos.x, BOSS_EDGE_MARGIN);

        let boss_pos = self.pos;
        for minion in self.minions.iter_mut().flatten() {
            minion.update(boss_pos, player);
        }
    }

    fn sweep(&mut self, step: f32) {
        self.pos.x += self.direction * step;
        if self.pos.x < BOSS_EDGE_MARGIN || self.pos.x > SCREEN_WIDTH - BOSS_EDGE_MARGIN {
            self.direction = -self.direction;
        }
    }

    fn arc(&mut self, radius: f32, frequency: f32, margin: f32) {
        let center = SCREEN_WIDTH / 2.0;
        let offset = (self.pattern_time * frequency).cos() * radius;
        self.pos.x = (center + offset).clamp(margin, SCREEN_WIDTH - margin);
    }

    fn track(&mut self, smoothing: f32, dead_zone: f32, step: f32) {
        self.tracking_x = self.tracking_x * (1.0 - smoothing) + self.player_pos.x * smoothing;
        if self.pos.x < self.tracking_x - dead_zone {
            self.pos.x += step;
        } else if self.pos.x > self.tracking_x + dead_zone {
            self.pos.x -= step;
        }
    }

    fn zigzag(&mut self, period: i32, step: f32) {
        if ((self.pattern_time * 10.0) as i32) % period < period / 2 {
            self.pos.x += step;
        } else {
            self.pos.x -= step;
        }
    }

    fn tank_movement(&mut self) {
        match self.pattern {
            0 => self.sweep(1.5),
            1 => self.sweep(2.0),
            2 => {
                self.pos.x += (self.pattern_time * 0.8).sin() * 1.5;
                self.sweep(2.5);
            }
            _ => self.zigzag(40, 2.5),
        }
    }

    fn sniper_movement(&mut self) {
        match self.pattern {
            0 => {
                self.pos.x += (self.pattern_time * 1.5).sin() * 1.5;
                self.sweep(3.0);
            }
            1 => self.sweep(5.0),
            2 => self.track(0.05, 5.0, 4.0),
            _ => self.arc(300.0, 0.8, 60.0),
        }
    }

    fn swarm_movement(&mut self) {
        match self.pattern {
            0 => {
                self.pos.x += (self.pattern_time * 0.9).sin();
                self.sweep(2.5);
            }
            1 => self.arc(280.0, 0.7, 70.0),
            2 => self.track(0.1, 10.0, 3.0),
            _ => self.zigzag(30, 4.0),
        }
    }

    /// Projectiles fired this tick by the boss and its minions
    pub fn fire(&mut self) -> Vec<ProjectileSpawn> {
        let mut shots: Vec<ProjectileSpawn> = self
            .minions
            .iter_mut()
            .flatten()
            .filter_map(Minion::try_shoot)
            .collect();

        if self.shoot_timer.is_ready() && !self.is_descending() {
            self.shoot_timer.reset();
            let speed = self.kind.stats().projectile_speed;
            let muzzle = self.pos + Vec2::new(0.0, BOSS_PROJECTILE_OFFSET_Y);
            match self.kind {
                BossKind::Swarm => {
                    for dx in [-BOSS_SWARM_PROJECTILE_OFFSET_X, BOSS_SWARM_PROJECTILE_OFFSET_X] {
                        shots.push(ProjectileSpawn {
                            center: muzzle + Vec2::new(dx, 0.0),
                            speed,
                        });
                    }
                }
                _ => shots.push(ProjectileSpawn { center: muzzle, speed }),
            }
        }
        shots
    }

    /// Apply laser damage. Returns true when health reached zero.
    pub fn take_damage(&mut self, damage: i32) -> bool {
        self.health -= damage;
        self.damage_flash = 10;
        self.is_defeated()
    }

    pub fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    /// Tombstone a minion slot. Out-of-range indices count as already gone.
    pub fn remove_minion(&mut self, index: usize) -> Option<Minion> {
        self.minions.get_mut(index).and_then(Option::take)
    }

    pub fn minion_mut(&mut self, index: usize) -> Option<&mut Minion> {
        self.minions.get_mut(index).and_then(Option::as_mut)
    }

    pub fn live_minions(&self) -> usize {
        self.minions.iter().flatten().count()
    }

    pub fn collider(&self) -> Rect {
        Rect::centered(self.pos, Vec2::splat(self.size))
    }

    pub fn health_fraction(&self) -> f32 {
        (self.health.max(0) as f32 / self.max_health.max(1) as f32).clamp(0.0, 1.0)
    }
}
