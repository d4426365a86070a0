//! Entity types: meteors, lasers, pickups, coins, projectiles, particles
//! and the player ship.
//!
//! Pooled entities implement [`Poolable`] with a total `reset`: every field
//! is rewritten from the spawn parameters, so a recycled instance is
//! indistinguishable from a fresh one.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pool::Poolable;
use super::timer::{EffectTimer, Timer};
use crate::consts::*;

/// Axis-aligned collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Rect of `size` centered on `center`
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size / 2.0,
            size,
        }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }

    /// Strict overlap test (touching edges do not intersect)
    pub fn intersects(&self, other: &Rect) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && a_max.x > other.min.x && self.min.y < b_max.y && a_max.y > other.min.y
    }
}

// === Meteors ===

/// Meteor variant, fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeteorKind {
    #[default]
    Normal,
    /// Slows the player on contact instead of hurting
    Ice,
    /// Destroys nearby meteors when it goes off
    Explosive,
}

impl MeteorKind {
    /// Roll a variant: 8% ice, 6% explosive
    pub fn roll(rng: &mut impl Rng) -> Self {
        let roll: f32 = rng.random();
        if roll < METEOR_ICE_CHANCE {
            MeteorKind::Ice
        } else if roll < METEOR_ICE_CHANCE + METEOR_EXPLOSIVE_CHANCE {
            MeteorKind::Explosive
        } else {
            MeteorKind::Normal
        }
    }
}

/// Everything needed to (re)initialize a meteor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeteorSpawn {
    pub x: f32,
    pub speed: f32,
    pub rotation_speed: f32,
    pub kind: MeteorKind,
}

impl MeteorSpawn {
    /// Draw a random meteor for the given wave speed multiplier
    pub fn random(rng: &mut impl Rng, speed_multiplier: f32) -> Self {
        let x = rng.random::<f32>() * SCREEN_WIDTH;
        let kind = MeteorKind::roll(rng);
        let base_speed = match kind {
            MeteorKind::Explosive => METEOR_EXPLOSIVE_SPEED,
            _ => METEOR_MIN_SPEED + rng.random::<f32>() * (METEOR_MAX_SPEED - METEOR_MIN_SPEED),
        };
        let rotation_speed =
            METEOR_ROTATION_MIN + rng.random::<f32>() * (METEOR_ROTATION_MAX - METEOR_ROTATION_MIN);
        Self {
            x,
            speed: base_speed * speed_multiplier,
            rotation_speed,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Meteor {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub kind: MeteorKind,
}

impl Poolable for Meteor {
    type Params = MeteorSpawn;

    fn reset(&mut self, spawn: MeteorSpawn) {
        self.pos = Vec2::new(spawn.x, -100.0);
        self.vel = Vec2::new(0.0, spawn.speed);
        self.rotation = 0.0;
        self.rotation_speed = spawn.rotation_speed;
        self.kind = spawn.kind;
    }
}

impl Meteor {
    /// Move one tick; `vertical_scale` < 1 while slow motion is active
    pub fn update(&mut self, vertical_scale: f32) {
        self.pos.x += self.vel.x;
        self.pos.y += self.vel.y * vertical_scale;
        self.rotation += self.rotation_speed;
    }

    pub fn collider(&self) -> Rect {
        Rect::new(self.pos, Vec2::splat(METEOR_SIZE))
    }

    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(METEOR_SIZE / 2.0)
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y > SCREEN_HEIGHT + 100.0
    }
}

// === Lasers ===

/// Where and how a laser is fired
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserSpawn {
    /// Muzzle point (laser is centered on it)
    pub center: Vec2,
    pub super_power: bool,
    pub beam: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Laser {
    /// Top-left corner
    pub pos: Vec2,
    pub speed: f32,
    pub damage: i32,
    pub is_super_power: bool,
    pub is_laser_beam: bool,
}

impl Poolable for Laser {
    type Params = LaserSpawn;

    fn reset(&mut self, spawn: LaserSpawn) {
        let (speed, damage) = if spawn.beam {
            (SUPER_LASER_SPEED, 3)
        } else if spawn.super_power {
            (SUPER_LASER_SPEED, 2)
        } else {
            (LASER_SPEED, 1)
        };
        self.pos = spawn.center - Vec2::new(LASER_WIDTH, LASER_HEIGHT) / 2.0;
        self.speed = speed;
        self.damage = damage;
        self.is_super_power = spawn.super_power;
        self.is_laser_beam = spawn.beam;
    }
}

impl Laser {
    pub fn update(&mut self) {
        self.pos.y -= self.speed;
    }

    pub fn collider(&self) -> Rect {
        Rect::new(self.pos, Vec2::new(LASER_WIDTH, LASER_HEIGHT))
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y < -100.0
    }
}

// === Power-ups ===

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerUpKind {
    #[default]
    SuperShot,
    Heart,
    Shield,
    SlowMotion,
    Laser,
    Nuke,
    ExtraLife,
    Multiplier,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 8] = [
        PowerUpKind::SuperShot,
        PowerUpKind::Heart,
        PowerUpKind::Shield,
        PowerUpKind::SlowMotion,
        PowerUpKind::Laser,
        PowerUpKind::Nuke,
        PowerUpKind::ExtraLife,
        PowerUpKind::Multiplier,
    ];

    /// The four basic drops
    pub const BASIC: [PowerUpKind; 4] = [
        PowerUpKind::SuperShot,
        PowerUpKind::Heart,
        PowerUpKind::Shield,
        PowerUpKind::SlowMotion,
    ];

    /// Sprite name for the drawing backend
    pub fn visual(&self) -> &'static str {
        match self {
            PowerUpKind::SuperShot => "powerup_star",
            PowerUpKind::Heart => "powerup_heart",
            PowerUpKind::Shield => "powerup_shield",
            PowerUpKind::SlowMotion => "powerup_clock",
            PowerUpKind::Laser => "powerup_laser",
            PowerUpKind::Nuke => "powerup_nuke",
            PowerUpKind::ExtraLife => "powerup_extra_life",
            PowerUpKind::Multiplier => "powerup_multiplier",
        }
    }

    /// HUD notification shown on pickup
    pub fn notification(&self) -> &'static str {
        match self {
            PowerUpKind::SuperShot => "SUPER POWER!",
            PowerUpKind::Heart => "+1 LIFE",
            PowerUpKind::Shield => "SHIELD ACTIVE",
            PowerUpKind::SlowMotion => "SLOW MOTION!",
            PowerUpKind::Laser => "LASER BEAM!",
            PowerUpKind::Nuke => "NUKE ACTIVATED!",
            PowerUpKind::ExtraLife => "EXTRA LIFE!",
            PowerUpKind::Multiplier => "SCORE x2!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerUpSpawn {
    pub x: f32,
    pub kind: PowerUpKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerUp {
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: PowerUpKind,
}

impl Poolable for PowerUp {
    type Params = PowerUpSpawn;

    fn reset(&mut self, spawn: PowerUpSpawn) {
        self.pos = Vec2::new(spawn.x, -100.0);
        self.vel = Vec2::new(0.0, POWERUP_SPEED);
        self.kind = spawn.kind;
    }
}

impl PowerUp {
    pub fn update(&mut self) {
        self.pos += self.vel;
    }

    pub fn collider(&self) -> Rect {
        Rect::new(self.pos, Vec2::splat(POWERUP_SIZE))
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y > SCREEN_HEIGHT + 100.0
    }
}

// === Coins ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Top-left corner
    pub pos: Vec2,
    pub value: u64,
    pub collected: bool,
    pub target: Vec2,
    /// Homing speed, grows every tick once collected
    pub speed: f32,
}

impl Coin {
    pub fn new(pos: Vec2, value: u64) -> Self {
        Self {
            pos,
            value,
            collected: false,
            target: Vec2::ZERO,
            speed: COIN_HOMING_SPEED,
        }
    }

    /// Coin dropped from the middle of a destroyed meteor
    pub fn from_meteor(meteor: &Meteor) -> Self {
        Self::new(meteor.center() - Vec2::splat(COIN_SIZE / 2.0), COIN_VALUE)
    }

    pub fn update(&mut self) {
        if !self.collected {
            self.pos.y += COIN_SPEED;
            return;
        }
        let delta = self.target - self.pos;
        let dist_sq = delta.length_squared();
        if dist_sq <= 1.0 {
            return;
        }
        // Step shrinks with distance, accelerates as speed grows
        let step = (1.0 / (dist_sq * 0.01)).max(0.01);
        let travel = delta * (self.speed * step).min(1.0);
        self.pos += travel;
        self.speed += 0.5;
    }

    /// Switch into homing mode toward `target`
    pub fn collect(&mut self, target: Vec2) {
        self.collected = true;
        self.target = target;
    }

    pub fn has_reached_target(&self) -> bool {
        self.collected && (self.target - self.pos).length_squared() < 100.0
    }

    pub fn collider(&self) -> Rect {
        Rect::new(self.pos, Vec2::splat(COIN_SIZE))
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y > SCREEN_HEIGHT + 50.0
    }
}

// === Boss projectiles ===

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    pub center: Vec2,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BossProjectile {
    /// Center
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Poolable for BossProjectile {
    type Params = ProjectileSpawn;

    fn reset(&mut self, spawn: ProjectileSpawn) {
        self.pos = spawn.center;
        self.vel = Vec2::new(0.0, spawn.speed);
        self.radius = BOSS_PROJECTILE_RADIUS;
    }
}

impl BossProjectile {
    pub fn update(&mut self) {
        self.pos += self.vel;
    }

    pub fn collider(&self) -> Rect {
        Rect::centered(self.pos, Vec2::splat(self.radius * 2.0))
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.y > SCREEN_HEIGHT + 50.0
            || self.pos.y < -50.0
            || self.pos.x < -50.0
            || self.pos.x > SCREEN_WIDTH + 50.0
    }
}

// === Particles ===

/// A cosmetic explosion fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// RGBA, alpha fades with remaining life
    pub color: [u8; 4],
    pub life: u32,
    pub max_life: u32,
}

impl Particle {
    pub fn new(pos: Vec2, rng: &mut impl Rng) -> Self {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let speed = rng.random::<f32>() * PARTICLE_SPEED;
        Self {
            pos,
            vel: Vec2::new(angle.cos(), angle.sin()) * speed,
            color: [
                rng.random_range(200..255),
                rng.random_range(100..200),
                rng.random_range(0..100),
                255,
            ],
            life: PARTICLE_LIFETIME,
            max_life: PARTICLE_LIFETIME,
        }
    }

    pub fn update(&mut self) {
        self.pos += self.vel;
        self.life = self.life.saturating_sub(1);
        let alpha = self.life as f32 / self.max_life.max(1) as f32;
        self.color[3] = (255.0 * alpha) as u8;
    }

    pub fn is_dead(&self) -> bool {
        self.life == 0
    }
}

// === Player ===

/// Result of a hit on the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Shield or invincibility soaked it up
    Absorbed,
    /// Lost a life, still alive
    Hurt,
    /// Lost the last life
    Killed,
}

/// Directional intents for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// The player's ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub lives: u8,
    pub shoot_cooldown: Timer,
    pub invincibility: EffectTimer,
    pub shield: EffectTimer,
    pub slow: EffectTimer,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(SCREEN_WIDTH / 2.0 - PLAYER_WIDTH / 2.0, SCREEN_HEIGHT - 170.0),
            lives: PLAYER_MAX_LIVES,
            shoot_cooldown: Timer::new(PLAYER_SHOOT_COOLDOWN),
            invincibility: EffectTimer::default(),
            shield: EffectTimer::default(),
            slow: EffectTimer::default(),
        }
    }

    /// Current movement speed (halved while frozen)
    pub fn speed(&self) -> f32 {
        if self.slow.is_active() {
            PLAYER_SPEED * ICE_SLOW_FACTOR
        } else {
            PLAYER_SPEED
        }
    }

    /// Apply movement intents and advance the fire cooldown
    pub fn update(&mut self, movement: Movement) {
        let speed = self.speed();
        if movement.left {
            self.pos.x -= speed;
        }
        if movement.right {
            self.pos.x += speed;
        }
        if movement.up {
            self.pos.y -= speed;
        }
        if movement.down {
            self.pos.y += speed;
        }
        self.pos.x = self.pos.x.clamp(0.0, SCREEN_WIDTH - PLAYER_WIDTH);
        self.pos.y = self.pos.y.clamp(0.0, SCREEN_HEIGHT - PLAYER_HEIGHT);

        self.shoot_cooldown.update(1);
    }

    /// Tick down status effects
    pub fn update_timers(&mut self) {
        self.invincibility.update();
        self.shield.update();
        self.slow.update();
    }

    /// Fire if the cooldown allows. Returns the lasers to spawn.
    pub fn shoot(&mut self, super_power: bool, beam: bool) -> Vec<LaserSpawn> {
        if !self.shoot_cooldown.is_ready() {
            return Vec::new();
        }
        self.shoot_cooldown.reset();

        let half_w = PLAYER_WIDTH / 2.0;
        let half_h = PLAYER_HEIGHT / 2.0;
        let mut shots = vec![LaserSpawn {
            center: Vec2::new(self.pos.x + half_w, self.pos.y - half_h / 2.0),
            super_power,
            beam,
        }];
        if super_power {
            shots.push(LaserSpawn {
                center: Vec2::new(self.pos.x - half_w, self.pos.y),
                super_power,
                beam,
            });
            shots.push(LaserSpawn {
                center: Vec2::new(self.pos.x + half_w * 3.0, self.pos.y),
                super_power,
                beam,
            });
        }
        shots
    }

    pub fn take_damage(&mut self) -> DamageOutcome {
        if self.shield.is_active() || self.invincibility.is_active() {
            return DamageOutcome::Absorbed;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            return DamageOutcome::Killed;
        }
        self.invincibility.activate(INVINCIBILITY_TICKS);
        DamageOutcome::Hurt
    }

    /// Freeze from an ice meteor. Returns false when the shield blocks it.
    pub fn apply_slow(&mut self) -> bool {
        if self.shield.is_active() {
            return false;
        }
        self.slow.activate(ICE_SLOW_TICKS);
        true
    }

    /// +1 life up to the normal cap
    pub fn heal(&mut self) {
        if self.lives < PLAYER_MAX_LIVES {
            self.lives += 1;
        }
    }

    /// +1 life up to the extended cap
    pub fn gain_extra_life(&mut self) {
        if self.lives < PLAYER_MAX_TOTAL_LIVES {
            self.lives += 1;
        }
    }

    pub fn activate_shield(&mut self, duration: u32) {
        self.shield.activate(duration);
    }

    pub fn has_shield(&self) -> bool {
        self.shield.is_active()
    }

    pub fn collider(&self) -> Rect {
        Rect::new(self.pos, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT))
    }

    pub fn center(&self) -> Vec2 {
        self.collider().center()
    }
}
