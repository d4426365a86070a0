//! Meteor Rush - A top-down arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, collisions, state machine, bosses)
//! - `persistence`: Save/load with integrity verification
//! - `highscores`: Top-10 leaderboard
//! - `settings`: Player preferences
//! - `audio`: Sound cue mapping for the audio backend
//! - `platform`: Input sources (autopilot, scripted)
//! - `renderer`: Read-only frame snapshots for the drawing backend

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use persistence::{Profile, Progress};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Playfield dimensions (y grows downward)
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 50.0;
    pub const PLAYER_HEIGHT: f32 = 38.0;
    pub const PLAYER_SPEED: f32 = 6.0;
    pub const PLAYER_SHOOT_COOLDOWN: u32 = 30;
    pub const PLAYER_MAX_LIVES: u8 = 3;
    pub const PLAYER_MAX_TOTAL_LIVES: u8 = 5;
    pub const INVINCIBILITY_TICKS: u32 = 2 * TICKS_PER_SECOND;

    /// Meteors
    pub const METEOR_SIZE: f32 = 48.0;
    pub const METEOR_MIN_SPEED: f32 = 2.0;
    pub const METEOR_MAX_SPEED: f32 = 13.0;
    pub const METEOR_ROTATION_MIN: f32 = -0.02;
    pub const METEOR_ROTATION_MAX: f32 = 0.02;
    pub const METEOR_SPAWN_TICKS: u32 = TICKS_PER_SECOND;
    pub const METEOR_ICE_CHANCE: f32 = 0.08;
    pub const METEOR_EXPLOSIVE_CHANCE: f32 = 0.06;
    pub const METEOR_EXPLOSIVE_SPEED: f32 = 3.5;
    pub const METEOR_SPLASH_RADIUS: f32 = 60.0;
    pub const ICE_SLOW_FACTOR: f32 = 0.5;
    pub const ICE_SLOW_TICKS: u32 = 3 * TICKS_PER_SECOND;

    /// Lasers
    pub const LASER_WIDTH: f32 = 10.0;
    pub const LASER_HEIGHT: f32 = 30.0;
    pub const LASER_SPEED: f32 = 7.0;
    pub const SUPER_LASER_SPEED: f32 = 12.0;

    /// Power-ups
    pub const POWERUP_SIZE: f32 = 32.0;
    pub const POWERUP_SPEED: f32 = 3.0;
    pub const POWERUP_SPAWN_TICKS: u32 = 20 * TICKS_PER_SECOND;
    pub const POWERUP_SPAWN_TICKS_BOSS: u32 = 8 * TICKS_PER_SECOND;
    pub const SUPER_SHOT_TICKS: u32 = 10 * TICKS_PER_SECOND;
    pub const SHIELD_TICKS: u32 = 10 * TICKS_PER_SECOND;
    pub const SLOW_MOTION_TICKS: u32 = 15 * TICKS_PER_SECOND;
    pub const SLOW_MOTION_FACTOR: f32 = 0.25;
    pub const LASER_BEAM_TICKS: u32 = 210; // 3.5 s
    pub const NUKE_TICKS: u32 = 5 * TICKS_PER_SECOND;
    pub const MULTIPLIER_TICKS: u32 = 20 * TICKS_PER_SECOND;
    pub const MULTIPLIER_BONUS: u64 = 2;
    pub const MIN_WAVE_FOR_HIGH_TIER: u32 = 5;

    /// Coins
    pub const COIN_SIZE: f32 = 20.0;
    pub const COIN_SPEED: f32 = 2.0;
    pub const COIN_HOMING_SPEED: f32 = 8.0;
    pub const COIN_VALUE: u64 = 1;
    pub const BOSS_COIN_VALUE: u64 = 10;
    pub const COIN_DROP_CHANCE: f32 = 0.20;
    pub const COIN_TARGET_X: f32 = 35.0;
    pub const COIN_TARGET_Y: f32 = 93.0;
    pub const COIN_MAGNET_RADIUS: f32 = 150.0;

    /// Particles
    pub const PARTICLE_LIFETIME: u32 = 30;
    pub const PARTICLE_COUNT: usize = 15;
    pub const PARTICLE_SPEED: f32 = 3.0;
    pub const MAX_PARTICLES: usize = 1024;

    /// Scoring
    pub const COMBO_TIMEOUT_TICKS: u32 = 3 * TICKS_PER_SECOND;
    pub const COMBO_MULTIPLIER: f32 = 0.5;
    pub const WAVE_SCORE_THRESHOLD: u64 = 50;
    pub const METEORS_PER_WAVE_OFFSET: u32 = 1;
    pub const WAVE_METEOR_INCREMENT: u32 = 5;
    pub const WAVE_SPEED_SCALING_START: u32 = 20;
    pub const WAVE_DIFFICULTY_FACTOR: f32 = 0.15;

    /// Screen shake durations (ticks)
    pub const SHAKE_HIT: u32 = 10;
    pub const SHAKE_SPLASH: u32 = 15;
    pub const SHAKE_NUKE: u32 = 20;
    pub const SHAKE_BOSS_HIT: u32 = 5;
    pub const SHAKE_BOSS_DEFEAT: u32 = 20;
    pub const SHAKE_BOSS_WARNING: u32 = 30;

    /// Death sequence
    pub const PLAYER_DEATH_TICKS: u32 = 90;
    pub const PLAYER_DEATH_EXPLOSION_COUNT: usize = 30;

    /// Bosses
    pub const BOSS_WAVE_INTERVAL: u32 = 5;
    pub const BOSS_SCORE_THRESHOLD: u64 = 250;
    pub const BOSS_SCORE_PROXIMITY: u64 = 10;
    pub const BOSS_REWARD: u64 = 100;
    pub const BOSS_TIME_BONUS_WINDOW_SECS: u64 = 30;
    pub const BOSS_COOLDOWN_TICKS: u32 = 60 * TICKS_PER_SECOND;
    pub const BOSS_ANNOUNCEMENT_TICKS: u32 = 120;
    pub const POST_BOSS_INVINCIBILITY_TICKS: u32 = 3 * TICKS_PER_SECOND;
    pub const BOSS_ENGAGE_Y: f32 = 100.0;
    pub const BOSS_SPAWN_Y: f32 = -100.0;
    pub const BOSS_EDGE_MARGIN: f32 = 50.0;
    pub const BOSS_PATTERN_STEP: f32 = 0.05;
    pub const BOSS_PATTERN_WINDOW: f32 = 100.0;
    pub const BOSS_PROJECTILE_OFFSET_Y: f32 = 40.0;
    pub const BOSS_SWARM_PROJECTILE_OFFSET_X: f32 = 30.0;
    pub const BOSS_PROJECTILE_RADIUS: f32 = 10.0;
    pub const MINION_PROJECTILE_SPEED: f32 = 5.0;
    pub const MINION_HEALTH: i32 = 8;
    pub const MINION_RADIUS: f32 = 15.0;
    pub const MINION_COUNT: usize = 2;
    pub const SWARM_MINION_COUNT: usize = 3;
    pub const MINION_SHOOT_COOLDOWN: u32 = 90;
    pub const POINTS_PER_MINION_KILL: u64 = 25;
}

/// Clamp a horizontal position into `[margin, SCREEN_WIDTH - margin]`
#[inline]
pub fn clamp_x(x: f32, margin: f32) -> f32 {
    x.clamp(margin, consts::SCREEN_WIDTH - margin)
}

/// Squared distance between two points (splash checks avoid the sqrt)
#[inline]
pub fn distance_squared(a: Vec2, b: Vec2) -> f32 {
    (a - b).length_squared()
}

/// Convert whole seconds to simulation ticks
#[inline]
pub fn secs_to_ticks(secs: u32) -> u32 {
    secs * consts::TICKS_PER_SECOND
}
