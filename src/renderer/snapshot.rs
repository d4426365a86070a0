//! Read-only frame snapshot for the drawing backend
//!
//! Built once per frame from the game state and the player's settings. The
//! backend never sees `GameState` itself; everything it draws is copied here
//! with the display settings (shake, particle budget) already applied.

use glam::Vec2;
use serde::Serialize;

use crate::consts::*;
use crate::settings::Settings;
use crate::sim::{BossKind, EffectTimer, GamePhase, GameState, MeteorKind, PowerUpKind};

/// Maximum entities per kind handed to the backend
pub const MAX_METEORS: usize = 128;
pub const MAX_LASERS: usize = 128;
pub const MAX_POWER_UPS: usize = 16;
pub const MAX_COINS: usize = 64;
pub const MAX_PROJECTILES: usize = 64;

/// HUD numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub wave: u32,
    pub combo: u32,
    pub lives: u8,
    pub coins_earned: u64,
    pub meteors_destroyed: u32,
}

/// Remaining seconds for each running effect, 0 when inactive
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EffectBars {
    pub super_shot: f32,
    pub slow_motion: f32,
    pub laser_beam: f32,
    pub multiplier: f32,
    pub nuke: f32,
    pub shield: f32,
    pub post_boss_invincibility: f32,
}

fn secs_left(timer: &EffectTimer) -> f32 {
    timer.remaining() as f32 / TICKS_PER_SECOND as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShipData {
    pub pos: Vec2,
    pub size: Vec2,
    /// Invincibility frames: the ship blinks every 5 ticks
    pub visible: bool,
    pub shielded: bool,
    pub frozen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeteorData {
    pub pos: Vec2,
    pub rotation: f32,
    pub kind: MeteorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaserData {
    pub pos: Vec2,
    pub beam: bool,
    pub super_power: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerUpData {
    pub pos: Vec2,
    pub kind: PowerUpKind,
    pub sprite: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectileData {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParticleData {
    pub pos: Vec2,
    pub color: [u8; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BossData {
    pub kind: BossKind,
    pub name: &'static str,
    pub pos: Vec2,
    pub size: f32,
    /// 0..1 for the health bar
    pub health: f32,
    pub flashing: bool,
    pub minions: Vec<Vec2>,
}

/// Everything the backend needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub phase: GamePhase,
    pub hud: Hud,
    pub effects: EffectBars,
    pub player: ShipData,
    pub meteors: Vec<MeteorData>,
    pub lasers: Vec<LaserData>,
    pub power_ups: Vec<PowerUpData>,
    pub coins: Vec<Vec2>,
    pub projectiles: Vec<ProjectileData>,
    pub particles: Vec<ParticleData>,
    pub boss: Option<BossData>,
    /// 0..1 through the boss warning
    pub announcement: Option<f32>,
    /// 0..1 through the death sequence
    pub death: Option<f32>,
    /// Remaining shake ticks (0 when the player turned shake off)
    pub screen_shake: u32,
    pub show_fps: bool,
}

impl FrameSnapshot {
    pub fn capture(state: &GameState, settings: &Settings) -> Self {
        let player = &state.player;
        let invincible = player.invincibility.is_active();

        let screen_shake = if settings.effective_screen_shake() {
            state.screen_shake
        } else {
            0
        };
        let max_particles = settings.max_particles().min(MAX_PARTICLES);

        Self {
            tick: state.time_ticks,
            phase: state.phase,
            hud: Hud {
                score: state.economy.score,
                wave: state.economy.wave,
                combo: state.economy.combo,
                lives: player.lives,
                coins_earned: state.economy.coins_earned,
                meteors_destroyed: state.meteors_destroyed,
            },
            effects: EffectBars {
                super_shot: secs_left(&state.effects.super_shot),
                slow_motion: secs_left(&state.effects.slow_motion),
                laser_beam: secs_left(&state.effects.laser_beam),
                multiplier: secs_left(&state.effects.multiplier),
                nuke: secs_left(&state.effects.nuke),
                shield: secs_left(&player.shield),
                post_boss_invincibility: secs_left(&state.encounter.post_boss_invincibility),
            },
            player: ShipData {
                pos: player.pos,
                size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
                visible: state.phase != GamePhase::PlayerDeath
                    && !(invincible && (state.time_ticks / 5) % 2 == 1),
                shielded: player.has_shield(),
                frozen: player.slow.is_active(),
            },
            meteors: state
                .meteors
                .iter()
                .take(MAX_METEORS)
                .map(|m| MeteorData {
                    pos: m.pos,
                    rotation: m.rotation,
                    kind: m.kind,
                })
                .collect(),
            lasers: state
                .lasers
                .iter()
                .take(MAX_LASERS)
                .map(|l| LaserData {
                    pos: l.pos,
                    beam: l.is_laser_beam,
                    super_power: l.is_super_power,
                })
                .collect(),
            power_ups: state
                .power_ups
                .iter()
                .take(MAX_POWER_UPS)
                .map(|p| PowerUpData {
                    pos: p.pos,
                    kind: p.kind,
                    sprite: p.kind.visual(),
                })
                .collect(),
            coins: state.coins.iter().take(MAX_COINS).map(|c| c.pos).collect(),
            projectiles: state
                .boss_projectiles
                .iter()
                .take(MAX_PROJECTILES)
                .map(|p| ProjectileData {
                    pos: p.pos,
                    radius: p.radius,
                })
                .collect(),
            particles: state
                .particles
                .iter()
                .take(max_particles)
                .map(|p| ParticleData {
                    pos: p.pos,
                    color: p.color,
                })
                .collect(),
            boss: state.boss.as_ref().map(|b| BossData {
                kind: b.kind,
                name: b.kind.name(),
                pos: b.pos,
                size: b.size,
                health: b.health_fraction(),
                flashing: b.damage_flash > 0,
                minions: b.minions.iter().flatten().map(|m| m.pos).collect(),
            }),
            announcement: (state.phase == GamePhase::BossAnnouncement)
                .then(|| state.encounter.announcement.progress()),
            death: (state.phase == GamePhase::PlayerDeath).then(|| state.death_timer.progress()),
            screen_shake,
            show_fps: settings.show_fps,
        }
    }

    /// Serialize for an out-of-process backend
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
