//! Game state and core simulation types
//!
//! `GameState` is the entity registry: it owns every live entity, the pools
//! that recycle them, the spawn timers and the phase machine's bookkeeping.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::boss::{Boss, BossKind};
use super::economy::ScoreEconomy;
use super::effects::ActiveEffects;
use super::encounter::Encounter;
use super::entities::{
    BossProjectile, Coin, Laser, LaserSpawn, Meteor, MeteorKind, MeteorSpawn, Particle, Player,
    PowerUp, PowerUpKind, PowerUpSpawn, ProjectileSpawn,
};
use super::pool::{ObjectPool, PoolStats, release_where};
use super::timer::Timer;
use super::wave::WaveDirector;
use crate::consts::*;
use crate::persistence::{Progress, UpgradeKind};

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    /// Title screen
    Menu,
    /// Normal wave play
    Playing,
    /// Simulation frozen
    Paused,
    /// Boss warning, background keeps moving
    BossAnnouncement,
    /// Boss on screen
    BossFight,
    /// Explosion sequence after the last life
    PlayerDeath,
    /// Score made the leaderboard, waiting for a name
    WaitingNameInput,
    /// Run ended
    GameOver,
    /// Upgrade shop overlay
    Shop,
    /// Settings overlay
    Settings,
}

impl GamePhase {
    pub fn is_overlay(&self) -> bool {
        matches!(self, GamePhase::Shop | GamePhase::Settings)
    }

    /// Phases the pause toggle works in
    pub fn can_pause(&self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::BossFight)
    }
}

/// Something the outside world may want to react to (sound, HUD, saves)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    LaserFired { count: usize },
    MeteorDestroyed { pos: Vec2, kind: MeteorKind },
    SplashDetonated { pos: Vec2, destroyed: usize },
    PlayerHit { lives: u8 },
    DamageAbsorbed,
    PlayerSlowed,
    PowerUpCollected(PowerUpKind),
    NukeDetonated { destroyed: usize },
    CoinPickedUp,
    CoinBanked { value: u64 },
    WaveReached(u32),
    ComboBroken { combo: u32 },
    BossWarning,
    BossSpawned(BossKind),
    BossHit { health: i32 },
    MinionKilled,
    BossDefeated { kind: BossKind, reward: u64, perfect: bool },
    PlayerDied { score: u64 },
    NewHighScore(u64),
    LeaderboardEntry { rank: usize },
    UpgradePurchased { kind: UpgradeKind, level: u8 },
    PurchaseRejected { kind: UpgradeKind },
    SettingsApplied,
    PersistenceFailed { record: String, reason: String },
}

/// Pools for the high-churn entity types
#[derive(Debug, Default)]
pub struct Pools {
    pub meteors: ObjectPool<Meteor>,
    pub lasers: ObjectPool<Laser>,
    pub power_ups: ObjectPool<PowerUp>,
    pub projectiles: ObjectPool<BossProjectile>,
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Phase to resume when leaving Paused
    pub paused_from: Option<GamePhase>,
    /// Phases that opened the current overlays
    pub return_stack: Vec<GamePhase>,
    /// Simulation tick counter (advances only while the run simulates)
    pub time_ticks: u64,

    pub player: Player,
    pub meteors: Vec<Meteor>,
    pub lasers: Vec<Laser>,
    pub power_ups: Vec<PowerUp>,
    pub coins: Vec<Coin>,
    pub boss_projectiles: Vec<BossProjectile>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub pools: Pools,
    pub boss: Option<Boss>,

    pub director: WaveDirector,
    pub effects: ActiveEffects,
    pub economy: ScoreEconomy,
    pub encounter: Encounter,

    pub death_timer: Timer,
    /// Where the death explosions go off
    pub death_pos: Vec2,
    /// Remaining screen shake ticks
    pub screen_shake: u32,
    pub meteors_destroyed: u32,
    pub power_ups_collected: u32,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state on the title screen
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Menu,
            paused_from: None,
            return_stack: Vec::new(),
            time_ticks: 0,
            player: Player::new(),
            meteors: Vec::new(),
            lasers: Vec::new(),
            power_ups: Vec::new(),
            coins: Vec::new(),
            boss_projectiles: Vec::new(),
            particles: Vec::new(),
            pools: Pools::default(),
            boss: None,
            director: WaveDirector::new(),
            effects: ActiveEffects::default(),
            economy: ScoreEconomy::new(),
            encounter: Encounter::new(),
            death_timer: Timer::new(PLAYER_DEATH_TICKS),
            death_pos: Vec2::ZERO,
            screen_shake: 0,
            meteors_destroyed: 0,
            power_ups_collected: 0,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::info!("Phase {from:?} -> {to:?}");
        self.phase = to;
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    pub fn add_screen_shake(&mut self, ticks: u32) {
        self.screen_shake = ticks;
    }

    /// Burst of `count` particles at `pos`, capped at `MAX_PARTICLES`
    pub fn explode(&mut self, pos: Vec2, count: usize) {
        let room = MAX_PARTICLES.saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let particle = Particle::new(pos, &mut self.rng);
            self.particles.push(particle);
        }
    }

    // === Spawning ===

    pub fn spawn_meteor(&mut self, spawn: MeteorSpawn) {
        let meteor = self.pools.meteors.acquire(spawn);
        self.meteors.push(meteor);
    }

    pub fn spawn_laser(&mut self, spawn: LaserSpawn) {
        let laser = self.pools.lasers.acquire(spawn);
        self.lasers.push(laser);
    }

    /// Drop a power-up at a random x along the top edge
    pub fn spawn_power_up(&mut self, kind: PowerUpKind) {
        let x = self.rng.random::<f32>() * (SCREEN_WIDTH - POWERUP_SIZE);
        let power_up = self.pools.power_ups.acquire(PowerUpSpawn { x, kind });
        log::debug!("Spawned power-up {kind:?} at x={x:.0}");
        self.power_ups.push(power_up);
    }

    pub fn spawn_projectile(&mut self, spawn: ProjectileSpawn) {
        let projectile = self.pools.projectiles.acquire(spawn);
        self.boss_projectiles.push(projectile);
    }

    // === Lifecycle ===

    /// Return every pooled entity and drop the rest
    pub fn clear_entities(&mut self) {
        self.pools.meteors.release_all(self.meteors.drain(..));
        self.pools.lasers.release_all(self.lasers.drain(..));
        self.pools.power_ups.release_all(self.power_ups.drain(..));
        self.pools.projectiles.release_all(self.boss_projectiles.drain(..));
        self.coins.clear();
        self.particles.clear();
        self.boss = None;
    }

    /// Reset everything for a fresh run and enter Playing
    pub fn start_run(&mut self, progress: &Progress) {
        self.clear_entities();
        self.player = Player::new();
        self.director = WaveDirector::new();
        self.effects = ActiveEffects::default();
        self.economy = ScoreEconomy::new();
        self.encounter = Encounter::new();
        self.death_timer = Timer::new(PLAYER_DEATH_TICKS);
        self.screen_shake = 0;
        self.meteors_destroyed = 0;
        self.power_ups_collected = 0;
        self.paused_from = None;
        self.time_ticks = 0;

        if progress.has(UpgradeKind::StartBoost) {
            self.effects.super_shot.activate(SUPER_SHOT_TICKS);
            log::debug!("Start boost: SuperShot active");
        }
        log::info!("New run started (seed {})", self.seed);
        self.set_phase(GamePhase::Playing);
    }

    /// Release everything that left the playfield or expired
    pub fn prune(&mut self) {
        release_where(&mut self.meteors, &mut self.pools.meteors, Meteor::is_off_screen);
        release_where(&mut self.lasers, &mut self.pools.lasers, Laser::is_off_screen);
        release_where(&mut self.power_ups, &mut self.pools.power_ups, PowerUp::is_off_screen);
        release_where(
            &mut self.boss_projectiles,
            &mut self.pools.projectiles,
            BossProjectile::is_off_screen,
        );
        self.coins.retain(|c| c.collected || !c.is_off_screen());
        self.particles.retain(|p| !p.is_dead());
    }

    /// Pool counters for leak checks: (meteors, lasers, power-ups, projectiles)
    pub fn pool_stats(&self) -> [PoolStats; 4] {
        [
            self.pools.meteors.stats(),
            self.pools.lasers.stats(),
            self.pools.power_ups.stats(),
            self.pools.projectiles.stats(),
        ]
    }

    /// True when every pooled instance outside a pool is in a live collection
    pub fn pools_balanced(&self) -> bool {
        let live = [
            self.meteors.len(),
            self.lasers.len(),
            self.power_ups.len(),
            self.boss_projectiles.len(),
        ];
        self.pool_stats()
            .iter()
            .zip(live)
            .all(|(stats, len)| stats.outstanding() == len as u64)
    }

    pub fn boss_active(&self) -> bool {
        self.boss.is_some()
    }
}
