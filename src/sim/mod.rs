//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (insertion order of each collection)
//! - No rendering, audio or platform dependencies; persistence goes through
//!   the `Storage` handed in with the `TickContext`

pub mod boss;
pub mod collision;
pub mod economy;
pub mod effects;
pub mod encounter;
pub mod entities;
pub mod pool;
pub mod state;
pub mod tick;
pub mod timer;
pub mod wave;

pub use boss::{Boss, BossKind, Minion};
pub use collision::LaserPassReport;
pub use economy::{ScoreEconomy, score_points};
pub use effects::{ActiveEffects, TimedEffect};
pub use encounter::{Encounter, boss_reward};
pub use entities::{
    BossProjectile, Coin, DamageOutcome, Laser, Meteor, MeteorKind, Movement, Particle, Player,
    PowerUp, PowerUpKind, Rect,
};
pub use pool::{ObjectPool, PoolStats, Poolable};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickContext, TickInput, tick};
pub use timer::{EffectTimer, Timer};
pub use wave::WaveDirector;
