//! Sound cues for the audio backend
//!
//! Procedurally described sound effects - no external files needed! The sim
//! emits `GameEvent`s; this module maps them to cues, applies the volume
//! model from `Settings` and queues tone recipes for whatever backend plays
//! them.

use serde::Serialize;

use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, MeteorKind, PowerUpKind};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SoundEffect {
    /// Player fired
    Laser,
    /// Meteor destroyed
    Explosion,
    /// Explosive meteor splash or nuke
    BigExplosion,
    /// Ice meteor froze the player
    Freeze,
    /// Player lost a life
    PlayerHit,
    /// Shield soaked a hit
    ShieldBlock,
    /// Power-up collected
    PowerUp,
    /// Coin picked up
    Coin,
    /// New wave
    WaveUp,
    /// Boss incoming
    BossWarning,
    /// Laser hit the boss
    BossHit,
    /// Boss destroyed
    BossDefeated,
    /// Game over
    GameOver,
    /// New high score
    HighScore,
    /// Shop purchase went through
    Purchase,
    /// Menu navigation / rejected action
    UiBlip,
}

/// Oscillator shape for a tone recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
    /// White noise burst (frequencies drive the filter)
    Noise,
}

/// Exponential frequency sweep with a decaying gain envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tone {
    pub waveform: Waveform,
    pub start_hz: f32,
    pub end_hz: f32,
    pub duration_secs: f32,
    /// Peak gain before the volume model is applied
    pub gain: f32,
}

impl Tone {
    const fn new(waveform: Waveform, start_hz: f32, end_hz: f32, duration_secs: f32, gain: f32) -> Self {
        Self {
            waveform,
            start_hz,
            end_hz,
            duration_secs,
            gain,
        }
    }
}

use Waveform::*;

const LASER_TONES: &[Tone] = &[Tone::new(Square, 880.0, 220.0, 0.12, 0.25)];
const EXPLOSION_TONES: &[Tone] = &[Tone::new(Noise, 1200.0, 100.0, 0.3, 0.5)];
const BIG_EXPLOSION_TONES: &[Tone] = &[
    Tone::new(Noise, 800.0, 40.0, 0.6, 0.8),
    Tone::new(Sine, 90.0, 30.0, 0.5, 0.6),
];
const FREEZE_TONES: &[Tone] = &[Tone::new(Triangle, 1600.0, 2400.0, 0.25, 0.3)];
const PLAYER_HIT_TONES: &[Tone] = &[Tone::new(Sawtooth, 200.0, 60.0, 0.3, 0.6)];
const SHIELD_BLOCK_TONES: &[Tone] = &[Tone::new(Sine, 600.0, 900.0, 0.15, 0.35)];
const POWER_UP_TONES: &[Tone] = &[
    Tone::new(Sine, 523.0, 523.0, 0.08, 0.4),
    Tone::new(Sine, 659.0, 659.0, 0.08, 0.4),
    Tone::new(Sine, 784.0, 784.0, 0.12, 0.4),
];
const COIN_TONES: &[Tone] = &[
    Tone::new(Square, 988.0, 988.0, 0.05, 0.2),
    Tone::new(Square, 1319.0, 1319.0, 0.1, 0.2),
];
const WAVE_UP_TONES: &[Tone] = &[Tone::new(Triangle, 400.0, 800.0, 0.3, 0.4)];
const BOSS_WARNING_TONES: &[Tone] = &[
    Tone::new(Sawtooth, 110.0, 110.0, 0.4, 0.5),
    Tone::new(Sawtooth, 110.0, 110.0, 0.4, 0.5),
];
const BOSS_HIT_TONES: &[Tone] = &[Tone::new(Square, 150.0, 90.0, 0.08, 0.3)];
const BOSS_DEFEATED_TONES: &[Tone] = &[
    Tone::new(Noise, 1000.0, 30.0, 1.0, 0.9),
    Tone::new(Sine, 523.0, 1046.0, 0.6, 0.5),
];
const GAME_OVER_TONES: &[Tone] = &[
    Tone::new(Triangle, 392.0, 392.0, 0.25, 0.5),
    Tone::new(Triangle, 311.0, 311.0, 0.25, 0.5),
    Tone::new(Triangle, 262.0, 131.0, 0.6, 0.5),
];
const HIGH_SCORE_TONES: &[Tone] = &[
    Tone::new(Sine, 523.0, 523.0, 0.1, 0.4),
    Tone::new(Sine, 659.0, 659.0, 0.1, 0.4),
    Tone::new(Sine, 784.0, 784.0, 0.1, 0.4),
    Tone::new(Sine, 1046.0, 1046.0, 0.3, 0.4),
];
const PURCHASE_TONES: &[Tone] = &[Tone::new(Square, 660.0, 1320.0, 0.15, 0.3)];
const UI_BLIP_TONES: &[Tone] = &[Tone::new(Sine, 440.0, 440.0, 0.05, 0.2)];

impl SoundEffect {
    /// Tone recipe for this effect. Multi-note effects return a sequence.
    pub fn tones(&self) -> &'static [Tone] {
        match self {
            SoundEffect::Laser => LASER_TONES,
            SoundEffect::Explosion => EXPLOSION_TONES,
            SoundEffect::BigExplosion => BIG_EXPLOSION_TONES,
            SoundEffect::Freeze => FREEZE_TONES,
            SoundEffect::PlayerHit => PLAYER_HIT_TONES,
            SoundEffect::ShieldBlock => SHIELD_BLOCK_TONES,
            SoundEffect::PowerUp => POWER_UP_TONES,
            SoundEffect::Coin => COIN_TONES,
            SoundEffect::WaveUp => WAVE_UP_TONES,
            SoundEffect::BossWarning => BOSS_WARNING_TONES,
            SoundEffect::BossHit => BOSS_HIT_TONES,
            SoundEffect::BossDefeated => BOSS_DEFEATED_TONES,
            SoundEffect::GameOver => GAME_OVER_TONES,
            SoundEffect::HighScore => HIGH_SCORE_TONES,
            SoundEffect::Purchase => PURCHASE_TONES,
            SoundEffect::UiBlip => UI_BLIP_TONES,
        }
    }
}

/// Cue for a sim event, if it makes a sound
pub fn cue_for(event: &GameEvent) -> Option<SoundEffect> {
    let effect = match event {
        GameEvent::LaserFired { .. } => SoundEffect::Laser,
        GameEvent::MeteorDestroyed { kind, .. } => match kind {
            MeteorKind::Explosive => SoundEffect::BigExplosion,
            MeteorKind::Normal | MeteorKind::Ice => SoundEffect::Explosion,
        },
        GameEvent::SplashDetonated { .. } | GameEvent::NukeDetonated { .. } => {
            SoundEffect::BigExplosion
        }
        GameEvent::PlayerHit { .. } => SoundEffect::PlayerHit,
        GameEvent::DamageAbsorbed => SoundEffect::ShieldBlock,
        GameEvent::PlayerSlowed => SoundEffect::Freeze,
        // The nuke has its own detonation cue
        GameEvent::PowerUpCollected(PowerUpKind::Nuke) => return None,
        GameEvent::PowerUpCollected(_) => SoundEffect::PowerUp,
        GameEvent::CoinPickedUp => SoundEffect::Coin,
        GameEvent::WaveReached(_) => SoundEffect::WaveUp,
        GameEvent::BossWarning => SoundEffect::BossWarning,
        GameEvent::BossHit { .. } | GameEvent::MinionKilled => SoundEffect::BossHit,
        GameEvent::BossDefeated { .. } => SoundEffect::BossDefeated,
        GameEvent::PlayerDied { .. } => SoundEffect::GameOver,
        GameEvent::NewHighScore(_) => SoundEffect::HighScore,
        GameEvent::UpgradePurchased { .. } => SoundEffect::Purchase,
        GameEvent::PurchaseRejected { .. } => SoundEffect::UiBlip,
        GameEvent::PhaseChanged { to, .. } if to.is_overlay() || *to == GamePhase::Paused => {
            SoundEffect::UiBlip
        }
        GameEvent::PhaseChanged { .. }
        | GameEvent::BossSpawned(_)
        | GameEvent::CoinBanked { .. }
        | GameEvent::ComboBroken { .. }
        | GameEvent::LeaderboardEntry { .. }
        | GameEvent::SettingsApplied
        | GameEvent::PersistenceFailed { .. } => return None,
    };
    Some(effect)
}

/// A queued cue with its final volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cue {
    pub effect: SoundEffect,
    pub volume: f32,
}

/// Audio manager for the game
#[derive(Debug, Clone)]
pub struct AudioManager {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    queue: Vec<Cue>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl AudioManager {
    pub fn from_settings(settings: &Settings) -> Self {
        let mut manager = Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            queue: Vec::new(),
        };
        manager.apply_settings(settings);
        manager
    }

    /// Pick up new volume/mute values
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.set_sfx_volume(settings.sfx_volume);
        self.set_muted(settings.muted);
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Queue a sound effect. Silent effects are dropped.
    pub fn play(&mut self, effect: SoundEffect) {
        let volume = self.effective_volume();
        if volume <= 0.0 {
            return;
        }
        log::debug!("Cue {effect:?} at {volume:.2}");
        self.queue.push(Cue { effect, volume });
    }

    /// Queue the cues for a batch of sim events
    pub fn handle_events<'a>(&mut self, events: impl IntoIterator<Item = &'a GameEvent>) {
        for event in events {
            if let Some(effect) = cue_for(event) {
                self.play(effect);
            }
        }
    }

    /// Hand the queued cues to the backend
    pub fn drain(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BossKind;

    #[test]
    fn test_event_mapping() {
        assert_eq!(
            cue_for(&GameEvent::LaserFired { count: 3 }),
            Some(SoundEffect::Laser)
        );
        assert_eq!(
            cue_for(&GameEvent::PowerUpCollected(PowerUpKind::Shield)),
            Some(SoundEffect::PowerUp)
        );
        assert_eq!(cue_for(&GameEvent::PowerUpCollected(PowerUpKind::Nuke)), None);
        assert_eq!(
            cue_for(&GameEvent::BossDefeated {
                kind: BossKind::Tank,
                reward: 100,
                perfect: true
            }),
            Some(SoundEffect::BossDefeated)
        );
        assert_eq!(
            cue_for(&GameEvent::PhaseChanged {
                from: GamePhase::Playing,
                to: GamePhase::Paused
            }),
            Some(SoundEffect::UiBlip)
        );
        assert_eq!(
            cue_for(&GameEvent::PhaseChanged {
                from: GamePhase::Menu,
                to: GamePhase::Playing
            }),
            None
        );
    }

    #[test]
    fn test_volume_model() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.5,
            ..Settings::default()
        };
        let mut audio = AudioManager::from_settings(&settings);
        assert!((audio.effective_volume() - 0.25).abs() < 1e-6);

        audio.play(SoundEffect::Coin);
        let cues = audio.drain();
        assert_eq!(cues.len(), 1);
        assert!((cues[0].volume - 0.25).abs() < 1e-6);
        assert!(audio.drain().is_empty());
    }

    #[test]
    fn test_muted_queues_nothing() {
        let settings = Settings {
            muted: true,
            ..Settings::default()
        };
        let mut audio = AudioManager::from_settings(&settings);
        assert_eq!(audio.effective_volume(), 0.0);
        audio.handle_events(&[GameEvent::LaserFired { count: 1 }, GameEvent::CoinPickedUp]);
        assert!(audio.drain().is_empty());
    }

    #[test]
    fn test_every_effect_has_a_recipe() {
        let all = [
            SoundEffect::Laser,
            SoundEffect::Explosion,
            SoundEffect::BigExplosion,
            SoundEffect::Freeze,
            SoundEffect::PlayerHit,
            SoundEffect::ShieldBlock,
            SoundEffect::PowerUp,
            SoundEffect::Coin,
            SoundEffect::WaveUp,
            SoundEffect::BossWarning,
            SoundEffect::BossHit,
            SoundEffect::BossDefeated,
            SoundEffect::GameOver,
            SoundEffect::HighScore,
            SoundEffect::Purchase,
            SoundEffect::UiBlip,
        ];
        for effect in all {
            let tones = effect.tones();
            assert!(!tones.is_empty(), "{effect:?}");
            assert!(tones.iter().all(|t| t.duration_secs > 0.0 && t.gain <= 1.0));
        }
    }
}
