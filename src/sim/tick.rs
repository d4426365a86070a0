//! Fixed timestep simulation tick
//!
//! The phase machine: `tick` dispatches to the active phase's update routine.
//! Run phases advance the simulation in a fixed order: spawn, update,
//! collide, prune.

use super::entities::Movement;
use super::state::{GameEvent, GamePhase, GameState};
use super::timer::Timer;
use super::wave::should_spawn_boss;
use crate::consts::*;
use crate::highscores::{self, HighScores};
use crate::persistence::{self, PersistError, Profile, Storage, UpgradeKind};
use crate::settings::Settings;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub movement: Movement,
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start / resume / dismiss
    pub confirm: bool,
    /// Leave an overlay or skip the name prompt
    pub back: bool,
    pub restart: bool,
    pub quit: bool,
    pub open_shop: bool,
    pub open_settings: bool,
    /// Shop purchase request
    pub purchase: Option<UpgradeKind>,
    /// Replacement settings from the settings screen
    pub apply_settings: Option<Settings>,
    /// Submitted leaderboard name
    pub name: Option<String>,
}

/// Services the tick needs beyond the game state
pub struct TickContext<'a> {
    pub profile: &'a mut Profile,
    pub storage: &'a mut dyn Storage,
    /// Date stamp for leaderboard entries (YYYY-MM-DD)
    pub today: &'a str,
}

/// Advance the game by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    if input.pause && state.phase.can_pause() {
        pause(state);
        return;
    }
    match state.phase {
        GamePhase::Menu => update_menu(state, input, ctx),
        GamePhase::Playing => update_playing(state, input, ctx),
        GamePhase::BossAnnouncement => update_boss_announcement(state, input),
        GamePhase::BossFight => update_boss_fight(state, input, ctx),
        GamePhase::Paused => update_paused(state, input, ctx),
        GamePhase::PlayerDeath => update_player_death(state, ctx),
        GamePhase::WaitingNameInput => update_name_input(state, input, ctx),
        GamePhase::GameOver => update_game_over(state, input),
        GamePhase::Shop => update_shop(state, input, ctx),
        GamePhase::Settings => update_settings(state, input, ctx),
    }
}

// === Menus and overlays ===

fn update_menu(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    if input.open_shop {
        open_overlay(state, GamePhase::Shop);
    } else if input.open_settings {
        open_overlay(state, GamePhase::Settings);
    } else if input.confirm {
        state.start_run(&ctx.profile.progress);
    }
}

fn open_overlay(state: &mut GameState, overlay: GamePhase) {
    state.return_stack.push(state.phase);
    state.set_phase(overlay);
}

fn close_overlay(state: &mut GameState) {
    let to = state.return_stack.pop().unwrap_or(GamePhase::Menu);
    state.set_phase(to);
}

fn update_shop(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    if let Some(kind) = input.purchase {
        match ctx.profile.progress.purchase(kind) {
            Ok(level) => {
                log::info!("Purchased {} level {level}", kind.key());
                let result = persistence::save_progress(&mut *ctx.storage, &ctx.profile.progress);
                persist(state, persistence::PROGRESS_RECORD, result);
                state.emit(GameEvent::UpgradePurchased { kind, level });
            }
            Err(e) => {
                log::debug!("Purchase of {} rejected: {e:?}", kind.key());
                state.emit(GameEvent::PurchaseRejected { kind });
            }
        }
    }
    if input.back {
        close_overlay(state);
    }
}

fn update_settings(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    if let Some(settings) = &input.apply_settings {
        ctx.profile.settings = settings.clone().normalized();
        state.emit(GameEvent::SettingsApplied);
    }
    if input.back {
        let result = ctx.profile.settings.save(&mut *ctx.storage);
        persist(state, Settings::RECORD, result);
        close_overlay(state);
    }
}

fn update_paused(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    if input.pause || input.confirm {
        let to = state.paused_from.take().unwrap_or(GamePhase::Playing);
        state.set_phase(to);
    } else if input.restart {
        save_progress(state, ctx);
        state.start_run(&ctx.profile.progress);
    } else if input.quit {
        save_progress(state, ctx);
        state.clear_entities();
        state.paused_from = None;
        state.set_phase(GamePhase::Menu);
    } else if input.open_shop {
        open_overlay(state, GamePhase::Shop);
    } else if input.open_settings {
        open_overlay(state, GamePhase::Settings);
    }
}

fn update_game_over(state: &mut GameState, input: &TickInput) {
    if input.open_shop {
        open_overlay(state, GamePhase::Shop);
    } else if input.open_settings {
        open_overlay(state, GamePhase::Settings);
    } else if input.confirm {
        state.clear_entities();
        state.set_phase(GamePhase::Menu);
    }
}

fn update_name_input(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    if let Some(name) = &input.name {
        let score = state.economy.score;
        if let Some(rank) = ctx.profile.leaderboard.add_score(name, score, ctx.today) {
            log::info!("Leaderboard entry #{rank}: {name} ({score})");
            let result = ctx.profile.leaderboard.save(&mut *ctx.storage);
            persist(state, HighScores::RECORD, result);
            state.emit(GameEvent::LeaderboardEntry { rank });
        }
        state.set_phase(GamePhase::GameOver);
    } else if input.back {
        state.set_phase(GamePhase::GameOver);
    }
}

// === Run phases ===

fn pause(state: &mut GameState) {
    state.paused_from = Some(state.phase);
    state.set_phase(GamePhase::Paused);
}

fn update_playing(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    if should_spawn_boss(
        state.economy.wave,
        state.economy.score,
        state.boss_active(),
        state.encounter.cooldown.is_active(),
        state.encounter.warning_shown,
    ) {
        state.trigger_boss_warning();
        return;
    }

    state.time_ticks += 1;
    update_player(state, input);

    let wave = state.economy.wave;
    let batch = state
        .director
        .meteor_batch(wave, state.effects.nuke.is_active(), &mut state.rng);
    for spawn in batch {
        state.spawn_meteor(spawn);
    }
    if let Some(kind) = state.director.power_up_drop(wave, false, &mut state.rng) {
        state.spawn_power_up(kind);
    }

    update_timers(state);
    update_entities(state);

    if resolve_collisions(state, ctx) {
        return;
    }
    end_of_tick(state);
}

/// Background keeps moving while the warning plays; nothing collides
fn update_boss_announcement(state: &mut GameState, input: &TickInput) {
    state.time_ticks += 1;
    update_player(state, input);
    update_entities(state);
    state.prune();
    decay_screen_shake(state);

    state.encounter.announcement.update(1);
    if state.encounter.announcement.is_ready() {
        state.spawn_boss();
    }
}

fn update_boss_fight(state: &mut GameState, input: &TickInput, ctx: &mut TickContext<'_>) {
    state.time_ticks += 1;
    update_player(state, input);

    let wave = state.economy.wave;
    if let Some(kind) = state.director.power_up_drop(wave, true, &mut state.rng) {
        state.spawn_power_up(kind);
    }

    update_timers(state);
    state.update_boss();
    update_entities(state);

    if state.resolve_boss_collisions() {
        return;
    }
    if resolve_collisions(state, ctx) {
        return;
    }
    end_of_tick(state);
}

/// Only the explosion show runs until the sequence ends
fn update_player_death(state: &mut GameState, ctx: &mut TickContext<'_>) {
    state.time_ticks += 1;
    for particle in &mut state.particles {
        particle.update();
    }
    state.particles.retain(|p| !p.is_dead());
    decay_screen_shake(state);

    state.death_timer.update(1);
    if state.death_timer.elapsed() % 5 == 0 {
        let pos = state.death_pos;
        for _ in 0..3 {
            state.explode(pos, 5);
        }
    }
    if state.death_timer.is_ready() {
        finish_run(state, ctx);
    }
}

fn update_player(state: &mut GameState, input: &TickInput) {
    state.player.update(input.movement);
    if !input.fire {
        return;
    }
    let shots = state.player.shoot(
        state.effects.super_shot.is_active(),
        state.effects.laser_beam.is_active(),
    );
    if shots.is_empty() {
        return;
    }
    let count = shots.len();
    for shot in shots {
        state.spawn_laser(shot);
    }
    state.emit(GameEvent::LaserFired { count });
}

fn update_timers(state: &mut GameState) {
    for effect in state.effects.update() {
        log::debug!("{effect:?} expired");
    }
    if let Some(combo) = state.economy.update_combo(state.effects.nuke.is_active()) {
        state.emit(GameEvent::ComboBroken { combo });
    }
    state.encounter.update_timers();
}

fn update_entities(state: &mut GameState) {
    let scale = state.effects.meteor_time_scale();
    for meteor in &mut state.meteors {
        meteor.update(scale);
    }
    for laser in &mut state.lasers {
        laser.update();
    }
    for power_up in &mut state.power_ups {
        power_up.update();
    }
    for coin in &mut state.coins {
        coin.update();
    }
    for projectile in &mut state.boss_projectiles {
        projectile.update();
    }
    for particle in &mut state.particles {
        particle.update();
    }
}

/// Shared collision passes. Returns true if the player died.
fn resolve_collisions(state: &mut GameState, ctx: &mut TickContext<'_>) -> bool {
    state.resolve_laser_meteor();
    if state.resolve_meteor_player() {
        return true;
    }
    state.resolve_power_up_pickup(&ctx.profile.progress);
    state.resolve_coins(&mut ctx.profile.progress);
    false
}

fn end_of_tick(state: &mut GameState) {
    state.player.update_timers();
    state.prune();
    decay_screen_shake(state);
}

fn decay_screen_shake(state: &mut GameState) {
    state.screen_shake = state.screen_shake.saturating_sub(1);
}

// === Run end ===

impl GameState {
    /// Lethal hit: start the explosion sequence
    pub fn begin_player_death(&mut self) {
        self.death_pos = self.player.center();
        self.death_timer = Timer::new(PLAYER_DEATH_TICKS);
        self.explode(self.death_pos, PLAYER_DEATH_EXPLOSION_COUNT);
        self.add_screen_shake(SHAKE_BOSS_DEFEAT);

        let score = self.economy.score;
        log::info!(
            "Player died: score {score}, wave {}, {} meteors destroyed",
            self.economy.wave,
            self.meteors_destroyed
        );
        self.emit(GameEvent::PlayerDied { score });
        self.set_phase(GamePhase::PlayerDeath);
    }
}

/// Death sequence over: record the score and pick the next screen
fn finish_run(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let score = state.economy.score;
    if score > ctx.profile.high_score {
        ctx.profile.high_score = score;
        let result = highscores::save_high_score(&mut *ctx.storage, score);
        persist(state, highscores::HIGH_SCORE_RECORD, result);
        state.emit(GameEvent::NewHighScore(score));
    }
    save_progress(state, ctx);

    match ctx.profile.leaderboard.potential_rank(score) {
        Some(rank) => {
            log::info!("Score {score} makes the leaderboard at #{rank}");
            state.set_phase(GamePhase::WaitingNameInput);
        }
        None => state.set_phase(GamePhase::GameOver),
    }
}

fn save_progress(state: &mut GameState, ctx: &mut TickContext<'_>) {
    let result = persistence::save_progress(&mut *ctx.storage, &ctx.profile.progress);
    persist(state, persistence::PROGRESS_RECORD, result);
}

/// Failed writes are reported and the game carries on
fn persist(state: &mut GameState, record: &str, result: Result<(), PersistError>) {
    if let Err(e) = result {
        log::warn!("Failed to save '{record}': {e}");
        state.emit(GameEvent::PersistenceFailed {
            record: record.to_string(),
            reason: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{FileStorage, MemoryStorage};
    use crate::platform::{Autopilot, InputSource};
    use crate::sim::entities::{MeteorKind, MeteorSpawn};
    use std::io;

    struct Harness {
        profile: Profile,
        storage: MemoryStorage,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                profile: Profile::default(),
                storage: MemoryStorage::new(),
            }
        }

        fn tick(&mut self, state: &mut GameState, input: &TickInput) {
            let mut ctx = TickContext {
                profile: &mut self.profile,
                storage: &mut self.storage,
                today: "2026-01-01",
            };
            tick(state, input, &mut ctx);
        }

        fn idle(&mut self, state: &mut GameState, ticks: u32) {
            for _ in 0..ticks {
                self.tick(state, &TickInput::default());
            }
        }
    }

    fn press(f: impl FnOnce(&mut TickInput)) -> TickInput {
        let mut input = TickInput::default();
        f(&mut input);
        input
    }

    fn playing(seed: u64, harness: &mut Harness) -> GameState {
        let mut state = GameState::new(seed);
        harness.tick(&mut state, &press(|i| i.confirm = true));
        assert_eq!(state.phase, GamePhase::Playing);
        state
    }

    #[test]
    fn test_menu_confirm_starts_run() {
        let mut harness = Harness::new();
        let mut state = GameState::new(1);
        harness.idle(&mut state, 10);
        assert_eq!(state.phase, GamePhase::Menu);
        assert_eq!(state.time_ticks, 0);

        harness.tick(&mut state, &press(|i| i.confirm = true));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_first_meteor_batch_in_run() {
        let mut harness = Harness::new();
        let mut state = playing(2, &mut harness);
        harness.idle(&mut state, METEOR_SPAWN_TICKS - 1);
        assert!(state.meteors.is_empty());
        harness.idle(&mut state, 1);
        assert_eq!(state.meteors.len(), 1);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut harness = Harness::new();
        let mut state = playing(3, &mut harness);
        let fire = press(|i| i.fire = true);
        for _ in 0..150 {
            harness.tick(&mut state, &fire);
        }
        state.effects.slow_motion.activate(SLOW_MOTION_TICKS);

        harness.tick(&mut state, &press(|i| i.pause = true));
        assert_eq!(state.phase, GamePhase::Paused);

        let meteors = state.meteors.clone();
        let lasers = state.lasers.clone();
        let player = state.player.clone();
        let effects = state.effects.clone();
        let economy = state.economy.clone();
        let meteor_timer = state.director.meteor_timer;
        let time = state.time_ticks;

        for _ in 0..200 {
            harness.tick(&mut state, &fire);
        }
        assert_eq!(state.meteors, meteors);
        assert_eq!(state.lasers, lasers);
        assert_eq!(state.player, player);
        assert_eq!(state.effects, effects);
        assert_eq!(state.economy, economy);
        assert_eq!(state.director.meteor_timer, meteor_timer);
        assert_eq!(state.time_ticks, time);

        harness.tick(&mut state, &press(|i| i.pause = true));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_overlays_return_to_opener() {
        let mut harness = Harness::new();
        let mut state = GameState::new(4);
        let back = press(|i| i.back = true);

        harness.tick(&mut state, &press(|i| i.open_settings = true));
        assert_eq!(state.phase, GamePhase::Settings);
        harness.tick(&mut state, &back);
        assert_eq!(state.phase, GamePhase::Menu);

        harness.tick(&mut state, &press(|i| i.confirm = true));
        harness.tick(&mut state, &press(|i| i.pause = true));
        harness.tick(&mut state, &press(|i| i.open_shop = true));
        assert_eq!(state.phase, GamePhase::Shop);
        harness.tick(&mut state, &back);
        assert_eq!(state.phase, GamePhase::Paused);
        assert!(state.return_stack.is_empty());

        harness.tick(&mut state, &press(|i| i.confirm = true));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_quit_from_pause_saves_and_clears() {
        let mut harness = Harness::new();
        let mut state = playing(5, &mut harness);
        harness.idle(&mut state, 200);
        harness.profile.progress.add_coins(7);

        harness.tick(&mut state, &press(|i| i.pause = true));
        harness.tick(&mut state, &press(|i| i.quit = true));

        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.meteors.is_empty());
        assert!(state.pools_balanced());
        assert_eq!(persistence::load_progress(&harness.storage).coins, 7);
    }

    #[test]
    fn test_restart_from_pause_saves_and_starts_fresh() {
        let mut harness = Harness::new();
        let mut state = playing(12, &mut harness);
        let fire = press(|i| i.fire = true);
        for _ in 0..90 {
            harness.tick(&mut state, &fire);
        }
        state.economy.score = 35;
        harness.profile.progress.add_coins(4);

        harness.tick(&mut state, &press(|i| i.pause = true));
        assert_eq!(state.phase, GamePhase::Paused);
        harness.tick(&mut state, &press(|i| i.restart = true));

        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.economy.score, 0);
        assert!(state.meteors.is_empty());
        assert!(state.lasers.is_empty());
        assert!(state.paused_from.is_none());
        assert!(state.pools_balanced());
        assert_eq!(persistence::load_progress(&harness.storage).coins, 4);

        harness.idle(&mut state, 1);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_post_boss_invincibility_ignores_meteor_hits() {
        let mut harness = Harness::new();
        let mut state = playing(13, &mut harness);
        state.player.lives = 1;
        state.encounter.post_boss_invincibility.activate(30);
        let center = state.player.center();
        state.spawn_meteor(MeteorSpawn {
            x: center.x - METEOR_SIZE / 2.0,
            speed: 0.0,
            rotation_speed: 0.0,
            kind: MeteorKind::Normal,
        });
        state.meteors[0].pos.y = center.y - METEOR_SIZE / 2.0;

        harness.idle(&mut state, 29);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.lives, 1);
        assert_eq!(state.meteors.len(), 1);

        // Window over: the same meteor now lands
        harness.idle(&mut state, 1);
        assert_eq!(state.phase, GamePhase::PlayerDeath);
    }

    #[test]
    fn test_purchase_saves_over_unreadable_progress_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("progress.json"), [0xff, 0xfe, 0xfd]).unwrap();
        let mut profile = Profile::load(&storage);
        profile.progress.add_coins(30);

        let mut state = GameState::new(14);
        let mut ctx = TickContext {
            profile: &mut profile,
            storage: &mut storage,
            today: "2026-01-01",
        };
        tick(&mut state, &press(|i| i.open_shop = true), &mut ctx);
        tick(
            &mut state,
            &press(|i| i.purchase = Some(UpgradeKind::Shield)),
            &mut ctx,
        );

        let events = state.drain_events();
        assert!(!events.iter().any(|e| matches!(e, GameEvent::PersistenceFailed { .. })));
        assert_eq!(persistence::load_progress(&storage), profile.progress);
        assert_eq!(profile.progress.level(UpgradeKind::Shield), 1);
    }

    #[test]
    fn test_boss_cycle_from_wave_trigger() {
        let mut harness = Harness::new();
        let mut state = playing(6, &mut harness);
        state.economy.wave = BOSS_WAVE_INTERVAL;

        harness.idle(&mut state, 1);
        assert_eq!(state.phase, GamePhase::BossAnnouncement);
        harness.idle(&mut state, BOSS_ANNOUNCEMENT_TICKS - 1);
        assert_eq!(state.phase, GamePhase::BossAnnouncement);
        harness.idle(&mut state, 1);
        assert_eq!(state.phase, GamePhase::BossFight);
        assert!(state.boss_active());

        // Warning flag keeps the trigger from firing again
        harness.idle(&mut state, 5);
        assert_eq!(state.phase, GamePhase::BossFight);
    }

    #[test]
    fn test_lethal_hit_runs_death_sequence() {
        let mut harness = Harness::new();
        let mut state = playing(7, &mut harness);
        state.player.lives = 1;
        let center = state.player.center();
        state.spawn_meteor(MeteorSpawn {
            x: center.x - METEOR_SIZE / 2.0,
            speed: 0.0,
            rotation_speed: 0.0,
            kind: MeteorKind::Normal,
        });
        state.meteors[0].pos.y = center.y - METEOR_SIZE / 2.0;

        harness.idle(&mut state, 1);
        assert_eq!(state.phase, GamePhase::PlayerDeath);
        assert_eq!(state.screen_shake, SHAKE_BOSS_DEFEAT);
        assert!(state.particles.len() >= PLAYER_DEATH_EXPLOSION_COUNT);

        harness.idle(&mut state, PLAYER_DEATH_TICKS - 1);
        assert_eq!(state.phase, GamePhase::PlayerDeath);
        harness.idle(&mut state, 1);
        // Score 0 never makes the leaderboard
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_qualifying_score_asks_for_name() {
        let mut harness = Harness::new();
        let mut state = playing(8, &mut harness);
        state.economy.score = 120;
        state.begin_player_death();

        harness.idle(&mut state, PLAYER_DEATH_TICKS);
        assert_eq!(state.phase, GamePhase::WaitingNameInput);
        assert_eq!(harness.profile.high_score, 120);
        assert_eq!(highscores::load_high_score(&harness.storage), 120);
        assert!(state.drain_events().contains(&GameEvent::NewHighScore(120)));

        harness.tick(&mut state, &press(|i| i.name = Some("ACE".to_string())));
        assert_eq!(state.phase, GamePhase::GameOver);
        let saved = HighScores::load(&harness.storage);
        assert_eq!(saved.entries.len(), 1);
        assert_eq!(saved.entries[0].name, "ACE");
        assert_eq!(saved.entries[0].date, "2026-01-01");
        assert!(state.drain_events().contains(&GameEvent::LeaderboardEntry { rank: 1 }));

        harness.tick(&mut state, &press(|i| i.confirm = true));
        assert_eq!(state.phase, GamePhase::Menu);
    }

    #[test]
    fn test_shop_purchase_and_rejection() {
        let mut harness = Harness::new();
        let mut state = GameState::new(9);
        harness.profile.progress.add_coins(30);

        harness.tick(&mut state, &press(|i| i.open_shop = true));
        harness.tick(&mut state, &press(|i| i.purchase = Some(UpgradeKind::Shield)));
        assert_eq!(harness.profile.progress.level(UpgradeKind::Shield), 1);
        assert_eq!(harness.profile.progress.coins, 5);
        assert_eq!(persistence::load_progress(&harness.storage), harness.profile.progress);

        harness.tick(&mut state, &press(|i| i.purchase = Some(UpgradeKind::Shield)));
        assert_eq!(harness.profile.progress.level(UpgradeKind::Shield), 1);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::UpgradePurchased {
            kind: UpgradeKind::Shield,
            level: 1
        }));
        assert!(events.contains(&GameEvent::PurchaseRejected {
            kind: UpgradeKind::Shield
        }));
    }

    #[test]
    fn test_settings_apply_then_save_on_back() {
        let mut harness = Harness::new();
        let mut state = GameState::new(10);
        let wanted = Settings {
            muted: true,
            master_volume: 3.0,
            ..Settings::default()
        };

        harness.tick(&mut state, &press(|i| i.open_settings = true));
        harness.tick(&mut state, &press(|i| i.apply_settings = Some(wanted.clone())));
        assert!(harness.profile.settings.muted);
        assert_eq!(harness.profile.settings.master_volume, 1.0);
        assert!(harness.storage.read(Settings::RECORD).unwrap().is_none());

        harness.tick(&mut state, &press(|i| i.back = true));
        assert_eq!(Settings::load(&harness.storage), harness.profile.settings);
        assert_eq!(state.phase, GamePhase::Menu);
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn read(&self, _record: &str) -> Result<Option<String>, PersistError> {
            Ok(None)
        }

        fn write(&mut self, record: &str, _data: &str) -> Result<(), PersistError> {
            Err(PersistError::Io {
                record: record.to_string(),
                source: io::Error::other("disk full"),
            })
        }
    }

    #[test]
    fn test_failed_save_is_reported() {
        let mut profile = Profile::default();
        let mut storage = BrokenStorage;
        let mut state = GameState::new(11);
        let mut ctx = TickContext {
            profile: &mut profile,
            storage: &mut storage,
            today: "2026-01-01",
        };
        tick(&mut state, &press(|i| i.confirm = true), &mut ctx);
        state.economy.score = 10;
        state.begin_player_death();
        for _ in 0..PLAYER_DEATH_TICKS {
            tick(&mut state, &TickInput::default(), &mut ctx);
        }

        assert_eq!(state.phase, GamePhase::WaitingNameInput);
        let failures = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PersistenceFailed { .. }))
            .count();
        assert_eq!(failures, 2);
    }

    #[test]
    fn test_determinism() {
        let mut h1 = Harness::new();
        let mut h2 = Harness::new();
        let mut s1 = playing(99999, &mut h1);
        let mut s2 = playing(99999, &mut h2);

        for t in 0..1200u32 {
            let input = press(|i| {
                i.fire = t % 3 == 0;
                i.movement.left = t % 200 < 100;
                i.movement.right = t % 200 >= 100;
            });
            h1.tick(&mut s1, &input);
            h2.tick(&mut s2, &input);
        }

        assert_eq!(s1.time_ticks, s2.time_ticks);
        assert_eq!(s1.phase, s2.phase);
        assert_eq!(s1.economy, s2.economy);
        assert_eq!(s1.meteors, s2.meteors);
        assert_eq!(s1.player, s2.player);
    }

    #[test]
    fn test_autopilot_run_never_leaks_pool_objects() {
        let mut harness = Harness::new();
        let mut state = GameState::new(2024);
        let mut pilot = Autopilot::new();
        let mut phases = std::collections::HashSet::new();

        for _ in 0..20_000 {
            let input = pilot.next_input(&state);
            harness.tick(&mut state, &input);
            phases.insert(format!("{:?}", state.phase));
            assert!(state.pools_balanced(), "pool leak in {:?}", state.phase);
            assert!(state.particles.len() <= MAX_PARTICLES);
            state.drain_events();
        }
        assert!(phases.contains("Playing"));
        assert!(phases.contains("BossFight"), "run never reached a boss: {phases:?}");
        let [_, _, _, projectiles] = state.pool_stats();
        assert!(projectiles.acquired > 0);
    }
}
