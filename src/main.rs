//! Meteor Rush entry point
//!
//! Headless driver: runs the simulation on a fixed timestep with the
//! autopilot at the controls, feeding events to the audio cue mapper and
//! persisting the profile the same way an interactive front end would.

use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

use meteor_rush::Profile;
use meteor_rush::audio::AudioManager;
use meteor_rush::consts::TICKS_PER_SECOND;
use meteor_rush::persistence::{FileStorage, MemoryStorage, Storage};
use meteor_rush::platform::{Autopilot, InputSource};
use meteor_rush::renderer::FrameSnapshot;
use meteor_rush::sim::{GameEvent, GameState, TickContext, tick};

#[derive(Parser, Debug)]
#[command(name = "meteor-rush", version, about = "Meteor Rush headless driver")]
struct Args {
    /// Run seed (defaults to the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of simulation ticks to run (60 per second)
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,

    /// Directory holding the save records
    #[arg(long, default_value = "meteor-rush-data")]
    data_dir: PathBuf,

    /// Keep saves in memory only
    #[arg(long)]
    memory: bool,

    /// Pace the loop at 60 ticks per second
    #[arg(long)]
    realtime: bool,

    /// Print the last frame snapshot as JSON
    #[arg(long)]
    dump_frame: bool,
}

/// Totals for the end-of-session log line
#[derive(Debug, Default)]
struct SessionStats {
    runs: u32,
    best_score: u64,
    bosses_defeated: u32,
    coins_banked: u64,
    save_failures: u32,
    cues: usize,
}

impl SessionStats {
    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::PlayerDied { score } => {
                    self.runs += 1;
                    self.best_score = self.best_score.max(*score);
                }
                GameEvent::BossDefeated { .. } => self.bosses_defeated += 1,
                GameEvent::CoinBanked { value } => self.coins_banked += value,
                GameEvent::PersistenceFailed { .. } => self.save_failures += 1,
                _ => {}
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(seed_from_clock);
    let mut storage: Box<dyn Storage> = if args.memory {
        Box::new(MemoryStorage::new())
    } else {
        let storage = FileStorage::new(args.data_dir.clone())
            .with_context(|| format!("opening data directory {}", args.data_dir.display()))?;
        Box::new(storage)
    };
    let mut profile = Profile::load(&*storage);
    let today = civil_date(SystemTime::now());

    log::info!("Meteor Rush (headless) starting: seed {seed}, {} ticks", args.ticks);
    log::info!(
        "Profile: {} coins, high score {}, {} leaderboard entries",
        profile.progress.coins,
        profile.high_score,
        profile.leaderboard.entries.len()
    );

    let mut state = GameState::new(seed);
    let mut pilot = Autopilot::new();
    let mut audio = AudioManager::from_settings(&profile.settings);
    let mut stats = SessionStats::default();

    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(TICKS_PER_SECOND));
    let mut next_tick = Instant::now();

    for _ in 0..args.ticks {
        let input = pilot.next_input(&state);
        let mut ctx = TickContext {
            profile: &mut profile,
            storage: &mut *storage,
            today: &today,
        };
        tick(&mut state, &input, &mut ctx);

        let events = state.drain_events();
        stats.record(&events);
        if events.contains(&GameEvent::SettingsApplied) {
            audio.apply_settings(&profile.settings);
        }
        audio.handle_events(&events);
        // No audio backend attached: cues are counted and dropped
        stats.cues += audio.drain().len();

        if args.realtime {
            next_tick += tick_duration;
            if let Some(wait) = next_tick.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }

    let frame = FrameSnapshot::capture(&state, &profile.settings);
    if args.dump_frame {
        println!("{}", frame.to_json()?);
    }

    profile
        .save_all(&mut *storage)
        .context("saving profile at shutdown")?;

    log::info!(
        "Session over after {} ticks in {:?}: {} runs, best {}, {} bosses, {} coins banked, {} cues, {} failed saves",
        args.ticks,
        frame.phase,
        stats.runs,
        stats.best_score,
        stats.bosses_defeated,
        stats.coins_banked,
        stats.cues,
        stats.save_failures
    );
    Ok(())
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// UTC calendar date (YYYY-MM-DD) for leaderboard entries
fn civil_date(now: SystemTime) -> String {
    let days = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() / 86_400)
        .unwrap_or(0) as i64;

    // Days-from-civil inverse, eras of 400 years starting 0000-03-01
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    format!("{year:04}-{month:02}-{day:02}")
}
