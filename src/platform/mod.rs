//! Platform abstraction layer
//!
//! Input sources that turn "what the player wants" into `TickInput`s:
//! - `Autopilot`: demo AI that plays unattended (headless runs, soak tests)
//! - `ScriptedInput`: a fixed list of inputs for replays and tests

use std::collections::VecDeque;

use glam::Vec2;

use crate::consts::*;
use crate::sim::{GamePhase, GameState, Movement, Rect, TickInput};

/// Anything that can feed the simulation one input per tick
pub trait InputSource {
    fn next_input(&mut self, state: &GameState) -> TickInput;
}

/// How far above the ship a falling object counts as a threat
const THREAT_RANGE: f32 = 220.0;
/// Extra horizontal clearance kept around the ship
const THREAT_MARGIN: f32 = 12.0;
/// Close enough to a target to stop steering
const DEADZONE: f32 = 4.0;

/// Demo mode - AI plays the game
#[derive(Debug, Clone)]
pub struct Autopilot {
    /// Name submitted when a run makes the leaderboard
    pub name: String,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new()
    }
}

impl Autopilot {
    pub fn new() -> Self {
        Self {
            name: "AUTOPILOT".to_string(),
        }
    }

    fn fly(&self, state: &GameState) -> TickInput {
        let ship = state.player.collider();
        let center = ship.center();

        let movement = match nearest_threat(state, &ship) {
            Some(threat) => dodge(&ship, threat),
            None => steer_to(center.x, self.target_x(state, center)),
        };
        TickInput {
            movement,
            fire: true,
            ..Default::default()
        }
    }

    /// Pickups first, then whatever is worth shooting
    fn target_x(&self, state: &GameState, ship: Vec2) -> f32 {
        let pickups = state
            .power_ups
            .iter()
            .map(|p| p.collider().center())
            .chain(state.coins.iter().filter(|c| !c.collected).map(|c| c.collider().center()))
            .filter(|p| p.y < ship.y);
        if let Some(p) = closest(pickups, ship) {
            return p.x;
        }
        if let Some(boss) = &state.boss {
            return boss.pos.x;
        }
        let meteors = state.meteors.iter().map(|m| m.center()).filter(|m| m.y < ship.y);
        closest(meteors, ship).map(|m| m.x).unwrap_or(SCREEN_WIDTH / 2.0)
    }
}

impl InputSource for Autopilot {
    fn next_input(&mut self, state: &GameState) -> TickInput {
        match state.phase {
            GamePhase::Playing | GamePhase::BossFight | GamePhase::BossAnnouncement => self.fly(state),
            GamePhase::Menu | GamePhase::GameOver | GamePhase::Paused => TickInput {
                confirm: true,
                ..Default::default()
            },
            GamePhase::WaitingNameInput => TickInput {
                name: Some(self.name.clone()),
                ..Default::default()
            },
            GamePhase::Shop | GamePhase::Settings => TickInput {
                back: true,
                ..Default::default()
            },
            GamePhase::PlayerDeath => TickInput::default(),
        }
    }
}

/// Lowest falling hazard in the ship's lane
fn nearest_threat(state: &GameState, ship: &Rect) -> Option<Rect> {
    let lane_min = ship.min.x - THREAT_MARGIN;
    let lane_max = ship.max().x + THREAT_MARGIN;
    let top = ship.min.y - THREAT_RANGE;

    let hazards = state
        .meteors
        .iter()
        .map(|m| m.collider())
        .chain(state.boss_projectiles.iter().map(|p| p.collider()))
        .chain(
            state
                .boss
                .iter()
                .flat_map(|b| b.minions.iter().flatten())
                .map(|m| m.collider()),
        );

    hazards
        .filter(|r| r.max().x > lane_min && r.min.x < lane_max)
        .filter(|r| r.max().y > top && r.min.y < ship.max().y)
        .max_by(|a, b| a.max().y.total_cmp(&b.max().y))
}

/// Sidestep away from the threat, turning back at the walls
fn dodge(ship: &Rect, threat: Rect) -> Movement {
    let go_right = threat.center().x <= ship.center().x;
    let blocked = if go_right {
        ship.max().x >= SCREEN_WIDTH - 1.0
    } else {
        ship.min.x <= 1.0
    };
    let right = go_right != blocked;
    Movement {
        left: !right,
        right,
        ..Default::default()
    }
}

fn steer_to(x: f32, target: f32) -> Movement {
    Movement {
        left: target < x - DEADZONE,
        right: target > x + DEADZONE,
        ..Default::default()
    }
}

fn closest(points: impl Iterator<Item = Vec2>, from: Vec2) -> Option<Vec2> {
    points.min_by(|a, b| {
        a.distance_squared(from)
            .total_cmp(&b.distance_squared(from))
    })
}

/// Replays a fixed list of inputs, then idles
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    inputs: VecDeque<TickInput>,
}

impl ScriptedInput {
    pub fn new(inputs: impl IntoIterator<Item = TickInput>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl InputSource for ScriptedInput {
    fn next_input(&mut self, _state: &GameState) -> TickInput {
        self.inputs.pop_front().unwrap_or_default()
    }
}
