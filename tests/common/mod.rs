#![allow(dead_code)]

use skylane::{GameConfig, InputState, KeyCode, ObstacleLevel, World};

pub const TICK: f64 = 1.0 / 60.0;

/// A config sized for tests: a small island and no balloons in the way.
pub fn session_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.terrain.detail_level = 4;
    config.obstacles.level = ObstacleLevel::None;
    config
}

/// A world whose terrain has fully generated.
pub fn ready_world(config: GameConfig, seed: u64) -> World {
    let mut world = World::with_seed(config, seed).expect("valid test config");
    let idle = InputState::default();
    while !world.terrain_ready() {
        world.step(TICK, &idle);
    }
    world
}

/// An input state with the given keys held.
pub fn hold(keys: &[KeyCode]) -> InputState {
    let mut input = InputState::default();
    for &key in keys {
        input.press(key);
    }
    input
}

/// Run the world for a stretch of simulated seconds.
pub fn run_seconds(world: &mut World, seconds: f64, input: &InputState) {
    let ticks = (seconds / TICK).round() as usize;
    for _ in 0..ticks {
        world.step(TICK, input);
    }
}
