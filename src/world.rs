use std::sync::Arc;

use log::info;
use rand::Rng;

use crate::aircraft::{Aircraft, InputState, KeyCode};
use crate::config::GameConfig;
use crate::obstacles::ObstacleField;
use crate::outcome::{evaluate, EvalContext, Outcome};
use crate::terrain::{Terrain, TerrainBuilder};
use crate::utils::errors::SimError;
use crate::utils::rng::RngManager;

enum TerrainState {
    Building(TerrainBuilder),
    Ready(Arc<Terrain>),
}

/// One complete game session: the island, the balloon field, the player
/// aircraft, and the verdict so far.
///
/// Terrain generation is staged across ticks; until it completes,
/// [`World::terrain`] is `None` and the mountain-collision check stays off.
/// The aircraft flies from the first tick either way, matching how the game
/// lets the player taxi while the island is still forming.
pub struct World {
    config: GameConfig,
    aircraft: Aircraft,
    terrain: TerrainState,
    obstacles: ObstacleField,
    outcome: Outcome,
    previous_input: InputState,
    seed: u64,
}

impl World {
    /// A session with a random seed.
    pub fn new(config: GameConfig) -> Result<Self, SimError> {
        let seed = rand::thread_rng().gen();
        Self::with_seed(config, seed)
    }

    /// A fully reproducible session: the same seed and config always yield
    /// the same island and the same balloon population.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let rng = RngManager::new(seed);
        let terrain = TerrainState::Building(TerrainBuilder::new(
            &config.terrain,
            &config.runways,
            rng.stream("terrain"),
        ));
        let mut obstacle_rng = rng.stream("obstacles");
        let obstacles = ObstacleField::new(config.obstacles.clone(), &mut obstacle_rng);
        let aircraft = Aircraft::new(
            config.physics.clone(),
            config.runways.spawn_point(config.physics.ground_height),
        );
        info!(
            "new session: seed {seed}, {count} obstacles ({level:?})",
            count = obstacles.obstacles().len(),
            level = obstacles.level(),
        );
        Ok(Self {
            config,
            aircraft,
            terrain,
            obstacles,
            outcome: Outcome::Playing,
            previous_input: InputState::default(),
            seed,
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn aircraft(&self) -> &Aircraft {
        &self.aircraft
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// The finished heightfield, or `None` while it is still generating.
    pub fn terrain(&self) -> Option<&Arc<Terrain>> {
        match &self.terrain {
            TerrainState::Building(_) => None,
            TerrainState::Ready(terrain) => Some(terrain),
        }
    }

    pub fn terrain_ready(&self) -> bool {
        matches!(self.terrain, TerrainState::Ready(_))
    }

    /// Terrain generation progress in [0, 1].
    pub fn generation_progress(&self) -> f64 {
        match &self.terrain {
            TerrainState::Building(builder) => builder.progress(),
            TerrainState::Ready(_) => 1.0,
        }
    }

    /// Fraction of fuel left, for the gauge.
    pub fn fuel_remaining(&self) -> f64 {
        (1.0 - self.aircraft.elapsed / self.config.limits.fuel_limit).clamp(0.0, 1.0)
    }

    /// Advance the whole session by one tick. Returns the verdict after the
    /// tick; once terminal, the simulation freezes until a restart.
    pub fn step(&mut self, dt: f64, input: &InputState) -> Outcome {
        let restart = self.rising_edge(input, KeyCode::Restart);
        let reverse = self.rising_edge(input, KeyCode::ReverseToggle);
        self.previous_input = *input;

        if restart {
            self.restart();
            return self.outcome;
        }

        // One generation stage per tick keeps the loop responsive while the
        // island forms.
        if let TerrainState::Building(builder) = &mut self.terrain {
            builder.advance();
            if builder.is_done() {
                if let Some(terrain) = builder.finish() {
                    self.terrain = TerrainState::Ready(Arc::new(terrain));
                }
            }
        }

        if self.outcome.is_terminal() {
            return self.outcome;
        }

        if reverse {
            self.aircraft.reverse = !self.aircraft.reverse;
        }

        let dt = self.aircraft.integrate(dt, input);
        self.obstacles.step(dt);

        // Verdicts look at the pre-contact state, before ground resolution
        // zeroes the sink rate.
        let verdict = evaluate(&EvalContext {
            aircraft: &self.aircraft,
            terrain: self.terrain().map(Arc::as_ref),
            obstacles: &self.obstacles,
            limits: &self.config.limits,
            runways: &self.config.runways,
        });
        self.aircraft.settle(dt, input);

        if verdict.is_terminal() {
            self.outcome = verdict;
            if let Some(message) = verdict.message() {
                info!("session over: {message}");
            }
        }
        self.outcome
    }

    /// Put the aircraft back on the departure runway and resume play. The
    /// island and the balloon population carry over unchanged.
    pub fn restart(&mut self) {
        self.aircraft.reset();
        self.outcome = Outcome::Playing;
        info!("session restarted");
    }

    fn rising_edge(&self, input: &InputState, key: KeyCode) -> bool {
        input.pressed(key) && !self.previous_input.pressed(key)
    }
}
