pub mod aircraft;
pub mod config;
pub mod obstacles;
pub mod outcome;
pub mod terrain;
pub mod utils;
pub mod world;

pub use aircraft::{Aircraft, InputState, KeyCode, PitchInput};
pub use config::{GameConfig, LimitsConfig, ObstacleConfig, PhysicsConfig, RunwayConfig, TerrainConfig};
pub use obstacles::{Obstacle, ObstacleField, ObstacleLevel};
pub use outcome::{CrashReason, Outcome};
pub use terrain::{GenerationStage, Terrain, TerrainBuilder};
pub use utils::errors::SimError;
pub use world::World;
