use serde::{Deserialize, Serialize};

use crate::aircraft::Aircraft;
use crate::config::{LimitsConfig, RunwayConfig, WORLD_EXTENT};
use crate::obstacles::ObstacleField;
use crate::terrain::Terrain;

/// Why a session ended in a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashReason {
    Ocean,
    Land,
    Mountain,
    Wall,
    Obstacle,
    Fuel,
}

impl CrashReason {
    pub fn message(&self) -> &'static str {
        match self {
            CrashReason::Ocean => "GAMEOVER! You crashed into the ocean. Press R to restart.",
            CrashReason::Land => "GAMEOVER! You crashed on land. Press R to restart.",
            CrashReason::Mountain => "GAMEOVER! You crashed into the mountains. Press R to restart.",
            CrashReason::Wall => "GAMEOVER! You cannot fly by the mountains. Press R to restart.",
            CrashReason::Obstacle => "GAMEOVER! You crashed into another aircraft. Press R to restart.",
            CrashReason::Fuel => "GAMEOVER! You ran out of fuel. Press R to restart.",
        }
    }
}

/// Session verdict after one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Playing,
    Crashed(CrashReason),
    Won,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        *self != Outcome::Playing
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::Playing => None,
            Outcome::Crashed(reason) => Some(reason.message()),
            Outcome::Won => Some("You WIN!!!!!!! Congratulations!"),
        }
    }
}

/// Everything a single verdict needs to look at. Borrowed per tick between
/// the force update and ground resolution, so `aircraft.grounded` and the
/// vertical speed still describe the approach rather than the settled
/// contact state.
pub struct EvalContext<'a> {
    pub aircraft: &'a Aircraft,
    pub terrain: Option<&'a Terrain>,
    pub obstacles: &'a ObstacleField,
    pub limits: &'a LimitsConfig,
    pub runways: &'a RunwayConfig,
}

type Check = fn(&EvalContext) -> Option<Outcome>;

/// Verdicts in priority order; the first that fires wins the tick.
const CHECKS: [Check; 7] = [
    check_ocean,
    check_land,
    check_mountain,
    check_wall,
    check_obstacle,
    check_fuel,
    check_win,
];

pub fn evaluate(ctx: &EvalContext) -> Outcome {
    CHECKS.iter().find_map(|check| check(ctx)).unwrap_or(Outcome::Playing)
}

/// Ditching: either the reference point or the nose touches sea level while
/// off the landmass.
fn check_ocean(ctx: &EvalContext) -> Option<Outcome> {
    let craft = ctx.aircraft;
    if !craft.over_land() && (craft.position.z <= 0.0 || craft.tip().z <= 0.0) {
        return Some(Outcome::Crashed(CrashReason::Ocean));
    }
    None
}

/// Hard or crooked touchdown: reaching ground height while still airborne
/// with too much sink, bank, or pitch.
fn check_land(ctx: &EvalContext) -> Option<Outcome> {
    let craft = ctx.aircraft;
    let limits = ctx.limits;
    if !craft.grounded
        && craft.position.z <= craft.physics().ground_height
        && (craft.velocity.z <= -limits.sink_rate
            || craft.roll().abs() >= limits.roll_limit
            || craft.pitch().abs() >= limits.pitch_limit)
    {
        return Some(Outcome::Crashed(CrashReason::Land));
    }
    None
}

/// The nose dips below the interpolated terrain surface. Skipped until the
/// heightfield has finished generating.
fn check_mountain(ctx: &EvalContext) -> Option<Outcome> {
    let craft = ctx.aircraft;
    if !craft.over_land() {
        return None;
    }
    let tip = craft.tip();
    let surface = ctx.terrain.and_then(|t| t.height_at(tip.x, tip.y))?;
    if tip.z < surface - ctx.limits.mountain_clearance {
        return Some(Outcome::Crashed(CrashReason::Mountain));
    }
    None
}

/// Invisible walls extend the mountain range along y = 0 beyond both coasts;
/// crossing the plane nose-first out there ends the run.
fn check_wall(ctx: &EvalContext) -> Option<Outcome> {
    let craft = ctx.aircraft;
    if craft.position.x.abs() > WORLD_EXTENT + ctx.limits.wall_tolerance
        && craft.position.y < 0.0
        && craft.tip().y > 0.0
    {
        return Some(Outcome::Crashed(CrashReason::Wall));
    }
    None
}

fn check_obstacle(ctx: &EvalContext) -> Option<Outcome> {
    if ctx.obstacles.hit_test(&ctx.aircraft.tip()) {
        return Some(Outcome::Crashed(CrashReason::Obstacle));
    }
    None
}

fn check_fuel(ctx: &EvalContext) -> Option<Outcome> {
    if ctx.aircraft.elapsed >= ctx.limits.fuel_limit {
        return Some(Outcome::Crashed(CrashReason::Fuel));
    }
    None
}

/// Parked on the destination runway, slow enough to count as stopped.
fn check_win(ctx: &EvalContext) -> Option<Outcome> {
    let craft = ctx.aircraft;
    if craft.grounded
        && ctx
            .runways
            .destination
            .contains(craft.position.x, craft.position.y, ctx.limits.win_half_width)
        && craft.horizontal_speed() <= ctx.limits.win_speed
    {
        return Some(Outcome::Won);
    }
    None
}
