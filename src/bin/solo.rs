//! Headless scripted session: takes off from the departure runway at full
//! throttle and reports the verdict. Useful for eyeballing the flight model
//! without a renderer attached.

use log::info;

use skylane::{CrashReason, GameConfig, InputState, KeyCode, Outcome, World};

const TICK: f64 = 1.0 / 60.0;

fn main() -> Result<(), skylane::SimError> {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0xC0FFEE);

    let config = GameConfig::default();
    let mut world = World::with_seed(config, seed)?;
    info!("seed {seed}");

    let mut input = InputState::default();
    input.press(KeyCode::ThrottleUp);
    input.press(KeyCode::PitchUp);

    let mut next_report = 0.0;
    loop {
        let craft = world.aircraft();

        // Climb to a safe cruising height, then hold.
        input.set(KeyCode::PitchUp, craft.position.z < 0.85);

        if craft.elapsed >= next_report {
            info!(
                "t={:5.1}s pos=({:+.3}, {:+.3}, {:.3}) hdg={:+.0} speed={:.4} throttle={:.0}% fuel={:.0}% {}",
                craft.elapsed,
                craft.position.x,
                craft.position.y,
                craft.position.z,
                skylane::utils::math::rad_to_deg(craft.heading()),
                craft.indicated_speed(),
                craft.throttle * 100.0,
                world.fuel_remaining() * 100.0,
                if craft.grounded { "ground" } else { "air" },
            );
            next_report += 5.0;
        }

        let outcome = world.step(TICK, &input);
        match outcome {
            Outcome::Playing => {}
            Outcome::Won => {
                println!("{}", outcome.message().unwrap_or_default());
                break;
            }
            Outcome::Crashed(reason) => {
                println!("{}", outcome.message().unwrap_or_default());
                if reason == CrashReason::Fuel {
                    info!("ran the tank dry after {:.0}s", world.aircraft().elapsed);
                }
                break;
            }
        }
    }
    Ok(())
}
