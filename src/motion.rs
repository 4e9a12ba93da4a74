use crate::error::EngineResult;
use crate::input::{InputBackend, Sleeper};
use rand::Rng;
use std::time::Duration;

const MIN_MOVEMENT_STEPS: u32 = 10;
const MAX_MOVEMENT_STEPS: u32 = 50;
const PIXELS_PER_STEP: f64 = 20.0;
const MIN_SPEED_FACTOR: f64 = 0.3;
const SPEED_RANGE: f64 = 0.7;
const TWITCH_PROBABILITY: f64 = 0.7;
const TWITCH_CHECK_THRESHOLD: f64 = 0.9;
const TWITCH_MAGNITUDE: f64 = 6.0;
const BASE_MOVEMENT_DELAY_MS: f64 = 5.0;

/// Move the cursor to `(target_x, target_y)` along a humanized path.
///
/// The path is eased quadratically in and out with per-step jitter and an
/// occasional larger twitch; the final step always lands exactly on the
/// target. Movements shorter than one pixel issue no position updates at
/// all. Returns once the final update has been issued.
pub fn smooth_move_to(
    input: &mut dyn InputBackend,
    sleeper: &dyn Sleeper,
    target_x: i32,
    target_y: i32,
) -> EngineResult<()> {
    let (start_x, start_y) = input.position()?;
    let delta_x = f64::from(target_x - start_x);
    let delta_y = f64::from(target_y - start_y);
    let distance = (delta_x * delta_x + delta_y * delta_y).sqrt();

    if distance < 1.0 {
        return Ok(());
    }

    let steps = ((distance / PIXELS_PER_STEP) as u32).clamp(MIN_MOVEMENT_STEPS, MAX_MOVEMENT_STEPS);

    let mut rng = rand::thread_rng();
    let speed_variation = MIN_SPEED_FACTOR + rng.gen::<f64>() * SPEED_RANGE;
    let twitchy = rng.gen::<f64>() > TWITCH_PROBABILITY;

    for i in 1..=steps {
        let progress = f64::from(i) / f64::from(steps);
        let eased = if progress < 0.5 {
            2.0 * progress * progress
        } else {
            1.0 - (-2.0 * progress + 2.0).powi(2) / 2.0
        };

        let mut x = f64::from(start_x) + delta_x * eased;
        let mut y = f64::from(start_y) + delta_y * eased;

        if i > 1 && i < steps {
            x += (rng.gen::<f64>() - 0.5) * 2.0;
            y += (rng.gen::<f64>() - 0.5) * 2.0;

            if twitchy && rng.gen::<f64>() > TWITCH_CHECK_THRESHOLD {
                x += (rng.gen::<f64>() - 0.5) * TWITCH_MAGNITUDE;
                y += (rng.gen::<f64>() - 0.5) * TWITCH_MAGNITUDE;
            }
        } else if i == steps {
            // Snap to the exact target so every movement converges.
            x = f64::from(target_x);
            y = f64::from(target_y);
        }

        input.set_position(x.round() as i32, y.round() as i32)?;

        if i < steps {
            let delay_ms = BASE_MOVEMENT_DELAY_MS * speed_variation * (1.0 + rng.gen::<f64>() * 0.5);
            sleeper.sleep(Duration::from_secs_f64(delay_ms / 1000.0));
        }
    }

    Ok(())
}
