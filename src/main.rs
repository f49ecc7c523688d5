//! Jelly Arena headless runner
//!
//! Runs a scripted match and prints the final snapshot as JSON.
//!
//! Usage: `jelly-arena [variant|settings.json] [ticks]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(arg) if arg.ends_with(".json") => match jelly_arena::Settings::load(&arg) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load {}: {}", arg, e);
                std::process::exit(1);
            }
        },
        Some(arg) => match jelly_arena::Variant::from_str(&arg) {
            Some(variant) => jelly_arena::Settings::for_variant(variant),
            None => {
                eprintln!("Unknown variant '{}' (expected jelly-miner or biplane)", arg);
                std::process::exit(2);
            }
        },
        None => jelly_arena::Settings::default(),
    };
    let ticks: u64 = match args.next().map(|t| t.parse()) {
        None => 600,
        Some(Ok(t)) => t,
        Some(Err(e)) => {
            eprintln!("Invalid tick count: {}", e);
            std::process::exit(2);
        }
    };

    let seed: u64 = rand::random();
    log::info!(
        "Jelly Arena ({}) starting with seed {} for {} ticks",
        settings.variant.as_str(),
        seed,
        ticks
    );

    let state = demo::run(settings, seed, ticks);
    match state.snapshot().to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Failed to serialize snapshot: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is the whole product on wasm32
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use jelly_arena::Settings;
    use jelly_arena::sim::{GameState, Intent, TickInput, tick};

    /// Intent that only holds `shoot`
    fn shoot_intent() -> Intent {
        Intent {
            shoot: true,
            ..Default::default()
        }
    }

    /// Direction from `from` to `to`, or zero when they coincide
    fn aim(from: Vec2, to: Vec2) -> Vec2 {
        (to - from).normalize_or_zero()
    }

    /// Simple chase script: each actor steers toward its opponent and
    /// fires on a fixed rhythm, digging down every so often
    fn script(state: &GameState) -> TickInput {
        let t = state.time_ticks;
        let intents = state
            .actors
            .iter()
            .enumerate()
            .map(|(i, actor)| {
                let Some(target) = state.actors.get(1 - i.min(1)) else {
                    return Intent::default();
                };
                let dir = aim(actor.pos, target.pos);
                let mut intent = if (t + i as u64 * 7) % 25 == 0 {
                    shoot_intent()
                } else {
                    Intent::default()
                };
                match actor.heading() {
                    // Planes: keep throttle on and weave
                    Some(_) => {
                        intent.up = true;
                        intent.left = (t / 40) % 3 == 0;
                        intent.right = (t / 40) % 3 == 1;
                        intent.down = t % 200 == 0;
                    }
                    None => {
                        intent.left = dir.x < -0.2;
                        intent.right = dir.x > 0.2;
                        intent.up = dir.y < -0.5 && t % 3 == 0;
                        intent.down = (t + i as u64 * 50) % 120 < 4;
                    }
                }
                intent
            })
            .collect();
        TickInput {
            intents,
            ..Default::default()
        }
    }

    pub fn run(settings: Settings, seed: u64, ticks: u64) -> GameState {
        let mut state = GameState::new(settings, seed);
        for _ in 0..ticks {
            let input = script(&state);
            tick(&mut state, &input);
            for event in state.take_events() {
                log::debug!("t={} {:?}", state.time_ticks, event);
            }
        }
        log::info!("Finished at tick {} with scores {:?}", state.time_ticks, state.scores);
        state
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_aim_helpers() {
            assert_eq!(aim(Vec2::ZERO, Vec2::ZERO), Vec2::ZERO);
            assert!((aim(Vec2::ZERO, Vec2::new(3.0, 4.0)).length() - 1.0).abs() < 1e-6);
            assert!(shoot_intent().shoot);
        }

        #[test]
        fn test_demo_run_advances_ticks() {
            let state = run(Settings::default(), 3, 30);
            assert_eq!(state.time_ticks, 30);
            assert_eq!(state.scores.len(), state.actors.len());
        }
    }
}
