//! Third-person shooter demo
//!
//! Runs the game headless: a fixed-step loop feeds a scripted gamepad into
//! the game screen and hands every frame to a logging renderer. Pass a
//! `.toml` or `.ron` configuration file as the first argument to override
//! the defaults.

mod assets;
mod config;
mod level;
mod renderer;
mod screen;

use std::error::Error;

use log::{debug, info};
use terrain_engine::config::Config;
use terrain_engine::foundation::logging;
use terrain_engine::foundation::math::Vec2;
use terrain_engine::foundation::time::{FrameClock, Stopwatch};
use terrain_engine::input::Buttons;

use crate::config::{GameConfig, SimulationConfig};
use crate::level::LevelAssets;
use crate::renderer::LoggingRenderer;
use crate::screen::GameScreen;

/// Length of one pass through the input script, in seconds
const SCRIPT_PERIOD: f32 = 11.0;

/// Gamepad state the script holds at `time`
///
/// Runs and turns, jumps, aims and fires in bursts, then backs up.
fn scripted_pad(time: f32) -> (Buttons, Vec2) {
    let t = time % SCRIPT_PERIOD;
    if t < 3.0 {
        (Buttons::X, Vec2::new(0.25, 0.0))
    } else if t < 3.1 {
        (Buttons::X | Buttons::LEFT_STICK, Vec2::zeros())
    } else if t < 5.0 {
        (Buttons::X, Vec2::zeros())
    } else if t < 9.0 {
        let trigger = (t * 4.0) as u32 % 2 == 0;
        let buttons = if trigger {
            Buttons::LEFT_SHOULDER | Buttons::A
        } else {
            Buttons::LEFT_SHOULDER
        };
        (buttons, Vec2::new((t * 1.5).sin() * 0.5, (t * 0.7).sin() * 0.3))
    } else {
        (Buttons::A, Vec2::new(-0.25, 0.0))
    }
}

/// Headless application
struct HeadlessApp {
    screen: GameScreen,
    renderer: LoggingRenderer,
    clock: FrameClock,
    simulation: SimulationConfig,
}

impl HeadlessApp {
    fn new(config: GameConfig) -> Result<Self, Box<dyn Error>> {
        config.validate()?;

        let assets = LevelAssets::load(&config)?;
        let renderer = LoggingRenderer::with_meshes(assets.models.names());
        let clock = FrameClock::from_rate(config.simulation.tick_rate);
        let simulation = config.simulation.clone();
        let screen = GameScreen::new(config, assets)?;

        Ok(Self {
            screen,
            renderer,
            clock,
            simulation,
        })
    }

    fn run(&mut self) -> Result<(), Box<dyn Error>> {
        info!("Running {} ticks at {} Hz", self.simulation.ticks, self.simulation.tick_rate);
        let stopwatch = Stopwatch::start_new();
        let step = self.clock.step();
        let mut ticks = 0;

        while ticks < self.simulation.ticks {
            for _ in 0..self.clock.accumulate(step) {
                let (buttons, thumb) = scripted_pad(self.clock.total_time());
                self.screen.input_mut().set_gamepad(buttons, thumb, Vec2::zeros());
                self.screen.update(step)?;

                ticks += 1;
                if ticks % self.simulation.hud_interval == 0 {
                    info!("{}", self.screen.hud());
                    if let Some(crosshair) = self.screen.crosshair() {
                        debug!("Crosshair at {:?}, on target: {}", crosshair.ndc, crosshair.on_target);
                    }
                }
            }
            self.screen.render(&mut self.renderer)?;
        }

        info!(
            "Simulated {:.1}s in {:.2}s: {} frames rendered, {} restarts",
            self.clock.total_time(),
            stopwatch.elapsed_secs(),
            self.renderer.frames(),
            self.screen.restarts()
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    logging::init_with_default("info");
    info!("Starting third-person shooter demo");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            GameConfig::load_from_file(&path)?
        }
        None => GameConfig::default(),
    };

    let mut app = HeadlessApp::new(config)?;
    app.run()?;

    info!("Demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;

    #[test]
    fn test_script_covers_every_mode() {
        let samples: Vec<Buttons> = (0..1100).map(|i| scripted_pad(i as f32 * 0.01).0).collect();

        assert!(samples.iter().any(|b| b.contains(Buttons::X)));
        assert!(samples.iter().any(|b| b.contains(Buttons::LEFT_STICK)));
        assert!(samples.iter().any(|b| b.contains(Buttons::LEFT_SHOULDER | Buttons::A)));
        assert!(samples.iter().any(|b| *b == Buttons::A));
        assert_eq!(scripted_pad(0.5), scripted_pad(0.5 + SCRIPT_PERIOD));
    }

    #[test]
    fn test_short_headless_run() {
        let config = GameConfig {
            level: LevelConfig {
                terrain_size: 65,
                enemy_count: 4,
                enemy_min_distance: 40.0,
                enemy_spread: 150.0,
                player_position: [0.0, 0.0, 0.0],
                ..LevelConfig::default()
            },
            simulation: SimulationConfig {
                ticks: 240,
                ..SimulationConfig::default()
            },
            ..GameConfig::default()
        };

        let mut app = HeadlessApp::new(config).unwrap();
        app.run().unwrap();

        assert_eq!(app.renderer.frames(), 240);
        assert!(app.renderer.last_frame().commands >= 3);
    }
}
