//! main.rs - Desktop simulator host for the particle field
//! Handles the window, frame pacing and viewport presets

use core::fmt::Write;
use std::thread;
use std::time::{Duration, Instant};

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    text::{Baseline, Text},
};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use heapless::String;
use rand::{rngs::SmallRng, SeedableRng};

use particle_field::{DisplaySurface, EventQueue, FrameSource, FrameStats, HostEvent, Settings};

type SimSurface = DisplaySurface<SimulatorDisplay<Rgb888>>;

// Viewport sizes cycled with R, all within the default display
const VIEWPORT_PRESETS: [(u32, u32); 3] = [(800, 600), (640, 480), (480, 320)];

struct SimulatorFrames {
    window: Window,
    frame_duration: Duration,
    last_frame: Instant,
    presented: bool,
    preset: usize,
    status: String<64>,
    text_color: Rgb888,
}

impl SimulatorFrames {
    fn new(window: Window, settings: &Settings) -> Self {
        Self {
            window,
            frame_duration: Duration::from_secs_f32(1.0 / settings.target_fps.max(1) as f32),
            last_frame: Instant::now(),
            presented: false,
            preset: 0,
            status: String::new(),
            text_color: settings.particle_color,
        }
    }

    fn draw_status(&mut self, surface: &mut SimSurface, stats: &FrameStats) {
        let extent = particle_field::Surface::size(surface);
        self.status.clear();
        let _ = write!(
            &mut self.status,
            "{}x{}  particles: {}  links: {}",
            extent.width, extent.height, stats.particles, stats.links
        );

        let style = MonoTextStyle::new(&FONT_6X10, self.text_color);
        let _ = Text::with_baseline(self.status.as_str(), Point::new(5, 5), style, Baseline::Top)
            .draw(surface.target_mut());
    }
}

impl FrameSource<SimSurface> for SimulatorFrames {
    fn next_frame(&mut self, surface: Option<&mut SimSurface>, stats: &FrameStats, events: &mut EventQueue) {
        if let Some(surface) = surface {
            self.draw_status(surface, stats);
            self.window.update(surface.target());
            self.presented = true;
        }

        // The window only exists once something has been shown
        if self.presented {
            for event in self.window.events() {
                match event {
                    SimulatorEvent::Quit => events.push(HostEvent::Closed),
                    SimulatorEvent::KeyDown { keycode, .. } => {
                        let key = format!("{:?}", keycode).to_lowercase();
                        match key.as_str() {
                            "q" | "escape" => events.push(HostEvent::Closed),
                            "r" => {
                                self.preset = (self.preset + 1) % VIEWPORT_PRESETS.len();
                                let (width, height) = VIEWPORT_PRESETS[self.preset];
                                log::info!("viewport: {}x{}", width, height);
                                events.push(HostEvent::Resize {
                                    width: width as f32,
                                    height: height as f32,
                                });
                            }
                            _ => {}
                        }
                    }
                    _ => {}
                }
            }
        }

        // Frame rate limiting
        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_duration {
            thread::sleep(self.frame_duration - elapsed);
        }
        self.last_frame = Instant::now();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::default();

    let display = SimulatorDisplay::<Rgb888>::new(Size::new(settings.screen_width, settings.screen_height));
    let output_settings = OutputSettingsBuilder::new().scale(settings.display_scale).build();
    let window = Window::new("Particle Field", &output_settings);

    let surface = DisplaySurface::new(display, settings.background);
    let rng = SmallRng::seed_from_u64(settings.rng_seed);
    let (mut field, mut scheduler) = particle_field::start(Some(surface), rng, settings);
    let mut frames = SimulatorFrames::new(window, &settings);

    println!("=== Particle Field ===");
    println!("Controls:");
    println!("  R: Cycle viewport size");
    println!("  Q: Quit");

    let ticks = scheduler.run(&mut field, &mut frames)?;
    log::info!("rendered {} frames", ticks);
    Ok(())
}
