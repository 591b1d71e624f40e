//! particle-field - Core simulation for an animated particle background
//! no_std compatible, particle storage comes from `alloc`

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use rand::Rng;

pub mod field;
pub mod links;
pub mod render;
pub mod scheduler;

pub use field::{FrameStats, ParticleField};
pub use links::{is_linked, links, opacity, Link, Links};
pub use render::{DisplaySurface, Surface};
pub use scheduler::{start, stop, EventQueue, FrameSource, HostEvent, Scheduler, StopHandle};

// All tunables live here so hosts can override them without touching the core
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Settings {
    // Population
    pub density_area: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub speed_max: f32,
    pub spawn_inset: f32,

    // Connectors
    pub link_divisor: f32,
    pub fade_distance_sq: f32,
    pub link_width: f32,
    pub clamp_alpha: bool,

    // Colors
    pub particle_color: Rgb888,
    pub particle_alpha: f32,
    pub link_color: Rgb888,
    pub background: Rgb888,

    // Demo host
    pub screen_width: u32,
    pub screen_height: u32,
    pub display_scale: u32,
    pub target_fps: u32,

    // RNG seed
    pub rng_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            density_area: 9000.0,
            radius_min: 1.0,
            radius_max: 3.0,
            speed_max: 0.2,
            spawn_inset: 2.0,
            link_divisor: 7.0,
            fade_distance_sq: 20000.0,
            link_width: 1.0,
            clamp_alpha: true,
            particle_color: Rgb888::new(100, 255, 218),
            particle_alpha: 0.2,
            link_color: Rgb888::new(100, 255, 218),
            background: Rgb888::new(10, 25, 47),
            screen_width: 800,
            screen_height: 600,
            display_scale: 1,
            target_fps: 60,
            rng_seed: 0x1234_5678,
        }
    }
}

/// Width and height of a drawing surface, in surface units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Fill color plus opacity in [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Paint {
    pub color: Rgb888,
    pub alpha: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Rgb888::WHITE,
            alpha: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub radius: f32,
    pub paint: Paint,
}

impl Particle {
    /// Advances one tick, bouncing off the walls at 0 and `width`/`height`.
    pub fn update(&mut self, width: f32, height: f32) {
        (self.x, self.dx) = reflect(self.x, self.dx, width);
        (self.y, self.dy) = reflect(self.y, self.dy, height);
    }

    pub fn draw<S: Surface>(&self, surface: &mut S) -> Result<(), S::Error> {
        surface.fill_circle(self.x, self.y, self.radius, self.paint)
    }
}

// Elastic reflection along one axis. The step is mirrored about the crossed
// wall and the velocity negated once; folding over a period of two walls keeps
// the result inside even when the extent is thinner than one step.
fn reflect(pos: f32, vel: f32, extent: f32) -> (f32, f32) {
    let next = pos + vel;
    if (0.0..=extent).contains(&next) {
        return (next, vel);
    }
    if extent <= 0.0 {
        return (0.0, -vel);
    }

    let period = 2.0 * extent;
    let folded = libm::fmodf(libm::fabsf(next), period);
    let pos = if folded > extent { period - folded } else { folded };
    (pos, -vel)
}

/// The full particle population for one surface size.
#[derive(Clone, Debug, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
}

impl ParticleSystem {
    pub const fn empty() -> Self {
        Self {
            particles: Vec::new(),
            width: 0.0,
            height: 0.0,
        }
    }

    /// Number of particles a `width` x `height` surface holds.
    ///
    /// Non-positive or non-finite dimensions give zero.
    pub fn count_for(width: f32, height: f32, density_area: f32) -> usize {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) || !valid(density_area) {
            return 0;
        }
        // f64 keeps the floor exact for realistic viewport areas
        libm::floor(width as f64 * height as f64 / density_area as f64) as usize
    }

    /// Builds a fresh population for a `width` x `height` surface.
    pub fn generate<R: Rng>(
        width: f32,
        height: f32,
        settings: &Settings,
        rng: &mut R,
    ) -> Self {
        let count = Self::count_for(width, height, settings.density_area);
        let paint = Paint {
            color: settings.particle_color,
            alpha: settings.particle_alpha,
        };

        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            let radius = if settings.radius_max > settings.radius_min {
                rng.gen_range(settings.radius_min..=settings.radius_max)
            } else {
                settings.radius_min
            };
            let inset = settings.spawn_inset * radius;
            let x = spawn_coord(rng, width, inset);
            let y = spawn_coord(rng, height, inset);
            let dx = random_speed(rng, settings.speed_max);
            let dy = random_speed(rng, settings.speed_max);
            particles.push(Particle {
                x,
                y,
                dx,
                dy,
                radius,
                paint,
            });
        }

        log::debug!("generated {} particles for {}x{}", count, width, height);
        Self {
            particles,
            width,
            height,
        }
    }

    /// Throws away the current population and replaces it with a new one.
    pub fn initialize<R: Rng>(
        &mut self,
        width: f32,
        height: f32,
        settings: &Settings,
        rng: &mut R,
    ) {
        *self = Self::generate(width, height, settings, rng);
    }

    /// Moves then draws every particle, in collection order.
    pub fn tick<S: Surface>(&mut self, surface: &mut S, extent: Extent) -> Result<(), S::Error> {
        for particle in &mut self.particles {
            particle.update(extent.width, extent.height);
            particle.draw(surface)?;
        }
        Ok(())
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

// Keeps a spawned particle clear of the edges; falls back to the middle when
// the surface is narrower than the inset on both sides.
fn spawn_coord<R: Rng>(rng: &mut R, extent: f32, inset: f32) -> f32 {
    let (lo, hi) = (inset, extent - inset);
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        extent.max(0.0) / 2.0
    }
}

fn random_speed<R: Rng>(rng: &mut R, speed_max: f32) -> f32 {
    if speed_max > 0.0 {
        rng.gen_range(-speed_max..=speed_max)
    } else {
        0.0
    }
}
