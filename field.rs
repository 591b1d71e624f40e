//! field - The particle field engine
//! Owns the surface, the particle system and the random source

use rand::Rng;

use crate::{links, render, ParticleSystem, Settings, Surface};

/// What the last frame drew.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub particles: usize,
    pub links: usize,
}

pub struct ParticleField<S, R> {
    surface: Option<S>,
    system: ParticleSystem,
    rng: R,
    settings: Settings,
}

impl<S, R> ParticleField<S, R>
where
    S: Surface,
    R: Rng,
{
    /// Populates the field for the surface's current size.
    ///
    /// Without a surface the field stays empty and every call is a no-op.
    pub fn start(surface: Option<S>, rng: R, settings: Settings) -> Self {
        let mut field = Self {
            surface,
            system: ParticleSystem::empty(),
            rng,
            settings,
        };

        match field.surface.as_ref().map(Surface::size) {
            Some(extent) => {
                field
                    .system
                    .initialize(extent.width, extent.height, &field.settings, &mut field.rng);
                log::info!(
                    "particle field started at {}x{} with {} particles",
                    extent.width,
                    extent.height,
                    field.system.len()
                );
            }
            None => log::warn!("no drawing surface, particle field disabled"),
        }
        field
    }

    /// One frame: clear, move and draw particles, then draw connectors.
    pub fn tick(&mut self) -> Result<FrameStats, S::Error> {
        let Some(surface) = self.surface.as_mut() else {
            return Ok(FrameStats::default());
        };

        // Size is owned by the host and may have changed since the last frame
        let extent = surface.size();
        surface.clear()?;
        self.system.tick(surface, extent)?;

        let mut drawn = 0;
        for link in links::links(self.system.particles(), extent, &self.settings) {
            if render::draw_link(surface, &link, &self.settings)? {
                drawn += 1;
            }
        }

        log::trace!("frame: {} particles, {} links", self.system.len(), drawn);
        Ok(FrameStats {
            particles: self.system.len(),
            links: drawn,
        })
    }

    /// Resizes the surface and regenerates every particle for the new size.
    pub fn on_resize(&mut self, width: f32, height: f32) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        surface.resize(width, height);
        self.system
            .initialize(width, height, &self.settings, &mut self.rng);
        log::debug!(
            "resized to {}x{}, {} particles",
            width,
            height,
            self.system.len()
        );
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_surface(self) -> Option<S> {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::{Op, Recorder};
    use rand::{rngs::SmallRng, SeedableRng};

    fn field(surface: Option<Recorder>) -> ParticleField<Recorder, SmallRng> {
        ParticleField::start(surface, SmallRng::seed_from_u64(9), Settings::default())
    }

    #[test]
    fn test_start_sizes_population_from_surface() {
        let field = field(Some(Recorder::new(900.0, 900.0)));
        assert_eq!(field.system().len(), 90);
        assert_eq!(field.system().width(), 900.0);
    }

    #[test]
    fn test_missing_surface_is_inert() {
        let mut field = field(None);
        assert!(field.system().is_empty());
        assert_eq!(field.tick().unwrap(), FrameStats::default());

        field.on_resize(900.0, 900.0);
        assert!(field.system().is_empty());
        assert!(field.surface().is_none());
    }

    #[test]
    fn test_tick_clears_then_draws() {
        let mut field = field(Some(Recorder::new(600.0, 600.0)));
        let stats = field.tick().unwrap();
        assert_eq!(stats.particles, 40);

        let surface = field.surface().unwrap();
        assert_eq!(surface.ops[0], Op::Clear);
        assert_eq!(surface.clears(), 1);
        assert_eq!(surface.circles(), 40);
        assert_eq!(surface.lines(), stats.links);

        // circles come before any connector
        let first_line = surface.ops.iter().position(|op| matches!(op, Op::Line { .. }));
        if let Some(first_line) = first_line {
            assert!(first_line > 40);
        }
    }

    #[test]
    fn test_drawn_links_are_visible() {
        let mut field = field(Some(Recorder::new(1400.0, 1400.0)));
        let stats = field.tick().unwrap();
        assert!(stats.links > 0);

        for op in &field.surface().unwrap().ops {
            if let Op::Line { alpha, .. } = *op {
                assert!(alpha > 0.0 && alpha <= 1.0);
            }
        }
    }

    #[test]
    fn test_resize_regenerates() {
        let mut field = field(Some(Recorder::new(900.0, 900.0)));
        field.on_resize(300.0, 300.0);

        assert_eq!(field.system().len(), 10);
        assert_eq!(field.surface().unwrap().size(), crate::Extent::new(300.0, 300.0));

        field.on_resize(0.0, 300.0);
        assert!(field.system().is_empty());
        assert_eq!(field.tick().unwrap().particles, 0);
    }

    #[test]
    fn test_tick_rereads_surface_size() {
        let mut field = field(Some(Recorder::new(900.0, 900.0)));

        // Host shrinks the surface without a resize event
        field.surface_mut().unwrap().resize(50.0, 50.0);
        field.tick().unwrap();

        for p in field.system().particles() {
            assert!(p.x >= 0.0 && p.x <= 50.0);
            assert!(p.y >= 0.0 && p.y <= 50.0);
        }
        assert_eq!(field.system().len(), 90);
    }
}
