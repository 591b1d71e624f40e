//! render - Drawing surface contract and the embedded-graphics adapter

use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
};

use crate::{Extent, Link, Paint, Settings};

/// The 2D target particles and connectors are drawn onto.
///
/// The surface owns the viewport size; the simulation reads it back at the
/// start of every frame and never caches it.
pub trait Surface {
    type Error;

    fn size(&self) -> Extent;

    fn resize(&mut self, width: f32, height: f32);

    fn clear(&mut self) -> Result<(), Self::Error>;

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, paint: Paint) -> Result<(), Self::Error>;

    /// `alpha` is passed through as computed; how values outside [0, 1] are
    /// shown is up to the surface.
    fn draw_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb888,
        alpha: f32,
        width: f32,
    ) -> Result<(), Self::Error>;
}

/// Draws one connector, returning whether anything was handed to the surface.
///
/// With `clamp_alpha` set the opacity is clamped to [0, 1] and fully
/// transparent connectors are skipped.
pub fn draw_link<S: Surface>(surface: &mut S, link: &Link, settings: &Settings) -> Result<bool, S::Error> {
    let alpha = if settings.clamp_alpha {
        let alpha = link.opacity.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return Ok(false);
        }
        alpha
    } else {
        link.opacity
    };

    surface.draw_line(link.from, link.to, settings.link_color, alpha, settings.link_width)?;
    Ok(true)
}

/// Mixes `color` over `background`. Alpha saturates at 0 and 1.
pub fn blend(background: Rgb888, color: Rgb888, alpha: f32) -> Rgb888 {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |bg: u8, fg: u8| libm::roundf(bg as f32 + (fg as f32 - bg as f32) * alpha) as u8;
    Rgb888::new(
        mix(background.r(), color.r()),
        mix(background.g(), color.g()),
        mix(background.b(), color.b()),
    )
}

fn to_point(x: f32, y: f32) -> Point {
    Point::new(libm::roundf(x) as i32, libm::roundf(y) as i32)
}

/// `Surface` over any embedded-graphics `DrawTarget`.
///
/// The logical viewport starts at the target's origin; drawing is clipped to
/// it, so a viewport smaller than the target leaves the rest on background.
pub struct DisplaySurface<D> {
    target: D,
    width: f32,
    height: f32,
    background: Rgb888,
}

impl<D> DisplaySurface<D>
where
    D: DrawTarget<Color = Rgb888>,
{
    pub fn new(target: D, background: Rgb888) -> Self {
        let size = target.bounding_box().size;
        Self {
            target,
            width: size.width as f32,
            height: size.height as f32,
            background,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    pub fn into_target(self) -> D {
        self.target
    }

    pub fn background(&self) -> Rgb888 {
        self.background
    }

    fn viewport(&self) -> Rectangle {
        Rectangle::new(
            Point::zero(),
            Size::new(
                libm::roundf(self.width.max(0.0)) as u32,
                libm::roundf(self.height.max(0.0)) as u32,
            ),
        )
    }
}

impl<D> Surface for DisplaySurface<D>
where
    D: DrawTarget<Color = Rgb888>,
{
    type Error = D::Error;

    fn size(&self) -> Extent {
        Extent::new(self.width, self.height)
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.target.clear(self.background)
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, paint: Paint) -> Result<(), Self::Error> {
        let diameter = libm::roundf(2.0 * radius).max(1.0) as u32;
        let color = blend(self.background, paint.color, paint.alpha);
        let viewport = self.viewport();

        Circle::with_center(to_point(x, y), diameter)
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.target.clipped(&viewport))
    }

    fn draw_line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Rgb888,
        alpha: f32,
        width: f32,
    ) -> Result<(), Self::Error> {
        let stroke = libm::roundf(width).max(1.0) as u32;
        let color = blend(self.background, color, alpha);
        let viewport = self.viewport();

        Line::new(to_point(from.0, from.1), to_point(to.0, to.1))
            .into_styled(PrimitiveStyle::with_stroke(color, stroke))
            .draw(&mut self.target.clipped(&viewport))
    }
}
