//! links - Connector lines between nearby particles
//! Recomputed every frame, nothing is stored between frames

use crate::{Extent, Particle, Settings};

/// One connector for the current frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub distance_sq: f32,
    /// Raw `1 - d²/fade`, may fall outside [0, 1].
    pub opacity: f32,
}

/// Strict: a pair sitting exactly on the threshold is not linked.
pub fn is_linked(distance_sq: f32, width: f32, height: f32, divisor: f32) -> bool {
    distance_sq < (width / divisor) * (height / divisor)
}

pub fn opacity(distance_sq: f32, fade_distance_sq: f32) -> f32 {
    1.0 - distance_sq / fade_distance_sq
}

/// Iterates every linked pair of `particles` for a surface of `extent`.
pub fn links<'a>(particles: &'a [Particle], extent: Extent, settings: &Settings) -> Links<'a> {
    // A degenerate surface holds no particles, but guard the threshold anyway
    // since two negative dimensions would multiply back to a positive one.
    let particles = if extent.width > 0.0 && extent.height > 0.0 {
        particles
    } else {
        &[]
    };
    let w = extent.width / settings.link_divisor;
    let h = extent.height / settings.link_divisor;

    Links {
        particles,
        threshold: w * h,
        fade_distance_sq: settings.fade_distance_sq,
        a: 0,
        b: 1,
    }
}

// PERF: walks the upper triangle in place, no allocation per pair or per frame
pub struct Links<'a> {
    particles: &'a [Particle],
    threshold: f32,
    fade_distance_sq: f32,
    a: usize,
    b: usize,
}

impl<'a> Links<'a> {
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl<'a> Iterator for Links<'a> {
    type Item = Link;

    fn next(&mut self) -> Option<Link> {
        let n = self.particles.len();
        while self.a < n {
            if self.b >= n {
                self.a += 1;
                self.b = self.a + 1;
                continue;
            }

            let (a, b) = (self.a, self.b);
            self.b += 1;

            let p = &self.particles[a];
            let q = &self.particles[b];
            let ddx = p.x - q.x;
            let ddy = p.y - q.y;
            let distance_sq = ddx * ddx + ddy * ddy;

            if distance_sq < self.threshold {
                return Some(Link {
                    a,
                    b,
                    from: (p.x, p.y),
                    to: (q.x, q.y),
                    distance_sq,
                    opacity: opacity(distance_sq, self.fade_distance_sq),
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn at(x: f32, y: f32) -> Particle {
        Particle {
            x,
            y,
            ..Particle::default()
        }
    }

    fn collect(particles: &[Particle], width: f32, height: f32) -> Vec<Link> {
        links(particles, Extent::new(width, height), &Settings::default()).collect()
    }

    #[test]
    fn test_threshold_is_strict() {
        // 700 / 7 = 100, so the threshold is exactly 100 * 100
        let settings = Settings::default();
        assert_eq!(links(&[], Extent::new(700.0, 700.0), &settings).threshold(), 10_000.0);

        let found = collect(&[at(0.0, 0.0), at(100.0, 0.0)], 700.0, 700.0);
        assert!(found.is_empty());

        let found = collect(&[at(0.0, 0.0), at(99.5, 0.0)], 700.0, 700.0);
        assert_eq!(found.len(), 1);
        assert!(!is_linked(10_000.0, 700.0, 700.0, 7.0));
        assert!(is_linked(9_999.0, 700.0, 700.0, 7.0));
    }

    #[test]
    fn test_predicate_is_monotone_in_distance() {
        let (w, h) = (1280.0, 720.0);
        let mut d = 0.0;
        let mut was_linked = true;
        while d < 100_000.0 {
            let linked = is_linked(d, w, h, 7.0);
            // once a distance stops qualifying, no larger one may qualify again
            assert!(was_linked || !linked);
            was_linked = linked;
            d += 97.0;
        }
    }

    #[test]
    fn test_self_pairs_are_excluded() {
        assert!(collect(&[at(10.0, 10.0)], 700.0, 700.0).is_empty());

        let found = collect(&[at(10.0, 10.0), at(10.0, 10.0)], 700.0, 700.0);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].a, found[0].b), (0, 1));
        assert_eq!(found[0].opacity, 1.0);
    }

    #[test]
    fn test_each_unordered_pair_once() {
        let cluster = [at(10.0, 10.0), at(12.0, 10.0), at(10.0, 12.0), at(12.0, 12.0)];
        let found = collect(&cluster, 700.0, 700.0);
        assert_eq!(found.len(), 6);
        for link in &found {
            assert!(link.a < link.b);
        }
        for (i, link) in found.iter().enumerate() {
            for other in &found[i + 1..] {
                assert_ne!((link.a, link.b), (other.a, other.b));
            }
        }
    }

    #[test]
    fn test_opacity_fades_with_distance() {
        let found = collect(&[at(0.0, 0.0), at(100.0, 0.0)], 1400.0, 1400.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].distance_sq, 10_000.0);
        assert_eq!(found[0].opacity, 0.5);
        assert_eq!(found[0].from, (0.0, 0.0));
        assert_eq!(found[0].to, (100.0, 0.0));

        // Past the fade distance the raw value goes negative and is left as is
        assert_eq!(opacity(30_000.0, 20_000.0), -0.5);
    }

    #[test]
    fn test_far_pairs_skipped_near_pairs_found() {
        let particles = [at(0.0, 0.0), at(500.0, 500.0), at(5.0, 0.0), at(505.0, 500.0)];
        let found = collect(&particles, 700.0, 700.0);
        let pairs: Vec<(usize, usize)> = found.iter().map(|l| (l.a, l.b)).collect();
        assert_eq!(pairs, [(0, 2), (1, 3)]);
    }

    #[test]
    fn test_degenerate_surface_has_no_links() {
        let particles = [at(0.0, 0.0), at(1.0, 0.0)];
        assert!(collect(&particles, 0.0, 700.0).is_empty());
        assert!(collect(&particles, -700.0, -700.0).is_empty());
        assert!(collect(&[], 700.0, 700.0).is_empty());
    }
}
