//! Placement of continent centers and mountain belts. Everything here draws
//! from named forks of the placement stream, so each placement family is
//! insensitive to how much randomness the others consumed.

use crate::{
    config::BeltConfig,
    rng::RngStream,
    util::{lerp, toroidal_distance},
};
use log::trace;
use std::f64::consts::{PI, TAU};

/// Number of candidate positions tried per center before falling back to the
/// best-spaced attempt seen.
const PLACEMENT_ATTEMPTS: u32 = 100;

/// A continental mass: a center of gravity for the continentalness field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContinentCenter {
    pub x_m: f64,
    pub y_m: f64,
    pub radius_m: f64,
    /// Contribution scale in the continentalness sum
    pub strength: f64,
}

/// A mountain belt: a rotated elliptical ridge mask anchored near a major
/// continent center.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MountainBelt {
    pub x_m: f64,
    pub y_m: f64,
    /// Orientation of the long axis, radians in [0, π)
    pub orientation_rad: f64,
    pub half_length_m: f64,
    pub half_width_m: f64,
    pub peak_m: f64,
}

/// Poisson-like placement: draw uniform candidates until one clears the
/// minimum toroidal distance to everything placed before it (both `existing`
/// centers and earlier centers of this batch). If no candidate clears, keep
/// the one that maximized its closest distance — crowded worlds degrade
/// gracefully instead of failing.
pub fn place_centers(
    stream: &mut RngStream,
    count: u32,
    radius_m: f64,
    min_distance_factor: f64,
    strength: f64,
    width_m: f64,
    height_m: f64,
    existing: &[ContinentCenter],
) -> Vec<ContinentCenter> {
    let min_distance = min_distance_factor * radius_m;
    let mut placed: Vec<ContinentCenter> = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let mut best: Option<(f64, f64, f64)> = None;
        for _ in 0..PLACEMENT_ATTEMPTS {
            let x = stream.next_f64() * width_m;
            let y = stream.next_f64() * height_m;

            let nearest = existing
                .iter()
                .chain(placed.iter())
                .map(|c| {
                    toroidal_distance(
                        x, y, c.x_m, c.y_m, width_m, height_m,
                    )
                })
                .fold(f64::INFINITY, f64::min);

            if nearest > min_distance {
                best = Some((x, y, nearest));
                break;
            }
            let replace = match best {
                None => true,
                Some((_, _, best_nearest)) => nearest > best_nearest,
            };
            if replace {
                best = Some((x, y, nearest));
            }
        }

        // count > 0 implies at least one attempt ran
        let (x, y, nearest) = best.expect("at least one placement attempt");
        trace!(
            "Placed center at ({:.0}, {:.0}), nearest neighbor {:.0} m",
            x,
            y,
            nearest
        );
        placed.push(ContinentCenter {
            x_m: x,
            y_m: y,
            radius_m,
            strength,
        });
    }

    placed
}

/// Place one family of mountain belts. Belt `i` anchors to major center
/// `i mod majors`, offset by a random polar displacement within 60% of the
/// continent radius; its orientation, length, width, and peak height are
/// all uniform draws from the configured ranges. The draw order (angle,
/// offset, orientation, length, width, peak) is fixed.
pub fn place_belts(
    stream: &mut RngStream,
    config: &BeltConfig,
    majors: &[ContinentCenter],
    width_m: f64,
    height_m: f64,
) -> Vec<MountainBelt> {
    let mut belts = Vec::with_capacity(config.count as usize);
    if majors.is_empty() {
        return belts;
    }

    for i in 0..config.count {
        let anchor = &majors[(i as usize) % majors.len()];
        let theta = stream.next_f64() * TAU;
        let offset = stream.next_f64() * 0.6 * anchor.radius_m;
        let x = (anchor.x_m + theta.cos() * offset).rem_euclid(width_m);
        let y = (anchor.y_m + theta.sin() * offset).rem_euclid(height_m);

        let orientation = stream.next_f64() * PI;
        let length_km =
            lerp(config.length_km_min, config.length_km_max, stream.next_f64());
        let width_km =
            lerp(config.width_km_min, config.width_km_max, stream.next_f64());
        let peak_m =
            lerp(config.peak_m_min, config.peak_m_max, stream.next_f64());

        belts.push(MountainBelt {
            x_m: x,
            y_m: y,
            orientation_rad: orientation,
            half_length_m: length_km * 1000.0 / 2.0,
            half_width_m: width_km * 1000.0 / 2.0,
            peak_m,
        });
    }

    belts
}

impl MountainBelt {
    /// Rotated elliptical mask at world point `(x, y)`: 1 at the belt
    /// center, falling off cubically to 0 at the ellipse edge.
    pub fn mask(&self, x_m: f64, y_m: f64, width_m: f64, height_m: f64) -> f64 {
        // Signed displacement with toroidal wrap to the nearest image
        let mut dx = x_m - self.x_m;
        dx -= width_m * (dx / width_m).round();
        let mut dy = y_m - self.y_m;
        dy -= height_m * (dy / height_m).round();

        // Rotate into along/across-belt coordinates
        let cos = self.orientation_rad.cos();
        let sin = self.orientation_rad.sin();
        let along = dx * cos + dy * sin;
        let across = -dx * sin + dy * cos;

        let u = along / self.half_length_m;
        let v = across / self.half_width_m;
        let rho2 = u * u + v * v;
        if rho2 < 1.0 {
            let falloff = 1.0 - rho2.sqrt();
            falloff * falloff * falloff
        } else {
            0.0
        }
    }
}
