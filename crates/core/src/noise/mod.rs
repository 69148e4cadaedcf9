//! Seeded noise for terrain generation. The 4D simplex implementation
//! follows Gustavson's reference: the extra two dimensions buy us seamless
//! wrapping, because [TorusNoise](torus::TorusNoise) embeds the 2D world onto
//! a 4-torus (one circle per world axis) before sampling.
//!
//! The permutation table is built from a [Mulberry32](crate::rng::Mulberry32)
//! shuffle, so two layers with the same seed are bit-identical across runs
//! and platforms.

pub mod torus;

use crate::rng::Mulberry32;

/// The 32 gradient directions: every corner of the 4D hypercube that has
/// exactly one zero component.
const GRAD4: [[f64; 4]; 32] = [
    [0.0, 1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0, -1.0],
    [0.0, 1.0, -1.0, 1.0],
    [0.0, 1.0, -1.0, -1.0],
    [0.0, -1.0, 1.0, 1.0],
    [0.0, -1.0, 1.0, -1.0],
    [0.0, -1.0, -1.0, 1.0],
    [0.0, -1.0, -1.0, -1.0],
    [1.0, 0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, -1.0],
    [1.0, 0.0, -1.0, 1.0],
    [1.0, 0.0, -1.0, -1.0],
    [-1.0, 0.0, 1.0, 1.0],
    [-1.0, 0.0, 1.0, -1.0],
    [-1.0, 0.0, -1.0, 1.0],
    [-1.0, 0.0, -1.0, -1.0],
    [1.0, 1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, -1.0],
    [1.0, -1.0, 0.0, 1.0],
    [1.0, -1.0, 0.0, -1.0],
    [-1.0, 1.0, 0.0, 1.0],
    [-1.0, 1.0, 0.0, -1.0],
    [-1.0, -1.0, 0.0, 1.0],
    [-1.0, -1.0, 0.0, -1.0],
    [1.0, 1.0, 1.0, 0.0],
    [1.0, 1.0, -1.0, 0.0],
    [1.0, -1.0, 1.0, 0.0],
    [1.0, -1.0, -1.0, 0.0],
    [-1.0, 1.0, 1.0, 0.0],
    [-1.0, 1.0, -1.0, 0.0],
    [-1.0, -1.0, 1.0, 0.0],
    [-1.0, -1.0, -1.0, 0.0],
];

/// Seeded 4D simplex noise. Output lies in approximately `[-1, 1]`.
#[derive(Clone)]
pub struct Simplex4d {
    /// 256-entry permutation doubled to 512 so corner hashing never needs a
    /// second modulo
    perm: Box<[u8; 512]>,
}

impl Simplex4d {
    pub fn new(seed: u32) -> Self {
        let mut rng = Mulberry32::new(seed);
        let mut table: [u8; 256] = [0; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        // Fisher-Yates over the identity table, high index down to 1. The
        // scan direction and the `% (i + 1)` index pick are both fixed:
        // reordering either regenerates every world
        for i in (1..256usize).rev() {
            let j = (rng.next_u32() as usize) % (i + 1);
            table.swap(i, j);
        }

        let mut perm = Box::new([0u8; 512]);
        for i in 0..512 {
            perm[i] = table[i & 255];
        }
        Self { perm }
    }

    #[inline]
    fn grad_index(&self, i: i64, j: i64, k: i64, l: i64) -> usize {
        let ll = (l & 255) as usize;
        let kk = (k & 255) as usize + self.perm[ll] as usize;
        let jj = (j & 255) as usize + self.perm[kk] as usize;
        let ii = (i & 255) as usize + self.perm[jj] as usize;
        self.perm[ii] as usize % 32
    }

    /// Sample the noise field at a 4D point.
    pub fn sample(&self, x: f64, y: f64, z: f64, w: f64) -> f64 {
        // Skew/unskew factors for 4 dimensions
        let f4 = (5.0_f64.sqrt() - 1.0) / 4.0;
        let g4 = (5.0 - 5.0_f64.sqrt()) / 20.0;

        // Skew the input to find the containing hypercube cell
        let s = (x + y + z + w) * f4;
        let i = (x + s).floor() as i64;
        let j = (y + s).floor() as i64;
        let k = (z + s).floor() as i64;
        let l = (w + s).floor() as i64;

        // Unskew back to get the cell origin, then the offset from it
        let t = (i + j + k + l) as f64 * g4;
        let x0 = x - (i as f64 - t);
        let y0 = y - (j as f64 - t);
        let z0 = z - (k as f64 - t);
        let w0 = w - (l as f64 - t);

        // Rank the fractional coordinates to pick which simplex of the cell
        // we're in; the ranks decide the order in which we step to each of
        // the five corners
        let mut rank_x = 0;
        let mut rank_y = 0;
        let mut rank_z = 0;
        let mut rank_w = 0;
        if x0 > y0 {
            rank_x += 1;
        } else {
            rank_y += 1;
        }
        if x0 > z0 {
            rank_x += 1;
        } else {
            rank_z += 1;
        }
        if x0 > w0 {
            rank_x += 1;
        } else {
            rank_w += 1;
        }
        if y0 > z0 {
            rank_y += 1;
        } else {
            rank_z += 1;
        }
        if y0 > w0 {
            rank_y += 1;
        } else {
            rank_w += 1;
        }
        if z0 > w0 {
            rank_z += 1;
        } else {
            rank_w += 1;
        }

        let i1 = i64::from(rank_x >= 3);
        let j1 = i64::from(rank_y >= 3);
        let k1 = i64::from(rank_z >= 3);
        let l1 = i64::from(rank_w >= 3);
        let i2 = i64::from(rank_x >= 2);
        let j2 = i64::from(rank_y >= 2);
        let k2 = i64::from(rank_z >= 2);
        let l2 = i64::from(rank_w >= 2);
        let i3 = i64::from(rank_x >= 1);
        let j3 = i64::from(rank_y >= 1);
        let k3 = i64::from(rank_z >= 1);
        let l3 = i64::from(rank_w >= 1);

        // Offsets of the five corners in unskewed coordinates
        let corners = [
            (x0, y0, z0, w0, self.grad_index(i, j, k, l)),
            (
                x0 - i1 as f64 + g4,
                y0 - j1 as f64 + g4,
                z0 - k1 as f64 + g4,
                w0 - l1 as f64 + g4,
                self.grad_index(i + i1, j + j1, k + k1, l + l1),
            ),
            (
                x0 - i2 as f64 + 2.0 * g4,
                y0 - j2 as f64 + 2.0 * g4,
                z0 - k2 as f64 + 2.0 * g4,
                w0 - l2 as f64 + 2.0 * g4,
                self.grad_index(i + i2, j + j2, k + k2, l + l2),
            ),
            (
                x0 - i3 as f64 + 3.0 * g4,
                y0 - j3 as f64 + 3.0 * g4,
                z0 - k3 as f64 + 3.0 * g4,
                w0 - l3 as f64 + 3.0 * g4,
                self.grad_index(i + i3, j + j3, k + k3, l + l3),
            ),
            (
                x0 - 1.0 + 4.0 * g4,
                y0 - 1.0 + 4.0 * g4,
                z0 - 1.0 + 4.0 * g4,
                w0 - 1.0 + 4.0 * g4,
                self.grad_index(i + 1, j + 1, k + 1, l + 1),
            ),
        ];

        let mut total = 0.0;
        for &(cx, cy, cz, cw, gi) in &corners {
            let attn = 0.6 - cx * cx - cy * cy - cz * cz - cw * cw;
            if attn > 0.0 {
                let g = &GRAD4[gi];
                let dot = g[0] * cx + g[1] * cy + g[2] * cz + g[3] * cw;
                let attn2 = attn * attn;
                total += attn2 * attn2 * dot;
            }
        }

        27.0 * total
    }
}

impl std::fmt::Debug for Simplex4d {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The permutation table is 512 bytes of shuffled noise; don't dump it
        f.debug_struct("Simplex4d").finish_non_exhaustive()
    }
}
