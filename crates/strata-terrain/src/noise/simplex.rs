//! Seeded permutation tables and 2D simplex gradient noise.

use crate::seed::Lcg;

/// Skew factor `(√3 - 1) / 2` mapping input space onto the simplex lattice.
const F2: f64 = 0.366_025_403_784_438_6;
/// Unskew factor `(3 - √3) / 6`.
const G2: f64 = 0.211_324_865_405_187_1;
/// Scales the summed corner contributions to roughly `[-1, 1]`.
const OUTPUT_SCALE: f64 = 70.0;

const GRADIENTS: [[f64; 2]; 8] = [
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [-1.0, -1.0],
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
];

/// A Fisher–Yates shuffle of `0..=255`, duplicated to 512 entries so lattice
/// lookups never need to wrap.
#[derive(Clone)]
pub struct PermutationTable {
    perm: [u8; 512],
}

impl PermutationTable {
    /// Shuffle the identity permutation with an [`Lcg`] seeded by `seed`.
    pub fn new(seed: u32) -> Self {
        let mut base: [u8; 256] = std::array::from_fn(|i| i as u8);
        let mut rng = Lcg::new(seed);
        for i in (1..256).rev() {
            let j = (rng.next_f64() * (i + 1) as f64) as usize;
            base.swap(i, j);
        }
        Self {
            perm: std::array::from_fn(|i| base[i & 255]),
        }
    }

    /// Raw table entry.
    #[inline]
    pub fn get(&self, i: usize) -> u8 {
        self.perm[i]
    }

    #[inline]
    fn gradient_index(&self, i: usize, j: usize) -> usize {
        self.perm[i + self.perm[j] as usize] as usize % GRADIENTS.len()
    }
}

impl std::fmt::Debug for PermutationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationTable")
            .field("head", &&self.perm[..8])
            .finish()
    }
}

#[inline]
fn corner(gradient: usize, x: f64, y: f64) -> f64 {
    let t = 0.5 - x * x - y * y;
    if t < 0.0 {
        0.0
    } else {
        let t2 = t * t;
        let g = GRADIENTS[gradient];
        t2 * t2 * (g[0] * x + g[1] * y)
    }
}

/// Evaluate 2D simplex noise at `(x, y)`.
///
/// Output lies approximately in `[-1, 1]`; callers that need a hard bound clamp.
pub fn simplex2(table: &PermutationTable, x: f64, y: f64) -> f64 {
    let s = (x + y) * F2;
    let i = (x + s).floor();
    let j = (y + s).floor();

    let t = (i + j) * G2;
    let x0 = x - (i - t);
    let y0 = y - (j - t);

    // Which of the two triangles of the skewed cell we are in.
    let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

    let x1 = x0 - i1 as f64 + G2;
    let y1 = y0 - j1 as f64 + G2;
    let x2 = x0 - 1.0 + 2.0 * G2;
    let y2 = y0 - 1.0 + 2.0 * G2;

    let ii = (i as i64 & 255) as usize;
    let jj = (j as i64 & 255) as usize;

    let n0 = corner(table.gradient_index(ii, jj), x0, y0);
    let n1 = corner(table.gradient_index(ii + i1, jj + j1), x1, y1);
    let n2 = corner(table.gradient_index(ii + 1, jj + 1), x2, y2);

    OUTPUT_SCALE * (n0 + n1 + n2)
}
