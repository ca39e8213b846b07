//! Square row-major scalar grids: the heightmap and the erosion map.

/// A `resolution × resolution` row-major grid of `f32` values.
///
/// Cell `(x, y)` lives at index `y * resolution + x`. The grid is owned by
/// exactly one engine instance and passed by reference between stages.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    resolution: u32,
    cells: Vec<f32>,
}

/// Elevation in world units, one value per terrain cell.
pub type Heightmap = Grid;

/// Net material removed (positive) or deposited (negative) per cell.
pub type ErosionMap = Grid;

impl Grid {
    /// Create a zero-filled grid.
    ///
    /// # Panics
    ///
    /// Panics if `resolution` is zero.
    pub fn new(resolution: u32) -> Self {
        assert!(resolution > 0, "grid resolution must be non-zero");
        let n = resolution as usize;
        Self {
            resolution,
            cells: vec![0.0; n * n],
        }
    }

    /// Wrap existing row-major cell data.
    ///
    /// # Panics
    ///
    /// Panics if `cells.len() != resolution²`.
    pub fn from_cells(resolution: u32, cells: Vec<f32>) -> Self {
        let n = resolution as usize;
        assert!(
            resolution > 0 && cells.len() == n * n,
            "grid of resolution {resolution} needs {} cells, got {}",
            n * n,
            cells.len()
        );
        Self { resolution, cells }
    }

    /// Cells per side.
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Row-major index of cell `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.resolution as usize + x as usize
    }

    /// Value at cell `(x, y)`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.cells[self.index(x, y)]
    }

    /// Overwrite cell `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: f32) {
        let i = self.index(x, y);
        self.cells[i] = value;
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    /// Mutable access to all cells in row-major order.
    pub fn cells_mut(&mut self) -> &mut [f32] {
        &mut self.cells
    }

    /// Bilinear interpolation at a fractional grid coordinate, clamped to the grid bounds.
    ///
    /// At an integer coordinate the result is exactly the stored cell value.
    pub fn sample_bilinear(&self, gx: f32, gy: f32) -> f32 {
        let max = (self.resolution - 1) as f32;
        let gx = gx.clamp(0.0, max);
        let gy = gy.clamp(0.0, max);

        let x0 = gx.floor() as u32;
        let y0 = gy.floor() as u32;
        let x1 = (x0 + 1).min(self.resolution - 1);
        let y1 = (y0 + 1).min(self.resolution - 1);
        let fx = gx - x0 as f32;
        let fy = gy - y0 as f32;

        let top = lerp(self.get(x0, y0), self.get(x1, y0), fx);
        let bottom = lerp(self.get(x0, y1), self.get(x1, y1), fx);
        lerp(top, bottom, fy)
    }

    /// Bilinear height at world-space `(x, z)` for a grid centred on the origin
    /// spanning `world_size` on both axes. Positions outside are clamped.
    ///
    /// World positions of mesh vertices map back onto their exact cells, so
    /// sampling at a vertex returns the stored value bit for bit.
    pub fn sample_world(&self, x: f32, z: f32, world_size: f32) -> f32 {
        let span = (self.resolution - 1) as f64;
        let to_grid =
            |w: f32| snap_to_lattice((w as f64 / world_size as f64 + 0.5) * span, span);
        self.sample_bilinear(to_grid(x), to_grid(z))
    }

    /// Smallest and largest cell values, ignoring non-finite cells.
    pub fn min_max(&self) -> (f32, f32) {
        self.cells
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Number of NaN or infinite cells.
    pub fn count_non_finite(&self) -> usize {
        self.cells.iter().filter(|v| !v.is_finite()).count()
    }

    /// Sum of all cell values, accumulated in `f64`.
    pub fn sum(&self) -> f64 {
        self.cells.iter().map(|&v| v as f64).sum()
    }

    /// `Σ|self - other|` over all cells.
    ///
    /// # Panics
    ///
    /// Panics if the grids differ in resolution.
    pub fn total_abs_difference(&self, other: &Grid) -> f64 {
        assert_eq!(
            self.resolution, other.resolution,
            "cannot compare grids of different resolution"
        );
        self.cells
            .iter()
            .zip(&other.cells)
            .map(|(&a, &b)| (a as f64 - b as f64).abs())
            .sum()
    }

    /// Tightly packed little-endian `R32Float` texel data, one texel per cell.
    pub fn texture_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }
}

/// Round `g` to the nearest integer when it lies within the f32 round-off a
/// world coordinate picks up on its way to grid space.
fn snap_to_lattice(g: f64, span: f64) -> f32 {
    let nearest = g.round();
    let tolerance = span.max(1.0) * f32::EPSILON as f64 * 4.0;
    if (g - nearest).abs() <= tolerance {
        nearest as f32
    } else {
        g as f32
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
