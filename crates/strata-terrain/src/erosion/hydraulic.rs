//! Particle-based hydraulic erosion.
//!
//! Water droplets are released one at a time onto the heightmap. Each droplet
//! follows the bilinear height gradient, picks up sediment where it has spare
//! capacity, and drops it where it slows down or climbs. Droplets run strictly
//! in sequence: a droplet sees every cell already modified by its
//! predecessors, so the spawn order is part of the result.
//!
//! The simulation is resumable. [`HydraulicErosion::run_batch`] simulates a
//! bounded number of droplets and returns, keeping the spawn RNG and the
//! counters, so a scheduler can report progress between batches.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::grid::{ErosionMap, Heightmap};
use crate::params::HydraulicParams;
use crate::seed::droplet_rng;

/// Water volume below which a droplet is considered evaporated.
const MIN_WATER: f32 = 1e-3;
/// Direction length below which a droplet is considered stalled.
const MIN_DIRECTION: f32 = 1e-6;

/// Running totals for one hydraulic pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ErosionStats {
    /// Droplets simulated so far.
    pub droplets: u32,
    /// Droplet steps taken across all droplets.
    pub steps: u64,
    /// Material removed from the heightmap.
    pub eroded: f64,
    /// Material added back to the heightmap.
    pub deposited: f64,
    /// Cell writes dropped because they would have stored NaN or infinity.
    pub rejected_writes: u64,
}

#[derive(Clone, Copy, Debug)]
struct BrushOffset {
    dx: i32,
    dy: i32,
    weight: f32,
}

/// Circular brush with linear falloff `1 - dist / radius`.
fn build_brush(radius: u32) -> Vec<BrushOffset> {
    if radius == 0 {
        return vec![BrushOffset {
            dx: 0,
            dy: 0,
            weight: 1.0,
        }];
    }
    let r = radius as i32;
    let mut brush = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist < radius as f32 {
                brush.push(BrushOffset {
                    dx,
                    dy,
                    weight: 1.0 - dist / radius as f32,
                });
            }
        }
    }
    brush
}

/// Height and gradient at a fractional position, from the 4 surrounding cells.
///
/// The caller guarantees `pos` lies inside `[0, resolution - 1)` on both axes.
fn height_and_gradient(heightmap: &Heightmap, x: f32, y: f32) -> (f32, f32, f32) {
    let cx = x.floor() as u32;
    let cy = y.floor() as u32;
    let u = x - cx as f32;
    let v = y - cy as f32;

    let nw = heightmap.get(cx, cy);
    let ne = heightmap.get(cx + 1, cy);
    let sw = heightmap.get(cx, cy + 1);
    let se = heightmap.get(cx + 1, cy + 1);

    let gx = (ne - nw) * (1.0 - v) + (se - sw) * v;
    let gy = (sw - nw) * (1.0 - u) + (se - ne) * u;
    let h = nw * (1.0 - u) * (1.0 - v) + ne * u * (1.0 - v) + sw * (1.0 - u) * v + se * u * v;
    (h, gx, gy)
}

/// Resumable droplet erosion over one heightmap.
pub struct HydraulicErosion {
    params: HydraulicParams,
    brush: Vec<BrushOffset>,
    rng: ChaCha8Rng,
    completed: u32,
    stats: ErosionStats,
}

impl HydraulicErosion {
    /// Prepare a pass; droplet starts are drawn from a RNG seeded by `seed`.
    pub fn new(params: HydraulicParams, seed: u32) -> Self {
        Self {
            brush: build_brush(params.brush_radius),
            rng: droplet_rng(seed),
            params,
            completed: 0,
            stats: ErosionStats::default(),
        }
    }

    /// Droplets this pass will simulate in total.
    pub fn total_droplets(&self) -> u32 {
        self.params.droplets
    }

    /// Droplets already simulated (or skipped on grids without an interior).
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// `true` once every droplet has run.
    pub fn is_finished(&self) -> bool {
        self.completed >= self.params.droplets
    }

    /// Fraction of droplets done, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.params.droplets == 0 {
            1.0
        } else {
            self.completed as f32 / self.params.droplets as f32
        }
    }

    /// Totals accumulated so far.
    pub fn stats(&self) -> &ErosionStats {
        &self.stats
    }

    /// Simulate up to `max_droplets` droplets and return how many ran.
    ///
    /// # Panics
    ///
    /// Panics if the two grids differ in resolution.
    pub fn run_batch(
        &mut self,
        heightmap: &mut Heightmap,
        erosion: &mut ErosionMap,
        max_droplets: u32,
    ) -> u32 {
        assert_eq!(
            heightmap.resolution(),
            erosion.resolution(),
            "heightmap and erosion map must share a resolution"
        );
        let remaining = self.params.droplets.saturating_sub(self.completed);
        let batch = remaining.min(max_droplets);
        let resolution = heightmap.resolution();

        if resolution < 4 {
            // No interior beyond the 1-cell border: nothing can move.
            self.completed += batch;
            return batch;
        }

        let upper = (resolution - 2) as f32;
        for _ in 0..batch {
            let x = self.rng.random_range(1.0..upper);
            let y = self.rng.random_range(1.0..upper);
            self.simulate_droplet(heightmap, erosion, x, y);
            self.completed += 1;
        }

        debug!(
            completed = self.completed,
            total = self.params.droplets,
            eroded = self.stats.eroded,
            deposited = self.stats.deposited,
            "hydraulic erosion batch finished"
        );
        batch
    }

    /// Simulate every remaining droplet.
    pub fn run_to_completion(&mut self, heightmap: &mut Heightmap, erosion: &mut ErosionMap) {
        while !self.is_finished() {
            let batch = self.params.batch_size.max(1);
            self.run_batch(heightmap, erosion, batch);
        }
    }

    fn in_interior(resolution: u32, x: f32, y: f32) -> bool {
        let upper = (resolution - 2) as f32;
        x >= 1.0 && y >= 1.0 && x < upper && y < upper
    }

    /// Run a single droplet released at grid position `(x, y)`.
    ///
    /// Starts outside the valid interior terminate immediately.
    pub fn simulate_droplet(
        &mut self,
        heightmap: &mut Heightmap,
        erosion: &mut ErosionMap,
        x: f32,
        y: f32,
    ) {
        let p = self.params.clone();
        let resolution = heightmap.resolution();
        self.stats.droplets += 1;

        if resolution < 4 || !Self::in_interior(resolution, x, y) {
            return;
        }

        let (mut pos_x, mut pos_y) = (x, y);
        let (mut dir_x, mut dir_y) = (0.0f32, 0.0f32);
        let mut speed = p.initial_speed;
        let mut water = p.initial_water;
        let mut sediment = 0.0f32;

        for _ in 0..p.max_lifetime {
            self.stats.steps += 1;
            let cell_x = pos_x.floor() as u32;
            let cell_y = pos_y.floor() as u32;
            let u = pos_x - cell_x as f32;
            let v = pos_y - cell_y as f32;

            let (height, grad_x, grad_y) = height_and_gradient(heightmap, pos_x, pos_y);

            dir_x = dir_x * p.inertia - grad_x * (1.0 - p.inertia);
            dir_y = dir_y * p.inertia - grad_y * (1.0 - p.inertia);
            let len = (dir_x * dir_x + dir_y * dir_y).sqrt();
            if !(len.is_finite() && len > MIN_DIRECTION) {
                break;
            }
            dir_x /= len;
            dir_y /= len;
            pos_x += dir_x;
            pos_y += dir_y;

            if !Self::in_interior(resolution, pos_x, pos_y) {
                break;
            }

            let (new_height, _, _) = height_and_gradient(heightmap, pos_x, pos_y);
            let delta_height = new_height - height;
            let capacity = (-delta_height).max(p.min_slope) * speed * water * p.sediment_capacity;

            if sediment > capacity || delta_height > 0.0 {
                let amount = if delta_height > 0.0 {
                    delta_height.min(sediment)
                } else {
                    (sediment - capacity) * p.deposit_speed
                };
                let applied = self.deposit(heightmap, erosion, cell_x, cell_y, u, v, amount);
                sediment -= applied;
            } else {
                let amount = ((capacity - sediment) * p.erode_speed).min(-delta_height);
                let removed = self.erode(heightmap, erosion, cell_x, cell_y, amount);
                sediment += removed;
            }

            speed = (speed * speed + delta_height * p.gravity).max(0.0).sqrt();
            water *= 1.0 - p.evaporate_speed;
            if !(water.is_finite() && speed.is_finite()) || water < MIN_WATER {
                break;
            }
        }
    }

    /// Spread `amount` over the 4 cells around `(cell_x + u, cell_y + v)` by
    /// bilinear weight. Returns the amount actually added.
    #[allow(clippy::too_many_arguments)]
    fn deposit(
        &mut self,
        heightmap: &mut Heightmap,
        erosion: &mut ErosionMap,
        cell_x: u32,
        cell_y: u32,
        u: f32,
        v: f32,
        amount: f32,
    ) -> f32 {
        if !amount.is_finite() || amount <= 0.0 {
            if !amount.is_finite() {
                self.stats.rejected_writes += 4;
            }
            return 0.0;
        }
        let corners = [
            (cell_x, cell_y, (1.0 - u) * (1.0 - v)),
            (cell_x + 1, cell_y, u * (1.0 - v)),
            (cell_x, cell_y + 1, (1.0 - u) * v),
            (cell_x + 1, cell_y + 1, u * v),
        ];
        let mut applied = 0.0;
        for (cx, cy, weight) in corners {
            let delta = amount * weight;
            let i = heightmap.index(cx, cy);
            let new_height = heightmap.cells()[i] + delta;
            let new_erosion = erosion.cells()[i] - delta;
            if !(delta.is_finite() && new_height.is_finite() && new_erosion.is_finite()) {
                self.stats.rejected_writes += 1;
                continue;
            }
            heightmap.cells_mut()[i] = new_height;
            erosion.cells_mut()[i] = new_erosion;
            applied += delta;
        }
        self.stats.deposited += applied as f64;
        applied
    }

    /// Remove `amount` with the circular brush centred on `(cell_x, cell_y)`.
    ///
    /// Weights are renormalised over the in-bounds part of the brush so the
    /// total removed equals `amount`. Returns the amount actually removed.
    fn erode(
        &mut self,
        heightmap: &mut Heightmap,
        erosion: &mut ErosionMap,
        cell_x: u32,
        cell_y: u32,
        amount: f32,
    ) -> f32 {
        if !amount.is_finite() || amount <= 0.0 {
            if !amount.is_finite() {
                self.stats.rejected_writes += 1;
            }
            return 0.0;
        }
        let resolution = heightmap.resolution() as i32;
        let in_bounds = |o: &BrushOffset| {
            let x = cell_x as i32 + o.dx;
            let y = cell_y as i32 + o.dy;
            x >= 0 && y >= 0 && x < resolution && y < resolution
        };
        let weight_sum: f32 = self
            .brush
            .iter()
            .filter(|o| in_bounds(o))
            .map(|o| o.weight)
            .sum();
        if weight_sum <= 0.0 {
            return 0.0;
        }

        let mut removed = 0.0;
        for offset in self.brush.iter().filter(|o| in_bounds(o)) {
            let delta = amount * offset.weight / weight_sum;
            let i = heightmap.index(
                (cell_x as i32 + offset.dx) as u32,
                (cell_y as i32 + offset.dy) as u32,
            );
            let new_height = heightmap.cells()[i] - delta;
            let new_erosion = erosion.cells()[i] + delta;
            if !(delta.is_finite() && new_height.is_finite() && new_erosion.is_finite()) {
                self.stats.rejected_writes += 1;
                continue;
            }
            heightmap.cells_mut()[i] = new_height;
            erosion.cells_mut()[i] = new_erosion;
            removed += delta;
        }
        self.stats.eroded += removed as f64;
        removed
    }
}
