//! Thermal erosion: slope relaxation towards the talus angle.
//!
//! Every sweep visits interior cells in row-major order and moves half of the
//! excess slope from a cell to its steepest-downhill 4-neighbour. Reads and
//! writes go to the same grid, so a cell may see neighbours already updated
//! earlier in the same sweep. Results depend on that visiting order.

use tracing::trace;

use crate::grid::Heightmap;
use crate::params::ThermalParams;

/// Neighbour visiting order; the first steepest neighbour wins ties.
const NEIGHBORS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Outcome of one full-grid sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThermalSweep {
    /// `Σ|Δheight|` over all cells touched in the sweep.
    pub moved: f64,
    /// Number of source/target transfers applied.
    pub transfers: u32,
    /// Transfers dropped because they would have stored NaN or infinity.
    pub rejected_writes: u32,
}

/// Iterative, in-place talus relaxation.
#[derive(Clone, Debug)]
pub struct ThermalErosion {
    params: ThermalParams,
}

impl ThermalErosion {
    /// Create a simulator for the given settings.
    pub fn new(params: ThermalParams) -> Self {
        Self { params }
    }

    /// Number of sweeps [`Self::run`] performs.
    pub fn iterations(&self) -> u32 {
        self.params.iterations
    }

    /// Run one sweep over every interior cell.
    pub fn sweep(&self, heightmap: &mut Heightmap) -> ThermalSweep {
        let mut result = ThermalSweep::default();
        let resolution = heightmap.resolution();
        if resolution < 3 {
            return result;
        }
        let talus = self.params.talus_angle;

        for y in 1..resolution - 1 {
            for x in 1..resolution - 1 {
                let source = heightmap.index(x, y);
                let height = heightmap.cells()[source];

                let mut steepest = f32::NEG_INFINITY;
                let mut target = source;
                for (dx, dy) in NEIGHBORS {
                    let n = heightmap.index((x as i32 + dx) as u32, (y as i32 + dy) as u32);
                    let delta = height - heightmap.cells()[n];
                    if delta > steepest {
                        steepest = delta;
                        target = n;
                    }
                }

                if steepest > talus {
                    let transfer = (steepest - talus) * 0.5;
                    let cells = heightmap.cells_mut();
                    let new_source = cells[source] - transfer;
                    let new_target = cells[target] + transfer;
                    if !(transfer.is_finite() && new_source.is_finite() && new_target.is_finite())
                    {
                        result.rejected_writes += 1;
                        continue;
                    }
                    cells[source] = new_source;
                    cells[target] = new_target;
                    result.moved += 2.0 * transfer as f64;
                    result.transfers += 1;
                }
            }
        }

        trace!(
            moved = result.moved,
            transfers = result.transfers,
            "thermal sweep"
        );
        result
    }

    /// Run every configured sweep and return them in order.
    pub fn run(&self, heightmap: &mut Heightmap) -> Vec<ThermalSweep> {
        (0..self.params.iterations)
            .map(|_| self.sweep(heightmap))
            .collect()
    }
}
