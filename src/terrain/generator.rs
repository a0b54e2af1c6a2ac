use log::{debug, info};
use nalgebra::Vector3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::Terrain;
use crate::config::{RunwayConfig, TerrainConfig, WORLD_EXTENT};

/// One stage of the terrain generation pipeline.
///
/// Exactly one stage runs per [`TerrainBuilder::advance`] call, so a driver
/// can interleave generation with its tick loop without a long stall. Stages
/// never overlap for the same grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStage {
    /// Fix the nine hand-chosen control heights.
    Seed,
    /// One diamond-square pass at `stride = 2^level`.
    Displace { level: u32 },
    /// Clamp below sea level, flatten runways and the border ring.
    Flatten,
    /// Emit two triangles per cell.
    Index,
    /// Per-vertex averaged face normals.
    Normals,
    /// Snow/green height ramp.
    Colors,
    Done,
}

impl GenerationStage {
    pub fn label(&self) -> &'static str {
        match self {
            GenerationStage::Seed => "seeding control heights",
            GenerationStage::Displace { .. } => "displacing midpoints",
            GenerationStage::Flatten => "flattening fields",
            GenerationStage::Index => "generating indices",
            GenerationStage::Normals => "generating normals",
            GenerationStage::Colors => "generating colors",
            GenerationStage::Done => "done",
        }
    }
}

/// Staged diamond-square heightfield generator.
///
/// Determinism: the large-scale shape comes from the seeded control heights;
/// only the midpoint displacement draws from the RNG stream.
pub struct TerrainBuilder {
    config: TerrainConfig,
    runways: RunwayConfig,
    rng: ChaCha8Rng,
    stage: GenerationStage,
    stages_done: u32,
    size: usize,
    heights: Vec<f64>,
    normals: Vec<Vector3<f64>>,
    colors: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl TerrainBuilder {
    pub fn new(config: &TerrainConfig, runways: &RunwayConfig, rng: ChaCha8Rng) -> Self {
        let size = config.grid_size();
        Self {
            config: config.clone(),
            runways: runways.clone(),
            rng,
            stage: GenerationStage::Seed,
            stages_done: 0,
            size,
            heights: vec![0.0; size * size],
            normals: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn stage(&self) -> GenerationStage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == GenerationStage::Done
    }

    /// Fraction of stages completed, in [0, 1].
    pub fn progress(&self) -> f64 {
        // Seed + (L-1) displacement passes + flatten/index/normals/colors.
        let total = self.config.detail_level.max(1) + 4;
        f64::from(self.stages_done) / f64::from(total)
    }

    /// Raw heights, row-major. Valid from the first displacement stage on;
    /// exposed for status displays and tests.
    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Run the pending stage and schedule the next one.
    pub fn advance(&mut self) -> GenerationStage {
        let current = self.stage;
        self.stage = match current {
            GenerationStage::Seed => {
                self.seed();
                self.first_displacement()
            }
            GenerationStage::Displace { level } => {
                self.displace(level);
                if level > 1 {
                    GenerationStage::Displace { level: level - 1 }
                } else {
                    GenerationStage::Flatten
                }
            }
            GenerationStage::Flatten => {
                self.flatten();
                GenerationStage::Index
            }
            GenerationStage::Index => {
                self.generate_indices();
                GenerationStage::Normals
            }
            GenerationStage::Normals => {
                self.generate_normals();
                GenerationStage::Colors
            }
            GenerationStage::Colors => {
                self.generate_colors();
                info!("terrain generation complete ({0}x{0} grid)", self.size);
                GenerationStage::Done
            }
            GenerationStage::Done => GenerationStage::Done,
        };
        if current != GenerationStage::Done {
            self.stages_done += 1;
            debug!(
                "terrain stage finished: {} ({:.0}%)",
                current.label(),
                self.progress() * 100.0
            );
        }
        self.stage
    }

    /// Take the finished terrain. `None` until all stages have run.
    pub fn finish(&mut self) -> Option<Terrain> {
        if !self.is_done() {
            return None;
        }
        Some(Terrain::from_parts(
            self.size,
            std::mem::take(&mut self.heights),
            std::mem::take(&mut self.normals),
            std::mem::take(&mut self.colors),
            std::mem::take(&mut self.indices),
        ))
    }

    /// Run every remaining stage synchronously.
    pub fn build(self) -> Terrain {
        self.build_with(|_, _| {})
    }

    /// Run every remaining stage, reporting each completed stage and the
    /// progress fraction after it.
    pub fn build_with(mut self, mut progress: impl FnMut(GenerationStage, f64)) -> Terrain {
        while !self.is_done() {
            let completed = self.stage();
            self.advance();
            progress(completed, self.progress());
        }
        self.finish().expect("builder just ran to completion")
    }

    #[inline]
    fn at(&self, row: usize, col: usize) -> f64 {
        self.heights[row * self.size + col]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: f64) {
        self.heights[row * self.size + col] = value;
    }

    /// Uniform noise in +-0.5 * amplitude * decay^(L - level).
    fn noise(&mut self, level: u32) -> f64 {
        let falloff = self
            .config
            .decay
            .powi((self.config.detail_level - level) as i32);
        (self.rng.gen::<f64>() - 0.5) * self.config.amplitude * falloff
    }

    fn first_displacement(&self) -> GenerationStage {
        if self.config.detail_level >= 2 {
            GenerationStage::Displace {
                level: self.config.detail_level - 1,
            }
        } else {
            // A 3x3 grid is fully determined by the seeds.
            GenerationStage::Flatten
        }
    }

    /// The nine control heights: corners, edge midpoints, center. Hand-chosen
    /// rather than random so the island always has its central peak, ridged
    /// east/west edges, and low shores towards the runways.
    fn seed(&mut self) {
        let last = self.size - 1;
        let mid = last / 2;
        let c = self.config.corner_height;
        let shore = self.config.shore_height;
        let ridge = self.config.ridge_height;
        self.set(0, 0, c);
        self.set(0, mid, shore);
        self.set(0, last, c);
        self.set(mid, 0, ridge);
        self.set(mid, mid, self.config.peak_height);
        self.set(mid, last, ridge);
        self.set(last, 0, c);
        self.set(last, mid, shore);
        self.set(last, last, c);
    }

    /// One diamond-square pass at `stride = 2^level`.
    fn displace(&mut self, level: u32) {
        let stride = 1usize << level;
        let half = stride / 2;
        let times = (self.size - 1) / stride;

        // Diamond step: each square's center gets the mean of its corners.
        for square_row in 0..times {
            for square_col in 0..times {
                let row = square_row * stride;
                let col = square_col * stride;
                let mean = (self.at(row, col)
                    + self.at(row, col + stride)
                    + self.at(row + stride, col + stride)
                    + self.at(row + stride, col))
                    / 4.0;
                let value = mean + self.noise(level);
                self.set(row + half, col + half, value);
            }
        }

        // Square step: edge midpoints get the mean of their known neighbors,
        // three on the grid boundary and four in the interior (the fourth is
        // the adjacent square's freshly displaced center).
        for square_row in 0..times {
            for square_col in 0..times {
                let row = square_row * stride;
                let col = square_col * stride;

                if square_row == 0 {
                    let mean =
                        (self.at(row, col) + self.at(row + half, col + half) + self.at(row, col + stride)) / 3.0;
                    let value = mean + self.noise(level);
                    self.set(row, col + half, value);
                }

                if square_col == 0 {
                    let mean =
                        (self.at(row, col) + self.at(row + half, col + half) + self.at(row + stride, col)) / 3.0;
                    let value = mean + self.noise(level);
                    self.set(row + half, col, value);
                }

                let top = if square_row == times - 1 {
                    (self.at(row + stride, col)
                        + self.at(row + half, col + half)
                        + self.at(row + stride, col + stride))
                        / 3.0
                } else {
                    (self.at(row + stride, col)
                        + self.at(row + half, col + half)
                        + self.at(row + stride, col + stride)
                        + self.at(row + stride + half, col + half))
                        / 4.0
                };
                let value = top + self.noise(level);
                self.set(row + stride, col + half, value);

                let right = if square_col == times - 1 {
                    (self.at(row, col + stride)
                        + self.at(row + half, col + half)
                        + self.at(row + stride, col + stride))
                        / 3.0
                } else {
                    (self.at(row, col + stride)
                        + self.at(row + half, col + half)
                        + self.at(row + stride, col + stride)
                        + self.at(row + half, col + stride + half))
                        / 4.0
                };
                let value = right + self.noise(level);
                self.set(row + half, col + stride, value);
            }
        }
    }

    /// Sea-level clamp, runway corridors, and the border cliff ring.
    fn flatten(&mut self) {
        let last = self.size - 1;
        let stride = 2.0 * WORLD_EXTENT / last as f64;
        for row in 0..self.size {
            for col in 0..self.size {
                let x = -WORLD_EXTENT + stride * col as f64;
                let y = -WORLD_EXTENT + stride * row as f64;
                let z = self.at(row, col);

                let in_runway = x.abs() <= self.config.runway_half_width
                    && ((y >= self.runways.departure.y_min && y <= self.runways.departure.y_max)
                        || (y >= self.runways.destination.y_min && y <= self.runways.destination.y_max));
                let on_border = row == 0 || col == 0 || row == last || col == last;

                if z < 0.0 || in_runway || on_border {
                    self.set(row, col, 0.0);
                }
            }
        }
    }

    /// Two triangles per cell, counter-clockwise winding.
    fn generate_indices(&mut self) {
        let cells = self.size - 1;
        self.indices = Vec::with_capacity(6 * cells * cells);
        for row in 0..cells {
            for col in 0..cells {
                let base = (row * self.size + col) as u32;
                let next = ((row + 1) * self.size + col) as u32;
                // Lower triangle
                self.indices.push(base);
                self.indices.push(base + 1);
                self.indices.push(next);
                // Upper triangle
                self.indices.push(base + 1);
                self.indices.push(next + 1);
                self.indices.push(next);
            }
        }
    }

    fn vertex_position(&self, row: usize, col: usize) -> Vector3<f64> {
        let stride = 2.0 * WORLD_EXTENT / (self.size - 1) as f64;
        Vector3::new(
            -WORLD_EXTENT + stride * col as f64,
            -WORLD_EXTENT + stride * row as f64,
            self.at(row, col),
        )
    }

    /// Per-vertex normal: the average of the normalized face normals of the
    /// up-to-six triangles meeting at the vertex, renormalized so every
    /// output normal is unit length.
    fn generate_normals(&mut self) {
        let last = self.size - 1;
        self.normals = Vec::with_capacity(self.size * self.size);
        for row in 0..self.size {
            for col in 0..self.size {
                let own = self.vertex_position(row, col);
                let mut sum = Vector3::zeros();

                // Neighbor pairs in fan order around the vertex; each pair
                // spans one adjacent triangle.
                let mut accumulate = |a: (usize, usize), b: (usize, usize)| {
                    let first = own - self.vertex_position(a.0, a.1);
                    let second = own - self.vertex_position(b.0, b.1);
                    sum += first.cross(&second).normalize();
                };

                if row > 0 && col > 0 {
                    accumulate((row, col - 1), (row - 1, col));
                }
                if row > 0 && col < last {
                    accumulate((row - 1, col), (row - 1, col + 1));
                    accumulate((row - 1, col + 1), (row, col + 1));
                }
                if row < last && col < last {
                    accumulate((row, col + 1), (row + 1, col));
                }
                if row < last && col > 0 {
                    accumulate((row + 1, col), (row + 1, col - 1));
                    accumulate((row + 1, col - 1), (row, col - 1));
                }

                // Every vertex touches at least one triangle, so the sum is
                // never zero for a valid heightfield.
                self.normals.push(sum.normalize());
            }
        }
    }

    /// Snow above the snow line, otherwise a green that darkens with height.
    fn generate_colors(&mut self) {
        let snow_line = self.config.snow_line;
        self.colors = Vec::with_capacity(self.size * self.size);
        for row in 0..self.size {
            for col in 0..self.size {
                let height = self.at(row, col);
                let color = if height > snow_line {
                    // Overbright white reads as sunlit snow.
                    [1.4, 1.4, 1.4]
                } else {
                    let green = 1.2 - height / snow_line * 0.9;
                    [0.0, green as f32, 0.0]
                };
                self.colors.push(color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn builder(config: &TerrainConfig) -> TerrainBuilder {
        TerrainBuilder::new(config, &RunwayConfig::default(), ChaCha8Rng::seed_from_u64(7))
    }

    #[test]
    fn test_stage_sequence() {
        let config = TerrainConfig {
            detail_level: 3,
            ..TerrainConfig::default()
        };
        let mut b = builder(&config);
        assert_eq!(b.stage(), GenerationStage::Seed);
        assert_eq!(b.advance(), GenerationStage::Displace { level: 2 });
        assert_eq!(b.advance(), GenerationStage::Displace { level: 1 });
        assert_eq!(b.advance(), GenerationStage::Flatten);
        assert_eq!(b.advance(), GenerationStage::Index);
        assert_eq!(b.advance(), GenerationStage::Normals);
        assert_eq!(b.advance(), GenerationStage::Colors);
        assert_eq!(b.advance(), GenerationStage::Done);
        assert!(b.is_done());
        assert_relative_eq!(b.progress(), 1.0);
    }

    #[test]
    fn test_build_with_reports_every_stage() {
        let config = TerrainConfig {
            detail_level: 2,
            ..TerrainConfig::default()
        };
        let mut seen = Vec::new();
        let mut last_progress = 0.0;
        builder(&config).build_with(|stage, progress| {
            seen.push(stage);
            assert!(progress > last_progress);
            last_progress = progress;
        });
        assert_eq!(
            seen,
            vec![
                GenerationStage::Seed,
                GenerationStage::Displace { level: 1 },
                GenerationStage::Flatten,
                GenerationStage::Index,
                GenerationStage::Normals,
                GenerationStage::Colors,
            ]
        );
        assert_relative_eq!(last_progress, 1.0);
    }

    #[test]
    fn test_finish_only_when_done() {
        let config = TerrainConfig {
            detail_level: 2,
            ..TerrainConfig::default()
        };
        let mut b = builder(&config);
        assert!(b.finish().is_none());
        while !b.is_done() {
            b.advance();
        }
        assert!(b.finish().is_some());
    }

    #[test]
    fn test_zero_amplitude_matches_analytic_grid() {
        // With the noise amplitude pinned to zero, every displaced height is
        // the exact mean of its diamond/square neighbors. For L=2 (a 5x5
        // grid) the whole field follows by hand from the nine seeds.
        let config = TerrainConfig {
            detail_level: 2,
            amplitude: 0.0,
            ..TerrainConfig::default()
        };
        let mut b = builder(&config);
        while b.stage() != GenerationStage::Flatten {
            b.advance();
        }

        let third = 1.0 / 3.0;
        let tenth_third = 0.1 / 3.0;
        #[rustfmt::skip]
        let expected = [
            0.1,   tenth_third, -0.3,  tenth_third, 0.1,
            third, 0.3,          0.275, 0.3,        third,
            0.6,   0.5,          0.8,   0.5,        0.6,
            third, 0.3,          0.275, 0.3,        third,
            0.1,   tenth_third, -0.3,  tenth_third, 0.1,
        ];
        for (i, (&got, &want)) in b.heights().iter().zip(expected.iter()).enumerate() {
            assert_relative_eq!(got, want, epsilon = 1e-12, max_relative = 1e-12);
            let _ = i;
        }
    }

    #[test]
    fn test_flatten_invariants() {
        let config = TerrainConfig {
            detail_level: 5,
            ..TerrainConfig::default()
        };
        let terrain = builder(&config).build();
        let size = terrain.size();
        for row in 0..size {
            for col in 0..size {
                let p = terrain.position(row, col);
                assert!(p.z >= 0.0, "negative height at ({row}, {col})");
                if row == 0 || col == 0 || row == size - 1 || col == size - 1 {
                    assert_eq!(p.z, 0.0, "border not flattened at ({row}, {col})");
                }
                let in_runway = p.x.abs() <= config.runway_half_width
                    && (((-1.0..=-0.9).contains(&p.y)) || ((0.9..=1.0).contains(&p.y)));
                if in_runway {
                    assert_eq!(p.z, 0.0, "runway not flattened at ({row}, {col})");
                }
            }
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        let config = TerrainConfig {
            detail_level: 4,
            ..TerrainConfig::default()
        };
        let terrain = builder(&config).build();
        for normal in terrain.normals() {
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_normals_point_upward_on_flat_ground() {
        let config = TerrainConfig {
            detail_level: 3,
            amplitude: 0.0,
            corner_height: 0.0,
            shore_height: 0.0,
            ridge_height: 0.0,
            peak_height: 0.0,
            ..TerrainConfig::default()
        };
        let terrain = builder(&config).build();
        for normal in terrain.normals() {
            assert_relative_eq!(normal.z, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_colors_follow_height_ramp() {
        let config = TerrainConfig {
            detail_level: 5,
            ..TerrainConfig::default()
        };
        let terrain = builder(&config).build();
        let size = terrain.size();
        for row in 0..size {
            for col in 0..size {
                let height = terrain.height(row, col);
                let color = terrain.color(row, col);
                if height > config.snow_line {
                    assert_eq!(color, [1.4, 1.4, 1.4]);
                } else {
                    assert_eq!(color[0], 0.0);
                    assert_eq!(color[2], 0.0);
                    let want = (1.2 - height / config.snow_line * 0.9) as f32;
                    assert_relative_eq!(color[1], want);
                }
            }
        }
    }

    #[test]
    fn test_index_count_and_bounds() {
        let config = TerrainConfig {
            detail_level: 3,
            ..TerrainConfig::default()
        };
        let terrain = builder(&config).build();
        let size = terrain.size();
        assert_eq!(terrain.indices().len(), 6 * (size - 1) * (size - 1));
        assert!(terrain.indices().iter().all(|&i| (i as usize) < size * size));
    }

    #[test]
    fn test_same_seed_reproduces_heights() {
        let config = TerrainConfig {
            detail_level: 4,
            ..TerrainConfig::default()
        };
        let a = builder(&config).build();
        let b = builder(&config).build();
        assert_eq!(a.heights(), b.heights());
    }
}
