mod generator;

pub use generator::{GenerationStage, TerrainBuilder};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::config::WORLD_EXTENT;

/// A finished, immutable heightfield.
///
/// A value of this type only exists once every generation stage has run, so
/// holding a `&Terrain` is itself the readiness guarantee. The grid is square
/// with `size()` vertices per side spanning x, y in [-1, 1]; heights, normals,
/// colors, and triangle indices are stored row-major (rows along y).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrain {
    size: usize,
    heights: Vec<f64>,
    normals: Vec<Vector3<f64>>,
    colors: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl Terrain {
    pub(crate) fn from_parts(
        size: usize,
        heights: Vec<f64>,
        normals: Vec<Vector3<f64>>,
        colors: Vec<[f32; 3]>,
        indices: Vec<u32>,
    ) -> Self {
        debug_assert_eq!(heights.len(), size * size);
        debug_assert_eq!(normals.len(), size * size);
        debug_assert_eq!(colors.len(), size * size);
        debug_assert_eq!(indices.len(), 6 * (size - 1) * (size - 1));
        Self {
            size,
            heights,
            normals,
            colors,
            indices,
        }
    }

    /// Vertices per grid side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// World-space distance between adjacent vertices.
    pub fn stride(&self) -> f64 {
        2.0 * WORLD_EXTENT / (self.size - 1) as f64
    }

    #[inline]
    fn vertex(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    pub fn height(&self, row: usize, col: usize) -> f64 {
        self.heights[self.vertex(row, col)]
    }

    /// World-space position of a grid vertex.
    pub fn position(&self, row: usize, col: usize) -> Vector3<f64> {
        Vector3::new(
            -WORLD_EXTENT + self.stride() * col as f64,
            -WORLD_EXTENT + self.stride() * row as f64,
            self.height(row, col),
        )
    }

    pub fn normal(&self, row: usize, col: usize) -> Vector3<f64> {
        self.normals[self.vertex(row, col)]
    }

    pub fn color(&self, row: usize, col: usize) -> [f32; 3] {
        self.colors[self.vertex(row, col)]
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Interpolated terrain height at a horizontal position.
    ///
    /// Locates the containing cell, picks its lower or upper triangle by the
    /// sum of the cell-local fractional coordinates, and interpolates along
    /// the triangle plane from its anchor vertex. Returns `None` outside the
    /// grid.
    pub fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        let stride = self.stride();
        let fx = (x + WORLD_EXTENT) / stride;
        let fy = (y + WORLD_EXTENT) / stride;
        let col = fx.floor() as isize;
        let row = fy.floor() as isize;
        let last_cell = (self.size - 2) as isize;
        if col < 0 || col > last_cell || row < 0 || row > last_cell {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        let dx = fx - col as f64;
        let dy = fy - row as f64;

        let z = if dx + dy <= 1.0 {
            // Lower triangle: anchored at (row, col).
            let anchor = self.height(row, col);
            let grad_x = self.height(row, col + 1) - anchor;
            let grad_y = self.height(row + 1, col) - anchor;
            anchor + dx * grad_x + dy * grad_y
        } else {
            // Upper triangle: anchored at (row + 1, col + 1).
            let anchor = self.height(row + 1, col + 1);
            let grad_x = anchor - self.height(row + 1, col);
            let grad_y = anchor - self.height(row, col + 1);
            anchor - (1.0 - dx) * grad_x - (1.0 - dy) * grad_y
        };
        Some(z)
    }
}
