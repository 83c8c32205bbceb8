//! Point cloud storage: parallel position and color buffers.
use glam::Vec3;
use rayon::prelude::*;

use crate::aabb::Aabb;
use crate::error::{Error, Result};

/// Chunk size for the parallel extrema reduction.
const BOUNDS_CHUNK: usize = 25_000;

/// A point set with one RGB color per point.
/// Invariant: `positions.len() == colors.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub colors: Vec<[u8; 3]>,
}

impl PointCloud {
    /// Allocate an empty cloud with room for `count` points, surfacing
    /// exhaustion as an error instead of aborting.
    pub fn with_capacity(count: usize) -> Result<Self> {
        let mut positions = Vec::new();
        positions
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation { requested: count })?;
        let mut colors = Vec::new();
        colors
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation { requested: count })?;
        Ok(Self { positions, colors })
    }

    /// Allocate a zero-filled cloud of `count` points.
    pub fn with_size(count: usize) -> Result<Self> {
        let mut cloud = Self::with_capacity(count)?;
        cloud.positions.resize(count, Vec3::ZERO);
        cloud.colors.resize(count, [0; 3]);
        Ok(cloud)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn push(&mut self, position: Vec3, color: [u8; 3]) {
        self.positions.push(position);
        self.colors.push(color);
    }

    /// Per-axis minimum, seeded from the first point so an empty cloud
    /// fails rather than returning garbage extrema.
    pub fn min(&self) -> Result<Vec3> {
        if self.positions.is_empty() {
            return Err(Error::EmptyInput);
        }
        let min = self
            .positions
            .par_chunks(BOUNDS_CHUNK)
            .map(|chunk| chunk[1..].iter().fold(chunk[0], |acc, p| acc.min(*p)))
            .reduce_with(Vec3::min);
        Ok(min.unwrap_or(self.positions[0]))
    }

    /// Per-axis maximum. Same seeding rule as [`PointCloud::min`].
    pub fn max(&self) -> Result<Vec3> {
        if self.positions.is_empty() {
            return Err(Error::EmptyInput);
        }
        let max = self
            .positions
            .par_chunks(BOUNDS_CHUNK)
            .map(|chunk| chunk[1..].iter().fold(chunk[0], |acc, p| acc.max(*p)))
            .reduce_with(Vec3::max);
        Ok(max.unwrap_or(self.positions[0]))
    }

    pub fn aabb(&self) -> Result<Aabb> {
        Aabb::new(self.min()?, self.max()?)
    }

    /// Concatenate clouds in input order. Consumes the inputs; the result
    /// holds the only copy of every point.
    pub fn merge(clouds: Vec<PointCloud>) -> Result<PointCloud> {
        let total = clouds.iter().map(PointCloud::len).sum();
        let mut out = PointCloud::with_capacity(total)?;
        for cloud in clouds {
            out.positions.extend(cloud.positions);
            out.colors.extend(cloud.colors);
        }
        Ok(out)
    }
}
