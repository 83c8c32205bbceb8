//! Regular 3D grid partitioning of a point cloud's bounding box.
use std::str::FromStr;

use glam::Vec3;

use crate::aabb::Aabb;
use crate::cloud::PointCloud;
use crate::error::{Error, Result};

/// Integer divisions per axis over a bounding box. Cell ids are flattened
/// row-major: `id = z + y * nz + x * ny * nz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub nx: u32,
    pub ny: u32,
    pub nz: u32,
}

impl Default for TileGrid {
    /// A single cell spanning the whole box.
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl TileGrid {
    pub fn new(nx: u32, ny: u32, nz: u32) -> Self {
        Self {
            nx: nx.max(1),
            ny: ny.max(1),
            nz: nz.max(1),
        }
    }

    pub fn tile_count(&self) -> usize {
        self.nx as usize * self.ny as usize * self.nz as usize
    }

    /// Cell index of `v` inside `aabb`, by linear interpolation of the
    /// position between the box extents. A point on the closed upper
    /// boundary of an axis lands in the last cell of that axis, and
    /// floating-point drift outside the box clamps to the nearest cell
    /// rather than being dropped.
    pub fn tile_id(&self, aabb: &Aabb, v: Vec3) -> usize {
        let n = Vec3::new(self.nx as f32, self.ny as f32, self.nz as f32);
        // A zero-extent axis divides to non-finite; the saturating casts
        // below collapse that to cell 0.
        let cell = (v - aabb.min) / aabb.dimensions() * n;
        let ix = (cell.x as i64).clamp(0, self.nx as i64 - 1) as usize;
        let iy = (cell.y as i64).clamp(0, self.ny as i64 - 1) as usize;
        let iz = (cell.z as i64).clamp(0, self.nz as i64 - 1) as usize;
        iz + iy * self.nz as usize + ix * self.ny as usize * self.nz as usize
    }

    /// Partition `cloud` into `nx * ny * nz` sub-clouds. Two passes: the
    /// first tallies per-tile counts so each sub-cloud is allocated once,
    /// the second scatters points into their tiles. Empty tiles are kept
    /// in the output.
    pub fn tile(&self, cloud: PointCloud) -> Result<Vec<PointCloud>> {
        let aabb = cloud.aabb()?;
        if let Some(index) = cloud.positions.iter().position(|p| !p.is_finite()) {
            return Err(Error::OutOfRange { index });
        }

        let mut counts = vec![0usize; self.tile_count()];
        for p in &cloud.positions {
            counts[self.tile_id(&aabb, *p)] += 1;
        }

        let mut tiles = Vec::with_capacity(self.tile_count());
        for &count in &counts {
            tiles.push(PointCloud::with_capacity(count)?);
        }
        for (position, color) in cloud.positions.into_iter().zip(cloud.colors) {
            let id = self.tile_id(&aabb, position);
            tiles[id].push(position, color);
        }
        Ok(tiles)
    }
}

impl FromStr for TileGrid {
    type Err = Error;

    /// Parse `nx,ny,nz`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| Error::MalformedInput(format!("tile divisions `{s}`, expected nx,ny,nz")))?;
        match parts[..] {
            [nx, ny, nz] => Ok(TileGrid::new(nx, ny, nz)),
            _ => Err(Error::MalformedInput(format!(
                "tile divisions `{s}`, expected nx,ny,nz"
            ))),
        }
    }
}
