//! Per-tile visibility attribution: how many screen pixels each spatial
//! tile wins across the views of a trajectory.
use glam::Mat4;
use rayon::prelude::*;

use crate::camera::Trajectory;
use crate::canvas::{self, DEPTH_CLEAR};
use crate::cloud::PointCloud;
use crate::error::Result;
use crate::math;
use crate::tile::TileGrid;

/// Pixel counts per view and tile, `counts[view][tile]`, plus the screen
/// size they were measured against.
#[derive(Debug, Clone)]
pub struct TileVisibility {
    pub counts: Vec<Vec<u64>>,
    pub width: usize,
    pub height: usize,
}

impl TileVisibility {
    pub fn view_count(&self) -> usize {
        self.counts.len()
    }

    pub fn tile_count(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }

    pub fn total_pixels(&self) -> u64 {
        (self.width * self.height) as u64
    }

    /// Pixels won by any tile in one view.
    pub fn pixel_count(&self, view: usize) -> u64 {
        self.counts[view].iter().sum()
    }
}

/// Rasterize the cloud once per view and attribute each covered pixel to
/// the tile of the nearest point landing on it. Tile membership uses the
/// cloud's own bounding box, so the counts describe how this cloud's
/// spatial regions share the screen.
///
/// Views are independent and run in parallel.
pub fn count_pixel_per_tile(
    cloud: &PointCloud,
    grid: &TileGrid,
    trajectory: &Trajectory,
) -> Result<TileVisibility> {
    let aabb = cloud.aabb()?;
    let tile_ids: Vec<usize> = cloud
        .positions
        .iter()
        .map(|p| grid.tile_id(&aabb, *p))
        .collect();

    let width = trajectory.width;
    let height = trajectory.height;
    let counts = trajectory
        .mvps
        .par_iter()
        .map(|mvp| count_view(cloud, &tile_ids, grid.tile_count(), mvp, width, height))
        .collect();

    Ok(TileVisibility {
        counts,
        width,
        height,
    })
}

fn count_view(
    cloud: &PointCloud,
    tile_ids: &[usize],
    tile_count: usize,
    mvp: &Mat4,
    width: usize,
    height: usize,
) -> Vec<u64> {
    // Winner buffer: which tile owns each pixel, -1 while unclaimed.
    let mut winner = vec![-1i64; width * height];
    let mut depth = vec![DEPTH_CLEAR; width * height];

    for (i, position) in cloud.positions.iter().enumerate() {
        let ndc = math::ndc(mvp, *position);
        if !canvas::in_frustum(ndc) {
            continue;
        }
        let index = canvas::pixel_index(width, height, ndc);
        if ndc.z < depth[index] {
            depth[index] = ndc.z;
            winner[index] = tile_ids[i] as i64;
        }
    }

    let mut counts = vec![0u64; tile_count];
    for &tile in &winner {
        if tile >= 0 {
            counts[tile as usize] += 1;
        }
    }
    counts
}
