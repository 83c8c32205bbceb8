//! Point-set transform operators. Each operator consumes its input cloud
//! and returns a new one, keeping ownership linear through the pipeline.
use std::str::FromStr;

use glam::Vec3;
use rand::Rng;

use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use crate::math;

/// Point-selection strategy for [`PointCloud::sample`]. Only uniform
/// selection exists; any other name is an explicit error rather than a
/// silent empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStrategy {
    Uniform,
}

impl FromStr for SampleStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uniform" | "0" => Ok(Self::Uniform),
            other => Err(Error::UnsupportedStrategy(other.to_string())),
        }
    }
}

impl PointCloud {
    /// Select `floor(len * ratio)` distinct points uniformly without
    /// replacement, by rejection sampling: draw a random index, retry on
    /// repeats. Points are copied in selection order.
    pub fn sample<R: Rng>(
        self,
        ratio: f32,
        strategy: SampleStrategy,
        rng: &mut R,
    ) -> Result<PointCloud> {
        let target = ((self.len() as f64) * f64::from(ratio)) as usize;
        let target = target.min(self.len());

        match strategy {
            SampleStrategy::Uniform => {
                let mut selected = vec![false; self.len()];
                let mut out = PointCloud::with_capacity(target)?;
                while out.len() < target {
                    let index = rng.gen_range(0..self.len());
                    if !selected[index] {
                        selected[index] = true;
                        out.push(self.positions[index], self.colors[index]);
                    }
                }
                Ok(out)
            }
        }
    }

    /// Quantize every coordinate to the nearest multiple of `voxel_size`.
    /// Colors are untouched, and coincident points are left in place;
    /// collapsing them is the dedup stage's job.
    pub fn voxelize(mut self, voxel_size: f32) -> PointCloud {
        for p in &mut self.positions {
            *p = math::quantize_vec3(*p, voxel_size);
        }
        self
    }

    /// Sort points lexicographically, then collapse consecutive equal runs.
    /// The first-seen position of each run is kept (so the very first
    /// record always survives) and a later duplicate re-colors it, keeping
    /// the color of the last occurrence in the run.
    pub fn remove_duplicates(self) -> Result<PointCloud> {
        let mut records: Vec<(Vec3, [u8; 3])> =
            self.positions.into_iter().zip(self.colors).collect();
        // Stable sort with an iteratively driven merge, so huge clouds
        // cannot exhaust the stack.
        records.sort_by(|a, b| math::lex_cmp(a.0, b.0));

        if records.is_empty() {
            return PointCloud::with_capacity(0);
        }

        // Count unique representatives first so the output is a single
        // exact allocation.
        let mut unique = 1usize;
        for pair in records.windows(2) {
            if !math::vec3_equal(pair[1].0, pair[0].0) {
                unique += 1;
            }
        }

        let mut out = PointCloud::with_capacity(unique)?;
        out.push(records[0].0, records[0].1);
        for i in 1..records.len() {
            let (position, color) = records[i];
            if math::vec3_equal(position, records[i - 1].0) {
                let last = out.len() - 1;
                out.colors[last] = color;
            } else {
                out.push(position, color);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn numbered_cloud(count: usize) -> PointCloud {
        let mut cloud = PointCloud::default();
        for i in 0..count {
            cloud.push(Vec3::new(i as f32, 0.0, 0.0), [i as u8, 0, 0]);
        }
        cloud
    }

    #[test]
    fn sample_returns_exactly_floor_of_ratio() {
        let mut rng = StdRng::seed_from_u64(7);
        let out = numbered_cloud(10)
            .sample(0.5, SampleStrategy::Uniform, &mut rng)
            .unwrap();
        assert_eq!(out.len(), 5);

        let mut rng = StdRng::seed_from_u64(7);
        let out = numbered_cloud(9)
            .sample(0.5, SampleStrategy::Uniform, &mut rng)
            .unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn sample_never_repeats_an_index() {
        let mut rng = StdRng::seed_from_u64(99);
        let out = numbered_cloud(64)
            .sample(0.75, SampleStrategy::Uniform, &mut rng)
            .unwrap();
        let mut seen: Vec<u32> = out.positions.iter().map(|p| p.x as u32).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), out.len());
    }

    #[test]
    fn sample_of_empty_cloud_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = PointCloud::default()
            .sample(0.5, SampleStrategy::Uniform, &mut rng)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_strategy_is_an_error() {
        let err = "poisson".parse::<SampleStrategy>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedStrategy(name) if name == "poisson"));
    }

    #[test]
    fn voxelize_snaps_to_grid_and_keeps_colors() {
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(0.12, 0.26, -0.07), [9, 8, 7]);
        let out = cloud.voxelize(0.1);
        assert_eq!(out.positions[0], Vec3::new(0.1, 0.1 * 3.0, -0.1));
        assert_eq!(out.colors[0], [9, 8, 7]);
    }

    #[test]
    fn voxelize_does_not_collapse_duplicates() {
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(0.01, 0.0, 0.0), [1, 0, 0]);
        cloud.push(Vec3::new(0.02, 0.0, 0.0), [2, 0, 0]);
        let out = cloud.voxelize(0.1);
        assert_eq!(out.len(), 2);
        assert_eq!(out.positions[0], out.positions[1]);
    }

    #[test]
    fn voxelize_is_idempotent_for_a_fixed_grid() {
        let mut cloud = PointCloud::default();
        for i in 0..32 {
            let f = i as f32;
            cloud.push(Vec3::new(f.sin(), f.cos(), f * 0.11), [0; 3]);
        }
        let once = cloud.voxelize(0.05);
        let twice = once.clone().voxelize(0.05);
        assert_eq!(once, twice);
    }

    #[test]
    fn dedup_collapses_equal_points_keeping_latest_color() {
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(1.0, 0.0, 0.0), [1, 1, 1]);
        cloud.push(Vec3::new(0.0, 0.0, 0.0), [2, 2, 2]);
        cloud.push(Vec3::new(1.0, 0.0, 0.0), [3, 3, 3]);
        let out = cloud.remove_duplicates().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out.positions[0], Vec3::ZERO);
        assert_eq!(out.positions[1], Vec3::new(1.0, 0.0, 0.0));
        // the duplicate that sorts later supplies the color
        assert_eq!(out.colors[1], [3, 3, 3]);
    }

    #[test]
    fn dedup_keeps_the_first_record_of_a_leading_run() {
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::ZERO, [1, 0, 0]);
        cloud.push(Vec3::ZERO, [2, 0, 0]);
        let out = cloud.remove_duplicates().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.positions[0], Vec3::ZERO);
    }

    #[test]
    fn dedup_is_idempotent() {
        let mut cloud = PointCloud::default();
        for i in 0..40 {
            let f = (i % 10) as f32;
            cloud.push(Vec3::new(f, -f, f * 2.0), [i as u8; 3]);
        }
        let once = cloud.remove_duplicates().unwrap();
        assert_eq!(once.len(), 10);
        let twice = once.clone().remove_duplicates().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn dedup_of_empty_cloud_is_empty() {
        let out = PointCloud::default().remove_duplicates().unwrap();
        assert!(out.is_empty());
    }
}
