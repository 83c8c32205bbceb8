//! Software point rasterizer with per-pixel nearest-depth resolution.
use std::path::Path;

use glam::{Mat4, Vec3};
use image::RgbImage;

use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use crate::math;

/// Depth-buffer clear value. It sits outside the valid NDC depth range
/// `[0, 1]`, so the first in-range write at a pixel always wins.
pub const DEPTH_CLEAR: f32 = 2.0;

/// True when an NDC coordinate survives view-frustum culling.
pub(crate) fn in_frustum(ndc: Vec3) -> bool {
    (-1.0..=1.0).contains(&ndc.x)
        && (-1.0..=1.0).contains(&ndc.y)
        && (0.0..=1.0).contains(&ndc.z)
}

/// Map an in-frustum NDC coordinate to a flattened pixel index, clamping
/// the `+1` edge back onto the grid.
pub(crate) fn pixel_index(width: usize, height: usize, ndc: Vec3) -> usize {
    let px = (((ndc.x + 1.0) * 0.5 * width as f32) as usize).min(width - 1);
    let py = (((ndc.y + 1.0) * 0.5 * height as f32) as usize).min(height - 1);
    py * width + px
}

/// An RGB pixel grid plus a z-buffer. Created once per rendering batch and
/// cleared between views.
pub struct Canvas {
    width: usize,
    height: usize,
    background: [u8; 3],
    pixels: Vec<[u8; 3]>,
    depth: Vec<f32>,
}

impl Canvas {
    /// A canvas starts cleared: background pixels, depth at [`DEPTH_CLEAR`].
    pub fn new(width: usize, height: usize, background: [u8; 3]) -> Result<Self> {
        let count = width * height;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation { requested: count })?;
        pixels.resize(count, background);
        let mut depth = Vec::new();
        depth
            .try_reserve_exact(count)
            .map_err(|_| Error::Allocation { requested: count })?;
        depth.resize(count, DEPTH_CLEAR);
        Ok(Self {
            width,
            height,
            background,
            pixels,
            depth,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        self.pixels[y * self.width + x]
    }

    /// Reset every pixel to the background color and the depth buffer to
    /// [`DEPTH_CLEAR`].
    pub fn clear(&mut self) {
        self.pixels.fill(self.background);
        self.depth.fill(DEPTH_CLEAR);
    }

    /// Project every point and write the nearest one per pixel. A point is
    /// culled when its NDC leaves `[-1,1]` in x or y, or `[0,1]` in depth.
    /// The depth test is strict `<`, so among equal depths the first
    /// writer keeps the pixel.
    pub fn draw_points(&mut self, mvp: &Mat4, cloud: &PointCloud) {
        for (position, color) in cloud.positions.iter().zip(&cloud.colors) {
            let ndc = math::ndc(mvp, *position);
            if !in_frustum(ndc) {
                continue;
            }
            let index = pixel_index(self.width, self.height, ndc);
            if ndc.z < self.depth[index] {
                self.depth[index] = ndc.z;
                self.pixels[index] = *color;
            }
        }
    }

    /// Persist the canvas as a PNG, flipping rows so the bottom scanline
    /// of NDC space ends up at the bottom of the image.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let mut img = RgbImage::new(self.width as u32, self.height as u32);
        for y in 0..self.height {
            let src_row = self.height - 1 - y;
            for x in 0..self.width {
                img.put_pixel(
                    x as u32,
                    y as u32,
                    image::Rgb(self.pixels[src_row * self.width + x]),
                );
            }
        }
        img.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [u8; 3] = [255, 255, 255];
    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    fn single_point(position: Vec3, color: [u8; 3]) -> PointCloud {
        let mut cloud = PointCloud::default();
        cloud.push(position, color);
        cloud
    }

    #[test]
    fn center_point_colors_exactly_one_pixel() {
        let mut canvas = Canvas::new(4, 4, WHITE).unwrap();
        canvas.draw_points(&Mat4::IDENTITY, &single_point(Vec3::new(0.0, 0.0, 0.5), RED));
        for y in 0..4 {
            for x in 0..4 {
                let expected = if (x, y) == (2, 2) { RED } else { WHITE };
                assert_eq!(canvas.pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn nearer_point_wins_the_pixel() {
        let mut canvas = Canvas::new(4, 4, WHITE).unwrap();
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(0.0, 0.0, 0.8), RED);
        cloud.push(Vec3::new(0.0, 0.0, 0.2), BLUE);
        canvas.draw_points(&Mat4::IDENTITY, &cloud);
        assert_eq!(canvas.pixel(2, 2), BLUE);
    }

    #[test]
    fn equal_depth_keeps_the_first_writer() {
        let mut canvas = Canvas::new(4, 4, WHITE).unwrap();
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(0.0, 0.0, 0.5), RED);
        cloud.push(Vec3::new(0.0, 0.0, 0.5), BLUE);
        canvas.draw_points(&Mat4::IDENTITY, &cloud);
        assert_eq!(canvas.pixel(2, 2), RED);
    }

    #[test]
    fn out_of_frustum_points_are_culled() {
        let mut canvas = Canvas::new(4, 4, WHITE).unwrap();
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(1.5, 0.0, 0.5), RED); // x out
        cloud.push(Vec3::new(0.0, -1.2, 0.5), RED); // y out
        cloud.push(Vec3::new(0.0, 0.0, -0.1), RED); // behind near plane
        cloud.push(Vec3::new(0.0, 0.0, 1.1), RED); // beyond far plane
        canvas.draw_points(&Mat4::IDENTITY, &cloud);
        assert!(canvas.pixels().iter().all(|p| *p == WHITE));
    }

    #[test]
    fn edge_coordinates_clamp_onto_the_grid() {
        let mut canvas = Canvas::new(4, 4, WHITE).unwrap();
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(1.0, 1.0, 0.5), RED);
        cloud.push(Vec3::new(-1.0, -1.0, 0.5), BLUE);
        canvas.draw_points(&Mat4::IDENTITY, &cloud);
        assert_eq!(canvas.pixel(3, 3), RED);
        assert_eq!(canvas.pixel(0, 0), BLUE);
    }

    #[test]
    fn clear_resets_pixels_and_depth() {
        let mut canvas = Canvas::new(4, 4, WHITE).unwrap();
        canvas.draw_points(&Mat4::IDENTITY, &single_point(Vec3::new(0.0, 0.0, 0.1), RED));
        canvas.clear();
        assert!(canvas.pixels().iter().all(|p| *p == WHITE));
        // after a clear a farther point can win the pixel again
        canvas.draw_points(&Mat4::IDENTITY, &single_point(Vec3::new(0.0, 0.0, 0.9), BLUE));
        assert_eq!(canvas.pixel(2, 2), BLUE);
    }
}
