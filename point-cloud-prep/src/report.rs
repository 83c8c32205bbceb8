//! JSON reports emitted by the analysis operators.
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::visibility::TileVisibility;

#[derive(Debug, Serialize)]
pub struct TileVisibilityReport {
    pub view: Vec<ViewVisibility>,
}

#[derive(Debug, Serialize)]
pub struct ViewVisibility {
    pub id: usize,
    #[serde(rename = "tile-visibility")]
    pub tile_visibility: Vec<TileShare>,
}

#[derive(Debug, Serialize)]
pub struct TileShare {
    pub id: usize,
    #[serde(rename = "pixel-count")]
    pub pixel_count: u64,
    /// Fraction of the whole screen this tile's pixels cover.
    #[serde(rename = "screen-ratio")]
    pub screen_ratio: f32,
}

impl TileVisibilityReport {
    pub fn from_visibility(visibility: &TileVisibility) -> Self {
        let total = visibility.total_pixels();
        let view = visibility
            .counts
            .iter()
            .enumerate()
            .map(|(id, counts)| ViewVisibility {
                id,
                tile_visibility: counts
                    .iter()
                    .enumerate()
                    .map(|(tile, &pixel_count)| TileShare {
                        id: tile,
                        pixel_count,
                        screen_ratio: pixel_count as f32 / total as f32,
                    })
                    .collect(),
            })
            .collect();
        Self { view }
    }
}

#[derive(Debug, Serialize)]
pub struct ScreenRatioReport {
    /// Screen the ratios were estimated against.
    pub width: usize,
    pub height: usize,
    pub view: Vec<ViewRatio>,
}

#[derive(Debug, Serialize)]
pub struct ViewRatio {
    pub id: usize,
    #[serde(rename = "screen-ratio")]
    pub screen_ratio: f32,
}

impl ScreenRatioReport {
    pub fn from_ratios(width: usize, height: usize, ratios: &[f32]) -> Self {
        Self {
            width,
            height,
            view: ratios
                .iter()
                .enumerate()
                .map(|(id, &screen_ratio)| ViewRatio { id, screen_ratio })
                .collect(),
        }
    }
}

pub fn write_tile_visibility(path: &Path, visibility: &TileVisibility) -> Result<()> {
    let report = TileVisibilityReport::from_visibility(visibility);
    fs::write(path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

pub fn write_screen_ratios(
    path: &Path,
    width: usize,
    height: usize,
    ratios: &[f32],
) -> Result<()> {
    let report = ScreenRatioReport::from_ratios(width, height, ratios);
    fs::write(path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
