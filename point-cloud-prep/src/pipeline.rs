//! Pipeline assembly: pre-arrangement, transform operators, analysis
//! operators, and post-arrangement over a batch of point clouds.
use std::path::PathBuf;
use std::str::FromStr;

use crate::camera::Trajectory;
use crate::canvas::Canvas;
use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use crate::io;
use crate::report;
use crate::screen_area;
use crate::tile::TileGrid;
use crate::transform::SampleStrategy;
use crate::visibility;

/// Arrangement step applied before or after the operator stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanAction {
    #[default]
    None,
    Tile,
    Merge,
}

impl FromStr for PlanAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TILE" => Ok(Self::Tile),
            "MERGE" => Ok(Self::Merge),
            "NONE" => Ok(Self::None),
            other => Err(Error::MalformedInput(format!(
                "plan action `{other}`, expected TILE, MERGE, or NONE"
            ))),
        }
    }
}

/// What the bounding-box operator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AabbOutput {
    /// Print extrema to stdout.
    Print,
    /// Write the box mesh.
    Mesh,
    /// Both of the above.
    Both,
}

impl FromStr for AabbOutput {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "0" => Ok(Self::Print),
            "1" => Ok(Self::Mesh),
            "2" => Ok(Self::Both),
            other => Err(Error::MalformedInput(format!(
                "aabb output mode `{other}`, expected 0, 1, or 2"
            ))),
        }
    }
}

/// A transform operator. These consume the cloud and replace it.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOp {
    Sample {
        ratio: f32,
        strategy: SampleStrategy,
    },
    Voxel {
        size: f32,
    },
    RemoveDuplicates,
}

impl ProcessOp {
    /// Build an operator from its name and positional arguments, as they
    /// appear on the command line.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self> {
        match name {
            "sample" => {
                let [ratio, strategy] = required_args(name, args)?;
                let ratio: f32 = ratio
                    .parse()
                    .map_err(|_| bad_arg("sample", "ratio", ratio))?;
                // out-of-range ratios fall back to keeping every point
                let ratio = if ratio > 0.0 && ratio < 1.0 { ratio } else { 1.0 };
                Ok(Self::Sample {
                    ratio,
                    strategy: strategy.parse()?,
                })
            }
            "voxel" => {
                let [size] = required_args(name, args)?;
                Ok(Self::Voxel {
                    size: size.parse().map_err(|_| bad_arg("voxel", "size", size))?,
                })
            }
            "remove-duplicates" => Ok(Self::RemoveDuplicates),
            other => Err(Error::MalformedInput(format!(
                "unknown process `{other}`"
            ))),
        }
    }

    fn apply(&self, cloud: PointCloud) -> Result<PointCloud> {
        match self {
            Self::Sample { ratio, strategy } => {
                cloud.sample(*ratio, *strategy, &mut rand::thread_rng())
            }
            Self::Voxel { size } => Ok(cloud.voxelize(*size)),
            Self::RemoveDuplicates => cloud.remove_duplicates(),
        }
    }
}

/// An analysis operator. These observe a cloud and write a side output,
/// never modifying the cloud itself.
#[derive(Debug, Clone)]
pub enum StatusOp {
    Aabb {
        output: AabbOutput,
        binary: bool,
        path: String,
    },
    PixelPerTile {
        trajectory: Trajectory,
        grid: TileGrid,
        path: String,
    },
    ScreenAreaEstimation {
        trajectory: Trajectory,
        path: String,
    },
    SaveViewport {
        trajectory: Trajectory,
        background: [u8; 3],
        path: String,
    },
}

impl StatusOp {
    /// Build an operator from its name and positional arguments. Camera
    /// files are loaded here so a bad trajectory fails at parse time, not
    /// in the middle of a run.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self> {
        match name {
            "aabb" => {
                let [output, binary, path] = required_args(name, args)?;
                Ok(Self::Aabb {
                    output: output.parse()?,
                    binary: parse_flag("aabb", "binary", binary)?,
                    path: path.to_string(),
                })
            }
            "pixel-per-tile" => {
                let [camera, grid, path] = required_args(name, args)?;
                Ok(Self::PixelPerTile {
                    trajectory: Trajectory::load(std::path::Path::new(camera))?,
                    grid: grid.parse()?,
                    path: path.to_string(),
                })
            }
            "screen-area-estimation" => {
                let [camera, path] = required_args(name, args)?;
                Ok(Self::ScreenAreaEstimation {
                    trajectory: Trajectory::load(std::path::Path::new(camera))?,
                    path: path.to_string(),
                })
            }
            "save-viewport" => {
                let [camera, background, path] = required_args(name, args)?;
                Ok(Self::SaveViewport {
                    trajectory: Trajectory::load(std::path::Path::new(camera))?,
                    background: parse_color(background)?,
                    path: path.to_string(),
                })
            }
            other => Err(Error::MalformedInput(format!("unknown status `{other}`"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Aabb { .. } => "aabb",
            Self::PixelPerTile { .. } => "pixel-per-tile",
            Self::ScreenAreaEstimation { .. } => "screen-area-estimation",
            Self::SaveViewport { .. } => "save-viewport",
        }
    }

    fn run(&self, cloud: &PointCloud, id: usize) -> Result<()> {
        match self {
            Self::Aabb {
                output,
                binary,
                path,
            } => {
                let aabb = cloud.aabb()?;
                if matches!(output, AabbOutput::Print | AabbOutput::Both) {
                    println!("Min: {} {} {}", aabb.min.x, aabb.min.y, aabb.min.z);
                    println!("Max: {} {} {}", aabb.max.x, aabb.max.y, aabb.max.z);
                }
                if matches!(output, AabbOutput::Mesh | AabbOutput::Both) {
                    io::write_mesh(&indexed_path(path, id), &aabb.to_mesh(), *binary)?;
                }
                Ok(())
            }
            Self::PixelPerTile {
                trajectory,
                grid,
                path,
            } => {
                let result = visibility::count_pixel_per_tile(cloud, grid, trajectory)?;
                report::write_tile_visibility(&indexed_path(path, id), &result)
            }
            Self::ScreenAreaEstimation { trajectory, path } => {
                let mesh = cloud.aabb()?.to_mesh();
                let ratios: Vec<f32> = trajectory
                    .mvps
                    .iter()
                    .map(|mvp| screen_area::mesh_screen_ratio(&mesh, mvp))
                    .collect();
                report::write_screen_ratios(
                    &indexed_path(path, id),
                    trajectory.width,
                    trajectory.height,
                    &ratios,
                )
            }
            Self::SaveViewport {
                trajectory,
                background,
                path,
            } => {
                let mut canvas =
                    Canvas::new(trajectory.width, trajectory.height, *background)?;
                for (view, mvp) in trajectory.mvps.iter().enumerate() {
                    canvas.clear();
                    canvas.draw_points(mvp, cloud);
                    // the pattern's first index slot is the view, the
                    // second the cloud
                    let view_path = indexed_path(path, view);
                    let out = indexed_path(view_path.to_string_lossy().as_ref(), id);
                    canvas.save_png(&out)?;
                }
                Ok(())
            }
        }
    }
}

/// Substitute `index` for the first `%d` in `pattern`. A pattern without
/// a slot names a single fixed output.
pub fn indexed_path(pattern: &str, index: usize) -> PathBuf {
    PathBuf::from(pattern.replacen("%d", &index.to_string(), 1))
}

/// Write each cloud to `pattern` indexed by its tile id. Empty tiles are
/// skipped, and one tile's write failure is reported without stopping
/// the rest; only allocation failure aborts.
pub fn write_tiles(pattern: &str, clouds: &[PointCloud], binary: bool) -> Result<()> {
    for (id, cloud) in clouds.iter().enumerate() {
        if cloud.is_empty() {
            println!("Tile {id} has no points, skip writing...");
            continue;
        }
        let path = indexed_path(pattern, id);
        match io::write_cloud(&path, cloud, binary) {
            Ok(()) => {}
            Err(err @ Error::Allocation { .. }) => return Err(err),
            Err(err) => {
                eprintln!("writing tile {id} to {} failed: {err}", path.display());
            }
        }
    }
    Ok(())
}

fn required_args<'a, const N: usize>(name: &str, args: &[&'a str]) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| {
        Error::MalformedInput(format!(
            "`{name}` takes {N} argument(s), got {}",
            args.len()
        ))
    })
}

fn bad_arg(op: &str, arg: &str, value: &str) -> Error {
    Error::MalformedInput(format!("`{op}` argument {arg}: cannot parse `{value}`"))
}

fn parse_flag(op: &str, arg: &str, value: &str) -> Result<bool> {
    let n: u8 = value.parse().map_err(|_| bad_arg(op, arg, value))?;
    Ok(n != 0)
}

fn parse_color(s: &str) -> Result<[u8; 3]> {
    let parts: Vec<u8> = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| Error::MalformedInput(format!("background color `{s}`, expected R,G,B")))?;
    match parts[..] {
        [r, g, b] => Ok([r, g, b]),
        _ => Err(Error::MalformedInput(format!(
            "background color `{s}`, expected R,G,B"
        ))),
    }
}

/// One full preparation run over a batch of clouds.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pub pre: PlanAction,
    pub post: PlanAction,
    pub grid: TileGrid,
    pub processes: Vec<ProcessOp>,
    pub statuses: Vec<StatusOp>,
}

impl Pipeline {
    /// Arrange the inputs for the operator stage: a single cloud may be
    /// tiled, several clouds may be merged, anything else passes through
    /// untouched.
    pub fn pre_arrange(&self, clouds: Vec<PointCloud>) -> Result<Vec<PointCloud>> {
        match (self.pre, clouds.len()) {
            (PlanAction::Tile, 1) => {
                let cloud = clouds.into_iter().next().unwrap_or_default();
                self.grid.tile(cloud)
            }
            (PlanAction::Merge, n) if n > 1 => Ok(vec![PointCloud::merge(clouds)?]),
            _ => Ok(clouds),
        }
    }

    /// Run every transform operator over one cloud, in order.
    pub fn apply_processes(&self, cloud: PointCloud) -> Result<PointCloud> {
        self.processes
            .iter()
            .try_fold(cloud, |cloud, op| op.apply(cloud))
    }

    /// Run every analysis operator over every cloud. A failing operator is
    /// reported and skipped so the rest of the batch still completes;
    /// only allocation failure aborts the run.
    pub fn run_statuses(&self, clouds: &[PointCloud]) -> Result<()> {
        for (id, cloud) in clouds.iter().enumerate() {
            for status in &self.statuses {
                match status.run(cloud, id) {
                    Ok(()) => {}
                    Err(err @ Error::Allocation { .. }) => return Err(err),
                    Err(err) => {
                        eprintln!("status {} failed for tile {id}: {err}", status.name());
                    }
                }
            }
        }
        Ok(())
    }

    /// Arrange the outputs. Tiling here requires the operator stage to
    /// have produced a single cloud.
    pub fn post_arrange(&self, clouds: Vec<PointCloud>) -> Result<Vec<PointCloud>> {
        match self.post {
            PlanAction::Merge => Ok(vec![PointCloud::merge(clouds)?]),
            PlanAction::Tile => {
                if clouds.len() != 1 {
                    return Err(Error::MalformedInput(format!(
                        "post-process TILE expects a single cloud, got {}",
                        clouds.len()
                    )));
                }
                let cloud = clouds.into_iter().next().unwrap_or_default();
                self.grid.tile(cloud)
            }
            PlanAction::None => Ok(clouds),
        }
    }

    /// Pre-arrange, process, analyze, post-arrange.
    pub fn run(&self, clouds: Vec<PointCloud>) -> Result<Vec<PointCloud>> {
        let clouds = self.pre_arrange(clouds)?;
        let mut processed = Vec::with_capacity(clouds.len());
        for cloud in clouds {
            processed.push(self.apply_processes(cloud)?);
        }
        self.run_statuses(&processed)?;
        self.post_arrange(processed)
    }
}
