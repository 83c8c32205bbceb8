//! Point-cloud preparation engine: spatial tiling, transform operators, and
//! visibility analysis of point sets against camera trajectories.
pub mod aabb;
pub mod camera;
pub mod canvas;
pub mod cloud;
pub mod error;
pub mod io;
pub mod math;
pub mod mesh;
pub mod pipeline;
pub mod report;
pub mod screen_area;
pub mod tile;
pub mod transform;
pub mod visibility;

pub use aabb::Aabb;
pub use camera::Trajectory;
pub use canvas::Canvas;
pub use cloud::PointCloud;
pub use error::{Error, Result};
pub use mesh::Mesh;
pub use pipeline::{AabbOutput, Pipeline, PlanAction, ProcessOp, StatusOp, indexed_path};
pub use tile::TileGrid;
pub use transform::SampleStrategy;
pub use visibility::TileVisibility;
