//! Error type shared by every stage of the preparation pipeline.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A buffer request could not be satisfied. Fatal for the enclosing
    /// pipeline run.
    #[error("allocation of {requested} points failed")]
    Allocation { requested: usize },

    /// An axis-aligned box with `min > max` on some axis.
    #[error("invalid box geometry: min {min:?} exceeds max {max:?}")]
    InvalidGeometry { min: [f32; 3], max: [f32; 3] },

    /// Extrema requested on a cloud with zero points.
    #[error("operation requires a non-empty point cloud")]
    EmptyInput,

    /// A point whose coordinates cannot be attributed to any tile.
    #[error("point {index} has a non-finite coordinate and falls outside every tile")]
    OutOfRange { index: usize },

    /// The sample operator only implements uniform selection.
    #[error("unsupported sampling strategy `{0}`")]
    UnsupportedStrategy(String),

    /// Missing or ill-typed keys in camera/trajectory input, or an operator
    /// argument that does not parse.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("PLY error in {path}: {message}")]
    Ply { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
