//! cam2mat: compose camera keyframes (position/lookAt/up plus shared
//! perspective parameters) into the flattened per-view MVP matrix file
//! the analysis operators consume.
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use point_cloud_prep::Trajectory;

#[derive(Parser, Debug)]
#[command(name = "cam2mat", version, about = "Convert camera parameters to view matrices")]
struct Cli {
    /// Camera parameter JSON (fovy, aspect, near, far, trajectory).
    #[arg(short, long)]
    input: PathBuf,

    /// Output matrix JSON.
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let trajectory = Trajectory::load(&cli.input)
        .with_context(|| format!("loading camera file {}", cli.input.display()))?;
    trajectory
        .write_matrices(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    println!(
        "wrote {} view matrices ({}x{} screen) to {}",
        trajectory.view_count(),
        trajectory.width,
        trajectory.height,
        cli.output.display()
    );
    Ok(())
}
