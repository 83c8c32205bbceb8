//! pcp: prepare point clouds. Reads one or more PLY tiles, arranges them
//! (tile or merge), runs transform and analysis operators, arranges them
//! again, and writes the result.
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use point_cloud_prep::pipeline::{
    indexed_path, write_tiles, Pipeline, PlanAction, ProcessOp, StatusOp,
};
use point_cloud_prep::{io, TileGrid};

#[derive(Parser, Debug)]
#[command(name = "pcp", version, about = "Prepare point clouds for streaming and analysis")]
struct Cli {
    /// Input point cloud file(s) (PLY). Use a %d slot with --tiled-input
    /// to read a numbered tile set.
    #[arg(short, long)]
    input: String,

    /// Output point cloud file(s) (PLY). A %d slot is filled with the
    /// tile index.
    #[arg(short, long)]
    output: String,

    /// Write binary PLY (0 for ASCII).
    #[arg(short, long, default_value_t = 1)]
    binary: u8,

    /// Arrangement before the operator stage: TILE, MERGE, or NONE.
    #[arg(long = "pre-process", default_value = "NONE", value_parser = parse_plan)]
    pre_process: PlanAction,

    /// Arrangement after the operator stage: TILE, MERGE, or NONE.
    #[arg(long = "post-process", default_value = "NONE", value_parser = parse_plan)]
    post_process: PlanAction,

    /// Number of input tiles (1 reads a single cloud).
    #[arg(long = "tiled-input", default_value_t = 1)]
    tiled_input: usize,

    /// Divisions per axis for tiling, as nx,ny,nz.
    #[arg(short, long, default_value = "1,1,1", value_parser = parse_grid)]
    tile: TileGrid,

    /// Transform operator and its arguments, e.g.
    /// `--process sample 0.5 uniform`, `--process voxel 0.05`,
    /// `--process remove-duplicates`. Repeatable; runs in order.
    #[arg(short, long, num_args = 1.., action = ArgAction::Append, value_parser = clap::value_parser!(String), value_name = "OP [ARG]...")]
    process: Vec<Vec<String>>,

    /// Analysis operator and its arguments, e.g.
    /// `--status aabb 2 0 box_%d.ply`,
    /// `--status pixel-per-tile cam.json 2,2,2 visibility.json`,
    /// `--status screen-area-estimation cam.json area_%d.json`,
    /// `--status save-viewport cam.json 255,255,255 view_%d_%d.png`.
    #[arg(short, long, num_args = 1.., action = ArgAction::Append, value_parser = clap::value_parser!(String), value_name = "OP [ARG]...")]
    status: Vec<Vec<String>>,
}

fn parse_plan(s: &str) -> Result<PlanAction, String> {
    s.parse().map_err(|e: point_cloud_prep::Error| e.to_string())
}

fn parse_grid(s: &str) -> Result<TileGrid, String> {
    s.parse().map_err(|e: point_cloud_prep::Error| e.to_string())
}

fn parse_ops(groups: &[Vec<String>], kind: &str) -> Result<Vec<(String, Vec<String>)>> {
    groups
        .iter()
        .map(|group| {
            let (name, args) = group
                .split_first()
                .with_context(|| format!("empty --{kind} option"))?;
            Ok((name.clone(), args.to_vec()))
        })
        .collect()
}

fn tile_progress(len: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.green/blue}] {pos}/{len} tiles ({percent}%) {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏"),
    );
    pb.set_message(message);
    pb
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut processes = Vec::new();
    for (name, args) in parse_ops(&cli.process, "process")? {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        processes.push(
            ProcessOp::parse(&name, &args)
                .with_context(|| format!("invalid --process {name}"))?,
        );
    }
    let mut statuses = Vec::new();
    for (name, args) in parse_ops(&cli.status, "status")? {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        statuses.push(
            StatusOp::parse(&name, &args)
                .with_context(|| format!("invalid --status {name}"))?,
        );
    }

    let pipeline = Pipeline {
        pre: cli.pre_process,
        post: cli.post_process,
        grid: cli.tile,
        processes,
        statuses,
    };

    println!("input:\t{}", cli.input);
    println!("output:\t{}", cli.output);
    println!("binary:\t{}", cli.binary);

    let start = Instant::now();
    let mut clouds = Vec::with_capacity(cli.tiled_input);
    for t in 0..cli.tiled_input {
        let path = indexed_path(&cli.input, t);
        let cloud =
            io::read_cloud(&path).with_context(|| format!("reading {}", path.display()))?;
        clouds.push(cloud);
    }
    let read_time = start.elapsed();

    let start = Instant::now();
    let clouds = pipeline.pre_arrange(clouds)?;
    let pre_time = start.elapsed();

    let start = Instant::now();
    let pb = tile_progress(clouds.len(), "Processing tiles");
    let mut processed = Vec::with_capacity(clouds.len());
    for cloud in clouds {
        processed.push(pipeline.apply_processes(cloud)?);
        pb.inc(1);
    }
    pb.finish_with_message("Tiles processed");
    pipeline.run_statuses(&processed)?;
    let proc_time = start.elapsed();

    let start = Instant::now();
    let out = pipeline.post_arrange(processed)?;
    let post_time = start.elapsed();

    let start = Instant::now();
    write_tiles(&cli.output, &out, cli.binary != 0)
        .with_context(|| format!("writing {}", cli.output))?;
    let write_time = start.elapsed();

    println!("read time:\t{} ms", read_time.as_millis());
    println!("pre-process time:\t{} ms", pre_time.as_millis());
    println!("process/status time:\t{} ms", proc_time.as_millis());
    println!("post-process time:\t{} ms", post_time.as_millis());
    println!("write time:\t{} ms", write_time.as_millis());

    Ok(())
}
