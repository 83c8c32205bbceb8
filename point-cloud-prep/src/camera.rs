//! Camera trajectories: per-view MVP matrices plus the screen size they
//! target. Matrices arrive either precomputed (the flattened
//! `views x 4 x 4` JSON form) or as `position/lookAt/up` keyframes that we
//! compose with a shared perspective projection.
use std::fs;
use std::path::Path;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ordered sequence of per-view MVP matrices and the screen dimensions
/// that accompany them.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub mvps: Vec<Mat4>,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatrixFile {
    camera: MatrixCamera,
}

#[derive(Debug, Serialize, Deserialize)]
struct MatrixCamera {
    screen: ScreenDims,
    /// One matrix per view, stored column-major: `mvp[i]` is column `i`.
    mvp: Vec<[[f32; 4]; 4]>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ScreenDims {
    width: usize,
    height: usize,
}

/// The parameter form produced by camera-path authoring tools.
#[derive(Debug, Deserialize)]
struct ParamsFile {
    camera: CameraParams,
}

#[derive(Debug, Deserialize)]
pub struct CameraParams {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// Screen dimensions as `width/height`, e.g. `1920/1080`.
    pub aspect: String,
    pub near: f32,
    pub far: f32,
    /// Keyframes are kept loose here so one malformed entry can be
    /// skipped without rejecting the whole trajectory.
    pub trajectory: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct Keyframe {
    position: [f32; 3],
    #[serde(rename = "lookAt")]
    look_at: [f32; 3],
    up: [f32; 3],
}

impl Trajectory {
    /// Load either supported camera JSON form, keyed on which block the
    /// file carries.
    pub fn load(path: &Path) -> Result<Trajectory> {
        let text = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        if value.pointer("/camera/mvp").is_some() {
            let file: MatrixFile = serde_json::from_value(value).map_err(|err| {
                Error::MalformedInput(format!("camera file {}: {err}", path.display()))
            })?;
            let screen = file.camera.screen;
            if screen.width == 0 || screen.height == 0 {
                return Err(Error::MalformedInput(format!(
                    "camera file {}: screen {}x{} must be at least 1x1",
                    path.display(),
                    screen.width,
                    screen.height
                )));
            }
            Ok(Trajectory {
                mvps: file.camera.mvp.iter().map(Mat4::from_cols_array_2d).collect(),
                width: file.camera.screen.width,
                height: file.camera.screen.height,
            })
        } else if value.pointer("/camera/trajectory").is_some() {
            let file: ParamsFile = serde_json::from_value(value).map_err(|err| {
                Error::MalformedInput(format!("camera file {}: {err}", path.display()))
            })?;
            Trajectory::from_params(&file.camera)
        } else {
            Err(Error::MalformedInput(format!(
                "camera file {}: expected a camera.mvp or camera.trajectory block",
                path.display()
            )))
        }
    }

    /// Compose `perspective(fovy, aspect, near, far) * lookAt(...)` per
    /// keyframe (the model matrix is the identity). A keyframe with
    /// missing or ill-typed keys is skipped with a diagnostic naming its
    /// index; it does not fail the rest of the trajectory.
    pub fn from_params(params: &CameraParams) -> Result<Trajectory> {
        let (width, height) = parse_aspect(&params.aspect)?;
        let projection = Mat4::perspective_rh_gl(
            params.fovy.to_radians(),
            width as f32 / height as f32,
            params.near,
            params.far,
        );

        let mut mvps = Vec::with_capacity(params.trajectory.len());
        for (index, entry) in params.trajectory.iter().enumerate() {
            match serde_json::from_value::<Keyframe>(entry.clone()) {
                Ok(keyframe) => {
                    let view = Mat4::look_at_rh(
                        Vec3::from(keyframe.position),
                        Vec3::from(keyframe.look_at),
                        Vec3::from(keyframe.up),
                    );
                    mvps.push(projection * view);
                }
                Err(err) => {
                    eprintln!("skipping malformed trajectory entry {index}: {err}");
                }
            }
        }
        Ok(Trajectory {
            mvps,
            width,
            height,
        })
    }

    pub fn view_count(&self) -> usize {
        self.mvps.len()
    }

    /// Write the flattened matrix form consumed by the analysis operators.
    pub fn write_matrices(&self, path: &Path) -> Result<()> {
        let file = MatrixFile {
            camera: MatrixCamera {
                screen: ScreenDims {
                    width: self.width,
                    height: self.height,
                },
                mvp: self.mvps.iter().map(|m| m.to_cols_array_2d()).collect(),
            },
        };
        fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

fn parse_aspect(aspect: &str) -> Result<(usize, usize)> {
    let bad = || Error::MalformedInput(format!("aspect `{aspect}`, expected width/height"));
    let (w, h) = aspect.split_once('/').ok_or_else(bad)?;
    let width = w.trim().parse::<usize>().map_err(|_| bad())?;
    let height = h.trim().parse::<usize>().map_err(|_| bad())?;
    if width == 0 || height == 0 {
        return Err(bad());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(trajectory: serde_json::Value) -> CameraParams {
        serde_json::from_value(json!({
            "fovy": 60.0,
            "aspect": "8/8",
            "near": 0.1,
            "far": 100.0,
            "trajectory": trajectory,
        }))
        .unwrap()
    }

    #[test]
    fn keyframe_composition_projects_the_target_into_view() {
        let params = params(json!([
            { "position": [0.0, 0.0, 5.0], "lookAt": [0.0, 0.0, 0.0], "up": [0.0, 1.0, 0.0] }
        ]));
        let trajectory = Trajectory::from_params(&params).unwrap();
        assert_eq!(trajectory.view_count(), 1);
        assert_eq!((trajectory.width, trajectory.height), (8, 8));

        // the look-at target lands at the screen center with depth in view
        let ndc = trajectory.mvps[0].project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z <= 1.0);
    }

    #[test]
    fn malformed_keyframes_are_skipped_not_fatal() {
        let params = params(json!([
            { "position": [0.0, 0.0, 5.0], "lookAt": [0.0, 0.0, 0.0], "up": [0.0, 1.0, 0.0] },
            { "position": [0.0, 0.0, 5.0] },
            { "position": [0.0, 0.0, -5.0], "lookAt": [0.0, 0.0, 0.0], "up": [0.0, 1.0, 0.0] }
        ]));
        let trajectory = Trajectory::from_params(&params).unwrap();
        assert_eq!(trajectory.view_count(), 2);
    }

    #[test]
    fn bad_aspect_string_is_rejected() {
        assert!(parse_aspect("1920x1080").is_err());
        assert!(parse_aspect("0/10").is_err());
        assert_eq!(parse_aspect("1920/1080").unwrap(), (1920, 1080));
    }

    #[test]
    fn matrix_file_with_zero_screen_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cam.json");
        let file = json!({
            "camera": {
                "screen": { "width": 0, "height": 0 },
                "mvp": [[
                    [1.0, 0.0, 0.0, 0.0],
                    [0.0, 1.0, 0.0, 0.0],
                    [0.0, 0.0, 1.0, 0.0],
                    [0.0, 0.0, 0.0, 1.0]
                ]]
            }
        });
        fs::write(&path, file.to_string()).unwrap();
        match Trajectory::load(&path) {
            Err(Error::MalformedInput(message)) => assert!(message.contains("0x0")),
            other => panic!("expected MalformedInput, got {other:?}"),
        }
    }

    #[test]
    fn matrix_file_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cam.json");
        let params = params(json!([
            { "position": [1.0, 2.0, 5.0], "lookAt": [0.0, 0.0, 0.0], "up": [0.0, 1.0, 0.0] }
        ]));
        let original = Trajectory::from_params(&params).unwrap();
        original.write_matrices(&path).unwrap();

        let loaded = Trajectory::load(&path).unwrap();
        assert_eq!(loaded.view_count(), original.view_count());
        assert_eq!((loaded.width, loaded.height), (8, 8));
        let diff = (loaded.mvps[0] - original.mvps[0]).abs();
        assert!(diff.to_cols_array().iter().all(|d| *d < 1e-6));
    }
}
