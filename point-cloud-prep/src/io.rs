//! PLY input and output for point clouds and meshes. Reading goes
//! through `ply-rs`, which handles both the ASCII and binary little
//! endian encodings; writing emits the minimal headers the rest of the
//! toolchain expects.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use glam::Vec3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::cloud::PointCloud;
use crate::error::{Error, Result};
use crate::mesh::Mesh;

fn ply_error(path: &Path, message: impl Into<String>) -> Error {
    Error::Ply {
        path: path.display().to_string(),
        message: message.into(),
    }
}

fn prop_f32(element: &DefaultElement, key: &str, path: &Path) -> Result<f32> {
    match element.get(key) {
        Some(Property::Float(v)) => Ok(*v),
        Some(Property::Double(v)) => Ok(*v as f32),
        Some(_) => Err(ply_error(path, format!("property `{key}` is not float-like"))),
        None => Err(ply_error(path, format!("missing property `{key}`"))),
    }
}

fn prop_u8(element: &DefaultElement, key: &str) -> u8 {
    match element.get(key) {
        Some(Property::UChar(v)) => *v,
        Some(Property::UShort(v)) => (*v >> 8) as u8,
        Some(Property::Float(v)) => *v as u8,
        _ => 0,
    }
}

/// Read a point cloud from a PLY file. Positions are required; colors
/// default to black when the file carries none.
pub fn read_cloud(path: &Path) -> Result<PointCloud> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|err| ply_error(path, err.to_string()))?;

    let vertices = ply
        .payload
        .get("vertex")
        .ok_or_else(|| ply_error(path, "missing `vertex` element"))?;

    let mut cloud = PointCloud::with_capacity(vertices.len())?;
    for element in vertices {
        let position = Vec3::new(
            prop_f32(element, "x", path)?,
            prop_f32(element, "y", path)?,
            prop_f32(element, "z", path)?,
        );
        let color = [
            prop_u8(element, "red"),
            prop_u8(element, "green"),
            prop_u8(element, "blue"),
        ];
        cloud.push(position, color);
    }
    Ok(cloud)
}

fn write_header(
    w: &mut impl Write,
    binary: bool,
    vertex_count: usize,
    colored: bool,
    face_count: Option<usize>,
) -> Result<()> {
    writeln!(w, "ply")?;
    if binary {
        writeln!(w, "format binary_little_endian 1.0")?;
    } else {
        writeln!(w, "format ascii 1.0")?;
    }
    writeln!(w, "element vertex {vertex_count}")?;
    writeln!(w, "property float x")?;
    writeln!(w, "property float y")?;
    writeln!(w, "property float z")?;
    if colored {
        writeln!(w, "property uchar red")?;
        writeln!(w, "property uchar green")?;
        writeln!(w, "property uchar blue")?;
    }
    if let Some(faces) = face_count {
        writeln!(w, "element face {faces}")?;
        writeln!(w, "property list uchar uint vertex_indices")?;
    }
    writeln!(w, "end_header")?;
    Ok(())
}

/// Write a point cloud as PLY, binary little endian or ASCII.
pub fn write_cloud(path: &Path, cloud: &PointCloud, binary: bool) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_header(&mut w, binary, cloud.len(), true, None)?;
    for (position, color) in cloud.positions.iter().zip(&cloud.colors) {
        if binary {
            for c in position.to_array() {
                w.write_all(&c.to_le_bytes())?;
            }
            w.write_all(color)?;
        } else {
            writeln!(
                w,
                "{} {} {} {} {} {}",
                position.x, position.y, position.z, color[0], color[1], color[2]
            )?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write an indexed triangle mesh as PLY.
pub fn write_mesh(path: &Path, mesh: &Mesh, binary: bool) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_header(
        &mut w,
        binary,
        mesh.vertices.len(),
        false,
        Some(mesh.triangle_count()),
    )?;
    for vertex in &mesh.vertices {
        if binary {
            for c in vertex.to_array() {
                w.write_all(&c.to_le_bytes())?;
            }
        } else {
            writeln!(w, "{} {} {}", vertex.x, vertex.y, vertex.z)?;
        }
    }
    for triangle in mesh.triangles() {
        if binary {
            w.write_all(&[3u8])?;
            for index in triangle {
                w.write_all(&index.to_le_bytes())?;
            }
        } else {
            writeln!(w, "3 {} {} {}", triangle[0], triangle[1], triangle[2])?;
        }
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cloud() -> PointCloud {
        let mut cloud = PointCloud::default();
        cloud.push(Vec3::new(0.5, -1.25, 3.0), [255, 128, 0]);
        cloud.push(Vec3::new(-2.0, 0.0, 0.125), [0, 64, 200]);
        cloud.push(Vec3::ZERO, [1, 2, 3]);
        cloud
    }

    #[test]
    fn ascii_cloud_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let original = sample_cloud();
        write_cloud(&path, &original, false).unwrap();
        let loaded = read_cloud(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn binary_cloud_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud.ply");
        let original = sample_cloud();
        write_cloud(&path, &original, true).unwrap();
        let loaded = read_cloud(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn cloud_without_colors_reads_as_black() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.ply");
        std::fs::write(
            &path,
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n1 2 3\n",
        )
        .unwrap();
        let cloud = read_cloud(&path).unwrap();
        assert_eq!(cloud.positions[0], Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(cloud.colors[0], [0, 0, 0]);
    }

    #[test]
    fn missing_vertex_element_is_a_ply_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.ply");
        std::fs::write(&path, "ply\nformat ascii 1.0\nend_header\n").unwrap();
        assert!(matches!(read_cloud(&path), Err(Error::Ply { .. })));
    }

    #[test]
    fn mesh_header_lists_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.ply");
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
        );
        write_mesh(&path, &mesh, false).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("element vertex 3"));
        assert!(text.contains("element face 1"));
        assert!(text.contains("property list uchar uint vertex_indices"));
        assert!(text.trim_end().ends_with("3 0 1 2"));
    }
}
