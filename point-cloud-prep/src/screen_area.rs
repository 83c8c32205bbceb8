//! Screen-area estimation: how much of the NDC viewport a mesh covers,
//! by clipping its camera-facing triangles against the `[-1, 1]` square.
use glam::{Mat4, Vec2};

use crate::math::{self, float_equal};
use crate::mesh::Mesh;

/// A triangle clipped against four edges gains at most one vertex per
/// edge, so seven vertices suffice; ten leaves headroom.
const MAX_CLIP_VERTS: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Edge {
    Left,
    Right,
    Bottom,
    Top,
}

const CLIP_EDGES: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Bottom, Edge::Top];

fn inside(p: Vec2, edge: Edge) -> bool {
    match edge {
        Edge::Left => p.x >= -1.0,
        Edge::Right => p.x <= 1.0,
        Edge::Bottom => p.y >= -1.0,
        Edge::Top => p.y <= 1.0,
    }
}

/// Intersection of the segment `p1..p2` with one boundary edge. A near
/// vertical segment gets a huge slope stand-in instead of dividing by
/// zero.
fn intersection(p1: Vec2, p2: Vec2, edge: Edge) -> Vec2 {
    let m = if float_equal(p1.x, p2.x) {
        1e9
    } else {
        (p2.y - p1.y) / (p2.x - p1.x)
    };
    match edge {
        Edge::Left => Vec2::new(-1.0, p1.y + m * (-1.0 - p1.x)),
        Edge::Right => Vec2::new(1.0, p1.y + m * (1.0 - p1.x)),
        Edge::Bottom => Vec2::new(p1.x + (-1.0 - p1.y) / m, -1.0),
        Edge::Top => Vec2::new(p1.x + (1.0 - p1.y) / m, 1.0),
    }
}

/// One Sutherland-Hodgman pass: clip `input[..len]` against a single
/// edge into `output`, returning the new vertex count.
fn clip_polygon(
    input: &[Vec2; MAX_CLIP_VERTS],
    len: usize,
    output: &mut [Vec2; MAX_CLIP_VERTS],
    edge: Edge,
) -> usize {
    if len == 0 {
        return 0;
    }
    let mut out_len = 0;
    let mut prev = input[len - 1];
    let mut prev_inside = inside(prev, edge);
    for &curr in &input[..len] {
        let curr_inside = inside(curr, edge);
        if curr_inside {
            if !prev_inside {
                output[out_len] = intersection(prev, curr, edge);
                out_len += 1;
            }
            output[out_len] = curr;
            out_len += 1;
        } else if prev_inside {
            output[out_len] = intersection(prev, curr, edge);
            out_len += 1;
        }
        prev = curr;
        prev_inside = curr_inside;
    }
    out_len
}

/// Shoelace area of a simple polygon.
fn polygon_area(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    0.5 * area.abs()
}

/// Counter-clockwise test in screen space; triangles that fail it face
/// away from the camera.
fn is_toward(a: Vec2, b: Vec2, c: Vec2) -> bool {
    (b.x - a.x) * (c.y - a.y) > (c.x - a.x) * (b.y - a.y)
}

/// Area of a triangle after clipping it against the NDC square.
pub fn clipped_triangle_area(p1: Vec2, p2: Vec2, p3: Vec2) -> f32 {
    let mut polygon = [Vec2::ZERO; MAX_CLIP_VERTS];
    polygon[..3].copy_from_slice(&[p1, p2, p3]);
    let mut len = 3;
    let mut scratch = [Vec2::ZERO; MAX_CLIP_VERTS];
    for edge in CLIP_EDGES {
        len = clip_polygon(&polygon, len, &mut scratch, edge);
        polygon[..len].copy_from_slice(&scratch[..len]);
    }
    polygon_area(&polygon[..len])
}

/// Fraction of the viewport covered by the mesh's camera-facing
/// triangles. Triangles with any vertex outside the `[0, 1]` depth range
/// are dropped whole, back-facing ones are skipped, and the summed
/// clipped areas are divided by the 2 x 2 viewport area.
pub fn mesh_screen_ratio(mesh: &Mesh, mvp: &Mat4) -> f32 {
    let ndcs: Vec<_> = mesh
        .vertices
        .iter()
        .map(|v| math::ndc(mvp, *v))
        .collect();

    let mut total = 0.0;
    for [i0, i1, i2] in mesh.triangles() {
        let (a, b, c) = (ndcs[i0 as usize], ndcs[i1 as usize], ndcs[i2 as usize]);
        let depth_ok = [a.z, b.z, c.z].iter().all(|z| (0.0..=1.0).contains(z));
        let (a, b, c) = (a.truncate(), b.truncate(), c.truncate());
        if depth_ok && is_toward(a, b, c) {
            total += clipped_triangle_area(a, b, c);
        }
    }
    total / 4.0
}
