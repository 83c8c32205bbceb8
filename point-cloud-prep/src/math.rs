//! Scalar and vector helpers shared by the transform and analysis stages.
use std::cmp::Ordering;

use glam::{Mat4, Vec3};

/// Tolerance used for float equality tests throughout the pipeline.
pub const FLOAT_TOLERANCE: f32 = 1e-6;

/// Tolerance-based equality. Never used for ordering, only to decide
/// whether two coordinates collapse to the same point.
pub fn float_equal(a: f32, b: f32) -> bool {
    (a - b).abs() < FLOAT_TOLERANCE
}

pub fn vec3_equal(a: Vec3, b: Vec3) -> bool {
    float_equal(a.x, b.x) && float_equal(a.y, b.y) && float_equal(a.z, b.z)
}

/// Strict lexicographic order on (x, y, z). This is a total order over the
/// finite floats, so it can drive a stable sort.
pub fn lex_cmp(a: Vec3, b: Vec3) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then(a.z.total_cmp(&b.z))
}

/// Quantize `x` to the nearest multiple of `q`, halves rounding away from
/// the lower multiple.
pub fn quantize(x: f32, q: f32) -> f32 {
    q * (x / q + 0.5).floor()
}

pub fn quantize_vec3(v: Vec3, q: f32) -> Vec3 {
    Vec3::new(quantize(v.x, q), quantize(v.y, q), quantize(v.z, q))
}

/// Homogeneous MVP transform followed by the perspective divide, producing
/// normalized device coordinates.
pub fn ndc(mvp: &Mat4, point: Vec3) -> Vec3 {
    mvp.project_point3(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantize_rounds_to_nearest_multiple() {
        assert_eq!(quantize(0.26, 0.1), 0.1 * 3.0);
        assert_eq!(quantize(0.24, 0.1), 0.1 * 2.0);
        // halves round up to the next multiple
        assert_eq!(quantize(0.25, 0.5), 0.5);
        assert_eq!(quantize(-0.24, 0.1), 0.1 * -2.0);
    }

    #[test]
    fn quantize_is_idempotent() {
        let q = 0.05;
        for &x in &[0.013f32, -4.2, 17.77, 0.0] {
            let once = quantize(x, q);
            assert_eq!(quantize(once, q), once);
        }
    }

    #[test]
    fn lex_cmp_orders_by_x_then_y_then_z() {
        let a = Vec3::new(1.0, 9.0, 9.0);
        let b = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(lex_cmp(a, b), Ordering::Less);

        let c = Vec3::new(1.0, 1.0, 5.0);
        let d = Vec3::new(1.0, 2.0, 0.0);
        assert_eq!(lex_cmp(c, d), Ordering::Less);
        assert_eq!(lex_cmp(d, c), Ordering::Greater);
        assert_eq!(lex_cmp(c, c), Ordering::Equal);
    }

    #[test]
    fn float_equal_uses_tolerance() {
        assert!(float_equal(1.0, 1.0 + 1e-7));
        assert!(!float_equal(1.0, 1.0 + 1e-5));
    }

    #[test]
    fn ndc_applies_perspective_divide() {
        let mvp = Mat4::IDENTITY;
        let p = Vec3::new(0.25, -0.5, 0.5);
        assert_eq!(ndc(&mvp, p), p);
    }
}
