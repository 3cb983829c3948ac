//! Separating-axis overlap tests for oriented boxes and triangles
//!
//! Touching shapes count as intersecting: an axis separates only when the
//! projected intervals are strictly apart.

use glam::DVec3;

use crate::bounds::Obb;

/// Candidate axes shorter than this (squared) are parallel-edge artefacts
const AXIS_EPSILON: f64 = 1e-18;

/// A triangle as three points
pub type Triangle = [DVec3; 3];

#[inline]
fn separated(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() > a.1 + b.1
}

/// Oriented box overlap by the separating-axis theorem
///
/// Boxes are treated as parallelepipeds, so sheared volumes from non-uniform
/// parent scale are handled: face normals are taken from edge cross products
/// rather than assumed to be the box axes.
pub fn obb_intersects_obb(a: &Obb, b: &Obb) -> bool {
    let ea = a.axes;
    let eb = b.axes;

    let mut axes = Vec::with_capacity(15);
    axes.push(ea[1].cross(ea[2]));
    axes.push(ea[2].cross(ea[0]));
    axes.push(ea[0].cross(ea[1]));
    axes.push(eb[1].cross(eb[2]));
    axes.push(eb[2].cross(eb[0]));
    axes.push(eb[0].cross(eb[1]));
    for i in &ea {
        for j in &eb {
            axes.push(i.cross(*j));
        }
    }

    for axis in axes {
        if axis.length_squared() < AXIS_EPSILON {
            continue;
        }
        if separated(a.project(axis), b.project(axis)) {
            return false;
        }
    }
    true
}

#[inline]
fn project_triangle(t: &Triangle, axis: DVec3) -> (f64, f64) {
    let d = [t[0].dot(axis), t[1].dot(axis), t[2].dot(axis)];
    let lo = d[0].min(d[1]).min(d[2]);
    let hi = d[0].max(d[1]).max(d[2]);
    ((lo + hi) * 0.5, (hi - lo) * 0.5)
}

/// Triangle-triangle overlap by the separating-axis theorem
///
/// Tests both normals, the nine edge cross products and the in-plane edge
/// normals, which covers coplanar triangles.
pub fn triangles_intersect(a: &Triangle, b: &Triangle) -> bool {
    let edges_a = [a[1] - a[0], a[2] - a[1], a[0] - a[2]];
    let edges_b = [b[1] - b[0], b[2] - b[1], b[0] - b[2]];
    let na = edges_a[0].cross(edges_a[1]);
    let nb = edges_b[0].cross(edges_b[1]);

    let mut axes = Vec::with_capacity(17);
    axes.push(na);
    axes.push(nb);
    for ea in &edges_a {
        for eb in &edges_b {
            axes.push(ea.cross(*eb));
        }
    }
    for ea in &edges_a {
        axes.push(na.cross(*ea));
    }
    for eb in &edges_b {
        axes.push(nb.cross(*eb));
    }

    for axis in axes {
        if axis.length_squared() < AXIS_EPSILON {
            continue;
        }
        if separated(project_triangle(a, axis), project_triangle(b, axis)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Aabb;

    fn cube(center: DVec3, half: f64) -> Obb {
        Obb::from_aabb(&Aabb::from_center_half_extents(center, DVec3::splat(half)))
    }

    #[test]
    fn test_obb_overlap_and_separation() {
        let a = cube(DVec3::ZERO, 1.0);
        assert!(obb_intersects_obb(&a, &cube(DVec3::new(1.5, 0.0, 0.0), 1.0)));
        assert!(!obb_intersects_obb(&a, &cube(DVec3::new(2.5, 0.0, 0.0), 1.0)));
    }

    #[test]
    fn test_obb_face_touching_intersects() {
        let a = cube(DVec3::ZERO, 1.0);
        let b = cube(DVec3::new(2.0, 0.0, 0.0), 1.0);
        assert!(obb_intersects_obb(&a, &b));
    }

    #[test]
    fn test_rotated_obb_clears_aabb_false_positive() {
        // A 45° box whose AABB overlaps the other box but whose faces do not
        let a = cube(DVec3::ZERO, 1.0);
        let s = 0.5f64.sqrt();
        let b = Obb::new(
            DVec3::new(1.9, 1.9, 0.0),
            [DVec3::new(s, s, 0.0), DVec3::new(-s, s, 0.0), DVec3::Z],
            DVec3::splat(1.0),
        );
        assert!(a.to_aabb().intersects(&b.to_aabb()));
        assert!(!obb_intersects_obb(&a, &b));
    }

    #[test]
    fn test_triangles_crossing() {
        let a = [DVec3::new(-1.0, -1.0, 0.0), DVec3::new(1.0, -1.0, 0.0), DVec3::new(0.0, 1.0, 0.0)];
        let b = [DVec3::new(0.0, 0.0, -1.0), DVec3::new(0.0, 0.0, 1.0), DVec3::new(0.0, 2.0, 1.0)];
        assert!(triangles_intersect(&a, &b));
    }

    #[test]
    fn test_triangles_parallel_apart() {
        let a = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let b = a.map(|p| p + DVec3::new(0.0, 0.0, 0.5));
        assert!(!triangles_intersect(&a, &b));
    }

    #[test]
    fn test_coplanar_triangles() {
        let a = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let overlapping = a.map(|p| p + DVec3::new(0.25, 0.25, 0.0));
        let apart = a.map(|p| p + DVec3::new(2.0, 0.0, 0.0));
        assert!(triangles_intersect(&a, &overlapping));
        assert!(!triangles_intersect(&a, &apart));
    }
}
