use nalgebra::{Point3, Vector2, Vector3};
use std::ops::{Add, Mul};

/// Tolerance used by the ray/triangle and barycentric routines.
pub const EPSILON: f32 = 1e-6;

/// Triangles with an area below this are treated as degenerate and skipped
/// by every sampling strategy.
pub const DEGENERATE_AREA_EPS: f32 = 1e-9;

/// Affine barycentric blend: `v0*(1-u-v) + v1*u + v2*v`.
///
/// Works for any linearly-combinable attribute (2D UVs, 3D positions,
/// colors, normals).
#[inline]
pub fn triangle_interpolation<T>(v0: T, v1: T, v2: T, u: f32, v: f32) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    v0 * (1.0 - u - v) + v1 * u + v2 * v
}

/// Normalized cross product of two triangle edges.
///
/// Degenerate (zero-area) triangles yield NaN components; callers must treat
/// a NaN normal as invalid and substitute a default such as `(0, 0, 1)`.
#[inline]
pub fn triangle_normal(v0: &Point3<f32>, v1: &Point3<f32>, v2: &Point3<f32>) -> Vector3<f32> {
    (v1 - v0).cross(&(v2 - v0)).normalize()
}

/// Triangle area in 3D: half the magnitude of the edge cross product.
#[inline]
pub fn triangle_area(v0: &Point3<f32>, v1: &Point3<f32>, v2: &Point3<f32>) -> f32 {
    0.5 * (v1 - v0).cross(&(v2 - v0)).norm()
}

/// Area of a 2D triangle (axis-projected variant).
#[inline]
pub fn triangle_area_2d(v0: &Vector2<f32>, v1: &Vector2<f32>, v2: &Vector2<f32>) -> f32 {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    0.5 * (e1.x * e2.y - e1.y * e2.x).abs()
}

/// Solves the 2x2 linear system expressing `p` in the basis of triangle
/// `(a, b, c)`.
///
/// Returns the barycentric triple `(u, v, w)` with `p = a*u + b*v + c*w`
/// and `u + v + w = 1`, together with a flag telling whether `p` lies
/// inside the triangle (`v, w >= 0` and `v + w <= 1`).
pub fn barycentric(
    p: &Vector2<f32>,
    a: &Vector2<f32>,
    b: &Vector2<f32>,
    c: &Vector2<f32>,
) -> (Vector3<f32>, bool) {
    let e1 = b - a;
    let e2 = c - a;
    let ep = p - a;

    let d00 = e1.dot(&e1);
    let d01 = e1.dot(&e2);
    let d11 = e2.dot(&e2);
    let d20 = ep.dot(&e1);
    let d21 = ep.dot(&e2);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < EPSILON * EPSILON {
        return (Vector3::zeros(), false);
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    let inside = v >= -EPSILON && w >= -EPSILON && v + w <= 1.0 + EPSILON;
    (Vector3::new(u, v, w), inside)
}

/// Ray/triangle intersection (Moller-Trumbore).
///
/// Returns `(t, u, v)` where `t` is the ray parameter and `(u, v)` the
/// barycentric coordinates of the hit, or `None` when the ray is parallel
/// to the triangle plane (determinant within [`EPSILON`] of zero) or the
/// hit falls outside the triangle. `t` may be negative: the caller decides
/// whether the ray is a half-line or a full line.
pub fn ray_triangle(
    origin: &Point3<f32>,
    dir: &Vector3<f32>,
    v0: &Point3<f32>,
    v1: &Point3<f32>,
    v2: &Point3<f32>,
) -> Option<(f32, f32, f32)> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let pvec = dir.cross(&e2);
    let det = e1.dot(&pvec);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - v0;
    let u = tvec.dot(&pvec) * inv_det;
    if !(-EPSILON..=1.0 + EPSILON).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(&e1);
    let v = dir.dot(&qvec) * inv_det;
    if v < -EPSILON || u + v > 1.0 + EPSILON {
        return None;
    }

    let t = e2.dot(&qvec) * inv_det;
    Some((t, u, v))
}

/// Axis-aligned bounding box with incremental accumulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// An inverted box that any `extend` call will overwrite.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::MAX, f32::MAX, f32::MAX),
            max: Point3::new(f32::MIN, f32::MIN, f32::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    #[inline]
    pub fn extend(&mut self, p: &Point3<f32>) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Folds a flat `x y z x y z ...` coordinate array into the box.
    /// Accumulates on top of the current bounds, so several point sets can
    /// be merged into one box by repeated calls.
    pub fn extend_flat(&mut self, coords: &[f32]) {
        for p in coords.chunks_exact(3) {
            self.extend(&Point3::new(p[0], p[1], p[2]));
        }
    }

    pub fn from_flat(coords: &[f32]) -> Self {
        let mut bbox = Self::empty();
        bbox.extend_flat(coords);
        bbox
    }

    /// Merges another box into this one.
    pub fn merge(&mut self, other: &Aabb) {
        self.extend(&other.min);
        self.extend(&other.max);
    }

    /// Expands the box to a cube spanning the global min/max across all
    /// three axes. Used to force isotropic grid sampling.
    pub fn to_cubical(&self) -> Aabb {
        let gmin = self.min.x.min(self.min.y).min(self.min.z);
        let gmax = self.max.x.max(self.max.y).max(self.max.z);
        Aabb {
            min: Point3::new(gmin, gmin, gmin),
            max: Point3::new(gmax, gmax, gmax),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn max_extent(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    /// Radius of the bounding sphere (half the box diagonal).
    pub fn sphere_radius(&self) -> f32 {
        0.5 * self.size().norm()
    }
}

/// Triangle/box overlap via the separating-axis theorem.
///
/// Tests the 9 edge cross-product axes, the 3 box axes and the triangle
/// plane; returns `true` only when no separating axis exists. The box is
/// given by center and half extents.
pub fn triangle_box_overlap(
    center: &Point3<f32>,
    half: &Vector3<f32>,
    v0: &Point3<f32>,
    v1: &Point3<f32>,
    v2: &Point3<f32>,
) -> bool {
    // Move the triangle into the box's local frame.
    let p0 = v0 - center;
    let p1 = v1 - center;
    let p2 = v2 - center;

    let e0 = p1 - p0;
    let e1 = p2 - p1;
    let e2 = p0 - p2;

    // Projection test along one cross-product axis.
    let axis_test = |a: f32, b: f32, pa0: f32, pa1: f32, pb0: f32, pb1: f32, ha: f32, hb: f32| {
        let q0 = a * pa0 - b * pb0;
        let q1 = a * pa1 - b * pb1;
        let (min, max) = if q0 < q1 { (q0, q1) } else { (q1, q0) };
        let rad = a.abs() * ha + b.abs() * hb;
        !(min > rad || max < -rad)
    };

    // Edge e0.
    if !axis_test(e0.z, e0.y, p0.y, p2.y, p0.z, p2.z, half.y, half.z) {
        return false;
    }
    if !axis_test(e0.z, e0.x, p0.x, p2.x, p0.z, p2.z, half.x, half.z) {
        return false;
    }
    if !axis_test(e0.y, e0.x, p1.x, p2.x, p1.y, p2.y, half.x, half.y) {
        return false;
    }
    // Edge e1.
    if !axis_test(e1.z, e1.y, p0.y, p2.y, p0.z, p2.z, half.y, half.z) {
        return false;
    }
    if !axis_test(e1.z, e1.x, p0.x, p2.x, p0.z, p2.z, half.x, half.z) {
        return false;
    }
    if !axis_test(e1.y, e1.x, p0.x, p1.x, p0.y, p1.y, half.x, half.y) {
        return false;
    }
    // Edge e2.
    if !axis_test(e2.z, e2.y, p0.y, p1.y, p0.z, p1.z, half.y, half.z) {
        return false;
    }
    if !axis_test(e2.z, e2.x, p0.x, p1.x, p0.z, p1.z, half.x, half.z) {
        return false;
    }
    if !axis_test(e2.y, e2.x, p1.x, p2.x, p1.y, p2.y, half.x, half.y) {
        return false;
    }

    // 3 box axes: the triangle's AABB against the box.
    for i in 0..3 {
        let min = p0[i].min(p1[i]).min(p2[i]);
        let max = p0[i].max(p1[i]).max(p2[i]);
        if min > half[i] || max < -half[i] {
            return false;
        }
    }

    // Triangle plane axis.
    let normal = e0.cross(&e1);
    let d = -normal.dot(&p0);
    let mut vmin = Vector3::zeros();
    let mut vmax = Vector3::zeros();
    for i in 0..3 {
        if normal[i] > 0.0 {
            vmin[i] = -half[i];
            vmax[i] = half[i];
        } else {
            vmin[i] = half[i];
            vmax[i] = -half[i];
        }
    }
    if normal.dot(&vmin) + d > 0.0 {
        return false;
    }
    normal.dot(&vmax) + d >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn interpolation_hits_corners_and_center() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(1.0, 0.0, 0.0);
        let c = Vector3::new(0.0, 1.0, 0.0);

        assert_eq!(triangle_interpolation(a, b, c, 0.0, 0.0), a);
        assert_eq!(triangle_interpolation(a, b, c, 1.0, 0.0), b);
        assert_eq!(triangle_interpolation(a, b, c, 0.0, 1.0), c);

        let center = triangle_interpolation(a, b, c, 1.0 / 3.0, 1.0 / 3.0);
        assert_float_eq!(center.x, 1.0 / 3.0, abs <= 1e-6);
        assert_float_eq!(center.y, 1.0 / 3.0, abs <= 1e-6);
    }

    #[test]
    fn normal_of_ccw_triangle_points_up_z() {
        let n = triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert_float_eq!(n.z, 1.0, abs <= 1e-6);
    }

    #[test]
    fn degenerate_normal_is_nan() {
        let p = Point3::new(1.0, 2.0, 3.0);
        let n = triangle_normal(&p, &p, &Point3::new(4.0, 5.0, 6.0));
        assert!(n.x.is_nan() || n.y.is_nan() || n.z.is_nan());
    }

    #[test]
    fn unit_right_triangle_area() {
        let area = triangle_area(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert_float_eq!(area, 0.5, abs <= 1e-6);
    }

    #[test]
    fn barycentric_partition_of_unity() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(2.0, 0.0);
        let c = Vector2::new(0.0, 2.0);

        let (bw, inside) = barycentric(&Vector2::new(0.5, 0.5), &a, &b, &c);
        assert!(inside);
        assert_float_eq!(bw.x + bw.y + bw.z, 1.0, abs <= 1e-5);
        assert!(bw.x >= 0.0 && bw.y >= 0.0 && bw.z >= 0.0);
        assert!(bw.x <= 1.0 && bw.y <= 1.0 && bw.z <= 1.0);
    }

    #[test]
    fn barycentric_rejects_outside_point() {
        let a = Vector2::new(0.0, 0.0);
        let b = Vector2::new(1.0, 0.0);
        let c = Vector2::new(0.0, 1.0);
        let (_, inside) = barycentric(&Vector2::new(1.0, 1.0), &a, &b, &c);
        assert!(!inside);
    }

    #[test]
    fn ray_hits_triangle_center() {
        let hit = ray_triangle(
            &Point3::new(0.25, 0.25, -5.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        let (t, u, v) = hit.expect("ray through the triangle must hit");
        assert_float_eq!(t, 5.0, abs <= 1e-4);
        assert_float_eq!(u, 0.25, abs <= 1e-5);
        assert_float_eq!(v, 0.25, abs <= 1e-5);
    }

    #[test]
    fn parallel_ray_misses() {
        let hit = ray_triangle(
            &Point3::new(0.0, 0.0, 1.0),
            &Vector3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn bbox_accumulates_and_merges() {
        let mut bbox = Aabb::empty();
        assert!(bbox.is_empty());
        bbox.extend_flat(&[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        bbox.extend_flat(&[-1.0, 0.5, 0.5]);
        assert_eq!(bbox.min, Point3::new(-1.0, 0.0, 0.0));
        assert_eq!(bbox.max, Point3::new(1.0, 2.0, 3.0));

        let mut other = Aabb::from_flat(&[5.0, 5.0, 5.0]);
        other.merge(&bbox);
        assert_eq!(other.max, Point3::new(5.0, 5.0, 5.0));
        assert_eq!(other.min, Point3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn cubical_expansion_uses_global_extrema() {
        let bbox = Aabb::from_flat(&[-1.0, 0.0, 2.0, 3.0, 1.0, 2.5]);
        let cube = bbox.to_cubical();
        assert_eq!(cube.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(cube.max, Point3::new(3.0, 3.0, 3.0));
    }

    #[test]
    fn triangle_box_overlap_basic() {
        let v0 = Point3::new(0.0, 0.0, 0.0);
        let v1 = Point3::new(1.0, 0.0, 0.0);
        let v2 = Point3::new(0.0, 1.0, 0.0);
        let half = Vector3::new(0.5, 0.5, 0.5);

        assert!(triangle_box_overlap(
            &Point3::new(0.25, 0.25, 0.0),
            &half,
            &v0,
            &v1,
            &v2
        ));
        // Box well above the triangle plane.
        assert!(!triangle_box_overlap(
            &Point3::new(0.25, 0.25, 2.0),
            &half,
            &v0,
            &v1,
            &v2
        ));
        // Box past the hypotenuse whose AABB still overlaps the triangle's.
        assert!(!triangle_box_overlap(
            &Point3::new(1.2, 1.2, 0.0),
            &Vector3::new(0.3, 0.3, 0.3),
            &v0,
            &v1,
            &v2
        ));
    }
}
