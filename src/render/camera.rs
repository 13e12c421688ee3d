use crate::core::geometry::Aabb;
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Factory for the transformation matrices of the orthographic pipeline.
/// Written out explicitly to keep full control over the coordinate system
/// (right-handed, camera looking down -Z in view space).
pub struct TransformFactory;

#[rustfmt::skip]
impl TransformFactory {
    /// Look-at view matrix: world space to camera space.
    pub fn view(eye: &Point3<f32>, target: &Point3<f32>, up: &Vector3<f32>) -> Matrix4<f32> {
        let z_axis = (eye - target).normalize();
        let x_axis = up.cross(&z_axis).normalize();
        let y_axis = z_axis.cross(&x_axis);

        let rotation = Matrix4::new(
            x_axis.x, x_axis.y, x_axis.z, 0.0,
            y_axis.x, y_axis.y, y_axis.z, 0.0,
            z_axis.x, z_axis.y, z_axis.z, 0.0,
            0.0,      0.0,      0.0,      1.0,
        );
        let translation = Matrix4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );
        rotation * translation
    }

    /// Orthographic projection mapping the view volume to NDC [-1, 1].
    pub fn orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Matrix4<f32> {
        let rl = 1.0 / (right - left);
        let tb = 1.0 / (top - bottom);
        let nf = 1.0 / (near - far);

        Matrix4::new(
            2.0 * rl, 0.0,      0.0,      -(right + left) * rl,
            0.0,      2.0 * tb, 0.0,      -(top + bottom) * tb,
            0.0,      0.0,      2.0 * nf, (far + near) * nf,
            0.0,      0.0,      0.0,      1.0,
        )
    }

    pub fn rotation_x(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c,  -s,   0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_y(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
           -s,   0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn rotation_z(angle_rad: f32) -> Matrix4<f32> {
        let c = angle_rad.cos();
        let s = angle_rad.sin();
        Matrix4::new(
            c,  -s,   0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// Orthographic camera framing a model's bounding sphere from a view
/// direction.
#[derive(Debug, Clone, Copy)]
pub struct OrthoCamera {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub eye: Point3<f32>,
    pub radius: f32,
}

impl OrthoCamera {
    /// Places the eye one bounding-sphere radius away from the box center
    /// against the view direction, and sizes the orthographic volume to
    /// that sphere, so the whole model always projects into the viewport.
    pub fn frame(bbox: &Aabb, view_dir: &Vector3<f32>, view_up: &Vector3<f32>) -> Self {
        let center = bbox.center();
        let radius = bbox.sphere_radius().max(1e-6);
        let dir = view_dir.normalize();
        let eye = center - dir * radius;

        let view = TransformFactory::view(&eye, &center, view_up);
        let projection =
            TransformFactory::orthographic(-radius, radius, -radius, radius, 0.0, 2.0 * radius);

        Self {
            view,
            projection,
            eye,
            radius,
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

/// Viewport transform: NDC to pixel coordinates, flipping Y (NDC +Y is up,
/// screen +Y is down).
#[inline]
pub fn ndc_to_screen(ndc_x: f32, ndc_y: f32, width: f32, height: f32) -> Point2<f32> {
    Point2::new(
        (ndc_x + 1.0) * 0.5 * width,
        (1.0 - (ndc_y + 1.0) * 0.5) * height,
    )
}

/// The i-th of `n` deterministic camera directions on the unit sphere
/// (Fibonacci lattice). This is the direction set the image-based
/// distortion metric walks when it compares reference and distorted
/// renders from many viewpoints.
pub fn fibonacci_sphere_dir(i: u32, n: u32) -> Vector3<f32> {
    let n = n.max(1);
    let offset = 2.0 / n as f32;
    let y = (i as f32 * offset) - 1.0 + offset / 2.0;
    let r = (1.0 - y * y).max(0.0).sqrt();
    let phi = i as f32 * std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    Vector3::new(phi.cos() * r, y, phi.sin() * r)
}

/// Applies the metric's three-angle view rotation (degrees, X then Y then
/// Z) to a camera direction.
pub fn rotate_dir(dir: &Vector3<f32>, angles_deg: &Vector3<f32>) -> Vector3<f32> {
    let m = TransformFactory::rotation_z(angles_deg.z.to_radians())
        * TransformFactory::rotation_y(angles_deg.y.to_radians())
        * TransformFactory::rotation_x(angles_deg.x.to_radians());
    m.transform_vector(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;

    #[test]
    fn framed_model_projects_inside_ndc() {
        let bbox = Aabb::from_flat(&[-1.0, -2.0, 0.0, 3.0, 1.0, 4.0]);
        let camera = OrthoCamera::frame(&bbox, &Vector3::new(0.0, 0.0, -1.0), &Vector3::y());
        let mvp = camera.view_projection();

        for p in [
            Point3::new(-1.0, -2.0, 0.0),
            Point3::new(3.0, 1.0, 4.0),
            bbox.center(),
        ] {
            let clip = mvp * p.to_homogeneous();
            assert!(clip.x.abs() <= 1.0 + 1e-4);
            assert!(clip.y.abs() <= 1.0 + 1e-4);
            assert!(clip.z.abs() <= 1.0 + 1e-4);
        }
    }

    #[test]
    fn nearer_points_get_smaller_ndc_z() {
        let bbox = Aabb::from_flat(&[-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
        // Camera looks along -Z, so larger world Z is nearer to it.
        let camera = OrthoCamera::frame(&bbox, &Vector3::new(0.0, 0.0, -1.0), &Vector3::y());
        let mvp = camera.view_projection();
        let near = mvp * Point3::new(0.0, 0.0, 1.0).to_homogeneous();
        let far = mvp * Point3::new(0.0, 0.0, -1.0).to_homogeneous();
        assert!(near.z < far.z);
    }

    #[test]
    fn viewport_flips_y() {
        let top_left = ndc_to_screen(-1.0, 1.0, 100.0, 50.0);
        assert_eq!(top_left, Point2::new(0.0, 0.0));
        let bottom_right = ndc_to_screen(1.0, -1.0, 100.0, 50.0);
        assert_eq!(bottom_right, Point2::new(100.0, 50.0));
    }

    #[test]
    fn fibonacci_directions_are_unit_and_deterministic() {
        for i in 0..16 {
            let d = fibonacci_sphere_dir(i, 16);
            assert_float_eq!(d.norm(), 1.0, abs <= 1e-4);
            assert_eq!(d, fibonacci_sphere_dir(i, 16));
        }
    }

    #[test]
    fn rotation_by_zero_angles_is_identity() {
        let d = Vector3::new(0.3, 0.4, 0.5);
        let r = rotate_dir(&d, &Vector3::zeros());
        assert_float_eq!((r - d).norm(), 0.0, abs <= 1e-6);
    }
}
