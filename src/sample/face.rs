use super::{resolve_color, SampleStats};
use crate::core::geometry::{self, triangle_interpolation};
use crate::image2d::Image;
use crate::model::{Model, ModelBuilder, Vertex};
use nalgebra::Point3;

/// Parameters of the face-uniform sampler.
#[derive(Debug, Clone, Copy)]
pub struct FaceParams {
    /// Number of steps along the bounding-box diagonal; defines the
    /// world-space step unless `float_step` overrides it.
    pub resolution: u32,
    /// Explicit world-space step. Takes precedence over `resolution`.
    pub float_step: Option<f32>,
    /// Half-extent of the sweep along the face normal, in world units.
    /// Zero disables the sweep.
    pub thickness: f32,
    pub bilinear: bool,
}

impl Default for FaceParams {
    fn default() -> Self {
        Self {
            resolution: 1024,
            float_step: None,
            thickness: 0.0,
            bilinear: true,
        }
    }
}

/// Face-uniform sampling: walks each triangle's two edge directions in
/// fixed world-space increments, the inner loop bounded by the edge-length
/// ratio so samples stay inside the triangle. Every sample carries the face
/// normal; an optional thickness sweep replicates it along that normal.
pub fn sample_face(
    input: &Model,
    texture: &Image,
    params: &FaceParams,
    output: &mut Model,
) -> SampleStats {
    let mut stats = SampleStats::default();

    let step = match params.float_step {
        Some(s) if s > 0.0 => s,
        _ => input.bbox().size().norm() / params.resolution.max(1) as f32,
    };

    let mut builder = ModelBuilder::new(output);
    for t in 0..input.triangle_count() {
        let tri = input.fetch_triangle(t);
        let [p0, p1, p2] = [tri[0].position, tri[1].position, tri[2].position];

        if geometry::triangle_area(&p0, &p1, &p2) < geometry::DEGENERATE_AREA_EPS {
            stats.skipped_degenerate += 1;
            continue;
        }
        let normal = input.face_normal(t);

        let l01 = (p1 - p0).norm();
        let l02 = (p2 - p0).norm();

        let steps_u = (l01 / step).floor() as u32;
        for i in 0..=steps_u {
            let u = i as f32 * step / l01;
            // The inner bound shrinks with u so that u + v <= 1.
            let steps_v = ((1.0 - u) * l02 / step).floor() as u32;
            for j in 0..=steps_v {
                let v = j as f32 * step / l02;
                if u + v > 1.0 {
                    continue;
                }

                let pos = triangle_interpolation(p0.coords, p1.coords, p2.coords, u, v);
                let color = resolve_color(texture, params.bilinear, &tri, u, v);

                push_with_thickness(
                    &mut builder,
                    Point3::from(pos),
                    &normal,
                    color,
                    params.thickness,
                    step,
                );
            }
        }
    }

    stats.duplicates = builder.duplicates();
    stats.points = output.vertex_count();
    stats
}

fn push_with_thickness(
    builder: &mut ModelBuilder,
    pos: Point3<f32>,
    normal: &nalgebra::Vector3<f32>,
    color: Option<nalgebra::Vector3<f32>>,
    thickness: f32,
    step: f32,
) {
    let layers = if thickness > 0.0 {
        (thickness / step).floor() as i32
    } else {
        0
    };
    for k in -layers..=layers {
        let mut vertex =
            Vertex::new(pos + normal * (k as f32 * step)).with_normal(*normal);
        if let Some(c) = color {
            vertex = vertex.with_color(c);
        }
        builder.push_vertex(&vertex);
    }
}
