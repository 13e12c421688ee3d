use super::{resolve_color, SampleStats};
use crate::core::geometry::{self, triangle_interpolation, Aabb};
use crate::image2d::Image;
use crate::model::{Model, ModelBuilder, Vertex};
use nalgebra::{Point3, Vector3};

/// Parameters of the grid/ray-cast sampler.
#[derive(Debug, Clone, Copy)]
pub struct GridParams {
    /// Number of grid cells per axis.
    pub grid_size: u32,
    /// Cast only along the axis most aligned with each triangle's normal
    /// instead of along all three axes.
    pub use_normal: bool,
    /// Expand the bounding box to a cube before gridding, forcing an
    /// isotropic step.
    pub cubical: bool,
    pub bilinear: bool,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            grid_size: 1024,
            use_normal: true,
            cubical: true,
            bilinear: true,
        }
    }
}

/// Grid sampling: discretizes the model bounding box into a uniform grid
/// and ray-casts along grid lines, keeping every ray/triangle hit as a
/// sample. Per triangle, only the grid sub-box covering the triangle is
/// visited, and with `use_normal` only the axis most aligned with the face
/// normal is cast, which avoids redundant rays.
pub fn sample_grid(
    input: &Model,
    texture: &Image,
    params: &GridParams,
    output: &mut Model,
) -> SampleStats {
    let mut stats = SampleStats::default();

    let mut bbox = input.bbox();
    if params.cubical {
        bbox = bbox.to_cubical();
    }
    let grid_size = params.grid_size.max(1) as i64;
    let step = bbox.size() / grid_size as f32;

    let mut builder = ModelBuilder::new(output);
    for t in 0..input.triangle_count() {
        let tri = input.fetch_triangle(t);
        let [p0, p1, p2] = [tri[0].position, tri[1].position, tri[2].position];

        if geometry::triangle_area(&p0, &p1, &p2) < geometry::DEGENERATE_AREA_EPS {
            stats.skipped_degenerate += 1;
            continue;
        }
        let face_normal = input.face_normal(t);

        // Snap the triangle's own box onto the global grid.
        let mut local = Aabb::empty();
        local.extend(&p0);
        local.extend(&p1);
        local.extend(&p2);
        let mut lo = [0i64; 3];
        let mut hi = [0i64; 3];
        for a in 0..3 {
            if step[a] <= 0.0 {
                continue;
            }
            lo[a] = (((local.min[a] - bbox.min[a]) / step[a]).floor() as i64).clamp(0, grid_size);
            hi[a] = (((local.max[a] - bbox.min[a]) / step[a]).ceil() as i64).clamp(0, grid_size);
        }

        let axes: &[usize] = if params.use_normal {
            // The axis the face normal is most aligned with.
            let n = face_normal;
            let dominant = if n.x.abs() >= n.y.abs() && n.x.abs() >= n.z.abs() {
                0
            } else if n.y.abs() >= n.z.abs() {
                1
            } else {
                2
            };
            match dominant {
                0 => &[0],
                1 => &[1],
                _ => &[2],
            }
        } else {
            &[0, 1, 2]
        };

        for &axis in axes {
            let (a1, a2) = ((axis + 1) % 3, (axis + 2) % 3);
            let mut dir = Vector3::zeros();
            dir[axis] = 1.0;

            for i in lo[a1]..=hi[a1] {
                for j in lo[a2]..=hi[a2] {
                    let mut origin = Point3::origin();
                    origin[axis] = bbox.min[axis] - step[axis];
                    origin[a1] = bbox.min[a1] + i as f32 * step[a1];
                    origin[a2] = bbox.min[a2] + j as f32 * step[a2];

                    // The ray is a full grid line: hits at any t count.
                    if let Some((t_hit, u, v)) = geometry::ray_triangle(&origin, &dir, &p0, &p1, &p2)
                    {
                        let pos = origin + dir * t_hit;
                        let mut vertex = Vertex::new(pos);

                        let normal = match (tri[0].normal, tri[1].normal, tri[2].normal) {
                            (Some(n0), Some(n1), Some(n2)) => {
                                triangle_interpolation(n0, n1, n2, u, v)
                            }
                            _ => face_normal,
                        };
                        vertex = vertex.with_normal(normal);
                        if let Some(c) = resolve_color(texture, params.bilinear, &tri, u, v) {
                            vertex = vertex.with_color(c);
                        }
                        builder.push_vertex(&vertex);
                    }
                }
            }
        }
    }

    stats.duplicates = builder.duplicates();
    stats.points = output.vertex_count();
    stats
}
