use super::{resolve_color, SampleStats};
use crate::core::geometry::{self, triangle_interpolation};
use crate::image2d::Image;
use crate::model::{Model, ModelBuilder, Vertex};
use nalgebra::Point3;

/// Parameters of the quasi-random per-triangle sampler.
#[derive(Debug, Clone, Copy)]
pub struct PrndParams {
    /// Global number of points, distributed over triangles proportionally
    /// to their area.
    pub target_count: usize,
    pub bilinear: bool,
}

impl Default for PrndParams {
    fn default() -> Self {
        Self {
            target_count: 2_000_000,
            bilinear: true,
        }
    }
}

/// Roberts' R2 low-discrepancy sequence: the n-th point of the infinite
/// quasi-random sequence in the unit square, built on the plastic number.
#[inline]
fn r2_sequence(n: usize) -> (f32, f32) {
    // Plastic number, the 2D generalization of the golden ratio.
    const G: f64 = 1.324_717_957_244_746;
    const A1: f64 = 1.0 / G;
    const A2: f64 = 1.0 / (G * G);
    let x = (0.5 + A1 * n as f64).fract();
    let y = (0.5 + A2 * n as f64).fract();
    (x as f32, y as f32)
}

/// Quasi-random sampling: each triangle receives its area-proportional
/// share of the global target count; points come from the R2 sequence
/// mapped onto a basis relative to the triangle's longest edge, folding
/// points outside the unit triangle back through `(1-x, 1-y)`.
pub fn sample_prnd(
    input: &Model,
    texture: &Image,
    params: &PrndParams,
    output: &mut Model,
) -> SampleStats {
    let mut stats = SampleStats::default();

    // First pass: total surface area of the non-degenerate triangles.
    let mut total_area = 0.0f64;
    for t in 0..input.triangle_count() {
        let [p0, p1, p2] = input.triangle_positions(t);
        let area = geometry::triangle_area(&p0, &p1, &p2);
        if area >= geometry::DEGENERATE_AREA_EPS {
            total_area += area as f64;
        }
    }
    if total_area <= 0.0 {
        stats.skipped_degenerate = input.triangle_count();
        return stats;
    }

    let mut builder = ModelBuilder::new(output);
    for t in 0..input.triangle_count() {
        let mut tri = input.fetch_triangle(t);
        let area =
            geometry::triangle_area(&tri[0].position, &tri[1].position, &tri[2].position);
        if area < geometry::DEGENERATE_AREA_EPS {
            stats.skipped_degenerate += 1;
            continue;
        }

        // Rotate the corner order so the longest edge runs v0 -> v1; the
        // R2 square then maps to the triangle's longest-edge basis.
        let l01 = (tri[1].position - tri[0].position).norm();
        let l12 = (tri[2].position - tri[1].position).norm();
        let l20 = (tri[0].position - tri[2].position).norm();
        if l12 >= l01 && l12 >= l20 {
            tri.rotate_left(1);
        } else if l20 >= l01 && l20 >= l12 {
            tri.rotate_left(2);
        }

        let share =
            (params.target_count as f64 * area as f64 / total_area).round() as usize;
        let face_normal = input.face_normal(t);

        for n in 0..share {
            let (mut u, mut v) = r2_sequence(n);
            if u + v > 1.0 {
                // Fold back into the unit triangle.
                u = 1.0 - u;
                v = 1.0 - v;
            }

            let pos = triangle_interpolation(
                tri[0].position.coords,
                tri[1].position.coords,
                tri[2].position.coords,
                u,
                v,
            );
            let mut vertex = Vertex::new(Point3::from(pos));
            vertex = match (tri[0].normal, tri[1].normal, tri[2].normal) {
                (Some(n0), Some(n1), Some(n2)) => {
                    vertex.with_normal(triangle_interpolation(n0, n1, n2, u, v))
                }
                _ => vertex.with_normal(face_normal),
            };
            if let Some(c) = resolve_color(texture, params.bilinear, &tri, u, v) {
                vertex = vertex.with_color(c);
            }
            builder.push_vertex(&vertex);
        }
    }

    stats.duplicates = builder.duplicates();
    stats.points = output.vertex_count();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::unit_cube;

    #[test]
    fn r2_points_stay_in_the_unit_square() {
        for n in 0..10_000 {
            let (x, y) = r2_sequence(n);
            assert!((0.0..1.0).contains(&x));
            assert!((0.0..1.0).contains(&y));
        }
    }

    #[test]
    fn share_is_proportional_to_area() {
        let cube = unit_cube();
        let params = PrndParams {
            target_count: 1200,
            bilinear: false,
        };
        let mut out = Model::new();
        let stats = sample_prnd(&cube, &Image::empty(), &params, &mut out);
        // 12 equal triangles, 100 points each; the low-discrepancy points
        // of one face never coincide with another face's (different
        // normals), so nothing merges.
        assert_eq!(stats.points, 1200);
        assert_eq!(stats.skipped_degenerate, 0);
    }

    #[test]
    fn sampling_is_deterministic() {
        let cube = unit_cube();
        let params = PrndParams {
            target_count: 500,
            bilinear: false,
        };
        let mut a = Model::new();
        let mut b = Model::new();
        sample_prnd(&cube, &Image::empty(), &params, &mut a);
        sample_prnd(&cube, &Image::empty(), &params, &mut b);
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn points_lie_inside_their_triangles() {
        let mut model = Model::new();
        model
            .positions
            .extend_from_slice(&[0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        model.triangles.extend_from_slice(&[0, 1, 2]);

        let mut out = Model::new();
        sample_prnd(
            &model,
            &Image::empty(),
            &PrndParams {
                target_count: 256,
                bilinear: false,
            },
            &mut out,
        );
        for i in 0..out.vertex_count() {
            let p = out.position(i);
            assert!(p.x >= 0.0 && p.y >= 0.0 && p.z == 0.0);
            // Inside x/2 + y <= 1 up to float tolerance.
            assert!(p.x / 2.0 + p.y <= 1.0 + 1e-5, "point {p:?} escaped");
        }
    }
}
