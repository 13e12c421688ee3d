use super::SampleStats;
use crate::core::geometry;
use crate::image2d::Image;
use crate::model::{Model, ModelBuilder, Vertex};
use nalgebra::Vector3;

/// Hard recursion cap protecting the stack when a threshold is set far
/// below the triangle scale.
const MAX_DEPTH: u32 = 24;

/// Parameters of the area-based adaptive subdivision sampler.
#[derive(Debug, Clone, Copy)]
pub struct AreaSubdivParams {
    /// Stop splitting once the triangle area falls below this.
    pub threshold: f32,
    /// Additionally keep splitting until all three corners map to the same
    /// or an adjacent texel, preventing texture aliasing.
    pub map_threshold: bool,
    pub bilinear: bool,
}

impl Default for AreaSubdivParams {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            map_threshold: false,
            bilinear: true,
        }
    }
}

/// Parameters of the edge-length adaptive subdivision sampler.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSubdivParams {
    /// An edge is split while it is longer than twice this value.
    pub threshold: f32,
    pub bilinear: bool,
}

impl Default for EdgeSubdivParams {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            bilinear: true,
        }
    }
}

/// Area-based adaptive subdivision: a uniform four-way midpoint split,
/// recursing until the area criterion (and optionally the mapped-texel
/// criterion) is met, then pushing the leaf corners. Midpoint attributes
/// are blended linearly, normals included.
pub fn sample_area_subdiv(
    input: &Model,
    texture: &Image,
    params: &AreaSubdivParams,
    output: &mut Model,
) -> SampleStats {
    let mut stats = SampleStats::default();
    let mut builder = ModelBuilder::new(output);

    for t in 0..input.triangle_count() {
        let tri = input.fetch_triangle(t);
        if degenerate(&tri) {
            stats.skipped_degenerate += 1;
            continue;
        }
        split_area(&tri, texture, params, &mut builder, 0);
    }

    stats.duplicates = builder.duplicates();
    stats.points = output.vertex_count();
    stats
}

fn split_area(
    tri: &[Vertex; 3],
    texture: &Image,
    params: &AreaSubdivParams,
    builder: &mut ModelBuilder,
    depth: u32,
) {
    let area = geometry::triangle_area(&tri[0].position, &tri[1].position, &tri[2].position);
    let area_ok = area < params.threshold;
    let map_ok = !params.map_threshold || texels_adjacent(tri, texture);

    if (area_ok && map_ok) || depth >= MAX_DEPTH {
        for v in tri {
            builder.push_vertex(&colorize(*v, texture, params.bilinear));
        }
        return;
    }

    let m01 = tri[0].midpoint(&tri[1]);
    let m12 = tri[1].midpoint(&tri[2]);
    let m20 = tri[2].midpoint(&tri[0]);
    for child in [
        [tri[0], m01, m20],
        [m01, tri[1], m12],
        [m20, m12, tri[2]],
        [m01, m12, m20],
    ] {
        split_area(&child, texture, params, builder, depth + 1);
    }
}

/// True when all three corners land on the same or an adjacent texel.
/// Without a texture or UVs the criterion is vacuously satisfied.
fn texels_adjacent(tri: &[Vertex; 3], texture: &Image) -> bool {
    if texture.is_empty() {
        return true;
    }
    let (uv0, uv1, uv2) = match (tri[0].uv, tri[1].uv, tri[2].uv) {
        (Some(a), Some(b), Some(c)) => (a, b, c),
        _ => return true,
    };
    let t0 = texture.map_coord_clamped(&uv0);
    let t1 = texture.map_coord_clamped(&uv1);
    let t2 = texture.map_coord_clamped(&uv2);
    let near = |a: (usize, usize), b: (usize, usize)| {
        a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1
    };
    near(t0, t1) && near(t1, t2) && near(t2, t0)
}

/// Edge-length adaptive subdivision: splits only edges longer than twice
/// the threshold, covering all 8 combinations of split edges without
/// introducing T-vertices. Every emitted vertex carries the normal of the
/// original face, not a blended one (downstream metrics depend on this
/// asymmetry with the area mode).
pub fn sample_edge_subdiv(
    input: &Model,
    texture: &Image,
    params: &EdgeSubdivParams,
    output: &mut Model,
) -> SampleStats {
    let mut stats = SampleStats::default();
    let mut builder = ModelBuilder::new(output);

    for t in 0..input.triangle_count() {
        let tri = input.fetch_triangle(t);
        if degenerate(&tri) {
            stats.skipped_degenerate += 1;
            continue;
        }
        let face_normal = input.face_normal(t);
        split_edges(&tri, &face_normal, texture, params, &mut builder, 0);
    }

    stats.duplicates = builder.duplicates();
    stats.points = output.vertex_count();
    stats
}

fn split_edges(
    tri: &[Vertex; 3],
    face_normal: &Vector3<f32>,
    texture: &Image,
    params: &EdgeSubdivParams,
    builder: &mut ModelBuilder,
    depth: u32,
) {
    let [v0, v1, v2] = *tri;
    let limit = 2.0 * params.threshold;
    let split01 = (v1.position - v0.position).norm() > limit;
    let split12 = (v2.position - v1.position).norm() > limit;
    let split20 = (v0.position - v2.position).norm() > limit;

    if (!split01 && !split12 && !split20) || depth >= MAX_DEPTH {
        for v in tri {
            let v = colorize(*v, texture, params.bilinear).with_normal(*face_normal);
            builder.push_vertex(&v);
        }
        return;
    }

    let m01 = v0.midpoint(&v1);
    let m12 = v1.midpoint(&v2);
    let m20 = v2.midpoint(&v0);

    // The 8-case split table; each case avoids T-vertices by connecting the
    // split midpoints.
    let children: Vec<[Vertex; 3]> = match (split01, split12, split20) {
        (false, false, false) => unreachable!(),
        (true, false, false) => vec![[v0, m01, v2], [m01, v1, v2]],
        (false, true, false) => vec![[v0, v1, m12], [v0, m12, v2]],
        (false, false, true) => vec![[v0, v1, m20], [m20, v1, v2]],
        (true, true, false) => vec![[v1, m12, m01], [v0, m01, m12], [v0, m12, v2]],
        (false, true, true) => vec![[m12, v2, m20], [v0, v1, m12], [v0, m12, m20]],
        (true, false, true) => vec![[v0, m01, m20], [m01, v1, v2], [m01, v2, m20]],
        (true, true, true) => vec![
            [v0, m01, m20],
            [m01, v1, m12],
            [m20, m12, v2],
            [m01, m12, m20],
        ],
    };
    for child in &children {
        split_edges(child, face_normal, texture, params, builder, depth + 1);
    }
}

fn degenerate(tri: &[Vertex; 3]) -> bool {
    geometry::triangle_area(&tri[0].position, &tri[1].position, &tri[2].position)
        < geometry::DEGENERATE_AREA_EPS
}

/// Attaches a texture color to the vertex when a texture and UVs are
/// available; per-vertex colors pass through otherwise.
fn colorize(mut v: Vertex, texture: &Image, bilinear: bool) -> Vertex {
    if !texture.is_empty() {
        if let Some(uv) = v.uv {
            v.color = Some(if bilinear {
                texture.fetch_bilinear(&uv)
            } else {
                texture.fetch_nearest(&uv)
            });
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn unit_right_triangle(with_normals: bool) -> Model {
        let mut model = Model::new();
        model
            .positions
            .extend_from_slice(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        model.triangles.extend_from_slice(&[0, 1, 2]);
        if with_normals {
            // Deliberately unequal so blending is observable.
            model.normals.extend_from_slice(&[
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ]);
        }
        model
    }

    #[test]
    fn area_split_reaches_the_expected_lattice() {
        let input = unit_right_triangle(false);
        // Area halves 0.5 -> 0.125 -> 0.03125: two levels of splitting,
        // a 4x4 uniform subdivision with 15 lattice vertices.
        let params = AreaSubdivParams {
            threshold: 0.1,
            map_threshold: false,
            bilinear: false,
        };
        let mut out = Model::new();
        let stats = sample_area_subdiv(&input, &Image::empty(), &params, &mut out);
        assert_eq!(stats.points, 15);
    }

    #[test]
    fn area_mode_blends_normals_linearly() {
        let input = unit_right_triangle(true);
        let params = AreaSubdivParams {
            threshold: 0.2,
            map_threshold: false,
            bilinear: false,
        };
        let mut out = Model::new();
        sample_area_subdiv(&input, &Image::empty(), &params, &mut out);
        assert!(out.has_normals());
        // The edge midpoint between corners 0 and 1 blends their normals.
        let found = (0..out.vertex_count()).any(|i| {
            out.position(i) == Point3::new(0.5, 0.0, 0.0)
                && out.normal(i) == Vector3::new(0.5, 0.5, 0.0)
        });
        assert!(found, "blended midpoint normal missing");
    }

    #[test]
    fn edge_mode_forces_the_face_normal() {
        let input = unit_right_triangle(true);
        let params = EdgeSubdivParams {
            threshold: 0.2,
            bilinear: false,
        };
        let mut out = Model::new();
        let stats = sample_edge_subdiv(&input, &Image::empty(), &params, &mut out);
        assert!(stats.points > 3);
        for i in 0..out.vertex_count() {
            assert_eq!(out.normal(i), Vector3::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn shrinking_thresholds_never_lose_points() {
        let input = unit_right_triangle(false);
        let mut last = 0;
        for threshold in [0.5, 0.1, 0.02, 0.004] {
            let mut out = Model::new();
            let stats = sample_area_subdiv(
                &input,
                &Image::empty(),
                &AreaSubdivParams {
                    threshold,
                    map_threshold: false,
                    bilinear: false,
                },
                &mut out,
            );
            assert!(stats.points >= last);
            last = stats.points;

            let mut out = Model::new();
            let stats = sample_edge_subdiv(
                &input,
                &Image::empty(),
                &EdgeSubdivParams {
                    threshold,
                    bilinear: false,
                },
                &mut out,
            );
            assert!(stats.points > 0);
        }
    }

    #[test]
    fn map_threshold_refines_down_to_texel_scale() {
        let mut input = unit_right_triangle(false);
        input
            .uvcoords
            .extend_from_slice(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);

        let texture = Image::new(8, 8);
        let coarse = AreaSubdivParams {
            threshold: 10.0,
            map_threshold: false,
            bilinear: false,
        };
        let refined = AreaSubdivParams {
            map_threshold: true,
            ..coarse
        };

        let mut a = Model::new();
        let na = sample_area_subdiv(&input, &texture, &coarse, &mut a).points;
        let mut b = Model::new();
        let nb = sample_area_subdiv(&input, &texture, &refined, &mut b).points;
        assert!(nb > na, "texel criterion did not force extra splits");
    }

    #[test]
    fn degenerate_triangles_are_counted_and_skipped() {
        let mut input = unit_right_triangle(false);
        input.positions.extend_from_slice(&[2.0, 0.0, 0.0]);
        input.triangles.extend_from_slice(&[0, 0, 3]);

        let mut out = Model::new();
        let stats = sample_area_subdiv(
            &input,
            &Image::empty(),
            &AreaSubdivParams::default(),
            &mut out,
        );
        assert_eq!(stats.skipped_degenerate, 1);
    }
}
