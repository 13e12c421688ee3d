use super::SampleStats;
use crate::core::geometry::{self, triangle_interpolation};
use crate::image2d::Image;
use crate::model::{Model, ModelBuilder, Vertex};
use log::error;
use nalgebra::{Point3, Vector2};

/// Reverse texture-map sampling: for every texel whose center falls inside
/// a triangle's UV footprint, back-projects the texel center to 3D and
/// assigns that texel's color directly, with no filtering.
///
/// Precondition: a non-empty texture and per-corner UVs. With an empty
/// texture the call logs an error and produces nothing.
pub fn sample_map(input: &Model, texture: &Image, output: &mut Model) -> SampleStats {
    let mut stats = SampleStats::default();

    if texture.is_empty() {
        error!("map sampling requires a texture, none was provided");
        return stats;
    }
    let width = texture.width;
    let height = texture.height;

    let mut builder = ModelBuilder::new(output);
    for t in 0..input.triangle_count() {
        let tri = input.fetch_triangle(t);
        let [p0, p1, p2] = [tri[0].position, tri[1].position, tri[2].position];

        if geometry::triangle_area(&p0, &p1, &p2) < geometry::DEGENERATE_AREA_EPS {
            stats.skipped_degenerate += 1;
            continue;
        }
        let (uv0, uv1, uv2) = match (tri[0].uv, tri[1].uv, tri[2].uv) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => {
                stats.skipped_degenerate += 1;
                continue;
            }
        };
        let face_normal = input.face_normal(t);

        // Texel range covering the triangle's UV bounding box.
        let umin = uv0.x.min(uv1.x).min(uv2.x);
        let umax = uv0.x.max(uv1.x).max(uv2.x);
        let vmin = uv0.y.min(uv1.y).min(uv2.y);
        let vmax = uv0.y.max(uv1.y).max(uv2.y);

        let col_min = ((umin * width as f32).floor() as i64).clamp(0, width as i64 - 1);
        let col_max = ((umax * width as f32).ceil() as i64).clamp(0, width as i64 - 1);
        let row_min = ((vmin * height as f32).floor() as i64).clamp(0, height as i64 - 1);
        let row_max = ((vmax * height as f32).ceil() as i64).clamp(0, height as i64 - 1);

        for row in row_min..=row_max {
            for col in col_min..=col_max {
                // Texel center in UV space (rows count from the bottom).
                let center = Vector2::new(
                    (col as f32 + 0.5) / width as f32,
                    (row as f32 + 0.5) / height as f32,
                );
                let (bw, inside) = geometry::barycentric(&center, &uv0, &uv1, &uv2);
                if !inside {
                    continue;
                }
                let (u, v) = (bw.y, bw.z);

                let pos = triangle_interpolation(p0.coords, p1.coords, p2.coords, u, v);
                let mut vertex = Vertex::new(Point3::from(pos));
                vertex = match (tri[0].normal, tri[1].normal, tri[2].normal) {
                    (Some(n0), Some(n1), Some(n2)) => {
                        vertex.with_normal(triangle_interpolation(n0, n1, n2, u, v))
                    }
                    _ => vertex.with_normal(face_normal),
                };
                // Storage rows count from the top: flip.
                let color = texture.texel(col as usize, (height as i64 - 1 - row) as usize);
                builder.push_vertex(&vertex.with_color(color));
            }
        }
    }

    stats.duplicates = builder.duplicates();
    stats.points = output.vertex_count();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    /// Unit square (two triangles) textured with the full unit UV square.
    fn textured_quad() -> Model {
        let mut model = Model::new();
        model.positions.extend_from_slice(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            1.0, 1.0, 0.0, //
            0.0, 1.0, 0.0,
        ]);
        model
            .uvcoords
            .extend_from_slice(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        model.triangles.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        model
    }

    fn checker(width: usize, height: usize) -> Image {
        let mut img = Image::new(width, height);
        for row in 0..height {
            for col in 0..width {
                let c = if (row + col) % 2 == 0 { 255 } else { 0 };
                img.set_texel(col, row, [c, c, c]);
            }
        }
        img
    }

    #[test]
    fn one_sample_per_covered_texel() {
        let quad = textured_quad();
        let texture = checker(4, 4);
        let mut out = Model::new();
        let stats = sample_map(&quad, &texture, &mut out);

        // Every texel center of the 4x4 texture lies inside the quad; the
        // four centers on the shared diagonal are found by both triangles
        // and merge in the builder.
        assert_eq!(stats.points, 16);
        assert_eq!(stats.duplicates, 4);
        assert!(out.has_colors());
    }

    #[test]
    fn texel_color_is_taken_unfiltered() {
        let quad = textured_quad();
        let texture = checker(2, 2);
        let mut out = Model::new();
        sample_map(&quad, &texture, &mut out);

        for i in 0..out.vertex_count() {
            let c = out.color(i);
            assert!(
                c == Vector3::new(255.0, 255.0, 255.0) || c == Vector3::new(0.0, 0.0, 0.0),
                "filtered color {c:?} leaked into map sampling"
            );
        }
    }

    #[test]
    fn empty_texture_yields_nothing() {
        let quad = textured_quad();
        let mut out = Model::new();
        let stats = sample_map(&quad, &Image::empty(), &mut out);
        assert_eq!(stats.points, 0);
        assert!(out.positions.is_empty());
    }
}
