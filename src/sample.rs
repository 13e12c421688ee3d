pub mod calibrate;
pub mod face;
pub mod grid;
pub mod map;
pub mod prnd;
pub mod subdiv;

use crate::core::geometry::triangle_interpolation;
use crate::image2d::Image;
use crate::model::Vertex;
use log::info;
use nalgebra::Vector3;

pub use calibrate::{calibrate, Calibration, CalibrationResult, ParamKind};
pub use face::{sample_face, FaceParams};
pub use grid::{sample_grid, GridParams};
pub use map::sample_map;
pub use prnd::{sample_prnd, PrndParams};
pub use subdiv::{sample_area_subdiv, sample_edge_subdiv, AreaSubdivParams, EdgeSubdivParams};

/// Diagnostic counters reported by every sampling strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleStats {
    /// Points stored in the output cloud.
    pub points: usize,
    /// Triangles skipped because their area fell below the degeneracy
    /// tolerance.
    pub skipped_degenerate: usize,
    /// `push_vertex` calls that resolved to an already-stored point.
    pub duplicates: usize,
}

impl SampleStats {
    pub fn log(&self, mode: &str) {
        info!(
            "{} sampling: {} points, {} duplicates merged, {} degenerate triangles skipped",
            mode, self.points, self.duplicates, self.skipped_degenerate
        );
    }
}

/// Resolves the color of a sample at barycentric `(u, v)` inside `tri`.
///
/// A non-empty texture wins (nearest or bilinear fetch through the
/// interpolated UV); otherwise per-vertex colors are interpolated; with
/// neither, the sample carries no color attribute.
pub(crate) fn resolve_color(
    texture: &Image,
    bilinear: bool,
    tri: &[Vertex; 3],
    u: f32,
    v: f32,
) -> Option<Vector3<f32>> {
    if !texture.is_empty() {
        if let (Some(uv0), Some(uv1), Some(uv2)) = (tri[0].uv, tri[1].uv, tri[2].uv) {
            let uv = triangle_interpolation(uv0, uv1, uv2, u, v);
            return Some(if bilinear {
                texture.fetch_bilinear(&uv)
            } else {
                texture.fetch_nearest(&uv)
            });
        }
    }
    if let (Some(c0), Some(c1), Some(c2)) = (tri[0].color, tri[1].color, tri[2].color) {
        return Some(triangle_interpolation(c0, c1, c2, u, v));
    }
    None
}
