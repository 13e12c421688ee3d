pub mod builder;
pub mod reorder;
pub mod vertex;

use crate::core::geometry::{self, Aabb};
use nalgebra::{Point3, Vector2, Vector3};

pub use builder::ModelBuilder;
pub use vertex::Vertex;

/// An indexed vertex/attribute store holding either a mesh (positions plus
/// triangle topology) or a point cloud (positions only).
///
/// Attributes live in parallel flat arrays: `positions` is N*3 floats,
/// `uvcoords` M*2, `normals` P*3, `colors` Q*3 (stored in the 0..255 range),
/// `face_normals` T*3. `triangles` holds T*3 indices into the vertex arrays;
/// `tri_uv_indices`, when non-empty, gives each triangle corner its own UV
/// index for meshes whose UV topology differs from the position topology.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub positions: Vec<f32>,
    pub uvcoords: Vec<f32>,
    pub normals: Vec<f32>,
    pub colors: Vec<f32>,
    pub face_normals: Vec<f32>,
    pub triangles: Vec<u32>,
    pub tri_uv_indices: Vec<u32>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// A point cloud carries positions but no triangle topology.
    pub fn is_point_cloud(&self) -> bool {
        !self.positions.is_empty() && self.triangles.is_empty()
    }

    /// UVs are usable either per-vertex (1:1 with positions) or through a
    /// separate per-corner index array.
    pub fn has_uvcoords(&self) -> bool {
        !self.uvcoords.is_empty()
            && (!self.tri_uv_indices.is_empty()
                || self.uvcoords.len() / 2 == self.positions.len() / 3)
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.positions.len()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty() && self.colors.len() == self.positions.len()
    }

    pub fn has_face_normals(&self) -> bool {
        !self.face_normals.is_empty() && self.face_normals.len() == self.triangles.len()
    }

    #[inline]
    pub fn position(&self, idx: usize) -> Point3<f32> {
        Point3::new(
            self.positions[idx * 3],
            self.positions[idx * 3 + 1],
            self.positions[idx * 3 + 2],
        )
    }

    #[inline]
    pub fn uv(&self, idx: usize) -> Vector2<f32> {
        Vector2::new(self.uvcoords[idx * 2], self.uvcoords[idx * 2 + 1])
    }

    #[inline]
    pub fn normal(&self, idx: usize) -> Vector3<f32> {
        Vector3::new(
            self.normals[idx * 3],
            self.normals[idx * 3 + 1],
            self.normals[idx * 3 + 2],
        )
    }

    #[inline]
    pub fn color(&self, idx: usize) -> Vector3<f32> {
        Vector3::new(
            self.colors[idx * 3],
            self.colors[idx * 3 + 1],
            self.colors[idx * 3 + 2],
        )
    }

    /// The three position corners of triangle `t`.
    pub fn triangle_positions(&self, t: usize) -> [Point3<f32>; 3] {
        let i0 = self.triangles[t * 3] as usize;
        let i1 = self.triangles[t * 3 + 1] as usize;
        let i2 = self.triangles[t * 3 + 2] as usize;
        [self.position(i0), self.position(i1), self.position(i2)]
    }

    /// Gathers triangle `t` into three fully-qualified [`Vertex`] values,
    /// honoring the separate UV index array when present.
    pub fn fetch_triangle(&self, t: usize) -> [Vertex; 3] {
        let mut out = [Vertex::default(); 3];
        let has_uv = self.has_uvcoords();
        let has_nrm = self.has_normals();
        let has_col = self.has_colors();
        let separate_uv = !self.tri_uv_indices.is_empty();

        for (k, vertex) in out.iter_mut().enumerate() {
            let idx = self.triangles[t * 3 + k] as usize;
            vertex.position = self.position(idx);
            if has_uv {
                let uv_idx = if separate_uv {
                    self.tri_uv_indices[t * 3 + k] as usize
                } else {
                    idx
                };
                vertex.uv = Some(self.uv(uv_idx));
            }
            if has_nrm {
                vertex.normal = Some(self.normal(idx));
            }
            if has_col {
                vertex.color = Some(self.color(idx));
            }
        }
        out
    }

    /// Normal of triangle `t`: the stored face normal when available,
    /// otherwise computed on the fly. NaN normals from degenerate triangles
    /// are replaced with `(0, 0, 1)`.
    pub fn face_normal(&self, t: usize) -> Vector3<f32> {
        let n = if self.has_face_normals() {
            Vector3::new(
                self.face_normals[t * 3],
                self.face_normals[t * 3 + 1],
                self.face_normals[t * 3 + 2],
            )
        } else {
            let [v0, v1, v2] = self.triangle_positions(t);
            geometry::triangle_normal(&v0, &v1, &v2)
        };
        if n.x.is_nan() || n.y.is_nan() || n.z.is_nan() {
            Vector3::new(0.0, 0.0, 1.0)
        } else {
            n
        }
    }

    /// Recomputes the per-face normal array from scratch.
    pub fn compute_face_normals(&mut self) {
        self.face_normals.clear();
        self.face_normals.reserve(self.triangles.len());
        for t in 0..self.triangle_count() {
            let [v0, v1, v2] = self.triangle_positions(t);
            let mut n = geometry::triangle_normal(&v0, &v1, &v2);
            if n.x.is_nan() || n.y.is_nan() || n.z.is_nan() {
                n = Vector3::new(0.0, 0.0, 1.0);
            }
            self.face_normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
    }

    pub fn bbox(&self) -> Aabb {
        Aabb::from_flat(&self.positions)
    }
}
