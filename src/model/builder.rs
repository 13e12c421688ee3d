use super::{Model, Vertex};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

type Of = OrderedFloat<f32>;

/// Canonical map key: position plus every present optional attribute,
/// compared lexicographically. Insertion order is irrelevant, only key
/// uniqueness matters.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct VertexKey {
    position: [Of; 3],
    uv: Option<[Of; 2]>,
    color: Option<[Of; 3]>,
    normal: Option<[Of; 3]>,
}

impl VertexKey {
    fn from_vertex(v: &Vertex) -> Self {
        Self {
            position: [
                OrderedFloat(v.position.x),
                OrderedFloat(v.position.y),
                OrderedFloat(v.position.z),
            ],
            uv: v.uv.map(|uv| [OrderedFloat(uv.x), OrderedFloat(uv.y)]),
            color: v
                .color
                .map(|c| [OrderedFloat(c.x), OrderedFloat(c.y), OrderedFloat(c.z)]),
            normal: v
                .normal
                .map(|n| [OrderedFloat(n.x), OrderedFloat(n.y), OrderedFloat(n.z)]),
        }
    }
}

/// Deduplicating writer around a target [`Model`].
///
/// This is the single point of truth for "same point, reuse index"
/// semantics: `push_vertex` performs an exact-key lookup and either returns
/// the already-assigned index (counting the duplicate) or appends all
/// present attributes to the target arrays. Every sampling strategy routes
/// its output through one of these.
pub struct ModelBuilder<'a> {
    model: &'a mut Model,
    map: BTreeMap<VertexKey, u32>,
    duplicates: usize,
}

impl<'a> ModelBuilder<'a> {
    /// Wraps a target model. The target is expected to be freshly created;
    /// vertices already present are not entered into the dedup map.
    pub fn new(model: &'a mut Model) -> Self {
        Self {
            model,
            map: BTreeMap::new(),
            duplicates: 0,
        }
    }

    /// Number of `push_vertex` calls that resolved to an existing index.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn vertex_count(&self) -> usize {
        self.model.vertex_count()
    }

    /// Pushes a vertex, returning its index in the target model. A vertex
    /// whose full attribute key was seen before reuses the stored index.
    pub fn push_vertex(&mut self, v: &Vertex) -> u32 {
        let key = VertexKey::from_vertex(v);
        if let Some(&idx) = self.map.get(&key) {
            self.duplicates += 1;
            return idx;
        }

        let idx = self.model.vertex_count() as u32;
        self.model
            .positions
            .extend_from_slice(&[v.position.x, v.position.y, v.position.z]);
        if let Some(uv) = v.uv {
            self.model.uvcoords.extend_from_slice(&[uv.x, uv.y]);
        }
        if let Some(c) = v.color {
            self.model.colors.extend_from_slice(&[c.x, c.y, c.z]);
        }
        if let Some(n) = v.normal {
            self.model.normals.extend_from_slice(&[n.x, n.y, n.z]);
        }
        self.map.insert(key, idx);
        idx
    }

    /// Pushes three vertices and appends the resulting index triple to the
    /// triangle array; with `with_uv_indices` the triple is mirrored into
    /// the separate UV index array as well.
    pub fn push_triangle(&mut self, v0: &Vertex, v1: &Vertex, v2: &Vertex, with_uv_indices: bool) {
        let i0 = self.push_vertex(v0);
        let i1 = self.push_vertex(v1);
        let i2 = self.push_vertex(v2);
        self.model.triangles.extend_from_slice(&[i0, i1, i2]);
        if with_uv_indices {
            self.model.tri_uv_indices.extend_from_slice(&[i0, i1, i2]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector2, Vector3};

    #[test]
    fn dedup_is_idempotent() {
        let mut model = Model::new();
        let mut builder = ModelBuilder::new(&mut model);

        let v = Vertex::new(Point3::new(1.0, 2.0, 3.0))
            .with_uv(Vector2::new(0.5, 0.5))
            .with_color(Vector3::new(255.0, 0.0, 0.0));

        let first = builder.push_vertex(&v);
        let second = builder.push_vertex(&v);
        assert_eq!(first, second);
        assert_eq!(builder.duplicates(), 1);
        assert_eq!(model.vertex_count(), 1);
        assert_eq!(model.colors, vec![255.0, 0.0, 0.0]);
    }

    #[test]
    fn differing_attribute_forces_new_index() {
        let mut model = Model::new();
        let mut builder = ModelBuilder::new(&mut model);

        let a = Vertex::new(Point3::origin()).with_normal(Vector3::new(0.0, 0.0, 1.0));
        let b = Vertex::new(Point3::origin()).with_normal(Vector3::new(0.0, 1.0, 0.0));
        assert_ne!(builder.push_vertex(&a), builder.push_vertex(&b));
        assert_eq!(builder.duplicates(), 0);
        assert_eq!(model.vertex_count(), 2);
    }

    #[test]
    fn push_triangle_appends_indices() {
        let mut model = Model::new();
        let mut builder = ModelBuilder::new(&mut model);

        let a = Vertex::new(Point3::new(0.0, 0.0, 0.0));
        let b = Vertex::new(Point3::new(1.0, 0.0, 0.0));
        let c = Vertex::new(Point3::new(0.0, 1.0, 0.0));
        builder.push_triangle(&a, &b, &c, false);
        // Second triangle shares an edge: two of its corners dedup.
        let d = Vertex::new(Point3::new(1.0, 1.0, 0.0));
        builder.push_triangle(&b, &d, &c, false);

        assert_eq!(model.vertex_count(), 4);
        assert_eq!(model.triangles, vec![0, 1, 2, 1, 3, 2]);
    }
}
