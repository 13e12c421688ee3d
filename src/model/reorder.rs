use super::Model;
use ordered_float::OrderedFloat;

type Of = OrderedFloat<f32>;

/// Canonical reordering: sorts vertices lexicographically by their full
/// attribute tuple, remaps the triangle indices, rotates every index triple
/// so the smallest index leads (orientation preserved), then sorts the
/// triples lexicographically.
///
/// Two topologically-equivalent meshes that differ only in enumeration
/// order come out byte-identical, which makes downstream rendering and
/// distortion metrics insensitive to face order.
pub fn reorder(input: &Model) -> Model {
    let n = input.vertex_count();
    let per_vertex_uv = input.has_uvcoords() && input.tri_uv_indices.is_empty();
    let has_normals = input.has_normals();
    let has_colors = input.has_colors();

    // 1. Sort vertices by (position, uv, color, normal).
    let mut order: Vec<u32> = (0..n as u32).collect();
    order.sort_by_key(|&i| sort_key(input, i as usize, per_vertex_uv));

    // Old index -> new index.
    let mut remap = vec![0u32; n];
    for (new, &old) in order.iter().enumerate() {
        remap[old as usize] = new as u32;
    }

    // 2. Rebuild the attribute arrays in sorted order.
    let mut out = Model::new();
    out.positions.reserve(input.positions.len());
    for &old in &order {
        let old = old as usize;
        out.positions
            .extend_from_slice(&input.positions[old * 3..old * 3 + 3]);
        if per_vertex_uv {
            out.uvcoords
                .extend_from_slice(&input.uvcoords[old * 2..old * 2 + 2]);
        }
        if has_normals {
            out.normals
                .extend_from_slice(&input.normals[old * 3..old * 3 + 3]);
        }
        if has_colors {
            out.colors
                .extend_from_slice(&input.colors[old * 3..old * 3 + 3]);
        }
    }
    // A separate UV topology indexes uvcoords directly; leave it in place.
    if !per_vertex_uv {
        out.uvcoords = input.uvcoords.clone();
    }

    // 3. Remap and rotate each triangle triple, carrying any UV triple
    //    through the same rotation.
    let separate_uv = !input.tri_uv_indices.is_empty();
    let mut triples: Vec<([u32; 3], [u32; 3])> = Vec::with_capacity(input.triangle_count());
    for t in 0..input.triangle_count() {
        let mapped = [
            remap[input.triangles[t * 3] as usize],
            remap[input.triangles[t * 3 + 1] as usize],
            remap[input.triangles[t * 3 + 2] as usize],
        ];
        let uvs = if separate_uv {
            [
                input.tri_uv_indices[t * 3],
                input.tri_uv_indices[t * 3 + 1],
                input.tri_uv_indices[t * 3 + 2],
            ]
        } else {
            [0, 0, 0]
        };
        let rot = smallest_first(&mapped);
        triples.push((rotate(&mapped, rot), rotate(&uvs, rot)));
    }

    // 4. Sort the triples themselves.
    triples.sort();

    for (tri, uvs) in &triples {
        out.triangles.extend_from_slice(tri);
        if separate_uv {
            out.tri_uv_indices.extend_from_slice(uvs);
        }
    }

    if input.has_face_normals() {
        out.compute_face_normals();
    }
    out
}

/// Rotation offset placing the smallest index first without changing the
/// winding.
fn smallest_first(tri: &[u32; 3]) -> usize {
    if tri[0] <= tri[1] && tri[0] <= tri[2] {
        0
    } else if tri[1] <= tri[2] {
        1
    } else {
        2
    }
}

fn rotate(tri: &[u32; 3], offset: usize) -> [u32; 3] {
    [
        tri[offset],
        tri[(offset + 1) % 3],
        tri[(offset + 2) % 3],
    ]
}

#[allow(clippy::type_complexity)]
fn sort_key(
    model: &Model,
    idx: usize,
    per_vertex_uv: bool,
) -> ([Of; 3], Option<[Of; 2]>, Option<[Of; 3]>, Option<[Of; 3]>) {
    let pos = [
        OrderedFloat(model.positions[idx * 3]),
        OrderedFloat(model.positions[idx * 3 + 1]),
        OrderedFloat(model.positions[idx * 3 + 2]),
    ];
    let uv = per_vertex_uv.then(|| {
        [
            OrderedFloat(model.uvcoords[idx * 2]),
            OrderedFloat(model.uvcoords[idx * 2 + 1]),
        ]
    });
    let color = model.has_colors().then(|| {
        [
            OrderedFloat(model.colors[idx * 3]),
            OrderedFloat(model.colors[idx * 3 + 1]),
            OrderedFloat(model.colors[idx * 3 + 2]),
        ]
    });
    let normal = model.has_normals().then(|| {
        [
            OrderedFloat(model.normals[idx * 3]),
            OrderedFloat(model.normals[idx * 3 + 1]),
            OrderedFloat(model.normals[idx * 3 + 2]),
        ]
    });
    (pos, uv, color, normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangle_quad(flip_enumeration: bool) -> Model {
        let mut model = Model::new();
        model.positions.extend_from_slice(&[
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            1.0, 1.0, 0.0, //
            0.0, 1.0, 0.0,
        ]);
        if flip_enumeration {
            // Same faces, different face order and rotated triples.
            model.triangles.extend_from_slice(&[2, 3, 0, 1, 2, 0]);
        } else {
            model.triangles.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        }
        model
    }

    #[test]
    fn enumeration_order_is_canonicalized() {
        let a = reorder(&two_triangle_quad(false));
        let b = reorder(&two_triangle_quad(true));
        assert_eq!(a.positions, b.positions);
        assert_eq!(a.triangles, b.triangles);
    }

    #[test]
    fn rotation_preserves_winding() {
        let model = two_triangle_quad(true);
        let before: Vec<_> = (0..model.triangle_count())
            .map(|t| model.face_normal(t))
            .collect();
        let out = reorder(&model);
        for t in 0..out.triangle_count() {
            // All faces of the quad share one plane; the normal sign must
            // survive canonicalization.
            assert_eq!(out.face_normal(t).z, before[t].z);
        }
    }

    #[test]
    fn vertices_sorted_lexicographically() {
        let mut model = Model::new();
        model
            .positions
            .extend_from_slice(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        model.triangles.extend_from_slice(&[0, 1, 2]);
        let out = reorder(&model);
        assert_eq!(out.positions[0..3], [0.0, 0.0, 0.0]);
        assert_eq!(out.positions[3..6], [0.0, 1.0, 0.0]);
        assert_eq!(out.positions[6..9], [1.0, 0.0, 0.0]);
    }
}
