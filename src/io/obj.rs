use crate::model::Model;
use log::{info, warn};
use std::path::Path;

/// Loads an OBJ file into a parallel-array [`Model`].
///
/// Indices are kept un-unified so a texture seam does not force vertex
/// duplication: positions are indexed by `triangles`, texture coordinates
/// by `tri_uv_indices` when the file carries them. Sub-meshes are merged
/// into one model.
pub fn load_obj(path: &str) -> Result<Model, String> {
    let path_obj = Path::new(path);
    if !path_obj.exists() {
        return Err(format!("File not found: {}", path));
    }

    info!("Loading OBJ file: {}", path);

    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: false,
        ..Default::default()
    };

    let (meshes, _materials) = tobj::load_obj(path_obj, &load_options)
        .map_err(|e| format!("Failed to load OBJ: {}", e))?;

    let mut model = Model::new();

    for loaded in meshes {
        let mesh = &loaded.mesh;
        let position_offset = model.vertex_count() as u32;
        let uv_offset = (model.uvcoords.len() / 2) as u32;

        model.positions.extend_from_slice(&mesh.positions);
        for idx in &mesh.indices {
            model.triangles.push(idx + position_offset);
        }

        if !mesh.texcoords.is_empty() {
            model.uvcoords.extend_from_slice(&mesh.texcoords);
            for idx in &mesh.texcoord_indices {
                model.tri_uv_indices.push(idx + uv_offset);
            }
        } else if !model.uvcoords.is_empty() {
            warn!(
                "Mesh '{}' has no texture coordinates; dropping UVs for the merged model",
                loaded.name
            );
            model.uvcoords.clear();
            model.tri_uv_indices.clear();
        }

        // OBJ normals come with their own topology; scatter them onto the
        // position slots and let unreferenced slots stay zero.
        if !mesh.normals.is_empty() {
            model
                .normals
                .resize(model.positions.len(), 0.0);
            for (k, n_idx) in mesh.normal_indices.iter().enumerate() {
                let v_idx = (mesh.indices[k] + position_offset) as usize;
                let n_idx = *n_idx as usize;
                for c in 0..3 {
                    model.normals[v_idx * 3 + c] = mesh.normals[n_idx * 3 + c];
                }
            }
        }

        // Extended-OBJ vertex colors arrive in 0..1; the model stores 0..255.
        if !mesh.vertex_color.is_empty() {
            for c in &mesh.vertex_color {
                model.colors.push(c * 255.0);
            }
        }
    }

    info!(
        "Loaded {} vertices, {} triangles",
        model.vertex_count(),
        model.triangle_count()
    );
    Ok(model)
}
