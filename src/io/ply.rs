use crate::model::Model;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Writes a model as ASCII PLY. Point clouds simply omit the face
/// element. Colors are stored as 0..255 floats in the model and emitted
/// as `uchar` properties.
pub fn save_ply(model: &Model, path: &str) -> Result<(), String> {
    let file =
        File::create(path).map_err(|e| format!("Failed to create '{}': {}", path, e))?;
    let mut out = BufWriter::new(file);

    let has_normals = model.has_normals();
    let has_colors = model.has_colors();
    let write = |out: &mut BufWriter<File>, model: &Model| -> std::io::Result<()> {
        writeln!(out, "ply")?;
        writeln!(out, "format ascii 1.0")?;
        writeln!(out, "element vertex {}", model.vertex_count())?;
        writeln!(out, "property float x")?;
        writeln!(out, "property float y")?;
        writeln!(out, "property float z")?;
        if has_normals {
            writeln!(out, "property float nx")?;
            writeln!(out, "property float ny")?;
            writeln!(out, "property float nz")?;
        }
        if has_colors {
            writeln!(out, "property uchar red")?;
            writeln!(out, "property uchar green")?;
            writeln!(out, "property uchar blue")?;
        }
        if !model.is_point_cloud() {
            writeln!(out, "element face {}", model.triangle_count())?;
            writeln!(out, "property list uchar int vertex_indices")?;
        }
        writeln!(out, "end_header")?;

        for i in 0..model.vertex_count() {
            let p = model.position(i);
            write!(out, "{} {} {}", p.x, p.y, p.z)?;
            if has_normals {
                let n = model.normal(i);
                write!(out, " {} {} {}", n.x, n.y, n.z)?;
            }
            if has_colors {
                let c = model.color(i);
                write!(
                    out,
                    " {} {} {}",
                    c.x.round().clamp(0.0, 255.0) as u8,
                    c.y.round().clamp(0.0, 255.0) as u8,
                    c.z.round().clamp(0.0, 255.0) as u8
                )?;
            }
            writeln!(out)?;
        }
        for t in model.triangles.chunks_exact(3) {
            writeln!(out, "3 {} {} {}", t[0], t[1], t[2])?;
        }
        Ok(())
    };

    write(&mut out, model).map_err(|e| format!("Failed to write '{}': {}", path, e))?;
    info!("Saved {} vertices to {}", model.vertex_count(), path);
    Ok(())
}
