use super::camera::{ndc_to_screen, OrthoCamera};
use super::shader::{RenderContext, ShaderStage};
use crate::core::geometry::Aabb;
use crate::image2d::Image;
use crate::model::{reorder::reorder, Model};
use log::info;
use nalgebra::{Point2, Point3, Vector3};
use std::borrow::Cow;

/// Parameters of one render call. All numeric values arrive validated from
/// the command layer.
#[derive(Debug, Clone, Copy)]
pub struct RenderParams {
    pub width: usize,
    pub height: usize,
    /// Direction the camera looks along.
    pub view_dir: Vector3<f32>,
    pub view_up: Vector3<f32>,
    /// Caller-supplied bounding box; auto-computed from the model when
    /// `None`. Supplying the same box for a reference and a distorted
    /// model keeps their framings identical.
    pub bbox: Option<Aabb>,
    pub clear_color: [u8; 4],
    pub cull_faces: bool,
    /// Winding convention of front faces in screen space when culling.
    pub clockwise: bool,
    pub lighting: bool,
    /// Explicit light position; auto-derived from the bounding sphere and
    /// `light_dir` when `None`.
    pub light_position: Option<Point3<f32>>,
    pub light_dir: Vector3<f32>,
    pub auto_level: bool,
    /// Canonicalize vertex/face enumeration before rendering, removing
    /// face-order sensitivity from the output buffers.
    pub canonicalize: bool,
    pub bilinear: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            view_dir: Vector3::new(0.0, 0.0, -1.0),
            view_up: Vector3::new(0.0, 1.0, 0.0),
            bbox: None,
            clear_color: [0, 0, 0, 0],
            cull_faces: false,
            clockwise: false,
            lighting: false,
            light_position: None,
            light_dir: Vector3::new(1.0, 1.0, 1.0),
            auto_level: false,
            canonicalize: false,
            bilinear: true,
        }
    }
}

/// Renders a mesh into caller-owned buffers: `color` is a flat
/// width*height*4 RGBA byte array, `depth` a width*height float array.
/// Both are cleared first; stored depth grows toward the camera, and the
/// greater depth wins the per-pixel test.
///
/// Degenerate geometry never fails a render: fragments with NaN depth are
/// silently dropped.
pub fn render(
    model: &Model,
    texture: &Image,
    params: &RenderParams,
    color: &mut [u8],
    depth: &mut [f32],
) {
    let (width, height) = (params.width, params.height);
    assert_eq!(color.len(), width * height * 4, "color buffer size");
    assert_eq!(depth.len(), width * height, "depth buffer size");

    let model: Cow<'_, Model> = if params.canonicalize {
        Cow::Owned(reorder(model))
    } else {
        Cow::Borrowed(model)
    };

    // 1. Camera setup over the caller-supplied or auto-computed box.
    let bbox = params.bbox.unwrap_or_else(|| model.bbox());
    let camera = OrthoCamera::frame(&bbox, &params.view_dir, &params.view_up);
    let light_position = params.light_position.unwrap_or_else(|| {
        bbox.center() + params.light_dir.normalize() * 2.0 * camera.radius
    });

    let ctx = RenderContext {
        mvp: camera.view_projection(),
        texture,
        light_position,
        ambient: 0.4,
        bilinear: params.bilinear,
    };

    // 2. Stage selection, once per render call.
    let stage = ShaderStage::select(&model, texture, params.lighting);

    // 3. Clear.
    for px in color.chunks_exact_mut(4) {
        px.copy_from_slice(&params.clear_color);
    }
    depth.fill(f32::NEG_INFINITY);

    // 4. Per-triangle loop.
    for t in 0..model.triangle_count() {
        let mut tri = model.fetch_triangle(t);
        if stage == ShaderStage::TexturedLit {
            // Lighting needs a normal on every corner.
            let face_normal = model.face_normal(t);
            for v in &mut tri {
                v.normal.get_or_insert(face_normal);
            }
        }

        let mut screen = [Point2::origin(); 3];
        let mut depths = [0.0f32; 3];
        let mut varyings = [super::shader::Varying::default(); 3];
        let mut skip = false;
        for k in 0..3 {
            let (clip, varying) = stage.vertex(&ctx, &tri[k]);
            if clip.w.abs() < 1e-6 {
                skip = true;
                break;
            }
            let ndc = clip.xyz() / clip.w;
            screen[k] = ndc_to_screen(ndc.x, ndc.y, width as f32, height as f32);
            // Stored depth grows toward the camera.
            depths[k] = -ndc.z;
            varyings[k] = varying;
        }
        if skip {
            continue;
        }

        // Backface culling by the sign of the screen-space cross product.
        if params.cull_faces {
            let e1 = screen[1] - screen[0];
            let e2 = screen[2] - screen[1];
            let signed_area = e1.x * e2.y - e1.y * e2.x;
            // Screen Y points down, so CCW model winding shows up negative.
            let front = if params.clockwise {
                signed_area > 0.0
            } else {
                signed_area < 0.0
            };
            if !front {
                continue;
            }
        }

        // Screen bounding box clamped to the viewport.
        let min_x = screen[0].x.min(screen[1].x).min(screen[2].x).floor() as i64;
        let min_y = screen[0].y.min(screen[1].y).min(screen[2].y).floor() as i64;
        let max_x = screen[0].x.max(screen[1].x).max(screen[2].x).ceil() as i64;
        let max_y = screen[0].y.max(screen[1].y).max(screen[2].y).ceil() as i64;
        if max_x < 0 || max_y < 0 || min_x >= width as i64 || min_y >= height as i64 {
            continue;
        }
        let start_x = min_x.max(0) as usize;
        let end_x = (max_x.min(width as i64 - 1)) as usize;
        let start_y = min_y.max(0) as usize;
        let end_y = (max_y.min(height as i64 - 1)) as usize;

        // 5. Pixel loop.
        for y in start_y..=end_y {
            for x in start_x..=end_x {
                let p = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                let bary = match barycentric_screen(p, screen[0], screen[1], screen[2]) {
                    Some(b) => b,
                    None => continue,
                };
                if bary.x < 0.0 || bary.y < 0.0 || bary.z < 0.0 {
                    continue;
                }

                let z = bary.x * depths[0] + bary.y * depths[1] + bary.z * depths[2];
                if z.is_nan() {
                    continue;
                }
                let idx = y * width + x;
                if z <= depth[idx] {
                    continue;
                }

                let varying = varyings[0] * bary.x + varyings[1] * bary.y + varyings[2] * bary.z;
                let rgba = stage.fragment(&ctx, &varying);
                color[idx * 4..idx * 4 + 4].copy_from_slice(&rgba);
                depth[idx] = z;
            }
        }
    }

    // 6. Optional auto-level pass.
    if params.auto_level {
        auto_level(color);
    }
}

/// Additively boosts the covered pixels so the brightest channel reaches
/// 255. A crude auto-exposure for dark renders.
fn auto_level(color: &mut [u8]) {
    let mut max = 0u8;
    for px in color.chunks_exact(4) {
        if px[3] != 0 {
            max = max.max(px[0]).max(px[1]).max(px[2]);
        }
    }
    if max == 0 || max == 255 {
        return;
    }
    let boost = 255 - max;
    for px in color.chunks_exact_mut(4) {
        if px[3] != 0 {
            for c in &mut px[0..3] {
                *c = c.saturating_add(boost);
            }
        }
    }
}

/// Screen-space barycentric coordinates via the edge-function method.
/// `None` for a degenerate (near zero-area) screen triangle.
fn barycentric_screen(
    p: Point2<f32>,
    a: Point2<f32>,
    b: Point2<f32>,
    c: Point2<f32>,
) -> Option<Vector3<f32>> {
    let e1 = b - a;
    let e2 = c - a;
    let ep = p - a;

    let area_x2 = e1.x * e2.y - e1.y * e2.x;
    if area_x2.abs() < 1e-8 {
        return None;
    }
    let inv = 1.0 / area_x2;

    let beta = (ep.x * e2.y - ep.y * e2.x) * inv;
    let gamma = (e1.x * ep.y - e1.y * ep.x) * inv;
    Some(Vector3::new(1.0 - beta - gamma, beta, gamma))
}

/// Convenience entry point: allocates the buffers, renders and writes a
/// PNG. This is the only place the rasterizer owns its buffers.
pub fn render_to_png(
    model: &Model,
    texture: &Image,
    params: &RenderParams,
    path: &str,
) -> Result<(), String> {
    let mut color = vec![0u8; params.width * params.height * 4];
    let mut depth = vec![0f32; params.width * params.height];
    render(model, texture, params, &mut color, &mut depth);
    info!("rendered {}x{} frame to {}", params.width, params.height, path);
    crate::io::png::save_rgba(&color, params.width, params.height, path)
}
