use crate::image2d::Image;
use crate::model::{Model, Vertex};
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use std::ops::{Add, Mul};

/// Explicit render state shared by the vertex and fragment stages of one
/// render call. Passed by reference everywhere instead of living in global
/// mutable state.
pub struct RenderContext<'a> {
    /// Model-view-projection matrix.
    pub mvp: Matrix4<f32>,
    pub texture: &'a Image,
    /// Light position in model space.
    pub light_position: Point3<f32>,
    /// Ambient term of the Lambertian model, in 0..1.
    pub ambient: f32,
    pub bilinear: bool,
}

/// Per-vertex outputs interpolated across the triangle and handed to the
/// fragment stage: UV, normal and model-space position for lighting, or a
/// per-vertex color, depending on the selected stage.
#[derive(Debug, Clone, Copy)]
pub struct Varying {
    pub uv: Vector2<f32>,
    pub normal: Vector3<f32>,
    pub position: Point3<f32>,
    /// RGB in 0..255.
    pub color: Vector3<f32>,
}

impl Default for Varying {
    fn default() -> Self {
        Self {
            uv: Vector2::zeros(),
            normal: Vector3::zeros(),
            position: Point3::origin(),
            color: Vector3::zeros(),
        }
    }
}

// Linear combination support for barycentric interpolation.
impl Add for Varying {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            uv: self.uv + other.uv,
            normal: self.normal + other.normal,
            position: Point3::from(self.position.coords + other.position.coords),
            color: self.color + other.color,
        }
    }
}

impl Mul<f32> for Varying {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            uv: self.uv * scalar,
            normal: self.normal * scalar,
            position: Point3::from(self.position.coords * scalar),
            color: self.color * scalar,
        }
    }
}

/// The closed set of built-in shader pairs. One variant is selected per
/// render call from data availability; the per-pixel loop then dispatches
/// on a plain enum instead of a virtual call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Texture fetch plus ambient+diffuse Lambertian lighting.
    TexturedLit,
    /// Texture fetch only.
    Textured,
    /// Interpolated per-vertex color.
    VertexColor,
    /// Debug solid red, used when neither texture nor colors exist.
    Flat,
}

impl ShaderStage {
    /// Selects the stage for a model/texture pair, mutually exclusive in
    /// this order: textured+lit, textured, per-vertex color, flat.
    pub fn select(model: &Model, texture: &Image, lighting: bool) -> Self {
        let textured = !texture.is_empty() && model.has_uvcoords();
        if textured && lighting {
            ShaderStage::TexturedLit
        } else if textured {
            ShaderStage::Textured
        } else if model.has_colors() {
            ShaderStage::VertexColor
        } else {
            ShaderStage::Flat
        }
    }

    /// Vertex stage: clip-space position plus the varyings this stage
    /// interpolates.
    pub fn vertex(&self, ctx: &RenderContext, vertex: &Vertex) -> (Vector4<f32>, Varying) {
        let clip = ctx.mvp * vertex.position.to_homogeneous();
        let mut varying = Varying::default();
        match self {
            ShaderStage::TexturedLit => {
                varying.uv = vertex.uv.unwrap_or_else(Vector2::zeros);
                varying.normal = vertex.normal.unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0));
                varying.position = vertex.position;
            }
            ShaderStage::Textured => {
                varying.uv = vertex.uv.unwrap_or_else(Vector2::zeros);
            }
            ShaderStage::VertexColor => {
                varying.color = vertex.color.unwrap_or_else(Vector3::zeros);
            }
            ShaderStage::Flat => {}
        }
        (clip, varying)
    }

    /// Fragment stage: final RGBA color, channels in 0..255.
    pub fn fragment(&self, ctx: &RenderContext, varying: &Varying) -> [u8; 4] {
        let rgb = match self {
            ShaderStage::TexturedLit => {
                let albedo = sample(ctx, &varying.uv);
                let n = varying.normal.normalize();
                let light_dir = (ctx.light_position - varying.position).normalize();
                let diff = n.dot(&light_dir).max(0.0);
                albedo * (ctx.ambient + (1.0 - ctx.ambient) * diff)
            }
            ShaderStage::Textured => sample(ctx, &varying.uv),
            ShaderStage::VertexColor => varying.color,
            ShaderStage::Flat => Vector3::new(255.0, 0.0, 0.0),
        };
        [
            rgb.x.clamp(0.0, 255.0) as u8,
            rgb.y.clamp(0.0, 255.0) as u8,
            rgb.z.clamp(0.0, 255.0) as u8,
            255,
        ]
    }
}

fn sample(ctx: &RenderContext, uv: &Vector2<f32>) -> Vector3<f32> {
    if ctx.bilinear {
        ctx.texture.fetch_bilinear(uv)
    } else {
        ctx.texture.fetch_nearest(uv)
    }
}
