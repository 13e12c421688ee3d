pub mod camera;
pub mod rasterizer;
pub mod shader;

pub use camera::OrthoCamera;
pub use rasterizer::{render, render_to_png, RenderParams};
pub use shader::{RenderContext, ShaderStage, Varying};
