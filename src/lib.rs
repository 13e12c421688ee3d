//! Deterministic mesh sampling and software rasterization.
//!
//! The crate converts triangle meshes into point clouds through several
//! sampling strategies (face-uniform walks, grid ray-casting, texture-map
//! projection, adaptive subdivision, quasi-random placement) and renders
//! meshes through a small orthographic software rasterizer. Every pass is
//! single-threaded and free of hidden randomness, so identical inputs
//! always produce bit-identical outputs.

pub mod core;
pub mod image2d;
pub mod io;
pub mod model;
pub mod render;
pub mod sample;
