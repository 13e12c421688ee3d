use image::RgbaImage;
use std::path::Path;

/// Saves a flat width*height*4 RGBA byte buffer as a PNG file.
pub fn save_rgba(buffer: &[u8], width: usize, height: usize, path: &str) -> Result<(), String> {
    let img = RgbaImage::from_raw(width as u32, height as u32, buffer.to_vec())
        .ok_or_else(|| format!("Buffer size does not match {}x{} RGBA", width, height))?;
    img.save(Path::new(path))
        .map_err(|e| format!("Failed to save image to '{}': {}", path, e))
}

/// Loads a PNG (or any format the `image` crate detects) as an RGB8
/// texture.
pub fn load_texture(path: &str) -> Result<crate::image2d::Image, String> {
    let img = image::open(Path::new(path))
        .map_err(|e| format!("Failed to load texture '{}': {}", path, e))?
        .into_rgb8();
    let (width, height) = img.dimensions();
    Ok(crate::image2d::Image {
        width: width as usize,
        height: height as usize,
        data: img.into_raw(),
    })
}
