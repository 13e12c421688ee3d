use nalgebra::{Vector2, Vector3};

/// An owned width x height x 3 byte image used as a texture source.
///
/// Storage is row-major with the origin at the top-left; UV space has its
/// origin at the bottom-left, so every texture lookup applies a vertical
/// flip before indexing. A default image (zero size, no data) stands for
/// "no texture": consumers fall back to per-vertex color.
#[derive(Debug, Clone, Default)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Image {
    pub const CHANNELS: usize = 3;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * Self::CHANNELS],
        }
    }

    /// The empty placeholder an image loader hands back when no texture was
    /// requested.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Raw texel fetch in storage space (row 0 = top). Coordinates must be
    /// in range.
    #[inline]
    pub fn texel(&self, col: usize, row: usize) -> Vector3<f32> {
        let idx = (row * self.width + col) * Self::CHANNELS;
        Vector3::new(
            self.data[idx] as f32,
            self.data[idx + 1] as f32,
            self.data[idx + 2] as f32,
        )
    }

    #[inline]
    pub fn set_texel(&mut self, col: usize, row: usize, rgb: [u8; 3]) {
        let idx = (row * self.width + col) * Self::CHANNELS;
        self.data[idx..idx + 3].copy_from_slice(&rgb);
    }

    /// Maps a UV coordinate to clamped texel column/row, flipping V into
    /// storage space. This is the shared mapping of both filters and of the
    /// texel-adjacency test in the area subdivision sampler.
    pub fn map_coord_clamped(&self, uv: &Vector2<f32>) -> (usize, usize) {
        let col = (uv.x * self.width as f32).floor() as i64;
        let row_uv = (uv.y * self.height as f32).floor() as i64;
        let col = col.clamp(0, self.width as i64 - 1) as usize;
        let row_uv = row_uv.clamp(0, self.height as i64 - 1) as usize;
        (col, self.height - 1 - row_uv)
    }

    /// Nearest-texel lookup, RGB in 0..255.
    pub fn fetch_nearest(&self, uv: &Vector2<f32>) -> Vector3<f32> {
        let (col, row) = self.map_coord_clamped(uv);
        self.texel(col, row)
    }

    /// Bilinear lookup with edge clamping, RGB in 0..255.
    pub fn fetch_bilinear(&self, uv: &Vector2<f32>) -> Vector3<f32> {
        // Texel centers sit at half-integer coordinates.
        let x = uv.x * self.width as f32 - 0.5;
        let y = (1.0 - uv.y) * self.height as f32 - 0.5;

        let x0 = x.floor();
        let y0 = y.floor();
        let wx = x - x0;
        let wy = y - y0;

        let clamp_x = |v: f32| (v as i64).clamp(0, self.width as i64 - 1) as usize;
        let clamp_y = |v: f32| (v as i64).clamp(0, self.height as i64 - 1) as usize;

        let c00 = self.texel(clamp_x(x0), clamp_y(y0));
        let c10 = self.texel(clamp_x(x0 + 1.0), clamp_y(y0));
        let c01 = self.texel(clamp_x(x0), clamp_y(y0 + 1.0));
        let c11 = self.texel(clamp_x(x0 + 1.0), clamp_y(y0 + 1.0));

        let top = c00 * (1.0 - wx) + c10 * wx;
        let bottom = c01 * (1.0 - wx) + c11 * wx;
        top * (1.0 - wy) + bottom * wy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 image: top row red/green, bottom row blue/white.
    fn quad_image() -> Image {
        let mut img = Image::new(2, 2);
        img.set_texel(0, 0, [255, 0, 0]);
        img.set_texel(1, 0, [0, 255, 0]);
        img.set_texel(0, 1, [0, 0, 255]);
        img.set_texel(1, 1, [255, 255, 255]);
        img
    }

    #[test]
    fn empty_image_is_a_null_texture() {
        assert!(Image::empty().is_empty());
        assert!(!quad_image().is_empty());
    }

    #[test]
    fn nearest_applies_vertical_flip() {
        let img = quad_image();
        // UV (0,0) is the bottom-left texel, which is stored in row 1.
        assert_eq!(
            img.fetch_nearest(&Vector2::new(0.1, 0.1)),
            Vector3::new(0.0, 0.0, 255.0)
        );
        // UV (0,1) is the top-left texel.
        assert_eq!(
            img.fetch_nearest(&Vector2::new(0.1, 0.9)),
            Vector3::new(255.0, 0.0, 0.0)
        );
    }

    #[test]
    fn bilinear_blends_at_texel_boundary() {
        let img = quad_image();
        // Midpoint between the two bottom texels (blue and white).
        let c = img.fetch_bilinear(&Vector2::new(0.5, 0.25));
        assert_eq!(c, Vector3::new(127.5, 127.5, 255.0));
    }

    #[test]
    fn lookups_clamp_outside_unit_square() {
        let img = quad_image();
        assert_eq!(
            img.fetch_nearest(&Vector2::new(-0.5, 2.0)),
            img.fetch_nearest(&Vector2::new(0.0, 1.0))
        );
    }
}
