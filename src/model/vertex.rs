use nalgebra::{Point3, Vector2, Vector3};

/// A transient, fully-qualified vertex used as a carrier between fetch and
/// push operations. Never stored long-term: the [`Model`](super::Model)
/// keeps attributes in flat parallel arrays instead.
///
/// Each optional attribute carries its own present/absent flag via `Option`.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub uv: Option<Vector2<f32>>,
    /// RGB in the 0..255 range.
    pub color: Option<Vector3<f32>>,
    pub normal: Option<Vector3<f32>>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

impl Vertex {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            uv: None,
            color: None,
            normal: None,
        }
    }

    pub fn with_uv(mut self, uv: Vector2<f32>) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_color(mut self, color: Vector3<f32>) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_normal(mut self, normal: Vector3<f32>) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Midpoint of two vertices with all present-on-both attributes
    /// linearly blended. Used by the subdivision samplers.
    pub fn midpoint(&self, other: &Vertex) -> Vertex {
        Vertex {
            position: nalgebra::center(&self.position, &other.position),
            uv: both(self.uv, other.uv, |a, b| (a + b) * 0.5),
            color: both(self.color, other.color, |a, b| (a + b) * 0.5),
            normal: both(self.normal, other.normal, |a, b| (a + b) * 0.5),
        }
    }
}

fn both<T, F: FnOnce(T, T) -> T>(a: Option<T>, b: Option<T>, f: F) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        _ => None,
    }
}

/// Position is always compared; an optional attribute participates only
/// when both operands carry it.
impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        if self.position != other.position {
            return false;
        }
        if let (Some(a), Some(b)) = (self.uv, other.uv) {
            if a != b {
                return false;
            }
        }
        if let (Some(a), Some(b)) = (self.color, other.color) {
            if a != b {
                return false;
            }
        }
        if let (Some(a), Some(b)) = (self.normal, other.normal) {
            if a != b {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_one_sided_attributes() {
        let base = Vertex::new(Point3::new(1.0, 2.0, 3.0));
        let with_uv = base.with_uv(Vector2::new(0.5, 0.5));
        assert_eq!(base, with_uv);

        let other_uv = base.with_uv(Vector2::new(0.1, 0.1));
        assert_ne!(with_uv, other_uv);

        let moved = Vertex::new(Point3::new(0.0, 2.0, 3.0));
        assert_ne!(base, moved);
    }

    #[test]
    fn midpoint_blends_present_attributes() {
        let a = Vertex::new(Point3::new(0.0, 0.0, 0.0))
            .with_uv(Vector2::new(0.0, 0.0))
            .with_color(Vector3::new(0.0, 0.0, 0.0));
        let b = Vertex::new(Point3::new(2.0, 0.0, 0.0))
            .with_uv(Vector2::new(1.0, 0.5))
            .with_color(Vector3::new(255.0, 0.0, 0.0));

        let m = a.midpoint(&b);
        assert_eq!(m.position, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(m.uv, Some(Vector2::new(0.5, 0.25)));
        assert_eq!(m.color, Some(Vector3::new(127.5, 0.0, 0.0)));
        assert_eq!(m.normal, None);
    }
}
