//! Geometry of the rotating compass polygon
//!
//! Two triangles share the canvas centre: a large equilateral body and a small
//! pointer over its top vertex. Both are rotated by the negated heading so the
//! pointer keeps facing magnetic north while the device turns. Coordinates are
//! screen pixels with Y growing downward.

use crate::orientation::HeadingAngle;

/// Triangle size used when the canvas is large enough
pub const DEFAULT_TRIANGLE_SIZE: f32 = 300.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Rotate clockwise on screen by `degrees` around `pivot`
    pub fn rotated_about(self, pivot: Point, degrees: f32) -> Point {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle(pub [Point; 3]);

impl Triangle {
    pub fn centroid(&self) -> Point {
        let [a, b, c] = self.0;
        Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
    }

    pub fn rotated_about(&self, pivot: Point, degrees: f32) -> Triangle {
        Triangle(self.0.map(|p| p.rotated_about(pivot, degrees)))
    }

    pub fn points(&self) -> &[Point; 3] {
        &self.0
    }
}

/// The two triangles drawn for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompassShape {
    /// Large triangle, drawn first (blue)
    pub body: Triangle,
    /// Tip marker, drawn on top (red)
    pub pointer: Triangle,
}

impl CompassShape {
    /// Unrotated shape centred on `center`
    pub fn new(center: Point, size: f32) -> Self {
        let half_base = size * 3f32.sqrt() / 2.0;
        let apex = Point::new(center.x, center.y - size);

        let body = Triangle([
            apex,
            Point::new(center.x - half_base, center.y + size / 2.0),
            Point::new(center.x + half_base, center.y + size / 2.0),
        ]);
        let pointer = Triangle([
            apex,
            Point::new(center.x - size / 3.0, center.y - size / 2.0),
            Point::new(center.x + size / 3.0, center.y - size / 2.0),
        ]);

        Self { body, pointer }
    }

    /// Shape for `heading`, rotated by its negation about `center`
    pub fn for_heading(center: Point, size: f32, heading: HeadingAngle) -> Self {
        let unrotated = Self::new(center, size);
        let degrees = -heading.degrees();
        Self {
            body: unrotated.body.rotated_about(center, degrees),
            pointer: unrotated.pointer.rotated_about(center, degrees),
        }
    }
}

/// Triangle size for a canvas, shrinking below the default on small canvases
pub fn fit_size(width: f32, height: f32) -> f32 {
    DEFAULT_TRIANGLE_SIZE.min(0.4 * width.min(height))
}
