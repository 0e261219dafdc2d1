use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Direction magnitudes below this are treated as degenerate.
const DIRECTION_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalized(&self) -> Option<Point> {
        let len = self.length();
        if len < DIRECTION_EPSILON {
            return None;
        }
        Some(Point::new(self.x / len, self.y / len))
    }

    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// Canonical angle form: output always lies in (-pi, pi].
pub fn normalize_angle(theta: f32) -> f32 {
    let wrapped = (PI - theta).rem_euclid(2.0 * PI);
    PI - wrapped
}

/// Shortest signed rotation from `b` to `a`, accounting for wraparound.
pub fn signed_delta(a: f32, b: f32) -> f32 {
    normalize_angle(a - b)
}

pub fn angular_distance(a: f32, b: f32) -> f32 {
    signed_delta(a, b).abs()
}

pub fn unit_vector(theta: f32) -> Point {
    Point::new(theta.cos(), theta.sin())
}

/// Direction of the ray from `from` toward `to`, unless the points coincide.
pub fn direction_between(from: Point, to: Point) -> Option<f32> {
    Point::new(to.x - from.x, to.y - from.y)
        .normalized()
        .map(|d| d.angle())
}

/// Circular mean of a set of direction vectors. Returns `None` when the
/// vectors cancel out (or the set is empty), which callers treat as an
/// unplaced direction rather than an error.
pub fn circular_mean(directions: &[Point]) -> Option<f32> {
    let mut sum = Point::default();
    for dir in directions {
        sum.x += dir.x;
        sum.y += dir.y;
    }
    sum.normalized().map(|d| d.angle())
}

/// Point where a ray leaving `center` at angle `theta` crosses the boundary
/// of the axis-aligned ellipse with radii `rx`/`ry`. Equivalent to casting
/// the ray far past the shape and clipping the segment to the boundary.
pub fn clip_ray_to_ellipse(center: Point, rx: f32, ry: f32, theta: f32) -> Point {
    let rx = rx.max(DIRECTION_EPSILON);
    let ry = ry.max(DIRECTION_EPSILON);
    let (sin, cos) = theta.sin_cos();
    let scale = 1.0 / ((cos * cos) / (rx * rx) + (sin * sin) / (ry * ry)).sqrt();
    Point::new(center.x + cos * scale, center.y + sin * scale)
}

/// True when `theta` lies on the counterclockwise arc from `bounds[0]` to
/// `bounds[1]`. A zero-width pair means the full circle.
pub fn within_bounds(theta: f32, bounds: [f32; 2]) -> bool {
    let span = (bounds[1] - bounds[0]).rem_euclid(2.0 * PI);
    if span == 0.0 {
        return true;
    }
    let offset = (theta - bounds[0]).rem_euclid(2.0 * PI);
    offset <= span
}

/// The bound edge angularly closer to `theta`.
pub fn nearer_bound(theta: f32, bounds: [f32; 2]) -> f32 {
    if angular_distance(theta, bounds[0]) <= angular_distance(theta, bounds[1]) {
        bounds[0]
    } else {
        bounds[1]
    }
}
