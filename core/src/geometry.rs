//! Planar vector math and axis-aligned bounds shared by every crate.

use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Two-dimensional vector expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    x: f32,
    y: f32,
}

impl Vec2 {
    /// Vector with both components set to zero.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Multiplies both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Euclidean length of the vector.
    #[must_use]
    pub fn magnitude(self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    /// Squared length, useful for range comparisons without a square root.
    #[must_use]
    pub fn magnitude_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).magnitude()
    }

    /// Squared distance between two points.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).magnitude_squared()
    }

    /// Reports whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Moves from `self` towards `target` by at most `max_step` units.
    ///
    /// Returns the target itself when it lies within reach, so callers never
    /// overshoot a waypoint or impact point.
    #[must_use]
    pub fn step_towards(self, target: Self, max_step: f32) -> Self {
        let delta = target - self;
        let distance = delta.magnitude();
        if distance <= max_step || distance <= f32::EPSILON {
            return target;
        }
        self + delta.scale(max_step / distance)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height of an axis-aligned box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    /// Creates a size descriptor.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Creates a square size with equal edges.
    #[must_use]
    pub const fn square(edge: f32) -> Self {
        Self::new(edge, edge)
    }

    /// Horizontal extent.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Vertical extent.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Half of the size, the offset from a box's origin to its center.
    #[must_use]
    pub fn half(self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    origin: Vec2,
    size: Size,
}

impl Bounds {
    /// Creates bounds from a top-left origin and a size.
    #[must_use]
    pub const fn new(origin: Vec2, size: Size) -> Self {
        Self { origin, size }
    }

    /// Creates bounds of the provided size centered on `center`.
    #[must_use]
    pub fn centered_at(center: Vec2, size: Size) -> Self {
        Self::new(center - size.half(), size)
    }

    /// Top-left corner.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Extent of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Geometric center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size.half()
    }

    /// Bottom-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.origin + Vec2::new(self.size.width, self.size.height)
    }

    /// Reports whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.x <= max.x && point.y >= self.origin.y && point.y <= max.y
    }

    /// Reports whether two rectangles overlap, touching edges included.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let max = self.max();
        let other_max = other.max();
        self.origin.x <= other_max.x
            && other.origin.x <= max.x
            && self.origin.y <= other_max.y
            && other.origin.y <= max.y
    }
}

/// Shortest distance between `point` and the segment `start..end`.
#[must_use]
pub fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_squared = segment.magnitude_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }

    let offset = point - start;
    let projection = (offset.x * segment.x + offset.y * segment.y) / length_squared;
    let clamped = projection.clamp(0.0, 1.0);
    point.distance(start + segment.scale(clamped))
}
