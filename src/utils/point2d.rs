use std::ops::{Add, Mul, Sub};

/// A position in the (y, z) plane of a volume slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub y: f64,
    pub z: f64,
}

impl Point2D {
    pub fn new(y: f64, z: f64) -> Self {
        Point2D { y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        (*self - *other).magnitude()
    }

    /// Polar angle measured from +y towards +z, in (-π, π].
    pub fn angle(&self) -> f64 {
        self.z.atan2(self.y)
    }

    pub fn lerp(&self, other: &Point2D, t: f64) -> Self {
        *self + (*other - *self) * t
    }
}

impl Add for Point2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Point2D::new(self.y + other.y, self.z + other.z)
    }
}

impl Sub for Point2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Point2D::new(self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Point2D::new(self.y * scalar, self.z * scalar)
    }
}
