use std::ops::{Add, Div, Sub};

use serde::{Deserialize, Serialize};

/// Translation of the second image relative to the first, in pixels.
///
/// `dx` grows to the right and `dy` grows downward, so registering an image
/// against a copy moved right by 3 and up by 2 yields `(3, -2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub dx: f64,
    pub dy: f64,
}

impl Shift {
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// Euclidean length of the shift.
    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }
}

impl Add for Shift {
    type Output = Shift;

    fn add(self, rhs: Shift) -> Shift {
        Shift::new(self.dx + rhs.dx, self.dy + rhs.dy)
    }
}

impl Sub for Shift {
    type Output = Shift;

    fn sub(self, rhs: Shift) -> Shift {
        Shift::new(self.dx - rhs.dx, self.dy - rhs.dy)
    }
}

impl Div<f64> for Shift {
    type Output = Shift;

    fn div(self, rhs: f64) -> Shift {
        Shift::new(self.dx / rhs, self.dy / rhs)
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.4}, {:.4}]", self.dx, self.dy)
    }
}
