//! Gradient descriptors derived from color pairs.

use crate::Color;
use crate::dominant::ColorPair;
use std::fmt;

/// Direction of every image-derived gradient, in degrees.
pub const GRADIENT_ANGLE_DEGREES: u16 = 135;

/// A two-stop linear gradient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GradientDescriptor {
    /// CSS-style angle: 0 points up, 90 points right.
    pub angle_degrees: u16,
    /// Start and end colors, in order.
    pub stops: [Color; 2],
}

impl GradientDescriptor {
    /// Neutral background shown before the first slide has been analyzed.
    pub const PLACEHOLDER: GradientDescriptor = GradientDescriptor {
        angle_degrees: 45,
        stops: [Color::gray(0xf0), Color::gray(0xe0)],
    };

    /// The gradient as a CSS `linear-gradient(...)` value.
    pub fn css(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GradientDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "linear-gradient({}deg, {}, {})",
            self.angle_degrees, self.stops[0], self.stops[1]
        )
    }
}

/// Build the background gradient for a color pair: dominant first.
pub fn compose(pair: ColorPair) -> GradientDescriptor {
    GradientDescriptor {
        angle_degrees: GRADIENT_ANGLE_DEGREES,
        stops: [pair.dominant, pair.least],
    }
}
