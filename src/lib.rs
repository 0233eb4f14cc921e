//! Image carousel whose background gradient follows the colors of the
//! current slide.
//!
//! The crate is split into small layers, leaves first:
//! - [`histogram`]: quantize sampled pixels into coarse color buckets
//! - [`dominant`]: pick the dominant / least-used bucket pair
//! - [`gradient`]: turn a color pair into a gradient descriptor
//! - [`analyzer`]: load and decode an image, then run the pipeline above
//! - [`slides`]: the image set and the cyclic slide index
//! - [`scheduler`]: the autoplay timer
//! - [`carousel`]: the orchestrator that ties everything together
//!
//! It also exposes the [`media`] discovery helpers and the [`server`]
//! module used by the main binary (HTTP API server).

pub mod analyzer;
pub mod carousel;
pub mod dominant;
pub mod gradient;
pub mod histogram;
pub mod media;
pub mod scheduler;
pub mod server;
pub mod slides;

use std::fmt;
use std::time::Duration;

pub use analyzer::{DefaultImageSource, ImageColorAnalyzer, ImageSource, LoadError};
pub use carousel::{Carousel, CarouselState, Frame, Slide};
pub use dominant::ColorPair;
pub use gradient::GradientDescriptor;
pub use scheduler::{AutoAdvanceScheduler, AutoplayHandle, AutoplayPolicy};
pub use slides::{ConfigurationError, ImageSet, SlideIndexController};

// ── Carousel configuration ─────────────────────────────────────────

/// Default time between two automatic slide changes.
pub const DEFAULT_AUTOPLAY_PERIOD: Duration = Duration::from_millis(5000);

/// Runtime configuration for a [`Carousel`].
///
/// # Rust concept: Option for "feature off"
/// `autoplay: None` disables the timer entirely instead of needing a
/// separate `enabled` flag that could disagree with the period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarouselConfig {
    /// Period of the autoplay timer, or `None` for manual navigation only.
    pub autoplay: Option<Duration>,
    /// What manual navigation does to the autoplay timer.
    pub policy: AutoplayPolicy,
}

impl CarouselConfig {
    pub fn new(autoplay: Option<Duration>, policy: AutoplayPolicy) -> Self {
        Self { autoplay, policy }
    }

    /// Configuration without an autoplay timer.
    pub fn manual() -> Self {
        Self {
            autoplay: None,
            policy: AutoplayPolicy::FixedCadence,
        }
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            autoplay: Some(DEFAULT_AUTOPLAY_PERIOD),
            policy: AutoplayPolicy::FixedCadence,
        }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// An opaque sRGB color.
///
/// Rendered in CSS functional notation (`rgb(r, g, b)`) by its `Display`
/// impl, which is what hosts put into a gradient background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A neutral gray with all three channels set to `level`.
    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn default_config_autoplays_every_five_seconds() {
        let config = CarouselConfig::default();
        assert_eq!(config.autoplay, Some(Duration::from_millis(5000)));
        assert_eq!(config.policy, AutoplayPolicy::FixedCadence);
    }

    #[test]
    fn manual_config_has_no_timer() {
        assert_eq!(CarouselConfig::manual().autoplay, None);
    }

    #[test]
    fn color_new() {
        let c = Color::new(10, 20, 30);
        assert_eq!(c.r, 10);
        assert_eq!(c.g, 20);
        assert_eq!(c.b, 30);
    }

    #[test]
    fn gray_sets_every_channel() {
        assert_eq!(Color::gray(200), Color::new(200, 200, 200));
    }

    #[rstest]
    #[case(Color::new(0, 0, 0), "rgb(0, 0, 0)")]
    #[case(Color::new(200, 200, 200), "rgb(200, 200, 200)")]
    #[case(Color::new(240, 20, 100), "rgb(240, 20, 100)")]
    fn color_renders_as_css(#[case] color: Color, #[case] expected: &str) {
        assert_eq!(color.to_string(), expected);
    }
}
