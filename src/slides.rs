//! The image set and the cyclic slide index.
//!
//! ## Rust concepts
//! - `Arc<[String]>` for an immutable list that is cheap to clone
//! - `rem_euclid` for modular arithmetic that never goes negative
//! - `thiserror` for typed configuration errors

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors detected while setting up a carousel. These are fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("image set must contain at least one image")]
    EmptyImageSet,
    #[error("autoplay period must be greater than zero (got {0:?})")]
    InvalidAutoplayPeriod(Duration),
}

// ── Image set ────────────────────────────────────────────────────────

/// Ordered, non-empty list of image locators (URLs or file paths).
///
/// Indices are the only identity: the same locator may appear twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSet {
    locators: Arc<[String]>,
}

impl ImageSet {
    pub fn new<I, S>(locators: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locators: Arc<[String]> = locators.into_iter().map(Into::into).collect();
        if locators.is_empty() {
            return Err(ConfigurationError::EmptyImageSet);
        }
        Ok(Self { locators })
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Always false for a constructed set; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Locator at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.locators.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locators.iter().map(String::as_str)
    }
}

// ── Slide index ──────────────────────────────────────────────────────

/// Cyclic index over `len` slides. The index is always in `[0, len)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlideIndexController {
    len: usize,
    current: usize,
}

impl SlideIndexController {
    /// Start at slide 0. Fails when there are no slides.
    pub fn new(len: usize) -> Result<Self, ConfigurationError> {
        if len == 0 {
            return Err(ConfigurationError::EmptyImageSet);
        }
        Ok(Self { len, current: 0 })
    }

    pub fn for_images(images: &ImageSet) -> Self {
        Self {
            len: images.len(),
            current: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: a controller cannot be built over zero slides.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index `offset` slides away from the current one, wrapping around in
    /// both directions: `((current + offset) mod N + N) mod N`.
    pub fn neighbor(&self, offset: isize) -> usize {
        // len fits in isize because it is the length of an allocation.
        let len = self.len as isize;
        let shift = offset.rem_euclid(len) as usize;
        (self.current + shift) % self.len
    }

    /// Move by `offset` slides and return the new index.
    pub fn step(&mut self, offset: isize) -> usize {
        self.current = self.neighbor(offset);
        self.current
    }

    pub fn advance(&mut self) -> usize {
        self.step(1)
    }

    pub fn retreat(&mut self) -> usize {
        self.step(-1)
    }
}
