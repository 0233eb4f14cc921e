//! Color quantization and histogram sampling.
//!
//! Pixels are sampled sparsely: one pixel out of every [`PIXEL_STRIDE`].
//! Each sampled channel is floored to a multiple of [`BUCKET_WIDTH`], so
//! similar shades land in the same bucket.

use crate::Color;
use std::collections::HashMap;

/// Quantization granularity applied to each channel.
pub const BUCKET_WIDTH: u8 = 20;

/// Only every 10th pixel is sampled.
pub const PIXEL_STRIDE: usize = 10;

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Distance in bytes between two sampled pixels.
pub const SAMPLE_STRIDE: usize = BYTES_PER_PIXEL * PIXEL_STRIDE;

/// Floor a channel value to its bucket: `floor(c / 20) * 20`.
pub fn bucket(c: u8) -> u8 {
    (c / BUCKET_WIDTH) * BUCKET_WIDTH
}

/// A quantized color. Each channel is a multiple of [`BUCKET_WIDTH`] in `[0, 240]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorBucketKey {
    r: u8,
    g: u8,
    b: u8,
}

impl ColorBucketKey {
    /// Quantize a pixel sample into its bucket.
    pub fn quantize(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: bucket(r),
            g: bucket(g),
            b: bucket(b),
        }
    }

    /// The representative color of this bucket (its lower corner).
    pub fn color(self) -> Color {
        Color::new(self.r, self.g, self.b)
    }
}

/// Occurrence counts per color bucket.
///
/// Buckets are remembered in the order they were first recorded. That order
/// is what breaks ties when ranking buckets with equal counts, so results
/// are reproducible for the same pixel buffer.
#[derive(Clone, Debug, Default)]
pub struct ColorHistogram {
    slots: HashMap<ColorBucketKey, usize>,
    buckets: Vec<(ColorBucketKey, u32)>,
}

impl ColorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a histogram from a row-major RGBA buffer.
    ///
    /// The buffer is walked in whole [`SAMPLE_STRIDE`] steps and the first
    /// pixel of each step is sampled (alpha ignored), so exactly
    /// `data.len() / SAMPLE_STRIDE` pixels are visited. A trailing partial
    /// step is skipped.
    pub fn from_rgba(data: &[u8]) -> Self {
        let mut histogram = Self::new();
        for step in data.chunks_exact(SAMPLE_STRIDE) {
            histogram.record(ColorBucketKey::quantize(step[0], step[1], step[2]));
        }
        histogram
    }

    /// Count one more occurrence of `key`.
    pub fn record(&mut self, key: ColorBucketKey) {
        match self.slots.get(&key) {
            Some(&slot) => self.buckets[slot].1 += 1,
            None => {
                self.slots.insert(key, self.buckets.len());
                self.buckets.push((key, 1));
            }
        }
    }

    /// Occurrences recorded for `key` (zero if never seen).
    pub fn count(&self, key: ColorBucketKey) -> u32 {
        self.slots.get(&key).map_or(0, |&slot| self.buckets[slot].1)
    }

    /// Number of distinct buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of recorded samples across all buckets.
    pub fn samples(&self) -> u64 {
        self.buckets.iter().map(|&(_, count)| count as u64).sum()
    }

    /// Buckets in first-seen order.
    pub fn buckets(&self) -> &[(ColorBucketKey, u32)] {
        &self.buckets
    }

    /// Buckets sorted by descending count.
    ///
    /// The sort is stable, so buckets with equal counts keep their
    /// first-seen order.
    pub fn ranked(&self) -> Vec<(ColorBucketKey, u32)> {
        let mut ranked = self.buckets.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}
