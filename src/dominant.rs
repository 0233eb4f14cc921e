//! Dominant / least-used color extraction.

use crate::Color;
use crate::histogram::ColorHistogram;

/// The two colors a slide's gradient is built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorPair {
    /// Most frequent bucket.
    pub dominant: Color,
    /// Least frequent bucket.
    pub least: Color,
}

impl ColorPair {
    /// Used whenever an image yields no meaningful pair: load failures and
    /// histograms with fewer than two buckets.
    pub const FALLBACK: ColorPair = ColorPair {
        dominant: Color::gray(200),
        least: Color::gray(100),
    };

    pub fn new(dominant: Color, least: Color) -> Self {
        Self { dominant, least }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::FALLBACK
    }
}

/// Pick the dominant and least-used buckets of `histogram`.
///
/// Buckets are ranked by descending count; equal counts keep the order in
/// which the buckets were first sampled. The dominant color is the first
/// ranked bucket and the least color the last one, so among several
/// lowest-count buckets the one sampled last wins.
///
/// With fewer than two distinct buckets there is nothing to contrast and
/// [`ColorPair::FALLBACK`] is returned. This never fails.
pub fn extract(histogram: &ColorHistogram) -> ColorPair {
    if histogram.len() < 2 {
        return ColorPair::FALLBACK;
    }

    let ranked = histogram.ranked();
    match (ranked.first(), ranked.last()) {
        (Some(&(dominant, _)), Some(&(least, _))) => {
            ColorPair::new(dominant.color(), least.color())
        }
        _ => ColorPair::FALLBACK,
    }
}

/// Run the full sampling pipeline over a row-major RGBA buffer.
pub fn extract_from_rgba(data: &[u8]) -> ColorPair {
    extract(&ColorHistogram::from_rgba(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{ColorBucketKey, SAMPLE_STRIDE};
    use pretty_assertions::assert_eq;

    fn histogram_of(entries: &[(ColorBucketKey, u32)]) -> ColorHistogram {
        let mut histogram = ColorHistogram::new();
        for &(key, count) in entries {
            for _ in 0..count {
                histogram.record(key);
            }
        }
        histogram
    }

    #[test]
    fn fallback_is_light_over_dark_gray() {
        assert_eq!(ColorPair::FALLBACK.dominant, Color::new(200, 200, 200));
        assert_eq!(ColorPair::FALLBACK.least, Color::new(100, 100, 100));
    }

    #[test]
    fn empty_histogram_falls_back() {
        assert_eq!(extract(&ColorHistogram::new()), ColorPair::FALLBACK);
    }

    #[test]
    fn single_bucket_falls_back() {
        let key = ColorBucketKey::quantize(40, 80, 120);
        assert_eq!(extract(&histogram_of(&[(key, 50)])), ColorPair::FALLBACK);
    }

    #[test]
    fn two_buckets_give_dominant_and_least() {
        let a = ColorBucketKey::quantize(240, 0, 0);
        let b = ColorBucketKey::quantize(0, 0, 240);

        let pair = extract(&histogram_of(&[(b, 1), (a, 4)]));
        assert_eq!(pair, ColorPair::new(a.color(), b.color()));
    }

    #[test]
    fn tie_for_least_picks_last_sampled_bucket() {
        let a = ColorBucketKey::quantize(200, 0, 0);
        let b = ColorBucketKey::quantize(0, 200, 0);
        let c = ColorBucketKey::quantize(0, 0, 200);

        let pair = extract(&histogram_of(&[(a, 5), (b, 3), (c, 3)]));
        assert_eq!(pair.dominant, a.color());
        assert_eq!(pair.least, c.color());
    }

    #[test]
    fn tie_for_dominant_picks_first_sampled_bucket() {
        let a = ColorBucketKey::quantize(20, 20, 20);
        let b = ColorBucketKey::quantize(220, 220, 220);
        let c = ColorBucketKey::quantize(100, 0, 100);

        let pair = extract(&histogram_of(&[(b, 4), (a, 4), (c, 1)]));
        assert_eq!(pair.dominant, b.color());
        assert_eq!(pair.least, c.color());
    }

    #[test]
    fn single_color_buffer_falls_back() {
        for pixels in [0, 1, 10, 11, 1_000, 4_321] {
            let data: Vec<u8> = [30, 60, 90, 255].iter().copied().cycle().take(pixels * 4).collect();
            assert_eq!(extract_from_rgba(&data), ColorPair::FALLBACK, "{pixels} pixels");
        }
    }

    #[test]
    fn buffer_pipeline_reports_quantized_colors() {
        // Three sampled pixels: two reddish, one bluish.
        let mut data = vec![0u8; SAMPLE_STRIDE * 3];
        data[..3].copy_from_slice(&[250, 10, 10]);
        data[SAMPLE_STRIDE..SAMPLE_STRIDE + 3].copy_from_slice(&[15, 15, 233]);
        data[SAMPLE_STRIDE * 2..SAMPLE_STRIDE * 2 + 3].copy_from_slice(&[245, 3, 19]);

        let pair = extract_from_rgba(&data);
        assert_eq!(pair, ColorPair::new(Color::new(240, 0, 0), Color::new(0, 0, 220)));
        assert!(!pair.is_fallback());
    }
}
