use image::{imageops, imageops::FilterType, RgbImage};

use super::{dct_ops, image_hash::ImageHash, FingerprintProvider};
use crate::definitions::{DEFAULT_HASH_SIZE, HIGHFREQ_FACTOR};

/// DCT based perceptual hash.
///
/// The frame is converted to grayscale and shrunk to a `4 * hash_size` square. After a
/// 2D DCT only the top-left `hash_size` square of coefficients is kept (the lowest
/// frequencies, which describe the overall structure of the image). Each bit of the hash
/// records whether a coefficient is above the median of that square.
///
/// See <http://hackerfactor.com/blog/index.php%3F/archives/432-Looks-Like-It.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerceptualHasher {
    hash_size: u32,
}

impl PerceptualHasher {
    /// # Panics
    /// If `hash_size` is less than 2.
    pub fn new(hash_size: u32) -> Self {
        assert!(hash_size >= 2, "hash_size must be at least 2");
        Self { hash_size }
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_SIZE)
    }
}

impl FingerprintProvider for PerceptualHasher {
    type Fingerprint = ImageHash;

    fn fingerprint(&self, pixels: &RgbImage) -> ImageHash {
        let img_size = self.hash_size * HIGHFREQ_FACTOR;

        let gray = imageops::grayscale(pixels);
        let resized = imageops::resize(&gray, img_size, img_size, FilterType::Lanczos3);

        let coeffs = dct_ops::perform_dct(&resized);
        let low_freqs = dct_ops::low_frequencies(&coeffs, self.hash_size as usize);

        let med = median(&low_freqs);
        ImageHash::from_predicate(&low_freqs, |coeff| coeff > med)
    }

    fn distance(&self, a: &ImageHash, b: &ImageHash) -> u32 {
        a.hamming_distance(b)
    }
}

// Median of a non-empty slice. For an even number of values this is the mean of the
// two middle values.
fn median(vals: &[f64]) -> f64 {
    let mut sorted = vals.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod test {
    use image::{Rgb, RgbImage};

    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let val = ((x * 255) / width.max(1)) as u8;
            Rgb([val, val / 2, ((y * 255) / height.max(1)) as u8])
        })
    }

    fn checkerboard(width: u32, height: u32, square: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if ((x / square) + (y / square)) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_hash_width_follows_hash_size() {
        let img = gradient(64, 48);
        for hash_size in [4, 8, 16] {
            let hasher = PerceptualHasher::new(hash_size);
            assert_eq!(hasher.fingerprint(&img).len(), (hash_size * hash_size) as usize);
        }
    }

    #[test]
    fn test_identical_pixels_give_identical_hashes() {
        let hasher = PerceptualHasher::default();
        let img = gradient(120, 80);
        let hash1 = hasher.fingerprint(&img);
        let hash2 = hasher.fingerprint(&img.clone());
        assert_eq!(hash1, hash2);
        assert_eq!(hasher.distance(&hash1, &hash2), 0);
    }

    #[test]
    fn test_hashers_with_same_size_agree() {
        let img = gradient(100, 60);
        let hash1 = PerceptualHasher::new(8).fingerprint(&img);
        let hash2 = PerceptualHasher::default().fingerprint(&img);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_at_most_half_the_bits_are_set() {
        //bits are set against the median, so (ties aside) at most half can be set.
        let hasher = PerceptualHasher::default();
        let hash = hasher.fingerprint(&checkerboard(128, 128, 32));
        assert!(hash.count_ones() <= 32);
    }
}
