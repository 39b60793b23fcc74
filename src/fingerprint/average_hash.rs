use image::{imageops, imageops::FilterType, RgbImage};

use super::{image_hash::ImageHash, FingerprintProvider};
use crate::definitions::DEFAULT_HASH_SIZE;

/// Average hash: the frame is converted to grayscale and shrunk to a `hash_size` square,
/// then each bit records whether a pixel is brighter than the mean brightness.
///
/// Cheaper than [`PerceptualHasher`](crate::PerceptualHasher), and more easily fooled by
/// changes in brightness or contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageHasher {
    hash_size: u32,
}

impl AverageHasher {
    /// # Panics
    /// If `hash_size` is zero.
    pub fn new(hash_size: u32) -> Self {
        assert!(hash_size >= 1, "hash_size must be at least 1");
        Self { hash_size }
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }
}

impl Default for AverageHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_SIZE)
    }
}

impl FingerprintProvider for AverageHasher {
    type Fingerprint = ImageHash;

    fn fingerprint(&self, pixels: &RgbImage) -> ImageHash {
        let gray = imageops::grayscale(pixels);
        let resized = imageops::resize(&gray, self.hash_size, self.hash_size, FilterType::Lanczos3);

        let vals = resized.as_raw().iter().map(|x| f64::from(*x)).collect::<Vec<_>>();
        let mean = vals.iter().sum::<f64>() / vals.len() as f64;

        ImageHash::from_predicate(&vals, |val| val > mean)
    }

    fn distance(&self, a: &ImageHash, b: &ImageHash) -> u32 {
        a.hamming_distance(b)
    }
}

#[cfg(test)]
mod test {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn test_flat_image_hashes_to_zero() {
        let hasher = AverageHasher::default();
        let hash = hasher.fingerprint(&RgbImage::from_pixel(40, 40, Rgb([90, 90, 90])));
        assert_eq!(hash.len(), 64);
        assert_eq!(hash.count_ones(), 0);
    }

    #[test]
    fn test_left_right_split() {
        let hasher = AverageHasher::default();
        let img = RgbImage::from_fn(64, 64, |x, _y| if x < 32 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let inverted = RgbImage::from_fn(64, 64, |x, _y| if x < 32 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) });

        let hash = hasher.fingerprint(&img);
        let inverted_hash = hasher.fingerprint(&inverted);

        //exactly the right half is bright
        assert_eq!(hash.count_ones(), 32);
        assert_eq!(hasher.distance(&hash, &inverted_hash), 64);
    }
}
