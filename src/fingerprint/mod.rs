pub mod average_hash;
pub mod configured;
pub(crate) mod dct_ops;
pub mod decode;
pub mod image_hash;
pub mod perceptual_hash;

use image::RgbImage;

/// Turns pixel data into a fingerprint, and measures how far apart two fingerprints are.
///
/// Implementations must guarantee:
/// * `fingerprint` is deterministic: identical pixels give identical fingerprints.
/// * `distance` is symmetric, and is zero if and only if the fingerprints are equal.
///
/// Nothing else about the fingerprint (width, algorithm) is relied upon by the
/// duplicate detector.
pub trait FingerprintProvider: Send + Sync {
    type Fingerprint: Send + Sync;

    fn fingerprint(&self, pixels: &RgbImage) -> Self::Fingerprint;

    fn distance(&self, a: &Self::Fingerprint, b: &Self::Fingerprint) -> u32;
}

impl<P: FingerprintProvider + ?Sized> FingerprintProvider for &P {
    type Fingerprint = P::Fingerprint;

    fn fingerprint(&self, pixels: &RgbImage) -> Self::Fingerprint {
        (**self).fingerprint(pixels)
    }

    fn distance(&self, a: &Self::Fingerprint, b: &Self::Fingerprint) -> u32 {
        (**self).distance(a, b)
    }
}
