use image::RgbImage;

use super::{average_hash::AverageHasher, image_hash::ImageHash, perceptual_hash::PerceptualHasher, FingerprintProvider};
use crate::FingerprintAlgorithm;

/// The provider named by a [`FingerprintAlgorithm`], at the default hash size.
///
/// The pipeline always fingerprints through this type, so the algorithm recorded in a
/// run's configuration (and therefore in its [`RunIdentity`](crate::RunIdentity)) is the
/// one that produced its dedup report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfiguredHasher {
    Phash(PerceptualHasher),
    Ahash(AverageHasher),
}

impl ConfiguredHasher {
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        match self {
            Self::Phash(_) => FingerprintAlgorithm::Phash,
            Self::Ahash(_) => FingerprintAlgorithm::Ahash,
        }
    }
}

impl From<FingerprintAlgorithm> for ConfiguredHasher {
    fn from(algorithm: FingerprintAlgorithm) -> Self {
        match algorithm {
            FingerprintAlgorithm::Phash => Self::Phash(PerceptualHasher::default()),
            FingerprintAlgorithm::Ahash => Self::Ahash(AverageHasher::default()),
        }
    }
}

impl FingerprintProvider for ConfiguredHasher {
    type Fingerprint = ImageHash;

    fn fingerprint(&self, pixels: &RgbImage) -> ImageHash {
        match self {
            Self::Phash(hasher) => hasher.fingerprint(pixels),
            Self::Ahash(hasher) => hasher.fingerprint(pixels),
        }
    }

    fn distance(&self, a: &ImageHash, b: &ImageHash) -> u32 {
        a.hamming_distance(b)
    }
}
