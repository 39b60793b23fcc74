#[cfg(feature = "parallel_fingerprinting")]
use rayon::prelude::*;

use crate::*;

/// Splits an ordered sequence of frames into kept frames and duplicates.
///
/// The algorithm is a single greedy pass. Each frame is compared against the frames kept
/// so far, in the order they were kept, and is recorded as a duplicate of the first one
/// within `threshold`. If none is within `threshold`, the frame is kept.
///
/// Consequences of this design:
/// * No two kept frames are within `threshold` of each other.
/// * A duplicate is attributed to the *earliest* kept frame in range, not the nearest.
/// * Two duplicates of the same kept frame may be further than `threshold` apart.
/// * The result depends on input order, so callers must supply a deterministic order
///   (see [`list_frames`]).
#[derive(Debug, Clone)]
pub struct NearDuplicateDetector<P> {
    provider: P,
    threshold: u32,
}

impl<P: FingerprintProvider> NearDuplicateDetector<P> {
    pub fn new(provider: P, threshold: u32) -> Self {
        Self { provider, threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run the detector over `frames`, in slice order.
    ///
    /// Frames whose pixels cannot be decoded are set aside as unreadable. They are counted
    /// in the total but are neither kept nor duplicates.
    pub fn detect<'a, D>(&self, frames: &'a [Frame<P::Fingerprint>], decoder: &D) -> Detection<'a, P::Fingerprint>
    where
        D: PixelDecoder + ?Sized,
    {
        //Fingerprinting is independent per frame, so it can be done up front (and in parallel).
        //The results are collected in input order.
        #[cfg(feature = "parallel_fingerprinting")]
        let fingerprints = frames
            .par_iter()
            .map(|frame| frame.fingerprint_with(&self.provider, decoder))
            .collect::<Vec<_>>();

        #[cfg(not(feature = "parallel_fingerprinting"))]
        let fingerprints = frames
            .iter()
            .map(|frame| frame.fingerprint_with(&self.provider, decoder))
            .collect::<Vec<_>>();

        //The greedy pass itself must stay sequential.
        let mut kept_set = KeptSet::default();
        let mut duplicates = vec![];
        let mut unreadable = vec![];

        for (frame, fingerprint) in frames.iter().zip(fingerprints) {
            let fingerprint = match fingerprint {
                Ok(fingerprint) => fingerprint,
                Err(e) => {
                    warn!(target: "dedup", "Skipping frame: {e}");
                    unreadable.push((frame, e));
                    continue;
                }
            };

            match kept_set.first_within(fingerprint, self.threshold, &self.provider) {
                Some(kept) => {
                    trace!(target: "dedup", "{} is a duplicate of {}", frame.id(), kept.id());
                    duplicates.push((frame, kept));
                }
                None => {
                    trace!(target: "dedup", "keeping {}", frame.id());
                    kept_set.push(frame, fingerprint);
                }
            }
        }

        debug!(
            target: "dedup",
            "{} frames: {} kept, {} duplicates, {} unreadable",
            frames.len(),
            kept_set.len(),
            duplicates.len(),
            unreadable.len()
        );

        Detection {
            total: frames.len(),
            threshold: self.threshold,
            kept: kept_set.into_frames(),
            duplicates,
            unreadable,
        }
    }
}

struct KeptEntry<'a, F> {
    frame: &'a Frame<F>,
    fingerprint: &'a F,
}

// Kept frames in insertion order.
struct KeptSet<'a, F> {
    entries: Vec<KeptEntry<'a, F>>,
}

impl<F> Default for KeptSet<'_, F> {
    fn default() -> Self {
        Self { entries: vec![] }
    }
}

impl<'a, F> KeptSet<'a, F> {
    fn first_within<P>(&self, fingerprint: &F, threshold: u32, provider: &P) -> Option<&'a Frame<F>>
    where
        P: FingerprintProvider<Fingerprint = F>,
    {
        self.entries
            .iter()
            .find(|entry| provider.distance(fingerprint, entry.fingerprint) <= threshold)
            .map(|entry| entry.frame)
    }

    fn push(&mut self, frame: &'a Frame<F>, fingerprint: &'a F) {
        self.entries.push(KeptEntry { frame, fingerprint });
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn into_frames(self) -> Vec<&'a Frame<F>> {
        self.entries.into_iter().map(|entry| entry.frame).collect()
    }
}

/// The outcome of [`NearDuplicateDetector::detect`].
#[derive(Debug)]
pub struct Detection<'a, F> {
    total: usize,
    threshold: u32,
    kept: Vec<&'a Frame<F>>,
    duplicates: Vec<(&'a Frame<F>, &'a Frame<F>)>,
    unreadable: Vec<(&'a Frame<F>, FrameError)>,
}

impl<'a, F> Detection<'a, F> {
    /// Kept frames, in the order they were kept.
    pub fn kept(&self) -> &[&'a Frame<F>] {
        &self.kept
    }

    /// `(duplicate, kept)` pairs in processing order.
    pub fn duplicates(&self) -> &[(&'a Frame<F>, &'a Frame<F>)] {
        &self.duplicates
    }

    /// Frames that could not be decoded, with the reason.
    pub fn unreadable(&self) -> &[(&'a Frame<F>, FrameError)] {
        &self.unreadable
    }

    pub fn report(&self) -> DedupReport {
        DedupReport {
            total: self.total,
            kept: self.kept.len(),
            duplicates: self.duplicates.len(),
            threshold: self.threshold,
            kept_files: self.kept.iter().map(|frame| frame.id().to_string()).collect(),
            duplicates_map: self
                .duplicates
                .iter()
                .map(|(duplicate, kept)| DuplicateRecord {
                    duplicate: duplicate.id().to_string(),
                    kept: kept.id().to_string(),
                })
                .collect(),
            unreadable_files: self
                .unreadable
                .iter()
                .map(|(frame, _e)| frame.id().to_string())
                .collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use image::RgbImage;

    use super::*;

    // Fingerprints are positions on a number line, stored as the width of a 1 pixel high image.
    struct LineProvider;

    impl FingerprintProvider for LineProvider {
        type Fingerprint = u32;

        fn fingerprint(&self, pixels: &RgbImage) -> u32 {
            pixels.width()
        }

        fn distance(&self, a: &u32, b: &u32) -> u32 {
            a.abs_diff(*b)
        }
    }

    struct LineDecoder;

    impl PixelDecoder for LineDecoder {
        fn decode(&self, src_path: &Path) -> Result<RgbImage, FrameError> {
            let stem = src_path.file_stem().unwrap().to_string_lossy();
            match stem.parse::<u32>() {
                Ok(pos) => Ok(RgbImage::new(pos, 1)),
                Err(e) => Err(FrameError::unreadable(src_path, e)),
            }
        }
    }

    fn frames(positions: &[&str]) -> Vec<Frame<u32>> {
        positions.iter().map(|p| Frame::from_path(format!("{p}.png"))).collect()
    }

    #[test]
    fn test_detecting_nothing_returns_empty_report() {
        let detector = NearDuplicateDetector::new(LineProvider, 8);
        let report = detector.detect(&frames(&[]), &LineDecoder).report();
        assert_eq!(report.total, 0);
        assert!(report.kept_files.is_empty());
        assert!(report.duplicates_map.is_empty());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let input = frames(&["10", "18", "27"]);
        let detector = NearDuplicateDetector::new(LineProvider, 8);
        let report = detector.detect(&input, &LineDecoder).report();

        assert_eq!(report.kept_files, vec!["10.png", "27.png"]);
        assert_eq!(report.duplicates_map.len(), 1);
        assert_eq!(report.duplicates_map[0].duplicate, "18.png");
        assert_eq!(report.duplicates_map[0].kept, "10.png");
    }

    #[test]
    fn test_first_match_wins_over_nearest() {
        // 20 is within 10 of both kept frames, but nearer the second one.
        let input = frames(&["10", "25", "20"]);
        let detector = NearDuplicateDetector::new(LineProvider, 10);
        let detection = detector.detect(&input, &LineDecoder);

        assert_eq!(detection.kept().len(), 2);
        let (duplicate, kept) = detection.duplicates()[0];
        assert_eq!(duplicate.id(), "20.png");
        assert_eq!(kept.id(), "10.png");
    }

    #[test]
    fn test_unreadable_frames_are_counted_separately() {
        let input = frames(&["10", "garbage", "11"]);
        let detector = NearDuplicateDetector::new(LineProvider, 2);
        let detection = detector.detect(&input, &LineDecoder);
        let report = detection.report();

        assert_eq!(report.total, 3);
        assert_eq!(report.kept, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.unreadable_files, vec!["garbage.png"]);
        assert!(matches!(detection.unreadable()[0].1, FrameError::UnreadableFrame { .. }));
    }

    #[test]
    fn test_fingerprints_are_cached_on_frames() {
        let input = frames(&["3", "4"]);
        let detector = NearDuplicateDetector::new(LineProvider, 0);
        detector.detect(&input, &LineDecoder);

        assert_eq!(input[0].fingerprint(), Some(&3));
        assert_eq!(input[1].fingerprint(), Some(&4));
    }
}
