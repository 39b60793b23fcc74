use std::{collections::HashSet, path::Path};

use frame_dataset_lib::*;
use image::{Rgb, RgbImage};
use itertools::Itertools;
use rand::prelude::*;

/// 64 bit fingerprints carried through the pixels of an 8x1 image, one byte per pixel.
/// The distance is the Hamming distance.
struct BitmaskProvider;

impl FingerprintProvider for BitmaskProvider {
    type Fingerprint = u64;

    fn fingerprint(&self, pixels: &RgbImage) -> u64 {
        let mut bytes = [0u8; 8];
        for (byte, pixel) in bytes.iter_mut().zip(pixels.pixels()) {
            *byte = pixel.0[0];
        }
        u64::from_le_bytes(bytes)
    }

    fn distance(&self, a: &u64, b: &u64) -> u32 {
        (a ^ b).count_ones()
    }
}

/// Frame paths are `<fingerprint as hex>.png`. Anything else is unreadable.
struct BitmaskDecoder;

impl PixelDecoder for BitmaskDecoder {
    fn decode(&self, src_path: &Path) -> Result<RgbImage, FrameError> {
        let stem = src_path.file_stem().unwrap().to_string_lossy();
        let value = u64::from_str_radix(&stem, 16).map_err(|e| FrameError::UnreadableFrame {
            path: src_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let bytes = value.to_le_bytes();
        Ok(RgbImage::from_fn(8, 1, |x, _y| Rgb([bytes[x as usize], 0, 0])))
    }
}

fn frames_for(fingerprints: &[u64]) -> Vec<Frame<u64>> {
    fingerprints
        .iter()
        .enumerate()
        .map(|(i, fp)| Frame::new(format!("F{}", i + 1), format!("{fp:016x}.png")))
        .collect()
}

/// Straightforward greedy pass, returning kept indices and (duplicate, kept) index pairs.
fn reference_greedy(fingerprints: &[u64], threshold: u32) -> (Vec<usize>, Vec<(usize, usize)>) {
    let mut kept: Vec<usize> = vec![];
    let mut dups = vec![];
    for (i, fp) in fingerprints.iter().enumerate() {
        match kept.iter().find(|&&k| (fingerprints[k] ^ fp).count_ones() <= threshold) {
            Some(&k) => dups.push((i, k)),
            None => kept.push(i),
        }
    }
    (kept, dups)
}

fn flip_random_bits(value: u64, num_bits: u32, rng: &mut StdRng) -> u64 {
    let positions = rand::seq::index::sample(rng, 64, num_bits as usize);
    positions.iter().fold(value, |acc, pos| acc ^ (1u64 << pos))
}

/// Fingerprints that cluster around a few random bases.
fn noisy_fingerprints(num_bases: usize, num_frames: usize, max_noise: u32, rng: &mut StdRng) -> Vec<u64> {
    let bases = (0..num_bases).map(|_| rng.gen::<u64>()).collect::<Vec<_>>();
    (0..num_frames)
        .map(|_| {
            let base = *bases.choose(rng).unwrap();
            let noise = rng.gen_range(0..=max_noise);
            flip_random_bits(base, noise, rng)
        })
        .collect()
}

#[test]
fn test_worked_scenario() {
    // Distances from F1 are 0, 3, 9, 2 and 10. F5 shares no set bits with F3.
    let f1 = 0u64;
    let f2 = 0b111;
    let f3 = 0x1ff;
    let f4 = 0b11;
    let f5 = 0x3ff << 9;
    let input = [f1, f2, f3, f4, f5];

    let provider = BitmaskProvider;
    assert_eq!(
        input.iter().map(|fp| provider.distance(&f1, fp)).collect::<Vec<_>>(),
        vec![0, 3, 9, 2, 10]
    );

    // F1: kept set is empty, keep.
    // F2: d(F2, F1) = 3 <= 8, duplicate of F1.
    // F3: d(F3, F1) = 9 > 8, keep.
    // F4: d(F4, F1) = 2 <= 8, duplicate of F1 (F1 is checked first).
    // F5: d(F5, F1) = 10 > 8 and d(F5, F3) = 19 > 8, keep.
    let frames = frames_for(&input);
    let report = NearDuplicateDetector::new(BitmaskProvider, 8)
        .detect(&frames, &BitmaskDecoder)
        .report();

    assert_eq!(report.total, 5);
    assert_eq!(report.kept_files, vec!["F1", "F3", "F5"]);
    assert_eq!(
        report.duplicates_map,
        vec![
            DuplicateRecord {
                duplicate: "F2".into(),
                kept: "F1".into()
            },
            DuplicateRecord {
                duplicate: "F4".into(),
                kept: "F1".into()
            },
        ]
    );
    assert!(report.is_consistent());
}

#[test]
fn test_matches_reference_greedy() {
    let mut rng = StdRng::seed_from_u64(1);

    for threshold in [0, 3, 6, 10] {
        let fingerprints = noisy_fingerprints(8, 150, 8, &mut rng);
        let frames = frames_for(&fingerprints);
        let report = NearDuplicateDetector::new(BitmaskProvider, threshold)
            .detect(&frames, &BitmaskDecoder)
            .report();

        let (kept, dups) = reference_greedy(&fingerprints, threshold);
        let id = |i: usize| format!("F{}", i + 1);

        assert_eq!(report.kept_files, kept.iter().map(|&i| id(i)).collect::<Vec<_>>());
        assert_eq!(
            report.duplicates_map,
            dups.iter()
                .map(|&(d, k)| DuplicateRecord {
                    duplicate: id(d),
                    kept: id(k)
                })
                .collect::<Vec<_>>()
        );
    }
}

#[test]
fn test_kept_frames_are_pairwise_distinct() {
    let mut rng = StdRng::seed_from_u64(2);
    let threshold = 5;

    let fingerprints = noisy_fingerprints(12, 300, 10, &mut rng);
    let frames = frames_for(&fingerprints);
    let detection = NearDuplicateDetector::new(BitmaskProvider, threshold).detect(&frames, &BitmaskDecoder);

    let kept_fps = detection
        .kept()
        .iter()
        .map(|frame| *frame.fingerprint().unwrap())
        .collect::<Vec<_>>();

    for (a, b) in kept_fps.iter().tuple_combinations() {
        assert!((a ^ b).count_ones() > threshold);
    }

    //every duplicate is within range of its kept frame, and out of range of every frame
    //kept before that one.
    for (dup, kept) in detection.duplicates() {
        let dup_fp = *dup.fingerprint().unwrap();
        assert!((dup_fp ^ kept.fingerprint().unwrap()).count_ones() <= threshold);

        for earlier in detection.kept().iter().take_while(|k| k.id() != kept.id()) {
            assert!((dup_fp ^ earlier.fingerprint().unwrap()).count_ones() > threshold);
        }
    }
}

#[test]
fn test_every_frame_is_accounted_for_once() {
    let mut rng = StdRng::seed_from_u64(3);

    let mut fingerprints = noisy_fingerprints(5, 100, 6, &mut rng);
    fingerprints.shuffle(&mut rng);
    let mut frames = frames_for(&fingerprints);
    frames.push(Frame::new("broken", "not_hex.png"));

    let report = NearDuplicateDetector::new(BitmaskProvider, 4)
        .detect(&frames, &BitmaskDecoder)
        .report();

    let mut seen = HashSet::new();
    let all_ids = report
        .kept_files
        .iter()
        .chain(report.duplicates_map.iter().map(|r| &r.duplicate))
        .chain(report.unreadable_files.iter());
    for id in all_ids {
        assert!(seen.insert(id.clone()), "{id} appears more than once");
    }

    let expected = frames.iter().map(|f| f.id().to_string()).collect::<HashSet<_>>();
    assert_eq!(seen, expected);
    assert_eq!(report.unreadable_files, vec!["broken"]);
    assert!(report.is_consistent());
}

#[test]
fn test_detection_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(4);
    let fingerprints = noisy_fingerprints(10, 200, 8, &mut rng);

    let detector = NearDuplicateDetector::new(BitmaskProvider, 6);
    let first = detector.detect(&frames_for(&fingerprints), &BitmaskDecoder).report();
    let second = detector.detect(&frames_for(&fingerprints), &BitmaskDecoder).report();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_kept_count_settles_on_well_separated_clusters() {
    let mut rng = StdRng::seed_from_u64(5);
    let radius = 2;
    let max_threshold = 12;

    //cluster centres are far enough apart that no threshold up to max_threshold can
    //merge members of different clusters.
    let mut centres: Vec<u64> = vec![];
    while centres.len() < 10 {
        let candidate = rng.gen::<u64>();
        if centres
            .iter()
            .all(|c| (c ^ candidate).count_ones() > max_threshold + 2 * radius)
        {
            centres.push(candidate);
        }
    }

    let mut fingerprints = centres
        .iter()
        .flat_map(|&c| {
            (0..10)
                .map(|_| {
                    let noise = rng.gen_range(0..=radius);
                    flip_random_bits(c, noise, &mut rng)
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    fingerprints.shuffle(&mut rng);

    let kept_at = |threshold: u32| {
        NearDuplicateDetector::new(BitmaskProvider, threshold)
            .detect(&frames_for(&fingerprints), &BitmaskDecoder)
            .kept()
            .len()
    };

    let distinct = fingerprints.iter().collect::<HashSet<_>>().len();
    assert_eq!(kept_at(0), distinct);

    let counts = (0..=max_threshold).map(kept_at).collect::<Vec<_>>();
    for count in &counts {
        assert!(*count >= centres.len());
    }
    for threshold in (2 * radius)..=max_threshold {
        assert_eq!(counts[threshold as usize], centres.len());
    }
}

/// Distances between four frames, given by table. The distances satisfy the triangle
/// inequality.
///
/// ```text
///      A  B  C  D
///   A  0  3  4  4
///   B  3  0  2  2
///   C  4  2  0  4
///   D  4  2  4  0
/// ```
struct TableProvider;

const TABLE: [[u32; 4]; 4] = [[0, 3, 4, 4], [3, 0, 2, 2], [4, 2, 0, 4], [4, 2, 4, 0]];

impl FingerprintProvider for TableProvider {
    type Fingerprint = usize;

    fn fingerprint(&self, pixels: &RgbImage) -> usize {
        pixels.width() as usize - 1
    }

    fn distance(&self, a: &usize, b: &usize) -> u32 {
        TABLE[*a][*b]
    }
}

struct TableDecoder;

impl PixelDecoder for TableDecoder {
    fn decode(&self, src_path: &Path) -> Result<RgbImage, FrameError> {
        let stem = src_path.file_stem().unwrap().to_string_lossy().into_owned();
        let index = ["A", "B", "C", "D"].iter().position(|n| *n == stem).unwrap();
        Ok(RgbImage::new(index as u32 + 1, 1))
    }
}

#[test]
fn test_raising_the_threshold_can_keep_more_frames() {
    for (a, b, c) in (0..4).tuple_combinations() {
        assert!(TABLE[a][c] <= TABLE[a][b] + TABLE[b][c]);
        assert!(TABLE[a][b] <= TABLE[a][c] + TABLE[c][b]);
        assert!(TABLE[b][c] <= TABLE[b][a] + TABLE[a][c]);
    }

    let frames = || ["A", "B", "C", "D"].map(|n| Frame::from_path(format!("{n}.png")));

    // T = 2: A kept, B kept (3 > 2), C and D both within 2 of B.
    let at_2 = NearDuplicateDetector::new(TableProvider, 2).detect(&frames(), &TableDecoder).report();
    assert_eq!(at_2.kept_files, vec!["A.png", "B.png"]);

    // T = 3: B is absorbed by A, so nothing absorbs C or D, which are 4 apart.
    let at_3 = NearDuplicateDetector::new(TableProvider, 3).detect(&frames(), &TableDecoder).report();
    assert_eq!(at_3.kept_files, vec!["A.png", "C.png", "D.png"]);
}
