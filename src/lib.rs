#![allow(clippy::len_without_is_empty)]

//! # Overview
//! frame_dataset_lib turns a video (or a zip archive of images) into a deduplicated
//! set of frames, and remembers which pipeline stages have already been done so that
//! rerunning with the same input and configuration does no redundant work.
//!
//! # How it works
//! A run has three stages, executed in order:
//! * **extract**: frames are written into a directory, named so that lexicographic
//!   order equals temporal order.
//! * **dedup**: every frame is fingerprinted with a perceptual hash, and frames that are
//!   within a threshold of an earlier kept frame are dropped.
//! * **package**: the kept frames and the [`DedupReport`] are written into a zip archive.
//!
//! Every artifact lives under a directory named after the [`RunIdentity`], a short key
//! derived from the configuration and the SHA-256 of the input file. Before each stage
//! runs, the [`StageStore`] is asked whether its output is already present. If it is,
//! the stage is skipped.
//!
//! # Duplicate detection
//! Detection is greedy and order dependent. Frames are visited in order and each one is
//! compared against the frames kept so far, in the order they were kept. The first kept
//! frame within the threshold "wins", even if a later kept frame would be closer.
//! This makes results reproducible, and guarantees that no two kept frames are within
//! the threshold of each other. It does not produce an optimal partition.
//!
//! ```rust,no_run
//! use frame_dataset_lib::*;
//!
//! let frames = list_frames("frames_raw/0123456789abcdef")
//!     .unwrap()
//!     .into_iter()
//!     .map(Frame::from_path)
//!     .collect::<Vec<_>>();
//!
//! let detector = NearDuplicateDetector::new(PerceptualHasher::default(), DEFAULT_DEDUP_THRESHOLD);
//! let detection = detector.detect(&frames, &ImageFileDecoder);
//! let report = detection.report();
//! println!("kept {} of {} frames", report.kept, report.total);
//! ```
//!
//! # Fingerprints
//! Any [`FingerprintProvider`] may be used with the [`NearDuplicateDetector`]. Two are
//! provided: a DCT based perceptual hash ([`PerceptualHasher`]) and an average hash
//! ([`AverageHasher`]). Both produce bit vectors compared by Hamming distance. The
//! [`Orchestrator`] picks one of them from [`PipelineConfig::fingerprint`] through
//! [`ConfiguredHasher`].
//!
//! # Caching
//! The stage cache is presence based. A stage is considered done when its expected output
//! exists, and nothing checks whether previously produced files were modified afterwards.
//! Editing the contents of a cache directory between runs is unsupported. Two runs with
//! the same run identity must not execute at the same time.
//!
//! # Prerequisites
//! Extracting frames from video calls Ffmpeg from the command line, so `ffmpeg` must be
//! available on the PATH. Importing frames from a zip archive does not need Ffmpeg.

#[macro_use]
extern crate log;

pub(crate) mod dedup;
pub(crate) mod definitions;
pub(crate) mod error;
pub(crate) mod fingerprint;
pub(crate) mod pipeline;
pub(crate) mod run_identity;
pub(crate) mod stage_cache;

pub use definitions::{
    DEDUP_REPORT_FILENAME, DEFAULT_DEDUP_THRESHOLD, DEFAULT_FPS, DEFAULT_HASH_SIZE, FRAME_FILE_EXTENSIONS,
    RUN_ID_LEN,
};

pub use error::{DedupError, Error, FrameError};

pub use fingerprint::{
    average_hash::AverageHasher, configured::ConfiguredHasher, decode::ImageFileDecoder, decode::PixelDecoder,
    image_hash::ImageHash, perceptual_hash::PerceptualHasher, FingerprintProvider,
};

pub use dedup::{
    detector::{Detection, NearDuplicateDetector},
    frame::Frame,
    frame_dir::{deduplicate_dir, is_frame_file, list_frames},
    report::{DedupReport, DuplicateRecord},
};

pub use run_identity::{sha256_file, RunIdentity};

pub use stage_cache::{fs_stage_store::FsStageStore, Stage, StageProgress, StageState, StageStore};

pub use pipeline::{
    config::{ExtractionParams, FingerprintAlgorithm, PipelineConfig},
    extract::{ArchiveImageExtractor, AutoExtractor, ExtractError, FfmpegExtractor, FrameExtractor, Frames},
    orchestrator::{Orchestrator, RunSummary, StageOutcome, StageRecord},
    package::{PackageError, Packager, ZipPackager},
};
