// Dedup definitions

/// Maximum fingerprint distance at which two frames are considered the same.
pub const DEFAULT_DEDUP_THRESHOLD: u32 = 8;

/// Side length of the square of low frequency coefficients (or pixels) that make up a
/// fingerprint. The fingerprint is `DEFAULT_HASH_SIZE * DEFAULT_HASH_SIZE` bits wide.
pub const DEFAULT_HASH_SIZE: u32 = 8;

// The perceptual hash resizes frames to HIGHFREQ_FACTOR * hash_size before the DCT, so that
// only the lowest frequencies survive in the kept corner of the coefficients.
pub const HIGHFREQ_FACTOR: u32 = 4;

/// Files with these extensions (compared case-insensitively) are treated as frames.
pub const FRAME_FILE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// Name of the report written by the dedup stage. Its presence marks the stage as done.
pub const DEDUP_REPORT_FILENAME: &str = "dedup_report.json";

// Extraction definitions

/// Frames sampled per second of video when no rate is configured.
pub const DEFAULT_FPS: f64 = 2.0;

// Run identity definitions

/// Number of hex characters kept from the run digest.
pub const RUN_ID_LEN: usize = 16;

// The asset is hashed in chunks of this size, so memory use does not depend on the file size.
pub const ASSET_HASH_CHUNK_SIZE: usize = 1024 * 1024;

// Stage layout
pub const RAW_FRAMES_DIRNAME: &str = "frames_raw";
pub const CLEAN_FRAMES_DIRNAME: &str = "frames_clean";

// Ffmpeg is killed if frame extraction takes longer than this.
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 60 * 60;
