use std::path::{Path, PathBuf};

use crate::{definitions::*, *};

/// True if the path has one of the [`FRAME_FILE_EXTENSIONS`].
pub fn is_frame_file(path: impl AsRef<Path>) -> bool {
    match path.as_ref().extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            FRAME_FILE_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// The frame files directly inside `dir`, sorted by file name. This is the processing
/// order used by the dedup stage.
pub fn list_frames(dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let mut frames = vec![];
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_frame_file(&path) {
            frames.push(path);
        }
    }

    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

/// Deduplicate the frames in `src_dir` into `dst_dir`.
///
/// Kept frames are copied into `dst_dir` under their original names. The report is
/// written last, so its presence means every kept frame has been copied.
pub fn deduplicate_dir<P, D>(
    src_dir: impl AsRef<Path>,
    dst_dir: impl AsRef<Path>,
    detector: &NearDuplicateDetector<P>,
    decoder: &D,
) -> Result<DedupReport, DedupError>
where
    P: FingerprintProvider,
    D: PixelDecoder + ?Sized,
{
    let src_dir = src_dir.as_ref();
    let dst_dir = dst_dir.as_ref();

    let frames = list_frames(src_dir)
        .map_err(DedupError::io(src_dir))?
        .into_iter()
        .map(Frame::from_path)
        .collect::<Vec<_>>();

    info!(
        target: "dedup",
        "Deduplicating {} frames from {} (threshold {})",
        frames.len(),
        src_dir.display(),
        detector.threshold()
    );

    let detection = detector.detect(&frames, decoder);

    std::fs::create_dir_all(dst_dir).map_err(DedupError::io(dst_dir))?;
    for kept in detection.kept() {
        let dst_path = dst_dir.join(kept.id());
        std::fs::copy(kept.src_path(), &dst_path).map_err(DedupError::io(&dst_path))?;
    }

    let report = detection.report();
    report.save(dst_dir.join(DEDUP_REPORT_FILENAME))?;

    info!(
        target: "dedup",
        "Kept {} of {} frames ({} duplicates, {} unreadable)",
        report.kept,
        report.total,
        report.duplicates,
        report.unreadable_files.len()
    );

    Ok(report)
}
