use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use ffmpeg_cmdline_utils::{FfmpegError, FfmpegFrameWriterBuilder};
use image::imageops::FilterType;
use thiserror::Error;
use zip::ZipArchive;

use crate::{definitions::*, *};

/// Paths of extracted frames, in processing order. The iterator is finite and can be
/// consumed only once.
pub type Frames = Box<dyn Iterator<Item = PathBuf>>;

/// Produces frame image files from an input asset.
pub trait FrameExtractor {
    /// Write frames from `asset` into `out_dir`, which will be created if needed. Frames
    /// must be named so that lexicographic order is processing order.
    fn extract(&self, asset: &Path, params: &ExtractionParams, out_dir: &Path) -> Result<Frames, ExtractError>;
}

impl<E: FrameExtractor + ?Sized> FrameExtractor for &E {
    fn extract(&self, asset: &Path, params: &ExtractionParams, out_dir: &Path) -> Result<Frames, ExtractError> {
        (**self).extract(asset, params, out_dir)
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("Failed to read archive {path}: {src}")]
    Archive { src: String, path: PathBuf },

    #[error("Error accessing {path}: {src}")]
    Io { src: std::io::Error, path: PathBuf },

    #[error("Failed to write image {path}: {src}")]
    Image { src: image::ImageError, path: PathBuf },
}

impl ExtractError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |src| Self::Io { src, path }
    }
}

/// Samples frames from a video with ffmpeg, as `frame_000001.jpg`, `frame_000002.jpg`, ...
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    timeout_secs: u64,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_EXTRACT_TIMEOUT_SECS,
        }
    }
}

impl FfmpegExtractor {
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn extract(&self, asset: &Path, params: &ExtractionParams, out_dir: &Path) -> Result<Frames, ExtractError> {
        std::fs::create_dir_all(out_dir).map_err(ExtractError::io(out_dir))?;

        let mut builder = FfmpegFrameWriterBuilder::new(asset, out_dir);
        builder.fps(params.fps).timeout_secs(self.timeout_secs);
        if params.scale_width > 0 {
            builder.scale_width(params.scale_width);
        }

        info!(target: "extract", "Extracting frames from {} at {} fps", asset.display(), params.fps);
        builder.run()?;

        let mut frames = list_frames(out_dir).map_err(ExtractError::io(out_dir))?;

        //ffmpeg has no frame cap that is independent of the fps filter, so extra frames are
        //removed afterwards.
        let cap = params.max_frames as usize;
        if cap > 0 && frames.len() > cap {
            debug!(target: "extract", "Removing {} frames beyond the cap of {cap}", frames.len() - cap);
            for extra in frames.drain(cap..) {
                std::fs::remove_file(&extra).map_err(ExtractError::io(&extra))?;
            }
        }

        Ok(Box::new(frames.into_iter()))
    }
}

/// Imports the image members of a zip archive as `frame_000001.<ext>`, `frame_000002.<ext>`,
/// ..., in member name order. `fps` does not apply.
#[derive(Debug, Clone, Default)]
pub struct ArchiveImageExtractor;

impl ArchiveImageExtractor {
    fn write_member(bytes: &[u8], scale_width: u32, dst_path: &Path) -> Result<(), ExtractError> {
        if scale_width > 0 {
            match image::load_from_memory(bytes) {
                Ok(img) if img.width() > 0 => {
                    let height = (f64::from(img.height()) * f64::from(scale_width) / f64::from(img.width()))
                        .round()
                        .max(1.0) as u32;
                    let resized = img.resize_exact(scale_width, height, FilterType::Lanczos3);
                    return resized.save(dst_path).map_err(|src| ExtractError::Image {
                        src,
                        path: dst_path.to_path_buf(),
                    });
                }
                //Leave undecodable members as they are. The dedup stage reports them as unreadable.
                Ok(_) | Err(_) => {
                    warn!(target: "extract", "Could not resize {}, copying it unchanged", dst_path.display())
                }
            }
        }

        std::fs::write(dst_path, bytes).map_err(ExtractError::io(dst_path))
    }
}

impl FrameExtractor for ArchiveImageExtractor {
    fn extract(&self, asset: &Path, params: &ExtractionParams, out_dir: &Path) -> Result<Frames, ExtractError> {
        let archive_err = |e: zip::result::ZipError| ExtractError::Archive {
            src: e.to_string(),
            path: asset.to_path_buf(),
        };

        let file = File::open(asset).map_err(ExtractError::io(asset))?;
        let mut archive = ZipArchive::new(file).map_err(archive_err)?;

        let mut names = archive
            .file_names()
            .filter(|name| !name.ends_with('/') && is_frame_file(name))
            .map(str::to_string)
            .collect::<Vec<_>>();
        names.sort();

        let cap = params.max_frames as usize;
        if cap > 0 {
            names.truncate(cap);
        }

        info!(target: "extract", "Importing {} images from {}", names.len(), asset.display());
        std::fs::create_dir_all(out_dir).map_err(ExtractError::io(out_dir))?;

        let mut frames = Vec::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let ext = Path::new(name)
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();
            let dst_path = out_dir.join(format!("frame_{:06}.{ext}", i + 1));

            let mut bytes = vec![];
            archive
                .by_name(name)
                .map_err(archive_err)?
                .read_to_end(&mut bytes)
                .map_err(ExtractError::io(asset))?;

            Self::write_member(&bytes, params.scale_width, &dst_path)?;
            trace!(target: "extract", "{name} -> {}", dst_path.display());
            frames.push(dst_path);
        }

        Ok(Box::new(frames.into_iter()))
    }
}

/// Imports zip archives with [`ArchiveImageExtractor`] and uses [`FfmpegExtractor`] for
/// everything else.
#[derive(Debug, Clone, Default)]
pub struct AutoExtractor {
    pub ffmpeg: FfmpegExtractor,
    pub archive: ArchiveImageExtractor,
}

impl AutoExtractor {
    fn is_archive(asset: &Path) -> bool {
        asset
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false)
    }
}

impl FrameExtractor for AutoExtractor {
    fn extract(&self, asset: &Path, params: &ExtractionParams, out_dir: &Path) -> Result<Frames, ExtractError> {
        if Self::is_archive(asset) {
            self.archive.extract(asset, params, out_dir)
        } else {
            self.ffmpeg.extract(asset, params, out_dir)
        }
    }
}
