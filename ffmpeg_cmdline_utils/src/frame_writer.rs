use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{ffmpeg_ops::run_ffmpeg_command, FfmpegError};

const DEFAULT_FILE_PATTERN: &str = "frame_%06d.jpg";

/// Samples frames from a video and writes them into a directory as numbered image files.
///
/// With the default file pattern the frames are named `frame_000001.jpg`,
/// `frame_000002.jpg` and so on, so lexicographic order is temporal order.
#[derive(Clone, Debug)]
pub struct FfmpegFrameWriterBuilder {
    src_path: PathBuf,
    out_dir: PathBuf,
    fps: Option<f64>,
    scale_width: Option<u32>,
    jpeg_quality: u32,
    file_pattern: String,
    timeout_secs: Option<u64>,
}

impl FfmpegFrameWriterBuilder {
    pub fn new(src_path: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Self {
        Self {
            src_path: src_path.as_ref().to_path_buf(),
            out_dir: out_dir.as_ref().to_path_buf(),
            fps: None,
            scale_width: None,
            jpeg_quality: 2,
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            timeout_secs: None,
        }
    }

    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Frames to sample per second of video. If unset every frame is written.
    pub fn fps(&mut self, fps: f64) -> &mut Self {
        self.fps = Some(fps);
        self
    }

    /// Resize to this width, keeping the aspect ratio.
    pub fn scale_width(&mut self, width: u32) -> &mut Self {
        self.scale_width = Some(width);
        self
    }

    /// Ffmpeg `-qscale:v` value. Lower is better quality.
    pub fn jpeg_quality(&mut self, quality: u32) -> &mut Self {
        self.jpeg_quality = quality;
        self
    }

    /// printf style pattern for the output file names.
    pub fn file_pattern(&mut self, pattern: impl AsRef<str>) -> &mut Self {
        self.file_pattern = pattern.as_ref().to_string();
        self
    }

    pub fn timeout_secs(&mut self, timeout_secs: u64) -> &mut Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    fn video_filter(&self) -> String {
        let mut filters = vec![];
        if let Some(fps) = self.fps {
            filters.push(format!("fps={fps}"));
        }
        if let Some(width) = self.scale_width {
            filters.push(format!("scale={width}:-1"));
        }

        if filters.is_empty() {
            "null".to_string()
        } else {
            filters.join(",")
        }
    }

    /// The arguments passed to ffmpeg.
    pub fn args(&self) -> Vec<OsString> {
        let video_filter = self.video_filter();
        let quality = self.jpeg_quality.to_string();
        let out_path = self.out_dir.join(&self.file_pattern);

        #[rustfmt::skip]
        let args = [
            OsStr::new("-hide_banner"),
            OsStr::new("-loglevel"),  OsStr::new("error"),
            OsStr::new("-y"),
            OsStr::new("-i"),         self.src_path.as_os_str(),
            OsStr::new("-vf"),        OsStr::new(&video_filter),
            OsStr::new("-qscale:v"),  OsStr::new(&quality),
            out_path.as_os_str(),
        ];

        args.iter().map(|arg| arg.to_os_string()).collect()
    }

    /// Run ffmpeg, blocking until it exits. The output directory must already exist.
    pub fn run(&self) -> Result<(), FfmpegError> {
        let args = self.args();
        let args = args.iter().map(OsString::as_os_str).collect::<Vec<_>>();
        run_ffmpeg_command(&args, self.timeout_secs.map(Duration::from_secs))
    }
}
