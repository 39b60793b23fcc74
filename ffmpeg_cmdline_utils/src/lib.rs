//! Thin wrapper around the `ffmpeg` command line tool.
//!
//! Ffmpeg must be installed and visible on the PATH. Use [`ffmpeg_is_callable`] to check.

mod ffmpeg_error_kind;
mod ffmpeg_ops;
mod frame_writer;

pub use ffmpeg_error_kind::FfmpegError;
pub use ffmpeg_ops::ffmpeg_is_callable;
pub use frame_writer::FfmpegFrameWriterBuilder;
