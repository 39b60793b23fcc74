use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Various causes of failure for ffmpeg functions.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FfmpegError {
    /// Ffmpeg command was not found. Make sure Ffmpeg is installed and can be found on the command line.
    #[error("ffmpeg not found. Make sure ffmpeg is installed and visible on the command line")]
    FfmpegNotFound,

    /// Io error occurred while executing the Ffmpeg command
    #[error("Ffmpeg IO error: {0}")]
    Io(String),

    /// Ffmpeg returned a nonzero exit code. Because ffmpeg sometimes prints long error strings
    /// to stderr, The resulting string contains the first few hundred characters of the error message.
    #[error("Internal Ffmpeg Failure: {0}")]
    FfmpegInternal(String),

    /// Failed to interpret Ffmpeg output as a utf8-string.
    #[error("utf8 parsing/conversion failure")]
    Utf8Conversion,

    /// Ffmpeg was still running after the given number of seconds, and was killed.
    #[error("Ffmpeg did not finish within {0} seconds")]
    Timeout(u64),
}
