use std::path::Path;

use image::RgbImage;

use crate::FrameError;

/// Loads the RGB pixels of a frame file.
///
/// Implementations must return [`FrameError::UnreadableFrame`] for files that cannot be
/// decoded rather than panicking, so that one bad frame does not end the run.
pub trait PixelDecoder: Send + Sync {
    fn decode(&self, src_path: &Path) -> Result<RgbImage, FrameError>;
}

/// Decodes any format supported by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileDecoder;

impl PixelDecoder for ImageFileDecoder {
    fn decode(&self, src_path: &Path) -> Result<RgbImage, FrameError> {
        let img = image::open(src_path)
            .map_err(|e| FrameError::unreadable(src_path, e))?
            .to_rgb8();

        if img.width() == 0 || img.height() == 0 {
            return Err(FrameError::unreadable(src_path, "image has no pixels"));
        }

        Ok(img)
    }
}

#[cfg(test)]
mod test {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn test_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000001.png");
        RgbImage::from_pixel(5, 3, Rgb([1, 2, 3])).save(&path).unwrap();

        let img = ImageFileDecoder.decode(&path).unwrap();
        assert_eq!(img.dimensions(), (5, 3));
        assert_eq!(img.get_pixel(4, 2), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame_000001.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        match ImageFileDecoder.decode(&path) {
            Err(FrameError::UnreadableFrame { path: err_path, .. }) => assert_eq!(err_path, path),
            Ok(_) => panic!("garbage decoded successfully"),
        }
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFileDecoder.decode(&dir.path().join("nope.png")).is_err());
    }
}
