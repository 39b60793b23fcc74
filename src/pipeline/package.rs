use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Bundles the dedup stage output into a single distributable file.
pub trait Packager {
    /// Write every file under `src_dir` into `archive_path`, with member names prefixed by
    /// `root_name`.
    fn package(&self, src_dir: &Path, root_name: &str, archive_path: &Path) -> Result<(), PackageError>;
}

impl<K: Packager + ?Sized> Packager for &K {
    fn package(&self, src_dir: &Path, root_name: &str, archive_path: &Path) -> Result<(), PackageError> {
        (**self).package(src_dir, root_name, archive_path)
    }
}

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Error accessing {path}: {src}")]
    Io { src: std::io::Error, path: PathBuf },

    #[error("Failed to walk {path}: {src}")]
    Walk { src: walkdir::Error, path: PathBuf },

    #[error("Failed to write archive {path}: {src}")]
    Zip { src: zip::result::ZipError, path: PathBuf },
}

impl PackageError {
    fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |src| Self::Io { src, path }
    }

    fn zip(path: impl Into<PathBuf>) -> impl FnOnce(zip::result::ZipError) -> Self {
        let path = path.into();
        move |src| Self::Zip { src, path }
    }
}

/// Writes a deflate compressed zip archive.
///
/// Members are added in sorted path order with a fixed timestamp, so packaging the same
/// directory twice gives byte-identical archives. The archive is written to a temporary
/// file next to `archive_path` and renamed into place once complete.
#[derive(Debug, Clone, Default)]
pub struct ZipPackager;

impl Packager for ZipPackager {
    fn package(&self, src_dir: &Path, root_name: &str, archive_path: &Path) -> Result<(), PackageError> {
        if let Some(parent) = archive_path.parent() {
            std::fs::create_dir_all(parent).map_err(PackageError::io(parent))?;
        }

        let mut files = vec![];
        for entry in WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|src| PackageError::Walk {
                src,
                path: src_dir.to_path_buf(),
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        let temp_path = archive_path.with_extension("zip.tmp");
        let temp_file = File::create(&temp_path).map_err(PackageError::io(&temp_path))?;
        let mut writer = ZipWriter::new(BufWriter::new(temp_file));

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(6))
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        for path in &files {
            let rel_path = path.strip_prefix(src_dir).unwrap_or(path);
            let member_name = std::iter::once(root_name.to_string())
                .chain(rel_path.components().map(|c| c.as_os_str().to_string_lossy().into_owned()))
                .collect::<Vec<_>>()
                .join("/");

            writer
                .start_file(member_name.as_str(), options)
                .map_err(PackageError::zip(&temp_path))?;
            let bytes = std::fs::read(path).map_err(PackageError::io(path))?;
            writer.write_all(&bytes).map_err(PackageError::io(&temp_path))?;
        }

        let buf = writer.finish().map_err(PackageError::zip(&temp_path))?;
        let temp_file = buf.into_inner().map_err(|e| PackageError::Io {
            src: e.into_error(),
            path: temp_path.clone(),
        })?;
        temp_file.sync_all().map_err(PackageError::io(&temp_path))?;
        std::fs::rename(&temp_path, archive_path).map_err(PackageError::io(archive_path))?;

        info!(target: "package", "Packaged {} files into {}", files.len(), archive_path.display());
        Ok(())
    }
}
