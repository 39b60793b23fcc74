use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use crate::{FingerprintProvider, FrameError, PixelDecoder};

/// A single frame awaiting deduplication. The fingerprint is computed on first use and
/// never changes afterwards.
#[derive(Debug)]
pub struct Frame<F> {
    id: String,
    src_path: PathBuf,
    fingerprint: OnceCell<F>,
}

impl<F> Frame<F> {
    pub fn new(id: impl Into<String>, src_path: impl AsRef<Path>) -> Self {
        Self {
            id: id.into(),
            src_path: src_path.as_ref().to_path_buf(),
            fingerprint: OnceCell::new(),
        }
    }

    /// A frame whose identifier is the file name of `src_path`.
    pub fn from_path(src_path: impl AsRef<Path>) -> Self {
        let src_path = src_path.as_ref();
        let id = src_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| src_path.to_string_lossy().into_owned());
        Self::new(id, src_path)
    }

    /// Stable identifier, used in the [`DedupReport`](crate::DedupReport).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Where the frame's pixels are read from.
    pub fn src_path(&self) -> &Path {
        &self.src_path
    }

    /// The fingerprint, if it has already been computed.
    pub fn fingerprint(&self) -> Option<&F> {
        self.fingerprint.get()
    }

    /// The fingerprint, computing it first if necessary. A decode failure is returned
    /// as-is and nothing is stored.
    pub fn fingerprint_with<P, D>(&self, provider: &P, decoder: &D) -> Result<&F, FrameError>
    where
        P: FingerprintProvider<Fingerprint = F> + ?Sized,
        D: PixelDecoder + ?Sized,
    {
        self.fingerprint.get_or_try_init(|| {
            let pixels = decoder.decode(&self.src_path)?;
            Ok(provider.fingerprint(&pixels))
        })
    }
}
