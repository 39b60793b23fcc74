use std::{fmt, fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{definitions::*, PipelineConfig};

/// Cache key for one run of the pipeline.
///
/// The identity is the first [`RUN_ID_LEN`] hex characters of a SHA-256 digest over the
/// configuration and the input asset's content hash. It namespaces every directory the
/// pipeline writes, so identical (configuration, asset bytes) pairs share their cached
/// stage outputs and any change to either starts a fresh run.
///
/// The key is truncated because it is a cache key, not a security boundary. Two runs
/// whose digests collide in the kept prefix would share cache directories. That is a
/// cache-correctness risk (about 1 in 2^64 for any pair of runs), not a security one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunIdentity(String);

impl RunIdentity {
    /// Compute the identity of a run.
    ///
    /// Fields are hashed in this order, each followed by a separator byte:
    /// 1. input asset path
    /// 2. `fps`
    /// 3. `max_frames`
    /// 4. `scale_width`
    /// 5. `dedup_threshold`
    /// 6. fingerprint algorithm name
    ///
    /// then the hex SHA-256 of the asset bytes, if the asset can be read.
    ///
    /// This never fails. If the asset is missing or unreadable the identity reflects the
    /// configuration only, and a warning is logged. Whether the asset is actually needed
    /// is decided later, by the extract stage.
    pub fn resolve(cfg: &PipelineConfig) -> Self {
        let mut hasher = Sha256::new();

        let fields = [
            cfg.input_path.to_string_lossy().into_owned(),
            cfg.extraction.fps.to_string(),
            cfg.extraction.max_frames.to_string(),
            cfg.extraction.scale_width.to_string(),
            cfg.dedup_threshold.to_string(),
            cfg.fingerprint.name().to_string(),
        ];

        for field in &fields {
            hasher.update(field.as_bytes());
            hasher.update([0x1f]);
        }

        match sha256_file(&cfg.input_path) {
            Ok(asset_digest) => hasher.update(asset_digest.as_bytes()),
            Err(e) => warn!(
                target: "run_identity",
                "Could not hash {} ({e}). The run identity will depend on configuration only",
                cfg.input_path.display()
            ),
        }

        let mut id = format!("{:x}", hasher.finalize());
        id.truncate(RUN_ID_LEN);

        debug!(target: "run_identity", "resolved run identity {id}");
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RunIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hex SHA-256 of a file, read in [`ASSET_HASH_CHUNK_SIZE`] chunks.
pub fn sha256_file(path: impl AsRef<Path>) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; ASSET_HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buf)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buf[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
