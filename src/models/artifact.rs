//! The compiled client bundle and its compressed upload form.

use bytes::Bytes;
use flate2::{Compression, write::GzEncoder};
use std::{io, io::Write, path::PathBuf};

/// File name prefix the bundler gives every hashed output.
pub const BUNDLE_PREFIX: &str = "app-";

/// Extension of the JavaScript bundle.
pub const JS_EXTENSION: &str = ".js";

/// Extension of the stylesheet bundle.
pub const CSS_EXTENSION: &str = ".css";

/// A bundle read from the build directory.
///
/// Created once per run and never mutated.
#[derive(Clone, Debug)]
pub struct Artifact {
    /// Where the bundle was discovered.
    pub path: PathBuf,

    /// Full, uncompressed file content.
    pub content: Bytes,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Gzip the bundle content.
    ///
    /// The output decompresses to exactly `content`; the compressed bytes
    /// themselves are not guaranteed to be stable across runs.
    pub fn compress(&self) -> io::Result<CompressedPayload> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.content)?;
        let body = Bytes::from(encoder.finish()?);

        Ok(CompressedPayload {
            md5: format!("{:x}", md5::compute(&body)),
            original_len: self.content.len(),
            body,
        })
    }
}

/// Gzip-encoded artifact content, owned by the orchestrator until uploaded.
#[derive(Clone, Debug)]
pub struct CompressedPayload {
    /// Compressed bytes.
    pub body: Bytes,

    /// Lowercase hex MD5 of `body`, comparable with a single-part S3 ETag.
    pub md5: String,

    /// Size of the uncompressed input in bytes.
    pub original_len: usize,
}
