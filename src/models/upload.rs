//! Upload descriptors handed to a publisher and the receipts it returns.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Canned ACL making the uploaded object world-readable.
pub const ACL_PUBLIC_READ: &str = "public-read";

/// Metadata options forwarded verbatim to the object store.
///
/// `None` means the option is not sent at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Canned access-control level (e.g. `public-read`).
    pub acl: Option<String>,

    /// `Content-Encoding` stored with the object (e.g. `gzip`).
    pub content_encoding: Option<String>,

    /// `Content-Type` stored with the object (e.g. `application/javascript`).
    pub content_type: Option<String>,
}

impl UploadOptions {
    /// Options for a public, gzip-encoded JavaScript bundle.
    pub fn gzipped_javascript() -> Self {
        Self {
            acl: Some(ACL_PUBLIC_READ.into()),
            content_encoding: Some("gzip".into()),
            content_type: Some("application/javascript".into()),
        }
    }
}

/// Everything needed to put one object. Built once, consumed once.
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub options: UploadOptions,
}

impl UploadRequest {
    /// `bucket/key`, as shown to the operator.
    pub fn location(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

/// What the store reported back for a successful put.
#[derive(Clone, Debug)]
pub struct UploadReceipt {
    /// Bucket the object landed in.
    pub bucket: String,

    /// Object key within the bucket.
    pub key: String,

    /// Number of bytes sent.
    pub size_bytes: usize,

    /// Lowercase hex MD5 of the bytes sent.
    pub content_md5: String,

    /// ETag returned by the store, quotes stripped.
    pub etag: Option<String>,

    /// Version identifier if the bucket is versioned.
    pub version: Option<String>,

    /// When the store acknowledged the put.
    pub uploaded_at: DateTime<Utc>,
}

impl UploadReceipt {
    pub fn location(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}
