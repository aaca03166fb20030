//! Uploads payloads to an object store.
//!
//! `Publisher` is the seam the deploy workflow talks to. The production
//! implementation is `S3Publisher`, a thin wrapper over the AWS SDK client;
//! workflow tests use a scripted double.

use crate::models::upload::{UploadReceipt, UploadRequest};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::{Client, primitives::ByteStream, types::ObjectCannedAcl};
use chrono::Utc;
use std::error::Error as StdError;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("upload to `{location}` failed")]
    Upload {
        location: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

pub type PublishResult<T> = Result<T, PublishError>;

/// Puts one object and reports what the store acknowledged.
///
/// A single attempt is made; any failure is final for that call.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> PublishResult<UploadReceipt>;
}

/// Connection settings for the S3 backend.
///
/// Credentials and region come from the usual AWS environment and profile
/// chain.
#[derive(Clone, Debug, Default)]
pub struct S3Settings {
    /// S3-compatible endpoint; addressed path-style when set.
    pub endpoint: Option<String>,
}

/// `Publisher` over the AWS S3 client.
///
/// ACL, content-encoding and content-type are request parameters, so they are
/// part of the signed request.
#[derive(Clone, Debug)]
pub struct S3Publisher {
    client: Client,
}

impl S3Publisher {
    /// Load credentials and region from the environment, then build the client.
    pub async fn from_env(settings: &S3Settings) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_sdk_config(&sdk_config, settings)
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, settings: &S3Settings) -> Self {
        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(
            region = ?sdk_config.region(),
            endpoint = ?settings.endpoint,
            "S3 client created"
        );

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl Publisher for S3Publisher {
    async fn upload(&self, request: UploadRequest) -> PublishResult<UploadReceipt> {
        let location = request.location();
        let size_bytes = request.body.len();
        let content_md5 = format!("{:x}", md5::compute(&request.body));
        debug!(%location, size_bytes, md5 = %content_md5, "putting object");

        let mut put = self
            .client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(ByteStream::from(request.body));
        if let Some(acl) = &request.options.acl {
            put = put.acl(ObjectCannedAcl::from(acl.as_str()));
        }
        if let Some(content_encoding) = &request.options.content_encoding {
            put = put.content_encoding(content_encoding);
        }
        if let Some(content_type) = &request.options.content_type {
            put = put.content_type(content_type);
        }

        let output = put.send().await.map_err(|err| PublishError::Upload {
            location: location.clone(),
            source: Box::new(err),
        })?;

        let etag = output.e_tag().map(|e| e.trim_matches('"').to_string());
        check_etag(etag.as_deref(), &content_md5, &location);

        info!(%location, size_bytes, etag = ?etag, "object uploaded");

        Ok(UploadReceipt {
            bucket: request.bucket,
            key: request.key,
            size_bytes,
            content_md5,
            etag,
            version: output.version_id().map(str::to_string),
            uploaded_at: Utc::now(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EtagCheck {
    Matched,
    Mismatched,
    /// No ETag, or an opaque one that is not a body digest.
    Skipped,
}

/// Single-part S3 ETags are the hex MD5 of the body. Other stores (and
/// multipart or KMS-encrypted objects) use opaque tags, which are skipped.
fn check_etag(etag: Option<&str>, content_md5: &str, location: &str) -> EtagCheck {
    let Some(etag) = etag else {
        return EtagCheck::Skipped;
    };
    if !is_md5_hex(etag) {
        debug!(%location, etag, "store returned a non-MD5 etag, skipping integrity check");
        return EtagCheck::Skipped;
    }
    if etag.eq_ignore_ascii_case(content_md5) {
        return EtagCheck::Matched;
    }
    warn!(
        %location,
        etag,
        expected = content_md5,
        "etag returned by the store does not match the uploaded payload"
    );
    EtagCheck::Mismatched
}

fn is_md5_hex(value: &str) -> bool {
    value.len() == 32 && value.bytes().all(|b| b.is_ascii_hexdigit())
}
