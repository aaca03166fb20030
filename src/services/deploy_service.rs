//! DeployService: the publish workflow for one client build.
//!
//! Steps run strictly in order and each is a precondition for the next:
//! check the build directory, locate the bundle, read and gzip it, derive the
//! object key, upload, then print the activation command. Failures are
//! returned to the caller; nothing here retries or exits the process.

use crate::{
    config::DeployConfig,
    errors::{DeployError, DeployResult},
    models::{
        activation::ActivationCommand,
        artifact::Artifact,
        upload::{UploadReceipt, UploadRequest},
    },
    services::{
        artifact_locator::{ArtifactLocator, directory_exists},
        publisher::Publisher,
    },
};
use console::style;
use std::{
    fmt::Display,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

const MAX_OBJECT_KEY_LEN: usize = 1024;

/// Outcome of a successful run.
#[derive(Debug)]
pub struct DeployReport {
    /// Object key the bundle was (or, on a dry run, would be) stored under.
    pub key: String,

    /// `None` on a dry run.
    pub receipt: Option<UploadReceipt>,

    pub activation: ActivationCommand,
}

pub struct DeployService<P> {
    config: DeployConfig,
    locator: ArtifactLocator,
    publisher: P,
}

impl<P: Publisher> DeployService<P> {
    pub fn new(config: DeployConfig, publisher: P) -> Self {
        let locator = ArtifactLocator::new(config.dist_dir.clone(), config.selection);
        Self {
            config,
            locator,
            publisher,
        }
    }

    #[cfg(test)]
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Run the workflow once, writing operator-facing lines to `out`.
    ///
    /// On a publish failure nothing further is written; the error is returned
    /// for the caller to report.
    pub async fn run<W: Write>(&self, out: &mut W) -> DeployResult<DeployReport> {
        let dist_dir = &self.config.dist_dir;
        if !directory_exists(dist_dir) {
            return Err(DeployError::MissingBuildDir {
                path: dist_dir.clone(),
            });
        }
        say(out, "Found dist directory.")?;

        let Some(js_path) = self.locator.find_js_bundle()? else {
            return Err(DeployError::MissingArtifact {
                dir: dist_dir.clone(),
                build_command: self.config.build_command.clone(),
            });
        };
        say(out, format_args!("Found JS build: {}", js_path.display()))?;

        match self.locator.find_css_bundle() {
            Ok(css) => debug!(css = ?css, "stylesheet bundle is served separately"),
            Err(err) => debug!(error = %err, "stylesheet lookup failed"),
        }

        let content = tokio::fs::read(&js_path)
            .await
            .map_err(|source| DeployError::ReadArtifact {
                path: js_path.clone(),
                source,
            })?;
        let artifact = Artifact::new(js_path, content);
        let payload = artifact.compress().map_err(|source| DeployError::Compress {
            path: artifact.path.clone(),
            source,
        })?;
        info!(
            path = %artifact.path.display(),
            original_bytes = payload.original_len,
            compressed_bytes = payload.body.len(),
            md5 = %payload.md5,
            "bundle compressed"
        );

        let key = derive_key(&artifact.path)?;
        let request = UploadRequest {
            bucket: self.config.bucket.clone(),
            key: key.clone(),
            body: payload.body,
            options: self.config.upload_options.clone(),
        };

        let receipt = if self.config.dry_run {
            say(
                out,
                format_args!(
                    "Dry run: would upload {} bytes to {}",
                    request.body.len(),
                    request.location()
                ),
            )?;
            None
        } else {
            let receipt = self.publisher.upload(request).await?;
            say(
                out,
                format_args!("Successfully uploaded data to {}", receipt.location()),
            )?;
            Some(receipt)
        };

        let activation = ActivationCommand::for_key(&key, self.config.app_name.as_deref());
        print_activation(out, &activation)?;

        Ok(DeployReport {
            key,
            receipt,
            activation,
        })
    }
}

/// Object key for a bundle: its base file name, checked to be a usable key.
pub fn derive_key(path: &Path) -> DeployResult<String> {
    let invalid = |reason| DeployError::InvalidArtifactName {
        path: PathBuf::from(path),
        reason,
    };

    let name = path
        .file_name()
        .ok_or_else(|| invalid("path has no file name"))?
        .to_str()
        .ok_or_else(|| invalid("file name is not valid UTF-8"))?;

    if name.is_empty() || name.len() > MAX_OBJECT_KEY_LEN {
        return Err(invalid("length must be between 1 and 1024 bytes"));
    }
    if name
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'/')
    {
        return Err(invalid("contains control characters or separators"));
    }

    Ok(name.to_string())
}

fn print_activation<W: Write>(out: &mut W, activation: &ActivationCommand) -> DeployResult<()> {
    say(out, "")?;
    if activation.app_name.is_none() {
        say(
            out,
            style("HEROKU_APP_NAME unset, you will need to specify app name.").yellow(),
        )?;
    }
    say(out, "Run the following command to activate this client build:")?;
    say(out, activation)
}

fn say<W: Write>(out: &mut W, line: impl Display) -> DeployResult<()> {
    writeln!(out, "{}", line).map_err(DeployError::Output)
}
