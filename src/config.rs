use crate::{
    models::upload::UploadOptions,
    services::{artifact_locator::SelectionPolicy, publisher::S3Settings},
};
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf};

/// Bucket every client bundle is published to.
pub const DEFAULT_BUCKET: &str = "objective-bank";

/// Where the bundler writes its output, relative to the repository root.
pub const DEFAULT_DIST_DIR: &str = "./dist";

/// Command the operator is told to run when no bundle exists yet.
pub const BUILD_COMMAND: &str = "yarn build";

/// Centralized deploy configuration.
/// Combines environment variables and CLI arguments; read once at start-up.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub dist_dir: PathBuf,
    pub bucket: String,
    pub app_name: Option<String>,
    pub build_command: String,
    pub selection: SelectionPolicy,
    pub upload_options: UploadOptions,
    pub endpoint: Option<String>,
    pub dry_run: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Upload the production client bundle and print its activation command"
)]
pub struct Args {
    /// Build output directory (overrides CLIENT_DEPLOY_DIST_DIR)
    #[arg(long)]
    pub dist_dir: Option<PathBuf>,

    /// Heroku app the bundle is activated on (overrides HEROKU_APP_NAME)
    #[arg(long)]
    pub app_name: Option<String>,

    /// How to choose when several bundles match
    #[arg(long, value_enum, default_value_t = SelectionPolicy::Strict)]
    pub select: SelectionPolicy,

    /// S3-compatible endpoint URL (overrides CLIENT_DEPLOY_S3_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Locate and compress the bundle without uploading it
    #[arg(long)]
    pub dry_run: bool,
}

impl DeployConfig {
    /// Defaults for a build directory, nothing read from the environment.
    pub fn new(dist_dir: impl Into<PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
            bucket: DEFAULT_BUCKET.into(),
            app_name: None,
            build_command: BUILD_COMMAND.into(),
            selection: SelectionPolicy::default(),
            upload_options: UploadOptions::gzipped_javascript(),
            endpoint: None,
            dry_run: false,
        }
    }

    /// Parse environment variables + CLI args into DeployConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name))
    }

    /// Merge parsed arguments with an environment lookup.
    /// CLI wins over environment, environment over defaults.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_dist = optional_var(&lookup, "CLIENT_DEPLOY_DIST_DIR")?.map(PathBuf::from);
        let env_app = optional_var(&lookup, "HEROKU_APP_NAME")?;
        let env_endpoint = optional_var(&lookup, "CLIENT_DEPLOY_S3_ENDPOINT")?;

        // --- Merge ---
        let mut cfg = Self::new(
            args.dist_dir
                .or(env_dist)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIST_DIR)),
        );
        cfg.app_name = args.app_name.filter(|name| !name.is_empty()).or(env_app);
        cfg.selection = args.select;
        cfg.endpoint = args.endpoint.or(env_endpoint);
        cfg.dry_run = args.dry_run;

        Ok(cfg)
    }

    pub fn s3_settings(&self) -> S3Settings {
        S3Settings {
            endpoint: self.endpoint.clone(),
        }
    }
}

/// Unset and empty variables both read as `None`.
fn optional_var<F>(lookup: &F, name: &str) -> Result<Option<String>>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(name) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, ffi::OsString};

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("client-deploy").chain(argv.iter().copied()))
            .unwrap()
    }

    fn env_of(
        pairs: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<String, env::VarError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn defaults_without_args_or_env() {
        let cfg = DeployConfig::resolve(args(&[]), env_of(&[])).unwrap();

        assert_eq!(cfg.dist_dir, PathBuf::from("./dist"));
        assert_eq!(cfg.bucket, "objective-bank");
        assert_eq!(cfg.app_name, None);
        assert_eq!(cfg.selection, SelectionPolicy::Strict);
        assert_eq!(cfg.upload_options, UploadOptions::gzipped_javascript());
        assert!(!cfg.dry_run);
    }

    #[test]
    fn environment_fills_unset_args() {
        let cfg = DeployConfig::resolve(
            args(&[]),
            env_of(&[
                ("HEROKU_APP_NAME", "myapp"),
                ("CLIENT_DEPLOY_DIST_DIR", "/tmp/build"),
                ("CLIENT_DEPLOY_S3_ENDPOINT", "http://localhost:9000"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.app_name.as_deref(), Some("myapp"));
        assert_eq!(cfg.dist_dir, PathBuf::from("/tmp/build"));
        assert_eq!(cfg.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn args_override_environment() {
        let cfg = DeployConfig::resolve(
            args(&["--app-name", "staging", "--select", "newest", "--dry-run"]),
            env_of(&[("HEROKU_APP_NAME", "myapp")]),
        )
        .unwrap();

        assert_eq!(cfg.app_name.as_deref(), Some("staging"));
        assert_eq!(cfg.selection, SelectionPolicy::Newest);
        assert!(cfg.dry_run);
    }

    #[test]
    fn empty_app_name_counts_as_unset() {
        let cfg =
            DeployConfig::resolve(args(&[]), env_of(&[("HEROKU_APP_NAME", "")])).unwrap();
        assert_eq!(cfg.app_name, None);
    }

    #[test]
    fn non_unicode_variable_is_an_error() {
        let err = DeployConfig::resolve(args(&[]), |name| {
            if name == "HEROKU_APP_NAME" {
                Err(env::VarError::NotUnicode(OsString::from("x")))
            } else {
                Err(env::VarError::NotPresent)
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("HEROKU_APP_NAME"));
    }

    #[test]
    fn s3_settings_follow_endpoint() {
        assert_eq!(DeployConfig::new("./dist").s3_settings().endpoint, None);

        let cfg = DeployConfig::resolve(
            args(&["--endpoint", "http://127.0.0.1:9000"]),
            env_of(&[("CLIENT_DEPLOY_S3_ENDPOINT", "http://minio:9000")]),
        )
        .unwrap();
        assert_eq!(
            cfg.s3_settings().endpoint.as_deref(),
            Some("http://127.0.0.1:9000")
        );
    }
}
