use anyhow::Result;
use console::style;
use std::{
    io::{self, Write},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod models;
mod services;

use errors::DeployError;
use services::{deploy_service::DeployService, publisher::S3Publisher};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Logging setup (stderr; stdout is for the operator) ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = report(&err, &mut io::stdout(), &mut io::stderr());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    // --- Parse config ---
    let cfg = config::DeployConfig::from_env_and_args()?;
    tracing::info!("Starting client deploy with config: {:?}", cfg);

    // --- Initialize publisher ---
    let publisher = S3Publisher::from_env(&cfg.s3_settings()).await;

    // --- Run the workflow ---
    let service = DeployService::new(cfg, publisher);
    let mut stdout = io::stdout().lock();
    let report = service.run(&mut stdout).await?;

    match &report.receipt {
        Some(receipt) => tracing::info!(
            key = %report.key,
            client_id = %report.activation.client_id,
            size_bytes = receipt.size_bytes,
            md5 = %receipt.content_md5,
            etag = ?receipt.etag,
            version = ?receipt.version,
            uploaded_at = %receipt.uploaded_at,
            "deploy finished"
        ),
        None => tracing::info!(key = %report.key, "dry run finished"),
    }

    Ok(())
}

/// Precondition failures get a one-line hint on `out`; anything else is
/// written with its full cause chain to `err_out`.
fn report<O: Write, E: Write>(
    err: &anyhow::Error,
    out: &mut O,
    err_out: &mut E,
) -> io::Result<()> {
    match err.downcast_ref::<DeployError>() {
        Some(deploy_err) if deploy_err.is_precondition() => {
            writeln!(out, "{}", style(deploy_err).red())
        }
        _ => writeln!(err_out, "{}", style(format!("{:?}", err)).red()),
    }
}
