//! Top-level wiring: initialize components, run the workflow, always clean up.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::workflow::LoaderWorkflow;
use crate::audit::{AuditLevel, AuditLogger};
use crate::config::AppConfig;
use crate::db::ProviderRepository;
use crate::pgp::PgpService;
use crate::retry::RetryPolicy;
use crate::sftp::{RetryingTransport, RusshSftpClient};
use crate::xml::ProviderXmlParser;

/// Initializes every component from the configuration file, runs the
/// workflow, and cleans up regardless of the outcome.
///
/// # Errors
///
/// Returns an error when configuration resolution fails or when the
/// workflow aborts (connect or list failure). Per-file failures are counted,
/// not raised.
pub async fn run(config_path: &Path) -> Result<()> {
    info!("Initializing provider loader");

    let config = AppConfig::load(config_path).with_context(|| {
        format!(
            "failed to load configuration from '{}'",
            config_path.display()
        )
    })?;
    info!("Configuration loaded successfully");

    let audit = AuditLogger::new(AuditLevel::Info, None);
    audit.log_application_start();

    let client = RusshSftpClient::new(config.sftp.clone(), config.app.connection_timeout_ms);
    let transport = RetryingTransport::new(client, RetryPolicy::from_settings(&config.app));
    let pgp = PgpService::new(config.pgp.clone());
    let parser = ProviderXmlParser::new();
    let repository = ProviderRepository::new(config.db.clone());
    info!("Application initialized successfully");

    let mut workflow = LoaderWorkflow::new(config, audit, transport, pgp, parser, repository);
    let outcome = workflow.run().await;
    workflow.cleanup().await;
    outcome.map(|_summary| ())
}
