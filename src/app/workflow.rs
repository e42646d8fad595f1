//! The linear ingestion workflow.
//!
//! `INIT → CONNECT → LIST → DOWNLOAD → PROCESS → CLEANUP`, strictly in
//! order. A failure during connect or list aborts the run (after the
//! transport's retry budget); a failure on an individual file during
//! download or processing is logged, audited, counted, and skipped. Cleanup
//! always runs and suppresses secondary errors.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::audit::AuditLogger;
use crate::config::AppConfig;
use crate::db::ProviderRepository;
use crate::pgp::PgpService;
use crate::sftp::{SftpError, SftpTransport};
use crate::xml::ProviderXmlParser;

/// Per-run download tally.
///
/// Only the counts are observable; per-file outcomes live in the logs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Files transferred successfully.
    pub succeeded: usize,
    /// Files whose transfer failed.
    pub failed: usize,
}

impl DownloadSummary {
    /// Total files attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Sequences the ingestion pipeline over any transport implementation.
///
/// The workflow owns every component for the run's duration — one transport
/// session, one file at a time, no overlap between phases.
pub struct LoaderWorkflow<T> {
    config: AppConfig,
    audit: AuditLogger,
    transport: T,
    pgp: PgpService,
    parser: ProviderXmlParser,
    repository: ProviderRepository,
}

impl<T: SftpTransport> LoaderWorkflow<T> {
    /// Wires the workflow from already-initialized components.
    pub fn new(
        config: AppConfig,
        audit: AuditLogger,
        transport: T,
        pgp: PgpService,
        parser: ProviderXmlParser,
        repository: ProviderRepository,
    ) -> Self {
        Self {
            config,
            audit,
            transport,
            pgp,
            parser,
            repository,
        }
    }

    /// Runs the workflow phases in order.
    ///
    /// # Errors
    ///
    /// Returns an error when connect or list fails; per-file download and
    /// processing failures are absorbed into the tally instead.
    pub async fn run(&mut self) -> Result<DownloadSummary> {
        info!("Starting provider loader workflow");
        let result = self.execute().await;
        match &result {
            Ok(summary) => {
                info!(
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Provider loader workflow completed"
                );
            }
            Err(error) => {
                error!(error = %format!("{error:#}"), "Workflow failed");
                self.audit.log_processing_event(
                    "WORKFLOW",
                    "main workflow execution",
                    false,
                    Some(&format!("{error:#}")),
                );
            }
        }
        result
    }

    /// Releases every acquired resource. Runs regardless of how the
    /// workflow ended; secondary errors are suppressed.
    pub async fn cleanup(&mut self) {
        info!("Cleaning up application resources");

        if self.transport.is_connected() {
            self.transport.disconnect().await;
            info!("SFTP connection closed");
        }

        self.repository.disconnect();
        info!("Database connection closed");

        self.audit.log_application_stop();
        self.audit.close();
        info!("Application cleanup completed");
    }

    async fn execute(&mut self) -> Result<DownloadSummary> {
        self.connect_phase().await?;
        let extracts = self.list_phase().await?;
        let summary = self.download_phase(&extracts).await?;
        self.process_phase(&extracts);
        Ok(summary)
    }

    async fn connect_phase(&mut self) -> Result<()> {
        let host = self.config.sftp.host.clone();
        info!(host = %host, port = self.config.sftp.port, "Connecting to SFTP server");

        let started = Instant::now();
        match self.transport.connect().await {
            Ok(()) => {
                self.audit.log_sftp_connection(&host, true, None);
                self.audit
                    .log_performance("SFTP_CONNECTION", started.elapsed(), None);
                info!("Successfully connected to SFTP server");
                Ok(())
            }
            Err(error) => {
                self.audit
                    .log_sftp_connection(&host, false, Some(&error.to_string()));
                Err(error).context("failed to connect to SFTP server")
            }
        }
    }

    async fn list_phase(&mut self) -> Result<Vec<String>> {
        let directory = self.config.sftp.remote_directory.clone();
        let pattern = self.config.sftp.file_pattern.clone();
        info!(directory = %directory, pattern = %pattern, "Listing remote extracts");

        let started = Instant::now();
        let extracts = self
            .transport
            .list_files(&directory, &pattern)
            .await
            .context("failed to list remote extracts")?;

        self.audit.log_performance(
            "LIST_FILES",
            started.elapsed(),
            Some(&format!("{} files found", extracts.len())),
        );
        info!(count = extracts.len(), "Found extracts to download");
        Ok(extracts)
    }

    async fn download_phase(&mut self, extracts: &[String]) -> Result<DownloadSummary> {
        let inbox = self.config.sftp.local_inbox_directory.clone();
        info!(
            count = extracts.len(),
            inbox = %inbox.display(),
            "Downloading extracts to local inbox"
        );

        if !inbox.exists() {
            std::fs::create_dir_all(&inbox)
                .with_context(|| format!("failed to create inbox '{}'", inbox.display()))?;
            info!(inbox = %inbox.display(), "Created inbox directory");
        }

        let mut summary = DownloadSummary::default();
        for file_name in extracts {
            info!(file = %file_name, "Downloading extract");
            let started = Instant::now();

            match self.download_one(file_name).await {
                Ok(size_bytes) => {
                    self.audit.log_file_download(file_name, size_bytes, true, None);
                    self.audit
                        .log_performance("FILE_DOWNLOAD", started.elapsed(), Some(file_name));
                    summary.succeeded += 1;
                    info!(file = %file_name, bytes = size_bytes, "Successfully downloaded extract");
                }
                Err(error) => {
                    error!(file = %file_name, error = %error, "Failed to download extract");
                    self.audit
                        .log_file_download(file_name, 0, false, Some(&error.to_string()));
                    summary.failed += 1;
                    // Continue with the remaining files.
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Download summary"
        );
        if summary.failed > 0 {
            warn!("Some extracts failed to download; check logs for details");
        }
        Ok(summary)
    }

    async fn download_one(&self, file_name: &str) -> Result<u64, SftpError> {
        let directory = &self.config.sftp.remote_directory;
        let size_bytes = self.transport.file_size(directory, file_name).await?;
        self.transport
            .download_file(
                directory,
                file_name,
                &self.config.sftp.local_inbox_directory,
            )
            .await?;
        Ok(size_bytes)
    }

    fn process_phase(&mut self, extracts: &[String]) {
        info!("Processing downloaded extracts (stub implementation)");
        let inbox = self.config.sftp.local_inbox_directory.clone();

        for file_name in extracts {
            let local_path = inbox.join(file_name);
            if !local_path.exists() {
                warn!(path = %local_path.display(), "Downloaded extract not found; skipping");
                continue;
            }

            match self.process_one(file_name, &local_path) {
                Ok(()) => {
                    self.audit
                        .log_processing_event("FILE_PROCESSING", file_name, true, None);
                }
                Err(error) => {
                    error!(file = %file_name, error = %format!("{error:#}"), "Failed to process extract");
                    self.audit.log_processing_event(
                        "FILE_PROCESSING",
                        file_name,
                        false,
                        Some(&format!("{error:#}")),
                    );
                }
            }
        }
    }

    /// Per-file processing. Decryption, parsing, and persistence are wired
    /// through here once the services grow real implementations; today the
    /// step only reports what it would do.
    #[allow(clippy::unnecessary_wraps)]
    fn process_one(&self, file_name: &str, local_path: &Path) -> Result<()> {
        if self.pgp.is_encrypted(local_path) {
            info!(file = %file_name, "Extract appears PGP-encrypted (decryption pending)");
        }
        if self.parser.is_well_formed(local_path) {
            info!(file = %file_name, "Extract is well-formed XML (parsing pending)");
        }
        info!(file = %file_name, "Extract would be persisted to the provider store");
        Ok(())
    }
}
