//! Audit logging for lifecycle and operation events.
//!
//! [`AuditLogger`] is an explicitly constructed handle: the runtime creates
//! it at startup, hands it by reference to the workflow, and closes it during
//! cleanup. It is a stateless formatter — every event becomes a single
//! timestamped line written through the ambient `tracing` sink at the
//! configured severity. This is advisory logging only; `flush`/`close` are
//! no-ops reserved for a future durable sink.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, error, info, warn};

/// Severity at which audit lines are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditLevel {
    /// Emit at DEBUG.
    Debug,
    /// Emit at INFO.
    #[default]
    Info,
    /// Emit at WARN.
    Warn,
    /// Emit at ERROR.
    Error,
}

/// Formatter for audit events, writing through `tracing`.
#[derive(Debug)]
pub struct AuditLogger {
    level: AuditLevel,
    sink_path: Option<PathBuf>,
}

impl AuditLogger {
    /// Creates an audit logger emitting at `level`.
    ///
    /// `sink_path` is reserved for a future durable sink and is only
    /// reported at construction time.
    #[must_use]
    pub fn new(level: AuditLevel, sink_path: Option<PathBuf>) -> Self {
        info!(?level, sink = ?sink_path, "Audit logger initialized");
        Self { level, sink_path }
    }

    /// Returns the reserved durable sink path, if one was configured.
    #[must_use]
    pub fn sink_path(&self) -> Option<&PathBuf> {
        self.sink_path.as_ref()
    }

    /// Records application startup.
    pub fn log_application_start(&self) {
        self.emit("APPLICATION_START - provider loader started".to_string());
    }

    /// Records application shutdown.
    pub fn log_application_stop(&self) {
        self.emit("APPLICATION_STOP - provider loader stopped".to_string());
    }

    /// Records an SFTP connection attempt.
    pub fn log_sftp_connection(&self, host: &str, success: bool, error: Option<&str>) {
        self.emit(format_sftp_connection(host, success, error));
    }

    /// Records a file download with its remote size in bytes.
    pub fn log_file_download(
        &self,
        file_name: &str,
        size_bytes: u64,
        success: bool,
        error: Option<&str>,
    ) {
        self.emit(format_file_download(file_name, size_bytes, success, error));
    }

    /// Records a PGP operation such as `DECRYPT` or `VERIFY`.
    pub fn log_pgp_operation(
        &self,
        operation: &str,
        file_name: &str,
        success: bool,
        error: Option<&str>,
    ) {
        self.emit(format_pgp_operation(operation, file_name, success, error));
    }

    /// Records an XML parsing pass and how many records it produced.
    pub fn log_xml_parsing(
        &self,
        file_name: &str,
        record_count: usize,
        success: bool,
        error: Option<&str>,
    ) {
        self.emit(format_xml_parsing(file_name, record_count, success, error));
    }

    /// Records a database operation such as `INSERT` and the rows affected.
    pub fn log_db_operation(
        &self,
        operation: &str,
        record_count: usize,
        success: bool,
        error: Option<&str>,
    ) {
        self.emit(format_db_operation(operation, record_count, success, error));
    }

    /// Records a free-form processing event.
    pub fn log_processing_event(
        &self,
        event_type: &str,
        description: &str,
        success: bool,
        error: Option<&str>,
    ) {
        self.emit(format_processing_event(
            event_type,
            description,
            success,
            error,
        ));
    }

    /// Records an operation duration.
    pub fn log_performance(&self, operation: &str, duration: Duration, info: Option<&str>) {
        self.emit(format_performance(operation, duration, info));
    }

    /// Flushes buffered events. No-op until a durable sink exists.
    pub fn flush(&self) {
        debug!("Flushing audit events");
    }

    /// Closes the audit logger.
    pub fn close(&self) {
        info!("Closing audit logger");
        self.flush();
    }

    fn emit(&self, body: String) {
        let message = format!("AUDIT - [{}] {body}", timestamp());
        match self.level {
            AuditLevel::Debug => debug!("{message}"),
            AuditLevel::Info => info!("{message}"),
            AuditLevel::Warn => warn!("{message}"),
            AuditLevel::Error => error!("{message}"),
        }
    }
}

fn timestamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(format)
        .unwrap_or_else(|_| "unknown-time".to_string())
}

fn status(success: bool) -> &'static str {
    if success { "SUCCESS" } else { "FAILURE" }
}

/// Appends the error detail to failed events.
fn with_error(mut message: String, success: bool, error: Option<&str>) -> String {
    if !success
        && let Some(error) = error
    {
        let _ = write!(message, ", Error: {error}");
    }
    message
}

fn format_sftp_connection(host: &str, success: bool, error: Option<&str>) -> String {
    with_error(
        format!("SFTP_CONNECTION - Host: {host}, Status: {}", status(success)),
        success,
        error,
    )
}

fn format_file_download(
    file_name: &str,
    size_bytes: u64,
    success: bool,
    error: Option<&str>,
) -> String {
    with_error(
        format!(
            "FILE_DOWNLOAD - File: {file_name}, Size: {size_bytes} bytes, Status: {}",
            status(success)
        ),
        success,
        error,
    )
}

fn format_pgp_operation(
    operation: &str,
    file_name: &str,
    success: bool,
    error: Option<&str>,
) -> String {
    with_error(
        format!(
            "PGP_{} - File: {file_name}, Status: {}",
            operation.to_uppercase(),
            status(success)
        ),
        success,
        error,
    )
}

fn format_xml_parsing(
    file_name: &str,
    record_count: usize,
    success: bool,
    error: Option<&str>,
) -> String {
    with_error(
        format!(
            "XML_PARSING - File: {file_name}, Records: {record_count}, Status: {}",
            status(success)
        ),
        success,
        error,
    )
}

fn format_db_operation(
    operation: &str,
    record_count: usize,
    success: bool,
    error: Option<&str>,
) -> String {
    with_error(
        format!(
            "DB_{} - Records: {record_count}, Status: {}",
            operation.to_uppercase(),
            status(success)
        ),
        success,
        error,
    )
}

fn format_processing_event(
    event_type: &str,
    description: &str,
    success: bool,
    error: Option<&str>,
) -> String {
    with_error(
        format!(
            "{} - {description}, Status: {}",
            event_type.to_uppercase(),
            status(success)
        ),
        success,
        error,
    )
}

fn format_performance(operation: &str, duration: Duration, info: Option<&str>) -> String {
    let mut message = format!(
        "PERFORMANCE - Operation: {operation}, Duration: {} ms",
        duration.as_millis()
    );
    if let Some(info) = info
        && !info.trim().is_empty()
    {
        let _ = write!(message, ", Info: {info}");
    }
    message
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sftp_connection_success_has_no_error_suffix() {
        let message = format_sftp_connection("sftp.example.com", true, Some("ignored"));
        assert_eq!(
            message,
            "SFTP_CONNECTION - Host: sftp.example.com, Status: SUCCESS"
        );
    }

    #[test]
    fn test_sftp_connection_failure_appends_error() {
        let message = format_sftp_connection("sftp.example.com", false, Some("refused"));
        assert!(message.contains("Status: FAILURE"));
        assert!(message.ends_with("Error: refused"));
    }

    #[test]
    fn test_file_download_includes_size() {
        let message = format_file_download("extract.xml", 2048, true, None);
        assert!(message.contains("File: extract.xml"));
        assert!(message.contains("Size: 2048 bytes"));
    }

    #[test]
    fn test_pgp_operation_uppercases_the_verb() {
        let message = format_pgp_operation("decrypt", "extract.xml.pgp", false, Some("no key"));
        assert!(message.starts_with("PGP_DECRYPT"));
        assert!(message.ends_with("Error: no key"));
    }

    #[test]
    fn test_xml_parsing_reports_record_count() {
        let message = format_xml_parsing("extract.xml", 42, true, None);
        assert!(message.contains("Records: 42"));
    }

    #[test]
    fn test_db_operation_uppercases_and_counts() {
        let message = format_db_operation("insert", 7, true, None);
        assert!(message.starts_with("DB_INSERT"));
        assert!(message.contains("Records: 7"));
    }

    #[test]
    fn test_processing_event_failure_carries_detail() {
        let message = format_processing_event("workflow", "main run", false, Some("boom"));
        assert!(message.starts_with("WORKFLOW - main run"));
        assert!(message.ends_with("Error: boom"));
    }

    #[test]
    fn test_performance_includes_optional_info() {
        let message = format_performance("LIST_FILES", Duration::from_millis(12), Some("3 files"));
        assert!(message.contains("Duration: 12 ms"));
        assert!(message.ends_with("Info: 3 files"));

        let bare = format_performance("LIST_FILES", Duration::from_millis(12), Some("   "));
        assert!(!bare.contains("Info:"));
    }

    #[test]
    fn test_timestamp_is_well_formed() {
        let ts = timestamp();
        // yyyy-mm-dd hh:mm:ss
        assert_eq!(ts.len(), 19, "unexpected timestamp shape: {ts}");
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }

    #[test]
    fn test_logger_construction_records_sink() {
        let logger = AuditLogger::new(AuditLevel::Info, Some(PathBuf::from("/var/log/audit")));
        assert_eq!(logger.sink_path(), Some(&PathBuf::from("/var/log/audit")));
        logger.close();
    }
}
