//! SFTP transport: capability trait, russh-backed client, retry decorator.
//!
//! [`SftpTransport`] is the seam between the orchestrator and the wire: the
//! workflow only ever talks to the trait, so an alternate implementation or
//! a test double substitutes without touching orchestration code.
//! [`RusshSftpClient`] implements it over an SSH session with the SFTP
//! subsystem; [`RetryingTransport`] wraps any implementation with the
//! configured retry policy.

mod client;
mod error;
mod retrying;

pub use client::RusshSftpClient;
pub use error::SftpError;
pub use retrying::RetryingTransport;

use std::path::Path;

use async_trait::async_trait;

/// Capability set of the SFTP transport.
///
/// Every operation other than `connect` fails fast with
/// [`SftpError::NotConnected`] when called while disconnected — there is no
/// implicit reconnect.
#[async_trait]
pub trait SftpTransport: Send {
    /// Establishes an authenticated session and opens the SFTP channel.
    ///
    /// On failure, partial state is cleaned up before the error is returned.
    async fn connect(&mut self) -> Result<(), SftpError>;

    /// Releases the channel, then the session. Idempotent; secondary
    /// teardown errors are logged, never raised.
    async fn disconnect(&mut self);

    /// True only if both the SFTP channel and the underlying session report
    /// connected.
    fn is_connected(&self) -> bool;

    /// Lists regular files in `directory` whose names match `pattern`,
    /// in server-returned order. Directories are excluded.
    async fn list_files(&self, directory: &str, pattern: &str) -> Result<Vec<String>, SftpError>;

    /// Downloads one file into `local_dir`, preserving its name. The local
    /// directory is created if absent.
    async fn download_file(
        &self,
        directory: &str,
        file_name: &str,
        local_dir: &Path,
    ) -> Result<(), SftpError>;

    /// Downloads files sequentially, stopping at the first failure.
    async fn download_files(
        &self,
        directory: &str,
        file_names: &[String],
        local_dir: &Path,
    ) -> Result<(), SftpError> {
        for file_name in file_names {
            self.download_file(directory, file_name, local_dir).await?;
        }
        Ok(())
    }

    /// Returns the byte length of a remote file. Audit/metric use only.
    async fn file_size(&self, directory: &str, file_name: &str) -> Result<u64, SftpError>;
}
