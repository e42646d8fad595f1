//! Error types for the SFTP transport.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by SFTP transport operations.
#[derive(Debug, Error)]
pub enum SftpError {
    /// The SSH session could not be established.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        /// Remote host.
        host: String,
        /// Remote port.
        port: u16,
        /// The underlying SSH error.
        #[source]
        source: russh::Error,
    },

    /// Connection establishment exceeded the configured timeout.
    #[error("connection to {host}:{port} timed out after {timeout_ms} ms")]
    ConnectTimeout {
        /// Remote host.
        host: String,
        /// Remote port.
        port: u16,
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The server rejected every offered credential.
    #[error("authentication rejected for user '{username}' on {host}")]
    AuthRejected {
        /// Remote host.
        host: String,
        /// Login user name.
        username: String,
    },

    /// The configured private key could not be loaded.
    #[error("cannot load private key '{path}': {source}")]
    PrivateKey {
        /// Key file path.
        path: PathBuf,
        /// The underlying key error.
        #[source]
        source: russh_keys::Error,
    },

    /// The server's host key was unknown or did not match the pinned one.
    #[error("host key verification failed for {host}:{port}")]
    HostKeyRejected {
        /// Remote host.
        host: String,
        /// Remote port.
        port: u16,
    },

    /// An operation requiring a live connection was called while disconnected.
    #[error("not connected to SFTP server")]
    NotConnected,

    /// A remote SFTP operation failed.
    #[error("remote {operation} failed for '{path}': {source}")]
    Remote {
        /// The operation that failed (`list`, `download`, `stat`, ...).
        operation: &'static str,
        /// The remote path involved.
        path: String,
        /// The underlying SFTP error.
        #[source]
        source: russh_sftp::client::error::Error,
    },

    /// A local filesystem operation failed.
    #[error("IO error for '{path}': {source}")]
    Io {
        /// The local path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The remote file pattern is not a valid glob.
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// An SSH protocol error outside connection establishment.
    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),
}

impl SftpError {
    /// Creates a remote operation error.
    pub fn remote(
        operation: &'static str,
        path: impl Into<String>,
        source: russh_sftp::client::error::Error,
    ) -> Self {
        Self::Remote {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Creates a local IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a pattern compilation error.
    pub fn pattern(pattern: impl Into<String>, source: globset::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_display() {
        assert_eq!(
            SftpError::NotConnected.to_string(),
            "not connected to SFTP server"
        );
    }

    #[test]
    fn test_connect_timeout_display_names_endpoint_and_budget() {
        let error = SftpError::ConnectTimeout {
            host: "sftp.example.com".to_string(),
            port: 22,
            timeout_ms: 30_000,
        };
        let message = error.to_string();
        assert!(message.contains("sftp.example.com:22"));
        assert!(message.contains("30000 ms"));
    }

    #[test]
    fn test_auth_rejected_display_names_user() {
        let error = SftpError::AuthRejected {
            host: "sftp.example.com".to_string(),
            username: "loader".to_string(),
        };
        assert!(error.to_string().contains("'loader'"));
    }

    #[test]
    fn test_io_error_display_names_path() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = SftpError::io("/inbox/a.xml", source);
        assert!(error.to_string().contains("/inbox/a.xml"));
    }
}
