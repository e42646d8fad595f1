//! PGP decryption and signature verification service.
//!
//! Only encryption detection is implemented. The cryptographic operations
//! are typed stubs: each logs what it would do and returns
//! [`PgpError::NotImplemented`], so callers can tell "feature absent" from a
//! genuine runtime failure once real logic lands. The wider taxonomy
//! ([`PgpError::KeyFile`], [`PgpError::MalformedInput`]) exists for that
//! future implementation; nothing constructs those variants today.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PgpSettings;

/// File extensions treated as PGP-encrypted payloads.
const ENCRYPTED_EXTENSIONS: [&str; 3] = ["pgp", "gpg", "asc"];

/// Errors raised by PGP operations.
#[derive(Debug, Error)]
pub enum PgpError {
    /// The operation has no implementation yet.
    #[error("PGP {operation} not yet implemented")]
    NotImplemented {
        /// The operation that was requested.
        operation: &'static str,
    },

    /// Key material could not be read or parsed.
    #[error("cannot use PGP key '{path}': {source}")]
    KeyFile {
        /// The key file involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The payload is not valid PGP data.
    #[error("malformed PGP input '{path}'")]
    MalformedInput {
        /// The offending file.
        path: PathBuf,
    },
}

/// Service wrapping the loader's PGP key material.
#[derive(Debug)]
pub struct PgpService {
    settings: PgpSettings,
}

impl PgpService {
    /// Creates the service from resolved settings.
    #[must_use]
    pub fn new(settings: PgpSettings) -> Self {
        info!(
            private_key = %settings.private_key_path.display(),
            public_key = %settings.public_key_path.display(),
            "PGP service initialized (stub implementation)"
        );
        Self { settings }
    }

    /// Returns true if the file looks PGP-encrypted, judged by extension.
    #[must_use]
    pub fn is_encrypted(&self, path: &Path) -> bool {
        debug!(path = %path.display(), "checking for PGP encryption");
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                ENCRYPTED_EXTENSIONS.contains(&ext.as_str())
            })
    }

    /// Decrypts `encrypted` into `output` using the configured private key.
    ///
    /// # Errors
    ///
    /// Always returns [`PgpError::NotImplemented`].
    pub fn decrypt_file(&self, encrypted: &Path, output: &Path) -> Result<(), PgpError> {
        warn!("PGP decryption not yet implemented - stub method called");
        info!(
            from = %encrypted.display(),
            to = %output.display(),
            key = %self.settings.private_key_path.display(),
            "would decrypt"
        );
        Err(PgpError::NotImplemented {
            operation: "decryption",
        })
    }

    /// Verifies the signature of `signed`, optionally against a detached
    /// signature file.
    ///
    /// # Errors
    ///
    /// Always returns [`PgpError::NotImplemented`].
    pub fn verify_signature(
        &self,
        signed: &Path,
        signature: Option<&Path>,
    ) -> Result<bool, PgpError> {
        warn!("PGP signature verification not yet implemented - stub method called");
        info!(
            file = %signed.display(),
            detached = ?signature,
            key = %self.settings.public_key_path.display(),
            "would verify signature"
        );
        Err(PgpError::NotImplemented {
            operation: "signature verification",
        })
    }

    /// Encrypts `input` into `output` for the given recipient key.
    ///
    /// # Errors
    ///
    /// Always returns [`PgpError::NotImplemented`].
    pub fn encrypt_file(
        &self,
        input: &Path,
        output: &Path,
        recipient_public_key: &Path,
    ) -> Result<(), PgpError> {
        warn!("PGP encryption not yet implemented - stub method called");
        info!(
            from = %input.display(),
            to = %output.display(),
            recipient = %recipient_public_key.display(),
            "would encrypt"
        );
        Err(PgpError::NotImplemented {
            operation: "encryption",
        })
    }

    /// Reports metadata about a key file.
    ///
    /// # Errors
    ///
    /// Always returns [`PgpError::NotImplemented`].
    pub fn key_info(&self, key_file: &Path) -> Result<String, PgpError> {
        warn!("PGP key info extraction not yet implemented - stub method called");
        info!(key = %key_file.display(), "would analyze key file");
        Err(PgpError::NotImplemented {
            operation: "key info extraction",
        })
    }
}
