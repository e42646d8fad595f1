//! russh-backed implementation of the SFTP transport.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use globset::{Glob, GlobMatcher};
use russh::Disconnect;
use russh::client::{self, Handle};
use russh_keys::key;
use russh_sftp::client::SftpSession;
use tracing::{debug, info, warn};

use super::SftpTransport;
use super::error::SftpError;
use crate::config::SftpSettings;

/// How the server's host key is treated during connection.
#[derive(Debug, Clone)]
enum HostKeyPolicy {
    /// Verify against a known-hosts file; unknown or changed keys abort.
    Strict(PathBuf),
    /// Accept any key. For development against throwaway servers only.
    AcceptAny,
}

/// Connection-time event handler: host key verification lives here.
struct ClientHandler {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.policy {
            HostKeyPolicy::AcceptAny => {
                warn!(
                    host = %self.host,
                    "host key verification disabled; accepting server key unchecked"
                );
                Ok(true)
            }
            HostKeyPolicy::Strict(path) => {
                match russh_keys::check_known_hosts_path(
                    &self.host,
                    self.port,
                    server_public_key,
                    path,
                ) {
                    Ok(true) => {
                        debug!(host = %self.host, "server key matches known-hosts entry");
                        Ok(true)
                    }
                    Ok(false) => {
                        warn!(
                            host = %self.host,
                            known_hosts = %path.display(),
                            "server key not present in known-hosts file"
                        );
                        Ok(false)
                    }
                    Err(error) => {
                        warn!(host = %self.host, %error, "known-hosts check failed");
                        Ok(false)
                    }
                }
            }
        }
    }
}

/// SFTP client over a russh session.
///
/// Holds the session handle and the SFTP subsystem channel as scoped
/// resources: both are opened by [`connect`](SftpTransport::connect) and
/// released by [`disconnect`](SftpTransport::disconnect).
pub struct RusshSftpClient {
    settings: SftpSettings,
    connection_timeout: Duration,
    handle: Option<Handle<ClientHandler>>,
    sftp: Option<SftpSession>,
}

impl RusshSftpClient {
    /// Creates a disconnected client from resolved settings.
    #[must_use]
    pub fn new(settings: SftpSettings, connection_timeout_ms: u64) -> Self {
        Self {
            settings,
            connection_timeout: Duration::from_millis(connection_timeout_ms),
            handle: None,
            sftp: None,
        }
    }

    fn session(&self) -> Result<&SftpSession, SftpError> {
        match (&self.sftp, &self.handle) {
            (Some(sftp), Some(handle)) if !handle.is_closed() => Ok(sftp),
            _ => Err(SftpError::NotConnected),
        }
    }

    fn host_key_policy(&self) -> HostKeyPolicy {
        if self.settings.strict_host_key_checking {
            // Config resolution guarantees the path when strict mode is on;
            // an empty path rejects every key if the client is built by hand.
            HostKeyPolicy::Strict(self.settings.known_hosts_path.clone().unwrap_or_default())
        } else {
            HostKeyPolicy::AcceptAny
        }
    }

    async fn establish(&mut self) -> Result<(), SftpError> {
        let key_pair = match &self.settings.private_key_path {
            Some(path) => Some(
                russh_keys::load_secret_key(
                    path,
                    self.settings.private_key_passphrase.as_deref(),
                )
                .map_err(|source| SftpError::PrivateKey {
                    path: path.clone(),
                    source,
                })?,
            ),
            None => None,
        };

        let handler = ClientHandler {
            host: self.settings.host.clone(),
            port: self.settings.port,
            policy: self.host_key_policy(),
        };
        let config = Arc::new(client::Config::default());
        let mut handle = client::connect(
            config,
            (self.settings.host.clone(), self.settings.port),
            handler,
        )
        .await
        .map_err(|source| match source {
            russh::Error::UnknownKey => SftpError::HostKeyRejected {
                host: self.settings.host.clone(),
                port: self.settings.port,
            },
            source => SftpError::Connect {
                host: self.settings.host.clone(),
                port: self.settings.port,
                source,
            },
        })?;
        debug!("SSH session established");

        let mut authenticated = false;
        if let Some(key_pair) = key_pair {
            debug!("attempting private key authentication");
            authenticated = handle
                .authenticate_publickey(self.settings.username.clone(), Arc::new(key_pair))
                .await?;
        }
        if !authenticated && let Some(password) = &self.settings.password {
            debug!("attempting password authentication");
            authenticated = handle
                .authenticate_password(self.settings.username.clone(), password.clone())
                .await?;
        }
        if !authenticated {
            let _ = handle
                .disconnect(Disconnect::ByApplication, "authentication failed", "en")
                .await;
            return Err(SftpError::AuthRejected {
                host: self.settings.host.clone(),
                username: self.settings.username.clone(),
            });
        }
        debug!(username = %self.settings.username, "authenticated");

        let mut channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(|source| SftpError::remote("subsystem init", "sftp", source))?;

        self.handle = Some(handle);
        self.sftp = Some(sftp);
        Ok(())
    }

    async fn teardown_partial(&mut self) {
        if let Some(sftp) = self.sftp.take()
            && let Err(error) = sftp.close().await
        {
            debug!(%error, "error closing SFTP channel during teardown");
        }
        if let Some(handle) = self.handle.take()
            && let Err(error) = handle
                .disconnect(Disconnect::ByApplication, "teardown", "en")
                .await
        {
            debug!(%error, "error closing SSH session during teardown");
        }
    }
}

#[async_trait]
impl SftpTransport for RusshSftpClient {
    async fn connect(&mut self) -> Result<(), SftpError> {
        info!(
            host = %self.settings.host,
            port = self.settings.port,
            "Connecting to SFTP server"
        );
        match tokio::time::timeout(self.connection_timeout, self.establish()).await {
            Ok(Ok(())) => {
                info!("SFTP channel connected");
                Ok(())
            }
            Ok(Err(error)) => {
                self.teardown_partial().await;
                Err(error)
            }
            Err(_elapsed) => {
                self.teardown_partial().await;
                Err(SftpError::ConnectTimeout {
                    host: self.settings.host.clone(),
                    port: self.settings.port,
                    timeout_ms: self.connection_timeout.as_millis() as u64,
                })
            }
        }
    }

    async fn disconnect(&mut self) {
        if let Some(sftp) = self.sftp.take() {
            match sftp.close().await {
                Ok(()) => debug!("SFTP channel disconnected"),
                Err(error) => debug!(%error, "error disconnecting SFTP channel"),
            }
        }
        if let Some(handle) = self.handle.take() {
            match handle
                .disconnect(Disconnect::ByApplication, "shutdown", "en")
                .await
            {
                Ok(()) => debug!("SSH session disconnected"),
                Err(error) => debug!(%error, "error disconnecting SSH session"),
            }
        }
        info!("Disconnected from SFTP server");
    }

    fn is_connected(&self) -> bool {
        self.sftp.is_some()
            && self
                .handle
                .as_ref()
                .is_some_and(|handle| !handle.is_closed())
    }

    async fn list_files(&self, directory: &str, pattern: &str) -> Result<Vec<String>, SftpError> {
        let sftp = self.session()?;
        let matcher = compile_pattern(pattern)?;
        debug!(directory, pattern, "listing remote files");

        let dir = sftp
            .read_dir(directory)
            .await
            .map_err(|source| SftpError::remote("list", directory, source))?;
        let files = filter_listing(
            dir.map(|entry| (entry.file_name(), entry.file_type().is_dir())),
            &matcher,
        );

        info!(
            directory,
            pattern,
            count = files.len(),
            "Found matching remote files"
        );
        Ok(files)
    }

    async fn download_file(
        &self,
        directory: &str,
        file_name: &str,
        local_dir: &Path,
    ) -> Result<(), SftpError> {
        let sftp = self.session()?;
        debug!(file_name, directory, local_dir = %local_dir.display(), "downloading file");

        tokio::fs::create_dir_all(local_dir)
            .await
            .map_err(|source| SftpError::io(local_dir, source))?;

        let remote_path = join_remote_path(directory, file_name);
        let local_path = local_dir.join(file_name);

        let mut remote = sftp
            .open(remote_path.as_str())
            .await
            .map_err(|source| SftpError::remote("download", remote_path.clone(), source))?;
        let mut local = tokio::fs::File::create(&local_path)
            .await
            .map_err(|source| SftpError::io(local_path.clone(), source))?;
        tokio::io::copy(&mut remote, &mut local)
            .await
            .map_err(|source| SftpError::io(local_path.clone(), source))?;

        info!(file_name, local_path = %local_path.display(), "Downloaded file");
        Ok(())
    }

    async fn file_size(&self, directory: &str, file_name: &str) -> Result<u64, SftpError> {
        let sftp = self.session()?;
        let remote_path = join_remote_path(directory, file_name);
        let attrs = sftp
            .metadata(remote_path.as_str())
            .await
            .map_err(|source| SftpError::remote("stat", remote_path.clone(), source))?;
        Ok(attrs.size.unwrap_or(0))
    }
}

/// Joins a remote directory and file name, tolerating a trailing separator.
fn join_remote_path(directory: &str, file_name: &str) -> String {
    if directory.ends_with('/') {
        format!("{directory}{file_name}")
    } else {
        format!("{directory}/{file_name}")
    }
}

/// Compiles the remote file pattern into a glob matcher.
fn compile_pattern(pattern: &str) -> Result<GlobMatcher, SftpError> {
    Ok(Glob::new(pattern)
        .map_err(|source| SftpError::pattern(pattern, source))?
        .compile_matcher())
}

/// Keeps regular files whose names match, preserving input order.
fn filter_listing(
    entries: impl IntoIterator<Item = (String, bool)>,
    matcher: &GlobMatcher,
) -> Vec<String> {
    entries
        .into_iter()
        .filter(|(name, is_dir)| !is_dir && matcher.is_match(name))
        .map(|(name, _)| name)
        .collect()
}
