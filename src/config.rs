//! Application configuration loading and resolution.
//!
//! Settings come from a single `key = value` properties file and are resolved
//! once at startup into an immutable [`AppConfig`]. Required keys that are
//! absent or blank fail resolution immediately with a [`ConfigError`] naming
//! the key, so a misconfigured deployment never gets partway into the
//! workflow before failing. Optional keys fall back to documented defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default SFTP port when `sftp.port` is not set.
pub const DEFAULT_SFTP_PORT: u16 = 22;

/// Default local inbox directory when `sftp.local.inbox.directory` is not set.
pub const DEFAULT_INBOX_DIRECTORY: &str = "./inbox";

/// Default remote file pattern when `file.pattern.xml` is not set.
pub const DEFAULT_FILE_PATTERN: &str = "*.xml";

/// Default database driver label when `db.driver` is not set.
pub const DEFAULT_DB_DRIVER: &str = "oracle";

/// Default retry attempts when `app.retry.attempts` is not set.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default retry base delay when `app.retry.delay.ms` is not set.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Default connection timeout when `app.connection.timeout.ms` is not set.
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The properties file could not be read.
    #[error("cannot read configuration file '{path}': {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line did not parse as `key = value`.
    #[error("invalid configuration syntax on line {line}: expected key = value")]
    Syntax {
        /// 1-indexed line number.
        line: usize,
    },

    /// A key outside the documented set was found.
    #[error("unknown configuration key '{key}' on line {line}")]
    UnknownKey {
        /// The unrecognized key.
        key: String,
        /// 1-indexed line number.
        line: usize,
    },

    /// A value failed numeric or boolean parsing.
    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        /// The key whose value was rejected.
        key: &'static str,
        /// The offending raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A required key was absent or blank after trimming.
    #[error("required configuration key missing or empty: {key}")]
    MissingKey {
        /// The missing key.
        key: &'static str,
    },

    /// Neither a password nor a private key was configured.
    #[error("no SFTP credentials configured: set sftp.password or sftp.private.key.path")]
    NoCredentials,

    /// Strict host key checking is on but no known-hosts file was given.
    #[error("sftp.known.hosts.path is required while sftp.strict.host.key.checking is enabled")]
    KnownHostsRequired,
}

/// SFTP endpoint, credentials, and transfer settings.
#[derive(Debug, Clone)]
pub struct SftpSettings {
    /// Remote host name or address.
    pub host: String,
    /// Remote port.
    pub port: u16,
    /// Login user name.
    pub username: String,
    /// Password credential, if configured.
    pub password: Option<String>,
    /// Private key credential, if configured.
    pub private_key_path: Option<PathBuf>,
    /// Passphrase protecting the private key, if any.
    pub private_key_passphrase: Option<String>,
    /// Known-hosts file pinning the expected host identity.
    pub known_hosts_path: Option<PathBuf>,
    /// Whether unknown or changed host keys abort the connection.
    pub strict_host_key_checking: bool,
    /// Remote directory holding the extracts.
    pub remote_directory: String,
    /// Local inbox receiving downloads.
    pub local_inbox_directory: PathBuf,
    /// Glob selecting which remote files to pull.
    pub file_pattern: String,
}

/// PGP key material locations for the decryption service.
#[derive(Debug, Clone)]
pub struct PgpSettings {
    /// Private key used for decryption.
    pub private_key_path: PathBuf,
    /// Passphrase protecting the private key.
    pub private_key_passphrase: String,
    /// Public key used for signature verification.
    pub public_key_path: PathBuf,
}

/// Relational store connection settings for the provider repository.
#[derive(Debug, Clone)]
pub struct DbSettings {
    /// Connection URL.
    pub url: String,
    /// Login user name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Driver label.
    pub driver: String,
}

/// Process-wide knobs: retry budget and connection timeout.
#[derive(Debug, Clone, Copy)]
pub struct AppSettings {
    /// Attempts per transport operation, including the first.
    pub retry_attempts: u32,
    /// Base delay between retries in milliseconds.
    pub retry_delay_ms: u64,
    /// Connection establishment timeout in milliseconds.
    pub connection_timeout_ms: u64,
}

/// Immutable, fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SFTP transport settings.
    pub sftp: SftpSettings,
    /// PGP service settings.
    pub pgp: PgpSettings,
    /// Database repository settings.
    pub db: DbSettings,
    /// Application-level settings.
    pub app: AppSettings,
}

impl AppConfig {
    /// Loads and resolves configuration from a properties file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, a line fails to
    /// parse, an unknown key appears, a required key is missing or blank, or
    /// a value fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_properties(&raw)
    }

    /// Resolves configuration from raw properties text.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`AppConfig::load`], minus file IO.
    pub fn from_properties(raw: &str) -> Result<Self, ConfigError> {
        parse_properties(raw)?.resolve()
    }
}

/// Raw property values before required/default resolution.
///
/// Blank values are treated as unset, matching the upstream properties
/// convention where an empty assignment is indistinguishable from a missing
/// key.
#[derive(Debug, Default)]
struct RawProperties {
    sftp_host: Option<String>,
    sftp_port: Option<String>,
    sftp_username: Option<String>,
    sftp_password: Option<String>,
    sftp_private_key_path: Option<String>,
    sftp_private_key_passphrase: Option<String>,
    sftp_known_hosts_path: Option<String>,
    sftp_strict_host_key_checking: Option<String>,
    sftp_remote_directory: Option<String>,
    sftp_local_inbox_directory: Option<String>,
    file_pattern_xml: Option<String>,
    pgp_private_key_path: Option<String>,
    pgp_private_key_passphrase: Option<String>,
    pgp_public_key_path: Option<String>,
    db_url: Option<String>,
    db_username: Option<String>,
    db_password: Option<String>,
    db_driver: Option<String>,
    app_retry_attempts: Option<String>,
    app_retry_delay_ms: Option<String>,
    app_connection_timeout_ms: Option<String>,
}

fn parse_properties(raw: &str) -> Result<RawProperties, ConfigError> {
    let mut props = RawProperties::default();

    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = raw_line.trim();
        // Properties comments start the line; a '#' inside a value (for
        // example in a password) is part of the value.
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(ConfigError::Syntax {
                line: line_index + 1,
            });
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let slot = match key {
            "sftp.host" => &mut props.sftp_host,
            "sftp.port" => &mut props.sftp_port,
            "sftp.username" => &mut props.sftp_username,
            "sftp.password" => &mut props.sftp_password,
            "sftp.private.key.path" => &mut props.sftp_private_key_path,
            "sftp.private.key.passphrase" => &mut props.sftp_private_key_passphrase,
            "sftp.known.hosts.path" => &mut props.sftp_known_hosts_path,
            "sftp.strict.host.key.checking" => &mut props.sftp_strict_host_key_checking,
            "sftp.remote.directory" => &mut props.sftp_remote_directory,
            "sftp.local.inbox.directory" => &mut props.sftp_local_inbox_directory,
            "file.pattern.xml" => &mut props.file_pattern_xml,
            "pgp.private.key.path" => &mut props.pgp_private_key_path,
            "pgp.private.key.passphrase" => &mut props.pgp_private_key_passphrase,
            "pgp.public.key.path" => &mut props.pgp_public_key_path,
            "db.url" => &mut props.db_url,
            "db.username" => &mut props.db_username,
            "db.password" => &mut props.db_password,
            "db.driver" => &mut props.db_driver,
            "app.retry.attempts" => &mut props.app_retry_attempts,
            "app.retry.delay.ms" => &mut props.app_retry_delay_ms,
            "app.connection.timeout.ms" => &mut props.app_connection_timeout_ms,
            unknown => {
                return Err(ConfigError::UnknownKey {
                    key: unknown.to_string(),
                    line: line_index + 1,
                });
            }
        };

        // Blank values count as unset; last assignment wins.
        if !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }

    Ok(props)
}

impl RawProperties {
    fn resolve(self) -> Result<AppConfig, ConfigError> {
        let strict_host_key_checking = match self.sftp_strict_host_key_checking {
            Some(value) => parse_bool("sftp.strict.host.key.checking", &value)?,
            None => true,
        };

        let password = self.sftp_password;
        let private_key_path = self
            .sftp_private_key_path
            .map(|p| PathBuf::from(expand_home(&p)));
        if password.is_none() && private_key_path.is_none() {
            return Err(ConfigError::NoCredentials);
        }

        let known_hosts_path = self
            .sftp_known_hosts_path
            .map(|p| PathBuf::from(expand_home(&p)));
        if strict_host_key_checking && known_hosts_path.is_none() {
            return Err(ConfigError::KnownHostsRequired);
        }

        let sftp = SftpSettings {
            host: require("sftp.host", self.sftp_host)?,
            port: match self.sftp_port {
                Some(value) => parse_u16("sftp.port", &value)?,
                None => DEFAULT_SFTP_PORT,
            },
            username: require("sftp.username", self.sftp_username)?,
            password,
            private_key_path,
            private_key_passphrase: self.sftp_private_key_passphrase,
            known_hosts_path,
            strict_host_key_checking,
            remote_directory: require("sftp.remote.directory", self.sftp_remote_directory)?,
            local_inbox_directory: self
                .sftp_local_inbox_directory
                .map_or_else(|| PathBuf::from(DEFAULT_INBOX_DIRECTORY), PathBuf::from),
            file_pattern: self
                .file_pattern_xml
                .unwrap_or_else(|| DEFAULT_FILE_PATTERN.to_string()),
        };

        let pgp = PgpSettings {
            private_key_path: PathBuf::from(expand_home(&require(
                "pgp.private.key.path",
                self.pgp_private_key_path,
            )?)),
            private_key_passphrase: require(
                "pgp.private.key.passphrase",
                self.pgp_private_key_passphrase,
            )?,
            public_key_path: PathBuf::from(expand_home(&require(
                "pgp.public.key.path",
                self.pgp_public_key_path,
            )?)),
        };

        let db = DbSettings {
            url: require("db.url", self.db_url)?,
            username: require("db.username", self.db_username)?,
            password: require("db.password", self.db_password)?,
            driver: self
                .db_driver
                .unwrap_or_else(|| DEFAULT_DB_DRIVER.to_string()),
        };

        let app = AppSettings {
            retry_attempts: match self.app_retry_attempts {
                Some(value) => parse_u32("app.retry.attempts", &value)?,
                None => DEFAULT_RETRY_ATTEMPTS,
            },
            retry_delay_ms: match self.app_retry_delay_ms {
                Some(value) => parse_u64("app.retry.delay.ms", &value)?,
                None => DEFAULT_RETRY_DELAY_MS,
            },
            connection_timeout_ms: match self.app_connection_timeout_ms {
                Some(value) => parse_u64("app.connection.timeout.ms", &value)?,
                None => DEFAULT_CONNECTION_TIMEOUT_MS,
            },
        };

        Ok(AppConfig { sftp, pgp, db, app })
    }
}

fn require(key: &'static str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or(ConfigError::MissingKey { key })
}

fn parse_u16(key: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected an integer in 0..=65535".to_string(),
    })
}

fn parse_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            value: other.to_string(),
            reason: "expected 'true' or 'false'".to_string(),
        }),
    }
}

/// Expands a leading `~/` using `$HOME`, leaving other paths untouched.
fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = env::var_os("HOME")
        && !home.is_empty()
    {
        return Path::new(&home).join(rest).display().to_string();
    }
    path.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Minimal properties text satisfying every required key.
    fn minimal() -> String {
        "\
sftp.host = sftp.example.com
sftp.username = loader
sftp.password = hunter2
sftp.known.hosts.path = /etc/ssh/known_hosts
sftp.remote.directory = /outbound/extracts
pgp.private.key.path = /keys/loader.key
pgp.private.key.passphrase = secret
pgp.public.key.path = /keys/upstream.pub
db.url = jdbc:oracle:thin:@db:1521/PROV
db.username = prov_loader
db.password = dbpass
"
        .to_string()
    }

    #[test]
    fn test_minimal_config_applies_defaults() {
        let config = AppConfig::from_properties(&minimal()).unwrap();
        assert_eq!(config.sftp.port, DEFAULT_SFTP_PORT);
        assert_eq!(
            config.sftp.local_inbox_directory,
            PathBuf::from(DEFAULT_INBOX_DIRECTORY)
        );
        assert_eq!(config.sftp.file_pattern, DEFAULT_FILE_PATTERN);
        assert!(config.sftp.strict_host_key_checking);
        assert_eq!(config.db.driver, DEFAULT_DB_DRIVER);
        assert_eq!(config.app.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
        assert_eq!(config.app.retry_delay_ms, DEFAULT_RETRY_DELAY_MS);
        assert_eq!(
            config.app.connection_timeout_ms,
            DEFAULT_CONNECTION_TIMEOUT_MS
        );
    }

    #[test]
    fn test_missing_required_key_fails_naming_the_key() {
        let raw = minimal().replace("sftp.host = sftp.example.com\n", "");
        let err = AppConfig::from_properties(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "sftp.host" }));
    }

    #[test]
    fn test_blank_required_key_counts_as_missing() {
        let raw = minimal().replace(
            "sftp.remote.directory = /outbound/extracts",
            "sftp.remote.directory =   ",
        );
        let err = AppConfig::from_properties(&raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey {
                key: "sftp.remote.directory"
            }
        ));
    }

    #[test]
    fn test_values_are_trimmed() {
        let raw = minimal().replace(
            "sftp.host = sftp.example.com",
            "sftp.host =    sftp.example.com   ",
        );
        let config = AppConfig::from_properties(&raw).unwrap();
        assert_eq!(config.sftp.host, "sftp.example.com");
    }

    #[test]
    fn test_optional_overrides_are_honored() {
        let raw = format!(
            "{}sftp.port = 2222\nsftp.local.inbox.directory = /var/inbox\nfile.pattern.xml = provider_*.xml\napp.retry.attempts = 5\napp.retry.delay.ms = 250\napp.connection.timeout.ms = 5000\n",
            minimal()
        );
        let config = AppConfig::from_properties(&raw).unwrap();
        assert_eq!(config.sftp.port, 2222);
        assert_eq!(
            config.sftp.local_inbox_directory,
            PathBuf::from("/var/inbox")
        );
        assert_eq!(config.sftp.file_pattern, "provider_*.xml");
        assert_eq!(config.app.retry_attempts, 5);
        assert_eq!(config.app.retry_delay_ms, 250);
        assert_eq!(config.app.connection_timeout_ms, 5000);
    }

    #[test]
    fn test_key_only_auth_is_accepted() {
        let raw = minimal().replace(
            "sftp.password = hunter2",
            "sftp.private.key.path = /keys/id_ed25519",
        );
        let config = AppConfig::from_properties(&raw).unwrap();
        assert!(config.sftp.password.is_none());
        assert_eq!(
            config.sftp.private_key_path,
            Some(PathBuf::from("/keys/id_ed25519"))
        );
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let raw = minimal().replace("sftp.password = hunter2\n", "");
        let err = AppConfig::from_properties(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials));
    }

    #[test]
    fn test_strict_checking_requires_known_hosts() {
        let raw = minimal().replace("sftp.known.hosts.path = /etc/ssh/known_hosts\n", "");
        let err = AppConfig::from_properties(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::KnownHostsRequired));
    }

    #[test]
    fn test_relaxed_checking_allows_missing_known_hosts() {
        let raw = minimal().replace(
            "sftp.known.hosts.path = /etc/ssh/known_hosts",
            "sftp.strict.host.key.checking = false",
        );
        let config = AppConfig::from_properties(&raw).unwrap();
        assert!(!config.sftp.strict_host_key_checking);
        assert!(config.sftp.known_hosts_path.is_none());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let raw = format!("{}sftp.port = 70000\n", minimal());
        let err = AppConfig::from_properties(&raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "sftp.port",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_boolean_is_rejected() {
        let raw = format!("{}sftp.strict.host.key.checking = yes\n", minimal());
        let err = AppConfig::from_properties(&raw).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "sftp.strict.host.key.checking",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_key_is_rejected_with_line_number() {
        let raw = format!("{}sftp.hots = typo.example.com\n", minimal());
        let err = AppConfig::from_properties(&raw).unwrap_err();
        match err {
            ConfigError::UnknownKey { key, line } => {
                assert_eq!(key, "sftp.hots");
                assert_eq!(line, 12);
            }
            other => panic!("expected UnknownKey, got {other:?}"),
        }
    }

    #[test]
    fn test_line_without_separator_is_a_syntax_error() {
        let raw = format!("{}just-some-words\n", minimal());
        let err = AppConfig::from_properties(&raw).unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 12 }));
    }

    #[test]
    fn test_comments_and_blank_lines_are_ignored() {
        let raw = format!("# leading comment\n! alt comment\n\n{}", minimal());
        assert!(AppConfig::from_properties(&raw).is_ok());
    }

    #[test]
    fn test_hash_inside_value_is_preserved() {
        let raw = minimal().replace("sftp.password = hunter2", "sftp.password = hu#nter2");
        let config = AppConfig::from_properties(&raw).unwrap();
        assert_eq!(config.sftp.password.as_deref(), Some("hu#nter2"));
    }

    #[test]
    fn test_last_assignment_wins() {
        let raw = format!("{}sftp.host = second.example.com\n", minimal());
        let config = AppConfig::from_properties(&raw).unwrap();
        assert_eq!(config.sftp.host, "second.example.com");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = AppConfig::load(Path::new("/definitely/not/here.properties")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_expand_home_only_touches_tilde_prefix() {
        assert_eq!(expand_home("/abs/path"), "/abs/path");
        assert_eq!(expand_home("relative/path"), "relative/path");
        if let Some(home) = env::var_os("HOME") {
            let expanded = expand_home("~/known_hosts");
            assert!(expanded.starts_with(&*home.to_string_lossy()));
            assert!(expanded.ends_with("known_hosts"));
        }
    }
}
