//! Retry decorator applying the retry policy uniformly to transport operations.

use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use super::SftpTransport;
use super::error::SftpError;
use crate::retry::{RetryDecision, RetryPolicy, classify_error};

/// Wraps any [`SftpTransport`] and retries transient failures per the policy.
///
/// `connect`, `list_files`, `download_file`, and `file_size` each get the
/// full attempt budget. The sequential `download_files` wrapper is inherited
/// from the trait, so each file in a batch is retried individually and the
/// batch still stops at the first post-retry failure. `disconnect` and
/// `is_connected` pass through untouched.
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryingTransport<T> {
    /// Wraps `inner` with the given policy.
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Decides whether to sleep and go again, or to surface the error.
async fn backoff(
    policy: &RetryPolicy,
    operation: &'static str,
    error: SftpError,
    attempt: u32,
) -> Result<(), SftpError> {
    match policy.should_retry(classify_error(&error), attempt) {
        RetryDecision::Retry { delay, attempt } => {
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis(),
                error = %error,
                "transport operation failed; retrying"
            );
            tokio::time::sleep(delay).await;
            Ok(())
        }
        RetryDecision::DoNotRetry { reason } => {
            warn!(operation, attempt, reason, error = %error, "giving up on transport operation");
            Err(error)
        }
    }
}

#[async_trait]
impl<T: SftpTransport + Send + Sync> SftpTransport for RetryingTransport<T> {
    async fn connect(&mut self) -> Result<(), SftpError> {
        let mut attempt = 1;
        loop {
            match self.inner.connect().await {
                Ok(()) => return Ok(()),
                Err(error) => backoff(&self.policy, "connect", error, attempt).await?,
            }
            attempt += 1;
        }
    }

    async fn disconnect(&mut self) {
        self.inner.disconnect().await;
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    async fn list_files(&self, directory: &str, pattern: &str) -> Result<Vec<String>, SftpError> {
        let mut attempt = 1;
        loop {
            match self.inner.list_files(directory, pattern).await {
                Ok(files) => return Ok(files),
                Err(error) => backoff(&self.policy, "list", error, attempt).await?,
            }
            attempt += 1;
        }
    }

    async fn download_file(
        &self,
        directory: &str,
        file_name: &str,
        local_dir: &Path,
    ) -> Result<(), SftpError> {
        let mut attempt = 1;
        loop {
            match self.inner.download_file(directory, file_name, local_dir).await {
                Ok(()) => return Ok(()),
                Err(error) => backoff(&self.policy, "download", error, attempt).await?,
            }
            attempt += 1;
        }
    }

    async fn file_size(&self, directory: &str, file_name: &str) -> Result<u64, SftpError> {
        let mut attempt = 1;
        loop {
            match self.inner.file_size(directory, file_name).await {
                Ok(size) => return Ok(size),
                Err(error) => backoff(&self.policy, "stat", error, attempt).await?,
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    /// Transport double failing a scripted number of times per operation.
    #[derive(Default)]
    struct FlakyTransport {
        connect_failures: AtomicU32,
        list_failures: AtomicU32,
        download_failures: AtomicU32,
        calls: Mutex<Vec<&'static str>>,
        permanent: bool,
        connected: bool,
    }

    impl FlakyTransport {
        fn failing(connect: u32, list: u32, download: u32) -> Self {
            Self {
                connect_failures: AtomicU32::new(connect),
                list_failures: AtomicU32::new(list),
                download_failures: AtomicU32::new(download),
                ..Self::default()
            }
        }

        fn error(&self) -> SftpError {
            if self.permanent {
                SftpError::NotConnected
            } else {
                SftpError::ConnectTimeout {
                    host: "h".to_string(),
                    port: 22,
                    timeout_ms: 1,
                }
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl SftpTransport for FlakyTransport {
        async fn connect(&mut self) -> Result<(), SftpError> {
            self.record("connect");
            if self.connect_failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
                return Err(self.error());
            }
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) {
            self.record("disconnect");
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn list_files(&self, _: &str, _: &str) -> Result<Vec<String>, SftpError> {
            self.record("list");
            if self.list_failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
                return Err(self.error());
            }
            Ok(vec!["a.xml".to_string()])
        }

        async fn download_file(&self, _: &str, _: &str, _: &Path) -> Result<(), SftpError> {
            self.record("download");
            if self.download_failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
                return Err(self.error());
            }
            Ok(())
        }

        async fn file_size(&self, _: &str, _: &str) -> Result<u64, SftpError> {
            self.record("stat");
            Ok(0)
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            Duration::from_millis(2),
            2.0,
        )
    }

    #[tokio::test]
    async fn test_transient_connect_failure_is_retried_until_success() {
        let mut transport = RetryingTransport::new(FlakyTransport::failing(2, 0, 0), fast_policy(3));
        transport.connect().await.unwrap();
        let inner = transport.into_inner();
        assert_eq!(
            inner.calls.lock().unwrap().iter().filter(|c| **c == "connect").count(),
            3
        );
    }

    #[tokio::test]
    async fn test_budget_exhaustion_surfaces_the_error() {
        let mut transport = RetryingTransport::new(FlakyTransport::failing(5, 0, 0), fast_policy(2));
        let error = transport.connect().await.unwrap_err();
        assert!(matches!(error, SftpError::ConnectTimeout { .. }));
        let inner = transport.into_inner();
        assert_eq!(inner.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let inner = FlakyTransport {
            permanent: true,
            ..FlakyTransport::failing(5, 0, 0)
        };
        let mut transport = RetryingTransport::new(inner, fast_policy(3));
        let error = transport.connect().await.unwrap_err();
        assert!(matches!(error, SftpError::NotConnected));
        let inner = transport.into_inner();
        assert_eq!(inner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_retries_independently_of_connect() {
        let mut transport = RetryingTransport::new(FlakyTransport::failing(0, 1, 0), fast_policy(3));
        transport.connect().await.unwrap();
        let files = transport.list_files("/outbound", "*.xml").await.unwrap();
        assert_eq!(files, vec!["a.xml"]);
        let inner = transport.into_inner();
        let calls = inner.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| **c == "list").count(), 2);
    }

    #[tokio::test]
    async fn test_batch_download_stops_after_per_file_budget() {
        // First file needs 2 attempts (succeeds), second file starts with a
        // fresh budget.
        let transport = RetryingTransport::new(FlakyTransport::failing(0, 0, 1), fast_policy(2));
        let names = vec!["a.xml".to_string(), "b.xml".to_string()];
        transport
            .download_files("/outbound", &names, Path::new("./inbox"))
            .await
            .unwrap();
        let inner = transport.into_inner();
        let calls = inner.calls.lock().unwrap();
        assert_eq!(calls.iter().filter(|c| **c == "download").count(), 3);
    }
}
