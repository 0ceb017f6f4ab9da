//! Time-bounded live connectivity check.

use std::path::Path;
use std::time::Duration;

use crate::driver::Connector;
use crate::error::{Result, redact};

/// Default bound on a probe, connection plus liveness query.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(8000);

/// How a probe ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Connected and answered the liveness query.
    Connected,
    /// The attempt failed before the deadline. The message is redacted.
    Failed(String),
    /// The deadline passed first; the attempt was abandoned.
    TimedOut(Duration),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Connected)
    }

    /// User-facing summary. Never contains the token.
    pub fn message(&self) -> String {
        match self {
            ProbeOutcome::Connected => "Connection succeeded".to_string(),
            ProbeOutcome::Failed(reason) => format!("Connection failed: {}", reason),
            ProbeOutcome::TimedOut(after) => {
                format!("Connection timed out after {} ms", after.as_millis())
            }
        }
    }
}

/// Connect with `token`, run the liveness query, and tear the session down,
/// all within `timeout`.
///
/// On expiry the in-flight attempt is dropped; the session, if one was
/// opened, goes with it. No retries.
pub async fn probe(
    connector: &dyn Connector,
    bundle_path: &Path,
    token: &str,
    timeout: Duration,
) -> ProbeOutcome {
    let attempt = async {
        let session = connector.connect(bundle_path, token).await?;
        let alive = session.ping().await;
        session.shutdown().await;
        alive
    };

    let outcome = match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(())) => ProbeOutcome::Connected,
        Ok(Err(e)) => ProbeOutcome::Failed(redact(&e.to_string(), token)),
        Err(_) => ProbeOutcome::TimedOut(timeout),
    };

    match &outcome {
        ProbeOutcome::Connected => tracing::info!(bundle = %bundle_path.display(), "probe connected"),
        other => tracing::warn!(bundle = %bundle_path.display(), outcome = %other.message(), "probe failed"),
    }
    outcome
}

/// Like [`probe`] but as a `Result`, for callers that treat a failed probe as
/// an error.
pub async fn require_connection(
    connector: &dyn Connector,
    bundle_path: &Path,
    token: &str,
    timeout: Duration,
) -> Result<()> {
    match probe(connector, bundle_path, token, timeout).await {
        ProbeOutcome::Connected => Ok(()),
        other => Err(crate::error::ManagerError::connectivity(other.message())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{CqlSession, KeyspaceMetadata};
    use crate::error::ManagerError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubSession {
        closed: Arc<AtomicUsize>,
        ping_ok: bool,
    }

    #[async_trait]
    impl CqlSession for StubSession {
        async fn ping(&self) -> Result<()> {
            if self.ping_ok {
                Ok(())
            } else {
                Err(ManagerError::driver("query rejected for AstraCS:secret-token"))
            }
        }
        fn active_keyspace(&self) -> Option<String> {
            None
        }
        async fn keyspace_metadata(&self, _: &str) -> Result<Option<KeyspaceMetadata>> {
            Ok(None)
        }
        async fn shutdown(self: Box<Self>) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    enum Behaviour {
        Ok,
        PingFails,
        Refused,
        Hang,
    }

    struct StubConnector {
        behaviour: Behaviour,
        closed: Arc<AtomicUsize>,
    }

    impl StubConnector {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Connector for StubConnector {
        async fn connect(&self, _: &Path, _: &str) -> Result<Box<dyn CqlSession>> {
            let session = |ping_ok: bool| -> Box<dyn CqlSession> {
                Box::new(StubSession {
                    closed: self.closed.clone(),
                    ping_ok,
                })
            };
            match self.behaviour {
                Behaviour::Ok => Ok(session(true)),
                Behaviour::PingFails => Ok(session(false)),
                Behaviour::Refused => Err(ManagerError::driver("Connection refused")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(session(true))
                }
            }
        }
    }

    const TOKEN: &str = "AstraCS:secret-token";

    #[tokio::test]
    async fn test_probe_connected_closes_session() {
        let c = StubConnector::new(Behaviour::Ok);
        let out = probe(&c, Path::new("b.zip"), TOKEN, DEFAULT_PROBE_TIMEOUT).await;
        assert_eq!(out, ProbeOutcome::Connected);
        assert_eq!(c.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_is_redacted_and_closes_session() {
        let c = StubConnector::new(Behaviour::PingFails);
        let out = probe(&c, Path::new("b.zip"), TOKEN, DEFAULT_PROBE_TIMEOUT).await;
        assert!(!out.is_success());
        assert!(!out.message().contains(TOKEN));
        assert!(out.message().contains("***"));
        assert_eq!(c.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_refused() {
        let c = StubConnector::new(Behaviour::Refused);
        let out = probe(&c, Path::new("b.zip"), TOKEN, DEFAULT_PROBE_TIMEOUT).await;
        assert_eq!(
            out.message(),
            "Connection failed: Remote service unreachable (check network access)"
        );
    }

    #[tokio::test]
    async fn test_probe_times_out_without_hanging() {
        let c = StubConnector::new(Behaviour::Hang);
        let started = std::time::Instant::now();
        let out = probe(&c, Path::new("b.zip"), TOKEN, Duration::from_millis(50)).await;
        assert_eq!(out, ProbeOutcome::TimedOut(Duration::from_millis(50)));
        assert_eq!(out.message(), "Connection timed out after 50 ms");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
