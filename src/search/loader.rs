//! Startup synchronization between a running index build and the search
//! service: poll for a complete artifact pair, publish it once.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::{Error, Result};

use super::store::{ArtifactPaths, IndexSnapshot, IndexStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub poll_interval_secs: u64,
    pub max_interval_secs: u64,
    /// 1.0 keeps a fixed interval; above 1.0 backs off exponentially.
    pub backoff_multiplier: f64,
    /// `None` polls until the index shows up.
    pub max_attempts: Option<u32>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_interval_secs: 60,
            backoff_multiplier: 1.0,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub max_attempts: Option<u32>,
}

impl From<&LoaderConfig> for PollPolicy {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            max_interval: Duration::from_secs(config.max_interval_secs.max(config.poll_interval_secs)),
            multiplier: config.backoff_multiplier.max(1.0),
            max_attempts: config.max_attempts,
        }
    }
}

impl PollPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            multiplier: 1.0,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Wait before the next attempt, after `failures` failed attempts.
    pub fn delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(32) as i32;
        let scaled = self.interval.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(scaled.min(self.max_interval.as_secs_f64()))
    }

    pub fn exhausted(&self, failures: u32) -> bool {
        self.max_attempts.is_some_and(|max| failures >= max)
    }
}

/// Time source for the poll loop.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub struct IndexLoader {
    paths: ArtifactPaths,
    policy: PollPolicy,
    sleeper: Arc<dyn Sleeper>,
    expected_model: Option<String>,
    expected_dimensions: Option<usize>,
}

impl IndexLoader {
    pub fn new(paths: ArtifactPaths, policy: PollPolicy) -> Self {
        Self {
            paths,
            policy,
            sleeper: Arc::new(TokioSleeper),
            expected_model: None,
            expected_dimensions: None,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Model the serving process embeds queries with; a differing manifest
    /// model is logged at load time.
    pub fn with_expected_model(mut self, model: impl Into<String>) -> Self {
        self.expected_model = Some(model.into());
        self
    }

    /// Vector length produced by the query embedder. An index of any other
    /// dimension is never published.
    pub fn with_expected_dimensions(mut self, dimensions: usize) -> Self {
        self.expected_dimensions = Some(dimensions);
        self
    }

    /// One load attempt, off the async executor.
    pub async fn try_load(&self) -> Result<IndexSnapshot> {
        let paths = self.paths.clone();
        let snapshot = tokio::task::spawn_blocking(move || paths.read())
            .await
            .map_err(|e| Error::Io(std::io::Error::other(format!("load task failed: {e}"))))??;
        self.check_compatible(&snapshot)?;
        Ok(snapshot)
    }

    /// Polls until a valid pair is published into `store`. Stops with the
    /// last error once the attempt budget runs out or the error cannot
    /// clear up by waiting.
    pub async fn run(&self, store: &IndexStore) -> Result<()> {
        let mut failures = 0u32;

        loop {
            if store.snapshot().is_some() {
                return Ok(());
            }

            match self.try_load().await {
                Ok(snapshot) => {
                    let chunks = snapshot.len();
                    let dimensions = snapshot.dimensions();
                    store.publish(snapshot);
                    info!(
                        dir = %self.paths.dir().display(),
                        chunks,
                        dimensions,
                        attempts = failures + 1,
                        "search index ready"
                    );
                    return Ok(());
                }
                Err(e) => {
                    failures += 1;
                    if !e.kind().is_transient() {
                        error!(
                            dir = %self.paths.dir().display(),
                            kind = %e.kind(),
                            error = %e,
                            "search index cannot be served"
                        );
                        return Err(e);
                    }
                    if self.policy.exhausted(failures) {
                        warn!(attempts = failures, error = %e, "giving up on loading search index");
                        return Err(e);
                    }
                    let delay = self.policy.delay(failures);
                    warn!(
                        dir = %self.paths.dir().display(),
                        attempt = failures,
                        kind = %e.kind(),
                        error = %e,
                        retry_in_secs = delay.as_secs_f64(),
                        "search index not available yet"
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    fn check_compatible(&self, snapshot: &IndexSnapshot) -> Result<()> {
        if let Some(expected) = self.expected_dimensions {
            if snapshot.dimensions() != expected {
                return Err(Error::DimensionMismatch {
                    expected: snapshot.dimensions(),
                    actual: expected,
                });
            }
        }
        if let Some(expected) = &self.expected_model {
            if &snapshot.manifest().model != expected {
                warn!(
                    index_model = %snapshot.manifest().model,
                    query_model = %expected,
                    "index was built with a different embedding model"
                );
            }
        }
        Ok(())
    }
}
