//! Scripted in-memory provider shared by the unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::sync::Notify;
use url::Url;

use crate::provider::{BuildError, ForecastProvider, NetworkError};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(String),
    Unreachable,
    /// Waits for the gate before answering with the body.
    Gated(Arc<Notify>, String),
}

/// Answers calls in script order; the last reply repeats once the script runs out.
#[derive(Debug)]
pub(crate) struct MockProvider {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Reply>,
    calls: AtomicUsize,
    locations: Mutex<Vec<String>>,
}

impl MockProvider {
    pub(crate) fn scripted(replies: Vec<Reply>) -> Self {
        let last = replies.last().cloned().unwrap_or(Reply::Unreachable);
        Self {
            script: Mutex::new(replies.into()),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
            locations: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_body(body: &str) -> Self {
        Self::scripted(vec![Reply::Body(body.to_string())])
    }

    pub(crate) fn unreachable() -> Self {
        Self::scripted(vec![Reply::Unreachable])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn locations(&self) -> Vec<String> {
        self.locations.lock().clone()
    }
}

#[async_trait]
impl ForecastProvider for MockProvider {
    fn build_request_target(&self, location: &str) -> Result<Url, BuildError> {
        if location.trim().is_empty() {
            return Err(BuildError::EmptyLocation);
        }
        let base = "http://forecast.test/daily";
        Url::parse_with_params(base, &[("q", location)]).map_err(|source| BuildError::InvalidUrl {
            url: base.to_string(),
            source,
        })
    }

    async fn fetch(&self, target: &Url) -> Result<String, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((_, q)) = target.query_pairs().find(|(k, _)| k == "q") {
            self.locations.lock().push(q.into_owned());
        }

        let reply = self.script.lock().pop_front().unwrap_or_else(|| self.last.lock().clone());
        match reply {
            Reply::Body(body) => Ok(body),
            Reply::Unreachable => Err(NetworkError::Unreachable("connection refused".into())),
            Reply::Gated(gate, body) => {
                gate.notified().await;
                Ok(body)
            }
        }
    }
}
