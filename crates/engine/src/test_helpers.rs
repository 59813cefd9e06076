//! Shared test helpers for engine tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ctxwarden_core::{ContentReader, ReadError, RelevanceScorer, ScoreInput, SourceContent};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed reference instant plus `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn source(content: &str, last_modified: Option<DateTime<Utc>>) -> SourceContent {
    SourceContent::new(content, last_modified)
}

/// A scorer that returns a preset score per identity (0.5 otherwise).
pub struct FixedScorer {
    scores: HashMap<String, f32>,
}

impl FixedScorer {
    pub fn new(scores: &[(&str, f32)]) -> Self {
        Self {
            scores: scores.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

impl RelevanceScorer for FixedScorer {
    fn score(&self, input: &ScoreInput<'_>) -> f32 {
        self.scores.get(input.identity).copied().unwrap_or(0.5)
    }
}

/// An in-memory content reader whose sources can be edited mid-test.
///
/// Identities listed as `hanging` never answer, to exercise read timeouts.
#[derive(Default)]
pub struct MapReader {
    sources: Mutex<HashMap<String, SourceContent>>,
    hanging: Mutex<Vec<String>>,
    unreadable: Mutex<Vec<String>>,
    reads: AtomicUsize,
}

impl MapReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, identity: &str, content: &str) -> Self {
        self.set(identity, content);
        self
    }

    pub fn set(&self, identity: &str, content: &str) {
        self.sources
            .lock()
            .unwrap()
            .insert(identity.to_string(), SourceContent::new(content, None));
    }

    pub fn delete(&self, identity: &str) {
        self.sources.lock().unwrap().remove(identity);
    }

    pub fn hang(&self, identity: &str) {
        self.hanging.lock().unwrap().push(identity.to_string());
    }

    pub fn break_source(&self, identity: &str) {
        self.unreadable.lock().unwrap().push(identity.to_string());
    }

    /// How many times `read` has been called.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentReader for MapReader {
    fn name(&self) -> &str {
        "map"
    }

    async fn read(&self, identity: &str) -> Result<SourceContent, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let hangs = self.hanging.lock().unwrap().iter().any(|h| h == identity);
        if hangs {
            std::future::pending::<()>().await;
        }
        if self.unreadable.lock().unwrap().iter().any(|u| u == identity) {
            return Err(ReadError::Unreadable {
                identity: identity.to_string(),
                reason: "permission denied".into(),
            });
        }
        self.sources
            .lock()
            .unwrap()
            .get(identity)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(identity.to_string()))
    }

    async fn size_hint(&self, identity: &str) -> Option<u64> {
        self.sources
            .lock()
            .unwrap()
            .get(identity)
            .map(|s| s.content.len() as u64)
    }
}
