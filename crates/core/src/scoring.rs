//! Relevance scoring strategy.
//!
//! Scoring rules sit behind a narrow trait so they can be replaced without
//! touching the working set's capacity or eviction logic.

use chrono::{DateTime, Utc};

/// Everything a scorer may look at. Content is deliberately absent.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub identity: &'a str,
    pub category: &'a str,
    /// Free-form task description; empty means "no task".
    pub task_hint: &'a str,
    pub last_modified: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

/// Computes a relevance score in `[0.0, 1.0]`.
///
/// Implementations must be pure: the working set re-runs them on every item
/// during each rescoring pass and relies on identical inputs producing
/// identical scores.
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, input: &ScoreInput<'_>) -> f32;
}

impl<F> RelevanceScorer for F
where
    F: Fn(&ScoreInput<'_>) -> f32 + Send + Sync,
{
    fn score(&self, input: &ScoreInput<'_>) -> f32 {
        self(input)
    }
}
