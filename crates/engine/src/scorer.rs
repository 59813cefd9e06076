//! Table-driven relevance scorer.
//!
//! Score = base + category bonus + task keyword bonus + recency bonus,
//! clamped to 1.0. Every term is non-negative, so no floor clamp is needed.
//!
//! | Term | Rule |
//! |------|------|
//! | Category | table lookup; unknown labels get the code bonus if the identity has a source extension |
//! | Task | `keyword_bonus` per whitespace-separated task word found in the file name |
//! | Recency | `< 1 day` → day bonus, `< 7 days` → week bonus, missing mtime → 0 |

use chrono::{DateTime, Duration, Utc};
use ctxwarden_config::ScoringConfig;
use ctxwarden_core::{RelevanceScorer, ScoreInput, display_name};
use std::collections::BTreeMap;
use std::path::Path;

/// The default scorer, built from the `[scoring]` config section.
#[derive(Debug, Clone)]
pub struct TableScorer {
    base: f32,
    keyword_bonus: f32,
    code_bonus: f32,
    recent_day_bonus: f32,
    recent_week_bonus: f32,
    code_extensions: Vec<String>,
    category_bonus: BTreeMap<String, f32>,
}

impl TableScorer {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            base: config.base_score,
            keyword_bonus: config.keyword_bonus,
            code_bonus: config.code_bonus,
            recent_day_bonus: config.recent_day_bonus,
            recent_week_bonus: config.recent_week_bonus,
            code_extensions: config
                .code_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            category_bonus: config
                .category_bonus
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v))
                .collect(),
        }
    }

    fn category_term(&self, category: &str, identity: &str) -> f32 {
        if let Some(bonus) = self.category_bonus.get(&category.to_lowercase()) {
            return *bonus;
        }
        if self.looks_like_code(identity) {
            self.code_bonus
        } else {
            0.0
        }
    }

    fn looks_like_code(&self, identity: &str) -> bool {
        Path::new(identity)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                self.code_extensions.iter().any(|known| *known == ext)
            })
    }

    fn task_term(&self, task_hint: &str, identity: &str) -> f32 {
        if task_hint.trim().is_empty() {
            return 0.0;
        }
        let name = display_name(identity).to_lowercase();
        let hits = task_hint
            .to_lowercase()
            .split_whitespace()
            .filter(|keyword| name.contains(keyword))
            .count();
        hits as f32 * self.keyword_bonus
    }

    fn recency_term(&self, last_modified: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f32 {
        let Some(modified) = last_modified else {
            return 0.0;
        };
        let age = now.signed_duration_since(modified);
        if age < Duration::days(1) {
            self.recent_day_bonus
        } else if age < Duration::days(7) {
            self.recent_week_bonus
        } else {
            0.0
        }
    }
}

impl Default for TableScorer {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl RelevanceScorer for TableScorer {
    fn score(&self, input: &ScoreInput<'_>) -> f32 {
        let score = self.base
            + self.category_term(input.category, input.identity)
            + self.task_term(input.task_hint, input.identity)
            + self.recency_term(input.last_modified, input.now);
        score.min(1.0)
    }
}
