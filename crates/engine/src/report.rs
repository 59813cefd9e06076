//! Context usage report: summary plus a ranked list of the most relevant items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::working_set::{Summary, WorkingSet};

/// One line of the ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub rank: usize,
    pub identity: String,
    pub category: String,
    pub relevance_score: f32,
    pub size: usize,
}

/// Structured report, renderable as Markdown or serialized as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextReport {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub top: Vec<RankedEntry>,
}

impl ContextReport {
    pub fn build(set: &WorkingSet, top_n: usize, now: DateTime<Utc>) -> Self {
        let top = set
            .top_by_relevance(top_n)
            .enumerate()
            .map(|(i, item)| RankedEntry {
                rank: i + 1,
                identity: item.identity.clone(),
                category: item.category.clone(),
                relevance_score: item.relevance_score,
                size: item.size,
            })
            .collect();

        Self {
            generated_at: now,
            summary: set.snapshot_summary(),
            top,
        }
    }

    /// `"Context: 3 items, 12.5% usage"`
    pub fn one_line(&self) -> String {
        format!(
            "Context: {} items, {:.1}% usage",
            self.summary.total_items, self.summary.usage_percentage
        )
    }

    pub fn render_markdown(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();

        out.push_str("# Context Usage Report\n\n");
        out.push_str("## Summary\n");
        out.push_str(&format!("- Total Items: {}\n", s.total_items));
        out.push_str(&format!("- Total Size: {} bytes\n", thousands(s.total_size)));
        out.push_str(&format!("- Max Size: {} bytes\n", thousands(s.capacity)));
        out.push_str(&format!("- Usage: {:.1}%\n", s.usage_percentage));
        let status = if s.approaching_limit {
            "⚠️ Approaching Limit"
        } else {
            "✅ Normal"
        };
        out.push_str(&format!("- Status: {status}\n\n"));

        out.push_str("## Categories\n");
        if s.categories.is_empty() {
            out.push_str("- (none)\n");
        }
        for (category, stats) in &s.categories {
            out.push_str(&format!(
                "- {}: {} items, {} bytes\n",
                title_case(category),
                stats.count,
                thousands(stats.size)
            ));
        }

        out.push_str(&format!("\n## Top {} Most Relevant Items\n", self.top.len()));
        for entry in &self.top {
            out.push_str(&format!(
                "{}. {} (relevance: {:.2}, size: {})\n",
                entry.rank,
                entry.identity,
                entry.relevance_score,
                thousands(entry.size)
            ));
        }

        out
    }
}

fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
