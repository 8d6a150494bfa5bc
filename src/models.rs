use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Whether each answered question was answered correctly, keyed by question id.
/// A missing key means "not answered", which is not the same as a wrong answer.
pub type AnswerRecord = HashMap<i64, bool>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub difficulty: i32,
    pub category: String,
}

impl Question {
    pub fn is_correct(&self, choice: &str) -> bool {
        self.correct_answer == choice
    }

    pub fn difficulty_label(&self) -> &'static str {
        match self.difficulty {
            1 => "Easy",
            2 => "Medium",
            3 => "Hard",
            _ => "Unknown",
        }
    }
}

// Per-category accuracy for a single evaluation, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub total: u64,
    pub correct: u64,
    pub accuracy: u32,
}

// One category's outcome within a single game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub correct: u32,
    pub total: u32,
}

// Cumulative per-category counters kept across games
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub played: u64,
    pub correct: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub games_played: u64,
    pub total_correct: u64,
    pub total_questions: u64,
    pub best_accuracy: u32,
    pub last_played: DateTime<Utc>,
    pub category_stats: BTreeMap<String, CategoryTotals>,
}

impl GameStats {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            games_played: 0,
            total_correct: 0,
            total_questions: 0,
            best_accuracy: 0,
            last_played: now,
            category_stats: BTreeMap::new(),
        }
    }

    pub fn overall_accuracy(&self) -> u32 {
        accuracy_percent(self.total_correct, self.total_questions)
    }

    /// Cumulative accuracy per category, highest first. Ties keep name order.
    pub fn category_accuracy(&self) -> Vec<CategoryStats> {
        let mut stats: Vec<CategoryStats> = self
            .category_stats
            .iter()
            .map(|(category, totals)| CategoryStats {
                category: category.clone(),
                total: totals.played,
                correct: totals.correct,
                accuracy: accuracy_percent(totals.correct, totals.played),
            })
            .collect();
        stats.sort_by(|a, b| b.accuracy.cmp(&a.accuracy));
        stats
    }
}

/// `round(correct / total * 100)`, or 0 when nothing was answered.
pub fn accuracy_percent(correct: u64, total: u64) -> u32 {
    if total == 0 {
        0
    } else {
        ((correct as f64 / total as f64) * 100.0).round() as u32
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
