use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::QuizError;
use crate::models::{accuracy_percent, AnswerRecord, CategoryStats, Question};

const BUILTIN_QUESTIONS: &str = include_str!("../data/questions.json");

#[derive(Deserialize)]
struct QuestionSet {
    questions: Vec<Question>,
}

/// The fixed set of questions plus the category index derived from it.
///
/// The question set is never mutated after construction. The only mutable
/// state is the preferred-category filter, which is last-write-wins.
pub struct QuestionBank {
    questions: Vec<Question>,
    categories: Vec<String>,
    selected_category: Option<String>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for q in &questions {
            if !categories.contains(&q.category) {
                categories.push(q.category.clone());
            }
        }

        Self {
            questions,
            categories,
            selected_category: None,
        }
    }

    /// Parse a `{"questions": [...]}` document. `correctAnswer` is not checked
    /// against `options`; the data source is trusted.
    pub fn from_json(json: &str) -> Result<Self, QuizError> {
        let set: QuestionSet = serde_json::from_str(json)?;
        Ok(Self::new(set.questions))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, QuizError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn builtin() -> Result<Self, QuizError> {
        Self::from_json(BUILTIN_QUESTIONS)
    }

    pub fn get_all_questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get_categories(&self) -> &[String] {
        &self.categories
    }

    pub fn get_question(&self, id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn set_category(&mut self, category: Option<&str>) {
        self.selected_category = category.map(str::to_string);
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    /// True when a filter is set and at least one question matches it.
    /// When false, random draws come from the whole set.
    pub fn filter_matches(&self) -> bool {
        match &self.selected_category {
            Some(category) => self.questions.iter().any(|q| &q.category == category),
            None => false,
        }
    }

    pub fn get_random_question(&self) -> Result<&Question, QuizError> {
        self.get_random_question_with(&mut rand::thread_rng())
    }

    /// Draw uniformly from the questions matching the active filter, or from the
    /// whole set when there is no filter or nothing matches it.
    pub fn get_random_question_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<&Question, QuizError> {
        let pool: Vec<&Question> = match &self.selected_category {
            Some(category) => self
                .questions
                .iter()
                .filter(|q| &q.category == category)
                .collect(),
            None => Vec::new(),
        };

        let question = if pool.is_empty() {
            self.questions.choose(rng)
        } else {
            pool.choose(rng).copied()
        };

        let question = question.ok_or(QuizError::EmptyBank)?;
        tracing::debug!(
            id = question.id,
            category = %question.category,
            filtered = !pool.is_empty(),
            "drew question"
        );
        Ok(question)
    }

    pub fn get_questions_by_difficulty(&self, difficulty: i32) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.difficulty == difficulty)
            .collect()
    }

    pub fn get_questions_by_category(&self, category: &str) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.category == category)
            .collect()
    }

    /// Accuracy for every known category, highest first. Categories with no
    /// answered questions report zeros. Ties keep category discovery order.
    pub fn get_category_stats(&self, answers: &AnswerRecord) -> Vec<CategoryStats> {
        let mut tally: HashMap<&str, (u64, u64)> = self
            .categories
            .iter()
            .map(|c| (c.as_str(), (0, 0)))
            .collect();

        for question in &self.questions {
            if let Some(&correct) = answers.get(&question.id) {
                let entry = tally.entry(question.category.as_str()).or_default();
                entry.0 += 1;
                if correct {
                    entry.1 += 1;
                }
            }
        }

        let mut stats: Vec<CategoryStats> = self
            .categories
            .iter()
            .map(|category| {
                let (total, correct) = tally.get(category.as_str()).copied().unwrap_or_default();
                CategoryStats {
                    category: category.clone(),
                    total,
                    correct,
                    accuracy: accuracy_percent(correct, total),
                }
            })
            .collect();

        stats.sort_by(|a, b| b.accuracy.cmp(&a.accuracy));
        stats
    }
}
